//! Transfer creation wizard: sender, recipient, amount

use super::fees::Quote;
use super::field::{replace_leaf, Choice, FieldKind, FieldPath, TextSection};
use super::rules::{check_agency, check_amount, check_phone, is_blank, is_valid_email, require};
use super::FormPolicy;
use crate::state::wizard::{
    split_path, ErrorMap, FieldPathError, StepId, SubmissionStamp, Submittable, WizardForm,
};
use crate::state::{countries, Agency};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Short code the recipient presents at the agency, `RC` + 6 characters
pub fn generate_withdrawal_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("RC{suffix}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferStep {
    Expediteur,
    Destinataire,
    Transfert,
}

impl StepId for TransferStep {
    const ALL: &'static [Self] = &[
        TransferStep::Expediteur,
        TransferStep::Destinataire,
        TransferStep::Transfert,
    ];

    fn label(&self) -> &'static str {
        match self {
            TransferStep::Expediteur => "Expéditeur",
            TransferStep::Destinataire => "Destinataire",
            TransferStep::Transfert => "Montant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SenderField {
    Nom,
    Prenom,
    Telephone,
    Email,
    Pays,
    PieceIdentite,
}

impl SenderField {
    const ALL: [Self; 6] = [
        Self::Nom,
        Self::Prenom,
        Self::Telephone,
        Self::Email,
        Self::Pays,
        Self::PieceIdentite,
    ];

    fn key(&self) -> &'static str {
        match self {
            Self::Nom => "nom",
            Self::Prenom => "prenom",
            Self::Telephone => "telephone",
            Self::Email => "email",
            Self::Pays => "pays",
            Self::PieceIdentite => "piece_identite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecipientField {
    Nom,
    Prenom,
    Telephone,
    Pays,
    Agence,
    AgenceNom,
}

impl RecipientField {
    const ALL: [Self; 6] = [
        Self::Nom,
        Self::Prenom,
        Self::Telephone,
        Self::Pays,
        Self::Agence,
        Self::AgenceNom,
    ];

    fn key(&self) -> &'static str {
        match self {
            Self::Nom => "nom",
            Self::Prenom => "prenom",
            Self::Telephone => "telephone",
            Self::Pays => "pays",
            Self::Agence => "agence",
            Self::AgenceNom => "agence_nom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AmountField {
    Montant,
    Motif,
    Frais,
    Total,
}

impl AmountField {
    const ALL: [Self; 4] = [Self::Montant, Self::Motif, Self::Frais, Self::Total];

    fn key(&self) -> &'static str {
        match self {
            Self::Montant => "montant",
            Self::Motif => "motif",
            Self::Frais => "frais",
            Self::Total => "total",
        }
    }
}

/// Path to one field of [`TransferForm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferField {
    Expediteur(SenderField),
    Destinataire(RecipientField),
    Transfert(AmountField),
}

impl fmt::Display for TransferField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferField::Expediteur(k) => write!(f, "expediteur.{}", k.key()),
            TransferField::Destinataire(k) => write!(f, "destinataire.{}", k.key()),
            TransferField::Transfert(k) => write!(f, "transfert.{}", k.key()),
        }
    }
}

impl FromStr for TransferField {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = split_path(s)?;
        let unknown = || FieldPathError::UnknownField {
            section: section.to_string(),
            field: key.to_string(),
        };
        match section {
            "expediteur" => SenderField::ALL
                .into_iter()
                .find(|k| k.key() == key)
                .map(TransferField::Expediteur)
                .ok_or_else(unknown),
            "destinataire" => RecipientField::ALL
                .into_iter()
                .find(|k| k.key() == key)
                .map(TransferField::Destinataire)
                .ok_or_else(unknown),
            "transfert" => AmountField::ALL
                .into_iter()
                .find(|k| k.key() == key)
                .map(TransferField::Transfert)
                .ok_or_else(unknown),
            other => Err(FieldPathError::UnknownSection(other.to_string())),
        }
    }
}

impl FieldPath for TransferField {
    fn label(&self) -> &'static str {
        match self {
            TransferField::Expediteur(k) => match k {
                SenderField::Nom => "Nom",
                SenderField::Prenom => "Prénom",
                SenderField::Telephone => "Téléphone",
                SenderField::Email => "E-mail (optionnel)",
                SenderField::Pays => "Pays",
                SenderField::PieceIdentite => "Pièce d'identité",
            },
            TransferField::Destinataire(k) => match k {
                RecipientField::Nom => "Nom",
                RecipientField::Prenom => "Prénom",
                RecipientField::Telephone => "Téléphone",
                RecipientField::Pays => "Pays",
                RecipientField::Agence => "Agence de retrait",
                RecipientField::AgenceNom => "Nom de l'agence",
            },
            TransferField::Transfert(k) => match k {
                AmountField::Montant => "Montant",
                AmountField::Motif => "Motif",
                AmountField::Frais => "Frais",
                AmountField::Total => "Total à payer",
            },
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            TransferField::Destinataire(RecipientField::Pays | RecipientField::Agence) => {
                FieldKind::Choice
            }
            TransferField::Destinataire(RecipientField::AgenceNom)
            | TransferField::Transfert(AmountField::Frais | AmountField::Total) => {
                FieldKind::Derived
            }
            _ => FieldKind::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSection {
    pub nom: String,
    pub prenom: String,
    pub telephone: String,
    pub email: String,
    pub pays: String,
    pub piece_identite: String,
}

impl TextSection<SenderField> for SenderSection {
    fn text(&self, key: SenderField) -> Option<&str> {
        Some(match key {
            SenderField::Nom => &self.nom,
            SenderField::Prenom => &self.prenom,
            SenderField::Telephone => &self.telephone,
            SenderField::Email => &self.email,
            SenderField::Pays => &self.pays,
            SenderField::PieceIdentite => &self.piece_identite,
        })
    }

    fn text_mut(&mut self, key: SenderField) -> Option<&mut String> {
        Some(match key {
            SenderField::Nom => &mut self.nom,
            SenderField::Prenom => &mut self.prenom,
            SenderField::Telephone => &mut self.telephone,
            SenderField::Email => &mut self.email,
            SenderField::Pays => &mut self.pays,
            SenderField::PieceIdentite => &mut self.piece_identite,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientSection {
    pub nom: String,
    pub prenom: String,
    pub telephone: String,
    pub pays: String,
    pub agence: String,
    pub agence_nom: String,
    /// Country of the selected agency, checked against `pays`
    #[serde(skip)]
    pub agence_pays: String,
}

impl TextSection<RecipientField> for RecipientSection {
    fn text(&self, key: RecipientField) -> Option<&str> {
        match key {
            RecipientField::Nom => Some(&self.nom),
            RecipientField::Prenom => Some(&self.prenom),
            RecipientField::Telephone => Some(&self.telephone),
            RecipientField::Pays => Some(&self.pays),
            RecipientField::Agence => Some(&self.agence),
            RecipientField::AgenceNom => None,
        }
    }

    fn text_mut(&mut self, key: RecipientField) -> Option<&mut String> {
        match key {
            RecipientField::Nom => Some(&mut self.nom),
            RecipientField::Prenom => Some(&mut self.prenom),
            RecipientField::Telephone => Some(&mut self.telephone),
            RecipientField::Pays => Some(&mut self.pays),
            RecipientField::Agence => Some(&mut self.agence),
            RecipientField::AgenceNom => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountSection {
    pub montant: String,
    pub motif: String,
    pub frais: u64,
    pub total: u64,
}

impl TextSection<AmountField> for AmountSection {
    fn text(&self, key: AmountField) -> Option<&str> {
        match key {
            AmountField::Montant => Some(&self.montant),
            AmountField::Motif => Some(&self.motif),
            AmountField::Frais | AmountField::Total => None,
        }
    }

    fn text_mut(&mut self, key: AmountField) -> Option<&mut String> {
        match key {
            AmountField::Montant => Some(&mut self.montant),
            AmountField::Motif => Some(&mut self.motif),
            AmountField::Frais | AmountField::Total => None,
        }
    }
}

/// Transfer wizard form. Each section is shared until written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub expediteur: Arc<SenderSection>,
    pub destinataire: Arc<RecipientSection>,
    pub transfert: Arc<AmountSection>,
}

impl TransferForm {
    /// Set the amount and recompute fee and total
    pub fn set_montant(&mut self, raw: &str) -> bool {
        if !replace_leaf(&mut self.transfert, AmountField::Montant, raw) {
            return false;
        }
        let quote = Quote::from_input(raw);
        let section = Arc::make_mut(&mut self.transfert);
        section.frais = quote.fee;
        section.total = quote.total;
        true
    }

    /// Choose the withdrawal agency, filling its display name
    pub fn select_agency(&mut self, agency: &Agency) -> bool {
        let current = &self.destinataire;
        if current.agence == agency.id
            && current.agence_nom == agency.nom
            && current.agence_pays == agency.pays
        {
            return false;
        }
        let section = Arc::make_mut(&mut self.destinataire);
        section.agence = agency.id.clone();
        section.agence_nom = agency.nom.clone();
        section.agence_pays = agency.pays.clone();
        true
    }

    /// Amount, fee and total as currently entered
    pub fn quote(&self) -> Quote {
        Quote::from_input(&self.transfert.montant)
    }
}

impl WizardForm for TransferForm {
    type Step = TransferStep;
    type Field = TransferField;

    fn fields(step: TransferStep) -> &'static [TransferField] {
        use TransferField::*;
        match step {
            TransferStep::Expediteur => &[
                Expediteur(SenderField::Nom),
                Expediteur(SenderField::Prenom),
                Expediteur(SenderField::Telephone),
                Expediteur(SenderField::Email),
                Expediteur(SenderField::Pays),
                Expediteur(SenderField::PieceIdentite),
            ],
            TransferStep::Destinataire => &[
                Destinataire(RecipientField::Nom),
                Destinataire(RecipientField::Prenom),
                Destinataire(RecipientField::Telephone),
                Destinataire(RecipientField::Pays),
                Destinataire(RecipientField::Agence),
                Destinataire(RecipientField::AgenceNom),
            ],
            TransferStep::Transfert => &[
                Transfert(AmountField::Montant),
                Transfert(AmountField::Motif),
                Transfert(AmountField::Frais),
                Transfert(AmountField::Total),
            ],
        }
    }

    fn value(&self, field: TransferField) -> String {
        match field {
            TransferField::Expediteur(k) => self.expediteur.text(k).unwrap_or_default().to_string(),
            TransferField::Destinataire(RecipientField::AgenceNom) => {
                self.destinataire.agence_nom.clone()
            }
            TransferField::Destinataire(k) => {
                self.destinataire.text(k).unwrap_or_default().to_string()
            }
            TransferField::Transfert(AmountField::Frais) => self.transfert.frais.to_string(),
            TransferField::Transfert(AmountField::Total) => self.transfert.total.to_string(),
            TransferField::Transfert(k) => self.transfert.text(k).unwrap_or_default().to_string(),
        }
    }

    fn apply(&mut self, field: TransferField, value: &str) -> bool {
        match field {
            TransferField::Expediteur(k) => replace_leaf(&mut self.expediteur, k, value),
            TransferField::Destinataire(RecipientField::Agence) => {
                // A raw id carries no name or country; those come from select_agency
                if !replace_leaf(&mut self.destinataire, RecipientField::Agence, value) {
                    return false;
                }
                let section = Arc::make_mut(&mut self.destinataire);
                section.agence_nom.clear();
                section.agence_pays.clear();
                true
            }
            TransferField::Destinataire(k) => replace_leaf(&mut self.destinataire, k, value),
            TransferField::Transfert(AmountField::Montant) => self.set_montant(value),
            TransferField::Transfert(k) => replace_leaf(&mut self.transfert, k, value),
        }
    }

    fn validate(&self, step: TransferStep, policy: &FormPolicy) -> ErrorMap<TransferField> {
        let mut errors = ErrorMap::new();
        match step {
            TransferStep::Expediteur => {
                let s = &self.expediteur;
                let f = TransferField::Expediteur;
                require(&mut errors, f(SenderField::Nom), &s.nom, "Le nom est requis");
                require(&mut errors, f(SenderField::Prenom), &s.prenom, "Le prénom est requis");
                check_phone(&mut errors, f(SenderField::Telephone), &s.telephone);
                if !is_blank(&s.email) && !is_valid_email(&s.email) {
                    errors.insert(f(SenderField::Email), "Adresse e-mail invalide");
                }
                require(&mut errors, f(SenderField::Pays), &s.pays, "Le pays est requis");
                require(
                    &mut errors,
                    f(SenderField::PieceIdentite),
                    &s.piece_identite,
                    "La pièce d'identité est requise",
                );
            }
            TransferStep::Destinataire => {
                let r = &self.destinataire;
                let f = TransferField::Destinataire;
                require(&mut errors, f(RecipientField::Nom), &r.nom, "Le nom est requis");
                require(
                    &mut errors,
                    f(RecipientField::Prenom),
                    &r.prenom,
                    "Le prénom est requis",
                );
                check_phone(&mut errors, f(RecipientField::Telephone), &r.telephone);
                require(&mut errors, f(RecipientField::Pays), &r.pays, "Le pays est requis");
                check_agency(
                    &mut errors,
                    f(RecipientField::Agence),
                    &r.pays,
                    &r.agence,
                    &r.agence_nom,
                    &r.agence_pays,
                );
            }
            TransferStep::Transfert => {
                let t = &self.transfert;
                let f = TransferField::Transfert;
                check_amount(&mut errors, f(AmountField::Montant), &t.montant, policy);
                require(&mut errors, f(AmountField::Motif), &t.motif, "Le motif est requis");
            }
        }
        errors
    }

    fn choices(&self, field: TransferField, agencies: &[Agency]) -> Vec<Choice> {
        match field {
            TransferField::Destinataire(RecipientField::Pays) => countries(agencies)
                .into_iter()
                .map(|c| Choice::new(c.clone(), c))
                .collect(),
            TransferField::Destinataire(RecipientField::Agence) => {
                let pays = &self.destinataire.pays;
                agencies
                    .iter()
                    .filter(|a| pays.is_empty() || &a.pays == pays)
                    .map(|a| Choice::new(a.id.clone(), format!("{} ({})", a.nom, a.ville)))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn select(&mut self, field: TransferField, value: &str, agencies: &[Agency]) -> bool {
        match field {
            TransferField::Destinataire(RecipientField::Agence) => {
                match agencies.iter().find(|a| a.id == value) {
                    Some(agency) => self.select_agency(agency),
                    None => self.apply(field, value),
                }
            }
            _ => self.apply(field, value),
        }
    }
}

/// Workflow status of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[default]
    EnAttente,
    Valide,
    Rejete,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::EnAttente => "en_attente",
            TransferStatus::Valide => "valide",
            TransferStatus::Rejete => "rejete",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransferStatus::EnAttente => "En attente",
            TransferStatus::Valide => "Validé",
            TransferStatus::Rejete => "Rejeté",
        }
    }

    /// Only pending transfers can be decided, once
    pub fn can_become(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::EnAttente, TransferStatus::Valide | TransferStatus::Rejete)
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer handed to the back office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub id: String,
    pub expediteur: SenderSection,
    pub destinataire: RecipientSection,
    pub montant: u64,
    pub frais: u64,
    pub total: u64,
    pub devise: String,
    pub motif: String,
    pub code_retrait: String,
    pub statut: TransferStatus,
    pub date_creation: DateTime<Utc>,
}

impl TransferPayload {
    pub fn sender_name(&self) -> String {
        format!("{} {}", self.expediteur.prenom, self.expediteur.nom)
    }

    pub fn recipient_name(&self) -> String {
        format!("{} {}", self.destinataire.prenom, self.destinataire.nom)
    }
}

impl Submittable for TransferForm {
    type Payload = TransferPayload;

    fn build_payload<R: Rng + ?Sized>(
        &self,
        stamp: SubmissionStamp,
        policy: &FormPolicy,
        rng: &mut R,
    ) -> TransferPayload {
        let quote = self.quote();
        TransferPayload {
            id: stamp.id,
            expediteur: trimmed_sender(&self.expediteur),
            destinataire: trimmed_recipient(&self.destinataire),
            montant: quote.amount,
            frais: quote.fee,
            total: quote.total,
            devise: policy.currency.clone(),
            motif: self.transfert.motif.trim().to_string(),
            code_retrait: generate_withdrawal_code(rng),
            statut: TransferStatus::default(),
            date_creation: stamp.created_at,
        }
    }
}

fn trimmed_sender(s: &SenderSection) -> SenderSection {
    SenderSection {
        nom: s.nom.trim().to_string(),
        prenom: s.prenom.trim().to_string(),
        telephone: s.telephone.trim().to_string(),
        email: s.email.trim().to_string(),
        pays: s.pays.clone(),
        piece_identite: s.piece_identite.trim().to_string(),
    }
}

fn trimmed_recipient(r: &RecipientSection) -> RecipientSection {
    RecipientSection {
        nom: r.nom.trim().to_string(),
        prenom: r.prenom.trim().to_string(),
        telephone: r.telephone.trim().to_string(),
        ..r.clone()
    }
}
