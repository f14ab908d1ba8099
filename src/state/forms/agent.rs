//! Agent creation wizard: identity, assignment, account

use super::field::{replace_leaf, Choice, FieldKind, FieldPath, TextSection};
use super::rules::{check_agency, check_phone, is_valid_email, require};
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

/// Roles an agent can hold in an agency
pub const AGENT_ROLES: [(&str, &str); 3] = [
    ("caissier", "Caissier"),
    ("superviseur", "Superviseur"),
    ("gerant", "Gérant"),
];

const MIN_LOGIN_LEN: usize = 4;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgentStep {
    Identite,
    Affectation,
    Compte,
}

impl StepId for AgentStep {
    const ALL: &'static [Self] = &[AgentStep::Identite, AgentStep::Affectation, AgentStep::Compte];

    fn label(&self) -> &'static str {
        match self {
            AgentStep::Identite => "Identité",
            AgentStep::Affectation => "Affectation",
            AgentStep::Compte => "Compte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentityField {
    Nom,
    Prenom,
    Email,
    Telephone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssignmentField {
    Pays,
    Agence,
    AgenceNom,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountField {
    Identifiant,
    MotDePasse,
    Confirmation,
}

/// Path to one field of [`AgentForm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgentField {
    Identite(IdentityField),
    Affectation(AssignmentField),
    Compte(AccountField),
}

impl AgentField {
    const ALL: [Self; 11] = [
        AgentField::Identite(IdentityField::Nom),
        AgentField::Identite(IdentityField::Prenom),
        AgentField::Identite(IdentityField::Email),
        AgentField::Identite(IdentityField::Telephone),
        AgentField::Affectation(AssignmentField::Pays),
        AgentField::Affectation(AssignmentField::Agence),
        AgentField::Affectation(AssignmentField::AgenceNom),
        AgentField::Affectation(AssignmentField::Role),
        AgentField::Compte(AccountField::Identifiant),
        AgentField::Compte(AccountField::MotDePasse),
        AgentField::Compte(AccountField::Confirmation),
    ];

    fn section(&self) -> &'static str {
        match self {
            AgentField::Identite(_) => "identite",
            AgentField::Affectation(_) => "affectation",
            AgentField::Compte(_) => "compte",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            AgentField::Identite(k) => match k {
                IdentityField::Nom => "nom",
                IdentityField::Prenom => "prenom",
                IdentityField::Email => "email",
                IdentityField::Telephone => "telephone",
            },
            AgentField::Affectation(k) => match k {
                AssignmentField::Pays => "pays",
                AssignmentField::Agence => "agence",
                AssignmentField::AgenceNom => "agence_nom",
                AssignmentField::Role => "role",
            },
            AgentField::Compte(k) => match k {
                AccountField::Identifiant => "identifiant",
                AccountField::MotDePasse => "mot_de_passe",
                AccountField::Confirmation => "confirmation",
            },
        }
    }
}

impl fmt::Display for AgentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}

impl FromStr for AgentField {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = split_path(s)?;
        if !AgentField::ALL.iter().any(|f| f.section() == section) {
            return Err(FieldPathError::UnknownSection(section.to_string()));
        }
        AgentField::ALL
            .into_iter()
            .find(|f| f.section() == section && f.key() == key)
            .ok_or_else(|| FieldPathError::UnknownField {
                section: section.to_string(),
                field: key.to_string(),
            })
    }
}

impl FieldPath for AgentField {
    fn label(&self) -> &'static str {
        match self {
            AgentField::Identite(k) => match k {
                IdentityField::Nom => "Nom",
                IdentityField::Prenom => "Prénom",
                IdentityField::Email => "E-mail",
                IdentityField::Telephone => "Téléphone",
            },
            AgentField::Affectation(k) => match k {
                AssignmentField::Pays => "Pays",
                AssignmentField::Agence => "Agence",
                AssignmentField::AgenceNom => "Nom de l'agence",
                AssignmentField::Role => "Rôle",
            },
            AgentField::Compte(k) => match k {
                AccountField::Identifiant => "Identifiant",
                AccountField::MotDePasse => "Mot de passe",
                AccountField::Confirmation => "Confirmation",
            },
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            AgentField::Affectation(AssignmentField::AgenceNom) => FieldKind::Derived,
            AgentField::Affectation(_) => FieldKind::Choice,
            AgentField::Compte(AccountField::MotDePasse | AccountField::Confirmation) => {
                FieldKind::Secret
            }
            _ => FieldKind::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySection {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
}

impl TextSection<IdentityField> for IdentitySection {
    fn text(&self, key: IdentityField) -> Option<&str> {
        Some(match key {
            IdentityField::Nom => &self.nom,
            IdentityField::Prenom => &self.prenom,
            IdentityField::Email => &self.email,
            IdentityField::Telephone => &self.telephone,
        })
    }

    fn text_mut(&mut self, key: IdentityField) -> Option<&mut String> {
        Some(match key {
            IdentityField::Nom => &mut self.nom,
            IdentityField::Prenom => &mut self.prenom,
            IdentityField::Email => &mut self.email,
            IdentityField::Telephone => &mut self.telephone,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentSection {
    pub pays: String,
    pub agence: String,
    pub agence_nom: String,
    pub agence_pays: String,
    pub role: String,
}

impl TextSection<AssignmentField> for AssignmentSection {
    fn text(&self, key: AssignmentField) -> Option<&str> {
        match key {
            AssignmentField::Pays => Some(&self.pays),
            AssignmentField::Agence => Some(&self.agence),
            AssignmentField::Role => Some(&self.role),
            AssignmentField::AgenceNom => None,
        }
    }

    fn text_mut(&mut self, key: AssignmentField) -> Option<&mut String> {
        match key {
            AssignmentField::Pays => Some(&mut self.pays),
            AssignmentField::Agence => Some(&mut self.agence),
            AssignmentField::Role => Some(&mut self.role),
            AssignmentField::AgenceNom => None,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountSection {
    pub identifiant: String,
    pub mot_de_passe: String,
    pub confirmation: String,
}

impl fmt::Debug for AccountSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSection")
            .field("identifiant", &self.identifiant)
            .finish_non_exhaustive()
    }
}

impl TextSection<AccountField> for AccountSection {
    fn text(&self, key: AccountField) -> Option<&str> {
        Some(match key {
            AccountField::Identifiant => &self.identifiant,
            AccountField::MotDePasse => &self.mot_de_passe,
            AccountField::Confirmation => &self.confirmation,
        })
    }

    fn text_mut(&mut self, key: AccountField) -> Option<&mut String> {
        Some(match key {
            AccountField::Identifiant => &mut self.identifiant,
            AccountField::MotDePasse => &mut self.mot_de_passe,
            AccountField::Confirmation => &mut self.confirmation,
        })
    }
}

/// Agent wizard form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentForm {
    pub identite: Arc<IdentitySection>,
    pub affectation: Arc<AssignmentSection>,
    pub compte: Arc<AccountSection>,
}

impl AgentForm {
    /// Attach the agent to an agency, filling its display name
    pub fn select_agency(&mut self, agency: &Agency) -> bool {
        let current = &self.affectation;
        if current.agence == agency.id
            && current.agence_nom == agency.nom
            && current.agence_pays == agency.pays
        {
            return false;
        }
        let section = Arc::make_mut(&mut self.affectation);
        section.agence = agency.id.clone();
        section.agence_nom = agency.nom.clone();
        section.agence_pays = agency.pays.clone();
        true
    }
}

impl WizardForm for AgentForm {
    type Step = AgentStep;
    type Field = AgentField;

    fn fields(step: AgentStep) -> &'static [AgentField] {
        match step {
            AgentStep::Identite => &AgentField::ALL[0..4],
            AgentStep::Affectation => &AgentField::ALL[4..8],
            AgentStep::Compte => &AgentField::ALL[8..11],
        }
    }

    fn value(&self, field: AgentField) -> String {
        match field {
            AgentField::Identite(k) => self.identite.text(k).unwrap_or_default().to_string(),
            AgentField::Affectation(AssignmentField::AgenceNom) => {
                self.affectation.agence_nom.clone()
            }
            AgentField::Affectation(k) => self.affectation.text(k).unwrap_or_default().to_string(),
            AgentField::Compte(k) => self.compte.text(k).unwrap_or_default().to_string(),
        }
    }

    fn apply(&mut self, field: AgentField, value: &str) -> bool {
        match field {
            AgentField::Identite(k) => replace_leaf(&mut self.identite, k, value),
            AgentField::Affectation(AssignmentField::Agence) => {
                if !replace_leaf(&mut self.affectation, AssignmentField::Agence, value) {
                    return false;
                }
                let section = Arc::make_mut(&mut self.affectation);
                section.agence_nom.clear();
                section.agence_pays.clear();
                true
            }
            AgentField::Affectation(k) => replace_leaf(&mut self.affectation, k, value),
            AgentField::Compte(k) => replace_leaf(&mut self.compte, k, value),
        }
    }

    fn validate(&self, step: AgentStep, _policy: &FormPolicy) -> ErrorMap<AgentField> {
        let mut errors = ErrorMap::new();
        match step {
            AgentStep::Identite => {
                let s = &self.identite;
                let f = AgentField::Identite;
                require(&mut errors, f(IdentityField::Nom), &s.nom, "Le nom est requis");
                require(&mut errors, f(IdentityField::Prenom), &s.prenom, "Le prénom est requis");
                if require(
                    &mut errors,
                    f(IdentityField::Email),
                    &s.email,
                    "L'adresse e-mail est requise",
                ) && !is_valid_email(&s.email)
                {
                    errors.insert(f(IdentityField::Email), "Adresse e-mail invalide");
                }
                check_phone(&mut errors, f(IdentityField::Telephone), &s.telephone);
            }
            AgentStep::Affectation => {
                let a = &self.affectation;
                let f = AgentField::Affectation;
                require(&mut errors, f(AssignmentField::Pays), &a.pays, "Le pays est requis");
                check_agency(
                    &mut errors,
                    f(AssignmentField::Agence),
                    &a.pays,
                    &a.agence,
                    &a.agence_nom,
                    &a.agence_pays,
                );
                if require(&mut errors, f(AssignmentField::Role), &a.role, "Le rôle est requis")
                    && !AGENT_ROLES.iter().any(|(value, _)| *value == a.role)
                {
                    errors.insert(f(AssignmentField::Role), "Rôle inconnu");
                }
            }
            AgentStep::Compte => {
                let c = &self.compte;
                let f = AgentField::Compte;
                let login = c.identifiant.trim();
                if require(
                    &mut errors,
                    f(AccountField::Identifiant),
                    login,
                    "L'identifiant est requis",
                ) && (login.chars().count() < MIN_LOGIN_LEN
                    || login.chars().any(char::is_whitespace))
                {
                    errors.insert(
                        f(AccountField::Identifiant),
                        "L'identifiant doit faire au moins 4 caractères, sans espace",
                    );
                }
                if require(
                    &mut errors,
                    f(AccountField::MotDePasse),
                    &c.mot_de_passe,
                    "Le mot de passe est requis",
                ) && (c.mot_de_passe.chars().count() < MIN_PASSWORD_LEN
                    || !c.mot_de_passe.chars().any(|ch| ch.is_ascii_digit()))
                {
                    errors.insert(
                        f(AccountField::MotDePasse),
                        "Au moins 8 caractères dont un chiffre",
                    );
                }
                if c.confirmation != c.mot_de_passe {
                    errors.insert(
                        f(AccountField::Confirmation),
                        "Les mots de passe ne correspondent pas",
                    );
                }
            }
        }
        errors
    }

    fn choices(&self, field: AgentField, agencies: &[Agency]) -> Vec<Choice> {
        match field {
            AgentField::Affectation(AssignmentField::Pays) => countries(agencies)
                .into_iter()
                .map(|c| Choice::new(c.clone(), c))
                .collect(),
            AgentField::Affectation(AssignmentField::Agence) => {
                let pays = &self.affectation.pays;
                agencies
                    .iter()
                    .filter(|a| pays.is_empty() || &a.pays == pays)
                    .map(|a| Choice::new(a.id.clone(), format!("{} ({})", a.nom, a.ville)))
                    .collect()
            }
            AgentField::Affectation(AssignmentField::Role) => AGENT_ROLES
                .iter()
                .map(|(value, label)| Choice::new(*value, *label))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn select(&mut self, field: AgentField, value: &str, agencies: &[Agency]) -> bool {
        match field {
            AgentField::Affectation(AssignmentField::Agence) => {
                match agencies.iter().find(|a| a.id == value) {
                    Some(agency) => self.select_agency(agency),
                    None => self.apply(field, value),
                }
            }
            _ => self.apply(field, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Actif,
    Suspendu,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Actif => "actif",
            AgentStatus::Suspendu => "suspendu",
        }
    }
}

/// Agent handed to the back office. The password never leaves in
/// serialized form or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub pays: String,
    pub agence: String,
    pub agence_nom: String,
    pub role: String,
    pub identifiant: String,
    #[serde(skip)]
    pub mot_de_passe: String,
    pub statut: AgentStatus,
    pub date_creation: DateTime<Utc>,
}

impl fmt::Debug for AgentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentPayload")
            .field("id", &self.id)
            .field("identifiant", &self.identifiant)
            .field("agence", &self.agence)
            .field("role", &self.role)
            .field("statut", &self.statut)
            .finish_non_exhaustive()
    }
}

impl Submittable for AgentForm {
    type Payload = AgentPayload;

    fn build_payload<R: Rng + ?Sized>(
        &self,
        stamp: SubmissionStamp,
        _policy: &FormPolicy,
        _rng: &mut R,
    ) -> AgentPayload {
        let (i, a, c) = (&self.identite, &self.affectation, &self.compte);
        AgentPayload {
            id: stamp.id,
            nom: i.nom.trim().to_string(),
            prenom: i.prenom.trim().to_string(),
            email: i.email.trim().to_lowercase(),
            telephone: i.telephone.trim().to_string(),
            pays: a.pays.clone(),
            agence: a.agence.clone(),
            agence_nom: a.agence_nom.clone(),
            role: a.role.clone(),
            identifiant: c.identifiant.trim().to_string(),
            mot_de_passe: c.mot_de_passe.clone(),
            statut: AgentStatus::default(),
            date_creation: stamp.created_at,
        }
    }
}
