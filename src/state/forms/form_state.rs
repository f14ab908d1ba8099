//! Editing session around a wizard: focus, keystrokes, submission gate

use super::agent::AgentForm;
use super::field::{FieldKind, FieldPath};
use super::rules::FormPolicy;
use super::transfer::TransferForm;
use crate::state::wizard::{
    StepId, SubmissionController, SubmitError, Submittable, Wizard,
};
use crate::state::Agency;
use std::time::Duration;

/// One open wizard with its focused field and submission controller
#[derive(Debug, Clone)]
pub struct WizardSession<F: Submittable> {
    pub wizard: Wizard<F>,
    pub submission: SubmissionController,
    active_field: usize,
}

impl<F: Submittable> WizardSession<F> {
    pub fn new(policy: FormPolicy, timeout: Duration) -> Self {
        Self {
            wizard: Wizard::new(policy),
            submission: SubmissionController::new(timeout),
            active_field: 0,
        }
    }

    /// Fields of the current step that take input, in focus order
    pub fn editable_fields(&self) -> Vec<F::Field> {
        match self.wizard.current_step() {
            Some(step) => F::fields(step)
                .iter()
                .copied()
                .filter(|f| f.kind().is_editable())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn active_field(&self) -> Option<F::Field> {
        self.editable_fields().get(self.active_field).copied()
    }

    pub fn is_busy(&self) -> bool {
        self.submission.is_busy()
    }

    pub fn next_field(&mut self) {
        let count = self.editable_fields().len();
        if count > 0 {
            self.active_field = (self.active_field + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.editable_fields().len();
        if count == 0 {
            return;
        }
        if self.active_field == 0 {
            self.active_field = count - 1;
        } else {
            self.active_field -= 1;
        }
    }

    fn focus(&mut self, field: F::Field) {
        if let Some(index) = self.editable_fields().iter().position(|f| *f == field) {
            self.active_field = index;
        }
    }

    fn focus_first_error(&mut self) {
        let first = self.wizard.errors().fields().next();
        if let Some(field) = first {
            self.focus(field);
        }
    }

    fn text_target(&self) -> Option<F::Field> {
        if self.is_busy() {
            return None;
        }
        self.active_field()
            .filter(|f| matches!(f.kind(), FieldKind::Text | FieldKind::Secret))
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(field) = self.text_target() {
            let mut value = self.wizard.form().value(field);
            value.push(c);
            self.wizard.update(field, &value);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.text_target() {
            let mut value = self.wizard.form().value(field);
            if value.pop().is_some() {
                self.wizard.update(field, &value);
            }
        }
    }

    /// Step the focused choice field to its next or previous option
    pub fn cycle_choice(&mut self, forward: bool, agencies: &[Agency]) {
        if self.is_busy() {
            return;
        }
        let Some(field) = self.active_field() else {
            return;
        };
        if field.kind() != FieldKind::Choice {
            return;
        }
        let options = self.wizard.form().choices(field, agencies);
        if options.is_empty() {
            return;
        }
        let current = self.wizard.form().value(field);
        let position = options.iter().position(|o| o.value == current);
        let index = match (position, forward) {
            (None, true) => 0,
            (None, false) => options.len() - 1,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(0), false) => options.len() - 1,
            (Some(i), false) => i - 1,
        };
        let value = options[index].value.clone();
        self.wizard.select(field, &value, agencies);
    }

    /// Move to the next step, or focus the first invalid field
    pub fn advance(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        if self.wizard.next() {
            self.active_field = 0;
            true
        } else {
            self.focus_first_error();
            false
        }
    }

    pub fn retreat(&mut self) {
        if self.is_busy() {
            return;
        }
        self.wizard.prev();
        self.active_field = 0;
    }

    pub fn is_on_first_step(&self) -> bool {
        self.wizard.current_step() == Some(F::Step::first())
    }

    /// Start submitting; see [`SubmissionController::begin`]
    pub fn begin_submit(&mut self) -> Result<F::Payload, SubmitError> {
        let result = self.submission.begin(&mut self.wizard);
        if matches!(result, Err(SubmitError::Validation { .. })) {
            self.focus_first_error();
        }
        result
    }

    /// Settle a submission started with [`WizardSession::begin_submit`]
    pub fn finish_submit(&mut self, outcome: Result<(), SubmitError>) -> Result<(), SubmitError> {
        let result = self.submission.finish(&mut self.wizard, outcome);
        if result.is_ok() {
            self.active_field = 0;
        }
        result
    }
}

/// The wizard open in the current view, if any
#[derive(Debug, Clone, Default)]
pub enum FormState {
    #[default]
    None,
    Transfer(Box<WizardSession<TransferForm>>),
    Agent(Box<WizardSession<AgentForm>>),
}

impl FormState {
    pub fn transfer(policy: FormPolicy, timeout: Duration) -> Self {
        FormState::Transfer(Box::new(WizardSession::new(policy, timeout)))
    }

    pub fn agent(policy: FormPolicy, timeout: Duration) -> Self {
        FormState::Agent(Box::new(WizardSession::new(policy, timeout)))
    }

    pub fn next_field(&mut self) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.next_field(),
            FormState::Agent(s) => s.next_field(),
        }
    }

    pub fn prev_field(&mut self) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.prev_field(),
            FormState::Agent(s) => s.prev_field(),
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.input_char(c),
            FormState::Agent(s) => s.input_char(c),
        }
    }

    pub fn backspace(&mut self) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.backspace(),
            FormState::Agent(s) => s.backspace(),
        }
    }

    pub fn cycle_choice(&mut self, forward: bool, agencies: &[Agency]) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.cycle_choice(forward, agencies),
            FormState::Agent(s) => s.cycle_choice(forward, agencies),
        }
    }

    pub fn advance(&mut self) -> bool {
        match self {
            FormState::None => false,
            FormState::Transfer(s) => s.advance(),
            FormState::Agent(s) => s.advance(),
        }
    }

    pub fn retreat(&mut self) {
        match self {
            FormState::None => {}
            FormState::Transfer(s) => s.retreat(),
            FormState::Agent(s) => s.retreat(),
        }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            FormState::None => false,
            FormState::Transfer(s) => s.is_busy(),
            FormState::Agent(s) => s.is_busy(),
        }
    }

    pub fn is_summary(&self) -> bool {
        match self {
            FormState::None => false,
            FormState::Transfer(s) => s.wizard.is_summary(),
            FormState::Agent(s) => s.wizard.is_summary(),
        }
    }

    pub fn is_on_first_step(&self) -> bool {
        match self {
            FormState::None => true,
            FormState::Transfer(s) => s.is_on_first_step(),
            FormState::Agent(s) => s.is_on_first_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::{
        AccountField, AgentField, AmountField, RecipientField, SenderField, TransferField,
        TransferStep,
    };
    use crate::state::wizard::DEFAULT_SUBMIT_TIMEOUT;

    fn session() -> WizardSession<TransferForm> {
        WizardSession::new(FormPolicy::default(), DEFAULT_SUBMIT_TIMEOUT)
    }

    fn agencies() -> Vec<Agency> {
        vec![
            Agency::new("AG-BKO-01", "Bamako Centre", "Mali", "Bamako"),
            Agency::new("AG-DKR-01", "Dakar Plateau", "Sénégal", "Dakar"),
            Agency::new("AG-DKR-02", "Dakar Médina", "Sénégal", "Dakar"),
        ]
    }

    fn type_text(s: &mut WizardSession<TransferForm>, text: &str) {
        for c in text.chars() {
            s.input_char(c);
        }
    }

    mod focus {
        use super::*;

        #[test]
        fn test_focus_wraps_both_ways() {
            let mut s = session();
            assert_eq!(
                s.active_field(),
                Some(TransferField::Expediteur(SenderField::Nom))
            );
            s.prev_field();
            assert_eq!(
                s.active_field(),
                Some(TransferField::Expediteur(SenderField::PieceIdentite))
            );
            s.next_field();
            assert_eq!(
                s.active_field(),
                Some(TransferField::Expediteur(SenderField::Nom))
            );
        }

        #[test]
        fn test_derived_fields_are_skipped() {
            let mut s = session();
            s.wizard.update(TransferField::Expediteur(SenderField::Nom), "Diop");
            s.wizard.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
            s.wizard
                .update(TransferField::Expediteur(SenderField::Telephone), "771234567");
            s.wizard.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
            s.wizard
                .update(TransferField::Expediteur(SenderField::PieceIdentite), "CNI 1");
            assert!(s.advance());
            let fields = s.editable_fields();
            assert_eq!(fields.len(), 5);
            assert!(!fields.contains(&TransferField::Destinataire(RecipientField::AgenceNom)));
        }

        #[test]
        fn test_failed_advance_focuses_first_error() {
            let mut s = session();
            type_text(&mut s, "Diop");
            s.next_field();
            type_text(&mut s, "Awa");
            s.next_field();
            s.next_field();
            s.next_field();
            assert!(!s.advance());
            assert_eq!(
                s.active_field(),
                Some(TransferField::Expediteur(SenderField::Telephone))
            );
        }
    }

    mod editing {
        use super::*;

        #[test]
        fn test_typing_and_backspace_edit_focused_field() {
            let mut s = session();
            type_text(&mut s, "Diopp");
            s.backspace();
            assert_eq!(s.wizard.form().expediteur.nom, "Diop");
        }

        #[test]
        fn test_typing_amount_updates_quote() {
            let mut s = session();
            s.wizard.edit(TransferField::Transfert(AmountField::Montant), |f| {
                f.set_montant("1")
            });
            assert_eq!(s.wizard.form().transfert.frais, 5);
        }

        #[test]
        fn test_choice_cycles_through_countries() {
            let mut s = session();
            s.wizard.update(TransferField::Expediteur(SenderField::Nom), "Diop");
            s.wizard.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
            s.wizard
                .update(TransferField::Expediteur(SenderField::Telephone), "771234567");
            s.wizard.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
            s.wizard
                .update(TransferField::Expediteur(SenderField::PieceIdentite), "CNI 1");
            assert!(s.advance());
            for _ in 0..3 {
                s.next_field();
            }
            assert_eq!(
                s.active_field(),
                Some(TransferField::Destinataire(RecipientField::Pays))
            );
            s.cycle_choice(true, &agencies());
            assert_eq!(s.wizard.form().destinataire.pays, "Mali");
            s.cycle_choice(true, &agencies());
            assert_eq!(s.wizard.form().destinataire.pays, "Sénégal");
            s.cycle_choice(true, &agencies());
            assert_eq!(s.wizard.form().destinataire.pays, "Mali");

            s.cycle_choice(false, &agencies());
            s.next_field();
            s.cycle_choice(true, &agencies());
            assert_eq!(s.wizard.form().destinataire.agence, "AG-DKR-01");
            assert_eq!(s.wizard.form().destinataire.agence_nom, "Dakar Plateau");
            s.cycle_choice(false, &agencies());
            assert_eq!(s.wizard.form().destinataire.agence, "AG-DKR-02");
        }

        #[test]
        fn test_typed_chars_ignored_on_choice_fields() {
            let mut s = session();
            s.wizard.update(TransferField::Expediteur(SenderField::Nom), "Diop");
            s.wizard.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
            s.wizard
                .update(TransferField::Expediteur(SenderField::Telephone), "771234567");
            s.wizard.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
            s.wizard
                .update(TransferField::Expediteur(SenderField::PieceIdentite), "CNI 1");
            assert!(s.advance());
            for _ in 0..3 {
                s.next_field();
            }
            s.input_char('x');
            assert_eq!(s.wizard.form().destinataire.pays, "");
        }

        #[test]
        fn test_secret_fields_take_text() {
            let mut s: WizardSession<AgentForm> =
                WizardSession::new(FormPolicy::default(), DEFAULT_SUBMIT_TIMEOUT);
            s.wizard
                .update(AgentField::Compte(AccountField::MotDePasse), "abc");
            assert_eq!(s.wizard.form().compte.mot_de_passe, "abc");
        }
    }

    mod busy {
        use super::*;

        #[test]
        fn test_busy_session_ignores_edits_and_navigation() {
            let mut s = session();
            s.wizard.update(TransferField::Expediteur(SenderField::Nom), "Diop");
            s.wizard.update(TransferField::Expediteur(SenderField::Prenom), "Awa");
            s.wizard
                .update(TransferField::Expediteur(SenderField::Telephone), "771234567");
            s.wizard.update(TransferField::Expediteur(SenderField::Pays), "Sénégal");
            s.wizard
                .update(TransferField::Expediteur(SenderField::PieceIdentite), "CNI 1");
            assert!(s.advance());
            s.wizard
                .update(TransferField::Destinataire(RecipientField::Nom), "Ndiaye");
            s.wizard
                .update(TransferField::Destinataire(RecipientField::Prenom), "Moussa");
            s.wizard
                .update(TransferField::Destinataire(RecipientField::Telephone), "771112233");
            s.wizard
                .update(TransferField::Destinataire(RecipientField::Pays), "Mali");
            s.wizard.select(
                TransferField::Destinataire(RecipientField::Agence),
                "AG-BKO-01",
                &agencies(),
            );
            assert!(s.advance());
            s.wizard
                .update(TransferField::Transfert(AmountField::Montant), "100");
            s.wizard
                .update(TransferField::Transfert(AmountField::Motif), "Famille");
            assert!(s.advance());

            let payload = s.begin_submit().expect("valid form");
            assert_eq!(payload.total, 105);
            assert!(s.is_busy());
            s.retreat();
            assert!(s.wizard.is_summary());
            assert_eq!(s.begin_submit().unwrap_err(), SubmitError::Busy);

            assert!(s.finish_submit(Ok(())).is_ok());
            assert!(!s.is_busy());
            assert_eq!(s.wizard.current_step(), Some(TransferStep::Expediteur));
        }
    }

    #[test]
    fn test_form_state_dispatch() {
        let mut state = FormState::transfer(FormPolicy::default(), DEFAULT_SUBMIT_TIMEOUT);
        state.input_char('A');
        state.next_field();
        assert!(state.is_on_first_step());
        assert!(!state.advance());
        assert!(!state.is_summary());
        match &state {
            FormState::Transfer(s) => assert_eq!(s.wizard.form().expediteur.nom, "A"),
            _ => panic!("expected transfer wizard"),
        }

        let mut none = FormState::default();
        none.input_char('x');
        assert!(!none.advance());
        assert!(!none.is_busy());
    }
}
