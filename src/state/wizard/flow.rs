//! Multi-step wizard: form store, step machine and validation gate

use super::errors::{ErrorMap, FieldPathError};
use super::machine::{Position, StepId};
use crate::state::forms::{Choice, FieldPath, FormPolicy};
use crate::state::Agency;
use std::fmt;

/// A concrete form driven by a [`Wizard`]
pub trait WizardForm: Clone + Default + fmt::Debug + Send + Sync + 'static {
    type Step: StepId;
    type Field: FieldPath;

    /// Fields rendered on a step, in focus order
    fn fields(step: Self::Step) -> &'static [Self::Field];

    /// Current value of a field as displayed
    fn value(&self, field: Self::Field) -> String;

    /// Replace a single leaf. Returns whether anything changed.
    /// Derived fields ignore writes.
    fn apply(&mut self, field: Self::Field, value: &str) -> bool;

    /// Check one step. Pure: the returned map holds only failing fields of
    /// that step, empty when the step is valid.
    fn validate(&self, step: Self::Step, policy: &FormPolicy) -> ErrorMap<Self::Field>;

    /// Options of a choice field
    fn choices(&self, _field: Self::Field, _agencies: &[Agency]) -> Vec<Choice> {
        Vec::new()
    }

    /// Apply a chosen option; fields that populate dependents override this
    fn select(&mut self, field: Self::Field, value: &str, _agencies: &[Agency]) -> bool {
        self.apply(field, value)
    }
}

/// Form data, error map and position of one wizard instance
#[derive(Debug, Clone)]
pub struct Wizard<F: WizardForm> {
    form: F,
    errors: ErrorMap<F::Field>,
    position: Position<F::Step>,
    policy: FormPolicy,
}

impl<F: WizardForm> Wizard<F> {
    pub fn new(policy: FormPolicy) -> Self {
        Self {
            form: F::default(),
            errors: ErrorMap::new(),
            position: Position::start(),
            policy,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn errors(&self) -> &ErrorMap<F::Field> {
        &self.errors
    }

    #[allow(dead_code)]
    pub fn position(&self) -> Position<F::Step> {
        self.position
    }

    pub fn policy(&self) -> &FormPolicy {
        &self.policy
    }

    pub fn current_step(&self) -> Option<F::Step> {
        self.position.step()
    }

    pub fn is_summary(&self) -> bool {
        self.position.is_summary()
    }

    /// Set a field's value. Its error, if any, is cleared right away.
    pub fn update(&mut self, field: F::Field, value: &str) {
        self.errors.remove(field);
        self.form.apply(field, value);
    }

    /// [`Wizard::update`] addressed by dotted path (`"destinataire.nom"`)
    #[allow(dead_code)]
    pub fn update_path(&mut self, path: &str, value: &str) -> Result<(), FieldPathError> {
        let field: F::Field = path.parse()?;
        self.update(field, value);
        Ok(())
    }

    /// Pick an option of a choice field, populating dependent fields
    pub fn select(&mut self, field: F::Field, value: &str, agencies: &[Agency]) {
        self.errors.remove(field);
        self.form.select(field, value, agencies);
    }

    /// Run an arbitrary typed setter on the form, clearing `field`'s error
    #[allow(dead_code)]
    pub fn edit<R>(&mut self, field: F::Field, setter: impl FnOnce(&mut F) -> R) -> R {
        self.errors.remove(field);
        setter(&mut self.form)
    }

    /// Validate the step being left and move forward.
    ///
    /// Returns `false` and surfaces the errors when the step is invalid; the
    /// position does not change. Steps already passed are not re-checked.
    pub fn next(&mut self) -> bool {
        let Some(step) = self.position.step() else {
            return false;
        };
        let errors = self.form.validate(step, &self.policy);
        if !errors.is_empty() {
            self.errors = errors;
            return false;
        }
        self.errors.clear();
        self.position = self.position.advance();
        true
    }

    /// Go back one step without validating
    pub fn prev(&mut self) {
        self.position = self.position.retreat();
    }

    /// Check the last step before submission.
    ///
    /// On failure the errors are surfaced and the wizard returns to the last
    /// step so they can be fixed.
    pub fn validate_final(&mut self) -> Result<(), usize> {
        let last = F::Step::last();
        let errors = self.form.validate(last, &self.policy);
        if errors.is_empty() {
            return Ok(());
        }
        let count = errors.len();
        self.errors = errors;
        self.position = Position::Step(last);
        Err(count)
    }

    /// Back to the first step with a blank form
    pub fn reset(&mut self) {
        self.form = F::default();
        self.errors.clear();
        self.position = Position::start();
    }
}
