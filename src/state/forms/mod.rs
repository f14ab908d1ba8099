//! Form domain layer
//!
//! Concrete wizard forms (transfer, agent), their field rules and the fee
//! schedule, plus the per-view editing session wrapped around a wizard.

mod agent;
mod fees;
mod field;
mod form_state;
mod rules;
mod transfer;

pub use agent::{AgentPayload, AgentStatus, AGENT_ROLES};
pub use field::{Choice, FieldKind, FieldPath};
pub use form_state::{FormState, WizardSession};
pub use rules::{FormPolicy, DEFAULT_CURRENCY, DEFAULT_MAX_AMOUNT};
pub use transfer::{TransferPayload, TransferStatus};

#[cfg(test)]
pub use agent::{AccountField, AgentField, AgentForm, AssignmentField, IdentityField};
#[cfg(test)]
pub use transfer::{
    AmountField, RecipientField, RecipientSection, SenderField, SenderSection, TransferField,
    TransferForm, TransferStep,
};
