//! Multi-step wizard core
//!
//! A [`Wizard`] owns one form, its error map and its position. Forms plug in
//! through [`WizardForm`]; the [`SubmissionController`] turns a completed
//! wizard into a payload for the back office.

mod errors;
mod flow;
mod machine;
mod submission;

pub use errors::{split_path, ErrorMap, FieldPathError};
pub use flow::{Wizard, WizardForm};
#[cfg(test)]
pub use machine::Position;
pub use machine::StepId;
pub use submission::{
    run_bounded, SubmissionController, SubmissionStamp, SubmitError, Submittable,
    DEFAULT_SUBMIT_TIMEOUT,
};
