mod controller;
mod reset;
pub mod rules;
mod validation;

#[cfg(test)]
mod tests;

pub use controller::{
    FieldErrors, FieldKey, FormController, FormError, FormId, FormResult, FormSnapshot,
    SubmissionPhase, Submission, SubscriptionId,
};
pub use mailform_derive::FormModel;
pub use reset::{ResetOutcome, ResetTask, ResetWatch};
pub use rules::FieldIssue;
pub use validation::{FieldLens, FieldValidator, FormModel, ValidationError};
