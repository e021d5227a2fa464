pub use crate::config::{ConfigError, ContactConfig, NotificationText};
pub use crate::contact::{ContactForm, Inquiry, InquiryField, SubmitOutcome, compose_link};
pub use crate::feedback::{Notifier, Severity, ToastEntry, ToastManager, TracingNotifier};
pub use crate::form::{
    FieldErrors, FieldIssue, FieldKey, FieldLens, FormController, FormError, FormModel,
    FormResult, FormSnapshot, ResetOutcome, ResetTask, ResetWatch, SubmissionPhase,
    ValidationError,
};
pub use crate::launcher::{DispatchError, MailLauncher, SystemMailLauncher};
pub use crate::mailto::{LinkError, MailtoLink};
