mod schema;


use std::sync::Arc;

use futures::task::Spawn;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::ContactConfig;
use crate::feedback::{Notifier, Severity};
use crate::form::{
    FieldErrors, FieldIssue, FieldKey, FieldLens, FormController, FormModel, FormResult,
    FormSnapshot, ResetOutcome, ResetWatch, Submission, SubmissionPhase, SubscriptionId,
    ValidationError,
};
use crate::launcher::{DispatchError, MailLauncher, SystemMailLauncher};
use crate::mailto::{LinkError, MailtoLink};

pub use schema::register_schema;

/// What a visitor typed into the contact form.
#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum InquiryField {
    Name,
    Email,
    Subject,
    Message,
}

impl InquiryField {
    pub fn key(self) -> FieldKey {
        let fields = Inquiry::fields();
        match self {
            InquiryField::Name => fields.name().key(),
            InquiryField::Email => fields.email().key(),
            InquiryField::Subject => fields.subject().key(),
            InquiryField::Message => fields.message().key(),
        }
    }
}

/// Builds the compose request for one inquiry.
///
/// Field values go in exactly as typed; trimming only applies to validation.
pub fn compose_link(config: &ContactConfig, inquiry: &Inquiry) -> Result<MailtoLink, LinkError> {
    MailtoLink::new(
        config.recipient.clone(),
        format!("{}{}", config.subject_prefix, inquiry.subject),
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            inquiry.name, inquiry.email, inquiry.message
        ),
    )
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// A previous attempt is still submitting or showing its success state.
    Busy,
    /// At least one field failed validation; see the form errors.
    Invalid,
    /// The mail composer was asked to open. The form clears itself once the
    /// success window ends; the watch reports when that happened.
    Sent(ResetWatch),
    /// Building or launching the link failed; the inquiry is left as typed.
    DispatchFailed(DispatchError),
}

/// The contact form: four validated fields submitted through a `mailto:` link.
///
/// Clones share one form. The delayed reset after a successful submit runs on
/// the spawner given at construction. Call [`ContactForm::dispose`] when the
/// form goes away so a pending reset cannot touch it afterwards.
#[derive(Clone)]
pub struct ContactForm {
    controller: FormController<Inquiry, FieldIssue>,
    config: Arc<ContactConfig>,
    notifier: Arc<dyn Notifier>,
    launcher: Arc<dyn MailLauncher>,
    spawner: Arc<dyn Spawn + Send + Sync>,
}

impl ContactForm {
    pub fn new(
        config: ContactConfig,
        notifier: impl Notifier + 'static,
        launcher: impl MailLauncher + 'static,
        spawner: impl Spawn + Send + Sync + 'static,
    ) -> FormResult<Self> {
        let controller = FormController::new(Inquiry::default());
        register_schema(&controller)?;
        Ok(Self {
            controller,
            config: Arc::new(config),
            notifier: Arc::new(notifier),
            launcher: Arc::new(launcher),
            spawner: Arc::new(spawner),
        })
    }

    pub fn with_system_launcher(
        config: ContactConfig,
        notifier: impl Notifier + 'static,
        spawner: impl Spawn + Send + Sync + 'static,
    ) -> FormResult<Self> {
        Self::new(config, notifier, SystemMailLauncher, spawner)
    }

    pub fn controller(&self) -> &FormController<Inquiry, FieldIssue> {
        &self.controller
    }

    pub fn config(&self) -> &ContactConfig {
        &self.config
    }

    pub fn update_field(&self, field: InquiryField, value: impl Into<String>) -> FormResult<()> {
        let fields = Inquiry::fields();
        let value = value.into();
        match field {
            InquiryField::Name => self.controller.set(fields.name(), value),
            InquiryField::Email => self.controller.set(fields.email(), value),
            InquiryField::Subject => self.controller.set(fields.subject(), value),
            InquiryField::Message => self.controller.set(fields.message(), value),
        }
    }

    pub fn submit(&self) -> FormResult<SubmitOutcome> {
        let config = self.config.clone();
        let launcher = self.launcher.clone();
        let submission = self
            .controller
            .submit(|inquiry: &Inquiry| -> Result<(), DispatchError> {
                let link = compose_link(&config, inquiry)?;
                tracing::info!(recipient = link.recipient(), "opening mail composer");
                launcher.launch(&link.to_uri())
            })?;

        match submission {
            Submission::Busy => Ok(SubmitOutcome::Busy),
            Submission::Rejected => Ok(SubmitOutcome::Invalid),
            Submission::Dispatched(()) => {
                let success = &self.config.success;
                self.notifier
                    .notify(&success.title, &success.description, Severity::Neutral);
                let reset = self.controller.schedule_reset(self.config.reset_delay())?;
                let watch = match reset.spawn_on(&*self.spawner) {
                    Ok(watch) => watch,
                    Err(error) => {
                        tracing::error!(%error, "failed to spawn form reset, clearing now");
                        self.controller.reset_to_initial()?;
                        ResetWatch::resolved(ResetOutcome::Completed)
                    }
                };
                Ok(SubmitOutcome::Sent(watch))
            }
            Submission::Failed(error) => {
                tracing::error!(%error, "failed to open mail composer");
                let failure = &self.config.failure;
                self.notifier
                    .notify(&failure.title, &failure.description, Severity::Destructive);
                Ok(SubmitOutcome::DispatchFailed(error))
            }
        }
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<Inquiry, FieldIssue>> {
        self.controller.snapshot()
    }

    pub fn inquiry(&self) -> FormResult<Inquiry> {
        Ok(self.controller.snapshot()?.model)
    }

    pub fn phase(&self) -> FormResult<SubmissionPhase> {
        self.controller.phase()
    }

    pub fn errors(&self) -> FormResult<FieldErrors<FieldIssue>> {
        self.controller.errors()
    }

    pub fn error_message(&self, field: InquiryField) -> FormResult<Option<String>> {
        Ok(self
            .controller
            .errors()?
            .get(field.key())
            .map(ValidationError::message))
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&FormSnapshot<Inquiry, FieldIssue>) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        self.controller.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        self.controller.unsubscribe(id)
    }

    pub fn dispose(&self) -> FormResult<()> {
        self.controller.dispose()
    }
}
