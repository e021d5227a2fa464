use crate::form::rules::{email, max_len, min_len};
use crate::form::{FieldIssue, FormController, FormModel, FormResult};

use super::Inquiry;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const SUBJECT_MIN: usize = 3;
pub const SUBJECT_MAX: usize = 200;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 1_000;

/// Installs the contact rules: name, email, subject, message, in that order.
pub fn register_schema(controller: &FormController<Inquiry, FieldIssue>) -> FormResult<()> {
    let fields = Inquiry::fields();

    controller.register_field_validator(
        fields.name(),
        min_len(NAME_MIN, "Name must be at least 2 characters"),
    )?;
    controller.register_field_validator(fields.name(), max_len(NAME_MAX, "Name too long"))?;

    controller.register_field_validator(fields.email(), email("Invalid email address"))?;
    controller.register_field_validator(fields.email(), max_len(EMAIL_MAX, "Email too long"))?;

    controller.register_field_validator(
        fields.subject(),
        min_len(SUBJECT_MIN, "Subject must be at least 3 characters"),
    )?;
    controller.register_field_validator(
        fields.subject(),
        max_len(SUBJECT_MAX, "Subject too long"),
    )?;

    controller.register_field_validator(
        fields.message(),
        min_len(MESSAGE_MIN, "Message must be at least 10 characters"),
    )?;
    controller.register_field_validator(
        fields.message(),
        max_len(MESSAGE_MAX, "Message too long"),
    )?;
    Ok(())
}
