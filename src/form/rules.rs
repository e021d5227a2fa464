//! Text rules for `String` fields.
//!
//! Every rule trims the value first and measures length in Unicode scalar
//! values.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;

use super::validation::{FieldLens, FieldValidator, ValidationError};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@(?:[a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
        .expect("email pattern must compile")
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuleViolation {
    TooShort { min: usize },
    TooLong { max: usize },
    InvalidEmail,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldIssue {
    violation: RuleViolation,
    message: Cow<'static, str>,
}

impl FieldIssue {
    pub fn new(violation: RuleViolation, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            violation,
            message: message.into(),
        }
    }

    pub fn violation(&self) -> RuleViolation {
        self.violation
    }
}

impl ValidationError for FieldIssue {
    fn message(&self) -> String {
        self.message.to_string()
    }
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Clone, Debug)]
pub struct MinLength {
    min: usize,
    message: Cow<'static, str>,
}

pub fn min_len(min: usize, message: impl Into<Cow<'static, str>>) -> MinLength {
    MinLength {
        min,
        message: message.into(),
    }
}

impl<T, L> FieldValidator<T, L, FieldIssue> for MinLength
where
    L: FieldLens<T, Value = String>,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), FieldIssue> {
        if trimmed_len(value) < self.min {
            return Err(FieldIssue::new(
                RuleViolation::TooShort { min: self.min },
                self.message.clone(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MaxLength {
    max: usize,
    message: Cow<'static, str>,
}

pub fn max_len(max: usize, message: impl Into<Cow<'static, str>>) -> MaxLength {
    MaxLength {
        max,
        message: message.into(),
    }
}

impl<T, L> FieldValidator<T, L, FieldIssue> for MaxLength
where
    L: FieldLens<T, Value = String>,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), FieldIssue> {
        if trimmed_len(value) > self.max {
            return Err(FieldIssue::new(
                RuleViolation::TooLong { max: self.max },
                self.message.clone(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct EmailAddress {
    message: Cow<'static, str>,
}

pub fn email(message: impl Into<Cow<'static, str>>) -> EmailAddress {
    EmailAddress {
        message: message.into(),
    }
}

impl<T, L> FieldValidator<T, L, FieldIssue> for EmailAddress
where
    L: FieldLens<T, Value = String>,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), FieldIssue> {
        if is_email_address(value.trim()) {
            Ok(())
        } else {
            Err(FieldIssue::new(
                RuleViolation::InvalidEmail,
                self.message.clone(),
            ))
        }
    }
}

/// Accepts `local@label.label.tld` where the local part never starts with a
/// dot and no part of the address contains `..`.
pub fn is_email_address(candidate: &str) -> bool {
    !candidate.starts_with('.') && !candidate.contains("..") && EMAIL_PATTERN.is_match(candidate)
}

fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}
