use std::time::Duration;

use serde::Deserialize;

use crate::mailto::{LinkError, validate_recipient};

pub const DEFAULT_RECIPIENT: &str = "infotechiezz@gmail.com";
pub const DEFAULT_SUBJECT_PREFIX: &str = "Contact: ";
pub const DEFAULT_RESET_DELAY_MS: u64 = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse contact config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid recipient: {0}")]
    Recipient(#[from] LinkError),
    #[error("reset_delay_ms must be greater than zero")]
    ZeroResetDelay,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct NotificationText {
    pub title: String,
    pub description: String,
}

impl NotificationText {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Operator-side settings for the contact form.
///
/// Every key is optional in TOML; missing keys keep their defaults.
///
/// ```toml
/// recipient = "hello@example.com"
/// subject_prefix = "Website: "
/// reset_delay_ms = 3000
///
/// [failure]
/// title = "Error"
/// description = "Could not open your mail app."
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    pub recipient: String,
    pub subject_prefix: String,
    pub reset_delay_ms: u64,
    pub success: NotificationText,
    pub failure: NotificationText,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            reset_delay_ms: DEFAULT_RESET_DELAY_MS,
            success: NotificationText::new(
                "Email Client Opened",
                "Your default email app should open now.",
            ),
            failure: NotificationText::new(
                "Error",
                "Failed to open email client. Please try again.",
            ),
        }
    }
}

impl ContactConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_recipient(&self.recipient)?;
        if self.reset_delay_ms == 0 {
            return Err(ConfigError::ZeroResetDelay);
        }
        Ok(())
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn recipient(mut self, value: impl Into<String>) -> Self {
        self.recipient = value.into();
        self
    }

    pub fn reset_delay_ms(mut self, value: u64) -> Self {
        self.reset_delay_ms = value;
        self
    }
}
