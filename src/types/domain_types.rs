use super::ValidationError;
use std::fmt;

/// Characters of the secret shown by `Display`.
const VISIBLE_PREFIX: usize = 10;
const MIN_KEY_LENGTH: usize = 20;
const KEY_PREFIXES: [&str; 2] = ["secret_", "ntn_"];

/// Validated Notion integration secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        let reason = if key.is_empty() {
            Some("it is empty")
        } else if !KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
            Some("integration secrets start with 'secret_' or 'ntn_'")
        } else if key.len() < MIN_KEY_LENGTH {
            Some("it is too short")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ValidationError::InvalidApiKey { reason }),
            None => Ok(Self(key)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Secrets never show up in logs, only a prefix does.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible = self.0.get(..VISIBLE_PREFIX).unwrap_or_default();
        write!(f, "{}...", visible)
    }
}
