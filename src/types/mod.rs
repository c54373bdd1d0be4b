//! Value types shared by the model, the API layer and the caches.

use thiserror::Error;

mod colors;
mod domain_types;
mod ids;
mod rich_text;

pub use colors::*;
pub use domain_types::*;
pub use ids::*;
pub use rich_text::*;

/// A value from configuration or upstream that cannot be used as given.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Not a Notion id: {0}")]
    InvalidId(String),

    #[error("Unknown color '{0}'")]
    InvalidColor(String),

    #[error("Unusable API key: {reason}")]
    InvalidApiKey { reason: &'static str },
}
