// src/error.rs
//! Build errors.
//!
//! The retry policy and the per-entry recovery of the post-processors
//! dispatch on these variants, never on message text.

use std::fmt;
use thiserror::Error;

/// The `code` field of a Notion error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    RateLimited,
    ObjectNotFound,
    Unauthorized,
    RestrictedResource,
    InvalidJson,
    ValidationFailed,
    Conflict,
    InternalError,
    ServiceUnavailable,
    /// No parseable body; only the status is known.
    HttpStatus(u16),
    Unknown(String),
}

/// Wire names of the codes the build distinguishes.
const WIRE_CODES: &[(&str, NotionErrorCode)] = &[
    ("rate_limited", NotionErrorCode::RateLimited),
    ("object_not_found", NotionErrorCode::ObjectNotFound),
    ("unauthorized", NotionErrorCode::Unauthorized),
    ("restricted_resource", NotionErrorCode::RestrictedResource),
    ("invalid_json", NotionErrorCode::InvalidJson),
    ("validation_error", NotionErrorCode::ValidationFailed),
    ("conflict_error", NotionErrorCode::Conflict),
    ("internal_server_error", NotionErrorCode::InternalError),
    ("service_unavailable", NotionErrorCode::ServiceUnavailable),
];

impl NotionErrorCode {
    pub fn from_api_response(code: &str) -> Self {
        WIRE_CODES
            .iter()
            .find(|(wire, _)| *wire == code)
            .map(|(_, known)| known.clone())
            .unwrap_or_else(|| Self::Unknown(code.to_string()))
    }

    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound | Self::HttpStatus(404))
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "http_{}", status),
            Self::Unknown(code) => f.write_str(code),
            known => {
                let wire = WIRE_CODES
                    .iter()
                    .find(|(_, code)| code == known)
                    .map_or("unknown", |(wire, _)| *wire);
                f.write_str(wire)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration incomplete: {0}")]
    MissingConfiguration(String),

    #[error("Request to Notion failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion answered {status} ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Unexpected response body: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode {path} as JSON: {source}")]
    JsonEncode {
        path: String,
        source: serde_json::Error,
    },

    #[error("Malformed HTML in {context}: {message}")]
    MalformedHtml { context: String, message: String },

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Asset download failed for {url}: {reason}")]
    AssetDownload { url: String, reason: String },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Client-class upstream failures (HTTP 4xx) are permanent: retrying
    /// cannot change the answer.
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::NotionService { status, .. } => status.is_client_error(),
            AppError::NetworkFailure(e) => e.status().is_some_and(|s| s.is_client_error()),
            _ => false,
        }
    }

    /// Whether the upstream reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotionService { code, .. } if code.is_not_found())
    }

    /// Builds the service error for an HTTP status, used by test doubles and
    /// by the client when the error body cannot be parsed.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        AppError::NotionService {
            code: NotionErrorCode::from_http_status(status),
            message: message.into(),
            status: reqwest::StatusCode::from_u16(status)
                .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<rss::Error> for AppError {
    fn from(err: rss::Error) -> Self {
        AppError::Feed(err.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::MalformedHtml {
            context: "document".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
