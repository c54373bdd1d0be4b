// src/api/parser.rs
//! Turns HTTP bodies into raw payloads or typed service errors.

use super::client::RawResponse;
use super::responses::RawApiError;
use crate::error::{AppError, NotionErrorCode};
use reqwest::StatusCode;

/// Parse any Notion API response body.
pub fn parse_api_response<T>(response: RawResponse) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if response.status.is_success() {
        parse_success(&response.body, &response.url)
    } else {
        Err(parse_error(&response.body, response.status, &response.url))
    }
}

fn parse_success<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);

        let preview: String = body.chars().take(500).collect();
        AppError::MalformedResponse(format!("{} (body: {})", e, preview))
    })
}

/// The HTTP status always wins for classification; the body only refines
/// the code and message.
fn parse_error(body: &str, status: StatusCode, url: &str) -> AppError {
    match serde_json::from_str::<RawApiError>(body) {
        Ok(error) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status,
        },
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(status.as_u16()),
            message: format!("HTTP {} from {}", status, url),
            status,
        },
    }
}
