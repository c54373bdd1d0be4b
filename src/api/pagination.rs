// src/api/pagination.rs
//! Cursor pagination with a retry policy around every page request.

use super::responses::PaginatedResponse;
use crate::error::AppError;
use crate::error_recovery::{retry_with_backoff, RetryPolicy};

/// Fetches every page of a paginated listing.
///
/// `fetch_page` receives the cursor of the page to load (`None` for the
/// first one). Each call is retried according to `policy`; the first error
/// that survives the policy aborts the whole listing and nothing fetched so
/// far is returned.
pub async fn fetch_all_pages<T, F, Fut>(policy: &RetryPolicy, mut fetch_page: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let response = retry_with_backoff(policy, || fetch_page(cursor.clone())).await?;
        all_items.extend(response.results);

        if !response.has_more {
            break;
        }
        match response.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                log::warn!("Listing reported more results without a cursor; stopping");
                break;
            }
        }
    }

    Ok(all_items)
}
