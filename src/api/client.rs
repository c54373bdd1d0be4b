// src/api/client.rs
//! Thin reqwest wrapper for the Notion REST API.
//!
//! One request per call. Retries and pagination live one layer up.

use super::parser::parse_api_response;
use super::responses::{PaginatedResponse, RawBlock, RawDatabase, RawPage};
use super::types::EntryQuery;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::types::{ApiKey, BlockId, DatabaseId};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// Authenticated access to one Notion integration.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

/// A response body that has not been interpreted yet.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: String,
}

fn default_headers(api_key: &ApiKey) -> Result<HeaderMap, AppError> {
    let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.as_str()))
        .map_err(|e| AppError::MissingConfiguration(format!("NOTION_TOKEN is not a valid header: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

impl NotionHttpClient {
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Same client against another host, e.g. a recording proxy.
    pub fn with_base_url(api_key: &ApiKey, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(default_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        log::debug!("{} <- {}", status.as_u16(), url);
        let body = response.text().await?;
        parse_api_response(RawResponse { status, url, body })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        self.send(self.client.get(self.url(endpoint))).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send(self.client.post(self.url(endpoint)).json(body)).await
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    async fn query_entries(
        &self,
        database: &DatabaseId,
        query: &EntryQuery,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<RawPage>, AppError> {
        self.post(&format!("databases/{}/query", database.as_str()), &query.body(cursor))
            .await
    }

    async fn block_children(
        &self,
        block: &BlockId,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<RawBlock>, AppError> {
        let mut endpoint = format!("blocks/{}/children?page_size={}", block.as_str(), NOTION_API_PAGE_SIZE);
        if let Some(cursor) = cursor {
            endpoint.push_str("&start_cursor=");
            endpoint.push_str(&urlencoding::encode(cursor));
        }
        self.get(&endpoint).await
    }

    async fn retrieve_block(&self, block: &BlockId) -> Result<RawBlock, AppError> {
        self.get(&format!("blocks/{}", block.as_str())).await
    }

    async fn retrieve_database(&self, database: &DatabaseId) -> Result<RawDatabase, AppError> {
        self.get(&format!("databases/{}", database.as_str())).await
    }
}
