// src/api/client.rs
//! Thin HTTP client for the batch document endpoint.
//!
//! Wraps reqwest with the headers and timeout the backend expects. Parsing
//! lives in [`super::parser`]; this module only moves bytes.

use super::parser::parse_documents_response;
use crate::constants::{DOCUMENT_ENDPOINT_PATH, DOCUMENT_REQUEST_FIELD};
use crate::error::AppError;
use crate::types::{DocumentCollection, Identifier, ValidationError};
use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// A thin wrapper around reqwest Client for document requests.
#[derive(Clone)]
pub struct DocumentHttpClient {
    client: Client,
}

impl DocumentHttpClient {
    /// Creates a new HTTP client with JSON headers and the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Resolves the batch endpoint against a backend base URL.
    ///
    /// The base is treated as a directory, so `https://host/api` and
    /// `https://host/api/` both resolve to `https://host/api/2/cards/`.
    pub fn endpoint_url(base_url: &Url) -> Result<Url, AppError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(DOCUMENT_ENDPOINT_PATH).map_err(|e| {
            ValidationError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Makes a POST request with JSON body to the given URL.
    pub async fn post<T: Serialize>(&self, url: Url, body: &T) -> Result<Response, AppError> {
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        log::debug!("Response status: {}", response.status());
        Ok(response)
    }
}

#[async_trait::async_trait]
impl super::DocumentSource for DocumentHttpClient {
    async fn fetch_batch(
        &self,
        base_url: &Url,
        identifiers: &[Identifier],
    ) -> Result<DocumentCollection, AppError> {
        let url = Self::endpoint_url(base_url)?;
        let body = serde_json::json!({ DOCUMENT_REQUEST_FIELD: identifiers });
        let response = self.post(url, &body).await?;
        let result = extract_response_text(response).await?;
        Ok(parse_documents_response(result)?)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
