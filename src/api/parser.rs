// src/api/parser.rs
//! Parsing of batch document responses.
//!
//! A response counts as a success only when the status is 200 *and* the
//! body carries a `results` object. Anything else becomes a
//! [`RemoteFetchError`] built from the body's optional `name`/`message`.

use super::client::ApiResponse;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::RemoteFetchError;
use crate::types::DocumentCollection;
use reqwest::StatusCode;
use serde::Deserialize;

/// Shape shared by success and error bodies of the document endpoint.
#[derive(Debug, Deserialize)]
struct DocumentsResponseBody {
    #[serde(default)]
    results: Option<DocumentCollection>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses a raw batch response into the fetched documents.
pub fn parse_documents_response(
    result: ApiResponse<String>,
) -> Result<DocumentCollection, RemoteFetchError> {
    let body: DocumentsResponseBody = match serde_json::from_str(&result.data) {
        Ok(body) => body,
        Err(e) => {
            log::error!("Failed to parse response from {}: {}", result.url, e);
            return Err(malformed_body(&result));
        }
    };

    match (result.status, body.results) {
        (StatusCode::OK, Some(results)) => Ok(results),
        (status, _) => {
            log::debug!(
                "Document request to {} rejected with status {}",
                result.url,
                status
            );
            Err(RemoteFetchError::new(body.name, body.message).with_status(status.as_u16()))
        }
    }
}

fn malformed_body(result: &ApiResponse<String>) -> RemoteFetchError {
    let preview: String = result.data.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    let message = if preview.len() < result.data.len() {
        format!("HTTP {} from {}: {}...", result.status, result.url, preview)
    } else {
        format!("HTTP {} from {}: {}", result.status, result.url, preview)
    };
    RemoteFetchError::new(Some("MalformedResponse".to_string()), Some(message))
        .with_status(result.status.as_u16())
}
