//! services/reader/src/adapters/conversion_http.rs
//!
//! This module contains the adapter for the external conversion API.
//! It implements the `ConversionService` port from the `core` crate with plain
//! JSON request/response calls over `reqwest`.

use async_trait::async_trait;
use clearread_core::{ConversionService, CreatedDocument, PortError, PortResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

//=========================================================================================
// Wire Payloads
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentRequest<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct CreateDocumentResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertTextRequest<'a> {
    user_id: &'a str,
    original_text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConvertTextResponse {
    converted_text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameDocumentRequest<'a> {
    user_id: &'a str,
    doc_id: &'a str,
    old_name: &'a str,
    new_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameDocumentResponse {
    new_name: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ConversionService` against the HTTP conversion API.
#[derive(Clone)]
pub struct HttpConversionAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConversionAdapter {
    /// Creates a new `HttpConversionAdapter` talking to `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> PortResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}/", self.base_url, endpoint);
        debug!(url = %url, "Calling conversion API.");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint, "Conversion API unavailable: {}", e);
                PortError::Unexpected(format!("Conversion API unavailable: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            error!(endpoint, status = status.as_u16(), "Conversion API returned an error status.");
            return Err(PortError::Http(status.as_u16()));
        }

        resp.json::<R>().await.map_err(|e| {
            error!(endpoint, "Invalid conversion API response: {}", e);
            PortError::Unexpected(format!("Invalid response from {}: {}", endpoint, e))
        })
    }
}

//=========================================================================================
// `ConversionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConversionService for HttpConversionAdapter {
    async fn create_document(&self, user_id: &str) -> PortResult<CreatedDocument> {
        let response: CreateDocumentResponse = self
            .post("create-document", &CreateDocumentRequest { user_id })
            .await?;
        Ok(CreatedDocument {
            id: response.id,
            name: response.name,
        })
    }

    async fn convert_text(&self, user_id: &str, original_text: &str) -> PortResult<String> {
        let response: ConvertTextResponse = self
            .post(
                "convert-text",
                &ConvertTextRequest {
                    user_id,
                    original_text,
                },
            )
            .await?;
        Ok(response.converted_text)
    }

    async fn rename_document(
        &self,
        user_id: &str,
        document_id: &str,
        old_name: &str,
        new_name: &str,
    ) -> PortResult<String> {
        let response: RenameDocumentResponse = self
            .post(
                "rename-document",
                &RenameDocumentRequest {
                    user_id,
                    doc_id: document_id,
                    old_name,
                    new_name,
                },
            )
            .await?;
        Ok(response.new_name)
    }
}
