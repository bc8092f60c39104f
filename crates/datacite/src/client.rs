//! Registration client boundary and its DataCite HTTP implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use beamdoi_core::{BeamtimeId, DoiConfig, Error, Result};

use crate::metadata::DoiMetadata;

const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Stateless adapter over the external DOI registration service.
///
/// Each call performs exactly one request/response exchange. No call is
/// retried internally; retry policy lives in the scheduler.
#[async_trait]
pub trait RegistrationClient: Send + Sync {
    /// Register a new draft DOI under the conventional identifier for the
    /// record. Returns the remote DOI identifier.
    async fn create(&self, id: &BeamtimeId, metadata: &DoiMetadata) -> Result<String>;

    /// Replace the metadata of an existing DOI.
    async fn update(&self, doi_id: &str, metadata: &DoiMetadata) -> Result<()>;

    /// Delete a draft DOI.
    async fn delete(&self, doi_id: &str) -> Result<()>;

    /// Fetch the current remote metadata. Used for drift auditing, not on
    /// the hot reconciliation path.
    async fn fetch(&self, doi_id: &str) -> Result<DoiMetadata>;
}

#[derive(serde::Deserialize)]
struct ApiDocument {
    data: ApiResource,
}

#[derive(serde::Deserialize)]
struct ApiResource {
    id: String,
    #[serde(default)]
    attributes: serde_json::Value,
}

/// DataCite REST API client.
pub struct DataCiteClient {
    http: reqwest::Client,
    config: DoiConfig,
}

impl DataCiteClient {
    /// Build a client with the per-call timeout from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the underlying HTTP client cannot be built.
    pub fn new(config: DoiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn dois_url(&self, doi_id: Option<&str>) -> String {
        match doi_id {
            Some(id) => format!("{}/dois/{id}", self.config.base_url),
            None => format!("{}/dois", self.config.base_url),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(reqwest::header::CONTENT_TYPE, JSON_API_CONTENT_TYPE)
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        expected: StatusCode,
    ) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// A timed-out or otherwise failed exchange never reached a conclusive
/// answer, so it is always retryable.
fn classify_send_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::transient(format!("request timed out: {error}"))
    } else {
        Error::transient(format!("network error: {error}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::not_found(body.to_string());
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Error::transient(format!("HTTP {status}: {body}"))
    } else {
        Error::permanent(format!("HTTP {status}: {body}"))
    }
}

#[async_trait]
impl RegistrationClient for DataCiteClient {
    async fn create(&self, id: &BeamtimeId, metadata: &DoiMetadata) -> Result<String> {
        let doi = DoiMetadata::conventional_doi(&self.config.prefix, id.as_str());
        let payload = metadata.to_payload(&self.config.prefix, "draft", Some(&doi));
        debug!(url = %self.dois_url(None), doi, "Creating draft DOI");

        let response = self
            .execute(
                self.request(reqwest::Method::POST, self.dois_url(None))
                    .json(&payload),
                StatusCode::CREATED,
            )
            .await?;

        let document: ApiDocument = response
            .json()
            .await
            .map_err(|e| Error::permanent(format!("malformed create response: {e}")))?;

        info!(doi_id = %document.data.id, "Created draft DOI");
        Ok(document.data.id)
    }

    async fn update(&self, doi_id: &str, metadata: &DoiMetadata) -> Result<()> {
        let payload = metadata.to_payload(&self.config.prefix, "draft", Some(doi_id));
        debug!(doi_id, "Updating DOI metadata");

        self.execute(
            self.request(reqwest::Method::PUT, self.dois_url(Some(doi_id)))
                .json(&payload),
            StatusCode::OK,
        )
        .await?;

        info!(doi_id, "Updated DOI metadata");
        Ok(())
    }

    async fn delete(&self, doi_id: &str) -> Result<()> {
        debug!(doi_id, "Deleting draft DOI");

        self.execute(
            self.request(reqwest::Method::DELETE, self.dois_url(Some(doi_id))),
            StatusCode::NO_CONTENT,
        )
        .await?;

        info!(doi_id, "Deleted draft DOI");
        Ok(())
    }

    async fn fetch(&self, doi_id: &str) -> Result<DoiMetadata> {
        let response = self
            .execute(
                self.request(reqwest::Method::GET, self.dois_url(Some(doi_id))),
                StatusCode::OK,
            )
            .await?;

        let document: ApiDocument = response
            .json()
            .await
            .map_err(|e| Error::permanent(format!("malformed fetch response: {e}")))?;

        serde_json::from_value(document.data.attributes)
            .map_err(|e| Error::permanent(format!("unrecognized remote metadata: {e}")))
    }
}

/// Dry-run client: logs every operation and hands out the conventional
/// identifiers without touching the network.
#[derive(Debug, Default)]
pub struct NullClient {
    prefix: String,
}

impl NullClient {
    /// Create a dry-run client using the given DOI prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl RegistrationClient for NullClient {
    async fn create(&self, id: &BeamtimeId, metadata: &DoiMetadata) -> Result<String> {
        let doi_id = DoiMetadata::conventional_doi(&self.prefix, id.as_str());
        info!(doi_id, title = ?metadata.titles.first(), "[dry-run] would create draft DOI");
        Ok(doi_id)
    }

    async fn update(&self, doi_id: &str, _metadata: &DoiMetadata) -> Result<()> {
        info!(doi_id, "[dry-run] would update DOI metadata");
        Ok(())
    }

    async fn delete(&self, doi_id: &str) -> Result<()> {
        info!(doi_id, "[dry-run] would delete draft DOI");
        Ok(())
    }

    async fn fetch(&self, doi_id: &str) -> Result<DoiMetadata> {
        Err(Error::not_found(doi_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::BAD_GATEWAY, "upstream down").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down").is_transient());
        assert!(!classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad year").is_transient());
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, ""),
            Error::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn null_client_uses_conventional_ids() {
        let client = NullClient::new("10.12345");
        let metadata = DoiMetadata::new("t", Vec::new(), "p", 2025);

        let doi_id = client.create(&BeamtimeId::new("bt-7"), &metadata).await.unwrap();
        assert_eq!(doi_id, "10.12345/data_bt-7");
    }

    #[tokio::test]
    async fn null_client_fetch_reports_missing() {
        let client = NullClient::new("10.12345");
        let err = client.fetch("10.12345/data_bt-7").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
