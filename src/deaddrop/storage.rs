//! # Content-Addressed Storage Client
//!
//! A thin `reqwest`-based client for the local storage daemon's HTTP API
//! (modeled on the Kubo/IPFS RPC API: multipart upload, content fetch,
//! and a liveness probe).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/v0/add   (multipart, field "file")  ──►  { "Hash": cid }   │
//! │  POST /api/v0/cat?arg=<cid>                      ──►  raw bytes        │
//! │  POST /api/v0/id                                 ──►  { "ID": ... }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};

/// Default base URL for the local storage daemon.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct IdResponse {
    #[serde(rename = "AgentVersion")]
    agent_version: Option<String>,
    #[serde(rename = "ID")]
    id: Option<String>,
}

/// Client for the content-addressed storage daemon.
pub struct StorageClient {
    base_url: String,
    http: reqwest::Client,
}

impl StorageClient {
    /// Construct a client pointed at the spec-mandated default address.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Construct a client pointed at an arbitrary base URL, so tests can
    /// point it at a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Upload the file at `path` as a single multipart form field named
    /// `file`, streamed from disk in fixed-size reads rather than loaded
    /// into memory as one buffer. Returns the content id. Never retried:
    /// callers re-invoke `create_drop` on failure.
    pub async fn add(&self, path: &Path) -> Result<String> {
        let file = tokio::fs::File::open(path).await.map_err(Error::IoError)?;
        let len = file.metadata().await.map_err(Error::IoError)?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, len).file_name("blob");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/v0/add", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::UploadFailed(format!(
                "storage daemon returned {}",
                response.status()
            )));
        }

        let parsed: AddResponse = response
            .json()
            .await
            .map_err(|e| Error::UploadFailed(format!("malformed add response: {e}")))?;
        Ok(parsed.hash)
    }

    /// Fetch the raw ciphertext blob for `cid`.
    pub async fn cat(&self, cid: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(format!("{}/api/v0/cat", self.base_url))
            .query(&[("arg", cid)])
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageUnavailable(format!(
                "storage daemon returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    /// `test_ipfs`. Probe liveness and report the daemon's version string.
    pub async fn id(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/v0/id", self.base_url))
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageUnavailable(format!(
                "storage daemon returned {}",
                response.status()
            )));
        }

        let parsed: IdResponse = response
            .json()
            .await
            .map_err(|e| Error::StorageUnavailable(format!("malformed id response: {e}")))?;

        Ok(parsed
            .agent_version
            .or(parsed.id)
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

impl Default for StorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_id_reports_storage_unavailable_when_daemon_is_down() {
        // Nothing is listening on this port; the connection itself fails
        // before any HTTP status is involved.
        let client = StorageClient::with_base_url("http://127.0.0.1:1");
        let err = client.id().await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_add_reports_upload_failed_when_daemon_is_down() {
        let client = StorageClient::with_base_url("http://127.0.0.1:1");
        let dir = tempfile::tempdir().unwrap();
        let blob_path = dir.path().join("blob.bin");
        std::fs::write(&blob_path, b"irrelevant").unwrap();
        let err = client.add(&blob_path).await.unwrap_err();
        assert!(matches!(err, Error::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_add_streams_file_and_parses_cid_from_mock_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Hash": "QmTestCid"
            })))
            .mount(&mock_server)
            .await;

        let client = StorageClient::with_base_url(mock_server.uri());
        let dir = tempfile::tempdir().unwrap();
        let blob_path = dir.path().join("blob.bin");
        std::fs::write(&blob_path, vec![0xab; 1024]).unwrap();

        let cid = client.add(&blob_path).await.unwrap();
        assert_eq!(cid, "QmTestCid");
    }

    #[tokio::test]
    async fn test_cat_fetches_raw_bytes_from_mock_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/cat"))
            .and(query_param("arg", "QmTestCid"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ciphertext".to_vec()))
            .mount(&mock_server)
            .await;

        let client = StorageClient::with_base_url(mock_server.uri());
        let bytes = client.cat("QmTestCid").await.unwrap();
        assert_eq!(bytes, b"ciphertext");
    }

    #[tokio::test]
    async fn test_id_reports_agent_version_from_mock_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AgentVersion": "kubo/0.1.0"
            })))
            .mount(&mock_server)
            .await;

        let client = StorageClient::with_base_url(mock_server.uri());
        let version = client.id().await.unwrap();
        assert_eq!(version, "kubo/0.1.0");
    }
}
