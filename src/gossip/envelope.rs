//! # Ghost Message Envelope
//!
//! The wire plaintext carried inside every [`crate::identity::Vault`]
//! envelope: a self-describing record distinguishing a message from its
//! acknowledgement.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "kind": "msg", "id": "<uuid>", "content": "...", "ts": 1234 }        │
//! │  { "kind": "ack", "id": "<uuid>",                   "ts": 1234 }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::now_timestamp;

/// The inner plaintext of a Ghost Message Envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// `"msg"` or `"ack"`.
    pub kind: String,
    /// The message id this record refers to.
    pub id: String,
    /// Present only for `"msg"` records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Unix timestamp, seconds.
    pub ts: i64,
}

impl Record {
    /// Build a fresh outbound message record with a new UUID.
    pub fn new_message(content: impl Into<String>) -> Self {
        Self {
            kind: "msg".to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            content: Some(content.into()),
            ts: now_timestamp(),
        }
    }

    /// Build an ack record for `message_id`.
    pub fn new_ack(message_id: impl Into<String>) -> Self {
        Self {
            kind: "ack".to_string(),
            id: message_id.into(),
            content: None,
            ts: now_timestamp(),
        }
    }

    /// Serialize to the self-describing plaintext form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| Error::PublishFailed(format!("failed to encode record: {e}")))
    }

    /// Parse from the self-describing plaintext form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::AuthFailure(format!("malformed message record: {e}")))
    }

    /// `true` for a `"msg"` record.
    pub fn is_message(&self) -> bool {
        self.kind == "msg"
    }

    /// `true` for an `"ack"` record.
    pub fn is_ack(&self) -> bool {
        self.kind == "ack"
    }
}

/// `"/deaddrop/inbox/" || base58(pk)` — the gossip topic a peer
/// subscribes to for its own incoming messages.
pub fn inbox_topic(public_key_base58: &str) -> String {
    format!("/deaddrop/inbox/{public_key_base58}")
}
