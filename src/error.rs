//! # Error Handling
//!
//! Error hierarchy for the ghostcore engine, grouped by the subsystem that
//! raises them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Identity Vault                                                    │
//! │  │   ├── WrongPassword       - password derives a key that fails AEAD  │
//! │  │   └── AuthFailure         - message/envelope tag verification fail  │
//! │  │                                                                      │
//! │  ├── Gossip Messaging Actor                                            │
//! │  │   ├── InvalidRecipient    - bad base58 or wrong-length public key   │
//! │  │   ├── NotRunning          - actor has not been started              │
//! │  │   ├── AlreadyRunning      - actor is already running                │
//! │  │   ├── IdentityRequired    - start called before init_identity       │
//! │  │   └── PublishFailed       - gossipsub publish failed                │
//! │  │                                                                      │
//! │  └── Dead-Drop Pipeline                                                │
//! │      ├── UploadFailed        - storage daemon rejected/errored upload │
//! │      ├── StorageUnavailable  - storage daemon unreachable              │
//! │      └── InvalidPolicy       - threshold/total out of range            │
//! │                                                                         │
//! │  IoError wraps any underlying filesystem failure.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for ghostcore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the ghostcore engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The password-derived key failed to decrypt the identity file.
    #[error("wrong password")]
    WrongPassword,

    /// AEAD tag verification failed on a message or envelope.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The recipient public key is not valid base58 or not 32 bytes.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The gossip actor has not been started.
    #[error("ghost mode is not running")]
    NotRunning,

    /// The gossip actor is already running.
    #[error("ghost mode is already running")]
    AlreadyRunning,

    /// `start_ghost_mode` was called before a successful `init_identity`.
    #[error("an identity must be created with init_identity before starting ghost mode")]
    IdentityRequired,

    /// A gossipsub publish failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// The storage daemon rejected or errored on an upload or fetch.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The storage daemon is unreachable.
    #[error("storage backend unavailable: {0}")]
    StorageUnavailable(String),

    /// Threshold/total share counts are out of the allowed range.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// Underlying filesystem I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
