//! # Cryptography Module
//!
//! Primitives used by the identity vault, the gossip messaging actor, and
//! the dead-drop pipeline.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Password  ──Argon2id──►  Vault key  ──ChaCha20-Poly1305──►    │   │
//! │  │                                       identity.enc (sk bytes)  │   │
//! │  │                                                                 │   │
//! │  │  sk (X25519, long-term)                                        │   │
//! │  │    │                                                            │   │
//! │  │    ├──► pk = X25519 basepoint mult          (application id)   │   │
//! │  │    ├──► ECDH(sk, peer_pk) ──HKDF──► message key  (Ghost Mode)  │   │
//! │  │    └──► HKDF(sk, "transport-identity") ──► Ed25519 seed         │   │
//! │  │                                            (libp2p PeerId)      │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPTION SCHEME                               │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Key Exchange: X25519 ECDH                                  │   │
//! │  │  2. Key Derivation: SHA-256 (messages) / HKDF-SHA256 (transport)│  │
//! │  │  3. Encryption: ChaCha20-Poly1305, 96-bit random nonce          │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm          | Purpose             | Why chosen                     |
//! |--------------------|----------------------|---------------------------------|
//! | X25519             | Key exchange (ECDH)  | Fast, constant-time, dalek      |
//! | Ed25519            | Transport identity    | libp2p's native peer identity   |
//! | ChaCha20-Poly1305  | AEAD                  | Software-fast, no AES-NI need   |
//! | Argon2id           | Password KDF          | Memory-hard, GPU/ASIC-resistant |
//! | HKDF-SHA256        | Domain-separated KDF  | Well-analyzed, cheap expand     |
//!
//! ## Security considerations
//!
//! 1. Secret keys are zeroized when dropped.
//! 2. Constant-time curve operations via `dalek`.
//! 3. `rand::rngs::OsRng` for all randomness.
//! 4. Every encryption draws a fresh nonce; no key is ever reused across a
//!    nonce value.

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{decrypt, encrypt, Nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use kdf::{derive_message_key, derive_transport_seed, derive_vault_key};
pub use keys::EncryptionKeyPair;
