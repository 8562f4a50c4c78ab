//! # Key Derivation
//!
//! Three distinct derivations, each bound to its own domain so that a key
//! computed for one purpose can never collide with a key computed for
//! another:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  password  ──Argon2id(16 MiB, t=3, p=1, salt)──►  vault key (32 bytes) │
//! │                                                                         │
//! │  ECDH shared secret  ──SHA-256("deaddrop-message-key" || s)──►         │
//! │                                                    message key (32 B)  │
//! │                                                                         │
//! │  vault sk  ──HKDF-SHA256(info="ghostcore-transport-identity-v1")──►    │
//! │                                          Ed25519 seed (transport id)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Memory cost in KiB for the vault's Argon2id password KDF (16 MiB).
const VAULT_ARGON2_MEMORY_KIB: u32 = 16 * 1024;
/// Iteration count.
const VAULT_ARGON2_ITERATIONS: u32 = 3;
/// Degree of parallelism.
const VAULT_ARGON2_LANES: u32 = 1;

/// Domain-separation label for the Ghost Mode / dead-drop message key.
/// Spec-mandated literal string, used directly as a SHA-256 prefix rather
/// than as an HKDF `info` parameter.
const MESSAGE_KEY_DOMAIN: &[u8] = b"deaddrop-message-key";

/// Domain-separation label for deriving the libp2p transport identity
/// seed from the vault's X25519 secret.
const TRANSPORT_IDENTITY_INFO: &[u8] = b"ghostcore-transport-identity-v1";

/// Derive the 32-byte vault encryption key from a password and salt via
/// Argon2id with the spec-mandated parameters (16 MiB, 3 iterations, 1
/// lane).
pub fn derive_vault_key(password: &str, salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(
        VAULT_ARGON2_MEMORY_KIB,
        VAULT_ARGON2_ITERATIONS,
        VAULT_ARGON2_LANES,
        Some(32),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid argon2 parameters");
        Error::WrongPassword
    })?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| {
            tracing::error!(error = %e, "argon2 key derivation failed");
            Error::WrongPassword
        })?;

    Ok(key)
}

/// Derive the AEAD key used for Ghost Mode message envelopes and for the
/// dead-drop provenance channel: `SHA256("deaddrop-message-key" || s)`.
pub fn derive_message_key(shared_secret: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(MESSAGE_KEY_DOMAIN);
    hasher.update(shared_secret);
    let digest = hasher.finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Derive the 32-byte Ed25519 seed for the libp2p transport identity from
/// the vault's X25519 secret scalar. Deterministic across restarts so the
/// node's `PeerId` is stable, while remaining cryptographically
/// independent of the application identity.
pub fn derive_transport_seed(vault_secret: &[u8; 32]) -> [u8; 32] {
    let hkdf = Hkdf::<Sha256>::new(None, vault_secret);
    let mut seed = [0u8; 32];
    hkdf.expand(TRANSPORT_IDENTITY_INFO, &mut seed)
        .expect("32 is a valid HKDF-SHA256 output length");
    seed
}

/// Zeroize a stack-allocated 32-byte key once it is no longer needed.
pub fn zeroize_key(key: &mut [u8; 32]) {
    key.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_key_deterministic_for_same_password_and_salt() {
        let salt = [9u8; 16];
        let a = derive_vault_key("p@ss", &salt).unwrap();
        let b = derive_vault_key("p@ss", &salt).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_vault_key_differs_by_password() {
        let salt = [9u8; 16];
        let a = derive_vault_key("p@ss", &salt).unwrap();
        let b = derive_vault_key("wrong", &salt).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_vault_key_differs_by_salt() {
        let a = derive_vault_key("p@ss", &[1u8; 16]).unwrap();
        let b = derive_vault_key("p@ss", &[2u8; 16]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_key_deterministic() {
        let s = [42u8; 32];
        assert_eq!(derive_message_key(&s), derive_message_key(&s));
    }

    #[test]
    fn test_message_key_differs_by_secret() {
        assert_ne!(derive_message_key(&[1u8; 32]), derive_message_key(&[2u8; 32]));
    }

    #[test]
    fn test_transport_seed_deterministic_and_distinct_from_message_key() {
        let sk = [3u8; 32];
        let seed_a = derive_transport_seed(&sk);
        let seed_b = derive_transport_seed(&sk);
        assert_eq!(seed_a, seed_b);
        assert_ne!(seed_a, derive_message_key(&sk));
    }
}
