//! # Identity Vault
//!
//! Generates, persists, and unseals the long-term X25519 keypair; provides
//! password-gated access; performs ECDH-based message encryption for Ghost
//! Mode.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         IDENTITY VAULT                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  init(password)                                                        │
//! │    file missing?  ──► generate sk  ──► seal(password)  ──► write       │
//! │    file present?  ──► read  ──► unseal(password)  ──► WrongPassword?   │
//! │                                        │                               │
//! │                                        ▼                               │
//! │                          cache (sk, pk) in process memory              │
//! │                                        │                               │
//! │                                        ▼                               │
//! │                               base58(pk) returned                      │
//! │                                                                         │
//! │  encrypt_to(recipient_pk, plaintext)                                   │
//! │    s = X25519(sk, recipient_pk)                                       │
//! │    k = SHA256("deaddrop-message-key" || s)                            │
//! │    pk || nonce || AEAD(k, nonce, plaintext)                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod vault_file;

use std::path::PathBuf;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::encryption::{self, Nonce, NONCE_SIZE, TAG_SIZE};
use crate::crypto::kdf::derive_message_key;
use crate::crypto::keys::EncryptionKeyPair;
use crate::error::{Error, Result};

/// The unsealed long-term identity: the X25519 keypair cached in process
/// memory for the lifetime of the application after a successful `init`.
/// Wiped on drop; `clone_for_service` is intentionally not provided —
/// every consumer shares the same cached instance via the engine facade.
#[derive(ZeroizeOnDrop)]
pub struct Vault {
    keypair: EncryptionKeyPair,
    #[zeroize(skip)]
    path: PathBuf,
}

impl Vault {
    /// `init(password) → public_id`. Creates the identity file on first
    /// call, unseals it on every subsequent call. See module docs for the
    /// full flow.
    pub fn init(password: &str) -> Result<Self> {
        Self::init_at(vault_file::default_identity_path()?, password)
    }

    /// Same as [`Vault::init`] but against an explicit file path —
    /// exercised directly by tests so they never touch the real
    /// application data directory.
    pub fn init_at(path: PathBuf, password: &str) -> Result<Self> {
        let mut sk = if path.exists() {
            vault_file::read_sealed(&path, password)?
        } else {
            let keypair = EncryptionKeyPair::generate();
            let sk = keypair.secret_bytes();
            vault_file::write_sealed(&path, password, &sk)?;
            sk
        };

        let keypair = EncryptionKeyPair::from_bytes(&sk);
        sk.zeroize();
        tracing::info!(public_id = %bs58::encode(keypair.public_bytes()).into_string(), "identity vault unsealed");
        Ok(Self { keypair, path })
    }

    /// `public_id() → string`. `base58(pk)`.
    pub fn public_id(&self) -> String {
        bs58::encode(self.keypair.public_bytes()).into_string()
    }

    /// The raw public key bytes, for topic derivation and envelope
    /// framing.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.keypair.public_bytes()
    }

    /// The raw secret scalar, for deriving the transport identity. Never
    /// logged, never serialized.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.keypair.secret_bytes()
    }

    /// The file path this vault was unsealed from/written to.
    pub fn identity_path(&self) -> &std::path::Path {
        &self.path
    }

    /// `encrypt_to(recipient_pk, plaintext) → envelope_bytes`.
    pub fn encrypt_to(&self, recipient_pk: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut shared = self.keypair.diffie_hellman(recipient_pk);
        let mut key = derive_message_key(&shared);
        shared.zeroize();
        let nonce = Nonce::random();
        let ct = encryption::encrypt_with_nonce(&key, &nonce, plaintext)?;
        encryption::wipe(&mut key);

        let mut envelope = Vec::with_capacity(32 + NONCE_SIZE + ct.len());
        envelope.extend_from_slice(&self.keypair.public_bytes());
        envelope.extend_from_slice(nonce.as_bytes());
        envelope.extend_from_slice(&ct);
        Ok(envelope)
    }

    /// `decrypt_from(envelope_bytes) → (sender_pk, plaintext)`.
    pub fn decrypt_from(&self, envelope: &[u8]) -> Result<([u8; 32], Vec<u8>)> {
        if envelope.len() < 32 + NONCE_SIZE + TAG_SIZE {
            return Err(Error::AuthFailure("envelope too short".into()));
        }
        let sender_pk: [u8; 32] = envelope[..32].try_into().unwrap();
        let nonce_bytes: [u8; NONCE_SIZE] = envelope[32..32 + NONCE_SIZE].try_into().unwrap();
        let ct = &envelope[32 + NONCE_SIZE..];

        let mut shared = self.keypair.diffie_hellman(&sender_pk);
        let mut key = derive_message_key(&shared);
        shared.zeroize();
        let nonce = Nonce::from_bytes(nonce_bytes);
        let plaintext = encryption::decrypt(&key, &nonce, ct)
            .map_err(|_| Error::AuthFailure("message tag verification failed".into()))?;
        encryption::wipe(&mut key);

        Ok((sender_pk, plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        dir.into_path().join("identity.enc")
    }

    #[test]
    fn test_init_round_trip_same_password() {
        let path = tmp_path();
        let first = Vault::init_at(path.clone(), "p@ss").unwrap().public_id();
        let second = Vault::init_at(path, "p@ss").unwrap().public_id();
        assert_eq!(first, second);
        assert!(first.len() >= 43 && first.len() <= 44);
    }

    #[test]
    fn test_init_wrong_password_fails() {
        let path = tmp_path();
        Vault::init_at(path.clone(), "p@ss").unwrap();
        let err = Vault::init_at(path, "wrong").unwrap_err();
        assert!(matches!(err, Error::WrongPassword));
    }

    #[test]
    fn test_diffie_hellman_agreement_via_public_api() {
        let alice = Vault::init_at(tmp_path(), "alice-pw").unwrap();
        let bob = Vault::init_at(tmp_path(), "bob-pw").unwrap();

        let shared_a = alice.keypair.diffie_hellman(&bob.public_key_bytes());
        let shared_b = bob.keypair.diffie_hellman(&alice.public_key_bytes());
        assert_eq!(shared_a, shared_b);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let alice = Vault::init_at(tmp_path(), "alice-pw").unwrap();
        let bob = Vault::init_at(tmp_path(), "bob-pw").unwrap();

        let envelope = alice.encrypt_to(&bob.public_key_bytes(), b"hello").unwrap();
        let (sender_pk, plaintext) = bob.decrypt_from(&envelope).unwrap();

        assert_eq!(sender_pk, alice.public_key_bytes());
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn test_decrypt_wrong_recipient_fails() {
        let alice = Vault::init_at(tmp_path(), "alice-pw").unwrap();
        let bob = Vault::init_at(tmp_path(), "bob-pw").unwrap();
        let eve = Vault::init_at(tmp_path(), "eve-pw").unwrap();

        let envelope = alice.encrypt_to(&bob.public_key_bytes(), b"hello").unwrap();
        assert!(eve.decrypt_from(&envelope).is_err());
    }

    #[test]
    fn test_decrypt_tampered_envelope_fails() {
        let alice = Vault::init_at(tmp_path(), "alice-pw").unwrap();
        let bob = Vault::init_at(tmp_path(), "bob-pw").unwrap();

        let mut envelope = alice.encrypt_to(&bob.public_key_bytes(), b"hello").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;

        assert!(bob.decrypt_from(&envelope).is_err());
    }
}
