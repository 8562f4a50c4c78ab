//! # Key Management
//!
//! The application-level long-term identity: an X25519 keypair used both
//! as the vault's `(sk, pk)` and as the ECDH partner for every Ghost Mode
//! message. Distinct from the Ed25519 keypair libp2p derives for the
//! transport layer (see [`crate::crypto::kdf::derive_transport_seed`]).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EncryptionKeyPair (X25519)                                             │
//! │  ───────────────────────────                                            │
//! │  Purpose:                                                               │
//! │  • Application identity (base58(pk) is the public id)                  │
//! │  • ECDH with peers for Ghost Mode message encryption                    │
//! │  Format:                                                                │
//! │  • Private key: 32 bytes (secret, zeroized on drop)                    │
//! │  • Public key: 32 bytes (shared freely)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::ZeroizeOnDrop;

/// X25519 long-term keypair.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKeyPair {
    #[zeroize(skip)] // x25519_dalek zeroizes its own secret on drop
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl EncryptionKeyPair {
    /// Draw a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a keypair from a raw 32-byte scalar, e.g. one just read
    /// back out of the identity vault.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let secret = StaticSecret::from(*bytes);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The raw secret scalar, for sealing into the identity file. Callers
    /// are responsible for zeroizing the returned array once it has been
    /// encrypted.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// The public Montgomery point, `pk`.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// `X25519(sk, their_public)` — the shared secret used for both
    /// Ghost Mode message keys and (loosely) as the provenance basis for
    /// dead-drop metadata.
    pub fn diffie_hellman(&self, their_public: &[u8; 32]) -> [u8; 32] {
        let their_public = X25519PublicKey::from(*their_public);
        self.secret.diffie_hellman(&their_public).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_distinct_keys() {
        let a = EncryptionKeyPair::generate();
        let b = EncryptionKeyPair::generate();
        assert_ne!(a.public_bytes(), b.public_bytes());
    }

    #[test]
    fn test_from_bytes_roundtrip_is_deterministic() {
        let seed = [7u8; 32];
        let a = EncryptionKeyPair::from_bytes(&seed);
        let b = EncryptionKeyPair::from_bytes(&seed);
        assert_eq!(a.public_bytes(), b.public_bytes());
        assert_eq!(a.secret_bytes(), b.secret_bytes());
    }

    #[test]
    fn test_diffie_hellman_agreement() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let alice_shared = alice.diffie_hellman(&bob.public_bytes());
        let bob_shared = bob.diffie_hellman(&alice.public_bytes());

        assert_eq!(alice_shared, bob_shared);
    }
}
