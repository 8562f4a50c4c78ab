//! # Encryption
//!
//! ChaCha20-Poly1305 AEAD, used for three distinct ciphertexts in this
//! crate: the on-disk identity file, Ghost Mode message envelopes, and
//! dead-drop file chunks. All three share the same primitive; only the key
//! derivation and the surrounding framing differ.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ENCRYPTION FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  key (32 B)  +  nonce (12 B, fresh per call)  +  plaintext              │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ChaCha20-Poly1305(key, nonce, plaintext)                               │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ciphertext || tag (16 B)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No associated data is used anywhere in this crate: the wire formats in
//! the external-interfaces spec carry no AAD field, so binding context
//! (sender, recipient, chunk index, ...) is left to the framing around the
//! ciphertext rather than folded into the AEAD call itself.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Nonce length for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;
/// Poly1305 tag length.
pub const TAG_SIZE: usize = 16;
/// Key length.
pub const KEY_SIZE: usize = 32;

/// A random 96-bit nonce.
#[derive(Clone, Copy, PartialEq, Eq, ZeroizeOnDrop)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Draw a fresh nonce from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap an existing 12-byte nonce, e.g. one read back from a wire
    /// format.
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw bytes, for framing into a wire format.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// Encrypt `plaintext` under `key` with a freshly drawn nonce. Returns the
/// nonce alongside `ciphertext || tag`.
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random();
    let ct = encrypt_with_nonce(key, &nonce, plaintext)?;
    Ok((nonce, ct))
}

/// Encrypt `plaintext` under `key` and an explicit nonce. Callers must
/// never reuse a `(key, nonce)` pair.
pub fn encrypt_with_nonce(key: &[u8; KEY_SIZE], nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(nonce.as_bytes().into(), plaintext)
        .map_err(|_| Error::AuthFailure("encryption failed".into()))
}

/// Verify-decrypt `ciphertext` (which includes the trailing tag) under
/// `key` and `nonce`. Fails with [`Error::AuthFailure`] on any tag
/// mismatch.
pub fn decrypt(key: &[u8; KEY_SIZE], nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(nonce.as_bytes().into(), ciphertext)
        .map_err(|_| Error::AuthFailure("tag verification failed".into()))
}

/// Zeroize a plaintext/key-bearing buffer in place. Thin wrapper kept
/// local to this module so call sites read as "encryption module, wipe
/// this" rather than reaching for `zeroize` directly everywhere.
pub fn wipe(buf: &mut [u8]) {
    buf.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let key = [1u8; KEY_SIZE];
        let plaintext = b"hello, world!";
        let (nonce, ct) = encrypt(&key, plaintext).unwrap();
        let pt = decrypt(&key, &nonce, &ct).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrips() {
        let key = [2u8; KEY_SIZE];
        let (nonce, ct) = encrypt(&key, b"").unwrap();
        assert_eq!(ct.len(), TAG_SIZE);
        let pt = decrypt(&key, &nonce, &ct).unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn test_tamper_detected() {
        let key = [3u8; KEY_SIZE];
        let (nonce, mut ct) = encrypt(&key, b"secret message").unwrap();
        ct[0] ^= 0xFF;
        assert!(decrypt(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let (nonce, ct) = encrypt(&[4u8; KEY_SIZE], b"payload").unwrap();
        assert!(decrypt(&[5u8; KEY_SIZE], &nonce, &ct).is_err());
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertexts() {
        let key = [6u8; KEY_SIZE];
        let (_, ct1) = encrypt(&key, b"same plaintext").unwrap();
        let (_, ct2) = encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_explicit_nonce_roundtrip() {
        let key = [8u8; KEY_SIZE];
        let nonce = Nonce::from_bytes([9u8; NONCE_SIZE]);
        let ct = encrypt_with_nonce(&key, &nonce, b"window").unwrap();
        let pt = decrypt(&key, &nonce, &ct).unwrap();
        assert_eq!(pt, b"window");
    }
}
