//! # Encrypted Identity File
//!
//! The on-disk representation of the vault's long-term X25519 scalar:
//! a self-describing record `{ salt: 16, nonce: 12, ciphertext }`, where
//! `ciphertext` is the scalar encrypted under a password-derived Argon2id
//! key. Stored at `<app-data-dir>/identity.enc`, exactly one per
//! installation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  identity.enc (JSON)                                                    │
//! │  {                                                                      │
//! │    "salt":       base64(16 random bytes),                              │
//! │    "nonce":      base64(12 random bytes),                              │
//! │    "ciphertext": base64(ChaCha20Poly1305(sk_bytes))                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::encryption::{self, Nonce};
use crate::crypto::kdf::derive_vault_key;
use crate::error::{Error, Result};

/// On-disk JSON record for the encrypted identity file.
#[derive(Serialize, Deserialize)]
struct VaultFileRecord {
    salt: String,
    nonce: String,
    ciphertext: String,
}

/// The file name within the app-data directory.
pub const IDENTITY_FILE_NAME: &str = "identity.enc";

/// Resolve `<app-data-dir>/identity.enc`, matching the teacher lineage's
/// use of the `dirs` crate for platform-specific paths.
pub fn default_identity_path() -> Result<PathBuf> {
    let dir = dirs::data_dir().ok_or_else(|| {
        Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not resolve platform application data directory",
        ))
    })?;
    Ok(dir.join("ghostcore").join(IDENTITY_FILE_NAME))
}

/// Write the encrypted identity record atomically: serialize to a temp
/// file in the same directory, then rename over the destination so a
/// crash mid-write never leaves a truncated file.
pub fn write_sealed(path: &Path, password: &str, sk: &[u8; 32]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut key = derive_vault_key(password, &salt)?;
    let nonce = Nonce::random();
    let ciphertext = encryption::encrypt_with_nonce(&key, &nonce, sk)?;
    encryption::wipe(&mut key);

    let record = VaultFileRecord {
        salt: STANDARD.encode(salt),
        nonce: STANDARD.encode(nonce.as_bytes()),
        ciphertext: STANDARD.encode(ciphertext),
    };
    let json = serde_json::to_vec_pretty(&record)
        .map_err(|e| Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let tmp_path = path.with_extension("enc.tmp");
    {
        let mut tmp = std::fs::File::create(&tmp_path)?;
        tmp.write_all(&json)?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read and unseal the identity file. Returns `WrongPassword` on any AEAD
/// tag failure, matching the spec's error taxonomy rather than leaking an
/// I/O-flavored error for what is semantically an authentication failure.
pub fn read_sealed(path: &Path, password: &str) -> Result<[u8; 32]> {
    let bytes = std::fs::read(path)?;
    let record: VaultFileRecord = serde_json::from_slice(&bytes)
        .map_err(|e| Error::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let salt: [u8; 16] = STANDARD
        .decode(&record.salt)
        .ok()
        .and_then(|v| v.try_into().ok())
        .ok_or(Error::WrongPassword)?;
    let nonce_bytes: [u8; 12] = STANDARD
        .decode(&record.nonce)
        .ok()
        .and_then(|v| v.try_into().ok())
        .ok_or(Error::WrongPassword)?;
    let ciphertext = STANDARD.decode(&record.ciphertext).map_err(|_| Error::WrongPassword)?;

    let mut key = derive_vault_key(password, &salt)?;
    let nonce = Nonce::from_bytes(nonce_bytes);
    let plaintext = encryption::decrypt(&key, &nonce, &ciphertext).map_err(|_| Error::WrongPassword)?;
    encryption::wipe(&mut key);

    plaintext.try_into().map_err(|_| Error::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_with_correct_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(IDENTITY_FILE_NAME);
        let sk = [11u8; 32];

        write_sealed(&path, "p@ss", &sk).unwrap();
        let recovered = read_sealed(&path, "p@ss").unwrap();

        assert_eq!(recovered, sk);
    }

    #[test]
    fn test_wrong_password_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(IDENTITY_FILE_NAME);

        write_sealed(&path, "p@ss", &[22u8; 32]).unwrap();

        let err = read_sealed(&path, "wrong").unwrap_err();
        assert!(matches!(err, Error::WrongPassword));
    }

    #[test]
    fn test_write_is_atomic_no_leftover_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(IDENTITY_FILE_NAME);

        write_sealed(&path, "p@ss", &[1u8; 32]).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("enc.tmp").exists());
    }
}
