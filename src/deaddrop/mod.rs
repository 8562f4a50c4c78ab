//! # Dead-Drop Pipeline
//!
//! Transforms an input file of arbitrary size into a content-addressed
//! ciphertext blob plus a threshold set of key shares, and reverses that
//! transform to recover the original file.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_drop(path, t, n)                                                │
//! │    1. draw session_key                                                 │
//! │    2. stream-encrypt path → temp file (4 MiB windows, blocking worker) │
//! │    3. multipart-upload temp file                  (suspension point)   │
//! │    4. deal n shares of session_key, threshold t                        │
//! │    5. zeroize session_key                                              │
//! │    6. remove temp file                                                 │
//! │    7. return (cid, hex shares)                                         │
//! │                                                                         │
//! │  open_drop(cid, shares)             — supplemented, reverse of above   │
//! │    1. fetch ciphertext blob for cid                (suspension point)  │
//! │    2. reconstruct session_key from shares                              │
//! │    3. stream-decrypt ciphertext → bytes (blocking worker)               │
//! │    4. zeroize session_key                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod chunker;
pub mod shares;
pub mod storage;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::RngCore;
use zeroize::Zeroize;

use crate::crypto::encryption::KEY_SIZE;
use crate::error::{Error, Result};
use storage::StorageClient;

/// Result of a successful `create_drop`.
pub struct Drop {
    /// Content id returned by the storage daemon.
    pub cid: String,
    /// Hex-encoded key shares, `shares[i]` corresponds to share index `i`.
    pub shares: Vec<String>,
}

/// `create_drop(path, t, n) → { cid, shares }`. Single-shot: on any
/// failure the temporary ciphertext file is removed and no shares are
/// produced.
pub async fn create_drop(path: &Path, threshold: u32, total: u32) -> Result<Drop> {
    shares::validate_policy(threshold, total)?;

    let mut session_key = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut session_key);

    let temp_path = path.with_extension("ddtmp");
    let encrypt_result = {
        let input = path.to_path_buf();
        let output = temp_path.clone();
        tokio::task::spawn_blocking(move || encrypt_file_blocking(input, output, session_key))
            .await
            .map_err(|e| Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    };
    if let Err(e) = encrypt_result {
        let _ = std::fs::remove_file(&temp_path);
        session_key.zeroize();
        return Err(e);
    }

    let client = StorageClient::new();
    let upload = client.add(&temp_path).await;
    let _ = tokio::fs::remove_file(&temp_path).await;

    let cid = match upload {
        Ok(cid) => cid,
        Err(e) => {
            session_key.zeroize();
            return Err(e);
        }
    };

    let dealt = shares::deal(&session_key, threshold, total);
    session_key.zeroize();
    let dealt = dealt?;

    Ok(Drop {
        cid,
        shares: dealt.into_iter().map(hex::encode).collect(),
    })
}

/// `open_drop(cid, shares) → bytes`. Supplemented per §4.2: fetches the
/// ciphertext, reconstructs the session key from the given hex-encoded
/// shares, and stream-decrypts it.
pub async fn open_drop(cid: &str, hex_shares: &[String], threshold: u32) -> Result<Vec<u8>> {
    let client = StorageClient::new();
    let ciphertext = client.cat(cid).await?;

    let raw_shares: Vec<Vec<u8>> = hex_shares
        .iter()
        .map(|s| hex::decode(s).map_err(|_| Error::AuthFailure("malformed key share".into())))
        .collect::<Result<_>>()?;

    let mut session_key_vec = shares::reconstruct(&raw_shares, threshold)?;
    let mut session_key = [0u8; KEY_SIZE];
    if session_key_vec.len() != KEY_SIZE {
        session_key_vec.zeroize();
        return Err(Error::AuthFailure("reconstructed key has wrong length".into()));
    }
    session_key.copy_from_slice(&session_key_vec);
    session_key_vec.zeroize();

    let plaintext = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        chunker::decrypt_stream(ciphertext.as_slice(), &mut out, &session_key)?;
        session_key.zeroize();
        Ok::<_, Error>(out)
    })
    .await
    .map_err(|e| Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    Ok(plaintext)
}

/// Run the streaming chunk-encryption step on a blocking worker, matching
/// the spec's "dead-drop pipeline runs on a blocking worker" scheduling
/// model.
fn encrypt_file_blocking(
    input: std::path::PathBuf,
    output: std::path::PathBuf,
    key: [u8; KEY_SIZE],
) -> Result<()> {
    let input_file = File::open(&input)?;
    let output_file = File::create(&output)?;
    chunker::encrypt_stream(
        BufReader::new(input_file),
        BufWriter::new(output_file),
        &key,
    )
}
