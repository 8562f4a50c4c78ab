//! # Streaming Chunked Encryption
//!
//! Constant-memory, chunk-at-a-time ChaCha20-Poly1305 encryption over
//! fixed 4 MiB windows. Unlike a whole-buffer chunker, this never holds
//! more than one window (plus its ciphertext) in memory at a time, which
//! is what keeps `create_drop` under the peak-RSS bound for large files.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plaintext stream                                                       │
//! │    │                                                                    │
//! │    ├─► read up to 4 MiB  ──► encrypt  ──► u32_le(len) || nonce || ct   │
//! │    ├─► read up to 4 MiB  ──► encrypt  ──► u32_le(len) || nonce || ct   │
//! │    └─► EOF                                                              │
//! │                                                                         │
//! │  An empty input produces zero chunks; no global header is ever         │
//! │  written.                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::{self, Read, Write};

use crate::crypto::encryption::{self, Nonce, KEY_SIZE, NONCE_SIZE};
use crate::error::{Error, Result};

/// Size of each plaintext window: 4 MiB.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Stream-encrypt everything `reader` produces into `writer` as a
/// sequence of `u32_le(len) || nonce(12) || ciphertext || tag(16)`
/// frames, reading and encrypting one 4 MiB window at a time.
pub fn encrypt_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    key: &[u8; KEY_SIZE],
) -> Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = read_full_or_eof(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }

        let nonce = Nonce::random();
        let ciphertext = encryption::encrypt_with_nonce(key, &nonce, &buf[..n])?;

        let len = ciphertext.len() as u32;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(nonce.as_bytes())?;
        writer.write_all(&ciphertext)?;

        if n < CHUNK_SIZE {
            break;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Stream-decrypt a sequence of chunk frames from `reader` into `writer`,
/// verifying each chunk's tag as it goes. Fails with
/// [`Error::AuthFailure`] on the first chunk that doesn't verify, with no
/// partial plaintext written for that chunk.
pub fn decrypt_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    key: &[u8; KEY_SIZE],
) -> Result<()> {
    loop {
        let mut len_bytes = [0u8; 4];
        match read_exact_or_eof(&mut reader, &mut len_bytes)? {
            false => break,
            true => {}
        }
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        reader.read_exact(&mut nonce_bytes)?;
        let nonce = Nonce::from_bytes(nonce_bytes);

        let mut ciphertext = vec![0u8; len];
        reader.read_exact(&mut ciphertext)?;

        let plaintext = encryption::decrypt(key, &nonce, &ciphertext)
            .map_err(|_| Error::AuthFailure("encrypted chunk failed tag verification".into()))?;
        writer.write_all(&plaintext)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read up to `buf.len()` bytes, returning fewer only at EOF (mirrors
/// `Read::read` but loops past short reads from e.g. pipes).
fn read_full_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Read exactly `buf.len()` bytes, or report clean EOF if zero bytes were
/// available before the read began.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 if total == 0 => return Ok(false),
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated chunk frame",
                ))
            }
            n => total += n,
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> Vec<u8> {
        let mut ciphertext = Vec::new();
        encrypt_stream(Cursor::new(plaintext), &mut ciphertext, key).unwrap();

        let mut out = Vec::new();
        decrypt_stream(Cursor::new(ciphertext), &mut out, key).unwrap();
        out
    }

    #[test]
    fn test_small_payload_roundtrip() {
        let key = [1u8; KEY_SIZE];
        let data = b"hello, world!";
        assert_eq!(roundtrip(data, &key), data);
    }

    #[test]
    fn test_empty_input_produces_zero_chunks() {
        let key = [2u8; KEY_SIZE];
        let mut ciphertext = Vec::new();
        encrypt_stream(Cursor::new(b""), &mut ciphertext, &key).unwrap();
        assert!(ciphertext.is_empty());

        let mut out = Vec::new();
        decrypt_stream(Cursor::new(ciphertext), &mut out, &key).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_exact_multiple_of_chunk_size_has_no_short_trailing_chunk() {
        let key = [3u8; KEY_SIZE];
        let data = vec![7u8; CHUNK_SIZE * 2];

        let mut ciphertext = Vec::new();
        encrypt_stream(Cursor::new(&data), &mut ciphertext, &key).unwrap();

        // Walk the frame sequence and confirm exactly 2 chunks, each from
        // a full 4 MiB window (ciphertext len == CHUNK_SIZE + TAG_SIZE).
        let mut cursor = &ciphertext[..];
        let mut chunk_count = 0;
        while !cursor.is_empty() {
            let len = u32::from_le_bytes(cursor[..4].try_into().unwrap()) as usize;
            assert_eq!(len, CHUNK_SIZE + encryption::TAG_SIZE);
            cursor = &cursor[4 + NONCE_SIZE + len..];
            chunk_count += 1;
        }
        assert_eq!(chunk_count, 2);

        let mut out = Vec::new();
        decrypt_stream(Cursor::new(ciphertext), &mut out, &key).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_short_final_window_is_one_smaller_chunk() {
        let key = [4u8; KEY_SIZE];
        let data = vec![9u8; CHUNK_SIZE + 100];
        assert_eq!(roundtrip(&data, &key), data);
    }

    #[test]
    fn test_tampered_chunk_fails_with_auth_error() {
        let key = [5u8; KEY_SIZE];
        let data = vec![1u8; 1024];

        let mut ciphertext = Vec::new();
        encrypt_stream(Cursor::new(&data), &mut ciphertext, &key).unwrap();
        // flip a byte inside the ciphertext, past the length+nonce prefix
        let idx = 4 + NONCE_SIZE + 2;
        ciphertext[idx] ^= 0xFF;

        let mut out = Vec::new();
        let result = decrypt_stream(Cursor::new(ciphertext), &mut out, &key);
        assert!(matches!(result, Err(Error::AuthFailure(_))));
    }
}
