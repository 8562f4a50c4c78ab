//! # Threshold Key Sharing
//!
//! Shamir's Secret Sharing over GF(256), via the `sharks` crate: deals the
//! dead-drop session key into `n` shares of which any `t` reconstruct it
//! and any `t − 1` reveal nothing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session_key (32 bytes)                                                │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  Sharks(t).dealer(session_key).take(n)  ──►  n opaque byte shares     │
//! │                                                                         │
//! │  Sharks(t).recover(any t of the n shares)  ──►  session_key            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sharks::{Share, Sharks};

use crate::error::{Error, Result};

/// Validate `2 ≤ t ≤ n ≤ 10`.
pub fn validate_policy(threshold: u32, total: u32) -> Result<()> {
    if threshold < 2 {
        return Err(Error::InvalidPolicy("threshold must be at least 2".into()));
    }
    if total > 10 {
        return Err(Error::InvalidPolicy("total shares must be at most 10".into()));
    }
    if threshold > total {
        return Err(Error::InvalidPolicy(
            "threshold cannot exceed total shares".into(),
        ));
    }
    Ok(())
}

/// Deal `total` shares of `secret` under a `threshold`-of-`total` scheme.
/// Each share is returned as raw bytes, ready for hex-encoding.
pub fn deal(secret: &[u8], threshold: u32, total: u32) -> Result<Vec<Vec<u8>>> {
    validate_policy(threshold, total)?;

    let sharks = Sharks(threshold as u8);
    let dealer = sharks.dealer(secret);

    Ok(dealer
        .take(total as usize)
        .map(|share| Vec::from(&share))
        .collect())
}

/// Reconstruct the secret from at least `threshold` shares (as produced by
/// [`deal`]). Fewer than `threshold` shares, or shares from an
/// inconsistent dealing, fail the same way: the scheme cannot tell "too
/// few" from "wrong" apart, so both surface as a reconstruction failure.
pub fn reconstruct(shares: &[Vec<u8>], threshold: u32) -> Result<Vec<u8>> {
    let parsed: std::result::Result<Vec<Share>, _> =
        shares.iter().map(|s| Share::try_from(s.as_slice())).collect();
    let parsed = parsed.map_err(|_| Error::AuthFailure("malformed key share".into()))?;

    let sharks = Sharks(threshold as u8);
    sharks
        .recover(parsed.iter())
        .map_err(|_| Error::AuthFailure("could not reconstruct key from shares".into()))
}
