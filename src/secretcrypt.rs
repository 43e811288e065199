//! Authenticated encryption using XSalsa20Poly1305 (NaCl secretbox)
//!
//! The binary format is:
//! - nonce: 24 bytes
//! - length: 8 bytes (big-endian signed int64)
//! - sealed box: variable length (includes 16-byte Poly1305 MAC)

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use crate::kdf::DerivedKey;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use std::mem::{size_of, size_of_val};

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Seal plaintext under a key using a random nonce
///
/// Returns the binary format: nonce(24) + length(8) + sealedbox(variable)
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_with_nonce(key, plaintext, &nonce)
}

/// Seal plaintext under a key using the provided nonce
///
/// A nonce must never be used twice with the same key. Only known-answer
/// vectors pass a fixed one; everything else goes through `seal()`.
pub fn seal_with_nonce(
    key: &DerivedKey,
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(&(*key.as_bytes()).into());

    let nonce_obj = Nonce::from(*nonce);
    let sealed_box = cipher.encrypt(&nonce_obj, plaintext).map_err(|_| {
        TextlockError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::SecretboxFailure,
            "encryption failed",
        )
    })?;

    let sealed_box_len = sealed_box.len() as i64;
    let mut output =
        Vec::with_capacity(NONCE_LEN + size_of_val(&sealed_box_len) + sealed_box.len());
    output.extend_from_slice(nonce);
    output.extend_from_slice(&sealed_box_len.to_be_bytes()); // big-endian i64
    output.extend_from_slice(&sealed_box);

    Ok(output)
}

/// Open a sealed body with a key
///
/// Nothing is returned unless the MAC verifies.
pub fn open(key: &DerivedKey, body: &[u8]) -> Result<Vec<u8>> {
    let mut pos = 0;

    if body.len() < pos + NONCE_LEN {
        return Err(truncated("input likely truncated while reading nonce"));
    }
    let nonce: [u8; NONCE_LEN] = body[pos..pos + NONCE_LEN]
        .try_into()
        .map_err(|_| truncated("failed to read nonce"))?;
    pos += NONCE_LEN;

    if body.len() < pos + size_of::<i64>() {
        return Err(truncated("input likely truncated while reading sealed box"));
    }
    let length_bytes: [u8; 8] = body[pos..pos + size_of::<i64>()]
        .try_into()
        .map_err(|_| truncated("failed to read length"))?;
    let sealed_box_len = i64::from_be_bytes(length_bytes);
    pos += size_of::<i64>();

    if sealed_box_len < 0 {
        return Err(binary_format(
            "negative sealed box length (when interpreted as a big-endian i64)",
        ));
    }

    // Check if length exceeds platform's maximum isize. *Valid* input
    // can fail this check if the platforms' isize is small.
    if sealed_box_len > isize::MAX as i64 {
        return Err(binary_format(
            "sealed box length exceeds this system's max isize",
        ));
    }

    let sealed_box_len = sealed_box_len as usize;

    if sealed_box_len > body.len() {
        return Err(truncated(
            "truncated or corrupt input; claimed length greater than available input",
        ));
    }

    if body.len() < pos + sealed_box_len {
        return Err(truncated(
            "truncated or corrupt input (while reading sealed box)",
        ));
    }
    let sealed_box = &body[pos..pos + sealed_box_len];
    pos += sealed_box_len;

    if pos < body.len() {
        return Err(TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::TrailingData,
            "invalid input: unexpected data after sealed box",
        ));
    }

    let cipher = XSalsa20Poly1305::new(&(*key.as_bytes()).into());
    let nonce_obj = Nonce::from(nonce);
    cipher.decrypt(&nonce_obj, sealed_box).map_err(|_| {
        TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or bad passphrase",
        )
    })
}

fn truncated(msg: &str) -> TextlockError {
    TextlockError::with_kind(ErrorCategory::User, ErrorKind::TruncatedInput, msg)
}

fn binary_format(msg: &str) -> TextlockError {
    TextlockError::with_kind(ErrorCategory::User, ErrorKind::BinaryFormat, msg)
}
