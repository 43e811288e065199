//! Versioned armoring for binary data
//!
//! Provides base64url encoding with a version prefix for encrypted data.
//! The armored format is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in URLs
//! - Safe to pass unescaped in a POSIX shell
//!
//! The version tells the reader how the key was derived: `textlock1:` bodies
//! are sealed under the SHA-256 passphrase key, `textlock2:` bodies carry
//! scrypt parameters and a salt ahead of the sealed box.

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Magic prefix for all textlock versions
const MAGIC_PREFIX: &str = "textlock";

const V1_MAGIC: &str = "textlock1:";
const V2_MAGIC: &str = "textlock2:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Unsalted SHA-256 passphrase key.
    V1,
    /// scrypt passphrase key with stored parameters and salt.
    V2,
}

impl Version {
    fn magic(self) -> &'static str {
        match self {
            Version::V1 => V1_MAGIC,
            Version::V2 => V2_MAGIC,
        }
    }
}

/// Wrap bytes in armor, returning the armored string
///
/// Format: textlock{version}:{base64url-no-padding}
pub fn wrap(version: Version, body: &[u8]) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(body);
    format!("{}{}", version.magic(), encoded)
}

/// Unwrap an armored string, returning the version and the original bytes
pub fn unwrap(armored: &str) -> Result<(Version, Vec<u8>)> {
    if armored.len() < V1_MAGIC.len() {
        return Err(TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input size smaller than magic marker; likely truncated",
        ));
    }

    let (version, encoded) = if let Some(encoded) = armored.strip_prefix(V1_MAGIC) {
        (Version::V1, encoded)
    } else if let Some(encoded) = armored.strip_prefix(V2_MAGIC) {
        (Version::V2, encoded)
    } else if armored.starts_with(MAGIC_PREFIX) {
        return Err(TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "input claims to be textlock, but not a version we support",
        ));
    } else {
        return Err(TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input unrecognized as textlock data",
        ));
    };

    let body = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            "base64 decoding failed",
            e,
        )
    })?;
    Ok((version, body))
}
