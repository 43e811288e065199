//! Passphrase-level encryption to and from armored tokens
//!
//! A token is what ends up on disk inside a `.textlock` file. For the
//! scrypt scheme the armored body is prefixed with the key derivation
//! parameters:
//! - log2(N): 1 byte
//! - r: 4 bytes (big-endian)
//! - p: 4 bytes (big-endian)
//! - salt: 8 bytes

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use crate::kdf::{self, DerivedKey, Kdf, SALT_LEN, ScryptCost};
use crate::secretcrypt::{self, NONCE_LEN};
use crate::varmor::{self, Version};
use rand::RngCore;
use rand::rngs::OsRng;

const SCRYPT_HEADER_LEN: usize = 1 + 4 + 4 + SALT_LEN;

/// Encrypt plaintext with a passphrase, returning the armored token
///
/// A fresh nonce is drawn for every call, and a fresh salt for the scrypt
/// scheme.
pub fn encrypt(passphrase: &[u8], plaintext: &[u8], kdf: Kdf) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    if matches!(kdf, Kdf::Scrypt(_)) {
        OsRng.fill_bytes(&mut salt);
    }

    let key = encryption_key(passphrase, kdf, &salt)?;
    let sealed = secretcrypt::seal(&key, plaintext)?;
    Ok(armor(kdf, &salt, &sealed))
}

/// Encrypt plaintext with a passphrase using a caller-chosen salt and nonce
///
/// The salt is ignored for `Kdf::Sha256`. Output is fully reproducible, which
/// is what known-answer vectors need; reusing a nonce under the same key
/// breaks confidentiality, so anything else goes through `encrypt()`.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    kdf: Kdf,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<String> {
    let key = encryption_key(passphrase, kdf, salt)?;
    let sealed = secretcrypt::seal_with_nonce(&key, plaintext, nonce)?;
    Ok(armor(kdf, salt, &sealed))
}

fn encryption_key(passphrase: &[u8], scheme: Kdf, salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
    match scheme {
        Kdf::Sha256 => Ok(kdf::derive_key(passphrase)),
        Kdf::Scrypt(cost) => kdf::derive_key_scrypt(passphrase, salt, cost),
    }
}

fn armor(scheme: Kdf, salt: &[u8; SALT_LEN], sealed: &[u8]) -> String {
    match scheme {
        Kdf::Sha256 => varmor::wrap(Version::V1, sealed),
        Kdf::Scrypt(cost) => {
            let mut body = Vec::with_capacity(SCRYPT_HEADER_LEN + sealed.len());
            body.push(cost.log_n());
            body.extend_from_slice(&cost.r().to_be_bytes());
            body.extend_from_slice(&cost.p().to_be_bytes());
            body.extend_from_slice(salt);
            body.extend_from_slice(sealed);
            varmor::wrap(Version::V2, &body)
        }
    }
}

/// Decrypt an armored token with a passphrase
///
/// The key derivation scheme is taken from the token itself.
pub fn decrypt(passphrase: &[u8], token: &str) -> Result<Vec<u8>> {
    let (version, body) = varmor::unwrap(token)?;
    let (key, sealed) = match version {
        Version::V1 => (kdf::derive_key(passphrase), &body[..]),
        Version::V2 => scrypt_key(passphrase, &body)?,
    };
    secretcrypt::open(&key, sealed)
}

fn scrypt_key<'a>(passphrase: &[u8], body: &'a [u8]) -> Result<(DerivedKey, &'a [u8])> {
    if body.len() < SCRYPT_HEADER_LEN {
        return Err(TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedInput,
            "input likely truncated while reading key derivation parameters",
        ));
    }
    let (header, sealed) = body.split_at(SCRYPT_HEADER_LEN);

    let log_n = header[0];
    let r = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    let p = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&header[9..]);

    let cost = ScryptCost::with_params(log_n, r, p)?;
    let key = kdf::derive_key_scrypt(passphrase, &salt, cost)?;
    Ok((key, sealed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_scrypt() -> Kdf {
        Kdf::Scrypt(ScryptCost::new(10).unwrap())
    }

    #[test]
    fn test_roundtrip_both_schemes() {
        for kdf in [Kdf::Sha256, fast_scrypt()] {
            let token = encrypt(b"test", b"hello", kdf).unwrap();
            assert_eq!(decrypt(b"test", &token).unwrap(), b"hello");
        }
    }

    #[test]
    fn test_roundtrip_random_inputs() {
        let mut rng = rand::thread_rng();
        for len in [0usize, 1, 15, 16, 17, 255, 4096] {
            let mut plaintext = vec![0u8; len];
            rng.fill_bytes(&mut plaintext);
            let mut passphrase = vec![0u8; len % 40];
            rng.fill_bytes(&mut passphrase);

            let token = encrypt(&passphrase, &plaintext, Kdf::Sha256).unwrap();
            assert_eq!(decrypt(&passphrase, &token).unwrap(), plaintext, "len {}", len);
        }
    }

    #[test]
    fn test_token_prefix_follows_scheme() {
        assert!(encrypt(b"p", b"x", Kdf::Sha256).unwrap().starts_with("textlock1:"));
        assert!(encrypt(b"p", b"x", fast_scrypt()).unwrap().starts_with("textlock2:"));
    }

    #[test]
    fn test_empty_passphrase_accepted() {
        let token = encrypt(b"", b"payload", Kdf::Sha256).unwrap();
        assert_eq!(decrypt(b"", &token).unwrap(), b"payload");

        let err = decrypt(b" ", &token).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_same_input_different_tokens() {
        let t1 = encrypt(b"k", b"same plaintext", Kdf::Sha256).unwrap();
        let t2 = encrypt(b"k", b"same plaintext", Kdf::Sha256).unwrap();
        assert_ne!(t1, t2);
        assert_eq!(decrypt(b"k", &t1).unwrap(), decrypt(b"k", &t2).unwrap());
    }

    #[test]
    fn test_wrong_passphrase_scrypt() {
        let token = encrypt(b"right", b"secret", fast_scrypt()).unwrap();
        let err = decrypt(b"wrong", &token).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_salt_changes_token() {
        let nonce = [7u8; NONCE_LEN];
        let t1 =
            encrypt_deterministic(b"k", b"data", fast_scrypt(), &[1u8; SALT_LEN], &nonce).unwrap();
        let t2 =
            encrypt_deterministic(b"k", b"data", fast_scrypt(), &[2u8; SALT_LEN], &nonce).unwrap();
        assert_ne!(t1, t2);

        // Salt is irrelevant for the unsalted scheme.
        let t3 =
            encrypt_deterministic(b"k", b"data", Kdf::Sha256, &[1u8; SALT_LEN], &nonce).unwrap();
        let t4 =
            encrypt_deterministic(b"k", b"data", Kdf::Sha256, &[2u8; SALT_LEN], &nonce).unwrap();
        assert_eq!(t3, t4);
    }

    #[test]
    fn test_truncated_scrypt_header() {
        let token = varmor::wrap(Version::V2, &[10, 0, 0]);
        let err = decrypt(b"k", &token).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::TruncatedInput));
    }

    #[test]
    fn test_excessive_scrypt_cost_rejected() {
        let mut body = vec![ScryptCost::MAX_LOG_N + 1];
        body.extend_from_slice(&8u32.to_be_bytes());
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&[0u8; SALT_LEN]);
        body.extend_from_slice(&[0u8; 64]);

        let err = decrypt(b"k", &varmor::wrap(Version::V2, &body)).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));
    }

    #[test]
    fn test_excessive_scrypt_memory_rejected() {
        let header = |log_n: u8, r: u32, p: u32| {
            let mut body = vec![log_n];
            body.extend_from_slice(&r.to_be_bytes());
            body.extend_from_slice(&p.to_be_bytes());
            body.extend_from_slice(&[0u8; SALT_LEN]);
            body.extend_from_slice(&[0u8; 64]);
            varmor::wrap(Version::V2, &body)
        };

        let err = decrypt(b"k", &header(ScryptCost::MAX_LOG_N, 1 << 26, 1)).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));

        let err = decrypt(b"k", &header(10, 8, u32::MAX)).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));
    }

    #[test]
    fn test_tampered_token() {
        let token = encrypt(b"k", b"important", Kdf::Sha256).unwrap();
        let (version, mut body) = varmor::unwrap(&token).unwrap();
        let mid = body.len() - 5;
        body[mid] ^= 0x80;

        let err = decrypt(b"k", &varmor::wrap(version, &body)).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }
}
