//! Passphrase to key derivation
//!
//! The default scheme hashes the passphrase with SHA-256. It is deliberately
//! unsalted: the same passphrase always yields the same key, on any machine,
//! so a file can be decrypted from the passphrase alone.
//!
//! The opt-in scrypt scheme trades that for dictionary-attack resistance. Its
//! salt and cost parameters travel inside the token, so the same passphrase
//! still yields the same key for a given file.

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use scrypt::{Params, scrypt};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// Length of scrypt salt in bytes
pub const SALT_LEN: usize = 8;

/// A symmetric key, wiped from memory on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// scrypt work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    log_n: u8,
    r: u32,
    p: u32,
}

impl ScryptCost {
    /// Upper bound on log2(N).
    pub const MAX_LOG_N: u8 = 22;

    /// Upper bound on scrypt's working memory (128 * r * N bytes). Decryption
    /// honors whatever cost a token declares, so r and N are capped together:
    /// 4 GiB, the amount needed at the maximum log2(N) with the default r.
    pub const MAX_MEMORY: u64 = 128 * Self::DEFAULT_R as u64 * (1u64 << Self::MAX_LOG_N);

    /// Upper bound on p, which multiplies the running time.
    pub const MAX_P: u32 = 16;

    pub const DEFAULT_LOG_N: u8 = 15;
    pub const DEFAULT_R: u32 = 8;
    pub const DEFAULT_P: u32 = 1;

    /// Cost with the given log2(N) and the default r and p.
    pub fn new(log_n: u8) -> Result<Self> {
        Self::with_params(log_n, Self::DEFAULT_R, Self::DEFAULT_P)
    }

    pub fn with_params(log_n: u8, r: u32, p: u32) -> Result<Self> {
        if log_n == 0 || log_n > Self::MAX_LOG_N {
            return Err(TextlockError::with_kind(
                ErrorCategory::User,
                ErrorKind::BinaryFormat,
                format!(
                    "scrypt log2(N) must be between 1 and {}, got {}",
                    Self::MAX_LOG_N,
                    log_n
                ),
            ));
        }
        let memory = (128 * u64::from(r)) << log_n;
        if memory > Self::MAX_MEMORY || p > Self::MAX_P {
            return Err(TextlockError::with_kind(
                ErrorCategory::User,
                ErrorKind::BinaryFormat,
                format!(
                    "scrypt cost too high (log_n={log_n}, r={r}, p={p}); at most {} MiB \
                     of memory and p <= {} are accepted",
                    Self::MAX_MEMORY >> 20,
                    Self::MAX_P
                ),
            ));
        }
        // scrypt::Params enforces the remaining constraints on r and p.
        Params::new(log_n, r, p, KEY_LEN).map_err(|e| {
            TextlockError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::BinaryFormat,
                format!("invalid scrypt parameters (log_n={log_n}, r={r}, p={p})"),
                e,
            )
        })?;
        Ok(Self { log_n, r, p })
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }
}

impl Default for ScryptCost {
    fn default() -> Self {
        Self {
            log_n: Self::DEFAULT_LOG_N,
            r: Self::DEFAULT_R,
            p: Self::DEFAULT_P,
        }
    }
}

/// Key derivation scheme used when encrypting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Kdf {
    /// Unsalted SHA-256 of the passphrase.
    #[default]
    Sha256,
    /// scrypt with a random per-file salt.
    Scrypt(ScryptCost),
}

/// Derive a key from a passphrase by hashing it with SHA-256.
///
/// Any input is accepted, including the empty passphrase.
pub fn derive_key(passphrase: &[u8]) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&Sha256::digest(passphrase));
    DerivedKey(key)
}

/// Derive a key from a passphrase and salt using scrypt
pub fn derive_key_scrypt(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    cost: ScryptCost,
) -> Result<DerivedKey> {
    let params = Params::new(cost.log_n, cost.r, cost.p, KEY_LEN).map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            "failed to create scrypt params",
            e,
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, salt, &params, &mut key[..]).map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            "scrypt key derivation failed",
            e,
        )
    })?;

    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answers() {
        assert_eq!(
            hex::encode(derive_key(b"").as_bytes()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(derive_key(b"test").as_bytes()),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let k1 = derive_key(b"correct horse battery staple");
        let k2 = derive_key(b"correct horse battery staple");
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_passphrases_different_keys() {
        let k1 = derive_key(b"passphrase one");
        let k2 = derive_key(b"passphrase two");
        assert_ne!(k1.as_bytes(), k2.as_bytes());

        // Trailing whitespace is significant.
        let k3 = derive_key(b"passphrase one\n");
        assert_ne!(k1.as_bytes(), k3.as_bytes());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = derive_key(b"secret");
        assert_eq!(format!("{:?}", key), "DerivedKey(..)");
    }

    #[test]
    fn test_scrypt_deterministic_per_salt() {
        let cost = ScryptCost::new(10).unwrap();
        let salt_a = [1u8; SALT_LEN];
        let salt_b = [2u8; SALT_LEN];

        let k1 = derive_key_scrypt(b"test", &salt_a, cost).unwrap();
        let k2 = derive_key_scrypt(b"test", &salt_a, cost).unwrap();
        let k3 = derive_key_scrypt(b"test", &salt_b, cost).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_ne!(k1.as_bytes(), k3.as_bytes());
        assert_ne!(k1.as_bytes(), derive_key(b"test").as_bytes());
    }

    #[test]
    fn test_scrypt_cost_bounds() {
        assert!(ScryptCost::new(0).is_err());
        assert!(ScryptCost::new(ScryptCost::MAX_LOG_N).is_ok());

        let err = ScryptCost::new(ScryptCost::MAX_LOG_N + 1).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));

        let err = ScryptCost::with_params(10, 0, 1).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));
    }

    #[test]
    fn test_scrypt_memory_and_parallelism_bounds() {
        // r trades against N: a larger r is fine while the memory stays bounded.
        assert!(ScryptCost::with_params(ScryptCost::MAX_LOG_N - 1, 16, 1).is_ok());
        assert!(ScryptCost::with_params(ScryptCost::MAX_LOG_N, 9, 1).is_err());
        assert!(ScryptCost::with_params(ScryptCost::MAX_LOG_N, 1 << 26, 1).is_err());
        assert!(ScryptCost::with_params(1, u32::MAX, 1).is_err());

        assert!(ScryptCost::with_params(10, 8, ScryptCost::MAX_P).is_ok());
        let err = ScryptCost::with_params(10, 8, ScryptCost::MAX_P + 1).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::BinaryFormat));
    }

    #[test]
    fn test_default_cost() {
        let cost = ScryptCost::default();
        assert_eq!(cost.log_n(), 15);
        assert_eq!(cost.r(), 8);
        assert_eq!(cost.p(), 1);
        assert_eq!(Kdf::default(), Kdf::Sha256);
    }
}
