use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The decryption target does not carry the `.textlock` suffix (or the
    /// `.tar.gz.textlock` suffix when extraction was requested).
    MissingSuffix,
    /// The target path does not exist.
    NotFound,
    /// No output name can be derived from the target path (e.g. `/`).
    InvalidTarget,
    /// The output path already exists and will not be overwritten.
    OutputExists,
    /// Authentication failed due to an incorrect passphrase or tampering
    /// or corruption.
    AuthenticationFailed,
    /// The armored representation is malformed (prefix, encoding).
    ArmoringInvalid,
    /// Base64 decoding of the armored payload failed.
    ArmoringDecode,
    /// Input claimed to be textlock but used a future/unsupported version.
    ArmoringFromFuture,
    /// Length fields, key derivation parameters or binary layout are invalid.
    BinaryFormat,
    /// Input data ended before the expected component could be read.
    TruncatedInput,
    /// Additional bytes were present after the sealed payload.
    TrailingData,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Low-level key derivation failed.
    KeyDerivation,
    /// Building or extracting a directory archive failed.
    Archive,
    /// XSalsa20Poly1305 failed to seal data.
    SecretboxFailure,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

/// Process exit codes reported by the `textlock` binary.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    /// Command line usage errors, reported by clap or for a target that
    /// cannot be named.
    pub const USAGE: i32 = 2;
    pub const MISSING_SUFFIX: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const OUTPUT_EXISTS: i32 = 5;
    pub const TOKEN_REJECTED: i32 = 6;
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct TextlockError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl TextlockError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// Maps the error onto the documented process exit code.
    ///
    /// Every way a token can be rejected (bad passphrase, tampering,
    /// truncation, garbage input) shares one code, since from the outside
    /// they are indistinguishable without the right passphrase.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            Some(ErrorKind::MissingSuffix) => exit_code::MISSING_SUFFIX,
            Some(ErrorKind::NotFound) => exit_code::NOT_FOUND,
            Some(ErrorKind::OutputExists) => exit_code::OUTPUT_EXISTS,
            Some(ErrorKind::InvalidTarget) => exit_code::USAGE,
            Some(
                ErrorKind::AuthenticationFailed
                | ErrorKind::ArmoringInvalid
                | ErrorKind::ArmoringDecode
                | ErrorKind::ArmoringFromFuture
                | ErrorKind::BinaryFormat
                | ErrorKind::TruncatedInput
                | ErrorKind::TrailingData,
            ) => exit_code::TOKEN_REJECTED,
            _ => exit_code::FAILURE,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TextlockError>;
