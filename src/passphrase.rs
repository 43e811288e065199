//! Where the passphrase comes from
//!
//! The passphrase is requested once per operation, after the target has been
//! read, so a prompt can name the file being locked or unlocked. Passphrases
//! are raw bytes and need not be UTF-8.

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use std::io::{self, Read};
use std::path::Path;
use zeroize::Zeroizing;

/// Passphrase bytes, wiped from memory when dropped.
pub type Passphrase = Zeroizing<Vec<u8>>;

pub trait PassphraseSource {
    /// Passphrase for the operation on `target`.
    fn passphrase_for(&mut self, target: &Path) -> Result<Passphrase>;
}

/// A passphrase known up front, for library callers.
pub struct FixedPassphrase(Passphrase);

impl FixedPassphrase {
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(passphrase.into()))
    }
}

impl PassphraseSource for FixedPassphrase {
    fn passphrase_for(&mut self, _target: &Path) -> Result<Passphrase> {
        Ok(self.0.clone())
    }
}

/// Everything `reader` yields up to EOF. Nothing is stripped, so a trailing
/// newline is part of the passphrase.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl ReaderSource<io::Stdin> {
    /// `--passphrase-stdin`
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> PassphraseSource for ReaderSource<R> {
    fn passphrase_for(&mut self, _target: &Path) -> Result<Passphrase> {
        let mut passphrase = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut passphrase).map_err(|e| {
            TextlockError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to read passphrase",
                e,
            )
        })?;
        Ok(passphrase)
    }
}

/// Prompts on the controlling terminal without echoing input.
///
/// rpassword only returns UTF-8, so non-UTF-8 passphrases have to come
/// through `ReaderSource`.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PassphraseSource for TerminalPrompt {
    fn passphrase_for(&mut self, target: &Path) -> Result<Passphrase> {
        let name = target
            .file_name()
            .map_or_else(|| target.display().to_string(), |n| n.to_string_lossy().into_owned());

        let entered = rpassword::prompt_password(format!("Passphrase for {name}: ")).map_err(|e| {
            TextlockError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from the terminal (use --passphrase-stdin)",
                e,
            )
        })?;
        Ok(Zeroizing::new(entered.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    fn target() -> &'static Path {
        Path::new("notes.txt")
    }

    #[test]
    fn test_fixed_passphrase_is_repeatable() {
        let mut source = FixedPassphrase::new("test123");
        assert_eq!(&**source.passphrase_for(target()).unwrap(), b"test123");
        assert_eq!(&**source.passphrase_for(target()).unwrap(), b"test123");
    }

    #[test]
    fn test_reader_keeps_trailing_newline() {
        let mut source = ReaderSource::new(&b"mypassword\n"[..]);
        assert_eq!(&**source.passphrase_for(target()).unwrap(), b"mypassword\n");
    }

    #[test]
    fn test_reader_empty_and_non_utf8() {
        let mut source = ReaderSource::new(&b""[..]);
        assert!(source.passphrase_for(target()).unwrap().is_empty());

        let raw: &[u8] = &[0xff, 0xfe, 0x00, 0x01];
        let mut source = ReaderSource::new(raw);
        assert_eq!(&**source.passphrase_for(target()).unwrap(), raw);
    }

    #[test]
    fn test_reader_failure_keeps_cause_as_source() {
        let err = ReaderSource::new(BrokenPipe)
            .passphrase_for(target())
            .unwrap_err();

        assert_eq!(err.kind, Some(ErrorKind::Io));
        assert_eq!(err.to_string(), "failed to read passphrase");
        assert_eq!(err.source().unwrap().to_string(), "pipe closed");
    }
}
