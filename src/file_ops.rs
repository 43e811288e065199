//! File and directory encryption/decryption operations
//!
//! This module drives the whole workflow: naming, archival, reading,
//! passphrase acquisition, the cipher transform and the final write. Outputs
//! are always created exclusively; an existing file is never overwritten.

use crate::archive;
use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use crate::kdf::Kdf;
use crate::passphrase::PassphraseSource;
use crate::paths;
use crate::progress::{Progress, Step};
use crate::token;
use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Settings for `encrypt_path`.
#[derive(Debug, Clone, Default)]
pub struct EncryptOptions {
    pub kdf: Kdf,
    /// Where directory archives are staged. Defaults to the system
    /// temporary directory.
    pub temp_dir: Option<PathBuf>,
}

/// Settings for `decrypt_path`.
#[derive(Debug, Clone, Default)]
pub struct DecryptOptions {
    /// Unpack a decrypted `.tar.gz` into a directory instead of writing the
    /// archive itself.
    pub extract: bool,
}

/// Encrypt a file or directory with a passphrase
///
/// `name.ext` is written to `name.ext.textlock`. A directory `name` is
/// archived to a temporary gzip tarball first and written to
/// `name.tar.gz.textlock`; the temporary archive is removed on every exit
/// path. Returns the path written.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_path(
    target: &Path,
    passphrase_source: &mut dyn PassphraseSource,
    options: &EncryptOptions,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    let is_dir = target.is_dir();
    let output_path = paths::encrypted_path(&named(target)?, is_dir)?;

    // Held until the end of the function so the archive outlives the read
    // and is dropped (deleted) on both the success and the error path.
    let archive = if is_dir {
        progress.step(Step::Archiving);
        Some(archive::pack_dir(target, options.temp_dir.as_deref())?)
    } else {
        None
    };
    let input_path = archive.as_ref().map_or(target, |a| a.path());

    let plaintext = fs::read(input_path).map_err(|e| read_error(target, e))?;
    debug!("read {} bytes from {}", plaintext.len(), input_path.display());

    let passphrase = passphrase_source.passphrase_for(target)?;

    progress.step(Step::Encrypting);
    let armored = token::encrypt(&passphrase, &plaintext, options.kdf)
        .map_err(|e| e.with_context("encryption failed"))?;

    progress.step(Step::WritingEncrypted);
    write_new_file(&output_path, armored.as_bytes())?;
    drop(archive);

    info!("encrypted {} to {}", target.display(), output_path.display());
    progress.step(Step::Encrypted);
    Ok(output_path)
}

/// Decrypt a `.textlock` file with a passphrase
///
/// `name.ext.textlock` is written to `name.ext`. With `extract`, the target
/// must be `name.tar.gz.textlock` and is unpacked into a new directory
/// `name`. The suffix is validated before anything is read. Returns the path
/// written.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_path(
    target: &Path,
    passphrase_source: &mut dyn PassphraseSource,
    options: &DecryptOptions,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    let output_path = if options.extract {
        paths::extracted_dir(target)?
    } else {
        paths::decrypted_path(target)?
    };

    let armored_bytes = fs::read(target).map_err(|e| read_error(target, e))?;
    let armored = String::from_utf8(armored_bytes).map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "encrypted file is not valid UTF-8",
            e,
        )
    })?;
    let passphrase = passphrase_source.passphrase_for(target)?;

    progress.step(Step::Decrypting);
    let plaintext = token::decrypt(&passphrase, armored.trim_end())?;
    debug!("decrypted {} bytes from {}", plaintext.len(), target.display());

    if options.extract {
        progress.step(Step::Extracting);
        archive::unpack_into_new_dir(&plaintext[..], &output_path)?;
    } else {
        progress.step(Step::WritingDecrypted);
        write_new_file(&output_path, &plaintext)?;
    }

    info!("decrypted {} to {}", target.display(), output_path.display());
    progress.step(Step::Decrypted);
    Ok(output_path)
}

/// Returns `target`, canonicalized if it has no final component (`.`, `..`).
fn named(target: &Path) -> Result<PathBuf> {
    if target.file_name().is_some() {
        return Ok(target.to_path_buf());
    }
    fs::canonicalize(target).map_err(|e| read_error(target, e))
}

/// Create `path` exclusively and write `contents` to it.
///
/// Fails with `OutputExists` if anything is already at `path`. If the write
/// itself fails, the partially written file is removed.
fn write_new_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        let (category, kind) = if e.kind() == io::ErrorKind::AlreadyExists {
            (ErrorCategory::User, ErrorKind::OutputExists)
        } else {
            (ErrorCategory::Internal, ErrorKind::Io)
        };
        TextlockError::with_kind_and_source(
            category,
            kind,
            format!("failed to create {}", path.display()),
            e,
        )
    })?;

    remove_on_failure(path, move || {
        file.write_all(contents)?;
        file.sync_all()
    })
}

/// Runs `write`, which fills the freshly created `path`, and removes `path`
/// if it fails. `write` owns the file handle so it is closed before removal.
fn remove_on_failure(path: &Path, write: impl FnOnce() -> io::Result<()>) -> Result<()> {
    write().map_err(|e| {
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("could not remove partial output {}: {}", path.display(), remove_err);
        }
        TextlockError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to write {}", path.display()),
            e,
        )
    })
}

fn read_error(path: &Path, err: io::Error) -> TextlockError {
    let (category, kind) = if err.kind() == io::ErrorKind::NotFound {
        (ErrorCategory::User, ErrorKind::NotFound)
    } else {
        (ErrorCategory::Internal, ErrorKind::Io)
    };
    TextlockError::with_kind_and_source(
        category,
        kind,
        format!("failed to read from {}", path.display()),
        err,
    )
}
