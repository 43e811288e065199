//! Output file naming
//!
//! Names are computed from the final path component, so trailing slashes
//! on directory arguments do not leak into the output name.

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix marking an encrypted file.
pub const SUFFIX: &str = ".textlock";

/// Suffix added to directories, which are stored as gzip tarballs.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Output path for encrypting `target`.
///
/// `name.ext` becomes `name.ext.textlock`, a directory `name` becomes
/// `name.tar.gz.textlock`. `target` must have a final component; callers
/// resolve `.` and `..` beforehand.
pub fn encrypted_path(target: &Path, is_dir: bool) -> Result<PathBuf> {
    let file_name = target.file_name().ok_or_else(|| {
        TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidTarget,
            format!("cannot derive an output name from {}", target.display()),
        )
    })?;

    let mut name = OsString::from(file_name);
    if is_dir {
        name.push(ARCHIVE_SUFFIX);
    }
    name.push(SUFFIX);
    Ok(target.with_file_name(name))
}

/// Output path for decrypting `target`: exactly one trailing `.textlock`
/// is removed.
///
/// Fails with `MissingSuffix` unless the file name ends in `.textlock` and
/// something is left once it is removed. Never touches the filesystem.
pub fn decrypted_path(target: &Path) -> Result<PathBuf> {
    let stem = suffixed_stem(target, SUFFIX)?;
    Ok(target.with_file_name(stem))
}

/// Directory to extract into when decrypting `target`, which must be named
/// `name.tar.gz.textlock`; the result is `name`.
pub fn extracted_dir(target: &Path) -> Result<PathBuf> {
    let stem = suffixed_stem(target, &format!("{ARCHIVE_SUFFIX}{SUFFIX}"))?;
    Ok(target.with_file_name(stem))
}

fn suffixed_stem<'a>(target: &'a Path, suffix: &str) -> Result<&'a str> {
    let missing = || {
        TextlockError::with_kind(
            ErrorCategory::User,
            ErrorKind::MissingSuffix,
            format!("the target requires the {} extension: {}", suffix, target.display()),
        )
    };

    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(missing)?;
    match file_name.strip_suffix(suffix) {
        Some(stem) if !stem.is_empty() => Ok(stem),
        _ => Err(missing()),
    }
}
