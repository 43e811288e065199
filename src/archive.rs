//! Directory archival as gzip-compressed tar
//!
//! Archives are rooted at the directory itself: entries are stored as
//! `./a.txt`, `./b/c.txt`, so extracting reproduces the directory's contents
//! without a wrapping folder.

use crate::error::{ErrorCategory, ErrorKind, Result, TextlockError};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::debug;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tempfile::NamedTempFile;

/// Archive the contents of `dir` into a private temporary file.
///
/// The archive is created in `temp_dir` when given, otherwise in the system
/// temporary directory. It is deleted when the returned handle is dropped.
pub fn pack_dir(dir: &Path, temp_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".textlock-").suffix(".tar.gz");
    let temp_file = match temp_dir {
        Some(temp_dir) => builder.tempfile_in(temp_dir),
        None => builder.tempfile(),
    }
    .map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create temporary archive",
            e,
        )
    })?;
    debug!(
        "archiving {} into {}",
        dir.display(),
        temp_file.path().display()
    );

    write_tar_gz(dir, temp_file.as_file()).map_err(|e| {
        TextlockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Archive,
            format!("failed to archive {}", dir.display()),
            e,
        )
    })?;

    Ok(temp_file)
}

fn write_tar_gz(dir: &Path, file: &fs::File) -> io::Result<()> {
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(".", dir)?;
    let file = builder.into_inner()?.finish()?;
    file.sync_all()
}

/// Extract a gzip tarball into `dest`, which must not exist yet.
///
/// If extraction fails, `dest` is removed again so no partial tree is left
/// behind.
pub fn unpack_into_new_dir(archive: impl Read, dest: &Path) -> Result<()> {
    fs::create_dir(dest).map_err(|e| {
        let (category, kind) = if e.kind() == io::ErrorKind::AlreadyExists {
            (ErrorCategory::User, ErrorKind::OutputExists)
        } else {
            (ErrorCategory::Internal, ErrorKind::Io)
        };
        TextlockError::with_kind_and_source(
            category,
            kind,
            format!("failed to create directory {}", dest.display()),
            e,
        )
    })?;

    let mut tarball = tar::Archive::new(GzDecoder::new(archive));
    if let Err(e) = tarball.unpack(dest) {
        let _ = fs::remove_dir_all(dest);
        return Err(TextlockError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Archive,
            format!("failed to extract archive into {}", dest.display()),
            e,
        ));
    }
    debug!("extracted archive into {}", dest.display());
    Ok(())
}
