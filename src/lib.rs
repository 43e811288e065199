//! textlock - Passphrase-based file and directory encryption

#![forbid(unsafe_code)]

pub mod archive;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod paths;
pub mod progress;
pub mod secretcrypt;
pub mod token;
pub mod varmor;
