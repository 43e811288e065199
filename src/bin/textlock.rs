//! textlock CLI - Passphrase-based file encryption
//!
//! Command-line interface for encrypting and decrypting files and
//! directories. Keys are derived from a passphrase; directories are stored
//! as gzip tarballs.

use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;

use textlock::error::{Result, TextlockError, exit_code};
use textlock::file_ops::{self, DecryptOptions, EncryptOptions};
use textlock::kdf::{Kdf, ScryptCost};
use textlock::passphrase::{PassphraseSource, ReaderSource, TerminalPrompt};
use textlock::progress::{ConsoleProgress, Progress, SilentProgress};

#[derive(Parser)]
#[command(name = "textlock")]
#[command(version)]
#[command(about = "Passphrase-based file and directory encryption.", long_about = None)]
#[command(after_help = "Exit codes: 0 success, 1 failure, 2 usage, 3 missing .textlock \
    suffix, 4 target not found, 5 output already exists, 6 wrong passphrase or corrupt input.\n\
    Set TEXTLOCK_LOG=debug for diagnostic logging.")]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Do not print progress messages
    #[arg(short, long, global = true, env = "TEXTLOCK_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file or directory to <PATH>.textlock (directories to <PATH>.tar.gz.textlock)
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file or directory to encrypt
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Key derivation scheme
        #[arg(long, value_enum, default_value_t = KdfArg::Sha256, env = "TEXTLOCK_KDF")]
        kdf: KdfArg,

        /// scrypt cost as log2(N); only used with --kdf scrypt
        #[arg(
            long,
            value_name = "N",
            default_value_t = ScryptCost::DEFAULT_LOG_N,
            value_parser = clap::value_parser!(u8).range(1..=ScryptCost::MAX_LOG_N as i64),
            env = "TEXTLOCK_SCRYPT_LOG_N"
        )]
        scrypt_log_n: u8,

        /// Directory for the temporary archive when encrypting a directory
        #[arg(long, value_name = "DIR", env = "TEXTLOCK_TMPDIR")]
        temp_dir: Option<PathBuf>,
    },

    /// Decrypt a .textlock file next to itself, without the suffix
    #[command(alias = "d")]
    Decrypt {
        /// Path to the .textlock file to decrypt
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Unpack a decrypted NAME.tar.gz.textlock into the directory NAME
        #[arg(long)]
        extract: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KdfArg {
    /// SHA-256 of the passphrase; no salt
    Sha256,
    /// scrypt with a random salt stored in the file
    Scrypt,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("TEXTLOCK_LOG", "warn"))
        .init();

    let cli = Cli::parse();

    let mut passphrase = passphrase_source(cli.passphrase_stdin);
    let mut progress: Box<dyn Progress> = if cli.quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(ConsoleProgress)
    };

    let result = run(cli.command, &mut *passphrase, &mut *progress);

    match result {
        Ok(_) => process::exit(exit_code::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            process::exit(e.exit_code());
        }
    }
}

fn run(
    command: Commands,
    passphrase: &mut dyn PassphraseSource,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    match command {
        Commands::Encrypt {
            path,
            kdf,
            scrypt_log_n,
            temp_dir,
        } => {
            let kdf = match kdf {
                KdfArg::Sha256 => Kdf::Sha256,
                KdfArg::Scrypt => Kdf::Scrypt(ScryptCost::new(scrypt_log_n)?),
            };
            let options = EncryptOptions { kdf, temp_dir };
            file_ops::encrypt_path(&path, passphrase, &options, progress)
        }
        Commands::Decrypt { path, extract } => {
            let options = DecryptOptions { extract };
            file_ops::decrypt_path(&path, passphrase, &options, progress)
        }
    }
}

/// Formats an error followed by each of its sources, separated by `: `.
fn error_chain(err: &TextlockError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

fn passphrase_source(use_stdin: bool) -> Box<dyn PassphraseSource> {
    if use_stdin {
        Box::new(ReaderSource::stdin())
    } else {
        Box::new(TerminalPrompt)
    }
}
