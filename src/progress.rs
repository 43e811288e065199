//! Progress reporting
//!
//! Progress messages are observational only. The library reports steps
//! through the `Progress` trait and leaves presentation to the caller.

use std::fmt;

/// A major step of an encrypt or decrypt operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Archiving,
    Encrypting,
    WritingEncrypted,
    Encrypted,
    Decrypting,
    WritingDecrypted,
    Extracting,
    Decrypted,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Step::Archiving => "Archiving directory contents...",
            Step::Encrypting => "Encrypting content...",
            Step::WritingEncrypted => "Writing encrypted content to file...",
            Step::Encrypted => "Encryption successful.",
            Step::Decrypting => "Decrypting content...",
            Step::WritingDecrypted => "Writing decrypted content to file...",
            Step::Extracting => "Extracting archive contents...",
            Step::Decrypted => "Decryption successful.",
        };
        f.write_str(msg)
    }
}

/// Receives step notifications
pub trait Progress {
    fn step(&mut self, step: Step);
}

/// Prints each step on its own line to stdout
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn step(&mut self, step: Step) {
        println!("{}", step);
    }
}

/// Discards all steps
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn step(&mut self, _step: Step) {}
}

/// Records steps in order (for testing)
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub steps: Vec<Step>,
}

impl Progress for RecordingProgress {
    fn step(&mut self, step: Step) {
        self.steps.push(step);
    }
}
