//! Command-line use cases
//!
//! The argument vector is matched structurally: two flag literals plus the
//! number of arguments pick exactly one of five operations. Flags cannot be
//! abbreviated, reordered or combined.

mod genkey;
mod keyfile;
mod password;
pub mod prompt;

use std::ffi::OsStr;
use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::error::{EncUtilError, Result};

pub use prompt::{Prompt, TerminalPrompt};

pub const USAGE: &str = "\
Usage:
    encutil --encrypt --password <input> <output>
    encutil --decrypt --password <input> <output>
    encutil --genkey <keyfile>
    encutil --encrypt --keyfile <keyfile> <input> <output>
    encutil --decrypt --keyfile <keyfile> <input> <output>";

/// One operation per invocation, carrying only the paths its shape provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseCase {
    EncryptWithPassword { input: PathBuf, output: PathBuf },
    DecryptWithPassword { input: PathBuf, output: PathBuf },
    GenerateKeyfile { path: PathBuf },
    EncryptWithKeyfile { keyfile: PathBuf, input: PathBuf, output: PathBuf },
    DecryptWithKeyfile { keyfile: PathBuf, input: PathBuf, output: PathBuf },
}

impl UseCase {
    /// Select the operation for a full argument vector, program name included.
    ///
    /// Arms are tried in order, so should two shapes ever overlap the earlier one wins.
    pub fn from_args<S: AsRef<OsStr>>(args: &[S]) -> Result<Self> {
        let flag = |i: usize| args.get(i).and_then(|a| a.as_ref().to_str());
        let path = |i: usize| PathBuf::from(args[i].as_ref());

        let use_case = match (flag(1), flag(2), args.len()) {
            (Some("--encrypt"), Some("--password"), 5) => Self::EncryptWithPassword {
                input: path(3),
                output: path(4),
            },
            (Some("--decrypt"), Some("--password"), 5) => Self::DecryptWithPassword {
                input: path(3),
                output: path(4),
            },
            (Some("--genkey"), _, 3) => Self::GenerateKeyfile { path: path(2) },
            (Some("--encrypt"), Some("--keyfile"), 6) => Self::EncryptWithKeyfile {
                keyfile: path(3),
                input: path(4),
                output: path(5),
            },
            (Some("--decrypt"), Some("--keyfile"), 6) => Self::DecryptWithKeyfile {
                keyfile: path(3),
                input: path(4),
                output: path(5),
            },
            _ => return Err(EncUtilError::Usage),
        };
        Ok(use_case)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EncryptWithPassword { .. } => "encrypt-with-password",
            Self::DecryptWithPassword { .. } => "decrypt-with-password",
            Self::GenerateKeyfile { .. } => "generate-keyfile",
            Self::EncryptWithKeyfile { .. } => "encrypt-with-keyfile",
            Self::DecryptWithKeyfile { .. } => "decrypt-with-keyfile",
        }
    }

    pub fn run(&self, prompt: &mut dyn Prompt, config: &Config) -> Result<()> {
        info!(use_case = self.name(), "running");
        match self {
            Self::EncryptWithPassword { input, output } => {
                password::encrypt(input, output, prompt, config)
            }
            Self::DecryptWithPassword { input, output } => password::decrypt(input, output, prompt),
            Self::GenerateKeyfile { path } => genkey::run(path, prompt, config),
            Self::EncryptWithKeyfile {
                keyfile,
                input,
                output,
            } => keyfile::encrypt(keyfile, input, output, prompt),
            Self::DecryptWithKeyfile {
                keyfile,
                input,
                output,
            } => keyfile::decrypt(keyfile, input, output, prompt),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        kdf: crate::crypto::test_params(),
    }
}
