//! Runtime settings
//!
//! encutil reads no config files. These are the built-in defaults; tests
//! construct a `Config` with cheaper key derivation.

use crate::crypto::KdfParams;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Argon2id cost for newly written password-protected files and keyfiles
    pub kdf: KdfParams,
}
