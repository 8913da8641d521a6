//! encutil - encrypt and decrypt files with a password or a keyfile
//!
//! This crate provides:
//! - Authenticated, streaming file encryption (XChaCha20-Poly1305 in 64 KiB chunks)
//! - Password-based encryption with Argon2id key derivation
//! - Random keys stored in ASCII-safe keyfiles, optionally password protected
//! - Fail-closed decryption: wrong credentials and tampering look the same and
//!   never produce output

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use error::{EncUtilError, ErrorKind, Result};
