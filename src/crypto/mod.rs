//! Cryptographic primitives for encutil
//!
//! This module provides:
//! - Argon2id for password-based key derivation
//! - XChaCha20-Poly1305 chunk encryption with HKDF-SHA256 per-file subkeys
//! - The streaming file container built on top of them
//! - Keys, password-protected keys and their keyfile encoding
//! - Secure memory handling with automatic zeroing

mod argon;
mod chacha;
mod keys;
mod secure_bytes;
mod stream;

pub use argon::{derive_key, DerivedKey, KdfParams, KDF_PARAMS_LEN, KEY_LEN, SALT_LEN};
pub use keys::{Key, KeyFile, PasswordProtectedKey};
pub use secure_bytes::SecureBytes;
pub(crate) use stream::{open_with_key, open_with_password, seal_with_key, seal_with_password};

#[cfg(test)]
pub(crate) use argon::test_params;
