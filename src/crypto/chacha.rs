//! XChaCha20-Poly1305 Authenticated Encryption, one chunk at a time
//!
//! A file is sealed as a sequence of chunks under one subkey. Each chunk nonce
//! is the per-file random prefix followed by the chunk index and a flag marking
//! the final chunk, so reordering, dropping or appending chunks breaks
//! authentication.

use chacha20poly1305::{AeadInPlace, KeyInit, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use sha2::Sha256;

use super::{SecureBytes, KEY_LEN, SALT_LEN};
use crate::error::{EncUtilError, Result};

/// Full XChaCha20 nonce length (192 bits)
pub const NONCE_LEN: usize = 24;

/// Random part of every chunk nonce: 24 bytes minus u32 index minus flag byte
pub const NONCE_PREFIX_LEN: usize = NONCE_LEN - 5;

/// Authentication tag length (128 bits)
pub const TAG_LEN: usize = 16;

const FILE_KEY_INFO: &[u8] = b"encutil file encryption key";

/// Derive the per-file subkey from a master key and the file's random salt.
pub fn derive_file_key(master: &[u8], salt: &[u8; SALT_LEN]) -> Result<SecureBytes> {
    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), master);
    let mut file_key = SecureBytes::zeroed(KEY_LEN);
    hk.expand(FILE_KEY_INFO, file_key.as_mut_slice())
        .map_err(|e| EncUtilError::KeyDerivation(e.to_string()))?;
    Ok(file_key)
}

pub fn cipher_for(key: &[u8]) -> Result<XChaCha20Poly1305> {
    XChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| EncUtilError::KeyDerivation(format!("expected a {KEY_LEN}-byte key")))
}

fn chunk_nonce(prefix: &[u8; NONCE_PREFIX_LEN], index: u32, last: bool) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..NONCE_PREFIX_LEN].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_LEN..NONCE_LEN - 1].copy_from_slice(&index.to_be_bytes());
    nonce[NONCE_LEN - 1] = u8::from(last);
    nonce
}

/// Encrypt `buffer` in place; on return it holds ciphertext followed by the tag.
pub fn seal_chunk(
    cipher: &XChaCha20Poly1305,
    prefix: &[u8; NONCE_PREFIX_LEN],
    index: u32,
    last: bool,
    aad: &[u8],
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let nonce = chunk_nonce(prefix, index, last);
    cipher
        .encrypt_in_place(XNonce::from_slice(&nonce), aad, buffer)
        .map_err(|_| EncUtilError::Io(std::io::Error::other("chunk encryption failed")))
}

/// Decrypt `buffer` in place. Any mismatch yields the single authentication error.
pub fn open_chunk(
    cipher: &XChaCha20Poly1305,
    prefix: &[u8; NONCE_PREFIX_LEN],
    index: u32,
    last: bool,
    aad: &[u8],
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let nonce = chunk_nonce(prefix, index, last);
    cipher
        .decrypt_in_place(XNonce::from_slice(&nonce), aad, buffer)
        .map_err(|_| EncUtilError::WrongKeyOrTampered)
}
