//! Encryption keys and their keyfile encoding
//!
//! An encoded key is ASCII hex of `header || payload || SHA-256(header || payload)`.
//! The 4-byte header tells a plain key apart from a password-protected one, so
//! a keyfile can be loaded without knowing in advance which kind it holds.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::stream::{open_with_password, seal_with_password};
use super::{KdfParams, SecureBytes, KEY_LEN};
use crate::error::{EncUtilError, Result};

const HEADER_LEN: usize = 4;
const CHECKSUM_LEN: usize = 32;

const KEY_HEADER: [u8; HEADER_LEN] = [0xDE, 0xF0, 0x00, 0x00];
const PROTECTED_KEY_HEADER: [u8; HEADER_LEN] = [0xDE, 0xF1, 0x00, 0x00];

/// A 256-bit symmetric key, wiped from memory on drop
pub struct Key {
    bytes: SecureBytes,
}

impl Key {
    /// Generate a fresh key from the OS random number generator
    pub fn generate() -> Self {
        let mut bytes = SecureBytes::zeroed(KEY_LEN);
        OsRng.fill_bytes(bytes.as_mut_slice());
        Self { bytes }
    }

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(EncUtilError::BadFormat("wrong key length"));
        }
        Ok(Self {
            bytes: SecureBytes::from(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encode(&self) -> Zeroizing<String> {
        encode_tagged(KEY_HEADER, &self.bytes)
    }

    /// Decode a plain key. A password-protected key string is `BadFormat` too.
    pub fn decode(encoded: &str) -> Result<Self> {
        let (header, payload) = decode_tagged(encoded)?;
        if header != KEY_HEADER {
            return Err(EncUtilError::BadFormat("not a plain key"));
        }
        Self::from_slice(&payload)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for Key {}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

/// A [`Key`] sealed under a password-derived key.
///
/// The sealed form is a password-mode container whose plaintext is the raw key,
/// so it carries its own salt and Argon2id cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordProtectedKey {
    sealed: Vec<u8>,
}

impl PasswordProtectedKey {
    /// Generate a new random key and protect it with `password`.
    pub fn create(password: &SecretString, params: &KdfParams) -> Result<Self> {
        Self::wrap(&Key::generate(), password, params)
    }

    pub fn wrap(key: &Key, password: &SecretString, params: &KdfParams) -> Result<Self> {
        let mut sealed = Vec::new();
        seal_with_password(key.as_bytes(), &mut sealed, password, params)?;
        Ok(Self { sealed })
    }

    /// Recover the key. Wrong password and corrupted data fail the same way.
    pub fn unlock(&self, password: &SecretString) -> Result<Key> {
        let mut raw = Zeroizing::new(Vec::with_capacity(KEY_LEN));
        open_with_password(self.sealed.as_slice(), &mut *raw, password)?;
        Key::from_slice(&raw).map_err(|_| EncUtilError::WrongKeyOrTampered)
    }

    pub fn encode(&self) -> String {
        encode_tagged(PROTECTED_KEY_HEADER, &self.sealed).to_string()
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let (header, payload) = decode_tagged(encoded)?;
        if header != PROTECTED_KEY_HEADER {
            return Err(EncUtilError::BadFormat("not a password-protected key"));
        }
        Ok(Self {
            sealed: payload.to_vec(),
        })
    }
}

/// Contents of a keyfile, told apart by the encoded header
#[derive(Debug)]
pub enum KeyFile {
    Plain(Key),
    Protected(PasswordProtectedKey),
}

impl KeyFile {
    /// Decode either kind of key. Anything else is `BadFormat`.
    pub fn decode(encoded: &str) -> Result<Self> {
        let (header, payload) = decode_tagged(encoded)?;
        match header {
            KEY_HEADER => Ok(Self::Plain(Key::from_slice(&payload)?)),
            PROTECTED_KEY_HEADER => Ok(Self::Protected(PasswordProtectedKey {
                sealed: payload.to_vec(),
            })),
            _ => Err(EncUtilError::BadFormat("unknown key header")),
        }
    }

    pub fn encode(&self) -> Zeroizing<String> {
        match self {
            Self::Plain(key) => key.encode(),
            Self::Protected(protected) => Zeroizing::new(protected.encode()),
        }
    }
}

fn checksum(header: &[u8], payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(header);
    hasher.update(payload);
    hasher.finalize().into()
}

fn encode_tagged(header: [u8; HEADER_LEN], payload: &[u8]) -> Zeroizing<String> {
    let mut raw = Zeroizing::new(Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN));
    raw.extend_from_slice(&header);
    raw.extend_from_slice(payload);
    raw.extend_from_slice(&checksum(&header, payload));
    Zeroizing::new(hex::encode(raw.as_slice()))
}

/// Split a verified encoding into its header and payload.
fn decode_tagged(encoded: &str) -> Result<([u8; HEADER_LEN], Zeroizing<Vec<u8>>)> {
    let raw = Zeroizing::new(
        hex::decode(encoded.trim()).map_err(|_| EncUtilError::BadFormat("not valid hex"))?,
    );
    if raw.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(EncUtilError::BadFormat("encoding is too short"));
    }

    let (body, stored) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let (header, payload) = body.split_at(HEADER_LEN);
    let expected = checksum(header, payload);
    if !bool::from(expected[..].ct_eq(stored)) {
        return Err(EncUtilError::BadFormat("checksum mismatch"));
    }

    let mut tag = [0u8; HEADER_LEN];
    tag.copy_from_slice(header);
    Ok((tag, Zeroizing::new(payload.to_vec())))
}
