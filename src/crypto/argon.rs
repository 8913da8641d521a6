//! Argon2id Key Derivation Function
//!
//! Turns a password into a 256-bit key. The cost parameters travel with every
//! artifact that was derived from a password, so files written with one cost
//! setting still open after the default changes.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use super::SecureBytes;
use crate::error::{EncUtilError, Result};

/// Salt length in bytes (256 bits)
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes (256 bits for XChaCha20)
pub const KEY_LEN: usize = 32;

/// Encoded size of [`KdfParams`]
pub const KDF_PARAMS_LEN: usize = 12;

/// Argon2id parameters (OWASP recommended for high security)
/// - Memory: 64 MB (65536 KB)
/// - Iterations: 3
/// - Parallelism: 4 lanes
const MEMORY_COST: u32 = 65536;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 4;

/// Upper bounds accepted from a stored header, 1 GiB of memory at most.
const MAX_MEMORY_COST: u32 = 1 << 20;
const MAX_TIME_COST: u32 = 10;
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
///
/// Encoded as three little-endian `u32`: memory (KiB), passes, lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: MEMORY_COST,
            iterations: TIME_COST,
            parallelism: PARALLELISM,
        }
    }
}

impl KdfParams {
    pub fn encode(&self) -> [u8; KDF_PARAMS_LEN] {
        let mut out = [0u8; KDF_PARAMS_LEN];
        out[0..4].copy_from_slice(&self.memory_kib.to_le_bytes());
        out[4..8].copy_from_slice(&self.iterations.to_le_bytes());
        out[8..12].copy_from_slice(&self.parallelism.to_le_bytes());
        out
    }

    /// Decode stored parameters, `None` when they fall outside the accepted range.
    pub fn decode(bytes: &[u8; KDF_PARAMS_LEN]) -> Option<Self> {
        let params = Self {
            memory_kib: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            iterations: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            parallelism: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        };
        params.is_acceptable().then_some(params)
    }

    /// Argon2 needs at least 8 KiB per lane.
    pub fn is_acceptable(&self) -> bool {
        (1..=MAX_PARALLELISM).contains(&self.parallelism)
            && (1..=MAX_TIME_COST).contains(&self.iterations)
            && self.memory_kib >= 8 * self.parallelism
            && self.memory_kib <= MAX_MEMORY_COST
    }
}

/// A derived encryption key with its associated salt
pub struct DerivedKey {
    /// The derived key material (32 bytes)
    pub key: SecureBytes,
    /// The salt used for derivation (32 bytes)
    pub salt: [u8; SALT_LEN],
}

impl Zeroize for DerivedKey {
    fn zeroize(&mut self) {
        self.key.zeroize();
        self.salt.zeroize();
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Derive an encryption key from a password using Argon2id
///
/// # Arguments
/// * `password` - The user's password
/// * `salt` - Optional salt (if None, generates a new random salt)
/// * `params` - Cost parameters, stored next to the salt by callers
pub fn derive_key(
    password: &[u8],
    salt: Option<&[u8; SALT_LEN]>,
    params: &KdfParams,
) -> Result<DerivedKey> {
    let salt_bytes: [u8; SALT_LEN] = match salt {
        Some(s) => *s,
        None => {
            let mut s = [0u8; SALT_LEN];
            OsRng.fill_bytes(&mut s);
            s
        }
    };

    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| EncUtilError::KeyDerivation(format!("Argon2 params error: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = SecureBytes::zeroed(KEY_LEN);
    argon2
        .hash_password_into(password, &salt_bytes, key.as_mut_slice())
        .map_err(|e| EncUtilError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey {
        key,
        salt: salt_bytes,
    })
}

#[cfg(test)]
pub(crate) fn test_params() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test_password_123";
        let salt = [0x42u8; SALT_LEN];

        let key1 = derive_key(password, Some(&salt), &test_params()).unwrap();
        let key2 = derive_key(password, Some(&salt), &test_params()).unwrap();

        assert_eq!(&*key1.key, &*key2.key);
    }

    #[test]
    fn test_derive_key_different_salts() {
        let password = b"test_password_123";
        let salt1 = [0x42u8; SALT_LEN];
        let salt2 = [0x43u8; SALT_LEN];

        let key1 = derive_key(password, Some(&salt1), &test_params()).unwrap();
        let key2 = derive_key(password, Some(&salt2), &test_params()).unwrap();

        assert_ne!(&*key1.key, &*key2.key);
    }

    #[test]
    fn test_derive_key_random_salt() {
        let password = b"test_password_123";

        let key1 = derive_key(password, None, &test_params()).unwrap();
        let key2 = derive_key(password, None, &test_params()).unwrap();

        assert_ne!(key1.salt, key2.salt);
        assert_ne!(&*key1.key, &*key2.key);
    }

    #[test]
    fn test_cost_changes_the_key() {
        let salt = [0x01u8; SALT_LEN];
        let mut heavier = test_params();
        heavier.iterations = 2;

        let key1 = derive_key(b"pw", Some(&salt), &test_params()).unwrap();
        let key2 = derive_key(b"pw", Some(&salt), &heavier).unwrap();

        assert_ne!(&*key1.key, &*key2.key);
    }

    #[test]
    fn test_params_survive_encoding() {
        let params = KdfParams::default();
        assert_eq!(KdfParams::decode(&params.encode()), Some(params));
    }

    #[test]
    fn test_out_of_range_params_rejected() {
        let too_much_memory = KdfParams {
            memory_kib: MAX_MEMORY_COST + 1,
            ..KdfParams::default()
        };
        let no_passes = KdfParams {
            iterations: 0,
            ..KdfParams::default()
        };
        let starved_lanes = KdfParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 2,
        };

        for params in [too_much_memory, no_passes, starved_lanes] {
            assert!(!params.is_acceptable());
            assert_eq!(KdfParams::decode(&params.encode()), None);
        }
    }
}
