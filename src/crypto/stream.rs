//! Streaming authenticated encryption of whole files
//!
//! Container layout:
//! [4 bytes: magic "ENCU"][1 byte: version][1 byte: mode]
//! [32 bytes: file salt]
//! password mode only: [32 bytes: KDF salt][12 bytes: KDF params]
//! [19 bytes: nonce prefix]
//! then one or more chunks: [u32 LE: length][ciphertext + 16 byte tag]
//!
//! The whole header is the associated data of every chunk. Plaintext is only
//! handed to the writer after its chunk verified, but a later chunk can still
//! fail. These functions are therefore crate-private: the only public way to
//! decrypt is through [`crate::storage`], which stages the output and discards
//! it on error.

use std::io::{self, Read, Write};

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use super::chacha::{self, NONCE_PREFIX_LEN, TAG_LEN};
use super::{derive_key, KdfParams, Key, KDF_PARAMS_LEN, SALT_LEN};
use crate::error::{EncUtilError, Result};

const MAGIC: [u8; 4] = *b"ENCU";
const FORMAT_VERSION: u8 = 1;

/// Plaintext bytes per chunk
const CHUNK_SIZE: usize = 64 * 1024;

const MODE_KEY: u8 = 0x01;
const MODE_PASSWORD: u8 = 0x02;
const PREAMBLE_LEN: usize = MAGIC.len() + 2;

enum Mode {
    Key,
    Password {
        kdf_salt: [u8; SALT_LEN],
        params: KdfParams,
    },
}

struct Header {
    mode: Mode,
    file_salt: [u8; SALT_LEN],
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
}

impl Header {
    fn fresh(mode: Mode) -> Self {
        let mut file_salt = [0u8; SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        OsRng.fill_bytes(&mut file_salt);
        OsRng.fill_bytes(&mut nonce_prefix);
        Self {
            mode,
            file_salt,
            nonce_prefix,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(PREAMBLE_LEN + 2 * SALT_LEN + KDF_PARAMS_LEN + NONCE_PREFIX_LEN);
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        match &self.mode {
            Mode::Key => {
                out.push(MODE_KEY);
                out.extend_from_slice(&self.file_salt);
            }
            Mode::Password { kdf_salt, params } => {
                out.push(MODE_PASSWORD);
                out.extend_from_slice(&self.file_salt);
                out.extend_from_slice(kdf_salt);
                out.extend_from_slice(&params.encode());
            }
        }
        out.extend_from_slice(&self.nonce_prefix);
        out
    }

    /// Read a header, returning it together with its raw bytes for use as AAD.
    fn read_from<R: Read>(input: &mut R) -> Result<(Self, Vec<u8>)> {
        let mut raw = vec![0u8; PREAMBLE_LEN];
        input.read_exact(&mut raw).map_err(eof_as_tampered)?;
        if raw[..MAGIC.len()] != MAGIC || raw[MAGIC.len()] != FORMAT_VERSION {
            return Err(EncUtilError::WrongKeyOrTampered);
        }
        let mode_byte = raw[MAGIC.len() + 1];

        let mut file_salt = [0u8; SALT_LEN];
        input.read_exact(&mut file_salt).map_err(eof_as_tampered)?;
        raw.extend_from_slice(&file_salt);

        let mode = match mode_byte {
            MODE_KEY => Mode::Key,
            MODE_PASSWORD => {
                let mut kdf_salt = [0u8; SALT_LEN];
                let mut params = [0u8; KDF_PARAMS_LEN];
                input.read_exact(&mut kdf_salt).map_err(eof_as_tampered)?;
                input.read_exact(&mut params).map_err(eof_as_tampered)?;
                raw.extend_from_slice(&kdf_salt);
                raw.extend_from_slice(&params);
                let params =
                    KdfParams::decode(&params).ok_or(EncUtilError::WrongKeyOrTampered)?;
                Mode::Password { kdf_salt, params }
            }
            _ => return Err(EncUtilError::WrongKeyOrTampered),
        };

        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        input.read_exact(&mut nonce_prefix).map_err(eof_as_tampered)?;
        raw.extend_from_slice(&nonce_prefix);

        Ok((
            Self {
                mode,
                file_salt,
                nonce_prefix,
            },
            raw,
        ))
    }
}

/// A stream that ends early is indistinguishable from a tampered one.
fn eof_as_tampered(err: io::Error) -> EncUtilError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        EncUtilError::WrongKeyOrTampered
    } else {
        EncUtilError::Io(err)
    }
}

/// Encrypt everything `input` yields under `key`. Returns the plaintext length.
pub(crate) fn seal_with_key<R: Read, W: Write>(input: R, output: W, key: &Key) -> Result<u64> {
    let header = Header::fresh(Mode::Key);
    seal(input, output, key.as_bytes(), &header)
}

/// Decrypt a container produced by [`seal_with_key`]. Returns the plaintext length.
pub(crate) fn open_with_key<R: Read, W: Write>(mut input: R, output: W, key: &Key) -> Result<u64> {
    let (header, raw) = Header::read_from(&mut input)?;
    if !matches!(header.mode, Mode::Key) {
        return Err(EncUtilError::WrongKeyOrTampered);
    }
    open(input, output, key.as_bytes(), &header, &raw)
}

/// Encrypt under a key derived from `password` with a fresh salt and `params`.
pub(crate) fn seal_with_password<R: Read, W: Write>(
    input: R,
    output: W,
    password: &SecretString,
    params: &KdfParams,
) -> Result<u64> {
    let derived = derive_key(password.expose_secret().as_bytes(), None, params)?;
    let header = Header::fresh(Mode::Password {
        kdf_salt: derived.salt,
        params: *params,
    });
    seal(input, output, &derived.key, &header)
}

/// Decrypt a container produced by [`seal_with_password`], re-deriving the key
/// with the salt and cost stored in its header.
pub(crate) fn open_with_password<R: Read, W: Write>(
    mut input: R,
    output: W,
    password: &SecretString,
) -> Result<u64> {
    let (header, raw) = Header::read_from(&mut input)?;
    let derived = match &header.mode {
        Mode::Password { kdf_salt, params } => {
            debug!(
                memory_kib = params.memory_kib,
                iterations = params.iterations,
                "deriving file key from password"
            );
            derive_key(password.expose_secret().as_bytes(), Some(kdf_salt), params)?
        }
        Mode::Key => return Err(EncUtilError::WrongKeyOrTampered),
    };
    open(input, output, &derived.key, &header, &raw)
}

fn seal<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    master: &[u8],
    header: &Header,
) -> Result<u64> {
    let header_bytes = header.encode();
    let file_key = chacha::derive_file_key(master, &header.file_salt)?;
    let cipher = chacha::cipher_for(&file_key)?;

    output.write_all(&header_bytes)?;

    let mut current = Zeroizing::new(Vec::with_capacity(CHUNK_SIZE + TAG_LEN));
    let mut next = Zeroizing::new(Vec::with_capacity(CHUNK_SIZE + TAG_LEN));
    fill_chunk(&mut input, &mut current)?;

    let mut index: u32 = 0;
    let mut total: u64 = 0;
    loop {
        // One chunk of lookahead tells us whether `current` is the final one.
        fill_chunk(&mut input, &mut next)?;
        let last = next.is_empty();
        total += current.len() as u64;

        chacha::seal_chunk(
            &cipher,
            &header.nonce_prefix,
            index,
            last,
            &header_bytes,
            &mut current,
        )?;
        output.write_all(&(current.len() as u32).to_le_bytes())?;
        output.write_all(&current)?;

        if last {
            break;
        }
        std::mem::swap(&mut current, &mut next);
        index = index.checked_add(1).ok_or_else(|| {
            EncUtilError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "input is too large to encrypt",
            ))
        })?;
    }

    output.flush()?;
    debug!(bytes = total, chunks = u64::from(index) + 1, "sealed stream");
    Ok(total)
}

fn open<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    master: &[u8],
    header: &Header,
    header_bytes: &[u8],
) -> Result<u64> {
    let file_key = chacha::derive_file_key(master, &header.file_salt)?;
    let cipher = chacha::cipher_for(&file_key)?;

    let mut current = read_chunk(&mut input)?.ok_or(EncUtilError::WrongKeyOrTampered)?;
    let mut index: u32 = 0;
    let mut total: u64 = 0;
    loop {
        let next = read_chunk(&mut input)?;
        let last = next.is_none();

        chacha::open_chunk(
            &cipher,
            &header.nonce_prefix,
            index,
            last,
            header_bytes,
            &mut current,
        )?;
        output.write_all(&current)?;
        total += current.len() as u64;

        match next {
            None => break,
            Some(chunk) => {
                current = chunk;
                index = index.checked_add(1).ok_or(EncUtilError::WrongKeyOrTampered)?;
            }
        }
    }

    output.flush()?;
    debug!(bytes = total, chunks = u64::from(index) + 1, "opened stream");
    Ok(total)
}

fn fill_chunk<R: Read>(input: &mut R, buffer: &mut Vec<u8>) -> io::Result<()> {
    buffer.clear();
    input.by_ref().take(CHUNK_SIZE as u64).read_to_end(buffer)?;
    Ok(())
}

/// Next chunk record, or `None` at a clean end of stream.
fn read_chunk<R: Read>(input: &mut R) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let mut len_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < len_bytes.len() {
        match input.read(&mut len_bytes[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(EncUtilError::WrongKeyOrTampered),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_le_bytes(len_bytes) as usize;
    if !(TAG_LEN..=CHUNK_SIZE + TAG_LEN).contains(&len) {
        return Err(EncUtilError::WrongKeyOrTampered);
    }

    let mut chunk = Zeroizing::new(vec![0u8; len]);
    input.read_exact(&mut chunk).map_err(eof_as_tampered)?;
    Ok(Some(chunk))
}
