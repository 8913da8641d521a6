//! File access for encutil
//!
//! Every output goes to a temporary file next to its destination and is
//! renamed into place only once the whole operation succeeded. A failed
//! decryption therefore never leaves partial plaintext behind, and an existing
//! destination is either replaced completely or not touched at all.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tempfile::NamedTempFile;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, Key};
use crate::error::{EncUtilError, Result};

/// Largest keyfile we are willing to read
const MAX_KEYFILE_LEN: u64 = 64 * 1024;

/// An output file that only appears at its destination on [`StagedFile::commit`].
///
/// Dropping it uncommitted removes the temporary file.
pub struct StagedFile {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl StagedFile {
    pub fn create(dest: &Path) -> std::io::Result<Self> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // tempfile creates the file with mode 0600 on Unix.
        let temp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            temp,
            dest: dest.to_path_buf(),
        })
    }

    pub fn file(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    pub fn commit(self) -> std::io::Result<()> {
        self.temp.as_file().sync_all()?;
        self.temp.persist(&self.dest).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Run `op` from `input` into a staged `output`, committing only on success.
fn transform<F>(input: &Path, output: &Path, op: F) -> Result<u64>
where
    F: FnOnce(BufReader<File>, &mut BufWriter<&mut File>) -> Result<u64>,
{
    let reader = BufReader::new(File::open(input)?);
    let mut staged = StagedFile::create(output)?;

    let mut writer = BufWriter::new(staged.file());
    let bytes = op(reader, &mut writer)?;
    writer.flush()?;
    drop(writer);

    staged.commit()?;
    debug!(bytes, output = %output.display(), "output committed");
    Ok(bytes)
}

pub fn encrypt_file_with_key(input: &Path, output: &Path, key: &Key) -> Result<u64> {
    transform(input, output, |reader, writer| {
        crypto::seal_with_key(reader, writer, key)
    })
}

pub fn decrypt_file_with_key(input: &Path, output: &Path, key: &Key) -> Result<u64> {
    transform(input, output, |reader, writer| {
        crypto::open_with_key(reader, writer, key)
    })
}

pub fn encrypt_file_with_password(
    input: &Path,
    output: &Path,
    password: &SecretString,
    params: &KdfParams,
) -> Result<u64> {
    transform(input, output, |reader, writer| {
        crypto::seal_with_password(reader, writer, password, params)
    })
}

pub fn decrypt_file_with_password(
    input: &Path,
    output: &Path,
    password: &SecretString,
) -> Result<u64> {
    transform(input, output, |reader, writer| {
        crypto::open_with_password(reader, writer, password)
    })
}

/// Read an encoded keyfile. Oversized or non-UTF-8 contents are `BadFormat`.
pub fn read_keyfile(path: &Path) -> Result<Zeroizing<String>> {
    let file = File::open(path).map_err(EncUtilError::KeyfileRead)?;
    let mut raw = Zeroizing::new(Vec::new());
    file.take(MAX_KEYFILE_LEN + 1)
        .read_to_end(&mut raw)
        .map_err(EncUtilError::KeyfileRead)?;

    if raw.len() as u64 > MAX_KEYFILE_LEN {
        return Err(EncUtilError::BadFormat("keyfile is too large"));
    }
    let text = std::str::from_utf8(&raw).map_err(|_| EncUtilError::BadFormat("keyfile is not text"))?;
    Ok(Zeroizing::new(text.to_owned()))
}

/// Write an encoded key to `path`, replacing any existing file atomically.
pub fn write_keyfile(path: &Path, encoded: &str) -> Result<()> {
    let mut staged = StagedFile::create(path).map_err(EncUtilError::KeyfileWrite)?;
    staged
        .file()
        .write_all(encoded.as_bytes())
        .map_err(EncUtilError::KeyfileWrite)?;
    staged.commit().map_err(EncUtilError::KeyfileWrite)
}
