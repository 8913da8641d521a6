//! Encrypt or decrypt a file under the key stored in a keyfile

use std::path::Path;

use colored::Colorize;
use tracing::{debug, info};

use super::Prompt;
use crate::crypto::{Key, KeyFile};
use crate::error::{EncUtilError, Result};
use crate::storage;

/// Load the key from `keyfile`, asking for its password only when it is protected.
///
/// A wrong password stops here, before the target file is opened.
fn resolve_key(keyfile: &Path, prompt: &mut dyn Prompt) -> Result<Key> {
    let encoded = storage::read_keyfile(keyfile)?;
    match KeyFile::decode(&encoded)? {
        KeyFile::Plain(key) => {
            debug!("keyfile holds a plain key");
            Ok(key)
        }
        KeyFile::Protected(protected) => {
            debug!("keyfile is password protected");
            let password = prompt.password()?;
            protected.unlock(&password).map_err(|e| match e {
                EncUtilError::WrongKeyOrTampered => EncUtilError::KeyfileLocked,
                other => other,
            })
        }
    }
}

pub fn encrypt(keyfile: &Path, input: &Path, output: &Path, prompt: &mut dyn Prompt) -> Result<()> {
    let key = resolve_key(keyfile, prompt)?;
    let bytes = storage::encrypt_file_with_key(input, output, &key)?;
    println!("{} {}", "Encrypted".green(), output.display());
    info!(bytes, "encrypted with keyfile");
    Ok(())
}

pub fn decrypt(keyfile: &Path, input: &Path, output: &Path, prompt: &mut dyn Prompt) -> Result<()> {
    let key = resolve_key(keyfile, prompt)?;
    let bytes = storage::decrypt_file_with_key(input, output, &key)?;
    println!("{} {}", "Decrypted".green(), output.display());
    info!(bytes, "decrypted with keyfile");
    Ok(())
}
