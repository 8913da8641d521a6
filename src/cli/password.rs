//! Encrypt or decrypt a file under a typed password

use std::path::Path;

use colored::Colorize;
use tracing::info;

use super::Prompt;
use crate::config::Config;
use crate::error::Result;
use crate::storage;

pub fn encrypt(input: &Path, output: &Path, prompt: &mut dyn Prompt, config: &Config) -> Result<()> {
    let password = prompt.new_password()?;

    print!("{}", "Deriving key and encrypting... ".cyan());
    std::io::Write::flush(&mut std::io::stdout())?;

    let bytes = storage::encrypt_file_with_password(input, output, &password, &config.kdf)?;
    println!("{}", "done".green());

    info!(bytes, "encrypted with password");
    Ok(())
}

pub fn decrypt(input: &Path, output: &Path, prompt: &mut dyn Prompt) -> Result<()> {
    let password = prompt.password()?;

    print!("{}", "Deriving key and decrypting... ".cyan());
    std::io::Write::flush(&mut std::io::stdout())?;

    let bytes = storage::decrypt_file_with_password(input, output, &password)?;
    println!("{}", "done".green());

    info!(bytes, "decrypted with password");
    Ok(())
}
