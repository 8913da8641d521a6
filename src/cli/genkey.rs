//! Generate a new keyfile, optionally protected by a password

use std::path::Path;

use colored::Colorize;
use tracing::info;

use super::Prompt;
use crate::config::Config;
use crate::crypto::{Key, KeyFile, PasswordProtectedKey};
use crate::error::Result;
use crate::storage;

pub fn run(path: &Path, prompt: &mut dyn Prompt, config: &Config) -> Result<()> {
    let protect = prompt.yes_no("Would you like to protect your keyfile with a password")?;

    let keyfile = if protect {
        let password = prompt.new_password()?;
        print!("{}", "Deriving key (this may take a moment)... ".cyan());
        std::io::Write::flush(&mut std::io::stdout())?;
        let protected = PasswordProtectedKey::create(&password, &config.kdf)?;
        println!("{}", "done".green());
        KeyFile::Protected(protected)
    } else {
        KeyFile::Plain(Key::generate())
    };

    storage::write_keyfile(path, &keyfile.encode())?;

    println!("{} {}", "Keyfile written to".green(), path.display());
    info!(protected = protect, "generated keyfile");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::ScriptedPrompt;
    use crate::cli::test_config;
    use crate::error::{EncUtilError, ErrorKind};
    use secrecy::SecretString;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unprotected_keyfile_is_a_plain_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("k1");

        let mut prompt = ScriptedPrompt::default().answering(false);
        run(&path, &mut prompt, &test_config()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(Key::decode(&contents).is_ok());
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn test_protected_keyfile_is_bad_format_as_plain_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("k2");

        let mut prompt = ScriptedPrompt::with_passwords(&["secret"]).answering(true);
        run(&path, &mut prompt, &test_config()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(Key::decode(&contents).unwrap_err().kind(), ErrorKind::BadFormat);

        let protected = PasswordProtectedKey::decode(&contents).unwrap();
        assert!(protected
            .unlock(&SecretString::new("secret".to_string()))
            .is_ok());
    }

    #[test]
    fn test_each_run_makes_a_new_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("k");

        run(&path, &mut ScriptedPrompt::default().answering(false), &test_config()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        run(&path, &mut ScriptedPrompt::default().answering(false), &test_config()).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("k");

        let mut prompt = ScriptedPrompt::default().answering(false);
        let err = run(&path, &mut prompt, &test_config()).unwrap_err();

        assert!(matches!(err, EncUtilError::KeyfileWrite(_)));
        assert!(!path.exists());
    }
}
