use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncUtilError>;

/// Coarse failure categories. Callers branch on these, never on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed encoded key string or keyfile
    BadFormat,
    /// Authentication failed: wrong credential or modified data, never both told apart
    WrongKeyOrTampered,
    /// File read/write failure
    Io,
    /// Command line did not match any known shape
    Usage,
    /// KDF rejected parameters we produced ourselves
    Internal,
}

#[derive(Debug, Error)]
pub enum EncUtilError {
    #[error("Bad command-line arguments.")]
    Usage,

    #[error("The keyfile you provided is not in a recognized format ({0}).")]
    BadFormat(&'static str),

    #[error(
        "Either you're trying to decrypt with the wrong password or keyfile, or the encrypted \
         file has been changed since it was first created. The changes might have been made by \
         someone trying to attack your security, so we will not proceed decrypting the file."
    )]
    WrongKeyOrTampered,

    #[error("You've given the wrong password, or your keyfile is corrupted.")]
    KeyfileLocked,

    #[error("There was an error reading the keyfile you provided: {0}")]
    KeyfileRead(#[source] std::io::Error),

    #[error("There was an error writing to the file path you provided: {0}")]
    KeyfileWrite(#[source] std::io::Error),

    #[error("There was a file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password key derivation failed: {0}")]
    KeyDerivation(String),
}

impl EncUtilError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage => ErrorKind::Usage,
            Self::BadFormat(_) => ErrorKind::BadFormat,
            Self::WrongKeyOrTampered | Self::KeyfileLocked => ErrorKind::WrongKeyOrTampered,
            Self::KeyfileRead(_) | Self::KeyfileWrite(_) | Self::Io(_) => ErrorKind::Io,
            Self::KeyDerivation(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyfile_locked_is_an_authentication_failure() {
        assert_eq!(
            EncUtilError::KeyfileLocked.kind(),
            ErrorKind::WrongKeyOrTampered
        );
        assert_eq!(
            EncUtilError::WrongKeyOrTampered.kind(),
            ErrorKind::WrongKeyOrTampered
        );
    }

    #[test]
    fn test_io_flavours_share_a_kind() {
        let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(EncUtilError::KeyfileRead(io()).kind(), ErrorKind::Io);
        assert_eq!(EncUtilError::KeyfileWrite(io()).kind(), ErrorKind::Io);
        assert_eq!(EncUtilError::from(io()).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_authentication_message_does_not_say_which() {
        let msg = EncUtilError::WrongKeyOrTampered.to_string();
        assert!(msg.contains("wrong password or keyfile"));
        assert!(msg.contains("has been changed"));
    }
}
