//! Secrets service handed through to capabilities.
//!
//! The registry carries an encryptor so capabilities can seal and open the
//! credentials they persist in metadata. This crate never interprets the
//! bytes; key management belongs to the host.

use std::fmt;

/// Errors from encryption or decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    EncryptionFailed { reason: String },
    DecryptionFailed { reason: String },
}

impl fmt::Display for EncryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncryptionFailed { reason } => write!(f, "encryption failed: {reason}"),
            Self::DecryptionFailed { reason } => write!(f, "decryption failed: {reason}"),
        }
    }
}

impl std::error::Error for EncryptionError {}

/// Authenticated encryption keyed by the host.
pub trait Encryptor: Send + Sync {
    /// Seals `plaintext`, binding it to `associated_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if sealing fails.
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, EncryptionError>;

    /// Opens a value produced by [`Encryptor::encrypt`] with the same associated data.
    ///
    /// # Errors
    ///
    /// Returns an error if the ciphertext or associated data do not match.
    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8])
    -> Result<Vec<u8>, EncryptionError>;
}

/// Identity encryptor for tests and local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEncryptor;

impl Encryptor for NoOpEncryptor {
    fn encrypt(
        &self,
        plaintext: &[u8],
        _associated_data: &[u8],
    ) -> Result<Vec<u8>, EncryptionError> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        _associated_data: &[u8],
    ) -> Result<Vec<u8>, EncryptionError> {
        Ok(ciphertext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_encryptor_is_identity() {
        let sealed = NoOpEncryptor.encrypt(b"token", b"ctx").expect("encrypt");
        assert_eq!(NoOpEncryptor.decrypt(&sealed, b"ctx").expect("decrypt"), b"token");
    }
}
