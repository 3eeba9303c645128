//! One-shot authenticated encryption.
//!
//! Thin compositions of the session calls for callers that hold the whole
//! message in memory.

use crate::config::SessionConfig;
use crate::descriptor::CipherDescriptor;
use crate::direction::Direction;
use crate::error::CipherError;
use zeroize::Zeroize;

impl CipherDescriptor {
    fn require_authenticated(&self) -> Result<(), CipherError> {
        if !self.is_authenticated() {
            return Err(CipherError::UnsupportedMode(self.name().to_string()));
        }
        Ok(())
    }

    /// Encrypt `plaintext` and return `(ciphertext, tag)`.
    ///
    /// The tag is the leading `tag_len` bytes of the full tag.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::UnsupportedMode`] for non-authenticated
    /// ciphers, [`CipherError::InvalidTagLength`] for `tag_len` outside
    /// 1..=16, and any error [`begin`](Self::begin) reports.
    pub fn quick_authenticated_encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        associated_data: Option<&[u8]>,
        tag_len: usize,
    ) -> Result<(Vec<u8>, Vec<u8>), CipherError> {
        self.require_authenticated()?;
        let config = SessionConfig {
            tag_len,
            ..SessionConfig::default()
        };
        let mut session = self.begin_with(key, iv, Direction::Encrypt, &config)?;

        if let Some(aad) = associated_data {
            session.absorb(aad)?;
        }
        let mut ciphertext = session.update(plaintext)?;
        ciphertext.extend_from_slice(&session.finalize()?);
        let tag = session.tag()?;

        Ok((ciphertext, tag))
    }

    /// Verify and decrypt `ciphertext`.
    ///
    /// No plaintext is returned unless the tag verifies.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::TagMismatch`] if the ciphertext, associated
    /// data or tag were altered, [`CipherError::UnsupportedMode`] for
    /// non-authenticated ciphers, and any error [`begin`](Self::begin)
    /// reports.
    pub fn quick_authenticated_decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CipherError> {
        self.require_authenticated()?;
        let mut session = self.decryptor(key, iv)?;
        session.set_tag(tag)?;

        if let Some(aad) = associated_data {
            session.absorb(aad)?;
        }
        let mut plaintext = session.update(ciphertext)?;
        match session.finalize() {
            Ok(rest) => {
                plaintext.extend_from_slice(&rest);
                Ok(plaintext)
            }
            Err(e) => {
                plaintext.zeroize();
                Err(e)
            }
        }
    }
}
