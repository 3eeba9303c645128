//! Cipher descriptors.
//!
//! A [`CipherDescriptor`] is the resolved, immutable description of one
//! algorithm/key-size/mode combination. It carries no key material and can
//! be shared by any number of sessions.

use crate::config::SessionConfig;
use crate::direction::Direction;
use crate::error::CipherError;
use crate::name::Mode;
use crate::primitive::{self, PrimitiveHandle, registry};
use crate::session::CipherSession;

/// Resolved cipher description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherDescriptor {
    handle: PrimitiveHandle,
}

impl CipherDescriptor {
    /// Resolve a cipher by name.
    ///
    /// Names are `<ALGO>-<KEYBITS>-<MODE>` (case-insensitive) or one of the
    /// aliases `AES128`, `AES192`, `AES256`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::UnknownCipher`] if no primitive provides the
    /// name, and [`CipherError::UnsupportedMode`] for recognised modes this
    /// engine does not drive (CCM).
    pub fn resolve(name: &str) -> Result<Self, CipherError> {
        let Some(handle) = primitive::lookup_cipher_by_name(name) else {
            tracing::debug!(name, "cipher name did not resolve");
            return Err(CipherError::UnknownCipher(name.to_string()));
        };
        if handle.mode() == Mode::Ccm {
            tracing::debug!(name, "cipher mode not supported");
            return Err(CipherError::UnsupportedMode(handle.name().to_string()));
        }
        Ok(Self { handle })
    }

    /// AES-128-GCM.
    #[must_use]
    pub fn aes_128_gcm() -> Self {
        Self {
            handle: primitive::aes_128_gcm(),
        }
    }

    /// AES-192-GCM.
    #[must_use]
    pub fn aes_192_gcm() -> Self {
        Self {
            handle: primitive::aes_192_gcm(),
        }
    }

    /// AES-256-GCM.
    #[must_use]
    pub fn aes_256_gcm() -> Self {
        Self {
            handle: primitive::aes_256_gcm(),
        }
    }

    /// Canonical names of every cipher [`resolve`](Self::resolve) accepts.
    #[must_use]
    pub fn available() -> Vec<&'static str> {
        registry::handles()
            .filter(|h| h.mode() != Mode::Ccm)
            .map(PrimitiveHandle::name)
            .collect()
    }

    /// Canonical upper-case name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.handle.name()
    }

    /// Block size in bytes; 1 for stream-like modes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.handle.block_size()
    }

    /// Key length in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.handle.key_len()
    }

    /// Default IV length in bytes. Authenticated modes accept other nonce
    /// lengths.
    #[must_use]
    pub fn iv_len(&self) -> usize {
        self.handle.iv_len()
    }

    /// Whether sessions produce and verify authentication tags.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.handle.mode().is_authenticated()
    }

    /// OpenSSL-compatible numeric identifier.
    #[must_use]
    pub fn nid(&self) -> u32 {
        self.handle.nid()
    }

    /// Mode of operation.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.handle.mode()
    }

    pub(crate) fn handle(&self) -> &PrimitiveHandle {
        &self.handle
    }

    /// Start a session with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a length error if the key or IV does not fit the cipher, or
    /// [`CipherError::CipherOperationFailed`] if the primitive rejects them.
    pub fn begin(
        &self,
        key: &[u8],
        iv: &[u8],
        direction: Direction,
    ) -> Result<CipherSession<'_>, CipherError> {
        self.begin_with(key, iv, direction, &SessionConfig::default())
    }

    /// Start a session with an explicit configuration.
    ///
    /// # Errors
    ///
    /// As [`begin`](Self::begin), plus [`CipherError::InvalidTagLength`] for
    /// an out-of-range configured tag length.
    pub fn begin_with(
        &self,
        key: &[u8],
        iv: &[u8],
        direction: Direction,
        config: &SessionConfig,
    ) -> Result<CipherSession<'_>, CipherError> {
        CipherSession::start(self, key, iv, direction.flag(), config)
    }

    /// Start a session from an integer direction flag (1 encrypt, 0 decrypt).
    ///
    /// # Errors
    ///
    /// As [`begin`](Self::begin), plus [`CipherError::InvalidDirection`]
    /// for any other flag.
    pub fn op(&self, key: &[u8], iv: &[u8], enc: i32) -> Result<CipherSession<'_>, CipherError> {
        CipherSession::start(self, key, iv, enc, &SessionConfig::default())
    }

    /// Shorthand for `begin(key, iv, Direction::Encrypt)`.
    ///
    /// # Errors
    ///
    /// As [`begin`](Self::begin).
    pub fn encryptor(&self, key: &[u8], iv: &[u8]) -> Result<CipherSession<'_>, CipherError> {
        self.begin(key, iv, Direction::Encrypt)
    }

    /// Shorthand for `begin(key, iv, Direction::Decrypt)`.
    ///
    /// # Errors
    ///
    /// As [`begin`](Self::begin).
    pub fn decryptor(&self, key: &[u8], iv: &[u8]) -> Result<CipherSession<'_>, CipherError> {
        self.begin(key, iv, Direction::Decrypt)
    }
}

impl std::fmt::Display for CipherDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
