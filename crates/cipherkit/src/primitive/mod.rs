//! Primitive layer.
//!
//! This is the boundary to the raw cipher transforms. It follows the
//! classic context-based cipher API: look a handle up by name, create a
//! context, `init` it (possibly in several steps), push data through
//! `update`, close with `finalize`, and adjust mode parameters with `ctrl`
//! messages. The AES block transform and the keystream/chaining building
//! blocks come from the RustCrypto crates; nothing here invents a cipher.
//!
//! Dropping a [`PrimitiveContext`] releases it. Engines wipe buffered data
//! on drop.
//!
//! ## Module Organization
//!
//! - [`registry`] - name lookup and fixed handles
//! - `block` - ECB/CBC with partial-block buffering and PKCS#7 padding
//! - `stream` - CTR/CFB/OFB keystream modes
//! - `gcm` - incremental GCM with associated data and tags

mod block;
mod gcm;
pub mod registry;
mod stream;

pub use registry::{aes_128_gcm, aes_192_gcm, aes_256_gcm, lookup_cipher_by_name};

use crate::direction::Direction;
use crate::name::Mode;
use aes::{Aes128, Aes192, Aes256};
use cipher::consts::U16;
use cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use thiserror::Error;

/// Cipher block length shared by every AES mode.
pub(crate) const AES_BLOCK_LEN: usize = 16;

/// Maximum (and default) authentication tag length.
pub const MAX_TAG_LEN: usize = 16;

/// Errors reported by the primitive layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Operation issued before a cipher, key and IV were bound
    #[error("context is not initialized")]
    NotInitialized,

    /// Key rejected by the block cipher
    #[error("invalid key length: {0}")]
    KeyLength(usize),

    /// IV or nonce length rejected
    #[error("invalid IV length: expected {expected}, got {actual}")]
    IvLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Nonce length of zero requested for an authenticated mode
    #[error("nonce length must be non-zero")]
    EmptyNonce,

    /// Control message not understood by the bound mode
    #[error("control message not supported by {0}")]
    UnsupportedControl(&'static str),

    /// Mode has no engine in this layer
    #[error("mode not supported by primitive: {0}")]
    UnsupportedMode(Mode),

    /// Caller-supplied output buffer cannot hold the produced bytes
    #[error("output buffer too small: need {needed}, have {available}")]
    OutputTooSmall {
        /// Bytes the call would produce
        needed: usize,
        /// Bytes available in the buffer
        available: usize,
    },

    /// Unpadded block-mode data did not end on a block boundary
    #[error("data not a multiple of the block length")]
    NotBlockAligned,

    /// Padded decryption ended without exactly one buffered block
    #[error("wrong final block length")]
    WrongFinalBlockLength,

    /// Decrypted padding is malformed
    #[error("bad decrypt: invalid padding")]
    BadDecrypt,

    /// Tag length outside 1..=16
    #[error("invalid tag length: {0}")]
    TagLength(usize),

    /// Authenticated decryption finalized with no expected tag
    #[error("expected tag not set")]
    TagNotSet,

    /// Tag requested before finalize or on a decrypt context
    #[error("tag not available")]
    TagUnavailable,

    /// Associated data supplied after payload processing began
    #[error("associated data after payload")]
    AssociatedDataAfterPayload,

    /// Counter space or message length limit exhausted
    #[error("message length limit exceeded")]
    LengthLimit,

    /// Data pushed after finalize
    #[error("context already finalized")]
    Finalized,

    /// Computed tag differs from the expected tag
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Block cipher behind a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 192-bit key
    Aes192,
    /// AES with a 256-bit key
    Aes256,
}

impl Algorithm {
    /// Key size in bits.
    #[must_use]
    pub fn key_bits(self) -> u16 {
        match self {
            Algorithm::Aes128 => 128,
            Algorithm::Aes192 => 192,
            Algorithm::Aes256 => 256,
        }
    }

    /// Key size in bytes.
    #[must_use]
    pub fn key_len(self) -> usize {
        usize::from(self.key_bits() / 8)
    }
}

/// Immutable description of one primitive cipher/mode combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveHandle {
    pub(crate) name: &'static str,
    pub(crate) nid: u32,
    pub(crate) algorithm: Algorithm,
    pub(crate) mode: Mode,
    pub(crate) block_size: usize,
    pub(crate) iv_len: usize,
}

impl PrimitiveHandle {
    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// OpenSSL-compatible numeric identifier.
    #[must_use]
    pub fn nid(&self) -> u32 {
        self.nid
    }

    /// Block cipher.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Mode of operation.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Key length in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.algorithm.key_len()
    }

    /// Default IV/nonce length in bytes.
    #[must_use]
    pub fn iv_len(&self) -> usize {
        self.iv_len
    }

    /// Block size in bytes (1 for stream-like modes).
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

/// Control messages understood by [`PrimitiveContext::ctrl`].
#[derive(Debug)]
pub enum Control<'a> {
    /// Accept nonces of this length (authenticated modes, before key/IV)
    SetIvLen(usize),
    /// Copy the leading `buf.len()` tag bytes out (encrypt, after finalize)
    GetTag(&'a mut [u8]),
    /// Install the expected tag (decrypt, before finalize)
    SetTag(&'a [u8]),
}

/// A running mode of operation bound to a key and IV.
pub(crate) trait ModeEngine: Send {
    /// Process payload, writing produced bytes to `out`.
    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, PrimitiveError>;

    /// Flush buffered data, writing produced bytes to `out`.
    fn finalize(&mut self, out: &mut [u8]) -> Result<usize, PrimitiveError>;

    /// Authenticate data without producing output.
    fn update_aad(&mut self, _aad: &[u8]) -> Result<(), PrimitiveError> {
        Err(PrimitiveError::UnsupportedControl("associated data"))
    }

    fn set_tag(&mut self, _tag: &[u8]) -> Result<(), PrimitiveError> {
        Err(PrimitiveError::UnsupportedControl("set tag"))
    }

    fn get_tag(&self, _out: &mut [u8]) -> Result<(), PrimitiveError> {
        Err(PrimitiveError::UnsupportedControl("get tag"))
    }

    fn set_padding(&mut self, _enabled: bool) {}
}

/// AES variants usable by every engine.
pub(crate) trait AesBlock:
    BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + BlockDecrypt + KeyInit + Send + 'static
{
}

impl<C> AesBlock for C where
    C: BlockCipher
        + BlockSizeUser<BlockSize = U16>
        + BlockEncrypt
        + BlockDecrypt
        + KeyInit
        + Send
        + 'static
{
}

/// Cipher context: one handle, one direction, one engine.
pub struct PrimitiveContext {
    handle: Option<PrimitiveHandle>,
    direction: Direction,
    iv_len: Option<usize>,
    padding: bool,
    engine: Option<Box<dyn ModeEngine>>,
}

impl Default for PrimitiveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveContext {
    /// Allocate an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: None,
            direction: Direction::Encrypt,
            iv_len: None,
            padding: true,
            engine: None,
        }
    }

    /// Bind a handle, key, IV and direction.
    ///
    /// Any of the three may be omitted; omitted parts keep their previous
    /// binding. Supplying a handle resets the context. The engine starts
    /// once a handle, a key and (if the mode takes one) an IV are all bound
    /// in the same call.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::NotInitialized`] if no handle has ever been
    /// bound, or a length error if the key or IV does not fit the mode.
    pub fn init(
        &mut self,
        handle: Option<&PrimitiveHandle>,
        key: Option<&[u8]>,
        iv: Option<&[u8]>,
        direction: Direction,
    ) -> Result<(), PrimitiveError> {
        if let Some(handle) = handle {
            self.handle = Some(*handle);
            self.iv_len = None;
            self.engine = None;
        }
        let handle = self.handle.ok_or(PrimitiveError::NotInitialized)?;
        self.direction = direction;

        let Some(key) = key else {
            return Ok(());
        };
        let expected_iv = self.iv_len.unwrap_or(handle.iv_len);
        let iv: &[u8] = match iv {
            Some(iv) => iv,
            None if expected_iv == 0 => &[],
            None => return Ok(()),
        };
        if iv.len() != expected_iv {
            return Err(PrimitiveError::IvLength {
                expected: expected_iv,
                actual: iv.len(),
            });
        }

        self.engine = Some(build_engine(&handle, key, iv, direction, self.padding)?);
        Ok(())
    }

    /// Process data.
    ///
    /// With `out` present, payload is transformed and the number of bytes
    /// written is returned. Without it, the data is treated as associated
    /// data and `0` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is not initialized, the buffer is too
    /// small, or the mode rejects the data.
    pub fn update(&mut self, out: Option<&mut [u8]>, input: &[u8]) -> Result<usize, PrimitiveError> {
        let engine = self.engine.as_mut().ok_or(PrimitiveError::NotInitialized)?;
        match out {
            Some(out) => engine.update(input, out),
            None => engine.update_aad(input).map(|()| 0),
        }
    }

    /// Flush remaining data and, for authenticated decryption, verify the tag.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::AuthenticationFailed`] on tag mismatch, or
    /// a padding/alignment error for block modes.
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<usize, PrimitiveError> {
        let engine = self.engine.as_mut().ok_or(PrimitiveError::NotInitialized)?;
        engine.finalize(out)
    }

    /// Send a control message.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::UnsupportedControl`] when the bound mode
    /// has no use for the message, or a length error for bad arguments.
    pub fn ctrl(&mut self, op: Control<'_>) -> Result<(), PrimitiveError> {
        match op {
            Control::SetIvLen(len) => {
                let handle = self.handle.ok_or(PrimitiveError::NotInitialized)?;
                if !handle.mode.is_authenticated() {
                    return Err(PrimitiveError::UnsupportedControl("set IV length"));
                }
                if len == 0 {
                    return Err(PrimitiveError::EmptyNonce);
                }
                self.iv_len = Some(len);
                Ok(())
            }
            Control::GetTag(buf) => self
                .engine
                .as_ref()
                .ok_or(PrimitiveError::NotInitialized)?
                .get_tag(buf),
            Control::SetTag(tag) => self
                .engine
                .as_mut()
                .ok_or(PrimitiveError::NotInitialized)?
                .set_tag(tag),
        }
    }

    /// Enable or disable PKCS#7 padding for block modes.
    pub fn set_padding(&mut self, enabled: bool) {
        self.padding = enabled;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_padding(enabled);
        }
    }

    /// Bound handle, if any.
    #[must_use]
    pub fn handle(&self) -> Option<&PrimitiveHandle> {
        self.handle.as_ref()
    }

    /// Whether an engine is running.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }
}

impl Drop for PrimitiveContext {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            tracing::trace!(cipher = handle.name, "primitive context released");
        }
    }
}

fn build_engine(
    handle: &PrimitiveHandle,
    key: &[u8],
    iv: &[u8],
    direction: Direction,
    padding: bool,
) -> Result<Box<dyn ModeEngine>, PrimitiveError> {
    match handle.algorithm {
        Algorithm::Aes128 => engine_for::<Aes128>(handle.mode, key, iv, direction, padding),
        Algorithm::Aes192 => engine_for::<Aes192>(handle.mode, key, iv, direction, padding),
        Algorithm::Aes256 => engine_for::<Aes256>(handle.mode, key, iv, direction, padding),
    }
}

fn engine_for<C: AesBlock>(
    mode: Mode,
    key: &[u8],
    iv: &[u8],
    direction: Direction,
    padding: bool,
) -> Result<Box<dyn ModeEngine>, PrimitiveError> {
    let engine: Box<dyn ModeEngine> = match mode {
        Mode::Ecb | Mode::Cbc => Box::new(block::BlockEngine::<C>::new(
            mode, key, iv, direction, padding,
        )?),
        Mode::Ctr | Mode::Cfb | Mode::Ofb => {
            Box::new(stream::StreamEngine::<C>::new(mode, key, iv, direction)?)
        }
        Mode::Gcm => Box::new(gcm::GcmEngine::<C>::new(key, iv, direction)?),
        Mode::Ccm => return Err(PrimitiveError::UnsupportedMode(mode)),
    };
    Ok(engine)
}

/// Reject output buffers that cannot hold `needed` bytes.
pub(crate) fn ensure_capacity(out: &[u8], needed: usize) -> Result<(), PrimitiveError> {
    if out.len() < needed {
        return Err(PrimitiveError::OutputTooSmall {
            needed,
            available: out.len(),
        });
    }
    Ok(())
}
