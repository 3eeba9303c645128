//! # cipherkit
//!
//! Streaming symmetric-cipher sessions over AES.
//!
//! This crate provides:
//! - Name-based cipher resolution (`"AES-128-CBC"`, `"aes-256-gcm"`)
//! - Incremental encrypt/decrypt sessions with arbitrary chunking
//! - Authenticated encryption with associated data and truncatable tags
//! - Fail-closed tag verification and padding checks in constant time
//! - One-shot authenticated encrypt/decrypt helpers
//!
//! ## Supported Ciphers
//!
//! | Mode | Key Sizes | IV | Block Size | Authenticated |
//! |------|-----------|----|------------|---------------|
//! | ECB | 128/192/256 | none | 16 | no |
//! | CBC | 128/192/256 | 16 | 16 | no |
//! | CFB (128-bit feedback) | 128/192/256 | 16 | 1 | no |
//! | OFB | 128/192/256 | 16 | 1 | no |
//! | CTR (128-bit counter) | 128/192/256 | 16 | 1 | no |
//! | GCM | 128/192/256 | 12 (any non-zero) | 1 | yes |
//!
//! CCM names resolve in the primitive registry but are rejected with
//! [`CipherError::UnsupportedMode`].
//!
//! ## Example
//!
//! ```
//! use cipherkit::CipherDescriptor;
//!
//! let gcm = CipherDescriptor::aes_128_gcm();
//! let key = [0x42u8; 16];
//! let nonce = [0x24u8; 12];
//!
//! let mut enc = gcm.encryptor(&key, &nonce)?;
//! enc.absorb(b"header")?;
//! let mut ciphertext = enc.update(b"Hello")?;
//! ciphertext.extend(enc.update(b"World!")?);
//! ciphertext.extend(enc.finalize()?);
//! let tag = enc.tag()?;
//!
//! let mut dec = gcm.decryptor(&key, &nonce)?;
//! dec.absorb(b"header")?;
//! dec.set_tag(&tag)?;
//! let mut plaintext = dec.update(&ciphertext)?;
//! plaintext.extend(dec.finalize()?);
//! assert_eq!(plaintext, b"HelloWorld!");
//! # Ok::<(), cipherkit::CipherError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod constant_time;
pub mod descriptor;
pub mod direction;
pub mod error;
pub mod name;
pub mod primitive;
mod quick;
pub mod session;

pub use config::{DEFAULT_TAG_LEN, SessionConfig};
pub use descriptor::CipherDescriptor;
pub use direction::Direction;
pub use error::CipherError;
pub use name::{CipherName, Mode};
pub use session::{CipherSession, SessionState};

/// Maximum authentication tag length in bytes
pub const MAX_TAG_LEN: usize = primitive::MAX_TAG_LEN;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Default GCM nonce length in bytes
pub const GCM_NONCE_SIZE: usize = 12;
