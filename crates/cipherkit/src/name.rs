//! Cipher name grammar.
//!
//! Names follow `<ALGO>-<KEYBITS>-<MODE>` and are matched case-insensitively
//! (`"AES-128-CTR"`, `"aes-256-gcm"`). The short aliases `AES128`, `AES192`
//! and `AES256` denote CBC, as they do in OpenSSL.

use std::fmt;

/// Mode of operation, parsed from the last name token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Electronic codebook
    Ecb,
    /// Cipher block chaining
    Cbc,
    /// 128-bit cipher feedback
    Cfb,
    /// Output feedback
    Ofb,
    /// Counter mode, 128-bit big-endian counter
    Ctr,
    /// Galois/counter mode (authenticated)
    Gcm,
    /// Counter with CBC-MAC. Recognised so it can be rejected explicitly.
    Ccm,
}

impl Mode {
    const ALL: [Mode; 7] = [
        Mode::Ecb,
        Mode::Cbc,
        Mode::Cfb,
        Mode::Ofb,
        Mode::Ctr,
        Mode::Gcm,
        Mode::Ccm,
    ];

    /// Canonical upper-case token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Cfb => "CFB",
            Mode::Ofb => "OFB",
            Mode::Ctr => "CTR",
            Mode::Gcm => "GCM",
            Mode::Ccm => "CCM",
        }
    }

    /// Case-insensitive match against the canonical tokens.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(token))
    }

    /// Whether the mode produces and verifies an authentication tag.
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Mode::Gcm | Mode::Ccm)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntactically valid cipher name.
///
/// Parsing only checks the grammar; whether the primitive layer actually
/// provides the combination is decided by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherName {
    algorithm: String,
    key_bits: u16,
    mode: Mode,
}

impl CipherName {
    /// Parse a name, expanding the short aliases.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(bits) = Self::alias_bits(name) {
            return Some(Self {
                algorithm: "AES".to_string(),
                key_bits: bits,
                mode: Mode::Cbc,
            });
        }

        let mut tokens = name.split('-');
        let algorithm = tokens.next()?;
        let key_bits = tokens.next()?;
        let mode = tokens.next()?;
        if tokens.next().is_some() || algorithm.is_empty() {
            return None;
        }
        if !algorithm.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        if key_bits.is_empty() || !key_bits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            algorithm: algorithm.to_ascii_uppercase(),
            key_bits: key_bits.parse().ok()?,
            mode: Mode::from_token(mode)?,
        })
    }

    fn alias_bits(name: &str) -> Option<u16> {
        [("AES128", 128), ("AES192", 192), ("AES256", 256)]
            .into_iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, bits)| bits)
    }

    /// Upper-case algorithm family (`"AES"`).
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Key size in bits.
    #[must_use]
    pub fn key_bits(&self) -> u16 {
        self.key_bits
    }

    /// Parsed mode token.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl fmt::Display for CipherName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.algorithm, self.key_bits, self.mode)
    }
}
