//! Name lookup for primitive handles.
//!
//! The table mirrors the object identifiers OpenSSL assigns to the AES
//! modes, so descriptors report the same `nid` callers see elsewhere.
//! CCM entries are present because the names are valid; the engine layer
//! has no CCM implementation.

use super::{AES_BLOCK_LEN, Algorithm, PrimitiveHandle};
use crate::name::{CipherName, Mode};

const fn handle(
    name: &'static str,
    nid: u32,
    algorithm: Algorithm,
    mode: Mode,
    block_size: usize,
    iv_len: usize,
) -> PrimitiveHandle {
    PrimitiveHandle {
        name,
        nid,
        algorithm,
        mode,
        block_size,
        iv_len,
    }
}

const GCM_NONCE_LEN: usize = 12;

static HANDLES: &[PrimitiveHandle] = &[
    handle("AES-128-ECB", 418, Algorithm::Aes128, Mode::Ecb, AES_BLOCK_LEN, 0),
    handle("AES-128-CBC", 419, Algorithm::Aes128, Mode::Cbc, AES_BLOCK_LEN, 16),
    handle("AES-128-OFB", 420, Algorithm::Aes128, Mode::Ofb, 1, 16),
    handle("AES-128-CFB", 421, Algorithm::Aes128, Mode::Cfb, 1, 16),
    handle("AES-192-ECB", 422, Algorithm::Aes192, Mode::Ecb, AES_BLOCK_LEN, 0),
    handle("AES-192-CBC", 423, Algorithm::Aes192, Mode::Cbc, AES_BLOCK_LEN, 16),
    handle("AES-192-OFB", 424, Algorithm::Aes192, Mode::Ofb, 1, 16),
    handle("AES-192-CFB", 425, Algorithm::Aes192, Mode::Cfb, 1, 16),
    handle("AES-256-ECB", 426, Algorithm::Aes256, Mode::Ecb, AES_BLOCK_LEN, 0),
    handle("AES-256-CBC", 427, Algorithm::Aes256, Mode::Cbc, AES_BLOCK_LEN, 16),
    handle("AES-256-OFB", 428, Algorithm::Aes256, Mode::Ofb, 1, 16),
    handle("AES-256-CFB", 429, Algorithm::Aes256, Mode::Cfb, 1, 16),
    handle("AES-128-GCM", 895, Algorithm::Aes128, Mode::Gcm, 1, GCM_NONCE_LEN),
    handle("AES-128-CCM", 896, Algorithm::Aes128, Mode::Ccm, 1, GCM_NONCE_LEN),
    handle("AES-192-GCM", 898, Algorithm::Aes192, Mode::Gcm, 1, GCM_NONCE_LEN),
    handle("AES-192-CCM", 899, Algorithm::Aes192, Mode::Ccm, 1, GCM_NONCE_LEN),
    handle("AES-256-GCM", 901, Algorithm::Aes256, Mode::Gcm, 1, GCM_NONCE_LEN),
    handle("AES-256-CCM", 902, Algorithm::Aes256, Mode::Ccm, 1, GCM_NONCE_LEN),
    handle("AES-128-CTR", 904, Algorithm::Aes128, Mode::Ctr, 1, 16),
    handle("AES-192-CTR", 905, Algorithm::Aes192, Mode::Ctr, 1, 16),
    handle("AES-256-CTR", 906, Algorithm::Aes256, Mode::Ctr, 1, 16),
];

/// Look a cipher up by name.
///
/// Returns `None` for names that do not parse or that no primitive
/// provides.
#[must_use]
pub fn lookup_cipher_by_name(name: &str) -> Option<PrimitiveHandle> {
    let parsed = CipherName::parse(name)?;
    lookup_parsed(&parsed)
}

pub(crate) fn lookup_parsed(name: &CipherName) -> Option<PrimitiveHandle> {
    if name.algorithm() != "AES" {
        return None;
    }
    HANDLES
        .iter()
        .find(|h| h.algorithm.key_bits() == name.key_bits() && h.mode == name.mode())
        .copied()
}

/// Every handle the registry knows, including ones without an engine.
pub fn handles() -> impl Iterator<Item = &'static PrimitiveHandle> {
    HANDLES.iter()
}

fn fixed(name: &str) -> PrimitiveHandle {
    // Fixed handles are compile-time table entries; the lookup cannot miss.
    match HANDLES.iter().find(|h| h.name == name) {
        Some(h) => *h,
        None => unreachable!("{name} missing from handle table"),
    }
}

/// AES-128 in GCM mode.
#[must_use]
pub fn aes_128_gcm() -> PrimitiveHandle {
    fixed("AES-128-GCM")
}

/// AES-192 in GCM mode.
#[must_use]
pub fn aes_192_gcm() -> PrimitiveHandle {
    fixed("AES-192-GCM")
}

/// AES-256 in GCM mode.
#[must_use]
pub fn aes_256_gcm() -> PrimitiveHandle {
    fixed("AES-256-GCM")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_names() {
        let cbc = lookup_cipher_by_name("AES-128-CBC").unwrap();
        assert_eq!(cbc.nid(), 419);
        assert_eq!(cbc.key_len(), 16);
        assert_eq!(cbc.iv_len(), 16);
        assert_eq!(cbc.block_size(), 16);

        let gcm = lookup_cipher_by_name("aes-256-gcm").unwrap();
        assert_eq!(gcm.name(), "AES-256-GCM");
        assert_eq!(gcm.key_len(), 32);
        assert_eq!(gcm.iv_len(), 12);
        assert_eq!(gcm.block_size(), 1);
    }

    #[test]
    fn test_lookup_unknown_names() {
        assert!(lookup_cipher_by_name("AES-128-XXF").is_none());
        assert!(lookup_cipher_by_name("AES-512-CBC").is_none());
        assert!(lookup_cipher_by_name("DES-128-CBC").is_none());
    }

    #[test]
    fn test_table_is_consistent() {
        for h in handles() {
            let parsed = CipherName::parse(h.name()).unwrap();
            assert_eq!(parsed.key_bits(), h.algorithm().key_bits());
            assert_eq!(parsed.mode(), h.mode());
            assert_eq!(lookup_cipher_by_name(h.name()), Some(*h));
        }
    }

    #[test]
    fn test_fixed_handles() {
        assert_eq!(aes_128_gcm().nid(), 895);
        assert_eq!(aes_192_gcm().nid(), 898);
        assert_eq!(aes_256_gcm().nid(), 901);
    }
}
