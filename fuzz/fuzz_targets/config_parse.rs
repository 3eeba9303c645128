//! Fuzz test for session configuration parsing
//!
//! Tests that arbitrary TOML input doesn't cause panics when loaded as a
//! session configuration, and that accepted configurations validate.

#![no_main]

use cipherkit::SessionConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = SessionConfig::from_toml_str(s) {
            assert!(config.validate().is_ok());
        }
    }
});
