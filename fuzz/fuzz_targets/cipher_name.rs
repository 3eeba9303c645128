//! Fuzz target for cipher name resolution
//!
//! Tests that arbitrary names never panic and that anything that resolves
//! round-trips through its canonical name.

#![no_main]

use cipherkit::{CipherDescriptor, CipherName};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        if let Some(parsed) = CipherName::parse(name) {
            // Display output must parse back to the same name
            assert_eq!(CipherName::parse(&parsed.to_string()), Some(parsed));
        }

        if let Ok(descriptor) = CipherDescriptor::resolve(name) {
            let again = CipherDescriptor::resolve(descriptor.name()).unwrap();
            assert_eq!(again, descriptor);
        }
    }
});
