//! Fuzz target for streaming sessions
//!
//! Drives arbitrary ciphers with arbitrary chunking and checks that
//! decryption restores the input. Decrypting raw fuzzer bytes must fail
//! cleanly rather than panic.

#![no_main]

use arbitrary::Arbitrary;
use cipherkit::CipherDescriptor;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct SessionInput {
    cipher: u8,
    key_byte: u8,
    iv: Vec<u8>,
    aad: Vec<u8>,
    chunks: Vec<Vec<u8>>,
    tag: Vec<u8>,
}

fuzz_target!(|input: SessionInput| {
    let names = CipherDescriptor::available();
    let name = names[usize::from(input.cipher) % names.len()];
    let cipher = CipherDescriptor::resolve(name).unwrap();
    let key = vec![input.key_byte; cipher.key_len()];

    // Arbitrary IV lengths are only accepted by authenticated modes
    let Ok(mut enc) = cipher.encryptor(&key, &input.iv) else {
        return;
    };
    if cipher.is_authenticated() {
        enc.absorb(&input.aad).unwrap();
    }
    let mut ciphertext = Vec::new();
    for chunk in &input.chunks {
        ciphertext.extend(enc.update(chunk).unwrap());
    }
    ciphertext.extend(enc.finalize().unwrap());

    let mut dec = cipher.decryptor(&key, &input.iv).unwrap();
    if cipher.is_authenticated() {
        dec.absorb(&input.aad).unwrap();
        dec.set_tag(&enc.tag().unwrap()).unwrap();
    }
    let mut plaintext = dec.update(&ciphertext).unwrap();
    plaintext.extend(dec.finalize().unwrap());
    assert_eq!(plaintext, input.chunks.concat());

    // Raw bytes as ciphertext: errors are fine, panics are not
    if let Ok(mut dec) = cipher.decryptor(&key, &input.iv) {
        let _ = dec.set_tag(&input.tag);
        for chunk in &input.chunks {
            let _ = dec.update(chunk);
        }
        let _ = dec.finalize();
    }
});
