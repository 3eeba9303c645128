//! Constant-time operations.
//!
//! Tag comparison and padding checks must not leak, through timing, how
//! many leading bytes were correct.

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater};

/// Constant-time comparison of byte slices.
///
/// Returns `true` if slices are equal, `false` otherwise.
/// Execution time depends only on slice length, not content.
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Validate PKCS#7 padding on a final block in constant time.
///
/// Returns the number of message bytes in `block` (block length minus the
/// padding length), or `None` if the padding is malformed.
#[must_use]
pub fn pkcs7_unpadded_len(block: &[u8]) -> Option<usize> {
    let len = block.len();
    if len == 0 || len > usize::from(u8::MAX) {
        return None;
    }

    let pad = block[len - 1];
    // Both bounds widen to u16 so `len` itself never has to fit in a u8.
    let pad_wide = u16::from(pad);
    let mut bad = pad.ct_eq(&0);
    bad |= pad_wide.ct_gt(&(len as u16));

    for (i, &byte) in block.iter().enumerate() {
        // Position i sits inside the padding when i >= len - pad.
        let from_end = (len - i) as u16;
        let in_pad: Choice = !from_end.ct_gt(&pad_wide);
        bad |= in_pad & !byte.ct_eq(&pad);
    }

    if bool::from(bad) {
        None
    } else {
        Some(len - usize::from(pad))
    }
}
