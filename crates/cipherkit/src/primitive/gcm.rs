//! Incremental AES-GCM.
//!
//! The one-shot AEAD crates want the whole message at once; sessions feed
//! associated data and payload in pieces, so the construction is spelled
//! out here from its parts:
//!
//! - `H = E(K, 0^128)`
//! - `J0 = IV || 0^31 || 1` for 96-bit nonces, `GHASH(H, IV || len(IV))` otherwise
//! - payload keystream from `inc32(J0)` with a 32-bit big-endian counter
//! - `tag = GHASH(H, A, C) ^ E(K, J0)`
//!
//! GHASH absorbs whole blocks; partial blocks wait in `pending` until more
//! data arrives or the section (associated data or payload) ends.

use super::{AesBlock, MAX_TAG_LEN, ModeEngine, PrimitiveError, ensure_capacity};
use crate::constant_time::ct_eq;
use crate::direction::Direction;
use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{InnerIvInit, KeyInit, StreamCipher};
use ghash::GHash;
use ghash::universal_hash::UniversalHash;
use zeroize::Zeroize;

type Block = GenericArray<u8, U16>;

const BLOCK_LEN: usize = 16;

/// Longest payload one nonce may protect (2^39 - 256 bits).
const MAX_PAYLOAD_LEN: u64 = (1 << 36) - 32;

/// Longest associated data (2^64 - 1 bits, rounded down to bytes).
const MAX_AAD_LEN: u64 = (1 << 61) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AssociatedData,
    Payload,
    Finished,
}

pub(crate) struct GcmEngine<C: AesBlock> {
    keystream: ctr::Ctr32BE<C>,
    ghash: GHash,
    direction: Direction,
    phase: Phase,
    pending: Block,
    pending_len: usize,
    aad_len: u64,
    payload_len: u64,
    /// `E(K, J0)`
    tag_mask: Block,
    expected_tag: Option<([u8; MAX_TAG_LEN], usize)>,
    tag: Option<Block>,
}

impl<C: AesBlock> GcmEngine<C> {
    pub(crate) fn new(key: &[u8], iv: &[u8], direction: Direction) -> Result<Self, PrimitiveError> {
        if iv.is_empty() {
            return Err(PrimitiveError::EmptyNonce);
        }
        let cipher = C::new_from_slice(key).map_err(|_| PrimitiveError::KeyLength(key.len()))?;

        let mut h = Block::default();
        cipher.encrypt_block(&mut h);
        let j0 = derive_j0(&h, iv);
        let mut tag_mask = j0;
        cipher.encrypt_block(&mut tag_mask);
        let keystream =
            ctr::Ctr32BE::<C>::from_core(ctr::CtrCore::inner_iv_init(cipher, &inc32(j0)));

        let ghash = GHash::new(&h);
        h.as_mut_slice().zeroize();

        Ok(Self {
            keystream,
            ghash,
            direction,
            phase: Phase::AssociatedData,
            pending: Block::default(),
            pending_len: 0,
            aad_len: 0,
            payload_len: 0,
            tag_mask,
            expected_tag: None,
            tag: None,
        })
    }

    fn absorb(&mut self, mut data: &[u8]) {
        if self.pending_len > 0 {
            let take = (BLOCK_LEN - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];
            if self.pending_len < BLOCK_LEN {
                return;
            }
            self.ghash.update(&[self.pending]);
            self.pending_len = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            self.ghash.update(&[*Block::from_slice(block)]);
        }
        let rest = blocks.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    /// Close the current section, zero-padding any partial block.
    fn flush_padded(&mut self) {
        if self.pending_len > 0 {
            self.ghash.update_padded(&self.pending[..self.pending_len]);
            self.pending.as_mut_slice().zeroize();
            self.pending_len = 0;
        }
    }

    fn compute_tag(&mut self) -> Block {
        let mut lengths = Block::default();
        lengths[..8].copy_from_slice(&(self.aad_len * 8).to_be_bytes());
        lengths[8..].copy_from_slice(&(self.payload_len * 8).to_be_bytes());
        self.ghash.update(&[lengths]);

        let mut tag = self.ghash.clone().finalize();
        for (t, m) in tag.iter_mut().zip(self.tag_mask.iter()) {
            *t ^= m;
        }
        tag
    }
}

fn derive_j0(h: &Block, iv: &[u8]) -> Block {
    let mut j0 = Block::default();
    if iv.len() == 12 {
        j0[..12].copy_from_slice(iv);
        j0[15] = 1;
        return j0;
    }

    let mut ghash = GHash::new(h);
    ghash.update_padded(iv);
    let mut lengths = Block::default();
    lengths[8..].copy_from_slice(&(iv.len() as u64 * 8).to_be_bytes());
    ghash.update(&[lengths]);
    ghash.finalize()
}

fn inc32(mut block: Block) -> Block {
    let counter = u32::from_be_bytes([block[12], block[13], block[14], block[15]]).wrapping_add(1);
    block[12..].copy_from_slice(&counter.to_be_bytes());
    block
}

impl<C: AesBlock> ModeEngine for GcmEngine<C> {
    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, PrimitiveError> {
        match self.phase {
            Phase::Finished => return Err(PrimitiveError::Finalized),
            Phase::AssociatedData => {
                self.flush_padded();
                self.phase = Phase::Payload;
            }
            Phase::Payload => {}
        }
        ensure_capacity(out, input.len())?;
        let total = self
            .payload_len
            .checked_add(input.len() as u64)
            .filter(|&n| n <= MAX_PAYLOAD_LEN)
            .ok_or(PrimitiveError::LengthLimit)?;

        // GHASH always runs over the ciphertext side.
        if self.direction == Direction::Decrypt {
            self.absorb(input);
        }
        let buf = &mut out[..input.len()];
        buf.copy_from_slice(input);
        self.keystream
            .try_apply_keystream(buf)
            .map_err(|_| PrimitiveError::LengthLimit)?;
        if self.direction == Direction::Encrypt {
            self.absorb(buf);
        }

        self.payload_len = total;
        Ok(input.len())
    }

    fn finalize(&mut self, _out: &mut [u8]) -> Result<usize, PrimitiveError> {
        if self.phase == Phase::Finished {
            return Err(PrimitiveError::Finalized);
        }
        if self.direction == Direction::Decrypt && self.expected_tag.is_none() {
            return Err(PrimitiveError::TagNotSet);
        }
        self.flush_padded();
        self.phase = Phase::Finished;

        let mut tag = self.compute_tag();
        let result = match (self.direction, self.expected_tag.as_ref()) {
            (Direction::Decrypt, Some((expected, len))) => {
                if ct_eq(&tag[..*len], &expected[..*len]) {
                    Ok(0)
                } else {
                    Err(PrimitiveError::AuthenticationFailed)
                }
            }
            (Direction::Decrypt, None) => Err(PrimitiveError::TagNotSet),
            (Direction::Encrypt, _) => {
                self.tag = Some(tag);
                Ok(0)
            }
        };
        tag.as_mut_slice().zeroize();
        result
    }

    fn update_aad(&mut self, aad: &[u8]) -> Result<(), PrimitiveError> {
        match self.phase {
            Phase::AssociatedData => {}
            Phase::Payload => return Err(PrimitiveError::AssociatedDataAfterPayload),
            Phase::Finished => return Err(PrimitiveError::Finalized),
        }
        let total = self
            .aad_len
            .checked_add(aad.len() as u64)
            .filter(|&n| n <= MAX_AAD_LEN)
            .ok_or(PrimitiveError::LengthLimit)?;
        self.absorb(aad);
        self.aad_len = total;
        Ok(())
    }

    fn set_tag(&mut self, tag: &[u8]) -> Result<(), PrimitiveError> {
        if self.direction == Direction::Encrypt {
            return Err(PrimitiveError::UnsupportedControl("set tag on encrypt"));
        }
        if self.phase == Phase::Finished {
            return Err(PrimitiveError::Finalized);
        }
        if tag.is_empty() || tag.len() > MAX_TAG_LEN {
            return Err(PrimitiveError::TagLength(tag.len()));
        }
        let mut stored = [0u8; MAX_TAG_LEN];
        stored[..tag.len()].copy_from_slice(tag);
        self.expected_tag = Some((stored, tag.len()));
        Ok(())
    }

    fn get_tag(&self, out: &mut [u8]) -> Result<(), PrimitiveError> {
        if out.is_empty() || out.len() > MAX_TAG_LEN {
            return Err(PrimitiveError::TagLength(out.len()));
        }
        let tag = self.tag.as_ref().ok_or(PrimitiveError::TagUnavailable)?;
        out.copy_from_slice(&tag[..out.len()]);
        Ok(())
    }
}

impl<C: AesBlock> Drop for GcmEngine<C> {
    fn drop(&mut self) {
        self.pending.as_mut_slice().zeroize();
        self.tag_mask.as_mut_slice().zeroize();
        if let Some(tag) = self.tag.as_mut() {
            tag.as_mut_slice().zeroize();
        }
        if let Some((expected, _)) = self.expected_tag.as_mut() {
            expected.zeroize();
        }
    }
}
