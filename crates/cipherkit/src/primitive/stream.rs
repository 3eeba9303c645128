//! Keystream modes: CTR, CFB and OFB.
//!
//! All three are byte-granular, so `update` always produces exactly as many
//! bytes as it consumes and `finalize` produces nothing.

use super::{AES_BLOCK_LEN, AesBlock, ModeEngine, PrimitiveError, ensure_capacity};
use crate::direction::Direction;
use crate::name::Mode;
use cipher::{KeyIvInit, StreamCipher};

type Ctr<C> = ctr::Ctr128BE<C>;

enum Keystream<C: AesBlock> {
    Ctr(Ctr<C>),
    Ofb(ofb::Ofb<C>),
    CfbEncrypt(cfb_mode::BufEncryptor<C>),
    CfbDecrypt(cfb_mode::BufDecryptor<C>),
}

pub(crate) struct StreamEngine<C: AesBlock> {
    keystream: Keystream<C>,
    finished: bool,
}

impl<C: AesBlock> StreamEngine<C> {
    pub(crate) fn new(
        mode: Mode,
        key: &[u8],
        iv: &[u8],
        direction: Direction,
    ) -> Result<Self, PrimitiveError> {
        // The wrappers report one error for key and IV alike; settle the IV first.
        if iv.len() != AES_BLOCK_LEN {
            return Err(PrimitiveError::IvLength {
                expected: AES_BLOCK_LEN,
                actual: iv.len(),
            });
        }
        let key_err = |_| PrimitiveError::KeyLength(key.len());

        let keystream = match (mode, direction) {
            (Mode::Ctr, _) => Keystream::Ctr(Ctr::<C>::new_from_slices(key, iv).map_err(key_err)?),
            (Mode::Ofb, _) => Keystream::Ofb(ofb::Ofb::<C>::new_from_slices(key, iv).map_err(key_err)?),
            (Mode::Cfb, Direction::Encrypt) => Keystream::CfbEncrypt(
                cfb_mode::BufEncryptor::<C>::new_from_slices(key, iv).map_err(key_err)?,
            ),
            (Mode::Cfb, Direction::Decrypt) => Keystream::CfbDecrypt(
                cfb_mode::BufDecryptor::<C>::new_from_slices(key, iv).map_err(key_err)?,
            ),
            (other, _) => return Err(PrimitiveError::UnsupportedMode(other)),
        };

        Ok(Self {
            keystream,
            finished: false,
        })
    }
}

impl<C: AesBlock> ModeEngine for StreamEngine<C> {
    fn update(&mut self, input: &[u8], out: &mut [u8]) -> Result<usize, PrimitiveError> {
        if self.finished {
            return Err(PrimitiveError::Finalized);
        }
        ensure_capacity(out, input.len())?;

        let buf = &mut out[..input.len()];
        buf.copy_from_slice(input);
        match &mut self.keystream {
            Keystream::Ctr(c) => c
                .try_apply_keystream(buf)
                .map_err(|_| PrimitiveError::LengthLimit)?,
            Keystream::Ofb(c) => c
                .try_apply_keystream(buf)
                .map_err(|_| PrimitiveError::LengthLimit)?,
            Keystream::CfbEncrypt(c) => c.encrypt(buf),
            Keystream::CfbDecrypt(c) => c.decrypt(buf),
        }
        Ok(input.len())
    }

    fn finalize(&mut self, _out: &mut [u8]) -> Result<usize, PrimitiveError> {
        if self.finished {
            return Err(PrimitiveError::Finalized);
        }
        self.finished = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::Aes128;

    fn engine(mode: Mode, direction: Direction) -> StreamEngine<Aes128> {
        StreamEngine::new(mode, &[0x41; 16], &[0x41; 16], direction).unwrap()
    }

    fn apply(engine: &mut StreamEngine<Aes128>, chunks: &[&[u8]]) -> Vec<u8> {
        let mut result = Vec::new();
        for chunk in chunks {
            let mut out = vec![0u8; chunk.len()];
            let n = engine.update(chunk, &mut out).unwrap();
            assert_eq!(n, chunk.len());
            result.extend_from_slice(&out);
        }
        assert_eq!(engine.finalize(&mut []).unwrap(), 0);
        result
    }

    #[test]
    fn test_ctr_known_answer() {
        let ct = apply(&mut engine(Mode::Ctr, Direction::Encrypt), &[b"Hello World"]);
        assert_eq!(hex::encode(ct), "b0aecdc6347177db8091be");
    }

    #[test]
    fn test_round_trip_with_odd_chunks() {
        let data: Vec<u8> = (0..77u8).collect();
        for mode in [Mode::Ctr, Mode::Cfb, Mode::Ofb] {
            let ct = apply(
                &mut engine(mode, Direction::Encrypt),
                &[&data[..3], &data[3..20], &data[20..]],
            );
            assert_eq!(ct.len(), data.len());
            assert_ne!(ct, data);

            let pt = apply(&mut engine(mode, Direction::Decrypt), &[&ct[..40], &ct[40..]]);
            assert_eq!(pt, data, "{mode} round trip");
        }
    }

    #[test]
    fn test_cfb_direction_matters() {
        let data = [0x5au8; 40];
        let ct = apply(&mut engine(Mode::Cfb, Direction::Encrypt), &[&data[..]]);
        // Decrypting with an encryptor feeds back the wrong bytes after the first block.
        let wrong = apply(&mut engine(Mode::Cfb, Direction::Encrypt), &[&ct[..]]);
        assert_ne!(wrong, data.to_vec());
    }

    #[test]
    fn test_iv_length_checked_before_key() {
        let err = StreamEngine::<Aes128>::new(Mode::Ctr, &[0u8; 3], &[0u8; 8], Direction::Encrypt)
            .err()
            .unwrap();
        assert_eq!(
            err,
            PrimitiveError::IvLength {
                expected: 16,
                actual: 8
            }
        );
    }

    #[test]
    fn test_update_after_finalize_rejected() {
        let mut enc = engine(Mode::Ofb, Direction::Encrypt);
        apply(&mut enc, &[b"abc"]);
        let mut out = [0u8; 4];
        assert_eq!(enc.update(b"more", &mut out), Err(PrimitiveError::Finalized));
    }
}
