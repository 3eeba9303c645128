//! ECB and CBC with streaming block alignment.
//!
//! Input arrives in arbitrary pieces; only whole blocks reach the cipher.
//! The remainder waits in `pending`. With padding on, decryption also keeps
//! the last whole block back, because it may be the padding block and can
//! only be judged at finalize.

use super::{AES_BLOCK_LEN, AesBlock, ModeEngine, PrimitiveError, ensure_capacity};
use crate::constant_time::pkcs7_unpadded_len;
use crate::direction::Direction;
use crate::name::Mode;
use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, BlockEncryptMut, InnerIvInit};
use zeroize::Zeroize;

type Block = GenericArray<u8, U16>;

enum Chain<C: AesBlock> {
    EcbEncrypt(C),
    EcbDecrypt(C),
    CbcEncrypt(cbc::Encryptor<C>),
    CbcDecrypt(cbc::Decryptor<C>),
}

impl<C: AesBlock> Chain<C> {
    fn process(&mut self, block: &mut Block) {
        match self {
            Chain::EcbEncrypt(c) => c.encrypt_block(block),
            Chain::EcbDecrypt(c) => c.decrypt_block(block),
            Chain::CbcEncrypt(c) => c.encrypt_block_mut(block),
            Chain::CbcDecrypt(c) => c.decrypt_block_mut(block),
        }
    }
}

pub(crate) struct BlockEngine<C: AesBlock> {
    chain: Chain<C>,
    direction: Direction,
    padding: bool,
    pending: [u8; AES_BLOCK_LEN],
    pending_len: usize,
    finished: bool,
}

impl<C: AesBlock> BlockEngine<C> {
    pub(crate) fn new(
        mode: Mode,
        key: &[u8],
        iv: &[u8],
        direction: Direction,
        padding: bool,
    ) -> Result<Self, PrimitiveError> {
        let key_err = |_| PrimitiveError::KeyLength(key.len());
        let chain = match (mode, direction) {
            (Mode::Ecb, Direction::Encrypt) => {
                Chain::EcbEncrypt(C::new_from_slice(key).map_err(key_err)?)
            }
            (Mode::Ecb, Direction::Decrypt) => {
                Chain::EcbDecrypt(C::new_from_slice(key).map_err(key_err)?)
            }
            (Mode::Cbc, _) => {
                check_iv(iv)?;
                let cipher = C::new_from_slice(key).map_err(key_err)?;
                let iv = Block::from_slice(iv);
                match direction {
                    Direction::Encrypt => Chain::CbcEncrypt(cbc::Encryptor::inner_iv_init(cipher, iv)),
                    Direction::Decrypt => Chain::CbcDecrypt(cbc::Decryptor::inner_iv_init(cipher, iv)),
                }
            }
            (other, _) => return Err(PrimitiveError::UnsupportedMode(other)),
        };

        Ok(Self {
            chain,
            direction,
            padding,
            pending: [0u8; AES_BLOCK_LEN],
            pending_len: 0,
            finished: false,
        })
    }

    fn holds_back_last_block(&self) -> bool {
        self.padding && self.direction == Direction::Decrypt
    }
}

fn check_iv(iv: &[u8]) -> Result<(), PrimitiveError> {
    if iv.len() != AES_BLOCK_LEN {
        return Err(PrimitiveError::IvLength {
            expected: AES_BLOCK_LEN,
            actual: iv.len(),
        });
    }
    Ok(())
}

impl<C: AesBlock> ModeEngine for BlockEngine<C> {
    fn update(&mut self, mut input: &[u8], out: &mut [u8]) -> Result<usize, PrimitiveError> {
        if self.finished {
            return Err(PrimitiveError::Finalized);
        }

        let total = self.pending_len + input.len();
        let mut ready = total - total % AES_BLOCK_LEN;
        if self.holds_back_last_block() && ready == total && ready > 0 {
            ready -= AES_BLOCK_LEN;
        }
        ensure_capacity(out, ready)?;

        let mut written = 0;
        while written < ready {
            let mut block = Block::default();
            if self.pending_len > 0 {
                let take = AES_BLOCK_LEN - self.pending_len;
                block[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
                block[self.pending_len..].copy_from_slice(&input[..take]);
                input = &input[take..];
                self.pending.zeroize();
                self.pending_len = 0;
            } else {
                block.copy_from_slice(&input[..AES_BLOCK_LEN]);
                input = &input[AES_BLOCK_LEN..];
            }
            self.chain.process(&mut block);
            out[written..written + AES_BLOCK_LEN].copy_from_slice(&block);
            written += AES_BLOCK_LEN;
        }

        self.pending[self.pending_len..self.pending_len + input.len()].copy_from_slice(input);
        self.pending_len += input.len();
        Ok(written)
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<usize, PrimitiveError> {
        if self.finished {
            return Err(PrimitiveError::Finalized);
        }
        self.finished = true;

        if !self.padding {
            return if self.pending_len == 0 {
                Ok(0)
            } else {
                Err(PrimitiveError::NotBlockAligned)
            };
        }

        let mut block = Block::default();
        let produced = match self.direction {
            Direction::Encrypt => {
                ensure_capacity(out, AES_BLOCK_LEN)?;
                // PKCS#7: always at least one padding byte, a full block when aligned.
                let pad = (AES_BLOCK_LEN - self.pending_len) as u8;
                block[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
                block[self.pending_len..].fill(pad);
                self.chain.process(&mut block);
                out[..AES_BLOCK_LEN].copy_from_slice(&block);
                AES_BLOCK_LEN
            }
            Direction::Decrypt => {
                if self.pending_len != AES_BLOCK_LEN {
                    return Err(PrimitiveError::WrongFinalBlockLength);
                }
                block.copy_from_slice(&self.pending);
                self.chain.process(&mut block);
                let len = pkcs7_unpadded_len(&block).ok_or(PrimitiveError::BadDecrypt)?;
                ensure_capacity(out, len)?;
                out[..len].copy_from_slice(&block[..len]);
                len
            }
        };
        block.zeroize();
        self.pending.zeroize();
        self.pending_len = 0;
        Ok(produced)
    }

    fn set_padding(&mut self, enabled: bool) {
        self.padding = enabled;
    }
}

impl<C: AesBlock> Drop for BlockEngine<C> {
    fn drop(&mut self) {
        self.pending.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::Aes128;

    const KEY: [u8; 16] = [0x41; 16];
    const IV: [u8; 16] = [0x41; 16];

    fn run(engine: &mut BlockEngine<Aes128>, chunks: &[&[u8]]) -> Result<Vec<u8>, PrimitiveError> {
        let mut result = Vec::new();
        for chunk in chunks {
            let mut out = vec![0u8; chunk.len() + AES_BLOCK_LEN - 1];
            let n = engine.update(chunk, &mut out)?;
            result.extend_from_slice(&out[..n]);
        }
        let mut out = [0u8; AES_BLOCK_LEN];
        let n = engine.finalize(&mut out)?;
        result.extend_from_slice(&out[..n]);
        Ok(result)
    }

    fn cbc(direction: Direction, padding: bool) -> BlockEngine<Aes128> {
        BlockEngine::new(Mode::Cbc, &KEY, &IV, direction, padding).unwrap()
    }

    #[test]
    fn test_padding_adds_full_block_when_aligned() {
        let ct = run(&mut cbc(Direction::Encrypt, true), &[&[0u8; 32]]).unwrap();
        assert_eq!(ct.len(), 48);

        let empty = run(&mut cbc(Direction::Encrypt, true), &[]).unwrap();
        assert_eq!(empty.len(), 16);
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let data: Vec<u8> = (0..100u8).collect();
        let whole = run(&mut cbc(Direction::Encrypt, true), &[&data[..]]).unwrap();
        let pieces = run(
            &mut cbc(Direction::Encrypt, true),
            &[&data[..1], &data[1..17], &data[17..18], &data[18..64], &data[64..]],
        )
        .unwrap();
        assert_eq!(whole, pieces);

        let back = run(
            &mut cbc(Direction::Decrypt, true),
            &[&whole[..16], &whole[16..33], &whole[33..]],
        )
        .unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_decrypt_holds_back_last_block() {
        let ct = run(&mut cbc(Direction::Encrypt, true), &[b"sixteen byte msg"]).unwrap();
        assert_eq!(ct.len(), 32);

        let mut dec = cbc(Direction::Decrypt, true);
        let mut out = [0u8; 32 + AES_BLOCK_LEN - 1];
        // Both blocks could be padding until finalize says otherwise.
        assert_eq!(dec.update(&ct[..16], &mut out).unwrap(), 0);
        assert_eq!(dec.update(&ct[16..], &mut out).unwrap(), 16);
        assert_eq!(&out[..16], b"sixteen byte msg");

        let mut tail = [0u8; AES_BLOCK_LEN];
        assert_eq!(dec.finalize(&mut tail).unwrap(), 0);
    }

    #[test]
    fn test_unpadded_requires_alignment() {
        let err = run(&mut cbc(Direction::Encrypt, false), &[&[1u8; 20]]).unwrap_err();
        assert_eq!(err, PrimitiveError::NotBlockAligned);

        let ct = run(&mut cbc(Direction::Encrypt, false), &[&[1u8; 32]]).unwrap();
        assert_eq!(ct.len(), 32);
        let pt = run(&mut cbc(Direction::Decrypt, false), &[&ct]).unwrap();
        assert_eq!(pt, vec![1u8; 32]);
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let ct = run(&mut cbc(Direction::Encrypt, true), &[b"hello"]).unwrap();
        let err = run(&mut cbc(Direction::Decrypt, true), &[&ct[..15]]).unwrap_err();
        assert_eq!(err, PrimitiveError::WrongFinalBlockLength);
    }

    #[test]
    fn test_wrong_key_gives_bad_decrypt_or_garbage() {
        let ct = run(&mut cbc(Direction::Encrypt, true), &[b"attack at dawn"]).unwrap();
        let mut dec = BlockEngine::<Aes128>::new(Mode::Cbc, &[0x42; 16], &IV, Direction::Decrypt, true)
            .unwrap();
        match run(&mut dec, &[&ct]) {
            Err(e) => assert_eq!(e, PrimitiveError::BadDecrypt),
            Ok(pt) => assert_ne!(pt, b"attack at dawn"),
        }
    }

    #[test]
    fn test_update_after_finalize_rejected() {
        let mut enc = cbc(Direction::Encrypt, true);
        run(&mut enc, &[b"abc"]).unwrap();
        let mut out = [0u8; 32];
        assert_eq!(enc.update(b"more", &mut out), Err(PrimitiveError::Finalized));
    }

    #[test]
    fn test_small_output_buffer_rejected() {
        let mut enc = cbc(Direction::Encrypt, true);
        let mut out = [0u8; 8];
        assert!(matches!(
            enc.update(&[0u8; 16], &mut out),
            Err(PrimitiveError::OutputTooSmall { needed: 16, available: 8 })
        ));
    }

    #[test]
    fn test_ecb_ignores_iv() {
        let a = run(
            &mut BlockEngine::<Aes128>::new(Mode::Ecb, &KEY, &[], Direction::Encrypt, true).unwrap(),
            &[b"same"],
        )
        .unwrap();
        let b = run(
            &mut BlockEngine::<Aes128>::new(Mode::Ecb, &KEY, &IV, Direction::Encrypt, true).unwrap(),
            &[b"same"],
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
