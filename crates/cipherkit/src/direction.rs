//! Operation direction.

use crate::CipherError;

/// Whether a session encrypts or decrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

impl Direction {
    /// Integer flag form: 1 for encrypt, 0 for decrypt.
    #[must_use]
    pub fn flag(self) -> i32 {
        match self {
            Direction::Encrypt => 1,
            Direction::Decrypt => 0,
        }
    }

    /// Returns `true` for [`Direction::Encrypt`].
    #[must_use]
    pub fn is_encrypt(self) -> bool {
        self == Direction::Encrypt
    }
}

impl TryFrom<i32> for Direction {
    type Error = CipherError;

    fn try_from(flag: i32) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(Direction::Encrypt),
            0 => Ok(Direction::Decrypt),
            other => Err(CipherError::InvalidDirection(other)),
        }
    }
}

impl From<Direction> for i32 {
    fn from(direction: Direction) -> Self {
        direction.flag()
    }
}
