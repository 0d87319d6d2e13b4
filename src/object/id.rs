use std::fmt::{self, Write};
use std::str::FromStr;

use thiserror::Error;

/// An error which can be returned when parsing a git object ID.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ParseIdError {
    /// Value being parsed is empty.
    #[error("cannot parse object ID from empty string")]
    Empty,

    /// Contains an invalid digit.
    ///
    /// Uppercase hex digits are rejected too; the remote API and the object
    /// store both use lowercase.
    #[error("value contains invalid digit `{0}`")]
    InvalidDigit(char),

    /// ID is too long.
    #[error("value is more than 40 digits long")]
    Overflow,

    /// ID is too short.
    #[error("value is less than 40 digits long")]
    Underflow,

    /// Value was zero.
    #[error("ID would be zero")]
    Zero,
}

/// An object ID identifies an object within a repository.
/// It is stored as a 20-byte SHA-1 digest, but can also be represented as 40 hex digits.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id {
    id: [u8; 20],
}

impl Id {
    /// Create a new ID from a 20-byte slice.
    ///
    /// It is an error if the slice contains anything other than 20 bytes.
    pub fn new(id: &[u8]) -> Result<Id, ParseIdError> {
        match id.len() {
            20 => {
                let mut bytes = [0; 20];
                bytes.copy_from_slice(id);
                Ok(Id { id: bytes })
            }
            0 => Err(ParseIdError::Empty),
            n if n < 20 => Err(ParseIdError::Underflow),
            _ => Err(ParseIdError::Overflow),
        }
    }

    pub(crate) fn from_digest(id: [u8; 20]) -> Id {
        Id { id }
    }

    /// Convert a 40-character hex ID to an object ID.
    ///
    /// It is an error if the ID contains anything other than 40 lowercase hex digits.
    pub fn from_hex<T: AsRef<[u8]>>(id: T) -> Result<Id, ParseIdError> {
        let hex = id.as_ref();

        match hex.len() {
            40 => {
                let mut bytes = [0; 20];
                for (byte, pair) in bytes.iter_mut().zip(hex.chunks(2)) {
                    *byte = digit_value(pair[0])? << 4 | digit_value(pair[1])?;
                }

                if bytes.iter().all(|x| *x == 0) {
                    Err(ParseIdError::Zero)
                } else {
                    Ok(Id { id: bytes })
                }
            }
            0 => Err(ParseIdError::Empty),
            n if n < 40 => Err(ParseIdError::Underflow),
            _ => Err(ParseIdError::Overflow),
        }
    }

    /// Returns the raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.id
    }

    /// Returns the first `len` hex digits, as used in progress output.
    pub fn short(&self, len: usize) -> String {
        let mut s = self.to_string();
        s.truncate(len);
        s
    }

    /// Splits the hex form into the fan-out directory name (2 digits)
    /// and the file name (remaining 38 digits).
    pub fn fan_out(&self) -> (String, String) {
        let mut dir = self.to_string();
        let file = dir.split_off(2);
        (dir, file)
    }
}

impl FromStr for Id {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Id::from_hex(s.as_bytes())
    }
}

static CHARS: &[u8] = b"0123456789abcdef";

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.id.iter() {
            f.write_char(CHARS[(byte >> 4) as usize].into())?;
            f.write_char(CHARS[(byte & 0xf) as usize].into())?;
        }

        Ok(())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

fn digit_value(c: u8) -> Result<u8, ParseIdError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(ParseIdError::InvalidDigit(c as char)),
    }
}
