use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sequence::{AsciiChar, Sequence};

pub type DnaSequence = Sequence<DnaBase>;
pub type MaybeDnaSequence = Sequence<MaybeDnaBase>;

/// Watson-Crick complement of a base. Sequences of complementable bases
/// get `reverse_complement` for free.
pub trait Complement {
    fn complement(self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[repr(u8)]
pub enum DnaBase {
    A = b'A',
    C = b'C',
    G = b'G',
    T = b'T',
}

/// An unambiguous base or `N`. Assembled genomes carry `N` runs, so
/// chromosomes are stored with this alphabet; k-mer extraction narrows to
/// [`DnaBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[repr(u8)]
pub enum MaybeDnaBase {
    A = b'A',
    C = b'C',
    G = b'G',
    T = b'T',
    N = b'N',
}

impl DnaBase {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b.to_ascii_uppercase() {
            b'A' => Some(Self::A),
            b'C' => Some(Self::C),
            b'G' => Some(Self::G),
            b'T' => Some(Self::T),
            _ => None,
        }
    }
    pub fn to_byte(self) -> u8 {
        self as u8
    }
    pub fn to_char(self) -> char {
        self.to_byte() as char
    }

    /// 2-bit encoding, `A=0 C=1 G=2 T=3`.
    pub fn code(self) -> u64 {
        match self {
            Self::A => 0,
            Self::C => 1,
            Self::G => 2,
            Self::T => 3,
        }
    }
    pub fn from_code(code: u64) -> Self {
        match code & 0b11 {
            0 => Self::A,
            1 => Self::C,
            2 => Self::G,
            _ => Self::T,
        }
    }
}
impl Complement for DnaBase {
    fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::C => Self::G,
            Self::G => Self::C,
        }
    }
}
impl AsciiChar for DnaBase {
    fn encode(bases: &[Self]) -> String {
        bases.iter().map(|b| b.to_char()).collect()
    }

    type DecodeError = DnaDecodeError;
    fn decode(bases: Vec<u8>) -> Result<DnaSequence, Self::DecodeError> {
        bases
            .iter()
            .enumerate()
            .map(|(at, &byte)| {
                Self::from_byte(byte).ok_or(DnaDecodeError::InvalidSequence {
                    at,
                    byte,
                    len: bases.len(),
                })
            })
            .collect()
    }
}
impl std::fmt::Display for DnaBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
impl FromStr for DnaBase {
    type Err = DnaDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [b] => DnaBase::from_byte(*b).ok_or(DnaDecodeError::InvalidBaseByte { from: *b }),
            _ => Err(DnaDecodeError::InvalidInputLength { from: s.to_owned() }),
        }
    }
}

impl MaybeDnaBase {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b.to_ascii_uppercase() {
            b'A' => Some(Self::A),
            b'C' => Some(Self::C),
            b'G' => Some(Self::G),
            b'T' => Some(Self::T),
            b'N' => Some(Self::N),
            _ => None,
        }
    }
    pub fn to_byte(self) -> u8 {
        self as u8
    }
    pub fn to_char(self) -> char {
        self.to_byte() as char
    }

    pub fn to_dna(self) -> Option<DnaBase> {
        match self {
            Self::A => Some(DnaBase::A),
            Self::C => Some(DnaBase::C),
            Self::G => Some(DnaBase::G),
            Self::T => Some(DnaBase::T),
            Self::N => None,
        }
    }
    pub fn is_ambiguous(self) -> bool {
        self == Self::N
    }
}
impl Complement for MaybeDnaBase {
    fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::N => Self::N,
        }
    }
}
impl From<DnaBase> for MaybeDnaBase {
    fn from(b: DnaBase) -> Self {
        match b {
            DnaBase::A => Self::A,
            DnaBase::C => Self::C,
            DnaBase::G => Self::G,
            DnaBase::T => Self::T,
        }
    }
}
impl AsciiChar for MaybeDnaBase {
    fn encode(bases: &[Self]) -> String {
        bases.iter().map(|b| b.to_char()).collect()
    }

    type DecodeError = DnaDecodeError;
    fn decode(bases: Vec<u8>) -> Result<MaybeDnaSequence, Self::DecodeError> {
        bases
            .iter()
            .enumerate()
            .map(|(at, &byte)| {
                Self::from_byte(byte).ok_or(DnaDecodeError::InvalidSequence {
                    at,
                    byte,
                    len: bases.len(),
                })
            })
            .collect()
    }
}
impl std::fmt::Display for MaybeDnaBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
impl FromStr for MaybeDnaBase {
    type Err = DnaDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [b] => MaybeDnaBase::from_byte(*b).ok_or(DnaDecodeError::InvalidBaseByte { from: *b }),
            _ => Err(DnaDecodeError::InvalidInputLength { from: s.to_owned() }),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DnaDecodeError {
    #[error("Expected a single DNA base, got: {from}")]
    InvalidInputLength { from: String },
    #[error("Invalid DNA base: {from}")]
    InvalidBaseByte { from: u8 },
    #[error("Invalid DNA sequence: {byte:?} at {at}/{len}")]
    InvalidSequence { at: usize, byte: u8, len: usize },
}
impl From<DnaDecodeError> for std::io::Error {
    fn from(value: DnaDecodeError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value)
    }
}
