//! Call-data codec for governed payloads.
//!
//! Payloads use the Solidity ABI layout: a 4-byte selector
//! (`keccak256(signature)[..4]`) followed by 32-byte argument words, with
//! dynamic arguments (arrays, strings) placed in a tail and referenced by
//! byte offset from the start of the arguments. Keeping this layout means the
//! bytes signers hash are the same bytes existing deployments expect.

use concord_crypto::keccak256;
use concord_types::Address;
use thiserror::Error;

/// Size of one ABI word.
pub const WORD: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("payload too short: need {needed} bytes, have {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("unknown selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    #[error("non-zero padding in {0}")]
    DirtyPadding(&'static str),

    #[error("{0} does not fit the native integer width")]
    Overflow(&'static str),

    #[error("invalid bool word")]
    InvalidBool,

    #[error("string is not valid utf-8")]
    InvalidUtf8,
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Split a payload into selector and argument bytes.
pub fn split_selector(payload: &[u8]) -> Result<([u8; 4], &[u8]), CodecError> {
    if payload.len() < 4 {
        return Err(CodecError::TooShort {
            needed: 4,
            actual: payload.len(),
        });
    }
    let selector = [payload[0], payload[1], payload[2], payload[3]];
    Ok((selector, &payload[4..]))
}

pub fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn bool_word(value: bool) -> [u8; 32] {
    uint_word(u128::from(value))
}

/// Builds call data word by word.
pub struct CallEncoder {
    head: Vec<u8>,
    tail: Vec<u8>,
    head_words: usize,
}

impl CallEncoder {
    /// Start a call with `head_words` static slots (one per argument).
    pub fn new(signature: &str, head_words: usize) -> Self {
        let mut encoder = Self::without_selector(head_words);
        encoder.head.extend_from_slice(&selector(signature));
        encoder
    }

    /// Encode bare argument words, as used for return data.
    pub fn without_selector(head_words: usize) -> Self {
        Self {
            head: Vec::with_capacity(4 + head_words * WORD),
            tail: Vec::new(),
            head_words,
        }
    }

    pub fn word(mut self, word: [u8; 32]) -> Self {
        self.head.extend_from_slice(&word);
        self
    }

    pub fn address(self, address: &Address) -> Self {
        self.word(address.to_word())
    }

    pub fn uint(self, value: u128) -> Self {
        self.word(uint_word(value))
    }

    /// Append a dynamic argument: its offset goes in the head, its body in the tail.
    fn dynamic(mut self, body: Vec<u8>) -> Self {
        let offset = self.head_words * WORD + self.tail.len();
        self.tail.extend_from_slice(&body);
        self.uint(offset as u128)
    }

    pub fn address_array(self, items: &[Address]) -> Self {
        let mut body = Vec::with_capacity((items.len() + 1) * WORD);
        body.extend_from_slice(&uint_word(items.len() as u128));
        for item in items {
            body.extend_from_slice(&item.to_word());
        }
        self.dynamic(body)
    }

    pub fn bool_array(self, items: &[bool]) -> Self {
        let mut body = Vec::with_capacity((items.len() + 1) * WORD);
        body.extend_from_slice(&uint_word(items.len() as u128));
        for item in items {
            body.extend_from_slice(&bool_word(*item));
        }
        self.dynamic(body)
    }

    pub fn string(self, value: &str) -> Self {
        let bytes = value.as_bytes();
        let padded = bytes.len().div_ceil(WORD) * WORD;
        let mut body = Vec::with_capacity(WORD + padded);
        body.extend_from_slice(&uint_word(bytes.len() as u128));
        body.extend_from_slice(bytes);
        body.resize(WORD + padded, 0);
        self.dynamic(body)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.head.extend_from_slice(&self.tail);
        self.head
    }
}

/// Reads argument words (the bytes after the selector).
pub struct ArgReader<'a> {
    args: &'a [u8],
}

impl<'a> ArgReader<'a> {
    pub fn new(args: &'a [u8]) -> Self {
        Self { args }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], CodecError> {
        let end = offset.checked_add(WORD).ok_or(CodecError::Overflow("offset"))?;
        self.args.get(offset..end).ok_or(CodecError::TooShort {
            needed: end,
            actual: self.args.len(),
        })
    }

    fn uint_at(&self, offset: usize, what: &'static str) -> Result<u128, CodecError> {
        let word = self.word_at(offset)?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(CodecError::Overflow(what));
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(low))
    }

    fn address_at(&self, offset: usize) -> Result<Address, CodecError> {
        let word = self.word_at(offset)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(CodecError::DirtyPadding("address"));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::new(bytes))
    }

    fn bool_at(&self, offset: usize) -> Result<bool, CodecError> {
        match self.uint_at(offset, "bool") {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            Ok(_) | Err(CodecError::Overflow(_)) => Err(CodecError::InvalidBool),
            Err(e) => Err(e),
        }
    }

    fn usize_at(&self, offset: usize, what: &'static str) -> Result<usize, CodecError> {
        usize::try_from(self.uint_at(offset, what)?).map_err(|_| CodecError::Overflow(what))
    }

    /// Locate a dynamic argument: returns (length, offset of first element).
    fn dynamic(&self, index: usize) -> Result<(usize, usize), CodecError> {
        let start = self.usize_at(index * WORD, "offset")?;
        let len = self.usize_at(start, "length")?;
        let first = start.checked_add(WORD).ok_or(CodecError::Overflow("offset"))?;
        Ok((len, first))
    }

    /// Every element needs a full word, so a huge length fails before allocating.
    fn ensure_elements(&self, len: usize, first: usize) -> Result<(), CodecError> {
        if len > 0 {
            let last = len
                .checked_sub(1)
                .and_then(|n| n.checked_mul(WORD))
                .and_then(|n| n.checked_add(first))
                .ok_or(CodecError::Overflow("length"))?;
            self.word_at(last)?;
        }
        Ok(())
    }

    pub fn address(&self, index: usize) -> Result<Address, CodecError> {
        self.address_at(index * WORD)
    }

    pub fn uint128(&self, index: usize) -> Result<u128, CodecError> {
        self.uint_at(index * WORD, "uint256")
    }

    pub fn uint64(&self, index: usize) -> Result<u64, CodecError> {
        u64::try_from(self.uint128(index)?).map_err(|_| CodecError::Overflow("uint256"))
    }

    pub fn address_array(&self, index: usize) -> Result<Vec<Address>, CodecError> {
        let (len, first) = self.dynamic(index)?;
        self.ensure_elements(len, first)?;
        (0..len).map(|i| self.address_at(first + i * WORD)).collect()
    }

    pub fn bool_array(&self, index: usize) -> Result<Vec<bool>, CodecError> {
        let (len, first) = self.dynamic(index)?;
        self.ensure_elements(len, first)?;
        (0..len).map(|i| self.bool_at(first + i * WORD)).collect()
    }

    pub fn string(&self, index: usize) -> Result<String, CodecError> {
        let (len, first) = self.dynamic(index)?;
        let end = first.checked_add(len).ok_or(CodecError::Overflow("length"))?;
        let bytes = self.args.get(first..end).ok_or(CodecError::TooShort {
            needed: end,
            actual: self.args.len(),
        })?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

/// ABI-encode a single string as a return value.
pub fn encode_string_return(value: &str) -> Vec<u8> {
    CallEncoder::without_selector(1).string(value).finish()
}
