//! Wire word codec
//!
//! Everything the card sends or accepts is framed as 32-bit words. The
//! logical rendering of a word is exactly 8 lowercase hex characters; the 4
//! raw bytes on the link carry the same value with its byte order reversed,
//! so the swap is applied once in each direction at the transport boundary.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// One 32-bit word of wire data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireWord(u32);

impl WireWord {
    /// Wrap a logical 32-bit value
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// The logical 32-bit value
    pub fn value(self) -> u32 {
        self.0
    }

    /// Parse the 8-hex-digit text rendering of a word
    ///
    /// Rejects anything that is not exactly 8 hex digits: no sign, no `0x`
    /// prefix, no shorter or longer strings.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ProtocolError::MalformedWord(text.to_string()));
        }
        let value = u32::from_str_radix(text, 16)
            .map_err(|_| ProtocolError::MalformedWord(text.to_string()))?;
        Ok(Self(value))
    }

    /// The 4 raw bytes as they travel on the link: the value's bytes in
    /// reversed order
    pub fn to_link_bytes(self) -> [u8; 4] {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, self.0);
        buf
    }

    /// Rebuild a word from 4 raw link bytes, undoing the byte swap
    pub fn from_link_bytes(bytes: [u8; 4]) -> Self {
        Self(LittleEndian::read_u32(&bytes))
    }
}

impl fmt::Display for WireWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for WireWord {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for WireWord {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
