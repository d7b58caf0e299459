//! Protocol errors

use thiserror::Error;

use super::packet::PacketType;
use super::params::ParamId;

/// Errors that can occur while encoding, decoding or exchanging packets
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("serial port error: {0}")]
    SerialError(String),

    #[error("receive timeout")]
    Timeout,

    #[error("malformed wire word {0:?}: expected exactly 8 hex digits")]
    MalformedWord(String),

    #[error("unknown parameter id {0:#06x}")]
    UnknownParameter(u16),

    #[error("payload too large: {len} words does not fit the {max}-word slot")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("wrong value count for {param:?}: got {got}, expected {expected}")]
    WrongValueCount {
        param: ParamId,
        got: usize,
        expected: usize,
    },

    #[error("no preamble found from word offset {0}")]
    NoPreambleFound(usize),

    #[error("unknown packet type word {word:#010x} at offset {offset}")]
    UnknownPacketType { word: u32, offset: usize },

    #[error("packet at offset {offset} truncated: needs {needed} words, {available} left")]
    TruncatedPacket {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid payload size field {raw:#x} in {kind:?} packet at offset {offset}")]
    InvalidPayloadSize {
        raw: u32,
        kind: PacketType,
        offset: usize,
    },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("acquisition rejected by the card")]
    AcquisitionRejected,

    #[error("invalid response from the card")]
    InvalidResponse,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
