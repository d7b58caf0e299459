//! Serial protocol for the acquisition card
//!
//! Implements the word-oriented command/response protocol: 32-bit words
//! with a byte-swapped link representation, a two-word preamble in front of
//! every packet, a packet-type tag, and an XOR checksum. One command can be
//! answered by a reply followed by a chain of data frames, all delivered in
//! a single receive buffer.

pub mod decoder;
pub mod encoder;
mod error;
pub mod packet;
pub mod params;
mod serial;
mod session;
mod word;

pub use decoder::{decode_stream, DecodedPacket, PacketStatus, StreamDecode};
pub use encoder::{
    encode_command, encode_go, encode_read, encode_reset, encode_stop, encode_write,
    CMD_TOTAL_WORDS,
};
pub use error::ProtocolError;
pub use packet::{
    xor_checksum, AckStatus, CmdType, CommandPacket, DataPacket, Packet, PacketType, ReplyPacket,
    CMD_PAYLOAD_WORDS, PREAMBLE_1, PREAMBLE_2,
};
pub use params::ParamId;
pub use serial::{list_ports, LinkConfig, PortInfo, SerialLink};
pub use session::{AcquisitionOutcome, Session, Transport};
pub use word::WireWord;

/// Default baud rate of the card's UART link
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Default receive timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Card identifier used when a single card is attached
pub const DEFAULT_CARD_ID: u16 = 0xffff;
