//! Packet model and checksum rules
//!
//! Every packet starts with the two-word preamble, then a packet-type tag,
//! then a kind-specific body, and ends with a checksum word. The checksum is
//! the word-wise XOR of a kind-specific range:
//! - Command: the padded 58-word payload only
//! - Reply: the ack/status word, the card/param id word and the payload
//! - Data: the payload only

use serde::{Deserialize, Serialize};

use super::word::WireWord;

/// First preamble word
pub const PREAMBLE_1: u32 = 0xa5a5_a5a5;
/// Second preamble word
pub const PREAMBLE_2: u32 = 0x5a5a_5a5a;
/// Fixed physical payload slot of a command packet, in words
///
/// Commands always occupy the full slot on the wire; the size field states
/// the logical payload length inside it.
pub const CMD_PAYLOAD_WORDS: usize = 58;

/// Packet-kind tag, the third word of every packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketType {
    /// Read-block command
    CmdReadBlock,
    /// Write-block command
    CmdWriteBlock,
    /// Start-acquisition command
    CmdGo,
    /// Stop-acquisition command
    CmdStop,
    /// Reset command
    CmdReset,
    /// Reply acknowledging a command
    Reply,
    /// Acquired data frame
    Data,
}

impl PacketType {
    /// The 32-bit tag constant on the wire
    pub fn word(self) -> u32 {
        match self {
            PacketType::CmdReadBlock => 0x2020_5242,
            PacketType::CmdWriteBlock => 0x2020_5742,
            PacketType::CmdGo => 0x2020_474f,
            PacketType::CmdStop => 0x2020_5354,
            PacketType::CmdReset => 0x2020_5253,
            PacketType::Reply => 0x2020_5250,
            PacketType::Data => 0x2020_4441,
        }
    }

    /// Match a received tag word against the known constants
    pub fn from_word(word: u32) -> Option<Self> {
        match word {
            0x2020_5242 => Some(PacketType::CmdReadBlock),
            0x2020_5742 => Some(PacketType::CmdWriteBlock),
            0x2020_474f => Some(PacketType::CmdGo),
            0x2020_5354 => Some(PacketType::CmdStop),
            0x2020_5253 => Some(PacketType::CmdReset),
            0x2020_5250 => Some(PacketType::Reply),
            0x2020_4441 => Some(PacketType::Data),
            _ => None,
        }
    }
}

/// Command sub-type, the 16-bit tag a reply uses to state which command it
/// acknowledges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmdType {
    /// Read a parameter block
    ReadBlock,
    /// Write a parameter block
    WriteBlock,
    /// Start an acquisition
    Go,
    /// Stop a running acquisition
    Stop,
    /// Reset the card
    Reset,
}

impl CmdType {
    /// The 16-bit constant carried in a reply's ack word
    pub fn raw(self) -> u16 {
        match self {
            CmdType::ReadBlock => 0x5242,
            CmdType::WriteBlock => 0x5742,
            CmdType::Go => 0x474f,
            CmdType::Stop => 0x5354,
            CmdType::Reset => 0x5253,
        }
    }

    /// Match a received ack half-word against the known constants
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x5242 => Some(CmdType::ReadBlock),
            0x5742 => Some(CmdType::WriteBlock),
            0x474f => Some(CmdType::Go),
            0x5354 => Some(CmdType::Stop),
            0x5253 => Some(CmdType::Reset),
            _ => None,
        }
    }

    /// The full packet-type tag for this command kind
    pub fn packet_type(self) -> PacketType {
        match self {
            CmdType::ReadBlock => PacketType::CmdReadBlock,
            CmdType::WriteBlock => PacketType::CmdWriteBlock,
            CmdType::Go => PacketType::CmdGo,
            CmdType::Stop => PacketType::CmdStop,
            CmdType::Reset => PacketType::CmdReset,
        }
    }
}

/// OK/error half of a reply's ack word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    /// Command accepted
    Ok,
    /// Command rejected
    Error,
}

impl AckStatus {
    /// The 16-bit constant carried in a reply's ack word
    pub fn raw(self) -> u16 {
        match self {
            AckStatus::Ok => 0x4f4b,
            AckStatus::Error => 0x4552,
        }
    }

    /// Match a received status half-word against the known constants
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x4f4b => Some(AckStatus::Ok),
            0x4552 => Some(AckStatus::Error),
            _ => None,
        }
    }
}

/// Word-wise XOR over a range of wire words
pub fn xor_checksum(words: &[WireWord]) -> u32 {
    words.iter().fold(0, |acc, word| acc ^ word.value())
}

/// A command packet as seen on the receive side
///
/// Commands normally travel towards the card; one showing up in a receive
/// buffer is surfaced for logging and gets checksum validation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandPacket {
    /// Which command this is
    pub kind: CmdType,
    /// Addressed card
    pub card_id: u16,
    /// Raw parameter id from the id word
    pub param_id: u16,
    /// Logical payload length stated by the size field
    pub payload_size: usize,
    /// The full 58-word payload slot
    pub payload: Vec<WireWord>,
    /// Received checksum word
    pub checksum: u32,
}

/// A reply packet acknowledging a command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPacket {
    /// Logical payload length (raw size field minus the 3 overhead words)
    pub payload_size: usize,
    /// Which command is being acknowledged; `None` if the half-word was not
    /// a known command tag
    pub ack_type: Option<CmdType>,
    /// OK/error status; `None` if the half-word was not a known status
    pub ack_status: Option<AckStatus>,
    /// Responding card
    pub card_id: u16,
    /// Raw parameter id from the id word
    pub param_id: u16,
    /// Payload words
    pub payload: Vec<WireWord>,
    /// Received checksum word
    pub checksum: u32,
}

impl ReplyPacket {
    /// Whether the card acknowledged the command as accepted
    pub fn is_ok(&self) -> bool {
        self.ack_status == Some(AckStatus::Ok)
    }
}

/// An acquired data frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPacket {
    /// Logical payload length (raw size field minus the checksum word)
    pub payload_size: usize,
    /// Payload words
    pub payload: Vec<WireWord>,
    /// Received checksum word
    pub checksum: u32,
}

/// Any decoded packet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    /// Command direction, receive-side logging only
    Command(CommandPacket),
    /// Acknowledgement of a command
    Reply(ReplyPacket),
    /// Acquired data frame
    Data(DataPacket),
}

impl Packet {
    /// Borrow the reply, if this is one
    pub fn as_reply(&self) -> Option<&ReplyPacket> {
        match self {
            Packet::Reply(reply) => Some(reply),
            _ => None,
        }
    }

    /// Borrow the data frame, if this is one
    pub fn as_data(&self) -> Option<&DataPacket> {
        match self {
            Packet::Data(data) => Some(data),
            _ => None,
        }
    }
}
