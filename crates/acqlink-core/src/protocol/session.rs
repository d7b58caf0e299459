//! Card session
//!
//! Owns the transport handle and drives one command/response exchange at a
//! time: encode, transmit word by word, one blocking receive bounded by the
//! timeout, decode, hand the packets to the caller. The model is strictly
//! synchronous; there are no retries and no re-issued commands.

use std::time::Duration;

use tracing::debug;

use super::decoder::{decode_stream, DecodedPacket, PacketStatus};
use super::encoder::{encode_go, encode_read, encode_reset, encode_stop, encode_write};
use super::packet::{DataPacket, Packet, ReplyPacket};
use super::params::ParamId;
use super::word::WireWord;
use super::{ProtocolError, DEFAULT_CARD_ID, DEFAULT_TIMEOUT_MS};

/// Word-granular transport carrying link words to and from the card
pub trait Transport {
    /// Send one word
    fn write_word(&mut self, word: WireWord) -> Result<(), ProtocolError>;

    /// Blocking receive of everything the card sends within the timeout
    fn read_raw_words(&mut self, timeout: Duration) -> Result<Vec<WireWord>, ProtocolError>;
}

/// Result of one acquisition exchange
#[derive(Debug)]
pub struct AcquisitionOutcome {
    /// The reply acknowledging the GO command
    pub reply: ReplyPacket,
    /// Data frames in arrival order
    pub frames: Vec<DataPacket>,
    /// Error that stopped the drain early, if any; `frames` then holds the
    /// partial result up to that point
    pub aborted: Option<ProtocolError>,
}

/// One card session over an owned transport
pub struct Session<T: Transport> {
    transport: T,
    card_id: u16,
    timeout: Duration,
}

impl<T: Transport> Session<T> {
    /// Create a session over the given transport with default card id and
    /// timeout
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            card_id: DEFAULT_CARD_ID,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Address a specific card
    pub fn with_card_id(mut self, card_id: u16) -> Self {
        self.card_id = card_id;
        self
    }

    /// Override the receive timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Read a parameter block from the card
    pub fn read_param(&mut self, param: ParamId) -> Result<ReplyPacket, ProtocolError> {
        debug!(?param, card_id = self.card_id, "read parameter");
        let words = encode_read(self.card_id, param)?;
        self.exchange(&words)
    }

    /// Write a parameter block to the card
    pub fn write_param(
        &mut self,
        param: ParamId,
        values: &[u32],
    ) -> Result<ReplyPacket, ProtocolError> {
        debug!(?param, count = values.len(), card_id = self.card_id, "write parameter");
        let words = encode_write(self.card_id, param, values)?;
        self.exchange(&words)
    }

    /// Stop a running acquisition
    pub fn stop(&mut self) -> Result<ReplyPacket, ProtocolError> {
        debug!(card_id = self.card_id, "stop acquisition");
        let words = encode_stop(self.card_id)?;
        self.exchange(&words)
    }

    /// Reset the card
    pub fn reset(&mut self) -> Result<ReplyPacket, ProtocolError> {
        debug!(card_id = self.card_id, "reset card");
        let words = encode_reset(self.card_id)?;
        self.exchange(&words)
    }

    /// Trigger an acquisition and drain the reply/data chain
    ///
    /// Sends GO, receives one raw buffer, and walks the decoded packet
    /// sequence: the first packet must be a valid OK reply or the whole
    /// exchange is `AcquisitionRejected`; every following valid data frame
    /// is collected in arrival order. The first checksum mismatch stops the
    /// drain and is surfaced in [`AcquisitionOutcome::aborted`] alongside
    /// the frames collected so far.
    pub fn start_acquisition(&mut self) -> Result<AcquisitionOutcome, ProtocolError> {
        debug!(card_id = self.card_id, "start acquisition");
        let words = encode_go(self.card_id)?;
        self.send_words(&words)?;

        let received = self.transport.read_raw_words(self.timeout)?;
        let decoded = decode_stream(&received);
        let mut packets = decoded.packets.into_iter();

        let reply = match packets.next() {
            Some(DecodedPacket {
                packet: Packet::Reply(reply),
                status: PacketStatus::Valid,
                ..
            }) if reply.is_ok() => reply,
            _ => return Err(ProtocolError::AcquisitionRejected),
        };

        let mut frames = Vec::new();
        let mut aborted = None;
        for decoded_packet in packets {
            match decoded_packet.status {
                PacketStatus::Valid => {
                    if let Packet::Data(data) = decoded_packet.packet {
                        frames.push(data);
                    }
                }
                PacketStatus::ChecksumMismatch { expected, actual } => {
                    aborted = Some(ProtocolError::ChecksumMismatch { expected, actual });
                    break;
                }
            }
        }

        debug!(
            frames = frames.len(),
            aborted = aborted.is_some(),
            "acquisition drained"
        );
        Ok(AcquisitionOutcome {
            reply,
            frames,
            aborted,
        })
    }

    fn send_words(&mut self, words: &[WireWord]) -> Result<(), ProtocolError> {
        for &word in words {
            self.transport.write_word(word)?;
        }
        Ok(())
    }

    /// Send one command and require a single valid reply back
    fn exchange(&mut self, words: &[WireWord]) -> Result<ReplyPacket, ProtocolError> {
        self.send_words(words)?;
        let received = self.transport.read_raw_words(self.timeout)?;
        let decoded = decode_stream(&received);
        match decoded.packets.into_iter().next() {
            Some(DecodedPacket {
                packet: Packet::Reply(reply),
                status: PacketStatus::Valid,
                ..
            }) => Ok(reply),
            Some(DecodedPacket {
                status: PacketStatus::ChecksumMismatch { expected, actual },
                ..
            }) => Err(ProtocolError::ChecksumMismatch { expected, actual }),
            _ => Err(ProtocolError::InvalidResponse),
        }
    }
}
