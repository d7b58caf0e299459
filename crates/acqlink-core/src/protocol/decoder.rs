//! Packet decoder
//!
//! Takes one raw receive buffer (an ordered word sequence) and splits it
//! into a sequence of packets: seek the two-word preamble, dispatch on the
//! tag word, slice the kind-specific body, verify the checksum, emit, and
//! re-seek after the consumed words. One receive operation can therefore
//! yield a reply followed by any number of data frames.
//!
//! The decoder is a pure function over an immutable buffer. An unknown tag
//! advances the cursor by a single word and re-seeks, so junk between
//! packets never poisons the packets around it; a checksum mismatch is
//! attached to the offending packet without aborting its siblings.

use tracing::{debug, trace};

use super::packet::{
    xor_checksum, AckStatus, CmdType, CommandPacket, DataPacket, Packet, PacketType, ReplyPacket,
    CMD_PAYLOAD_WORDS, PREAMBLE_1, PREAMBLE_2,
};
use super::word::WireWord;
use super::ProtocolError;

/// Words of overhead counted in a reply's raw size field: the ack word, the
/// id word and the checksum word
const REPLY_SIZE_OVERHEAD: usize = 3;
/// Words of overhead counted in a data packet's raw size field: the
/// checksum word
const DATA_SIZE_OVERHEAD: usize = 1;

/// Validity tag attached to each decoded packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    /// Checksum verified
    Valid,
    /// Received checksum does not match the computed one
    ChecksumMismatch {
        /// Checksum computed over the packet's checksum range
        expected: u32,
        /// Checksum word actually received
        actual: u32,
    },
}

/// One packet lifted out of the word stream
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    /// The decoded packet
    pub packet: Packet,
    /// Words this packet consumed, preamble through checksum; the caller
    /// advances its cursor by this much to reach the next packet
    pub total_words: usize,
    /// Checksum verdict
    pub status: PacketStatus,
}

impl DecodedPacket {
    /// Whether the checksum verified
    pub fn is_valid(&self) -> bool {
        self.status == PacketStatus::Valid
    }
}

/// Everything one receive buffer decoded into
#[derive(Debug, Default)]
pub struct StreamDecode {
    /// Packets in wire order
    pub packets: Vec<DecodedPacket>,
    /// Problems encountered between and inside packets
    pub diagnostics: Vec<ProtocolError>,
}

/// Decode a whole receive buffer into its packet sequence
pub fn decode_stream(words: &[WireWord]) -> StreamDecode {
    let mut out = StreamDecode::default();
    let mut cursor = 0usize;

    while cursor < words.len() || words.is_empty() {
        let Some(start) = seek_preamble(words, cursor) else {
            out.diagnostics.push(ProtocolError::NoPreambleFound(cursor));
            break;
        };
        if start > cursor {
            trace!(skipped = start - cursor, "words skipped before preamble");
        }

        match decode_packet(words, start) {
            Ok(decoded) => {
                trace!(
                    total_words = decoded.total_words,
                    valid = decoded.is_valid(),
                    "packet decoded"
                );
                cursor = start + decoded.total_words;
                out.packets.push(decoded);
            }
            Err(err) => {
                debug!(%err, "packet decode failed");
                let truncated = matches!(err, ProtocolError::TruncatedPacket { .. });
                out.diagnostics.push(err);
                if truncated {
                    // nothing decodable left in this buffer
                    break;
                }
                // conservative resynchronization: one word forward, re-seek
                cursor = start + 1;
            }
        }
    }

    out
}

/// Find the next position where both preamble words appear back to back
fn seek_preamble(words: &[WireWord], from: usize) -> Option<usize> {
    if words.len() < 2 {
        return None;
    }
    (from..words.len() - 1).find(|&i| {
        words[i].value() == PREAMBLE_1 && words[i + 1].value() == PREAMBLE_2
    })
}

fn decode_packet(words: &[WireWord], start: usize) -> Result<DecodedPacket, ProtocolError> {
    let tag_word = words
        .get(start + 2)
        .ok_or(ProtocolError::TruncatedPacket {
            offset: start,
            needed: 3,
            available: words.len() - start,
        })?
        .value();
    let kind = PacketType::from_word(tag_word).ok_or(ProtocolError::UnknownPacketType {
        word: tag_word,
        offset: start + 2,
    })?;

    match kind {
        PacketType::CmdReadBlock => decode_command(words, start, CmdType::ReadBlock),
        PacketType::CmdWriteBlock => decode_command(words, start, CmdType::WriteBlock),
        PacketType::CmdGo => decode_command(words, start, CmdType::Go),
        PacketType::CmdStop => decode_command(words, start, CmdType::Stop),
        PacketType::CmdReset => decode_command(words, start, CmdType::Reset),
        PacketType::Reply => decode_reply(words, start),
        PacketType::Data => decode_data(words, start),
    }
}

/// Check that `total` words are available from `start`
fn require(words: &[WireWord], start: usize, total: usize) -> Result<(), ProtocolError> {
    let available = words.len() - start;
    if available < total {
        return Err(ProtocolError::TruncatedPacket {
            offset: start,
            needed: total,
            available,
        });
    }
    Ok(())
}

fn checksum_status(received: u32, range: &[WireWord]) -> PacketStatus {
    let expected = xor_checksum(range);
    if expected == received {
        PacketStatus::Valid
    } else {
        PacketStatus::ChecksumMismatch {
            expected,
            actual: received,
        }
    }
}

/// Commands occupy a fixed slot: id, size, 58 payload words, checksum.
/// Receive-side commands are surfaced for logging, so validation stops at
/// the checksum.
fn decode_command(
    words: &[WireWord],
    start: usize,
    kind: CmdType,
) -> Result<DecodedPacket, ProtocolError> {
    let total = 5 + CMD_PAYLOAD_WORDS + 1;
    require(words, start, total)?;

    let id_word = words[start + 3].value();
    let size_raw = words[start + 4].value();
    if size_raw as usize > CMD_PAYLOAD_WORDS {
        return Err(ProtocolError::InvalidPayloadSize {
            raw: size_raw,
            kind: kind.packet_type(),
            offset: start,
        });
    }

    let payload = words[start + 5..start + 5 + CMD_PAYLOAD_WORDS].to_vec();
    let checksum = words[start + 5 + CMD_PAYLOAD_WORDS].value();
    let status = checksum_status(checksum, &payload);

    Ok(DecodedPacket {
        packet: Packet::Command(CommandPacket {
            kind,
            card_id: (id_word >> 16) as u16,
            param_id: id_word as u16,
            payload_size: size_raw as usize,
            payload,
            checksum,
        }),
        total_words: total,
        status,
    })
}

/// Reply body: size, ack/status word, id word, payload, checksum. The raw
/// size field counts the ack, id and checksum words, so the logical payload
/// length is raw minus 3; the checksum covers ack word through payload.
fn decode_reply(words: &[WireWord], start: usize) -> Result<DecodedPacket, ProtocolError> {
    require(words, start, 4)?;
    let size_raw = words[start + 3].value();
    let payload_len = (size_raw as usize).checked_sub(REPLY_SIZE_OVERHEAD).ok_or(
        ProtocolError::InvalidPayloadSize {
            raw: size_raw,
            kind: PacketType::Reply,
            offset: start,
        },
    )?;
    let total = 7 + payload_len;
    require(words, start, total)?;

    let ack_word = words[start + 4].value();
    let id_word = words[start + 5].value();
    let payload = words[start + 6..start + 6 + payload_len].to_vec();
    let checksum = words[start + 6 + payload_len].value();
    let status = checksum_status(checksum, &words[start + 4..start + 6 + payload_len]);

    Ok(DecodedPacket {
        packet: Packet::Reply(ReplyPacket {
            payload_size: payload_len,
            ack_type: CmdType::from_raw((ack_word >> 16) as u16),
            ack_status: AckStatus::from_raw(ack_word as u16),
            card_id: (id_word >> 16) as u16,
            param_id: id_word as u16,
            payload,
            checksum,
        }),
        total_words: total,
        status,
    })
}

/// Data body: size, payload, checksum. The raw size field counts the
/// checksum word, so the logical payload length is raw minus 1; the
/// checksum covers the payload only.
fn decode_data(words: &[WireWord], start: usize) -> Result<DecodedPacket, ProtocolError> {
    require(words, start, 4)?;
    let size_raw = words[start + 3].value();
    let payload_len = (size_raw as usize).checked_sub(DATA_SIZE_OVERHEAD).ok_or(
        ProtocolError::InvalidPayloadSize {
            raw: size_raw,
            kind: PacketType::Data,
            offset: start,
        },
    )?;
    let total = 5 + payload_len;
    require(words, start, total)?;

    let payload = words[start + 4..start + 4 + payload_len].to_vec();
    let checksum = words[start + 4 + payload_len].value();
    let status = checksum_status(checksum, &payload);

    Ok(DecodedPacket {
        packet: Packet::Data(DataPacket {
            payload_size: payload_len,
            payload,
            checksum,
        }),
        total_words: total,
        status,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::protocol::encoder::{encode_go, CMD_TOTAL_WORDS};

    fn w(value: u32) -> WireWord {
        WireWord::new(value)
    }

    /// A well-formed reply acknowledging GO on RET_DATA with the given payload
    fn reply_words(payload: &[u32]) -> Vec<WireWord> {
        let mut words = vec![w(PREAMBLE_1), w(PREAMBLE_2), w(PacketType::Reply.word())];
        words.push(w((payload.len() + REPLY_SIZE_OVERHEAD) as u32));
        words.push(w(0x474f_4f4b)); // GO, OK
        words.push(w(0xffff_0016));
        words.extend(payload.iter().map(|&v| w(v)));
        words.push(w(xor_checksum(&words[4..])));
        words
    }

    /// A well-formed data frame with the given payload
    fn data_words(payload: &[u32]) -> Vec<WireWord> {
        let mut words = vec![w(PREAMBLE_1), w(PREAMBLE_2), w(PacketType::Data.word())];
        words.push(w((payload.len() + DATA_SIZE_OVERHEAD) as u32));
        words.extend(payload.iter().map(|&v| w(v)));
        words.push(w(xor_checksum(&words[4..])));
        words
    }

    #[test]
    fn test_single_data_packet() {
        let buffer = data_words(&[0x10, 0x20, 0x30, 0x40]);
        let decoded = decode_stream(&buffer);

        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.packets.len(), 1);
        let packet = &decoded.packets[0];
        assert!(packet.is_valid());
        assert_eq!(packet.total_words, 9);
        let data = packet.packet.as_data().expect("should be a data packet");
        assert_eq!(data.payload_size, 4);
        assert_eq!(data.payload, [w(0x10), w(0x20), w(0x30), w(0x40)]);
    }

    #[test]
    fn test_size_field_translation() {
        // REPLY raw size 0x09 -> logical payload 6
        let buffer = reply_words(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer[3].value(), 0x09);
        let decoded = decode_stream(&buffer);
        let reply = decoded.packets[0].packet.as_reply().unwrap();
        assert_eq!(reply.payload_size, 6);

        // DATA raw size 0x05 -> logical payload 4
        let buffer = data_words(&[1, 2, 3, 4]);
        assert_eq!(buffer[3].value(), 0x05);
        let decoded = decode_stream(&buffer);
        let data = decoded.packets[0].packet.as_data().unwrap();
        assert_eq!(data.payload_size, 4);
    }

    #[test]
    fn test_resynchronization_past_leading_junk() {
        let mut buffer = vec![w(0x11111111), w(0x22222222), w(0x33333333)];
        buffer.extend(data_words(&[7, 8, 9]));
        let decoded = decode_stream(&buffer);

        assert_eq!(decoded.packets.len(), 1);
        assert!(decoded.packets[0].is_valid());
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_multi_packet_drain() {
        let mut buffer = reply_words(&[0xa, 0xb, 0xc, 0xd]);
        let reply_total = buffer.len();
        buffer.extend(data_words(&[1, 2, 3, 4]));

        let decoded = decode_stream(&buffer);
        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.packets.len(), 2);
        assert_eq!(decoded.packets[0].total_words, reply_total);
        assert_eq!(decoded.packets[0].total_words, 11);
        assert_eq!(decoded.packets[1].total_words, 9);
        assert!(decoded.packets[0].packet.as_reply().is_some());
        assert!(decoded.packets[1].packet.as_data().is_some());
    }

    #[test]
    fn test_checksum_failure_is_isolated() {
        let mut buffer = reply_words(&[0xa, 0xb, 0xc, 0xd]);
        buffer.extend(data_words(&[1, 2, 3, 4]));
        // corrupt one payload word of the second packet
        let corrupt_at = 11 + 5;
        buffer[corrupt_at] = w(buffer[corrupt_at].value() ^ 0xff);

        let decoded = decode_stream(&buffer);
        assert_eq!(decoded.packets.len(), 2);
        assert!(decoded.packets[0].is_valid());
        assert!(matches!(
            decoded.packets[1].status,
            PacketStatus::ChecksumMismatch { .. }
        ));
        // the mismatch still consumed the full packet
        assert_eq!(decoded.packets[1].total_words, 9);
    }

    #[test]
    fn test_unknown_tag_resynchronizes() {
        // a fake packet start with an unrecognized tag, then a real frame
        let mut buffer = vec![w(PREAMBLE_1), w(PREAMBLE_2), w(0xdeadbeef)];
        buffer.extend(data_words(&[5, 6]));

        let decoded = decode_stream(&buffer);
        assert_eq!(decoded.packets.len(), 1);
        assert!(decoded.packets[0].is_valid());
        assert_eq!(decoded.diagnostics.len(), 1);
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::UnknownPacketType {
                word: 0xdeadbeef,
                offset: 2,
            }
        ));
    }

    #[test]
    fn test_invalid_reply_size_field() {
        // raw size 2 is below the 3-word overhead
        let buffer = vec![
            w(PREAMBLE_1),
            w(PREAMBLE_2),
            w(PacketType::Reply.word()),
            w(2),
            w(0),
            w(0),
            w(0),
        ];
        let decoded = decode_stream(&buffer);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::InvalidPayloadSize {
                raw: 2,
                kind: PacketType::Reply,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_command_size_field() {
        // raw size 59 exceeds the 58-word payload slot
        let mut buffer = encode_go(0xffff).unwrap();
        buffer[4] = w(59);

        let decoded = decode_stream(&buffer);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::InvalidPayloadSize {
                raw: 59,
                kind: PacketType::CmdGo,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_data_size_field() {
        // raw size 0 is below the 1-word overhead
        let buffer = vec![
            w(PREAMBLE_1),
            w(PREAMBLE_2),
            w(PacketType::Data.word()),
            w(0),
            w(0),
        ];
        let decoded = decode_stream(&buffer);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::InvalidPayloadSize {
                raw: 0,
                kind: PacketType::Data,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_packet() {
        let mut buffer = data_words(&[1, 2, 3, 4]);
        buffer.truncate(6);
        let decoded = decode_stream(&buffer);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::TruncatedPacket { .. }
        ));
    }

    #[test]
    fn test_no_preamble_in_junk() {
        let buffer = vec![w(1), w(2), w(3)];
        let decoded = decode_stream(&buffer);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::NoPreambleFound(0)
        ));
    }

    #[test]
    fn test_empty_buffer_reports_no_preamble() {
        let decoded = decode_stream(&[]);
        assert!(decoded.packets.is_empty());
        assert!(matches!(
            decoded.diagnostics[0],
            ProtocolError::NoPreambleFound(0)
        ));
    }

    #[test]
    fn test_encoded_command_decodes_back() {
        let buffer = encode_go(0xffff).unwrap();
        let decoded = decode_stream(&buffer);

        assert_eq!(decoded.packets.len(), 1);
        let packet = &decoded.packets[0];
        assert!(packet.is_valid());
        assert_eq!(packet.total_words, CMD_TOTAL_WORDS);
        match &packet.packet {
            Packet::Command(cmd) => {
                assert_eq!(cmd.kind, CmdType::Go);
                assert_eq!(cmd.card_id, 0xffff);
                assert_eq!(cmd.param_id, 0x0016);
                assert_eq!(cmd.payload_size, 1);
                assert_eq!(cmd.payload.len(), CMD_PAYLOAD_WORDS);
            }
            other => panic!("expected a command packet, got {other:?}"),
        }
    }
}
