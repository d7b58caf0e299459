//! Packet encoder
//!
//! Builds the wire-word sequence for one command: preamble, tag, card/param
//! id word, size word, payload zero-padded to the fixed 58-word slot, and
//! the checksum over the padded slot. Encoding is deterministic.

use super::packet::{xor_checksum, CmdType, CMD_PAYLOAD_WORDS, PREAMBLE_1, PREAMBLE_2};
use super::params::ParamId;
use super::word::WireWord;
use super::ProtocolError;

/// Words in a fully encoded command: preamble, tag, id, size, slot, checksum
pub const CMD_TOTAL_WORDS: usize = 5 + CMD_PAYLOAD_WORDS + 1;

/// Build the full wire-word sequence for one command
///
/// The size word carries the logical payload length; the payload slot is
/// always padded to [`CMD_PAYLOAD_WORDS`] with zero words. Fails with
/// `PayloadTooLarge` if the payload does not fit the slot.
pub fn encode_command(
    kind: CmdType,
    card_id: u16,
    param_id: u16,
    payload: &[WireWord],
) -> Result<Vec<WireWord>, ProtocolError> {
    if payload.len() > CMD_PAYLOAD_WORDS {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: CMD_PAYLOAD_WORDS,
        });
    }

    let mut words = Vec::with_capacity(CMD_TOTAL_WORDS);
    words.push(WireWord::new(PREAMBLE_1));
    words.push(WireWord::new(PREAMBLE_2));
    words.push(WireWord::new(kind.packet_type().word()));
    words.push(WireWord::new((card_id as u32) << 16 | param_id as u32));
    words.push(WireWord::new(payload.len() as u32));
    words.extend_from_slice(payload);
    words.resize(5 + CMD_PAYLOAD_WORDS, WireWord::new(0));
    words.push(WireWord::new(xor_checksum(&words[5..])));
    Ok(words)
}

/// Read-parameter command: the slot travels zeroed, full length declared
pub fn encode_read(card_id: u16, param: ParamId) -> Result<Vec<WireWord>, ProtocolError> {
    let payload = vec![WireWord::new(0); CMD_PAYLOAD_WORDS];
    encode_command(CmdType::ReadBlock, card_id, param.raw(), &payload)
}

/// Write-parameter command, one value per payload word
///
/// Fails with `WrongValueCount` unless the value count matches the
/// registry's word count for the parameter.
pub fn encode_write(
    card_id: u16,
    param: ParamId,
    values: &[u32],
) -> Result<Vec<WireWord>, ProtocolError> {
    let expected = param.word_count();
    if values.len() != expected {
        return Err(ProtocolError::WrongValueCount {
            param,
            got: values.len(),
            expected,
        });
    }
    let payload: Vec<WireWord> = values.iter().map(|&v| WireWord::new(v)).collect();
    encode_command(CmdType::WriteBlock, card_id, param.raw(), &payload)
}

/// Start-acquisition command: GO on the return-data parameter with the
/// "return data" flag set
pub fn encode_go(card_id: u16) -> Result<Vec<WireWord>, ProtocolError> {
    encode_command(CmdType::Go, card_id, ParamId::RetData.raw(), &[WireWord::new(1)])
}

/// Stop-acquisition command
pub fn encode_stop(card_id: u16) -> Result<Vec<WireWord>, ProtocolError> {
    encode_command(CmdType::Stop, card_id, ParamId::RetData.raw(), &[])
}

/// Reset command
pub fn encode_reset(card_id: u16) -> Result<Vec<WireWord>, ProtocolError> {
    encode_command(CmdType::Reset, card_id, ParamId::RetData.raw(), &[])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::protocol::packet::PacketType;

    #[test]
    fn test_write_command_layout() {
        let words = encode_write(0x00ff, ParamId::CnvLen, &[1]).unwrap();

        assert_eq!(words.len(), CMD_TOTAL_WORDS);
        assert_eq!(words[0].value(), PREAMBLE_1);
        assert_eq!(words[1].value(), PREAMBLE_2);
        assert_eq!(words[2].value(), PacketType::CmdWriteBlock.word());
        assert_eq!(words[3].value(), 0x00ff_00fc);
        assert_eq!(words[4].value(), 1);
        assert_eq!(words[5].value(), 1);
        for word in &words[6..5 + CMD_PAYLOAD_WORDS] {
            assert_eq!(word.value(), 0);
        }
        // checksum of the padded slot: a single 1 among zeros
        assert_eq!(words[CMD_TOTAL_WORDS - 1].value(), 1);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_write(0x00ff, ParamId::CnvLen, &[1]).unwrap();
        let b = encode_write(0x00ff, ParamId::CnvLen, &[1]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_read_command_declares_full_slot() {
        let words = encode_read(0xffff, ParamId::RowLen).unwrap();
        assert_eq!(words.len(), CMD_TOTAL_WORDS);
        assert_eq!(words[2].value(), PacketType::CmdReadBlock.word());
        assert_eq!(words[4].value(), CMD_PAYLOAD_WORDS as u32);
        assert_eq!(words[CMD_TOTAL_WORDS - 1].value(), 0);
    }

    #[test]
    fn test_go_command_sets_return_data_flag() {
        let words = encode_go(0xffff).unwrap();
        assert_eq!(words[2].value(), PacketType::CmdGo.word());
        assert_eq!(words[3].value(), 0xffff_0016);
        assert_eq!(words[4].value(), 1);
        assert_eq!(words[5].value(), 1);
    }

    #[test]
    fn test_payload_too_large() {
        let oversized = vec![WireWord::new(0); CMD_PAYLOAD_WORDS + 1];
        assert!(matches!(
            encode_command(CmdType::Go, 0xffff, 0x0016, &oversized),
            Err(ProtocolError::PayloadTooLarge { len: 59, max: 58 })
        ));
    }

    #[test]
    fn test_wrong_value_count() {
        assert!(matches!(
            encode_write(0xffff, ParamId::Bias, &[1, 2]),
            Err(ProtocolError::WrongValueCount {
                param: ParamId::Bias,
                got: 2,
                expected: 4,
            })
        ));
    }
}
