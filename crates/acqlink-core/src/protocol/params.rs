//! Parameter registry
//!
//! Fixed mapping from parameter id to the number of payload words it
//! carries, taken from the card firmware's register map. The encoder uses it
//! to validate write payload lengths; the CLI uses it to tell the operator
//! how many values a parameter expects.

use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Identifier of a card parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ParamId {
    /// Row multiplexing order
    RowOrder = 0x0001,
    /// Per-row on bias levels
    OnBias = 0x0002,
    /// Per-row off bias levels
    OffBias = 0x0003,
    /// Series-array bias
    SaBias = 0x0010,
    /// Filter reset
    FltrRst = 0x0014,
    /// Return-data flag, the parameter a GO command drives
    RetData = 0x0016,
    /// Data mode selection
    DataMode = 0x0017,
    /// Digital filter coefficients
    FiltrCoeff = 0x001a,
    /// Servo loop mode
    ServoMode = 0x001b,
    /// Ramp delay
    RampDly = 0x001c,
    /// Ramp amplitude
    RampAmp = 0x001d,
    /// Ramp step size
    RampStep = 0x001e,
    /// Bias levels
    Bias = 0x0021,
    /// Row dwell length
    RowLen = 0x0030,
    /// Number of multiplexed rows
    NumRows = 0x0031,
    /// ADC sample delay
    SampleDly = 0x0032,
    /// Samples per row
    SampleNum = 0x0033,
    /// Feedback delay
    FbDly = 0x0034,
    /// Return-data size
    RetDataS = 0x0053,
    /// ADC offset, channel 0
    AdcOffset0 = 0x0068,
    /// ADC offset, channel 1
    AdcOffset1 = 0x0069,
    /// Gain, channel 0
    Gain0 = 0x0078,
    /// Gain, channel 1
    Gain1 = 0x0079,
    /// Output data rate
    DataRate = 0x00a0,
    /// Number of reported columns
    NumColsRep = 0x00ad,
    /// Series-array feedback
    SaFb = 0x00f9,
    /// First-stage SQUID bias
    Sq1Bias = 0x00fa,
    /// First-stage SQUID feedback
    Sq1Fb = 0x00fb,
    /// ADC conversion length
    CnvLen = 0x00fc,
    /// Serial clock delay
    SckDly = 0x00fd,
    /// Serial clock half period
    SckHalfPeriod = 0x00fe,
}

impl ParamId {
    /// All known parameters, in register-map order
    pub const ALL: [ParamId; 31] = [
        ParamId::RowOrder,
        ParamId::OnBias,
        ParamId::OffBias,
        ParamId::SaBias,
        ParamId::FltrRst,
        ParamId::RetData,
        ParamId::DataMode,
        ParamId::FiltrCoeff,
        ParamId::ServoMode,
        ParamId::RampDly,
        ParamId::RampAmp,
        ParamId::RampStep,
        ParamId::Bias,
        ParamId::RowLen,
        ParamId::NumRows,
        ParamId::SampleDly,
        ParamId::SampleNum,
        ParamId::FbDly,
        ParamId::RetDataS,
        ParamId::AdcOffset0,
        ParamId::AdcOffset1,
        ParamId::Gain0,
        ParamId::Gain1,
        ParamId::DataRate,
        ParamId::NumColsRep,
        ParamId::SaFb,
        ParamId::Sq1Bias,
        ParamId::Sq1Fb,
        ParamId::CnvLen,
        ParamId::SckDly,
        ParamId::SckHalfPeriod,
    ];

    /// Raw 16-bit id as carried in the card/param word
    pub fn raw(self) -> u16 {
        self as u16
    }

    /// Look up a parameter by its raw id
    pub fn from_raw(raw: u16) -> Result<Self, ProtocolError> {
        match raw {
            0x0001 => Ok(ParamId::RowOrder),
            0x0002 => Ok(ParamId::OnBias),
            0x0003 => Ok(ParamId::OffBias),
            0x0010 => Ok(ParamId::SaBias),
            0x0014 => Ok(ParamId::FltrRst),
            0x0016 => Ok(ParamId::RetData),
            0x0017 => Ok(ParamId::DataMode),
            0x001a => Ok(ParamId::FiltrCoeff),
            0x001b => Ok(ParamId::ServoMode),
            0x001c => Ok(ParamId::RampDly),
            0x001d => Ok(ParamId::RampAmp),
            0x001e => Ok(ParamId::RampStep),
            0x0021 => Ok(ParamId::Bias),
            0x0030 => Ok(ParamId::RowLen),
            0x0031 => Ok(ParamId::NumRows),
            0x0032 => Ok(ParamId::SampleDly),
            0x0033 => Ok(ParamId::SampleNum),
            0x0034 => Ok(ParamId::FbDly),
            0x0053 => Ok(ParamId::RetDataS),
            0x0068 => Ok(ParamId::AdcOffset0),
            0x0069 => Ok(ParamId::AdcOffset1),
            0x0078 => Ok(ParamId::Gain0),
            0x0079 => Ok(ParamId::Gain1),
            0x00a0 => Ok(ParamId::DataRate),
            0x00ad => Ok(ParamId::NumColsRep),
            0x00f9 => Ok(ParamId::SaFb),
            0x00fa => Ok(ParamId::Sq1Bias),
            0x00fb => Ok(ParamId::Sq1Fb),
            0x00fc => Ok(ParamId::CnvLen),
            0x00fd => Ok(ParamId::SckDly),
            0x00fe => Ok(ParamId::SckHalfPeriod),
            other => Err(ProtocolError::UnknownParameter(other)),
        }
    }

    /// Number of payload words this parameter carries
    pub fn word_count(self) -> usize {
        match self {
            ParamId::RowOrder
            | ParamId::OnBias
            | ParamId::OffBias
            | ParamId::AdcOffset0
            | ParamId::AdcOffset1
            | ParamId::Gain0
            | ParamId::Gain1 => 12,
            ParamId::FiltrCoeff => 6,
            ParamId::Bias => 4,
            ParamId::SaBias
            | ParamId::ServoMode
            | ParamId::RetDataS
            | ParamId::SaFb
            | ParamId::Sq1Bias
            | ParamId::Sq1Fb => 2,
            ParamId::FltrRst
            | ParamId::RetData
            | ParamId::DataMode
            | ParamId::RampDly
            | ParamId::RampAmp
            | ParamId::RampStep
            | ParamId::RowLen
            | ParamId::NumRows
            | ParamId::SampleDly
            | ParamId::SampleNum
            | ParamId::FbDly
            | ParamId::DataRate
            | ParamId::NumColsRep
            | ParamId::CnvLen
            | ParamId::SckDly
            | ParamId::SckHalfPeriod => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_raw_roundtrip_for_all_params() {
        for param in ParamId::ALL {
            assert_eq!(ParamId::from_raw(param.raw()).unwrap(), param);
        }
    }

    #[test]
    fn test_unknown_parameter() {
        assert!(matches!(
            ParamId::from_raw(0x1234),
            Err(ProtocolError::UnknownParameter(0x1234))
        ));
    }

    #[test]
    fn test_word_counts() {
        assert_eq!(ParamId::RowOrder.word_count(), 12);
        assert_eq!(ParamId::FiltrCoeff.word_count(), 6);
        assert_eq!(ParamId::Bias.word_count(), 4);
        assert_eq!(ParamId::ServoMode.word_count(), 2);
        assert_eq!(ParamId::CnvLen.word_count(), 1);
        assert_eq!(ParamId::RetData.word_count(), 1);
    }
}
