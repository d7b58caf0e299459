//! # acqlink Core Library
//!
//! Protocol engine and session logic for controlling an FPGA data-acquisition
//! card over a byte-oriented serial link.
//!
//! This library provides:
//! - The wire word codec (hex-text words with a byte-swapped link form)
//! - The parameter registry of the card's firmware register map
//! - Packet encoding/decoding with preamble framing and XOR checksums
//! - A synchronous acquisition session over an owned serial transport
//! - CSV export of acquired data frames
//!
//! ## Example
//!
//! ```rust,ignore
//! use acqlink_core::protocol::{LinkConfig, ParamId, SerialLink, Session};
//!
//! let link = SerialLink::open(LinkConfig {
//!     port_name: "/dev/ttyUSB0".into(),
//!     ..LinkConfig::default()
//! })?;
//! let mut session = Session::new(link);
//!
//! // Configure the card, then trigger an acquisition
//! session.write_param(ParamId::NumRows, &[33])?;
//! let outcome = session.start_acquisition()?;
//! println!("got {} frames", outcome.frames.len());
//! ```

#![warn(missing_docs)]

pub mod export;
pub mod protocol;

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::export::write_frames_csv;
    pub use crate::protocol::{
        decode_stream, AcquisitionOutcome, DataPacket, LinkConfig, Packet, ParamId, ProtocolError,
        ReplyPacket, SerialLink, Session, Transport, WireWord,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
