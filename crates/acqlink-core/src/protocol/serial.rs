//! Serial link to the card
//!
//! Word-granular transport over a serial port. The card's UART runs 8 data
//! bits, even parity, one stop bit; every 32-bit word crosses the link as 4
//! raw bytes in reversed byte order (see [`WireWord`]).

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use tracing::{debug, trace, warn};

use super::session::Transport;
use super::word::WireWord;
use super::{ProtocolError, DEFAULT_BAUD_RATE};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM4")
    pub name: String,
    /// Manufacturer name (if a USB device)
    pub manufacturer: Option<String>,
    /// Product name (if a USB device)
    pub product: Option<String>,
    /// Serial number (if a USB device)
    pub serial_number: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (manufacturer, product, serial_number) = match info.port_type {
            SerialPortType::UsbPort(usb) => (usb.manufacturer, usb.product, usb.serial_number),
            _ => (None, None, None),
        };
        Self {
            name: info.port_name,
            manufacturer,
            product,
            serial_number,
        }
    }
}

/// List available serial ports, sorted by name
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    ports
}

/// Serial link settings
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// The card's UART uses even parity; disable only for bench setups
    pub even_parity: bool,
    /// Quiet period that ends a receive burst
    pub inter_word_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            even_parity: true,
            inter_word_timeout: Duration::from_millis(50),
        }
    }
}

/// Serial transport speaking 4-byte link words
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    config: LinkConfig,
}

impl SerialLink {
    /// Open and configure the port for card communication
    pub fn open(config: LinkConfig) -> Result<Self, ProtocolError> {
        let parity = if config.even_parity {
            serialport::Parity::Even
        } else {
            serialport::Parity::None
        };
        let port = serialport::new(&config.port_name, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(parity)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            // short port timeout; the overall receive deadline lives in read_raw_words
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        debug!(
            port = %config.port_name,
            baud = config.baud_rate,
            even_parity = config.even_parity,
            "serial port opened"
        );
        Ok(Self { port, config })
    }

    /// Drop anything pending in the OS buffers
    pub fn clear_buffers(&mut self) -> Result<(), ProtocolError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }
}

impl Transport for SerialLink {
    fn write_word(&mut self, word: WireWord) -> Result<(), ProtocolError> {
        self.port.write_all(&word.to_link_bytes())?;
        Ok(())
    }

    /// Poll `bytes_to_read` under the overall deadline, then end the burst
    /// after the inter-word quiet period once data has started arriving.
    fn read_raw_words(&mut self, timeout: Duration) -> Result<Vec<WireWord>, ProtocolError> {
        let mut raw: Vec<u8> = Vec::new();
        let mut buf = [0u8; 512];
        let start = Instant::now();
        let mut last_data = Instant::now();

        loop {
            if start.elapsed() > timeout {
                break;
            }

            let available = self
                .port
                .bytes_to_read()
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

            if available > 0 {
                let to_read = (available as usize).min(buf.len());
                match self.port.read(&mut buf[..to_read]) {
                    Ok(0) => break,
                    Ok(n) => {
                        raw.extend_from_slice(&buf[..n]);
                        last_data = Instant::now();
                        trace!(read = n, total = raw.len(), "link bytes received");
                    }
                    Err(ref e)
                        if e.kind() == io::ErrorKind::TimedOut
                            || e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
                }
            } else if raw.is_empty() {
                std::thread::sleep(Duration::from_millis(2));
            } else if last_data.elapsed() > self.config.inter_word_timeout {
                break;
            } else {
                std::thread::sleep(Duration::from_millis(2));
            }
        }

        if raw.is_empty() {
            return Err(ProtocolError::Timeout);
        }
        Ok(words_from_link_bytes(raw))
    }
}

/// Chunk a raw byte burst into link words, dropping a trailing partial word
fn words_from_link_bytes(mut raw: Vec<u8>) -> Vec<WireWord> {
    let rem = raw.len() % 4;
    if rem != 0 {
        warn!(dropped = rem, "trailing partial word dropped");
        raw.truncate(raw.len() - rem);
    }
    raw.chunks_exact(4)
        .map(|chunk| WireWord::from_link_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_list_ports_does_not_panic() {
        for port in list_ports() {
            println!("found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_words_from_link_bytes_applies_swap() {
        let raw = vec![0x78, 0x56, 0x34, 0x12, 0xa5, 0xa5, 0xa5, 0xa5];
        let words = words_from_link_bytes(raw);
        assert_eq!(words, [WireWord::new(0x12345678), WireWord::new(0xa5a5a5a5)]);
    }

    #[test]
    fn test_words_from_link_bytes_drops_partial_tail() {
        let raw = vec![0x01, 0x00, 0x00, 0x00, 0xff, 0xee];
        let words = words_from_link_bytes(raw);
        assert_eq!(words, [WireWord::new(1)]);
    }

    #[test]
    fn test_link_config_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert!(config.even_parity);
    }
}
