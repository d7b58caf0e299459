//! CSV export of acquired data
//!
//! Simple sink for decoded data frames: one packet per row, one hex word
//! per column. Each frame's payload starts with per-frame header words that
//! are usually not wanted in the sample matrix, so a leading skip count is
//! applied per row.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::protocol::DataPacket;

/// Words of per-frame header preceding the samples in a data payload
pub const FRAME_HEADER_WORDS: usize = 43;

/// Write data-frame payloads to a CSV file, one frame per row
///
/// The first `skip_words` words of each payload are omitted; a payload
/// shorter than the skip produces an empty row.
pub fn write_frames_csv<P: AsRef<Path>>(
    path: P,
    frames: &[DataPacket],
    skip_words: usize,
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for frame in frames {
        let mut first = true;
        for word in frame.payload.iter().skip(skip_words) {
            if first {
                write!(writer, "{word}")?;
                first = false;
            } else {
                write!(writer, ",{word}")?;
            }
        }
        writeln!(writer)?;
    }

    writer.flush()
}
