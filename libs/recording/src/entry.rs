//! Recorded transmission entries and the sink trait

use codec::{to_bytes, Transmission};
use types::Ticks;

use crate::error::Result;

/// Exact bytes of one transmission, with its position and capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    /// Assigned by the recorder, starting at 1 and increasing by 1
    pub sequence: u64,
    pub timestamp: Ticks,
    pub bytes: Vec<u8>,
}

impl RecordingEntry {
    pub fn new(sequence: u64, timestamp: Ticks, bytes: Vec<u8>) -> Self {
        Self {
            sequence,
            timestamp,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Destination for captured transmissions
///
/// Implementations assign sequence numbers; callers never choose them.
pub trait Recorder {
    /// Append a copy of `bytes` captured at `timestamp`, returning its sequence number
    fn append_at(&mut self, timestamp: Ticks, bytes: &[u8]) -> Result<u64>;

    fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        self.append_at(Ticks::now(), bytes)
    }

    /// Serialize and append; the transmission itself is left untouched
    fn record(&mut self, transmission: &dyn Transmission) -> Result<u64> {
        self.append(&to_bytes(transmission)?)
    }
}
