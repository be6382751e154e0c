//! Recording and replay errors

use std::io;

use codec::ProtocolError;
use thiserror::Error;

/// Failures reading or writing a recording
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a recording header
    #[error("Not a transmission recording: {reason}")]
    BadHeader { reason: String },

    #[error("Unsupported recording format version {found} (this build reads {supported})")]
    UnsupportedFormat { found: u16, supported: u16 },

    /// Appending current-layout bytes to a log written at another schema version
    #[error("Recording was written at schema v{found}, cannot append v{current} transmissions")]
    SchemaMismatch { found: u32, current: u32 },

    #[error("Checksum mismatch in entry {sequence}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        sequence: u64,
        stored: u32,
        computed: u32,
    },

    /// The log ends in the middle of an entry
    #[error("Truncated entry after sequence {after}")]
    TruncatedEntry { after: u64 },

    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("Entry of {len} bytes exceeds the limit of {max}")]
    EntryTooLarge { len: usize, max: usize },

    /// The transmission cannot be serialized into replayable bytes
    #[error("Cannot record transmission: {0}")]
    Encode(#[from] ProtocolError),

    /// An earlier append failed and its partial entry could not be removed
    #[error("Recording {path} is unusable after a failed append that could not be rolled back")]
    Poisoned { path: String },
}

/// Failures while replaying a recording
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An entry failed to decode; replay stops at this sequence
    #[error("Replay halted at sequence {sequence}: {source}")]
    Decode {
        sequence: u64,
        #[source]
        source: ProtocolError,
    },

    /// The session already halted and cannot continue
    #[error("Replay already halted at sequence {sequence}")]
    Halted { sequence: u64 },

    /// The recording is newer than every layout this build reads
    #[error("Recording schema v{found} is newer than this reader (v{supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Recording(#[from] RecordingError),
}

impl ReplayError {
    /// Sequence number at which replay stopped, when known
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Decode { sequence, .. } | Self::Halted { sequence } => Some(*sequence),
            Self::Recording(RecordingError::ChecksumMismatch { sequence, .. }) => Some(*sequence),
            Self::Recording(RecordingError::SequenceGap { found, .. }) => Some(*found),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordingError>;
