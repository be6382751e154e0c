//! # Transmission Recording
//!
//! Captures the exact bytes of transmissions crossing a boundary and plays
//! them back in recorded order.
//!
//! - **Capture** never touches the transmission: `Recorder::record` encodes
//!   it and stores a copy of the bytes with a sequence number and timestamp
//! - **Storage** is either an append-only file (`RecordingWriter` /
//!   `RecordingReader`) or a `MemoryRecording`
//! - **Replay** (`ReplaySession`) decodes through the `TypeRegistry` at the
//!   recorded schema version, so logs written by older builds keep playing
//!
//! ```rust
//! use codec::catalog::{UserLogoffT, UserLogonT};
//! use codec::TypeRegistry;
//! use recording::{MemoryRecording, PlaybackMode, Recorder, ReplaySession, StopReason};
//! use types::UserId;
//!
//! let mut recording = MemoryRecording::new();
//! recording.record(&UserLogonT::new(UserId::new(1), "ws-1")).unwrap();
//! recording.record(&UserLogoffT::new(UserId::new(1))).unwrap();
//! recording.record(&UserLogonT::new(UserId::new(2), "ws-2")).unwrap();
//!
//! let registry = TypeRegistry::with_catalog().unwrap();
//! let mut session =
//!     ReplaySession::new(&registry, recording.schema_version(), recording.source()).unwrap();
//!
//! let outcome = session.play(PlaybackMode::UntilNextLogin, |_| {}).unwrap();
//! assert_eq!(outcome.delivered, 2);
//! assert_eq!(outcome.stop, StopReason::BeforeLogin { sequence: 3 });
//! ```

pub mod entry;
pub mod error;
pub mod log;
pub mod memory;
pub mod replay;
pub mod shared;

pub use entry::{Recorder, RecordingEntry};
pub use error::{RecordingError, ReplayError};
pub use log::{read_all, RecordingHeader, RecordingReader, RecordingSink, RecordingWriter};
pub use memory::MemoryRecording;
pub use replay::{
    PlaybackMode, ReplayOutcome, ReplaySession, ReplayedTransmission, StopReason,
    UnknownPlaybackMode,
};
pub use shared::SharedRecorder;
