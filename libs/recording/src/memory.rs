//! In-memory recording for tests and in-process capture

use codec::SchemaVersion;
use types::Ticks;

use crate::entry::{Recorder, RecordingEntry};
use crate::error::{RecordingError, Result};

/// Recording held in a `Vec`, with the same sequencing as the file log
#[derive(Debug, Clone)]
pub struct MemoryRecording {
    schema_version: SchemaVersion,
    entries: Vec<RecordingEntry>,
    next_sequence: u64,
}

impl Default for MemoryRecording {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecording {
    /// Empty recording of current-layout transmissions
    pub fn new() -> Self {
        Self::with_schema_version(SchemaVersion::CURRENT)
    }

    /// Empty recording of transmissions encoded at `schema_version`
    pub fn with_schema_version(schema_version: SchemaVersion) -> Self {
        Self {
            schema_version,
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Rebuild from entries captured elsewhere, e.g. received from a peer
    pub fn from_entries(schema_version: SchemaVersion, entries: Vec<RecordingEntry>) -> Self {
        let next_sequence = entries.last().map_or(1, |entry| entry.sequence + 1);
        Self {
            schema_version,
            entries,
            next_sequence,
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    pub fn entries(&self) -> &[RecordingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<RecordingEntry> {
        self.entries
    }

    /// Entries in the shape `ReplaySession` consumes
    pub fn source(&self) -> impl Iterator<Item = Result<RecordingEntry>> + '_ {
        self.entries.iter().cloned().map(Ok::<_, RecordingError>)
    }
}

impl Recorder for MemoryRecording {
    fn append_at(&mut self, timestamp: Ticks, bytes: &[u8]) -> Result<u64> {
        let sequence = self.next_sequence;
        self.entries
            .push(RecordingEntry::new(sequence, timestamp, bytes.to_vec()));
        self.next_sequence += 1;
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordingError;
    use codec::catalog::UserLogonT;
    use codec::{to_bytes, ProtocolError, TransmissionHeader, TransmissionPacket};
    use config::protocol::limits;
    use types::UserId;

    #[test]
    fn test_record_copies_bytes() {
        let mut recording = MemoryRecording::new();
        let mut logon = UserLogonT::new(UserId::new(3), "ws-3");
        let sequence = recording.record(&logon).unwrap();
        assert_eq!(sequence, 1);

        logon.workstation = "changed".to_string();
        assert_ne!(recording.entries()[0].bytes, to_bytes(&logon).unwrap());
    }

    #[test]
    fn test_from_entries_continues_sequence() {
        let mut first = MemoryRecording::new();
        first.append(b"x").unwrap();
        first.append(b"y").unwrap();

        let mut second = MemoryRecording::from_entries(first.schema_version(), first.into_entries());
        assert_eq!(second.append(b"z").unwrap(), 3);
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_unencodable_transmission_is_not_recorded() {
        let mut packet = TransmissionPacket::new(TransmissionHeader::default());
        for _ in 0..limits::MAX_PACKET_DEPTH {
            packet = TransmissionPacket::new(TransmissionHeader::default()).with(packet);
        }

        let mut recording = MemoryRecording::new();
        assert!(matches!(
            recording.record(&packet),
            Err(RecordingError::Encode(ProtocolError::NestingTooDeep { .. }))
        ));
        assert!(recording.is_empty());
        assert_eq!(recording.record(&UserLogonT::new(UserId::new(1), "ws")).unwrap(), 1);
    }
}
