//! Common transmission header
//!
//! Every transmission starts with the same header after its type identifier.
//! Current layout:
//!
//! ```text
//! instigator  u64        UserId of the user, ERP endpoint or server
//! timestamp   i64        Ticks at construction
//! description opt-string audit text, -1 when absent
//! sender      i32        SenderKind discriminant
//! flags       u32        bit 0 log_errors, bit 1 record_as_event
//! ```
//!
//! Flag bits this build does not know are kept in `reserved_flags` and
//! written back unchanged.
//!
//! Streams older than `HEADER_SENDER_FLAGS` lack the last two fields and
//! streams older than `HEADER_DESCRIPTION` also lack the description.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use types::{Ticks, UserId};

use crate::error::ProtocolResult;
use crate::reader::TransmissionReader;
use crate::version::{history, VersionBranch, VersionLadder};
use crate::writer::TransmissionWriter;

/// Where a transmission entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum SenderKind {
    /// ERP or other integration endpoint
    ExternalInterface = 0,
    /// Client user interface acting on behalf of a user
    InternalUi = 1,
    /// Scheduling engine or other server-side process
    InternalSystem = 2,
    /// Explicit action performed directly by a user
    DirectUser = 3,
}

crate::impl_wire_enum!(SenderKind);

/// Header flag bits
pub mod flags {
    /// Errors while applying the transmission go to the standard error log
    pub const LOG_ERRORS: u32 = 1 << 0;
    /// The transmission is shown to users as an event
    pub const RECORD_AS_EVENT: u32 = 1 << 1;
    /// Every bit this build understands
    pub const KNOWN: u32 = LOG_ERRORS | RECORD_AS_EVENT;
}

/// Fields shared by every transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionHeader {
    pub instigator: UserId,
    pub timestamp: Ticks,
    pub description: Option<String>,
    pub sender: SenderKind,
    /// Apply-time errors are logged when true and suppressed otherwise
    pub log_errors: bool,
    pub record_as_event: bool,
    /// Flag bits outside `flags::KNOWN`, preserved for re-encoding
    pub reserved_flags: u32,
}

impl Default for TransmissionHeader {
    /// Values assumed for fields an older stream did not carry
    fn default() -> Self {
        Self {
            instigator: UserId::null(),
            timestamp: Ticks::EPOCH,
            description: None,
            sender: SenderKind::InternalSystem,
            log_errors: true,
            record_as_event: false,
            reserved_flags: 0,
        }
    }
}

impl TransmissionHeader {
    const BRANCHES: &'static [VersionBranch<Self>] = &[
        VersionBranch {
            since: history::HEADER_SENDER_FLAGS,
            decode: Self::decode_with_sender_flags,
        },
        VersionBranch {
            since: history::HEADER_DESCRIPTION,
            decode: Self::decode_with_description,
        },
        VersionBranch {
            since: history::INITIAL,
            decode: Self::decode_initial,
        },
    ];

    pub const LADDER: VersionLadder<Self> = VersionLadder::new("TransmissionHeader", Self::BRANCHES);

    /// Header stamped with the current time
    pub fn new(instigator: UserId) -> Self {
        Self {
            instigator,
            timestamp: Ticks::now(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sender(mut self, sender: SenderKind) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Ticks) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }

    pub fn with_record_as_event(mut self, record_as_event: bool) -> Self {
        self.record_as_event = record_as_event;
        self
    }

    /// Packed flag word as written on the wire
    pub fn flags(&self) -> u32 {
        let mut bits = self.reserved_flags & !flags::KNOWN;
        if self.log_errors {
            bits |= flags::LOG_ERRORS;
        }
        if self.record_as_event {
            bits |= flags::RECORD_AS_EVENT;
        }
        bits
    }

    /// Unpack a flag word; unknown bits are carried in `reserved_flags`
    pub fn apply_flags(&mut self, bits: u32) {
        self.log_errors = bits & flags::LOG_ERRORS != 0;
        self.record_as_event = bits & flags::RECORD_AS_EVENT != 0;
        self.reserved_flags = bits & !flags::KNOWN;
    }

    /// Write the current layout
    pub fn encode(&self, writer: &mut TransmissionWriter) {
        writer.put(&self.instigator);
        writer.write_ticks(self.timestamp);
        writer.write_opt_string(self.description.as_deref());
        writer.write_enum(self.sender);
        writer.write_u32(self.flags());
    }

    /// Read the layout selected by the stream version
    pub fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        let mut header = Self::default();
        Self::LADDER.decode(reader, &mut header)?;
        Ok(header)
    }

    fn decode_with_sender_flags(r: &mut TransmissionReader<'_>, h: &mut Self) -> ProtocolResult<()> {
        h.instigator = r.get()?;
        h.timestamp = r.read_ticks()?;
        h.description = r.read_opt_string()?;
        h.sender = r.read_enum()?;
        let bits = r.read_u32()?;
        h.apply_flags(bits);
        Ok(())
    }

    fn decode_with_description(r: &mut TransmissionReader<'_>, h: &mut Self) -> ProtocolResult<()> {
        h.instigator = r.get()?;
        h.timestamp = r.read_ticks()?;
        h.description = r.read_opt_string()?;
        Ok(())
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, h: &mut Self) -> ProtocolResult<()> {
        h.instigator = r.get()?;
        h.timestamp = r.read_ticks()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::version::SchemaVersion;

    fn sample() -> TransmissionHeader {
        TransmissionHeader::new(UserId::new(77))
            .with_timestamp(Ticks::new(638_000_000_000))
            .with_description("Move lathe maintenance")
            .with_sender(SenderKind::DirectUser)
            .with_log_errors(false)
            .with_record_as_event(true)
    }

    #[test]
    fn test_current_layout_round_trip() {
        let header = sample();
        let mut w = TransmissionWriter::new();
        header.encode(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8 + 8 + 4 + 22 + 4 + 4);

        let mut r = TransmissionReader::new(&bytes, SchemaVersion::CURRENT);
        assert_eq!(TransmissionHeader::decode(&mut r).unwrap(), header);
        assert!(r.is_empty());
    }

    #[test]
    fn test_description_era_defaults_sender_and_flags() {
        let mut w = TransmissionWriter::new();
        w.write_u64(5);
        w.write_i64(42);
        w.write_opt_string(Some("legacy"));
        let bytes = w.into_bytes();

        let mut r = TransmissionReader::new(&bytes, SchemaVersion::new(history::HEADER_SENDER_FLAGS - 1));
        let header = TransmissionHeader::decode(&mut r).unwrap();
        assert!(r.is_empty());
        assert_eq!(header.instigator, UserId::new(5));
        assert_eq!(header.description.as_deref(), Some("legacy"));
        assert_eq!(header.sender, SenderKind::InternalSystem);
        assert!(header.log_errors);
        assert!(!header.record_as_event);
    }

    #[test]
    fn test_initial_layout() {
        let mut w = TransmissionWriter::new();
        w.write_u64(u64::MAX);
        w.write_i64(-1);
        let bytes = w.into_bytes();

        let mut r = TransmissionReader::new(&bytes, SchemaVersion::new(history::HEADER_DESCRIPTION - 1));
        let header = TransmissionHeader::decode(&mut r).unwrap();
        assert_eq!(header.instigator, UserId::SERVER);
        assert_eq!(header.timestamp, Ticks::new(-1));
        assert_eq!(header.description, None);
    }

    #[test]
    fn test_unknown_sender_is_rejected() {
        let mut w = TransmissionWriter::new();
        w.write_u64(1);
        w.write_i64(0);
        w.write_opt_string(None);
        w.write_i32(9);
        w.write_u32(0);
        let bytes = w.into_bytes();

        let mut r = TransmissionReader::new(&bytes, SchemaVersion::CURRENT);
        assert_eq!(
            TransmissionHeader::decode(&mut r),
            Err(ProtocolError::InvalidEnum {
                type_name: "SenderKind",
                value: 9,
                offset: 20,
            })
        );
    }

    #[test]
    fn test_flags_pack() {
        let mut header = TransmissionHeader::default();
        assert_eq!(header.flags(), flags::LOG_ERRORS);
        header.apply_flags(flags::RECORD_AS_EVENT | 0x8000_0000);
        assert!(!header.log_errors);
        assert!(header.record_as_event);
        assert_eq!(header.reserved_flags, 0x8000_0000);
        assert_eq!(header.flags(), flags::RECORD_AS_EVENT | 0x8000_0000);
    }

    #[test]
    fn test_unknown_flag_bits_survive_reencode() {
        let mut w = TransmissionWriter::new();
        w.write_u64(1);
        w.write_i64(0);
        w.write_opt_string(None);
        w.write_enum(SenderKind::InternalUi);
        w.write_u32(flags::LOG_ERRORS | 0x0000_0104);
        let bytes = w.into_bytes();

        let mut r = TransmissionReader::new(&bytes, SchemaVersion::CURRENT);
        let header = TransmissionHeader::decode(&mut r).unwrap();
        assert!(header.log_errors);
        assert_eq!(header.reserved_flags, 0x0000_0104);

        let mut again = TransmissionWriter::new();
        header.encode(&mut again);
        assert_eq!(again.into_bytes(), bytes);
    }
}
