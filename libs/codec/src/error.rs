//! Protocol-level errors for transmission decoding
//!
//! Codec errors are fatal for the message being decoded and always propagate
//! to the caller. Domain validation failures live in `types::ValidationError`
//! and never appear here. Each variant carries the context needed to locate
//! the fault in a captured byte stream.

use thiserror::Error;

use crate::transmission::TransmissionTypeId;

/// Transmission decoding errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Fewer bytes remain than the current decode path requires
    #[error("Truncated stream: need {needed} bytes, {remaining} remaining at offset {offset} (context: {context}, action: {suggested_action})")]
    TruncatedStream {
        needed: usize,
        remaining: usize,
        offset: usize,
        context: String,
        suggested_action: String,
    },

    /// Type identifier has no registry entry in this reader
    #[error("Unknown transmission type {type_id}: not registered in this reader (family: {family})")]
    UnknownType {
        type_id: TransmissionTypeId,
        family: String,
    },

    /// A second factory was offered for an already registered identifier
    #[error("Duplicate registration for transmission type {type_id}: already bound to {existing}, rejected {rejected}")]
    DuplicateRegistration {
        type_id: TransmissionTypeId,
        existing: &'static str,
        rejected: &'static str,
    },

    /// A registered identifier decoded to a different concrete type than requested
    #[error("Type mismatch: expected {expected} ({expected_id}), decoded {actual} ({actual_id})")]
    TypeMismatch {
        expected: &'static str,
        expected_id: TransmissionTypeId,
        actual: &'static str,
        actual_id: TransmissionTypeId,
    },

    /// Enumeration discriminant not defined for the target type
    #[error("Invalid {type_name} discriminant {value} at offset {offset}")]
    InvalidEnum {
        type_name: &'static str,
        value: i32,
        offset: usize,
    },

    /// String bytes are not valid UTF-8
    #[error("Invalid UTF-8 in string at offset {offset}: {reason}")]
    InvalidUtf8 { offset: usize, reason: String },

    /// Length prefix is negative or exceeds the configured wire limit
    #[error("Length {length} out of range 0..={max} at offset {offset} (context: {context})")]
    LengthOutOfRange {
        length: i64,
        max: usize,
        offset: usize,
        context: String,
    },

    /// A length the writer was asked to emit exceeds what any reader accepts
    #[error("Cannot encode {context} of length {length}: limit is {max}")]
    EncodeLimit {
        length: usize,
        max: usize,
        context: String,
    },

    /// Packets nested deeper than the configured limit
    #[error("Packet nesting depth {depth} exceeds limit {max} at offset {offset}")]
    NestingTooDeep {
        depth: usize,
        max: usize,
        offset: usize,
    },

    /// A whole-buffer decode finished without consuming every byte
    #[error("Trailing bytes: {count} unread after decoding {type_name}")]
    TrailingBytes { count: usize, type_name: String },

    /// A packet element failed to decode
    #[error("Packet element {index} failed after {decoded} decoded siblings: {source}")]
    PacketElement {
        index: usize,
        decoded: usize,
        #[source]
        source: Box<ProtocolError>,
    },

    /// Underlying I/O failure while reading or writing a stream
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl ProtocolError {
    /// Create TruncatedStream error with diagnostic context
    pub fn truncated(
        needed: usize,
        remaining: usize,
        offset: usize,
        context: impl Into<String>,
    ) -> Self {
        let suggested_action = if offset == 0 && remaining == 0 {
            "empty buffer - check framing of the enclosing stream"
        } else if needed > remaining.saturating_mul(16).max(1024) {
            "likely corrupted length prefix or wrong schema version"
        } else {
            "incomplete transmission - writer and reader layouts may disagree"
        };

        Self::TruncatedStream {
            needed,
            remaining,
            offset,
            context: context.into(),
            suggested_action: suggested_action.to_string(),
        }
    }

    /// Create UnknownType error, naming the family the identifier falls in
    pub fn unknown_type(type_id: TransmissionTypeId) -> Self {
        let family = crate::kinds::TransmissionFamily::of(type_id)
            .map(|family| family.name())
            .unwrap_or("unassigned range");

        Self::UnknownType {
            type_id,
            family: family.to_string(),
        }
    }

    /// Create LengthOutOfRange error
    pub fn length_out_of_range(
        length: i64,
        max: usize,
        offset: usize,
        context: impl Into<String>,
    ) -> Self {
        Self::LengthOutOfRange {
            length,
            max,
            offset,
            context: context.into(),
        }
    }

    /// Wrap an element failure with its position inside a packet
    pub fn packet_element(index: usize, decoded: usize, source: ProtocolError) -> Self {
        Self::PacketElement {
            index,
            decoded,
            source: Box::new(source),
        }
    }

    /// True when the stream ended early, looking through packet nesting
    pub fn is_truncation(&self) -> bool {
        match self {
            Self::TruncatedStream { .. } => true,
            Self::PacketElement { source, .. } => source.is_truncation(),
            _ => false,
        }
    }

    /// Innermost error, looking through packet nesting
    pub fn root_cause(&self) -> &ProtocolError {
        match self {
            Self::PacketElement { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Unregistered identifier behind this error, looking through packet nesting
    pub fn unknown_type_id(&self) -> Option<TransmissionTypeId> {
        match self {
            Self::UnknownType { type_id, .. } => Some(*type_id),
            Self::PacketElement { source, .. } => source.unknown_type_id(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
