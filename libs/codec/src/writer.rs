//! Append-only little-endian writer
//!
//! Individual writes are infallible so encoders stay plain sequences of
//! calls. A length beyond the reader's limits (or beyond the `i32` prefix)
//! is remembered as the writer's first error, its payload is skipped, and
//! `finish` reports it. Anything `finish` accepts decodes again.

use byteorder::{ByteOrder, LittleEndian};
use config::protocol::limits;
use rust_decimal::Decimal;
use types::Ticks;

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::{WireEncode, WireEnum};

/// Length prefix written for an absent optional string
pub const ABSENT_STRING: i32 = -1;

/// Serializes transmissions into an owned byte buffer
#[derive(Debug, Default, Clone)]
pub struct TransmissionWriter {
    buffer: Vec<u8>,
    error: Option<ProtocolError>,
    depth: usize,
}

impl TransmissionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known payload size
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Raw buffer, without checking for a recorded limit violation
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// First limit violation hit so far
    pub fn error(&self) -> Option<&ProtocolError> {
        self.error.as_ref()
    }

    /// The encoded bytes, or the first limit violation
    pub fn finish(self) -> ProtocolResult<Vec<u8>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.buffer),
        }
    }

    /// Step into a nested packet; false once the depth limit is passed
    pub fn enter_nested(&mut self) -> bool {
        self.depth += 1;
        if self.depth > limits::MAX_PACKET_DEPTH {
            let offset = self.buffer.len();
            self.fail(ProtocolError::NestingTooDeep {
                depth: self.depth,
                max: limits::MAX_PACKET_DEPTH,
                offset,
            });
            return false;
        }
        true
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn fail(&mut self, error: ProtocolError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Encode any wire value
    #[inline]
    pub fn put<T: WireEncode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_i64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_f64(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    /// 16-byte `rust_decimal` layout (flags, hi, lo, mid)
    #[inline]
    pub fn write_decimal(&mut self, value: Decimal) {
        self.buffer.extend_from_slice(&value.serialize());
    }

    #[inline]
    pub fn write_ticks(&mut self, value: Ticks) {
        self.write_i64(value.raw());
    }

    /// Enumerations travel as their `i32` discriminant
    #[inline]
    pub fn write_enum<E: WireEnum>(&mut self, value: E) {
        self.write_i32(value.to_wire());
    }

    /// `i32` byte length followed by UTF-8
    pub fn write_string(&mut self, value: &str) {
        if self.write_len(value.len(), limits::MAX_STRING_BYTES, "string") {
            self.buffer.extend_from_slice(value.as_bytes());
        }
    }

    /// Like `write_string`, with `-1` standing for `None`
    pub fn write_opt_string(&mut self, value: Option<&str>) {
        match value {
            Some(text) => self.write_string(text),
            None => self.write_i32(ABSENT_STRING),
        }
    }

    /// `i32` length followed by raw bytes
    pub fn write_bytes(&mut self, value: &[u8]) {
        if self.write_len(value.len(), limits::MAX_BLOB_BYTES, "blob") {
            self.buffer.extend_from_slice(value);
        }
    }

    /// `i32` count followed by each element
    pub fn write_seq<T: WireEncode>(&mut self, values: &[T]) {
        if self.write_len(values.len(), limits::MAX_SEQUENCE_LEN, "sequence") {
            for value in values {
                value.encode(self);
            }
        }
    }

    /// `i32` length prefix bounded by `max`
    ///
    /// Returns false, writing nothing, when the length cannot be read back;
    /// the caller then skips the payload.
    pub fn write_len(&mut self, len: usize, max: usize, context: &str) -> bool {
        match i32::try_from(len) {
            Ok(prefix) if len <= max => {
                self.write_i32(prefix);
                true
            }
            _ => {
                self.fail(ProtocolError::EncodeLimit {
                    length: len,
                    max: max.min(i32::MAX as usize),
                    context: context.to_string(),
                });
                false
            }
        }
    }
}
