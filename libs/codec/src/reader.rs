//! Bounds-checked little-endian reader
//!
//! Every read goes through `take`, so running past the end of the buffer is a
//! `TruncatedStream` error carrying the offset and what was being read. The
//! reader also carries the schema version of the stream, consulted by each
//! version ladder exactly once per message.

use byteorder::{ByteOrder, LittleEndian};
use config::protocol::limits;
use rust_decimal::Decimal;
use types::Ticks;

use crate::error::{ProtocolError, ProtocolResult};
use crate::version::SchemaVersion;
use crate::wire::{WireDecode, WireEnum};
use crate::writer::ABSENT_STRING;

/// Decodes transmissions from a borrowed byte buffer
#[derive(Debug, Clone)]
pub struct TransmissionReader<'a> {
    data: &'a [u8],
    position: usize,
    version: SchemaVersion,
    depth: usize,
}

impl<'a> TransmissionReader<'a> {
    pub fn new(data: &'a [u8], version: SchemaVersion) -> Self {
        Self {
            data,
            position: 0,
            version,
            depth: 0,
        }
    }

    /// Schema version the stream was written with
    #[inline]
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail with `TrailingBytes` unless every byte was consumed
    pub fn expect_end(&self, type_name: &str) -> ProtocolResult<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(ProtocolError::TrailingBytes {
                count,
                type_name: type_name.to_string(),
            }),
        }
    }

    /// Step into a nested packet, failing past `MAX_PACKET_DEPTH`
    ///
    /// Every successful call must be paired with `exit_nested`.
    pub fn enter_nested(&mut self) -> ProtocolResult<()> {
        if self.depth >= limits::MAX_PACKET_DEPTH {
            return Err(ProtocolError::NestingTooDeep {
                depth: self.depth + 1,
                max: limits::MAX_PACKET_DEPTH,
                offset: self.position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consume exactly `count` bytes
    pub fn take(&mut self, count: usize, context: &str) -> ProtocolResult<&'a [u8]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(ProtocolError::truncated(
                count,
                remaining,
                self.position,
                context,
            ));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.data[start..self.position])
    }

    /// Decode any wire value
    #[inline]
    pub fn get<T: WireDecode>(&mut self) -> ProtocolResult<T> {
        T::decode(self)
    }

    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        Ok(self.take(1, "bool")?[0] != 0)
    }

    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_i16(&mut self) -> ProtocolResult<i16> {
        Ok(LittleEndian::read_i16(self.take(2, "i16")?))
    }

    pub fn read_i32(&mut self) -> ProtocolResult<i32> {
        Ok(LittleEndian::read_i32(self.take(4, "i32")?))
    }

    pub fn read_u32(&mut self) -> ProtocolResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4, "u32")?))
    }

    pub fn read_i64(&mut self) -> ProtocolResult<i64> {
        Ok(LittleEndian::read_i64(self.take(8, "i64")?))
    }

    pub fn read_u64(&mut self) -> ProtocolResult<u64> {
        Ok(LittleEndian::read_u64(self.take(8, "u64")?))
    }

    pub fn read_f64(&mut self) -> ProtocolResult<f64> {
        Ok(LittleEndian::read_f64(self.take(8, "f64")?))
    }

    pub fn read_decimal(&mut self) -> ProtocolResult<Decimal> {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(self.take(16, "decimal")?);
        Ok(Decimal::deserialize(bytes))
    }

    pub fn read_ticks(&mut self) -> ProtocolResult<Ticks> {
        Ok(Ticks::new(LittleEndian::read_i64(self.take(8, "ticks")?)))
    }

    pub fn read_enum<E: WireEnum>(&mut self) -> ProtocolResult<E> {
        let offset = self.position;
        let value = self.read_i32()?;
        E::from_wire(value).ok_or(ProtocolError::InvalidEnum {
            type_name: E::TYPE_NAME,
            value,
            offset,
        })
    }

    pub fn read_string(&mut self) -> ProtocolResult<String> {
        let len = self.read_len(limits::MAX_STRING_BYTES, "string length")?;
        self.read_utf8(len)
    }

    /// `-1` decodes to `None`
    pub fn read_opt_string(&mut self) -> ProtocolResult<Option<String>> {
        let offset = self.position;
        let raw = self.read_i32()?;
        if raw == ABSENT_STRING {
            return Ok(None);
        }
        let len = Self::check_len(raw, limits::MAX_STRING_BYTES, offset, "optional string length")?;
        self.read_utf8(len).map(Some)
    }

    pub fn read_bytes(&mut self) -> ProtocolResult<Vec<u8>> {
        let len = self.read_len(limits::MAX_BLOB_BYTES, "blob length")?;
        Ok(self.take(len, "blob")?.to_vec())
    }

    pub fn read_seq<T: WireDecode>(&mut self) -> ProtocolResult<Vec<T>> {
        let count = self.read_len(limits::MAX_SEQUENCE_LEN, "sequence count")?;
        // A corrupt count must not drive a huge allocation; every element needs at least one byte
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(T::decode(self)?);
        }
        Ok(values)
    }

    /// Read a non-negative `i32` length bounded by `max`
    pub fn read_len(&mut self, max: usize, context: &str) -> ProtocolResult<usize> {
        let offset = self.position;
        let raw = self.read_i32()?;
        Self::check_len(raw, max, offset, context)
    }

    fn check_len(raw: i32, max: usize, offset: usize, context: &str) -> ProtocolResult<usize> {
        match usize::try_from(raw) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(ProtocolError::length_out_of_range(
                i64::from(raw),
                max,
                offset,
                context,
            )),
        }
    }

    fn read_utf8(&mut self, len: usize) -> ProtocolResult<String> {
        let offset = self.position;
        let bytes = self.take(len, "string bytes")?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| ProtocolError::InvalidUtf8 {
                offset,
                reason: e.to_string(),
            })
    }
}
