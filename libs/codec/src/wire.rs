//! Wire encoding traits for primitive and composite values
//!
//! `WireEncode::encode` and `WireDecode::decode` are exact inverses: decode
//! consumes precisely the bytes encode produced. Message bodies are built by
//! calling these in a fixed declared order, since no field names travel on
//! the wire.

use rust_decimal::Decimal;
use types::{
    ActivityId, CapacityIntervalId, DepartmentId, JobId, ManufacturingOrderId, OperationId,
    PlantId, ResourceId, ScenarioId, Ticks, UserId,
};

use crate::error::ProtocolResult;
use crate::reader::TransmissionReader;
use crate::writer::TransmissionWriter;

/// Values that can be appended to a transmission stream
pub trait WireEncode {
    fn encode(&self, writer: &mut TransmissionWriter);
}

/// Values that can be read back from a transmission stream
pub trait WireDecode: Sized {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self>;
}

/// Enumerations carried as their `i32` discriminant
pub trait WireEnum: Copy {
    const TYPE_NAME: &'static str;

    fn to_wire(self) -> i32;

    fn from_wire(value: i32) -> Option<Self>;
}

/// Implement `WireEnum`, `WireEncode` and `WireDecode` for a `num_enum` enum with `#[repr(i32)]`
#[macro_export]
macro_rules! impl_wire_enum {
    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::wire::WireEnum for $name {
                const TYPE_NAME: &'static str = stringify!($name);

                #[inline]
                fn to_wire(self) -> i32 {
                    i32::from(self)
                }

                #[inline]
                fn from_wire(value: i32) -> Option<Self> {
                    <$name as $crate::num_enum::TryFromPrimitive>::try_from_primitive(value).ok()
                }
            }

            impl $crate::wire::WireEncode for $name {
                #[inline]
                fn encode(&self, writer: &mut $crate::writer::TransmissionWriter) {
                    writer.write_enum(*self);
                }
            }

            impl $crate::wire::WireDecode for $name {
                #[inline]
                fn decode(
                    reader: &mut $crate::reader::TransmissionReader<'_>,
                ) -> $crate::error::ProtocolResult<Self> {
                    reader.read_enum()
                }
            }
        )+
    };
}

macro_rules! impl_wire_scalar {
    ($($ty:ty => $write:ident, $read:ident;)+) => {
        $(
            impl WireEncode for $ty {
                #[inline]
                fn encode(&self, writer: &mut TransmissionWriter) {
                    writer.$write(*self);
                }
            }

            impl WireDecode for $ty {
                #[inline]
                fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
                    reader.$read()
                }
            }
        )+
    };
}

impl_wire_scalar! {
    bool => write_bool, read_bool;
    u8 => write_u8, read_u8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    u32 => write_u32, read_u32;
    i64 => write_i64, read_i64;
    u64 => write_u64, read_u64;
    f64 => write_f64, read_f64;
    Decimal => write_decimal, read_decimal;
    Ticks => write_ticks, read_ticks;
}

// Identifiers are opaque u64 values
macro_rules! impl_wire_id {
    ($($id:ty),+ $(,)?) => {
        $(
            impl WireEncode for $id {
                #[inline]
                fn encode(&self, writer: &mut TransmissionWriter) {
                    writer.write_u64(self.inner());
                }
            }

            impl WireDecode for $id {
                #[inline]
                fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
                    reader.read_u64().map(<$id>::new)
                }
            }
        )+
    };
}

impl_wire_id!(
    ScenarioId,
    PlantId,
    DepartmentId,
    ResourceId,
    CapacityIntervalId,
    JobId,
    ManufacturingOrderId,
    OperationId,
    ActivityId,
    UserId,
);

impl WireEncode for str {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_string(self);
    }
}

impl WireEncode for String {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_string(self);
    }
}

impl WireDecode for String {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        reader.read_string()
    }
}

impl WireEncode for Option<String> {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_opt_string(self.as_deref());
    }
}

impl WireDecode for Option<String> {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        reader.read_opt_string()
    }
}

impl<T: WireEncode> WireEncode for Vec<T> {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_seq(self);
    }
}

impl<T: WireDecode> WireDecode for Vec<T> {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        reader.read_seq()
    }
}
