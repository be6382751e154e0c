//! The transmission contract
//!
//! A transmission is `[type id i32][header][body]`. `Transmission` is the
//! object-safe side used once the concrete type is erased (registry output,
//! packet elements, replay). `TransmissionType` is the static side a concrete
//! type implements so the registry can build a factory for it.

use std::any::Any;
use std::fmt;

use types::{ScenarioId, ValidationError};

use crate::error::ProtocolResult;
use crate::header::TransmissionHeader;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::writer::TransmissionWriter;

/// Stable identifier of a concrete transmission type
pub type TransmissionTypeId = i32;

/// Object-safe view of any decoded or constructed transmission
pub trait Transmission: fmt::Debug + Send + Sync + Any {
    fn transmission_type(&self) -> TransmissionTypeId;

    fn type_name(&self) -> &'static str;

    fn header(&self) -> &TransmissionHeader;

    fn header_mut(&mut self) -> &mut TransmissionHeader;

    /// Write the body (address chain and own fields) in the newest layout
    fn encode_body(&self, writer: &mut TransmissionWriter);

    /// Audit text: the header description, or the type name without one
    fn description(&self) -> String {
        self.header()
            .description
            .clone()
            .unwrap_or_else(|| self.type_name().to_string())
    }

    /// Whether applying this transmission changes committed scenario state
    fn mutates_scenario(&self) -> bool {
        true
    }

    /// Whether this transmission starts a user session
    fn is_login(&self) -> bool {
        false
    }

    /// Scenario addressed by this transmission, if it is scenario scoped
    fn scenario_id(&self) -> Option<ScenarioId> {
        None
    }

    /// Domain consistency check, separate from decoding
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Static contract of a concrete transmission type
pub trait TransmissionType: Transmission + Sized {
    /// Assigned once, never reassigned
    const TYPE_ID: TransmissionTypeId;

    const NAME: &'static str;

    /// Body starts with the scenario id
    const SCENARIO_SCOPED: bool = false;

    /// Read the body after the registry has read the type id and header
    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        registry: &TypeRegistry,
    ) -> ProtocolResult<Self>;
}

/// Fill in the `Transmission` items every concrete type implements the same way
///
/// Expects a `header: TransmissionHeader` field and a `TransmissionType` impl.
#[macro_export]
macro_rules! transmission_identity {
    () => {
        fn transmission_type(&self) -> $crate::transmission::TransmissionTypeId {
            <Self as $crate::transmission::TransmissionType>::TYPE_ID
        }

        fn type_name(&self) -> &'static str {
            <Self as $crate::transmission::TransmissionType>::NAME
        }

        fn header(&self) -> &$crate::header::TransmissionHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut $crate::header::TransmissionHeader {
            &mut self.header
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
            self
        }
    };
}

/// Append `[type id][header][body]`
pub fn encode_transmission(transmission: &dyn Transmission, writer: &mut TransmissionWriter) {
    writer.write_i32(transmission.transmission_type());
    transmission.header().encode(writer);
    transmission.encode_body(writer);
}

/// Serialize a transmission into a fresh buffer
///
/// Fails when a string, blob, sequence or packet exceeds what the reader
/// accepts, so every buffer returned here decodes again.
pub fn to_bytes(transmission: &dyn Transmission) -> ProtocolResult<Vec<u8>> {
    let mut writer = TransmissionWriter::with_capacity(128);
    encode_transmission(transmission, &mut writer);
    writer.finish()
}
