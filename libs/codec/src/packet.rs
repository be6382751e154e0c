//! Packet: an ordered batch of heterogeneous transmissions
//!
//! Body layout after the common header:
//!
//! ```text
//! count        i32
//! element[0]   [type id i32][header][body]
//! ...
//! element[n-1]
//! description  string   (description of the last element)
//! ```
//!
//! Elements are resolved through the registry one by one, in order. A failing
//! element aborts the packet and is reported with its index; elements are
//! never skipped. Packets may contain packets, up to `MAX_PACKET_DEPTH`
//! levels counting the outermost one.

use tracing::debug;

use config::protocol::limits;

use crate::error::{ProtocolError, ProtocolResult};
use crate::header::TransmissionHeader;
use crate::kinds::TransmissionKind;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{encode_transmission, Transmission, TransmissionType, TransmissionTypeId};
use crate::writer::TransmissionWriter;

/// Batch of transmissions delivered as one unit
#[derive(Debug)]
pub struct TransmissionPacket {
    header: TransmissionHeader,
    elements: Vec<Box<dyn Transmission>>,
}

impl TransmissionPacket {
    pub fn new(header: TransmissionHeader) -> Self {
        Self {
            header,
            elements: Vec::new(),
        }
    }

    /// Append an element; the packet's description follows the latest append
    pub fn push(&mut self, element: Box<dyn Transmission>) {
        self.elements.push(element);
    }

    /// Builder-style `push` for concrete types
    pub fn with<T: Transmission>(mut self, element: T) -> Self {
        self.elements.push(Box::new(element));
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Box<dyn Transmission>] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Transmission> {
        self.elements.iter().map(|element| element.as_ref())
    }

    pub fn into_elements(self) -> Vec<Box<dyn Transmission>> {
        self.elements
    }

    fn decode_elements(
        &mut self,
        reader: &mut TransmissionReader<'_>,
        registry: &TypeRegistry,
    ) -> ProtocolResult<()> {
        let count = reader.read_len(limits::MAX_PACKET_ELEMENTS, "packet element count")?;
        self.elements.reserve(count.min(reader.remaining()));

        for index in 0..count {
            let element = registry
                .decode_from(reader)
                .map_err(|error| ProtocolError::packet_element(index, self.elements.len(), error))?;
            self.elements.push(element);
        }
        Ok(())
    }
}

impl Transmission for TransmissionPacket {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        if writer.enter_nested()
            && writer.write_len(self.elements.len(), limits::MAX_PACKET_ELEMENTS, "packet element count")
        {
            for element in &self.elements {
                encode_transmission(element.as_ref(), writer);
            }
        }
        writer.exit_nested();
        writer.write_string(&self.description());
    }

    /// Description of the last element, falling back to the packet's own
    fn description(&self) -> String {
        match self.elements.last() {
            Some(last) => last.description(),
            None => self
                .header
                .description
                .clone()
                .unwrap_or_else(|| Self::NAME.to_string()),
        }
    }

    fn mutates_scenario(&self) -> bool {
        self.elements.iter().any(|element| element.mutates_scenario())
    }

    fn validate(&self) -> Result<(), types::ValidationError> {
        self.elements.iter().try_for_each(|element| element.validate())
    }
}

impl TransmissionType for TransmissionPacket {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::Packet as TransmissionTypeId;
    const NAME: &'static str = "TransmissionPacket";

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        reader.enter_nested()?;
        let mut packet = Self::new(header);
        let decoded = packet.decode_elements(reader, registry);
        reader.exit_nested();
        decoded?;

        let recorded = reader.read_string()?;
        let derived = packet.description();
        if recorded != derived {
            debug!(%recorded, %derived, "Packet description differs from its last element");
        }
        Ok(packet)
    }
}
