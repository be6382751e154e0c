//! Packets: ordering, nesting and failure reporting

use codec::addressing::ScenarioKey;
use codec::catalog::{JobEditT, SimulationAction, SimulationControlT, UserLogonT};
use codec::{
    encode_transmission, to_bytes, ProtocolError, ProtocolResult, SchemaVersion, Transmission,
    TransmissionHeader, TransmissionPacket, TransmissionReader, TransmissionType,
    TransmissionTypeId, TransmissionWriter, TypeRegistry,
};
use config::protocol::type_ids::EXTENSION_FLOOR;
use std::any::Any;
use types::{JobId, ScenarioId, Ticks, UserId};

fn registry() -> TypeRegistry {
    TypeRegistry::with_catalog().unwrap()
}

fn job_edit(job: u64, priority: i32) -> JobEditT {
    let key = ScenarioKey::new(ScenarioId::new(1)).job(JobId::new(job));
    let mut edit = JobEditT::new(
        TransmissionHeader::new(UserId::new(6)).with_description(format!("job {job}")),
        key,
    );
    edit.set_priority(priority);
    edit
}

#[test]
fn test_elements_decode_in_order() {
    let packet = TransmissionPacket::new(TransmissionHeader::new(UserId::new(6)))
        .with(UserLogonT::new(UserId::new(6), "ws-1"))
        .with(job_edit(10, 1))
        .with(job_edit(11, 2))
        .with(job_edit(12, 3));

    let decoded = registry()
        .decode_as::<TransmissionPacket>(&to_bytes(&packet).unwrap(), SchemaVersion::CURRENT)
        .unwrap();

    let names: Vec<_> = decoded.iter().map(|element| element.type_name()).collect();
    assert_eq!(names, ["UserLogonT", "JobEditT", "JobEditT", "JobEditT"]);

    let priorities: Vec<_> = decoded
        .iter()
        .filter_map(|element| element.as_any().downcast_ref::<JobEditT>())
        .filter_map(JobEditT::priority)
        .collect();
    assert_eq!(priorities, [1, 2, 3]);
    assert_eq!(decoded.description(), "job 12");
    assert!(decoded.mutates_scenario());
}

#[test]
fn test_unknown_element_halts_with_index() {
    let mut writer = TransmissionWriter::new();
    writer.write_i32(TransmissionPacket::TYPE_ID);
    TransmissionHeader::default().encode(&mut writer);
    writer.write_i32(3);
    encode_transmission(&job_edit(1, 1), &mut writer);
    // an element from a newer producer
    writer.write_i32(48);
    TransmissionHeader::default().encode(&mut writer);
    encode_transmission(&job_edit(2, 2), &mut writer);
    writer.write_string("job 2");
    let bytes = writer.into_bytes();

    let error = registry().decode(&bytes, SchemaVersion::CURRENT).unwrap_err();
    match &error {
        ProtocolError::PacketElement { index, decoded, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(*decoded, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(error.unknown_type_id(), Some(48));
}

#[test]
fn test_truncated_element_is_reported_through_nesting() {
    let inner = TransmissionPacket::new(TransmissionHeader::default()).with(job_edit(5, 5));
    let outer = TransmissionPacket::new(TransmissionHeader::default()).with(inner);
    let bytes = to_bytes(&outer).unwrap();

    let cut = &bytes[..bytes.len() - 12];
    let error = registry().decode(cut, SchemaVersion::CURRENT).unwrap_err();
    assert!(error.is_truncation(), "{error}");
}

#[test]
fn test_packet_without_mutations() {
    let clock = ScenarioKey::new(ScenarioId::new(3));
    let packet = TransmissionPacket::new(TransmissionHeader::default())
        .with(UserLogonT::new(UserId::new(1), "ws"))
        .with(SimulationControlT::new(
            TransmissionHeader::default(),
            clock,
            SimulationAction::Pause,
            Ticks::new(10),
        ));
    assert!(!packet.mutates_scenario());
    assert_eq!(packet.len(), 2);
}

/// Plugin message type living outside the built-in catalog
#[derive(Debug, Clone, PartialEq)]
struct WorkstationNoteT {
    header: TransmissionHeader,
    note: String,
}

impl WorkstationNoteT {
    const TYPE_ID: TransmissionTypeId = EXTENSION_FLOOR;

    fn decode_boxed(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Box<dyn Transmission>> {
        let note = reader.read_string()?;
        Ok(Box::new(Self { header, note }))
    }
}

impl Transmission for WorkstationNoteT {
    fn transmission_type(&self) -> TransmissionTypeId {
        Self::TYPE_ID
    }

    fn type_name(&self) -> &'static str {
        "WorkstationNoteT"
    }

    fn header(&self) -> &TransmissionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TransmissionHeader {
        &mut self.header
    }

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        writer.write_string(&self.note);
    }

    fn mutates_scenario(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[test]
fn test_extension_type_decodes_inside_packet() {
    let mut registry = registry();
    registry
        .register_factory(
            WorkstationNoteT::TYPE_ID,
            "WorkstationNoteT",
            false,
            WorkstationNoteT::decode_boxed,
        )
        .unwrap();

    let note = WorkstationNoteT {
        header: TransmissionHeader::new(UserId::new(2)).with_description("shift handover"),
        note: "press 4 running warm".to_string(),
    };
    let packet = TransmissionPacket::new(TransmissionHeader::default())
        .with(job_edit(20, 1))
        .with(note.clone());

    let bytes = to_bytes(&packet).unwrap();
    let decoded = registry
        .decode_as::<TransmissionPacket>(&bytes, SchemaVersion::CURRENT)
        .unwrap();
    let element = &decoded.elements()[1];
    assert_eq!(element.transmission_type(), 10_000);
    assert_eq!(element.type_name(), "WorkstationNoteT");
    assert_eq!(element.as_any().downcast_ref::<WorkstationNoteT>(), Some(&note));
    assert_eq!(decoded.description(), "shift handover");
    assert_eq!(to_bytes(&decoded).unwrap(), bytes);

    // The catalog alone does not know the type
    let error = TypeRegistry::with_catalog()
        .unwrap()
        .decode(&bytes, SchemaVersion::CURRENT)
        .unwrap_err();
    assert_eq!(error.unknown_type_id(), Some(10_000));
}

#[test]
fn test_extension_id_cannot_be_registered_twice() {
    let mut registry = registry();
    registry
        .register_factory(EXTENSION_FLOOR, "WorkstationNoteT", false, WorkstationNoteT::decode_boxed)
        .unwrap();
    assert!(matches!(
        registry.register_factory(EXTENSION_FLOOR, "OtherNoteT", false, WorkstationNoteT::decode_boxed),
        Err(ProtocolError::DuplicateRegistration { type_id: 10_000, .. })
    ));
}
