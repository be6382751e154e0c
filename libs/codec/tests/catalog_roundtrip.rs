//! Encode/decode of every catalog transmission through the registry
//!
//! Each test decodes polymorphically, downcasts, and re-encodes to confirm
//! the bytes are reproduced exactly.

use codec::addressing::{DepartmentKey, ScenarioKey};
use codec::catalog::*;
use codec::{
    to_bytes, SchemaVersion, SenderKind, Transmission, TransmissionHeader, TransmissionKind,
    TransmissionType, TypeRegistry,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use types::{
    ActivityId, CapacityIntervalId, DepartmentId, JobId, ManufacturingOrderId, OperationId,
    PlantId, ResourceId, ScenarioId, Ticks, UserId,
};

fn registry() -> TypeRegistry {
    TypeRegistry::with_catalog().expect("catalog registers")
}

fn header() -> TransmissionHeader {
    TransmissionHeader::new(UserId::new(31))
        .with_timestamp(Ticks::new(16_000_000_000_000_000))
        .with_description("nightly ERP sync")
        .with_sender(SenderKind::ExternalInterface)
}

fn scenario() -> ScenarioKey {
    ScenarioKey::new(ScenarioId::new(4))
}

fn department() -> DepartmentKey {
    scenario().plant(PlantId::new(1)).department(DepartmentId::new(12))
}

/// Decode through the registry, downcast, and check the bytes are reproduced
fn assert_round_trip<T>(original: &T)
where
    T: TransmissionType + PartialEq + std::fmt::Debug,
{
    let bytes = to_bytes(original).unwrap();
    let decoded = registry()
        .decode_as::<T>(&bytes, SchemaVersion::CURRENT)
        .expect("decodes");
    assert_eq!(&decoded, original);
    assert_eq!(to_bytes(&decoded).unwrap(), bytes, "re-encode of {}", T::NAME);
}

#[test]
fn test_system_transmissions() {
    assert_round_trip(&UserLogonT::new(UserId::new(2), "ws-44").with_client_version("12.2.0"));
    assert_round_trip(&UserLogonT::new(UserId::new(2), ""));
    assert_round_trip(&UserLogoffT::new(UserId::new(2)).with_reason(LogoffReason::ForcedByAdministrator));
    assert_round_trip(&ScenarioChecksumT::new(header(), scenario(), u64::MAX, 123_456));
}

#[test]
fn test_simulation_and_optimize() {
    assert_round_trip(
        &SimulationControlT::new(header(), scenario(), SimulationAction::StepForward, Ticks::new(99))
            .with_speed(dec!(60)),
    );
    assert_round_trip(
        &OptimizeRuleUpdateT::new(header(), scenario(), "Minimize setups")
            .with_factor(OptimizeFactor::new("setup", dec!(4.25)))
            .with_frozen_span(7_200 * types::TICKS_PER_SECOND),
    );
}

#[test]
fn test_resource_transmissions() {
    let resource = department().resource(ResourceId::new(700));

    let mut edit = ResourceEditT::new(header(), resource);
    edit.set_name("5-axis mill");
    edit.set_setup_efficiency(dec!(0.85));
    assert_round_trip(&edit);

    assert_round_trip(
        &CapacityIntervalChangeT::new(
            header(),
            resource,
            CapacityIntervalId::new(9),
            Ticks::new(1_000),
            Ticks::new(9_000),
        )
        .with_capacity(dec!(1.5))
        .with_kind(IntervalKind::Overtime),
    );

    assert_round_trip(
        &ResourceImportT::new(header(), department())
            .with_row(ResourceImportRow::new("MILL-5AX", "5-axis mill", dec!(1)))
            .with_row(ResourceImportRow::new("SAW-2", "Band saw", dec!(0.5))),
    );
}

#[test]
fn test_job_transmissions() {
    let job = scenario().job(JobId::new(8_001));

    let mut edit = JobEditT::new(header(), job);
    edit.set_name("Bracket 44-A");
    edit.set_need_date(Ticks::new(640_000_000_000));
    assert_round_trip(&edit);

    let activity = job
        .manufacturing_order(ManufacturingOrderId::new(1))
        .operation(OperationId::new(20))
        .activity(ActivityId::new(300));
    assert_round_trip(
        &ActivityFinishT::new(header(), activity, dec!(48), Ticks::new(5_000)).with_scrap(dec!(2)),
    );
}

#[test]
fn test_every_kind_has_a_registered_factory() {
    let registry = registry();
    assert_eq!(registry.len(), TransmissionKind::ALL.len());
    for kind in TransmissionKind::ALL {
        assert_eq!(registry.name_of(kind.type_id()), Some(kind.name()), "{kind:?}");
    }
}

#[test]
fn test_scenario_id_peek_matches_full_decode() {
    let registry = registry();
    let resource = department().resource(ResourceId::new(3));
    let mut edit = ResourceEditT::new(header(), resource);
    edit.set_active(true);
    let bytes = to_bytes(&edit).unwrap();

    let peeked = registry.peek_scenario_id(&bytes, SchemaVersion::CURRENT).unwrap();
    let decoded = registry.decode(&bytes, SchemaVersion::CURRENT).unwrap();
    assert_eq!(peeked, Some(ScenarioId::new(4)));
    assert_eq!(peeked, decoded.scenario_id());

    let logon = to_bytes(&UserLogonT::new(UserId::new(1), "ws")).unwrap();
    assert_eq!(registry.peek_scenario_id(&logon, SchemaVersion::CURRENT).unwrap(), None);
}

/// Three optional decimals, only the middle one set
#[test]
fn test_positional_presence_keeps_unset_slots() {
    let resource = department().resource(ResourceId::new(55));
    let mut edit = ResourceEditT::new(header(), resource);
    edit.set_overtime_hourly_cost(dec!(87.50));
    let bytes = to_bytes(&edit).unwrap();

    let decoded = registry()
        .decode_as::<ResourceEditT>(&bytes, SchemaVersion::CURRENT)
        .unwrap();

    use codec::catalog::resource_edit_fields as fields;
    let presence = decoded.presence();
    assert!(!presence.is_set(fields::CYCLE_EFFICIENCY));
    assert!(presence.is_set(fields::OVERTIME_HOURLY_COST));
    assert!(!presence.is_set(fields::SETUP_EFFICIENCY));

    assert_eq!(decoded.cycle_efficiency(), None);
    assert_eq!(decoded.overtime_hourly_cost(), Some(dec!(87.50)));
    assert_eq!(decoded.setup_efficiency(), None);
    assert_eq!(decoded.decimal_slots(), [Decimal::ZERO, dec!(87.50), Decimal::ZERO]);

    assert_eq!(to_bytes(&decoded).unwrap(), bytes);
}

#[test]
fn test_validation_is_separate_from_decoding() {
    let mut edit = ResourceEditT::new(header(), department().resource(ResourceId::new(1)));
    edit.set_cycle_efficiency(dec!(-0.1));
    let bytes = to_bytes(&edit).unwrap();

    let decoded = registry().decode(&bytes, SchemaVersion::CURRENT).unwrap();
    let error = decoded.validate().unwrap_err();
    assert_eq!(error.localization_key(), "validation.field.negative");
}
