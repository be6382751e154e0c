//! Resource, capacity and import transmissions
//!
//! `ResourceEditT` is the positional presence family: after the flag word
//! every slot is written whether set or not, and unset slots carry
//! placeholder values the receiver ignores. Decoded placeholders are kept so
//! re-encoding reproduces the original bytes.

use std::collections::HashSet;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use rust_decimal::Decimal;
use types::{CapacityIntervalId, ScenarioId, Ticks, ValidationError};

use crate::addressing::{AddressChain, DepartmentKey, ResourceKey};
use crate::error::ProtocolResult;
use crate::header::TransmissionHeader;
use crate::kinds::TransmissionKind;
use crate::presence::PresenceBits;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::{history, VersionBranch, VersionLadder};
use crate::wire::{WireDecode, WireEncode};
use crate::writer::TransmissionWriter;

/// Presence flag indices of `ResourceEditT`
pub mod resource_edit_fields {
    pub const NAME: u8 = 0;
    pub const ACTIVE: u8 = 1;
    pub const CYCLE_EFFICIENCY: u8 = 2;
    /// Since `history::RESOURCE_EDIT_OVERTIME_COST`
    pub const OVERTIME_HOURLY_COST: u8 = 3;
    /// Since `history::RESOURCE_EDIT_SETUP_EFFICIENCY`
    pub const SETUP_EFFICIENCY: u8 = 4;
}

use resource_edit_fields as fields;

/// Partial update of a resource's attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEditT {
    header: TransmissionHeader,
    resource: ResourceKey,
    presence: PresenceBits,
    name: String,
    active: bool,
    cycle_efficiency: Decimal,
    overtime_hourly_cost: Decimal,
    setup_efficiency: Decimal,
}

impl ResourceEditT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[
        VersionBranch {
            since: history::RESOURCE_EDIT_SETUP_EFFICIENCY,
            decode: Self::decode_with_setup_efficiency,
        },
        VersionBranch {
            since: history::RESOURCE_EDIT_OVERTIME_COST,
            decode: Self::decode_with_overtime_cost,
        },
        VersionBranch {
            since: history::INITIAL,
            decode: Self::decode_initial,
        },
    ];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    /// Edit with no field set
    pub fn new(header: TransmissionHeader, resource: ResourceKey) -> Self {
        Self {
            header,
            resource,
            presence: PresenceBits::EMPTY,
            name: String::new(),
            active: false,
            cycle_efficiency: Decimal::ZERO,
            overtime_hourly_cost: Decimal::ZERO,
            setup_efficiency: Decimal::ZERO,
        }
    }

    pub fn resource(&self) -> &ResourceKey {
        &self.resource
    }

    pub fn presence(&self) -> PresenceBits {
        self.presence
    }

    /// True iff any field was set
    pub fn has_edits(&self) -> bool {
        self.presence.any()
    }

    pub fn name(&self) -> Option<&str> {
        self.presence.is_set(fields::NAME).then_some(self.name.as_str())
    }

    pub fn active(&self) -> Option<bool> {
        self.presence.is_set(fields::ACTIVE).then_some(self.active)
    }

    pub fn cycle_efficiency(&self) -> Option<Decimal> {
        self.presence
            .is_set(fields::CYCLE_EFFICIENCY)
            .then_some(self.cycle_efficiency)
    }

    pub fn overtime_hourly_cost(&self) -> Option<Decimal> {
        self.presence
            .is_set(fields::OVERTIME_HOURLY_COST)
            .then_some(self.overtime_hourly_cost)
    }

    pub fn setup_efficiency(&self) -> Option<Decimal> {
        self.presence
            .is_set(fields::SETUP_EFFICIENCY)
            .then_some(self.setup_efficiency)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.presence.set(fields::NAME);
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.presence.set(fields::ACTIVE);
    }

    pub fn set_cycle_efficiency(&mut self, efficiency: Decimal) {
        self.cycle_efficiency = efficiency;
        self.presence.set(fields::CYCLE_EFFICIENCY);
    }

    pub fn set_overtime_hourly_cost(&mut self, cost: Decimal) {
        self.overtime_hourly_cost = cost;
        self.presence.set(fields::OVERTIME_HOURLY_COST);
    }

    pub fn set_setup_efficiency(&mut self, efficiency: Decimal) {
        self.setup_efficiency = efficiency;
        self.presence.set(fields::SETUP_EFFICIENCY);
    }

    /// Decimal slots exactly as they travel, placeholders included
    pub fn decimal_slots(&self) -> [Decimal; 3] {
        [
            self.cycle_efficiency,
            self.overtime_hourly_cost,
            self.setup_efficiency,
        ]
    }

    /// Fold a later edit of the same resource over this one
    ///
    /// Fields the later edit set overwrite ours; fields it left unset keep
    /// whatever this edit holds.
    pub fn merge(&mut self, later: &Self) -> Result<(), ValidationError> {
        if later.resource != self.resource {
            return Err(ValidationError::Custom {
                message: "cannot merge edits of different resources".to_string(),
            });
        }
        if let Some(name) = later.name() {
            self.set_name(name);
        }
        if let Some(active) = later.active() {
            self.set_active(active);
        }
        if let Some(efficiency) = later.cycle_efficiency() {
            self.set_cycle_efficiency(efficiency);
        }
        if let Some(cost) = later.overtime_hourly_cost() {
            self.set_overtime_hourly_cost(cost);
        }
        if let Some(efficiency) = later.setup_efficiency() {
            self.set_setup_efficiency(efficiency);
        }
        Ok(())
    }

    fn decode_with_setup_efficiency(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        Self::decode_with_overtime_cost(r, t)?;
        t.setup_efficiency = r.read_decimal()?;
        Ok(())
    }

    fn decode_with_overtime_cost(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.presence = r.get()?;
        t.name = r.read_string()?;
        t.active = r.read_bool()?;
        t.cycle_efficiency = r.read_decimal()?;
        t.overtime_hourly_cost = r.read_decimal()?;
        if !r.version().at_least(history::RESOURCE_EDIT_SETUP_EFFICIENCY) {
            t.presence.retain(PresenceBits::mask_of_first(fields::SETUP_EFFICIENCY));
        }
        Ok(())
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.presence = r.get()?;
        t.name = r.read_string()?;
        t.active = r.read_bool()?;
        t.cycle_efficiency = r.read_decimal()?;
        t.presence.retain(PresenceBits::mask_of_first(fields::OVERTIME_HOURLY_COST));
        Ok(())
    }
}

impl Transmission for ResourceEditT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.resource.write_chain(writer);
        writer.put(&self.presence);
        writer.write_string(&self.name);
        writer.write_bool(self.active);
        writer.write_decimal(self.cycle_efficiency);
        writer.write_decimal(self.overtime_hourly_cost);
        writer.write_decimal(self.setup_efficiency);
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.resource.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.resource.validate()?;
        if self.name().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        let negative = |value: Option<Decimal>| value.is_some_and(|v| v < Decimal::ZERO);
        if negative(self.cycle_efficiency()) {
            return Err(ValidationError::NegativeValue { field: "cycle_efficiency" });
        }
        if negative(self.overtime_hourly_cost()) {
            return Err(ValidationError::NegativeValue { field: "overtime_hourly_cost" });
        }
        if negative(self.setup_efficiency()) {
            return Err(ValidationError::NegativeValue { field: "setup_efficiency" });
        }
        Ok(())
    }
}

impl TransmissionType for ResourceEditT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::ResourceEdit as TransmissionTypeId;
    const NAME: &'static str = "ResourceEditT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let resource = ResourceKey::read_chain(reader)?;
        let mut edit = Self::new(header, resource);
        Self::LADDER.decode(reader, &mut edit)?;
        Ok(edit)
    }
}

/// Kind of capacity a calendar interval provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum IntervalKind {
    Online = 0,
    Offline = 1,
    Overtime = 2,
}

crate::impl_wire_enum!(IntervalKind);

/// Add or replace one capacity interval on a resource calendar
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityIntervalChangeT {
    header: TransmissionHeader,
    pub resource: ResourceKey,
    pub interval_id: CapacityIntervalId,
    pub start: Ticks,
    pub end: Ticks,
    /// Units of work per hour available inside the interval
    pub capacity: Decimal,
    pub kind: IntervalKind,
}

impl CapacityIntervalChangeT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(
        header: TransmissionHeader,
        resource: ResourceKey,
        interval_id: CapacityIntervalId,
        start: Ticks,
        end: Ticks,
    ) -> Self {
        Self {
            header,
            resource,
            interval_id,
            start,
            end,
            capacity: Decimal::ONE,
            kind: IntervalKind::Online,
        }
    }

    pub fn with_capacity(mut self, capacity: Decimal) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_kind(mut self, kind: IntervalKind) -> Self {
        self.kind = kind;
        self
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.interval_id = r.get()?;
        t.start = r.read_ticks()?;
        t.end = r.read_ticks()?;
        t.capacity = r.read_decimal()?;
        t.kind = r.read_enum()?;
        Ok(())
    }
}

impl Transmission for CapacityIntervalChangeT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.resource.write_chain(writer);
        writer.put(&self.interval_id);
        writer.write_ticks(self.start);
        writer.write_ticks(self.end);
        writer.write_decimal(self.capacity);
        writer.write_enum(self.kind);
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.resource.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.resource.validate()?;
        if self.interval_id.is_null() {
            return Err(ValidationError::NullId);
        }
        if self.end <= self.start {
            return Err(ValidationError::InvertedInterval {
                start: self.start.raw(),
                end: self.end.raw(),
            });
        }
        if self.capacity < Decimal::ZERO {
            return Err(ValidationError::NegativeValue { field: "capacity" });
        }
        Ok(())
    }
}

impl TransmissionType for CapacityIntervalChangeT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::CapacityIntervalChange as TransmissionTypeId;
    const NAME: &'static str = "CapacityIntervalChangeT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let resource = ResourceKey::read_chain(reader)?;
        let mut change = Self::new(
            header,
            resource,
            CapacityIntervalId::null(),
            Ticks::EPOCH,
            Ticks::EPOCH,
        );
        Self::LADDER.decode(reader, &mut change)?;
        Ok(change)
    }
}

/// One resource row of an ERP import
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceImportRow {
    /// Identifier of the resource in the ERP system
    pub external_id: String,
    pub name: String,
    pub capacity: Decimal,
}

impl ResourceImportRow {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, capacity: Decimal) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            capacity,
        }
    }
}

impl WireEncode for ResourceImportRow {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_string(&self.external_id);
        writer.write_string(&self.name);
        writer.write_decimal(self.capacity);
    }
}

impl WireDecode for ResourceImportRow {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            capacity: reader.read_decimal()?,
        })
    }
}

/// Bulk create or update of a department's resources from an ERP feed
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceImportT {
    header: TransmissionHeader,
    pub department: DepartmentKey,
    pub rows: Vec<ResourceImportRow>,
    /// Delete department resources absent from `rows`
    pub replace_existing: bool,
}

impl ResourceImportT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, department: DepartmentKey) -> Self {
        Self {
            header,
            department,
            rows: Vec::new(),
            replace_existing: false,
        }
    }

    pub fn with_row(mut self, row: ResourceImportRow) -> Self {
        self.rows.push(row);
        self
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.rows = r.read_seq()?;
        t.replace_existing = r.read_bool()?;
        Ok(())
    }
}

impl Transmission for ResourceImportT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.department.write_chain(writer);
        writer.write_seq(&self.rows);
        writer.write_bool(self.replace_existing);
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.department.scenario_id())
    }

    /// External ids must be present and unique within one import
    fn validate(&self) -> Result<(), ValidationError> {
        self.department.validate()?;
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.external_id.trim().is_empty() {
                return Err(ValidationError::EmptyField { field: "external_id" });
            }
            if !seen.insert(row.external_id.as_str()) {
                return Err(ValidationError::DuplicateExternalId {
                    external_id: row.external_id.clone(),
                });
            }
            if row.capacity < Decimal::ZERO {
                return Err(ValidationError::NegativeValue { field: "capacity" });
            }
        }
        Ok(())
    }
}

impl TransmissionType for ResourceImportT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::ResourceImport as TransmissionTypeId;
    const NAME: &'static str = "ResourceImportT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let department = DepartmentKey::read_chain(reader)?;
        let mut import = Self::new(header, department);
        Self::LADDER.decode(reader, &mut import)?;
        Ok(import)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::ScenarioKey;
    use crate::to_bytes;
    use crate::version::SchemaVersion;
    use rust_decimal_macros::dec;
    use types::{DepartmentId, PlantId, ResourceId, UserId};

    fn department() -> DepartmentKey {
        ScenarioKey::new(ScenarioId::new(1))
            .plant(PlantId::new(2))
            .department(DepartmentId::new(3))
    }

    fn header() -> TransmissionHeader {
        TransmissionHeader::new(UserId::ERP)
    }

    #[test]
    fn test_getters_follow_presence() {
        let mut edit = ResourceEditT::new(header(), department().resource(ResourceId::new(4)));
        assert!(!edit.has_edits());
        assert_eq!(edit.active(), None);

        edit.set_active(false);
        assert!(edit.has_edits());
        assert_eq!(edit.active(), Some(false));
        assert_eq!(edit.name(), None);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let resource = department().resource(ResourceId::new(4));
        let mut earlier = ResourceEditT::new(header(), resource);
        earlier.set_name("Lathe 4");
        earlier.set_cycle_efficiency(dec!(0.9));

        let mut later = ResourceEditT::new(header(), resource);
        later.set_cycle_efficiency(dec!(0.95));

        earlier.merge(&later).unwrap();
        assert_eq!(earlier.name(), Some("Lathe 4"));
        assert_eq!(earlier.cycle_efficiency(), Some(dec!(0.95)));
        assert_eq!(earlier.active(), None);

        let other = ResourceEditT::new(header(), department().resource(ResourceId::new(5)));
        assert!(earlier.merge(&other).is_err());
    }

    #[test]
    fn test_initial_stream_drops_later_flags() {
        let mut writer = TransmissionWriter::new();
        writer.write_u32(0b1_1111);
        writer.write_string("Mill");
        writer.write_bool(true);
        writer.write_decimal(dec!(1.1));
        let bytes = writer.into_bytes();

        let mut reader = TransmissionReader::new(&bytes, SchemaVersion::new(history::RESOURCE_EDIT_OVERTIME_COST - 1));
        let mut edit = ResourceEditT::new(header(), department().resource(ResourceId::new(4)));
        ResourceEditT::LADDER.decode(&mut reader, &mut edit).unwrap();
        assert!(reader.is_empty());
        assert_eq!(edit.presence().raw(), 0b111);
        assert_eq!(edit.overtime_hourly_cost(), None);
    }

    #[test]
    fn test_duplicate_external_ids_rejected() {
        let import = ResourceImportT::new(header(), department())
            .with_row(ResourceImportRow::new("LATHE-04", "Lathe 4", dec!(1)))
            .with_row(ResourceImportRow::new("MILL-01", "Mill 1", dec!(2)))
            .with_row(ResourceImportRow::new("LATHE-04", "Lathe 4b", dec!(1)));

        let error = import.validate().unwrap_err();
        assert_eq!(
            error,
            ValidationError::DuplicateExternalId {
                external_id: "LATHE-04".to_string()
            }
        );
        assert_eq!(error.localization_key(), "validation.external_id.duplicate");
    }

    #[test]
    fn test_import_round_trip_is_independent_of_validation() {
        // Invalid content still travels; validation happens on apply
        let import = ResourceImportT::new(header(), department())
            .with_row(ResourceImportRow::new("A", "One", dec!(1)))
            .with_row(ResourceImportRow::new("A", "Two", dec!(1)));
        let registry = TypeRegistry::with_catalog().unwrap();
        let decoded = registry
            .decode_as::<ResourceImportT>(&to_bytes(&import).unwrap(), SchemaVersion::CURRENT)
            .unwrap();
        assert_eq!(decoded, import);
    }

    #[test]
    fn test_inverted_interval() {
        let change = CapacityIntervalChangeT::new(
            header(),
            department().resource(ResourceId::new(4)),
            CapacityIntervalId::new(8),
            Ticks::new(500),
            Ticks::new(500),
        );
        assert_eq!(
            change.validate(),
            Err(ValidationError::InvertedInterval { start: 500, end: 500 })
        );
    }
}
