//! Built-in transmission catalog as a closed enum
//!
//! `TransmissionKind` lists every type this build ships, for exhaustive
//! matching. The registry stays open: extension types above
//! `type_ids::EXTENSION_FLOOR` register factories at runtime without
//! appearing here.

use config::protocol::type_ids;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::transmission::TransmissionTypeId;

/// Type identifiers of the built-in catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum TransmissionKind {
    // System (1-9)
    Packet = 1,
    UserLogon = 2,
    UserLogoff = 3,
    ScenarioChecksum = 5,

    // Simulation (10-19)
    SimulationControl = 10,

    // Optimize (20-29)
    OptimizeRuleUpdate = 20,

    // Resource (30-39)
    ResourceEdit = 30,
    CapacityIntervalChange = 31,
    ResourceImport = 32,

    // Job (40-49)
    JobEdit = 40,
    ActivityFinish = 41,
}

impl TransmissionKind {
    /// Every built-in kind in identifier order
    pub const ALL: [TransmissionKind; 11] = [
        TransmissionKind::Packet,
        TransmissionKind::UserLogon,
        TransmissionKind::UserLogoff,
        TransmissionKind::ScenarioChecksum,
        TransmissionKind::SimulationControl,
        TransmissionKind::OptimizeRuleUpdate,
        TransmissionKind::ResourceEdit,
        TransmissionKind::CapacityIntervalChange,
        TransmissionKind::ResourceImport,
        TransmissionKind::JobEdit,
        TransmissionKind::ActivityFinish,
    ];

    pub fn type_id(self) -> TransmissionTypeId {
        self.into()
    }

    pub fn from_type_id(type_id: TransmissionTypeId) -> Option<Self> {
        Self::try_from(type_id).ok()
    }

    /// Concrete type name carried by this kind
    pub fn name(self) -> &'static str {
        match self {
            TransmissionKind::Packet => "TransmissionPacket",
            TransmissionKind::UserLogon => "UserLogonT",
            TransmissionKind::UserLogoff => "UserLogoffT",
            TransmissionKind::ScenarioChecksum => "ScenarioChecksumT",
            TransmissionKind::SimulationControl => "SimulationControlT",
            TransmissionKind::OptimizeRuleUpdate => "OptimizeRuleUpdateT",
            TransmissionKind::ResourceEdit => "ResourceEditT",
            TransmissionKind::CapacityIntervalChange => "CapacityIntervalChangeT",
            TransmissionKind::ResourceImport => "ResourceImportT",
            TransmissionKind::JobEdit => "JobEditT",
            TransmissionKind::ActivityFinish => "ActivityFinishT",
        }
    }

    pub fn family(self) -> TransmissionFamily {
        match self {
            TransmissionKind::Packet
            | TransmissionKind::UserLogon
            | TransmissionKind::UserLogoff
            | TransmissionKind::ScenarioChecksum => TransmissionFamily::System,
            TransmissionKind::SimulationControl => TransmissionFamily::Simulation,
            TransmissionKind::OptimizeRuleUpdate => TransmissionFamily::Optimize,
            TransmissionKind::ResourceEdit
            | TransmissionKind::CapacityIntervalChange
            | TransmissionKind::ResourceImport => TransmissionFamily::Resource,
            TransmissionKind::JobEdit | TransmissionKind::ActivityFinish => TransmissionFamily::Job,
        }
    }

    /// Body starts with a scenario id
    pub fn is_scenario_scoped(self) -> bool {
        !matches!(
            self,
            TransmissionKind::Packet | TransmissionKind::UserLogon | TransmissionKind::UserLogoff
        )
    }
}

/// Groups of transmissions sharing an identifier range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransmissionFamily {
    System,
    Simulation,
    Optimize,
    Resource,
    Job,
    Extension,
}

impl TransmissionFamily {
    /// Family whose range contains `type_id`, if any
    pub fn of(type_id: TransmissionTypeId) -> Option<Self> {
        match type_id {
            id if type_ids::SYSTEM_RANGE.contains(&id) => Some(Self::System),
            id if type_ids::SIMULATION_RANGE.contains(&id) => Some(Self::Simulation),
            id if type_ids::OPTIMIZE_RANGE.contains(&id) => Some(Self::Optimize),
            id if type_ids::RESOURCE_RANGE.contains(&id) => Some(Self::Resource),
            id if type_ids::JOB_RANGE.contains(&id) => Some(Self::Job),
            id if id >= type_ids::EXTENSION_FLOOR => Some(Self::Extension),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Simulation => "simulation",
            Self::Optimize => "optimize",
            Self::Resource => "resource",
            Self::Job => "job",
            Self::Extension => "extension",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_family_matches_range() {
        for kind in TransmissionKind::ALL {
            assert_eq!(
                TransmissionFamily::of(kind.type_id()),
                Some(kind.family()),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_identifier_conversion() {
        assert_eq!(TransmissionKind::from_type_id(30), Some(TransmissionKind::ResourceEdit));
        assert_eq!(TransmissionKind::from_type_id(4), None);
        assert_eq!(TransmissionKind::JobEdit.type_id(), 40);
    }

    #[test]
    fn test_all_is_sorted_and_unique() {
        let ids: Vec<_> = TransmissionKind::ALL.iter().map(|k| k.type_id()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_unassigned_gap() {
        assert_eq!(TransmissionFamily::of(0), None);
        assert_eq!(TransmissionFamily::of(50), None);
        assert_eq!(TransmissionFamily::of(10_000), Some(TransmissionFamily::Extension));
    }
}
