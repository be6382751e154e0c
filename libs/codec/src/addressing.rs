//! Identifier-chain addressing
//!
//! Transmissions name the object they concern through a chain of nested
//! identifiers, outermost first:
//!
//! ```text
//! ScenarioKey ─┬─ PlantKey ── DepartmentKey ── ResourceKey
//!              └─ JobKey ── ManufacturingOrderKey ── OperationKey ── ActivityKey
//! ```
//!
//! Each key owns its parent key plus one identifier, so a link at depth *n*
//! can only be built from a link at depth *n - 1*. Encoding writes the parent
//! chain before the key's own identifier. Every chain therefore starts with
//! the scenario id, which lets a reader peek at it before knowing the
//! concrete transmission type.
//!
//! ```rust
//! use codec::addressing::{AddressChain, ScenarioKey};
//! use types::{DepartmentId, PlantId, ResourceId, ScenarioId};
//!
//! let resource = ScenarioKey::new(ScenarioId::new(1))
//!     .plant(PlantId::new(2))
//!     .department(DepartmentId::new(3))
//!     .resource(ResourceId::new(4));
//! assert_eq!(resource.scenario_id(), ScenarioId::new(1));
//! assert!(resource.validate().is_ok());
//! ```

use std::fmt;

use types::common::identifiers::require_assigned;
use types::{
    ActivityId, DepartmentId, JobId, ManufacturingOrderId, OperationId, PlantId, ResourceId,
    ScenarioId, ValidationError,
};

use crate::error::ProtocolResult;
use crate::reader::TransmissionReader;
use crate::wire::{WireDecode, WireEncode};
use crate::writer::TransmissionWriter;

/// Position of a link in an address chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLevel {
    Scenario,
    Plant,
    Department,
    Resource,
    Job,
    ManufacturingOrder,
    Operation,
    Activity,
}

impl AddressLevel {
    pub fn name(self) -> &'static str {
        match self {
            AddressLevel::Scenario => "scenario",
            AddressLevel::Plant => "plant",
            AddressLevel::Department => "department",
            AddressLevel::Resource => "resource",
            AddressLevel::Job => "job",
            AddressLevel::ManufacturingOrder => "manufacturing order",
            AddressLevel::Operation => "operation",
            AddressLevel::Activity => "activity",
        }
    }
}

impl fmt::Display for AddressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete address chain ending at some level
pub trait AddressChain: Sized + Copy + fmt::Debug + PartialEq {
    /// Level of the innermost link
    const LEVEL: AddressLevel;

    /// Number of links, the scenario included
    const DEPTH: usize;

    /// Write every link, outermost first
    fn write_chain(&self, writer: &mut TransmissionWriter);

    /// Read every link, outermost first
    fn read_chain(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self>;

    /// Raw identifiers paired with their level, outermost first
    fn links(&self) -> Vec<(AddressLevel, u64)>;

    fn scenario_id(&self) -> ScenarioId;

    /// Reject chains with an unassigned link, naming the first offender
    fn validate(&self) -> Result<(), ValidationError> {
        for (level, raw) in self.links() {
            require_assigned(raw, level.name())?;
        }
        Ok(())
    }
}

/// Outermost address link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScenarioKey {
    scenario_id: ScenarioId,
}

impl ScenarioKey {
    pub const fn new(scenario_id: ScenarioId) -> Self {
        Self { scenario_id }
    }
}

impl AddressChain for ScenarioKey {
    const LEVEL: AddressLevel = AddressLevel::Scenario;
    const DEPTH: usize = 1;

    fn write_chain(&self, writer: &mut TransmissionWriter) {
        self.scenario_id.encode(writer);
    }

    fn read_chain(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            scenario_id: ScenarioId::decode(reader)?,
        })
    }

    fn links(&self) -> Vec<(AddressLevel, u64)> {
        vec![(AddressLevel::Scenario, self.scenario_id.inner())]
    }

    fn scenario_id(&self) -> ScenarioId {
        self.scenario_id
    }
}

/// Generate a key nested inside `$parent`, plus a constructor on the parent
macro_rules! address_link {
    (
        $(#[$meta:meta])*
        $name:ident {
            parent: $parent:ty,
            $field:ident: $id:ty,
            level: $level:ident,
            via: $ctor:ident,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            parent: $parent,
            $field: $id,
        }

        impl $name {
            pub const fn new(parent: $parent, $field: $id) -> Self {
                Self { parent, $field }
            }

            pub fn parent(&self) -> &$parent {
                &self.parent
            }

            pub fn $field(&self) -> $id {
                self.$field
            }
        }

        impl $parent {
            #[doc = concat!("Extend this address with a ", stringify!($field))]
            pub const fn $ctor(self, $field: $id) -> $name {
                $name::new(self, $field)
            }
        }

        impl AddressChain for $name {
            const LEVEL: AddressLevel = AddressLevel::$level;
            const DEPTH: usize = <$parent as AddressChain>::DEPTH + 1;

            fn write_chain(&self, writer: &mut TransmissionWriter) {
                self.parent.write_chain(writer);
                self.$field.encode(writer);
            }

            fn read_chain(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
                let parent = <$parent as AddressChain>::read_chain(reader)?;
                let $field = <$id as WireDecode>::decode(reader)?;
                Ok(Self { parent, $field })
            }

            fn links(&self) -> Vec<(AddressLevel, u64)> {
                let mut links = self.parent.links();
                links.push((Self::LEVEL, self.$field.inner()));
                links
            }

            fn scenario_id(&self) -> ScenarioId {
                self.parent.scenario_id()
            }
        }
    };
}

address_link! {
    /// Plant within a scenario
    PlantKey {
        parent: ScenarioKey,
        plant_id: PlantId,
        level: Plant,
        via: plant,
    }
}

address_link! {
    /// Department within a plant
    DepartmentKey {
        parent: PlantKey,
        department_id: DepartmentId,
        level: Department,
        via: department,
    }
}

address_link! {
    /// Resource within a department
    ResourceKey {
        parent: DepartmentKey,
        resource_id: ResourceId,
        level: Resource,
        via: resource,
    }
}

address_link! {
    /// Job within a scenario
    JobKey {
        parent: ScenarioKey,
        job_id: JobId,
        level: Job,
        via: job,
    }
}

address_link! {
    /// Manufacturing order within a job
    ManufacturingOrderKey {
        parent: JobKey,
        manufacturing_order_id: ManufacturingOrderId,
        level: ManufacturingOrder,
        via: manufacturing_order,
    }
}

address_link! {
    /// Operation within a manufacturing order
    OperationKey {
        parent: ManufacturingOrderKey,
        operation_id: OperationId,
        level: Operation,
        via: operation,
    }
}

address_link! {
    /// Activity within an operation
    ActivityKey {
        parent: OperationKey,
        activity_id: ActivityId,
        level: Activity,
        via: activity,
    }
}
