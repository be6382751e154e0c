//! Built-in transmission catalog
//!
//! | id | type | address |
//! |----|------|---------|
//! | 1  | `TransmissionPacket` | none |
//! | 2  | `UserLogonT` | none |
//! | 3  | `UserLogoffT` | none |
//! | 5  | `ScenarioChecksumT` | scenario |
//! | 10 | `SimulationControlT` | scenario |
//! | 20 | `OptimizeRuleUpdateT` | scenario |
//! | 30 | `ResourceEditT` | resource |
//! | 31 | `CapacityIntervalChangeT` | resource |
//! | 32 | `ResourceImportT` | department |
//! | 40 | `JobEditT` | job |
//! | 41 | `ActivityFinishT` | activity |
//!
//! Each body is its address chain followed by its own fields, read through
//! the type's version ladder.

pub mod job;
pub mod optimize;
pub mod resource;
pub mod simulation;
pub mod system;

pub use crate::packet::TransmissionPacket;
pub use job::{job_edit_fields, ActivityFinishT, JobEditT};
pub use optimize::{OptimizeFactor, OptimizeRuleUpdateT};
pub use resource::{
    resource_edit_fields, CapacityIntervalChangeT, IntervalKind, ResourceEditT, ResourceImportRow,
    ResourceImportT,
};
pub use simulation::{SimulationAction, SimulationControlT};
pub use system::{LogoffReason, ScenarioChecksumT, UserLogoffT, UserLogonT};

use crate::error::ProtocolResult;
use crate::registry::TypeRegistry;

/// Register every built-in transmission type
pub fn register_all(registry: &mut TypeRegistry) -> ProtocolResult<()> {
    registry.register::<TransmissionPacket>()?;
    registry.register::<UserLogonT>()?;
    registry.register::<UserLogoffT>()?;
    registry.register::<ScenarioChecksumT>()?;
    registry.register::<SimulationControlT>()?;
    registry.register::<OptimizeRuleUpdateT>()?;
    registry.register::<ResourceEditT>()?;
    registry.register::<CapacityIntervalChangeT>()?;
    registry.register::<ResourceImportT>()?;
    registry.register::<JobEditT>()?;
    registry.register::<ActivityFinishT>()?;
    Ok(())
}
