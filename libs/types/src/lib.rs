//! # Transmission Types Library
//!
//! Plain data types shared by every crate that speaks the scheduling
//! transmission protocol.
//!
//! ## Design Philosophy
//!
//! - **Typed Identifiers**: every addressable scheduling object has its own
//!   `u64` wrapper so a plant id can never be passed where a job id is expected
//! - **Well-Known Sentinels**: `0` means "no id / not yet assigned"; the top of
//!   the range is reserved for system instigators (server, ERP endpoint)
//! - **Tick Timestamps**: instants travel as 100ns tick counts, converted to
//!   calendar time only at the edges
//! - **Localizable Validation**: domain validation failures carry a stable key
//!   so the surrounding application can present them to end users
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{JobId, ScenarioId, Ticks, UserId};
//!
//! let scenario = ScenarioId::new(7);
//! let job = JobId::new(1001);
//! assert!(!scenario.is_null());
//! assert!(UserId::ERP.is_reserved());
//!
//! let now = Ticks::now();
//! assert!(now > Ticks::EPOCH);
//! # let _ = job;
//! ```

#[cfg(feature = "common")]
pub mod common;

#[cfg(feature = "common")]
pub use common::errors::ValidationError;

#[cfg(feature = "common")]
pub use common::identifiers::{
    ActivityId, CapacityIntervalId, DepartmentId, JobId, ManufacturingOrderId, OperationId,
    PlantId, ResourceId, ScenarioId, UserId,
};

#[cfg(feature = "common")]
pub use common::ticks::{Ticks, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
