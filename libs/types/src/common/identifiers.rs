//! # Typed Identifiers
//!
//! Opaque fixed-width identifiers for every object a transmission can address.
//! Each identifier is a zero-cost `u64` wrapper, so the compiler rejects a
//! `PlantId` passed where a `ResourceId` is expected while the wire
//! representation stays a plain little-endian `u64`.
//!
//! ## Sentinels
//!
//! | Value            | Meaning                                   |
//! |------------------|-------------------------------------------|
//! | `0`              | no id / not yet assigned (`null()`)       |
//! | `u64::MAX - 1`   | reserved: ERP endpoint instigator         |
//! | `u64::MAX`       | reserved: the scheduling server itself    |
//!
//! Identifiers are never reused across distinct entities; the reserved range is
//! only meaningful for instigators but is rejected by `new_validated` for every
//! type so it cannot leak into ordinary object ids.
//!
//! ```rust
//! use types::{PlantId, UserId};
//!
//! let plant = PlantId::new_validated(12).unwrap();
//! assert_eq!(plant.inner(), 12);
//! assert!(PlantId::new_validated(0).is_err());
//! assert!(UserId::SERVER.is_reserved());
//! ```

use crate::common::errors::ValidationError;

/// First value of the reserved range at the top of the identifier space
pub const RESERVED_ID_FLOOR: u64 = u64::MAX - 1;

/// Macro for generating zero-cost typed ID wrappers
///
/// Creates a new type that wraps `u64` with complete type safety while maintaining
/// identical runtime performance and memory layout.
#[macro_export]
macro_rules! define_typed_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new typed ID
            #[inline(always)]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Create a new typed ID, rejecting the null sentinel and the reserved range
            #[inline]
            pub fn new_validated(id: u64) -> Result<Self, $crate::common::errors::ValidationError> {
                if id == 0 {
                    return Err($crate::common::errors::ValidationError::NullId);
                }
                if id >= $crate::common::identifiers::RESERVED_ID_FLOOR {
                    return Err($crate::common::errors::ValidationError::ReservedValue { value: id });
                }
                Ok(Self(id))
            }

            /// Create a new typed ID with range validation
            #[inline]
            pub fn new_with_range(
                id: u64,
                min: u64,
                max: u64,
            ) -> Result<Self, $crate::common::errors::ValidationError> {
                if id < min {
                    return Err($crate::common::errors::ValidationError::ValueTooSmall { value: id, min });
                }
                if id > max {
                    return Err($crate::common::errors::ValidationError::ValueTooLarge { value: id, max });
                }
                Ok(Self(id))
            }

            /// Extract the inner u64 value
            #[inline(always)]
            pub const fn inner(&self) -> u64 {
                self.0
            }

            /// Generate next sequential ID
            #[inline(always)]
            pub fn next(&self) -> Self {
                Self(self.0.wrapping_add(1))
            }

            /// Check if this is the "no id" sentinel
            #[inline(always)]
            pub const fn is_null(&self) -> bool {
                self.0 == 0
            }

            /// Check if this id falls in the reserved system range
            #[inline(always)]
            pub const fn is_reserved(&self) -> bool {
                self.0 >= $crate::common::identifiers::RESERVED_ID_FLOOR
            }

            /// Create the "no id" sentinel
            #[inline(always)]
            pub const fn null() -> Self {
                Self(0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            #[inline(always)]
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            #[inline(always)]
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        // Serializes as raw u64
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                <u64 as serde::Deserialize>::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_typed_id!(
    /// Identifier of a scheduling scenario (the outermost address link)
    ScenarioId
);

define_typed_id!(
    /// Identifier of a plant within a scenario
    PlantId
);

define_typed_id!(
    /// Identifier of a department within a plant
    DepartmentId
);

define_typed_id!(
    /// Identifier of a resource (machine, cell, crew) within a department
    ResourceId
);

define_typed_id!(
    /// Identifier of a capacity interval on a resource calendar
    CapacityIntervalId
);

define_typed_id!(
    /// Identifier of a job within a scenario
    JobId
);

define_typed_id!(
    /// Identifier of a manufacturing order within a job
    ManufacturingOrderId
);

define_typed_id!(
    /// Identifier of an operation within a manufacturing order
    OperationId
);

define_typed_id!(
    /// Identifier of an activity within an operation
    ActivityId
);

define_typed_id!(
    /// Identifier of the actor that instigated a transmission
    UserId
);

impl UserId {
    /// Instigator used for transmissions produced by an ERP integration endpoint
    pub const ERP: Self = Self(u64::MAX - 1);

    /// Instigator used for transmissions produced by the scheduling server
    pub const SERVER: Self = Self(u64::MAX);

    /// True for the ERP and server instigators
    pub fn is_system(&self) -> bool {
        *self == Self::ERP || *self == Self::SERVER
    }
}

/// Validate that an identifier is assigned, naming the link for the error
pub fn require_assigned(raw: u64, level: &'static str) -> Result<(), ValidationError> {
    if raw == 0 {
        return Err(ValidationError::NullAddressLink { level });
    }
    Ok(())
}
