//! # Transmission Codec
//!
//! ## Purpose
//!
//! The "rules" layer of the scheduling transmission protocol. Every change
//! to a scenario travels as a transmission: a type id, a common header and a
//! type-specific body, written with little-endian primitives. This crate owns:
//!
//! - **Primitive codec**: `TransmissionWriter` / `TransmissionReader` for
//!   integers, decimals, ticks, strings, blobs and sequences
//! - **Presence bitsets**: `PresenceBits`, the 32-flag word that marks which
//!   fields of a partial update carry a value
//! - **Version ladders**: `VersionLadder` selects the newest body layout a
//!   reader's `SchemaVersion` understands, so old recordings keep decoding
//! - **Address chains**: typed scenario → plant → department → resource (and
//!   scenario → job → … → activity) keys written outermost first
//! - **Type registry**: `TypeRegistry` maps type ids to factories and decodes
//!   polymorphically into `Box<dyn Transmission>`
//! - **Packets**: `TransmissionPacket` carries an ordered batch of
//!   transmissions of any type, packets included
//! - **Catalog**: the concrete transmissions in [`catalog`]
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → libs/recording → services/inspector
//!     ↑           ↓            ↓
//! Ids, Ticks   Encode/      Append-only log,
//! Validation   Decode       Replay modes
//! ```
//!
//! ## What This Crate Does NOT Contain
//!
//! - Storage of transmission bytes (belongs in `libs/recording`)
//! - Applying transmissions to a scenario model
//! - Network transport
//!
//! ## Quick Start
//!
//! ```rust
//! use codec::catalog::JobEditT;
//! use codec::addressing::ScenarioKey;
//! use codec::{to_bytes, SchemaVersion, Transmission, TransmissionHeader, TypeRegistry};
//! use types::{JobId, ScenarioId, UserId};
//!
//! let registry = TypeRegistry::with_catalog().unwrap();
//!
//! let job = ScenarioKey::new(ScenarioId::new(1)).job(JobId::new(42));
//! let mut edit = JobEditT::new(TransmissionHeader::new(UserId::new(7)), job);
//! edit.set_priority(2);
//!
//! let bytes = to_bytes(&edit).unwrap();
//! let decoded = registry.decode(&bytes, SchemaVersion::CURRENT).unwrap();
//! assert_eq!(decoded.type_name(), "JobEditT");
//! assert_eq!(decoded.scenario_id(), Some(ScenarioId::new(1)));
//! ```

pub mod addressing;
pub mod catalog;
pub mod error;
pub mod header;
pub mod kinds;
pub mod packet;
pub mod presence;
pub mod reader;
pub mod registry;
pub mod transmission;
pub mod version;
pub mod wire;
pub mod writer;

pub use addressing::{AddressChain, AddressLevel};
pub use error::{ProtocolError, ProtocolResult};
pub use header::{SenderKind, TransmissionHeader};
pub use kinds::{TransmissionFamily, TransmissionKind};
pub use packet::TransmissionPacket;
pub use presence::{PresenceBits, PRESENCE_CAPACITY};
pub use reader::TransmissionReader;
pub use registry::{TransmissionFactory, TypeRegistry};
pub use transmission::{
    encode_transmission, to_bytes, Transmission, TransmissionType, TransmissionTypeId,
};
pub use version::{history, SchemaVersion, VersionBranch, VersionLadder};
pub use wire::{WireDecode, WireEncode, WireEnum};
pub use writer::TransmissionWriter;

// Re-exported for `impl_wire_enum!` expansions in downstream crates
#[doc(hidden)]
pub use num_enum;
