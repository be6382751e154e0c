//! Type registry: polymorphic dispatch from type identifier to factory
//!
//! The registry is an explicit value built once at startup and read-only
//! afterwards. It is `Send + Sync`, so decoders on any thread can share it by
//! reference or through an `Arc`. Every lookup is a single hash-map access.
//!
//! ```rust
//! use codec::{SchemaVersion, TypeRegistry};
//! use codec::catalog::UserLogonT;
//! use types::UserId;
//!
//! let registry = TypeRegistry::with_catalog().unwrap();
//! let logon = UserLogonT::new(UserId::new(8), "planner-03");
//! let bytes = codec::to_bytes(&logon).unwrap();
//!
//! let decoded = registry.decode(&bytes, SchemaVersion::CURRENT).unwrap();
//! assert!(decoded.is_login());
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};
use types::ScenarioId;

use crate::catalog;
use crate::error::{ProtocolError, ProtocolResult};
use crate::header::TransmissionHeader;
use crate::reader::TransmissionReader;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::SchemaVersion;

/// Builds a concrete transmission once the type id and header are read
pub type TransmissionFactory = fn(
    TransmissionHeader,
    &mut TransmissionReader<'_>,
    &TypeRegistry,
) -> ProtocolResult<Box<dyn Transmission>>;

#[derive(Clone, Copy)]
struct RegistryEntry {
    name: &'static str,
    scenario_scoped: bool,
    factory: TransmissionFactory,
}

/// Mapping from type identifier to factory
#[derive(Default)]
pub struct TypeRegistry {
    entries: HashMap<TransmissionTypeId, RegistryEntry>,
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in transmission type
    pub fn with_catalog() -> ProtocolResult<Self> {
        let mut registry = Self::new();
        catalog::register_all(&mut registry)?;
        debug!(types = registry.len(), "Transmission catalog registered");
        Ok(registry)
    }

    /// Register a concrete type under its `TYPE_ID`
    pub fn register<T: TransmissionType>(&mut self) -> ProtocolResult<()> {
        self.insert(
            T::TYPE_ID,
            RegistryEntry {
                name: T::NAME,
                scenario_scoped: T::SCENARIO_SCOPED,
                factory: decode_boxed::<T>,
            },
        )
    }

    /// Register a hand-written factory for `type_id`
    pub fn register_factory(
        &mut self,
        type_id: TransmissionTypeId,
        name: &'static str,
        scenario_scoped: bool,
        factory: TransmissionFactory,
    ) -> ProtocolResult<()> {
        self.insert(
            type_id,
            RegistryEntry {
                name,
                scenario_scoped,
                factory,
            },
        )
    }

    fn insert(&mut self, type_id: TransmissionTypeId, entry: RegistryEntry) -> ProtocolResult<()> {
        if let Some(existing) = self.entries.get(&type_id) {
            return Err(ProtocolError::DuplicateRegistration {
                type_id,
                existing: existing.name,
                rejected: entry.name,
            });
        }
        debug!(type_id, name = entry.name, "Registered transmission type");
        self.entries.insert(type_id, entry);
        Ok(())
    }

    /// Factory registered for `type_id`
    pub fn resolve(&self, type_id: TransmissionTypeId) -> ProtocolResult<TransmissionFactory> {
        self.entry(type_id).map(|entry| entry.factory)
    }

    fn entry(&self, type_id: TransmissionTypeId) -> ProtocolResult<&RegistryEntry> {
        self.entries
            .get(&type_id)
            .ok_or_else(|| ProtocolError::unknown_type(type_id))
    }

    pub fn contains(&self, type_id: TransmissionTypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    pub fn name_of(&self, type_id: TransmissionTypeId) -> Option<&'static str> {
        self.entries.get(&type_id).map(|entry| entry.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers in ascending order
    pub fn type_ids(&self) -> Vec<TransmissionTypeId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Decode one `[type id][header][body]` from the reader's current position
    pub fn decode_from(&self, reader: &mut TransmissionReader<'_>) -> ProtocolResult<Box<dyn Transmission>> {
        let offset = reader.position();
        let type_id = reader.read_i32()?;
        let entry = self.entry(type_id).map_err(|error| {
            warn!(type_id, offset, version = %reader.version(), "Unknown transmission type");
            error
        })?;
        let header = TransmissionHeader::decode(reader)?;
        (entry.factory)(header, reader, self)
    }

    /// Decode a buffer holding exactly one transmission
    pub fn decode(&self, bytes: &[u8], version: SchemaVersion) -> ProtocolResult<Box<dyn Transmission>> {
        let mut reader = TransmissionReader::new(bytes, version);
        let transmission = self.decode_from(&mut reader)?;
        reader.expect_end(transmission.type_name())?;
        Ok(transmission)
    }

    /// Decode a buffer and require a specific concrete type
    pub fn decode_as<T: TransmissionType>(&self, bytes: &[u8], version: SchemaVersion) -> ProtocolResult<T> {
        let transmission = self.decode(bytes, version)?;
        let actual = transmission.type_name();
        let actual_id = transmission.transmission_type();
        transmission
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ProtocolError::TypeMismatch {
                expected: T::NAME,
                expected_id: T::TYPE_ID,
                actual,
                actual_id,
            })
    }

    /// Scenario addressed by a serialized transmission, without decoding its body
    ///
    /// Works for any registered type because every address chain starts with
    /// the scenario id. Returns `None` for types that are not scenario scoped.
    pub fn peek_scenario_id(&self, bytes: &[u8], version: SchemaVersion) -> ProtocolResult<Option<ScenarioId>> {
        let mut reader = TransmissionReader::new(bytes, version);
        let type_id = reader.read_i32()?;
        let entry = self.entry(type_id)?;
        if !entry.scenario_scoped {
            return Ok(None);
        }
        TransmissionHeader::decode(&mut reader)?;
        reader.get::<ScenarioId>().map(Some)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, entry.name))
            .collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("entries", &names).finish()
    }
}

fn decode_boxed<T: TransmissionType>(
    header: TransmissionHeader,
    reader: &mut TransmissionReader<'_>,
    registry: &TypeRegistry,
) -> ProtocolResult<Box<dyn Transmission>> {
    Ok(Box::new(T::decode_body(header, reader, registry)?))
}
