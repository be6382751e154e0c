//! Session and diagnostic transmissions
//!
//! None of these change committed scenario state. `UserLogonT` marks a login
//! boundary for replay.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use types::{ScenarioId, Ticks, UserId, ValidationError};

use crate::addressing::{AddressChain, ScenarioKey};
use crate::error::ProtocolResult;
use crate::header::{SenderKind, TransmissionHeader};
use crate::kinds::TransmissionKind;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::{history, VersionBranch, VersionLadder};
use crate::writer::TransmissionWriter;

/// A user opened a session
#[derive(Debug, Clone, PartialEq)]
pub struct UserLogonT {
    header: TransmissionHeader,
    pub user_id: UserId,
    pub workstation: String,
    pub client_version: Option<String>,
}

impl UserLogonT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(user_id: UserId, workstation: impl Into<String>) -> Self {
        Self {
            header: TransmissionHeader::new(user_id).with_sender(SenderKind::DirectUser),
            user_id,
            workstation: workstation.into(),
            client_version: None,
        }
    }

    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = Some(version.into());
        self
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.user_id = r.get()?;
        t.workstation = r.read_string()?;
        t.client_version = r.read_opt_string()?;
        Ok(())
    }
}

impl Transmission for UserLogonT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        writer.put(&self.user_id);
        writer.write_string(&self.workstation);
        writer.write_opt_string(self.client_version.as_deref());
    }

    fn mutates_scenario(&self) -> bool {
        false
    }

    fn is_login(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_null() {
            return Err(ValidationError::NullId);
        }
        Ok(())
    }
}

impl TransmissionType for UserLogonT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::UserLogon as TransmissionTypeId;
    const NAME: &'static str = "UserLogonT";

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let mut logon = Self {
            header,
            user_id: UserId::null(),
            workstation: String::new(),
            client_version: None,
        };
        Self::LADDER.decode(reader, &mut logon)?;
        Ok(logon)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum LogoffReason {
    UserRequested = 0,
    SessionTimeout = 1,
    ForcedByAdministrator = 2,
}

// Not derived: num_enum maps undefined discriminants to a `#[default]` variant
impl Default for LogoffReason {
    fn default() -> Self {
        Self::UserRequested
    }
}

crate::impl_wire_enum!(LogoffReason);

/// A user closed a session
#[derive(Debug, Clone, PartialEq)]
pub struct UserLogoffT {
    header: TransmissionHeader,
    pub user_id: UserId,
    pub reason: LogoffReason,
}

impl UserLogoffT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(user_id: UserId) -> Self {
        Self {
            header: TransmissionHeader::new(user_id).with_sender(SenderKind::DirectUser),
            user_id,
            reason: LogoffReason::UserRequested,
        }
    }

    pub fn with_reason(mut self, reason: LogoffReason) -> Self {
        self.reason = reason;
        self
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.user_id = r.get()?;
        t.reason = r.read_enum()?;
        Ok(())
    }
}

impl Transmission for UserLogoffT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        writer.put(&self.user_id);
        writer.write_enum(self.reason);
    }

    fn mutates_scenario(&self) -> bool {
        false
    }
}

impl TransmissionType for UserLogoffT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::UserLogoff as TransmissionTypeId;
    const NAME: &'static str = "UserLogoffT";

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let mut logoff = Self {
            header,
            user_id: UserId::null(),
            reason: LogoffReason::default(),
        };
        Self::LADDER.decode(reader, &mut logoff)?;
        Ok(logoff)
    }
}

/// Checksum of a scenario's state, compared across replicas to detect divergence
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioChecksumT {
    header: TransmissionHeader,
    pub scenario: ScenarioKey,
    pub checksum: u64,
    pub object_count: i32,
    pub computed_at: Ticks,
}

impl ScenarioChecksumT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, scenario: ScenarioKey, checksum: u64, object_count: i32) -> Self {
        let computed_at = header.timestamp;
        Self {
            header,
            scenario,
            checksum,
            object_count,
            computed_at,
        }
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.checksum = r.read_u64()?;
        t.object_count = r.read_i32()?;
        t.computed_at = r.read_ticks()?;
        Ok(())
    }
}

impl Transmission for ScenarioChecksumT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.scenario.write_chain(writer);
        writer.write_u64(self.checksum);
        writer.write_i32(self.object_count);
        writer.write_ticks(self.computed_at);
    }

    fn mutates_scenario(&self) -> bool {
        false
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.scenario.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.scenario.validate()
    }
}

impl TransmissionType for ScenarioChecksumT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::ScenarioChecksum as TransmissionTypeId;
    const NAME: &'static str = "ScenarioChecksumT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let scenario = ScenarioKey::read_chain(reader)?;
        let mut checksum = Self {
            header,
            scenario,
            checksum: 0,
            object_count: 0,
            computed_at: Ticks::EPOCH,
        };
        Self::LADDER.decode(reader, &mut checksum)?;
        Ok(checksum)
    }
}
