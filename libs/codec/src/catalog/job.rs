//! Job and shop-floor transmissions
//!
//! `JobEditT` is the sparse presence family: after the flag word only the
//! fields whose bit is set are written, in flag order.

use rust_decimal::Decimal;
use types::{ScenarioId, Ticks, ValidationError};

use crate::addressing::{ActivityKey, AddressChain, JobKey};
use crate::error::ProtocolResult;
use crate::header::TransmissionHeader;
use crate::kinds::TransmissionKind;
use crate::presence::PresenceBits;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::{history, VersionBranch, VersionLadder};
use crate::writer::TransmissionWriter;

/// Presence flag indices of `JobEditT`
pub mod job_edit_fields {
    pub const NAME: u8 = 0;
    pub const PRIORITY: u8 = 1;
    pub const NEED_DATE: u8 = 2;
    pub const HOT: u8 = 3;
    /// Since `history::JOB_EDIT_HOT_REASON`
    pub const HOT_REASON: u8 = 4;
}

use job_edit_fields as fields;

/// Partial update of a job's planning attributes
#[derive(Debug, Clone, PartialEq)]
pub struct JobEditT {
    header: TransmissionHeader,
    job: JobKey,
    presence: PresenceBits,
    name: String,
    priority: i32,
    need_date: Ticks,
    hot: bool,
    hot_reason: String,
}

impl JobEditT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[
        VersionBranch {
            since: history::JOB_EDIT_HOT_REASON,
            decode: Self::decode_with_hot_reason,
        },
        VersionBranch {
            since: history::INITIAL,
            decode: Self::decode_initial,
        },
    ];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, job: JobKey) -> Self {
        Self {
            header,
            job,
            presence: PresenceBits::EMPTY,
            name: String::new(),
            priority: 0,
            need_date: Ticks::EPOCH,
            hot: false,
            hot_reason: String::new(),
        }
    }

    pub fn job(&self) -> &JobKey {
        &self.job
    }

    pub fn presence(&self) -> PresenceBits {
        self.presence
    }

    pub fn has_edits(&self) -> bool {
        self.presence.any()
    }

    pub fn name(&self) -> Option<&str> {
        self.presence.is_set(fields::NAME).then_some(self.name.as_str())
    }

    pub fn priority(&self) -> Option<i32> {
        self.presence.is_set(fields::PRIORITY).then_some(self.priority)
    }

    pub fn need_date(&self) -> Option<Ticks> {
        self.presence.is_set(fields::NEED_DATE).then_some(self.need_date)
    }

    pub fn hot(&self) -> Option<bool> {
        self.presence.is_set(fields::HOT).then_some(self.hot)
    }

    pub fn hot_reason(&self) -> Option<&str> {
        self.presence
            .is_set(fields::HOT_REASON)
            .then_some(self.hot_reason.as_str())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.presence.set(fields::NAME);
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
        self.presence.set(fields::PRIORITY);
    }

    pub fn set_need_date(&mut self, need_date: Ticks) {
        self.need_date = need_date;
        self.presence.set(fields::NEED_DATE);
    }

    pub fn set_hot(&mut self, hot: bool) {
        self.hot = hot;
        self.presence.set(fields::HOT);
    }

    pub fn set_hot_reason(&mut self, reason: impl Into<String>) {
        self.hot_reason = reason.into();
        self.presence.set(fields::HOT_REASON);
    }

    /// Fold a later edit of the same job over this one
    pub fn merge(&mut self, later: &Self) -> Result<(), ValidationError> {
        if later.job != self.job {
            return Err(ValidationError::Custom {
                message: "cannot merge edits of different jobs".to_string(),
            });
        }
        if let Some(name) = later.name() {
            self.set_name(name);
        }
        if let Some(priority) = later.priority() {
            self.set_priority(priority);
        }
        if let Some(need_date) = later.need_date() {
            self.set_need_date(need_date);
        }
        if let Some(hot) = later.hot() {
            self.set_hot(hot);
        }
        if let Some(reason) = later.hot_reason() {
            self.set_hot_reason(reason);
        }
        Ok(())
    }

    fn read_present(&mut self, r: &mut TransmissionReader<'_>) -> ProtocolResult<()> {
        if self.presence.is_set(fields::NAME) {
            self.name = r.read_string()?;
        }
        if self.presence.is_set(fields::PRIORITY) {
            self.priority = r.read_i32()?;
        }
        if self.presence.is_set(fields::NEED_DATE) {
            self.need_date = r.read_ticks()?;
        }
        if self.presence.is_set(fields::HOT) {
            self.hot = r.read_bool()?;
        }
        if self.presence.is_set(fields::HOT_REASON) {
            self.hot_reason = r.read_string()?;
        }
        Ok(())
    }

    fn decode_with_hot_reason(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.presence = r.get()?;
        t.read_present(r)
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.presence = r.get()?;
        // Bits past the fields this version knew carry no data
        t.presence.retain(PresenceBits::mask_of_first(fields::HOT_REASON));
        t.read_present(r)
    }
}

impl Transmission for JobEditT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.job.write_chain(writer);
        writer.put(&self.presence);
        if let Some(name) = self.name() {
            writer.write_string(name);
        }
        if let Some(priority) = self.priority() {
            writer.write_i32(priority);
        }
        if let Some(need_date) = self.need_date() {
            writer.write_ticks(need_date);
        }
        if let Some(hot) = self.hot() {
            writer.write_bool(hot);
        }
        if let Some(reason) = self.hot_reason() {
            writer.write_string(reason);
        }
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.job.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.job.validate()?;
        if self.name().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        if self.priority().is_some_and(|priority| priority < 0) {
            return Err(ValidationError::NegativeValue { field: "priority" });
        }
        Ok(())
    }
}

impl TransmissionType for JobEditT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::JobEdit as TransmissionTypeId;
    const NAME: &'static str = "JobEditT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let job = JobKey::read_chain(reader)?;
        let mut edit = Self::new(header, job);
        Self::LADDER.decode(reader, &mut edit)?;
        Ok(edit)
    }
}

/// Shop-floor report that an activity finished
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFinishT {
    header: TransmissionHeader,
    pub activity: ActivityKey,
    pub good_qty: Decimal,
    pub finished_at: Ticks,
    /// Reported separately since `history::ACTIVITY_FINISH_SCRAP`; zero before
    pub scrap_qty: Decimal,
}

impl ActivityFinishT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[
        VersionBranch {
            since: history::ACTIVITY_FINISH_SCRAP,
            decode: Self::decode_with_scrap,
        },
        VersionBranch {
            since: history::INITIAL,
            decode: Self::decode_initial,
        },
    ];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, activity: ActivityKey, good_qty: Decimal, finished_at: Ticks) -> Self {
        Self {
            header,
            activity,
            good_qty,
            finished_at,
            scrap_qty: Decimal::ZERO,
        }
    }

    pub fn with_scrap(mut self, scrap_qty: Decimal) -> Self {
        self.scrap_qty = scrap_qty;
        self
    }

    fn decode_with_scrap(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        Self::decode_initial(r, t)?;
        t.scrap_qty = r.read_decimal()?;
        Ok(())
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.good_qty = r.read_decimal()?;
        t.finished_at = r.read_ticks()?;
        Ok(())
    }
}

impl Transmission for ActivityFinishT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.activity.write_chain(writer);
        writer.write_decimal(self.good_qty);
        writer.write_ticks(self.finished_at);
        writer.write_decimal(self.scrap_qty);
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.activity.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.activity.validate()?;
        if self.good_qty < Decimal::ZERO {
            return Err(ValidationError::NegativeValue { field: "good_qty" });
        }
        if self.scrap_qty < Decimal::ZERO {
            return Err(ValidationError::NegativeValue { field: "scrap_qty" });
        }
        Ok(())
    }
}

impl TransmissionType for ActivityFinishT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::ActivityFinish as TransmissionTypeId;
    const NAME: &'static str = "ActivityFinishT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let activity = ActivityKey::read_chain(reader)?;
        let mut finish = Self::new(header, activity, Decimal::ZERO, Ticks::EPOCH);
        Self::LADDER.decode(reader, &mut finish)?;
        Ok(finish)
    }
}
