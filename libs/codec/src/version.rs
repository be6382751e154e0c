//! Schema versions and version ladders
//!
//! A stream carries one schema version, supplied by the session that opened
//! it. Every message type that ever changed layout owns a `VersionLadder`: an
//! ordered table of `(since, decode fn)` branches, newest first. Decoding
//! picks the first branch whose `since` is at or below the stream version and
//! runs only that branch. Each branch reads exactly the layout its era wrote
//! and never calls a newer branch.
//!
//! Writers always emit the newest layout.
//!
//! ```rust
//! use codec::version::{SchemaVersion, VersionBranch, VersionLadder};
//! use codec::{ProtocolResult, TransmissionReader};
//!
//! #[derive(Default)]
//! struct Sample {
//!     a: i32,
//!     b: i32,
//! }
//!
//! fn read_v2(r: &mut TransmissionReader<'_>, s: &mut Sample) -> ProtocolResult<()> {
//!     s.a = r.read_i32()?;
//!     s.b = r.read_i32()?;
//!     Ok(())
//! }
//!
//! fn read_v1(r: &mut TransmissionReader<'_>, s: &mut Sample) -> ProtocolResult<()> {
//!     s.a = r.read_i32()?;
//!     Ok(())
//! }
//!
//! const BRANCHES: &[VersionBranch<Sample>] = &[
//!     VersionBranch { since: 2, decode: read_v2 },
//!     VersionBranch { since: 1, decode: read_v1 },
//! ];
//! const LADDER: VersionLadder<Sample> = VersionLadder::new("Sample", BRANCHES);
//!
//! let bytes = 7i32.to_le_bytes();
//! let mut reader = TransmissionReader::new(&bytes, SchemaVersion::new(1));
//! let mut sample = Sample::default();
//! assert!(LADDER.decode(&mut reader, &mut sample).unwrap());
//! assert_eq!((sample.a, sample.b), (7, 0));
//! ```

use std::fmt;

use tracing::debug;

use crate::error::ProtocolResult;
use crate::reader::TransmissionReader;

/// Named layout cutovers
///
/// Each constant is the first schema version whose writers produced the
/// named layout. Values are permanent: a stream stamped with any of them must
/// stay readable forever.
pub mod history {
    /// First published layout of every message type
    pub const INITIAL: u32 = 1;

    /// Header gains the optional description
    pub const HEADER_DESCRIPTION: u32 = 60;

    /// Header gains sender classification and flags
    pub const HEADER_SENDER_FLAGS: u32 = 100;

    /// `ResourceEditT` gains `overtime_hourly_cost` (flag 3)
    pub const RESOURCE_EDIT_OVERTIME_COST: u32 = 215;

    /// `ResourceEditT` gains `setup_efficiency` (flag 4)
    pub const RESOURCE_EDIT_SETUP_EFFICIENCY: u32 = 216;

    /// `OptimizeRuleUpdateT` gains `frozen_span`
    pub const OPTIMIZE_RULE_FROZEN_SPAN: u32 = 300;

    /// `JobEditT` gains `hot_reason` (flag 4)
    pub const JOB_EDIT_HOT_REASON: u32 = 330;

    /// `ActivityFinishT` gains `scrap_qty`
    pub const ACTIVITY_FINISH_SCRAP: u32 = 412;

    /// Version written by this build
    pub const CURRENT: u32 = ACTIVITY_FINISH_SCRAP;
}

/// Schema version of a stream or session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    /// Version written by this build
    pub const CURRENT: Self = Self(history::CURRENT);

    #[inline(always)]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True when streams of this version contain the layout introduced at `since`
    #[inline(always)]
    pub const fn at_least(self, since: u32) -> bool {
        self.0 >= since
    }

    /// True when this build writes a layout a reader at `self` may not know
    pub fn is_older_than_current(self) -> bool {
        self < Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Decode function for one historical layout
pub type DecodeFn<T> = fn(&mut TransmissionReader<'_>, &mut T) -> ProtocolResult<()>;

/// One row of a version ladder
pub struct VersionBranch<T: 'static> {
    /// First schema version whose writers produced this layout
    pub since: u32,
    pub decode: DecodeFn<T>,
}

/// Ordered decode table, newest branch first
pub struct VersionLadder<T: 'static> {
    name: &'static str,
    branches: &'static [VersionBranch<T>],
}

impl<T: 'static> VersionLadder<T> {
    /// Build a ladder; fails const evaluation unless `since` strictly descends
    pub const fn new(name: &'static str, branches: &'static [VersionBranch<T>]) -> Self {
        assert!(!branches.is_empty(), "version ladder needs at least one branch");
        let mut index = 1;
        while index < branches.len() {
            assert!(
                branches[index - 1].since > branches[index].since,
                "version ladder branches must be ordered newest to oldest"
            );
            index += 1;
        }
        Self { name, branches }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn branches(&self) -> &'static [VersionBranch<T>] {
        self.branches
    }

    /// Version the newest branch reads
    pub fn newest(&self) -> u32 {
        self.branches[0].since
    }

    /// Version the oldest branch reads
    pub fn oldest(&self) -> u32 {
        self.branches[self.branches.len() - 1].since
    }

    /// Branch governing `version`, if any
    pub fn select(&self, version: SchemaVersion) -> Option<&'static VersionBranch<T>> {
        self.branches.iter().find(|branch| version.at_least(branch.since))
    }

    /// Run the selected branch against `target`
    ///
    /// Returns `false` when `version` predates every branch; `target` then
    /// keeps its defaults and nothing is consumed.
    pub fn decode(&self, reader: &mut TransmissionReader<'_>, target: &mut T) -> ProtocolResult<bool> {
        match self.select(reader.version()) {
            Some(branch) => {
                (branch.decode)(reader, target)?;
                Ok(true)
            }
            None => {
                debug!(
                    ladder = self.name,
                    version = %reader.version(),
                    oldest = self.oldest(),
                    "Version predates every layout; keeping defaults"
                );
                Ok(false)
            }
        }
    }
}

impl<T: 'static> fmt::Debug for VersionLadder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cutovers: Vec<u32> = self.branches.iter().map(|branch| branch.since).collect();
        f.debug_struct("VersionLadder")
            .field("name", &self.name)
            .field("cutovers", &cutovers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::TransmissionWriter;

    #[derive(Debug, Default, PartialEq)]
    struct Gauge {
        reading: i32,
        unit: Option<String>,
        calibrated: bool,
    }

    fn read_calibrated(r: &mut TransmissionReader<'_>, g: &mut Gauge) -> ProtocolResult<()> {
        g.reading = r.read_i32()?;
        g.unit = r.read_opt_string()?;
        g.calibrated = r.read_bool()?;
        Ok(())
    }

    fn read_with_unit(r: &mut TransmissionReader<'_>, g: &mut Gauge) -> ProtocolResult<()> {
        g.reading = r.read_i32()?;
        g.unit = r.read_opt_string()?;
        Ok(())
    }

    fn read_bare(r: &mut TransmissionReader<'_>, g: &mut Gauge) -> ProtocolResult<()> {
        g.reading = r.read_i32()?;
        Ok(())
    }

    const GAUGE_BRANCHES: &[VersionBranch<Gauge>] = &[
        VersionBranch { since: 30, decode: read_calibrated },
        VersionBranch { since: 20, decode: read_with_unit },
        VersionBranch { since: 10, decode: read_bare },
    ];
    const GAUGE: VersionLadder<Gauge> = VersionLadder::new("Gauge", GAUGE_BRANCHES);

    fn decode_at(bytes: &[u8], version: u32) -> (Gauge, bool, usize) {
        let mut reader = TransmissionReader::new(bytes, SchemaVersion::new(version));
        let mut gauge = Gauge::default();
        let applied = GAUGE.decode(&mut reader, &mut gauge).unwrap();
        (gauge, applied, reader.position())
    }

    #[test]
    fn test_branch_selection_boundaries() {
        assert_eq!(GAUGE.select(SchemaVersion::new(9)).map(|b| b.since), None);
        assert_eq!(GAUGE.select(SchemaVersion::new(10)).map(|b| b.since), Some(10));
        assert_eq!(GAUGE.select(SchemaVersion::new(19)).map(|b| b.since), Some(10));
        assert_eq!(GAUGE.select(SchemaVersion::new(20)).map(|b| b.since), Some(20));
        assert_eq!(GAUGE.select(SchemaVersion::new(29)).map(|b| b.since), Some(20));
        assert_eq!(GAUGE.select(SchemaVersion::new(30)).map(|b| b.since), Some(30));
        assert_eq!(GAUGE.select(SchemaVersion::new(u32::MAX)).map(|b| b.since), Some(30));
        assert_eq!((GAUGE.newest(), GAUGE.oldest()), (30, 10));
    }

    #[test]
    fn test_each_branch_reads_its_own_layout() {
        let mut w = TransmissionWriter::new();
        w.write_i32(5);
        w.write_opt_string(Some("bar"));
        let middle = w.into_bytes();

        let (gauge, applied, consumed) = decode_at(&middle, 25);
        assert!(applied);
        assert_eq!(consumed, middle.len());
        assert_eq!(gauge.unit.as_deref(), Some("bar"));
        assert!(!gauge.calibrated);
    }

    #[test]
    fn test_version_before_oldest_keeps_defaults() {
        let bytes = [1u8, 0, 0, 0];
        let (gauge, applied, consumed) = decode_at(&bytes, 3);
        assert!(!applied);
        assert_eq!(consumed, 0);
        assert_eq!(gauge, Gauge::default());
    }

    #[test]
    fn test_truncation_inside_a_branch_is_fatal() {
        let bytes = [1u8, 0, 0, 0];
        let mut reader = TransmissionReader::new(&bytes, SchemaVersion::new(30));
        let mut gauge = Gauge::default();
        assert!(GAUGE.decode(&mut reader, &mut gauge).unwrap_err().is_truncation());
    }

    #[test]
    fn test_history_is_monotonic() {
        let cutovers = [
            history::INITIAL,
            history::HEADER_DESCRIPTION,
            history::HEADER_SENDER_FLAGS,
            history::RESOURCE_EDIT_OVERTIME_COST,
            history::RESOURCE_EDIT_SETUP_EFFICIENCY,
            history::OPTIMIZE_RULE_FROZEN_SPAN,
            history::JOB_EDIT_HOT_REASON,
            history::ACTIVITY_FINISH_SCRAP,
        ];
        assert!(cutovers.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(SchemaVersion::CURRENT.raw(), cutovers[cutovers.len() - 1]);
        assert_eq!(SchemaVersion::new(216).to_string(), "v216");
    }
}
