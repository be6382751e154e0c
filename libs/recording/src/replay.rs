//! Ordered replay with partial playback modes
//!
//! A `ReplaySession` decodes recorded entries through the registry, in
//! recorded order, and hands each transmission to a callback. Each `play`
//! call runs until its mode's boundary; the next call resumes from there. A
//! login that stops playback stays pending and is the first transmission of
//! the next call.
//!
//! Login boundaries are counted after the first delivery of a call. A login
//! that opens the call is delivered without counting, so a session parked
//! on a login moves forward.
//!
//! An entry that fails to decode halts the session for good. Skipping it
//! would let replayed state drift from the recorded run.

use std::fmt;
use std::str::FromStr;

use codec::{SchemaVersion, Transmission, TypeRegistry};
use config::ReplaySettings;
use thiserror::Error;
use tracing::{debug, warn};
use types::Ticks;

use crate::entry::RecordingEntry;
use crate::error::{RecordingError, ReplayError};
use crate::log::RecordingReader;

/// How far one `play` call goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackMode {
    /// Everything to the end of the recording
    #[default]
    All,
    /// Up to and including the next transmission that mutates scenario state
    UntilNextMutation,
    /// Up to, not including, the next login
    UntilNextLogin,
    /// Across exactly one login, stopping before the one after it
    SkipOneLogin,
}

impl PlaybackMode {
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::All,
        PlaybackMode::UntilNextMutation,
        PlaybackMode::UntilNextLogin,
        PlaybackMode::SkipOneLogin,
    ];

    /// Name used in configuration and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackMode::All => "all",
            PlaybackMode::UntilNextMutation => "until-mutation",
            PlaybackMode::UntilNextLogin => "until-login",
            PlaybackMode::SkipOneLogin => "skip-login",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown playback mode '{0}' (expected all, until-mutation, until-login or skip-login)")]
pub struct UnknownPlaybackMode(pub String);

impl FromStr for PlaybackMode {
    type Err = UnknownPlaybackMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownPlaybackMode(value.to_string()))
    }
}

/// Why a `play` call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfRecording,
    /// The mutating transmission at `sequence` was delivered
    AfterMutation { sequence: u64 },
    /// The login at `sequence` was not delivered and is pending
    BeforeLogin { sequence: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub delivered: usize,
    pub stop: StopReason,
}

/// A decoded transmission with its recording position
#[derive(Debug)]
pub struct ReplayedTransmission {
    pub sequence: u64,
    pub timestamp: Ticks,
    pub transmission: Box<dyn Transmission>,
}

/// Resumable replay over a sequence of recorded entries
pub struct ReplaySession<'r, I> {
    registry: &'r TypeRegistry,
    version: SchemaVersion,
    entries: I,
    verify_sequence: bool,
    first_sequence: u64,
    last_sequence: Option<u64>,
    pending: Option<ReplayedTransmission>,
    halted_at: Option<u64>,
}

impl<'r> ReplaySession<'r, RecordingReader> {
    /// Replay a recording file at the schema version stored in its header
    pub fn from_reader(registry: &'r TypeRegistry, reader: RecordingReader) -> Result<Self, ReplayError> {
        let version = reader.header().schema_version;
        Self::new(registry, version, reader)
    }
}

impl<'r, I> ReplaySession<'r, I>
where
    I: Iterator<Item = Result<RecordingEntry, RecordingError>>,
{
    /// Fails when the entries were written by a newer schema than this build reads
    pub fn new(registry: &'r TypeRegistry, version: SchemaVersion, entries: I) -> Result<Self, ReplayError> {
        if version > SchemaVersion::CURRENT {
            return Err(ReplayError::UnsupportedVersion {
                found: version.raw(),
                supported: SchemaVersion::CURRENT.raw(),
            });
        }
        Ok(Self {
            registry,
            version,
            entries,
            verify_sequence: true,
            first_sequence: 1,
            last_sequence: None,
            pending: None,
            halted_at: None,
        })
    }

    /// Require contiguous sequence numbers (on by default)
    pub fn with_sequence_check(mut self, verify_sequence: bool) -> Self {
        self.verify_sequence = verify_sequence;
        self
    }

    /// Expect the first entry at `sequence` instead of 1, for a slice of a longer log
    pub fn starting_at(mut self, sequence: u64) -> Self {
        self.first_sequence = sequence;
        self
    }

    pub fn with_settings(self, settings: &ReplaySettings) -> Self {
        self.with_sequence_check(settings.verify_sequence)
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Sequence of the last entry read from the recording
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// A login boundary is waiting to be delivered
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn halted_at(&self) -> Option<u64> {
        self.halted_at
    }

    /// Deliver transmissions in recorded order until `mode`'s boundary
    pub fn play<F>(&mut self, mode: PlaybackMode, mut deliver: F) -> Result<ReplayOutcome, ReplayError>
    where
        F: FnMut(ReplayedTransmission),
    {
        if let Some(sequence) = self.halted_at {
            return Err(ReplayError::Halted { sequence });
        }

        let mut delivered = 0;
        let mut logins_crossed = 0;
        loop {
            let next = match self.next_transmission() {
                Ok(Some(next)) => next,
                Ok(None) => {
                    debug!(%mode, delivered, "Replay reached end of recording");
                    return Ok(ReplayOutcome {
                        delivered,
                        stop: StopReason::EndOfRecording,
                    });
                }
                Err(error) => {
                    let sequence = error.sequence().or(self.last_sequence).unwrap_or(0);
                    warn!(sequence, %error, "Replay halted");
                    self.halted_at = Some(sequence);
                    return Err(error);
                }
            };

            let sequence = next.sequence;
            if next.transmission.is_login() && delivered > 0 {
                logins_crossed += 1;
                let stop = match mode {
                    PlaybackMode::UntilNextLogin => true,
                    PlaybackMode::SkipOneLogin => logins_crossed > 1,
                    PlaybackMode::All | PlaybackMode::UntilNextMutation => false,
                };
                if stop {
                    debug!(%mode, sequence, delivered, "Replay stopped before login");
                    self.pending = Some(next);
                    return Ok(ReplayOutcome {
                        delivered,
                        stop: StopReason::BeforeLogin { sequence },
                    });
                }
            }

            let mutates = next.transmission.mutates_scenario();
            deliver(next);
            delivered += 1;

            if mode == PlaybackMode::UntilNextMutation && mutates {
                debug!(sequence, delivered, "Replay stopped after mutation");
                return Ok(ReplayOutcome {
                    delivered,
                    stop: StopReason::AfterMutation { sequence },
                });
            }
        }
    }

    /// `play` into a vector
    pub fn collect(&mut self, mode: PlaybackMode) -> Result<(Vec<ReplayedTransmission>, ReplayOutcome), ReplayError> {
        let mut replayed = Vec::new();
        let outcome = self.play(mode, |transmission| replayed.push(transmission))?;
        Ok((replayed, outcome))
    }

    fn next_transmission(&mut self) -> Result<Option<ReplayedTransmission>, ReplayError> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }
        let entry = match self.entries.next() {
            Some(entry) => entry?,
            None => return Ok(None),
        };

        if self.verify_sequence {
            let expected = self.last_sequence.map_or(self.first_sequence, |last| last + 1);
            if entry.sequence != expected {
                return Err(RecordingError::SequenceGap {
                    expected,
                    found: entry.sequence,
                }
                .into());
            }
        }

        let transmission = self
            .registry
            .decode(&entry.bytes, self.version)
            .map_err(|source| ReplayError::Decode {
                sequence: entry.sequence,
                source,
            })?;
        self.last_sequence = Some(entry.sequence);
        Ok(Some(ReplayedTransmission {
            sequence: entry.sequence,
            timestamp: entry.timestamp,
            transmission,
        }))
    }
}

impl<I> fmt::Debug for ReplaySession<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaySession")
            .field("version", &self.version)
            .field("verify_sequence", &self.verify_sequence)
            .field("first_sequence", &self.first_sequence)
            .field("last_sequence", &self.last_sequence)
            .field("pending", &self.pending.as_ref().map(|p| p.sequence))
            .field("halted_at", &self.halted_at)
            .finish()
    }
}
