//! `list` and `replay` subcommands

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use codec::{SchemaVersion, TypeRegistry};
use config::RecordingConfig;
use recording::{
    PlaybackMode, RecordingEntry, RecordingReader, ReplaySession, ReplayedTransmission, StopReason,
};
use tracing::{info, warn};
use types::Ticks;

/// One printed line of `list`
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub sequence: u64,
    pub timestamp: Ticks,
    pub type_name: String,
    pub len: usize,
    pub description: String,
}

impl EntryRow {
    /// Describe an entry without failing on bytes this build cannot decode
    pub fn describe(registry: &TypeRegistry, version: SchemaVersion, entry: &RecordingEntry) -> Self {
        let (type_name, description) = match registry.decode(&entry.bytes, version) {
            Ok(transmission) => (transmission.type_name().to_string(), transmission.description()),
            Err(error) => {
                let type_id = entry
                    .bytes
                    .get(..4)
                    .and_then(|raw| raw.try_into().ok())
                    .map(i32::from_le_bytes);
                let name = match type_id {
                    Some(id) => registry
                        .name_of(id)
                        .map_or_else(|| format!("unknown({id})"), str::to_string),
                    None => "empty".to_string(),
                };
                (name, format!("<undecodable: {error}>"))
            }
        };
        Self {
            sequence: entry.sequence,
            timestamp: entry.timestamp,
            type_name,
            len: entry.len(),
            description,
        }
    }
}

fn format_ticks(ticks: Ticks) -> String {
    ticks
        .to_datetime()
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("ticks:{}", ticks.raw()))
}

impl fmt::Display for EntryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8}  {}  {:<26} {:>8}B  {}",
            self.sequence,
            format_ticks(self.timestamp),
            self.type_name,
            self.len,
            self.description
        )
    }
}

fn open(path: &Path) -> Result<RecordingReader> {
    RecordingReader::open(path).with_context(|| format!("Failed to open recording {}", path.display()))
}

/// Print every entry of a recording
pub fn list(path: &Path, limit: Option<usize>) -> Result<()> {
    let registry = TypeRegistry::with_catalog()?;
    let reader = open(path)?;
    let header = *reader.header();
    println!(
        "{}: format {}, schema {}, created {}",
        path.display(),
        header.format_version,
        header.schema_version,
        format_ticks(header.created_at)
    );

    let mut count = 0;
    for entry in reader.take(limit.unwrap_or(usize::MAX)) {
        let entry = entry.context("Recording is damaged")?;
        println!("{}", EntryRow::describe(&registry, header.schema_version, &entry));
        count += 1;
    }
    info!(entries = count, "Listed recording");
    Ok(())
}

fn print_replayed(replayed: &ReplayedTransmission) {
    let transmission = &replayed.transmission;
    println!(
        "{:>8}  {}  {:<26} {}{}",
        replayed.sequence,
        format_ticks(replayed.timestamp),
        transmission.type_name(),
        if transmission.mutates_scenario() { "mutates  " } else { "" },
        transmission.description()
    );
}

/// Play a recording through the catalog registry
///
/// Runs up to `steps` calls of `mode`, stopping early at the end of the
/// recording.
pub fn replay(
    path: &Path,
    mode: Option<PlaybackMode>,
    steps: usize,
    config: &RecordingConfig,
) -> Result<()> {
    let mode = match mode {
        Some(mode) => mode,
        None => config
            .replay
            .default_mode
            .parse()
            .context("Invalid replay.default_mode in configuration")?,
    };

    let registry = TypeRegistry::with_catalog()?;
    let mut session = ReplaySession::from_reader(&registry, open(path)?)?.with_settings(&config.replay);
    info!(%mode, steps, version = %session.version(), "Replaying recording");

    for step in 1..=steps {
        let outcome = session.play(mode, |replayed| print_replayed(&replayed))?;
        let stop = match outcome.stop {
            StopReason::EndOfRecording => "end of recording".to_string(),
            StopReason::AfterMutation { sequence } => format!("after mutation {sequence}"),
            StopReason::BeforeLogin { sequence } => format!("before login {sequence}"),
        };
        println!("-- step {step}: {} delivered, stopped {stop}", outcome.delivered);
        if outcome.stop == StopReason::EndOfRecording {
            return Ok(());
        }
    }
    if session.has_pending() {
        warn!(last_sequence = ?session.last_sequence(), "Replay stopped with a login pending");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::catalog::UserLogonT;
    use codec::to_bytes;
    use types::UserId;

    #[test]
    fn test_describe_known_entry() {
        let registry = TypeRegistry::with_catalog().unwrap();
        let logon = UserLogonT::new(UserId::new(4), "ws-4");
        let entry = RecordingEntry::new(7, Ticks::new(0), to_bytes(&logon).unwrap());

        let row = EntryRow::describe(&registry, SchemaVersion::CURRENT, &entry);
        assert_eq!(row.type_name, "UserLogonT");
        assert_eq!(row.description, "UserLogonT");
        assert!(row.to_string().contains("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_describe_unknown_entry() {
        let registry = TypeRegistry::with_catalog().unwrap();
        let entry = RecordingEntry::new(1, Ticks::new(0), 4242i32.to_le_bytes().to_vec());

        let row = EntryRow::describe(&registry, SchemaVersion::CURRENT, &entry);
        assert_eq!(row.type_name, "unknown(4242)");
        assert!(row.description.starts_with("<undecodable"));
    }
}
