//! Append-only recording file
//!
//! ```text
//! header   magic "TXRC" | format u16 | schema version u32 | created ticks i64
//! entry    sequence u64 | timestamp i64 | len u32 | bytes[len] | crc32 u32
//! ```
//!
//! All integers are little-endian. The checksum covers the entry prefix and
//! bytes. A single `RecordingWriter` owns a file (or any `RecordingSink`);
//! share it across producers through `SharedRecorder`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use codec::SchemaVersion;
use config::protocol::{limits, recording::{LOG_FORMAT_VERSION, LOG_MAGIC}};
use config::RecordingConfig;
use tracing::{debug, error, info, trace, warn};
use types::Ticks;

use crate::entry::{Recorder, RecordingEntry};
use crate::error::{RecordingError, Result};

const ENTRY_PREFIX_LEN: usize = 8 + 8 + 4;

/// First bytes of every recording file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingHeader {
    pub format_version: u16,
    /// Schema version every entry was encoded with
    pub schema_version: SchemaVersion,
    pub created_at: Ticks,
}

impl RecordingHeader {
    pub const LEN: usize = 4 + 2 + 4 + 8;

    fn current() -> Self {
        Self {
            format_version: LOG_FORMAT_VERSION,
            schema_version: SchemaVersion::CURRENT,
            created_at: Ticks::now(),
        }
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(LOG_MAGIC)?;
        writer.write_u16::<LittleEndian>(self.format_version)?;
        writer.write_u32::<LittleEndian>(self.schema_version.raw())?;
        writer.write_i64::<LittleEndian>(self.created_at.raw())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; Self::LEN];
        reader.read_exact(&mut raw).map_err(|error| match error.kind() {
            io::ErrorKind::UnexpectedEof => RecordingError::BadHeader {
                reason: format!("file is shorter than the {}-byte header", Self::LEN),
            },
            _ => error.into(),
        })?;

        if &raw[..4] != LOG_MAGIC {
            return Err(RecordingError::BadHeader {
                reason: format!("magic {:02x?} is not {:02x?}", &raw[..4], LOG_MAGIC),
            });
        }
        let format_version = LittleEndian::read_u16(&raw[4..6]);
        if format_version != LOG_FORMAT_VERSION {
            return Err(RecordingError::UnsupportedFormat {
                found: format_version,
                supported: LOG_FORMAT_VERSION,
            });
        }
        Ok(Self {
            format_version,
            schema_version: SchemaVersion::new(LittleEndian::read_u32(&raw[6..10])),
            created_at: Ticks::new(LittleEndian::read_i64(&raw[10..18])),
        })
    }
}

fn entry_checksum(prefix: &[u8], bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(prefix);
    hasher.update(bytes);
    hasher.finalize()
}

/// Byte destination of a `RecordingWriter`
///
/// Besides writing, a sink must be able to cut itself back to a length it
/// held before, so a failed append never leaves half an entry behind.
pub trait RecordingSink: Write {
    /// Discard everything after the first `len` bytes; later writes land at `len`
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Make appended bytes durable
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordingSink for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Single appender of a recording
///
/// Each entry is framed in memory and handed to the sink in one write. If
/// the write fails the sink is truncated back to the last complete entry and
/// the sequence number is reused; if that truncation fails too, the writer
/// refuses every later append.
#[derive(Debug)]
pub struct RecordingWriter<S = File> {
    path: PathBuf,
    sink: S,
    header: RecordingHeader,
    next_sequence: u64,
    committed_len: u64,
    poisoned: bool,
    sync_every_append: bool,
    max_entry_bytes: usize,
}

impl RecordingWriter {
    /// Create a new recording, replacing any file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let writer = Self::start(file, path)?;
        info!(path = %path.display(), schema = %writer.header.schema_version, "Created transmission recording");
        Ok(writer)
    }

    /// Continue an existing recording, or create it when missing or empty
    ///
    /// Every existing entry is read back first, so a damaged log is reported
    /// here rather than extended.
    pub fn open_append(path: &Path) -> Result<Self> {
        if !path.exists() || fs::metadata(path)?.len() == 0 {
            return Self::create(path);
        }

        let mut reader = RecordingReader::open(path)?;
        let header = *reader.header();
        if header.schema_version != SchemaVersion::CURRENT {
            return Err(RecordingError::SchemaMismatch {
                found: header.schema_version.raw(),
                current: SchemaVersion::CURRENT.raw(),
            });
        }
        let mut last_sequence = 0;
        for entry in &mut reader {
            last_sequence = entry?.sequence;
        }

        let file = OpenOptions::new().append(true).open(path)?;
        let committed_len = file.metadata()?.len();
        info!(path = %path.display(), next_sequence = last_sequence + 1, "Reopened transmission recording");
        Ok(Self {
            path: path.to_path_buf(),
            sink: file,
            header,
            next_sequence: last_sequence + 1,
            committed_len,
            poisoned: false,
            sync_every_append: false,
            max_entry_bytes: limits::MAX_RECORDED_ENTRY_BYTES,
        })
    }

    /// Open `<directory>/<prefix>-<stem>.txrec` with the configured recorder settings
    ///
    /// Returns `None` when recording is disabled, without touching the file system.
    pub fn from_config(config: &RecordingConfig, stem: &str) -> Result<Option<Self>> {
        if !config.recorder.enabled {
            debug!(stem, "Recording disabled by configuration");
            return Ok(None);
        }
        let writer = Self::open_append(&config.recording_path(stem))?
            .with_sync(config.recorder.sync_every_append)
            .with_max_entry_bytes(config.recorder.max_entry_bytes);
        Ok(Some(writer))
    }
}

impl<S: RecordingSink> RecordingWriter<S> {
    /// Write a fresh header to an empty sink; `path` only labels the recording
    pub fn start(mut sink: S, path: impl Into<PathBuf>) -> Result<Self> {
        let header = RecordingHeader::current();
        let mut raw = Vec::with_capacity(RecordingHeader::LEN);
        header.write_to(&mut raw)?;
        sink.write_all(&raw)?;
        sink.flush()?;
        Ok(Self {
            path: path.into(),
            sink,
            header,
            next_sequence: 1,
            committed_len: RecordingHeader::LEN as u64,
            poisoned: false,
            sync_every_append: false,
            max_entry_bytes: limits::MAX_RECORDED_ENTRY_BYTES,
        })
    }

    /// fsync after every append
    pub fn with_sync(mut self, sync_every_append: bool) -> Self {
        self.sync_every_append = sync_every_append;
        self
    }

    /// Lower the entry limit; values above what `RecordingReader` accepts are clamped
    pub fn with_max_entry_bytes(mut self, max_entry_bytes: usize) -> Self {
        if max_entry_bytes > limits::MAX_RECORDED_ENTRY_BYTES {
            warn!(
                requested = max_entry_bytes,
                limit = limits::MAX_RECORDED_ENTRY_BYTES,
                "Entry limit above the readable maximum, clamping"
            );
        }
        self.max_entry_bytes = max_entry_bytes.min(limits::MAX_RECORDED_ENTRY_BYTES);
        self
    }

    pub fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    /// Sequence number the next append receives
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Length of the recording up to the last complete entry
    pub fn committed_len(&self) -> u64 {
        self.committed_len
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.sink.write_all(frame)?;
        self.sink.flush()?;
        if self.sync_every_append {
            self.sink.sync()?;
        }
        Ok(())
    }

    fn roll_back(&mut self, sequence: u64) {
        match self.sink.truncate(self.committed_len) {
            Ok(()) => warn!(sequence, committed = self.committed_len, "Append failed, partial entry removed"),
            Err(error) => {
                self.poisoned = true;
                error!(sequence, %error, path = %self.path.display(), "Append failed and could not be rolled back");
            }
        }
    }
}

impl<S: RecordingSink> Recorder for RecordingWriter<S> {
    fn append_at(&mut self, timestamp: Ticks, bytes: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(RecordingError::Poisoned {
                path: self.path.display().to_string(),
            });
        }
        let too_large = RecordingError::EntryTooLarge {
            len: bytes.len(),
            max: self.max_entry_bytes,
        };
        if bytes.len() > self.max_entry_bytes {
            return Err(too_large);
        }
        let len = u32::try_from(bytes.len()).map_err(|_| too_large)?;

        let sequence = self.next_sequence;
        let mut frame = Vec::with_capacity(ENTRY_PREFIX_LEN + bytes.len() + 4);
        frame.write_u64::<LittleEndian>(sequence)?;
        frame.write_i64::<LittleEndian>(timestamp.raw())?;
        frame.write_u32::<LittleEndian>(len)?;
        let checksum = entry_checksum(&frame, bytes);
        frame.extend_from_slice(bytes);
        frame.write_u32::<LittleEndian>(checksum)?;

        if let Err(error) = self.write_frame(&frame) {
            self.roll_back(sequence);
            return Err(error.into());
        }

        self.committed_len += frame.len() as u64;
        self.next_sequence += 1;
        trace!(sequence, len, "Recorded transmission");
        Ok(sequence)
    }
}

/// Sequential reader over a recording file
///
/// Yields entries in file order and verifies each checksum. Iteration stops
/// after the first error.
#[derive(Debug)]
pub struct RecordingReader {
    path: PathBuf,
    reader: BufReader<File>,
    header: RecordingHeader,
    last_sequence: u64,
    max_entry_bytes: usize,
    done: bool,
}

impl RecordingReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = RecordingHeader::read_from(&mut reader)?;
        debug!(path = %path.display(), schema = %header.schema_version, "Opened transmission recording");
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            last_sequence: 0,
            max_entry_bytes: limits::MAX_RECORDED_ENTRY_BYTES,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    /// Next entry, or `None` at a clean end of file
    pub fn read_entry(&mut self) -> Result<Option<RecordingEntry>> {
        if self.reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let mut prefix = [0u8; ENTRY_PREFIX_LEN];
        self.fill(&mut prefix)?;
        let sequence = LittleEndian::read_u64(&prefix[0..8]);
        let timestamp = Ticks::new(LittleEndian::read_i64(&prefix[8..16]));
        let len = LittleEndian::read_u32(&prefix[16..20]) as usize;
        if len > self.max_entry_bytes {
            return Err(RecordingError::EntryTooLarge {
                len,
                max: self.max_entry_bytes,
            });
        }

        // Grows with the data actually present, so a corrupt length cannot force a huge allocation
        let mut bytes = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(RecordingError::TruncatedEntry {
                after: self.last_sequence,
            });
        }

        let mut stored = [0u8; 4];
        self.fill(&mut stored)?;
        let stored = LittleEndian::read_u32(&stored);
        let computed = entry_checksum(&prefix, &bytes);
        if stored != computed {
            return Err(RecordingError::ChecksumMismatch {
                sequence,
                stored,
                computed,
            });
        }

        self.last_sequence = sequence;
        Ok(Some(RecordingEntry::new(sequence, timestamp, bytes)))
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|error| match error.kind() {
            io::ErrorKind::UnexpectedEof => RecordingError::TruncatedEntry {
                after: self.last_sequence,
            },
            _ => error.into(),
        })
    }
}

impl Iterator for RecordingReader {
    type Item = Result<RecordingEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Read a whole recording into memory
pub fn read_all(path: &Path) -> Result<(RecordingHeader, Vec<RecordingEntry>)> {
    let reader = RecordingReader::open(path)?;
    let header = *reader.header();
    let entries = reader.collect::<Result<Vec<_>>>()?;
    Ok((header, entries))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// In-memory sink that fails chosen writes after storing part of the data
    #[derive(Debug, Default)]
    struct FlakySink {
        data: Vec<u8>,
        writes: usize,
        fail_on: Vec<usize>,
        truncate_fails: bool,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.fail_on.contains(&self.writes) {
                self.data.extend_from_slice(&buf[..buf.len() / 2]);
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl RecordingSink for FlakySink {
        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.truncate_fails {
                return Err(io::Error::new(io::ErrorKind::Other, "read-only"));
            }
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    fn entries_of(data: &[u8]) -> Vec<RecordingEntry> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sink.txrec");
        fs::write(&path, data).unwrap();
        read_all(&path).unwrap().1
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("log.txrec");

        let mut writer = RecordingWriter::create(&path).unwrap();
        assert_eq!(writer.append_at(Ticks::new(10), b"first").unwrap(), 1);
        assert_eq!(writer.append_at(Ticks::new(20), b"").unwrap(), 2);
        assert_eq!(writer.append_at(Ticks::new(30), b"third").unwrap(), 3);

        let (header, entries) = read_all(&path).unwrap();
        assert_eq!(header.schema_version, SchemaVersion::CURRENT);
        assert_eq!(
            entries,
            vec![
                RecordingEntry::new(1, Ticks::new(10), b"first".to_vec()),
                RecordingEntry::new(2, Ticks::new(20), Vec::new()),
                RecordingEntry::new(3, Ticks::new(30), b"third".to_vec()),
            ]
        );
    }

    #[test]
    fn test_reopen_continues_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txrec");
        {
            let mut writer = RecordingWriter::open_append(&path).unwrap();
            writer.append(b"a").unwrap();
            writer.append(b"b").unwrap();
        }
        let mut writer = RecordingWriter::open_append(&path).unwrap();
        assert_eq!(writer.next_sequence(), 3);
        assert_eq!(writer.append(b"c").unwrap(), 3);

        let sequences: Vec<_> = RecordingReader::open(&path)
            .unwrap()
            .map(|entry| entry.unwrap().sequence)
            .collect();
        assert_eq!(sequences, [1, 2, 3]);
    }

    #[test]
    fn test_corrupted_byte_fails_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txrec");
        let mut writer = RecordingWriter::create(&path).unwrap();
        writer.append(b"payload").unwrap();
        drop(writer);

        let mut raw = fs::read(&path).unwrap();
        let payload_start = RecordingHeader::LEN + ENTRY_PREFIX_LEN;
        raw[payload_start] ^= 0xFF;
        fs::write(&path, raw).unwrap();

        let error = read_all(&path).unwrap_err();
        assert!(matches!(error, RecordingError::ChecksumMismatch { sequence: 1, .. }));
    }

    #[test]
    fn test_torn_tail_is_truncation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txrec");
        let mut writer = RecordingWriter::create(&path).unwrap();
        writer.append(b"complete").unwrap();
        writer.append(b"torn").unwrap();
        drop(writer);

        let raw = fs::read(&path).unwrap();
        fs::write(&path, &raw[..raw.len() - 3]).unwrap();

        let mut reader = RecordingReader::open(&path).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().bytes, b"complete");
        assert!(matches!(
            reader.next().unwrap(),
            Err(RecordingError::TruncatedEntry { after: 1 })
        ));
        assert!(reader.next().is_none());

        assert!(RecordingWriter::open_append(&path).is_err());
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"definitely not a recording").unwrap();
        assert!(matches!(
            RecordingReader::open(&path),
            Err(RecordingError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_entry_limit() {
        let dir = tempdir().unwrap();
        let mut writer = RecordingWriter::create(&dir.path().join("log.txrec"))
            .unwrap()
            .with_max_entry_bytes(4);
        assert!(matches!(
            writer.append(b"12345"),
            Err(RecordingError::EntryTooLarge { len: 5, max: 4 })
        ));
        assert_eq!(writer.append(b"1234").unwrap(), 1);
    }

    #[test]
    fn test_failed_append_is_rolled_back() {
        // write 1 is the header, write 2 the first entry
        let sink = FlakySink {
            fail_on: vec![3],
            ..FlakySink::default()
        };
        let mut writer = RecordingWriter::start(sink, "memory").unwrap();
        assert_eq!(writer.append_at(Ticks::new(1), b"kept").unwrap(), 1);
        let committed = writer.committed_len();

        assert!(matches!(
            writer.append_at(Ticks::new(2), &[7u8; 64]),
            Err(RecordingError::Io(_))
        ));
        assert_eq!(writer.sink().data.len() as u64, committed);
        assert_eq!(writer.next_sequence(), 2);

        assert_eq!(writer.append_at(Ticks::new(3), b"after").unwrap(), 2);
        assert_eq!(
            entries_of(&writer.sink().data),
            vec![
                RecordingEntry::new(1, Ticks::new(1), b"kept".to_vec()),
                RecordingEntry::new(2, Ticks::new(3), b"after".to_vec()),
            ]
        );
    }

    #[test]
    fn test_unrecoverable_append_poisons_writer() {
        let sink = FlakySink {
            fail_on: vec![2],
            truncate_fails: true,
            ..FlakySink::default()
        };
        let mut writer = RecordingWriter::start(sink, "memory").unwrap();
        assert!(writer.append(b"partial").is_err());
        assert!(writer.is_poisoned());
        assert!(matches!(
            writer.append(b"next"),
            Err(RecordingError::Poisoned { .. })
        ));
    }

    #[test]
    fn test_entry_limit_is_clamped_to_readable_maximum() {
        let dir = tempdir().unwrap();
        let writer = RecordingWriter::create(&dir.path().join("log.txrec"))
            .unwrap()
            .with_max_entry_bytes(usize::MAX);
        assert_eq!(writer.max_entry_bytes(), limits::MAX_RECORDED_ENTRY_BYTES);
    }

    #[test]
    fn test_from_config_records_into_configured_directory() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("recording.toml");
        fs::write(
            &config_path,
            format!(
                "[recorder]\nenabled = true\ndirectory = {:?}\nfile_prefix = \"desk\"\nsync_every_append = true\n",
                dir.path().join("logs")
            ),
        )
        .unwrap();
        let config = config::load_config(Some(&config_path), None).unwrap();

        let mut writer = RecordingWriter::from_config(&config, "nightly").unwrap().unwrap();
        assert_eq!(writer.path(), dir.path().join("logs").join("desk-nightly.txrec"));
        writer.append(b"entry").unwrap();
        drop(writer);

        let (_, entries) = read_all(&config.recording_path("nightly")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bytes, b"entry");
    }

    #[test]
    fn test_from_config_disabled_creates_nothing() {
        let dir = tempdir().unwrap();
        let config = RecordingConfig::from_toml_str(&format!(
            "[recorder]\nenabled = false\ndirectory = {:?}\n",
            dir.path().join("logs")
        ))
        .unwrap();

        assert!(RecordingWriter::from_config(&config, "nightly").unwrap().is_none());
        assert!(!dir.path().join("logs").exists());
    }
}
