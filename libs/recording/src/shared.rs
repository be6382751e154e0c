//! Shared recorder handle
//!
//! Many producers, one appender: clones share a single recorder behind a
//! mutex so sequence numbers are assigned in lock order with no gaps.

use std::sync::Arc;

use codec::Transmission;
use parking_lot::Mutex;
use types::Ticks;

use crate::entry::Recorder;
use crate::error::Result;
use crate::log::RecordingWriter;

/// Cloneable handle to one recorder
#[derive(Debug)]
pub struct SharedRecorder<R = RecordingWriter> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for SharedRecorder<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Recorder> SharedRecorder<R> {
    pub fn new(recorder: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(recorder)),
        }
    }

    pub fn append(&self, bytes: &[u8]) -> Result<u64> {
        self.inner.lock().append(bytes)
    }

    pub fn append_at(&self, timestamp: Ticks, bytes: &[u8]) -> Result<u64> {
        self.inner.lock().append_at(timestamp, bytes)
    }

    /// Serialization happens before the lock is taken
    pub fn record(&self, transmission: &dyn Transmission) -> Result<u64> {
        let bytes = codec::to_bytes(transmission)?;
        self.inner.lock().append(&bytes)
    }

    /// Run `f` with exclusive access to the recorder
    pub fn with<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
