//! Shared device state: a bounded byte buffer with a single exclusive writer.
//!
//! Every operation takes the one state lock for its whole duration and never
//! waits on another session. Writer contention is settled immediately by
//! [`Device::try_claim_writer`] accepting or rejecting the claim.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use resmgr_config::DEFAULT_BUFFER_CAPACITY;

/// Process-unique identity of one client session.
///
/// Identifiers are allocated from a monotonically increasing counter and are
/// unrelated to the numeric value of the underlying socket handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "session-{}", self.0)
    }
}

/// Snapshot of the buffer length and writer claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Occupied bytes.
    pub length: usize,
    /// Whether any session currently holds the writer claim.
    pub writer_active: bool,
}

/// Result of a claim-then-append write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The caller holds the claim; carries the number of bytes stored.
    Written(usize),
    /// Another session holds the claim; nothing was stored.
    Busy,
}

/// Operations available on the shared device.
///
/// Sessions receive the device as `Arc<dyn Device>` so tests can substitute a
/// mock for [`DeviceState`].
#[cfg_attr(test, mockall::automock)]
pub trait Device: Send + Sync {
    /// Claims the writer role for `session`.
    ///
    /// Succeeds when the device is unclaimed or already owned by `session`.
    fn try_claim_writer(&self, session: SessionId) -> bool;

    /// Drops the writer claim if, and only if, `session` holds it.
    fn release_writer_if_owner(&self, session: SessionId);

    /// Appends as much of `text` as fits and returns the stored byte count.
    ///
    /// The caller must hold the writer claim.
    fn append(&self, text: &[u8]) -> usize;

    /// Claims the writer role and appends under a single lock acquisition.
    fn claim_and_append(&self, session: SessionId, text: &[u8]) -> WriteOutcome;

    /// Copy of the occupied part of the buffer.
    fn read_snapshot(&self) -> Vec<u8>;

    /// Empties the buffer without touching the writer claim.
    fn clear(&self);

    /// Current length and claim state.
    fn status(&self) -> DeviceStatus;
}

#[derive(Debug)]
struct DeviceInner {
    buffer: Vec<u8>,
    owner: Option<SessionId>,
}

impl DeviceInner {
    fn claim(&mut self, session: SessionId) -> bool {
        match self.owner {
            Some(owner) if owner != session => false,
            _ => {
                self.owner = Some(session);
                true
            }
        }
    }

    // One byte stays reserved, so `buffer.len()` never reaches `capacity`.
    fn append(&mut self, capacity: usize, text: &[u8]) -> usize {
        let room = capacity
            .saturating_sub(1)
            .saturating_sub(self.buffer.len());
        let written = text.len().min(room);
        self.buffer.extend_from_slice(&text[..written]);
        written
    }
}

/// Production device backed by a mutex-guarded buffer.
#[derive(Debug)]
pub struct DeviceState {
    capacity: usize,
    inner: Mutex<DeviceInner>,
}

impl DeviceState {
    /// Builds an empty, unclaimed device holding at most `capacity - 1` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(DeviceInner {
                buffer: Vec::with_capacity(capacity),
                owner: None,
            }),
        }
    }

    /// Total capacity, including the reserved byte.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current writer, if any.
    #[must_use]
    pub fn owner(&self) -> Option<SessionId> {
        self.lock().owner
    }

    // Every mutation leaves the state consistent, so a panic on another
    // thread never invalidates it.
    fn lock(&self) -> MutexGuard<'_, DeviceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl Device for DeviceState {
    fn try_claim_writer(&self, session: SessionId) -> bool {
        self.lock().claim(session)
    }

    fn release_writer_if_owner(&self, session: SessionId) {
        let mut inner = self.lock();
        if inner.owner == Some(session) {
            inner.owner = None;
        }
    }

    fn append(&self, text: &[u8]) -> usize {
        self.lock().append(self.capacity, text)
    }

    fn claim_and_append(&self, session: SessionId, text: &[u8]) -> WriteOutcome {
        let mut inner = self.lock();
        if inner.claim(session) {
            WriteOutcome::Written(inner.append(self.capacity, text))
        } else {
            WriteOutcome::Busy
        }
    }

    fn read_snapshot(&self) -> Vec<u8> {
        self.lock().buffer.clone()
    }

    fn clear(&self) {
        self.lock().buffer.clear();
    }

    fn status(&self) -> DeviceStatus {
        let inner = self.lock();
        DeviceStatus {
            length: inner.buffer.len(),
            writer_active: inner.owner.is_some(),
        }
    }
}
