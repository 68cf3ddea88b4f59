//! Handle-based registry over encoder sessions.
//!
//! Managed-runtime callers cannot hold Rust objects, so sessions live in
//! a process-wide registry and travel across the boundary as opaque
//! integer handles. The surface never panics outward: a failed open
//! returns [`Handle::INVALID`] and a failed or suppressed encode returns
//! nothing. Closing an unknown or already-closed handle is a no-op.
//! Failures are logged here and counted in the session stats rather
//! than thrown.
//!
//! Sessions behind distinct handles encode concurrently; calls on one
//! handle serialize on that session's lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use micwire_audio::session::{EncoderSession, SessionConfig, SessionStats};

/// Opaque session handle for managed-runtime callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// The null handle, returned when a session cannot be opened.
    pub const INVALID: Handle = Handle(0);

    /// Returns false for the null handle.
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw integer value to store on the caller's side.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Handle(raw)
    }
}

static SESSIONS: Lazy<Mutex<HashMap<u64, Arc<Mutex<EncoderSession>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

// Zero stays reserved for Handle::INVALID
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opens an encoder session and registers it.
///
/// Returns [`Handle::INVALID`] if the configuration is unusable; the
/// cause is logged.
pub fn open(config: SessionConfig) -> Handle {
    let session = match EncoderSession::open(config) {
        Ok(session) => session,
        Err(e) => {
            warn!("session open failed: {}", e);
            return Handle::INVALID;
        }
    };

    let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    SESSIONS
        .lock()
        .unwrap()
        .insert(id, Arc::new(Mutex::new(session)));
    debug!("session {} opened", id);
    Handle(id)
}

/// Opens a session with the default uplink profile.
pub fn open_default() -> Handle {
    open(SessionConfig::default())
}

/// Encodes one frame from `pcm[offset..offset + len]` on the given session.
///
/// Returns the compressed frame bytes, or `None` when there is nothing
/// to transmit: DTX suppressed the interval, the handle is unknown, or
/// the call failed. Failures are logged and counted on the session.
pub fn encode(handle: Handle, pcm: &[u8], offset: usize, len: usize) -> Option<Vec<u8>> {
    let session = {
        let sessions = SESSIONS.lock().unwrap();
        sessions.get(&handle.0).cloned()
    };
    let Some(session) = session else {
        debug!("encode on unknown handle {}", handle.0);
        return None;
    };

    let mut session = session.lock().unwrap();
    match session.encode(pcm, offset, len) {
        Ok(Some(frame)) => Some(frame.into_bytes()),
        Ok(None) => None,
        Err(e) => {
            debug!("encode failed on handle {}: {}", handle.0, e);
            None
        }
    }
}

/// Closes a session and frees its encoder.
///
/// Unknown and null handles are ignored, so calling twice is safe.
pub fn close(handle: Handle) {
    if !handle.is_valid() {
        return;
    }
    let removed = SESSIONS.lock().unwrap().remove(&handle.0);
    match removed {
        Some(_) => debug!("session {} closed", handle.0),
        None => debug!("close on unknown handle {}", handle.0),
    }
}

/// Snapshot of a session's counters, if the handle is live.
pub fn stats(handle: Handle) -> Option<SessionStats> {
    let session = {
        let sessions = SESSIONS.lock().unwrap();
        sessions.get(&handle.0).cloned()
    };
    session.map(|s| s.lock().unwrap().stats())
}

/// Number of sessions currently registered.
pub fn active_sessions() -> usize {
    SESSIONS.lock().unwrap().len()
}
