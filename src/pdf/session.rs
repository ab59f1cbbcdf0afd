//! Scoped ownership of one rendering engine process.
//!
//! A session is shared between the blocking job driving the engine and the
//! async task supervising it. The job releases the process when it finishes.
//! The supervisor aborts it when a deadline passes: the process is killed
//! immediately and its handle is dropped on the blocking pool, so the async
//! side never waits on engine shutdown. A process that finishes launching
//! after the session ended is killed on arrival.
//!
//! The lock only guards the state transition; engine calls go through a
//! cloned handle taken with [`EngineSession::handle`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::process::EngineProcess;

enum SessionState<P> {
    Pending,
    Running(P),
    Released,
}

pub struct EngineSession<P: EngineProcess> {
    state: Mutex<SessionState<P>>,
    live: Arc<AtomicUsize>,
}

impl<P: EngineProcess> EngineSession<P> {
    /// `live` counts processes currently held by sessions sharing it.
    pub fn new(live: Arc<AtomicUsize>) -> Self {
        Self {
            state: Mutex::new(SessionState::Pending),
            live,
        }
    }

    /// Take ownership of a launched process.
    ///
    /// Returns `false` if the session already ended, in which case the
    /// process is killed and dropped here.
    pub fn attach(&self, process: P) -> bool {
        {
            let mut state = self.state.lock();
            if matches!(*state, SessionState::Pending) {
                *state = SessionState::Running(process);
                self.live.fetch_add(1, Ordering::SeqCst);
                return true;
            }
        }
        process.terminate();
        drop(process);
        false
    }

    /// A handle to the running process, or `None` once the session ended.
    pub fn handle(&self) -> Option<P> {
        match &*self.state.lock() {
            SessionState::Running(process) => Some(process.clone()),
            _ => None,
        }
    }

    /// Close the process in the calling thread, which may block while it
    /// shuts down. Returns whether this call ended a running process.
    pub fn release(&self) -> bool {
        match self.take() {
            Some(process) => {
                drop(process);
                self.live.fetch_sub(1, Ordering::SeqCst);
                log::debug!("Rendering engine process released");
                true
            }
            None => false,
        }
    }

    /// Kill the process and drop it on the blocking pool. Never blocks.
    /// Returns whether this call ended a running process.
    pub fn abort(&self) -> bool {
        let Some(process) = self.take() else {
            return false;
        };
        if let Some(pid) = process.id() {
            log::debug!("Killing rendering engine process {}", pid);
        }
        process.terminate();

        let live = self.live.clone();
        let dispose = move || {
            drop(process);
            live.fetch_sub(1, Ordering::SeqCst);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(dispose);
            }
            Err(_) => dispose(),
        }
        true
    }

    pub fn is_released(&self) -> bool {
        matches!(*self.state.lock(), SessionState::Released)
    }

    fn take(&self) -> Option<P> {
        let previous = std::mem::replace(&mut *self.state.lock(), SessionState::Released);
        match previous {
            SessionState::Running(process) => Some(process),
            _ => None,
        }
    }
}

impl<P: EngineProcess> Drop for EngineSession<P> {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Releases the session when the owning scope exits.
pub(crate) struct ReleaseOnDrop<'a, P: EngineProcess>(pub(crate) &'a EngineSession<P>);

impl<P: EngineProcess> Drop for ReleaseOnDrop<'_, P> {
    fn drop(&mut self) {
        self.0.release();
    }
}
