//! The engine process seam.
//!
//! `EngineLauncher` starts a process and `EngineProcess` drives it. Both are
//! blocking and only ever called from tokio's blocking pool, except
//! `EngineProcess::terminate`, which the async side uses to enforce deadlines.

use std::path::Path;
use std::time::Duration;

use super::{PdfOptions, RenderError};

/// A running rendering engine.
///
/// Clones are cheap handles to the same process. The process exits once the
/// last handle is dropped, and dropping may block while it shuts down.
pub trait EngineProcess: Clone + Send + Sync + 'static {
    /// OS process id, when known.
    fn id(&self) -> Option<u32>;

    /// Kill the process immediately. Must not block.
    fn terminate(&self);

    /// Load `document` and print it to PDF.
    fn print(
        &self,
        document: &Path,
        timeout: Duration,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Starts engine processes.
pub trait EngineLauncher: Send + Sync + 'static {
    type Process: EngineProcess;

    fn launch(&self) -> Result<Self::Process, RenderError>;
}

/// Send SIGKILL to `pid` without waiting for it to exit.
#[cfg(unix)]
pub fn kill_process(pid: u32) {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) only sends a signal; no memory is shared with the callee.
    if unsafe { libc::kill(pid, libc::SIGKILL) } != 0 {
        log::debug!(
            "kill({}) failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
pub fn kill_process(pid: u32) {
    log::warn!(
        "Cannot signal engine process {}; it exits when its handle is closed",
        pid
    );
}
