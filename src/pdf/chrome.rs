//! Headless Chromium engine.
//!
//! Every render launches a fresh browser process, loads the document from a
//! temporary directory, waits for the page and its fonts, prints to PDF and
//! releases the process. The blocking browser protocol runs on tokio's
//! blocking pool; the async side enforces the launch and overall deadlines
//! and kills the process when either is exceeded.

use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::process::{kill_process, EngineLauncher, EngineProcess};
use super::session::{EngineSession, ReleaseOnDrop};
use super::{PdfEngine, PdfOptions, RenderError, PDF_SIGNATURE};

pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

const DOCUMENT_FILE: &str = "presupuesto.html";
const FONTS_READY_SCRIPT: &str = "document.fonts.ready.then(() => true)";

/// Flags for running inside containers without a GPU or a large /dev/shm.
const HARDENED_ARGS: [&str; 4] = [
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--no-first-run",
];

#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Browser executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub launch_timeout: Duration,
    /// Deadline for the whole render, launch included.
    pub render_timeout: Duration,
    /// Disable the Chromium sandbox, required when running as root in containers.
    pub no_sandbox: bool,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            no_sandbox: true,
        }
    }
}

impl ChromeConfig {
    fn launch_options(&self) -> Result<LaunchOptions<'static>, RenderError> {
        let mut args: Vec<&'static OsStr> = HARDENED_ARGS.into_iter().map(OsStr::new).collect();
        if self.no_sandbox {
            args.push(OsStr::new("--disable-setuid-sandbox"));
        }

        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(!self.no_sandbox)
            .path(self.executable.clone())
            .idle_browser_timeout(self.render_timeout)
            .args(args)
            .build()
            .map_err(|e| RenderError::Launch(anyhow::anyhow!("invalid launch options: {e}")))
    }
}

/// Launches Chromium with the hardened flag set.
pub struct ChromeLauncher {
    config: ChromeConfig,
}

impl ChromeLauncher {
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }
}

impl EngineLauncher for ChromeLauncher {
    type Process = Browser;

    fn launch(&self) -> Result<Browser, RenderError> {
        Browser::new(self.config.launch_options()?).map_err(RenderError::Launch)
    }
}

impl EngineProcess for Browser {
    fn id(&self) -> Option<u32> {
        self.get_process_id()
    }

    fn terminate(&self) {
        if let Some(pid) = self.get_process_id() {
            kill_process(pid);
        }
    }

    fn print(
        &self,
        document: &Path,
        timeout: Duration,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let tab = self.new_tab().map_err(RenderError::Surface)?;
        tab.set_default_timeout(timeout);

        let url = format!("file://{}", document.display());
        tab.navigate_to(&url).map_err(RenderError::Load)?;
        tab.wait_until_navigated().map_err(RenderError::Load)?;
        tab.evaluate(FONTS_READY_SCRIPT, true)
            .map_err(RenderError::Load)?;

        tab.print_to_pdf(Some(print_options(options)))
            .map_err(RenderError::Capture)
    }
}

/// Renders PDFs with a dedicated engine process per call.
pub struct ChromePdfEngine<L: EngineLauncher = ChromeLauncher> {
    config: ChromeConfig,
    launcher: Arc<L>,
    live: Arc<AtomicUsize>,
}

impl ChromePdfEngine {
    pub fn new(config: ChromeConfig) -> Self {
        let launcher = ChromeLauncher::new(config.clone());
        Self::with_launcher(config, launcher)
    }
}

impl Default for ChromePdfEngine {
    fn default() -> Self {
        Self::new(ChromeConfig::default())
    }
}

impl<L: EngineLauncher> ChromePdfEngine<L> {
    /// Use `launcher` to start processes; timeouts still come from `config`.
    pub fn with_launcher(config: ChromeConfig, launcher: L) -> Self {
        Self {
            config,
            launcher: Arc::new(launcher),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &ChromeConfig {
        &self.config
    }

    /// Engine processes currently held. Zero once every render has finished
    /// and its process has been closed.
    pub fn active_processes(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    async fn supervise(
        &self,
        mut job: JoinHandle<Result<Vec<u8>, RenderError>>,
        launched: oneshot::Receiver<()>,
        started: Instant,
    ) -> Result<Vec<u8>, RenderError> {
        let launch_timeout = self.config.launch_timeout.min(self.config.render_timeout);

        // A closed channel means the job ended before launching; its result says why.
        if tokio::time::timeout(launch_timeout, launched).await.is_err() {
            return Err(RenderError::LaunchTimeout(launch_timeout));
        }

        let remaining = self.config.render_timeout.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, &mut job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RenderError::EngineUnavailable(format!(
                "render task failed: {join_error}"
            ))),
            Err(_) => Err(RenderError::Deadline(self.config.render_timeout)),
        }
    }
}

#[async_trait]
impl<L: EngineLauncher> PdfEngine for ChromePdfEngine<L> {
    async fn render(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        let started = Instant::now();
        let session = Arc::new(EngineSession::new(self.live.clone()));
        let (launched_tx, launched_rx) = oneshot::channel();

        let job = RenderJob {
            launcher: self.launcher.clone(),
            render_timeout: self.config.render_timeout,
            html: html.to_owned(),
            options: options.clone(),
            session: session.clone(),
        };
        let handle = tokio::task::spawn_blocking(move || job.run(launched_tx));

        let result = self.supervise(handle, launched_rx, started).await;

        // The job releases on its own exit paths. Past a deadline it may be
        // stuck inside the engine, so the process is killed from here.
        if session.abort() {
            log::warn!(
                "Rendering engine killed after {:?}: {}",
                started.elapsed(),
                result
                    .as_ref()
                    .err()
                    .map(ToString::to_string)
                    .unwrap_or_default()
            );
        }

        match &result {
            Ok(pdf) => log::debug!(
                "Rendered {} byte PDF in {:?}",
                pdf.len(),
                started.elapsed()
            ),
            Err(e) => log::debug!("Render failed after {:?}: {}", started.elapsed(), e),
        }
        result
    }
}

/// Work executed on the blocking pool.
struct RenderJob<L: EngineLauncher> {
    launcher: Arc<L>,
    render_timeout: Duration,
    html: String,
    options: PdfOptions,
    session: Arc<EngineSession<L::Process>>,
}

impl<L: EngineLauncher> RenderJob<L> {
    fn run(self, launched: oneshot::Sender<()>) -> Result<Vec<u8>, RenderError> {
        let _release = ReleaseOnDrop(&*self.session);

        let workspace = tempfile::Builder::new()
            .prefix("presupuesto-")
            .tempdir()
            .map_err(RenderError::Workspace)?;
        let document = workspace.path().join(DOCUMENT_FILE);
        fs::write(&document, self.html.as_bytes()).map_err(RenderError::Workspace)?;

        let process = self.launcher.launch()?;
        log::debug!("Rendering engine launched (pid {:?})", process.id());
        if !self.session.attach(process) {
            return Err(RenderError::EngineUnavailable(
                "render was abandoned before the engine finished starting".to_string(),
            ));
        }
        // The supervisor may have stopped waiting; that is handled by the session.
        let _ = launched.send(());

        let engine = self.session.handle().ok_or_else(|| {
            RenderError::EngineUnavailable("engine process was released mid-render".to_string())
        })?;
        let pdf = engine.print(&document, self.render_timeout, &self.options)?;

        if !pdf.starts_with(PDF_SIGNATURE) {
            return Err(RenderError::InvalidOutput(pdf.len()));
        }
        Ok(pdf)
    }
}

fn print_options(options: &PdfOptions) -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(options.print_background),
        paper_width: Some(options.paper_width_in),
        paper_height: Some(options.paper_height_in),
        margin_top: Some(options.margin_in),
        margin_bottom: Some(options.margin_in),
        margin_left: Some(options.margin_in),
        margin_right: Some(options.margin_in),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_options_follow_page_setup() {
        let print = print_options(&PdfOptions::a4());
        assert_eq!(print.paper_width, Some(8.27));
        assert_eq!(print.paper_height, Some(11.69));
        assert_eq!(print.print_background, Some(true));
        assert_eq!(print.margin_top, print.margin_left);
    }

    #[test]
    fn test_launch_options_build() {
        let config = ChromeConfig {
            executable: Some(PathBuf::from("/opt/chrome/chrome")),
            ..ChromeConfig::default()
        };
        assert!(config.launch_options().is_ok());
    }

    #[tokio::test]
    async fn test_missing_executable_fails_to_launch() {
        let engine = ChromePdfEngine::new(ChromeConfig {
            executable: Some(PathBuf::from("/nonexistent/chromium-for-tests")),
            launch_timeout: Duration::from_secs(5),
            render_timeout: Duration::from_secs(10),
            no_sandbox: true,
        });

        let err = engine
            .render("<html><body>hola</body></html>", &PdfOptions::a4())
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Launch(_)), "unexpected error: {err}");
    }
}
