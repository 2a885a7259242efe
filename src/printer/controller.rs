//! The `Printer` controller: the Idle/Running gate around the loop.

use super::context::{CancelToken, RunContext};
use super::job::{capture_pages, Termination};
use super::{JobParams, PrintError, PrintSettings, ProgressEvent};
use crate::capture::{PrimaryMonitor, ScreenSource};
use crate::document::PdfBuilder;
use crate::input::{PointerInjector, SystemPointer};
use crate::ipc::{Event, EventSender};
use crate::viewer::{DocumentViewer, NoViewer, SystemViewer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// The external systems a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub screen: Arc<dyn ScreenSource>,
    pub pointer: Arc<dyn PointerInjector>,
    pub viewer: Arc<dyn DocumentViewer>,
}

impl Collaborators {
    /// Primary monitor, system pointer, and the desktop PDF viewer
    /// (or none when `open_viewer` is off).
    pub fn system(open_viewer: bool) -> Self {
        let viewer: Arc<dyn DocumentViewer> = if open_viewer {
            Arc::new(SystemViewer)
        } else {
            Arc::new(NoViewer)
        };
        Self {
            screen: Arc::new(PrimaryMonitor),
            pointer: Arc::new(SystemPointer),
            viewer,
        }
    }
}

enum PrinterState {
    Idle,
    Running { run: u64, cancel: CancelToken },
}

pub(super) struct Inner {
    pub(super) collaborators: Collaborators,
    pub(super) settings: PrintSettings,
    events: EventSender,
    state: Mutex<PrinterState>,
    next_run: AtomicU64,
    last_document: Mutex<Option<PathBuf>>,
}

/// Starts and stops runs. Cheap to clone; clones share the same gate.
#[derive(Clone)]
pub struct Printer {
    inner: Arc<Inner>,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed { pages: usize, document: PathBuf },
    Cancelled { pages: usize, document: PathBuf },
    /// `document` is set when the pages captured before the failure were
    /// still written out.
    Failed {
        pages: usize,
        document: Option<PathBuf>,
        error: PrintError,
    },
}

/// Handle to a run in flight.
pub struct RunHandle {
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Waits for the run to reach its terminal state.
    pub async fn finished(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::Failed {
                pages: 0,
                document: None,
                error: PrintError::Io(std::io::Error::other(format!("Run task failed: {}", e))),
            },
        }
    }
}

impl Printer {
    pub fn new(settings: PrintSettings, collaborators: Collaborators, events: EventSender) -> Self {
        Self {
            inner: Arc::new(Inner {
                collaborators,
                settings,
                events,
                state: Mutex::new(PrinterState::Idle),
                next_run: AtomicU64::new(1),
                last_document: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &PrintSettings {
        &self.inner.settings
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.inner.state(), PrinterState::Running { .. })
    }

    /// Path of the most recently finalized document, if any run got that far.
    pub fn last_document(&self) -> Option<PathBuf> {
        lock(&self.inner.last_document).clone()
    }

    /// Begins a run in the background.
    ///
    /// Fails with `InvalidRegion`/`InvalidJob` before anything starts, and
    /// with `AlreadyRunning` while another run is in flight; the in-flight
    /// run is not touched in either case. Must be called inside a Tokio
    /// runtime.
    pub fn start(&self, job: JobParams) -> Result<RunHandle, PrintError> {
        job.validate()?;

        let cancel = CancelToken::default();
        let run = self.inner.next_run.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.inner.state();
            if let PrinterState::Running { .. } = *state {
                log::warn!("[PRINTER] Start ignored — a run is already in progress");
                return Err(PrintError::AlreadyRunning);
            }
            *state = PrinterState::Running {
                run,
                cancel: cancel.clone(),
            };
        }

        log::info!(
            "[PRINTER] Starting run: {} page(s), {}s delay, advance target {}",
            job.effective_iterations(),
            job.advance_delay_seconds,
            if job.advance_target.is_some() { "set" } else { "absent" }
        );

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _idle = IdleOnDrop(Arc::clone(&inner), run);
            inner.run(run, job, RunContext::new(cancel)).await
        });
        Ok(RunHandle { task })
    }

    /// Requests cancellation of the run in flight. Takes effect after the
    /// current iteration's wait; a no-op when idle.
    pub fn stop(&self) {
        match &*self.inner.state() {
            PrinterState::Running { cancel, .. } => {
                log::info!("[PRINTER] Stop requested");
                cancel.request();
            }
            PrinterState::Idle => log::debug!("[PRINTER] Stop ignored — idle"),
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, PrinterState> {
        lock(&self.state)
    }

    /// Reopens the gate, unless a newer run already holds it.
    fn set_idle(&self, finished: u64) {
        let mut state = self.state();
        if matches!(*state, PrinterState::Running { run, .. } if run == finished) {
            *state = PrinterState::Idle;
        }
    }

    pub(super) fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::debug!("[PRINTER] Event dropped — no listener");
        }
    }

    pub(super) fn progress(&self, page: u32, done: bool) {
        self.emit(Event::PrintProgress(ProgressEvent { page, done }));
    }

    async fn run(&self, run: u64, job: JobParams, mut ctx: RunContext) -> RunOutcome {
        let start = std::time::Instant::now();
        let mut builder = PdfBuilder::new();

        let termination = capture_pages(self, &job, &mut ctx, &mut builder).await;
        let pages = builder.page_count();

        let (termination, abort_error) = match termination {
            Ok(Termination::Aborted(error)) => (Termination::Completed, Some(error)),
            Ok(other) => (other, None),
            Err(error) => {
                log::error!("[PRINTER] Run failed after {} page(s): {}", pages, error);
                self.emit(Event::PrintError(error.report()));
                self.progress(pages as u32, true);
                self.set_idle(run);
                return RunOutcome::Failed {
                    pages,
                    document: None,
                    error,
                };
            }
        };

        if let Some(error) = &abort_error {
            self.emit(Event::PrintError(error.report()));
            self.progress(pages as u32, true);
        }

        let document = match self.finalize(builder).await {
            Ok(path) => path,
            Err(error) => {
                log::error!("[PRINTER] Could not finalize document: {}", error);
                self.emit(Event::PrintError(error.report()));
                self.set_idle(run);
                return RunOutcome::Failed {
                    pages,
                    document: None,
                    error,
                };
            }
        };

        log::info!(
            "[PRINTER] Run {} with {} page(s) in {}ms",
            match (&abort_error, &termination) {
                (Some(_), _) => "aborted",
                (None, Termination::Cancelled) => "cancelled",
                _ => "completed",
            },
            pages,
            start.elapsed().as_millis()
        );

        self.set_idle(run);

        if let Err(e) = self.collaborators.viewer.show(&document) {
            log::warn!("[PRINTER] Could not open {}: {}", document.display(), e);
        }

        match (abort_error, termination) {
            (Some(error), _) => RunOutcome::Failed {
                pages,
                document: Some(document),
                error,
            },
            (None, Termination::Cancelled) => RunOutcome::Cancelled { pages, document },
            (None, _) => RunOutcome::Completed { pages, document },
        }
    }

    async fn finalize(&self, builder: PdfBuilder) -> Result<PathBuf, PrintError> {
        let path = self.settings.output_path.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || builder.finish(&target))
            .await
            .map_err(|e| PrintError::Io(std::io::Error::other(e.to_string())))??;

        *lock(&self.last_document) = Some(path.clone());
        self.emit(Event::DocumentReady { path: path.clone() });
        Ok(path)
    }
}

/// Returns the gate to `Idle` even if the run task unwinds.
struct IdleOnDrop(Arc<Inner>, u64);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.set_idle(self.1);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
