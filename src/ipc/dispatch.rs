//! Routes incoming commands to the printer and relays selector traffic.

use super::{Command, CommandReceiver, Event, EventSender};
use crate::printer::{PrintError, Printer, RunHandle};
use std::path::Path;

pub struct Dispatcher {
    printer: Printer,
    events: EventSender,
    report_rejected_starts: bool,
    current: Option<RunHandle>,
}

impl Dispatcher {
    pub fn new(printer: Printer, events: EventSender) -> Self {
        Self {
            printer,
            events,
            report_rejected_starts: false,
            current: None,
        }
    }

    /// Also send an error report when a start arrives mid-run. Off by
    /// default: the second start is only logged.
    pub fn report_rejected_starts(mut self, enabled: bool) -> Self {
        self.report_rejected_starts = enabled;
        self
    }

    /// Handles commands until the sender side closes, then stops any run in
    /// flight and waits for it to wind down.
    pub async fn serve(mut self, mut commands: CommandReceiver) {
        log::info!("[IPC] Listening for commands");
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }

        log::info!("[IPC] Command stream closed");
        self.printer.stop();
        if let Some(run) = self.current.take() {
            run.finished().await;
        }
    }

    pub async fn handle(&mut self, command: Command) {
        log::debug!("[IPC] <- {:?}", command);
        match command {
            Command::OpenScreen { select } => self.emit(Event::OpenScreen { select }),
            Command::CloseScreen(selection) => self.emit(Event::CloseScreen(selection)),
            Command::StartPrinting(job) => match self.printer.start(job) {
                Ok(run) => self.current = Some(run),
                Err(PrintError::AlreadyRunning) if !self.report_rejected_starts => {}
                Err(e) => self.emit(Event::PrintError(e.report())),
            },
            Command::StopPrinting => self.printer.stop(),
            Command::SaveDocument { path } => match self.save_document(&path).await {
                Ok(()) => self.emit(Event::DocumentSaved { path }),
                Err(e) => {
                    log::error!("[IPC] Save to {} failed: {}", path.display(), e);
                    self.emit(Event::PrintError(e.report()));
                }
            },
        }
    }

    async fn save_document(&self, dest: &Path) -> Result<(), PrintError> {
        if self.printer.is_running() {
            return Err(PrintError::AlreadyRunning);
        }
        let source = self.printer.last_document().ok_or(PrintError::NoDocument)?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(&source, dest).await?;
        log::info!("[IPC] Saved {} ({} bytes) to {}", source.display(), bytes, dest.display());
        Ok(())
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::debug!("[IPC] Event dropped — no listener");
        }
    }
}
