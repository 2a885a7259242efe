//! Command/event channel between the controlling UI and the print loop.
//!
//! Messages travel as `{"channel": "<name>", "payload": {...}}`. The UI and
//! the region selector send `Command`s; the core answers with `Event`s.

mod dispatch;
mod stdio;

pub use dispatch::Dispatcher;
pub use stdio::{read_commands, write_events};

use crate::geometry::Rect;
use crate::printer::{ErrorReport, JobParams, ProgressEvent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;
pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Which selection the region selector is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectRole {
    /// The printing area.
    Frame,
    /// The next-page button.
    Next,
}

/// A region or point picked in the selector, tagged with its role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub select: SelectRole,
    #[serde(flatten)]
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Command {
    OpenScreen { select: SelectRole },
    CloseScreen(Selection),
    StartPrinting(JobParams),
    StopPrinting,
    SaveDocument { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Event {
    /// Asks the region selector to open for `select`.
    OpenScreen { select: SelectRole },
    /// Relays the selector's answer to the UI.
    CloseScreen(Selection),
    PrintProgress(ProgressEvent),
    PrintError(ErrorReport),
    DocumentReady { path: PathBuf },
    DocumentSaved { path: PathBuf },
}

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
