//! Capture-advance loop: public API.
//!
//! A run captures the frame region, appends it to the document as a page,
//! clicks the advance target, waits, and repeats until the requested number
//! of pages is reached or a stop is requested. Only one run is in flight at
//! a time; the `Printer` controller enforces that gate.

mod context;
mod controller;
mod job;

pub use context::{CancelToken, RunContext};
pub use controller::{Collaborators, Printer, RunHandle, RunOutcome};

use crate::capture::{CaptureError, CropError};
use crate::document::DocumentError;
use crate::geometry::Rect;
use crate::input::InjectError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Parameters of one run, fixed from start to finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParams {
    #[serde(default, alias = "frameCoord")]
    pub frame_region: Option<Rect>,
    #[serde(default, alias = "nextCoord")]
    pub advance_target: Option<Rect>,
    #[serde(default = "default_iterations", alias = "pages")]
    pub iteration_count: u32,
    #[serde(default, alias = "delay")]
    pub advance_delay_seconds: f64,
}

fn default_iterations() -> u32 {
    1
}

impl JobParams {
    pub fn new(frame_region: Rect) -> Self {
        Self {
            frame_region: Some(frame_region),
            advance_target: None,
            iteration_count: 1,
            advance_delay_seconds: 0.0,
        }
    }

    pub fn advancing(mut self, target: Rect, iterations: u32, delay_seconds: f64) -> Self {
        self.advance_target = Some(target);
        self.iteration_count = iterations;
        self.advance_delay_seconds = delay_seconds;
        self
    }

    /// Without an advance target there is nothing to click between
    /// captures, so the job collapses to a single page.
    pub fn effective_iterations(&self) -> u32 {
        if self.advance_target.is_some() {
            self.iteration_count
        } else {
            1
        }
    }

    /// The wait between pages. Rejects delays that are negative, not a
    /// number, or too large for a `Duration`.
    pub fn delay(&self) -> Result<Duration, PrintError> {
        Duration::try_from_secs_f64(self.advance_delay_seconds).map_err(|_| {
            PrintError::InvalidJob(format!(
                "advance delay must be a non-negative number of seconds, got {}",
                self.advance_delay_seconds
            ))
        })
    }

    /// Returns the frame region once the job is known to be runnable.
    pub fn validate(&self) -> Result<Rect, PrintError> {
        let frame = self.frame_region.ok_or(PrintError::InvalidRegion)?;
        if !frame.has_area() {
            return Err(PrintError::InvalidRegion);
        }
        if self.effective_iterations() == 0 {
            return Err(PrintError::InvalidJob(
                "iteration count must be at least 1".to_string(),
            ));
        }
        self.delay()?;
        Ok(frame)
    }
}

/// Per-iteration status sent to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub page: u32,
    pub done: bool,
}

/// User-facing error report: a short message plus diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub detail: String,
}

/// What to do when the advance click cannot be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickFailurePolicy {
    /// Log the failure and keep capturing.
    #[default]
    Continue,
    /// Stop the run and keep the pages captured so far.
    Abort,
}

impl FromStr for ClickFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(format!("expected `continue` or `abort`, got `{}`", other)),
        }
    }
}

/// Settings a run reads but never changes.
#[derive(Debug, Clone)]
pub struct PrintSettings {
    /// Fixed artifact path, overwritten by every run.
    pub output_path: PathBuf,
    /// Overrides the density reported by the display.
    pub scale_factor: Option<f64>,
    pub on_click_failure: ClickFailurePolicy,
    /// `None` waits on the capture provider indefinitely.
    pub capture_timeout: Option<Duration>,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            output_path: std::env::temp_dir().join("preview.pdf"),
            scale_factor: None,
            on_click_failure: ClickFailurePolicy::Continue,
            capture_timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("{0}")]
    Capture(#[from] CaptureError),

    #[error("Could not crop the capture: {0}")]
    Crop(#[from] CropError),

    #[error("Advance click failed: {0}")]
    Injection(#[from] InjectError),

    #[error("The printing area is missing or has no area")]
    InvalidRegion,

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("A print run is already in progress")]
    AlreadyRunning,

    #[error("No document has been printed yet")]
    NoDocument,

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PrintError {
    pub fn report(&self) -> ErrorReport {
        let message = match self {
            PrintError::Capture(_) | PrintError::Crop(_) => "Screen capture failed",
            PrintError::Injection(_) => "Could not click the next button",
            PrintError::InvalidRegion => "Select a printing area first",
            PrintError::InvalidJob(_) => "Invalid print settings",
            PrintError::AlreadyRunning => "Already printing",
            PrintError::NoDocument => "Nothing to save",
            PrintError::Document(_) => "Could not write the document",
            PrintError::Io(_) => "File operation failed",
        };
        ErrorReport {
            message: message.to_string(),
            detail: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Rect {
        Rect::new(10.0, 10.0, 110.0, 60.0)
    }

    #[test]
    fn no_advance_target_means_one_page() {
        let mut job = JobParams::new(frame());
        job.iteration_count = 5;
        assert_eq!(job.effective_iterations(), 1);

        let job = job.advancing(Rect::point(500.0, 500.0), 5, 0.0);
        assert_eq!(job.effective_iterations(), 5);
    }

    #[test]
    fn missing_or_flat_frame_is_invalid() {
        let mut job = JobParams::new(frame());
        job.frame_region = None;
        assert!(matches!(job.validate(), Err(PrintError::InvalidRegion)));

        let job = JobParams::new(Rect::new(10.0, 10.0, 10.0, 60.0));
        assert!(matches!(job.validate(), Err(PrintError::InvalidRegion)));
    }

    #[test]
    fn zero_iterations_with_target_is_invalid() {
        let job = JobParams::new(frame()).advancing(Rect::point(1.0, 1.0), 0, 1.0);
        assert!(matches!(job.validate(), Err(PrintError::InvalidJob(_))));
    }

    #[test]
    fn negative_delay_is_invalid() {
        let job = JobParams::new(frame()).advancing(Rect::point(1.0, 1.0), 2, -1.0);
        assert!(matches!(job.validate(), Err(PrintError::InvalidJob(_))));
    }

    #[test]
    fn delay_too_large_for_a_duration_is_invalid() {
        let job = JobParams::new(frame()).advancing(Rect::point(1.0, 1.0), 2, 1e20);
        assert!(matches!(job.validate(), Err(PrintError::InvalidJob(_))));
        assert!(job.delay().is_err());

        let job = JobParams::new(frame()).advancing(Rect::point(1.0, 1.0), 2, f64::NAN);
        assert!(matches!(job.validate(), Err(PrintError::InvalidJob(_))));
    }

    #[test]
    fn parses_current_field_names() {
        let json = r#"{
            "frameRegion": {"x0": 10, "y0": 10, "x1": 110, "y1": 60},
            "advanceTarget": {"x0": 500, "y0": 400, "x1": 500, "y1": 400},
            "iterationCount": 3,
            "advanceDelaySeconds": 1.5
        }"#;
        let job: JobParams = serde_json::from_str(json).unwrap();
        assert_eq!(job.frame_region, Some(frame()));
        assert_eq!(job.effective_iterations(), 3);
        assert_eq!(job.delay().unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn parses_legacy_field_names() {
        let json = r#"{
            "frameCoord": {"select": "frame", "x0": 110, "y0": 60, "x1": 10, "y1": 10},
            "pages": 4,
            "delay": 2
        }"#;
        let job: JobParams = serde_json::from_str(json).unwrap();
        assert!(job.advance_target.is_none());
        assert_eq!(job.iteration_count, 4);
        assert_eq!(job.effective_iterations(), 1);
        assert_eq!(job.advance_delay_seconds, 2.0);
    }

    #[test]
    fn click_policy_from_str() {
        assert_eq!("abort".parse::<ClickFailurePolicy>(), Ok(ClickFailurePolicy::Abort));
        assert_eq!(" Continue ".parse::<ClickFailurePolicy>(), Ok(ClickFailurePolicy::Continue));
        assert!("retry".parse::<ClickFailurePolicy>().is_err());
    }

    #[test]
    fn reports_carry_message_and_detail() {
        let report = PrintError::Capture(CaptureError::NoPrimaryMonitor).report();
        assert_eq!(report.message, "Screen capture failed");
        assert_eq!(report.detail, "No primary monitor found");
    }
}
