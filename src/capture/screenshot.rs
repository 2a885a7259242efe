//! Full-screen capture using the `xcap` crate.
//!
//! This is the infrastructure layer; it talks to the OS.

use super::ScreenSource;
use image::DynamicImage;
use xcap::Monitor;

/// Captures the primary monitor through `xcap`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryMonitor;

impl ScreenSource for PrimaryMonitor {
    fn capture(&self) -> Result<DynamicImage, CaptureError> {
        capture_primary_monitor()
    }

    fn scale_factor(&self) -> f64 {
        match primary_monitor().and_then(|m| {
            m.scale_factor()
                .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))
        }) {
            Ok(factor) if factor > 0.0 => factor as f64,
            Ok(factor) => {
                log::warn!("[CAPTURE] Monitor reported scale factor {}, using 1.0", factor);
                1.0
            }
            Err(e) => {
                log::warn!("[CAPTURE] Could not read scale factor ({}), using 1.0", e);
                1.0
            }
        }
    }
}

fn primary_monitor() -> Result<Monitor, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary().unwrap_or(false) {
            return Ok(monitor);
        }
        // If no monitor reports as primary, use the first one
        if fallback.is_none() {
            fallback = Some(monitor);
        }
    }
    fallback.ok_or(CaptureError::NoPrimaryMonitor)
}

/// Captures the primary monitor's screen as a `DynamicImage`.
///
/// Returns the full-screen screenshot in physical pixels.
/// The caller is responsible for cropping to the user's selection.
pub fn capture_primary_monitor() -> Result<DynamicImage, CaptureError> {
    let start = std::time::Instant::now();

    let image = primary_monitor()?
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    log::debug!(
        "[CAPTURE] {}x{} screenshot in {}ms",
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );

    Ok(DynamicImage::ImageRgba8(image))
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Screen capture did not finish within {0}s")]
    TimedOut(u64),

    #[error("Capture task failed: {0}")]
    Join(String),
}
