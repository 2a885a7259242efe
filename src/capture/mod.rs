//! Screen capture domain: public API.
//!
//! This module owns all screen capture functionality.
//! External code should only use the items exported here.

mod region;
mod screenshot;

pub use region::{crop_to_page, CropError, PageImage};
pub use screenshot::{capture_primary_monitor, CaptureError, PrimaryMonitor};

use image::DynamicImage;

/// Capture Provider: produces a full-screen raster on demand.
///
/// Implementations are called from a blocking thread and hold no state
/// between calls.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<DynamicImage, CaptureError>;

    /// Physical pixels per logical pixel on the captured display.
    fn scale_factor(&self) -> f64;
}
