//! The per-iteration algorithm: capture, crop, add page, click, report, wait.

use super::controller::Inner;
use super::context::RunContext;
use super::{ClickFailurePolicy, JobParams, PrintError};
use crate::capture::{crop_to_page, CaptureError, PageImage};
use crate::document::PdfBuilder;
use crate::geometry::{PixelRect, Point};
use crate::input::InjectError;
use std::sync::Arc;
use std::time::Instant;

pub(super) enum Termination {
    Completed,
    Cancelled,
    /// The click policy stopped the run; the pages so far are kept.
    Aborted(PrintError),
}

/// Runs the iterations of one job into `builder`.
///
/// An `Err` is fatal to the run: the document must not be finalized.
pub(super) async fn capture_pages(
    inner: &Inner,
    job: &JobParams,
    ctx: &mut RunContext,
    builder: &mut PdfBuilder,
) -> Result<Termination, PrintError> {
    let frame = job.validate()?;
    let scale = scale_factor(inner).await;
    let rect = frame.normalize().to_pixels(scale);
    let total = job.effective_iterations();
    let delay = job.delay()?;

    log::info!(
        "[PRINTER] Frame {}x{} px at ({}, {}), scale {}",
        rect.width, rect.height, rect.x, rect.y, scale
    );

    for p in 0..total {
        ctx.current_iteration = p + 1;
        let page_no = ctx.current_iteration;

        let page = capture_page(inner, rect).await?;
        builder.add_page(page.page_width, page.page_height)?;
        builder.place_image(&page.png, page.offset_x, page.offset_y)?;

        if let Some(target) = job.advance_target {
            if let Err(e) = click(inner, target.midpoint()).await {
                match inner.settings.on_click_failure {
                    ClickFailurePolicy::Continue => {
                        log::warn!("[PRINTER] Page {}: {} — continuing", page_no, e);
                    }
                    ClickFailurePolicy::Abort => {
                        log::error!("[PRINTER] Page {}: {} — aborting run", page_no, e);
                        return Ok(Termination::Aborted(e.into()));
                    }
                }
            }
        }

        inner.progress(page_no, page_no == total);

        tokio::time::sleep(delay).await;

        if ctx.take_cancel() {
            log::info!("[PRINTER] Cancelled after page {}", ctx.current_iteration);
            inner.progress(ctx.current_iteration, true);
            return Ok(Termination::Cancelled);
        }
    }

    Ok(Termination::Completed)
}

async fn scale_factor(inner: &Inner) -> f64 {
    if let Some(factor) = inner.settings.scale_factor {
        return factor;
    }
    let screen = Arc::clone(&inner.collaborators.screen);
    match tokio::task::spawn_blocking(move || screen.scale_factor()).await {
        Ok(factor) if factor.is_finite() && factor > 0.0 => factor,
        Ok(factor) => {
            log::warn!("[PRINTER] Ignoring scale factor {}, using 1.0", factor);
            1.0
        }
        Err(e) => {
            log::warn!("[PRINTER] Scale factor lookup failed ({}), using 1.0", e);
            1.0
        }
    }
}

/// Screenshot plus crop on a blocking thread. A capture that outlives the
/// configured timeout is reported as failed; the blocking call itself is
/// left to finish on its own.
async fn capture_page(inner: &Inner, rect: PixelRect) -> Result<PageImage, PrintError> {
    let start = Instant::now();
    let screen = Arc::clone(&inner.collaborators.screen);
    let task = tokio::task::spawn_blocking(move || -> Result<PageImage, PrintError> {
        let screenshot = screen.capture()?;
        Ok(crop_to_page(&screenshot, rect)?)
    });

    let joined = match inner.settings.capture_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| CaptureError::TimedOut(limit.as_secs()))?,
        None => task.await,
    };
    let page = joined.map_err(|e| CaptureError::Join(e.to_string()))??;

    log::info!(
        "[PRINTER] Captured {}x{} in {}ms ({} bytes)",
        page.width,
        page.height,
        start.elapsed().as_millis(),
        page.png.len()
    );
    Ok(page)
}

async fn click(inner: &Inner, at: Point) -> Result<(), InjectError> {
    let pointer = Arc::clone(&inner.collaborators.pointer);
    tokio::task::spawn_blocking(move || pointer.click(at))
        .await
        .map_err(|e| InjectError::Join(e.to_string()))?
}
