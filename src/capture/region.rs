//! Pure region cropping logic: functional core.
//!
//! This module has no infrastructure dependencies.
//! It takes pixel data in, returns PNG bytes out.

use crate::geometry::PixelRect;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// One cropped capture, ready to be laid onto a document page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// PNG-encoded pixels of the visible part of the selection.
    pub png: Vec<u8>,
    /// Size of the encoded image after clamping to the screenshot.
    pub width: u32,
    pub height: u32,
    /// Size the selection asked for; the page is laid out at this size.
    pub page_width: u32,
    pub page_height: u32,
    /// Where the visible part sits on the page, from its top-left corner.
    /// Non-zero when the selection starts left of or above the screenshot.
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Crops a screenshot to `rect` and returns the result as PNG bytes.
///
/// The rectangle is clamped to the image bounds: a selection that runs past
/// the captured monitor keeps its on-screen part and drops the rest.
pub fn crop_to_page(image: &DynamicImage, rect: PixelRect) -> Result<PageImage, CropError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = (image.width() as i64, image.height() as i64);

    let left = rect.x.clamp(0, img_width);
    let top = rect.y.clamp(0, img_height);
    let right = rect.x.saturating_add(rect.width as i64).clamp(0, img_width);
    let bottom = rect.y.saturating_add(rect.height as i64).clamp(0, img_height);

    if right <= left || bottom <= top {
        return Err(CropError::NoOverlap {
            requested: (rect.x, rect.y, rect.width, rect.height),
            image_size: (image.width(), image.height()),
        });
    }

    let (width, height) = ((right - left) as u32, (bottom - top) as u32);
    let cropped = image.crop_imm(left as u32, top as u32, width, height);

    let mut png: Vec<u8> = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CropError::EncodingFailed(e.to_string()))?;

    Ok(PageImage {
        png,
        width,
        height,
        page_width: rect.width,
        page_height: rect.height,
        offset_x: (left - rect.x) as u32,
        offset_y: (top - rect.y) as u32,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) lies entirely outside the screenshot ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    NoOverlap {
        requested: (i64, i64, u32, u32),
        image_size: (u32, u32),
    },

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
