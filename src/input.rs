//! Input Injector: moves the pointer to the advance target and clicks it.

use crate::geometry::Point;
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

/// Synthesizes a left click at a screen point.
pub trait PointerInjector: Send + Sync {
    fn click(&self, at: Point) -> Result<(), InjectError>;
}

/// System pointer backed by `enigo`.
///
/// A fresh connection is opened per click because the handle is not `Send`
/// on every platform and clicks are seconds apart.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPointer;

impl PointerInjector for SystemPointer {
    fn click(&self, at: Point) -> Result<(), InjectError> {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectError::Connection(e.to_string()))?;

        let (x, y) = (at.x.round() as i32, at.y.round() as i32);
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| InjectError::Move { x, y, reason: e.to_string() })?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| InjectError::Click(e.to_string()))?;

        log::debug!("[INPUT] Clicked at ({}, {})", x, y);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("Could not connect to the input system: {0}")]
    Connection(String),

    #[error("Failed to move pointer to ({x}, {y}): {reason}")]
    Move { x: i32, y: i32, reason: String },

    #[error("Failed to click: {0}")]
    Click(String),

    #[error("Click task failed: {0}")]
    Join(String),
}
