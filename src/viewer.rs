//! External viewer for the finalized document.

use std::path::Path;

pub trait DocumentViewer: Send + Sync {
    fn show(&self, path: &Path) -> std::io::Result<()>;
}

/// Hands the file to the desktop's default PDF application.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl DocumentViewer for SystemViewer {
    fn show(&self, path: &Path) -> std::io::Result<()> {
        open::that_detached(path)
    }
}

/// Viewer used when opening documents is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoViewer;

impl DocumentViewer for NoViewer {
    fn show(&self, path: &Path) -> std::io::Result<()> {
        log::info!("[PRINTER] Viewer disabled, document left at {}", path.display());
        Ok(())
    }
}
