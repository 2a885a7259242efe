//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, RgbaImage};
use screen_printer_lib::capture::{CaptureError, ScreenSource};
use screen_printer_lib::geometry::{Point, Rect};
use screen_printer_lib::input::{InjectError, PointerInjector};
use screen_printer_lib::ipc::{self, Event, EventReceiver};
use screen_printer_lib::printer::{Collaborators, JobParams, PrintSettings, Printer, ProgressEvent};
use screen_printer_lib::viewer::DocumentViewer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

pub struct FakeScreen {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    /// 1-based capture call that fails.
    pub fail_on: Option<usize>,
    pub latency: Duration,
    pub calls: AtomicUsize,
}

impl FakeScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            fail_on: None,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScreenSource for FakeScreen {
    fn capture(&self) -> Result<DynamicImage, CaptureError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.fail_on == Some(call) {
            return Err(CaptureError::CaptureFailed("display disconnected".to_string()));
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::new(self.width, self.height)))
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }
}

/// Records clicks; optionally fails them or stops the printer on a click.
#[derive(Default)]
pub struct FakePointer {
    pub clicks: Mutex<Vec<Point>>,
    pub fail: bool,
    /// Stop this printer when the given 1-based click happens.
    pub stop_on: Option<usize>,
    pub printer: OnceLock<Printer>,
}

impl PointerInjector for FakePointer {
    fn click(&self, at: Point) -> Result<(), InjectError> {
        let count = {
            let mut clicks = self.clicks.lock().unwrap();
            clicks.push(at);
            clicks.len()
        };
        if self.stop_on == Some(count) {
            if let Some(printer) = self.printer.get() {
                printer.stop();
            }
        }
        if self.fail {
            return Err(InjectError::Click("accessibility permission denied".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeViewer {
    pub shown: Mutex<Vec<PathBuf>>,
}

impl DocumentViewer for FakeViewer {
    fn show(&self, path: &Path) -> std::io::Result<()> {
        self.shown.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub struct Harness {
    pub printer: Printer,
    pub events: EventReceiver,
    pub screen: Arc<FakeScreen>,
    pub pointer: Arc<FakePointer>,
    pub viewer: Arc<FakeViewer>,
    pub output: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(screen: FakeScreen, pointer: FakePointer) -> Self {
        Self::with_settings(screen, pointer, |_| {})
    }

    pub fn with_settings(
        screen: FakeScreen,
        pointer: FakePointer,
        tweak: impl FnOnce(&mut PrintSettings),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("preview.pdf");
        let mut settings = PrintSettings {
            output_path: output.clone(),
            capture_timeout: None,
            ..PrintSettings::default()
        };
        tweak(&mut settings);

        let screen = Arc::new(screen);
        let pointer = Arc::new(pointer);
        let viewer = Arc::new(FakeViewer::default());
        let (tx, events) = ipc::channel();
        let printer = Printer::new(
            settings,
            Collaborators {
                screen: screen.clone(),
                pointer: pointer.clone(),
                viewer: viewer.clone(),
            },
            tx,
        );
        let _ = pointer.printer.set(printer.clone());

        Self {
            printer,
            events,
            screen,
            pointer,
            viewer,
            output,
            _dir: dir,
        }
    }

    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn frame() -> Rect {
    Rect::new(10.0, 10.0, 110.0, 60.0)
}

pub fn next_button() -> Rect {
    Rect::new(600.0, 400.0, 620.0, 420.0)
}

pub fn advancing_job(pages: u32, delay: f64) -> JobParams {
    JobParams::new(frame()).advancing(next_button(), pages, delay)
}

pub fn progress(events: &[Event]) -> Vec<(u32, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PrintProgress(ProgressEvent { page, done }) => Some((*page, *done)),
            _ => None,
        })
        .collect()
}

pub fn page_sizes(path: &Path) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let media_box = doc
                .get_object(*id)
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .clone();
            (
                media_box[2].as_i64().unwrap(),
                media_box[3].as_i64().unwrap(),
            )
        })
        .collect()
}

/// Lower-left corner of each drawn image, in PDF user space, page by page.
pub fn image_origins(path: &Path) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .flat_map(|id| {
            let content = lopdf::content::Content::decode(&doc.get_page_content(*id).unwrap()).unwrap();
            content
                .operations
                .into_iter()
                .filter(|op| op.operator == "cm")
                .map(|op| (op.operands[4].as_i64().unwrap(), op.operands[5].as_i64().unwrap()))
                .collect::<Vec<_>>()
        })
        .collect()
}
