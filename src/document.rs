//! Document Builder: accumulates captured pages into a single PDF.
//!
//! Pages are laid out one pixel to one point, with the image origin at the
//! top-left corner of the page. Every page carries its own size, so a run
//! whose selection is clamped or changed still produces a valid document.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;

pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    finished_pages: Vec<ObjectId>,
    current: Option<PendingPage>,
}

struct PendingPage {
    width: u32,
    height: u32,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            finished_pages: Vec::new(),
            current: None,
        }
    }

    /// Number of pages started so far, including the one being drawn.
    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + usize::from(self.current.is_some())
    }

    /// Starts a new page of `width` x `height` points. The previous page,
    /// if any, is closed.
    pub fn add_page(&mut self, width: u32, height: u32) -> Result<(), DocumentError> {
        if width == 0 || height == 0 {
            return Err(DocumentError::EmptyPage { width, height });
        }
        self.close_page()?;
        self.current = Some(PendingPage {
            width,
            height,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
        Ok(())
    }

    /// Draws a PNG onto the current page with its top-left corner at
    /// (`origin_x`, `origin_y`), measured from the page's top-left corner.
    pub fn place_image(&mut self, png: &[u8], origin_x: u32, origin_y: u32) -> Result<(), DocumentError> {
        let page = self.current.as_mut().ok_or(DocumentError::NoPage)?;

        let rgb = image::load_from_memory(png)
            .map_err(|e| DocumentError::Decode(e.to_string()))?
            .to_rgb8();
        let (img_width, img_height) = rgb.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        let compressed = encoder.finish()?;

        let image_stream = Stream::new(
            dictionary! {
                "Type" => Object::Name(b"XObject".to_vec()),
                "Subtype" => Object::Name(b"Image".to_vec()),
                "Width" => Object::Integer(img_width as i64),
                "Height" => Object::Integer(img_height as i64),
                "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => Object::Name(b"FlateDecode".to_vec()),
            },
            compressed,
        );
        let image_id = self.doc.add_object(image_stream);

        let name = format!("Im{}", page.xobjects.len());
        page.xobjects.set(name.clone(), Object::Reference(image_id));

        // PDF user space grows upwards from the bottom-left corner.
        let bottom = page.height as i64 - origin_y as i64 - img_height as i64;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(img_width as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(img_height as i64),
                    Object::Integer(origin_x as i64),
                    Object::Integer(bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn close_page(&mut self) -> Result<(), DocumentError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };

        let content = Content { operations: page.operations }
            .encode()
            .map_err(|e| DocumentError::Write(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(page.width as i64),
                Object::Integer(page.height as i64),
            ]),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => page.xobjects,
            },
        });
        self.finished_pages.push(page_id);
        Ok(())
    }

    /// Writes every page to `path`, replacing any previous file.
    ///
    /// A builder with no pages still produces a valid, empty document.
    pub fn finish(mut self, path: &Path) -> Result<usize, DocumentError> {
        self.close_page()?;

        let kids: Vec<Object> = self
            .finished_pages
            .iter()
            .map(|id| Object::Reference(*id))
            .collect();
        let count = kids.len();

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => Object::Name(b"Pages".to_vec()),
                "Kids" => Object::Array(kids),
                "Count" => Object::Integer(count as i64),
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.doc
            .save(path)
            .map_err(|e| DocumentError::Write(e.to_string()))?;

        log::info!("[PDF] Wrote {} page(s) to {}", count, path.display());
        Ok(count)
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("No page has been added yet")]
    NoPage,

    #[error("Page size {width}x{height} has no area")]
    EmptyPage { width: u32, height: u32 },

    #[error("Failed to decode page image: {0}")]
    Decode(String),

    #[error("Failed to write document: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
