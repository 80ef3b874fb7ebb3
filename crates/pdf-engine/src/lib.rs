//! PDF page source for the overlay engine
//!
//! [`LopdfEngine`] reads page geometry with lopdf and produces base-page
//! rasters; [`PdfPages`] exposes one open document as a
//! [`PageRenderer`](pdfshow_core::PageRenderer); [`RasterContext`] draws
//! into an RGBA image.

mod canvas;
mod pages;

pub use canvas::RasterContext;
pub use pages::PdfPages;

use image::{ImageBuffer, Rgba};
use lopdf::{dictionary, Document, Object};
use pdfshow_core::PageSize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page has no readable MediaBox
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize { width: 612.0, height: 792.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale_x: 1.0, scale_y: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    /// Insert a blank page, sized like page `after`, right after it
    fn insert_blank_page(
        &mut self,
        handle: DocumentHandle,
        after: u32,
    ) -> Result<(), PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    bytes: Vec<u8>,
    page_sizes: Vec<PageSize>,
}

#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfEngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()))
                })
                .unwrap_or(DEFAULT_PAGE_SIZE);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document {} with {} pages", handle.raw(), page_sizes.len());
        self.docs.insert(handle, DocumentRecord { bytes, page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let scale_x = if request.scale_x <= 0.0 { 1.0 } else { request.scale_x };
        let scale_y = if request.scale_y <= 0.0 { 1.0 } else { request.scale_y };

        let width = (page_size.width * scale_x).round().max(1.0) as u32;
        let height = (page_size.height * scale_y).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn insert_blank_page(
        &mut self,
        handle: DocumentHandle,
        after: u32,
    ) -> Result<(), PdfEngineError> {
        let record =
            self.docs.get_mut(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))?;
        let page_count = record.page_sizes.len() as u32;
        let out_of_range = PdfEngineError::PageOutOfRange { page: after, page_count };
        let Some(size) = record.page_sizes.get(after as usize).copied() else {
            return Err(out_of_range);
        };

        let mut doc = Document::load_mem(&record.bytes)?;
        let current_id = *doc.get_pages().get(&(after + 1)).ok_or(out_of_range)?;
        let parent_id = doc.get_dictionary(current_id)?.get(b"Parent")?.as_reference()?;

        let new_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent_id,
            "MediaBox" => media_box(size),
        });

        let kids = doc.get_object_mut(parent_id)?.as_dict_mut()?.get_mut(b"Kids")?.as_array_mut()?;
        let position = kids
            .iter()
            .position(|kid| kid.as_reference().ok() == Some(current_id))
            .ok_or_else(|| PdfEngineError::Backend("page missing from its parent".to_owned()))?;
        kids.insert(position + 1, Object::Reference(new_id));

        // Every ancestor's Count covers the new leaf
        let mut node = Some(parent_id);
        while let Some(id) = node {
            let dict = doc.get_object_mut(id)?.as_dict_mut()?;
            let count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
            dict.set("Count", count + 1);
            node = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|err| PdfEngineError::Backend(format!("failed to save document: {err}")))?;

        record.bytes = bytes;
        record.page_sizes.insert(after as usize + 1, size);
        log::debug!("inserted blank page after {} in document {}", after, handle.raw());
        Ok(())
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

fn media_box(size: PageSize) -> Vec<Object> {
    vec![Object::Integer(0), Object::Integer(0), size.width.into(), size.height.into()]
}

/// Build a PDF made of blank pages of the given sizes
pub fn blank_document(sizes: &[PageSize]) -> Result<Vec<u8>, PdfEngineError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = sizes
        .iter()
        .map(|size| {
            let page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box(*size),
            };
            doc.add_object(page).into()
        })
        .collect();

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => sizes.len() as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| PdfEngineError::Backend(format!("failed to save document: {err}")))?;
    Ok(bytes)
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
