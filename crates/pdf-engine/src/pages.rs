use crate::{DocumentHandle, LopdfEngine, OpenSource, PdfEngine, PdfEngineError, RenderRequest};
use pdfshow_core::{DrawContext, PageRaster, PageRenderer, PageSize, RenderError, Transform};

impl From<PdfEngineError> for RenderError {
    fn from(err: PdfEngineError) -> Self {
        match err {
            PdfEngineError::Io(err) => RenderError::Io(err),
            PdfEngineError::PageOutOfRange { page, page_count } => RenderError::PageOutOfRange {
                page: page as usize,
                page_count: page_count as usize,
            },
            other => RenderError::Format(other.to_string()),
        }
    }
}

/// One open document, seen through a [`PdfEngine`]
#[derive(Debug)]
pub struct PdfPages<E: PdfEngine = LopdfEngine> {
    engine: E,
    handle: DocumentHandle,
}

impl PdfPages<LopdfEngine> {
    /// Open `source` with the default lopdf backend
    pub fn open(source: impl Into<OpenSource>) -> Result<Self, PdfEngineError> {
        Self::with_engine(LopdfEngine::new(), source)
    }
}

impl<E: PdfEngine> PdfPages<E> {
    pub fn with_engine(mut engine: E, source: impl Into<OpenSource>) -> Result<Self, PdfEngineError> {
        let handle = engine.open(source.into())?;
        Ok(Self { engine, handle })
    }

    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }
}

impl<E: PdfEngine> PageRenderer for PdfPages<E> {
    /// Reports 0 when the engine no longer knows the handle (e.g. after
    /// `close`); the engine error is logged since the trait cannot carry it.
    fn page_count(&self) -> usize {
        match self.engine.page_count(self.handle) {
            Ok(count) => count as usize,
            Err(err) => {
                log::error!("page count unavailable for document {}: {err}", self.handle.raw());
                0
            }
        }
    }

    fn intrinsic_bbox(&self, page: usize) -> Result<PageSize, RenderError> {
        Ok(self.engine.page_size(self.handle, page as u32)?)
    }

    fn render_page_to_context(
        &self,
        page: usize,
        ctx: &mut dyn DrawContext,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<(), RenderError> {
        let request = RenderRequest { page_index: page as u32, scale_x, scale_y };
        let image = self.engine.render_page(self.handle, request)?;
        let (width, height) = image.dimensions();
        log::trace!("rendered page {page} at {width}x{height}");

        ctx.set_transform(Transform::IDENTITY);
        ctx.draw_raster(&PageRaster { width, height, pixels: image.into_raw() });
        // PDF space: origin bottom-left, y up
        ctx.set_transform(Transform::flipped(height as f32));
        Ok(())
    }

    fn insert_blank_page(&mut self, after: usize) -> Result<(), RenderError> {
        Ok(self.engine.insert_blank_page(self.handle, after as u32)?)
    }

    fn close(&mut self) -> Result<(), RenderError> {
        Ok(self.engine.close(self.handle)?)
    }
}
