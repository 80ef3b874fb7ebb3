//! Host-facing session over one open document
//!
//! Couples a [`Document`] with its [`PageRenderer`] and the current viewport,
//! and turns base-page failures into user-visible messages instead of errors.

use crate::config::OverlayConfig;
use crate::context::DrawContext;
use crate::document::{Document, ListenerId, PageChange, Scale, ViewportSize};
use crate::error::{OverlayResult, RenderError};
use crate::render::{paint, PageRenderer};
use crate::shape::Shape;
use std::num::NonZeroUsize;

/// Result of a paint request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintOutcome {
    /// Base page and `shapes` annotations were drawn
    Painted { shapes: usize },
    /// The base page failed; nothing was drawn over it
    Failed { message: String },
}

type FailureListener = Box<dyn FnMut(&str)>;

pub struct Session<R: PageRenderer> {
    document: Document,
    renderer: R,
    viewport: ViewportSize,
    config: OverlayConfig,
    on_failure: Option<FailureListener>,
}

impl<R: PageRenderer> Session<R> {
    /// Start a session on the first page of `renderer`'s document
    pub fn open(renderer: R, viewport: ViewportSize) -> Result<Self, RenderError> {
        Self::with_config(renderer, viewport, OverlayConfig::default())
    }

    pub fn with_config(
        renderer: R,
        viewport: ViewportSize,
        config: OverlayConfig,
    ) -> Result<Self, RenderError> {
        let page_count = NonZeroUsize::new(renderer.page_count())
            .ok_or_else(|| RenderError::Format("document has no pages".to_string()))?;
        log::debug!("opened document with {} pages", page_count);

        Ok(Self {
            document: Document::new(page_count),
            renderer,
            viewport,
            config,
            on_failure: None,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn scale(&self) -> Scale {
        self.document.scale()
    }

    /// Resize; the scale is recomputed on the next paint
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.document.reset_scaling();
        }
    }

    /// Register the sink for user-visible failure messages
    pub fn on_failure(&mut self, listener: impl FnMut(&str) + 'static) {
        self.on_failure = Some(Box::new(listener));
    }

    /// Register a page-number listener
    pub fn on_page_changed(&mut self, listener: impl FnMut(&PageChange) + 'static) -> ListenerId {
        self.document.subscribe(listener)
    }

    /// Paint the current page into `ctx`
    pub fn render(&mut self, ctx: &mut dyn DrawContext) -> PaintOutcome {
        match paint(&mut self.document, &self.renderer, ctx, self.viewport) {
            Ok(shapes) => PaintOutcome::Painted { shapes },
            Err(err) => {
                log::error!("failed to render page {}: {}", self.document.current_page(), err);
                let message = format!("Failure: {}", err);
                if let Some(listener) = self.on_failure.as_mut() {
                    listener(&message);
                }
                PaintOutcome::Failed { message }
            }
        }
    }

    pub fn current_page(&self) -> usize {
        self.document.current_page()
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn goto_next(&mut self) -> bool {
        self.document.goto_next()
    }

    pub fn goto_prev(&mut self) -> bool {
        self.document.goto_prev()
    }

    pub fn set_page_number(&mut self, page: usize) -> bool {
        self.document.set_page_number(page)
    }

    /// Insert a blank page after the current one and move onto it
    ///
    /// The backing document gets the page first; overlays are only touched
    /// once that succeeds.
    pub fn insert_new_page(&mut self) -> Result<usize, RenderError> {
        let current = self.document.current_page();
        self.renderer.insert_blank_page(current)?;
        Ok(self.document.insert_new_page())
    }

    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.document.add_shape(shape)
    }

    pub fn replace_shape(&mut self, index: usize, shape: Shape) -> OverlayResult<Shape> {
        self.document.replace_shape(index, shape)
    }

    pub fn remove_last_shape(&mut self) -> Option<Shape> {
        self.document.remove_last_shape()
    }

    pub fn remove_shape_at(&mut self, index: usize) -> OverlayResult<Shape> {
        self.document.remove_shape_at(index)
    }

    pub fn clear_page(&mut self) {
        self.document.clear_page()
    }

    /// Close the backing document, consuming the session
    pub fn close(mut self) -> Result<(), RenderError> {
        self.renderer.close()
    }
}
