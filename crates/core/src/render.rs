//! Render pipeline: base page first, annotations on top

use crate::context::{DrawContext, Transform};
use crate::document::{Document, PageSize, Scale, ViewportSize};
use crate::error::RenderError;

/// Source of page geometry and base-page rasters
///
/// Implemented by the document backend. After
/// [`render_page_to_context`](Self::render_page_to_context) the context may be
/// left with any transform installed; shapes reinstall their own.
pub trait PageRenderer {
    fn page_count(&self) -> usize;

    /// Native page size, independent of the viewport
    fn intrinsic_bbox(&self, page: usize) -> Result<PageSize, RenderError>;

    /// Draw `page` into `ctx` at the given scale factors
    fn render_page_to_context(
        &self,
        page: usize,
        ctx: &mut dyn DrawContext,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<(), RenderError>;

    /// Insert a blank page immediately after `after`
    fn insert_blank_page(&mut self, after: usize) -> Result<(), RenderError>;

    /// Release the backing document
    fn close(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// One paint pass over the document's current page
///
/// Computes the scale from page 0 when unset, draws the base page, then every
/// shape of the current page in insertion order under
/// [`Transform::UPRIGHT`]. Nothing is drawn over a base page that failed to
/// render. Returns the number of shapes drawn.
pub fn paint(
    document: &mut Document,
    renderer: &dyn PageRenderer,
    ctx: &mut dyn DrawContext,
    viewport: ViewportSize,
) -> Result<usize, RenderError> {
    if document.needs_scaling() {
        let bbox = renderer.intrinsic_bbox(0)?;
        document.compute_scaling(bbox, viewport);
    }
    let Scale { x, y } = document.scale();

    let page = document.current_page();
    renderer.render_page_to_context(page, ctx, x, y)?;

    let store = document.current_store();
    store.render(ctx, &Transform::UPRIGHT);
    Ok(store.len())
}
