//! Document page state and per-page overlays
//!
//! The document owns one [`OverlayStore`] per page, kept index-aligned with
//! the page list, plus the current page and the page-to-viewport scale.
//! Navigation never fails: it saturates at the first and last page.

use crate::error::{OverlayError, OverlayResult};
use crate::overlay::OverlayStore;
use crate::shape::Shape;
use std::num::NonZeroUsize;

/// Intrinsic page size in the document's own units (points for PDF)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Size of the host's drawing area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Page-to-viewport scale factors
///
/// Axes are independent: the page is stretched to fill the viewport rather
/// than letterboxed.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    /// Not yet computed
    pub const UNSET: Scale = Scale { x: 0.0, y: 0.0 };

    pub fn is_set(&self) -> bool {
        self.x != 0.0
    }
}

/// Emitted after the current page changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub previous: usize,
    pub current: usize,
    pub page_count: usize,
}

/// Handle returned by [`Document::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type PageListener = Box<dyn FnMut(&PageChange)>;

/// Page navigation state and annotation overlays of one open document
pub struct Document {
    /// Zero-based, independent of any page labels inside the document
    current_page: usize,
    overlays: Vec<OverlayStore>,
    scale: Scale,
    listeners: Vec<(ListenerId, PageListener)>,
    next_listener: u64,
}

impl Document {
    /// Create a document with `page_count` empty pages, positioned on the first
    pub fn new(page_count: NonZeroUsize) -> Self {
        Self {
            current_page: 0,
            overlays: vec![OverlayStore::new(); page_count.get()],
            scale: Scale::UNSET,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.overlays.len()
    }

    /// Current page index (zero-based)
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.page_count()
    }

    /// Advance one page; returns false on the last page
    pub fn goto_next(&mut self) -> bool {
        if self.is_last_page() {
            return false;
        }
        self.move_to(self.current_page + 1);
        true
    }

    /// Go back one page; returns false on the first page
    pub fn goto_prev(&mut self) -> bool {
        if self.is_first_page() {
            return false;
        }
        self.move_to(self.current_page - 1);
        true
    }

    /// Jump to `page`
    ///
    /// Returns false and leaves the current page unchanged if `page` is out
    /// of range.
    pub fn set_page_number(&mut self, page: usize) -> bool {
        if page >= self.page_count() {
            log::warn!("ignoring jump to page {} of {}", page, self.page_count());
            return false;
        }
        self.move_to(page);
        true
    }

    /// Insert an empty page after the current one and move onto it
    ///
    /// Overlays of later pages shift up by one index. Returns the new page's
    /// index.
    pub fn insert_new_page(&mut self) -> usize {
        let at = self.current_page + 1;
        self.overlays.insert(at, OverlayStore::new());
        log::debug!("inserted page {} (page_count={})", at, self.page_count());
        self.goto_next();
        at
    }

    fn move_to(&mut self, page: usize) {
        let change = PageChange {
            previous: self.current_page,
            current: page,
            page_count: self.page_count(),
        };
        self.current_page = page;
        log::debug!("page {} -> {} of {}", change.previous, change.current, change.page_count);

        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }

    /// Register a callback fired after every successful navigation
    pub fn subscribe(&mut self, listener: impl FnMut(&PageChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn needs_scaling(&self) -> bool {
        !self.scale.is_set()
    }

    /// Fit `page` to `viewport`, each axis on its own
    ///
    /// A degenerate page size leaves the scale unset.
    pub fn compute_scaling(&mut self, page: PageSize, viewport: ViewportSize) -> Scale {
        if page.width <= 0.0 || page.height <= 0.0 {
            log::warn!("cannot scale page of size {}x{}", page.width, page.height);
            self.scale = Scale::UNSET;
            return self.scale;
        }
        self.scale = Scale {
            x: viewport.width as f32 / page.width,
            y: viewport.height as f32 / page.height,
        };
        log::debug!(
            "scale {}x{} page to {}x{} viewport: ({}, {})",
            page.width,
            page.height,
            viewport.width,
            viewport.height,
            self.scale.x,
            self.scale.y
        );
        self.scale
    }

    /// Forget the computed scale so the next paint recomputes it
    pub fn reset_scaling(&mut self) {
        self.scale = Scale::UNSET;
    }

    pub fn store(&self, page: usize) -> Option<&OverlayStore> {
        self.overlays.get(page)
    }

    pub fn current_store(&self) -> &OverlayStore {
        &self.overlays[self.current_page]
    }

    /// All overlay stores, indexed by page
    pub fn stores(&self) -> &[OverlayStore] {
        &self.overlays
    }

    fn store_mut(&mut self, page: usize) -> OverlayResult<&mut OverlayStore> {
        self.overlays.get_mut(page).ok_or(OverlayError::StoreUninitialized { page })
    }

    pub fn add_shape_on(&mut self, page: usize, shape: Shape) -> OverlayResult<usize> {
        log::trace!("page {}: add {}", page, shape);
        Ok(self.store_mut(page)?.append(shape))
    }

    pub fn replace_shape_on(
        &mut self,
        page: usize,
        index: usize,
        shape: Shape,
    ) -> OverlayResult<Shape> {
        self.store_mut(page)?.replace(index, shape)
    }

    pub fn remove_last_shape_on(&mut self, page: usize) -> OverlayResult<Option<Shape>> {
        Ok(self.store_mut(page)?.remove_last())
    }

    pub fn remove_shape_on(&mut self, page: usize, index: usize) -> OverlayResult<Shape> {
        self.store_mut(page)?.remove_at(index)
    }

    pub fn clear_page_on(&mut self, page: usize) -> OverlayResult<()> {
        log::trace!("page {}: clear", page);
        self.store_mut(page)?.clear();
        Ok(())
    }

    /// Add to the current page
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.overlays[self.current_page].append(shape)
    }

    /// Replace on the current page
    pub fn replace_shape(&mut self, index: usize, shape: Shape) -> OverlayResult<Shape> {
        self.replace_shape_on(self.current_page, index, shape)
    }

    /// Remove the topmost shape of the current page, if any
    pub fn remove_last_shape(&mut self) -> Option<Shape> {
        self.overlays[self.current_page].remove_last()
    }

    pub fn remove_shape_at(&mut self, index: usize) -> OverlayResult<Shape> {
        self.remove_shape_on(self.current_page, index)
    }

    /// Delete every annotation on the current page
    pub fn clear_page(&mut self) {
        self.overlays[self.current_page].clear();
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("current_page", &self.current_page)
            .field("page_count", &self.page_count())
            .field("scale", &self.scale)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
