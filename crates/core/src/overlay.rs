//! Per-page overlay store
//!
//! Insertion order is z-order: shapes are drawn first to last, so the most
//! recently added shape is on top.

use crate::context::{DrawContext, Transform};
use crate::error::{OverlayError, OverlayResult};
use crate::shape::{Point, Shape};

/// Ordered annotations of a single page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayStore {
    shapes: Vec<Shape>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape on top and return its index
    ///
    /// The index stays valid for [`replace`](Self::replace) until a shape
    /// below it is removed.
    pub fn append(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    /// Overwrite the shape at `index`, returning the previous one
    ///
    /// Drag gestures call this on every pointer move so the preview shape is
    /// swapped in place instead of accumulating.
    pub fn replace(&mut self, index: usize, shape: Shape) -> OverlayResult<Shape> {
        let len = self.shapes.len();
        let slot = self.shapes.get_mut(index).ok_or(OverlayError::NoSuchIndex { index, len })?;
        Ok(std::mem::replace(slot, shape))
    }

    /// Drop the topmost shape; does nothing on an empty store
    pub fn remove_last(&mut self) -> Option<Shape> {
        self.shapes.pop()
    }

    pub fn remove_at(&mut self, index: usize) -> OverlayResult<Shape> {
        if index >= self.shapes.len() {
            return Err(OverlayError::NoSuchIndex { index, len: self.shapes.len() });
        }
        Ok(self.shapes.remove(index))
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes in draw order
    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// Index of the topmost shape under `point`
    pub fn topmost_at(&self, point: &Point, tolerance: f32) -> Option<usize> {
        self.shapes.iter().rposition(|shape| shape.hit_test(point, tolerance))
    }

    /// Draw every shape in insertion order
    pub fn render(&self, ctx: &mut dyn DrawContext, transform: &Transform) {
        for shape in &self.shapes {
            shape.render(ctx, transform);
        }
    }
}

impl<'a> IntoIterator for &'a OverlayStore {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
