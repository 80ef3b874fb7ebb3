//! Annotation overlay core
//!
//! Per-page annotation shapes for paginated documents, page navigation, and
//! the paint pass that composites annotations over a base page raster.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod overlay;
pub mod render;
pub mod session;
pub mod shape;

pub use config::{ConfigError, OverlayConfig};
pub use context::{
    Color, DrawCommand, DrawContext, Font, FontStyle, PageRaster, RecordingContext, Transform,
};
pub use document::{Document, ListenerId, PageChange, PageSize, Scale, ViewportSize};
pub use error::{OverlayError, OverlayResult, RenderError};
pub use overlay::OverlayStore;
pub use render::{paint, PageRenderer};
pub use session::{PaintOutcome, Session};
pub use shape::{
    Point, PolyLine, Shape, ShapeKind, LINE_WIDTH, MARKER_ALPHA, MARKER_WIDTH, POLYLINE_CAPACITY,
};
