//! Annotation shape model
//!
//! A [`Shape`] is an anchor point, a color and one of a closed set of
//! variants. Geometry and style are fixed at construction; the only growth a
//! shape allows is appending points to a [`PolyLine`], bounded by its capacity.
//! All coordinates are integer pixels in page space.

use crate::context::{Color, DrawContext, Font, Transform};
use crate::error::{OverlayError, OverlayResult};
use std::fmt;

/// Maximum number of points a polyline records
pub const POLYLINE_CAPACITY: usize = 250;

/// Stroke width for lines, polylines and rectangles
pub const LINE_WIDTH: u32 = 3;

/// Stroke width for highlighter marks
pub const MARKER_WIDTH: u32 = 15;

/// Alpha requested while a highlighter mark is drawn
pub const MARKER_ALPHA: f32 = 0.5;

/// Integer point in page pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt() as f32
    }
}

/// Append-only point sequence with a fixed ceiling
///
/// Coordinates are kept as parallel x/y sequences so they can be handed to
/// [`DrawContext::draw_polyline`] without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyLine {
    xs: Vec<i32>,
    ys: Vec<i32>,
    capacity: usize,
    stroke_width: u32,
}

impl PolyLine {
    fn from_parts(
        xs: Vec<i32>,
        ys: Vec<i32>,
        capacity: usize,
        stroke_width: u32,
    ) -> OverlayResult<Self> {
        if xs.len() != ys.len() {
            return Err(OverlayError::InvalidConfiguration { xs: xs.len(), ys: ys.len() });
        }
        if xs.len() > capacity {
            return Err(OverlayError::CapacityExceeded { capacity });
        }
        Ok(Self { xs, ys, capacity, stroke_width })
    }

    /// Record another point. Fails without appending once the capacity is reached.
    pub fn add_point(&mut self, x: i32, y: i32) -> OverlayResult<()> {
        if self.xs.len() == self.capacity {
            return Err(OverlayError::CapacityExceeded { capacity: self.capacity });
        }
        self.xs.push(x);
        self.ys.push(y);
        Ok(())
    }

    /// Number of recorded points
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn x(&self, i: usize) -> Option<i32> {
        self.xs.get(i).copied()
    }

    pub fn y(&self, i: usize) -> Option<i32> {
        self.ys.get(i).copied()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.xs.iter().zip(&self.ys).map(|(&x, &y)| Point::new(x, y))
    }

    pub fn last(&self) -> Option<Point> {
        Some(Point::new(*self.xs.last()?, *self.ys.last()?))
    }
}

/// Variant-specific geometry and style
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// String drawn with its baseline at the anchor
    Text { text: String, font: Font },

    /// Segment from the anchor to `end`. Highlighter marks are lines with
    /// `highlight` set.
    Line { end: Point, stroke_width: u32, highlight: bool },

    /// Free-hand stroke through the recorded points
    PolyLine(PolyLine),

    /// Axis-aligned outline from the anchor to `corner`
    Rectangle { corner: Point, stroke_width: u32 },
}

/// One annotation on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    anchor: Point,
    color: Color,
    kind: ShapeKind,
}

impl Shape {
    pub(crate) fn from_parts(anchor: Point, color: Color, kind: ShapeKind) -> Self {
        Self { anchor, color, kind }
    }

    /// Typed text in the default 24px sans font
    pub fn text(x: i32, y: i32, text: impl Into<String>) -> Self {
        Self::from_parts(
            Point::new(x, y),
            Color::RED,
            ShapeKind::Text { text: text.into(), font: Font::default() },
        )
    }

    /// Straight line
    pub fn line(x: i32, y: i32, end_x: i32, end_y: i32) -> Self {
        Self::from_parts(
            Point::new(x, y),
            Color::RED,
            ShapeKind::Line { end: Point::new(end_x, end_y), stroke_width: LINE_WIDTH, highlight: false },
        )
    }

    /// Wide yellow highlighter stroke
    pub fn marker(x: i32, y: i32, end_x: i32, end_y: i32) -> Self {
        Self::from_parts(
            Point::new(x, y),
            Color::YELLOW,
            ShapeKind::Line {
                end: Point::new(end_x, end_y),
                stroke_width: MARKER_WIDTH,
                highlight: true,
            },
        )
    }

    /// Empty free-hand stroke anchored at `(x, y)`
    ///
    /// The anchor is not itself a recorded point; callers add points as the
    /// pointer moves.
    pub fn polyline(x: i32, y: i32) -> OverlayResult<Self> {
        Self::polyline_from_coords(x, y, Vec::new(), Vec::new())
    }

    /// Free-hand stroke with pre-recorded coordinates
    pub fn polyline_from_coords(x: i32, y: i32, xs: Vec<i32>, ys: Vec<i32>) -> OverlayResult<Self> {
        let line = PolyLine::from_parts(xs, ys, POLYLINE_CAPACITY, LINE_WIDTH)?;
        Ok(Self::from_parts(Point::new(x, y), Color::RED, ShapeKind::PolyLine(line)))
    }

    pub(crate) fn polyline_with(
        anchor: Point,
        color: Color,
        capacity: usize,
        stroke_width: u32,
    ) -> OverlayResult<Self> {
        let line = PolyLine::from_parts(Vec::new(), Vec::new(), capacity, stroke_width)?;
        Ok(Self::from_parts(anchor, color, ShapeKind::PolyLine(line)))
    }

    /// Rectangle outline spanning the two corners
    pub fn rectangle(x: i32, y: i32, corner_x: i32, corner_y: i32) -> Self {
        Self::from_parts(
            Point::new(x, y),
            Color::RED,
            ShapeKind::Rectangle { corner: Point::new(corner_x, corner_y), stroke_width: LINE_WIDTH },
        )
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, ShapeKind::Line { highlight: true, .. })
    }

    pub fn as_polyline(&self) -> Option<&PolyLine> {
        match &self.kind {
            ShapeKind::PolyLine(line) => Some(line),
            _ => None,
        }
    }

    /// Mutable access for appending points while a stroke is in progress
    pub fn as_polyline_mut(&mut self) -> Option<&mut PolyLine> {
        match &mut self.kind {
            ShapeKind::PolyLine(line) => Some(line),
            _ => None,
        }
    }

    /// Draw into `ctx`
    ///
    /// Installs `transform` first; transforms left behind by earlier draws
    /// are never relied on.
    pub fn render(&self, ctx: &mut dyn DrawContext, transform: &Transform) {
        ctx.set_transform(*transform);
        let Point { x, y } = self.anchor;

        match &self.kind {
            ShapeKind::Text { text, font } => {
                ctx.set_color(self.color);
                ctx.set_font(font);
                ctx.draw_string(text, x, y);
            }
            ShapeKind::Line { end, stroke_width, highlight } => {
                ctx.set_stroke_width(*stroke_width);
                ctx.set_color(self.color);
                if *highlight {
                    ctx.set_alpha(MARKER_ALPHA);
                }
                ctx.draw_line(x, y, end.x, end.y);
                if *highlight {
                    ctx.set_alpha(1.0);
                }
            }
            ShapeKind::PolyLine(line) => {
                ctx.set_stroke_width(line.stroke_width);
                ctx.set_color(self.color);
                ctx.draw_polyline(&line.xs, &line.ys);
            }
            ShapeKind::Rectangle { corner, stroke_width } => {
                ctx.set_stroke_width(*stroke_width);
                ctx.set_color(self.color);
                ctx.draw_rect(x, y, extent(x, corner.x), extent(y, corner.y));
            }
        }
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let Point { x, y } = self.anchor;
        match &self.kind {
            ShapeKind::Text { text, font } => {
                // Rough advance of 0.6em per glyph; real extents depend on the surface
                let width = (text.chars().count() as f32 * font.size as f32 * 0.6).ceil() as i32;
                (x, y.saturating_sub(font.size as i32), x.saturating_add(width), y)
            }
            ShapeKind::Line { end, .. } => (x.min(end.x), y.min(end.y), x.max(end.x), y.max(end.y)),
            ShapeKind::PolyLine(line) => {
                let mut points = line.points();
                let Some(first) = points.next() else {
                    return (x, y, x, y);
                };
                points.fold((first.x, first.y, first.x, first.y), |(x0, y0, x1, y1), p| {
                    (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
                })
            }
            ShapeKind::Rectangle { corner, .. } => {
                let (width, height) = (extent(x, corner.x), extent(y, corner.y));
                (x, y, x.saturating_add(width), y.saturating_add(height))
            }
        }
    }

    /// Check if a point is on (or, for text and rectangles, within) this shape
    pub fn hit_test(&self, point: &Point, tolerance: f32) -> bool {
        match &self.kind {
            ShapeKind::Line { end, stroke_width, .. } => {
                let reach = tolerance + *stroke_width as f32 / 2.0;
                point_near_line_segment(point, &self.anchor, end, reach)
            }
            ShapeKind::PolyLine(line) => {
                let reach = tolerance + line.stroke_width as f32 / 2.0;
                let points: Vec<Point> = line.points().collect();
                match points.as_slice() {
                    [] => false,
                    [only] => point.distance_to(only) <= reach,
                    _ => points
                        .windows(2)
                        .any(|pair| point_near_line_segment(point, &pair[0], &pair[1], reach)),
                }
            }
            ShapeKind::Text { .. } | ShapeKind::Rectangle { .. } => {
                let (min_x, min_y, max_x, max_y) = self.bounding_box();
                let (px, py) = (point.x as f32, point.y as f32);
                px >= min_x as f32 - tolerance
                    && px <= max_x as f32 + tolerance
                    && py >= min_y as f32 - tolerance
                    && py <= max_y as f32 + tolerance
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point { x, y } = self.anchor;
        match &self.kind {
            ShapeKind::Text { text, .. } => write!(f, "Text: {}, {}, {}", x, y, text),
            ShapeKind::Line { end, highlight, .. } => {
                let name = if *highlight { "Marker" } else { "Line" };
                write!(f, "{} from {}, {} to {} {}", name, x, y, end.x, end.y)
            }
            ShapeKind::PolyLine(line) => match line.last() {
                Some(last) => write!(
                    f,
                    "PolyLine {} points from {}, {} to {} {}",
                    line.len(),
                    x,
                    y,
                    last.x,
                    last.y
                ),
                None => write!(f, "PolyLine 0 points at {}, {}", x, y),
            },
            ShapeKind::Rectangle { corner, .. } => {
                write!(f, "Rectangle from {}, {} to {} {}", x, y, corner.x, corner.y)
            }
        }
    }
}

/// Distance between two coordinates, saturated to `i32::MAX`
fn extent(from: i32, to: i32) -> i32 {
    from.abs_diff(to).min(i32::MAX as u32) as i32
}

fn point_near_line_segment(point: &Point, start: &Point, end: &Point, tolerance: f32) -> bool {
    // f64 keeps differences of any two i32 coordinates exact
    let (sx, sy) = (start.x as f64, start.y as f64);
    let (px, py) = (point.x as f64, point.y as f64);
    let dx = end.x as f64 - sx;
    let dy = end.y as f64 - sy;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(start) <= tolerance;
    }

    let t = (((px - sx) * dx + (py - sy) * dy) / length_sq).clamp(0.0, 1.0);

    let cx = sx + t * dx;
    let cy = sy + t * dy;
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() <= tolerance as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCommand, RecordingContext};

    #[test]
    fn test_default_styles() {
        let line = Shape::line(0, 0, 10, 10);
        assert_eq!(line.color(), Color::RED);
        assert!(matches!(line.kind(), ShapeKind::Line { stroke_width: 3, highlight: false, .. }));

        let marker = Shape::marker(0, 0, 10, 10);
        assert_eq!(marker.color(), Color::YELLOW);
        assert!(marker.is_marker());
        assert!(matches!(marker.kind(), ShapeKind::Line { stroke_width: 15, .. }));

        let text = Shape::text(5, 5, "hi");
        match text.kind() {
            ShapeKind::Text { text, font } => {
                assert_eq!(text, "hi");
                assert_eq!(font, &Font::default());
                assert_eq!(font.size, 24);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_polyline_accepts_exactly_capacity_points() {
        let mut shape = Shape::polyline(0, 0).unwrap();
        let line = shape.as_polyline_mut().unwrap();
        for i in 0..POLYLINE_CAPACITY as i32 {
            line.add_point(i, i * 2).unwrap();
        }
        assert_eq!(line.len(), 250);

        let err = line.add_point(999, 999).unwrap_err();
        assert_eq!(err, OverlayError::CapacityExceeded { capacity: 250 });
        assert_eq!(line.len(), 250);
        assert_eq!(line.x(249), Some(249));
        assert_eq!(line.y(249), Some(498));
        assert_eq!(line.x(250), None);
    }

    #[test]
    fn test_polyline_mismatched_coords_rejected() {
        let err = Shape::polyline_from_coords(0, 0, vec![1, 2, 3], vec![1, 2]).unwrap_err();
        assert_eq!(err, OverlayError::InvalidConfiguration { xs: 3, ys: 2 });
    }

    #[test]
    fn test_polyline_from_coords_over_capacity_rejected() {
        let xs = vec![0; POLYLINE_CAPACITY + 1];
        let ys = vec![0; POLYLINE_CAPACITY + 1];
        let err = Shape::polyline_from_coords(0, 0, xs, ys).unwrap_err();
        assert!(matches!(err, OverlayError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_polyline_anchor_is_not_a_point() {
        let shape = Shape::polyline(7, 8).unwrap();
        assert_eq!(shape.anchor(), Point::new(7, 8));
        assert!(shape.as_polyline().unwrap().is_empty());
    }

    #[test]
    fn test_line_render_sequence() {
        let mut ctx = RecordingContext::new();
        Shape::line(1, 2, 3, 4).render(&mut ctx, &Transform::UPRIGHT);

        assert_eq!(
            ctx.commands(),
            &[
                DrawCommand::SetTransform(Transform::UPRIGHT),
                DrawCommand::SetStrokeWidth(3),
                DrawCommand::SetColor(Color::RED),
                DrawCommand::Line { x1: 1, y1: 2, x2: 3, y2: 4 },
            ]
        );
    }

    #[test]
    fn test_marker_brackets_alpha() {
        let mut ctx = RecordingContext::new();
        Shape::marker(0, 0, 5, 0).render(&mut ctx, &Transform::UPRIGHT);

        let cmds = ctx.commands();
        assert_eq!(cmds[1], DrawCommand::SetStrokeWidth(MARKER_WIDTH));
        assert_eq!(cmds[2], DrawCommand::SetColor(Color::YELLOW));
        assert_eq!(cmds[3], DrawCommand::SetAlpha(MARKER_ALPHA));
        assert_eq!(cmds[4], DrawCommand::Line { x1: 0, y1: 0, x2: 5, y2: 0 });
        assert_eq!(cmds[5], DrawCommand::SetAlpha(1.0));
    }

    #[test]
    fn test_rectangle_uses_absolute_extent() {
        let mut ctx = RecordingContext::new();
        Shape::rectangle(50, 40, 10, 100).render(&mut ctx, &Transform::UPRIGHT);

        assert_eq!(
            ctx.draws(),
            vec![&DrawCommand::Rect { x: 50, y: 40, width: 40, height: 60 }]
        );
    }

    #[test]
    fn test_text_render_sets_font() {
        let mut ctx = RecordingContext::new();
        Shape::text(5, 5, "hi").render(&mut ctx, &Transform::UPRIGHT);

        assert!(ctx.commands().contains(&DrawCommand::SetFont(Font::default())));
        assert_eq!(
            ctx.draws(),
            vec![&DrawCommand::String { text: "hi".to_string(), x: 5, y: 5 }]
        );
    }

    #[test]
    fn test_polyline_render_passes_all_points() {
        let mut shape = Shape::polyline(0, 0).unwrap();
        let line = shape.as_polyline_mut().unwrap();
        line.add_point(1, 1).unwrap();
        line.add_point(2, 4).unwrap();
        line.add_point(3, 9).unwrap();

        let mut ctx = RecordingContext::new();
        shape.render(&mut ctx, &Transform::UPRIGHT);
        assert_eq!(
            ctx.draws(),
            vec![&DrawCommand::Polyline { xs: vec![1, 2, 3], ys: vec![1, 4, 9] }]
        );
    }

    #[test]
    fn test_render_installs_transform_every_time() {
        let mut ctx = RecordingContext::new();
        ctx.set_transform(Transform::flipped(792.0));
        Shape::line(0, 0, 1, 1).render(&mut ctx, &Transform::UPRIGHT);
        assert_eq!(ctx.transform(), Transform::UPRIGHT);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::text(1, 2, "note").to_string(), "Text: 1, 2, note");
        assert_eq!(Shape::line(0, 0, 10, 10).to_string(), "Line from 0, 0 to 10 10");
        assert_eq!(Shape::marker(1, 1, 2, 2).to_string(), "Marker from 1, 1 to 2 2");
        assert_eq!(Shape::rectangle(1, 1, 4, 4).to_string(), "Rectangle from 1, 1 to 4 4");

        let shape = Shape::polyline_from_coords(0, 0, vec![3, 5], vec![4, 6]).unwrap();
        assert_eq!(shape.to_string(), "PolyLine 2 points from 0, 0 to 5 6");
        assert_eq!(Shape::polyline(9, 9).unwrap().to_string(), "PolyLine 0 points at 9, 9");
    }

    #[test]
    fn test_bounding_boxes() {
        assert_eq!(Shape::line(10, 80, 50, 20).bounding_box(), (10, 20, 50, 80));
        assert_eq!(Shape::rectangle(50, 40, 10, 100).bounding_box(), (50, 40, 90, 100));

        let poly = Shape::polyline_from_coords(0, 0, vec![5, -3, 8], vec![2, 7, 1]).unwrap();
        assert_eq!(poly.bounding_box(), (-3, 1, 8, 7));
        assert_eq!(Shape::polyline(4, 4).unwrap().bounding_box(), (4, 4, 4, 4));
    }

    #[test]
    fn test_hit_testing() {
        let line = Shape::line(0, 0, 100, 0);
        assert!(line.hit_test(&Point::new(50, 2), 1.0));
        assert!(!line.hit_test(&Point::new(50, 20), 1.0));

        let rect = Shape::rectangle(10, 10, 30, 30);
        assert!(rect.hit_test(&Point::new(20, 20), 0.0));
        assert!(!rect.hit_test(&Point::new(40, 40), 2.0));

        let poly = Shape::polyline_from_coords(0, 0, vec![0, 10, 10], vec![0, 0, 10]).unwrap();
        assert!(poly.hit_test(&Point::new(10, 5), 0.5));
        assert!(!poly.hit_test(&Point::new(0, 10), 0.5));

        assert!(!Shape::polyline(0, 0).unwrap().hit_test(&Point::new(0, 0), 10.0));
    }

    #[test]
    fn test_geometry_at_coordinate_extremes() {
        let rect = Shape::rectangle(-2_000_000_000, 0, 2_000_000_000, 10);
        let mut ctx = RecordingContext::new();
        rect.render(&mut ctx, &Transform::UPRIGHT);
        assert_eq!(
            ctx.draws(),
            vec![&DrawCommand::Rect { x: -2_000_000_000, y: 0, width: i32::MAX, height: 10 }]
        );
        assert_eq!(rect.bounding_box(), (-2_000_000_000, 0, 147_483_647, 10));
        assert!(rect.hit_test(&Point::new(0, 5), 0.0));

        let line = Shape::line(i32::MIN, 0, i32::MAX, 0);
        assert_eq!(line.bounding_box(), (i32::MIN, 0, i32::MAX, 0));
        assert!(line.hit_test(&Point::new(0, 1), 2.0));
        assert!(!line.hit_test(&Point::new(0, 100), 2.0));

        let text = Shape::text(i32::MAX, i32::MIN, "edge");
        assert_eq!(text.bounding_box(), (i32::MAX, i32::MIN, i32::MAX, i32::MIN));

        let far = Point::new(i32::MIN, i32::MIN).distance_to(&Point::new(i32::MAX, i32::MAX));
        assert!(far > 6.0e9);
    }
}
