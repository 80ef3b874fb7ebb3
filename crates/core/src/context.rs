//! Drawing context seam
//!
//! Shapes and page renderers draw through [`DrawContext`]; hosts supply the
//! concrete surface. Coordinates are integer page pixels, mapped through the
//! currently installed [`Transform`].

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbbaa`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
}

/// Font style flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FontStyle {
    Plain,
    Bold,
    Italic,
}

/// Font used by text shapes
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Font {
    pub family: String,
    pub style: FontStyle,
    /// Size in pixels
    pub size: u32,
}

impl Font {
    pub fn new(family: impl Into<String>, style: FontStyle, size: u32) -> Self {
        Self { family: family.into(), style, size }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("Sans", FontStyle::Plain, 24)
    }
}

/// Axis-aligned affine transform (scale then translate)
///
/// Maps a point as `x' = x * scale_x + translate_x`,
/// `y' = y * scale_y + translate_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Transform {
    pub const IDENTITY: Transform =
        Transform { translate_x: 0.0, translate_y: 0.0, scale_x: 1.0, scale_y: 1.0 };

    /// Installed before every shape draw. Page renderers leave the context
    /// vertically flipped; shapes draw in screen space on top of it.
    pub const UPRIGHT: Transform =
        Transform { translate_x: 1.0, translate_y: -1.0, scale_x: 1.0, scale_y: 1.0 };

    /// Create a translation transform
    pub fn translate(x: f32, y: f32) -> Self {
        Self { translate_x: x, translate_y: y, ..Self::IDENTITY }
    }

    /// Create a scale transform
    pub fn scale(x: f32, y: f32) -> Self {
        Self { scale_x: x, scale_y: y, ..Self::IDENTITY }
    }

    /// Bottom-left origin with y growing upward, over a surface `height` pixels tall
    pub fn flipped(height: f32) -> Self {
        Self { translate_x: 0.0, translate_y: height, scale_x: 1.0, scale_y: -1.0 }
    }

    /// Map a point through the transform
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale_x + self.translate_x, y * self.scale_y + self.translate_y)
    }

    /// `self` applied after `inner`
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            translate_x: inner.translate_x * self.scale_x + self.translate_x,
            translate_y: inner.translate_y * self.scale_y + self.translate_y,
            scale_x: inner.scale_x * self.scale_x,
            scale_y: inner.scale_y * self.scale_y,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// RGBA8 base-page image produced by a page renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRaster {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl PageRaster {
    /// Solid-color raster
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Self { width, height, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }
}

/// Mutable 2D drawing surface
///
/// State set through the `set_*` methods applies to every subsequent draw
/// call until changed.
pub trait DrawContext {
    fn set_transform(&mut self, transform: Transform);
    fn transform(&self) -> Transform;
    fn set_color(&mut self, color: Color);
    fn set_stroke_width(&mut self, width: u32);
    fn set_font(&mut self, font: &Font);

    /// Global alpha for subsequent draws. Surfaces without compositing may ignore it.
    fn set_alpha(&mut self, _alpha: f32) {}

    fn draw_string(&mut self, text: &str, x: i32, y: i32);
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);
    /// Connected segments through `xs[i], ys[i]`; slices have equal length
    fn draw_polyline(&mut self, xs: &[i32], ys: &[i32]);
    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Blit a base-page image with its top-left corner at the origin
    fn draw_raster(&mut self, raster: &PageRaster);
}

/// A draw call captured by [`RecordingContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetTransform(Transform),
    SetColor(Color),
    SetStrokeWidth(u32),
    SetFont(Font),
    SetAlpha(f32),
    String { text: String, x: i32, y: i32 },
    Line { x1: i32, y1: i32, x2: i32, y2: i32 },
    Polyline { xs: Vec<i32>, ys: Vec<i32> },
    Rect { x: i32, y: i32, width: i32, height: i32 },
    Raster { width: u32, height: u32 },
}

impl DrawCommand {
    /// Whether this command puts pixels on the surface
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DrawCommand::String { .. }
                | DrawCommand::Line { .. }
                | DrawCommand::Polyline { .. }
                | DrawCommand::Rect { .. }
                | DrawCommand::Raster { .. }
        )
    }
}

/// Context that records every call instead of drawing
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform: Transform,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Only the commands that draw something
    pub fn draws(&self) -> Vec<&DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw()).collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawContext for RecordingContext {
    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetColor(color));
    }

    fn set_stroke_width(&mut self, width: u32) {
        self.commands.push(DrawCommand::SetStrokeWidth(width));
    }

    fn set_font(&mut self, font: &Font) {
        self.commands.push(DrawCommand::SetFont(font.clone()));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }

    fn draw_string(&mut self, text: &str, x: i32, y: i32) {
        self.commands.push(DrawCommand::String { text: text.to_string(), x, y });
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.commands.push(DrawCommand::Line { x1, y1, x2, y2 });
    }

    fn draw_polyline(&mut self, xs: &[i32], ys: &[i32]) {
        self.commands.push(DrawCommand::Polyline { xs: xs.to_vec(), ys: ys.to_vec() });
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.commands.push(DrawCommand::Rect { x, y, width, height });
    }

    fn draw_raster(&mut self, raster: &PageRaster) {
        self.commands.push(DrawCommand::Raster { width: raster.width, height: raster.height });
    }
}
