//! Overlay style configuration
//!
//! Stroke widths, colors, font and polyline capacity used when building
//! shapes. Configuration can be loaded from a file, environment variables,
//! or created programmatically. The plain [`Shape`] constructors always use
//! the defaults; the `*_shape` builders here apply the configured values.

use crate::context::{Color, Font};
use crate::error::OverlayResult;
use crate::shape::{Point, Shape, ShapeKind, LINE_WIDTH, MARKER_WIDTH, POLYLINE_CAPACITY};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Maximum points recorded by a free-hand stroke
    pub polyline_capacity: usize,
    /// Stroke width for lines, polylines and rectangles
    pub line_width: u32,
    /// Stroke width for highlighter marks
    pub marker_width: u32,
    /// Color of text, lines, polylines and rectangles
    pub ink_color: Color,
    /// Color of highlighter marks
    pub highlight_color: Color,
    pub font: Font,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            polyline_capacity: POLYLINE_CAPACITY,
            line_width: LINE_WIDTH,
            marker_width: MARKER_WIDTH,
            ink_color: Color::RED,
            highlight_color: Color::YELLOW,
            font: Font::default(),
        }
    }
}

impl OverlayConfig {
    pub fn with_polyline_capacity(mut self, capacity: usize) -> Self {
        self.polyline_capacity = capacity;
        self
    }

    pub fn with_line_width(mut self, width: u32) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_marker_width(mut self, width: u32) -> Self {
        self.marker_width = width;
        self
    }

    pub fn with_ink_color(mut self, color: Color) -> Self {
        self.ink_color = color;
        self
    }

    pub fn with_highlight_color(mut self, color: Color) -> Self {
        self.highlight_color = color;
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDFSHOW_POLYLINE_CAPACITY`
    /// - `PDFSHOW_LINE_WIDTH`
    /// - `PDFSHOW_MARKER_WIDTH`
    /// - `PDFSHOW_INK_COLOR` (`#rrggbb`)
    /// - `PDFSHOW_HIGHLIGHT_COLOR` (`#rrggbb`)
    /// - `PDFSHOW_FONT_FAMILY`
    /// - `PDFSHOW_FONT_SIZE`
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (var, key) in [
            ("PDFSHOW_POLYLINE_CAPACITY", "polyline_capacity"),
            ("PDFSHOW_LINE_WIDTH", "line_width"),
            ("PDFSHOW_MARKER_WIDTH", "marker_width"),
            ("PDFSHOW_INK_COLOR", "ink_color"),
            ("PDFSHOW_HIGHLIGHT_COLOR", "highlight_color"),
            ("PDFSHOW_FONT_FAMILY", "font_family"),
            ("PDFSHOW_FONT_SIZE", "font_size"),
        ] {
            if let Ok(val) = std::env::var(var) {
                config
                    .set(key, &val)
                    .map_err(|_| ConfigError::InvalidValue(var.to_string()))?;
            }
        }

        Ok(config)
    }

    /// Loads configuration from a `key = value` file.
    ///
    /// Expected file format:
    /// ```text
    /// polyline_capacity = 250
    /// line_width = 3
    /// marker_width = 15
    /// ink_color = "#ff0000"
    /// highlight_color = "#ffff00"
    /// font_family = "Sans"
    /// font_size = 24
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    /// Parses configuration text; unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.set(key.trim(), value.trim().trim_matches('"'))?;
            }
        }

        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue(key.to_string());
        match key {
            "polyline_capacity" => self.polyline_capacity = value.parse().map_err(|_| invalid())?,
            "line_width" => self.line_width = value.parse().map_err(|_| invalid())?,
            "marker_width" => self.marker_width = value.parse().map_err(|_| invalid())?,
            "ink_color" => self.ink_color = Color::from_hex(value).ok_or_else(invalid)?,
            "highlight_color" => {
                self.highlight_color = Color::from_hex(value).ok_or_else(invalid)?
            }
            "font_family" => self.font.family = value.to_string(),
            "font_size" => self.font.size = value.parse().map_err(|_| invalid())?,
            _ => log::debug!("ignoring unknown config key {}", key),
        }
        Ok(())
    }

    /// Saves configuration to a file readable by [`from_file`](Self::from_file).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_text())?;
        Ok(())
    }

    fn to_text(&self) -> String {
        format!(
            "# Overlay configuration\n\
             polyline_capacity = {}\n\
             line_width = {}\n\
             marker_width = {}\n\
             ink_color = \"{}\"\n\
             highlight_color = \"{}\"\n\
             font_family = \"{}\"\n\
             font_size = {}\n",
            self.polyline_capacity,
            self.line_width,
            self.marker_width,
            self.ink_color.to_hex(),
            self.highlight_color.to_hex(),
            self.font.family,
            self.font.size
        )
    }

    pub fn text_shape(&self, x: i32, y: i32, text: impl Into<String>) -> Shape {
        Shape::from_parts(
            Point::new(x, y),
            self.ink_color,
            ShapeKind::Text { text: text.into(), font: self.font.clone() },
        )
    }

    pub fn line_shape(&self, x: i32, y: i32, end_x: i32, end_y: i32) -> Shape {
        Shape::from_parts(
            Point::new(x, y),
            self.ink_color,
            ShapeKind::Line {
                end: Point::new(end_x, end_y),
                stroke_width: self.line_width,
                highlight: false,
            },
        )
    }

    pub fn marker_shape(&self, x: i32, y: i32, end_x: i32, end_y: i32) -> Shape {
        Shape::from_parts(
            Point::new(x, y),
            self.highlight_color,
            ShapeKind::Line {
                end: Point::new(end_x, end_y),
                stroke_width: self.marker_width,
                highlight: true,
            },
        )
    }

    pub fn polyline_shape(&self, x: i32, y: i32) -> OverlayResult<Shape> {
        Shape::polyline_with(Point::new(x, y), self.ink_color, self.polyline_capacity, self.line_width)
    }

    pub fn rectangle_shape(&self, x: i32, y: i32, corner_x: i32, corner_y: i32) -> Shape {
        Shape::from_parts(
            Point::new(x, y),
            self.ink_color,
            ShapeKind::Rectangle {
                corner: Point::new(corner_x, corner_y),
                stroke_width: self.line_width,
            },
        )
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
