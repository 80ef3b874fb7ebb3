//! Software drawing surface backed by an RGBA image

use crate::RgbaImage;
use image::Rgba;
use pdfshow_core::{Color, DrawContext, Font, PageRaster, Transform};
use std::collections::HashSet;

/// Glyph cell proportions relative to the font size
const GLYPH_ADVANCE: f32 = 0.6;
const GLYPH_HEIGHT: f32 = 0.7;

/// [`DrawContext`] that rasterizes into an [`RgbaImage`]
///
/// Strokes use a square brush as wide as the stroke width and are composited
/// once per draw call, so translucent strokes do not darken where their own
/// segments overlap. Text is drawn as one outlined cell per glyph.
#[derive(Debug, Clone)]
pub struct RasterContext {
    image: RgbaImage,
    transform: Transform,
    color: Color,
    stroke_width: u32,
    font: Font,
    alpha: f32,
}

impl RasterContext {
    /// White surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            transform: Transform::IDENTITY,
            color: Color::BLACK,
            stroke_width: 1,
            font: Font::default(),
            alpha: 1.0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// User space to device space
    fn map(&self, x: i64, y: i64) -> (f64, f64) {
        let t = self.transform;
        (
            x as f64 * t.scale_x as f64 + t.translate_x as f64,
            y as f64 * t.scale_y as f64 + t.translate_y as f64,
        )
    }

    /// Collect the on-surface pixels under a square brush centered at (x, y)
    fn brush(&self, x: i64, y: i64, width: i64, out: &mut HashSet<(u32, u32)>) {
        let start = -(width - 1) / 2;
        let (surface_w, surface_h) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = x.saturating_add(start).max(0);
        let x1 = x.saturating_add(start + width).min(surface_w);
        let y0 = y.saturating_add(start).max(0);
        let y1 = y.saturating_add(start + width).min(surface_h);

        for py in y0..y1 {
            for px in x0..x1 {
                out.insert((px as u32, py as u32));
            }
        }
    }

    fn trace_segment(
        &self,
        from: (i64, i64),
        to: (i64, i64),
        width: i64,
        out: &mut HashSet<(u32, u32)>,
    ) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.brush(x, y, width, out);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Stroke a connected path given in user space
    ///
    /// Segments are clipped to the surface grown by half the brush before
    /// they are walked, so the cost is bounded by the surface size.
    fn stroke_path(&mut self, points: &[(i64, i64)], width: u32) {
        let (surface_w, surface_h) = (self.image.width() as i64, self.image.height() as i64);
        let width = (width.max(1) as i64).min(surface_w + surface_h + 2);
        let pad = width as f64 / 2.0 + 1.0;
        let min = (-pad, -pad);
        let max = ((surface_w - 1) as f64 + pad, (surface_h - 1) as f64 + pad);

        let mapped: Vec<(f64, f64)> = points.iter().map(|&(x, y)| self.map(x, y)).collect();
        let mut covered = HashSet::new();
        match mapped.as_slice() {
            [] => {}
            [only] => {
                let (x, y) = device_pixel(*only);
                self.brush(x, y, width, &mut covered);
            }
            _ => {
                for pair in mapped.windows(2) {
                    if let Some((from, to)) = clip_segment(pair[0], pair[1], min, max) {
                        let (from, to) = (device_pixel(from), device_pixel(to));
                        self.trace_segment(from, to, width, &mut covered);
                    }
                }
            }
        }
        for (x, y) in covered {
            self.blend(x, y);
        }
    }

    fn blend(&mut self, x: u32, y: u32) {
        let alpha = (self.color.a as f32 / 255.0) * self.alpha;
        if alpha <= 0.0 {
            return;
        }

        let src = [self.color.r, self.color.g, self.color.b];
        let pixel = self.image.get_pixel_mut(x, y);
        for (channel, value) in src.iter().enumerate() {
            let dst = pixel[channel] as f32;
            pixel[channel] = (*value as f32 * alpha + dst * (1.0 - alpha)).round() as u8;
        }
        let dst_alpha = pixel[3] as f32 / 255.0;
        pixel[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
    }
}

fn device_pixel((x, y): (f64, f64)) -> (i64, i64) {
    (x.round() as i64, y.round() as i64)
}

/// Liang-Barsky clip of a segment against an axis-aligned box
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some(((from.0 + t0 * dx, from.1 + t0 * dy), (from.0 + t1 * dx, from.1 + t1 * dy)))
}

impl DrawContext for RasterContext {
    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width;
    }

    fn set_font(&mut self, font: &Font) {
        self.font = font.clone();
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn draw_string(&mut self, text: &str, x: i32, y: i32) {
        log::trace!("draw_string {:?} at {}, {}", text, x, y);
        let size = self.font.size as f32;
        let advance = (size * GLYPH_ADVANCE).round().max(1.0) as i64;
        let height = (size * GLYPH_HEIGHT).round().max(1.0) as i64;

        // (x, y) is the baseline origin
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x as i64 + i as i64 * advance + 1;
            let right = left + advance - 2;
            let (base, top) = (y as i64, y as i64 - height);
            self.stroke_path(
                &[(left, base), (right, base), (right, top), (left, top), (left, base)],
                1,
            );
        }
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        log::trace!("draw_line {}, {} -> {}, {}", x1, y1, x2, y2);
        let path = [(x1 as i64, y1 as i64), (x2 as i64, y2 as i64)];
        self.stroke_path(&path, self.stroke_width);
    }

    fn draw_polyline(&mut self, xs: &[i32], ys: &[i32]) {
        log::trace!("draw_polyline with {} points", xs.len().min(ys.len()));
        let points: Vec<(i64, i64)> =
            xs.iter().zip(ys.iter()).map(|(&x, &y)| (x as i64, y as i64)).collect();
        self.stroke_path(&points, self.stroke_width);
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        log::trace!("draw_rect {}, {} {}x{}", x, y, width, height);
        let (x, y) = (x as i64, y as i64);
        let (right, bottom) = (x + width as i64, y + height as i64);
        self.stroke_path(
            &[(x, y), (right, y), (right, bottom), (x, bottom), (x, y)],
            self.stroke_width,
        );
    }

    fn draw_raster(&mut self, raster: &PageRaster) {
        let (origin_x, origin_y) = device_pixel(self.map(0, 0));
        log::trace!("draw_raster {}x{} at {}, {}", raster.width, raster.height, origin_x, origin_y);

        for (i, chunk) in raster.pixels.chunks_exact(4).enumerate() {
            let row_width = raster.width.max(1) as usize;
            let x = origin_x.saturating_add((i % row_width) as i64);
            let y = origin_y.saturating_add((i / row_width) as i64);
            if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
                continue;
            }
            self.image.put_pixel(x as u32, y as u32, Rgba([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
    }
}
