/*
 *  display/canvas.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  RGBA frame buffer every primitive draws into
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use std::path::Path;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use tiny_skia::{ColorU8, Pixmap, PixmapPaint, Transform};

use crate::display::color::blend_channel;
use crate::display::error::MirrorError;

/// A device-sized frame. Always opaque: it is cleared to a solid colour at
/// the start of every frame and everything else is composited over it.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, MirrorError> {
        let pixmap = Pixmap::new(width.max(1), height.max(1)).ok_or_else(|| {
            MirrorError::Present(format!("cannot allocate a {}x{} frame", width, height))
        })?;
        let mut canvas = Self { pixmap };
        canvas.clear(Rgb888::BLACK);
        Ok(canvas)
    }

    pub fn width(&self) -> u32 { self.pixmap.width() }
    pub fn height(&self) -> u32 { self.pixmap.height() }

    pub fn pixmap(&self) -> &Pixmap { &self.pixmap }

    pub fn clear(&mut self, color: Rgb888) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r(), color.g(), color.b(), 255));
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 {
            let (x, y) = (x as u32, y as u32);
            if x < self.width() && y < self.height() {
                return Some((y * self.width() + x) as usize);
            }
        }
        None
    }

    #[inline]
    fn put(&mut self, i: usize, color: Rgb888) {
        self.pixmap.pixels_mut()[i] =
            ColorU8::from_rgba(color.r(), color.g(), color.b(), 255).premultiply();
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.idx(x, y).map(|i| {
            let c = self.pixmap.pixels()[i].demultiply();
            Rgb888::new(c.red(), c.green(), c.blue())
        })
    }

    /// Solid fill of `w`x`h` device pixels, clipped to the frame.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb888) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width() as i32);
        let y1 = y.saturating_add(h).min(self.height() as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                if let Some(i) = self.idx(px, py) {
                    self.put(i, color);
                }
            }
        }
    }

    /// One pixel wide outline through the corners (x,y) and (x+w,y+h).
    pub fn outline_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb888) {
        let (x, w) = if w < 0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0 { (y + h, -h) } else { (y, h) };
        self.fill_rect(x, y, w + 1, 1, color);
        self.fill_rect(x, y + h, w + 1, 1, color);
        self.fill_rect(x, y, 1, h + 1, color);
        self.fill_rect(x + w, y, 1, h + 1, color);
    }

    /// Composite a raster with its own alpha at (x,y).
    pub fn draw_pixmap(&mut self, x: i32, y: i32, src: &Pixmap) {
        self.pixmap.draw_pixmap(
            x,
            y,
            src.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Paint `color` through an 8-bit coverage mask (`w` bytes per row).
    pub fn blend_mask(&mut self, x: i32, y: i32, w: usize, coverage: &[u8], color: Rgb888) {
        if w == 0 {
            return;
        }
        for (row, line) in coverage.chunks(w).enumerate() {
            for (col, &a) in line.iter().enumerate() {
                if a == 0 {
                    continue;
                }
                let Some(i) = self.idx(x + col as i32, y + row as i32) else { continue };
                let dst = self.pixmap.pixels()[i].demultiply();
                let blended = Rgb888::new(
                    blend_channel(dst.red(), color.r(), a),
                    blend_channel(dst.green(), color.g(), a),
                    blend_channel(dst.blue(), color.b(), a),
                );
                self.put(i, blended);
            }
        }
    }

    /// Straight RGBA bytes, row-major, as a window surface expects them.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    pub fn save_png(&self, path: &Path) -> Result<(), MirrorError> {
        self.pixmap
            .save_png(path)
            .map_err(|e| MirrorError::Present(format!("{}: {}", path.display(), e)))
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

// lets embedded-graphics text and primitives render straight into the frame
impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p.x, p.y) {
                self.put(i, c);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        Canvas::clear(self, color);
        Ok(())
    }
}
