/*
 *  display/fonts.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Font cache: (face, pixel size) -> rasterizer, never evicted
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

//! Two kinds of face live in the cache:
//!
//! - TrueType/OpenType files, rasterized with `fontdue`
//! - the bundled ASCII bitmap family from embedded-graphics, used when no
//!   font file is configured or a file cannot be loaded
//!
//! Bitmap faces pick the tallest font not taller than the requested size
//! and magnify 10x20 by whole multiples above 20px.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_8X13, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use fontdue::{Font, FontSettings, Metrics};
use log::{debug, info, warn};

use crate::display::canvas::Canvas;
use crate::display::error::MirrorError;

const BITMAP_FONTS: [&MonoFont<'static>; 4] = [&FONT_6X10, &FONT_8X13, &FONT_9X15, &FONT_10X20];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontId {
    /// The bitmap family compiled into the binary
    Bundled,
    /// A font file, absolute or relative to a search root
    File(String),
}

/// A face bound to one pixel size.
pub enum FontHandle {
    Vector(VectorFace),
    Bitmap { font: &'static MonoFont<'static>, magnify: u32 },
}

pub struct VectorFace {
    font: Rc<Font>,
    px: f32,
    ascent: f32,
    glyphs: HashMap<char, (Metrics, Vec<u8>)>,
}

impl VectorFace {
    fn new(font: Rc<Font>, size: u32) -> Self {
        let px = size as f32;
        let ascent = font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .unwrap_or(px * 0.8);
        Self { font, px, ascent, glyphs: HashMap::new() }
    }

    fn glyph(&mut self, c: char) -> &(Metrics, Vec<u8>) {
        let (font, px) = (&self.font, self.px);
        self.glyphs.entry(c).or_insert_with(|| font.rasterize(c, px))
    }

    fn measure(&self, text: &str) -> u32 {
        let mut width = 0.0f32;
        let mut prev: Option<char> = None;
        for c in text.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, c, self.px).unwrap_or(0.0);
            }
            width += self.font.metrics(c, self.px).advance_width;
            prev = Some(c);
        }
        width.max(0.0).ceil() as u32
    }

    fn render(&mut self, canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Rgb888) {
        let baseline = y + self.ascent.round() as i32;
        let mut pen = x as f32;
        let mut prev: Option<char> = None;
        for c in text.chars() {
            if let Some(p) = prev {
                pen += self.font.horizontal_kern(p, c, self.px).unwrap_or(0.0);
            }
            let (metrics, coverage) = self.glyph(c);
            let gx = (pen + metrics.xmin as f32).round() as i32;
            let gy = baseline - (metrics.height as i32 + metrics.ymin);
            canvas.blend_mask(gx, gy, metrics.width, coverage, color);
            pen += metrics.advance_width;
            prev = Some(c);
        }
    }
}

/// Draw target that blows every pixel up to a `factor`x`factor` block.
struct Magnify<'a> {
    canvas: &'a mut Canvas,
    origin: Point,
    factor: i32,
}

impl OriginDimensions for Magnify<'_> {
    fn size(&self) -> Size {
        self.canvas.size()
    }
}

impl DrawTarget for Magnify<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            let x = self.origin.x + (p.x - self.origin.x) * self.factor;
            let y = self.origin.y + (p.y - self.origin.y) * self.factor;
            self.canvas.fill_rect(x, y, self.factor, self.factor, c);
        }
        Ok(())
    }
}

impl FontHandle {
    /// Bundled face for a pixel size.
    pub fn bundled(size: u32) -> Self {
        let tallest = BITMAP_FONTS[BITMAP_FONTS.len() - 1];
        if size >= tallest.character_size.height {
            let magnify = (size / tallest.character_size.height).max(1);
            return FontHandle::Bitmap { font: tallest, magnify };
        }
        let font = BITMAP_FONTS
            .iter()
            .rev()
            .find(|f| f.character_size.height <= size)
            .copied()
            .unwrap_or(BITMAP_FONTS[0]);
        FontHandle::Bitmap { font, magnify: 1 }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, FontHandle::Bitmap { .. })
    }

    /// Rendered width in device pixels.
    pub fn measure(&self, text: &str) -> u32 {
        match self {
            FontHandle::Vector(face) => face.measure(text),
            FontHandle::Bitmap { font, magnify } => {
                let style = MonoTextStyle::new(*font, Rgb888::WHITE);
                let metrics = style.measure_string(text, Point::zero(), Baseline::Top);
                metrics.bounding_box.size.width * magnify
            }
        }
    }

    pub fn line_height(&self) -> u32 {
        match self {
            FontHandle::Vector(face) => face.px.ceil() as u32,
            FontHandle::Bitmap { font, magnify } => font.character_size.height * magnify,
        }
    }

    /// Draw with the top-left of the line box at (x,y).
    pub fn render(&mut self, canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Rgb888) {
        match self {
            FontHandle::Vector(face) => face.render(canvas, x, y, text, color),
            FontHandle::Bitmap { font, magnify } => {
                let origin = Point::new(x, y);
                let style = MonoTextStyle::new(*font, color);
                let text = Text::with_baseline(text, origin, style, Baseline::Top);
                let _ = if *magnify > 1 {
                    text.draw(&mut Magnify { canvas, origin, factor: *magnify as i32 })
                } else {
                    text.draw(canvas)
                };
            }
        }
    }
}

#[derive(Default)]
pub struct FontCache {
    handles: HashMap<(FontId, u32), FontHandle>,
    faces: HashMap<PathBuf, Rc<Font>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, font: &FontId, size: u32) -> bool {
        self.handles.contains_key(&(font.clone(), size))
    }

    /// Handle for (font, size), loading it on first use. A font file that
    /// cannot be loaded is remembered as the bundled face so it is only
    /// reported once.
    pub fn resolve(&mut self, font: &FontId, size: u32, roots: &[PathBuf]) -> &mut FontHandle {
        match self.handles.entry((font.clone(), size)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let handle = match font {
                    FontId::Bundled => FontHandle::bundled(size),
                    FontId::File(name) => match load_face(&mut self.faces, name, roots) {
                        Ok(face) => FontHandle::Vector(VectorFace::new(face, size)),
                        Err(err) => {
                            warn!("{}; falling back to the bundled font", err);
                            FontHandle::bundled(size)
                        }
                    },
                };
                debug!("Font cache: {:?} at {}px added", font, size);
                e.insert(handle)
            }
        }
    }
}

fn find_font(name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_absolute() {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    roots.iter().map(|root| root.join(name)).find(|p| p.is_file())
}

fn load_face(
    faces: &mut HashMap<PathBuf, Rc<Font>>,
    name: &str,
    roots: &[PathBuf],
) -> Result<Rc<Font>, MirrorError> {
    let path = find_font(name, roots)
        .ok_or_else(|| MirrorError::asset(name, "font not found in search roots"))?;
    if let Some(face) = faces.get(&path) {
        return Ok(Rc::clone(face));
    }
    info!("Loading font {}", path.display());
    let bytes = fs::read(&path).map_err(|e| MirrorError::asset(name, e))?;
    let font = Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| MirrorError::asset(name, e))?;
    let face = Rc::new(font);
    faces.insert(path, Rc::clone(&face));
    Ok(face)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_face_selection() {
        match FontHandle::bundled(12) {
            FontHandle::Bitmap { font, magnify } => {
                assert_eq!(font.character_size.height, 10);
                assert_eq!(magnify, 1);
            }
            _ => panic!("expected bitmap"),
        }
        match FontHandle::bundled(100) {
            FontHandle::Bitmap { font, magnify } => {
                assert_eq!(font.character_size.height, 20);
                assert_eq!(magnify, 5);
            }
            _ => panic!("expected bitmap"),
        }
        assert!(FontHandle::bundled(1).is_bundled());
    }

    #[test]
    fn test_bundled_measure_is_monospace() {
        let face = FontHandle::bundled(20);
        assert_eq!(face.measure("abcd"), 40);
        assert_eq!(face.measure(""), 0);
        assert_eq!(FontHandle::bundled(40).measure("ab"), 40);
        assert_eq!(FontHandle::bundled(40).line_height(), 40);
    }

    #[test]
    fn test_cache_reuses_handles() {
        let mut cache = FontCache::new();
        cache.resolve(&FontId::Bundled, 20, &[]);
        cache.resolve(&FontId::Bundled, 20, &[]);
        cache.resolve(&FontId::Bundled, 30, &[]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&FontId::Bundled, 30));
    }

    #[test]
    fn test_missing_font_file_falls_back_once() {
        let mut cache = FontCache::new();
        let id = FontId::File("no-such-font.ttf".into());
        assert!(cache.resolve(&id, 20, &[PathBuf::from("/nonexistent")]).is_bundled());
        assert!(cache.resolve(&id, 20, &[]).is_bundled());
        assert_eq!(cache.len(), 1);
    }

    fn fixtures() -> Vec<PathBuf> {
        vec![PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")]
    }

    #[test]
    fn test_truetype_face_resolves_and_measures() {
        let mut cache = FontCache::new();
        let id = FontId::File("Tuffy.ttf".into());
        let face = cache.resolve(&id, 20, &fixtures());
        assert!(matches!(face, FontHandle::Vector(_)));
        let ab = face.measure("ab");
        assert!(ab > 0);
        assert!(face.measure("abab") > ab);
        assert!(face.measure("ab") < FontHandle::bundled(20).measure("abcdef"));
    }

    #[test]
    fn test_truetype_sizes_share_one_face() {
        let mut cache = FontCache::new();
        let id = FontId::File("Tuffy.ttf".into());
        let small = cache.resolve(&id, 20, &fixtures()).measure("Hello");
        let large = cache.resolve(&id, 40, &fixtures()).measure("Hello");
        assert!(large > small);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.faces.len(), 1);
        let face = cache.faces.values().next().unwrap();
        // the map plus one handle per size
        assert_eq!(Rc::strong_count(face), 3);
    }

    #[test]
    fn test_truetype_render_stays_in_line_box() {
        let mut canvas = Canvas::new(100, 60).unwrap();
        let mut cache = FontCache::new();
        let face = cache.resolve(&FontId::File("Tuffy.ttf".into()), 20, &fixtures());
        let w = face.measure("H") as i32;
        face.render(&mut canvas, 10, 10, "H", Rgb888::WHITE);
        let lit: Vec<(i32, i32)> = (0..100)
            .flat_map(|x| (0..60).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) != Some(Rgb888::BLACK))
            .collect();
        assert!(!lit.is_empty());
        assert!(
            lit.iter().all(|&(x, y)| (10..=10 + w + 1).contains(&x) && (10..30).contains(&y)),
            "{:?}",
            lit
        );
        // cap height is most of the line box
        let rows = lit.iter().map(|&(_, y)| y);
        let (top, bottom) = (rows.clone().min().unwrap(), rows.max().unwrap());
        assert!(bottom - top >= 8, "glyph spans {}..{}", top, bottom);
    }

    #[test]
    fn test_bitmap_render_marks_pixels() {
        let mut canvas = Canvas::new(60, 30).unwrap();
        let mut face = FontHandle::bundled(20);
        face.render(&mut canvas, 0, 0, "H", Rgb888::WHITE);
        let lit = (0..10)
            .flat_map(|x| (0..20).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) == Some(Rgb888::WHITE))
            .count();
        assert!(lit > 0);
        assert_eq!(canvas.pixel(30, 10), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_magnified_render_scales_blocks() {
        let mut canvas = Canvas::new(100, 100).unwrap();
        let mut face = FontHandle::bundled(40);
        face.render(&mut canvas, 0, 0, "H", Rgb888::WHITE);
        let lit_small = {
            let mut c = Canvas::new(100, 100).unwrap();
            FontHandle::bundled(20).render(&mut c, 0, 0, "H", Rgb888::WHITE);
            (0..100).flat_map(|x| (0..100).map(move |y| (x, y)))
                .filter(|&(x, y)| c.pixel(x, y) == Some(Rgb888::WHITE)).count()
        };
        let lit_big = (0..100).flat_map(|x| (0..100).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) == Some(Rgb888::WHITE)).count();
        assert_eq!(lit_big, lit_small * 4);
    }
}
