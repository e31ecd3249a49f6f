/*
 *  display/images.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Image loading with a persistent on-disk cache of prepared rasters
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

//! Prepared images (inverted, resized, scaled) are written to the cache
//! directory under a key built from every input that affects the pixels.
//! A hit skips decoding and resampling entirely.
//!
//! Entry layout, little endian:
//!
//! ```text
//! "LYMC" | version u8 | pixel_w u32 | pixel_h u32 | width u32 | height u32 | RGBA...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tiny_skia::{ColorU8, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::display::error::MirrorError;

const MAGIC: &[u8; 4] = b"LYMC";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 4 * 4;

/// A prepared raster plus its size in logical units.
#[derive(Debug, Clone)]
pub struct Image {
    pixmap: Pixmap,
    width: u32,
    height: u32,
}

impl Image {
    /// Logical width, before the global scale.
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn pixel_width(&self) -> u32 { self.pixmap.width() }
    pub fn pixel_height(&self) -> u32 { self.pixmap.height() }
    pub fn pixmap(&self) -> &Pixmap { &self.pixmap }

    pub fn to_rgba(&self) -> Vec<u8> {
        pixmap_to_rgba(&self.pixmap)
    }

    /// Rasterize inline SVG markup.
    pub fn from_svg_str(
        name: &str,
        svg: &str,
        width: Option<u32>,
        invert: bool,
        scale: f32,
    ) -> Result<Image, MirrorError> {
        let natural = render_svg(name, svg.as_bytes())?;
        prepare(name, natural, width, invert, scale)?.into_image(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    width: u32,
    height: u32,
    pixel_width: u32,
    pixel_height: u32,
    rgba: Vec<u8>,
}

impl CacheEntry {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.rgba.len());
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        for v in [self.pixel_width, self.pixel_height, self.width, self.height] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&self.rgba);
        out
    }

    fn decode(bytes: &[u8]) -> Result<CacheEntry, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("truncated header ({} bytes)", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("bad magic".into());
        }
        if bytes[4] != VERSION {
            return Err(format!("unsupported version {}", bytes[4]));
        }
        let word = |i: usize| {
            let at = 5 + i * 4;
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let (pixel_width, pixel_height, width, height) = (word(0), word(1), word(2), word(3));
        if pixel_width == 0 || pixel_height == 0 {
            return Err(format!("empty raster {}x{}", pixel_width, pixel_height));
        }
        let expected = pixel_width as usize * pixel_height as usize * 4;
        let rgba = &bytes[HEADER_LEN..];
        if rgba.len() != expected {
            return Err(format!("expected {} pixel bytes, found {}", expected, rgba.len()));
        }
        Ok(CacheEntry { width, height, pixel_width, pixel_height, rgba: rgba.to_vec() })
    }

    fn into_image(self, name: &str) -> Result<Image, MirrorError> {
        let pixmap = pixmap_from_rgba(self.pixel_width, self.pixel_height, &self.rgba)
            .ok_or_else(|| MirrorError::asset(name, "empty raster"))?;
        Ok(Image { pixmap, width: self.width, height: self.height })
    }
}

/// `{name}-{invert}-{width}-{scale%}` with path separators flattened.
pub fn cache_key(name: &str, invert: bool, width: Option<u32>, scale: f32) -> String {
    let width = width.map_or_else(|| "native".to_string(), |w| w.to_string());
    format!(
        "{}-{}-{}-{}",
        name.replace(['/', '\\'], "_"),
        invert as u8,
        width,
        (scale * 100.0).round() as u32
    )
}

fn pixmap_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
    }
    Some(pixmap)
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 4);
    for p in pixmap.pixels() {
        let c = p.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn render_svg(name: &str, data: &[u8]) -> Result<Pixmap, MirrorError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| MirrorError::asset(name, e))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| MirrorError::asset(name, "svg has no area"))?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

fn decode_file(name: &str, path: &Path) -> Result<Pixmap, MirrorError> {
    let data = fs::read(path).map_err(|e| MirrorError::asset(name, e))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        render_svg(name, &data)
    } else {
        Pixmap::decode_png(&data).map_err(|e| MirrorError::asset(name, e))
    }
}

fn resample(src: &Pixmap, width: u32, height: u32) -> Option<Pixmap> {
    let mut dst = Pixmap::new(width, height)?;
    let sx = width as f32 / src.width() as f32;
    let sy = height as f32 / src.height() as f32;
    let paint = PixmapPaint { quality: FilterQuality::Bicubic, ..PixmapPaint::default() };
    dst.draw_pixmap(0, 0, src.as_ref(), &paint, Transform::from_scale(sx, sy), None);
    Some(dst)
}

/// Invert, then (with a target width) keep the aspect ratio and apply
/// the global scale.
fn prepare(
    name: &str,
    natural: Pixmap,
    width: Option<u32>,
    invert: bool,
    scale: f32,
) -> Result<CacheEntry, MirrorError> {
    let mut rgba = pixmap_to_rgba(&natural);
    if invert {
        for px in rgba.chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
    }
    let (nw, nh) = (natural.width(), natural.height());

    let Some(width) = width else {
        return Ok(CacheEntry { width: nw, height: nh, pixel_width: nw, pixel_height: nh, rgba });
    };

    let ratio = nw as f32 / nh as f32;
    let height = (width as f32 / ratio) as u32;
    let pw = ((width as f32 * scale) as u32).max(1);
    let ph = ((height as f32 * scale) as u32).max(1);
    let source = pixmap_from_rgba(nw, nh, &rgba)
        .ok_or_else(|| MirrorError::asset(name, "empty raster"))?;
    let scaled = resample(&source, pw, ph)
        .ok_or_else(|| MirrorError::asset(name, format!("cannot resample to {}x{}", pw, ph)))?;
    Ok(CacheEntry {
        width,
        height,
        pixel_width: pw,
        pixel_height: ph,
        rgba: pixmap_to_rgba(&scaled),
    })
}

pub struct ImageCache {
    cache_dir: Option<PathBuf>,
    scale: f32,
}

impl ImageCache {
    pub fn new(cache_dir: Option<PathBuf>, scale: f32) -> Self {
        Self { cache_dir, scale }
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Like `try_load` but reports failures to the log and yields `None`.
    pub fn load(&self, name: &str, width: Option<u32>, invert: bool, roots: &[PathBuf]) -> Option<Image> {
        match self.try_load(name, width, invert, roots) {
            Ok(image) => Some(image),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    pub fn try_load(
        &self,
        name: &str,
        width: Option<u32>,
        invert: bool,
        roots: &[PathBuf],
    ) -> Result<Image, MirrorError> {
        let cached = self.entry_path(name, width, invert);
        if let Some(path) = cached.as_deref().filter(|p| p.is_file()) {
            match fs::read(path).map_err(|e| e.to_string()).and_then(|b| CacheEntry::decode(&b)) {
                Ok(entry) => {
                    debug!("Found {} in cache", path.display());
                    return entry.into_image(name);
                }
                Err(e) => warn!("Ignoring cache entry {}: {}", path.display(), e),
            }
        }

        let source = roots
            .iter()
            .map(|root| root.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| MirrorError::asset(name, "not found in search roots"))?;
        info!("Loading image {}", source.display());
        let entry = prepare(name, decode_file(name, &source)?, width, invert, self.scale)?;

        if let Some(path) = &cached {
            match fs::write(path, entry.encode()) {
                Ok(()) => debug!("Cached {} as {}", name, path.display()),
                Err(e) => warn!("Could not write cache entry {}: {}", path.display(), e),
            }
        }
        entry.into_image(name)
    }

    fn entry_path(&self, name: &str, width: Option<u32>, invert: bool) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        if !dir.is_dir() {
            info!("Creating cache dir at {}", dir.display());
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Image cache disabled, cannot create {}: {}", dir.display(), e);
                return None;
            }
        }
        Some(dir.join(cache_key(name, invert, width, self.scale)))
    }
}
