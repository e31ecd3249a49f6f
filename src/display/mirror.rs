/*
 *  display/mirror.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render context and the drawing handle passed to modules
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

//! `RenderContext` owns the frame and both caches for the life of the
//! process. A [`Mirror`] borrows it for one draw: with a [`ModuleFrame`]
//! every coordinate is relative to that module's bounds and assets resolve
//! through its search roots; without one, coordinates are global.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use chrono_tz::Tz;
use embedded_graphics::pixelcolor::Rgb888;
use log::warn;

use crate::config::{ConfigValue, Location, MirrorConfig};
use crate::display::canvas::Canvas;
use crate::display::color::{self, BLACK, WHITE};
use crate::display::error::MirrorError;
use crate::display::fonts::{FontCache, FontId};
use crate::display::images::{Image, ImageCache};
use crate::display::layout::Bounds;
use crate::display::text::{self, TextOptions, TextRun, LINE_SPACING};
use crate::display::transform::CoordinateTransform;
use crate::sun;

/// Global render settings, resolved once from the configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub scale: f32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub font_name: Option<String>,
    pub font_size: u32,
    pub font_color: Rgb888,
    pub location: Option<Location>,
    /// Zone for displayed times; `None` is the host's local zone
    pub timezone: Option<Tz>,
    pub search_roots: Vec<PathBuf>,
    pub values: BTreeMap<String, ConfigValue>,
}

impl Settings {
    pub fn from_config(cfg: &MirrorConfig) -> Self {
        let font_color = match cfg.font_color.as_deref() {
            Some(hex) => color::parse_hex(hex).unwrap_or_else(|| {
                warn!("font_color '{}' is not RRGGBB, using white", hex);
                WHITE
            }),
            None => WHITE,
        };
        let timezone = cfg.timezone.as_deref().and_then(|name| match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                warn!("Unknown timezone '{}', using the local zone", name);
                None
            }
        });
        Self {
            scale: cfg.scale,
            screen_width: cfg.screen_width as i32,
            screen_height: cfg.screen_height as i32,
            font_name: cfg.font_name.clone(),
            font_size: cfg.font_size,
            font_color,
            location: cfg.location,
            timezone,
            search_roots: cfg.search_roots(),
            values: cfg.settings.clone(),
        }
    }

    /// Frame size in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        (
            (self.scale * self.screen_width as f32) as u32,
            (self.scale * self.screen_height as f32) as u32,
        )
    }

    fn default_font(&self) -> FontId {
        match &self.font_name {
            Some(name) => FontId::File(name.clone()),
            None => FontId::Bundled,
        }
    }
}

/// What the host knows about the module being drawn.
#[derive(Debug, Clone)]
pub struct ModuleFrame {
    pub name: String,
    pub bounds: Bounds,
    pub search_roots: Vec<PathBuf>,
}

/// Told the asset name before each image load while modules start up.
pub type LoadProgress<'a> = dyn FnMut(&mut RenderContext, &str) + 'a;

pub struct RenderContext {
    pub canvas: Canvas,
    pub fonts: FontCache,
    pub images: ImageCache,
    pub settings: Settings,
}

impl RenderContext {
    pub fn new(settings: Settings, cache_dir: Option<PathBuf>) -> Result<Self, MirrorError> {
        let (w, h) = settings.device_size();
        Ok(Self {
            canvas: Canvas::new(w, h)?,
            fonts: FontCache::new(),
            images: ImageCache::new(cache_dir, settings.scale),
            settings,
        })
    }

    pub fn from_config(cfg: &MirrorConfig) -> Result<Self, MirrorError> {
        Self::new(Settings::from_config(cfg), cfg.cache_dir.clone())
    }

    /// Drawing handle; `frame` is the current module, if any.
    pub fn mirror<'a>(&'a mut self, frame: Option<&'a ModuleFrame>) -> Mirror<'a> {
        Mirror { ctx: self, frame, progress: None }
    }

    /// As `mirror`, reporting image loads to `progress`.
    pub fn mirror_with_progress<'a>(
        &'a mut self,
        frame: Option<&'a ModuleFrame>,
        progress: &'a mut LoadProgress<'a>,
    ) -> Mirror<'a> {
        Mirror { ctx: self, frame, progress: Some(progress) }
    }
}

/// Drawing surface handed to modules.
pub struct Mirror<'a> {
    ctx: &'a mut RenderContext,
    frame: Option<&'a ModuleFrame>,
    progress: Option<&'a mut LoadProgress<'a>>,
}

impl<'a> Mirror<'a> {
    /// Screen width in logical pixels.
    pub fn width(&self) -> i32 {
        self.ctx.settings.screen_width
    }

    pub fn height(&self) -> i32 {
        self.ctx.settings.screen_height
    }

    pub fn scale(&self) -> f32 {
        self.ctx.settings.scale
    }

    pub fn module_name(&self) -> Option<&str> {
        self.frame.map(|f| f.name.as_str())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.frame.map(|f| f.bounds)
    }

    /// Width used for centring and wrapping: the module's, else the screen's.
    pub fn view_width(&self) -> i32 {
        self.frame.map_or(self.width(), |f| f.bounds.width)
    }

    pub fn view_height(&self) -> i32 {
        self.frame.map_or(self.height(), |f| f.bounds.height)
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        match self.frame {
            Some(f) => &f.search_roots,
            None => &self.ctx.settings.search_roots,
        }
    }

    /// A key from the `mirror:` section that the engine itself does not use.
    pub fn setting(&self, key: &str) -> Option<&ConfigValue> {
        self.ctx.settings.values.get(key)
    }

    pub fn location(&self) -> Option<Location> {
        self.ctx.settings.location
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.ctx.settings.timezone
    }

    fn daylight(&self) -> Option<bool> {
        let loc = self.location()?;
        sun::is_day_at(loc.latitude, loc.longitude, Utc::now())
    }

    /// False when no location is configured or the sun never rises/sets.
    pub fn is_day(&self) -> bool {
        self.daylight() == Some(true)
    }

    /// Also false when unknown, so not simply `!is_day()`.
    pub fn is_night(&self) -> bool {
        self.daylight() == Some(false)
    }

    pub fn transform(&self) -> CoordinateTransform {
        let scale = self.ctx.settings.scale;
        match self.frame {
            Some(f) => CoordinateTransform::new(f.bounds.left, f.bounds.top, scale),
            None => CoordinateTransform::global(scale),
        }
    }

    /// Draw text, wrapping on words when it is wider than the view (or
    /// `opts.width`). Returns the widest line in logical pixels.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, opts: &TextOptions) -> i32 {
        let view_width = opts.width.unwrap_or_else(|| self.view_width());
        let t = self.transform();
        let (x, y) = t.point(x, y, view_width);
        let size = t
            .length(opts.size.unwrap_or(self.ctx.settings.font_size) as i32)
            .max(1) as u32;
        let font_id = match &opts.font {
            Some(name) => FontId::File(name.clone()),
            None => self.ctx.settings.default_font(),
        };

        let run = TextRun {
            text,
            x,
            y,
            color: opts.color.unwrap_or(self.ctx.settings.font_color),
            align: opts.align,
            shadow: opts.shadow,
            viewport: t.length(view_width).max(0) as u32,
            line_advance: size as i32 + t.length(LINE_SPACING),
        };

        let ctx = &mut *self.ctx;
        let roots = match self.frame {
            Some(f) => &f.search_roots[..],
            None => &ctx.settings.search_roots[..],
        };
        let font = ctx.fonts.resolve(&font_id, size, roots);
        let consumed = text::draw_text(&mut ctx.canvas, font, &run);
        t.unscale(consumed as i32)
    }

    /// Filled rectangle; colours default to black here and in `draw_rect`.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Option<Rgb888>) {
        let t = self.transform();
        let (x, y) = t.point(x, y, self.view_width());
        self.ctx
            .canvas
            .fill_rect(x, y, t.length(w), t.length(h), color.unwrap_or(BLACK));
    }

    /// One pixel outline of (x, y)-(x+w, y+h) inclusive.
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Option<Rgb888>) {
        let t = self.transform();
        let (x, y) = t.point(x, y, self.view_width());
        self.ctx
            .canvas
            .outline_rect(x, y, t.length(w), t.length(h), color.unwrap_or(BLACK));
    }

    pub fn blit_image(&mut self, image: &Image, x: i32, y: i32) {
        let t = self.transform();
        let (x, y) = t.point(x, y, self.view_width());
        self.ctx.canvas.draw_pixmap(x, y, image.pixmap());
    }

    /// Load through the image cache. `width` is logical; the aspect ratio
    /// is kept. Failures are logged and give `None`.
    pub fn load_image(&mut self, name: &str, width: Option<u32>, invert: bool) -> Option<Image> {
        if let Some(progress) = self.progress.as_deref_mut() {
            progress(self.ctx, name);
        }
        let roots = match self.frame {
            Some(f) => &f.search_roots[..],
            None => &self.ctx.settings.search_roots[..],
        };
        self.ctx.images.load(name, width, invert, roots)
    }
}
