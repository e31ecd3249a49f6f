/*
 *  display/components/picture.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Picture module: one cached image with an optional caption
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

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::ModuleConfig;
use crate::display::components::text_options;
use crate::display::images::Image;
use crate::display::mirror::Mirror;
use crate::display::plugin::{ModuleInstance, ModulePlugin};
use crate::display::text::{Align, TextOptions};
use crate::display::transform::CENTER;

pub struct PicturePlugin;

pub struct Picture {
    name: String,
    image: Option<Image>,
    caption: Option<String>,
    caption_opts: TextOptions,
}

impl ModulePlugin for PicturePlugin {
    fn init(&self, mirror: &mut Mirror<'_>, config: &ModuleConfig) -> Result<Box<dyn ModuleInstance>> {
        let name = config.str("image").context("picture module needs an 'image' key")?.to_string();
        let width = match config.int("image_width") {
            Some(w) if w > 0 => Some(w as u32),
            Some(_) => None,
            None => mirror.bounds().map(|b| b.width.max(1) as u32),
        };
        let invert = config.bool("invert").unwrap_or(false);
        // a missing asset leaves the module blank rather than failing init
        let image = mirror.load_image(&name, width, invert);
        Ok(Box::new(Picture {
            name,
            image,
            caption: config.str("caption").map(str::to_string),
            caption_opts: text_options(config).align(Align::Center),
        }))
    }
}

impl ModuleInstance for Picture {
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> Result<()> {
        let mut y = 0;
        if let Some(image) = &self.image {
            let x = (mirror.view_width() - image.width() as i32) / 2;
            mirror.blit_image(image, x, 0);
            y = image.height() as i32 + 10;
        }
        if let Some(caption) = &self.caption {
            mirror.draw_text(caption, CENTER, y, &self.caption_opts);
        }
        Ok(())
    }

    fn debug_info(&self) -> Option<serde_json::Value> {
        Some(json!({
            "image": self.name,
            "loaded": self.image.is_some(),
            "size": self.image.as_ref().map(|i| [i.width(), i.height()]),
        }))
    }
}
