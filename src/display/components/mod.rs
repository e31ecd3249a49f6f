/*
 *  display/components/mod.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Modules compiled into the binary
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

pub mod clock;
pub mod daylight;
pub mod demo;
pub mod picture;

// Re-exports
pub use clock::{ClockDisplay, ClockPlugin};
pub use daylight::{Daylight, DaylightPlugin};
pub use demo::{Demo, DemoPlugin};
pub use picture::{Picture, PicturePlugin};

use log::warn;

use crate::config::ModuleConfig;
use crate::display::color::parse_hex;
use crate::display::plugin::PluginRegistry;
use crate::display::text::{Align, TextOptions};

pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register("clock", ClockPlugin);
    registry.register("daylight", DaylightPlugin);
    registry.register("demo", DemoPlugin);
    registry.register("picture", PicturePlugin);
}

/// Text styling keys shared by the built-in modules: `font_name`,
/// `font_size`, `font_color`, `align`, `shadow`.
pub fn text_options(config: &ModuleConfig) -> TextOptions {
    let mut opts = TextOptions::new();
    if let Some(name) = config.str("font_name") {
        opts = opts.font(name);
    }
    if let Some(size) = config.int("font_size").filter(|s| *s > 0) {
        opts = opts.size(size as u32);
    }
    if let Some(hex) = config.str("font_color") {
        match parse_hex(hex) {
            Some(c) => opts = opts.color(c),
            None => warn!("ignoring font_color '{}'", hex),
        }
    }
    if let Some(align) = config.str("align") {
        opts = opts.align(Align::parse(align).unwrap_or_else(|| {
            warn!("unknown align '{}', using center", align);
            Align::Center
        }));
    } else {
        opts = opts.align(Align::Center);
    }
    opts.shadow(config.bool("shadow").unwrap_or(false))
}
