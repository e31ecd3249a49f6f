/*
 *  display/components/clock.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock module: formatted local time, optional date line
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

use anyhow::{bail, Result};
use chrono::{DateTime, Local, Timelike};
use serde_json::json;

use crate::config::ModuleConfig;
use crate::display::components::text_options;
use crate::display::mirror::Mirror;
use crate::display::plugin::{ModuleInstance, ModulePlugin};
use crate::display::text::TextOptions;
use crate::display::transform::CENTER;

const DEFAULT_FORMAT: &str = "%H:%M";

pub struct ClockPlugin;

/// Clock display state
pub struct ClockDisplay {
    format: String,
    date_format: Option<String>,
    /// Blank the colons on odd seconds
    blink: bool,
    time_opts: TextOptions,
    date_opts: TextOptions,
    date_gap: i32,
    last_drawn: String,
}

impl ModulePlugin for ClockPlugin {
    fn init(&self, _mirror: &mut Mirror<'_>, config: &ModuleConfig) -> Result<Box<dyn ModuleInstance>> {
        let format = config.str("format").unwrap_or(DEFAULT_FORMAT).to_string();
        // chrono only reports a bad specifier when the string is rendered
        if chrono::format::StrftimeItems::new(&format).any(|i| matches!(i, chrono::format::Item::Error)) {
            bail!("invalid time format '{}'", format);
        }
        let time_opts = text_options(config);
        let size = time_opts.size.unwrap_or(crate::config::DEFAULT_FONT_SIZE);
        let date_size = config.int("date_size").map_or(size / 2, |s| s.max(1) as u32);
        Ok(Box::new(ClockDisplay {
            format,
            date_format: config.str("date_format").map(str::to_string),
            blink: config.bool("blink").unwrap_or(false),
            date_opts: time_opts.clone().size(date_size),
            time_opts,
            date_gap: size as i32 + 10,
            last_drawn: String::new(),
        }))
    }
}

impl ClockDisplay {
    fn render_time(&self, now: &DateTime<Local>) -> String {
        let text = now.format(&self.format).to_string();
        if self.blink && now.second() % 2 == 1 {
            text.replace(':', " ")
        } else {
            text
        }
    }
}

impl ModuleInstance for ClockDisplay {
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> Result<()> {
        let now = Local::now();
        let text = self.render_time(&now);
        mirror.draw_text(&text, CENTER, 0, &self.time_opts);
        if let Some(fmt) = &self.date_format {
            let date = now.format(fmt).to_string();
            mirror.draw_text(&date, CENTER, self.date_gap, &self.date_opts);
        }
        self.last_drawn = text;
        Ok(())
    }

    fn debug_info(&self) -> Option<serde_json::Value> {
        Some(json!({ "format": self.format, "last": self.last_drawn }))
    }
}
