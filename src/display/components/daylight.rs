/*
 *  display/components/daylight.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Daylight module: today's sunrise and sunset for the mirror's location
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

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use serde_json::json;

use crate::config::{Location, ModuleConfig};
use crate::display::components::text_options;
use crate::display::mirror::Mirror;
use crate::display::plugin::{ModuleInstance, ModulePlugin};
use crate::display::text::TextOptions;
use crate::display::transform::CENTER;
use crate::sun::{self, SunTimes};

const NO_TIME: &str = "--:--";

pub struct DaylightPlugin;

pub struct Daylight {
    location: Option<Location>,
    timezone: Option<Tz>,
    format: String,
    opts: TextOptions,
    /// Recomputed when the UTC date rolls over
    computed_for: Option<NaiveDate>,
    line: String,
}

impl ModulePlugin for DaylightPlugin {
    fn init(&self, mirror: &mut Mirror<'_>, config: &ModuleConfig) -> Result<Box<dyn ModuleInstance>> {
        let location = mirror.location();
        if location.is_none() {
            warn!("daylight: no latitude/longitude in the mirror section");
        }
        Ok(Box::new(Daylight {
            location,
            timezone: mirror.timezone(),
            format: config.str("format").unwrap_or("%H:%M").to_string(),
            opts: text_options(config),
            computed_for: None,
            line: NO_TIME.to_string(),
        }))
    }
}

/// Configured zone, else the host's.
fn local_time(t: Option<DateTime<Utc>>, tz: Option<Tz>, format: &str) -> String {
    match (t, tz) {
        (Some(t), Some(tz)) => t.with_timezone(&tz).format(format).to_string(),
        (Some(t), None) => t.with_timezone(&Local).format(format).to_string(),
        (None, _) => NO_TIME.to_string(),
    }
}

impl Daylight {
    fn describe(&self, times: &SunTimes) -> String {
        format!(
            "Sunrise {}  Sunset {}",
            local_time(times.sunrise_utc, self.timezone, &self.format),
            local_time(times.sunset_utc, self.timezone, &self.format)
        )
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        let Some(loc) = self.location else { return };
        let today = now.date_naive();
        if self.computed_for == Some(today) {
            return;
        }
        let times = sun::sun_times_for_date(loc.latitude, loc.longitude, today);
        self.line = self.describe(&times);
        self.computed_for = Some(today);
        debug!("daylight: {}", self.line);
    }
}

impl ModuleInstance for Daylight {
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> Result<()> {
        self.refresh(Utc::now());
        mirror.draw_text(&self.line, CENTER, 0, &self.opts);
        Ok(())
    }

    fn debug_info(&self) -> Option<serde_json::Value> {
        Some(json!({
            "date": self.computed_for.map(|d| d.to_string()),
            "line": self.line,
        }))
    }
}
