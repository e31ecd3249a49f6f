/*
 *  display/components/demo.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Demo module exercising every drawing primitive
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
use embedded_graphics::pixelcolor::Rgb888;
use log::info;

use crate::config::ModuleConfig;
use crate::display::color::GREEN;
use crate::display::mirror::Mirror;
use crate::display::plugin::{ModuleInstance, ModulePlugin};
use crate::display::text::{Align, TextOptions};

const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
const PURPLE: Rgb888 = Rgb888::new(255, 0, 255);

pub struct DemoPlugin;

/// Stateless; any number of instances can share a layout.
pub struct Demo;

impl ModulePlugin for DemoPlugin {
    fn init(&self, mirror: &mut Mirror<'_>, config: &ModuleConfig) -> Result<Box<dyn ModuleInstance>> {
        info!(
            "Hello world from the demo module '{}' with config {:?}",
            mirror.module_name().unwrap_or("?"),
            config
        );
        Ok(Box::new(Demo))
    }
}

impl ModuleInstance for Demo {
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> Result<()> {
        let w = mirror.width();
        let green = TextOptions::new().color(GREEN);
        mirror.draw_text("Left adjusted", 10, 30, &green);
        mirror.draw_text("Center adjusted", w / 2, 100, &green.clone().align(Align::Center));
        mirror.draw_text("Right adjusted", w, 200, &green.clone().align(Align::Right));

        mirror.draw_rect(100, 1000, 400, 400, Some(YELLOW));
        mirror.draw_text(
            "This text flows inside the bounding box",
            100,
            1000,
            &green.clone().width(400),
        );

        mirror.draw_rect(0, 900, w - 1, 20, Some(YELLOW));
        mirror.fill_rect(0, 930, w - 1, 20, Some(PURPLE));
        Ok(())
    }
}
