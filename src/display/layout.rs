/*
 *  display/layout.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Module bounds: negative values count back from the bottom/right edge
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

use serde::Serialize;

use crate::config::ModuleSection;

/// Absolute module rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Bounds {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

#[inline]
fn from_edge(v: i32, extent: i32) -> i32 {
    if v < 0 { extent + v } else { v }
}

impl Bounds {
    pub fn new(top: i32, left: i32, width: i32, height: i32) -> Self {
        Self { top, left, width, height }
    }

    /// Resolve negative values against the screen. Vertical values use the
    /// height, horizontal values the width.
    pub fn resolve(raw: Bounds, screen_width: i32, screen_height: i32) -> Bounds {
        Bounds {
            top: from_edge(raw.top, screen_height),
            left: from_edge(raw.left, screen_width),
            width: from_edge(raw.width, screen_width),
            height: from_edge(raw.height, screen_height),
        }
    }

    /// Resolve a module section. Modules may sit partly or wholly off
    /// screen; nothing is clamped.
    pub fn from_section(section: &ModuleSection, screen_width: i32, screen_height: i32) -> Bounds {
        let raw = Bounds::new(section.top, section.left, section.width, section.height);
        Bounds::resolve(raw, screen_width, screen_height)
    }

    /// Near enough full screen that a debug outline would sit on the edge.
    pub fn covers_screen(&self, screen_width: i32, screen_height: i32) -> bool {
        self.width + 1 >= screen_width && self.height + 1 >= screen_height
    }
}
