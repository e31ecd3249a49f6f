/*
 *  display/text.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Text layout: alignment, shadow and greedy word wrap
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

use embedded_graphics::pixelcolor::Rgb888;
use serde::Deserialize;

use crate::display::canvas::Canvas;
use crate::display::color::BLACK;
use crate::display::fonts::FontHandle;

/// Extra logical pixels between wrapped lines.
pub const LINE_SPACING: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Left edge of a line `w` pixels wide anchored at `x`.
    pub fn left_edge(self, x: i32, w: i32) -> i32 {
        match self {
            Align::Left => x,
            Align::Center => x - w / 2,
            Align::Right => x - w,
        }
    }

    pub fn parse(s: &str) -> Option<Align> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Align::Left),
            "center" | "centre" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// Optional arguments for `Mirror::draw_text`; unset fields take the
/// global font settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOptions {
    pub color: Option<Rgb888>,
    pub font: Option<String>,
    pub size: Option<u32>,
    pub align: Align,
    pub shadow: bool,
    pub width: Option<i32>,
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: Rgb888) -> Self {
        self.color = Some(color);
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    /// Wrap width, overriding the current view width.
    pub fn width(mut self, width: i32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Greedy wrap on whitespace. A word that does not fit on an empty line
/// gets a line of its own.
pub fn wrap_lines<F>(text: &str, max_width: u32, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// A block of text already mapped to device pixels.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: i32,
    pub y: i32,
    pub color: Rgb888,
    pub align: Align,
    pub shadow: bool,
    /// wrap threshold
    pub viewport: u32,
    /// baseline-to-baseline distance for wrapped lines
    pub line_advance: i32,
}

fn draw_line(canvas: &mut Canvas, font: &mut FontHandle, run: &TextRun, y: i32, line: &str, w: u32) {
    let x = run.align.left_edge(run.x, w as i32);
    if run.shadow {
        font.render(canvas, x + 1, y + 1, line, BLACK);
    }
    font.render(canvas, x, y, line, run.color);
}

/// Lay out and draw `run`; returns the widest line in device pixels.
pub fn draw_text(canvas: &mut Canvas, font: &mut FontHandle, run: &TextRun) -> u32 {
    if run.text.is_empty() {
        return 0;
    }
    let full = font.measure(run.text);
    if full <= run.viewport {
        draw_line(canvas, font, run, run.y, run.text, full);
        return full;
    }

    let lines = wrap_lines(run.text, run.viewport, |s| font.measure(s));
    let mut widest = 0;
    let mut y = run.y;
    for line in &lines {
        let w = font.measure(line);
        draw_line(canvas, font, run, y, line, w);
        widest = widest.max(w);
        y += run.line_advance;
    }
    widest
}
