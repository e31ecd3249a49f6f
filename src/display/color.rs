/*
 *  display/color.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Colour helpers shared by the drawing primitives
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

pub const BLACK: Rgb888 = Rgb888::BLACK;
pub const WHITE: Rgb888 = Rgb888::WHITE;
pub const GREEN: Rgb888 = Rgb888::GREEN;
pub const SPLASH_FRAME: Rgb888 = Rgb888::new(155, 155, 155);

/// Parse `RRGGBB` (an optional leading `#` is tolerated).
pub fn parse_hex(s: &str) -> Option<Rgb888> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(Rgb888::new(r, g, b))
}

/// Linear blend of `src` over `dst` by an 8-bit coverage value.
#[inline]
pub fn blend_channel(dst: u8, src: u8, coverage: u8) -> u8 {
    let a = coverage as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("ff8000"), Some(Rgb888::new(255, 128, 0)));
        assert_eq!(parse_hex("#00FF7f"), Some(Rgb888::new(0, 255, 127)));
        assert_eq!(parse_hex("fff"), None);
        assert_eq!(parse_hex("gg0000"), None);
    }

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend_channel(10, 200, 0), 10);
        assert_eq!(blend_channel(10, 200, 255), 200);
        assert_eq!(blend_channel(0, 255, 128), 128);
    }
}
