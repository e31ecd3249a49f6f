/*
 *  display/transform.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Module-relative logical coordinates to device pixels
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

/// Passing this as x (or y) centres within the view width.
pub const CENTER: i32 = -1;

/// Offset of the current module plus the global scale factor.
///
/// All primitives go through the same three steps: resolve the centring
/// sentinel, add the module offset, then scale and truncate toward zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale: f32,
}

impl CoordinateTransform {
    pub fn new(offset_x: i32, offset_y: i32, scale: f32) -> Self {
        Self { offset_x, offset_y, scale }
    }

    /// No current module: global coordinates.
    pub fn global(scale: f32) -> Self {
        Self::new(0, 0, scale)
    }

    /// Logical point to device point.
    ///
    /// Vertical centring uses half the view *width*, not the height.
    /// Existing module layouts are positioned against that.
    pub fn point(&self, x: i32, y: i32, view_width: i32) -> (i32, i32) {
        let half = view_width / 2;
        let x = if x == CENTER { half } else { x };
        let y = if y == CENTER { half } else { y };
        (
            self.length(x + self.offset_x),
            self.length(y + self.offset_y),
        )
    }

    /// Logical length (size, width, height) to device pixels.
    #[inline]
    pub fn length(&self, v: i32) -> i32 {
        (self.scale * v as f32) as i32
    }

    /// Device pixels back to logical units.
    #[inline]
    pub fn unscale(&self, v: i32) -> i32 {
        (v as f32 / self.scale) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_identity() {
        let t = CoordinateTransform::global(1.0);
        assert_eq!(t.point(10, 20, 1000), (10, 20));
    }

    #[test]
    fn test_offset_then_scale() {
        let t = CoordinateTransform::new(100, 750, 0.5);
        assert_eq!(t.point(10, 20, 999), (55, 385));
    }

    #[test]
    fn test_truncates_toward_zero() {
        let t = CoordinateTransform::global(0.3);
        assert_eq!(t.length(10), 3);
        assert_eq!(t.length(-10), -3);
    }

    #[test]
    fn test_center_sentinel_uses_width_for_both_axes() {
        let t = CoordinateTransform::new(0, 100, 1.0);
        assert_eq!(t.point(CENTER, CENTER, 400), (200, 300));
    }

    #[test]
    fn test_offset_and_scale_property() {
        for &(x, y, l, top, s) in &[(0, 0, 0, 0, 1.0f32), (5, 7, 10, 20, 2.0), (33, 1, 100, 750, 0.5), (12, 8, 4, 4, 0.25)] {
            let t = CoordinateTransform::new(l, top, s);
            let expected = ((s * (x + l) as f32) as i32, (s * (y + top) as f32) as i32);
            assert_eq!(t.point(x, y, 100), expected);
        }
    }
}
