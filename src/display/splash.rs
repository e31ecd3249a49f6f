/*
 *  display/splash.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup splash, drawn over the modules until it times out
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

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::display::color::{BLACK, SPLASH_FRAME};
use crate::display::images::Image;
use crate::display::mirror::RenderContext;
use crate::display::text::{Align, TextOptions};

pub const SPLASH_DURATION: Duration = Duration::from_secs(4);
pub const SPLASH_TITLE: &str = "LyMirror";
pub const LOADING_MESSAGE: &str = "Loading Modules";
const LOGO_WIDTH: u32 = 256;

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128">
  <ellipse cx="64" cy="54" rx="40" ry="48" fill="none" stroke="#ffffff" stroke-width="6"/>
  <path d="M44 30 Q54 20 68 22" fill="none" stroke="#9fd3ff" stroke-width="5" stroke-linecap="round"/>
  <rect x="56" y="102" width="16" height="12" fill="#ffffff"/>
  <rect x="34" y="114" width="60" height="8" rx="4" fill="#ffffff"/>
</svg>"##;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashState {
    /// Modules are still being bound and initialized
    PreInit,
    /// Modules are drawing underneath, countdown running
    PostInit,
    Done,
}

pub struct SplashOverlay {
    state: SplashState,
    deadline: Option<Instant>,
    logo: Option<Image>,
}

impl Default for SplashOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl SplashOverlay {
    pub fn new() -> Self {
        Self { state: SplashState::PreInit, deadline: None, logo: None }
    }

    pub fn state(&self) -> SplashState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Rasterize the bundled logo at the current scale.
    pub fn load_logo(&mut self, ctx: &RenderContext) {
        match Image::from_svg_str("splash-logo", LOGO_SVG, Some(LOGO_WIDTH), false, ctx.settings.scale) {
            Ok(logo) => self.logo = Some(logo),
            Err(e) => warn!("Splash logo unavailable: {}", e),
        }
    }

    /// Modules are ready; the countdown runs from `now`.
    pub fn finish_init(&mut self, now: Instant) {
        if self.state == SplashState::PreInit {
            self.state = SplashState::PostInit;
            self.deadline = Some(now + SPLASH_DURATION);
            debug!("Splash countdown started");
        }
    }

    pub fn update(&mut self, now: Instant) {
        if self.state == SplashState::PostInit && self.deadline.is_some_and(|d| now >= d) {
            self.state = SplashState::Done;
            debug!("Splash done");
        }
    }

    /// Draw in global coordinates. Before init the whole screen is
    /// blanked and `message` is shown under the logo.
    pub fn draw(&self, ctx: &mut RenderContext, message: Option<&str>) {
        if self.state == SplashState::Done {
            return;
        }
        let mut m = ctx.mirror(None);
        let (w, h) = (m.width(), m.height());
        if self.state == SplashState::PreInit {
            m.fill_rect(0, 0, w, h, Some(BLACK));
        }
        m.fill_rect(w / 2 - 202, h / 3 - 2, 406, 404, Some(SPLASH_FRAME));
        m.fill_rect(w / 2 - 200, h / 3, 400, 400, Some(BLACK));
        m.draw_text(SPLASH_TITLE, w / 2, h / 3, &TextOptions::new().size(100).align(Align::Center));
        if let Some(logo) = &self.logo {
            m.blit_image(logo, w / 2 - logo.width() as i32 / 2, h / 3 + 120);
        }
        if self.state == SplashState::PreInit {
            if let Some(message) = message {
                m.draw_text(message, w / 2, h / 3 + 410, &TextOptions::new().size(50).align(Align::Center));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let mut splash = SplashOverlay::new();
        let t0 = Instant::now();
        splash.update(t0 + Duration::from_secs(60));
        assert_eq!(splash.state(), SplashState::PreInit);

        splash.finish_init(t0);
        assert_eq!(splash.state(), SplashState::PostInit);
        splash.update(t0 + Duration::from_millis(3999));
        assert_eq!(splash.state(), SplashState::PostInit);
        splash.update(t0 + SPLASH_DURATION);
        assert_eq!(splash.state(), SplashState::Done);

        splash.finish_init(t0 + Duration::from_secs(10));
        assert_eq!(splash.state(), SplashState::Done);
    }

    #[test]
    fn test_logo_renders() {
        let logo = Image::from_svg_str("splash-logo", LOGO_SVG, Some(LOGO_WIDTH), false, 1.0).unwrap();
        assert_eq!((logo.width(), logo.height()), (256, 256));
    }
}
