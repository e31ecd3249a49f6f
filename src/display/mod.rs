/*
 *  display/mod.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - tiled modules over a single frame
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

// Frame and drawing primitives
pub mod canvas;
pub mod color;
pub mod error;
pub mod transform;
pub mod text;
pub mod fonts;
pub mod images;
pub mod mirror;

// Layout and module lifecycle
pub mod layout;
pub mod plugin;
pub mod host;

// Built-in modules
pub mod components;

// Frame loop
pub mod splash;
pub mod presenter;
pub mod scheduler;

// Desktop window (only with window feature)
#[cfg(feature = "window")]
pub mod window;

// Re-exports for convenience
pub use canvas::Canvas;
pub use error::MirrorError;
pub use fonts::{FontCache, FontId};
pub use host::{DebugInfo, Module, ModuleDebugInfo, ModuleHost};
pub use images::{Image, ImageCache};
pub use layout::Bounds;
pub use mirror::{Mirror, ModuleFrame, RenderContext, Settings};
pub use plugin::{ModuleInstance, ModulePlugin, PluginRegistry};
pub use presenter::{HeadlessPresenter, Presenter};
pub use scheduler::FrameScheduler;
pub use splash::{SplashOverlay, SplashState};
pub use text::{Align, TextOptions};
pub use transform::{CoordinateTransform, CENTER};

#[cfg(feature = "window")]
pub use window::WindowPresenter;
