/*
 *  display/plugin/mod.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Module plugin contract
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

//! Module plugins for LyMirror
//!
//! A layout file names each module's `source`, e.g. `modules/clock`. The
//! last path component (without extension) selects a plugin from the
//! [`PluginRegistry`]; the path itself still matters because the module's
//! directory is added to its asset search roots.
//!
//! ## Lifecycle
//!
//! 1. **Bind** - source resolved to a plugin, once, at startup
//! 2. **Init** - [`ModulePlugin::init`] builds the module's state from its
//!    config section; failure is fatal
//! 3. **Draw** - [`ModuleInstance::draw`] once per frame; an error or panic
//!    deactivates that module only

pub mod registry;

pub use registry::{Binding, PluginRegistry};

use crate::config::ModuleConfig;
use crate::display::mirror::Mirror;

/// A module type. Registered once, instantiated per layout section.
pub trait ModulePlugin {
    /// Build the per-module state. The drawing handle is already bound to
    /// the module, so images and fonts can be preloaded here.
    fn init(
        &self,
        mirror: &mut Mirror<'_>,
        config: &ModuleConfig,
    ) -> anyhow::Result<Box<dyn ModuleInstance>>;
}

/// A live module.
pub trait ModuleInstance {
    /// Draw one frame in module-relative coordinates.
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> anyhow::Result<()>;

    /// Extra state for the debug snapshot.
    fn debug_info(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Plugins written as a plain function returning the instance.
impl<F> ModulePlugin for F
where
    F: Fn(&mut Mirror<'_>, &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>>,
{
    fn init(
        &self,
        mirror: &mut Mirror<'_>,
        config: &ModuleConfig,
    ) -> anyhow::Result<Box<dyn ModuleInstance>> {
        self(mirror, config)
    }
}
