/*
 *  display/error.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the mirror display engine
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

use thiserror::Error;

use crate::config::ConfigError;

/// Every failure the engine can report.
///
/// Only `Config`, `PluginBinding`, `ModuleInit` and `Present` stop the
/// process. `ModuleDraw` is contained by the module host and `Asset` is
/// logged and swallowed at the cache boundary.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Layout file missing, unparsable or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A declared module has no plugin in any search root
    #[error("module '{module}': no plugin found for source '{source_locator}'")]
    PluginBinding { module: String, source_locator: String },

    /// A plugin's init call failed
    #[error("module '{module}' failed to initialize: {cause:#}")]
    ModuleInit { module: String, cause: anyhow::Error },

    /// A plugin's draw call failed (surfaces only in halt-on-failure mode)
    #[error("module '{module}' crashed while drawing: {description}")]
    ModuleDraw { module: String, description: String },

    /// Image or font asset missing or corrupt
    #[error("asset '{name}': {reason}")]
    Asset { name: String, reason: String },

    /// Window or surface failure
    #[error("presentation failed: {0}")]
    Present(String),
}

impl MirrorError {
    pub fn asset(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MirrorError::Asset {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the failures that must abort before or during the frame loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MirrorError::Asset { .. })
    }
}
