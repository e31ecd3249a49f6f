/*
 *  display/plugin/registry.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Compiled-in plugin table and source binding
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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};

use super::ModulePlugin;
use crate::display::components;

/// A source locator bound to its plugin.
#[derive(Clone)]
pub struct Binding {
    pub plugin: Rc<dyn ModulePlugin>,
    pub key: String,
    /// Search root the source was found under (or the first root)
    pub root: PathBuf,
    /// Directory holding the module's own assets
    pub plugin_dir: PathBuf,
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Rc<dyn ModulePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every module shipped in the binary.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        components::register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, plugin: impl ModulePlugin + 'static) {
        let key = key.into();
        debug!("Registered module plugin '{}'", key);
        self.plugins.insert(key, Rc::new(plugin));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// `modules/clock` and `modules/clock.py` both select `clock`.
    pub fn plugin_key(source: &str) -> Option<String> {
        Path::new(source.trim_end_matches(['/', '\\']))
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Resolve `source` against `roots`. The first root that actually holds
    /// the source wins; otherwise the first root is assumed.
    pub fn bind(&self, source: &str, roots: &[PathBuf]) -> Option<Binding> {
        let Some(key) = Self::plugin_key(source) else {
            debug!("No plugin key in source '{}'", source);
            return None;
        };
        let Some(plugin) = self.plugins.get(&key) else {
            debug!("Plugin not found for source: {}", source);
            return None;
        };

        let root = roots
            .iter()
            .find(|r| r.join(source).exists())
            .or_else(|| roots.first())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        let located = root.join(source);
        let plugin_dir = if located.is_dir() {
            located
        } else {
            located.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
        };
        info!("Bound {} to plugin '{}' ({})", source, key, plugin_dir.display());

        Some(Binding { plugin: Rc::clone(plugin), key, root, plugin_dir })
    }
}
