/*
 *  display/host.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Module host: bind, initialize and draw modules in layout order
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

//! Binding and init failures are fatal. A failure while drawing (an `Err`
//! or a panic) marks that module inactive with the time and a description,
//! and the frame carries on with the next module.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, Local};
use log::{debug, error, info};
use serde::Serialize;

use crate::config::{MirrorConfig, ModuleConfig, ModuleDecl};
use crate::display::color::GREEN;
use crate::display::error::MirrorError;
use crate::display::layout::Bounds;
use crate::display::mirror::{LoadProgress, ModuleFrame, RenderContext};
use crate::display::plugin::{ModuleInstance, ModulePlugin, PluginRegistry};

pub struct Module {
    pub name: String,
    pub source: String,
    pub config: ModuleConfig,
    pub frame: ModuleFrame,
    pub active: bool,
    pub crashed_at: Option<DateTime<Local>>,
    pub failure: Option<String>,
    plugin: Option<Rc<dyn ModulePlugin>>,
    instance: Option<Box<dyn ModuleInstance>>,
}

impl Module {
    /// Resolve bounds and build the config the plugin will see: the
    /// section's own keys, the resolved bounds, and the global font
    /// settings where the section does not override them.
    pub fn from_decl(decl: &ModuleDecl, cfg: &MirrorConfig, roots: Vec<PathBuf>) -> Module {
        let section = &decl.section;
        let bounds = Bounds::from_section(section, cfg.screen_width as i32, cfg.screen_height as i32);

        let mut config: ModuleConfig = section
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        config.insert("source", section.source.as_str());
        config.insert("top", i64::from(bounds.top));
        config.insert("left", i64::from(bounds.left));
        config.insert("width", i64::from(bounds.width));
        config.insert("height", i64::from(bounds.height));
        if let Some(font) = &cfg.font_name {
            config.insert_default("font_name", font.as_str());
        }
        config.insert_default("font_size", i64::from(cfg.font_size));
        if let Some(color) = &cfg.font_color {
            config.insert_default("font_color", color.as_str());
        }

        Module {
            name: decl.name.clone(),
            source: section.source.clone(),
            config,
            frame: ModuleFrame { name: decl.name.clone(), bounds, search_roots: roots },
            active: true,
            crashed_at: None,
            failure: None,
            plugin: None,
            instance: None,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.frame.bounds
    }

    pub fn is_bound(&self) -> bool {
        self.plugin.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.is_some()
    }

    fn record_failure(&mut self, description: String) {
        error!("Caught failure when drawing {} ({}), disabling module", self.name, self.source);
        error!("{}", description);
        self.active = false;
        self.crashed_at = Some(Local::now());
        self.failure = Some(description);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugInfo {
    pub modules: BTreeMap<String, ModuleDebugInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDebugInfo {
    pub active: bool,
    pub crashed_at: Option<DateTime<Local>>,
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
}

impl DebugInfo {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked with a non-string payload".to_string()
    }
}

fn error_description(err: &anyhow::Error) -> String {
    let text = format!("{:?}", err);
    if text.trim().is_empty() {
        "draw failed without a message".to_string()
    } else {
        text
    }
}

#[derive(Default)]
pub struct ModuleHost {
    modules: Vec<Module>,
}

impl ModuleHost {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// One module per layout section, in declaration order.
    pub fn from_config(cfg: &MirrorConfig) -> Self {
        let roots = cfg.search_roots();
        let modules = cfg
            .modules
            .iter()
            .map(|decl| Module::from_decl(decl, cfg, roots.clone()))
            .collect();
        Self::new(modules)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn active_count(&self) -> usize {
        self.modules.iter().filter(|m| m.active).count()
    }

    /// Bind every module's source to a plugin. The plugin's directory is
    /// appended to that module's search roots.
    pub fn load_all(&mut self, registry: &PluginRegistry) -> Result<(), MirrorError> {
        for m in &mut self.modules {
            info!("Loading module {} from {}", m.name, m.source);
            let binding = registry.bind(&m.source, &m.frame.search_roots).ok_or_else(|| {
                MirrorError::PluginBinding { module: m.name.clone(), source_locator: m.source.clone() }
            })?;
            if !m.frame.search_roots.contains(&binding.plugin_dir) {
                m.frame.search_roots.push(binding.plugin_dir);
            }
            m.plugin = Some(binding.plugin);
        }
        Ok(())
    }

    /// Run each plugin's init with the drawing handle bound to its module.
    /// Image loads made by init are reported to `progress`.
    pub fn init_all(&mut self, ctx: &mut RenderContext, progress: &mut LoadProgress<'_>) -> Result<(), MirrorError> {
        for m in &mut self.modules {
            let plugin = m.plugin.clone().ok_or_else(|| MirrorError::PluginBinding {
                module: m.name.clone(),
                source_locator: m.source.clone(),
            })?;
            debug!("Initializing module {}", m.name);
            let instance = {
                let mut mirror = ctx.mirror_with_progress(Some(&m.frame), &mut *progress);
                plugin
                    .init(&mut mirror, &m.config)
                    .map_err(|cause| MirrorError::ModuleInit { module: m.name.clone(), cause })?
            };
            m.instance = Some(instance);
        }
        Ok(())
    }

    /// Draw every active module. Returns the names of modules that failed
    /// during this call; they are already deactivated.
    pub fn draw_all(&mut self, ctx: &mut RenderContext, frame_debug: bool) -> Vec<String> {
        let mut crashed = Vec::new();
        let (sw, sh) = (ctx.settings.screen_width, ctx.settings.screen_height);
        for m in &mut self.modules {
            if !m.active {
                continue;
            }
            if frame_debug && !m.frame.bounds.covers_screen(sw, sh) {
                let b = m.frame.bounds;
                ctx.mirror(None).draw_rect(b.left, b.top, b.width, b.height, Some(GREEN));
            }
            let Some(instance) = m.instance.as_mut() else { continue };
            let outcome = {
                let mut mirror = ctx.mirror(Some(&m.frame));
                panic::catch_unwind(AssertUnwindSafe(|| instance.draw(&mut mirror)))
            };
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(error_description(&e)),
                Err(payload) => Some(panic_message(payload)),
            };
            if let Some(description) = failure {
                m.record_failure(description);
                crashed.push(m.name.clone());
            }
        }
        crashed
    }

    pub fn debug_info(&self) -> DebugInfo {
        let modules = self
            .modules
            .iter()
            .map(|m| {
                let info = ModuleDebugInfo {
                    active: m.active,
                    crashed_at: m.crashed_at,
                    failure: m.failure.clone(),
                    debug: m.instance.as_ref().and_then(|i| i.debug_info()),
                };
                (m.name.clone(), info)
            })
            .collect();
        DebugInfo { modules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_yaml;
    use crate::display::mirror::Mirror;
    use std::path::Path;

    const LAYOUT: &str = r#"
mirror:
  screen_width: 200
  screen_height: 100
  font_size: 20
modules:
  first:
    source: tests/first
    top: 0
    left: 0
    width: 100
    height: 50
  second:
    source: tests/second
    top: -50
    left: 0
    width: -1
    height: 50
    font_size: 12
"#;

    struct Solid;
    impl ModuleInstance for Solid {
        fn draw(&mut self, mirror: &mut Mirror<'_>) -> anyhow::Result<()> {
            mirror.fill_rect(0, 0, 1, 1, Some(GREEN));
            Ok(())
        }
    }

    fn solid(_: &mut Mirror<'_>, _: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
        Ok(Box::new(Solid))
    }

    fn host() -> (ModuleHost, RenderContext) {
        let cfg = from_yaml(LAYOUT, Path::new("/nonexistent/mirror.yaml"), None).unwrap();
        let host = ModuleHost::from_config(&cfg);
        let ctx = RenderContext::from_config(&cfg).unwrap();
        (host, ctx)
    }

    #[test]
    fn test_config_merges_bounds_and_fonts() {
        let (host, _) = host();
        let second = host.module("second").unwrap();
        assert_eq!(second.bounds(), Bounds::new(50, 0, 199, 50));
        assert_eq!(second.config.int("top"), Some(50));
        assert_eq!(second.config.int("width"), Some(199));
        assert_eq!(second.config.int("font_size"), Some(12));
        assert_eq!(host.module("first").unwrap().config.int("font_size"), Some(20));
        assert_eq!(host.modules()[0].name, "first");
    }

    #[test]
    fn test_unbound_source_is_fatal() {
        let (mut host, _) = host();
        let mut registry = PluginRegistry::new();
        registry.register("first", solid);
        let err = host.load_all(&registry).unwrap_err();
        assert!(matches!(err, MirrorError::PluginBinding { ref module, .. } if module == "second"));
    }

    #[test]
    fn test_plugin_dir_joins_search_roots() {
        let (mut host, _) = host();
        let mut registry = PluginRegistry::new();
        registry.register("first", solid);
        registry.register("second", solid);
        host.load_all(&registry).unwrap();
        let roots = &host.module("first").unwrap().frame.search_roots;
        assert_eq!(roots.last(), Some(&PathBuf::from("/nonexistent/tests")));
        assert!(host.modules().iter().all(Module::is_bound));
    }

    #[test]
    fn test_draw_is_module_relative() {
        let (mut host, mut ctx) = host();
        let mut registry = PluginRegistry::new();
        registry.register("first", solid);
        registry.register("second", solid);
        host.load_all(&registry).unwrap();
        host.init_all(&mut ctx, &mut |_: &mut RenderContext, _: &str| {}).unwrap();
        assert!(host.draw_all(&mut ctx, false).is_empty());
        assert_eq!(ctx.canvas.pixel(0, 0), Some(GREEN));
        assert_eq!(ctx.canvas.pixel(0, 50), Some(GREEN));
        assert_eq!(ctx.canvas.pixel(1, 50), Some(crate::display::color::BLACK));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "panicked: boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "panicked: bang");
        assert!(!error_description(&anyhow::anyhow!("")).is_empty());
    }
}
