/*
 *  config.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layout file + command line, merged and validated
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

pub const DEFAULT_FONT_SIZE: u32 = 30;
pub const DEFAULT_FPS: u32 = 30;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A scalar from the layout file. Module sections pass these through
/// verbatim, so the type is whatever YAML made of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            ConfigValue::Float(v) => Some(*v as i64),
            ConfigValue::Str(s) => s.trim().parse().ok(),
            ConfigValue::Bool(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Int(v) => Some(*v as f64),
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Str(s) => s.trim().parse().ok(),
            ConfigValue::Bool(_) => None,
        }
    }

    /// "yes"/"no" are accepted for strings, same as the YAML 1.1 spelling.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Int(v) => Some(*v != 0),
            ConfigValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            ConfigValue::Float(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self { ConfigValue::Str(s.to_string()) }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self { ConfigValue::Str(s) }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self { ConfigValue::Int(v) }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self { ConfigValue::Float(v) }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self { ConfigValue::Bool(v) }
}

/// Per-module configuration handed to a plugin's init.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModuleConfig(BTreeMap<String, ConfigValue>);

impl ModuleConfig {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> { self.0.get(key) }

    pub fn contains(&self, key: &str) -> bool { self.0.contains_key(key) }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when the module did not set the key itself.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn str(&self, key: &str) -> Option<&str> { self.get(key).and_then(ConfigValue::as_str) }

    pub fn int(&self, key: &str) -> Option<i64> { self.get(key).and_then(ConfigValue::as_i64) }

    pub fn float(&self, key: &str) -> Option<f64> { self.get(key).and_then(ConfigValue::as_f64) }

    pub fn bool(&self, key: &str) -> Option<bool> { self.get(key).and_then(ConfigValue::as_bool) }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> { self.0.iter() }
}

impl FromIterator<(String, ConfigValue)> for ModuleConfig {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        ModuleConfig(iter.into_iter().collect())
    }
}

/// The `mirror:` section of the layout file, as written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorSection {
    pub scale: Option<f32>,
    pub fullscreen: Option<bool>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub font_name: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub fps: Option<u32>,
    pub debug_broker: Option<String>,
    /// Anything else, readable by modules through the drawing handle
    #[serde(flatten)]
    pub extra: BTreeMap<String, ConfigValue>,
}

/// One module section. Bounds may be negative (offset from bottom/right).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSection {
    pub source: String,
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, ConfigValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutFile {
    #[serde(default)]
    pub mirror: MirrorSection,
    /// Ordered: declaration order is draw order
    #[serde(default)]
    pub modules: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDecl {
    pub name: String,
    pub section: ModuleSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Effective configuration after file, defaults and CLI overrides.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorConfig {
    pub config_path: PathBuf,
    pub scale: f32,
    pub fullscreen: bool,
    pub screen_width: u32,
    pub screen_height: u32,
    pub location: Option<Location>,
    pub timezone: Option<String>,
    pub font_name: Option<String>,
    pub font_size: u32,
    pub font_color: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub fps: u32,
    pub debug_broker: Option<String>,
    pub settings: BTreeMap<String, ConfigValue>,
    pub modules: Vec<ModuleDecl>,
}

impl MirrorConfig {
    /// Host-level asset roots: the layout's directory first, then the
    /// `assets` directory installed next to the executable, then the
    /// user's own asset directory.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        let config_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        roots.push(config_dir);
        if let Some(dir) = installed_assets_dir() {
            roots.push(dir);
        }
        if let Some(home) = home_dir() {
            roots.push(home.join(".lymirror"));
        }
        roots
    }
}

/// `assets` beside the running binary.
pub fn installed_assets_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("assets"))
}

/// Runtime switches that never come from the layout file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub frame_debug: bool,
    pub halt_on_failure: bool,
    pub window_pos: Option<(i32, i32)>,
    pub headless: bool,
    pub frames: Option<u64>,
    pub snapshot: Option<PathBuf>,
}

/// CLI overrides. Optional fields layer over the YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "lymirror", version, about = "LyMirror - one more magic mirror")]
pub struct Cli {
    /// Layout file
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    /// Increase output verbosity
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// Only load the module with this name
    #[arg(short = 'm', long)]
    pub module: Option<String>,
    /// Halt on the first module that fails while drawing
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Outline every module's bounds
    #[arg(short = 'g', long, action = ArgAction::SetTrue)]
    pub frame_debug: bool,
    /// Override fps from the layout file
    #[arg(short = 'f', long)]
    pub fps: Option<u32>,
    /// Window x position
    #[arg(short = 'x', long = "x", allow_hyphen_values = true)]
    pub x: Option<i32>,
    /// Window y position
    #[arg(short = 'y', long = "y", allow_hyphen_values = true)]
    pub y: Option<i32>,
    /// Force fullscreen
    #[arg(short = 'F', long, action = ArgAction::SetTrue)]
    pub fullscreen: bool,
    /// Override scale from the layout file
    #[arg(short = 's', long)]
    pub scale: Option<f32>,
    /// Render without a window
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,
    /// Stop after this many frames (headless)
    #[arg(long)]
    pub frames: Option<u64>,
    /// Write the last frame as PNG on exit (headless)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    /// Dump the fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            frame_debug: self.frame_debug,
            halt_on_failure: self.debug,
            window_pos: match (self.x, self.y) {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            },
            headless: self.headless || self.frames.is_some() || self.snapshot.is_some(),
            frames: self.frames,
            snapshot: self.snapshot.clone(),
        }
    }
}

/// Public entry point: read YAML, merge CLI, validate.
pub fn load(cli: &Cli) -> Result<MirrorConfig, ConfigError> {
    let path = &cli.config;
    if !path.exists() {
        return Err(ConfigError::Validation(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    info!("Loading config from {}", path.display());
    let text = fs::read_to_string(path)?;
    let mut cfg = from_yaml(&text, path, cli.module.as_deref())?;
    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Parse a layout document. `config_path` anchors relative paths.
pub fn from_yaml(
    text: &str,
    config_path: &Path,
    module_filter: Option<&str>,
) -> Result<MirrorConfig, ConfigError> {
    let file: LayoutFile = serde_yaml::from_str(text)?;
    let mirror = file.mirror;

    let config_path = config_path.to_path_buf();
    let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut modules = Vec::new();
    for (key, value) in file.modules {
        let name = match key {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(ConfigError::Validation(format!(
                    "module names must be strings, got {:?}",
                    other
                )))
            }
        };
        if let Some(only) = module_filter {
            if only != name {
                info!("Skipping module {}", name);
                continue;
            }
        }
        let section: ModuleSection = serde_yaml::from_value(value)
            .map_err(|e| ConfigError::Validation(format!("module '{}': {}", name, e)))?;
        debug!(
            "Module {} bounds: {},{} {}x{}",
            name, section.top, section.left, section.width, section.height
        );
        modules.push(ModuleDecl { name, section });
    }

    let location = match (mirror.latitude, mirror.longitude) {
        (Some(latitude), Some(longitude)) => Some(Location { latitude, longitude }),
        _ => None,
    };

    Ok(MirrorConfig {
        scale: mirror.scale.unwrap_or(1.0),
        fullscreen: mirror.fullscreen.unwrap_or(false),
        screen_width: mirror.screen_width.unwrap_or(0),
        screen_height: mirror.screen_height.unwrap_or(0),
        location,
        timezone: mirror.timezone,
        font_name: mirror.font_name,
        font_size: mirror.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        font_color: mirror.font_color,
        cache_dir: mirror.cache_dir.map(|dir| config_dir.join(dir)),
        fps: mirror.fps.unwrap_or(DEFAULT_FPS),
        debug_broker: mirror.debug_broker,
        settings: mirror.extra,
        modules,
        config_path,
    })
}

pub fn apply_cli_overrides(cfg: &mut MirrorConfig, cli: &Cli) {
    if let Some(fps) = cli.fps { cfg.fps = fps; }
    if let Some(scale) = cli.scale { cfg.scale = scale; }
    if cli.fullscreen { cfg.fullscreen = true; }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &MirrorConfig) -> Result<(), ConfigError> {
    if cfg.screen_width == 0 || cfg.screen_height == 0 {
        return Err(ConfigError::Validation(
            "mirror screen_width/screen_height must be set and > 0".into(),
        ));
    }
    if !(cfg.scale > 0.0) {
        return Err(ConfigError::Validation("mirror scale must be > 0".into()));
    }
    if cfg.fps == 0 {
        return Err(ConfigError::Validation("mirror fps must be > 0".into()));
    }
    if cfg.font_size == 0 {
        return Err(ConfigError::Validation("mirror font_size must be > 0".into()));
    }
    if let Some(color) = cfg.font_color.as_deref() {
        if crate::display::color::parse_hex(color).is_none() {
            return Err(ConfigError::Validation(format!(
                "mirror font_color '{}' is not RRGGBB hex",
                color
            )));
        }
    }
    Ok(())
}
