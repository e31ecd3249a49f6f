/*
 *  tests/host_integration.rs
 *
 *  Module lifecycle through the frame scheduler
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 */

use std::path::Path;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde_json::json;

use lymirror::config::{from_yaml, ConfigValue, MirrorConfig, ModuleConfig, RunOptions};
use lymirror::display::{
    Bounds, FrameScheduler, HeadlessPresenter, Mirror, MirrorError, ModuleInstance, PluginRegistry,
    SplashState,
};

const SPLASH_GRAY: Rgb888 = Rgb888::new(155, 155, 155);

const LAYOUT: &str = r#"
mirror:
  screen_width: 1000
  screen_height: 800
  fps: 100
  font_size: 20
modules:
  solid:
    source: tests/solid
    top: -50
    left: 0
    width: -1
    height: 50
    colour: ff0000
  boom:
    source: tests/boom
    top: 0
    left: 0
    width: 100
    height: 100
  panicky:
    source: tests/panicky
    top: 100
    left: 0
    width: 100
    height: 100
"#;

struct Solid {
    color: Rgb888,
}

impl ModuleInstance for Solid {
    fn draw(&mut self, mirror: &mut Mirror<'_>) -> anyhow::Result<()> {
        mirror.fill_rect(0, 0, 10, 10, Some(self.color));
        Ok(())
    }
}

struct Boom {
    draws: u32,
}

impl ModuleInstance for Boom {
    fn draw(&mut self, _mirror: &mut Mirror<'_>) -> anyhow::Result<()> {
        self.draws += 1;
        if self.draws >= 2 {
            anyhow::bail!("boom after {} draws", self.draws);
        }
        Ok(())
    }

    fn debug_info(&self) -> Option<serde_json::Value> {
        Some(json!({ "draws": self.draws }))
    }
}

struct Panicky;

impl ModuleInstance for Panicky {
    fn draw(&mut self, _mirror: &mut Mirror<'_>) -> anyhow::Result<()> {
        panic!("kaboom");
    }
}

fn solid(_: &mut Mirror<'_>, config: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
    let hex = config.str("colour").unwrap_or("ffffff");
    let color = lymirror::display::color::parse_hex(hex).ok_or_else(|| anyhow::anyhow!("bad colour {}", hex))?;
    Ok(Box::new(Solid { color }))
}

fn boom(_: &mut Mirror<'_>, _: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
    Ok(Box::new(Boom { draws: 0 }))
}

fn panicky(_: &mut Mirror<'_>, _: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
    Ok(Box::new(Panicky))
}

fn gallery(mirror: &mut Mirror<'_>, _: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
    for name in ["first.png", "second.png"] {
        let _ = mirror.load_image(name, Some(10), false);
    }
    Ok(Box::new(Boom { draws: 0 }))
}

fn refuses(_: &mut Mirror<'_>, _: &ModuleConfig) -> anyhow::Result<Box<dyn ModuleInstance>> {
    anyhow::bail!("no api key")
}

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("solid", solid);
    registry.register("boom", boom);
    registry.register("panicky", panicky);
    registry
}

fn config(text: &str) -> MirrorConfig {
    from_yaml(text, Path::new("/nonexistent/layout.yaml"), None).unwrap()
}

fn scheduler(text: &str, options: RunOptions) -> FrameScheduler<HeadlessPresenter> {
    FrameScheduler::new(&config(text), options, registry(), HeadlessPresenter::new(Some(3), None)).unwrap()
}

#[test]
fn test_resolved_bounds_reach_module_config() {
    let mut s = scheduler(LAYOUT, RunOptions::default());
    s.start().unwrap();
    let solid = s.host().module("solid").unwrap();
    assert_eq!(solid.bounds(), Bounds::new(750, 0, 999, 50));
    assert_eq!(solid.config.get("top"), Some(&ConfigValue::Int(750)));
    assert_eq!(solid.config.get("width"), Some(&ConfigValue::Int(999)));
}

#[test]
fn test_failures_are_isolated() {
    let mut s = scheduler(LAYOUT, RunOptions::default());
    s.start().unwrap();
    let now = Instant::now();

    s.render_frame(now).unwrap();
    assert!(!s.host().module("panicky").unwrap().active);
    assert!(s.host().module("boom").unwrap().active);

    s.render_frame(now).unwrap();
    s.render_frame(now + Duration::from_secs(5)).unwrap();

    let boom = s.host().module("boom").unwrap();
    assert!(!boom.active);
    assert!(boom.crashed_at.is_some());
    assert!(boom.failure.as_deref().unwrap().contains("boom after 2 draws"));

    let panicky = s.host().module("panicky").unwrap();
    assert!(panicky.failure.as_deref().unwrap().contains("kaboom"));

    // the healthy module keeps drawing, at its resolved offset
    assert!(s.host().module("solid").unwrap().active);
    assert_eq!(s.canvas().pixel(0, 750), Some(Rgb888::RED));
    assert_eq!(s.frames(), 3);

    // a crashed module is never asked to draw again
    s.render_frame(now + Duration::from_secs(6)).unwrap();
    assert_eq!(s.debug_info().modules["boom"].debug, Some(json!({ "draws": 2 })));
}

#[test]
fn test_modules_may_sit_off_screen() {
    let text = r#"
mirror:
  screen_width: 1000
  screen_height: 800
modules:
  offscreen:
    source: tests/solid
    top: -900
    left: -1200
    width: 300
    height: -1
"#;
    let mut s = scheduler(text, RunOptions::default());
    s.start().unwrap();
    assert_eq!(s.host().module("offscreen").unwrap().bounds(), Bounds::new(-100, -200, 300, 799));
    // drawing outside the canvas is clipped, not an error
    s.render_frame(Instant::now()).unwrap();
    assert!(s.host().module("offscreen").unwrap().active);
}

#[test]
fn test_debug_snapshot() {
    let mut s = scheduler(LAYOUT, RunOptions::default());
    s.start().unwrap();
    s.render_frame(Instant::now()).unwrap();

    let info = s.debug_info();
    assert_eq!(info.modules.len(), 3);
    assert!(info.modules["solid"].active);
    assert!(info.modules["panicky"].crashed_at.is_some());
    assert_eq!(info.modules["boom"].debug, Some(json!({ "draws": 1 })));

    let parsed: serde_json::Value = serde_json::from_str(&info.to_json()).unwrap();
    assert_eq!(parsed["modules"]["boom"]["active"], json!(true));
    assert_eq!(parsed["modules"]["panicky"]["active"], json!(false));
}

#[test]
fn test_halt_on_failure() {
    let options = RunOptions { halt_on_failure: true, ..RunOptions::default() };
    let mut s = scheduler(LAYOUT, options);
    s.start().unwrap();
    let err = s.render_frame(Instant::now()).unwrap_err();
    match err {
        MirrorError::ModuleDraw { module, description } => {
            assert_eq!(module, "panicky");
            assert!(description.contains("kaboom"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unbound_module_is_fatal() {
    let text = LAYOUT.replace("tests/boom", "tests/weather");
    let mut s = scheduler(&text, RunOptions::default());
    let err = s.start().unwrap_err();
    assert!(matches!(err, MirrorError::PluginBinding { ref module, .. } if module == "boom"));
    assert!(err.is_fatal());
}

#[test]
fn test_init_failure_is_fatal() {
    let mut registry = registry();
    registry.register("boom", refuses);
    let mut s = FrameScheduler::new(&config(LAYOUT), RunOptions::default(), registry, HeadlessPresenter::default()).unwrap();
    match s.start().unwrap_err() {
        MirrorError::ModuleInit { module, cause } => {
            assert_eq!(module, "boom");
            assert_eq!(cause.to_string(), "no api key");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_splash_overlays_then_clears() {
    let mut s = scheduler(LAYOUT, RunOptions::default());
    assert_eq!(s.splash_state(), SplashState::PreInit);
    s.start().unwrap();
    assert_eq!(s.splash_state(), SplashState::PostInit);

    let now = Instant::now();
    s.render_frame(now).unwrap();
    // frame border at (W/2-202, H/3-2)
    assert_eq!(s.canvas().pixel(298, 264), Some(SPLASH_GRAY));
    // modules are drawn underneath
    assert_eq!(s.canvas().pixel(0, 750), Some(Rgb888::RED));

    s.render_frame(now + Duration::from_secs(5)).unwrap();
    assert_eq!(s.splash_state(), SplashState::Done);
    assert_eq!(s.canvas().pixel(298, 264), Some(Rgb888::BLACK));
}

#[test]
fn test_frame_debug_outlines() {
    let text = r#"
mirror:
  screen_width: 200
  screen_height: 100
  fps: 100
modules:
  small:
    source: tests/solid
    top: 10
    left: 20
    width: 50
    height: 30
    colour: "000000"
  full:
    source: tests/solid
    top: 0
    left: 0
    width: -1
    height: -1
    colour: "000000"
"#;
    let options = RunOptions { frame_debug: true, ..RunOptions::default() };
    let mut s = scheduler(text, options);
    s.start().unwrap();
    s.render_frame(Instant::now() + Duration::from_secs(5)).unwrap();
    assert_eq!(s.canvas().pixel(70, 40), Some(Rgb888::GREEN));
    assert_eq!(s.canvas().pixel(45, 10), Some(Rgb888::GREEN));
    // the full-screen module gets no outline along the far edges
    assert_eq!(s.canvas().pixel(199, 50), Some(Rgb888::BLACK));
    assert_eq!(s.canvas().pixel(100, 99), Some(Rgb888::BLACK));
}

#[test]
fn test_run_stops_after_frame_limit() {
    let mut s = scheduler(LAYOUT, RunOptions::default());
    s.run().unwrap();
    assert_eq!(s.frames(), 3);
    // splash before init, then one per frame
    assert_eq!(s.presenter().presented(), 4);
}

#[test]
fn test_sample_layout_binds_builtin_modules() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/mirror.yaml");
    let text = std::fs::read_to_string(&path).unwrap();
    let cfg = from_yaml(&text, &path, None).unwrap();
    assert_eq!(cfg.scale, 0.5);
    assert_eq!(cfg.modules.len(), 4);

    let mut host = lymirror::display::ModuleHost::from_config(&cfg);
    host.load_all(&PluginRegistry::with_builtins()).unwrap();
    assert!(host.modules().iter().all(|m| m.is_bound()));
    assert_eq!(host.module("demo").unwrap().bounds(), Bounds::new(1520, 0, 1079, 400));
}

#[test]
fn test_splash_announces_image_loads() {
    let text = r#"
mirror:
  screen_width: 1000
  screen_height: 800
modules:
  gallery:
    source: tests/gallery
    top: 0
    left: 0
    width: 100
    height: 100
"#;
    let mut registry = registry();
    registry.register("gallery", gallery);
    let presenter = HeadlessPresenter::new(Some(1), None);
    let mut s = FrameScheduler::new(&config(text), RunOptions::default(), registry, presenter).unwrap();
    s.start().unwrap();
    // the opening splash, then one per image
    assert_eq!(s.presenter().presented(), 3);
    assert_eq!(s.splash_state(), SplashState::PostInit);
}
