/*
 *  tests/render_integration.rs
 *
 *  Drawing handle, text layout and the image cache
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 */

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use tiny_skia::{Color, Pixmap};

use lymirror::display::images::cache_key;
use lymirror::display::{Align, ImageCache, ModuleFrame, RenderContext, Settings, TextOptions, Bounds, CENTER};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lymirror-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn settings(w: i32, h: i32, scale: f32, roots: Vec<PathBuf>) -> Settings {
    Settings {
        scale,
        screen_width: w,
        screen_height: h,
        font_name: None,
        font_size: 20,
        font_color: Rgb888::WHITE,
        location: None,
        timezone: None,
        search_roots: roots,
        values: BTreeMap::new(),
    }
}

fn write_png(dir: &PathBuf, name: &str, w: u32, h: u32) {
    let mut pixmap = Pixmap::new(w, h).unwrap();
    pixmap.fill(Color::from_rgba8(200, 40, 10, 255));
    for x in 0..w / 2 {
        let i = x as usize;
        pixmap.pixels_mut()[i] = tiny_skia::ColorU8::from_rgba(0, 0, 255, 255).premultiply();
    }
    pixmap.save_png(dir.join(name)).unwrap();
}

fn lit_rows(ctx: &RenderContext) -> Vec<i32> {
    let c = &ctx.canvas;
    (0..c.height() as i32)
        .filter(|&y| (0..c.width() as i32).any(|x| c.pixel(x, y) == Some(Rgb888::WHITE)))
        .collect()
}

#[test]
fn test_wrapped_text_line_positions() {
    let mut ctx = RenderContext::new(settings(300, 200, 1.0, Vec::new()), None).unwrap();
    let width = ctx.mirror(None).draw_text(
        "This text flows inside the bounding box",
        0,
        0,
        &TextOptions::new().size(20).width(120),
    );
    assert_eq!(width, 120);
    let rows = lit_rows(&ctx);
    // four lines, 20px glyph cells starting 30px apart
    for start in [0, 30, 60, 90] {
        assert!(rows.iter().any(|&y| (start..start + 20).contains(&y)), "line at {}", start);
    }
    assert!(rows.iter().all(|&y| y < 110));
    assert!(!rows.iter().any(|&y| (20..30).contains(&y)));
}

#[test]
fn test_centered_in_module_with_scale() {
    let mut ctx = RenderContext::new(settings(400, 200, 0.5, Vec::new()), None).unwrap();
    let frame = ModuleFrame {
        name: "centre".into(),
        bounds: Bounds::new(100, 200, 200, 100),
        search_roots: Vec::new(),
    };
    let opts = TextOptions::new().size(40).align(Align::Center);
    // 40 logical -> 20 device pixels, two 10px glyphs; unscaled result
    assert_eq!(ctx.mirror(Some(&frame)).draw_text("ab", CENTER, 0, &opts), 40);
    let c = &ctx.canvas;
    let lit: Vec<(i32, i32)> = (0..200)
        .flat_map(|x| (0..100).map(move |y| (x, y)))
        .filter(|&(x, y)| c.pixel(x, y) == Some(Rgb888::WHITE))
        .collect();
    assert!(!lit.is_empty());
    // centre of module = (200 + 100) * 0.5 = 150 device, top = 50 device
    assert!(lit.iter().all(|&(x, y)| (140..160).contains(&x) && (50..70).contains(&y)), "{:?}", lit);
}

#[test]
fn test_image_cache_hit_matches_miss() {
    let assets = scratch("assets");
    let cache_dir = assets.join("cache");
    write_png(&assets, "icon.png", 40, 20);

    let cache = ImageCache::new(Some(cache_dir.clone()), 1.5);
    let first = cache.try_load("icon.png", Some(20), true, &[assets.clone()]).unwrap();
    let entry = cache_dir.join(cache_key("icon.png", true, Some(20), 1.5));
    assert!(entry.is_file(), "cache entry {} missing", entry.display());

    let second = cache.try_load("icon.png", Some(20), true, &[]).unwrap();
    assert_eq!((first.width(), first.height()), (20, 10));
    assert_eq!((first.pixel_width(), first.pixel_height()), (30, 15));
    assert_eq!((second.width(), second.height()), (20, 10));
    assert_eq!(first.to_rgba(), second.to_rgba());

    // corrupt entry falls back to the source and is rewritten
    fs::write(&entry, b"LYMCgarbage").unwrap();
    let third = cache.try_load("icon.png", Some(20), true, &[assets.clone()]).unwrap();
    assert_eq!(first.to_rgba(), third.to_rgba());

    // a well-formed header describing an empty raster is a miss too
    let mut empty = b"LYMC\x01".to_vec();
    empty.extend_from_slice(&[0u8; 16]);
    fs::write(&entry, &empty).unwrap();
    let fourth = cache.try_load("icon.png", Some(20), true, &[assets.clone()]).unwrap();
    assert_eq!(first.to_rgba(), fourth.to_rgba());
    assert!(fs::metadata(&entry).unwrap().len() > 21);

    let _ = fs::remove_dir_all(&assets);
}

#[test]
fn test_native_image_and_inversion() {
    let assets = scratch("native");
    write_png(&assets, "plain.png", 8, 4);
    let cache = ImageCache::new(None, 2.0);
    let plain = cache.try_load("plain.png", None, false, &[assets.clone()]).unwrap();
    assert_eq!((plain.pixel_width(), plain.pixel_height()), (8, 4));
    assert_eq!(&plain.to_rgba()[0..4], &[0, 0, 255, 255]);

    let inverted = cache.try_load("plain.png", None, true, &[assets.clone()]).unwrap();
    assert_eq!(&inverted.to_rgba()[0..4], &[255, 255, 0, 255]);
    assert_eq!(&inverted.to_rgba()[28..32], &[55, 215, 245, 255]);
    let _ = fs::remove_dir_all(&assets);
}

#[test]
fn test_blit_through_module_roots() {
    let assets = scratch("blit");
    write_png(&assets, "dot.png", 2, 2);
    let mut ctx = RenderContext::new(settings(50, 50, 1.0, Vec::new()), None).unwrap();
    let frame = ModuleFrame {
        name: "pic".into(),
        bounds: Bounds::new(10, 10, 20, 20),
        search_roots: vec![assets.clone()],
    };
    let mut m = ctx.mirror(Some(&frame));
    let image = m.load_image("dot.png", None, false).unwrap();
    m.blit_image(&image, 0, 0);
    assert_eq!(ctx.canvas.pixel(10, 10), Some(Rgb888::new(0, 0, 255)));
    assert_eq!(ctx.canvas.pixel(11, 11), Some(Rgb888::new(200, 40, 10)));

    // globally the asset is not visible
    assert!(ctx.mirror(None).load_image("dot.png", None, false).is_none());
    let _ = fs::remove_dir_all(&assets);
}
