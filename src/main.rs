/*
 *  main.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command line entry: load the layout, then run the frame loop
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use lymirror::config::{self, Cli, MirrorConfig, RunOptions};
use lymirror::display::{FrameScheduler, HeadlessPresenter, PluginRegistry, Settings};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn run_headless(cfg: &MirrorConfig, options: RunOptions, registry: PluginRegistry) -> anyhow::Result<()> {
    if options.frames.is_none() {
        warn!("Headless without --frames renders until killed");
    }
    let presenter = HeadlessPresenter::new(options.frames, options.snapshot.clone());
    FrameScheduler::new(cfg, options, registry, presenter)?.run()?;
    Ok(())
}

#[cfg(feature = "window")]
fn run_windowed(cfg: &MirrorConfig, options: RunOptions, registry: PluginRegistry) -> anyhow::Result<()> {
    use lymirror::display::WindowPresenter;

    let (width, height) = Settings::from_config(cfg).device_size();
    let presenter = WindowPresenter::new(width, height, cfg.fullscreen, options.window_pos)?;
    FrameScheduler::new(cfg, options, registry, presenter)?.run()?;
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = config::load(cli).context("loading layout")?;
    if cli.dump_config {
        println!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let options = cli.run_options();
    let registry = PluginRegistry::with_builtins();
    info!(
        "{} module(s), {}x{} at scale {} ({} plugins available)",
        cfg.modules.len(),
        cfg.screen_width,
        cfg.screen_height,
        cfg.scale,
        registry.keys().count()
    );

    #[cfg(feature = "window")]
    if !options.headless {
        return run_windowed(&cfg, options, registry);
    }
    #[cfg(not(feature = "window"))]
    if !options.headless {
        let (w, h) = Settings::from_config(&cfg).device_size();
        warn!("Built without the window feature; rendering {}x{} headless", w, h);
    }
    run_headless(&cfg, options, registry)
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    info!("Exiting");
}
