/*
 *  display/scheduler.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup sequence and the fixed-rate render loop
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

//! Startup: splash (pre-init) is presented, modules are bound and
//! initialized, each image an init loads re-presenting the splash with
//! its name, then the splash countdown starts. Each frame: poll input,
//! clear, draw modules, snapshot debug state, splash on top, present,
//! sleep out the rest of the tick.

use std::time::Instant;

use log::{debug, info};

use crate::config::{MirrorConfig, RunOptions};
use crate::display::canvas::Canvas;
use crate::display::color::BLACK;
use crate::display::error::MirrorError;
use crate::display::host::{DebugInfo, ModuleHost};
use crate::display::mirror::RenderContext;
use crate::display::plugin::PluginRegistry;
use crate::display::presenter::Presenter;
use crate::display::splash::{SplashOverlay, SplashState, LOADING_MESSAGE};
use crate::pacer::Pacer;

pub struct FrameScheduler<P: Presenter> {
    ctx: RenderContext,
    host: ModuleHost,
    registry: PluginRegistry,
    splash: SplashOverlay,
    presenter: P,
    pacer: Pacer,
    options: RunOptions,
    debug: DebugInfo,
    frames: u64,
}

impl<P: Presenter> FrameScheduler<P> {
    pub fn new(
        cfg: &MirrorConfig,
        options: RunOptions,
        registry: PluginRegistry,
        presenter: P,
    ) -> Result<Self, MirrorError> {
        if let Some(broker) = &cfg.debug_broker {
            info!("Debug snapshots are logged at debug level (broker {} is not contacted)", broker);
        }
        Ok(Self {
            ctx: RenderContext::from_config(cfg)?,
            host: ModuleHost::from_config(cfg),
            registry,
            splash: SplashOverlay::new(),
            presenter,
            pacer: Pacer::new(cfg.fps),
            options,
            debug: DebugInfo::default(),
            frames: 0,
        })
    }

    pub fn host(&self) -> &ModuleHost { &self.host }
    pub fn debug_info(&self) -> &DebugInfo { &self.debug }
    pub fn splash_state(&self) -> SplashState { self.splash.state() }
    pub fn canvas(&self) -> &Canvas { &self.ctx.canvas }
    pub fn presenter(&self) -> &P { &self.presenter }
    pub fn frames(&self) -> u64 { self.frames }

    /// Splash, bind and init. Any error here is fatal. While modules
    /// initialize, the splash names each image being loaded.
    pub fn start(&mut self) -> Result<(), MirrorError> {
        self.splash.load_logo(&self.ctx);
        self.splash.draw(&mut self.ctx, Some(LOADING_MESSAGE));
        self.presenter.present(&self.ctx.canvas)?;

        self.host.load_all(&self.registry)?;

        // each image an init loads is announced on the splash
        let (splash, presenter) = (&self.splash, &mut self.presenter);
        let mut present_error = None;
        let mut progress = |ctx: &mut RenderContext, name: &str| {
            splash.draw(ctx, Some(&format!("Loading {}", name)));
            if let Err(e) = presenter.present(&ctx.canvas) {
                present_error.get_or_insert(e);
            }
        };
        self.host.init_all(&mut self.ctx, &mut progress)?;
        if let Some(e) = present_error {
            return Err(e);
        }
        info!("{} module(s) ready", self.host.modules().len());

        self.splash.finish_init(Instant::now());
        Ok(())
    }

    /// Start, then render until the presenter reports a quit.
    pub fn run(&mut self) -> Result<(), MirrorError> {
        self.start()?;
        while !self.presenter.poll_quit() {
            self.render_frame(Instant::now())?;
            self.pacer.wait();
        }
        info!("Stopping after {} frame(s)", self.frames);
        self.presenter.finish(&self.ctx.canvas)
    }

    /// One frame. Fails only on a presentation error, or on a module
    /// failure when halting on failures was requested.
    pub fn render_frame(&mut self, now: Instant) -> Result<(), MirrorError> {
        self.ctx.canvas.clear(BLACK);
        let crashed = self.host.draw_all(&mut self.ctx, self.options.frame_debug);
        self.debug = self.host.debug_info();
        if !crashed.is_empty() {
            debug!("{}", self.debug.to_json());
            if self.options.halt_on_failure {
                let module = crashed[0].clone();
                let description = self
                    .host
                    .module(&module)
                    .and_then(|m| m.failure.clone())
                    .unwrap_or_default();
                return Err(MirrorError::ModuleDraw { module, description });
            }
        }

        self.splash.update(now);
        self.splash.draw(&mut self.ctx, None);
        self.presenter.present(&self.ctx.canvas)?;
        self.frames += 1;
        Ok(())
    }
}
