/*
 *  display/window.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Desktop window presenter (pixels + winit)
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

//! Keys:
//!     Esc / Q - quit
//!     S       - save the next frame as PNG

use std::path::PathBuf;

use chrono::Local;
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{Event, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Fullscreen, Window, WindowBuilder},
};
use winit_input_helper::WinitInputHelper;

use crate::display::canvas::Canvas;
use crate::display::error::MirrorError;
use crate::display::presenter::Presenter;

pub struct WindowPresenter {
    // dropped before the window it draws into
    pixels: Pixels,
    window: Window,
    event_loop: EventLoop<()>,
    input: WinitInputHelper,
    quit: bool,
    screenshot: bool,
}

fn present_err(e: impl std::fmt::Display) -> MirrorError {
    MirrorError::Present(e.to_string())
}

impl WindowPresenter {
    /// `width`x`height` device pixels; fullscreen stretches the surface.
    pub fn new(
        width: u32,
        height: u32,
        fullscreen: bool,
        position: Option<(i32, i32)>,
    ) -> Result<Self, MirrorError> {
        let event_loop = EventLoop::new();
        let mut builder = WindowBuilder::new()
            .with_title("LyMirror")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);
        if let Some((x, y)) = position {
            builder = builder.with_position(PhysicalPosition::new(x, y));
        }
        if fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = builder.build(&event_loop).map_err(present_err)?;
        // no mouse on the mirror itself
        if fullscreen || cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            window.set_cursor_visible(false);
        }

        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, &window);
        let pixels = Pixels::new(width, height, surface).map_err(present_err)?;
        info!("Window {}x{} ({})", width, height, if fullscreen { "fullscreen" } else { "windowed" });

        Ok(Self {
            pixels,
            window,
            event_loop,
            input: WinitInputHelper::new(),
            quit: false,
            screenshot: false,
        })
    }
}

impl Presenter for WindowPresenter {
    fn poll_quit(&mut self) -> bool {
        let input = &mut self.input;
        let quit = &mut self.quit;
        let screenshot = &mut self.screenshot;
        self.event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            if let Event::WindowEvent { event: WindowEvent::CloseRequested, .. } = &event {
                *quit = true;
            }
            // true once this batch of events is drained
            if input.update(&event) {
                if input.key_pressed(VirtualKeyCode::Escape) || input.key_pressed(VirtualKeyCode::Q) {
                    *quit = true;
                }
                if input.key_pressed(VirtualKeyCode::S) {
                    *screenshot = true;
                }
                *control_flow = ControlFlow::Exit;
            }
        });
        self.quit
    }

    fn present(&mut self, canvas: &Canvas) -> Result<(), MirrorError> {
        let rgba = canvas.to_rgba();
        let frame = self.pixels.frame_mut();
        if frame.len() != rgba.len() {
            return Err(MirrorError::Present(format!(
                "frame is {} bytes, surface expects {}",
                rgba.len(),
                frame.len()
            )));
        }
        frame.copy_from_slice(&rgba);
        self.pixels.render().map_err(present_err)?;
        self.window.request_redraw();

        if std::mem::take(&mut self.screenshot) {
            let path = PathBuf::from(format!("lymirror-{}.png", Local::now().format("%Y%m%d-%H%M%S")));
            match canvas.save_png(&path) {
                Ok(()) => info!("Saved screenshot {}", path.display()),
                Err(e) => error!("Screenshot failed: {}", e),
            }
        }
        Ok(())
    }
}
