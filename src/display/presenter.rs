/*
 *  display/presenter.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Where finished frames go: a window, or nowhere in particular
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

use std::path::PathBuf;

use log::info;

use crate::display::canvas::Canvas;
use crate::display::error::MirrorError;

pub trait Presenter {
    /// Pump pending input once per frame; true when the user asked to quit.
    fn poll_quit(&mut self) -> bool;

    fn present(&mut self, canvas: &Canvas) -> Result<(), MirrorError>;

    /// Called once after the loop ends with the last frame.
    fn finish(&mut self, _canvas: &Canvas) -> Result<(), MirrorError> {
        Ok(())
    }
}

/// No window. Stops after `frame_limit` loop iterations, if set, and can
/// leave the last frame behind as a PNG.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    frame_limit: Option<u64>,
    snapshot: Option<PathBuf>,
    polls: u64,
    presented: u64,
}

impl HeadlessPresenter {
    pub fn new(frame_limit: Option<u64>, snapshot: Option<PathBuf>) -> Self {
        Self { frame_limit, snapshot, polls: 0, presented: 0 }
    }

    /// Frames presented, including the startup splash.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Presenter for HeadlessPresenter {
    fn poll_quit(&mut self) -> bool {
        self.polls += 1;
        self.frame_limit.is_some_and(|limit| self.polls > limit)
    }

    fn present(&mut self, _canvas: &Canvas) -> Result<(), MirrorError> {
        self.presented += 1;
        Ok(())
    }

    fn finish(&mut self, canvas: &Canvas) -> Result<(), MirrorError> {
        if let Some(path) = &self.snapshot {
            canvas.save_png(path)?;
            info!("Saved last frame to {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit() {
        let mut p = HeadlessPresenter::new(Some(2), None);
        assert!(!p.poll_quit());
        assert!(!p.poll_quit());
        assert!(p.poll_quit());
    }

    #[test]
    fn test_unlimited() {
        let mut p = HeadlessPresenter::default();
        assert!((0..100).all(|_| !p.poll_quit()));
    }

    #[test]
    fn test_snapshot_written() {
        let path = std::env::temp_dir().join(format!("lymirror-snap-{}.png", std::process::id()));
        let mut p = HeadlessPresenter::new(Some(1), Some(path.clone()));
        let canvas = Canvas::new(4, 4).unwrap();
        p.present(&canvas).unwrap();
        p.finish(&canvas).unwrap();
        assert!(path.is_file());
        assert_eq!(p.presented(), 1);
        let _ = std::fs::remove_file(path);
    }
}
