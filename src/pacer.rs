/*
 *  pacer.rs
 *
 *  LyMirror - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed-rate frame pacing for the render loop
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
use std::thread;
use std::time::{Duration, Instant};

pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        let frame = Duration::from_micros((1_000_000u32 / target_fps.max(1)) as u64);
        Self { next_deadline: Instant::now() + frame, frame }
    }

    #[inline]
    pub fn set_fps(&mut self, fps: u32) {
        self.frame = Duration::from_micros((1_000_000u32 / fps.max(1)) as u64);
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Time left before the current frame's deadline.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// Sleep out the rest of the frame and schedule the next deadline.
    /// A late frame does not try to catch up.
    pub fn wait(&mut self) {
        let left = self.remaining(Instant::now());
        if !left.is_zero() {
            thread::sleep(left);
        }
        let now = Instant::now();
        self.next_deadline = if now > self.next_deadline + self.frame {
            now + self.frame
        } else {
            self.next_deadline + self.frame
        };
    }
}
