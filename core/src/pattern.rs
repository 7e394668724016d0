//! Stand-in machine for running the frontend without a real emulation core.
//!
//! Renders a scrolling RGB565 test pattern and logs every input report, so
//! the whole input/scaling pipeline can be exercised end to end.

use crate::command::Command;
use crate::machine::Machine;
use crate::{NATIVE_HEIGHT, NATIVE_WIDTH};

pub struct TestPattern {
    frame: u64,
    /// Extra lines of overscan to render, toggled by Joypad1 Select to
    /// exercise the frontend's resize handling.
    overscan: bool,
}

impl TestPattern {
    pub fn new() -> Self {
        Self {
            frame: 0,
            overscan: false,
        }
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine for TestPattern {
    fn run_frame(&mut self, screen: &mut [u16], pitch: usize) -> (usize, usize) {
        let height = if self.overscan {
            crate::NATIVE_HEIGHT_EXTENDED
        } else {
            NATIVE_HEIGHT
        };

        let scroll = (self.frame % NATIVE_WIDTH as u64) as usize;
        for y in 0..height {
            let row = &mut screen[y * pitch..y * pitch + NATIVE_WIDTH];
            for (x, px) in row.iter_mut().enumerate() {
                let sx = (x + scroll) % NATIVE_WIDTH;
                // Red ramps horizontally, green vertically, blue by frame.
                let r = (sx >> 3) as u16;
                let g = ((y * 64 / height) & 0x3f) as u16;
                let b = ((self.frame >> 3) & 0x1f) as u16;
                *px = (r << 11) | (g << 5) | b;
            }
        }

        self.frame += 1;
        (NATIVE_WIDTH, height)
    }

    fn report_button(&mut self, command: &Command, pressed: bool) {
        log::debug!("button {command} -> {}", if pressed { "down" } else { "up" });

        if pressed
            && let Command::Joypad { pad: 1, button } = command
            && *button == crate::command::JoypadButton::Select
        {
            self.overscan = !self.overscan;
        }
    }

    fn report_axis(&mut self, command: &Command, value: i16) {
        log::debug!("axis {command} -> {value}");
    }

    fn report_pointer(&mut self, command: &Command, x: i16, y: i16) {
        log::trace!("pointer {command} -> ({x}, {y})");
    }

    fn exit(&mut self) {
        log::info!("test pattern machine shutting down after {} frames", self.frame);
    }
}
