//! Event translator: drains the SDL event queue once per tick, packs each
//! event into the device-identifier scheme, resolves it against the binding
//! table and forwards logical reports to the machine.
//!
//! The only state carried across calls is the pending quit flag. Unbound
//! events are silently ignored; nothing here ever aborts the frame loop
//! except a quit request, which is acted on exactly once.

use chroma_core::command::Command;
use chroma_core::machine::Machine;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton;

use crate::bindings::BindingTable;
use crate::device_id::DeviceId;

/// Reserved escape hatch: quits regardless of the binding table.
const QUIT_SCANCODE: Scancode = Scancode::Escape;

/// What one poll cycle asked the frontend itself to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Quit requested; the machine's `exit` hook has already run.
    pub quit: bool,
    /// Capture the display surface after the next blit.
    pub screenshot: bool,
    /// Toggle the pause state.
    pub toggle_pause: bool,
}

pub struct EventTranslator {
    quit_requested: bool,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self {
            quit_requested: false,
        }
    }

    /// Drain the event queue. With `block` set, waits for at least one
    /// event first (used while paused); otherwise a non-blocking drain.
    pub fn poll(
        &mut self,
        pump: &mut EventPump,
        block: bool,
        table: &BindingTable,
        machine: &mut dyn Machine,
    ) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        if block {
            let event = pump.wait_event();
            self.handle_event(&event, table, machine, &mut outcome);
        }
        while let Some(event) = pump.poll_event() {
            self.handle_event(&event, table, machine, &mut outcome);
        }

        if self.quit_requested {
            log::info!("quit requested, shutting down");
            machine.exit();
            self.quit_requested = false;
            outcome.quit = true;
        }

        outcome
    }

    fn handle_event(
        &mut self,
        event: &Event,
        table: &BindingTable,
        machine: &mut dyn Machine,
        outcome: &mut PollOutcome,
    ) {
        match *event {
            Event::KeyDown {
                scancode: Some(scancode),
                keymod,
                repeat: false,
                ..
            } => {
                if scancode == QUIT_SCANCODE {
                    self.quit_requested = true;
                } else {
                    self.key_event(scancode, keymod, true, table, machine, outcome);
                }
            }

            Event::KeyUp {
                scancode: Some(scancode),
                keymod,
                ..
            } => {
                if scancode != QUIT_SCANCODE {
                    self.key_event(scancode, keymod, false, table, machine, outcome);
                }
            }

            Event::MouseMotion { x, y, .. } => {
                let id = DeviceId::mouse_pointer(0);
                if let Some(&command) = table.lookup(id) {
                    machine.report_pointer(&command, x as i16, y as i16);
                }
            }

            Event::MouseButtonDown { mouse_btn, .. } => {
                self.button_event(
                    DeviceId::mouse_button(0, mouse_button_number(mouse_btn)),
                    true,
                    table,
                    machine,
                    outcome,
                );
            }

            Event::MouseButtonUp { mouse_btn, .. } => {
                self.button_event(
                    DeviceId::mouse_button(0, mouse_button_number(mouse_btn)),
                    false,
                    table,
                    machine,
                    outcome,
                );
            }

            Event::JoyButtonDown {
                which, button_idx, ..
            } => {
                self.button_event(
                    DeviceId::joystick_button(which as u8, button_idx),
                    true,
                    table,
                    machine,
                    outcome,
                );
            }

            Event::JoyButtonUp {
                which, button_idx, ..
            } => {
                self.button_event(
                    DeviceId::joystick_button(which as u8, button_idx),
                    false,
                    table,
                    machine,
                    outcome,
                );
            }

            Event::JoyAxisMotion {
                which,
                axis_idx,
                value,
                ..
            } => {
                let id = DeviceId::joystick_axis(which as u8, axis_idx);
                if let Some(&command) = table.lookup(id) {
                    machine.report_axis(&command, value);
                }
            }

            Event::Quit { .. } => {
                self.quit_requested = true;
            }

            _ => {}
        }
    }

    fn key_event(
        &mut self,
        scancode: Scancode,
        keymod: sdl2::keyboard::Mod,
        pressed: bool,
        table: &BindingTable,
        machine: &mut dyn Machine,
        outcome: &mut PollOutcome,
    ) {
        let id = DeviceId::keyboard(scancode, keymod);
        self.button_event(id, pressed, table, machine, outcome);

        // A release with modifiers still held must also release the
        // unmodified binding, or a key pressed before its modifier sticks.
        if !pressed && id.modifiers() != 0 {
            let bare = DeviceId::keyboard(scancode, sdl2::keyboard::Mod::NOMOD);
            self.button_event(bare, false, table, machine, outcome);
        }
    }

    fn button_event(
        &mut self,
        id: DeviceId,
        pressed: bool,
        table: &BindingTable,
        machine: &mut dyn Machine,
        outcome: &mut PollOutcome,
    ) {
        let Some(&command) = table.lookup(id) else {
            return;
        };

        match command {
            Command::Screenshot => {
                if pressed {
                    outcome.screenshot = true;
                }
            }
            Command::Pause => {
                if pressed {
                    outcome.toggle_pause = true;
                }
            }
            // Pointer bindings only carry meaning on motion events.
            Command::Pointer => {}
            _ => machine.report_button(&command, pressed),
        }
    }
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn mouse_button_number(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
        MouseButton::X1 => 4,
        MouseButton::X2 => 5,
        MouseButton::Unknown => 0,
    }
}

#[cfg(test)]
mod tests {
    use chroma_core::command::JoypadButton;
    use sdl2::keyboard::Mod;

    use super::*;

    /// Machine stub that records every report.
    #[derive(Default)]
    struct Recorder {
        buttons: Vec<(Command, bool)>,
        axes: Vec<(Command, i16)>,
        pointers: Vec<(i16, i16)>,
        exits: usize,
    }

    impl Machine for Recorder {
        fn run_frame(&mut self, _screen: &mut [u16], _pitch: usize) -> (usize, usize) {
            (chroma_core::NATIVE_WIDTH, chroma_core::NATIVE_HEIGHT)
        }

        fn report_button(&mut self, command: &Command, pressed: bool) {
            self.buttons.push((*command, pressed));
        }

        fn report_axis(&mut self, command: &Command, value: i16) {
            self.axes.push((*command, value));
        }

        fn report_pointer(&mut self, _command: &Command, x: i16, y: i16) {
            self.pointers.push((x, y));
        }

        fn exit(&mut self) {
            self.exits += 1;
        }
    }

    fn key_down(scancode: Scancode, keymod: Mod) -> Event {
        Event::KeyDown {
            timestamp: 0,
            window_id: 0,
            keycode: None,
            scancode: Some(scancode),
            keymod,
            repeat: false,
        }
    }

    fn key_up(scancode: Scancode, keymod: Mod) -> Event {
        Event::KeyUp {
            timestamp: 0,
            window_id: 0,
            keycode: None,
            scancode: Some(scancode),
            keymod,
            repeat: false,
        }
    }

    fn feed(events: &[Event], table: &BindingTable, machine: &mut Recorder) -> PollOutcome {
        let mut translator = EventTranslator::new();
        let mut outcome = PollOutcome::default();
        for event in events {
            translator.handle_event(event, table, machine, &mut outcome);
        }
        if translator.quit_requested {
            machine.exit();
            outcome.quit = true;
        }
        outcome
    }

    #[test]
    fn bound_key_press_and_release_are_forwarded() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        feed(
            &[
                key_down(Scancode::Right, Mod::NOMOD),
                key_up(Scancode::Right, Mod::NOMOD),
            ],
            &table,
            &mut machine,
        );

        let right = Command::Joypad {
            pad: 1,
            button: JoypadButton::Right,
        };
        assert_eq!(machine.buttons, vec![(right, true), (right, false)]);
    }

    #[test]
    fn unbound_key_is_a_no_op() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        let outcome = feed(
            &[
                key_down(Scancode::F9, Mod::NOMOD),
                key_up(Scancode::F9, Mod::NOMOD),
            ],
            &table,
            &mut machine,
        );

        assert!(machine.buttons.is_empty());
        assert_eq!(outcome, PollOutcome::default());
    }

    #[test]
    fn modified_key_resolves_modified_binding() {
        // Shift+d hits the turbo toggle, not Joypad1 A.
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        feed(&[key_down(Scancode::D, Mod::LSHIFTMOD)], &table, &mut machine);

        assert_eq!(
            machine.buttons,
            vec![(Command::ToggleTurbo(JoypadButton::A), true)]
        );
    }

    #[test]
    fn quit_key_bypasses_the_table() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        let outcome = feed(&[key_down(Scancode::Escape, Mod::NOMOD)], &table, &mut machine);

        assert!(outcome.quit);
        assert_eq!(machine.exits, 1);
        assert!(machine.buttons.is_empty());
    }

    #[test]
    fn window_quit_sets_the_flag() {
        let table = BindingTable::build(&[], true);
        let mut machine = Recorder::default();

        let outcome = feed(&[Event::Quit { timestamp: 0 }], &table, &mut machine);

        assert!(outcome.quit);
        assert_eq!(machine.exits, 1);
    }

    #[test]
    fn pointer_motion_reports_when_bound() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        feed(
            &[Event::MouseMotion {
                timestamp: 0,
                window_id: 0,
                which: 0,
                mousestate: sdl2::mouse::MouseState::from_sdl_state(0),
                x: 120,
                y: 80,
                xrel: 0,
                yrel: 0,
            }],
            &table,
            &mut machine,
        );

        assert_eq!(machine.pointers, vec![(120, 80)]);
    }

    #[test]
    fn pointer_motion_without_binding_is_ignored() {
        let table = BindingTable::build(&[], true);
        let mut machine = Recorder::default();

        feed(
            &[Event::MouseMotion {
                timestamp: 0,
                window_id: 0,
                which: 0,
                mousestate: sdl2::mouse::MouseState::from_sdl_state(0),
                x: 1,
                y: 2,
                xrel: 0,
                yrel: 0,
            }],
            &table,
            &mut machine,
        );

        assert!(machine.pointers.is_empty());
    }

    #[test]
    fn joystick_axis_reports_raw_value() {
        let entries = vec![("J00:Axis1".to_string(), "Pointer".to_string())];
        let table = BindingTable::build(&entries, true);
        let mut machine = Recorder::default();

        feed(
            &[Event::JoyAxisMotion {
                timestamp: 0,
                which: 0,
                axis_idx: 1,
                value: -12345,
            }],
            &table,
            &mut machine,
        );

        assert_eq!(machine.axes, vec![(Command::Pointer, -12345)]);
    }

    #[test]
    fn joystick_button_resolves_binding() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        feed(
            &[Event::JoyButtonDown {
                timestamp: 0,
                which: 0,
                button_idx: 0,
            }],
            &table,
            &mut machine,
        );

        assert_eq!(
            machine.buttons,
            vec![(
                Command::Joypad {
                    pad: 1,
                    button: JoypadButton::A
                },
                true
            )]
        );
    }

    #[test]
    fn screenshot_and_pause_stay_in_the_frontend() {
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        let outcome = feed(
            &[
                key_down(Scancode::F12, Mod::NOMOD),
                key_down(Scancode::P, Mod::NOMOD),
            ],
            &table,
            &mut machine,
        );

        assert!(outcome.screenshot);
        assert!(outcome.toggle_pause);
        assert!(machine.buttons.is_empty());
    }

    #[test]
    fn release_with_modifier_also_releases_bare_binding() {
        // Press d, then press Shift, then release d while Shift is held:
        // Joypad1 A must not stay stuck down.
        let table = BindingTable::build(&[], false);
        let mut machine = Recorder::default();

        feed(
            &[
                key_down(Scancode::D, Mod::NOMOD),
                key_up(Scancode::D, Mod::LSHIFTMOD),
            ],
            &table,
            &mut machine,
        );

        let a = Command::Joypad {
            pad: 1,
            button: JoypadButton::A,
        };
        assert_eq!(machine.buttons.first(), Some(&(a, true)));
        assert!(machine.buttons.contains(&(a, false)));
    }
}
