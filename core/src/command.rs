//! Logical command vocabulary.
//!
//! A [`Command`] is what an input binding resolves to: a virtual joypad
//! button, the pointer source, or a meta-command (save state, turbo toggle,
//! screenshot, ...). Commands are parsed once at configuration time from
//! their textual names (e.g. `"Joypad1 Right"`, `"ToggleTurbo A"`).

use std::fmt;

use thiserror::Error;

/// One button on a virtual joypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoypadButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    X,
    Y,
    L,
    R,
    Start,
    Select,
}

impl JoypadButton {
    pub fn name(self) -> &'static str {
        match self {
            JoypadButton::Up => "Up",
            JoypadButton::Down => "Down",
            JoypadButton::Left => "Left",
            JoypadButton::Right => "Right",
            JoypadButton::A => "A",
            JoypadButton::B => "B",
            JoypadButton::X => "X",
            JoypadButton::Y => "Y",
            JoypadButton::L => "L",
            JoypadButton::R => "R",
            JoypadButton::Start => "Start",
            JoypadButton::Select => "Select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Up" => JoypadButton::Up,
            "Down" => JoypadButton::Down,
            "Left" => JoypadButton::Left,
            "Right" => JoypadButton::Right,
            "A" => JoypadButton::A,
            "B" => JoypadButton::B,
            "X" => JoypadButton::X,
            "Y" => JoypadButton::Y,
            "L" => JoypadButton::L,
            "R" => JoypadButton::R,
            "Start" => JoypadButton::Start,
            "Select" => JoypadButton::Select,
            _ => return None,
        })
    }
}

/// Number of save-state slots addressable from a binding.
pub const SAVE_SLOTS: u8 = 9;

/// A logical emulator command that an input source can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Press/release one button on virtual joypad `pad` (1-based).
    Joypad { pad: u8, button: JoypadButton },
    /// The 2-axis pointer source (mouse/lightgun style input).
    Pointer,
    /// Toggle auto-fire for one joypad-1 button.
    ToggleTurbo(JoypadButton),
    /// Save emulator state to slot `n` (0..SAVE_SLOTS).
    SaveSlot(u8),
    /// Load emulator state from slot `n`.
    LoadSlot(u8),
    /// Capture the current display surface to a PNG (handled by the frontend).
    Screenshot,
    /// Toggle emulation pause (handled by the frontend).
    Pause,
    /// Soft-reset the machine.
    Reset,
}

/// Command name that matched no known command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized command name '{0}'")]
pub struct UnknownCommand(pub String);

impl Command {
    /// Parse a textual command name from a binding entry.
    ///
    /// Recognized forms: `Joypad<N> <Button>` (N = 1..=8), `Pointer`,
    /// `ToggleTurbo <Button>`, `SaveSlot <n>`, `LoadSlot <n>`,
    /// `Screenshot`, `Pause`, `Reset`.
    pub fn parse(text: &str) -> Result<Command, UnknownCommand> {
        let unknown = || UnknownCommand(text.to_string());

        match text {
            "Pointer" => return Ok(Command::Pointer),
            "Screenshot" => return Ok(Command::Screenshot),
            "Pause" => return Ok(Command::Pause),
            "Reset" => return Ok(Command::Reset),
            _ => {}
        }

        let (head, arg) = text.split_once(' ').ok_or_else(unknown)?;

        if let Some(pad_digits) = head.strip_prefix("Joypad") {
            let pad: u8 = pad_digits.parse().map_err(|_| unknown())?;
            if !(1..=8).contains(&pad) {
                return Err(unknown());
            }
            let button = JoypadButton::from_name(arg).ok_or_else(unknown)?;
            return Ok(Command::Joypad { pad, button });
        }

        match head {
            "ToggleTurbo" => {
                let button = JoypadButton::from_name(arg).ok_or_else(unknown)?;
                Ok(Command::ToggleTurbo(button))
            }
            "SaveSlot" | "LoadSlot" => {
                let slot: u8 = arg.parse().map_err(|_| unknown())?;
                if slot >= SAVE_SLOTS {
                    return Err(unknown());
                }
                if head == "SaveSlot" {
                    Ok(Command::SaveSlot(slot))
                } else {
                    Ok(Command::LoadSlot(slot))
                }
            }
            _ => Err(unknown()),
        }
    }

    /// True for commands the frontend acts on itself rather than
    /// forwarding to the machine.
    pub fn is_frontend(&self) -> bool {
        matches!(self, Command::Screenshot | Command::Pause)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Joypad { pad, button } => write!(f, "Joypad{pad} {}", button.name()),
            Command::Pointer => write!(f, "Pointer"),
            Command::ToggleTurbo(button) => write!(f, "ToggleTurbo {}", button.name()),
            Command::SaveSlot(slot) => write!(f, "SaveSlot {slot}"),
            Command::LoadSlot(slot) => write!(f, "LoadSlot {slot}"),
            Command::Screenshot => write!(f, "Screenshot"),
            Command::Pause => write!(f, "Pause"),
            Command::Reset => write!(f, "Reset"),
        }
    }
}
