pub mod command;
pub mod machine;
pub mod pattern;

pub mod prelude {
    pub use crate::command::{Command, JoypadButton};
    pub use crate::machine::Machine;
}

/// Native horizontal resolution of the emulated console, in pixels.
pub const NATIVE_WIDTH: usize = 256;

/// Nominal native vertical resolution (the common 224-line output).
pub const NATIVE_HEIGHT: usize = 224;

/// Extended vertical resolution: titles that render into the overscan
/// region produce up to 239 visible lines.
pub const NATIVE_HEIGHT_EXTENDED: usize = 239;
