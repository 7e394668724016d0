//! Device identifier codec.
//!
//! Input bindings name their source with a compact textual grammar:
//!
//! ```text
//! <Kind><DD>:<Spec>
//! ```
//!
//! | Part   | Meaning                                                        |
//! |--------|----------------------------------------------------------------|
//! | `Kind` | `K` keyboard, `M` mouse/pointer device, `J` joystick           |
//! | `DD`   | exactly two decimal digits: the device index (0-63)            |
//! | `Spec` | optional `+`-separated modifier letters, then a local name     |
//!
//! The local name is an SDL scancode name for keyboards (`d`, `Left`,
//! `Return`, ...), `B<n>` for a mouse or joystick button, `Axis<n>` for a
//! joystick axis, or the literal `Pointer` for a 2-axis pointer device.
//! Modifier letters (`S` Shift, `C` Ctrl, `A` Alt, `M` Meta) are valid for
//! keyboard bindings only. The grammar is case-sensitive except for key
//! names, which SDL matches case-insensitively.
//!
//! Parsing packs everything into a [`DeviceId`], a 32-bit identifier:
//!
//! | Bits  | Field                                                           |
//! |-------|-----------------------------------------------------------------|
//! | 31-30 | device kind: `00` keyboard, `10` mouse, `11` joystick           |
//! | 29-24 | device index                                                    |
//! | 23-16 | keyboard modifier mask (zero for other kinds)                   |
//! | 15-0  | local code; bit 15 = pointer sentinel, bit 14 = axis sentinel   |
//!
//! The same packing is applied to live events at poll time, so a table
//! lookup is a single hash probe.

use std::fmt;

use sdl2::keyboard::{Mod, Scancode};
use thiserror::Error;

// Modifier mask bits (the byte at bits 23-16).
pub const MOD_SHIFT: u32 = 0x0001_0000;
pub const MOD_CTRL: u32 = 0x0002_0000;
pub const MOD_ALT: u32 = 0x0004_0000;
pub const MOD_META: u32 = 0x0008_0000;

const KIND_MASK: u32 = 0xC000_0000;
const KIND_KEYBOARD: u32 = 0x0000_0000;
const KIND_MOUSE: u32 = 0x8000_0000;
const KIND_JOYSTICK: u32 = 0xC000_0000;

const INDEX_SHIFT: u32 = 24;
const INDEX_MASK: u32 = 0x3F00_0000;
const MOD_MASK: u32 = 0x00FF_0000;
const CODE_MASK: u32 = 0x0000_FFFF;

/// Bit 15 of the local code: the 2-axis pointer sentinel.
pub const CODE_POINTER: u16 = 0x8000;
/// Bit 14 of the local code: the joystick axis sentinel.
pub const CODE_AXIS: u16 = 0x4000;

/// Largest button number expressible in the local-code field.
pub const MAX_BUTTON: u32 = 0x3FFF;

/// Largest device index expressible in the 6-bit index field.
pub const MAX_DEVICE_INDEX: u8 = 63;

/// Which class of physical device an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Joystick,
}

/// Packed 32-bit input-source identifier. See the module docs for the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

/// A binding string that does not match the grammar. Carries the offending
/// token; the caller logs it and skips the entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingParseError {
    #[error("binding '{0}' is too short")]
    Truncated(String),
    #[error("unknown device kind '{0}'")]
    UnknownKind(char),
    #[error("bad device index '{0}' (want two decimal digits)")]
    BadIndex(String),
    #[error("missing ':' separator in '{0}'")]
    MissingSeparator(String),
    #[error("unknown modifier code '{0}'")]
    UnknownModifier(char),
    #[error("modifiers are only valid on keyboard bindings: '{0}'")]
    ModifierOnNonKeyboard(String),
    #[error("unknown key name '{0}'")]
    UnknownKeyName(String),
    #[error("bad button/axis number '{0}'")]
    BadNumber(String),
    #[error("unrecognized device spec '{0}'")]
    UnknownSpec(String),
}

impl DeviceId {
    /// Parse a textual binding identifier into its packed form.
    pub fn parse(text: &str) -> Result<(DeviceId, DeviceKind), BindingParseError> {
        let bytes = text.as_bytes();
        if bytes.len() < 5 {
            return Err(BindingParseError::Truncated(text.to_string()));
        }

        let kind = match bytes[0] {
            b'K' => DeviceKind::Keyboard,
            b'M' => DeviceKind::Mouse,
            b'J' => DeviceKind::Joystick,
            c => return Err(BindingParseError::UnknownKind(c as char)),
        };

        if !bytes[1].is_ascii_digit() || !bytes[2].is_ascii_digit() {
            return Err(BindingParseError::BadIndex(text[1..3].to_string()));
        }
        let index = (bytes[1] - b'0') * 10 + (bytes[2] - b'0');
        // The packed field holds 6 bits; masking would silently alias
        // 64-99 onto 0-35.
        if index > MAX_DEVICE_INDEX {
            return Err(BindingParseError::BadIndex(text[1..3].to_string()));
        }

        if bytes[3] != b':' {
            return Err(BindingParseError::MissingSeparator(text.to_string()));
        }

        let (modifiers, name) = split_modifiers(&text[4..])?;
        if modifiers != 0 && kind != DeviceKind::Keyboard {
            return Err(BindingParseError::ModifierOnNonKeyboard(text.to_string()));
        }
        if name.is_empty() {
            return Err(BindingParseError::Truncated(text.to_string()));
        }

        let code = match kind {
            DeviceKind::Keyboard => {
                let scancode = Scancode::from_name(name)
                    .ok_or_else(|| BindingParseError::UnknownKeyName(name.to_string()))?;
                scancode as u16
            }
            DeviceKind::Mouse => parse_mouse_spec(name)?,
            DeviceKind::Joystick => parse_joystick_spec(name)?,
        };

        let packed = kind.tag()
            | (((index as u32) << INDEX_SHIFT) & INDEX_MASK)
            | modifiers
            | code as u32;

        Ok((DeviceId(packed), kind))
    }

    pub fn kind(self) -> DeviceKind {
        match self.0 & KIND_MASK {
            KIND_MOUSE => DeviceKind::Mouse,
            KIND_JOYSTICK => DeviceKind::Joystick,
            _ => DeviceKind::Keyboard,
        }
    }

    pub fn index(self) -> u8 {
        ((self.0 & INDEX_MASK) >> INDEX_SHIFT) as u8
    }

    pub fn modifiers(self) -> u32 {
        self.0 & MOD_MASK
    }

    pub fn code(self) -> u16 {
        (self.0 & CODE_MASK) as u16
    }

    pub fn is_pointer(self) -> bool {
        self.code() & CODE_POINTER != 0
    }

    pub fn is_axis(self) -> bool {
        self.kind() == DeviceKind::Joystick && self.code() & CODE_AXIS != 0
    }

    // Event-side constructors: pack a live platform event the same way the
    // parser packs binding text, so lookups match.

    pub fn keyboard(scancode: Scancode, keymod: Mod) -> DeviceId {
        DeviceId(KIND_KEYBOARD | modifier_bits(keymod) | (scancode as u32 & CODE_MASK))
    }

    pub fn mouse_button(index: u8, button: u8) -> DeviceId {
        DeviceId(KIND_MOUSE | index_bits(index) | button as u32)
    }

    pub fn mouse_pointer(index: u8) -> DeviceId {
        DeviceId(KIND_MOUSE | index_bits(index) | CODE_POINTER as u32)
    }

    pub fn joystick_button(index: u8, button: u8) -> DeviceId {
        DeviceId(KIND_JOYSTICK | index_bits(index) | button as u32)
    }

    pub fn joystick_axis(index: u8, axis: u8) -> DeviceId {
        DeviceId(KIND_JOYSTICK | index_bits(index) | (CODE_AXIS | axis as u16) as u32)
    }

    /// Diagnostic decode back to the textual grammar.
    pub fn describe(self) -> String {
        let kind_letter = match self.kind() {
            DeviceKind::Keyboard => 'K',
            DeviceKind::Mouse => 'M',
            DeviceKind::Joystick => 'J',
        };

        let mut mods = String::new();
        for (bit, letter) in [
            (MOD_SHIFT, 'S'),
            (MOD_CTRL, 'C'),
            (MOD_ALT, 'A'),
            (MOD_META, 'M'),
        ] {
            if self.0 & bit != 0 {
                mods.push(letter);
                mods.push('+');
            }
        }

        let code = self.code();
        let name = if code & CODE_POINTER != 0 {
            let n = code & !CODE_POINTER;
            if n == 0 {
                "Pointer".to_string()
            } else {
                format!("Pointer{n}")
            }
        } else if self.kind() == DeviceKind::Keyboard {
            Scancode::from_i32(code as i32)
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| format!("#{code}"))
        } else if self.kind() == DeviceKind::Joystick && code & CODE_AXIS != 0 {
            format!("Axis{}", code & !CODE_AXIS)
        } else {
            format!("B{code}")
        };

        format!("{kind_letter}{:02}:{mods}{name}", self.index())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl DeviceKind {
    fn tag(self) -> u32 {
        match self {
            DeviceKind::Keyboard => KIND_KEYBOARD,
            DeviceKind::Mouse => KIND_MOUSE,
            DeviceKind::Joystick => KIND_JOYSTICK,
        }
    }
}

fn index_bits(index: u8) -> u32 {
    ((index as u32) << INDEX_SHIFT) & INDEX_MASK
}

/// Fold the SDL modifier state into the packed modifier byte. Left and
/// right variants collapse onto one bit each.
pub fn modifier_bits(keymod: Mod) -> u32 {
    let mut bits = 0;
    if keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD) {
        bits |= MOD_SHIFT;
    }
    if keymod.intersects(Mod::LCTRLMOD | Mod::RCTRLMOD) {
        bits |= MOD_CTRL;
    }
    if keymod.intersects(Mod::LALTMOD | Mod::RALTMOD) {
        bits |= MOD_ALT;
    }
    if keymod.intersects(Mod::LGUIMOD | Mod::RGUIMOD) {
        bits |= MOD_META;
    }
    bits
}

/// Strip a `+`-separated single-letter modifier prefix off a spec. A segment
/// that is not a lone `S`/`C`/`A`/`M` ends the prefix, so key names that
/// themselves contain `+` (e.g. `Keypad +`) still parse.
fn split_modifiers(spec: &str) -> Result<(u32, &str), BindingParseError> {
    let mut modifiers = 0;
    let mut rest = spec;

    while let Some((head, tail)) = rest.split_once('+') {
        if head.len() != 1 || tail.is_empty() {
            break;
        }
        modifiers |= match head.as_bytes()[0] {
            b'S' => MOD_SHIFT,
            b'C' => MOD_CTRL,
            b'A' => MOD_ALT,
            b'M' => MOD_META,
            _ => break,
        };
        rest = tail;
    }

    Ok((modifiers, rest))
}

/// Mouse spec: `Pointer` (optional pointer number suffix) or `B<n>`.
fn parse_mouse_spec(name: &str) -> Result<u16, BindingParseError> {
    if let Some(suffix) = name.strip_prefix("Pointer") {
        let n = if suffix.is_empty() {
            0
        } else {
            parse_code_number(suffix)?
        };
        // Bit 15 is the sentinel itself; a larger number would collapse
        // onto the bare `Pointer` id.
        if n as u32 > 0x7FFF {
            return Err(BindingParseError::BadNumber(suffix.to_string()));
        }
        return Ok(CODE_POINTER | n);
    }
    if let Some(digits) = name.strip_prefix('B') {
        let n = parse_code_number(digits)?;
        if n as u32 > 0x7FFF {
            return Err(BindingParseError::BadNumber(digits.to_string()));
        }
        return Ok(n);
    }
    Err(BindingParseError::UnknownSpec(name.to_string()))
}

/// Joystick spec: `B<n>` or `Axis<n>`.
fn parse_joystick_spec(name: &str) -> Result<u16, BindingParseError> {
    if let Some(digits) = name.strip_prefix("Axis") {
        let n = parse_code_number(digits)?;
        if n as u32 > MAX_BUTTON {
            return Err(BindingParseError::BadNumber(digits.to_string()));
        }
        return Ok(CODE_AXIS | n);
    }
    if let Some(digits) = name.strip_prefix('B') {
        let n = parse_code_number(digits)?;
        if n as u32 > MAX_BUTTON {
            return Err(BindingParseError::BadNumber(digits.to_string()));
        }
        return Ok(n);
    }
    Err(BindingParseError::UnknownSpec(name.to_string()))
}

fn parse_code_number(digits: &str) -> Result<u16, BindingParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BindingParseError::BadNumber(digits.to_string()));
    }
    digits
        .parse::<u16>()
        .map_err(|_| BindingParseError::BadNumber(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_with_shift_modifier() {
        // "K00:S+d": keyboard 0, Shift, key 'd'.
        let (id, kind) = DeviceId::parse("K00:S+d").unwrap();
        assert_eq!(kind, DeviceKind::Keyboard);
        assert_eq!(id.kind(), DeviceKind::Keyboard);
        assert_eq!(id.index(), 0);
        assert_eq!(id.modifiers(), MOD_SHIFT);
        assert_eq!(id.code(), Scancode::D as u16);
    }

    #[test]
    fn keyboard_all_modifiers() {
        let (id, _) = DeviceId::parse("K02:S+C+A+M+Return").unwrap();
        assert_eq!(id.index(), 2);
        assert_eq!(id.modifiers(), MOD_SHIFT | MOD_CTRL | MOD_ALT | MOD_META);
        assert_eq!(id.code(), Scancode::Return as u16);
    }

    #[test]
    fn mouse_pointer_and_buttons() {
        let (id, kind) = DeviceId::parse("M00:Pointer").unwrap();
        assert_eq!(kind, DeviceKind::Mouse);
        assert!(id.is_pointer());
        assert_eq!(id.code(), CODE_POINTER);

        let (id, _) = DeviceId::parse("M00:B3").unwrap();
        assert!(!id.is_pointer());
        assert_eq!(id.code(), 3);

        // Optional pointer number suffix.
        let (id, _) = DeviceId::parse("M01:Pointer2").unwrap();
        assert_eq!(id.index(), 1);
        assert_eq!(id.code(), CODE_POINTER | 2);
    }

    #[test]
    fn joystick_buttons_and_axes() {
        let (id, kind) = DeviceId::parse("J00:B3").unwrap();
        assert_eq!(kind, DeviceKind::Joystick);
        assert_eq!(id.kind(), DeviceKind::Joystick);
        assert_eq!(id.code(), 3);

        let (id, _) = DeviceId::parse("J01:Axis2").unwrap();
        assert!(id.is_axis());
        assert_eq!(id.index(), 1);
        assert_eq!(id.code(), CODE_AXIS | 2);
    }

    #[test]
    fn event_constructors_match_parsed_text() {
        let (parsed, _) = DeviceId::parse("K00:S+d").unwrap();
        assert_eq!(DeviceId::keyboard(Scancode::D, Mod::LSHIFTMOD), parsed);

        let (parsed, _) = DeviceId::parse("M00:B1").unwrap();
        assert_eq!(DeviceId::mouse_button(0, 1), parsed);

        let (parsed, _) = DeviceId::parse("M00:Pointer").unwrap();
        assert_eq!(DeviceId::mouse_pointer(0), parsed);

        let (parsed, _) = DeviceId::parse("J03:B7").unwrap();
        assert_eq!(DeviceId::joystick_button(3, 7), parsed);

        let (parsed, _) = DeviceId::parse("J00:Axis1").unwrap();
        assert_eq!(DeviceId::joystick_axis(0, 1), parsed);
    }

    #[test]
    fn parse_is_deterministic() {
        let (a, _) = DeviceId::parse("K00:S+d").unwrap();
        let (b, _) = DeviceId::parse("K00:S+d").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn describe_round_trips() {
        for text in ["K00:S+D", "M00:Pointer", "M00:B3", "J01:Axis2", "J00:B0"] {
            let (id, _) = DeviceId::parse(text).unwrap();
            let (again, _) = DeviceId::parse(&id.describe()).unwrap();
            assert_eq!(id, again, "describe() of {text} did not round-trip");
        }
    }

    #[test]
    fn malformed_bindings_are_rejected() {
        assert!(DeviceId::parse("K0:d").is_err());
        assert!(matches!(
            DeviceId::parse("X00:d"),
            Err(BindingParseError::UnknownKind('X'))
        ));
        assert!(matches!(
            DeviceId::parse("K0a:d"),
            Err(BindingParseError::BadIndex(_))
        ));
        assert!(matches!(
            DeviceId::parse("K00 d"),
            Err(BindingParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            DeviceId::parse("K00:NotAKey"),
            Err(BindingParseError::UnknownKeyName(_))
        ));
        assert!(matches!(
            DeviceId::parse("M00:B99x"),
            Err(BindingParseError::BadNumber(_))
        ));
        assert!(matches!(
            DeviceId::parse("M00:Wheel"),
            Err(BindingParseError::UnknownSpec(_))
        ));
        assert!(matches!(
            DeviceId::parse("K00:"),
            Err(BindingParseError::Truncated(_))
        ));
        // Modifiers are a keyboard-only concept.
        assert!(matches!(
            DeviceId::parse("M00:S+B1"),
            Err(BindingParseError::ModifierOnNonKeyboard(_))
        ));
    }

    #[test]
    fn button_numbers_out_of_range() {
        // Mouse buttons are bounded by 0x7fff, joystick codes by the
        // axis/pointer sentinel space.
        assert!(DeviceId::parse("M00:B32767").is_ok());
        assert!(DeviceId::parse("M00:B32768").is_err());
        assert!(DeviceId::parse("J00:B16383").is_ok());
        assert!(DeviceId::parse("J00:B16384").is_err());
        assert!(DeviceId::parse("M00:B123456").is_err());
    }

    #[test]
    fn device_index_out_of_range_is_rejected() {
        // Two digits allow 0-99 textually, but the packed field is 6 bits;
        // "K64:d" must not alias "K00:d".
        assert!(DeviceId::parse("K63:d").is_ok());
        for text in ["K64:d", "K99:d", "M64:B1", "J64:B0"] {
            assert!(
                matches!(DeviceId::parse(text), Err(BindingParseError::BadIndex(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn pointer_suffix_out_of_range_is_rejected() {
        // A suffix with bit 15 set would collapse onto the bare sentinel.
        assert!(DeviceId::parse("M00:Pointer32767").is_ok());
        assert!(matches!(
            DeviceId::parse("M00:Pointer32768"),
            Err(BindingParseError::BadNumber(_))
        ));
    }

    #[test]
    fn key_name_containing_plus_still_parses() {
        if let Ok((id, _)) = DeviceId::parse("K00:Keypad +") {
            assert_eq!(id.modifiers(), 0);
            assert_eq!(id.code(), Scancode::KpPlus as u16);
        }
    }
}
