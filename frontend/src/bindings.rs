//! Binding table: packed device identifier → logical command.
//!
//! Built once at configuration time from an ordered list of
//! (identifier-text, command-text) pairs. Entries are resolved through the
//! codec at build time; a malformed entry is logged and skipped, never
//! fatal. Later entries for the same parsed identifier overwrite earlier
//! ones, so caller-supplied bindings appended after the defaults win.

use std::collections::HashMap;

use chroma_core::command::Command;

use crate::device_id::DeviceId;

/// Immutable identifier → command mapping, queried on every input event.
pub struct BindingTable {
    map: HashMap<DeviceId, Command>,
}

impl BindingTable {
    /// Build the table. Unless `suppress_defaults` is set, the built-in
    /// default layout is inserted first so `entries` can override it.
    pub fn build(entries: &[(String, String)], suppress_defaults: bool) -> BindingTable {
        let mut map = HashMap::new();

        if !suppress_defaults {
            for &(id_text, command_text) in DEFAULT_BINDINGS {
                insert_entry(&mut map, id_text, command_text);
            }
        }

        for (id_text, command_text) in entries {
            insert_entry(&mut map, id_text, command_text);
        }

        BindingTable { map }
    }

    /// O(1) lookup. `None` means the event is not bound; callers ignore it.
    pub fn lookup(&self, id: DeviceId) -> Option<&Command> {
        self.map.get(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn insert_entry(map: &mut HashMap<DeviceId, Command>, id_text: &str, command_text: &str) {
    let id = match DeviceId::parse(id_text) {
        Ok((id, _kind)) => id,
        Err(e) => {
            log::warn!("skipping binding '{id_text}': {e}");
            return;
        }
    };

    let command = match Command::parse(command_text) {
        Ok(command) => command,
        Err(e) => {
            log::warn!("skipping binding '{id_text}': {e}");
            return;
        }
    };

    map.insert(id, command);
}

/// Built-in default layout: pad 1 on the arrow/letter cluster, pad 2 on
/// WASD, save-state and turbo meta-commands, and the mouse pointer.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("K00:Right", "Joypad1 Right"),
    ("K00:Left", "Joypad1 Left"),
    ("K00:Down", "Joypad1 Down"),
    ("K00:Up", "Joypad1 Up"),
    ("K00:Return", "Joypad1 Start"),
    ("K00:Space", "Joypad1 Select"),
    ("K00:d", "Joypad1 A"),
    ("K00:c", "Joypad1 B"),
    ("K00:s", "Joypad1 X"),
    ("K00:x", "Joypad1 Y"),
    ("K00:a", "Joypad1 L"),
    ("K00:z", "Joypad1 R"),
    //
    ("K00:l", "Joypad2 Right"),
    ("K00:j", "Joypad2 Left"),
    ("K00:k", "Joypad2 Down"),
    ("K00:i", "Joypad2 Up"),
    ("K00:Tab", "Joypad2 Start"),
    ("K00:`", "Joypad2 Select"),
    ("K00:g", "Joypad2 A"),
    ("K00:b", "Joypad2 B"),
    ("K00:f", "Joypad2 X"),
    ("K00:v", "Joypad2 Y"),
    //
    ("K00:S+d", "ToggleTurbo A"),
    ("K00:S+c", "ToggleTurbo B"),
    ("K00:F1", "SaveSlot 1"),
    ("K00:F2", "SaveSlot 2"),
    ("K00:F3", "SaveSlot 3"),
    ("K00:S+F1", "LoadSlot 1"),
    ("K00:S+F2", "LoadSlot 2"),
    ("K00:S+F3", "LoadSlot 3"),
    ("K00:F12", "Screenshot"),
    ("K00:p", "Pause"),
    ("K00:S+r", "Reset"),
    //
    ("M00:Pointer", "Pointer"),
    ("M00:B1", "Joypad1 A"),
    ("M00:B3", "Joypad1 B"),
    //
    ("J00:B0", "Joypad1 A"),
    ("J00:B1", "Joypad1 B"),
    ("J00:B2", "Joypad1 X"),
    ("J00:B3", "Joypad1 Y"),
];

#[cfg(test)]
mod tests {
    use chroma_core::command::JoypadButton;

    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|&(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_all_well_formed() {
        let table = BindingTable::build(&[], false);
        // Every default entry parses; duplicates collapse (M00:B1 etc. are
        // unique ids, but some commands repeat).
        let unique_ids: std::collections::HashSet<_> = DEFAULT_BINDINGS
            .iter()
            .map(|&(id, _)| DeviceId::parse(id).unwrap().0)
            .collect();
        assert_eq!(table.len(), unique_ids.len());
    }

    #[test]
    fn suppress_defaults_yields_only_caller_entries() {
        let table = BindingTable::build(&entries(&[("K00:q", "Joypad1 A")]), true);
        assert_eq!(table.len(), 1);

        let table = BindingTable::build(&[], true);
        assert!(table.is_empty());
    }

    #[test]
    fn caller_entries_override_defaults() {
        let table = BindingTable::build(&entries(&[("K00:d", "Joypad2 B")]), false);
        let (id, _) = DeviceId::parse("K00:d").unwrap();
        assert_eq!(
            table.lookup(id),
            Some(&Command::Joypad {
                pad: 2,
                button: JoypadButton::B
            })
        );
    }

    #[test]
    fn last_writer_wins_within_caller_entries() {
        let table = BindingTable::build(
            &entries(&[("K00:q", "Joypad1 A"), ("K00:q", "Joypad1 B")]),
            true,
        );
        let (id, _) = DeviceId::parse("K00:q").unwrap();
        assert_eq!(
            table.lookup(id),
            Some(&Command::Joypad {
                pad: 1,
                button: JoypadButton::B
            })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let table = BindingTable::build(
            &entries(&[
                ("K00:NotAKey", "Joypad1 A"),
                ("garbage", "Joypad1 B"),
                ("K00:q", "NotACommand"),
                ("K00:w", "Joypad1 Y"),
            ]),
            true,
        );
        assert_eq!(table.len(), 1);
        let (id, _) = DeviceId::parse("K00:w").unwrap();
        assert_eq!(
            table.lookup(id),
            Some(&Command::Joypad {
                pad: 1,
                button: JoypadButton::Y
            })
        );
    }

    #[test]
    fn unbound_lookup_is_none() {
        let table = BindingTable::build(&[], false);
        let (id, _) = DeviceId::parse("J05:B13").unwrap();
        assert_eq!(table.lookup(id), None);
    }

    #[test]
    fn turbo_scenario_binding() {
        // "K00:S+d" bound to "ToggleTurbo A" resolves through the table.
        let table = BindingTable::build(&[], false);
        let (id, _) = DeviceId::parse("K00:S+d").unwrap();
        assert_eq!(table.lookup(id), Some(&Command::ToggleTurbo(JoypadButton::A)));
    }
}
