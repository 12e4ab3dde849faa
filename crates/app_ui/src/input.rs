//! Input handling and keybinding resolution

use app_core::Command;
use std::collections::HashMap;

/// Maps input tokens to commands
pub struct Keymap {
    /// Key bindings: key token -> command ID
    bindings: HashMap<String, String>,
}

impl Keymap {
    pub fn new(bindings: &HashMap<String, Vec<String>>) -> Self {
        // Invert the bindings map: command -> keys becomes key -> command
        let mut key_to_command = HashMap::new();

        for (command, keys) in bindings {
            for key in keys {
                key_to_command.insert(key.to_lowercase(), command.clone());
            }
        }

        Self {
            bindings: key_to_command,
        }
    }

    /// Resolve one input line.
    ///
    /// The first token selects the command. Integer tokens after it become
    /// int parameters and the remaining text the string parameter.
    pub fn resolve(&self, line: &str) -> Option<Command> {
        let line = line.trim();
        let (key, rest) = match line.split_once(char::is_whitespace) {
            Some((key, rest)) => (key, rest.trim()),
            None => (line, ""),
        };
        if key.is_empty() {
            return None;
        }

        let Some(id) = self.bindings.get(&key.to_lowercase()) else {
            tracing::debug!(key, "unbound key");
            return None;
        };

        let mut command = Command::new(id);
        for value in rest.split_whitespace().filter_map(|token| token.parse::<i64>().ok()) {
            command = command.with_int(value);
        }
        if !rest.is_empty() {
            command = command.with_string(rest);
        }
        tracing::trace!(key, command = id.as_str(), "key resolved");
        Some(command)
    }

    /// Keys bound to a command, sorted
    pub fn keys_for(&self, command: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .bindings
            .iter()
            .filter(|(_, id)| id.as_str() == command)
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{AppConfig, CommandId};

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::new(&AppConfig::default().keybindings);

        assert!(keymap.resolve("n").unwrap().is(CommandId::NAV_NEXT));
        assert!(keymap.resolve("LEFT").unwrap().is(CommandId::NAV_NEXT));
        assert!(keymap.resolve("right").unwrap().is(CommandId::NAV_PREV));
        assert!(keymap.resolve("  ").is_none());
        assert!(keymap.resolve("xyzzy").is_none());
        assert_eq!(keymap.keys_for(CommandId::APP_QUIT), vec!["q", "quit"]);
    }

    #[test]
    fn test_parameters() {
        let keymap = Keymap::new(&AppConfig::default().keybindings);

        let goto = keymap.resolve("g 12").unwrap();
        assert!(goto.is(CommandId::NAV_GOTO));
        assert_eq!(goto.int(), Some(12));

        let click = keymap.resolve("click 100 800").unwrap();
        assert_eq!(click.params.int_values, vec![100, 800]);

        let search = keymap.resolve("search map of edo theme=map").unwrap();
        assert!(search.is(CommandId::APP_SEARCH));
        assert_eq!(search.params.string_value.as_deref(), Some("map of edo theme=map"));
        assert!(search.int().is_none());
    }
}
