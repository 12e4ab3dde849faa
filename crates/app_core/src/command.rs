//! Command system for user actions

use serde::{Deserialize, Serialize};

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Navigation commands
    pub const NAV_NEXT: &'static str = "nav.next";
    pub const NAV_PREV: &'static str = "nav.prev";
    pub const NAV_GOTO: &'static str = "nav.goto";
    pub const NAV_FIRST: &'static str = "nav.first";
    pub const NAV_LAST: &'static str = "nav.last";

    // Panel commands
    pub const VIEW_TOGGLE_LIST: &'static str = "view.toggle_list";
    pub const VIEW_TOGGLE_GRID: &'static str = "view.toggle_grid";
    pub const VIEW_TOGGLE_SEARCH: &'static str = "view.toggle_search";

    // Pointer commands
    pub const POINTER_CLICK: &'static str = "pointer.click";
    pub const ENTRY_CLICK: &'static str = "entry.click";

    // App commands
    pub const APP_SEARCH: &'static str = "app.search";
    pub const APP_STATUS: &'static str = "app.status";
    pub const APP_QUIT: &'static str = "app.quit";
}

/// Command with optional parameters
#[derive(Debug, Clone)]
pub struct Command {
    pub id: CommandId,
    pub params: CommandParams,
}

/// Command parameters
#[derive(Debug, Clone, Default)]
pub struct CommandParams {
    pub int_values: Vec<i64>,
    pub string_value: Option<String>,
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self {
            id: CommandId::new(id),
            params: CommandParams::default(),
        }
    }

    pub fn with_int(mut self, value: i64) -> Self {
        self.params.int_values.push(value);
        self
    }

    pub fn with_string(mut self, value: &str) -> Self {
        self.params.string_value = Some(value.to_string());
        self
    }

    pub fn is(&self, id: &str) -> bool {
        self.id.as_str() == id
    }

    /// First integer argument
    pub fn int(&self) -> Option<i64> {
        self.params.int_values.first().copied()
    }
}
