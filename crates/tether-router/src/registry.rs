//! The handler registry: path → command lookup table.
//!
//! Built once at startup and then only read, so the router can share it
//! across connections without locking. Each entry is either an enabled
//! [`Command`] (the router knows its decode/invoke/encode shape) or an
//! explicit [`Route::Disabled`] marker.

use std::collections::HashMap;

use crate::Command;

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Dispatch to the command's handler.
    Enabled(Command),
    /// Known path that answers "operation not supported".
    Disabled(Command),
}

/// Read-only lookup table from wire path to [`Route`].
#[derive(Debug, Clone)]
pub struct Registry {
    routes: HashMap<&'static str, Route>,
}

impl Registry {
    /// An empty registry: every path is unsupported.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// The full command table, with uploads disabled.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for command in Command::ALL {
            registry.register(command);
            if command.disabled_by_default() {
                registry.disable(command.path());
            }
        }
        registry
    }

    /// Adds or re-enables `command`.
    pub fn register(&mut self, command: Command) -> &mut Self {
        self.routes.insert(command.path(), Route::Enabled(command));
        self
    }

    /// Switches off the command at `path`. Unknown paths are ignored.
    pub fn disable(&mut self, path: &str) -> &mut Self {
        if let Some(route) = self.routes.get_mut(path) {
            if let Route::Enabled(command) = *route {
                *route = Route::Disabled(command);
                tracing::debug!(path, "command disabled");
            }
        }
        self
    }

    /// Resolves a wire path by exact match.
    pub fn resolve(&self, path: &str) -> Option<Route> {
        self.routes.get(path).copied()
    }

    /// Number of registered paths, enabled or not.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
