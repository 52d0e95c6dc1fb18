//! Open application windows visible to the coordinator.
//!
//! The registry is owned by the embedder; the coordinator only reads window
//! URLs and invokes focus/open/claim. A window may be removed between a
//! snapshot and the action taken on it, so actions on a missing window
//! return `NotFound` and callers swallow it.

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use queenclaw_common::{OptionExt, Result};
use url::Url;

/// Unique identifier for a window client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An open application window.
#[derive(Debug, Clone)]
pub struct WindowClient {
    /// Window ID.
    pub id: ClientId,

    /// Current URL.
    pub url: Url,

    /// Whether focused.
    pub focused: bool,

    /// Whether controlled by the active coordinator.
    pub controlled: bool,
}

/// Registry of open windows.
#[derive(Debug, Default)]
pub struct WindowClients {
    windows: HashMap<ClientId, WindowClient>,
}

impl WindowClients {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window the embedder opened.
    pub fn register(&mut self, url: Url) -> ClientId {
        let id = ClientId::next();
        self.windows.insert(
            id,
            WindowClient {
                id,
                url,
                focused: false,
                controlled: false,
            },
        );
        id
    }

    /// Remove a window that closed.
    pub fn remove(&mut self, id: ClientId) -> Option<WindowClient> {
        self.windows.remove(&id)
    }

    /// Point-in-time view of all open windows.
    pub fn snapshot(&self) -> Vec<WindowClient> {
        self.windows.values().cloned().collect()
    }

    /// Get a window by ID.
    pub fn get(&self, id: ClientId) -> Option<&WindowClient> {
        self.windows.get(&id)
    }

    /// Focus a window.
    pub fn focus(&mut self, id: ClientId) -> Result<()> {
        let window = self
            .windows
            .get_mut(&id)
            .ok_or_not_found(format!("window {id:?}"))?;
        window.focused = true;

        for (other, win) in self.windows.iter_mut() {
            if *other != id {
                win.focused = false;
            }
        }
        Ok(())
    }

    /// Open a new window at the given URL.
    ///
    /// The new window starts focused and controlled.
    pub fn open_window(&mut self, url: Url) -> WindowClient {
        for win in self.windows.values_mut() {
            win.focused = false;
        }

        let id = ClientId::next();
        let window = WindowClient {
            id,
            url,
            focused: true,
            controlled: true,
        };
        self.windows.insert(id, window.clone());
        window
    }

    /// Take control of every open window, returning how many were claimed.
    pub fn claim(&mut self) -> usize {
        let mut claimed = 0;
        for win in self.windows.values_mut() {
            if !win.controlled {
                win.controlled = true;
                claimed += 1;
            }
        }
        claimed
    }

    /// Number of open windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no windows are open.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
