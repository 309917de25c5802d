use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure parsed from `diskicon.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How often the disk counter is polled (milliseconds).
    pub tick_interval_ms: u64,
    /// How much time must elapse between graph samples (milliseconds).
    /// Every firing pushes the fast average's mean onto the graph history
    /// and redraws the icon.
    pub graph_interval_ms: u64,
    /// Show the graph window at launch instead of starting tray-only.
    pub start_visible: bool,
    /// Minimizing the window hides it instead of leaving a taskbar entry.
    /// This seeds the checkable menu item; the menu state wins afterwards.
    pub hide_on_minimize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms:  100,
            graph_interval_ms: 1_000,
            start_visible:     false,
            hide_on_minimize:  true,
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        // A zero interval would spin the event loop; floor it at 10ms.
        Duration::from_millis(self.tick_interval_ms.max(10))
    }

    pub fn graph_interval(&self) -> Duration {
        Duration::from_millis(self.graph_interval_ms.max(100))
    }
}
