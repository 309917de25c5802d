/// All events that can reach the tray presenter.
///
/// Sources:
/// - Event-loop timer        → `Tick`
/// - Tray menu / icon clicks → `ShowRequested`, `HideOnMinimizeToggled`, `QuitRequested`
/// - Window state changes    → `Minimized`, `Restored`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// Periodic sampling tick from the event loop.
    Tick,

    /// User asked for the graph window ("Show" menu item or icon double-click).
    ShowRequested,

    /// The graph window was minimized.
    Minimized,

    /// The graph window was restored from the minimized state.
    Restored,

    /// The "Hide on minimize" menu checkbox changed (carries the new value).
    HideOnMinimizeToggled(bool),

    /// User picked "Quit" — tear down the event loop.
    QuitRequested,
}
