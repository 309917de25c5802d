use diskicon_core::Result;
use diskicon_graph::Canvas;

/// Operations the presenter needs from the platform tray/window toolkit.
///
/// `Icon` is the platform's native icon resource. Dropping a handle releases
/// the resource; the presenter keeps exactly one live handle and drops the
/// previous one only after its replacement has been installed.
pub trait TraySurface {
    type Icon;

    /// Convert a finished canvas into a fresh native icon resource.
    fn create_icon(&mut self, canvas: &Canvas) -> Result<Self::Icon>;

    /// Install an icon on the tray surface.
    fn install_icon(&mut self, icon: &Self::Icon) -> Result<()>;

    /// Update the tray hover text.
    fn set_tooltip(&mut self, text: &str) -> Result<()>;

    /// Show or hide the graph window. Showing also restores a minimized
    /// window and brings it to the front.
    fn set_window_visible(&mut self, visible: bool);

    /// Paint the canvas over the window's client area.
    fn paint_window(&mut self, canvas: &Canvas) -> Result<()>;
}
