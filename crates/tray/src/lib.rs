//! Tray presenter and platform adapter for `diskicon`.
//!
//! Owns the event loop and wires together the sampling pipeline:
//! - periodic tick → disk counter sample → fast moving average
//! - elapsed-time gate → graph history push → icon redraw
//! - tray menu / window events → visibility state machine

pub mod gate;
pub mod platform;
pub mod presenter;
pub mod surface;

pub use gate::RedrawGate;
pub use presenter::{Presenter, Visibility};
pub use surface::TraySurface;

use diskicon_config::Config;
use diskicon_core::Result;

/// Start the tray utility. Blocks on the event loop until the user quits.
pub fn run(config: Config) -> Result<()> {
    platform::run(config)
}
