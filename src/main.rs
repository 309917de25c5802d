//! diskicon — a disk-activity sparkline living in the system tray.
//!
//! Run with:  `RUST_LOG=info diskicon`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("diskicon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = diskicon_config::load(diskicon_config::default_path())?;
    diskicon_tray::run(config).map_err(Into::into)
}
