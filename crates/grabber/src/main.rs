//! Frame Grabber - Main Entry Point

use grabber::{init_logging, run, Settings, DEFAULT_SETTINGS_PATH};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load(&path)?;
    init_logging(&settings)?;

    info!("=== Frame Grabber v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Settings loaded from {} (if present)", path);

    run(settings).await?;

    Ok(())
}
