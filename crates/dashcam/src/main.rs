//! DashCam Pipeline - Main Entry Point

use dashcam::{init_logging, load_config, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== DashCam Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    run(config).await
}
