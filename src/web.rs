use review_sheet::app;
use review_sheet::config::AppConfig;

/// Main entry point for the review web application
///
/// Reads its settings from the environment (see `review_sheet::config`)
/// and serves the upload, grid and export pages until interrupted.
///
/// # Environment
/// * `REVIEW_SHEET_ADDR` - Bind address, default `127.0.0.1:3000`
/// * `REVIEW_SHEET_MODE` - `finalize` or `reconcile`
/// * `RUST_LOG` - Log filter, default `info`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    app::run(config).await
}
