use anyhow::Context;
use dotenvy::dotenv;
use log::info;
use std::path::PathBuf;

use chantierserver::core::config::AppConfig;
use chantierserver::main_module::{create_app_state, init_logging, run_axum_server};

fn config_path() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config expects a file path")?;
                return Ok(Some(PathBuf::from(path)));
            }
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    return Ok(Some(PathBuf::from(path)));
                }
                anyhow::bail!("Unknown argument: {other}");
            }
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let path = config_path()?;
    let config = AppConfig::load(path.as_deref())?;
    info!(
        "Starting chantierserver {} ({:?} backend)",
        env!("CARGO_PKG_VERSION"),
        config.storage.backend
    );

    let server = config.server.clone();
    let app_state = tokio::task::spawn_blocking(move || create_app_state(config))
        .await
        .context("Start-up task failed")??;

    run_axum_server(app_state, &server).await?;
    info!("Server stopped");
    Ok(())
}
