use anyhow::Context;
use imgconv_core::Config;
use imgconv_infra::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    init_telemetry(LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (_state, router) =
        imgconv_api::setup::initialize_app(config.clone()).context("Failed to initialize app")?;

    imgconv_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
