//! Yield Vault Backend server

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_backend::services::{now, Deployment, DeploymentSpec};
use vault_backend::types::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vault_backend=info,yield_vault=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());

    info!(port = config.port, "Starting Yield Vault Backend");
    info!(
        cors_origins = ?config.cors_origins,
        api_keys_configured = !config.api_keys.is_empty(),
        deployment_file = ?config.deployment_file,
        "Configuration loaded"
    );
    if config.api_keys.is_empty() {
        warn!("No API keys configured - running in development mode");
    }

    let spec = load_spec(&config).await?;
    let deployment = Deployment::from_spec(&spec, now()).context("building deployment")?;
    info!(
        vaults = spec.vaults.len(),
        admin = %spec.admin,
        executor = %spec.executor,
        timelock = %deployment.timelock.address(),
        distributor = %deployment.distributor.address(),
        "Deployment ready"
    );

    let app = vault_backend::app(config.clone(), deployment);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn load_spec(config: &Config) -> anyhow::Result<DeploymentSpec> {
    let Some(path) = &config.deployment_file else {
        info!("DEPLOYMENT_FILE not set, using the demo deployment");
        return Ok(DeploymentSpec::demo());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
