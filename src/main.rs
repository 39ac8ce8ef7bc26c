use stockview::api::{self, AppState, FormDefaults};
use stockview::config::AppConfig;
use stockview::page::PageRenderer;
use stockview::yahoo::YahooClient;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stockview=info,tower_http=info")),
        )
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting stockview");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        provider = %app_config.provider.base_url,
        "Loaded configuration"
    );

    let provider = YahooClient::new(&app_config.provider)?;
    let app_state = AppState {
        provider: Arc::new(provider),
        pages: Arc::new(PageRenderer::new()?),
        defaults: FormDefaults::new(app_config.default_lookback_days),
    };

    let app = api::router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
