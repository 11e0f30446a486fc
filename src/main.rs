use std::sync::Arc;

use tracing::{error, info};
use ytrelay::{
    common::{
        banner::{BannerInfo, print_banner},
        logger,
        types::AnyResult,
    },
    configs::Config,
    server::AppState,
    transport::http_server,
};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(config.logging.as_ref());

    let state = Arc::new(AppState::new(config)?);

    let server = &state.config.server;
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| format!("binding to {}:{}: {}", server.host, server.port, e))?;
    let address = listener.local_addr()?;

    let pages = state
        .youtube
        .page_order()
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    print_banner(&BannerInfo::new(
        address.to_string(),
        pages,
        server.password.is_some(),
    ));

    let app = http_server::router(state.clone());
    info!("ytrelay listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {}", e);
    }
    info!("shutdown signal received");
}
