use siphon_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    siphon_observability::init();

    let config = Config::from_env();
    let app = siphon_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
