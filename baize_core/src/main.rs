use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

#[cfg(test)]
mod tests;

use routes::create_router;
use state::AppStateBuilder;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let state = AppStateBuilder::new().build().await;
    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = std::env::var("BAIZE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("could not bind the listen address");
    tracing::info!(%addr, "baize algorithm service listening");
    axum::serve(listener, app)
        .await
        .expect("server terminated unexpectedly");
}
