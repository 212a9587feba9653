pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod proxy;

use axum::Router;
use axum::extract::Extension;
use axum::routing::any;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use api::proxy_request;
pub use app_state::AppState;
pub use config::{Config, UpstreamConfig};
pub use error::ProxyError;
pub use proxy::query::{Clause, Direction, PostgrestQuery};
pub use proxy::upstream::SupabaseClient;
pub use proxy::{Action, ProxyRequest, ProxyResponse, QueryProxy};

/// Path the static site calls the function on
pub const FUNCTION_PATH: &str = "/.netlify/functions/supabase-proxy";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(proxy_request))
        .route(FUNCTION_PATH, any(proxy_request))
        // Failures are logged once, by `QueryProxy::handle`
        .layer(TraceLayer::new_for_http().on_failure(()))
        .layer(Extension(state))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    info!(
        upstream = state.proxy.upstream().base_url(),
        allowed_origin = %config.allowed_origin,
        "Upstream configured"
    );

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.listen_on_port);
    info!("Proxy listening on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
