use crate::AppState;
use crate::proxy::{ProxyRequest, ProxyResponse};
use axum::extract::{Extension, Query};
use axum::http::Method;

/// Single entry point for every action; the query string carries the action and filters
pub async fn proxy_request(
    Extension(state): Extension<AppState>,
    method: Method,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ProxyResponse {
    let request = ProxyRequest::from_pairs(pairs);
    state.proxy.handle(&method, &request).await
}
