use crate::config::Config;
use crate::proxy::QueryProxy;
use crate::proxy::upstream::SupabaseClient;
use axum::http::HeaderValue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<QueryProxy>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let upstream = config
            .to_upstream_config()
            .ok_or_else(|| anyhow::anyhow!("Supabase URL and service role key are required"))?;
        let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
            .map_err(|error| anyhow::anyhow!("Invalid allowed origin: {error}"))?;

        let proxy = QueryProxy::new(SupabaseClient::new(upstream), allowed_origin);
        Ok(Self {
            proxy: Arc::new(proxy),
        })
    }
}
