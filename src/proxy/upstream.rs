use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::proxy::query::PostgrestQuery;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value as JsonValue;
use tracing::debug;

const REST_PATH: &str = "rest/v1";

/// Client for the hosted PostgREST endpoint, authenticated with the service key
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, query: &PostgrestQuery) -> String {
        format!(
            "{}/{REST_PATH}/{}{}",
            self.base_url,
            query.table_name(),
            query.render()
        )
    }

    /// Run a read query, returning the rows exactly as the upstream sent them
    pub async fn fetch(&self, query: &PostgrestQuery) -> Result<JsonValue, ProxyError> {
        let url = self.url_for(query);
        debug!(%url, "Querying upstream");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.service_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            debug!(%status, table = query.table_name(), "Upstream returned non-success status");
            return Err(ProxyError::Upstream { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Run a read query that is expected to return a list of rows
    pub async fn fetch_rows(&self, query: &PostgrestQuery) -> Result<Vec<JsonValue>, ProxyError> {
        let value = self.fetch(query).await?;
        Ok(serde_json::from_value(value)?)
    }
}
