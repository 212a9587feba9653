pub mod flatten;
pub mod query;
pub mod upstream;

use crate::error::ProxyError;
use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, Method, Response, StatusCode};
use axum::response::IntoResponse;
use flatten::unique_column_values;
use query::{Direction, PostgrestQuery};
use serde_json::{Value as JsonValue, json};
use std::str::FromStr;
use tracing::{debug, error};
use upstream::SupabaseClient;

pub const VIDEOS_TABLE: &str = "videos";
pub const ALLOWED_METHODS: &str = "GET,HEAD,POST,OPTIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Videos,
    TopCategories,
    PopularTags,
    VideoById,
}

impl FromStr for Action {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "videos" => Ok(Action::Videos),
            "topCategories" => Ok(Action::TopCategories),
            "popularTags" => Ok(Action::PopularTags),
            "videoById" => Ok(Action::VideoById),
            _ => Err(ProxyError::UnknownAction),
        }
    }
}

/// Inbound query parameters. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRequest {
    pub action: Option<String>,
    pub main_category: Option<String>,
    pub quality: Option<String>,
    pub country_category: Option<String>,
    pub popular_tag: Option<String>,
    pub id: Option<String>,
}

impl ProxyRequest {
    /// Build from decoded query pairs; a repeated key keeps its last value
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "action" => &mut request.action,
                "mainCategory" => &mut request.main_category,
                "quality" => &mut request.quality,
                "countryCategory" => &mut request.country_category,
                "popularTag" => &mut request.popular_tag,
                "id" => &mut request.id,
                _ => continue,
            };
            let value = value.into();
            *slot = (!value.is_empty()).then_some(value);
        }
        request
    }

    pub fn action(&self) -> Result<Action, ProxyError> {
        self.action.as_deref().map_or(Ok(Action::Videos), str::parse)
    }
}

/// The status, headers and JSON body handed back to the caller
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> axum::response::Response {
        let mut res = Response::new(Body::from(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

/// Translates inbound requests into upstream queries over the videos table
#[derive(Clone)]
pub struct QueryProxy {
    upstream: SupabaseClient,
    allowed_origin: HeaderValue,
}

impl QueryProxy {
    pub fn new(upstream: SupabaseClient, allowed_origin: HeaderValue) -> Self {
        Self {
            upstream,
            allowed_origin,
        }
    }

    pub fn upstream(&self) -> &SupabaseClient {
        &self.upstream
    }

    fn cors_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers
    }

    fn respond(&self, status: StatusCode, body: JsonValue) -> ProxyResponse {
        ProxyResponse {
            status,
            headers: self.cors_headers(),
            body: body.to_string(),
        }
    }

    /// Answer one request. Never fails: errors become an error response.
    pub async fn handle(&self, method: &Method, request: &ProxyRequest) -> ProxyResponse {
        if method == Method::OPTIONS {
            let mut headers = self.cors_headers();
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            return ProxyResponse {
                status: StatusCode::NO_CONTENT,
                headers,
                body: String::new(),
            };
        }

        match self.route(request).await {
            Ok(body) => self.respond(StatusCode::OK, body),
            Err(error) if error.is_client_error() => {
                debug!(%error, "Rejected request");
                self.respond(error.status_code(), json!({ "message": error.to_string() }))
            }
            Err(error) => {
                let status = error.status_code();
                error!(%error, status = status.as_u16(), "supabase-proxy error");
                self.respond(status, json!({ "error": error.to_string() }))
            }
        }
    }

    async fn route(&self, request: &ProxyRequest) -> Result<JsonValue, ProxyError> {
        match request.action()? {
            Action::Videos => {
                let videos = self.upstream.fetch(&videos_query(request)).await?;
                Ok(json!({ "videos": videos }))
            }
            Action::TopCategories => {
                let rows = self
                    .upstream
                    .fetch_rows(&column_query("top_categories"))
                    .await?;
                Ok(json!({ "topCategories": unique_column_values(&rows, "top_categories") }))
            }
            Action::PopularTags => {
                let rows = self
                    .upstream
                    .fetch_rows(&column_query("popular_tags"))
                    .await?;
                Ok(json!({ "popularTags": unique_column_values(&rows, "popular_tags") }))
            }
            Action::VideoById => {
                let id = request
                    .id
                    .as_deref()
                    .ok_or(ProxyError::MissingParam("id"))?;
                let rows = self.upstream.fetch(&video_by_id_query(id)).await?;
                let video = rows
                    .as_array()
                    .and_then(|rows| rows.first())
                    .cloned()
                    .unwrap_or(JsonValue::Null);
                Ok(json!({ "video": video }))
            }
        }
    }
}

/// Only active, published rows are ever served
fn visible(query: PostgrestQuery) -> PostgrestQuery {
    query.eq("link_status", "active").eq("status", "published")
}

pub fn videos_query(request: &ProxyRequest) -> PostgrestQuery {
    visible(PostgrestQuery::table(VIDEOS_TABLE).select(&["*"]))
        .order("created_at", Direction::Desc)
        .eq_opt("main_category", request.main_category.as_deref())
        .eq_opt("quality", request.quality.as_deref())
        .contains_opt("country_categories", request.country_category.as_deref())
        .contains_opt("popular_tags", request.popular_tag.as_deref())
}

pub fn column_query(column: &'static str) -> PostgrestQuery {
    visible(PostgrestQuery::table(VIDEOS_TABLE).select(&[column]))
}

pub fn video_by_id_query(id: &str) -> PostgrestQuery {
    visible(PostgrestQuery::table(VIDEOS_TABLE).select(&["*"]).eq("id", id))
}
