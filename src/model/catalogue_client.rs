//! Remote catalogue client: named queries in, (status, payload) out

use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::RemoteError;

/// The only status the engine treats as success.
pub const SUCCESS_CODE: i64 = 200;

/// Outcome of every catalogue call. Raw payloads never reach a menu or the
/// queue without passing through [`classify`].
pub type FetchResult = Result<Value, RemoteError>;

/// A named catalogue query together with its parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    PersonalFm,
    RecommendSongs,
    DjTodayPreferred { page: u32 },
    DjPrograms { radio_id: u64, offset: usize, limit: usize },
    UserPlaylists { uid: u64, offset: usize, limit: usize },
    PlaylistDetail { id: u64 },
    DailySignIn { kind: u8 },
    YunbeiSignIn,
}

impl Query {
    pub fn path(&self) -> &'static str {
        match self {
            Query::PersonalFm => "/personal_fm",
            Query::RecommendSongs => "/recommend/songs",
            Query::DjTodayPreferred { .. } => "/dj/today/perfered",
            Query::DjPrograms { .. } => "/dj/program",
            Query::UserPlaylists { .. } => "/user/playlist",
            Query::PlaylistDetail { .. } => "/playlist/detail",
            Query::DailySignIn { .. } => "/daily_signin",
            Query::YunbeiSignIn => "/yunbei/sign",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Query::PersonalFm | Query::RecommendSongs | Query::YunbeiSignIn => Vec::new(),
            Query::DjTodayPreferred { page } => vec![("page", page.to_string())],
            Query::DjPrograms { radio_id, offset, limit } => vec![
                ("rid", radio_id.to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
            Query::UserPlaylists { uid, offset, limit } => vec![
                ("uid", uid.to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
            Query::PlaylistDetail { id } => vec![("id", id.to_string())],
            Query::DailySignIn { kind } => vec![("type", kind.to_string())],
        }
    }
}

/// Single success/failure classifier. Any code other than [`SUCCESS_CODE`] is
/// a failure regardless of its value.
pub fn classify(code: i64, payload: Value) -> FetchResult {
    if code == SUCCESS_CODE {
        Ok(payload)
    } else {
        Err(RemoteError::Status(code))
    }
}

/// Opaque remote collaborator. Implementations only perform the call; the
/// engine interprets the status through [`fetch`].
pub trait CatalogueClient: Send + Sync {
    fn call<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<(i64, Value), RemoteError>>;
}

pub async fn fetch(client: &dyn CatalogueClient, query: &Query) -> FetchResult {
    tracing::debug!(query = ?query, "Catalogue request started");
    let result = match client.call(query).await {
        Ok((code, payload)) => classify(code, payload),
        Err(e) => Err(e),
    };
    match &result {
        Ok(_) => tracing::info!(path = query.path(), "Catalogue request successful"),
        Err(e) => tracing::warn!(path = query.path(), error = %e, "Catalogue request failed"),
    }
    result
}

/// HTTP client for a NetEase-compatible API server
#[derive(Clone)]
pub struct HttpCatalogueClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogueClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, query: &Query) -> Result<(i64, Value), RemoteError> {
        let url = format!("{}{}", self.base_url, query.path());
        let response = self
            .http
            .get(&url)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let http_status = i64::from(response.status().as_u16());
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        // The API reports its own code in the body; HTTP status is the fallback
        let code = body.get("code").and_then(Value::as_i64).unwrap_or(http_status);
        Ok((code, body))
    }
}

impl CatalogueClient for HttpCatalogueClient {
    fn call<'a>(&'a self, query: &'a Query) -> BoxFuture<'a, Result<(i64, Value), RemoteError>> {
        Box::pin(self.get(query))
    }
}
