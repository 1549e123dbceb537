use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use urlencoding::encode;

use crate::error::{CatalogError, Result};
use crate::models::*;
use crate::models::{read_string, read_text};
use crate::RemoteConfig;

/// Path prefix of the REST interface below the configured base URL.
pub const API_PREFIX: &str = "/rest/v1";

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
    /// Applied after the fixed headers; a header with the same name replaces the fixed one.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn json<T: Serialize>(method: Method, body: &T) -> Result<Self> {
        Ok(Self { method, body: Some(serde_json::to_string(body)?), headers: Vec::new() })
    }
}

/// A fully resolved request, ready for a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RemoteRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turns a non-2xx answer into an error carrying the body text.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CatalogError::RemoteRequest { status: self.status, body: self.body })
        }
    }
}

/// Sends requests to the remote store. Errors are network failures only;
/// HTTP error statuses come back as a normal response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("NovaStream")
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let res = builder.send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(RemoteResponse { status, body })
    }
}

/// One row of the `content` table as the remote store returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRow {
    #[serde(default, deserialize_with = "read_string")]
    pub id: String,
    #[serde(default, deserialize_with = "read_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "read_text")]
    pub genre: Option<String>,
    /// Either a JSON array or the same array serialized into a string.
    #[serde(default)]
    pub episodes: Value,
}

impl ContentRow {
    fn info(&self) -> FilmItem {
        FilmItem {
            id: self.id.clone(),
            title: self.title.clone().unwrap_or_default(),
            description: or_default(&self.description, ""),
            image: Some(or_default(&self.image, "")),
            video_url: self.video_url.clone(),
            duration: or_default(&self.duration, UNKNOWN_FIELD),
            year: or_default(&self.year, UNKNOWN_FIELD),
            genre: or_default(&self.genre, UNKNOWN_FIELD),
        }
    }

    pub fn into_film(self) -> FilmItem {
        self.info()
    }

    pub fn into_series(self) -> SeriesItem {
        let mut episodes = parse_episodes(&self.episodes);
        if episodes.is_empty() {
            episodes = synthesize_episodes(self.video_url.as_deref());
        }
        SeriesItem { info: self.info(), episodes }
    }

    /// Maps the row echoed by a create call. Only the description gets a
    /// default; the caller's episodes are reattached since the stored form may differ.
    pub fn into_created(self, category: Category, episodes: Option<Vec<Episode>>) -> ContentItem {
        let info = FilmItem {
            id: self.id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.image,
            video_url: self.video_url,
            duration: self.duration.unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            year: self.year.unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            genre: self.genre.unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        };
        match category {
            Category::Film => ContentItem::Film(info),
            Category::Serie => ContentItem::Serie(SeriesItem { info, episodes: episodes.unwrap_or_default() }),
        }
    }
}

/// Body of a create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRow {
    #[serde(rename = "type")]
    pub kind: Category,
    pub title: String,
    pub description: String,
    pub image: String,
    pub video_url: String,
    pub duration: String,
    pub year: String,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

impl NewRow {
    pub fn new(item: &NewItem, category: Category) -> Self {
        Self {
            kind: category,
            title: item.title.clone(),
            description: or_default(&item.description, ""),
            image: or_default(&item.image, ""),
            video_url: item.effective_video_url(category),
            duration: or_default(&item.duration, UNKNOWN_FIELD),
            year: or_default(&item.year, UNKNOWN_FIELD),
            genre: or_default(&item.genre, UNKNOWN_FIELD),
            episodes: item.kept_episodes(category).cloned(),
        }
    }
}

/// Body of an update call: only the fields the patch sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

impl PatchRow {
    pub fn from_patch(patch: &ItemPatch, include_description: bool) -> Self {
        let mut row = PatchRow {
            title: patch.title.clone(),
            description: if include_description { patch.description.clone() } else { None },
            image: patch.image.clone(),
            video_url: patch.video_url.clone(),
            duration: patch.duration.clone(),
            year: patch.year.clone(),
            genre: patch.genre.clone(),
            episodes: patch.episodes.clone(),
        };
        let missing_url = row.video_url.as_deref().map_or(true, str::is_empty);
        if missing_url {
            if let Some(first) = patch.episodes.as_ref().and_then(|eps| eps.first()) {
                row.video_url = Some(first.video_url.clone());
            }
        }
        row
    }
}

/// Client for the `content` table.
pub struct ContentApi {
    config: RemoteConfig,
    transport: Arc<dyn Transport>,
}

impl ContentApi {
    pub fn new(config: RemoteConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Resolves `path` against the base URL and attaches the fixed header set.
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<RemoteRequest> {
        if !self.is_configured() {
            return Err(CatalogError::NotConfigured);
        }
        let base = self.config.base_url.strip_suffix('/').unwrap_or(&self.config.base_url);
        let key = &self.config.api_key;
        let mut headers = vec![
            ("apikey".to_string(), key.clone()),
            ("Authorization".to_string(), format!("Bearer {}", key)),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Prefer".to_string(), "return=representation".to_string()),
        ];
        for (name, value) in options.headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
                Some(slot) => slot.1 = value,
                None => headers.push((name, value)),
            }
        }
        Ok(RemoteRequest {
            method: options.method,
            url: format!("{}{}{}", base, API_PREFIX, path),
            headers,
            body: options.body,
        })
    }

    pub async fn fetch(&self, path: &str, options: RequestOptions) -> Result<RemoteResponse> {
        let request = self.request(path, options)?;
        debug!(method = %request.method, url = %request.url, "remote request");
        self.transport.send(request).await
    }

    /// All rows of one category, oldest first. A non-2xx answer reads as an empty list.
    pub async fn list(&self, category: Category) -> Result<Vec<ContentRow>> {
        let path = format!("/content?type=eq.{}&order=created_at.asc&select=*", category.as_str());
        let res = self.fetch(&path, RequestOptions::new(Method::GET)).await?;
        if !res.is_success() {
            debug!(status = res.status, %category, "listing failed, treating as empty");
            return Ok(Vec::new());
        }
        res.json()
    }

    pub async fn create(&self, row: &NewRow) -> Result<ContentRow> {
        let res = self.fetch("/content", RequestOptions::json(Method::POST, row)?).await?;
        let rows: Vec<ContentRow> = res.error_for_status()?.json()?;
        rows.into_iter().next().ok_or(CatalogError::EmptyResponse)
    }

    pub async fn update(&self, id: &str, body: &PatchRow) -> Result<()> {
        let path = format!("/content?id=eq.{}", encode(id));
        self.fetch(&path, RequestOptions::json(Method::PATCH, body)?).await?.error_for_status()?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("/content?id=eq.{}", encode(id));
        self.fetch(&path, RequestOptions::new(Method::DELETE)).await?.error_for_status()?;
        Ok(())
    }
}
