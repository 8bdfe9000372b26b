use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::{
    error::{Error, Result},
    util::init_http_client,
};

pub const PLAYLIST_FILE_NAME: &str = "playlist.m3u";
pub const GIST_TIMEOUT: Duration = Duration::from_secs(30);

const GIST_WEB_URL: &str = "https://gist.github.com";
const GIST_RAW_URL: &str = "https://gist.githubusercontent.com/raw";

/// Content given to a freshly created gist before the first publish
pub const PLACEHOLDER_CONTENT: &str = "#EXTM3U\n";

#[derive(Debug, Deserialize)]
struct CreatedGist {
    id: String,
}

/// Minimal GitHub Gist API client, one attempt per call
#[derive(Debug, Clone)]
pub struct GistClient {
    client: Client,
    api_url: String,
}

/// Gist page of `id`
#[must_use]
pub fn page_url(id: &str) -> String {
    format!("{GIST_WEB_URL}/{id}")
}

/// Raw download URL of the playlist inside gist `id`
#[must_use]
pub fn raw_url(id: &str) -> String {
    format!("{GIST_RAW_URL}/{id}/{PLAYLIST_FILE_NAME}")
}

async fn ensure_success(res: Response) -> Result<Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(Error::remote(res).await)
    }
}

impl GistClient {
    /// # Errors
    /// * [`Error::Configuration`] when the token cannot be sent as a header
    /// * [`Error::HttpClient`] when the client cannot be built
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            Error::Configuration("gist token contains invalid header characters".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        Ok(Self {
            client: init_http_client(headers, GIST_TIMEOUT).map_err(Error::HttpClient)?,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{id}", self.api_url)
    }

    /// Checks whether gist `id` is reachable with the configured token
    ///
    /// `404` reads as absent. Any other non-success status is returned as an
    /// error so that a revoked token is not mistaken for a missing gist.
    ///
    /// # Errors
    /// [`Error::Transport`] or [`Error::Remote`]
    #[instrument(skip(self))]
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let res = self.client.get(self.gist_url(id)).send().await?;

        match res.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => {
                debug!("Gist {id} does not exist");
                Ok(false)
            }
            _ => Err(Error::remote(res).await),
        }
    }

    /// Creates a private gist holding [`PLAYLIST_FILE_NAME`] and returns its id
    ///
    /// # Errors
    /// [`Error::Transport`], [`Error::Remote`], or [`Error::InvalidResponse`]
    /// when the reply carries no gist id
    #[instrument(skip(self, content))]
    pub async fn create(&self, description: &str, content: &str) -> Result<String> {
        let res = self
            .client
            .post(format!("{}/gists", self.api_url))
            .json(&json!({
                "description": description,
                "public": false,
                "files": { PLAYLIST_FILE_NAME: { "content": content } }
            }))
            .send()
            .await?;

        let created = ensure_success(res)
            .await?
            .json::<CreatedGist>()
            .await
            .map_err(Error::InvalidResponse)?;
        info!("Created gist {}", created.id);

        Ok(created.id)
    }

    /// Overwrites [`PLAYLIST_FILE_NAME`] in gist `id`
    ///
    /// # Errors
    /// [`Error::Transport`] or [`Error::Remote`]
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn update(&self, id: &str, content: &str) -> Result<()> {
        let res = self
            .client
            .patch(self.gist_url(id))
            .json(&json!({
                "files": { PLAYLIST_FILE_NAME: { "content": content } }
            }))
            .send()
            .await?;

        ensure_success(res).await?;
        Ok(())
    }
}
