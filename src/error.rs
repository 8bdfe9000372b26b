use std::path::PathBuf;

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure that ends a run. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unable to fetch channel source {url}: {source}")]
    SourceFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no channels list found in source JSON: {0}")]
    InputShape(String),

    #[error("no valid channels generated, check the source JSON format")]
    EmptyResult,

    /// Non-success response from the gist service
    #[error("gist service responded with {status}: {body}")]
    Remote { status: StatusCode, body: String },

    #[error("unable to reach the gist service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unable to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("gist service returned an unreadable response: {0}")]
    InvalidResponse(#[source] reqwest::Error),

    #[error("unable to write playlist to {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gist id file {path:?}: {source}")]
    IdFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Drains a failed response into [`Error::Remote`]
    pub(crate) async fn remote(res: reqwest::Response) -> Self {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Self::Remote { status, body }
    }
}
