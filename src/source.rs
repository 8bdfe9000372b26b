use std::time::Duration;

use reqwest::{Client, header::HeaderMap};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    error::{Error, Result},
    playlist::ChannelRecord,
    util::init_http_client,
};

pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Client used for the channel source
///
/// # Errors
/// [`Error::HttpClient`] when the HTTP client cannot be built
pub fn source_client() -> Result<Client> {
    init_http_client(HeaderMap::new(), SOURCE_TIMEOUT).map_err(Error::HttpClient)
}

/// Downloads and decodes the channel list
///
/// # Errors
/// * [`Error::SourceFetch`] on network errors or a non-success status
/// * [`Error::InputShape`] when the body is not JSON or carries no channels
#[instrument(skip(client))]
pub async fn fetch_channels(client: &Client, url: &str) -> Result<Vec<ChannelRecord>> {
    let fetch_error = |source| Error::SourceFetch {
        url: url.to_string(),
        source,
    };

    let res = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_error)?;
    let body = res.text().await.map_err(fetch_error)?;

    let data = serde_json::from_str::<Value>(&body)
        .map_err(|e| Error::InputShape(format!("body is not valid JSON: {e}")))?;
    let channels = decode_channels(data)?;
    info!("Found {} channel entries", channels.len());

    Ok(channels)
}

/// Accepts either a top-level array or an object holding a `channels` array
///
/// # Errors
/// [`Error::InputShape`] when no non-empty channel list can be found
pub fn decode_channels(data: Value) -> Result<Vec<ChannelRecord>> {
    let list = match data {
        Value::Array(list) => list,
        Value::Object(mut object) => match object.remove("channels") {
            Some(Value::Array(list)) => list,
            Some(_) => {
                return Err(Error::InputShape("`channels` is not an array".into()));
            }
            None => Vec::new(),
        },
        _ => {
            return Err(Error::InputShape(
                "expected an array or an object with `channels`".into(),
            ));
        }
    };

    if list.is_empty() {
        return Err(Error::InputShape("channel list is empty".into()));
    }

    Ok(list.into_iter().map(ChannelRecord::from).collect())
}
