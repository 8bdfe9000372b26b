#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use chrono::Utc;
use tracing::info;

use crate::{
    config::Config,
    error::{Error, Result},
    gist::GistClient,
};

pub mod config;
pub mod destination;
pub mod error;
pub mod gist;
pub mod playlist;
pub mod source;
pub mod util;

/// Fetches the channel list, builds the playlist and publishes it
///
/// Returns the gist id the playlist was written to, `None` on a dry run.
///
/// # Errors
/// The first failure of any stage; nothing is retried
pub async fn run(config: &Config) -> Result<Option<String>> {
    info!("Fetching channels from: {}", config.source_url);
    let client = source::source_client()?;
    let channels = source::fetch_channels(&client, &config.source_url).await?;

    let playlist = playlist::build(&channels, &config.source_url, Utc::now())?;
    info!(
        "Generated playlist with {} channels ({} skipped)",
        playlist.channel_count, playlist.skipped_count
    );

    if let Some(output) = &config.output {
        tokio::fs::write(output, &playlist.content)
            .await
            .map_err(|source| Error::Output {
                path: output.clone(),
                source,
            })?;
        info!("Wrote playlist to {output:?}");
    }

    if config.dry_run {
        info!("Dry run, not publishing");
        return Ok(None);
    }

    let token = config.token.as_deref().ok_or_else(|| {
        Error::Configuration("missing gist token (GIST_TOKEN / --token)".into())
    })?;
    let gist = GistClient::new(&config.api_url, token)?;
    let id = destination::resolve(&gist, &config.destination, &config.description).await?;
    gist.update(&id, &playlist.content).await?;

    info!("Gist updated: {}", gist::page_url(&id));
    info!("Raw URL: {}", gist::raw_url(&id));

    Ok(Some(id))
}
