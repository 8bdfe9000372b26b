use std::{fmt, path::PathBuf};

use clap::{Parser, ValueEnum};
use reqwest::Url;

use crate::{
    error::{Error, Result},
    util::redact,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ID_FILE: &str = "gist_id.txt";
pub const DEFAULT_DESCRIPTION: &str = "ClearKey M3U playlist";

/// Builds a ClearKey M3U playlist from a JSON channel list and publishes it to a GitHub Gist
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// URL of the channel list JSON
    #[arg(long, env = "JSON_SOURCE_URL")]
    pub source_url: Option<String>,

    /// GitHub token with the `gist` scope, not needed with `--dry-run`
    #[arg(long, env = "GIST_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Gist to overwrite. Implies `--mode fixed` unless a mode is given
    #[arg(long, env = "OUTPUT_GIST_ID")]
    pub gist_id: Option<String>,

    /// File remembering the gist created in `persisted` mode
    #[arg(long, env = "GIST_ID_FILE", default_value = DEFAULT_ID_FILE)]
    pub id_file: PathBuf,

    /// How the destination gist is chosen
    #[arg(long, env = "GIST_MODE", value_enum)]
    pub mode: Option<Mode>,

    /// GitHub API base URL
    #[arg(long, env = "GIST_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Description given to a newly created gist
    #[arg(long, env = "GIST_DESCRIPTION", default_value = DEFAULT_DESCRIPTION)]
    pub description: String,

    /// Also write the playlist to this local file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Build the playlist without touching the gist
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Always overwrite the configured gist id
    Fixed,
    /// Reuse the gist remembered in the id file, creating one when missing
    Persisted,
}

/// Where the playlist gets published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationMode {
    Fixed(String),
    Persisted { id_file: PathBuf },
}

/// Validated run configuration
#[derive(Clone)]
pub struct Config {
    pub source_url: String,
    /// Absent only on dry runs
    pub token: Option<String>,
    pub destination: DestinationMode,
    pub api_url: String,
    pub description: String,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source_url", &self.source_url)
            .field("token", &self.token.as_deref().map(redact))
            .field("destination", &self.destination)
            .field("api_url", &self.api_url)
            .field("description", &self.description)
            .field("output", &self.output)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn http_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| Error::Configuration(format!("{name} `{value}` is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Configuration(format!(
            "{name} `{value}` must be an http(s) URL"
        )));
    }
    Ok(())
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let source_url = non_empty(args.source_url).ok_or_else(|| {
            Error::Configuration("missing source URL (JSON_SOURCE_URL / --source-url)".into())
        })?;
        http_url("source URL", &source_url)?;

        let token = non_empty(args.token);
        if token.is_none() && !args.dry_run {
            return Err(Error::Configuration(
                "missing gist token (GIST_TOKEN / --token)".into(),
            ));
        }

        let api_url = args.api_url.trim().trim_end_matches('/').to_string();
        http_url("API URL", &api_url)?;

        let gist_id = non_empty(args.gist_id);
        let mode = args.mode.unwrap_or(if gist_id.is_some() {
            Mode::Fixed
        } else {
            Mode::Persisted
        });

        let destination = match (mode, gist_id) {
            (Mode::Fixed, Some(id)) => DestinationMode::Fixed(id),
            (Mode::Fixed, None) => {
                return Err(Error::Configuration(
                    "fixed mode needs a gist id (OUTPUT_GIST_ID / --gist-id)".into(),
                ));
            }
            (Mode::Persisted, _) => {
                if args.id_file.as_os_str().is_empty() {
                    return Err(Error::Configuration(
                        "persisted mode needs an id file (GIST_ID_FILE / --id-file)".into(),
                    ));
                }
                DestinationMode::Persisted {
                    id_file: args.id_file,
                }
            }
        };

        Ok(Self {
            source_url,
            token,
            destination,
            api_url,
            description: args.description,
            output: args.output,
            dry_run: args.dry_run,
        })
    }
}
