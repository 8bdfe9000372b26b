use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub const GROUP_TITLE: &str = "JioTV";
pub const LICENSE_SERVER: &str = "https://aqfadtv.xyz/clearkey/results.php";
pub const PLAYER_USER_AGENT: &str =
    "plaYtv/7.1.3 (Linux;Android 13) ygx/824.1 ExoPlayerLib/824.0";

const KEY_LENGTH: usize = 32;

/// A single channel entry of the source JSON
///
/// Absent or non-string fields are read as empty strings, so a malformed entry
/// is simply skipped by [`build`] instead of failing the whole source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct ChannelRecord {
    pub name: String,
    pub logo: String,
    pub link: String,
    pub drm_license: String,
    pub cookie: String,
}

impl From<Value> for ChannelRecord {
    fn from(value: Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .trim()
                .to_string(),
            logo: field("logo"),
            link: field("link"),
            drm_license: field("drmLicense"),
            cookie: field("cookie"),
        }
    }
}

/// ClearKey `(key_id, key)` pair, hyphens stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrmPair {
    pub key_id: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DrmParseError {
    #[error("missing `:` separator")]
    MissingSeparator,
    #[error("key id or key is not 32 characters long")]
    InvalidLength,
}

impl FromStr for DrmPair {
    type Err = DrmParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key_id, key) = s.split_once(':').ok_or(DrmParseError::MissingSeparator)?;
        let normalize = |half: &str| half.trim().replace('-', "");

        let (key_id, key) = (normalize(key_id), normalize(key));
        if key_id.chars().count() != KEY_LENGTH || key.chars().count() != KEY_LENGTH {
            return Err(DrmParseError::InvalidLength);
        }

        Ok(Self { key_id, key })
    }
}

impl DrmPair {
    #[must_use]
    pub fn license_url(&self) -> String {
        format!("{LICENSE_SERVER}?keyid={}&key={}", self.key_id, self.key)
    }
}

/// Why a record did not make it into the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingLink,
    MissingDrmLicense,
    MalformedDrmLicense(DrmParseError),
    MissingCookie,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLink => f.write_str("no stream link"),
            Self::MissingDrmLicense => f.write_str("no DRM license"),
            Self::MalformedDrmLicense(e) => write!(f, "malformed DRM license ({e})"),
            Self::MissingCookie => f.write_str("no cookie available"),
        }
    }
}

/// Generated playlist along with how many records were used
#[derive(Debug, Clone)]
pub struct Playlist {
    pub content: String,
    pub channel_count: usize,
    pub skipped_count: usize,
}

/// Per-pass accumulator for [`build`]
///
/// The first non-empty cookie seen becomes the shared cookie and wins over any
/// cookie carried by later records.
#[derive(Debug, Default)]
struct BuildState {
    shared_cookie: Option<String>,
    lines: Vec<String>,
    channel_count: usize,
    skipped_count: usize,
}

impl BuildState {
    fn push(mut self, (index, record): (usize, &ChannelRecord)) -> Self {
        match self.channel_block(record) {
            Ok(block) => {
                self.lines.extend(block);
                self.channel_count += 1;
            }
            Err(reason) => {
                debug!("Skipping channel #{index} `{}`: {reason}", record.name);
                self.skipped_count += 1;
            }
        }
        self
    }

    fn channel_block(
        &mut self,
        record: &ChannelRecord,
    ) -> std::result::Result<[String; 7], SkipReason> {
        if record.link.is_empty() {
            return Err(SkipReason::MissingLink);
        }
        if record.drm_license.is_empty() {
            return Err(SkipReason::MissingDrmLicense);
        }

        let drm = record
            .drm_license
            .parse::<DrmPair>()
            .map_err(SkipReason::MalformedDrmLicense)?;

        if !record.cookie.is_empty() && self.shared_cookie.is_none() {
            self.shared_cookie = Some(record.cookie.clone());
        }
        let cookie = self.shared_cookie.as_deref().unwrap_or(&record.cookie);
        if cookie.is_empty() {
            return Err(SkipReason::MissingCookie);
        }

        let token = cookie.split_once('=').map_or("", |(_, token)| token);
        let name = &record.name;

        Ok([
            format!(
                "#EXTINF:-1 tvg-id=\"{}\" group-title=\"{GROUP_TITLE}\" tvg-logo=\"{}\",{name}",
                name.replace(' ', "_"),
                record.logo
            ),
            "#KODIPROP:inputstream.adaptive.license_type=clearkey".to_string(),
            format!(
                "#KODIPROP:inputstream.adaptive.license_key={}",
                drm.license_url()
            ),
            format!("#EXTVLCOPT:http-user-agent={PLAYER_USER_AGENT}"),
            format!("#EXTHTTP:{{\"cookie\":\"{cookie}\"}}"),
            format!("{}?{token}", record.link),
            String::new(),
        ])
    }
}

fn header(source_label: &str, generated_at: DateTime<Utc>) -> String {
    indoc::formatdoc! {"
        #EXTM3U x-tvg-url=\"\"
        #EXTM3U
        # Generated from {} on {} UTC
        # TiviMate compatible - ClearKey + __hdnea__ duplicated
",
        source_label,
        generated_at.format("%Y-%m-%d %H:%M")
    }
}

/// Renders channel records into an M3U playlist
///
/// Records without a link, a valid ClearKey pair or a usable cookie are
/// skipped silently.
///
/// # Errors
/// [`Error::EmptyResult`] when every record was skipped
#[instrument(skip(records, generated_at), fields(records = records.len()))]
pub fn build(
    records: &[ChannelRecord],
    source_label: &str,
    generated_at: DateTime<Utc>,
) -> Result<Playlist> {
    let state = BuildState {
        lines: vec![header(source_label, generated_at)],
        ..Default::default()
    };
    let state = records.iter().enumerate().fold(state, BuildState::push);

    if state.channel_count == 0 {
        return Err(Error::EmptyResult);
    }

    Ok(Playlist {
        content: state.lines.join("\n"),
        channel_count: state.channel_count,
        skipped_count: state.skipped_count,
    })
}
