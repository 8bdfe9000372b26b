use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{info, instrument, warn};

use crate::{
    config::DestinationMode,
    error::{Error, Result},
    gist::{GistClient, PLACEHOLDER_CONTENT},
};

/// Single-line file remembering the gist id between runs
#[derive(Debug, Clone)]
pub struct IdFile {
    path: PathBuf,
}

impl IdFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::IdFile {
            path: self.path.clone(),
            source,
        }
    }

    /// Returns the stored id, `None` when the file is missing or blank
    ///
    /// # Errors
    /// [`Error::IdFile`] when the file exists but cannot be read
    pub async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Replaces the file content with `id`
    ///
    /// # Errors
    /// [`Error::IdFile`] on any I/O failure
    pub async fn write(&self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::fs::write(&self.path, id.trim())
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// Picks the gist to publish into
///
/// Fixed mode returns the configured id untouched. Persisted mode reuses the
/// remembered gist when it still exists, otherwise creates a private gist and
/// remembers its id.
///
/// # Errors
/// Any [`Error::Remote`] / [`Error::Transport`] from the gist service, or
/// [`Error::IdFile`] when the id cannot be read or saved
#[instrument(skip(gist))]
pub async fn resolve(
    gist: &GistClient,
    mode: &DestinationMode,
    description: &str,
) -> Result<String> {
    let id_file = match mode {
        DestinationMode::Fixed(id) => return Ok(id.clone()),
        DestinationMode::Persisted { id_file } => IdFile::new(id_file),
    };

    if let Some(id) = id_file.read().await? {
        if gist.exists(&id).await? {
            info!("Reusing gist {id} from {:?}", id_file.path());
            return Ok(id);
        }
        warn!(
            "Gist {id} from {:?} no longer exists, creating a new one",
            id_file.path()
        );
    }

    let id = gist.create(description, PLACEHOLDER_CONTENT).await?;
    id_file.write(&id).await?;
    info!("Saved gist id {id} to {:?}", id_file.path());

    Ok(id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    async fn mock_create(server: &MockServer, id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/gists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": id })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn id_file_round_trip_and_blank_handling() {
        let dir = tempfile::tempdir().unwrap();
        let file = IdFile::new(dir.path().join("nested/gist_id.txt"));

        assert_eq!(file.read().await.unwrap(), None);

        file.write("abc123").await.unwrap();
        assert_eq!(file.read().await.unwrap().as_deref(), Some("abc123"));

        tokio::fs::write(file.path(), "  \n").await.unwrap();
        assert_eq!(file.read().await.unwrap(), None);

        tokio::fs::write(file.path(), " xyz \n").await.unwrap();
        assert_eq!(file.read().await.unwrap().as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn fixed_mode_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let gist = GistClient::new(&server.uri(), "t").unwrap();
        let id = resolve(&gist, &DestinationMode::Fixed("fixed-id".into()), "d")
            .await
            .unwrap();
        assert_eq!(id, "fixed-id");
    }

    #[tokio::test]
    async fn creates_then_reuses_persisted_gist() {
        let server = MockServer::start().await;
        mock_create(&server, "fresh", 1).await;
        Mock::given(method("GET"))
            .and(path("/gists/fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "fresh" })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("gist_id.txt");
        let mode = DestinationMode::Persisted {
            id_file: id_file.clone(),
        };
        let gist = GistClient::new(&server.uri(), "t").unwrap();

        let first = resolve(&gist, &mode, "d").await.unwrap();
        assert_eq!(first, "fresh");
        assert_eq!(tokio::fs::read_to_string(&id_file).await.unwrap(), "fresh");

        let second = resolve(&gist, &mode, "d").await.unwrap();
        assert_eq!(second, "fresh");
    }

    #[tokio::test]
    async fn missing_remote_gist_is_recreated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/stale"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mock_create(&server, "replacement", 1).await;

        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("gist_id.txt");
        tokio::fs::write(&id_file, "stale\n").await.unwrap();

        let gist = GistClient::new(&server.uri(), "t").unwrap();
        let id = resolve(
            &gist,
            &DestinationMode::Persisted {
                id_file: id_file.clone(),
            },
            "d",
        )
        .await
        .unwrap();

        assert_eq!(id, "replacement");
        assert_eq!(
            tokio::fs::read_to_string(&id_file).await.unwrap(),
            "replacement"
        );
    }

    #[tokio::test]
    async fn existence_check_failure_stops_without_creating() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/old"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;
        mock_create(&server, "unwanted", 0).await;

        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("gist_id.txt");
        tokio::fs::write(&id_file, "old\n").await.unwrap();

        let gist = GistClient::new(&server.uri(), "t").unwrap();
        let err = resolve(
            &gist,
            &DestinationMode::Persisted {
                id_file: id_file.clone(),
            },
            "d",
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Remote {
                status: reqwest::StatusCode::BAD_GATEWAY,
                ..
            }
        ));
        assert_eq!(tokio::fs::read_to_string(&id_file).await.unwrap(), "old\n");
    }

    #[tokio::test]
    async fn revoked_token_is_not_mistaken_for_missing_gist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;
        mock_create(&server, "unwanted", 0).await;

        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("gist_id.txt");
        tokio::fs::write(&id_file, "old").await.unwrap();

        let gist = GistClient::new(&server.uri(), "t").unwrap();
        let err = resolve(&gist, &DestinationMode::Persisted { id_file }, "d")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote { ref body, .. } if body == "Bad credentials"));
    }

    #[tokio::test]
    async fn failed_creation_leaves_id_file_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let id_file = dir.path().join("gist_id.txt");
        let gist = GistClient::new(&server.uri(), "t").unwrap();

        let err = resolve(
            &gist,
            &DestinationMode::Persisted {
                id_file: id_file.clone(),
            },
            "d",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Remote { .. }));
        assert!(!id_file.exists());
    }
}
