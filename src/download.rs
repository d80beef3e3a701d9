use std::io::Write;
use std::path::{Path, PathBuf};
use log::{debug, info};
use thiserror::Error;
use crate::artifact::Artifact;

#[derive(Error, Debug)]
pub enum Error {
    #[error("create directory {path}: {err}")]
    CreateDir {
        path: PathBuf,
        err: std::io::Error,
    },

    #[error("fetch {url}: {err}")]
    Request {
        url: String,
        err: reqwest::Error,
    },

    #[error("fetch {url}: server responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("write {path}: {err}")]
    Write {
        path: PathBuf,
        err: std::io::Error,
    },

    #[error("reqwest: {0}")]
    Client(#[from] reqwest::Error),
}

/// Plain HTTP(S) GET of release files, without authentication.
pub struct Downloader {
    client: reqwest::Client,
    host: Option<String>,
}

impl Downloader {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, host: None })
    }

    /// Fetch from `host` instead of each artifact's upstream host. The
    /// path below the host, and so the local layout, stays the same.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Download `artifact` under `root`, recreating its upstream path layout.
    pub async fn save(&self, artifact: &Artifact, root: &Path) -> Result<PathBuf, Error> {
        let url = match &self.host {
            Some(host) => artifact.url_on(host),
            None => artifact.url(),
        };
        let dir = artifact.target_dir(root);
        info!("Downloading {url} to {}", artifact.target_path(root).display());
        self.save_url(&url, &dir).await
    }

    /// Download `url` into `dir`, naming the file after the last URL segment.
    /// Missing directories are created; an existing file is replaced.
    pub async fn save_url(&self, url: &str, dir: &Path) -> Result<PathBuf, Error> {
        std::fs::create_dir_all(dir).map_err(|err| Error::CreateDir {
            path: dir.to_path_buf(),
            err,
        })?;

        let name = url.rsplit('/').next().unwrap_or_default();
        let target = dir.join(name);

        let request_error = |err| Error::Request {
            url: url.to_string(),
            err,
        };
        let mut resp = self.client.get(url).send().await.map_err(request_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        let write_error = |err| Error::Write {
            path: target.clone(),
            err,
        };
        // Stream into a sibling temp file so an interrupted transfer never
        // leaves a truncated file under the final name.
        let mut file = temp_file_in(dir).map_err(write_error)?;
        let mut written = 0usize;
        while let Some(chunk) = resp.chunk().await.map_err(request_error)? {
            file.write_all(&chunk).map_err(write_error)?;
            written += chunk.len();
        }
        file.persist(&target).map_err(|err| write_error(err.error))?;

        debug!("Wrote {written} bytes to {}", target.display());
        Ok(target)
    }
}

/// Temp file created with the mode a plain `File::create` would get,
/// so the persisted download is readable like any other file in the tree.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    // The process umask still applies on open.
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}
