//! Mirror container images into a private registry and fetch versioned
//! release binaries into a local tree laid out like their upstream URLs.
use thiserror::Error;

pub mod artifact;
pub mod command;
pub mod config;
pub mod docker;
pub mod download;
pub mod mirror;
pub mod pipeline;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] config::Error),

    #[error("download: {0}")]
    Download(#[from] download::Error),

    #[error("{0} job(s) failed")]
    JobsFailed(usize),
}
