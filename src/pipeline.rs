use std::fmt::Display;
use std::path::Path;
use clap::ValueEnum;
use log::{error, info, warn};
use serde::Deserialize;
use crate::artifact::Artifact;
use crate::command::Runner;
use crate::docker::Docker;
use crate::download::Downloader;
use crate::mirror::{self, ImageSpec};

/// What to do with the remaining jobs once one of them fails.
#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next job.
    #[default]
    Continue,
    /// Stop the run at the first failed job.
    Abort,
}

/// Outcome of a run, one entry per attempted job.
#[derive(Debug, Default)]
pub struct Summary {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub skipped: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn report(&self) {
        info!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded.len(),
            self.failed.len(),
            self.skipped
        );
        for (job, reason) in &self.failed {
            error!("{job}: {reason}");
        }
    }

    /// Record one job; returns false when the run should stop.
    fn record<E: Display>(&mut self, job: String, result: Result<(), E>, policy: FailurePolicy) -> bool {
        match result {
            Ok(()) => {
                self.succeeded.push(job);
                true
            }
            Err(err) => {
                warn!("{job} failed: {err}");
                self.failed.push((job, err.to_string()));
                policy == FailurePolicy::Continue
            }
        }
    }
}

/// Mirror every image, each into its own architecture tags and manifest list.
pub fn mirror_images(
    runner: &mut dyn Runner,
    program: &str,
    images: &[ImageSpec],
    policy: FailurePolicy,
) -> Summary {
    let mut summary = Summary::default();
    let mut docker = Docker::new(runner, program);
    for (i, image) in images.iter().enumerate() {
        let result = image.sync_all_architectures(&mut docker);
        if !summary.record(image.target_path(), result, policy) {
            summary.skipped = images.len() - i - 1;
            break;
        }
    }
    summary
}

/// Plain pull/tag/push of fully qualified references into `target_registry`.
pub fn copy_images(
    runner: &mut dyn Runner,
    program: &str,
    sources: &[String],
    target_registry: &str,
    policy: FailurePolicy,
) -> Summary {
    let mut summary = Summary::default();
    let mut docker = Docker::new(runner, program);
    for (i, source) in sources.iter().enumerate() {
        let result = mirror::pull_push(&mut docker, source, target_registry);
        if !summary.record(source.clone(), result, policy) {
            summary.skipped = sources.len() - i - 1;
            break;
        }
    }
    summary
}

/// Download every artifact below `root`, one after the other.
pub async fn download_artifacts(
    downloader: &Downloader,
    artifacts: &[Artifact],
    root: &Path,
    policy: FailurePolicy,
) -> Summary {
    let mut summary = Summary::default();
    for (i, artifact) in artifacts.iter().enumerate() {
        let result = downloader.save(artifact, root).await.map(|_| ());
        if !summary.record(artifact.to_string(), result, policy) {
            summary.skipped = artifacts.len() - i - 1;
            break;
        }
    }
    summary
}
