use log::info;
use thiserror::Error;
use crate::docker::{self, Docker};

pub const DEFAULT_ARCHITECTURES: [&str; 2] = ["amd64", "arm64"];

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("at least one architecture is required")]
    NoArchitectures,

    #[error("architecture {0} is listed more than once")]
    DuplicateArchitecture(String),
}

/// An image to copy from a public source registry into the target registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    source_registry: String,
    source_name: String,
    tag: String,
    target_registry: String,
    target_name: String,
    architectures: Vec<String>,
}

impl ImageSpec {
    pub fn new(
        source_registry: &str,
        source_name: &str,
        tag: &str,
        target_registry: &str,
        target_name: &str,
    ) -> Self {
        Self {
            source_registry: source_registry.to_string(),
            source_name: source_name.to_string(),
            tag: tag.to_string(),
            target_registry: target_registry.to_string(),
            target_name: target_name.to_string(),
            architectures: DEFAULT_ARCHITECTURES.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Replace the architecture list. Order is kept as given.
    pub fn with_architectures<I, S>(mut self, architectures: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for arch in architectures {
            let arch = arch.into();
            if list.contains(&arch) {
                return Err(Error::DuplicateArchitecture(arch));
            }
            list.push(arch);
        }
        if list.is_empty() {
            return Err(Error::NoArchitectures);
        }
        self.architectures = list;
        Ok(self)
    }

    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    pub fn source_path(&self) -> String {
        format!("{}/{}:{}", self.source_registry, self.source_name, self.tag)
    }

    pub fn target_path(&self) -> String {
        format!("{}/{}:{}", self.target_registry, self.target_name, self.tag)
    }

    pub fn target_arch_image(&self, platform: &str) -> String {
        format!("{}-{platform}", self.target_path())
    }

    fn is_single_arch(&self) -> bool {
        self.architectures.len() == 1
    }

    /// Pull, retag and push the image for one platform.
    ///
    /// Single-architecture images are published upstream under a per-arch tag,
    /// so the platform goes into the source tag instead of `--platform`.
    pub fn sync_one_architecture(&self, docker: &mut Docker, platform: &str) -> Result<(), docker::Error> {
        let dest_image = self.target_arch_image(platform);
        let source_image = if self.is_single_arch() {
            let source_image = format!("{}-{platform}", self.source_path());
            docker.pull(&source_image, None)?;
            source_image
        } else {
            let source_image = self.source_path();
            docker.pull(&source_image, Some(platform))?;
            source_image
        };
        docker.tag(&source_image, &dest_image)?;
        docker.push(&dest_image)
    }

    /// Sync every architecture in order, then assemble and push the manifest
    /// list when more than one architecture was requested.
    pub fn sync_all_architectures(&self, docker: &mut Docker) -> Result<(), docker::Error> {
        for platform in &self.architectures {
            info!("Syncing {} ({platform}) to {}", self.source_path(), self.target_arch_image(platform));
            self.sync_one_architecture(docker, platform)?;
        }
        if self.is_single_arch() {
            return Ok(());
        }

        let list = self.target_path();
        let images: Vec<String> = self
            .architectures
            .iter()
            .map(|a| self.target_arch_image(a))
            .collect();

        info!("Creating manifest list {list}");
        docker.manifest_create(&list, &images)?;
        for (arch, image) in self.architectures.iter().zip(&images) {
            docker.manifest_annotate(&list, image, arch)?;
        }
        docker.manifest_push(&list)
    }
}

/// Copy a fully qualified image reference into `target_registry`, keeping
/// only its last path segment.
pub fn pull_push(docker: &mut Docker, source: &str, target_registry: &str) -> Result<(), docker::Error> {
    let name = source.rsplit('/').next().unwrap_or(source);
    let target = format!("{}/{name}", target_registry.trim_end_matches('/'));
    info!("Copying {source} to {target}");
    docker.pull(source, None)?;
    docker.tag(source, &target)?;
    docker.push(&target)
}
