use std::path::{Path, PathBuf};
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use thiserror::Error;
use crate::artifact::{self, Artifact};
use crate::mirror::{self, ImageSpec, DEFAULT_ARCHITECTURES};
use crate::pipeline::FailurePolicy;

const DEFAULT_CONFIG: &str = include_str!("../default.toml");

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    Read {
        path: PathBuf,
        err: std::io::Error,
    },

    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no target registry configured; set `target_registry` or pass --registry")]
    MissingRegistry,

    #[error("image {name}: {err}")]
    Image {
        name: String,
        err: mirror::Error,
    },
}

fn default_architectures() -> Vec<String> {
    DEFAULT_ARCHITECTURES.iter().map(|a| a.to_string()).collect()
}

/// A msync.toml file.
#[serde_inline_default]
#[derive(Deserialize, Debug)]
pub struct File {
    pub description: Option<String>,
    pub target_registry: Option<String>,
    #[serde_inline_default(PathBuf::from("./_output/binaries"))]
    pub output_dir: PathBuf,
    /// Container CLI used for pull, tag, push and manifest commands.
    #[serde_inline_default("docker".to_string())]
    pub docker: String,
    /// Fetch downloads from this host instead of their upstream hosts.
    pub download_host: Option<String>,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    #[serde(default)]
    pub image: Vec<Image>,
    #[serde(default)]
    pub autoscaler: Autoscaler,
    #[serde(default)]
    pub download: Vec<Artifact>,
    #[serde(default)]
    pub kubernetes_release: Vec<KubernetesRelease>,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program, so
        // make sure to test default() to catch panics compile-time.
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
pub struct Image {
    pub source_registry: String,
    pub source_name: String,
    pub tag: String,
    /// Defaults to `source_name`.
    pub target_name: Option<String>,
    /// Overrides the top-level `target_registry` for this image.
    pub target_registry: Option<String>,
    #[serde_inline_default(default_architectures())]
    pub arch: Vec<String>,
}

fn default_autoscaler_images() -> Vec<String> {
    ["arm64", "amd64"]
        .iter()
        .map(|arch| format!("k8s.gcr.io/cpa/cluster-proportional-autoscaler-{arch}:1.8.5"))
        .collect()
}

/// Images copied as-is by the cluster-proportional-autoscaler shortcut.
#[derive(Deserialize, Debug)]
pub struct Autoscaler {
    #[serde(default = "default_autoscaler_images")]
    pub images: Vec<String>,
}

impl Default for Autoscaler {
    fn default() -> Self {
        Self {
            images: default_autoscaler_images(),
        }
    }
}

/// kubectl, kubeadm and kubelet of one Kubernetes release.
#[serde_inline_default]
#[derive(Deserialize, Debug)]
pub struct KubernetesRelease {
    pub version: String,
    #[serde_inline_default(default_architectures())]
    pub arch: Vec<String>,
}

impl File {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_path_buf(),
            err,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn registry(&self) -> Result<&str, Error> {
        self.target_registry.as_deref().ok_or(Error::MissingRegistry)
    }

    /// Image jobs in file order.
    pub fn images(&self) -> Result<Vec<ImageSpec>, Error> {
        self.image
            .iter()
            .map(|image| {
                let registry = match &image.target_registry {
                    Some(registry) => registry.as_str(),
                    None => self.registry()?,
                };
                let target_name = image.target_name.as_deref().unwrap_or(&image.source_name);
                ImageSpec::new(&image.source_registry, &image.source_name, &image.tag, registry, target_name)
                    .with_architectures(image.arch.iter().cloned())
                    .map_err(|err| Error::Image {
                        name: format!("{}/{}:{}", image.source_registry, image.source_name, image.tag),
                        err,
                    })
            })
            .collect()
    }

    /// Explicit downloads first, then the binaries of each Kubernetes release.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = self.download.clone();
        for release in &self.kubernetes_release {
            artifacts.extend(artifact::kubernetes_binaries(&release.version, &release.arch));
        }
        artifacts
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn load_default_configuration() {
        let cfg = File::default();
        assert_eq!(cfg.description, Some("Default job list".into()));
        assert_eq!(cfg.registry().unwrap(), "registry.cn-beijing.aliyuncs.com/yunionio");
        assert_eq!(cfg.output_dir, PathBuf::from("./_output/binaries"));
        assert_eq!(cfg.docker, "docker");
        assert_eq!(cfg.on_failure, FailurePolicy::Continue);

        let images = cfg.images().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].source_path(), "docker.io/library/nginx:1.19");
        assert_eq!(images[0].target_path(), "registry.cn-beijing.aliyuncs.com/yunionio/nginx:1.19");
        assert_eq!(images[0].architectures(), ["amd64", "arm64"]);

        assert_eq!(cfg.artifacts(), vec![Artifact::CalicoCrds { version: "v3.19.2".into() }]);
        assert_eq!(cfg.autoscaler.images.len(), 2);
    }

    #[test]
    pub fn user_configuration() {
        let cfg: File = toml::from_str(
            r#"
            target_registry = "registry.example.com/mirror"
            output_dir = "/srv/binaries"
            on_failure = "abort"
            download_host = "http://files.example.com"

            [[image]]
            source_registry = "quay.io/coreos"
            source_name = "etcd"
            tag = "v3.4.13"
            arch = ["arm64"]

            [[image]]
            source_registry = "calico"
            source_name = "node"
            tag = "v3.19.3"
            target_name = "calico-node"
            target_registry = "other.example.com"

            [[download]]
            kind = "crictl"
            version = "v1.20.0"
            arch = "amd64"

            [[kubernetes_release]]
            version = "v1.17.0"
            arch = ["arm64"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.on_failure, FailurePolicy::Abort);
        assert_eq!(cfg.docker, "docker");
        assert_eq!(cfg.download_host.as_deref(), Some("http://files.example.com"));

        let images = cfg.images().unwrap();
        assert_eq!(images[0].target_path(), "registry.example.com/mirror/etcd:v3.4.13");
        assert_eq!(images[0].architectures(), ["arm64"]);
        assert_eq!(images[1].target_path(), "other.example.com/calico-node:v3.19.3");

        let labels: Vec<String> = cfg.artifacts().iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "crictl v1.20.0 (amd64)",
                "kubectl v1.17.0 (arm64)",
                "kubeadm v1.17.0 (arm64)",
                "kubelet v1.17.0 (arm64)",
            ]
        );
        assert_eq!(
            cfg.autoscaler.images[0],
            "k8s.gcr.io/cpa/cluster-proportional-autoscaler-arm64:1.8.5"
        );
    }

    #[test]
    pub fn image_without_registry() {
        let cfg: File = toml::from_str(
            r#"
            [[image]]
            source_registry = "calico"
            source_name = "cni"
            tag = "v3.19.3"
            "#,
        )
        .unwrap();
        assert!(matches!(cfg.images(), Err(Error::MissingRegistry)));
    }

    #[test]
    pub fn empty_architecture_list() {
        let cfg: File = toml::from_str(
            r#"
            target_registry = "r"
            [[image]]
            source_registry = "calico"
            source_name = "cni"
            tag = "v3.19.3"
            arch = []
            "#,
        )
        .unwrap();
        match cfg.images() {
            Err(Error::Image { name, err }) => {
                assert_eq!(name, "calico/cni:v3.19.3");
                assert_eq!(err, mirror::Error::NoArchitectures);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
