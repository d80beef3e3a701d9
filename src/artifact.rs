use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use serde::Deserialize;

const KUBERNETES_RELEASE_HOST: &str = "https://storage.googleapis.com";
const GITHUB_HOST: &str = "https://github.com";

/// A versioned release file published at a predictable upstream location.
///
/// Every variant derives both its download URL and its local path from the
/// same relative path, so the tree under the output directory mirrors the
/// remote layout.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Artifact {
    Kubelet { version: String, arch: String },
    Kubeadm { version: String, arch: String },
    Kubectl { version: String, arch: String },
    Calicoctl { version: String, arch: String },
    Crictl { version: String, arch: String },
    Cni { version: String, arch: String },
    CalicoCrds { version: String },
}

use Artifact::*;

impl Artifact {
    pub fn name(&self) -> &'static str {
        match self {
            Kubelet { .. } => "kubelet",
            Kubeadm { .. } => "kubeadm",
            Kubectl { .. } => "kubectl",
            Calicoctl { .. } => "calicoctl",
            Crictl { .. } => "crictl",
            Cni { .. } => "cni-plugins",
            CalicoCrds { .. } => "calico-crds",
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Kubelet { version, .. }
            | Kubeadm { version, .. }
            | Kubectl { version, .. }
            | Calicoctl { version, .. }
            | Crictl { version, .. }
            | Cni { version, .. }
            | CalicoCrds { version } => version.as_str(),
        }
    }

    /// Architecture, if the artifact has one.
    pub fn arch(&self) -> Option<&str> {
        match self {
            Kubelet { arch, .. }
            | Kubeadm { arch, .. }
            | Kubectl { arch, .. }
            | Calicoctl { arch, .. }
            | Crictl { arch, .. }
            | Cni { arch, .. } => Some(arch.as_str()),
            CalicoCrds { .. } => None,
        }
    }

    /// Upstream scheme and host serving this artifact.
    pub fn host(&self) -> &'static str {
        match self {
            Kubelet { .. } | Kubeadm { .. } | Kubectl { .. } => KUBERNETES_RELEASE_HOST,
            _ => GITHUB_HOST,
        }
    }

    /// Base URL on `host`; GitHub artifacts add their organization.
    pub fn base_url_on(&self, host: &str) -> String {
        let host = host.trim_end_matches('/');
        let org = match self {
            Kubelet { .. } | Kubeadm { .. } | Kubectl { .. } => return host.to_string(),
            Calicoctl { .. } | CalicoCrds { .. } => "projectcalico",
            Crictl { .. } => "kubernetes-sigs",
            Cni { .. } => "containernetworking",
        };
        format!("{host}/{org}")
    }

    pub fn base_url(&self) -> String {
        self.base_url_on(self.host())
    }

    /// Path below [Artifact::base_url], reproduced verbatim under the output directory.
    pub fn relative_path(&self) -> String {
        match self {
            Kubelet { version, arch } | Kubeadm { version, arch } | Kubectl { version, arch } => format!(
                "kubernetes-release/release/{version}/bin/linux/{arch}/{}",
                self.name()
            ),
            Calicoctl { version, arch } => {
                format!("calicoctl/releases/download/{version}/calicoctl-linux-{arch}")
            }
            Crictl { version, arch } => {
                format!("cri-tools/releases/download/{version}/crictl-{version}-linux-{arch}.tar.gz")
            }
            Cni { version, arch } => {
                format!("plugins/releases/download/{version}/cni-plugins-linux-{arch}-{version}.tgz")
            }
            CalicoCrds { version } => format!("calico/archive/{version}.tar.gz"),
        }
    }

    pub fn url(&self) -> String {
        self.url_on(self.host())
    }

    /// Download URL with the upstream host replaced by `host`.
    pub fn url_on(&self, host: &str) -> String {
        format!("{}/{}", self.base_url_on(host), self.relative_path())
    }

    /// Final segment of the download URL.
    pub fn file_name(&self) -> String {
        let url = self.url();
        url.rsplit('/').next().unwrap_or_default().to_string()
    }

    pub fn target_dir(&self, root: &Path) -> PathBuf {
        let relative_path = self.relative_path();
        match Path::new(&relative_path).parent() {
            Some(parent) => root.join(parent),
            None => root.to_path_buf(),
        }
    }

    pub fn target_path(&self, root: &Path) -> PathBuf {
        self.target_dir(root).join(self.file_name())
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.arch() {
            Some(arch) => write!(f, "{} {} ({arch})", self.name(), self.version()),
            None => write!(f, "{} {}", self.name(), self.version()),
        }
    }
}

/// kubectl, kubeadm and kubelet for each architecture of a Kubernetes release.
pub fn kubernetes_binaries(version: &str, arches: &[String]) -> Vec<Artifact> {
    let constructors: [fn(String, String) -> Artifact; 3] = [
        |version, arch| Kubectl { version, arch },
        |version, arch| Kubeadm { version, arch },
        |version, arch| Kubelet { version, arch },
    ];
    constructors
        .iter()
        .flat_map(|new| arches.iter().map(move |arch| new(version.to_string(), arch.clone())))
        .collect()
}
