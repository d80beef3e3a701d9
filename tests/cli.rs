use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const JOBS: &str = r#"
target_registry = "registry.example.com/mirror"
output_dir = "out"

[[image]]
source_registry = "docker.io/library"
source_name = "nginx"
tag = "1.19"

[[image]]
source_registry = "quay.io/coreos"
source_name = "etcd"
tag = "v3.4.13"
arch = ["arm64"]

[[download]]
kind = "kubectl"
version = "v1.20.0"
arch = "amd64"
"#;

fn msync(dir: &tempfile::TempDir) -> Command {
    fs::write(dir.path().join("jobs.toml"), JOBS).unwrap();
    let mut cmd = Command::cargo_bin("msync").unwrap();
    cmd.current_dir(dir.path()).arg("--config").arg("jobs.toml");
    cmd
}

#[test]
fn help_mentions_purpose() {
    Command::cargo_bin("msync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mirror container images"))
        .stdout(predicate::str::contains("errors go to stderr"));
}

#[test]
fn dry_run_images_prints_commands_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = msync(&dir).args(["--dry-run", "images"]).assert().success().get_output().stdout.clone();
    let lines: Vec<String> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();

    assert_eq!(lines.len(), 10 + 3);
    assert_eq!(lines[0], "docker pull docker.io/library/nginx:1.19 --platform amd64");
    assert_eq!(lines[9], "docker manifest push registry.example.com/mirror/nginx:1.19");
    assert_eq!(lines[10], "docker pull quay.io/coreos/etcd:v3.4.13-arm64");
}

#[test]
fn registry_override() {
    let dir = tempfile::tempdir().unwrap();
    msync(&dir)
        .args(["--dry-run", "--registry", "other.example.com", "autoscaler"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "docker push other.example.com/cluster-proportional-autoscaler-amd64:1.8.5",
        ));
}

#[test]
fn dry_run_download_prints_mirrored_path() {
    let dir = tempfile::tempdir().unwrap();
    msync(&dir)
        .args(["--dry-run", "download"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://storage.googleapis.com/kubernetes-release/release/v1.20.0/bin/linux/amd64/kubectl -> out/kubernetes-release/release/v1.20.0/bin/linux/amd64/kubectl",
        ));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn download_host_override() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = JOBS.replace("output_dir = \"out\"", "output_dir = \"out\"\ndownload_host = \"http://files.example.com\"");
    fs::write(dir.path().join("mirror.toml"), jobs).unwrap();

    Command::cargo_bin("msync")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", "mirror.toml", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "download http://files.example.com/kubernetes-release/release/v1.20.0/bin/linux/amd64/kubectl -> out/kubernetes-release/",
        ));
}

#[test]
fn failed_command_sets_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = JOBS.replace("output_dir = \"out\"", "output_dir = \"out\"\ndocker = \"false\"");
    fs::write(dir.path().join("failing.toml"), jobs).unwrap();

    Command::cargo_bin("msync")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", "failing.toml", "images"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 job(s) failed"));
}

#[test]
fn missing_config_file() {
    Command::cargo_bin("msync")
        .unwrap()
        .args(["--config", "/nonexistent/msync.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read /nonexistent/msync.toml"));
}
