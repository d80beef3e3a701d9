//! Image and release binary mirroring.
use std::path::PathBuf;
use clap::{Parser, Subcommand};
use log::{error, info};
use msync::artifact::Artifact;
use msync::command::{DryRun, Runner, ShellRunner};
use msync::download::Downloader;
use msync::pipeline::{self, FailurePolicy, Summary};
use msync::{config, Error};

/// Mirror container images into a private registry and download release binaries.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "Commands and their output are printed to stdout. Progress logs, the \
                  run summary and errors go to stderr; set RUST_LOG to change the level."
)]
struct Cli {
    /// Path to the job list. Defaults to ./msync.toml, then the built-in list.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target registry, overriding `target_registry` from the job list.
    #[arg(long)]
    registry: Option<String>,

    /// Root directory for downloaded artifacts.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep going or stop after the first failed job.
    #[arg(long, value_enum)]
    on_failure: Option<FailurePolicy>,

    /// Print commands and downloads without executing them.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mirror every configured image, with a manifest list for multi-arch images.
    Images,
    /// Copy the cluster-proportional-autoscaler images as-is.
    Autoscaler,
    /// Download every configured release artifact.
    Download,
    /// Print the resolved jobs without running them.
    List,
}

/// Read the job list from disk, or fall back to the
/// `default.toml` [built-in list](../default.toml).
///
/// If a configuration file name is not set explicitly, this function will
/// detect whether a file with the default file name exists in the working
/// directory. If it does, it is used implicitly.
fn read_config(args: &Cli) -> Result<config::File, Error> {
    const DEFAULT_CONFIG_FILE: &str = "msync.toml";

    let config_file = match &args.config {
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                Some(path)
            } else {
                None
            }
        }
        Some(c) => Some(c.clone()),
    };

    let mut cfg = match config_file {
        Some(path) => {
            info!("Reading job list from {}", path.display());
            config::File::from_path(&path)?
        }
        None => config::File::default(),
    };

    if let Some(registry) = &args.registry {
        cfg.target_registry = Some(registry.clone());
    }
    if let Some(output) = &args.output {
        cfg.output_dir = output.clone();
    }
    if let Some(policy) = args.on_failure {
        cfg.on_failure = policy;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err.to_string());
            std::process::exit(1)
        }
    }
}

async fn run() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let cfg = read_config(&args)?;
    let policy = cfg.on_failure;

    let mut runner: Box<dyn Runner> = if args.dry_run {
        Box::new(DryRun::new(std::io::stdout()))
    } else {
        Box::new(ShellRunner::stdout())
    };

    let summary = match args.command {
        Commands::Images => {
            let images = cfg.images()?;
            pipeline::mirror_images(runner.as_mut(), &cfg.docker, &images, policy)
        }
        Commands::Autoscaler => {
            let registry = cfg.registry()?;
            pipeline::copy_images(runner.as_mut(), &cfg.docker, &cfg.autoscaler.images, registry, policy)
        }
        Commands::Download => {
            let artifacts = cfg.artifacts();
            if args.dry_run {
                for artifact in &artifacts {
                    println!("{} -> {}", download_url(&cfg, artifact), artifact.target_path(&cfg.output_dir).display());
                }
                return Ok(());
            }
            let mut downloader = Downloader::new()?;
            if let Some(host) = &cfg.download_host {
                downloader = downloader.with_host(host);
            }
            pipeline::download_artifacts(&downloader, &artifacts, &cfg.output_dir, policy).await
        }
        Commands::List => {
            list(&cfg)?;
            return Ok(());
        }
    };

    finish(summary)
}

fn list(cfg: &config::File) -> Result<(), Error> {
    for image in cfg.images()? {
        println!(
            "image {} -> {} [{}]",
            image.source_path(),
            image.target_path(),
            image.architectures().join(", ")
        );
    }
    for source in &cfg.autoscaler.images {
        println!("autoscaler {source}");
    }
    for artifact in cfg.artifacts() {
        println!(
            "download {} -> {}",
            download_url(cfg, &artifact),
            artifact.target_path(&cfg.output_dir).display()
        );
    }
    Ok(())
}

fn download_url(cfg: &config::File, artifact: &Artifact) -> String {
    match &cfg.download_host {
        Some(host) => artifact.url_on(host),
        None => artifact.url(),
    }
}

fn finish(summary: Summary) -> Result<(), Error> {
    summary.report();
    if summary.is_success() {
        Ok(())
    } else {
        Err(Error::JobsFailed(summary.failed.len()))
    }
}
