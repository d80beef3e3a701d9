use log::debug;
use thiserror::Error;
use crate::command::{self, Runner};

#[derive(Error, Debug)]
pub enum Error {
    #[error("docker pull failed with exit code {code}: {command}")]
    Pull { command: String, code: i32 },

    #[error("docker tag failed with exit code {code}: {command}")]
    Tag { command: String, code: i32 },

    #[error("docker push failed with exit code {code}: {command}")]
    Push { command: String, code: i32 },

    #[error("docker manifest create failed with exit code {code}: {command}")]
    ManifestCreate { command: String, code: i32 },

    #[error("docker manifest annotate failed with exit code {code}: {command}")]
    ManifestAnnotate { command: String, code: i32 },

    #[error("docker manifest push failed with exit code {code}: {command}")]
    ManifestPush { command: String, code: i32 },

    #[error(transparent)]
    Runner(#[from] command::Error),
}

/// Container CLI driven through a [Runner], one command line per operation.
pub struct Docker<'r> {
    runner: &'r mut dyn Runner,
    program: String,
}

impl<'r> Docker<'r> {
    pub fn new(runner: &'r mut dyn Runner, program: &str) -> Self {
        Self {
            runner,
            program: program.to_string(),
        }
    }

    fn exec(
        &mut self,
        command: String,
        on_failure: fn(String, i32) -> Error,
    ) -> Result<(), Error> {
        match self.runner.run(&command)? {
            0 => Ok(()),
            code => Err(on_failure(command, code)),
        }
    }

    pub fn pull(&mut self, image: &str, platform: Option<&str>) -> Result<(), Error> {
        debug!("Pulling image {}", image);
        let command = match platform {
            Some(platform) => format!("{} pull {image} --platform {platform}", self.program),
            None => format!("{} pull {image}", self.program),
        };
        self.exec(command, |command, code| Error::Pull { command, code })
    }

    pub fn tag(&mut self, source: &str, target: &str) -> Result<(), Error> {
        let command = format!("{} tag {source} {target}", self.program);
        self.exec(command, |command, code| Error::Tag { command, code })
    }

    pub fn push(&mut self, image: &str) -> Result<(), Error> {
        debug!("Pushing image {}", image);
        let command = format!("{} push {image}", self.program);
        self.exec(command, |command, code| Error::Push { command, code })
    }

    pub fn manifest_create(&mut self, list: &str, images: &[String]) -> Result<(), Error> {
        let command = format!("{} manifest create {list} {}", self.program, images.join(" "));
        self.exec(command, |command, code| Error::ManifestCreate { command, code })
    }

    pub fn manifest_annotate(&mut self, list: &str, image: &str, arch: &str) -> Result<(), Error> {
        let command = format!("{} manifest annotate {list} {image} --arch {arch}", self.program);
        self.exec(command, |command, code| Error::ManifestAnnotate { command, code })
    }

    pub fn manifest_push(&mut self, list: &str) -> Result<(), Error> {
        debug!("Pushing manifest list {}", list);
        let command = format!("{} manifest push {list}", self.program);
        self.exec(command, |command, code| Error::ManifestPush { command, code })
    }
}
