use std::io::{BufRead, BufReader, Write};
use std::process::{ChildStdout, Command, Stdio};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("spawn `{command}`: {err}")]
    Spawn {
        command: String,
        err: std::io::Error,
    },

    #[error("read command output: {0}")]
    Output(#[from] std::io::Error),

    #[error("`{command}` exited with code {code}")]
    Failed {
        command: String,
        code: i32,
    },
}

/// Executes a single shell command line and reports its exit code.
pub trait Runner {
    fn run(&mut self, command_line: &str) -> Result<i32, Error>;
}

/// Runs commands through `sh -c`, echoing the command line and streaming
/// the combined stdout/stderr of the child line by line.
pub struct ShellRunner<W: Write> {
    out: W,
}

impl ShellRunner<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write> ShellRunner<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Copy child output line by line. Bytes that are not UTF-8 are replaced.
    fn forward(&mut self, stdout: ChildStdout) -> std::io::Result<()> {
        let mut reader = BufReader::new(stdout);
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(());
            }
            writeln!(self.out, "{}", String::from_utf8_lossy(&line).trim_end())?;
            self.out.flush()?;
        }
    }
}

impl<W: Write> Runner for ShellRunner<W> {
    fn run(&mut self, command_line: &str) -> Result<i32, Error> {
        writeln!(self.out, "{command_line}")?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(format!("exec 2>&1\n{command_line}"))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|err| Error::Spawn {
                command: command_line.to_string(),
                err,
            })?;

        let forwarded = match child.stdout.take() {
            Some(stdout) => self.forward(stdout),
            None => Ok(()),
        };
        // Reap the child even when forwarding its output failed.
        let status = child.wait()?;
        forwarded?;
        debug!("`{command_line}` finished with {status}");
        // No code means the child was terminated by a signal.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Prints and records command lines without executing anything.
pub struct DryRun<W: Write> {
    out: W,
    pub commands: Vec<String>,
}

impl<W: Write> DryRun<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            commands: Vec::new(),
        }
    }
}

impl<W: Write> Runner for DryRun<W> {
    fn run(&mut self, command_line: &str) -> Result<i32, Error> {
        writeln!(self.out, "{command_line}")?;
        self.commands.push(command_line.to_string());
        Ok(0)
    }
}

/// Runs every command in order, stopping at the first non-zero exit.
pub fn run_many<R, I, S>(runner: &mut R, commands: I) -> Result<(), Error>
where
    R: Runner + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for command in commands {
        let command = command.as_ref();
        match runner.run(command)? {
            0 => {}
            code => {
                return Err(Error::Failed {
                    command: command.to_string(),
                    code,
                })
            }
        }
    }
    Ok(())
}
