//! Running the external build tool
//!
//! The resolver only ever sees [`ToolRunner`]; [`ProcessRunner`] is the real
//! subprocess implementation.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Arguments for one tool run, without the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { args, timeout }
    }

    /// First argument, e.g. `targets` or `build`.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    /// `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ToolStatus,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: ToolStatus::Success,
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            status: ToolStatus::Failed { code: Some(code) },
        }
    }

    pub fn timed_out() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status: ToolStatus::TimedOut,
        }
    }

    /// Non-empty stdout lines, surrounding whitespace trimmed.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout
            .trim()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Last `count` lines of `text`.
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Something that can run the build tool synchronously.
pub trait ToolRunner {
    /// Human-readable command line, used in error messages.
    fn command_line(&self, invocation: &Invocation) -> String;

    /// Run to completion or until the invocation's timeout.
    ///
    /// A non-zero exit or a timeout is reported through [`ToolStatus`]; `Err`
    /// means the tool could not be run at all.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

/// Spawns the build tool as a child process in the project root.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    working_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Runner for the configured executable, resolved on `PATH` when possible.
    ///
    /// An executable that cannot be found is kept as given; the failure then
    /// surfaces as [`ResolveError::ToolLaunch`] on first use, so targets that
    /// are already built resolve without buck installed.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let program = match which::which(&config.buck_path) {
            Ok(path) => {
                debug!("Using build tool at {}", path.display());
                path
            }
            Err(e) => {
                debug!("Could not locate {}: {}", config.buck_path.display(), e);
                config.buck_path.clone()
            }
        };
        Self::new(program, &config.project_root)
    }
}

impl ToolRunner for ProcessRunner {
    fn command_line(&self, invocation: &Invocation) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(invocation.args.iter().cloned());
        parts.join(" ")
    }

    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let command = self.command_line(invocation);
        debug!("Running `{}`", command);

        let mut child = Command::new(&self.program)
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ResolveError::ToolLaunch {
                command: command.clone(),
                source,
            })?;

        let stdout = drain_pipe(child.stdout.take());
        let stderr = drain_pipe(child.stderr.take());

        let waited = match invocation.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit),
            None => child.wait().map(Some),
        };
        let status = match waited {
            Ok(status) => status,
            Err(source) => {
                cleanup_process(&mut child);
                return Err(ResolveError::ToolLaunch { command, source });
            }
        };

        let Some(status) = status else {
            // Grandchildren (buckd) may still hold the pipes open; leave the
            // reader threads behind instead of blocking on them.
            warn!("`{}` did not finish in time", command);
            return Ok(ToolOutput::timed_out());
        };

        Ok(ToolOutput {
            stdout: collect_pipe(stdout),
            stderr: collect_pipe(stderr),
            status: if status.success() {
                ToolStatus::Success
            } else {
                ToolStatus::Failed {
                    code: status.code(),
                }
            },
        })
    }
}

/// `Ok(None)` when the deadline passed; the child has been killed by then.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            cleanup_process(child);
            return Ok(None);
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}

fn cleanup_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain_pipe<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf) {
                debug!("Failed to read tool output: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect_pipe(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
