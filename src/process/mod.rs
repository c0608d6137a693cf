//! External tool invocation seam.
//!
//! Every external effect of the pipeline (git, pip, the build frontend, the
//! uploader, the docs tooling) goes through [`ToolRunner`]. Production code
//! uses [`ProcessRunner`], which spawns real processes through tokio; tests
//! substitute a recording fake. Secret environment values are flagged on the
//! invocation and never reach logs or user-facing output.

use crate::error::{EnvironmentError, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

/// One environment variable handed to a spawned tool
#[derive(Debug, Clone)]
pub struct EnvVar {
    /// Variable name
    pub key: String,
    /// Variable value
    pub value: String,
    /// Whether the value must be kept out of logs
    pub secret: bool,
}

/// A single external tool invocation
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Program to run
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment on top of the runner's base environment
    pub env: Vec<EnvVar>,
}

impl ToolInvocation {
    /// Create an invocation of `program` in `cwd`.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a plain environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar {
            key: key.into(),
            value: value.into(),
            secret: false,
        });
        self
    }

    /// Add an environment variable whose value is redacted from logs.
    pub fn secret_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar {
            key: key.into(),
            value: value.into(),
            secret: true,
        });
        self
    }

    /// Loggable rendering of the invocation. Secret values never appear here;
    /// secret variables are shown as `KEY=***`.
    pub fn display_line(&self) -> String {
        let mut line = String::new();
        for var in &self.env {
            if var.secret {
                line.push_str(&format!("{}=*** ", var.key));
            } else {
                line.push_str(&format!("{}={} ", var.key, var.value));
            }
        }
        line.push_str(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured output of a finished tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, -1 when terminated by signal
    pub code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited with status zero.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Best human-readable failure detail: stderr when present, stdout otherwise.
    pub fn detail(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if text.is_empty() {
            format!("exit code {}", self.code)
        } else {
            text.to_string()
        }
    }
}

/// Abstraction over spawning external tools.
///
/// `run` resolves to the tool's captured output regardless of exit status;
/// callers map non-zero exits to their own error class. An `Err` from `run`
/// means the tool could not be started at all.
pub trait ToolRunner {
    /// Run one tool to completion and capture its output.
    fn run(&self, invocation: ToolInvocation) -> impl Future<Output = Result<ToolOutput>> + Send;

    /// Resolve an executable on the runner's search path.
    fn lookup(&self, program: &str) -> Result<PathBuf>;
}

/// Tool runner spawning real processes.
///
/// Carries the worker environment configuration: the timezone exported to
/// every child and the directories prepended to the child search path.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timezone: String,
    path_prepends: Vec<PathBuf>,
}

impl ProcessRunner {
    /// Create a runner with the given child environment configuration.
    pub fn new(timezone: impl Into<String>, path_prepends: Vec<PathBuf>) -> Self {
        Self {
            timezone: timezone.into(),
            path_prepends,
        }
    }

    /// Search path for children: configured prepends, then the inherited PATH.
    fn search_path(&self) -> std::ffi::OsString {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let mut parts: Vec<PathBuf> = self.path_prepends.clone();
        parts.extend(std::env::split_paths(&inherited));
        std::env::join_paths(parts).unwrap_or(inherited)
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: ToolInvocation) -> impl Future<Output = Result<ToolOutput>> + Send {
        async move {
            log::debug!("running: {}", invocation.display_line());

            let mut command = tokio::process::Command::new(&invocation.program);
            command
                .args(&invocation.args)
                .current_dir(&invocation.cwd)
                .env("TZ", &self.timezone)
                .env("PATH", self.search_path())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            for var in &invocation.env {
                command.env(&var.key, &var.value);
            }

            let output = command.output().await.map_err(|e| EnvironmentError::SpawnFailed {
                program: invocation.program.clone(),
                source: e,
            })?;

            let result = ToolOutput {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            log::debug!("finished: {} (exit {})", invocation.program, result.code);
            Ok(result)
        }
    }

    fn lookup(&self, program: &str) -> Result<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(program, Some(self.search_path()), cwd).map_err(|_| {
            EnvironmentError::MissingExecutable {
                name: program.to_string(),
            }
            .into()
        })
    }
}
