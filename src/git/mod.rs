//! Version-control operations for release management.
//!
//! All git access goes through the external tool seam, like every other tool
//! the pipeline drives. The surface is exactly what a release run needs:
//! full-history fetch, tag enumeration, annotated tag creation, tag push,
//! branch checkout at a tag, and the commit log between two tags.

use crate::error::{EnvironmentError, GitError, Result};
use crate::process::{ToolInvocation, ToolOutput, ToolRunner};
use std::path::Path;

/// One line of `git log --oneline --no-abbrev` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLine {
    /// Full commit hash
    pub hash: String,
    /// Eight character short hash
    pub short_hash: String,
    /// Commit subject
    pub message: String,
}

impl CommitLine {
    /// Parse a `<full-hash> <subject>` line.
    fn parse(line: &str) -> Option<Self> {
        let (hash, message) = line.split_once(' ')?;
        if hash.len() < 8 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self {
            hash: hash.to_string(),
            short_hash: hash[..8].to_string(),
            message: message.trim().to_string(),
        })
    }
}

/// Git operations against one repository, over a tool runner.
pub struct Git<'a, R> {
    runner: &'a R,
    workdir: &'a Path,
    remote: &'a str,
}

impl<'a, R: ToolRunner> Git<'a, R> {
    /// Operate on the repository at `workdir`, pushing to `remote`.
    pub fn new(runner: &'a R, workdir: &'a Path, remote: &'a str) -> Self {
        Self {
            runner,
            workdir,
            remote,
        }
    }

    fn git(&self) -> ToolInvocation {
        ToolInvocation::new("git", self.workdir)
    }

    async fn run(&self, invocation: ToolInvocation, operation: &str) -> Result<ToolOutput> {
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(GitError::CommandFailed {
                operation: operation.to_string(),
                reason: output.detail(),
            }
            .into())
        }
    }

    /// Fetch the complete history and all tags from the remote.
    ///
    /// Workers often start from a shallow clone; later steps enumerate every
    /// existing tag, so the history must be complete. A clone that already has
    /// full history rejects `--unshallow`, in which case a plain tag fetch is
    /// performed instead.
    pub async fn fetch_full_history(&self) -> Result<()> {
        let unshallow = self
            .git()
            .args(["fetch", "--tags", "--prune", "--unshallow", self.remote]);
        let output = self.runner.run(unshallow).await?;
        if output.success() {
            return Ok(());
        }

        if output.stderr.contains("complete repository") {
            let plain = self.git().args(["fetch", "--tags", "--prune", self.remote]);
            let output = self.runner.run(plain).await?;
            if output.success() {
                return Ok(());
            }
            return Err(EnvironmentError::HistoryFetchFailed {
                remote: self.remote.to_string(),
                reason: output.detail(),
            }
            .into());
        }

        Err(EnvironmentError::HistoryFetchFailed {
            remote: self.remote.to_string(),
            reason: output.detail(),
        }
        .into())
    }

    /// List all tags.
    pub async fn tags(&self) -> Result<Vec<String>> {
        let output = self.run(self.git().args(["tag", "--list"]), "tag listing").await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// The most recently created tag, by tag creation date.
    pub async fn newest_tag_by_creation(&self) -> Result<Option<String>> {
        let invocation = self.git().args([
            "for-each-ref",
            "--sort=-creatordate",
            "--format=%(refname:short)",
            "--count=1",
            "refs/tags",
        ]);
        let output = self.run(invocation, "tag enumeration").await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    /// Create an annotated tag at HEAD, locally only.
    ///
    /// Creation is never forced; a tag left behind by an earlier run makes
    /// this fail with [`GitError::TagExists`] instead of being overwritten.
    pub async fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        let invocation = self
            .git()
            .args(["tag", "--annotate", tag, "--message", message]);
        let output = self.runner.run(invocation).await?;
        if output.success() {
            log::info!("created local tag {tag}");
            return Ok(());
        }

        if output.stderr.contains("already exists") {
            return Err(GitError::TagExists {
                tag: tag.to_string(),
            }
            .into());
        }
        Err(GitError::TagCreationFailed {
            tag: tag.to_string(),
            reason: output.detail(),
        }
        .into())
    }

    /// Push one tag to the remote.
    pub async fn push_tag(&self, tag: &str) -> Result<()> {
        let invocation = self.git().args(["push", self.remote, tag]);
        let output = self.runner.run(invocation).await?;
        if output.success() {
            log::info!("pushed tag {tag} to {}", self.remote);
            return Ok(());
        }
        Err(GitError::PushFailed {
            tag: tag.to_string(),
            remote: self.remote.to_string(),
            reason: output.detail(),
        }
        .into())
    }

    /// Create `branch` at `start_point` and switch to it.
    pub async fn switch_new_branch(&self, branch: &str, start_point: &str) -> Result<()> {
        let invocation = self.git().args(["switch", "--create", branch, start_point]);
        let output = self.runner.run(invocation).await?;
        if output.success() {
            return Ok(());
        }
        Err(GitError::CheckoutFailed {
            branch: branch.to_string(),
            reason: output.detail(),
        }
        .into())
    }

    /// Commits reachable from `newer` but not `older`, newest first, merges excluded.
    pub async fn log_between(&self, older: &str, newer: &str) -> Result<Vec<CommitLine>> {
        let range = format!("{older}...{newer}");
        let invocation = self
            .git()
            .args(["log", range.as_str(), "--oneline", "--no-abbrev", "--no-merges"]);
        let output = self.run(invocation, "log").await?;
        Ok(output.stdout.lines().filter_map(CommitLine::parse).collect())
    }
}
