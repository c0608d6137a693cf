//! # grizzly-release
//!
//! Release orchestrator for the `grizzly-loadtester` Python package.
//!
//! One invocation performs a complete release run: environment preparation,
//! version computation from git tag history, local tagging, package build,
//! artifact verification, optional publishing, and documentation deployment.
//! The run is strictly sequential and fail-fast: the first failing step aborts
//! the run with a non-zero exit code and no rollback of side effects already
//! committed (a local tag in particular is left in place).
//!
//! ## Usage
//!
//! ```bash
//! grizzly-release                  # dry run, patch bump
//! grizzly-release minor            # dry run, minor bump
//! grizzly-release major --publish  # publish to the package index and push the tag
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod artifacts;
pub mod changelog;
pub mod cli;
pub mod environment;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod process;
pub mod version;

// Re-export main types for public API
pub use artifacts::ArtifactSet;
pub use cli::Args;
pub use error::{ReleaseError, Result};
pub use pipeline::{ReleaseOutcome, ReleasePipeline};
pub use process::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use version::BumpLevel;

use std::path::{Path, PathBuf};

/// Configuration for a release run.
///
/// Defaults describe the `grizzly-loadtester` repository; the CLI layer
/// overrides paths and remotes from arguments. Secrets are resolved by the
/// caller (never read inside the pipeline) so tests can inject them.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Repository the release operates on
    pub repo_dir: PathBuf,
    /// Git remote receiving the release tag
    pub remote: String,
    /// Build output directory, relative to the repository unless absolute
    pub dist_dir: PathBuf,
    /// Documentation site output directory, relative to the repository unless absolute
    pub site_dir: PathBuf,
    /// Distribution name of the released package
    pub package_name: String,
    /// Package extras installed before building
    pub extras: Vec<String>,
    /// Python interpreter used for pip, the build frontend, the uploader and the docs generator
    pub python: String,
    /// Timezone exported to every spawned tool
    pub timezone: String,
    /// Directories prepended to the search path of every spawned tool
    pub path_prepends: Vec<PathBuf>,
    /// Package index upload token, if resolved by the caller
    pub index_token: Option<String>,
    /// Environment variable the upload token is expected in (used in diagnostics)
    pub index_token_var: String,
    /// Publishing-platform token for the site deployment, if resolved by the caller
    pub pages_token: Option<String>,
    /// Environment variable carrying the publishing-platform token
    pub pages_token_var: String,
    /// Branch the documentation site is deployed to
    pub pages_branch: String,
    /// Subpath prefix on the publishing branch, if any
    pub pages_prefix: Option<String>,
    /// Base URL for commit links in the generated changelog
    pub commit_base_url: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            remote: "origin".to_string(),
            dist_dir: PathBuf::from("dist"),
            site_dir: PathBuf::from("site"),
            package_name: "grizzly-loadtester".to_string(),
            extras: vec!["ci".to_string(), "docs".to_string()],
            python: "python3".to_string(),
            timezone: "Etc/UTC".to_string(),
            path_prepends: Vec::new(),
            index_token: None,
            index_token_var: "PYPI_API_TOKEN".to_string(),
            pages_token: None,
            pages_token_var: "GITHUB_TOKEN".to_string(),
            pages_branch: "gh-pages".to_string(),
            pages_prefix: None,
            commit_base_url: "https://github.com/Biometria-se/grizzly".to_string(),
        }
    }
}

impl ReleaseConfig {
    /// Build output directory resolved against the repository.
    pub fn dist_path(&self) -> PathBuf {
        resolve(&self.repo_dir, &self.dist_dir)
    }

    /// Site output directory resolved against the repository.
    pub fn site_path(&self) -> PathBuf {
        resolve(&self.repo_dir, &self.site_dir)
    }

    /// Pip requirement specifier for the package with its extras, e.g. `.[ci,docs]`.
    pub fn install_spec(&self) -> String {
        if self.extras.is_empty() {
            ".".to_string()
        } else {
            format!(".[{}]", self.extras.join(","))
        }
    }
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}
