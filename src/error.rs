//! Error types for release operations.
//!
//! Every failure class of the pipeline has its own error enum, collected under
//! [`ReleaseError`]. Errors carry actionable messages and recovery suggestions;
//! nothing is retried, the first failure aborts the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Worker environment and runtime provisioning errors
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Version computation errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Package install and build errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Artifact verification errors
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Package index publishing errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Documentation build and deployment errors
    #[error("Docs error: {0}")]
    Docs(#[from] DocsError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Worker environment errors
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// A required executable is not on the search path
    #[error("Required executable '{name}' not found on the search path")]
    MissingExecutable {
        /// Executable name
        name: String,
    },

    /// A tool could not be started at all
    #[error("Failed to start '{program}': {source}")]
    SpawnFailed {
        /// Program that could not be spawned
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Fetching the full version-control history failed
    #[error("Failed to fetch full history from '{remote}': {reason}")]
    HistoryFetchFailed {
        /// Remote that was fetched
        remote: String,
        /// Reason for the error
        reason: String,
    },
}

/// Version computation errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Tag does not have the release tag form
    #[error("Tag '{tag}' is not a release tag (expected vMAJOR.MINOR.PATCH)")]
    InvalidTag {
        /// Offending tag
        tag: String,
    },

    /// Version parsing failed
    #[error("Failed to parse version '{version}': {source}")]
    ParseFailed {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Tag already exists locally, typically from an earlier run
    #[error("Git tag '{tag}' already exists")]
    TagExists {
        /// Tag name
        tag: String,
    },

    /// Tag creation failed
    #[error("Failed to create tag '{tag}': {reason}")]
    TagCreationFailed {
        /// Tag name
        tag: String,
        /// Reason for the error
        reason: String,
    },

    /// Pushing the release tag failed
    #[error("Failed to push tag '{tag}' to '{remote}': {reason}")]
    PushFailed {
        /// Tag name
        tag: String,
        /// Remote name
        remote: String,
        /// Reason for the error
        reason: String,
    },

    /// Branch checkout failed
    #[error("Failed to check out '{branch}': {reason}")]
    CheckoutFailed {
        /// Branch name
        branch: String,
        /// Reason for the error
        reason: String,
    },

    /// Any other git invocation failed
    #[error("Git {operation} failed: {reason}")]
    CommandFailed {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },
}

/// Package install and build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Installing the package with its extras failed
    #[error("Failed to install '{spec}': {reason}")]
    InstallFailed {
        /// Requirement specifier that failed to resolve
        spec: String,
        /// Reason for the error
        reason: String,
    },

    /// Building the distribution artifacts failed
    #[error("Failed to build distribution artifacts: {reason}")]
    BuildFailed {
        /// Reason for the error
        reason: String,
    },
}

/// Artifact verification errors
#[derive(Error, Debug)]
pub enum VerifyError {
    /// An expected artifact is missing after the build
    #[error("Expected artifact missing after build: {path}")]
    ArtifactMissing {
        /// Expected artifact path
        path: PathBuf,
    },
}

/// Package index publishing errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// Upload token not present in the environment
    #[error("Upload token not set: export {variable} before publishing")]
    MissingToken {
        /// Environment variable expected to hold the token
        variable: String,
    },

    /// The index rejected the upload
    #[error("Artifact upload failed: {reason}")]
    UploadFailed {
        /// Reason for the error
        reason: String,
    },
}

/// Documentation build and deployment errors
#[derive(Error, Debug)]
pub enum DocsError {
    /// Static site generation failed
    #[error("Documentation build failed: {reason}")]
    SiteBuildFailed {
        /// Reason for the error
        reason: String,
    },

    /// Deploying the site to the publishing branch failed
    #[error("Documentation deployment failed: {reason}")]
    DeployFailed {
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Environment(EnvironmentError::MissingExecutable { name }) => vec![
                format!("Install '{name}' and ensure it is on PATH"),
                "Use --path-prepend to extend the search path for spawned tools".to_string(),
            ],
            ReleaseError::Git(GitError::TagExists { tag }) => vec![
                format!("Delete the tag left behind by an earlier run: git tag --delete {tag}"),
                "A failed run does not roll back its local tag".to_string(),
            ],
            ReleaseError::Publish(PublishError::MissingToken { variable }) => vec![
                format!("Export {variable} with a valid package index token"),
                "Run without --publish to perform a dry run".to_string(),
            ],
            ReleaseError::Publish(PublishError::UploadFailed { .. }) => vec![
                "Check whether this version already exists on the index".to_string(),
                "Verify the upload token has not expired".to_string(),
            ],
            ReleaseError::Verify(VerifyError::ArtifactMissing { path }) => vec![
                format!("Check the build output for {}", path.display()),
                "A name mismatch usually means the version metadata and the tag disagree"
                    .to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
