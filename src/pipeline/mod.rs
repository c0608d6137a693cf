//! The release pipeline.
//!
//! Fourteen steps, strictly sequential, fail-fast: the first failing step
//! aborts the run and no later step executes. Side effects already committed
//! (the local tag, built artifacts) are left in place; cleanup is the
//! operator's call and is spelled out by the error's recovery suggestions.
//!
//! The publish gate is the only branch: with `publish` the artifacts are
//! uploaded to the package index and the tag is pushed (upload strictly
//! first); without it the run is a dry run that ends with a local tag and
//! unpublished artifacts.

use crate::artifacts::ArtifactSet;
use crate::changelog;
use crate::cli::OutputManager;
use crate::environment;
use crate::error::{BuildError, DocsError, PublishError, Result};
use crate::git::Git;
use crate::process::{ToolInvocation, ToolRunner};
use crate::version::{self, BumpLevel};
use crate::ReleaseConfig;
use chrono::{DateTime, Utc};
use semver::Version;
use std::path::PathBuf;

/// Outcome of a completed release run
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReleaseOutcome {
    /// Requested increment level
    pub level: BumpLevel,
    /// Version the run started from
    pub current: Version,
    /// Version that was released
    pub next: Version,
    /// Release tag created locally
    pub tag: String,
    /// Whether artifacts were uploaded to the package index
    pub published: bool,
    /// Whether the release tag was pushed to the remote
    pub tag_pushed: bool,
    /// Ref the documentation was built from
    pub docs_ref: String,
    /// Working branch the documentation was built on
    pub docs_branch: String,
    /// Verified artifact paths, sdist first
    pub artifacts: Vec<PathBuf>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

/// Executes the release steps in order against a tool runner.
pub struct ReleasePipeline<'a, R> {
    runner: &'a R,
    config: &'a ReleaseConfig,
    output: &'a OutputManager,
}

impl<'a, R: ToolRunner> ReleasePipeline<'a, R> {
    /// Create a pipeline over `runner` with the given configuration.
    pub fn new(runner: &'a R, config: &'a ReleaseConfig, output: &'a OutputManager) -> Self {
        Self {
            runner,
            config,
            output,
        }
    }

    /// Run the whole pipeline.
    ///
    /// `level` picks the version increment, `publish` opens the publish gate.
    /// Each step either fully completes or aborts the run.
    pub async fn run(&self, level: BumpLevel, publish: bool) -> Result<ReleaseOutcome> {
        let started_at = Utc::now();
        let git = Git::new(self.runner, &self.config.repo_dir, &self.config.remote);

        // ===== STEPS 1-3: WORKER ENVIRONMENT =====
        self.output.section("Environment");
        self.output.info(&format!(
            "timezone {} for all spawned tools",
            self.config.timezone
        ));
        self.output.progress("Fetching full history and tags...");
        git.fetch_full_history().await?;
        let mut required: Vec<&str> = environment::REQUIRED_TOOLS.to_vec();
        required.push(self.config.python.as_str());
        environment::check_runtimes(self.runner, &required)?;
        self.output.success("Environment ready");

        // ===== STEPS 4-5: VERSIONS =====
        self.output.section("Version");
        let tags = git.tags().await?;
        let current = version::latest(&tags);
        let next = version::bump(&current, level);
        let tag = version::tag_name(&next);
        self.output.info(&format!(
            "current v{current}, next {tag} ({level} bump)"
        ));

        // ===== STEP 6: LOCAL TAG =====
        let message = format!(
            "{} {tag}, released {}",
            self.config.package_name,
            started_at.format("%Y-%m-%d")
        );
        git.create_annotated_tag(&tag, &message).await?;
        self.output.success(&format!("Tagged {tag} (local only)"));

        // ===== STEP 7: INSTALL =====
        self.output.section("Build");
        self.output.progress(&format!(
            "Installing {}...",
            self.config.install_spec()
        ));
        self.install().await?;

        // ===== STEP 8: BUILD =====
        self.output.progress("Building sdist and wheel...");
        self.build().await?;

        // ===== STEP 9: VERIFY =====
        let artifacts =
            ArtifactSet::for_version(&self.config.dist_path(), &self.config.package_name, &next);
        artifacts.verify()?;
        for path in artifacts.paths() {
            self.output.indent(&format!("{}", path.display()));
        }
        self.output.success("Artifacts verified");

        // ===== STEPS 10-11: PUBLISH GATE =====
        let (published, tag_pushed) = if publish {
            self.output.section("Publish");
            self.output.progress("Uploading to the package index...");
            self.upload(&artifacts).await?;
            self.output.success("Uploaded sdist and wheel");

            // The tag becomes public only after the index accepted the upload.
            git.push_tag(&tag).await?;
            self.output.success(&format!(
                "Pushed {tag} to {}",
                self.config.remote
            ));
            (true, true)
        } else {
            self.output.warn("Dry run: skipping upload and tag push");
            (false, false)
        };

        // ===== STEP 12: DOCS CHECKOUT =====
        self.output.section("Documentation");
        let docs_ref = if publish {
            tag.clone()
        } else {
            // Dry runs and test builds document the newest locally created
            // tag, which is normally the one this run just made.
            git.newest_tag_by_creation()
                .await?
                .unwrap_or_else(|| tag.clone())
        };
        let docs_branch = format!("docs/{docs_ref}");
        git.switch_new_branch(&docs_branch, &docs_ref).await?;
        self.output.info(&format!("building docs from {docs_ref} on {docs_branch}"));

        // ===== STEP 13: DOCS BUILD =====
        let page = changelog::generate(
            &git,
            &self.config.repo_dir,
            &self.config.package_name,
            &self.config.commit_base_url,
        )
        .await?;
        self.output.indent(&format!("changelog: {}", page.display()));
        self.build_site().await?;
        self.output.success("Documentation built");

        // ===== STEP 14: DOCS DEPLOY =====
        self.deploy_site(&docs_ref).await?;
        self.output.success(&format!(
            "Documentation deployed to {}",
            self.config.pages_branch
        ));

        Ok(ReleaseOutcome {
            level,
            current,
            next,
            tag,
            published,
            tag_pushed,
            docs_ref,
            docs_branch,
            artifacts: vec![artifacts.sdist.clone(), artifacts.wheel.clone()],
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn python(&self) -> ToolInvocation {
        ToolInvocation::new(&self.config.python, &self.config.repo_dir)
    }

    async fn install(&self) -> Result<()> {
        let spec = self.config.install_spec();
        let invocation = self
            .python()
            .args(["-m", "pip", "install", "--upgrade"])
            .arg(&spec);
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(BuildError::InstallFailed {
                spec,
                reason: output.detail(),
            }
            .into())
        }
    }

    async fn build(&self) -> Result<()> {
        let invocation = self
            .python()
            .args(["-m", "build", "--sdist", "--wheel", "--outdir"])
            .arg(self.config.dist_path().display().to_string());
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(BuildError::BuildFailed {
                reason: output.detail(),
            }
            .into())
        }
    }

    async fn upload(&self, artifacts: &ArtifactSet) -> Result<()> {
        let token = self.config.index_token.as_ref().ok_or_else(|| {
            PublishError::MissingToken {
                variable: self.config.index_token_var.clone(),
            }
        })?;

        let mut invocation = self
            .python()
            .args(["-m", "twine", "upload", "--non-interactive"])
            .env("TWINE_USERNAME", "__token__")
            .secret_env("TWINE_PASSWORD", token);
        for path in artifacts.paths() {
            invocation = invocation.arg(path.display().to_string());
        }

        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(PublishError::UploadFailed {
                reason: output.detail(),
            }
            .into())
        }
    }

    async fn build_site(&self) -> Result<()> {
        let invocation = self
            .python()
            .args(["-m", "mkdocs", "build", "--clean", "--site-dir"])
            .arg(self.config.site_path().display().to_string());
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(DocsError::SiteBuildFailed {
                reason: output.detail(),
            }
            .into())
        }
    }

    async fn deploy_site(&self, docs_ref: &str) -> Result<()> {
        let mut invocation = ToolInvocation::new("ghp-import", &self.config.repo_dir)
            .args(["--no-jekyll", "--push", "--force"])
            .args(["--branch", self.config.pages_branch.as_str()])
            .args(["--remote", self.config.remote.as_str()])
            .arg("--message")
            .arg(format!("Deploy documentation for {docs_ref}"));
        if let Some(prefix) = &self.config.pages_prefix {
            invocation = invocation.args(["--prefix", prefix.as_str()]);
        }
        invocation = invocation.arg(self.config.site_path().display().to_string());
        if let Some(token) = &self.config.pages_token {
            invocation = invocation.secret_env(&self.config.pages_token_var, token);
        }

        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(DocsError::DeployFailed {
                reason: output.detail(),
            }
            .into())
        }
    }
}
