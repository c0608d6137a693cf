//! End-to-end pipeline tests over a recording fake tool runner.
//!
//! No real tool is spawned: the fake answers every invocation and records it,
//! so the tests can assert what ran, in which order, and what never ran.

use grizzly_release::artifacts::ArtifactSet;
use grizzly_release::cli::OutputManager;
use grizzly_release::error::{BuildError, GitError, ReleaseError, VerifyError};
use grizzly_release::pipeline::{ReleaseOutcome, ReleasePipeline};
use grizzly_release::process::{ToolInvocation, ToolOutput, ToolRunner};
use grizzly_release::{BumpLevel, ReleaseConfig, Result};
use semver::Version;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn fail(code: i32, stderr: &str) -> ToolOutput {
    ToolOutput {
        code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Answers and records every tool invocation of a pipeline run.
#[derive(Default)]
struct FakeRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    tags: Vec<String>,
    newest_tag: Option<String>,
    fail_build: bool,
    tag_exists: bool,
}

impl FakeRunner {
    fn with_tags(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    fn respond(&self, invocation: &ToolInvocation) -> ToolOutput {
        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        match invocation.program.as_str() {
            "git" => match args.first().copied() {
                Some("fetch") => ok(""),
                Some("tag") if args.get(1) == Some(&"--list") => ok(&self.tags.join("\n")),
                Some("tag") => {
                    if self.tag_exists {
                        let tag = args.get(2).copied().unwrap_or("?");
                        fail(128, &format!("fatal: tag '{tag}' already exists"))
                    } else {
                        ok("")
                    }
                }
                Some("for-each-ref") => ok(self.newest_tag.as_deref().unwrap_or("")),
                Some("push") => ok(""),
                Some("switch") => ok(""),
                Some("log") => {
                    ok("0123456789abcdef0123456789abcdef01234567 adjust iterator timing")
                }
                _ => fail(1, "unexpected git invocation"),
            },
            "python3" => {
                if args.contains(&"pip") {
                    ok("")
                } else if args.contains(&"build") {
                    if self.fail_build {
                        fail(1, "backend blew up")
                    } else {
                        ok("")
                    }
                } else if args.contains(&"twine") || args.contains(&"mkdocs") {
                    ok("")
                } else {
                    fail(1, "unexpected python invocation")
                }
            }
            "ghp-import" => ok(""),
            _ => fail(127, "unknown program"),
        }
    }

    /// Index of the first recorded call running `program` with all of `needles`
    /// among its arguments.
    fn call_index(&self, program: &str, needles: &[&str]) -> Option<usize> {
        self.calls.lock().unwrap().iter().position(|call| {
            call.program == program
                && needles
                    .iter()
                    .all(|needle| call.args.iter().any(|arg| arg == needle))
        })
    }

    fn ran(&self, program: &str, needles: &[&str]) -> bool {
        self.call_index(program, needles).is_some()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: ToolInvocation) -> impl Future<Output = Result<ToolOutput>> + Send {
        let response = self.respond(&invocation);
        self.calls.lock().unwrap().push(invocation);
        async move { Ok(response) }
    }

    fn lookup(&self, program: &str) -> Result<PathBuf> {
        Ok(Path::new("/usr/bin").join(program))
    }
}

struct Harness {
    _repo: tempfile::TempDir,
    runner: FakeRunner,
    config: ReleaseConfig,
}

fn harness(tags: &[&str]) -> Harness {
    let repo = tempfile::tempdir().unwrap();
    let config = ReleaseConfig {
        repo_dir: repo.path().to_path_buf(),
        index_token: Some("pypi-AgEIcHlwaS5vcmc".to_string()),
        ..ReleaseConfig::default()
    };
    std::fs::create_dir_all(config.dist_path()).unwrap();
    Harness {
        _repo: repo,
        runner: FakeRunner::with_tags(tags),
        config,
    }
}

/// Place correctly named build outputs for `version` into the dist dir.
fn stage_artifacts(config: &ReleaseConfig, version: &Version) {
    let set = ArtifactSet::for_version(&config.dist_path(), &config.package_name, version);
    std::fs::write(&set.sdist, b"sdist").unwrap();
    std::fs::write(&set.wheel, b"wheel").unwrap();
}

async fn run(h: &Harness, level: BumpLevel, publish: bool) -> Result<ReleaseOutcome> {
    let output = OutputManager::new(false, true);
    ReleasePipeline::new(&h.runner, &h.config, &output)
        .run(level, publish)
        .await
}

#[tokio::test]
async fn dry_run_skips_upload_and_tag_push() {
    let h = harness(&["v1.0.0"]);
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    let outcome = run(&h, BumpLevel::Patch, false).await.unwrap();

    assert_eq!(outcome.current, Version::new(1, 0, 0));
    assert_eq!(outcome.next, Version::new(1, 0, 1));
    assert_eq!(outcome.tag, "v1.0.1");
    assert!(!outcome.published);
    assert!(!outcome.tag_pushed);

    // The local tag exists, nothing left the worker
    assert!(h.runner.ran("git", &["tag", "--annotate", "v1.0.1"]));
    assert!(!h.runner.ran("python3", &["twine"]));
    assert!(!h.runner.ran("git", &["push"]));

    // Docs still build and deploy on a dry run
    assert!(h.runner.ran("python3", &["mkdocs", "build"]));
    assert!(h.runner.ran("ghp-import", &[]));
}

#[tokio::test]
async fn first_release_bumps_from_zero() {
    let h = harness(&[]);
    stage_artifacts(&h.config, &Version::new(0, 1, 0));

    let outcome = run(&h, BumpLevel::Minor, false).await.unwrap();

    assert_eq!(outcome.current, Version::new(0, 0, 0));
    assert_eq!(outcome.tag, "v0.1.0");
}

#[tokio::test]
async fn publish_uploads_before_pushing_the_tag() {
    let h = harness(&["v2.3.4"]);
    stage_artifacts(&h.config, &Version::new(3, 0, 0));

    let outcome = run(&h, BumpLevel::Major, true).await.unwrap();

    assert!(outcome.published);
    assert!(outcome.tag_pushed);

    let upload = h.runner.call_index("python3", &["twine", "upload"]).unwrap();
    let push = h.runner.call_index("git", &["push", "v3.0.0"]).unwrap();
    assert!(upload < push, "the tag must only go public after the index accepted the upload");
}

#[tokio::test]
async fn publish_without_token_fails_before_any_upload() {
    let mut h = harness(&["v1.0.0"]);
    h.config.index_token = None;
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    let error = run(&h, BumpLevel::Patch, true).await.unwrap_err();
    assert!(matches!(error, ReleaseError::Publish(_)), "got: {error}");
    assert!(!h.runner.ran("python3", &["twine"]));
    assert!(!h.runner.ran("git", &["push"]));
}

#[tokio::test]
async fn build_failure_short_circuits_the_run() {
    let mut h = harness(&["v1.0.0"]);
    h.runner.fail_build = true;

    let error = run(&h, BumpLevel::Patch, true).await.unwrap_err();
    assert!(
        matches!(error, ReleaseError::Build(BuildError::BuildFailed { .. })),
        "got: {error}"
    );

    // Nothing after the failing step ran
    assert!(!h.runner.ran("python3", &["twine"]));
    assert!(!h.runner.ran("git", &["push"]));
    assert!(!h.runner.ran("python3", &["mkdocs"]));
    assert!(!h.runner.ran("ghp-import", &[]));
}

#[tokio::test]
async fn duplicate_tag_aborts_at_tag_creation() {
    let mut h = harness(&["v1.0.0"]);
    h.runner.tag_exists = true;
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    let error = run(&h, BumpLevel::Patch, false).await.unwrap_err();
    assert!(
        matches!(error, ReleaseError::Git(GitError::TagExists { ref tag }) if tag == "v1.0.1"),
        "got: {error}"
    );

    // Tag creation precedes install and build, so neither ran
    assert!(!h.runner.ran("python3", &["pip"]));
    assert!(!h.runner.ran("python3", &["build"]));
}

#[tokio::test]
async fn missing_wheel_fails_verification() {
    let h = harness(&["v1.0.0"]);
    let set = ArtifactSet::for_version(
        &h.config.dist_path(),
        &h.config.package_name,
        &Version::new(1, 0, 1),
    );
    std::fs::write(&set.sdist, b"sdist").unwrap();
    // No wheel staged

    let error = run(&h, BumpLevel::Patch, false).await.unwrap_err();
    assert!(
        matches!(error, ReleaseError::Verify(VerifyError::ArtifactMissing { .. })),
        "got: {error}"
    );
    assert!(!h.runner.ran("python3", &["mkdocs"]));
}

#[tokio::test]
async fn publishing_documents_the_just_created_tag() {
    let h = harness(&["v1.0.0"]);
    stage_artifacts(&h.config, &Version::new(1, 1, 0));

    let outcome = run(&h, BumpLevel::Minor, true).await.unwrap();

    assert_eq!(outcome.docs_ref, "v1.1.0");
    assert_eq!(outcome.docs_branch, "docs/v1.1.0");
    assert!(h.runner.ran("git", &["switch", "--create", "docs/v1.1.0", "v1.1.0"]));
}

#[tokio::test]
async fn dry_run_documents_the_newest_local_tag() {
    let mut h = harness(&["v1.0.0"]);
    h.runner.newest_tag = Some("v1.0.1".to_string());
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    let outcome = run(&h, BumpLevel::Patch, false).await.unwrap();

    assert_eq!(outcome.docs_ref, "v1.0.1");
    assert!(h.runner.ran("git", &["switch", "--create", "docs/v1.0.1", "v1.0.1"]));
}

#[tokio::test]
async fn changelog_page_is_generated_from_tag_history() {
    let h = harness(&["v0.9.0", "v1.0.0"]);
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    run(&h, BumpLevel::Patch, false).await.unwrap();

    let page = h
        .config
        .repo_dir
        .join("docs")
        .join("changelog")
        .join("grizzly-loadtester.md");
    let body = std::fs::read_to_string(page).unwrap();
    assert!(body.starts_with("# Changelog"));
    assert!(body.contains("## v1.0.0"));
    assert!(body.contains("`01234567`"));
    assert!(body.contains("adjust iterator timing"));
}

#[tokio::test]
async fn upload_token_never_reaches_the_command_line() {
    let h = harness(&["v1.0.0"]);
    stage_artifacts(&h.config, &Version::new(1, 0, 1));

    run(&h, BumpLevel::Patch, true).await.unwrap();

    let calls = h.runner.calls.lock().unwrap();
    let upload = calls
        .iter()
        .find(|call| call.args.iter().any(|arg| arg == "twine"))
        .unwrap();
    assert!(upload.args.iter().all(|arg| !arg.contains("pypi-AgEIcHlwaS5vcmc")));
    assert!(!upload.display_line().contains("pypi-AgEIcHlwaS5vcmc"));
    let password = upload.env.iter().find(|var| var.key == "TWINE_PASSWORD").unwrap();
    assert!(password.secret);
}
