//! Command line argument parsing and validation.
//!
//! The trigger interface is deliberately small: an increment level and a
//! publish switch, mirroring how releases were triggered before this tool
//! existed. Everything else is plumbing with sensible defaults.

use crate::version::BumpLevel;
use clap::Parser;
use std::path::PathBuf;

/// Release orchestrator for the grizzly-loadtester package
#[derive(Parser, Debug)]
#[command(
    name = "grizzly-release",
    version,
    about = "Release orchestrator for the grizzly-loadtester package",
    long_about = "Run a full release: compute the next version from tag history, tag locally,
build and verify the sdist and wheel, optionally publish, and deploy docs.

Usage:
  grizzly-release                  # dry run, patch bump
  grizzly-release minor            # dry run, minor bump
  grizzly-release major --publish  # upload artifacts and push the tag"
)]
pub struct Args {
    /// Version component to increment
    #[arg(value_enum, default_value_t = BumpLevel::Patch)]
    pub level: BumpLevel,

    /// Upload artifacts to the package index and push the release tag
    #[arg(long)]
    pub publish: bool,

    /// Repository to release from
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Git remote receiving the release tag
    #[arg(long, value_name = "NAME", default_value = "origin", env = "GRIZZLY_RELEASE_REMOTE")]
    pub remote: String,

    /// Build output directory, relative to the repository unless absolute
    #[arg(long, value_name = "PATH", default_value = "dist")]
    pub dist_dir: PathBuf,

    /// Documentation site output directory
    #[arg(long, value_name = "PATH", default_value = "site")]
    pub site_dir: PathBuf,

    /// Subpath on the publishing branch the site is deployed under
    #[arg(long, value_name = "PATH", env = "GRIZZLY_RELEASE_PAGES_PREFIX")]
    pub pages_prefix: Option<String>,

    /// Timezone exported to every spawned tool
    #[arg(long, value_name = "TZ", default_value = "Etc/UTC")]
    pub timezone: String,

    /// Extra directory to prepend to the search path of spawned tools (repeatable)
    #[arg(long = "path-prepend", value_name = "PATH")]
    pub path_prepends: Vec<PathBuf>,

    /// Write a machine-readable run summary to this file
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Suppress everything except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_a_patch_dry_run() {
        let args = Args::parse_from(["grizzly-release"]);
        assert_eq!(args.level, BumpLevel::Patch);
        assert!(!args.publish);
        assert_eq!(args.remote, "origin");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn level_and_publish_are_accepted() {
        let args = Args::parse_from(["grizzly-release", "minor", "--publish"]);
        assert_eq!(args.level, BumpLevel::Minor);
        assert!(args.publish);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let args = Args::parse_from(["grizzly-release", "--quiet", "--verbose"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(Args::try_parse_from(["grizzly-release", "hotfix"]).is_err());
    }
}
