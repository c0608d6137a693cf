//! The release command: configuration assembly and pipeline execution.

use crate::cli::{Args, OutputManager};
use crate::environment;
use crate::error::Result;
use crate::pipeline::{ReleaseOutcome, ReleasePipeline};
use crate::process::ProcessRunner;
use crate::ReleaseConfig;
use anyhow::anyhow;

/// Assemble the run configuration from arguments and environment, then run
/// the pipeline.
///
/// Secrets are resolved here, outside the pipeline, so they flow in as plain
/// configuration and the pipeline itself never touches the process
/// environment.
pub async fn execute_release(args: &Args, output: &OutputManager) -> Result<ReleaseOutcome> {
    let repo_dir = args.repo.canonicalize().map_err(|e| {
        anyhow!(
            "cannot resolve repository path '{}': {e}",
            args.repo.display()
        )
    })?;

    let mut path_prepends = args.path_prepends.clone();
    path_prepends.extend(environment::default_path_prepends());

    let defaults = ReleaseConfig::default();
    let config = ReleaseConfig {
        repo_dir,
        remote: args.remote.clone(),
        dist_dir: args.dist_dir.clone(),
        site_dir: args.site_dir.clone(),
        timezone: args.timezone.clone(),
        path_prepends,
        pages_prefix: args.pages_prefix.clone(),
        index_token: std::env::var(&defaults.index_token_var).ok(),
        pages_token: std::env::var(&defaults.pages_token_var).ok(),
        ..defaults
    };

    if args.publish && config.pages_token.is_none() {
        output.warn(&format!(
            "{} not set, site deployment will use ambient git credentials",
            config.pages_token_var
        ));
    }

    let runner = ProcessRunner::new(&config.timezone, config.path_prepends.clone());
    let pipeline = ReleasePipeline::new(&runner, &config, output);
    let outcome = pipeline.run(args.level, args.publish).await?;

    if let Some(path) = &args.summary_json {
        std::fs::write(path, serde_json::to_string_pretty(&outcome)?)?;
        output.verbose(&format!("run summary written to {}", path.display()));
    }

    Ok(outcome)
}
