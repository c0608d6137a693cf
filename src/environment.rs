//! Worker environment preparation.
//!
//! The pipeline's first steps configure the environment every later tool runs
//! in (timezone, search path) and assert the required runtimes are present.
//! The configuration itself lives in the process runner; this module provides
//! the runtime checks and the default search-path extension.

use crate::error::Result;
use crate::process::ToolRunner;
use std::path::PathBuf;

/// Executables that must be resolvable before the pipeline proper starts.
///
/// Tools installed by the package's own extras (the uploader, the docs
/// generator, the site publisher) are not listed: they only exist after the
/// install step.
pub const REQUIRED_TOOLS: &[&str] = &["git"];

/// Resolve every required executable, failing on the first missing one.
///
/// Returns the resolved paths so callers can report where each tool came from.
pub fn check_runtimes<R: ToolRunner>(runner: &R, tools: &[&str]) -> Result<Vec<PathBuf>> {
    tools.iter().map(|tool| runner.lookup(tool)).collect()
}

/// Default directories prepended to the child search path.
///
/// Pip installs console scripts into `~/.local/bin` on user installs; the
/// original worker added it to PATH up front so tools installed by the
/// install step are found by later steps.
pub fn default_path_prepends() -> Vec<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) => vec![PathBuf::from(home).join(".local").join("bin")],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EnvironmentError, ReleaseError};

    struct NoTools;

    impl ToolRunner for NoTools {
        fn run(
            &self,
            _invocation: crate::process::ToolInvocation,
        ) -> impl std::future::Future<Output = Result<crate::process::ToolOutput>> + Send {
            async move {
                Ok(crate::process::ToolOutput {
                    code: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        }

        fn lookup(&self, program: &str) -> Result<PathBuf> {
            Err(EnvironmentError::MissingExecutable {
                name: program.to_string(),
            }
            .into())
        }
    }

    #[test]
    fn missing_runtime_fails_the_check() {
        let result = check_runtimes(&NoTools, &["git"]);
        assert!(matches!(
            result,
            Err(ReleaseError::Environment(EnvironmentError::MissingExecutable { ref name })) if name == "git"
        ));
    }

    #[test]
    fn no_required_tools_is_vacuously_fine() {
        assert!(check_runtimes(&NoTools, &[]).unwrap().is_empty());
    }
}
