//! grizzly-release - release orchestration for the grizzly-loadtester package.
//!
//! This binary runs the full release pipeline: version computation from tag
//! history, local tagging, build, artifact verification, optional publishing
//! and documentation deployment. Fail-fast, no retries.

use grizzly_release::cli;
use grizzly_release::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
