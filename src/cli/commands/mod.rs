//! Command execution coordinating the release run.

mod release;

pub use release::execute_release;

use crate::cli::{Args, OutputManager};
use crate::error::Result;

/// Execute the release based on parsed arguments, returning the exit code.
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {validation_error}"));
        return Ok(2);
    }

    let output = OutputManager::new(args.verbose, args.quiet);

    match execute_release(&args, &output).await {
        Ok(outcome) => {
            output.section("Summary");
            output.success(&format!(
                "Released {} ({} bump from v{})",
                outcome.tag, outcome.level, outcome.current
            ));
            if outcome.published {
                output.indent(&format!(
                    "uploaded {} artifact(s), tag pushed",
                    outcome.artifacts.len()
                ));
            } else {
                output.indent("dry run: artifacts and tag are local only");
            }
            Ok(0)
        }
        Err(e) => {
            output.error(&format!("Release failed: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    output.println(&format!("  • {suggestion}"));
                }
            }

            Ok(1)
        }
    }
}
