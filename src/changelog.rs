//! Changelog page generation from tag history.
//!
//! The documentation ships a per-release changelog derived from git history:
//! one section per release tag, one bullet per commit between that tag and its
//! predecessor, each linking to the commit on the project's forge. The page is
//! regenerated on every docs build so it always reflects the full tag history
//! of the checkout.

use crate::error::Result;
use crate::git::Git;
use crate::process::ToolRunner;
use crate::version;
use semver::Version;
use std::path::{Path, PathBuf};

/// Generate the changelog page for `package_name` under `repo_dir/docs/changelog/`.
///
/// Release tags are ordered newest first; tags not in release form are
/// ignored. Returns the path of the written page.
pub async fn generate<R: ToolRunner>(
    git: &Git<'_, R>,
    repo_dir: &Path,
    package_name: &str,
    commit_base_url: &str,
) -> Result<PathBuf> {
    let mut tags: Vec<(Version, String)> = git
        .tags()
        .await?
        .into_iter()
        .filter_map(|tag| version::parse_tag(&tag).ok().map(|parsed| (parsed, tag)))
        .collect();
    tags.sort_by(|a, b| b.0.cmp(&a.0));

    let mut body = String::from("# Changelog\n\n");

    for pair in tags.windows(2) {
        let (_, newer) = &pair[0];
        let (_, older) = &pair[1];
        log::debug!("generating changelog section {newer} <- {older}");

        body.push_str(&format!("## {newer}\n\n"));
        for commit in git.log_between(older, newer).await? {
            body.push_str(&format!(
                "* <a href=\"{commit_base_url}/commit/{hash}\" target=\"_blank\">`{short}`</a>: {message}\n\n",
                hash = commit.hash,
                short = commit.short_hash,
                message = commit.message,
            ));
        }
        body.push('\n');
    }

    let directory = repo_dir.join("docs").join("changelog");
    std::fs::create_dir_all(&directory)?;
    let page = directory.join(format!("{package_name}.md"));
    std::fs::write(&page, body)?;

    Ok(page)
}
