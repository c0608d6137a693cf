//! Semantic version handling for release tags.
//!
//! Release points are marked with `v`-prefixed semver tags (`v1.2.3`). Two
//! versions exist during a run: *current*, the highest existing release tag
//! (`v0.0.0` when there is none), and *next*, current bumped at the requested
//! level. Both are computed once and immutable afterwards.

use crate::error::{Result, VersionError};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

/// Prefix release tags carry in front of the semver triple
pub const TAG_PREFIX: &str = "v";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\.\d+\.\d+$").expect("release tag pattern is valid")
});

/// Which component of the version a release increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Increment the patch component
    Patch,
    /// Increment the minor component, resetting patch
    Minor,
    /// Increment the major component, resetting minor and patch
    Major,
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BumpLevel::Patch => "patch",
            BumpLevel::Minor => "minor",
            BumpLevel::Major => "major",
        };
        write!(f, "{name}")
    }
}

/// Check whether a tag has the release tag form (`vMAJOR.MINOR.PATCH`).
pub fn is_release_tag(tag: &str) -> bool {
    TAG_RE.is_match(tag)
}

/// Parse a release tag into a version.
///
/// Only the strict `vMAJOR.MINOR.PATCH` form is accepted; anything else is a
/// [`VersionError::InvalidTag`].
pub fn parse_tag(tag: &str) -> Result<Version> {
    if !is_release_tag(tag) {
        return Err(VersionError::InvalidTag {
            tag: tag.to_string(),
        }
        .into());
    }

    let bare = &tag[TAG_PREFIX.len()..];
    Version::parse(bare).map_err(|e| {
        VersionError::ParseFailed {
            version: bare.to_string(),
            source: e,
        }
        .into()
    })
}

/// Determine the current version from existing tags.
///
/// Tags not in release form are ignored. With no release tags at all the
/// current version is `0.0.0`, so a first release bumps from there.
pub fn latest<I, S>(tags: I) -> Version
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| parse_tag(tag.as_ref()).ok())
        .max()
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

/// Compute the next version from the current one.
///
/// Lower components reset to zero, per semver increment rules.
pub fn bump(current: &Version, level: BumpLevel) -> Version {
    match level {
        BumpLevel::Patch => Version::new(current.major, current.minor, current.patch + 1),
        BumpLevel::Minor => Version::new(current.major, current.minor + 1, 0),
        BumpLevel::Major => Version::new(current.major + 1, 0, 0),
    }
}

/// Tag name for a version, e.g. `v1.2.3`.
pub fn tag_name(version: &Version) -> String {
    format!("{TAG_PREFIX}{version}")
}
