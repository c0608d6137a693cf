//! Release artifact naming and verification.
//!
//! A release produces exactly two artifacts: a source distribution archive and
//! a platform-independent wheel. Both names derive deterministically from the
//! package name and the released version; the wheel uses the underscore
//! normalized form of the package name. Verification asserts both files exist
//! after the build, catching naming or build mismatches before anything is
//! uploaded.

use crate::error::{Result, VerifyError};
use semver::Version;
use std::path::{Path, PathBuf};

/// The expected build outputs of one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Source distribution archive
    pub sdist: PathBuf,
    /// Platform-independent wheel
    pub wheel: PathBuf,
}

impl ArtifactSet {
    /// Expected artifact paths for `version` under `dist_dir`.
    pub fn for_version(dist_dir: &Path, package_name: &str, version: &Version) -> Self {
        let wheel_name = package_name.replace('-', "_");
        Self {
            sdist: dist_dir.join(format!("{package_name}-{version}.tar.gz")),
            wheel: dist_dir.join(format!("{wheel_name}-{version}-py3-none-any.whl")),
        }
    }

    /// Both artifact paths, sdist first.
    pub fn paths(&self) -> [&Path; 2] {
        [&self.sdist, &self.wheel]
    }

    /// Assert both artifacts exist on disk.
    pub fn verify(&self) -> Result<()> {
        for path in self.paths() {
            if !path.is_file() {
                return Err(VerifyError::ArtifactMissing {
                    path: path.to_path_buf(),
                }
                .into());
            }
        }
        Ok(())
    }
}
