//! Pipeline orchestration.
//!
//! Sequences inspection, architecture resolution, the version gate,
//! and -- only when the baseline is stale -- repackaging followed by
//! library promotion. The working directory is a [`tempfile::TempDir`]
//! scoped to the run, so the extracted tree is removed on every exit
//! path, including failures.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::{apk, arch, baseline, repack, Arch, REPACKAGED_APK};

/// Everything one pipeline run needs, passed in explicitly rather
/// than read from ambient shell state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the vendor WebView apk.
    pub source: PathBuf,
    /// Directory under which the scoped working tree is created.
    pub work_root: PathBuf,
    /// Root of the per-architecture baseline store.
    pub store_root: PathBuf,
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The baseline was stale; libraries were promoted and the apk
    /// repackaged.
    Updated {
        /// Architecture the source apk carries.
        arch: Arch,
        /// Previously stored version, if a baseline existed.
        old: Option<String>,
        /// Version now recorded in the baseline.
        new: String,
    },
    /// The incoming version matched the baseline; nothing was
    /// modified.
    UpToDate {
        /// Architecture the source apk carries.
        arch: Arch,
        /// The shared version string.
        version: String,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { arch, old, new } => {
                let old = old.as_deref().unwrap_or("(none)");
                write!(f, "{arch} - Updating current WebView {old} to {new}")
            }
            Self::UpToDate { arch, version } => write!(
                f,
                "{arch} - Input WebView apk is the same version as before. Not updating {version}"
            ),
        }
    }
}

/// Run the full pipeline for one source apk.
///
/// On a stale baseline, both the baseline (`VERSION` + `lib/`) and
/// the repackaged apk are rewritten for the resolved architecture;
/// on an up-to-date baseline, nothing on disk is touched. The
/// working tree under `config.work_root` is removed in all cases.
///
/// # Errors
///
/// Any [`crate::Error`]. All variants abort before the store is
/// touched except [`crate::Error::Repack`] (no partial artifact is
/// published and the marker is untouched) and
/// [`crate::Error::Promote`] (new artifact published, marker still
/// old); in both cases the gate still reads the old version, so a
/// rerun redoes the update and converges.
pub fn run(config: &Config) -> Result<Outcome> {
    fs::create_dir_all(&config.work_root)?;
    let work = tempfile::Builder::new()
        .prefix("wvup-")
        .tempdir_in(&config.work_root)?;

    let tree = work.path().join("tree");
    apk::extract(&config.source, &tree)?;
    let manifest = apk::read_manifest(&tree)?;
    let arch = arch::resolve(&tree)?;
    tracing::info!(
        package = %manifest.package,
        version = %manifest.version,
        arch = arch.token(),
        "inspected source apk"
    );

    let stored = baseline::stored_version(&config.store_root, arch)?;
    if !baseline::is_stale(stored.as_deref(), &manifest.version) {
        return Ok(Outcome::UpToDate {
            arch,
            version: manifest.version,
        });
    }

    // Repackage first: the version marker is the commit point the
    // gate reads, so it must land only after the new artifact is
    // published. A failure at either step leaves the marker at the
    // old version and a rerun redoes both.
    let artifact = config
        .store_root
        .join(arch.token())
        .join(REPACKAGED_APK);
    repack::repackage(&config.source, &work.path().join("repack"), &artifact)?;

    let abi_src = tree.join("lib").join(arch.abi_dir());
    baseline::promote(&config.store_root, arch, &abi_src, &manifest.version)?;

    Ok(Outcome::Updated {
        arch,
        old: stored,
        new: manifest.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_status_line() {
        let outcome = Outcome::Updated {
            arch: Arch::Arm64,
            old: Some("78.0.1".into()),
            new: "79.0.1".into(),
        };
        assert_eq!(
            outcome.to_string(),
            "64-bit ARM - Updating current WebView 78.0.1 to 79.0.1"
        );
    }

    #[test]
    fn first_install_status_line() {
        let outcome = Outcome::Updated {
            arch: Arch::X86,
            old: None,
            new: "79.0.1".into(),
        };
        assert_eq!(
            outcome.to_string(),
            "x86 - Updating current WebView (none) to 79.0.1"
        );
    }

    #[test]
    fn skip_status_line() {
        let outcome = Outcome::UpToDate {
            arch: Arch::Arm,
            version: "79.0.1".into(),
        };
        assert_eq!(
            outcome.to_string(),
            "32-bit ARM - Input WebView apk is the same version as before. Not updating 79.0.1"
        );
    }
}
