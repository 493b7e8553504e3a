//! Pipeline error taxonomy.
//!
//! Every failure category an operator can hit maps to one variant
//! here. All of them abort the run; only `Promote` can leave the
//! baseline store partially written (the staged swap narrows that
//! window but does not close it), and a rerun converges.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the repackaging pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The source archive could not be opened or unpacked.
    #[error("failed to extract {path}: {reason}")]
    Extraction {
        /// Archive being extracted.
        path: PathBuf,
        /// Underlying zip or I/O failure, stringified.
        reason: String,
    },

    /// Extraction succeeded but the tree carries no manifest.
    #[error("no AndroidManifest.xml found under {0}")]
    ManifestMissing(PathBuf),

    /// The manifest does not describe a WebView package.
    #[error("not a WebView package: {0}")]
    NotAPackage(String),

    /// None of the recognized ABI directories are present.
    #[error("no supported native-library directory found (expected one of {expected})")]
    UnsupportedArchitecture {
        /// Comma-separated list of the ABI directories probed for.
        expected: String,
    },

    /// The stored version marker exists but could not be read.
    #[error("failed to read baseline version for {arch}: {source}")]
    BaselineRead {
        /// Baseline directory token (`arm64`, `arm`, `x86`).
        arch: &'static str,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// Baseline replacement failed partway; the store for this
    /// architecture may be partially updated. Rerunning with the
    /// same input converges.
    #[error("failed to promote libraries for {arch} (baseline may be partial, rerun to converge): {source}")]
    Promote {
        /// Baseline directory token.
        arch: &'static str,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// Repackaging or alignment failed. No partial artifact is ever
    /// published; the temporary output is removed.
    #[error("failed to repackage archive: {0}")]
    Repack(String),

    /// Working-directory plumbing failures (creation, cleanup).
    #[error(transparent)]
    Io(#[from] io::Error),
}
