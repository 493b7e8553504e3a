//! Baseline store: version markers and library promotion.
//!
//! The store holds one directory per architecture token, each with a
//! `VERSION` marker, a `lib/` tree of native libraries, and the
//! repackaged apk. The gate compares version strings for plain
//! inequality -- vendor versions are trusted to be monotonically
//! issued, so any difference means the baseline is stale.

use std::fs;
use std::io;
use std::path::Path;

use crate::arch::Arch;
use crate::error::{Error, Result};

/// Filename of the per-architecture version marker.
pub const VERSION_MARKER: &str = "VERSION";

/// Name of the per-architecture native-library directory.
pub const LIB_DIR: &str = "lib";

/// Read the stored version marker for `arch`, if any.
///
/// An absent marker (or absent baseline directory) is `Ok(None)`:
/// "no baseline yet", which every incoming version beats.
///
/// # Errors
///
/// [`Error::BaselineRead`] for any I/O failure other than the marker
/// simply not existing.
pub fn stored_version(store: &Path, arch: Arch) -> Result<Option<String>> {
    let marker = store.join(arch.token()).join(VERSION_MARKER);
    match fs::read_to_string(&marker) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::BaselineRead {
            arch: arch.token(),
            source: e,
        }),
    }
}

/// Whether `incoming` should replace the stored version.
///
/// Deliberately string inequality, not semantic ordering: any
/// difference triggers an update, equality suppresses it.
pub fn is_stale(stored: Option<&str>, incoming: &str) -> bool {
    stored != Some(incoming)
}

/// Replace the baseline libraries and version marker for `arch`.
///
/// The new `lib/` tree is staged in a sibling directory and swapped
/// into place with a single rename, then the marker is written via
/// temp-file-plus-rename. Library files are moved out of `abi_src`
/// (the extracted tree is disposable), falling back to copy+delete
/// when the store lives on another filesystem.
///
/// # Errors
///
/// [`Error::Promote`] on any I/O failure; the baseline for this
/// architecture may then be partially updated, and rerunning with the
/// same input converges.
pub fn promote(store: &Path, arch: Arch, abi_src: &Path, version: &str) -> Result<()> {
    promote_inner(store, arch, abi_src, version).map_err(|e| Error::Promote {
        arch: arch.token(),
        source: e,
    })
}

fn promote_inner(store: &Path, arch: Arch, abi_src: &Path, version: &str) -> io::Result<()> {
    let arch_dir = store.join(arch.token());
    fs::create_dir_all(&arch_dir)?;

    let staging = arch_dir.join(".lib.staging");
    if staging.exists() {
        // Leftover from an interrupted run.
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir(&staging)?;

    for entry in fs::read_dir(abi_src)? {
        let entry = entry?;
        move_file(&entry.path(), &staging.join(entry.file_name()))?;
    }

    let lib_dir = arch_dir.join(LIB_DIR);
    if lib_dir.exists() {
        fs::remove_dir_all(&lib_dir)?;
    }
    fs::rename(&staging, &lib_dir)?;

    let marker_tmp = arch_dir.join(".VERSION.tmp");
    fs::write(&marker_tmp, format!("{version}\n"))?;
    fs::rename(&marker_tmp, arch_dir.join(VERSION_MARKER))?;

    tracing::debug!(arch = arch.token(), version, "promoted baseline");
    Ok(())
}

/// Move one file, tolerating cross-device renames.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
    }
}
