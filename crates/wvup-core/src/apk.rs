//! Archive inspection: extraction and manifest reading.
//!
//! The vendor apk is a plain zip archive. Extraction materializes the
//! full tree into a caller-owned directory; the manifest reader then
//! pulls the package name and version out of `AndroidManifest.xml`.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Manifest filename expected at the root of an extracted apk.
pub const MANIFEST_NAME: &str = "AndroidManifest.xml";

/// Package names this tool is willing to repackage.
const WEBVIEW_PACKAGES: [&str; 2] = ["com.android.webview", "com.google.android.webview"];

/// Fields read from an apk manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Declared package name.
    pub package: String,
    /// Declared `versionName`.
    pub version: String,
}

/// Extract `archive` fully into `dest`, creating it as needed.
///
/// Entry paths are sanitized via `enclosed_name()` so a hostile
/// archive cannot escape `dest`; entries that would are skipped.
/// Unix permission bits are restored where the archive records them.
///
/// # Errors
///
/// [`Error::Extraction`] if the archive is malformed or the
/// destination cannot be written.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let fail = |reason: String| Error::Extraction {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;

    fs::create_dir_all(dest).map_err(|e| fail(e.to_string()))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| fail(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| fail(e.to_string()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        let mut out = File::create(&out_path).map_err(|e| fail(e.to_string()))?;
        io::copy(&mut entry, &mut out).map_err(|e| fail(e.to_string()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .map_err(|e| fail(e.to_string()))?;
        }
    }

    tracing::debug!(entries = zip.len(), dest = %dest.display(), "extracted archive");
    Ok(())
}

/// Read the manifest at the root of an extracted apk tree.
///
/// # Errors
///
/// [`Error::ManifestMissing`] if `AndroidManifest.xml` is absent, and
/// [`Error::NotAPackage`] if it declares no recognized WebView
/// package name or no `versionName`.
pub fn read_manifest(tree: &Path) -> Result<Manifest> {
    let path = tree.join(MANIFEST_NAME);
    if !path.is_file() {
        return Err(Error::ManifestMissing(tree.to_path_buf()));
    }
    let content = fs::read_to_string(&path)?;

    let package = attribute(&content, package_pattern())
        .ok_or_else(|| Error::NotAPackage("manifest declares no package name".into()))?;
    if !WEBVIEW_PACKAGES.contains(&package.as_str()) {
        return Err(Error::NotAPackage(package));
    }

    let version = attribute(&content, version_name_pattern())
        .ok_or_else(|| Error::NotAPackage(format!("{package} declares no versionName")))?;

    Ok(Manifest { package, version })
}

fn package_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"package=["']([^"']+)["']"#).expect("hardcoded pattern"))
}

fn version_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"versionName=["']([^"']+)["']"#).expect("hardcoded pattern"))
}

/// Pull a quoted XML attribute value out of the manifest text.
fn attribute(content: &str, re: &Regex) -> Option<String> {
    re.captures(content).map(|c| c[1].to_string())
}
