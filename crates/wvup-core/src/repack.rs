//! Archive stripping and repackaging.
//!
//! Re-extracts the source apk into a scratch tree, removes the whole
//! `lib/` subtree (every architecture -- the artifact must carry zero
//! native code), and rebuilds the remainder as a store-only zip whose
//! entry payloads sit on 4-byte boundaries. Downstream consumers mmap
//! assets straight out of the apk, which is why compression is off
//! and alignment matters.
//!
//! The artifact is written to a temporary sibling and renamed into
//! place, so a failed run never publishes a partial apk.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::apk;
use crate::error::{Error, Result};

/// Payload alignment required by memory-mapping consumers.
const ALIGNMENT: u16 = 4;

/// Strip `source` of its native libraries and write the repackaged
/// apk to `dest`.
///
/// `scratch` is a disposable directory the caller owns (and cleans
/// up); the source apk is re-extracted into it so the stripping never
/// touches the inspection tree.
///
/// # Errors
///
/// [`Error::Extraction`] if the source cannot be re-extracted, and
/// [`Error::Repack`] for any packaging or alignment failure. On
/// failure the temporary output is removed and `dest` is untouched.
pub fn repackage(source: &Path, scratch: &Path, dest: &Path) -> Result<()> {
    apk::extract(source, scratch)?;

    let lib_root = scratch.join("lib");
    if lib_root.exists() {
        fs::remove_dir_all(&lib_root).map_err(|e| Error::Repack(e.to_string()))?;
    }

    let file_name = dest
        .file_name()
        .ok_or_else(|| Error::Repack(format!("invalid destination path {}", dest.display())))?;
    let tmp = dest.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Repack(e.to_string()))?;
    }

    match write_store_aligned(scratch, &tmp) {
        Ok(()) => {
            fs::rename(&tmp, dest).map_err(|e| Error::Repack(e.to_string()))?;
            tracing::debug!(dest = %dest.display(), "published repackaged apk");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Pack every file under `tree` into a store-only, aligned zip.
///
/// Files are walked in sorted order so the artifact is deterministic
/// for a given tree.
fn write_store_aligned(tree: &Path, out: &Path) -> Result<()> {
    let file = File::create(out).map_err(|e| Error::Repack(e.to_string()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .with_alignment(ALIGNMENT);

    for entry in WalkDir::new(tree).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Repack(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(tree)
            .map_err(|e| Error::Repack(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let mut entry_options = options;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = entry
                .metadata()
                .map_err(|e| Error::Repack(e.to_string()))?
                .permissions()
                .mode();
            entry_options = entry_options.unix_permissions(mode);
        }

        writer
            .start_file(name, entry_options)
            .map_err(|e| Error::Repack(e.to_string()))?;
        let mut input = File::open(entry.path()).map_err(|e| Error::Repack(e.to_string()))?;
        io::copy(&mut input, &mut writer).map_err(|e| Error::Repack(e.to_string()))?;
    }

    writer.finish().map_err(|e| Error::Repack(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn build_apk(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn strips_all_native_libraries() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.apk");
        build_apk(
            &source,
            &[
                ("AndroidManifest.xml", b"<manifest/>"),
                ("assets/icudtl.dat", b"icu"),
                ("lib/arm64-v8a/libwebviewchromium.so", b"elf64"),
                ("lib/x86/libwebviewchromium.so", b"elf32"),
            ],
        );

        let dest = dir.path().join("out/webview.apk");
        repackage(&source, &dir.path().join("scratch"), &dest).unwrap();

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.iter().all(|n| !n.starts_with("lib/")));
        assert!(names.contains(&"AndroidManifest.xml".to_string()));
        assert!(names.contains(&"assets/icudtl.dat".to_string()));
    }

    #[test]
    fn output_is_stored_and_aligned() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.apk");
        // Odd-length contents so alignment actually has to pad.
        build_apk(
            &source,
            &[
                ("AndroidManifest.xml", b"<manifest/>..."),
                ("a.txt", b"x"),
                ("b.txt", b"yy"),
                ("c/d.txt", b"zzz"),
            ],
        );

        let dest = dir.path().join("webview.apk");
        repackage(&source, &dir.path().join("scratch"), &dest).unwrap();

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        for i in 0..zip.len() {
            let entry = zip.by_index(i).unwrap();
            assert_eq!(entry.compression(), CompressionMethod::Stored, "{}", entry.name());
            assert_eq!(entry.data_start() % 4, 0, "{} is misaligned", entry.name());
        }
    }

    #[test]
    fn payload_bytes_survive_the_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.apk");
        build_apk(
            &source,
            &[
                ("AndroidManifest.xml", b"<manifest/>"),
                ("res/raw/terms.txt", b"terms of service"),
                ("lib/armeabi-v7a/libwebviewchromium.so", b"elf"),
            ],
        );

        let dest = dir.path().join("webview.apk");
        repackage(&source, &dir.path().join("scratch"), &dest).unwrap();

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut entry = zip.by_name("res/raw/terms.txt").unwrap();
        let mut content = Vec::new();
        io::Read::read_to_end(&mut entry, &mut content).unwrap();
        assert_eq!(content, b"terms of service");
    }

    #[test]
    fn failure_leaves_no_partial_artifact() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.apk");
        fs::write(&source, b"not a zip").unwrap();

        let dest = dir.path().join("webview.apk");
        let result = repackage(&source, &dir.path().join("scratch"), &dest);

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dir.path().join("webview.apk.tmp").exists());
    }

    #[test]
    fn republishing_overwrites_previous_artifact() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.apk");
        build_apk(&source, &[("AndroidManifest.xml", b"<manifest/>")]);

        let dest = dir.path().join("webview.apk");
        fs::write(&dest, b"previous artifact").unwrap();

        repackage(&source, &dir.path().join("scratch"), &dest).unwrap();

        let zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
    }
}
