//! wvup-core - repackaging pipeline for vendor WebView apks.
//!
//! Takes a vendor-built WebView apk, works out which architecture's
//! native libraries it carries, and -- when the apk's version differs
//! from the stored baseline -- promotes those libraries into the
//! per-architecture store and emits a library-free, store-only,
//! 4-byte-aligned apk for the downstream build to install as a
//! prebuilt.

pub mod apk;
pub mod arch;
pub mod baseline;
pub mod error;
pub mod pipeline;
pub mod repack;

pub use arch::Arch;
pub use error::{Error, Result};
pub use pipeline::{run, Config, Outcome};

/// Filename of the repackaged artifact inside each architecture's
/// baseline directory.
pub const REPACKAGED_APK: &str = "webview.apk";
