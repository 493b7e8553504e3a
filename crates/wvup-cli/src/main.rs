//! wvup - repackage vendor WebView apks into per-architecture prebuilts.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wvup_core::{run, Config};

/// Update the per-architecture WebView prebuilts from a vendor apk.
///
/// Reads the apk's manifest, works out which architecture's native
/// libraries it carries, and -- if the version differs from the
/// stored baseline -- replaces that architecture's `lib/` tree and
/// `VERSION` marker and rewrites a library-free, store-only,
/// 4-byte-aligned `webview.apk` next to them.
#[derive(Parser, Debug)]
#[command(name = "wvup", version, about)]
struct Cli {
    /// Path to the vendor WebView apk.
    apk: PathBuf,

    /// Root of the per-architecture baseline store.
    #[arg(long, default_value = ".")]
    store_root: PathBuf,

    /// Directory for the run's scoped working tree (removed on exit).
    #[arg(long)]
    work_root: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config {
        source: cli.apk,
        work_root: cli.work_root.unwrap_or_else(std::env::temp_dir),
        store_root: cli.store_root,
    };

    tracing::debug!(?config, "starting pipeline");
    let outcome = run(&config)?;
    println!("{outcome}");
    Ok(())
}
