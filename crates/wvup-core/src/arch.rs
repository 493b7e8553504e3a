//! Architecture variants recognized in vendor WebView apks.
//!
//! A vendor apk is assumed to carry at most one architecture's
//! libraries. Resolution walks a fixed probe table and takes the
//! first ABI directory present; if an apk ever carried several, the
//! highest-priority one wins.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// A target architecture whose native libraries an apk may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit ARM (`arm64-v8a`).
    Arm64,
    /// 32-bit ARM (`armeabi-v7a`).
    Arm,
    /// 32-bit x86.
    X86,
}

impl Arch {
    /// Probe order for [`resolve`]. Order is significant: 64-bit ARM
    /// wins over 32-bit ARM, which wins over x86.
    pub const PROBE_ORDER: [Arch; 3] = [Arch::Arm64, Arch::Arm, Arch::X86];

    /// ABI directory name under the apk's `lib/` root.
    pub fn abi_dir(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64-v8a",
            Self::Arm => "armeabi-v7a",
            Self::X86 => "x86",
        }
    }

    /// Short token naming this architecture's baseline directory.
    pub fn token(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::Arm => "arm",
            Self::X86 => "x86",
        }
    }

    /// Operator-facing architecture name, as used in status lines.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Arm64 => "64-bit ARM",
            Self::Arm => "32-bit ARM",
            Self::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resolve which architecture's libraries are present in an extracted
/// apk tree.
///
/// Probes `lib/<abi>/` for each variant in [`Arch::PROBE_ORDER`] and
/// returns the first match.
///
/// # Errors
///
/// [`Error::UnsupportedArchitecture`] if none of the recognized ABI
/// directories exist.
pub fn resolve(tree: &Path) -> Result<Arch> {
    let lib_root = tree.join("lib");
    for arch in Arch::PROBE_ORDER {
        if lib_root.join(arch.abi_dir()).is_dir() {
            tracing::debug!(abi = arch.abi_dir(), "resolved architecture");
            return Ok(arch);
        }
    }
    Err(Error::UnsupportedArchitecture {
        expected: Arch::PROBE_ORDER
            .iter()
            .map(|a| a.abi_dir())
            .collect::<Vec<_>>()
            .join(", "),
    })
}
