//! Platform identifiers and per-platform script prologues.
//!
//! Build agents for different operating systems need different shell
//! setup before any step runs. The prologue for a platform is prepended
//! to every step script by the template builders in [`crate::templates`].

use std::fmt;

/// Prologue table. Platforms not listed here run steps as-is.
const HEADERS: &[(&str, &str)] = &[(
    "Linux",
    "#!/bin/bash\nsource /usr/share/Modules/init/bash\n\nmodule load pixi\nmodule load gcc/12.2.0_gcc12.2.0",
)];

/// Returns the script prologue for a platform identifier.
///
/// Pure lookup: known platforms yield their prologue terminated by a
/// newline, anything else yields the empty string. Unrecognized
/// identifiers are logged but never rejected, so a template for a
/// platform without special setup still generates.
pub fn script_header(platform_os: &str) -> String {
    match HEADERS.iter().find(|(os, _)| *os == platform_os) {
        Some((_, header)) => format!("{}\n", header),
        None => {
            if Platform::from_name(platform_os).is_none() {
                tracing::warn!(platform = platform_os, "unknown platform, empty script header");
            }
            String::new()
        }
    }
}

/// The platforms we generate templates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// All supported platforms, in generation order.
    pub const ALL: [Platform; 2] = [Platform::Windows, Platform::Linux];

    /// Parses a platform identifier.
    pub fn from_name(name: &str) -> Option<Platform> {
        match name {
            "Windows" => Some(Platform::Windows),
            "Linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    /// The identifier used in template and cache names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
        }
    }

    /// The script prologue for this platform.
    pub fn header(&self) -> String {
        script_header(self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
