//! OS/arch build targets
//!
//! Targets use the compiler driver's naming (`darwin`, `linux`, `windows`,
//! `amd64`, `arm64`, ...) and render as `<os>-<arch>`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use slipway_errors::{ConfigError, Error};
use std::fmt;
use std::str::FromStr;

/// A single operating-system/architecture build target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OsArch {
    pub os: String,
    pub arch: String,
}

impl OsArch {
    /// Create a target from its two components
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The target for the machine slipway is running on
    #[must_use]
    pub fn host() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Self::new(os, arch)
    }

    /// Whether binaries for this target use a `.exe` suffix
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Executable file name for a product built for this target
    #[must_use]
    pub fn executable_name(&self, product: &str) -> String {
        if self.is_windows() {
            format!("{product}.exe")
        } else {
            product.to_string()
        }
    }
}

impl fmt::Display for OsArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for OsArch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok(Self::new(os, arch)),
            _ => Err(ConfigError::InvalidOsArch {
                input: s.to_string(),
            }
            .into()),
        }
    }
}

impl Serialize for OsArch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OsArch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            de::Error::custom(format!(
                "invalid os-arch {s:?}: expected os-arch (for example linux-amd64)"
            ))
        })
    }
}
