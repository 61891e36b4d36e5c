use serde::{Deserialize, Serialize};
use slipway_types::OsArch;
use std::path::PathBuf;
use std::time::Duration;

/// Compilation progress events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Pre-build script about to run
    ScriptStarted { product: String },

    /// One (product, target) compile started
    UnitStarted {
        product: String,
        os_arch: OsArch,
        path: PathBuf,
    },

    /// One (product, target) compile finished
    UnitCompleted {
        product: String,
        os_arch: OsArch,
        duration: Duration,
    },

    /// A requested (product, target) was skipped as fresh
    UpToDate { product: String, os_arch: OsArch },
}
