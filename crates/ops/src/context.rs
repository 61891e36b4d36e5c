//! Operation context shared by every top-level operation

use slipway_errors::Result;
use slipway_events::{EventEmitter, EventSender};
use slipway_types::{ProjectConfig, SpecWithDeps, VersionInfo};
use std::path::{Path, PathBuf};

/// Everything an operation needs to know about the invoked project
pub struct OpsCtx {
    /// Project root all relative paths resolve against
    pub project_dir: PathBuf,
    /// Loaded project configuration
    pub config: ProjectConfig,
    /// Version derived from the project's source-control state
    pub version: VersionInfo,
    /// Event sender for progress reporting
    pub tx: EventSender,
}

impl OpsCtx {
    /// Load the context for a project directory
    ///
    /// The configuration comes from `config_path` when one is given,
    /// otherwise from the project's `slipway.yml` when present, otherwise
    /// defaults. A project that is not a usable source-control checkout
    /// gets the unspecified version instead of an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be read or parsed.
    pub async fn load(
        project_dir: &Path,
        config_path: Option<&Path>,
        tx: EventSender,
    ) -> Result<Self> {
        let config = slipway_config::load_or_default(project_dir, config_path).await?;
        let version = match slipway_vcs::project_version_info(project_dir).await {
            Ok(version) => version,
            Err(err) => {
                tx.emit_debug(format!("version lookup failed ({err}), using unspecified"));
                VersionInfo::unspecified()
            }
        };
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            config,
            version,
            tx,
        })
    }

    /// Resolve the requested products into specs with their input products
    ///
    /// An empty `requested` selects every product.
    ///
    /// # Errors
    ///
    /// Returns an error when a requested name is unknown or the project
    /// has no products.
    pub fn resolve(&self, requested: &[String]) -> Result<Vec<SpecWithDeps>> {
        slipway_specs::resolve(&self.project_dir, &self.config, requested, &self.version)
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}
