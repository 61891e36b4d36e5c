//! Local filesystem sink

use crate::DistArtifacts;
use slipway_errors::{Error, Result};
use slipway_events::{AppEvent, EventEmitter, EventSender, PublishEvent};
use std::path::PathBuf;

/// Sink that copies artifacts into a directory tree laid out like a
/// Maven repository
#[derive(Debug, Clone)]
pub struct LocalDestination {
    /// Root directory the repository tree is created under
    pub path: PathBuf,
}

impl LocalDestination {
    pub(crate) async fn publish(
        &self,
        artifacts: &DistArtifacts,
        tx: &EventSender,
    ) -> Result<Vec<String>> {
        let target_dir = self.path.join(&artifacts.remote_dir);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &target_dir))?;
        for file in artifacts.artifacts.iter().chain([&artifacts.pom]) {
            let name = crate::file_name(file)?;
            let target = target_dir.join(&name);
            tokio::fs::copy(file, &target)
                .await
                .map_err(|e| Error::io_with_path(&e, &target))?;
            tx.emit(AppEvent::Publish(PublishEvent::FileCopied {
                file: name,
                path: target,
            }));
        }
        // Nothing was uploaded, so there are no URLs to register
        Ok(Vec::new())
    }
}
