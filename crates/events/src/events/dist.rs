use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Distribution and container image progress events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistEvent {
    /// Assembly of one distribution started
    Started { product: String, dist_type: String },

    /// A final distribution artifact was written
    ArtifactCreated { product: String, path: PathBuf },

    /// `docker build` started for an image
    DockerBuildStarted { product: String, image: String },

    /// `docker build` finished for an image
    DockerBuildCompleted { product: String, image: String },

    /// `docker push` started for an image
    DockerPushStarted { product: String, image: String },

    /// `docker push` finished for an image
    DockerPushCompleted { product: String, image: String },
}
