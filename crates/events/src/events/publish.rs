use serde::{Deserialize, Serialize};

/// Upload and release progress events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PublishEvent {
    /// An artifact upload started
    UploadStarted { file: String, url: String },

    /// Bytes flowed during an upload; rendered as a stderr meter
    UploadProgress {
        file: String,
        uploaded: u64,
        total: u64,
    },

    /// An artifact already exists remotely with a matching checksum
    UploadSkipped { file: String, url: String },

    /// Dry run: an upload that would have happened
    UploadPlanned { file: String, url: String },

    /// POM or artifact landed in a local publish directory
    FileCopied { file: String, path: std::path::PathBuf },

    /// A release was created on a release-host remote
    ReleaseCreated { product: String, url: String },

    /// An uploaded asset's download location, as reported by the remote
    AssetAvailable { file: String, url: String },

    /// An artifact was registered with the almanac
    AlmanacRegistered { product: String, version: String },

    /// A post-upload follow-up action failed; the upload itself stands
    FollowUpFailed { action: String, error: String },
}
