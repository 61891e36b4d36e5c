use serde::{Deserialize, Serialize};

pub mod build;
pub mod dist;
pub mod general;
pub mod publish;

pub use build::BuildEvent;
pub use dist::DistEvent;
pub use general::GeneralEvent;
pub use publish::PublishEvent;

/// Top-level application event aggregating all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings, errors, and generic operation lifecycle
    General(GeneralEvent),

    /// Compilation progress
    Build(BuildEvent),

    /// Distribution and container image progress
    Dist(DistEvent),

    /// Upload and release progress
    Publish(PublishEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_types::OsArch;

    #[test]
    fn events_serialize_with_domain_tag() {
        let event = AppEvent::Build(BuildEvent::UnitCompleted {
            product: "foo".to_string(),
            os_arch: OsArch::new("linux", "amd64"),
            duration: std::time::Duration::from_secs(2),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "build");
        assert_eq!(json["event"]["type"], "UnitCompleted");
        assert_eq!(json["event"]["os_arch"], "linux-amd64");
    }
}
