#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Top-level operations orchestration for slipway
//!
//! The layer between the CLI and the engine crates. Queries and the clean
//! engine live here; build, dist, docker, and publish resolve the
//! requested products and delegate to their specialized crates.

mod clean;
mod context;
mod pipeline;
mod query;

pub use clean::clean;
pub use context::OpsCtx;
pub use pipeline::{build, dist, docker_build, docker_push, publish, run};
pub use query::{
    list_build_artifacts, list_dist_artifacts, list_docker_images, list_products, project_version,
    BuildArtifactsOptions,
};
