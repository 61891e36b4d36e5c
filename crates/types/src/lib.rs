#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared types for the slipway build orchestrator
//!
//! Defines the project configuration model, the resolved product build
//! specifications that drive every phase, OS/arch targets, version
//! information, and the artifact path tables.

pub mod config;
pub mod osarch;
pub mod paths;
pub mod spec;
pub mod version;

pub use config::{
    AlmanacInfo, BinDistInfo, BuildConfig, DistConfig, DistType, DockerDep, DockerDepKind,
    DockerImageConfig, DockerImageInfo, ExcludeConfig, ManualDistInfo, OsArchsBinDistInfo,
    ProductConfig, ProjectConfig, PublishConfig, RpmDistInfo, RunConfig, SlsDistInfo,
    SlsDockerInfo,
};
pub use osarch::OsArch;
pub use spec::{ProductSpec, SpecWithDeps};
pub use version::{is_snapshot_version, VersionInfo, UNSPECIFIED_VERSION};
