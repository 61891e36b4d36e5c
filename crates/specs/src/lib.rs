#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Product spec resolution
//!
//! Turns a project configuration into the fully-resolved
//! [`SpecWithDeps`](slipway_types::SpecWithDeps) list every downstream phase
//! consumes: auto-discovers products when none are configured, applies the
//! exclusion matcher, validates requested names, materializes configuration
//! defaults, and wires up input-product dependencies.

pub mod gosrc;

mod discover;
mod resolve;

pub use discover::{discover_main_packages, DiscoveredProduct};
pub use resolve::resolve;
