#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Compilation of products with the go toolchain
//!
//! Covers the whole build phase: constructing and running `go build` per
//! (product, target) unit with cross-compile environment, user script
//! execution, source-freshness checking against build artifacts, and the
//! serial/parallel worker pool that drives the units.

pub mod freshness;
pub mod pool;
pub mod script;

mod go;
mod run;

pub use go::{build_pkg_dir, build_unit};
pub use pool::{build, BuildOptions};
pub use run::run_product;
