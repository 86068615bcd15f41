//! depforge-lib: the dependency build engine behind `depforge`.
//!
//! The crate is organised around a fixed per-library pipeline:
//! - `config`: platform and library configuration files, run settings
//! - `steps`: the nine pipeline stages, their defaults and override hooks
//! - `pipeline`: runs the stages for one library and one target configuration
//! - `matrix`: iterates configurations × build order and guards process state
//! - `tools`: bootstraps external tools into a local tools directory

pub mod archive;
pub mod config;
pub mod consts;
pub mod context;
pub mod error;
pub mod fetch;
pub mod matrix;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod steps;
pub mod tools;
pub mod util;

pub use error::BuildError;
pub use matrix::{BuildRequest, MatrixDriver, MatrixReport};
