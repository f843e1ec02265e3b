//! # MLF Common Library
//!
//! Shared code for local prediction with already-fetched model resources:
//! - Error type shared by all model kinds
//! - TOML configuration loading and logging bootstrap
//! - Resource shapes (status, field definitions, field summaries)
//! - Field resolution for input data (`ModelFields`)

pub mod config;
pub mod error;
pub mod fields;
pub mod resource;

pub use error::{Error, Result};
pub use fields::{InputData, ModelFields, ResolvedInput};
