//! # officeconv-core
//!
//! Shared foundation for OfficeConv: the unified error system, layered
//! configuration schemas, and tracing subscriber setup.
//!
//! This crate has **no** internal dependencies on other OfficeConv crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
