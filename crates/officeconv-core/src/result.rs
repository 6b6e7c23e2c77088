//! Convenience result type alias for OfficeConv.

use crate::error::AppError;

/// A specialized `Result` type for OfficeConv operations.
pub type AppResult<T> = Result<T, AppError>;
