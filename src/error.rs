//! Error types for Exoview.
//!
//! This module provides a unified error handling approach using `thiserror`.
//! Callers that need to branch on the failure cause should use the category
//! predicates ([`ExoviewError::is_name_error`],
//! [`ExoviewError::is_time_not_covered`], [`ExoviewError::is_value_error`])
//! rather than matching on message text.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Exoview operations.
pub type Result<T> = std::result::Result<T, ExoviewError>;

/// Errors that can occur in Exoview.
#[derive(Debug, Error)]
pub enum ExoviewError {
    /// A path or glob pattern matched no file.
    #[error("No file matches '{pattern}'. Please check if file path and name are correct.")]
    NotFound { pattern: String },

    /// A mandatory part of the mesh is absent or inconsistent.
    #[error("Malformed mesh file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Variable is in neither the nodal nor the elemental catalog.
    #[error("Variable '{name}' not in nodal or elemental variables. Check variable name.")]
    UnknownVariable { name: String },

    /// Requested element block does not exist.
    #[error("Element block {id} not found")]
    UnknownBlock { id: usize },

    /// No shard's time range contains the requested time.
    #[error("Time {time} is outside the time range of every file")]
    TimeNotCovered { time: f64 },

    /// A shard's range covers the time but none of its samples match it.
    #[error("Time {time} not found in file {}", path.display())]
    TimeNotSampled { time: f64, path: PathBuf },

    /// Local timestep index past the end of the time axis.
    #[error("Timestep {step} out of range ({len} recorded)")]
    TimeStepOutOfRange { step: i64, len: usize },

    /// Query issued after the file handle was released.
    #[error("File {} has been closed", path.display())]
    Closed { path: PathBuf },

    /// Malformed glob pattern.
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Failed to read NetCDF file.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// Arrays from different blocks or files could not be stitched together.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExoviewError {
    /// Create a NotFound error.
    pub fn not_found(pattern: impl Into<String>) -> Self {
        Self::NotFound {
            pattern: pattern.into(),
        }
    }

    /// Create a Format error.
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownVariable error.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }

    /// Create a Closed error.
    pub fn closed(path: impl Into<PathBuf>) -> Self {
        Self::Closed { path: path.into() }
    }

    /// The requested variable name is unknown.
    pub fn is_name_error(&self) -> bool {
        matches!(self, Self::UnknownVariable { .. })
    }

    /// The requested time is not available in any file.
    pub fn is_time_not_covered(&self) -> bool {
        matches!(
            self,
            Self::TimeNotCovered { .. } | Self::TimeNotSampled { .. }
        )
    }

    /// The request itself was invalid (name, block, time or step).
    pub fn is_value_error(&self) -> bool {
        self.is_name_error()
            || self.is_time_not_covered()
            || matches!(
                self,
                Self::UnknownBlock { .. } | Self::TimeStepOutOfRange { .. }
            )
    }
}

impl From<netcdf::Error> for ExoviewError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}
