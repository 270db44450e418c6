use std::io;
use std::result;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while resolving a file set or extracting a variable from it.
///
/// `Path`, `Schema`, `LimitType`, `LimitRange`, `TimeNotFound` and `RangeDimCount` are caused by
/// what the caller asked for. `Internal` means an invariant of the slice planner was broken and is
/// always a defect in this crate.
///
#[derive(Error, Debug)]
pub enum Error {
    /// No file matched the path spec, or a listed file does not exist
    #[error("Invalid path(s): {0}")]
    Path(String),

    /// Unknown variable, unknown dimension name in limits, or query against a missing dimension
    #[error("Schema error: {0}")]
    Schema(String),

    /// A limit value can't be interpreted as an index or timestamp for its dimension
    #[error("Invalid limit type: {0}")]
    LimitType(String),

    /// A resolved limit is outside the dimension, or its lower end is above its upper end
    #[error("Invalid limit range: {0}")]
    LimitRange(String),

    /// A requested timestamp has no exact match in the time axis
    #[error("Time {time} not in {dimension}")]
    TimeNotFound {
        time: DateTime<Utc>,
        dimension: String,
    },

    /// The number of dimensions spanning a range differs from what the caller expected
    #[error("Must have exactly {expected} range dims, has {actual}")]
    RangeDimCount { expected: usize, actual: usize },

    /// Time coordinate `units` or `calendar` can't be decoded
    #[error("Time units error: {0}")]
    Units(String),

    /// Invalid options
    #[error("Configuration error: {0}")]
    Config(String),

    /// A shard store failed to produce what was asked of it
    #[error("Backend error: {0}")]
    Backend(String),

    /// Broken invariant inside this crate
    #[error("Internal error (this is a bug): {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn path(message: impl Into<String>) -> Self {
        Self::Path(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn limit_type(message: impl Into<String>) -> Self {
        Self::LimitType(message.into())
    }

    pub fn limit_range(message: impl Into<String>) -> Self {
        Self::LimitRange(message.into())
    }

    pub fn units(message: impl Into<String>) -> Self {
        Self::Units(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error was caused by the caller's request rather than by the data or by a bug
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Path(_)
                | Self::Schema(_)
                | Self::LimitType(_)
                | Self::LimitRange(_)
                | Self::TimeNotFound { .. }
                | Self::RangeDimCount { .. }
                | Self::Config(_)
        )
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_user_errors() {
        assert!(Error::path("nothing matched").is_user_error());
        assert!(Error::schema("no such variable").is_user_error());
        assert!(Error::RangeDimCount {
            expected: 1,
            actual: 2
        }
        .is_user_error());

        let err = Error::TimeNotFound {
            time: Utc.with_ymd_and_hms(2019, 3, 7, 0, 0, 0).unwrap(),
            dimension: String::from("ocean_time"),
        };
        assert!(err.is_user_error());
        assert_eq!(
            err.to_string(),
            "Time 2019-03-07 00:00:00 UTC not in ocean_time"
        );
    }

    #[test]
    fn test_internal_is_not_user_error() {
        let err = Error::internal("start index 12 not in any shard");
        assert!(err.is_internal());
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_io_conversion() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_user_error());
    }
}
