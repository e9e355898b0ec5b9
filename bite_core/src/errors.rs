//! # Error Types
//!
//! Structured error types for bite_core. Every failure carries enough context
//! (species, gape angle, offending field) for a caller to report exactly which
//! part of a batch went wrong without re-running it.
//!
//! ## Example
//!
//! ```rust
//! use bite_core::errors::{ModelError, ModelResult};
//!
//! fn validate_strands(n_strands: i64) -> ModelResult<u32> {
//!     if n_strands < 1 {
//!         return Err(ModelError::invalid_input(
//!             "n_strands",
//!             n_strands.to_string(),
//!             "A muscle needs at least one strand",
//!         ));
//!     }
//!     Ok(n_strands as u32)
//! }
//!
//! assert!(validate_strands(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bite_core operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Structured error type for model operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ModelError {
    /// An input value is invalid (negative PCSA, zero strands, malformed coordinate)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A species present in one table is absent from another
    #[error("Species '{species}' has no entry in the {table} table")]
    MissingGroup { species: String, table: String },

    /// Geometry that makes the lever problem unsolvable
    #[error("Degenerate geometry for '{species}'{}: {reason}", angle_suffix(.gape_angle))]
    DegenerateGeometry {
        species: String,
        gape_angle: Option<u32>,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/CSV serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Report schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

fn angle_suffix(gape_angle: &Option<u32>) -> String {
    match gape_angle {
        Some(angle) => format!(" at {} deg", angle),
        None => String::new(),
    }
}

impl ModelError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingGroup error
    pub fn missing_group(species: impl Into<String>, table: impl Into<String>) -> Self {
        ModelError::MissingGroup {
            species: species.into(),
            table: table.into(),
        }
    }

    /// Create a DegenerateGeometry error with no specimen context yet.
    ///
    /// Low-level geometry functions don't know which specimen they are working
    /// on; the caller attaches that with [`ModelError::located`].
    pub fn degenerate(reason: impl Into<String>) -> Self {
        ModelError::DegenerateGeometry {
            species: String::new(),
            gape_angle: None,
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attach specimen and gape angle context to a geometry error.
    ///
    /// Only fills fields that are still empty, so the innermost context wins.
    pub fn located(self, species: &str, angle: Option<u32>) -> Self {
        match self {
            ModelError::DegenerateGeometry {
                species: found,
                gape_angle,
                reason,
            } => ModelError::DegenerateGeometry {
                species: if found.is_empty() { species.to_string() } else { found },
                gape_angle: gape_angle.or(angle),
                reason,
            },
            other => other,
        }
    }

    /// Whether a batch run may skip the affected specimen/angle and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ModelError::MissingGroup { .. }
                | ModelError::DegenerateGeometry { .. }
                | ModelError::InvalidInput { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::InvalidInput { .. } => "INVALID_INPUT",
            ModelError::MissingGroup { .. } => "MISSING_GROUP",
            ModelError::DegenerateGeometry { .. } => "DEGENERATE_GEOMETRY",
            ModelError::FileError { .. } => "FILE_ERROR",
            ModelError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ModelError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

/// A specimen, gape angle or bite point that a batch run left out.
///
/// Batch runs never abort on a recoverable error; they record it here and
/// move on to the next unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedItem {
    /// Species the skipped work belongs to
    pub species: String,

    /// Gape angle, or `None` when the whole specimen was skipped
    pub gape_angle: Option<u32>,

    /// Bite point, or `None` when every bite point was affected
    pub bite_point: Option<String>,

    /// Why it was skipped
    pub error: ModelError,
}

impl SkippedItem {
    /// The whole specimen was skipped
    pub fn specimen(species: impl Into<String>, error: ModelError) -> Self {
        let species = species.into();
        let error = error.located(&species, None);
        SkippedItem {
            species,
            gape_angle: None,
            bite_point: None,
            error,
        }
    }

    /// One gape angle of a specimen was skipped
    pub fn angle(species: impl Into<String>, gape_angle: u32, error: ModelError) -> Self {
        let species = species.into();
        let error = error.located(&species, Some(gape_angle));
        SkippedItem {
            species,
            gape_angle: Some(gape_angle),
            bite_point: None,
            error,
        }
    }

    /// One bite point at one gape angle was skipped
    pub fn bite_point(species: impl Into<String>, gape_angle: u32, bite_point: impl Into<String>, error: ModelError) -> Self {
        let mut item = SkippedItem::angle(species, gape_angle, error);
        item.bite_point = Some(bite_point.into());
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = ModelError::invalid_input("pcsa_masseter", "-2.4", "PCSA cannot be negative");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: ModelError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ModelError::missing_group("M. murinus", "geometry").error_code(), "MISSING_GROUP");
        assert_eq!(ModelError::degenerate("zero arm").error_code(), "DEGENERATE_GEOMETRY");
    }

    #[test]
    fn test_located_fills_context_once() {
        let error = ModelError::degenerate("bite point on hinge axis")
            .located("M. fascicularis", Some(12))
            .located("other", Some(3));
        match error {
            ModelError::DegenerateGeometry { species, gape_angle, .. } => {
                assert_eq!(species, "M. fascicularis");
                assert_eq!(gape_angle, Some(12));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_message_includes_angle() {
        let error = ModelError::degenerate("zero-length strand").located("M. murinus", Some(7));
        assert_eq!(
            error.to_string(),
            "Degenerate geometry for 'M. murinus' at 7 deg: zero-length strand"
        );
    }

    #[test]
    fn test_skipped_bite_point() {
        let item = SkippedItem::bite_point("M. murinus", 4, "incisor", ModelError::degenerate("zero arm"));
        assert_eq!(item.gape_angle, Some(4));
        assert_eq!(item.bite_point.as_deref(), Some("incisor"));
        assert!(item.error.is_recoverable());
    }

    #[test]
    fn test_io_errors_are_not_recoverable() {
        assert!(!ModelError::file_error("write", "out/freac.csv", "disk full").is_recoverable());
        assert!(ModelError::missing_group("M. murinus", "morphology").is_recoverable());
    }
}
