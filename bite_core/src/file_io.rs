//! # File I/O Module
//!
//! Reading input tables and configuration from disk, writing result tables
//! and run reports back:
//! - **Atomic writes**: every output goes to a `.tmp` sibling, is synced, then
//!   renamed over the destination, so an interrupted run never leaves a
//!   half-written table behind
//! - **Version validation**: run reports carry a schema version checked on load
//!
//! ## Example
//!
//! ```rust,no_run
//! use bite_core::file_io::{load_config, read_table_file, write_table_file};
//! use bite_core::tables::GeometryRow;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.json"))?;
//! let geometry: Vec<GeometryRow> = read_table_file(Path::new("geometry.csv"), "geometry")?;
//! write_table_file(Path::new("out/geometry.csv"), &geometry)?;
//! # Ok::<(), bite_core::errors::ModelError>(())
//! ```

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ModelConfig;
use crate::errors::{ModelError, ModelResult};
use crate::morphology::{Morphology, MorphologyTable};
use crate::report::{RunReport, SCHEMA_VERSION};
use crate::tables::{read_rows, write_rows};

/// Write bytes to `path` atomically.
///
/// The data is written to `<path>.tmp`, synced to disk and renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ModelResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut tmp_file = File::create(tmp_path).map_err(|e| {
        ModelError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(bytes).map_err(|e| {
        ModelError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        ModelError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        ModelError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}

/// Read a CSV table from disk.
pub fn read_table_file<T: DeserializeOwned>(path: &Path, table: &str) -> ModelResult<Vec<T>> {
    let file = File::open(path).map_err(|e| ModelError::file_error("open", path.display().to_string(), e.to_string()))?;
    let rows = read_rows(BufReader::new(file), table)?;
    debug!(path = %path.display(), table, rows = rows.len(), "table read");
    Ok(rows)
}

/// Write a CSV table to disk atomically.
pub fn write_table_file<T: Serialize>(path: &Path, rows: &[T]) -> ModelResult<()> {
    let mut buffer = Vec::new();
    write_rows(&mut buffer, rows)?;
    write_atomic(path, &buffer)
}

/// Read a morphology table from CSV, validating every row.
pub fn load_morphology(path: &Path) -> ModelResult<MorphologyTable> {
    let rows: Vec<Morphology> = read_table_file(path, "morphology")?;
    MorphologyTable::from_rows(rows)
}

/// Load a model configuration from a JSON file.
///
/// Missing fields take their defaults. The loaded configuration is validated.
pub fn load_config(path: &Path) -> ModelResult<ModelConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ModelError::file_error("read", path.display().to_string(), e.to_string()))?;

    let config: ModelConfig = serde_json::from_str(&contents).map_err(|e| ModelError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    config.validate()?;
    Ok(config)
}

/// Save a run report as pretty JSON, atomically.
pub fn save_report(report: &RunReport, path: &Path) -> ModelResult<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| ModelError::SerializationError {
        reason: e.to_string(),
    })?;
    write_atomic(path, json.as_bytes())
}

/// Load a run report.
///
/// # Returns
///
/// * `Ok(RunReport)` - Successfully loaded report
/// * `Err(ModelError::VersionMismatch)` - Report written by an incompatible version
/// * `Err(ModelError::SerializationError)` - Invalid JSON
/// * `Err(ModelError::FileError)` - I/O error
pub fn load_report(path: &Path) -> ModelResult<RunReport> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ModelError::file_error("read", path.display().to_string(), e.to_string()))?;

    let report: RunReport = serde_json::from_str(&contents).map_err(|e| ModelError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&report.meta.version)?;
    Ok(report)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> ModelResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    let mismatch = || ModelError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x, a newer minor version may have broken the layout
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}
