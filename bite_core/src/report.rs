//! # Run Report
//!
//! The JSON document written at the end of a run. It records which
//! configuration produced the results so a report can be read back and
//! compared later.
//!
//! ## Structure
//!
//! ```text
//! RunReport
//! ├── meta: ReportMetadata (schema version, timestamp, specimen count)
//! ├── config: ModelConfig
//! ├── summary: Vec<SummaryMetric>
//! ├── normalized_summary: Vec<SummaryMetric>
//! └── skipped: Vec<SkippedItem>
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::config::ModelConfig;
use crate::errors::SkippedItem;
use crate::summary::SummaryMetric;

/// Current schema version of run reports
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root report container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub meta: ReportMetadata,

    /// Configuration the run used
    pub config: ModelConfig,

    /// Peak bite force per specimen and bite point (absolute)
    pub summary: Vec<SummaryMetric>,

    /// Same, from the size-normalized tables
    pub normalized_summary: Vec<SummaryMetric>,

    /// Specimens, angles and bite points left out
    pub skipped: Vec<SkippedItem>,
}

impl RunReport {
    /// Build a report from a finished analysis.
    pub fn new(analysis: &Analysis, config: &ModelConfig) -> Self {
        let mut species: Vec<&str> = analysis
            .output
            .resultants
            .iter()
            .map(|r| r.species.as_str())
            .collect();
        species.dedup();

        RunReport {
            meta: ReportMetadata {
                version: SCHEMA_VERSION.to_string(),
                generated_at: Utc::now(),
                specimen_count: species.len(),
            },
            config: config.clone(),
            summary: analysis.summary.metrics.clone(),
            normalized_summary: analysis.normalized_summary.metrics.clone(),
            skipped: analysis.skipped(),
        }
    }
}

/// Report header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Schema version (for compatibility checks on load)
    pub version: String,

    /// When the report was written
    pub generated_at: DateTime<Utc>,

    /// Specimens with at least one evaluated gape angle
    pub specimen_count: usize,
}
