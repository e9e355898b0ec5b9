//! # bite_core - Static Jaw Bite Force Model
//!
//! `bite_core` computes static-equilibrium bite forces for a jaw modelled as a
//! rigid lever: muscle strands pull the mandible closed, the food pushes back
//! at a bite point and the cranium holds the joint. For every gape angle of a
//! sweep it reports muscle forces and moments, the joint reaction, the bite
//! force, and the biting efficiency, optionally rescaled by head size.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over an immutable [`ModelConfig`] and explicit tables
//! - **Table-First**: Every input and output row is a serde struct, readable and writable as CSV
//! - **Rich Errors**: Structured error types; batch runs skip and record, never abort halfway
//!
//! ## Quick Start
//!
//! ```rust
//! use bite_core::{analyze, reference_morphology, ModelConfig, MorphologyTable};
//! use bite_core::tables::{read_rows, GeometryRow, MuscleRow};
//!
//! let muscles: Vec<MuscleRow> = read_rows(
//!     "species,muscle_group,origin_x,origin_y,origin_z,insertion_x,insertion_y,insertion_z,n_strands\n\
//!      M. fascicularis,masseter,10,30,15,10,28,-12,1\n\
//!      M. fascicularis,temporalis,9,-6,25,9,10,2,1\n".as_bytes(),
//!     "muscle",
//! ).unwrap();
//! let geometry: Vec<GeometryRow> = read_rows(
//!     "species,joint_x,joint_y,joint_z,bite_x,bite_y,bite_z,bite_point\n\
//!      M. fascicularis,10,0,0,0,53,-4,incisor\n".as_bytes(),
//!     "geometry",
//! ).unwrap();
//! let morphology = MorphologyTable::from_rows(reference_morphology()).unwrap();
//!
//! let analysis = analyze(&muscles, &geometry, &morphology, &ModelConfig::default().with_gape_max(30)).unwrap();
//! let peak = analysis.summary.get("M. fascicularis", "incisor").unwrap();
//! assert!(peak.bite_force > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Muscle forces, jaw kinematics, moments and the equilibrium solver
//! - [`summary`] - Peak bite force and biting efficiency
//! - [`normalize`] - Rescaling by a body-size proxy
//! - [`analysis`] - The whole pipeline in one call
//! - [`tables`] - Input/output row types, CSV encoding and species grouping
//! - [`specimen`] - Typed specimen bundles
//! - [`morphology`] - Head dimensions and PCSA, with the reference dataset
//! - [`config`] - Run parameters
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - Table and report files with atomic writes
//! - [`report`] - JSON run report

pub mod analysis;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod model;
pub mod morphology;
pub mod normalize;
pub mod report;
pub mod specimen;
pub mod summary;
pub mod tables;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use analysis::{analyze, Analysis};
pub use config::{MeasurementSides, ModelConfig, ProxyKind};
pub use errors::{ModelError, ModelResult, SkippedItem};
pub use model::{evaluate_specimen, run_model, ModelOutput};
pub use morphology::{reference_morphology, MorphologyTable};
pub use report::RunReport;
pub use summary::{Summary, SummaryMetric};
