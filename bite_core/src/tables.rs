//! # Tables
//!
//! Row types for every table the model reads or writes, CSV encoding of those
//! rows, and the validated joins that turn raw input rows into
//! [`SpecimenInput`] bundles.
//!
//! ## Input tables
//!
//! ```text
//! muscles.csv   species,muscle_group,origin_x,origin_y,origin_z,insertion_x,insertion_y,insertion_z,n_strands
//! geometry.csv  species,joint_x,joint_y,joint_z,bite_x,bite_y,bite_z[,bite_point]
//! morphology    species,head_width,lower_jaw_length,pcsa_masseter,pcsa_pterygoid_medial,pcsa_temporalis,pcsa_total
//! ```
//!
//! Extra columns are ignored, surrounding whitespace is trimmed.
//!
//! ## Example
//!
//! ```rust
//! use bite_core::tables::{read_rows, GeometryRow};
//!
//! let csv = "species,joint_x,joint_y,joint_z,bite_x,bite_y,bite_z\n\
//!            M. murinus,0,0,0,0,22,-3\n";
//! let rows: Vec<GeometryRow> = read_rows(csv.as_bytes(), "geometry").unwrap();
//! assert_eq!(rows[0].bite_y, 22.0);
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use nalgebra::Point3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ModelError, ModelResult, SkippedItem};
use crate::morphology::MorphologyTable;
use crate::specimen::{BitePoint, MuscleGroup, MuscleStrand, SpecimenInput};

/// Joints further apart than this (mm) within one species are rejected
const JOINT_TOLERANCE_MM: f64 = 1e-6;

// ============================================================================
// Input rows
// ============================================================================

/// One strand row of the muscle table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleRow {
    pub species: String,

    #[serde(alias = "muscle")]
    pub muscle_group: String,

    /// Optional strand label; generated from the group when absent
    #[serde(default)]
    pub strand: Option<String>,

    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_z: f64,
    pub insertion_x: f64,
    pub insertion_y: f64,
    pub insertion_z: f64,

    /// Number of strands representing this muscle's line of action
    pub n_strands: i64,
}

impl MuscleRow {
    pub fn origin(&self) -> Point3<f64> {
        Point3::new(self.origin_x, self.origin_y, self.origin_z)
    }

    pub fn insertion(&self) -> Point3<f64> {
        Point3::new(self.insertion_x, self.insertion_y, self.insertion_z)
    }

    /// Strand count as an unsigned value, rejecting zero and negatives
    pub fn strand_count(&self) -> ModelResult<u32> {
        u32::try_from(self.n_strands)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ModelError::invalid_input(
                    format!("{}.n_strands", self.species),
                    self.n_strands.to_string(),
                    "A muscle needs at least one strand",
                )
            })
    }
}

/// One row of the geometry table: the joint and one bite point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRow {
    pub species: String,

    /// Optional bite scenario label; `bite_<n>` when absent
    #[serde(default)]
    pub bite_point: Option<String>,

    pub joint_x: f64,
    pub joint_y: f64,
    pub joint_z: f64,
    pub bite_x: f64,
    pub bite_y: f64,
    pub bite_z: f64,
}

impl GeometryRow {
    pub fn joint(&self) -> Point3<f64> {
        Point3::new(self.joint_x, self.joint_y, self.joint_z)
    }

    pub fn bite(&self) -> Point3<f64> {
        Point3::new(self.bite_x, self.bite_y, self.bite_z)
    }
}

/// Muscle row with the per-strand PCSA appended, as shown back to the user
/// after the morphology join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusclePcsaRow {
    pub species: String,
    pub muscle_group: MuscleGroup,
    pub strand: Option<String>,
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_z: f64,
    pub insertion_x: f64,
    pub insertion_y: f64,
    pub insertion_z: f64,
    pub n_strands: u32,

    /// Group PCSA / n_strands (cm²)
    pub pcsa: f64,
}

// ============================================================================
// Output rows
// ============================================================================

/// Force of one strand at one gape angle (N).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleForceRow {
    pub species: String,
    pub gape_angle: u32,
    pub muscle_group: MuscleGroup,
    pub strand: String,
    pub force_x: f64,
    pub force_y: f64,
    pub force_z: f64,
    pub force_magnitude: f64,
}

/// Strand length and geometric strain relative to zero gape.
///
/// Strain does not feed back into force; it is reported only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleStrainRow {
    pub species: String,
    pub gape_angle: u32,
    pub muscle_group: MuscleGroup,
    pub strand: String,
    pub length: f64,
    pub strain: f64,
}

/// Moment of one strand about the hinge axis (N·mm), positive closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleMomentRow {
    pub species: String,
    pub gape_angle: u32,
    pub muscle_group: MuscleGroup,
    pub strand: String,
    pub moment: f64,
    pub moment_arm: f64,
}

/// All strands of a specimen combined at one gape angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleResultantRow {
    pub species: String,
    pub gape_angle: u32,
    pub resultant_x: f64,
    pub resultant_y: f64,
    pub resultant_z: f64,
    pub resultant_magnitude: f64,

    /// Scalar sum of strand force magnitudes (N)
    pub total_force: f64,

    /// Sum of strand moments about the hinge (N·mm)
    pub total_moment: f64,
}

/// Lever lengths for one bite point at one gape angle (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentArmRow {
    pub species: String,
    pub gape_angle: u32,
    pub bite_point: String,

    /// Total muscle moment / total muscle force (in-lever); empty when the
    /// muscles carry no force
    pub total_muscle_moment_arm: Option<f64>,

    /// Hinge-to-bite-point distance (out-lever)
    pub outlever_length: f64,
}

/// Equilibrium result for one bite point at one gape angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRow {
    pub species: String,
    pub gape_angle: u32,
    pub bite_point: String,

    /// Drop of the bite point along the vertical axis since zero gape (mm)
    pub gape_h: f64,

    /// Bite force magnitude (N); negative when the muscles open the jaw
    pub bite_force: f64,

    /// Reaction of the food on the mandible (N)
    pub bite_reaction_x: f64,
    pub bite_reaction_y: f64,
    pub bite_reaction_z: f64,

    /// Reaction of the cranium on the mandible at the joint (N)
    pub joint_reaction_x: f64,
    pub joint_reaction_y: f64,
    pub joint_reaction_z: f64,
    pub joint_reaction_magnitude: f64,
}

// ============================================================================
// CSV encoding
// ============================================================================

/// Read every row of a CSV table.
///
/// Row numbers in errors are 1-based data rows (the header is not counted).
pub fn read_rows<T: DeserializeOwned>(reader: impl Read, table: &str) -> ModelResult<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize()
        .enumerate()
        .map(|(i, record)| {
            record.map_err(|e| {
                ModelError::invalid_input(
                    format!("{} row {}", table, i + 1),
                    "",
                    e.to_string(),
                )
            })
        })
        .collect()
}

/// Write rows as CSV with a header line.
pub fn write_rows<T: Serialize>(writer: impl Write, rows: &[T]) -> ModelResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).map_err(|e| ModelError::SerializationError {
            reason: e.to_string(),
        })?;
    }
    csv_writer.flush().map_err(|e| ModelError::SerializationError {
        reason: e.to_string(),
    })?;
    Ok(())
}

// ============================================================================
// Joins
// ============================================================================

/// Append the per-strand PCSA to each muscle row.
///
/// # Errors
///
/// * `MissingGroup` - a species has no morphology row
/// * `InvalidInput` - unknown muscle group or strand count below one
pub fn insert_pcsa(muscles: &[MuscleRow], morphology: &MorphologyTable) -> ModelResult<Vec<MusclePcsaRow>> {
    muscles
        .iter()
        .map(|row| {
            let morph = morphology.get(&row.species)?;
            let group: MuscleGroup = row.muscle_group.parse()?;
            let n_strands = row.strand_count()?;
            Ok(MusclePcsaRow {
                species: row.species.clone(),
                muscle_group: group,
                strand: row.strand.clone(),
                origin_x: row.origin_x,
                origin_y: row.origin_y,
                origin_z: row.origin_z,
                insertion_x: row.insertion_x,
                insertion_y: row.insertion_y,
                insertion_z: row.insertion_z,
                n_strands,
                pcsa: morph.pcsa(group) / f64::from(n_strands),
            })
        })
        .collect()
}

/// Specimens ready for evaluation plus those that could not be assembled.
#[derive(Debug, Clone, Default)]
pub struct SpecimenSet {
    /// Assembled specimens keyed (and therefore iterated) by species
    pub specimens: BTreeMap<String, SpecimenInput>,

    /// Species left out, with the reason
    pub skipped: Vec<SkippedItem>,
}

/// Group the three input tables by species into typed bundles.
///
/// A species that cannot be assembled (no geometry, no morphology, bad rows)
/// is recorded in [`SpecimenSet::skipped`]; the others are still returned.
pub fn group_specimens(
    muscles: &[MuscleRow],
    geometry: &[GeometryRow],
    morphology: &MorphologyTable,
) -> SpecimenSet {
    let mut muscle_groups: BTreeMap<&str, Vec<&MuscleRow>> = BTreeMap::new();
    for row in muscles {
        muscle_groups.entry(row.species.as_str()).or_default().push(row);
    }
    let mut geometry_groups: BTreeMap<&str, Vec<&GeometryRow>> = BTreeMap::new();
    for row in geometry {
        geometry_groups.entry(row.species.as_str()).or_default().push(row);
    }

    let mut set = SpecimenSet::default();

    for species in geometry_groups.keys() {
        if !muscle_groups.contains_key(species) {
            warn!(species = %species, "geometry without muscle rows, skipping");
            set.skipped.push(SkippedItem::specimen(
                *species,
                ModelError::missing_group(*species, "muscle"),
            ));
        }
    }

    for (species, rows) in &muscle_groups {
        let assembled = geometry_groups
            .get(species)
            .ok_or_else(|| ModelError::missing_group(*species, "geometry"))
            .and_then(|geom| assemble_specimen(species, rows, geom, morphology));

        match assembled {
            Ok(input) => {
                debug!(
                    species = %species,
                    strands = input.strands.len(),
                    bite_points = input.bite_points.len(),
                    total_pcsa = input.total_pcsa().value(),
                    "specimen assembled"
                );
                set.specimens.insert(species.to_string(), input);
            }
            Err(error) => {
                warn!(species = %species, %error, "skipping specimen");
                set.skipped.push(SkippedItem::specimen(*species, error));
            }
        }
    }

    set
}

fn assemble_specimen(
    species: &str,
    muscles: &[&MuscleRow],
    geometry: &[&GeometryRow],
    morphology: &MorphologyTable,
) -> ModelResult<SpecimenInput> {
    let morph = morphology.get(species)?;

    let joint = geometry[0].joint();
    for row in geometry.iter().skip(1) {
        if (row.joint() - joint).norm() > JOINT_TOLERANCE_MM {
            return Err(ModelError::invalid_input(
                format!("{}.joint", species),
                format!("({}, {}, {})", row.joint_x, row.joint_y, row.joint_z),
                "All geometry rows of a species must share one joint",
            ));
        }
    }

    let mut bite_points: Vec<BitePoint> = Vec::with_capacity(geometry.len());
    for (i, row) in geometry.iter().enumerate() {
        let label = row
            .bite_point
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("bite_{}", i + 1));
        if bite_points.iter().any(|b| b.label == label) {
            return Err(ModelError::invalid_input(
                format!("{}.bite_point", species),
                label,
                "Bite point labels must be unique within a species",
            ));
        }
        bite_points.push(BitePoint {
            label,
            position: row.bite(),
        });
    }

    let mut counters: BTreeMap<MuscleGroup, usize> = BTreeMap::new();
    let mut strands = Vec::with_capacity(muscles.len());
    for row in muscles {
        let group: MuscleGroup = row.muscle_group.parse()?;
        let index = counters.entry(group).or_insert(0);
        *index += 1;
        let label = row
            .strand
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("{}_{}", group, index));
        strands.push(MuscleStrand::new(
            group,
            label,
            row.origin(),
            row.insertion(),
            row.strand_count()?,
            morph.pcsa(group),
        )?);
    }

    let input = SpecimenInput {
        specimen: morph.specimen(),
        joint,
        strands,
        bite_points,
    };
    input.validate()?;
    Ok(input)
}
