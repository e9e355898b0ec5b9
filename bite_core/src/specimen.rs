//! # Specimen Data Structures
//!
//! Typed bundles for one specimen: its size, its muscle strands, its joint and
//! its bite points. Input tables are grouped into these once (see
//! [`crate::tables::group_specimens`]) and every later stage works on them.
//!
//! ```text
//! SpecimenInput
//! ├── specimen: Specimen (species, head width, lower jaw length)
//! ├── joint: Point3 (temporomandibular joint, on the mandible)
//! ├── strands: Vec<MuscleStrand> (origin fixed, insertion moves with gape)
//! └── bite_points: Vec<BitePoint> (one per bite scenario)
//! ```

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, ModelResult};
use crate::units::SquareCentimeters;

/// Jaw-closing muscle groups modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MuscleGroup {
    #[serde(rename = "masseter")]
    Masseter,
    #[serde(rename = "pterygoid_medial")]
    MedialPterygoid,
    #[serde(rename = "temporalis")]
    Temporalis,
}

impl MuscleGroup {
    /// All groups, in table column order
    pub const ALL: [MuscleGroup; 3] = [
        MuscleGroup::Masseter,
        MuscleGroup::MedialPterygoid,
        MuscleGroup::Temporalis,
    ];

    /// Short name used in tables and strand labels
    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Masseter => "masseter",
            MuscleGroup::MedialPterygoid => "pterygoid_medial",
            MuscleGroup::Temporalis => "temporalis",
        }
    }

    /// PCSA column name in the morphology table
    pub fn pcsa_column(&self) -> &'static str {
        match self {
            MuscleGroup::Masseter => "pcsa_masseter",
            MuscleGroup::MedialPterygoid => "pcsa_pterygoid_medial",
            MuscleGroup::Temporalis => "pcsa_temporalis",
        }
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MuscleGroup {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "masseter" => Ok(MuscleGroup::Masseter),
            "pterygoid_medial" | "medial_pterygoid" | "pterygoid" => Ok(MuscleGroup::MedialPterygoid),
            "temporalis" => Ok(MuscleGroup::Temporalis),
            _ => Err(ModelError::invalid_input(
                "muscle_group",
                s,
                "Expected masseter, pterygoid_medial or temporalis",
            )),
        }
    }
}

impl TryFrom<String> for MuscleGroup {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identity and size of one specimen. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    /// Species name, the key every table is grouped by
    pub species: String,

    /// Head width (mm)
    pub head_width: f64,

    /// Lower jaw length (mm)
    pub lower_jaw_length: f64,
}

/// One strand of a muscle's line of action.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleStrand {
    /// Muscle group the strand belongs to
    pub group: MuscleGroup,

    /// Strand label, unique within the specimen
    pub label: String,

    /// Attachment on the cranium (fixed)
    pub origin: Point3<f64>,

    /// Attachment on the mandible at zero gape
    pub insertion: Point3<f64>,

    /// Number of strands representing this muscle
    pub n_strands: u32,

    /// PCSA of the whole muscle group (cm²)
    pub group_pcsa: f64,
}

impl MuscleStrand {
    /// Create a validated strand.
    pub fn new(
        group: MuscleGroup,
        label: impl Into<String>,
        origin: Point3<f64>,
        insertion: Point3<f64>,
        n_strands: u32,
        group_pcsa: f64,
    ) -> ModelResult<Self> {
        let strand = MuscleStrand {
            group,
            label: label.into(),
            origin,
            insertion,
            n_strands,
            group_pcsa,
        };
        strand.validate()?;
        Ok(strand)
    }

    /// Validate strand parameters.
    pub fn validate(&self) -> ModelResult<()> {
        if self.n_strands < 1 {
            return Err(ModelError::invalid_input(
                format!("{}.n_strands", self.label),
                self.n_strands.to_string(),
                "A muscle needs at least one strand",
            ));
        }
        if !self.group_pcsa.is_finite() || self.group_pcsa < 0.0 {
            return Err(ModelError::invalid_input(
                self.group.pcsa_column(),
                self.group_pcsa.to_string(),
                "PCSA must be a finite, non-negative area",
            ));
        }
        check_point(&format!("{}.origin", self.label), &self.origin)?;
        check_point(&format!("{}.insertion", self.label), &self.insertion)?;
        Ok(())
    }

    /// PCSA carried by this strand: group PCSA / strand count
    pub fn pcsa(&self) -> SquareCentimeters {
        SquareCentimeters(self.group_pcsa) / f64::from(self.n_strands)
    }

    /// Origin-to-insertion distance at zero gape (mm)
    pub fn rest_length(&self) -> f64 {
        (self.origin - self.insertion).norm()
    }
}

/// A point on the mandible where the bite reaction is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BitePoint {
    /// Scenario label (e.g. "incisor")
    pub label: String,

    /// Position at zero gape
    pub position: Point3<f64>,
}

/// Everything needed to evaluate one specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenInput {
    pub specimen: Specimen,
    pub joint: Point3<f64>,
    pub strands: Vec<MuscleStrand>,
    pub bite_points: Vec<BitePoint>,
}

impl SpecimenInput {
    /// Species key
    pub fn species(&self) -> &str {
        &self.specimen.species
    }

    /// Validate the bundle as a whole.
    pub fn validate(&self) -> ModelResult<()> {
        check_point("joint", &self.joint)?;
        if self.strands.is_empty() {
            return Err(ModelError::invalid_input(
                "strands",
                "0",
                "Specimen has no muscle strands",
            ));
        }
        if self.bite_points.is_empty() {
            return Err(ModelError::invalid_input(
                "bite_points",
                "0",
                "Specimen has no bite point",
            ));
        }
        for strand in &self.strands {
            strand.validate()?;
        }
        for bite in &self.bite_points {
            check_point(&bite.label, &bite.position)?;
        }
        Ok(())
    }

    /// Sum of strand PCSA (cm²)
    pub fn total_pcsa(&self) -> SquareCentimeters {
        self.strands
            .iter()
            .fold(SquareCentimeters(0.0), |acc, s| acc + s.pcsa())
    }
}

fn check_point(field: &str, point: &Point3<f64>) -> ModelResult<()> {
    if point.coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::invalid_input(
            field,
            format!("({}, {}, {})", point.x, point.y, point.z),
            "Coordinates must be finite numbers",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strand(n_strands: u32, group_pcsa: f64) -> ModelResult<MuscleStrand> {
        MuscleStrand::new(
            MuscleGroup::Masseter,
            "masseter_1",
            Point3::new(0.0, 20.0, 15.0),
            Point3::new(0.0, 18.0, -10.0),
            n_strands,
            group_pcsa,
        )
    }

    #[test]
    fn test_pcsa_split_across_strands() {
        let s = strand(4, 2.4).unwrap();
        assert!((s.pcsa().0 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_total_pcsa_sums_strands() {
        let input = SpecimenInput {
            specimen: Specimen {
                species: "M. murinus".to_string(),
                head_width: 22.0,
                lower_jaw_length: 22.0,
            },
            joint: Point3::origin(),
            strands: vec![strand(2, 2.4).unwrap(), strand(2, 2.4).unwrap(), strand(1, 0.5).unwrap()],
            bite_points: Vec::new(),
        };
        assert!((input.total_pcsa().value() - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_zero_strands_rejected() {
        assert!(matches!(strand(0, 1.0), Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_negative_pcsa_rejected() {
        assert!(matches!(strand(2, -0.1), Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_nan_coordinate_rejected() {
        let result = MuscleStrand::new(
            MuscleGroup::Temporalis,
            "temporalis_1",
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            1,
            1.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_group_parsing() {
        assert_eq!("Masseter".parse::<MuscleGroup>().unwrap(), MuscleGroup::Masseter);
        assert_eq!("medial pterygoid".parse::<MuscleGroup>().unwrap(), MuscleGroup::MedialPterygoid);
        assert_eq!("pterygoid_medial".parse::<MuscleGroup>().unwrap(), MuscleGroup::MedialPterygoid);
        assert!("digastric".parse::<MuscleGroup>().is_err());
    }

    #[test]
    fn test_group_serialization() {
        let json = serde_json::to_string(&MuscleGroup::MedialPterygoid).unwrap();
        assert_eq!(json, "\"pterygoid_medial\"");
        let parsed: MuscleGroup = serde_json::from_str("\"TEMPORALIS\"").unwrap();
        assert_eq!(parsed, MuscleGroup::Temporalis);
    }
}
