//! # Morphology Table
//!
//! Per-species head dimensions and muscle PCSA, collected during quantitative
//! dissections and CT scans. This is the table the muscle coordinates are
//! joined against, and the source of the body-size proxies used for
//! normalization.
//!
//! A built-in reference table carries the two teaching species, the
//! crab-eating macaque and the grey mouse lemur.
//!
//! ## Example
//!
//! ```rust
//! use bite_core::morphology::{reference_morphology, MorphologyTable};
//! use bite_core::specimen::MuscleGroup;
//!
//! let table = MorphologyTable::from_rows(reference_morphology()).unwrap();
//! let macaque = table.get("M. fascicularis").unwrap();
//! assert_eq!(macaque.pcsa(MuscleGroup::Masseter), 2.417);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ProxyKind;
use crate::errors::{ModelError, ModelResult};
use crate::specimen::{MuscleGroup, Specimen};

/// One row of the morphology table.
///
/// Lengths in mm, areas in cm².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    pub species: String,
    pub head_width: f64,
    pub lower_jaw_length: f64,
    pub pcsa_masseter: f64,
    pub pcsa_pterygoid_medial: f64,
    pub pcsa_temporalis: f64,

    /// Total PCSA as reported; not recomputed from the group columns
    pub pcsa_total: f64,
}

impl Morphology {
    /// PCSA of one muscle group
    pub fn pcsa(&self, group: MuscleGroup) -> f64 {
        match group {
            MuscleGroup::Masseter => self.pcsa_masseter,
            MuscleGroup::MedialPterygoid => self.pcsa_pterygoid_medial,
            MuscleGroup::Temporalis => self.pcsa_temporalis,
        }
    }

    /// Linear size proxy of the chosen kind (mm)
    pub fn proxy(&self, kind: ProxyKind) -> f64 {
        match kind {
            ProxyKind::HeadWidth => self.head_width,
            ProxyKind::LowerJawLength => self.lower_jaw_length,
        }
    }

    /// Identity and size of the specimen
    pub fn specimen(&self) -> Specimen {
        Specimen {
            species: self.species.clone(),
            head_width: self.head_width,
            lower_jaw_length: self.lower_jaw_length,
        }
    }

    /// Validate the row.
    pub fn validate(&self) -> ModelResult<()> {
        if self.species.trim().is_empty() {
            return Err(ModelError::invalid_input("species", "", "Species name is empty"));
        }
        let lengths = [
            ("head_width", self.head_width),
            ("lower_jaw_length", self.lower_jaw_length),
        ];
        for (field, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::invalid_input(
                    format!("{}.{}", self.species, field),
                    value.to_string(),
                    "Length must be positive",
                ));
            }
        }
        let areas = [
            ("pcsa_masseter", self.pcsa_masseter),
            ("pcsa_pterygoid_medial", self.pcsa_pterygoid_medial),
            ("pcsa_temporalis", self.pcsa_temporalis),
            ("pcsa_total", self.pcsa_total),
        ];
        for (field, value) in areas {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::invalid_input(
                    format!("{}.{}", self.species, field),
                    value.to_string(),
                    "PCSA cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Morphology rows keyed by species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphologyTable {
    rows: BTreeMap<String, Morphology>,
}

impl MorphologyTable {
    /// Build a table, validating every row and rejecting duplicate species.
    pub fn from_rows(rows: impl IntoIterator<Item = Morphology>) -> ModelResult<Self> {
        let mut table = BTreeMap::new();
        for row in rows {
            row.validate()?;
            if table.contains_key(&row.species) {
                return Err(ModelError::invalid_input(
                    "species",
                    row.species.clone(),
                    "Species listed twice in the morphology table",
                ));
            }
            table.insert(row.species.clone(), row);
        }
        Ok(MorphologyTable { rows: table })
    }

    /// Look up a species.
    pub fn get(&self, species: &str) -> ModelResult<&Morphology> {
        self.rows
            .get(species)
            .ok_or_else(|| ModelError::missing_group(species, "morphology"))
    }

    /// Proxy value of a species, checked to be a usable divisor.
    pub fn proxy(&self, species: &str, kind: ProxyKind) -> ModelResult<f64> {
        let value = self.get(species)?.proxy(kind);
        if !value.is_finite() || value <= 0.0 {
            return Err(ModelError::invalid_input(
                kind.column_name(),
                value.to_string(),
                format!("Proxy for '{}' must be positive", species),
            ));
        }
        Ok(value)
    }

    /// Rows in species order
    pub fn rows(&self) -> impl Iterator<Item = &Morphology> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reference morphology of the two teaching species.
///
/// Temporalis of M. fascicularis and all muscles of M. murinus carry the
/// dissection correction factors (x1.1 and x1.2) of the source data; the
/// reported totals are kept as published.
pub fn reference_morphology() -> Vec<Morphology> {
    vec![
        Morphology {
            species: "M. fascicularis".to_string(),
            head_width: 58.0,
            lower_jaw_length: 53.0,
            pcsa_masseter: 2.417,
            pcsa_pterygoid_medial: 1.11,
            pcsa_temporalis: 3.596 * 1.1,
            pcsa_total: 7.123,
        },
        Morphology {
            species: "M. murinus".to_string(),
            head_width: 22.0,
            lower_jaw_length: 22.0,
            pcsa_masseter: 0.664 * 1.2,
            pcsa_pterygoid_medial: 0.146 * 1.2,
            pcsa_temporalis: 0.623 * 1.2,
            pcsa_total: 1.433 * 1.2,
        },
    ]
}
