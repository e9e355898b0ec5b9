//! # Size Normalization
//!
//! Rescales result tables by each specimen's own linear body-size proxy
//! (head width or lower jaw length) so that specimens of very different size
//! can be compared.
//!
//! | Quantity              | Normalized as      |
//! |-----------------------|--------------------|
//! | force, length, gape_h | `x / proxy`        |
//! | moment                | `x / proxy²`       |
//! | area (PCSA)           | `sqrt(x) / proxy`  |
//! | ratio, strain, angle  | unchanged          |
//!
//! ## Example
//!
//! ```rust
//! use bite_core::config::ProxyKind;
//! use bite_core::morphology::{reference_morphology, MorphologyTable};
//! use bite_core::normalize::normalize_value;
//!
//! let table = MorphologyTable::from_rows(reference_morphology()).unwrap();
//! // 106 N for a macaque with a 53 mm lower jaw
//! let scaled = normalize_value(106.0, "M. fascicularis", &table, ProxyKind::LowerJawLength).unwrap();
//! assert!((scaled - 2.0).abs() < 1e-12);
//! ```

use crate::config::ProxyKind;
use crate::errors::ModelResult;
use crate::morphology::{Morphology, MorphologyTable};
use crate::tables::{
    MomentArmRow, MuscleForceRow, MuscleMomentRow, MuscleResultantRow, MuscleStrainRow, ReactionRow,
};

/// A table row that can be rescaled by its specimen's size proxy.
pub trait Normalize: Sized {
    /// Species the row belongs to
    fn species(&self) -> &str;

    /// Copy of the row with every dimensional field divided by the proxy
    /// (or its square for moments). `proxy` is known to be positive.
    fn scaled(&self, proxy: f64) -> Self;
}

/// Divide a linear quantity by the proxy of `species`.
///
/// # Errors
///
/// * `MissingGroup` - species not in the morphology table
/// * `InvalidInput` - proxy is zero, negative or not finite
pub fn normalize_value(value: f64, species: &str, morphology: &MorphologyTable, kind: ProxyKind) -> ModelResult<f64> {
    Ok(value / morphology.proxy(species, kind)?)
}

/// Normalize an area: `sqrt(area) / proxy`.
pub fn normalize_area(area: f64, species: &str, morphology: &MorphologyTable, kind: ProxyKind) -> ModelResult<f64> {
    Ok(area.sqrt() / morphology.proxy(species, kind)?)
}

/// Normalize every row of a table by its own species' proxy.
///
/// The whole call fails on the first species without a usable proxy.
pub fn normalize_table<T: Normalize>(rows: &[T], morphology: &MorphologyTable, kind: ProxyKind) -> ModelResult<Vec<T>> {
    rows.iter()
        .map(|row| Ok(row.scaled(morphology.proxy(row.species(), kind)?)))
        .collect()
}

/// Normalize the morphology table itself: PCSA columns become
/// `sqrt(PCSA) / proxy`, head dimensions are kept in mm.
pub fn normalize_morphology(morphology: &MorphologyTable, kind: ProxyKind) -> ModelResult<Vec<Morphology>> {
    morphology
        .rows()
        .map(|row| {
            let proxy = morphology.proxy(&row.species, kind)?;
            let area = |pcsa: f64| pcsa.sqrt() / proxy;
            Ok(Morphology {
                pcsa_masseter: area(row.pcsa_masseter),
                pcsa_pterygoid_medial: area(row.pcsa_pterygoid_medial),
                pcsa_temporalis: area(row.pcsa_temporalis),
                pcsa_total: area(row.pcsa_total),
                ..row.clone()
            })
        })
        .collect()
}

impl Normalize for MuscleForceRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        MuscleForceRow {
            force_x: self.force_x / proxy,
            force_y: self.force_y / proxy,
            force_z: self.force_z / proxy,
            force_magnitude: self.force_magnitude / proxy,
            ..self.clone()
        }
    }
}

impl Normalize for MuscleStrainRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        MuscleStrainRow {
            length: self.length / proxy,
            ..self.clone()
        }
    }
}

impl Normalize for MuscleMomentRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        MuscleMomentRow {
            moment: self.moment / (proxy * proxy),
            moment_arm: self.moment_arm / proxy,
            ..self.clone()
        }
    }
}

impl Normalize for MuscleResultantRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        MuscleResultantRow {
            resultant_x: self.resultant_x / proxy,
            resultant_y: self.resultant_y / proxy,
            resultant_z: self.resultant_z / proxy,
            resultant_magnitude: self.resultant_magnitude / proxy,
            total_force: self.total_force / proxy,
            total_moment: self.total_moment / (proxy * proxy),
            ..self.clone()
        }
    }
}

impl Normalize for MomentArmRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        MomentArmRow {
            total_muscle_moment_arm: self.total_muscle_moment_arm.map(|arm| arm / proxy),
            outlever_length: self.outlever_length / proxy,
            ..self.clone()
        }
    }
}

impl Normalize for ReactionRow {
    fn species(&self) -> &str {
        &self.species
    }

    fn scaled(&self, proxy: f64) -> Self {
        ReactionRow {
            gape_h: self.gape_h / proxy,
            bite_force: self.bite_force / proxy,
            bite_reaction_x: self.bite_reaction_x / proxy,
            bite_reaction_y: self.bite_reaction_y / proxy,
            bite_reaction_z: self.bite_reaction_z / proxy,
            joint_reaction_x: self.joint_reaction_x / proxy,
            joint_reaction_y: self.joint_reaction_y / proxy,
            joint_reaction_z: self.joint_reaction_z / proxy,
            joint_reaction_magnitude: self.joint_reaction_magnitude / proxy,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelError;
    use crate::morphology::reference_morphology;

    fn table() -> MorphologyTable {
        MorphologyTable::from_rows(reference_morphology()).unwrap()
    }

    fn reaction(species: &str) -> ReactionRow {
        ReactionRow {
            species: species.to_string(),
            gape_angle: 12,
            bite_point: "incisor".to_string(),
            gape_h: 4.4,
            bite_force: 33.0,
            bite_reaction_x: 0.0,
            bite_reaction_y: 2.2,
            bite_reaction_z: -33.0,
            joint_reaction_x: 0.0,
            joint_reaction_y: -11.0,
            joint_reaction_z: 44.0,
            joint_reaction_magnitude: 45.354,
        }
    }

    #[test]
    fn test_normalize_then_rescale() {
        let original = reaction("M. murinus");
        let normalized = normalize_table(&[original.clone()], &table(), ProxyKind::LowerJawLength).unwrap();
        let back = normalized[0].scaled(1.0 / 22.0);
        assert!((back.bite_force - original.bite_force).abs() < 1e-12);
        assert!((back.gape_h - original.gape_h).abs() < 1e-12);
        assert!((back.joint_reaction_y - original.joint_reaction_y).abs() < 1e-12);
        assert_eq!(back.gape_angle, 12);
    }

    #[test]
    fn test_each_row_uses_its_own_proxy() {
        let rows = vec![reaction("M. fascicularis"), reaction("M. murinus")];
        let normalized = normalize_table(&rows, &table(), ProxyKind::HeadWidth).unwrap();
        assert!((normalized[0].bite_force - 33.0 / 58.0).abs() < 1e-12);
        assert!((normalized[1].bite_force - 33.0 / 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_moments_scale_with_square() {
        let row = MuscleResultantRow {
            species: "M. murinus".to_string(),
            gape_angle: 0,
            resultant_x: 0.0,
            resultant_y: 0.0,
            resultant_z: 44.0,
            resultant_magnitude: 44.0,
            total_force: 44.0,
            total_moment: 484.0,
        };
        let scaled = row.scaled(22.0);
        assert_eq!(scaled.total_force, 2.0);
        assert_eq!(scaled.total_moment, 1.0);
    }

    #[test]
    fn test_missing_species() {
        let err = normalize_table(&[reaction("M. mulatta")], &table(), ProxyKind::LowerJawLength).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_GROUP");
    }

    #[test]
    fn test_empty_morphology_table() {
        let err = normalize_value(1.0, "M. murinus", &MorphologyTable::default(), ProxyKind::HeadWidth).unwrap_err();
        assert!(matches!(err, ModelError::MissingGroup { .. }));
    }

    #[test]
    fn test_normalize_morphology() {
        let normalized = normalize_morphology(&table(), ProxyKind::LowerJawLength).unwrap();
        let macaque = &normalized[0];
        assert!((macaque.pcsa_total - 7.123_f64.sqrt() / 53.0).abs() < 1e-12);
        assert_eq!(macaque.head_width, 58.0);
    }

    #[test]
    fn test_area() {
        let value = normalize_area(4.84, "M. murinus", &table(), ProxyKind::HeadWidth).unwrap();
        assert!((value - 0.1).abs() < 1e-12);
    }
}
