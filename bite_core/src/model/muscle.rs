//! Muscle force model.
//!
//! Each strand pulls its insertion straight toward its origin with a force of
//! `(PCSA / n_strands) x f_fibre_max`, doubled when only one side of the
//! skull was measured. Strands are rigid force generators: their length
//! change (strain) is reported but has no effect on force.

use nalgebra::{Point3, Unit, Vector3};

use crate::config::{MeasurementSides, ModelConfig};
use crate::errors::{ModelError, ModelResult};
use crate::specimen::{MuscleStrand, SpecimenInput};
use crate::units::{Newtons, NewtonsPerSqCm, SquareCentimeters};

use super::kinematics::GapeState;

/// Strands shorter than this (mm) have no defined line of action
pub const MIN_STRAND_LENGTH_MM: f64 = 1e-9;

/// Force magnitude of one strand.
///
/// ```rust
/// use bite_core::config::MeasurementSides;
/// use bite_core::model::muscle::strand_force_magnitude;
/// use bite_core::units::{NewtonsPerSqCm, SquareCentimeters};
///
/// // 2.417 cm² masseter split over 4 strands, both sides measured
/// let f = strand_force_magnitude(
///     SquareCentimeters(2.417),
///     4,
///     NewtonsPerSqCm(25.0),
///     MeasurementSides::Two,
/// ).unwrap();
/// assert!((f.0 - 15.10625).abs() < 1e-9);
/// ```
///
/// # Errors
///
/// * `InvalidInput` - negative or non-finite PCSA, or zero strands
pub fn strand_force_magnitude(
    group_pcsa: SquareCentimeters,
    n_strands: u32,
    f_fibre_max: NewtonsPerSqCm,
    sides: MeasurementSides,
) -> ModelResult<Newtons> {
    if !group_pcsa.0.is_finite() || group_pcsa.0 < 0.0 {
        return Err(ModelError::invalid_input(
            "pcsa",
            group_pcsa.0.to_string(),
            "PCSA must be a finite, non-negative area",
        ));
    }
    if n_strands < 1 {
        return Err(ModelError::invalid_input(
            "n_strands",
            n_strands.to_string(),
            "A muscle needs at least one strand",
        ));
    }
    let per_strand = group_pcsa / f64::from(n_strands);
    Ok(per_strand * f_fibre_max * sides.bilateral_factor())
}

/// Force of one strand at one gape state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandForce {
    /// Unit line of action, insertion toward origin
    pub direction: Unit<Vector3<f64>>,

    /// Force magnitude (N)
    pub magnitude: f64,

    /// Origin-to-insertion length (mm)
    pub length: f64,

    /// (length - rest length) / rest length
    pub strain: f64,
}

impl StrandForce {
    /// Force vector (N)
    pub fn vector(&self) -> Vector3<f64> {
        self.direction.into_inner() * self.magnitude
    }
}

/// Force of a strand whose insertion currently sits at `insertion`.
///
/// # Errors
///
/// * `InvalidInput` - invalid PCSA or strand count
/// * `DegenerateGeometry` - origin and insertion coincide
pub fn strand_force(strand: &MuscleStrand, insertion: &Point3<f64>, config: &ModelConfig) -> ModelResult<StrandForce> {
    let line = strand.origin - insertion;
    let length = line.norm();
    if length < MIN_STRAND_LENGTH_MM {
        return Err(ModelError::degenerate(format!(
            "strand '{}' has zero length",
            strand.label
        )));
    }
    let rest = strand.rest_length();
    if rest < MIN_STRAND_LENGTH_MM {
        return Err(ModelError::degenerate(format!(
            "strand '{}' has zero rest length",
            strand.label
        )));
    }

    let magnitude = strand_force_magnitude(
        SquareCentimeters(strand.group_pcsa),
        strand.n_strands,
        NewtonsPerSqCm(config.f_fibre_max),
        config.measur_sides,
    )?;

    Ok(StrandForce {
        direction: Unit::new_unchecked(line / length),
        magnitude: magnitude.0,
        length,
        strain: (length - rest) / rest,
    })
}

/// All strand forces of a specimen at one gape state.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleForces {
    /// One entry per strand, in specimen order
    pub strands: Vec<StrandForce>,

    /// Vector sum of strand forces (N)
    pub resultant: Vector3<f64>,

    /// Scalar sum of strand force magnitudes (N)
    pub total_magnitude: f64,
}

/// Evaluate every strand of a specimen at a gape state.
pub fn muscle_forces(input: &SpecimenInput, state: &GapeState, config: &ModelConfig) -> ModelResult<MuscleForces> {
    let strands = input
        .strands
        .iter()
        .zip(&state.insertions)
        .map(|(strand, insertion)| strand_force(strand, insertion, config))
        .collect::<ModelResult<Vec<_>>>()?;

    let resultant = strands
        .iter()
        .fold(Vector3::zeros(), |acc, f| acc + f.vector());
    let total_magnitude = strands.iter().map(|f| f.magnitude).sum();

    Ok(MuscleForces {
        strands,
        resultant,
        total_magnitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::MuscleGroup;
    use approx::assert_relative_eq;

    fn strand(pcsa: f64) -> MuscleStrand {
        MuscleStrand::new(
            MuscleGroup::Temporalis,
            "temporalis_1",
            Point3::new(0.0, 0.0, 10.0),
            Point3::new(0.0, 0.0, 0.0),
            2,
            pcsa,
        )
        .unwrap()
    }

    fn config(sides: MeasurementSides, f_fibre_max: f64) -> ModelConfig {
        ModelConfig::default()
            .with_sides(sides)
            .with_fibre_strength(f_fibre_max)
    }

    #[test]
    fn test_magnitude_linear_in_pcsa() {
        let one = strand_force_magnitude(SquareCentimeters(1.5), 3, NewtonsPerSqCm(25.0), MeasurementSides::Two).unwrap();
        let two = strand_force_magnitude(SquareCentimeters(3.0), 3, NewtonsPerSqCm(25.0), MeasurementSides::Two).unwrap();
        assert_relative_eq!(two.0, 2.0 * one.0, max_relative = 1e-12);
    }

    #[test]
    fn test_magnitude_linear_in_fibre_strength() {
        let base = strand_force_magnitude(SquareCentimeters(2.0), 1, NewtonsPerSqCm(20.0), MeasurementSides::Two).unwrap();
        let more = strand_force_magnitude(SquareCentimeters(2.0), 1, NewtonsPerSqCm(30.0), MeasurementSides::Two).unwrap();
        assert_relative_eq!(more.0 / base.0, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn test_one_side_doubles_force() {
        let one = strand_force_magnitude(SquareCentimeters(2.0), 4, NewtonsPerSqCm(25.0), MeasurementSides::One).unwrap();
        let two = strand_force_magnitude(SquareCentimeters(2.0), 4, NewtonsPerSqCm(25.0), MeasurementSides::Two).unwrap();
        assert_eq!(one.0, 2.0 * two.0);
    }

    #[test]
    fn test_invalid_magnitude_inputs() {
        assert!(strand_force_magnitude(SquareCentimeters(-1.0), 1, NewtonsPerSqCm(25.0), MeasurementSides::Two).is_err());
        assert!(strand_force_magnitude(SquareCentimeters(1.0), 0, NewtonsPerSqCm(25.0), MeasurementSides::Two).is_err());
    }

    #[test]
    fn test_force_points_at_origin() {
        let s = strand(4.0);
        let force = strand_force(&s, &s.insertion, &config(MeasurementSides::Two, 25.0)).unwrap();
        // 4 cm² over 2 strands at 25 N/cm²
        assert_relative_eq!(force.vector(), Vector3::new(0.0, 0.0, 50.0), epsilon = 1e-12);
        assert_eq!(force.strain, 0.0);
    }

    #[test]
    fn test_strain_from_moved_insertion() {
        let s = strand(4.0);
        let stretched = Point3::new(0.0, 0.0, -2.5);
        let force = strand_force(&s, &stretched, &config(MeasurementSides::Two, 25.0)).unwrap();
        assert_relative_eq!(force.length, 12.5, epsilon = 1e-12);
        assert_relative_eq!(force.strain, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_strand_is_degenerate() {
        let s = strand(4.0);
        let err = strand_force(&s, &s.origin, &config(MeasurementSides::Two, 25.0)).unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_GEOMETRY");
    }

    #[test]
    fn test_zero_pcsa_gives_zero_force() {
        let s = strand(0.0);
        let force = strand_force(&s, &s.insertion, &config(MeasurementSides::One, 25.0)).unwrap();
        assert_eq!(force.magnitude, 0.0);
        assert_eq!(force.vector(), Vector3::zeros());
    }
}
