//! Moment and lever-arm calculator.
//!
//! Moments are projected onto the hinge axis, which is the same as working
//! in the sagittal plane: `M = ((p - joint) x F) . c` with `c` the closing
//! direction of the axis. Positive moments close the jaw.

use nalgebra::{Point3, Vector3};

use crate::errors::{ModelError, ModelResult};

use super::kinematics::HingeAxis;
use super::muscle::{MuscleForces, StrandForce};

/// Closing moment of a force applied at `point` (N·mm)
pub fn moment_about_hinge(hinge: &HingeAxis, point: &Point3<f64>, force: &Vector3<f64>) -> f64 {
    let offset = point - hinge.joint();
    offset.cross(force).dot(&hinge.closing_axis().into_inner())
}

/// Moment of one strand about the hinge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandMoment {
    /// Closing moment (N·mm)
    pub moment: f64,

    /// Signed perpendicular distance from the hinge to the projected line of
    /// action (mm); defined even when the strand carries no force
    pub moment_arm: f64,
}

/// Moment of a strand whose insertion currently sits at `insertion`
pub fn strand_moment(hinge: &HingeAxis, insertion: &Point3<f64>, force: &StrandForce) -> StrandMoment {
    let moment_arm = moment_about_hinge(hinge, insertion, &force.direction.into_inner());
    StrandMoment {
        moment: moment_arm * force.magnitude,
        moment_arm,
    }
}

/// Moments of all strands of a specimen at one gape state.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleMoments {
    /// One entry per strand, in specimen order
    pub strands: Vec<StrandMoment>,

    /// Sum of strand moments (N·mm)
    pub total_moment: f64,

    /// Total moment / total muscle force (mm); `None` when the muscles carry
    /// no force
    pub total_moment_arm: Option<f64>,
}

/// Sum strand moments and derive the muscle in-lever.
///
/// With zero total muscle force the moments are all zero and only the
/// in-lever is left undefined.
///
/// # Errors
///
/// * `DegenerateGeometry` - the in-lever is not finite
pub fn muscle_moments(hinge: &HingeAxis, insertions: &[Point3<f64>], forces: &MuscleForces) -> ModelResult<MuscleMoments> {
    let strands: Vec<StrandMoment> = insertions
        .iter()
        .zip(&forces.strands)
        .map(|(insertion, force)| strand_moment(hinge, insertion, force))
        .collect();
    let total_moment: f64 = strands.iter().map(|m| m.moment).sum();

    let total_moment_arm = if forces.total_magnitude > 0.0 {
        let arm = total_moment / forces.total_magnitude;
        if !arm.is_finite() {
            return Err(ModelError::degenerate("muscle moment arm is not finite"));
        }
        Some(arm)
    } else {
        None
    };

    Ok(MuscleMoments {
        strands,
        total_moment,
        total_moment_arm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MeasurementSides, ModelConfig};
    use crate::model::kinematics::{resolve, HingeAxis};
    use crate::model::muscle::muscle_forces;
    use crate::specimen::{BitePoint, MuscleGroup, MuscleStrand, Specimen, SpecimenInput};
    use approx::assert_relative_eq;

    /// Joint at the origin, jaw along +Y, one vertical strand 10 mm in front of the joint.
    fn lever_specimen(pcsa: f64) -> SpecimenInput {
        SpecimenInput {
            specimen: Specimen {
                species: "Lever".to_string(),
                head_width: 30.0,
                lower_jaw_length: 40.0,
            },
            joint: Point3::origin(),
            strands: vec![MuscleStrand::new(
                MuscleGroup::Masseter,
                "masseter_1",
                Point3::new(0.0, 10.0, 20.0),
                Point3::new(0.0, 10.0, -5.0),
                1,
                pcsa,
            )
            .unwrap()],
            bite_points: vec![BitePoint {
                label: "incisor".to_string(),
                position: Point3::new(0.0, 40.0, 0.0),
            }],
        }
    }

    fn config() -> ModelConfig {
        ModelConfig::default().with_sides(MeasurementSides::Two)
    }

    #[test]
    fn test_vertical_strand_moment() {
        let input = lever_specimen(2.0);
        let hinge = HingeAxis::for_specimen(&input, &config()).unwrap();
        let state = resolve(&input, &hinge, 0);
        let forces = muscle_forces(&input, &state, &config()).unwrap();
        let moments = muscle_moments(&hinge, &state.insertions, &forces).unwrap();

        // 50 N straight up, 10 mm in front of the joint: closing 500 N·mm
        assert_relative_eq!(moments.strands[0].moment_arm, 10.0, epsilon = 1e-9);
        assert_relative_eq!(moments.total_moment, 500.0, epsilon = 1e-9);
        assert_relative_eq!(moments.total_moment_arm.unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_force_through_joint_has_no_moment() {
        let input = lever_specimen(2.0);
        let hinge = HingeAxis::for_specimen(&input, &config()).unwrap();
        let moment = moment_about_hinge(&hinge, &Point3::new(0.0, 5.0, 0.0), &Vector3::new(0.0, -3.0, 0.0));
        assert_eq!(moment, 0.0);
    }

    #[test]
    fn test_zero_force_leaves_moment_arm_undefined() {
        let input = lever_specimen(0.0);
        let hinge = HingeAxis::for_specimen(&input, &config()).unwrap();
        let state = resolve(&input, &hinge, 0);
        let forces = muscle_forces(&input, &state, &config()).unwrap();
        let moments = muscle_moments(&hinge, &state.insertions, &forces).unwrap();
        assert_eq!(moments.total_moment, 0.0);
        assert_eq!(moments.total_moment_arm, None);
        // Strand lever arm is geometric and survives a zero force
        assert_relative_eq!(moments.strands[0].moment_arm, 10.0, epsilon = 1e-9);
    }
}
