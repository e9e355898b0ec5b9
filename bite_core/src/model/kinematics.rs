//! Kinematic resolver: opens the jaw about its hinge.
//!
//! ## Hinge convention
//!
//! The hinge axis passes through the joint point and is perpendicular to the
//! sagittal plane (the configured `hinge_axis`, `+X` by default). A single
//! joint point does not fix the sign of the axis, so it is oriented from the
//! geometry: a positive rotation must move the reference bite point (the one
//! farthest from the axis) down the configured vertical axis. Gape angle
//! `theta` is then a rotation by `+theta` about the oriented axis.
//!
//! A reference point straight above or below the joint moves horizontally
//! under either sign, so there is nothing to orient by; the configured axis
//! is kept as given and a warning is logged.
//!
//! Origins stay on the cranium; insertions and bite points move with the
//! mandible.

use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::warn;

use crate::config::ModelConfig;
use crate::errors::{ModelError, ModelResult};
use crate::specimen::SpecimenInput;
use crate::units::{Degrees, Radians};

/// Points closer than this to the hinge axis (mm) have no lever arm
pub const MIN_LEVER_ARM_MM: f64 = 1e-9;

/// The jaw hinge, oriented so that positive rotation opens the jaw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeAxis {
    joint: Point3<f64>,
    opening: Unit<Vector3<f64>>,
    vertical: Unit<Vector3<f64>>,
}

impl HingeAxis {
    /// Orient an axis through `joint` using a reference point on the mandible.
    ///
    /// # Errors
    ///
    /// * `DegenerateGeometry` - the reference point lies on the axis
    pub fn orient(
        joint: Point3<f64>,
        axis: Unit<Vector3<f64>>,
        vertical: Unit<Vector3<f64>>,
        reference: &Point3<f64>,
    ) -> ModelResult<Self> {
        let candidate = HingeAxis {
            joint,
            opening: axis,
            vertical,
        };
        let lever = candidate.lever_arm(reference);
        if lever.norm() < MIN_LEVER_ARM_MM {
            return Err(ModelError::degenerate(
                "bite point lies on the hinge axis, opening direction is undefined",
            ));
        }

        // Velocity of the reference point under a positive rotation
        let sweep = axis.cross(&lever);
        let rise = sweep.dot(&vertical.into_inner());
        if rise.abs() <= f64::EPSILON * sweep.norm() {
            warn!(
                reference = ?reference.coords,
                "bite point is vertically aligned with the joint, keeping the configured hinge axis sign"
            );
            return Ok(candidate);
        }
        if rise > 0.0 {
            Ok(HingeAxis {
                opening: Unit::new_unchecked(-axis.into_inner()),
                ..candidate
            })
        } else {
            Ok(candidate)
        }
    }

    /// Orient the configured hinge for a specimen.
    ///
    /// The reference is the bite point farthest from the axis, so a specimen
    /// with one degenerate bite point among several still gets an axis.
    pub fn for_specimen(input: &SpecimenInput, config: &ModelConfig) -> ModelResult<Self> {
        let axis = config.hinge_direction()?;
        let vertical = config.vertical_direction()?;
        let unoriented = HingeAxis {
            joint: input.joint,
            opening: axis,
            vertical,
        };
        let reference = input
            .bite_points
            .iter()
            .map(|b| (unoriented.distance_to(&b.position), &b.position))
            .fold(None, |best: Option<(f64, &Point3<f64>)>, (d, p)| match best {
                Some((best_d, _)) if best_d >= d => best,
                _ => Some((d, p)),
            })
            .map(|(_, p)| *p)
            .ok_or_else(|| ModelError::invalid_input("bite_points", "0", "Specimen has no bite point"))?;

        HingeAxis::orient(input.joint, axis, vertical, &reference)
    }

    pub fn joint(&self) -> &Point3<f64> {
        &self.joint
    }

    /// Direction about which a positive rotation opens the jaw
    pub fn opening_axis(&self) -> Unit<Vector3<f64>> {
        self.opening
    }

    /// Direction about which a positive moment closes the jaw
    pub fn closing_axis(&self) -> Unit<Vector3<f64>> {
        Unit::new_unchecked(-self.opening.into_inner())
    }

    pub fn vertical(&self) -> Unit<Vector3<f64>> {
        self.vertical
    }

    /// Rotation opening the jaw by `angle`
    pub fn rotation(&self, angle: Degrees) -> Rotation3<f64> {
        let radians: Radians = angle.into();
        Rotation3::from_axis_angle(&self.opening, radians.0)
    }

    /// Rotate a mandible point about the hinge
    pub fn rotate(&self, point: &Point3<f64>, rotation: &Rotation3<f64>) -> Point3<f64> {
        self.joint + rotation * (point - self.joint)
    }

    /// Perpendicular offset from the axis to `point`
    pub fn lever_arm(&self, point: &Point3<f64>) -> Vector3<f64> {
        let offset = point - self.joint;
        let axis = self.opening.into_inner();
        offset - axis * offset.dot(&axis)
    }

    /// Perpendicular distance from the axis to `point` (mm)
    pub fn distance_to(&self, point: &Point3<f64>) -> f64 {
        self.lever_arm(point).norm()
    }
}

/// Mandible geometry at one gape angle.
///
/// Index order matches `SpecimenInput::strands` and `bite_points`.
#[derive(Debug, Clone, PartialEq)]
pub struct GapeState {
    pub angle: u32,
    pub insertions: Vec<Point3<f64>>,
    pub bite_points: Vec<Point3<f64>>,
}

/// Rotate every mandible-attached point of a specimen to `angle` degrees.
///
/// Zero gape returns the input coordinates untouched.
pub fn resolve(input: &SpecimenInput, hinge: &HingeAxis, angle: u32) -> GapeState {
    if angle == 0 {
        return GapeState {
            angle,
            insertions: input.strands.iter().map(|s| s.insertion).collect(),
            bite_points: input.bite_points.iter().map(|b| b.position).collect(),
        };
    }

    let rotation = hinge.rotation(Degrees(f64::from(angle)));
    GapeState {
        angle,
        insertions: input
            .strands
            .iter()
            .map(|s| hinge.rotate(&s.insertion, &rotation))
            .collect(),
        bite_points: input
            .bite_points
            .iter()
            .map(|b| hinge.rotate(&b.position, &rotation))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::{BitePoint, MuscleGroup, MuscleStrand, Specimen};
    use approx::assert_relative_eq;

    fn specimen(bite: Point3<f64>) -> SpecimenInput {
        SpecimenInput {
            specimen: Specimen {
                species: "Test".to_string(),
                head_width: 20.0,
                lower_jaw_length: 25.0,
            },
            joint: Point3::new(0.3, 0.1, 0.7),
            strands: vec![MuscleStrand::new(
                MuscleGroup::Masseter,
                "masseter_1",
                Point3::new(0.0, 8.0, 10.0),
                Point3::new(0.1, 9.0, -5.0),
                1,
                1.0,
            )
            .unwrap()],
            bite_points: vec![BitePoint {
                label: "incisor".to_string(),
                position: bite,
            }],
        }
    }

    #[test]
    fn test_zero_gape_is_identity() {
        let input = specimen(Point3::new(0.1, 25.3, -2.9));
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        let state = resolve(&input, &hinge, 0);
        assert_eq!(state.insertions[0], input.strands[0].insertion);
        assert_eq!(state.bite_points[0], input.bite_points[0].position);
    }

    #[test]
    fn test_opening_lowers_bite_point() {
        let input = specimen(Point3::new(0.0, 25.0, 0.0));
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        let state = resolve(&input, &hinge, 10);
        assert!(state.bite_points[0].z < input.bite_points[0].position.z);
    }

    #[test]
    fn test_orientation_follows_posterior_bite() {
        // Bite point behind the joint: the raw +X axis would lift it
        let input = specimen(Point3::new(0.3, -20.0, 0.7));
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        let state = resolve(&input, &hinge, 15);
        assert!(state.bite_points[0].z < 0.7);
    }

    #[test]
    fn test_rotation_preserves_distance_to_axis() {
        let input = specimen(Point3::new(3.0, 24.0, -4.0));
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        let before = hinge.distance_to(&input.bite_points[0].position);
        let state = resolve(&input, &hinge, 37);
        assert_relative_eq!(hinge.distance_to(&state.bite_points[0]), before, epsilon = 1e-9);
        // Motion is confined to the sagittal plane
        assert_relative_eq!(state.bite_points[0].x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ninety_degrees() {
        let input = SpecimenInput {
            joint: Point3::origin(),
            ..specimen(Point3::new(0.0, 10.0, 0.0))
        };
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        let state = resolve(&input, &hinge, 90);
        assert_relative_eq!(state.bite_points[0].y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(state.bite_points[0].z, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let input = specimen(Point3::new(1.0, 22.0, -3.0));
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        assert_eq!(resolve(&input, &hinge, 23), resolve(&input, &hinge, 23));
    }

    #[test]
    fn test_bite_below_joint_keeps_configured_axis() {
        let input = SpecimenInput {
            joint: Point3::origin(),
            ..specimen(Point3::new(0.0, 0.0, -20.0))
        };
        let hinge = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap();
        assert_eq!(hinge.opening_axis().into_inner(), Vector3::x());
    }

    #[test]
    fn test_bite_on_axis_is_degenerate() {
        let input = specimen(Point3::new(9.0, 0.1, 0.7));
        let err = HingeAxis::for_specimen(&input, &ModelConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_GEOMETRY");
    }
}
