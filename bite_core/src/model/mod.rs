//! # Static Bite Model
//!
//! The computational pipeline, one stage per module:
//!
//! - [`muscle`] - strand force magnitudes and vectors
//! - [`kinematics`] - opening the mandible about the hinge
//! - [`moments`] - moments and lever arms about the hinge
//! - [`equilibrium`] - bite force and joint reaction from the balance equations
//!
//! [`evaluate_specimen`] sweeps one specimen over every gape angle;
//! [`run_model`] does that for a whole [`SpecimenSet`] and concatenates the
//! result tables in species order.
//!
//! ## Example
//!
//! ```rust
//! use bite_core::config::ModelConfig;
//! use bite_core::model::run_model;
//! use bite_core::morphology::{reference_morphology, MorphologyTable};
//! use bite_core::tables::{group_specimens, read_rows, GeometryRow, MuscleRow};
//!
//! let muscles: Vec<MuscleRow> = read_rows(
//!     "species,muscle_group,origin_x,origin_y,origin_z,insertion_x,insertion_y,insertion_z,n_strands\n\
//!      M. murinus,masseter,4,12,6,4,11,-5,1\n\
//!      M. murinus,temporalis,3,-2,10,3,4,1,1\n".as_bytes(),
//!     "muscle",
//! ).unwrap();
//! let geometry: Vec<GeometryRow> = read_rows(
//!     "species,joint_x,joint_y,joint_z,bite_x,bite_y,bite_z\n\
//!      M. murinus,4,0,0,0,22,-2\n".as_bytes(),
//!     "geometry",
//! ).unwrap();
//! let morphology = MorphologyTable::from_rows(reference_morphology()).unwrap();
//!
//! let specimens = group_specimens(&muscles, &geometry, &morphology);
//! let output = run_model(&specimens, &ModelConfig::default().with_gape_max(10)).unwrap();
//! assert_eq!(output.reactions.len(), 11);
//! ```

pub mod equilibrium;
pub mod kinematics;
pub mod moments;
pub mod muscle;

use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::errors::{ModelResult, SkippedItem};
use crate::specimen::SpecimenInput;
use crate::tables::{
    MomentArmRow, MuscleForceRow, MuscleMomentRow, MuscleResultantRow, MuscleStrainRow, ReactionRow,
    SpecimenSet,
};

pub use equilibrium::{solve, Equilibrium};
pub use kinematics::{resolve, GapeState, HingeAxis};
pub use moments::{muscle_moments, MuscleMoments};
pub use muscle::{muscle_forces, MuscleForces};

/// Result tables of a model run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub forces: Vec<MuscleForceRow>,
    pub strains: Vec<MuscleStrainRow>,
    pub moments: Vec<MuscleMomentRow>,
    pub resultants: Vec<MuscleResultantRow>,
    pub moment_arms: Vec<MomentArmRow>,
    pub reactions: Vec<ReactionRow>,

    /// Specimens, angles and bite points left out, with the reason
    pub skipped: Vec<SkippedItem>,
}

impl ModelOutput {
    fn append(&mut self, mut other: ModelOutput) {
        self.forces.append(&mut other.forces);
        self.strains.append(&mut other.strains);
        self.moments.append(&mut other.moments);
        self.resultants.append(&mut other.resultants);
        self.moment_arms.append(&mut other.moment_arms);
        self.reactions.append(&mut other.reactions);
        self.skipped.append(&mut other.skipped);
    }

    /// Distinct gape angles with a reaction row for `species`
    pub fn angles_for(&self, species: &str) -> Vec<u32> {
        let mut angles: Vec<u32> = self
            .reactions
            .iter()
            .filter(|r| r.species == species)
            .map(|r| r.gape_angle)
            .collect();
        angles.dedup();
        angles
    }
}

/// Run the model over every specimen of a set.
///
/// Specimens already skipped while grouping are carried into
/// [`ModelOutput::skipped`].
///
/// # Errors
///
/// * `InvalidInput` - the configuration is invalid (nothing is evaluated)
/// * any error that [`is_recoverable`](crate::errors::ModelError::is_recoverable) rejects aborts the run
pub fn run_model(specimens: &SpecimenSet, config: &ModelConfig) -> ModelResult<ModelOutput> {
    config.validate()?;

    let mut output = ModelOutput {
        skipped: specimens.skipped.clone(),
        ..ModelOutput::default()
    };

    for (species, input) in &specimens.specimens {
        match evaluate_specimen(input, config) {
            Ok(specimen_output) => output.append(specimen_output),
            Err(error) if !error.is_recoverable() => return Err(error),
            Err(error) => {
                warn!(species = %species, %error, "skipping specimen");
                output.skipped.push(SkippedItem::specimen(species.clone(), error));
            }
        }
    }

    info!(
        specimens = specimens.specimens.len(),
        reactions = output.reactions.len(),
        skipped = output.skipped.len(),
        "model run complete"
    );
    Ok(output)
}

/// Sweep one specimen over gape angles `0..=gape_max`.
///
/// A degeneracy at one angle (or one bite point at one angle) is recorded in
/// the returned `skipped` list and the sweep continues.
///
/// # Errors
///
/// * `DegenerateGeometry` - the hinge cannot be oriented (every bite point on the axis)
/// * `InvalidInput` - the specimen bundle is invalid
pub fn evaluate_specimen(input: &SpecimenInput, config: &ModelConfig) -> ModelResult<ModelOutput> {
    input.validate()?;
    let species = input.species();
    let hinge = HingeAxis::for_specimen(input, config).map_err(|e| e.located(species, None))?;
    debug!(species, opening_axis = ?hinge.opening_axis().into_inner(), "hinge oriented");

    let rest_bites: Vec<_> = input.bite_points.iter().map(|b| b.position).collect();
    let mut output = ModelOutput::default();

    for angle in config.gape_angles() {
        let state = resolve(input, &hinge, angle);

        let evaluated = muscle_forces(input, &state, config)
            .and_then(|forces| muscle_moments(&hinge, &state.insertions, &forces).map(|m| (forces, m)));
        let (forces, moments) = match evaluated {
            Ok(pair) => pair,
            Err(error) if !error.is_recoverable() => return Err(error),
            Err(error) => {
                warn!(species, angle, %error, "skipping gape angle");
                output.skipped.push(SkippedItem::angle(species, angle, error));
                continue;
            }
        };

        push_strand_rows(&mut output, input, angle, &forces, &moments);
        output.resultants.push(MuscleResultantRow {
            species: species.to_string(),
            gape_angle: angle,
            resultant_x: forces.resultant.x,
            resultant_y: forces.resultant.y,
            resultant_z: forces.resultant.z,
            resultant_magnitude: forces.resultant.norm(),
            total_force: forces.total_magnitude,
            total_moment: moments.total_moment,
        });

        for ((bite, rest), bite_now) in input.bite_points.iter().zip(&rest_bites).zip(&state.bite_points) {
            let solved = solve(&hinge, bite_now, moments.total_moment, &forces.resultant);
            let eq = match solved {
                Ok(eq) => eq,
                Err(error) => {
                    warn!(species, angle, bite_point = %bite.label, %error, "skipping bite point");
                    output
                        .skipped
                        .push(SkippedItem::bite_point(species, angle, bite.label.clone(), error));
                    continue;
                }
            };

            let gape_h = (rest - bite_now).dot(&hinge.vertical().into_inner());
            output.moment_arms.push(MomentArmRow {
                species: species.to_string(),
                gape_angle: angle,
                bite_point: bite.label.clone(),
                total_muscle_moment_arm: moments.total_moment_arm,
                outlever_length: eq.bite_moment_arm,
            });
            output.reactions.push(ReactionRow {
                species: species.to_string(),
                gape_angle: angle,
                bite_point: bite.label.clone(),
                gape_h,
                bite_force: eq.bite_force,
                bite_reaction_x: eq.bite_reaction.x,
                bite_reaction_y: eq.bite_reaction.y,
                bite_reaction_z: eq.bite_reaction.z,
                joint_reaction_x: eq.joint_reaction.x,
                joint_reaction_y: eq.joint_reaction.y,
                joint_reaction_z: eq.joint_reaction.z,
                joint_reaction_magnitude: eq.joint_reaction_magnitude(),
            });
        }
    }

    debug!(species, reactions = output.reactions.len(), "specimen evaluated");
    Ok(output)
}

fn push_strand_rows(
    output: &mut ModelOutput,
    input: &SpecimenInput,
    angle: u32,
    forces: &MuscleForces,
    moments: &MuscleMoments,
) {
    let species = input.species();
    for ((strand, force), moment) in input.strands.iter().zip(&forces.strands).zip(&moments.strands) {
        let vector = force.vector();
        output.forces.push(MuscleForceRow {
            species: species.to_string(),
            gape_angle: angle,
            muscle_group: strand.group,
            strand: strand.label.clone(),
            force_x: vector.x,
            force_y: vector.y,
            force_z: vector.z,
            force_magnitude: force.magnitude,
        });
        output.strains.push(MuscleStrainRow {
            species: species.to_string(),
            gape_angle: angle,
            muscle_group: strand.group,
            strand: strand.label.clone(),
            length: force.length,
            strain: force.strain,
        });
        output.moments.push(MuscleMomentRow {
            species: species.to_string(),
            gape_angle: angle,
            muscle_group: strand.group,
            strand: strand.label.clone(),
            moment: moment.moment,
            moment_arm: moment.moment_arm,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasurementSides;
    use crate::specimen::{BitePoint, MuscleGroup, MuscleStrand, Specimen};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use std::collections::BTreeMap;

    fn specimen(species: &str) -> SpecimenInput {
        SpecimenInput {
            specimen: Specimen {
                species: species.to_string(),
                head_width: 22.0,
                lower_jaw_length: 22.0,
            },
            joint: Point3::new(4.0, 0.0, 0.0),
            strands: vec![
                MuscleStrand::new(
                    MuscleGroup::Masseter,
                    "masseter_1",
                    Point3::new(4.0, 9.0, 6.0),
                    Point3::new(4.0, 11.0, -5.0),
                    2,
                    0.8,
                )
                .unwrap(),
                MuscleStrand::new(
                    MuscleGroup::Masseter,
                    "masseter_2",
                    Point3::new(4.0, 10.0, 6.0),
                    Point3::new(4.0, 12.0, -5.0),
                    2,
                    0.8,
                )
                .unwrap(),
                MuscleStrand::new(
                    MuscleGroup::Temporalis,
                    "temporalis_1",
                    Point3::new(3.0, -3.0, 10.0),
                    Point3::new(3.5, 4.0, 1.0),
                    1,
                    0.75,
                )
                .unwrap(),
            ],
            bite_points: vec![
                BitePoint {
                    label: "incisor".to_string(),
                    position: Point3::new(0.0, 22.0, -2.0),
                },
                BitePoint {
                    label: "molar".to_string(),
                    position: Point3::new(3.0, 14.0, -2.0),
                },
            ],
        }
    }

    fn set(inputs: Vec<SpecimenInput>) -> SpecimenSet {
        SpecimenSet {
            specimens: inputs
                .into_iter()
                .map(|i| (i.species().to_string(), i))
                .collect::<BTreeMap<_, _>>(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_sweep_row_counts() {
        let config = ModelConfig::default().with_gape_max(5);
        let output = evaluate_specimen(&specimen("A"), &config).unwrap();
        assert_eq!(output.resultants.len(), 6);
        assert_eq!(output.forces.len(), 18);
        assert_eq!(output.reactions.len(), 12);
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_zero_gape_single_angle() {
        let output = run_model(&set(vec![specimen("A"), specimen("B")]), &ModelConfig::default()).unwrap();
        assert_eq!(output.angles_for("A"), vec![0]);
        assert_eq!(output.angles_for("B"), vec![0]);
        assert!(output.reactions.iter().all(|r| r.gape_h == 0.0));
    }

    #[test]
    fn test_equilibrium_holds_at_every_angle() {
        let config = ModelConfig::default().with_gape_max(30);
        let output = evaluate_specimen(&specimen("A"), &config).unwrap();
        for reaction in &output.reactions {
            let resultant = output
                .resultants
                .iter()
                .find(|r| r.gape_angle == reaction.gape_angle)
                .unwrap();
            let arm = output
                .moment_arms
                .iter()
                .find(|m| m.gape_angle == reaction.gape_angle && m.bite_point == reaction.bite_point)
                .unwrap();
            assert_relative_eq!(
                resultant.total_moment,
                reaction.bite_force * arm.outlever_length,
                max_relative = 1e-9
            );
            let sum = Vector3::new(reaction.joint_reaction_x, reaction.joint_reaction_y, reaction.joint_reaction_z)
                + Vector3::new(resultant.resultant_x, resultant.resultant_y, resultant.resultant_z)
                + Vector3::new(reaction.bite_reaction_x, reaction.bite_reaction_y, reaction.bite_reaction_z);
            assert!(sum.norm() < 1e-9);
        }
    }

    #[test]
    fn test_gape_height_grows_with_angle() {
        let config = ModelConfig::default().with_gape_max(20);
        let output = evaluate_specimen(&specimen("A"), &config).unwrap();
        let heights: Vec<f64> = output
            .reactions
            .iter()
            .filter(|r| r.bite_point == "incisor")
            .map(|r| r.gape_h)
            .collect();
        assert!(heights.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_bilateral_doubling() {
        let one = evaluate_specimen(&specimen("A"), &ModelConfig::default().with_gape_max(3)).unwrap();
        let two = evaluate_specimen(
            &specimen("A"),
            &ModelConfig::default()
                .with_gape_max(3)
                .with_sides(MeasurementSides::Two),
        )
        .unwrap();
        for (a, b) in one.resultants.iter().zip(&two.resultants) {
            assert_eq!(a.total_force, 2.0 * b.total_force);
            assert_relative_eq!(a.total_moment, 2.0 * b.total_moment, max_relative = 1e-12);
        }
        for (a, b) in one.reactions.iter().zip(&two.reactions) {
            assert_relative_eq!(a.bite_force, 2.0 * b.bite_force, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_bite_point_only_skips_that_bite() {
        let mut input = specimen("A");
        input.bite_points.push(BitePoint {
            label: "condyle".to_string(),
            position: Point3::new(9.0, 0.0, 0.0),
        });
        let output = evaluate_specimen(&input, &ModelConfig::default().with_gape_max(2)).unwrap();
        assert_eq!(output.reactions.len(), 6);
        assert_eq!(output.skipped.len(), 3);
        assert!(output
            .skipped
            .iter()
            .all(|s| s.bite_point.as_deref() == Some("condyle") && s.error.error_code() == "DEGENERATE_GEOMETRY"));
    }

    #[test]
    fn test_zero_length_strand_skips_angle() {
        let mut input = specimen("A");
        // Insertion on the origin at rest
        input.strands[2].insertion = input.strands[2].origin;
        let output = evaluate_specimen(&input, &ModelConfig::default().with_gape_max(0)).unwrap();
        assert!(output.reactions.is_empty());
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].gape_angle, Some(0));
    }

    #[test]
    fn test_hinge_failure_skips_specimen() {
        let mut bad = specimen("B");
        for bite in &mut bad.bite_points {
            bite.position = Point3::new(-10.0, 0.0, 0.0);
        }
        let output = run_model(&set(vec![specimen("A"), bad]), &ModelConfig::default()).unwrap();
        assert_eq!(output.angles_for("A"), vec![0]);
        assert!(output.angles_for("B").is_empty());
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].species, "B");
        assert_eq!(output.skipped[0].gape_angle, None);
    }

    #[test]
    fn test_unloaded_muscles_give_zero_bite() {
        let mut input = specimen("A");
        for strand in &mut input.strands {
            strand.group_pcsa = 0.0;
        }
        let output = evaluate_specimen(&input, &ModelConfig::default().with_gape_max(2)).unwrap();

        assert!(output.skipped.is_empty());
        assert_eq!(output.resultants.len(), 3);
        assert_eq!(output.reactions.len(), 6);
        assert!(output
            .reactions
            .iter()
            .all(|r| r.bite_force == 0.0 && r.joint_reaction_magnitude == 0.0));
        assert!(output.moment_arms.iter().all(|m| m.total_muscle_moment_arm.is_none()));
        assert!(output.moment_arms.iter().all(|m| m.outlever_length > 0.0));
    }

    #[test]
    fn test_sweep_past_straight_down() {
        let output = evaluate_specimen(&specimen("A"), &ModelConfig::default().with_gape_max(200)).unwrap();
        assert_eq!(output.resultants.len(), 201);
        assert_eq!(output.angles_for("A").last(), Some(&200));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = ModelConfig::default().with_fibre_strength(5.0);
        assert!(run_model(&set(vec![specimen("A")]), &config).is_err());
    }
}
