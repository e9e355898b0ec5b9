//! Static equilibrium solver.
//!
//! The mandible is a rigid lever loaded by the muscles, the food at the bite
//! point and the cranium at the joint. With the joint reaction acting through
//! the hinge, moments about the hinge involve only the muscles and the bite:
//!
//! ```text
//! M_muscle - F_bite * L_out = 0        =>  F_bite = M_muscle / L_out
//! R_joint + sum(F_muscle) + F_bite_vec = 0
//! ```
//!
//! The bite reaction acts at the bite point, perpendicular to the out-lever in
//! the sagittal plane, in the jaw-opening direction.

use nalgebra::{Point3, Vector3};

use crate::errors::{ModelError, ModelResult};
use crate::units::{Millimeters, NewtonMillimeters, Newtons};

use super::kinematics::{HingeAxis, MIN_LEVER_ARM_MM};

/// Solved equilibrium for one bite point at one gape angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equilibrium {
    /// Bite force (N); negative when the muscles would open the jaw
    pub bite_force: f64,

    /// Reaction of the food on the mandible (N)
    pub bite_reaction: Vector3<f64>,

    /// Reaction of the cranium on the mandible at the joint (N)
    pub joint_reaction: Vector3<f64>,

    /// Out-lever (mm)
    pub bite_moment_arm: f64,

    /// Closing moment of the muscles (N·mm)
    pub muscle_moment: f64,
}

impl Equilibrium {
    /// Joint reaction magnitude (N)
    pub fn joint_reaction_magnitude(&self) -> f64 {
        self.joint_reaction.norm()
    }
}

/// Solve the lever for one bite point.
///
/// # Arguments
///
/// * `hinge` - Oriented hinge axis
/// * `bite` - Bite point at the current gape
/// * `muscle_moment` - Total closing moment of the muscles (N·mm)
/// * `muscle_resultant` - Vector sum of the muscle forces (N)
///
/// # Errors
///
/// * `DegenerateGeometry` - the bite point lies on the hinge axis (zero
///   out-lever) or the solution is not finite
pub fn solve(
    hinge: &HingeAxis,
    bite: &Point3<f64>,
    muscle_moment: f64,
    muscle_resultant: &Vector3<f64>,
) -> ModelResult<Equilibrium> {
    let lever = hinge.lever_arm(bite);
    let arm = lever.norm();
    if arm < MIN_LEVER_ARM_MM {
        return Err(ModelError::degenerate(
            "bite point coincides with the hinge axis, out-lever is zero",
        ));
    }

    let bite_force: Newtons = NewtonMillimeters(muscle_moment) / Millimeters(arm);
    if !bite_force.value().is_finite() {
        return Err(ModelError::degenerate("bite force is not finite"));
    }

    let opening_direction = hinge.opening_axis().cross(&lever) / arm;
    let bite_reaction = opening_direction * bite_force.value();
    let joint_reaction = -(muscle_resultant + bite_reaction);
    if !joint_reaction.iter().all(|c| c.is_finite()) {
        return Err(ModelError::degenerate("joint reaction is not finite"));
    }

    Ok(Equilibrium {
        bite_force: bite_force.value(),
        bite_reaction,
        joint_reaction,
        bite_moment_arm: arm,
        muscle_moment,
    })
}
