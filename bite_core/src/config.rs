//! # Model Configuration
//!
//! The parameters a caller chooses before running the model. A `ModelConfig`
//! is an immutable value passed into every pipeline function; nothing in the
//! crate keeps process-wide settings.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "measur_sides": 1,
//!   "gape_max": 30,
//!   "f_fibre_max": 25.0,
//!   "hinge_axis": [1.0, 0.0, 0.0],
//!   "vertical_axis": [0.0, 0.0, 1.0],
//!   "normalization_proxy": "lower_jaw_length"
//! }
//! ```
//!
//! Every field has a default, so a partial file (or `{}`) is valid.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ModelError, ModelResult};

/// Lowest accepted maximum fibre strength (N/cm²)
pub const MIN_FIBRE_STRENGTH: f64 = 18.0;

/// Default maximum fibre strength (N/cm²)
pub const DEFAULT_FIBRE_STRENGTH: f64 = 25.0;

/// Gape beyond which the mandible has swung past straight down (degrees).
/// Larger sweeps are still evaluated but logged.
pub const FULL_OPENING_ANGLE: u32 = 180;

/// On how many sides of the skull the muscles were measured.
///
/// Serializes as the bare number `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MeasurementSides {
    /// One side measured; forces are doubled for the bilateral contribution
    #[default]
    One,
    /// Both sides measured and already summed
    Two,
}

impl MeasurementSides {
    /// Multiplier applied to every muscle force
    pub fn bilateral_factor(self) -> f64 {
        match self {
            MeasurementSides::One => 2.0,
            MeasurementSides::Two => 1.0,
        }
    }
}

impl TryFrom<u8> for MeasurementSides {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MeasurementSides::One),
            2 => Ok(MeasurementSides::Two),
            other => Err(ModelError::invalid_input(
                "measur_sides",
                other.to_string(),
                "Must be 1 or 2",
            )),
        }
    }
}

impl From<MeasurementSides> for u8 {
    fn from(sides: MeasurementSides) -> u8 {
        match sides {
            MeasurementSides::One => 1,
            MeasurementSides::Two => 2,
        }
    }
}

/// Linear body-size measurement used to compare specimens of different size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    /// Head width (mm)
    HeadWidth,
    /// Lower jaw length (mm)
    #[default]
    LowerJawLength,
}

impl ProxyKind {
    /// Column name in the morphology table
    pub fn column_name(&self) -> &'static str {
        match self {
            ProxyKind::HeadWidth => "head_width",
            ProxyKind::LowerJawLength => "lower_jaw_length",
        }
    }
}

impl std::str::FromStr for ProxyKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "head_width" | "hw" => Ok(ProxyKind::HeadWidth),
            "lower_jaw_length" | "ljl" | "jaw_length" => Ok(ProxyKind::LowerJawLength),
            other => Err(ModelError::invalid_input(
                "normalization_proxy",
                other,
                "Expected head_width or lower_jaw_length",
            )),
        }
    }
}

/// Parameters of one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Sides of the skull on which the muscles were measured
    pub measur_sides: MeasurementSides,

    /// Largest gape angle evaluated (degrees); the sweep runs 0..=gape_max
    pub gape_max: u32,

    /// Maximum muscle fibre strength (N/cm²)
    pub f_fibre_max: f64,

    /// Mediolateral direction of the jaw hinge, perpendicular to the sagittal plane
    pub hinge_axis: [f64; 3],

    /// Direction that counts as "up"; opening moves the bite point against it
    pub vertical_axis: [f64; 3],

    /// Body-size proxy used by the normalization layer
    pub normalization_proxy: ProxyKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            measur_sides: MeasurementSides::One,
            gape_max: 0,
            f_fibre_max: DEFAULT_FIBRE_STRENGTH,
            hinge_axis: [1.0, 0.0, 0.0],
            vertical_axis: [0.0, 0.0, 1.0],
            normalization_proxy: ProxyKind::LowerJawLength,
        }
    }
}

impl ModelConfig {
    /// Validate parameters.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.f_fibre_max.is_finite() || self.f_fibre_max < MIN_FIBRE_STRENGTH {
            return Err(ModelError::invalid_input(
                "f_fibre_max",
                self.f_fibre_max.to_string(),
                format!("Fibre strength must be at least {} N/cm²", MIN_FIBRE_STRENGTH),
            ));
        }
        if self.gape_max > FULL_OPENING_ANGLE {
            warn!(
                gape_max = self.gape_max,
                "gape sweep goes past {} deg, the jaw will rotate through the cranium",
                FULL_OPENING_ANGLE
            );
        }
        let hinge = self.hinge_direction()?;
        let vertical = self.vertical_direction()?;
        if hinge.into_inner().cross(&vertical.into_inner()).norm() < 1e-6 {
            return Err(ModelError::invalid_input(
                "vertical_axis",
                format!("{:?}", self.vertical_axis),
                "Vertical axis must not be parallel to the hinge axis",
            ));
        }
        Ok(())
    }

    /// Unit hinge axis direction (sign not yet oriented to the jaw)
    pub fn hinge_direction(&self) -> ModelResult<Unit<Vector3<f64>>> {
        unit_axis("hinge_axis", self.hinge_axis)
    }

    /// Unit vertical direction
    pub fn vertical_direction(&self) -> ModelResult<Unit<Vector3<f64>>> {
        unit_axis("vertical_axis", self.vertical_axis)
    }

    /// Gape angles evaluated by a sweep, in order
    pub fn gape_angles(&self) -> impl Iterator<Item = u32> {
        0..=self.gape_max
    }

    /// Builder-style override of the gape sweep
    pub fn with_gape_max(mut self, gape_max: u32) -> Self {
        self.gape_max = gape_max;
        self
    }

    /// Builder-style override of the measured sides
    pub fn with_sides(mut self, sides: MeasurementSides) -> Self {
        self.measur_sides = sides;
        self
    }

    /// Builder-style override of the fibre strength
    pub fn with_fibre_strength(mut self, f_fibre_max: f64) -> Self {
        self.f_fibre_max = f_fibre_max;
        self
    }
}

fn unit_axis(field: &str, axis: [f64; 3]) -> ModelResult<Unit<Vector3<f64>>> {
    let v = Vector3::from(axis);
    if !v.iter().all(|c| c.is_finite()) || v.norm() < 1e-12 {
        return Err(ModelError::invalid_input(
            field,
            format!("{:?}", axis),
            "Axis must be a finite, non-zero vector",
        ));
    }
    Ok(Unit::new_normalize(v))
}
