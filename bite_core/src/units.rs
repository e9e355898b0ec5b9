//! # Unit Types
//!
//! Type-safe wrappers for the handful of units the jaw model works in. These
//! guard the places where units meet (area x stress = force, force x length =
//! moment) while staying plain `f64` on the wire.
//!
//! ## Units
//!
//! - Length: millimetres (mm), as measured on CT-derived skull models
//! - Area: square centimetres (cm²), as PCSA is reported from dissections
//! - Stress: newtons per square centimetre (N/cm²), maximum fibre strength
//! - Force: newtons (N)
//! - Moment: newton-millimetres (N·mm)
//! - Angle: degrees for gape, radians for rotation maths
//!
//! ## Example
//!
//! ```rust
//! use bite_core::units::{Newtons, NewtonsPerSqCm, SquareCentimeters};
//!
//! let force: Newtons = SquareCentimeters(2.0) * NewtonsPerSqCm(25.0);
//! assert_eq!(force, Newtons(50.0));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length, Area, Angle
// ============================================================================

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Area in square centimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareCentimeters(pub f64);

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

// ============================================================================
// Force, Stress, Moment
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Stress in newtons per square centimetre
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonsPerSqCm(pub f64);

/// Moment in newton-millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimeters(pub f64);

/// PCSA x fibre stress = muscle force
impl Mul<NewtonsPerSqCm> for SquareCentimeters {
    type Output = Newtons;
    fn mul(self, rhs: NewtonsPerSqCm) -> Newtons {
        Newtons(self.0 * rhs.0)
    }
}

/// Force x lever arm = moment
impl Mul<Millimeters> for Newtons {
    type Output = NewtonMillimeters;
    fn mul(self, rhs: Millimeters) -> NewtonMillimeters {
        NewtonMillimeters(self.0 * rhs.0)
    }
}

/// Moment / lever arm = force
impl Div<Millimeters> for NewtonMillimeters {
    type Output = Newtons;
    fn div(self, rhs: Millimeters) -> Newtons {
        Newtons(self.0 / rhs.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(SquareCentimeters);
impl_arithmetic!(Degrees);
impl_arithmetic!(Radians);
impl_arithmetic!(Newtons);
impl_arithmetic!(NewtonsPerSqCm);
impl_arithmetic!(NewtonMillimeters);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_radians() {
        let rad: Radians = Degrees(180.0).into();
        assert!((rad.0 - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_area_times_stress() {
        // Total PCSA of M. fascicularis at 25 N/cm²
        let force = SquareCentimeters(7.123) * NewtonsPerSqCm(25.0);
        assert!((force.0 - 178.075).abs() < 1e-9);
    }

    #[test]
    fn test_moment_round_trip() {
        let moment = Newtons(120.0) * Millimeters(35.0);
        assert_eq!(moment, NewtonMillimeters(4200.0));
        assert_eq!(moment / Millimeters(35.0), Newtons(120.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Newtons(10.0);
        let b = Newtons(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let length = Millimeters(53.0);
        let json = serde_json::to_string(&length).unwrap();
        assert_eq!(json, "53.0");

        let roundtrip: Millimeters = serde_json::from_str(&json).unwrap();
        assert_eq!(length, roundtrip);
    }
}
