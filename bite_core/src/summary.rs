//! # Summary Metrics
//!
//! Reduces the per-angle reaction table to one line per specimen and bite
//! point: the peak bite force over the gape sweep (`BfMag`), the biting
//! efficiency at that angle (`BitingEff`), and where the peak happened.
//!
//! The wide form ([`SummaryMetric`]) is what the code works with; the long
//! form ([`SummaryRow`]) is the melted table written to CSV.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ModelError, ModelResult, SkippedItem};
use crate::tables::{MuscleResultantRow, ReactionRow};

/// Summary variable names, as they appear in the long table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SummaryVariable {
    /// Peak bite force (N)
    BfMag,
    /// Bite force / total muscle force at the peak
    BitingEff,
}

impl std::fmt::Display for SummaryVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryVariable::BfMag => f.write_str("BfMag"),
            SummaryVariable::BitingEff => f.write_str("BitingEff"),
        }
    }
}

/// Peak bite performance of one specimen at one bite point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetric {
    pub species: String,
    pub bite_point: String,

    /// Gape angle of the peak (degrees); ties go to the smallest angle
    pub gape_angle: u32,

    /// Jaw opening at the peak (mm)
    pub gape_h: f64,

    /// Peak bite force (N)
    pub bite_force: f64,

    /// Bite force / total muscle force, dimensionless
    pub biting_efficiency: f64,
}

/// One row of the melted summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub species: String,
    pub gape_angle: u32,
    pub gape_h: f64,
    pub variable: SummaryVariable,
    pub bite_point: String,
    pub value: f64,
}

/// Summary metrics plus the specimen/bite-point pairs that could not be summarized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub metrics: Vec<SummaryMetric>,
    pub skipped: Vec<SkippedItem>,
}

impl Summary {
    /// Long form: two rows per metric, `BfMag` then `BitingEff`
    pub fn melt(&self) -> Vec<SummaryRow> {
        melt(&self.metrics)
    }

    /// Look up the metric for one specimen and bite point
    pub fn get(&self, species: &str, bite_point: &str) -> Option<&SummaryMetric> {
        self.metrics
            .iter()
            .find(|m| m.species == species && m.bite_point == bite_point)
    }
}

/// Select the peak bite force per specimen and bite point.
///
/// # Arguments
///
/// * `reactions` - Reaction table, any order
/// * `resultants` - Resultant table supplying the total muscle force per angle
///
/// Metrics come out sorted by species, then bite point. A pair whose peak
/// angle has no resultant row (`MissingGroup`) or zero total muscle force
/// (`DegenerateGeometry`) is recorded in [`Summary::skipped`].
pub fn summarize(reactions: &[ReactionRow], resultants: &[MuscleResultantRow]) -> Summary {
    let mut peaks: BTreeMap<(&str, &str), &ReactionRow> = BTreeMap::new();
    for row in reactions {
        let key = (row.species.as_str(), row.bite_point.as_str());
        let replace = peaks.get(&key).map_or(true, |best| is_better_peak(row, best));
        if replace {
            peaks.insert(key, row);
        }
    }

    let totals: BTreeMap<(&str, u32), f64> = resultants
        .iter()
        .map(|r| ((r.species.as_str(), r.gape_angle), r.total_force))
        .collect();

    let mut summary = Summary::default();
    for ((species, bite_point), peak) in peaks {
        match biting_efficiency(peak, totals.get(&(species, peak.gape_angle)).copied()) {
            Ok(efficiency) => summary.metrics.push(SummaryMetric {
                species: species.to_string(),
                bite_point: bite_point.to_string(),
                gape_angle: peak.gape_angle,
                gape_h: peak.gape_h,
                bite_force: peak.bite_force,
                biting_efficiency: efficiency,
            }),
            Err(error) => {
                warn!(species, bite_point, %error, "cannot summarize bite point");
                summary.skipped.push(SkippedItem::bite_point(
                    species,
                    peak.gape_angle,
                    bite_point,
                    error,
                ));
            }
        }
    }
    summary
}

/// Larger bite force wins; equal forces keep the smaller angle.
fn is_better_peak(candidate: &ReactionRow, best: &ReactionRow) -> bool {
    candidate.bite_force > best.bite_force
        || (candidate.bite_force == best.bite_force && candidate.gape_angle < best.gape_angle)
}

fn biting_efficiency(peak: &ReactionRow, total_force: Option<f64>) -> ModelResult<f64> {
    let total = total_force.ok_or_else(|| ModelError::missing_group(peak.species.clone(), "muscle resultant"))?;
    if total <= 0.0 || !total.is_finite() {
        return Err(ModelError::degenerate(
            "total muscle force is zero, biting efficiency is undefined",
        ));
    }
    Ok(peak.bite_force / total)
}

/// Melt wide metrics into the long summary table.
pub fn melt(metrics: &[SummaryMetric]) -> Vec<SummaryRow> {
    metrics
        .iter()
        .flat_map(|m| {
            [
                (SummaryVariable::BfMag, m.bite_force),
                (SummaryVariable::BitingEff, m.biting_efficiency),
            ]
            .into_iter()
            .map(move |(variable, value)| SummaryRow {
                species: m.species.clone(),
                gape_angle: m.gape_angle,
                gape_h: m.gape_h,
                variable,
                bite_point: m.bite_point.clone(),
                value,
            })
        })
        .collect()
}
