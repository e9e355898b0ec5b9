//! # Analysis
//!
//! One call from raw input tables to every result table: group the inputs by
//! species, run the model over the gape sweep, summarize, then normalize by
//! body size and summarize again.
//!
//! ## Example
//!
//! ```rust
//! use bite_core::analysis::analyze;
//! use bite_core::config::ModelConfig;
//! use bite_core::morphology::{reference_morphology, MorphologyTable};
//! use bite_core::tables::{read_rows, GeometryRow, MuscleRow};
//!
//! let muscles: Vec<MuscleRow> = read_rows(
//!     "species,muscle_group,origin_x,origin_y,origin_z,insertion_x,insertion_y,insertion_z,n_strands\n\
//!      M. murinus,masseter,4,12,6,4,11,-5,1\n".as_bytes(),
//!     "muscle",
//! ).unwrap();
//! let geometry: Vec<GeometryRow> = read_rows(
//!     "species,joint_x,joint_y,joint_z,bite_x,bite_y,bite_z\n\
//!      M. murinus,4,0,0,0,22,-2\n".as_bytes(),
//!     "geometry",
//! ).unwrap();
//! let morphology = MorphologyTable::from_rows(reference_morphology()).unwrap();
//!
//! let analysis = analyze(&muscles, &geometry, &morphology, &ModelConfig::default().with_gape_max(20)).unwrap();
//! let peak = analysis.summary.get("M. murinus", "bite_1").unwrap();
//! let scaled = analysis.normalized_summary.get("M. murinus", "bite_1").unwrap();
//! assert!((scaled.bite_force * 22.0 - peak.bite_force).abs() < 1e-9);
//! ```

use tracing::info;

use crate::config::ModelConfig;
use crate::errors::{ModelResult, SkippedItem};
use crate::model::{run_model, ModelOutput};
use crate::morphology::{Morphology, MorphologyTable};
use crate::normalize::{normalize_morphology, normalize_table};
use crate::summary::{summarize, Summary};
use crate::tables::{
    group_specimens, insert_pcsa, GeometryRow, MomentArmRow, MuscleForceRow, MuscleMomentRow, MusclePcsaRow,
    MuscleResultantRow, MuscleRow, MuscleStrainRow, ReactionRow,
};

/// Result tables divided by each specimen's size proxy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedOutput {
    pub forces: Vec<MuscleForceRow>,
    pub strains: Vec<MuscleStrainRow>,
    pub moments: Vec<MuscleMomentRow>,
    pub resultants: Vec<MuscleResultantRow>,
    pub moment_arms: Vec<MomentArmRow>,
    pub reactions: Vec<ReactionRow>,

    /// Morphology with PCSA as sqrt(PCSA) / proxy
    pub morphology: Vec<Morphology>,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Muscle rows of the evaluated specimens, with per-strand PCSA
    pub muscles: Vec<MusclePcsaRow>,

    /// Absolute result tables
    pub output: ModelOutput,

    /// Peak bite force per specimen and bite point
    pub summary: Summary,

    /// Size-normalized result tables
    pub normalized: NormalizedOutput,

    /// Summary recomputed from the normalized tables
    pub normalized_summary: Summary,
}

impl Analysis {
    /// Every skipped item of the run: grouping, model and both summaries
    pub fn skipped(&self) -> Vec<SkippedItem> {
        self.output
            .skipped
            .iter()
            .chain(&self.summary.skipped)
            .chain(&self.normalized_summary.skipped)
            .cloned()
            .collect()
    }
}

/// Run the full analysis.
///
/// # Errors
///
/// * `InvalidInput` - invalid configuration
///
/// Specimen-level problems never fail the call; they are reported through
/// [`Analysis::skipped`].
pub fn analyze(
    muscles: &[MuscleRow],
    geometry: &[GeometryRow],
    morphology: &MorphologyTable,
    config: &ModelConfig,
) -> ModelResult<Analysis> {
    config.validate()?;

    let specimens = group_specimens(muscles, geometry, morphology);
    let evaluated: Vec<MuscleRow> = muscles
        .iter()
        .filter(|row| specimens.specimens.contains_key(&row.species))
        .cloned()
        .collect();
    let muscles = insert_pcsa(&evaluated, morphology)?;

    let output = run_model(&specimens, config)?;
    let summary = summarize(&output.reactions, &output.resultants);

    let kind = config.normalization_proxy;
    let normalized = NormalizedOutput {
        forces: normalize_table(&output.forces, morphology, kind)?,
        strains: normalize_table(&output.strains, morphology, kind)?,
        moments: normalize_table(&output.moments, morphology, kind)?,
        resultants: normalize_table(&output.resultants, morphology, kind)?,
        moment_arms: normalize_table(&output.moment_arms, morphology, kind)?,
        reactions: normalize_table(&output.reactions, morphology, kind)?,
        morphology: normalize_morphology(morphology, kind)?,
    };
    let normalized_summary = summarize(&normalized.reactions, &normalized.resultants);

    info!(
        metrics = summary.metrics.len(),
        proxy = kind.column_name(),
        "analysis complete"
    );

    Ok(Analysis {
        muscles,
        output,
        summary,
        normalized,
        normalized_summary,
    })
}
