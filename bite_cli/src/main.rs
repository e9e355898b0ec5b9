//! # Bite Model CLI
//!
//! Command-line front-end for `bite_core`.
//!
//! # Commands
//!
//! - `bite_cli run --muscles m.csv --geometry g.csv` - Run the model and write result tables
//! - `bite_cli show --report out/report.json` - Print the summary of a saved run
//! - `bite_cli reference` - Print the built-in reference morphology
//!
//! Log verbosity follows `RUST_LOG`; `--verbose` raises the default to debug.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bite_core::analysis::{analyze, Analysis};
use bite_core::config::{MeasurementSides, ModelConfig, ProxyKind};
use bite_core::errors::ModelError;
use bite_core::file_io::{
    load_config, load_morphology, load_report, read_table_file, save_report, write_table_file,
};
use bite_core::morphology::{reference_morphology, MorphologyTable};
use bite_core::normalize::normalize_morphology;
use bite_core::report::RunReport;
use bite_core::tables::{GeometryRow, MuscleRow};

/// Static jaw-lever bite force model.
#[derive(Parser)]
#[command(name = "bite_cli")]
#[command(about = "Static bite force model for jaw muscle and joint geometry", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the model over a gape sweep and write the result tables
    Run {
        /// Muscle attachment table (CSV)
        #[arg(long)]
        muscles: PathBuf,

        /// Joint and bite point table (CSV)
        #[arg(long)]
        geometry: PathBuf,

        /// Morphology / PCSA table (CSV); the reference species when absent
        #[arg(long)]
        morphology: Option<PathBuf>,

        /// Model configuration (JSON); flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sides of the skull the muscles were measured on (1 or 2)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        measur_sides: Option<u8>,

        /// Largest gape angle in degrees
        #[arg(long)]
        gape_max: Option<u32>,

        /// Maximum fibre strength (N/cm²)
        #[arg(long)]
        f_fibre_max: Option<f64>,

        /// Size proxy for normalization (head_width or lower_jaw_length)
        #[arg(long)]
        proxy: Option<ProxyKind>,

        /// Directory for the result tables and run report
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the summary of a saved run report
    Show {
        /// Run report (JSON) written by `run --out`
        #[arg(long)]
        report: PathBuf,
    },

    /// Print the built-in reference morphology
    Reference {
        /// Size proxy for the normalized PCSA
        #[arg(long, default_value = "lower_jaw_length")]
        proxy: ProxyKind,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            muscles,
            geometry,
            morphology,
            config,
            measur_sides,
            gape_max,
            f_fibre_max,
            proxy,
            out,
            json,
        } => {
            let overrides = Overrides {
                measur_sides,
                gape_max,
                f_fibre_max,
                proxy,
            };
            run(&muscles, &geometry, morphology.as_deref(), config.as_deref(), overrides, out.as_deref(), json)
        }
        Commands::Show { report } => show(&report),
        Commands::Reference { proxy } => reference(proxy),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(model_error) = e.downcast_ref::<ModelError>() {
                if let Ok(json) = serde_json::to_string_pretty(model_error) {
                    eprintln!();
                    eprintln!("Error JSON:");
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line values that replace the configuration file's
struct Overrides {
    measur_sides: Option<u8>,
    gape_max: Option<u32>,
    f_fibre_max: Option<f64>,
    proxy: Option<ProxyKind>,
}

impl Overrides {
    fn apply(self, mut config: ModelConfig) -> Result<ModelConfig> {
        if let Some(sides) = self.measur_sides {
            config.measur_sides = MeasurementSides::try_from(sides)?;
        }
        if let Some(gape_max) = self.gape_max {
            config.gape_max = gape_max;
        }
        if let Some(f_fibre_max) = self.f_fibre_max {
            config.f_fibre_max = f_fibre_max;
        }
        if let Some(proxy) = self.proxy {
            config.normalization_proxy = proxy;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(
    muscles_path: &Path,
    geometry_path: &Path,
    morphology_path: Option<&Path>,
    config_path: Option<&Path>,
    overrides: Overrides,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config(path).with_context(|| format!("loading configuration {}", path.display()))?,
        None => ModelConfig::default(),
    };
    let config = overrides.apply(config)?;

    let muscles: Vec<MuscleRow> = read_table_file(muscles_path, "muscle")?;
    let geometry: Vec<GeometryRow> = read_table_file(geometry_path, "geometry")?;
    let morphology = match morphology_path {
        Some(path) => load_morphology(path)?,
        None => MorphologyTable::from_rows(reference_morphology())?,
    };
    info!(
        muscles = muscles.len(),
        geometry = geometry.len(),
        species = morphology.len(),
        gape_max = config.gape_max,
        "inputs loaded"
    );

    let analysis = analyze(&muscles, &geometry, &morphology, &config)?;
    let report = RunReport::new(&analysis, &config);

    if let Some(dir) = out {
        write_outputs(dir, &analysis, &report)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn write_outputs(dir: &Path, analysis: &Analysis, report: &RunReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))?;

    let output = &analysis.output;
    let normalized = &analysis.normalized;
    write_table_file(&dir.join("muscles_pcsa.csv"), &analysis.muscles)?;
    write_table_file(&dir.join("muscle_force.csv"), &output.forces)?;
    write_table_file(&dir.join("muscle_strain.csv"), &output.strains)?;
    write_table_file(&dir.join("muscle_moment.csv"), &output.moments)?;
    write_table_file(&dir.join("muscle_resultant.csv"), &output.resultants)?;
    write_table_file(&dir.join("moment_arm.csv"), &output.moment_arms)?;
    write_table_file(&dir.join("freac.csv"), &output.reactions)?;
    write_table_file(&dir.join("summary.csv"), &analysis.summary.melt())?;

    write_table_file(&dir.join("morpho_norm.csv"), &normalized.morphology)?;
    write_table_file(&dir.join("muscle_force_norm.csv"), &normalized.forces)?;
    write_table_file(&dir.join("muscle_strain_norm.csv"), &normalized.strains)?;
    write_table_file(&dir.join("muscle_moment_norm.csv"), &normalized.moments)?;
    write_table_file(&dir.join("muscle_resultant_norm.csv"), &normalized.resultants)?;
    write_table_file(&dir.join("moment_arm_norm.csv"), &normalized.moment_arms)?;
    write_table_file(&dir.join("freac_norm.csv"), &normalized.reactions)?;
    write_table_file(&dir.join("summary_norm.csv"), &analysis.normalized_summary.melt())?;

    save_report(report, &dir.join("report.json"))?;
    info!(dir = %dir.display(), "outputs written");
    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let report = load_report(path).with_context(|| format!("loading run report {}", path.display()))?;
    info!(
        version = %report.meta.version,
        generated_at = %report.meta.generated_at,
        specimens = report.meta.specimen_count,
        "report loaded"
    );
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let config = &report.config;
    println!("═══════════════════════════════════════════════════════════");
    println!("  BITE FORCE SUMMARY (gape 0-{} deg, f_fibre_max {} N/cm²)", config.gape_max, config.f_fibre_max);
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "  {:<20} {:<12} {:>6} {:>9} {:>10} {:>9}",
        "Species", "Bite point", "Angle", "gape_h", "BfMag (N)", "BitingEff"
    );
    for metric in &report.summary {
        println!(
            "  {:<20} {:<12} {:>6} {:>9.2} {:>10.2} {:>9.3}",
            metric.species, metric.bite_point, metric.gape_angle, metric.gape_h, metric.bite_force, metric.biting_efficiency
        );
    }
    println!();
    println!("  Normalized by {}:", config.normalization_proxy.column_name());
    for metric in &report.normalized_summary {
        println!(
            "  {:<20} {:<12} {:>6} {:>9.4} {:>10.4} {:>9.3}",
            metric.species, metric.bite_point, metric.gape_angle, metric.gape_h, metric.bite_force, metric.biting_efficiency
        );
    }

    if !report.skipped.is_empty() {
        println!();
        println!("  Skipped:");
        for item in &report.skipped {
            println!("  [SKIP] {}", item.error);
        }
    }
    println!("═══════════════════════════════════════════════════════════");
}

fn reference(proxy: ProxyKind) -> Result<()> {
    let table = MorphologyTable::from_rows(reference_morphology())?;
    let normalized = normalize_morphology(&table, proxy)?;

    println!(
        "  {:<16} {:>6} {:>6} {:>9} {:>9} {:>9} {:>9}",
        "Species", "HW", "LJL", "Masseter", "PtM", "Temp", "Total"
    );
    for row in table.rows() {
        println!(
            "  {:<16} {:>6.1} {:>6.1} {:>9.3} {:>9.3} {:>9.3} {:>9.3}",
            row.species,
            row.head_width,
            row.lower_jaw_length,
            row.pcsa_masseter,
            row.pcsa_pterygoid_medial,
            row.pcsa_temporalis,
            row.pcsa_total
        );
    }
    println!();
    println!("  sqrt(PCSA) / {}:", proxy.column_name());
    for row in &normalized {
        println!(
            "  {:<16} {:>6} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
            row.species, "", "", row.pcsa_masseter, row.pcsa_pterygoid_medial, row.pcsa_temporalis, row.pcsa_total
        );
    }
    Ok(())
}
