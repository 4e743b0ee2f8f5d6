//! divegps CLI - Debug tool for merging GPS fixes into a dive log
//!
//! Usage:
//!   divegps-cli merge --dives <dives.json> --fixes <fixes.json> [--output <out.json>]
//!   divegps-cli fixes --fixes <fixes.json>
//!
//! Dive logs are JSON arrays of dives, fix lists are JSON arrays of
//! `{ "when", "name", "latitude", "longitude" }` records. This tool shows
//! how fixes are classified, grouped and matched to dives.

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use divegps::{
    merge_locations_into_dives, time_utils::format_utc, DiveGpsError, DiveTable, FixKind,
    FixTable, GpsFix, GpsPoint, MergeConfig, NamedFixGroup, RawFix, Result,
};

#[derive(Parser)]
#[command(name = "divegps-cli")]
#[command(about = "Debug tool for merging GPS fixes into dive logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fixes into a dive log
    Merge {
        /// JSON file with the dive log
        #[arg(long)]
        dives: PathBuf,

        /// JSON file with the GPS fixes
        #[arg(long)]
        fixes: PathBuf,

        /// Write the updated dive log here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON merge configuration (missing fields use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the grouping/matching window, in hours
        #[arg(long)]
        window_hours: Option<f64>,

        /// Show what would change without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Show fix classification and named-fix grouping
    Fixes {
        /// JSON file with the GPS fixes
        #[arg(long)]
        fixes: PathBuf,

        /// Grouping window, in hours
        #[arg(long, default_value = "6")]
        window_hours: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Merge {
            dives,
            fixes,
            output,
            config,
            window_hours,
            dry_run,
        } => run_merge(
            &dives,
            &fixes,
            output.as_deref(),
            config.as_deref(),
            window_hours,
            dry_run,
            cli.verbose,
        ),
        Commands::Fixes {
            fixes,
            window_hours,
        } => run_fixes(&fixes, window_hours),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| DiveGpsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn hours_to_window(hours: f64) -> Result<i64> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(DiveGpsError::InvalidConfig(format!(
            "window must be a positive number of hours, got {}",
            hours
        )));
    }
    Ok((hours * 3600.0).round() as i64)
}

fn load_config(path: Option<&Path>, window_hours: Option<f64>) -> Result<MergeConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| DiveGpsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            MergeConfig::from_json(&json)?
        }
        None => MergeConfig::default(),
    };
    if let Some(hours) = window_hours {
        config.same_group_window = hours_to_window(hours)?;
    }
    config.validate()?;
    Ok(config)
}

fn run_merge(
    dives_path: &Path,
    fixes_path: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    window_hours: Option<f64>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config_path, window_hours)?;

    println!("\n{}", "=".repeat(60));
    println!("Loading dive log: {}", dives_path.display());
    println!("Loading fixes:    {}", fixes_path.display());
    println!("{}", "=".repeat(60));

    let mut dives: DiveTable = read_json(dives_path)?;
    let mut fixes: FixTable = read_json(fixes_path)?;

    println!(
        "  Loaded {} dives ({} already located), {} fixes",
        dives.len(),
        dives.located_count(),
        fixes.len()
    );
    println!(
        "  Window: {:.1}h",
        config.same_group_window as f64 / 3600.0
    );

    let before = dives.clone();
    let report = merge_locations_into_dives(&mut fixes, &mut dives, &config);

    println!("\n{}", "-".repeat(60));
    println!(
        "RESULTS: {} of {} dives updated",
        report.dives_updated,
        dives.len()
    );
    println!("{}", "-".repeat(60));
    println!(
        "  Fixes: {} automatic, {} named, {} skipped",
        report.automatic_fixes, report.named_fixes, report.skipped_fixes
    );
    println!(
        "  Set {} coordinates, {} site names",
        report.coordinates_set, report.names_set
    );

    if verbose || dry_run {
        for (i, (old, new)) in before.iter().zip(dives.iter()).enumerate() {
            if old == new {
                continue;
            }
            let label = new
                .number
                .map(|n| format!("#{}", n))
                .unwrap_or_else(|| format!("[{}]", i));
            println!("\n  Dive {} @ {}:", label, format_utc(new.when));
            if old.gps != new.gps {
                if let Some(gps) = &new.gps {
                    println!("    gps: ({:.5}, {:.5})", gps.latitude, gps.longitude);
                }
            }
            if old.location != new.location {
                println!("    location: {}", new.location.as_deref().unwrap_or(""));
            }
        }
    }

    if !report.unmatched.is_empty() {
        println!("\n  Unmatched named fixes:");
        for fix in &report.unmatched {
            println!("    - {} @ {}", fix.name, fix.formatted_time);
        }
    }

    if dry_run {
        println!("\nDry run, nothing written");
        return Ok(());
    }

    if let Some(path) = output {
        let file = File::create(path).map_err(|source| DiveGpsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &dives)?;
        writer.flush().map_err(|source| DiveGpsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        println!("\nWrote {}", path.display());
    }

    Ok(())
}

fn run_fixes(fixes_path: &Path, window_hours: f64) -> Result<()> {
    let window = hours_to_window(window_hours)?;
    let mut raw_fixes: Vec<RawFix> = read_json(fixes_path)?;
    // stable, so same-second fixes keep file order as in a merge
    raw_fixes.sort_by_key(|raw| raw.when);

    println!("\n{}", "=".repeat(60));
    println!("FIXES: {} ({})", raw_fixes.len(), fixes_path.display());
    println!("{}", "=".repeat(60));

    let mut group = NamedFixGroup::new();
    for raw in raw_fixes {
        let location = GpsPoint::new(raw.latitude, raw.longitude);
        let fix = match GpsFix::try_new(raw.when, raw.name.as_deref(), location) {
            Ok(fix) => fix,
            Err(e) => {
                println!("  {}  skipped     {}", format_utc(raw.when), e);
                continue;
            }
        };
        match &fix.kind {
            FixKind::Automatic => {
                println!(
                    "  {}  auto        ({:.5}, {:.5})",
                    format_utc(fix.when),
                    fix.location.latitude,
                    fix.location.longitude
                );
            }
            FixKind::Named(name) => {
                let nr = group.advance(fix.when, window);
                if nr == 1 {
                    println!("  {}", "-".repeat(40));
                }
                println!(
                    "  {}  named #{:<3} ({:.5}, {:.5}) {}",
                    format_utc(fix.when),
                    nr,
                    fix.location.latitude,
                    fix.location.longitude,
                    name
                );
            }
        }
    }

    Ok(())
}
