//! takbis CLI - land-registry certificate reconciliation tool

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use takbis::render::{to_json, to_text};
use takbis::{
    load_layouts, BankDirectory, DocumentStatus, JsonFormat, JsonLayoutSource, LayoutSource,
    Pipeline, PipelineOptions, Store, ThresholdKey,
};

#[derive(Parser)]
#[command(name = "takbis")]
#[command(version)]
#[command(about = "Recover and store TAKBIS land-registry certificates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process layout dumps and store the results
    Process {
        /// Layout file or directory of layout files
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Database file
        #[arg(long, env = "TAKBIS_DB", default_value = "takbis.db")]
        db: PathBuf,

        /// Pipeline options (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Bank directory file
        #[arg(long, env = "TAKBIS_BANKS", value_name = "FILE")]
        banks: Option<PathBuf>,

        /// Replace parcels that are already stored
        #[arg(long)]
        overwrite: bool,

        /// Stop after this many failed documents
        #[arg(long, value_name = "N")]
        max_failures: Option<usize>,

        /// Write the batch report to a JSON file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Process one layout dump without storing it
    Inspect {
        /// Layout file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Pipeline options (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show a stored parcel
    Parcel {
        /// Parcel identity
        #[arg(value_name = "ID")]
        identity: String,

        /// Database file
        #[arg(long, env = "TAKBIS_DB", default_value = "takbis.db")]
        db: PathBuf,

        /// Output JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// List stored parcels
    List {
        /// Database file
        #[arg(long, env = "TAKBIS_DB", default_value = "takbis.db")]
        db: PathBuf,

        /// Output a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Inspect the bank directory
    Banks {
        /// Bank directory file (built-in list if not specified)
        #[arg(long, env = "TAKBIS_BANKS", value_name = "FILE")]
        banks: Option<PathBuf>,

        #[command(subcommand)]
        action: BankAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum BankAction {
    /// List every known institution
    List,
    /// Resolve a free-text institution name
    Resolve {
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            db,
            config,
            banks,
            overwrite,
            max_failures,
            report,
        } => cmd_process(
            &input,
            &db,
            config.as_deref(),
            banks,
            overwrite,
            max_failures,
            report.as_deref(),
        ),
        Commands::Inspect {
            input,
            config,
            output,
            compact,
        } => cmd_inspect(&input, config.as_deref(), output.as_deref(), compact),
        Commands::Parcel { identity, db, json } => cmd_parcel(&identity, &db, json),
        Commands::List { db, json } => cmd_list(&db, json),
        Commands::Banks { banks, action } => cmd_banks(banks.as_deref(), action),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_options(config: Option<&Path>) -> Result<PipelineOptions, Box<dyn std::error::Error>> {
    Ok(match config {
        Some(path) => {
            log::debug!("Loading options from {}", path.display());
            PipelineOptions::from_json_file(path)?
        }
        None => PipelineOptions::default(),
    })
}

fn cmd_process(
    input: &Path,
    db: &Path,
    config: Option<&Path>,
    banks: Option<PathBuf>,
    overwrite: bool,
    max_failures: Option<usize>,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = load_options(config)?;
    if let Some(path) = banks {
        options = options.with_bank_directory(path);
    }

    let layouts = load_layouts(&JsonLayoutSource::new(), input)?;
    if layouts.is_empty() {
        println!("{}", "No layout files found".yellow());
        return Ok(());
    }

    let mut pipeline = Pipeline::new(options)?;
    let mut store = Store::open(db)?;
    log::info!("Processing {} layouts into {}", layouts.len(), db.display());

    let pb = ProgressBar::new(layouts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failures = 0;
    let report = pipeline.run_batch(layouts, &mut store, overwrite, |outcome| {
        pb.set_message(outcome.source.clone());
        pb.inc(1);
        match &outcome.status {
            DocumentStatus::Failed { error } => {
                pb.println(format!("{} {}: {}", "✗".red(), outcome.source, error));
                failures += 1;
            }
            DocumentStatus::Processed { diagnostics, .. } if !diagnostics.is_empty() => {
                for diagnostic in diagnostics {
                    pb.println(format!("{} {}: {}", "!".yellow(), outcome.source, diagnostic));
                }
            }
            _ => {}
        }
        match max_failures {
            Some(max) if failures >= max => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;
    pb.finish_with_message("Done!");

    println!();
    println!("{}: {}", "Processed".green().bold(), report.processed());
    println!("{}: {}", "Skipped".bold(), report.skipped());
    println!("{}: {}", "Failed".bold(), report.failed());
    println!(
        "{}: {}",
        "Discarded observations".dimmed(),
        report.discarded_observations
    );
    if report.cancelled {
        println!("{}", "Stopped early: too many failures".yellow());
    }

    if let Some(path) = report_path {
        fs::write(path, to_json(&report, JsonFormat::Pretty)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }

    Ok(())
}

fn cmd_inspect(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let layout = JsonLayoutSource::new().load(input)?;
    let mut pipeline = Pipeline::with_directory(load_options(config)?, BankDirectory::with_defaults());
    let doc = pipeline.process(&layout)?;

    for diagnostic in &doc.diagnostics {
        eprintln!("{} {}", "Warning:".yellow(), diagnostic);
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(&doc, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_parcel(identity: &str, db: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let profile = store
        .profile(identity)?
        .ok_or_else(|| format!("Parcel {} not found", identity))?;

    if json {
        println!("{}", to_json(&profile, JsonFormat::Pretty)?);
    } else {
        println!("{}", to_text(&profile)?);
    }
    Ok(())
}

fn cmd_list(db: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let parcels = store.list_parcels()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&parcels)?);
        return Ok(());
    }

    println!("{}", "Stored Parcels".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for identity in &parcels {
        println!("{}", identity);
    }
    println!("\n{}: {}", "Total".bold(), parcels.len());
    Ok(())
}

fn cmd_banks(banks: Option<&Path>, action: BankAction) -> Result<(), Box<dyn std::error::Error>> {
    let directory = match banks {
        Some(path) => BankDirectory::open(path)?,
        None => BankDirectory::with_defaults(),
    };

    match action {
        BankAction::List => {
            for (vkn, name) in directory.entries() {
                println!("{}  {}", vkn.dimmed(), name);
            }
            println!("\n{}: {}", "Total".bold(), directory.len());
        }
        BankAction::Resolve { text } => {
            let threshold = PipelineOptions::default().threshold(ThresholdKey::BankName);
            match directory.resolve_similar(&text, threshold) {
                Some(name) => println!("{}", name.green()),
                None => println!("{}", "No match".yellow()),
            }
        }
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "takbis".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Land-registry certificate reconciliation tool");
    println!();
    println!("License: MIT");
}
