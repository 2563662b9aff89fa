use clap::{Parser, Subcommand};
use nhcx_core::{
    config::resolve_terminology_path, constants::DEFAULT_LANGUAGE, summarize_bundle,
    validate_bundle, CoreConfig, InsurancePlanMapper, Terminology,
};
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nhcx")]
#[command(about = "NHCX insurance-plan FHIR bundle CLI")]
struct Cli {
    /// Terminology dictionary (defaults to data/snomed_dictionary.json when found)
    #[arg(long, global = true)]
    terminology: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Map an extracted insurance-plan record to a FHIR bundle
    Generate {
        /// Record JSON file
        record: PathBuf,
        /// Write the bundle here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Bundle and plan language
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },
    /// Check a bundle file; exits non-zero when it has errors
    Validate {
        /// Bundle JSON file
        bundle: PathBuf,
    },
    /// Summarise the plan held in a bundle file
    Summary {
        /// Bundle JSON file
        bundle: PathBuf,
    },
    /// Look up a code or display text in the terminology dictionary
    Resolve {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        display: Option<String>,
    },
}

fn read_json(path: &Path) -> Result<Value, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
    Ok(value)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs `generate`, returning the bundle document.
fn generate(
    terminology: &Terminology,
    record_path: &Path,
    language: String,
) -> Result<Value, Box<dyn Error>> {
    let record = read_json(record_path)?;
    if !record.is_object() {
        return Err(format!("{} does not hold a JSON object", record_path.display()).into());
    }
    let config = CoreConfig::new(None, language)?;
    let report = InsurancePlanMapper::new(terminology, &config).generate_report(&record);
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(report.document)
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nhcx=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let load_terminology =
        || Terminology::load(resolve_terminology_path(cli.terminology.clone()).as_deref());

    match cli.command {
        Some(Commands::Generate {
            ref record,
            ref output,
            ref language,
        }) => {
            let document = generate(&load_terminology(), record, language.clone())?;
            let rendered = serde_json::to_string_pretty(&document)?;
            match output {
                Some(path) => {
                    std::fs::write(path, rendered)
                        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
                    println!("Wrote bundle to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Some(Commands::Validate { ref bundle }) => {
            let report = validate_bundle(&read_json(bundle)?);
            print_json(&report)?;
            if !report.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Summary { ref bundle }) => {
            print_json(&summarize_bundle(&read_json(bundle)?))?;
        }
        Some(Commands::Resolve {
            ref code,
            ref display,
        }) => {
            let resolved = load_terminology().resolve(code.as_deref(), display.as_deref());
            println!(
                "code: {}\ndisplay: {}",
                resolved.code.as_deref().unwrap_or("-"),
                resolved.display.as_deref().unwrap_or("-")
            );
        }
        None => {
            println!("Use 'nhcx --help' for commands");
        }
    }

    Ok(ExitCode::SUCCESS)
}
