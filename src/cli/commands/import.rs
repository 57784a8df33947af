//! Import command handlers

use std::path::PathBuf;

use crate::cli::commands::config::load_config;
use crate::cli::error::CliError;
use crate::endpoint::HttpEndpoint;
use crate::import::RecordImporter;
use crate::models::RecordKind;

/// Arguments for the import command
#[derive(Debug, Clone)]
pub struct ImportArgs {
    pub kind: RecordKind,
    pub input: PathBuf,
    pub template: Option<String>,
    pub config: Option<PathBuf>,
}

/// Handle the import command
pub fn handle_import(args: &ImportArgs) -> Result<(), CliError> {
    if !args.input.is_file() {
        return Err(CliError::FileNotFound(args.input.clone()));
    }
    let config = load_config(args.config.as_deref())?;
    let endpoint = HttpEndpoint::new(&config.api)?;

    let mut importer =
        RecordImporter::from_csv(&endpoint, args.kind, &config.import, &args.input)?;
    if let Some(template) = &args.template {
        importer = importer.with_template(template.clone());
    }

    let report = importer.import_csv()?;
    println!("✅ {}: {}", args.input.display(), report.summary());
    for failure in &report.failures {
        eprintln!("  row {}: {}", failure.row, failure.reason);
    }
    Ok(())
}
