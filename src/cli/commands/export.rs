//! Export command handlers

use std::path::PathBuf;

use crate::cli::commands::config::load_config;
use crate::cli::error::CliError;
use crate::endpoint::HttpEndpoint;
use crate::export::{ExperimentExporter, ResourceExporter};
use crate::models::RecordKind;

/// Arguments for the export command
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub kind: RecordKind,
    pub category: Option<String>,
    pub output_dir: PathBuf,
    pub filename: Option<String>,
    pub config: Option<PathBuf>,
}

/// Handle the export command
pub fn handle_export(args: &ExportArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let endpoint = HttpEndpoint::new(&config.api)?;

    let path = match args.kind {
        RecordKind::Experiment => ExperimentExporter::new(&endpoint)
            .export_xlsx(&args.output_dir, args.filename.as_deref())?,
        RecordKind::Resource => {
            let category = args.category.as_deref().ok_or_else(|| {
                CliError::InvalidArgument(
                    "Resource export requires --category".to_string(),
                )
            })?;
            ResourceExporter::new(&endpoint, category)
                .export_xlsx(&args.output_dir, args.filename.as_deref())?
        }
    };
    println!("✅ Exported to {}", path.display());
    Ok(())
}
