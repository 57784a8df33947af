//! CLI binary entry point for eln-sync-cli

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use eln_sync_sdk::cli::commands::config::{
    ConfigInitArgs, handle_config_init, handle_config_show,
};
#[cfg(feature = "cli")]
use eln_sync_sdk::cli::commands::export::{ExportArgs, handle_export};
#[cfg(feature = "cli")]
use eln_sync_sdk::cli::commands::import::{ImportArgs, handle_import};
#[cfg(feature = "cli")]
use eln_sync_sdk::models::RecordKind;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "eln-sync-cli")]
#[command(about = "Synchronize CSV data with an electronic lab notebook")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Import records from a CSV file
    Import {
        /// Record kind to import
        #[arg(value_enum)]
        kind: KindArg,
        /// CSV file to import
        input: PathBuf,
        /// Template id applied to created records
        #[arg(short, long)]
        template: Option<String>,
        /// Config file path (default: config/sync_config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export records to an .xlsx spreadsheet
    Export {
        /// Record kind to export
        #[arg(value_enum)]
        kind: KindArg,
        /// Category id filter (required for resources)
        #[arg(long)]
        category: Option<String>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Output filename (default: timestamped)
        #[arg(short, long)]
        filename: Option<String>,
        /// Config file path (default: config/sync_config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Manage the sync configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a starter configuration file
    Init {
        /// Destination path (default: config/sync_config.json)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration (API key redacted)
    Show {
        /// Config file path (default: config/sync_config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    /// Database items (samples, instruments, reagents)
    Resources,
    /// Experiment entries
    Experiments,
}

#[cfg(feature = "cli")]
fn convert_kind(kind: KindArg) -> RecordKind {
    match kind {
        KindArg::Resources => RecordKind::Resource,
        KindArg::Experiments => RecordKind::Experiment,
    }
}

#[cfg(feature = "cli")]
fn main() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            kind,
            input,
            template,
            config,
        } => {
            let args = ImportArgs {
                kind: convert_kind(kind),
                input,
                template,
                config,
            };
            handle_import(&args)
        }

        Commands::Export {
            kind,
            category,
            output_dir,
            filename,
            config,
        } => {
            let args = ExportArgs {
                kind: convert_kind(kind),
                category,
                output_dir,
                filename,
                config,
            };
            handle_export(&args)
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                let args = ConfigInitArgs { path, force };
                handle_config_init(&args)
            }
            ConfigCommands::Show { config } => handle_config_show(config.as_deref()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
