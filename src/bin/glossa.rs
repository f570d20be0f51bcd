//! glossa CLI tool
//!
//! Command-line interface for checking profile directories with glossa-core.
//!
//! ## Commands
//!
//! - `validate <root>`: Validate every profile under a profile directory
//! - `preview --parser <file>`: Run a parser profile against sample output

use clap::{Parser, Subcommand};
use glossa_core::{
    config::CoreConfig,
    document::ProfileDocument,
    manager::ProfileManager,
    parser,
    properties::ProfileKind,
    store::{DirProfileStore, ProfileStore},
};
use std::{io::Read, path::PathBuf};

#[derive(Parser)]
#[command(name = "glossa")]
#[command(author, version, about = "A tool for validating translation pipeline profiles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every profile under a profile directory and report codes
    Validate {
        /// Profile directory, one subdirectory per kind (default: the configured store root)
        root: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also print warnings
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a parser profile against a sample and print what it extracts
    Preview {
        /// Parser profile (YAML or JSON)
        #[arg(long)]
        parser: PathBuf,

        /// Sample model output (default: stdin)
        #[arg(long)]
        sample: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            root,
            config,
            verbose,
        } => {
            let mut config = match config {
                Some(path) => CoreConfig::load(path)?,
                None => CoreConfig::default(),
            };
            if let Some(root) = root {
                config.store.root = root;
            }
            let store = DirProfileStore::from_config(&config.store);
            if !store.root().is_dir() {
                eprintln!("Error: {} is not a directory", store.root().display());
                std::process::exit(1);
            }

            let runtime = tokio::runtime::Builder::new_current_thread().build()?;
            let failed = runtime.block_on(validate_all(
                ProfileManager::with_config(store, &config),
                verbose,
            ))?;
            if failed > 0 {
                eprintln!("{failed} profile(s) failed validation");
                std::process::exit(1);
            }
            println!("All profiles valid");
        }
        Commands::Preview {
            parser: parser_path,
            sample,
        } => {
            let content = std::fs::read_to_string(&parser_path)?;
            let document = ProfileDocument::parse(ProfileKind::Parser, &content)?;
            let Some(profile) = document.as_parser() else {
                eprintln!("Error: {} is not a parser profile", parser_path.display());
                std::process::exit(1);
            };

            let text = match sample {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut input = String::new();
                    std::io::stdin().read_to_string(&mut input)?;
                    input
                }
            };

            match parser::run(&profile.spec(), &text) {
                Ok(output) => {
                    println!("{}", output.text);
                    println!("--- {} line(s)", output.lines.len());
                    for (i, line) in output.lines.iter().enumerate() {
                        println!("{:>4}: {line}", i + 1);
                    }
                }
                Err(failure) => {
                    eprintln!("Error: {}", failure.code());
                    tracing::debug!("{failure}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Validate every stored profile, printing one line per finding. Returns the number of
/// profiles with errors.
async fn validate_all(
    manager: ProfileManager<DirProfileStore>,
    verbose: bool,
) -> Result<usize, glossa_core::GlossaError> {
    let index = manager.reference_index().await?;
    let mut failed = 0;
    for kind in ProfileKind::ALL {
        for summary in manager.store().list(kind).await? {
            let path = manager.store().profile_path(kind, &summary.id)?;
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("{kind}:{}: unreadable: {e}", summary.id);
                    failed += 1;
                    continue;
                }
            };
            let report = manager.validator().validate_text(kind, &text, &index);
            for code in report.error_codes() {
                println!("{kind}:{}: error: {code}", summary.id);
            }
            if verbose {
                for code in report.warning_codes() {
                    println!("{kind}:{}: warning: {code}", summary.id);
                }
            }
            if !report.is_ok() {
                failed += 1;
            }
        }
    }
    Ok(failed)
}
