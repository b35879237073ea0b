use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use preschool_roster::app::import_use_case::{ImportSummary, ImportUseCase};
use preschool_roster::app::ports::ChildStorePort;
use preschool_roster::app::roster_use_case::RosterUseCase;
use preschool_roster::config::Config;
use preschool_roster::constants;
use preschool_roster::infra::ndjson_store::NdjsonChildStore;
use preschool_roster::logging;
use preschool_roster::processing::import::{DelimitedRecordImporter, ImportFormat};
use preschool_roster::processing::quality_gate::ImportPolicy;

#[derive(Parser)]
#[command(name = "preschool_roster")]
#[command(about = "Import, export and inspect the preschool roster")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import children from a CSV or TSV file into the preschool collection
    Import {
        file: PathBuf,
        /// Override format detection (csv or tsv)
        #[arg(long)]
        format: Option<String>,
        /// MIME type reported by the upload, used for format detection
        #[arg(long)]
        mime: Option<String>,
        /// Refuse the file if any row has an error
        #[arg(long)]
        strict: bool,
        /// Parse and check without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a file and list every row issue without importing it
    Validate {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
    },
    /// Export all children as CSV or TSV
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List parents derived from both programs
    Parents {
        #[arg(long)]
        json: bool,
    },
    /// List the children of one parent
    Children {
        email: String,
    },
    /// Change a parent's name and phone on all of their children
    UpdateParent {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
    },
    /// Print the expected header row
    Headers,
}

fn file_format(file: &Path, format: Option<&str>, mime: Option<&str>) -> anyhow::Result<ImportFormat> {
    match format {
        Some(f) => Ok(f.parse()?),
        None => Ok(ImportFormat::from_file(&file.to_string_lossy(), mime)),
    }
}

fn print_summary(summary: &ImportSummary) {
    println!("\n📊 Import results for {}:", summary.file_name);
    println!("   Format: {}", summary.format);
    println!("   Profiles: {}", summary.imported);
    println!("   Persisted: {}", summary.ids.len());
    println!("   Decision: {:?}", summary.decision);
    println!("   Import key: {}", summary.import_key);

    if !summary.report.issues.is_empty() {
        println!("\n⚠️  Row issues:");
        for issue in &summary.report.issues {
            println!("   - line {} [{:?}] {}", issue.line, issue.severity, issue.description);
        }
    }
}

async fn run(cli: Cli, config: Config, store: Arc<NdjsonChildStore>) -> anyhow::Result<()> {
    let timeout = config.store_timeout();
    let roster = RosterUseCase::new(store.clone(), timeout);

    match cli.command {
        Commands::Import {
            file,
            format,
            mime,
            strict,
            dry_run,
        } => {
            println!("📥 Importing {}...", file.display());
            let source = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let format = file_format(&file, format.as_deref(), mime.as_deref())?;
            let policy = if strict { ImportPolicy::Strict } else { config.import.policy };

            let use_case = ImportUseCase::new(
                store.clone(),
                DelimitedRecordImporter::new(config.import.placeholder_photo.clone()),
                policy,
                timeout,
            );
            let name = file.to_string_lossy();
            let summary = if dry_run {
                use_case.dry_run(&name, format, &source).await?
            } else {
                use_case.run_with_format(&name, format, &source).await?
            };
            print_summary(&summary);
        }
        Commands::Validate { file, format } => {
            let source = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let format = file_format(&file, format.as_deref(), None)?;
            let use_case = ImportUseCase::new(
                store.clone(),
                DelimitedRecordImporter::new(config.import.placeholder_photo.clone()),
                ImportPolicy::Lenient,
                timeout,
            );
            let summary = use_case.dry_run(&file.to_string_lossy(), format, &source).await?;
            print_summary(&summary);
        }
        Commands::Export { format, output } => {
            let format: ImportFormat = format.parse()?;
            let document = roster.export(format).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, document)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✅ Exported to {}", path.display());
                }
                None => println!("{}", document),
            }
        }
        Commands::Parents { json } => {
            let parents = roster.parents().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parents)?);
            } else {
                for parent in &parents {
                    println!("{} <{}> {}", parent.name, parent.email, parent.phone);
                    for child in &parent.children {
                        println!("   - {} ({})", child.name, child.program);
                    }
                }
            }
        }
        Commands::Children { email } => {
            for child in roster.children_for_parent(&email).await? {
                println!("{} {} ({})", child.id, child.profile.name, child.program);
            }
        }
        Commands::UpdateParent { email, name, phone } => {
            let updated = roster.update_parent_details(&email, &name, &phone).await?;
            println!("✅ Updated {} child record(s)", updated);
        }
        Commands::Headers => {
            println!("{}", constants::header_line());
        }
    }
    Ok(())
}

/// The command's own error wins over a failure to close the store.
fn settle(result: anyhow::Result<()>, closed: preschool_roster::error::Result<()>) -> anyhow::Result<()> {
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            error!("Closing the child store also failed: {}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => Ok(closed?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init_logging(&config.log_dir);
    info!(
        data_dir = %config.data_dir.display(),
        log_dir = %config.log_dir.display(),
        policy = ?config.import.policy,
        timeout = ?config.store_timeout(),
        "Configuration loaded"
    );

    let cli = Cli::parse();

    let store = Arc::new(NdjsonChildStore::open(&config.data_dir).await?);
    info!("Using child store at {}", store.dir().display());

    let result = run(cli, config, store.clone()).await;
    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }

    settle(result, store.close().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use preschool_roster::error::PortalError;

    fn close_failure() -> preschool_roster::error::Result<()> {
        Err(PortalError::Store {
            message: "disk full".to_string(),
        })
    }

    #[test]
    fn test_command_error_is_kept_when_close_fails() {
        let err = settle(Err(anyhow::anyhow!("bad file")), close_failure()).unwrap_err();
        assert_eq!(err.to_string(), "bad file");
    }

    #[test]
    fn test_close_failure_surfaces_after_success() {
        let err = settle(Ok(()), close_failure()).unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_clean_run_and_close() {
        assert!(settle(Ok(()), Ok(())).is_ok());
    }
}
