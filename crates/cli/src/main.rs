//! attache: one-way push of a directory tree into a document's attachments
//!
//! Computes which files are new, changed, or deleted relative to the remote
//! document's signature index and applies exactly the minimal set of
//! mutations in a single save, preserving unrelated document fields.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand, builder::Styles};
use color_eyre::Result;
use tracing::info;

use attache_core::{Fingerprint, PushConfig, Scanner};
use attache_store::{HttpStore, PushOptions, PushOutcome, default_doc_id, push_app, push_directory};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

#[derive(Parser)]
#[command(name = "attache")]
#[command(version)]
#[command(styles = STYLES)]
#[command(about = "Sync a local directory into a remote document's attachments")]
#[command(long_about = r#"
attache pushes a directory tree into the attachment set of a single
document in an HTTP document store.

Change detection is content-hash based: each file is fingerprinted and
compared against the signature index stored inside the document, so only
new, changed, and deleted paths are touched. Unrelated document fields
are preserved.

Examples:
  attache push ./site --db http://127.0.0.1:5984 --database www
  attache push-app ./blog blog --db http://127.0.0.1:5984 --database apps
  attache scan ./site
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a directory into a document's attachment set
    Push {
        /// Directory to push
        dir: PathBuf,

        /// Store base URL
        #[arg(long, default_value = "http://127.0.0.1:5984")]
        db: String,

        /// Database name
        #[arg(long)]
        database: String,

        /// Target document id (default: the directory name)
        #[arg(long)]
        id: Option<String>,
    },

    /// Push an application directory as a design document
    PushApp {
        /// Application directory (fields plus an _attachments/ subtree)
        dir: PathBuf,

        /// Application name (document id becomes _design/<name>)
        name: String,

        /// Store base URL
        #[arg(long, default_value = "http://127.0.0.1:5984")]
        db: String,

        /// Database name
        #[arg(long)]
        database: String,
    },

    /// Scan a directory and print the pushable file set
    Scan {
        /// Directory to scan
        dir: PathBuf,

        /// Output format (json, summary)
        #[arg(short, long, default_value = "summary")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Push {
            dir,
            db,
            database,
            id,
        } => {
            let doc_id = match id.or_else(|| default_doc_id(&dir)) {
                Some(id) => id,
                None => color_eyre::eyre::bail!("cannot derive a document id from {dir:?}"),
            };
            let store = HttpStore::new(&db, &database)?;
            let options = PushOptions::from(&PushConfig::load(&dir)?);
            report(push_directory(&store, &dir, &doc_id, &options).await?);
        }
        Commands::PushApp {
            dir,
            name,
            db,
            database,
        } => {
            let store = HttpStore::new(&db, &database)?;
            let options = PushOptions::from(&PushConfig::load(&dir)?);
            report(push_app(&store, &dir, &name, &options).await?);
        }
        Commands::Scan { dir, format } => {
            scan_command(&dir, &format)?;
        }
    }

    Ok(())
}

fn report(outcome: PushOutcome) {
    match outcome {
        PushOutcome::NothingToPush => info!("nothing to push"),
        PushOutcome::Pushed { rev, summary } => {
            info!(
                rev = %rev,
                created = summary.created.len(),
                updated = summary.updated.len(),
                deleted = summary.deleted.len(),
                unchanged = summary.unchanged.len(),
                "push complete"
            );
        }
    }
}

fn scan_command(dir: &PathBuf, format: &str) -> Result<()> {
    let config = PushConfig::load(dir)?;
    let files = Scanner::new(dir)
        .include_extensionless(config.include_extensionless)
        .scan()?;

    match format {
        "json" => {
            let listing: serde_json::Map<String, serde_json::Value> = files
                .iter()
                .map(|(path, content)| {
                    (
                        path.clone(),
                        serde_json::Value::String(Fingerprint::from_bytes(content).to_hex()),
                    )
                })
                .collect();
            eprintln!("{}", serde_json::to_string_pretty(&listing)?);
        }
        _ => {
            eprintln!("Files: {}", files.len());
            let total_size: usize = files.values().map(Vec::len).sum();
            eprintln!("Total size: {total_size} bytes");
            for (path, content) in &files {
                eprintln!("  {} {} ({} bytes)", Fingerprint::from_bytes(content), path, content.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_defaults() {
        let cli = Cli::parse_from(["attache", "push", "./site", "--database", "www"]);
        let Commands::Push { db, database, id, .. } = cli.command else {
            panic!("expected push");
        };
        assert_eq!(db, "http://127.0.0.1:5984");
        assert_eq!(database, "www");
        assert!(id.is_none());
    }
}
