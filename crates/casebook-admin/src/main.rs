//! casebook-admin binary.
//!
//! Reads `casebook.toml` (or the path specified with `--config`), opens the
//! configured backend, and runs one maintenance command.
//!
//! ```
//! casebook-admin cases acme --status open
//! casebook-admin field-audit acme severity select --options high,medium,low
//! CASEBOOK_COLLECTION_PREFIX=staging_ casebook-admin slack-users
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use casebook_admin::{AdminConfig, Backend, Command, run};
use casebook_store_memory::InMemoryStore;
use casebook_store_sqlite::SqliteStore;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Casebook repository maintenance")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "casebook.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AdminConfig::load(&cli.config)?;
  let mut stdout = std::io::stdout().lock();

  match cfg.backend {
    Backend::Memory => {
      tracing::warn!("using the in-memory backend; nothing persists after this run");
      run(&InMemoryStore::new(), cli.command, &mut stdout).await
    }
    Backend::Sqlite => {
      let store_path = cfg.resolved_store_path();
      let store = SqliteStore::open_with_prefix(&store_path, &cfg.collection_prefix)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      tracing::debug!(?store_path, prefix = %cfg.collection_prefix, "opened document store");
      run(&store, cli.command, &mut stdout).await
    }
  }
}
