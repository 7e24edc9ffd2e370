//! `tenantcfg` — operator tool for the tenant configuration store.
//!
//! Reads `tenantcfg.toml` (or the path given with `--config`), opens the
//! SQLite store and runs one operation. Results are printed to stdout as
//! JSON; logs go to stderr.
//!
//! ```text
//! tenantcfg commit acme draft.json
//! tenantcfg history acme
//! tenantcfg revert acme 3
//! ```

mod settings;

use std::{
  io::Read as _,
  path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tenantcfg_core::{settings::ConfigDraft, snapshot::Version, store::ConfigStore};
use tenantcfg_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::{CliConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Versioned per-tenant configuration store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tenantcfg.toml")]
  config: PathBuf,

  /// Database file; overrides `store_path` from the configuration.
  #[arg(short, long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Commit a JSON draft (file path, or `-` for stdin) as a new version.
  Commit { tenant: String, draft: PathBuf },
  /// Commit the default settings if the tenant has no configuration yet.
  Init { tenant: String },
  /// Make an existing version current again.
  Revert { tenant: String, version: Version },
  /// Print the current configuration.
  Current { tenant: String },
  /// Print the configuration at one version.
  Show { tenant: String, version: Version },
  /// List every version of a tenant, newest first.
  History { tenant: String },
  /// List every tenant with a configuration.
  Tenants,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = CliConfig::load(&cli.config)?;
  let store_path = expand_tilde(cli.store.as_deref().unwrap_or(cfg.store_path.as_path()));

  let store = SqliteStore::open_with(&store_path, cfg.store_options())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  run(&store, cli.command).await
}

async fn run(store: &SqliteStore, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Commit { tenant, draft } => {
      let draft = read_draft(&draft)?;
      let version = store
        .commit(&tenant, draft)
        .await
        .with_context(|| format!("commit for tenant {tenant:?} failed"))?;
      print_json(&json!({ "tenant_id": tenant, "version": version }))
    }
    Command::Init { tenant } => {
      let outcome = store
        .initialize(&tenant, ConfigDraft::default_for())
        .await
        .with_context(|| format!("init of tenant {tenant:?} failed"))?;
      print_json(&json!({
        "tenant_id": tenant,
        "version": outcome.version,
        "created": outcome.created,
      }))
    }
    Command::Revert { tenant, version } => {
      store
        .revert(&tenant, version)
        .await
        .with_context(|| format!("revert of tenant {tenant:?} to {version} failed"))?;
      print_json(&json!({ "tenant_id": tenant, "version": version }))
    }
    Command::Current { tenant } => print_json(&store.get_current(&tenant).await?),
    Command::Show { tenant, version } => {
      print_json(&store.get_version(&tenant, version).await?)
    }
    Command::History { tenant } => print_json(&store.list_versions(&tenant).await?),
    Command::Tenants => print_json(&store.list_tenants().await?),
  }
}

/// Read a [`ConfigDraft`] from a JSON file, or from stdin for `-`.
fn read_draft(path: &std::path::Path) -> anyhow::Result<ConfigDraft> {
  let raw = if path.as_os_str() == "-" {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read draft from stdin")?;
    buf
  } else {
    std::fs::read_to_string(path)
      .with_context(|| format!("failed to read draft {path:?}"))?
  };
  serde_json::from_str(&raw).context("draft is not a valid configuration document")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn init_commits_defaults_only_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    run(&store, Command::Init { tenant: "acme".into() }).await.unwrap();
    run(&store, Command::Init { tenant: "acme".into() }).await.unwrap();

    let history = store.list_versions("acme").await.unwrap();
    assert_eq!(history.len(), 1);
    let view = store.get_current("acme").await.unwrap();
    assert_eq!(view.settings(), &tenantcfg_core::settings::Settings::default());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn concurrent_inits_commit_defaults_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let (a, b) = tokio::join!(
      run(&store, Command::Init { tenant: "acme".into() }),
      run(&store, Command::Init { tenant: "acme".into() }),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.list_versions("acme").await.unwrap().len(), 1);
  }

  #[test]
  fn draft_document_parses_with_optional_fields_omitted() {
    let draft: ConfigDraft = serde_json::from_str(
      r#"{ "handover_mode": "ask", "language": "en",
           "knowledge": [{ "question": "Hours?", "answer": "9-18" }] }"#,
    )
    .unwrap();
    assert!(draft.system_message.is_none());
    assert!(draft.thresholds.is_null());
    assert_eq!(draft.knowledge[0].priority, 0);
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn cli_parses_revert_arguments() {
    let cli = Cli::try_parse_from(["tenantcfg", "--store", "x.db", "revert", "acme", "3"])
      .unwrap();
    assert_eq!(cli.store, Some(PathBuf::from("x.db")));
    assert!(matches!(cli.command, Command::Revert { ref tenant, version: 3 } if tenant == "acme"));
  }
}
