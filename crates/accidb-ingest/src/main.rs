//! accidb ingestion binary.
//!
//! Reads `accidb.toml` (or the path given with `--config`), opens the SQLite
//! store and loads one export into it.
//!
//! ```text
//! accidb aria accidents-tous-req10905.csv
//! accidb --limit 50 epicea dossiers.json --resume
//! accidb stats
//! ```

use std::{fs::File, path::PathBuf};

use accidb_core::{
  cache::CachedExtractor,
  entity::Source,
  store::AccidentStore,
};
use accidb_ingest::{
  IngestConfig,
  config::DEFAULT_CONFIG_FILE,
  input::{ARIA_PREAMBLE_LINES, read_aria_csv, read_epicea_json, resume_after},
  run,
};
use accidb_oracle::{OracleExtractor, PromptSet};
use accidb_sources::{AriaNormalizer, EpiceaNormalizer, epicea};
use accidb_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Industrial accident record ingestion")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// Process at most this many records (overrides `limit` in the config).
  #[arg(long)]
  limit: Option<usize>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load an ARIA CSV export (UTF-8, `;`-separated).
  Aria {
    path: PathBuf,

    /// Metadata lines above the header row.
    #[arg(long, default_value_t = ARIA_PREAMBLE_LINES)]
    preamble_lines: usize,
  },

  /// Load scraped EPICEA records (a JSON array).
  Epicea {
    path: PathBuf,

    /// Skip dossiers not newer than the last one already stored.
    #[arg(long)]
    resume: bool,
  },

  /// Print the row count of every table.
  Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = IngestConfig::load(&cli.config).context("failed to read configuration")?;
  let limit = cli.limit.or(cfg.limit);

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Aria { path, preamble_lines } => {
      let identity = cfg.identity().context("invalid uuid_namespace")?;
      let file = File::open(&path).with_context(|| format!("failed to open {path:?}"))?;
      let records = read_aria_csv(file, preamble_lines)
        .with_context(|| format!("failed to decode {path:?}"))?;

      let normalizer = AriaNormalizer::new(identity);
      let summary = run(&normalizer, records, limit, &store)
        .await
        .context("load failed, nothing was committed")?;
      println!("{summary}");
    }

    Command::Epicea { path, resume } => {
      let identity = cfg.identity().context("invalid uuid_namespace")?;
      let oracle_cfg = cfg
        .oracle
        .clone()
        .context("EPICEA ingestion needs an [oracle] section in the configuration")?;

      let file = File::open(&path).with_context(|| format!("failed to open {path:?}"))?;
      let mut records =
        read_epicea_json(file).with_context(|| format!("failed to decode {path:?}"))?;

      if resume {
        let last = store.last_source_id(Source::Epicea).await?;
        let before = records.len();
        records = resume_after(records, epicea::columns::DOSSIER, last.as_deref());
        info!(last = last.as_deref(), dropped = before - records.len(), "resuming");
      }

      let cache_path = oracle_cfg.cache_path.clone();
      let oracle = OracleExtractor::new(oracle_cfg, PromptSet::epicea())
        .context("failed to set up the oracle")?;
      let extractor = match cache_path {
        Some(path) => CachedExtractor::with_file(oracle, &path)
          .with_context(|| format!("failed to read extraction cache {path:?}"))?,
        None => CachedExtractor::new(oracle),
      };

      let normalizer = EpiceaNormalizer::new(identity, extractor);
      let outcome = run(&normalizer, records, limit, &store).await;

      // Answers already paid for are kept even when the load fails.
      let cache = normalizer.extractor();
      cache.flush().context("failed to write extraction cache")?;
      let stats = cache.stats();
      info!(
        hits = stats.hits,
        misses = stats.misses,
        entries = cache.len(),
        "extraction cache"
      );

      let summary = outcome.context("load failed, nothing was committed")?;
      println!("{summary}");
    }

    Command::Stats => {
      let counts = store.counts().await?;
      println!("sites               {}", counts.sites);
      println!("accidents           {}", counts.accidents);
      println!("causes              {}", counts.causes);
      println!("substances          {}", counts.substances);
      println!("consequences_human  {}", counts.consequences_human);
      println!("consequences_other  {}", counts.consequences_other);
    }
  }

  Ok(())
}
