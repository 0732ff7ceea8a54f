//! 🚀 solrx-cli — Solr from the shell, one subcommand per interface operation.
//!
//! 🎬 *[a terminal blinks. Someone types `solrx commit`. Somewhere, a searcher warms up.]*
//!
//! Config comes from `--config` (TOML) layered over `SOLRX_*` env vars. Logging
//! goes through `tracing`, filtered by `RUST_LOG`. Failures print every cause and
//! exit 1. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solrx::{AppConfig, Documents, SolrError, SolrInterface, UpdateOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🔥 Talk to a Solr core: index, delete, commit, search.
#[derive(Debug, Parser)]
#[command(name = "solrx", version, about)]
struct Cli {
    /// 🔧 TOML config file. If it doesn't exist, SOLRX_* env vars carry the whole show.
    #[arg(short, long, default_value = "solrx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 📅 List the date field patterns the schema declares.
    DateFields,
    /// 🔍 Run a select and print the raw JSON body.
    Select {
        /// Search parameter as name=value. Repeatable.
        #[arg(short, long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// 🔍 Run a more-like-this query.
    Mlt {
        #[arg(short, long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        /// Example content to find similar documents for.
        #[arg(long)]
        content: Option<String>,
    },
    /// 📦 Index documents from a JSON file: one object, or an array of objects.
    Add {
        file: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Update option as name=value (commit, commitWithin, softCommit, ...). Repeatable.
        #[arg(short, long = "option", value_parser = parse_pair)]
        options: Vec<(String, String)>,
    },
    /// 🗑️ Delete every document matching a query.
    DeleteQuery {
        query: String,
        #[arg(short, long = "option", value_parser = parse_pair)]
        options: Vec<(String, String)>,
    },
    /// 🗑️ Delete documents by id.
    DeleteIds {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long = "option", value_parser = parse_pair)]
        options: Vec<(String, String)>,
    },
    /// ✅ Commit pending changes.
    Commit {
        #[arg(long)]
        wait_searcher: Option<bool>,
        #[arg(long)]
        expunge_deletes: Option<bool>,
        #[arg(long)]
        soft_commit: Option<bool>,
    },
    /// 🏗️ Optimize the index.
    Optimize {
        #[arg(long)]
        wait_searcher: Option<bool>,
        #[arg(long)]
        max_segments: Option<i64>,
    },
    /// 🔄 Roll back uncommitted changes.
    Rollback,
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

async fn run(config: AppConfig, command: Command) -> Result<()> {
    let solr = SolrInterface::connect(&config.solr)
        .await
        .context("💀 Couldn't stand up the Solr interface. The schema fetch is the first thing we try, so this is usually the URL, the core name, or the server napping.")?;

    match command {
        Command::DateFields => {
            for pattern in solr.schema().patterns() {
                println!("{pattern:?}");
            }
        }
        Command::Select { params } => {
            println!("{}", solr.search(&params).await?);
        }
        Command::Mlt { params, content } => {
            println!("{}", solr.mlt_search(&params, content.as_deref()).await?);
        }
        Command::Add {
            file,
            chunk_size,
            options,
        } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("💀 Couldn't read documents from '{}'", file.display()))?;
            let json: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("💀 '{}' is not valid JSON", file.display()))?;
            let documents = Documents::from_json(json)?;
            let options = UpdateOptions::from_pairs(options)?;
            let chunk_size = chunk_size.unwrap_or(config.solr.chunk_size);
            let chunks = solr.add_chunked(documents, chunk_size, &options).await?;
            println!("✅ sent {chunks} chunk(s)");
        }
        Command::DeleteQuery { query, options } => {
            solr.delete_by_query(&query, &UpdateOptions::from_pairs(options)?)
                .await?;
        }
        Command::DeleteIds { ids, options } => {
            solr.delete_by_ids(&ids, &UpdateOptions::from_pairs(options)?)
                .await?;
        }
        Command::Commit {
            wait_searcher,
            expunge_deletes,
            soft_commit,
        } => {
            solr.commit(wait_searcher, expunge_deletes, soft_commit)
                .await?;
        }
        Command::Optimize {
            wait_searcher,
            max_segments,
        } => {
            solr.optimize(wait_searcher, max_segments).await?;
        }
        Command::Rollback => solr.rollback().await?,
    }
    Ok(())
}

/// 🕵️ Did any layer of this failure come from a connection that never happened?
fn solr_was_unreachable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SolrError>())
        .any(SolrError::is_retryable)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 RUST_LOG decides how chatty we are. Unset means errors only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 No file on disk is fine; SOLRX_* may be carrying the whole config.
    let config_file = cli.config.as_path();
    let config_file = config_file
        .try_exists()
        .with_context(|| format!("💀 Couldn't look for '{}'", config_file.display()))?
        .then_some(config_file);

    let app_config = solrx::load_config(config_file)?;

    if let Err(err) = run(app_config, cli.command).await {
        error!("💀 {}", err);
        for cause in err.chain().skip(1) {
            error!("   ↳ {}", cause);
        }
        if solr_was_unreachable(&err) {
            error!(
                "🔧 hint: Solr didn't pick up. Is it running, and does the core in solr.url exist? \
                 A non-negative retry_timeout_secs buys one more attempt on flaky networks. ☕"
            );
        }
        std::process::exit(1);
    }

    Ok(())
}
