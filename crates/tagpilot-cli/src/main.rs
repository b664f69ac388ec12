//! tagpilot: command-line front end for the tag identity engine.
//!
//! Every command runs against the JSON file store through a single tag
//! service and prints its result as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagpilot_core::{EngineConfig, ResolveOptions, TagId, TagRepository};
use tagpilot_db::{JsonFileStore, KvTagRepository};
use tagpilot_jobs::{TagService, TagServiceHandle};
use tagpilot_search::inspect_label;

#[derive(Parser)]
#[command(name = "tagpilot")]
#[command(author, version, about = "Tag identity resolution for bookmarks")]
#[command(propagate_version = true)]
struct Cli {
    /// JSON store file (overrides TAGPILOT_STORE_PATH)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a label to a tag id
    Resolve {
        label: String,

        /// Create the tag when no exact match exists
        #[arg(long)]
        create: bool,

        /// Do not compute similar candidates on a miss
        #[arg(long)]
        skip_similar: bool,

        /// Fold the label to its canonical form first
        #[arg(long)]
        canonicalize: bool,
    },

    /// Resolve several labels at once
    Batch {
        #[arg(required = true, num_args = 1..)]
        labels: Vec<String>,

        #[arg(long)]
        create: bool,
    },

    /// List tags similar to a label
    Similar {
        label: String,

        /// Maximum number of candidates
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Autocomplete preview for a partial label
    Suggest {
        query: String,

        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Merge the source tag into the target tag
    Merge { source: String, target: String },

    /// Rename a tag, merging when the name belongs to another tag
    Rename { id: String, name: String },

    /// Delete a tag and detach it from every bookmark
    Delete { id: String },

    /// Add an alias to a tag
    Alias { id: String, alias: String },

    /// Set or extend the tags of a bookmark
    Tag {
        bookmark: String,

        #[arg(required = true, num_args = 1..)]
        labels: Vec<String>,

        /// Keep existing tags and add the new ones
        #[arg(long)]
        append: bool,
    },

    /// Forget a bookmark's tags
    UntagBookmark { bookmark: String },

    /// Show the tags of a bookmark
    Show { bookmark: String },

    /// Vocabulary statistics
    Stats {
        /// Number of most used tags to list
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Find tags sharing a normalized key
    Duplicates {
        /// Merge each group into its oldest tag
        #[arg(long)]
        repair: bool,
    },

    /// Remove bookmark references to tags that no longer exist
    Prune,

    /// Show how a label is normalized and classified
    Inspect { label: String },

    /// List every tag with its usage count
    List,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// Environment variables:
//   LOG_FORMAT  - "json" or "text" (default: "text")
//   LOG_FILE    - path to log file (optional, enables file logging)
//   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//   RUST_LOG    - standard env filter (default: "tagpilot=info")
//
// Console output goes to stderr so stdout stays parseable JSON.
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tagpilot=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("tagpilot.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    debug!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

async fn open_service(config: &EngineConfig) -> anyhow::Result<TagServiceHandle> {
    let store = JsonFileStore::new(config.store_path.clone());
    store
        .validate()
        .await
        .with_context(|| format!("cannot use store {}", config.store_path.display()))?;

    info!(
        store_path = %config.store_path.display(),
        max_similar = config.max_similar,
        "Opening tag store"
    );
    let repo = KvTagRepository::with_config(store, config);
    Ok(TagService::new(repo, config.clone()).start())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Inspect { label } = &cli.command {
        return print_json(&inspect_label(label));
    }

    let mut config = EngineConfig::from_env();
    if let Some(path) = cli.store {
        config = config.with_store_path(path);
    }

    let service = open_service(&config).await?;
    let result = dispatch(&service, &config, cli.command).await;
    service.shutdown().await?;
    result
}

async fn dispatch(
    service: &TagServiceHandle,
    config: &EngineConfig,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Resolve {
            label,
            create,
            skip_similar,
            canonicalize,
        } => {
            let options = if create {
                ResolveOptions::create()
            } else {
                ResolveOptions::lookup()
            }
            .with_skip_similar(skip_similar)
            .with_canonicalize(canonicalize);
            print_json(&service.resolve(&label, options).await?)
        }
        Commands::Batch { labels, create } => {
            let options = if create {
                ResolveOptions::create()
            } else {
                ResolveOptions::lookup()
            };
            print_json(&service.resolve_batch(&labels, options).await?)
        }
        Commands::Similar { label, max } => {
            let max = max.unwrap_or(config.max_similar);
            print_json(&service.find_similar(&label, max).await?)
        }
        Commands::Suggest { query, max } => {
            let max = max.unwrap_or(config.max_similar);
            print_json(&service.suggest(&query, max).await?)
        }
        Commands::Merge { source, target } => {
            let outcome = service
                .merge(&TagId::from(source), &TagId::from(target))
                .await?;
            print_json(&outcome)
        }
        Commands::Rename { id, name } => {
            print_json(&service.rename(&TagId::from(id), &name).await?)
        }
        Commands::Delete { id } => print_json(&service.delete(&TagId::from(id)).await?),
        Commands::Alias { id, alias } => {
            let outcome = service.add_alias(&TagId::from(id), &alias).await?;
            print_json(&serde_json::json!({ "result": outcome }))
        }
        Commands::Tag {
            bookmark,
            labels,
            append,
        } => {
            let tag_ids = if append {
                service.add_tags_to_bookmark(&bookmark, &labels).await?
            } else {
                service.set_bookmark_tags(&bookmark, &labels).await?
            };
            print_json(&serde_json::json!({
                "bookmark_id": bookmark,
                "tag_ids": tag_ids,
            }))
        }
        Commands::UntagBookmark { bookmark } => {
            let removed = service.remove_bookmark(&bookmark).await?;
            print_json(&serde_json::json!({
                "bookmark_id": bookmark,
                "removed": removed,
            }))
        }
        Commands::Show { bookmark } => print_json(&service.bookmark_tags(&bookmark).await?),
        Commands::Stats { top } => {
            let top = top.unwrap_or(config.top_tags);
            print_json(&service.stats(top).await?)
        }
        Commands::Duplicates { repair } => {
            if repair {
                print_json(&service.repair_duplicates().await?)
            } else {
                print_json(&service.find_duplicates().await?)
            }
        }
        Commands::Prune => {
            let removed = service.prune_dangling().await?;
            print_json(&serde_json::json!({ "removed_references": removed }))
        }
        Commands::List => print_json(&service.tag_usage().await?),
        Commands::Inspect { label } => print_json(&inspect_label(&label)),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
