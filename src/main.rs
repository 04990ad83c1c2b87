//! # Knowledge Harness CLI (`kh`)
//!
//! Inspect and query a local knowledge directory the same way a chat
//! pipeline would.
//!
//! ## Usage
//!
//! ```bash
//! kh --config ./config/kh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kh search "<query>"` | Ranked matches with score breakdown |
//! | `kh context "<query>"` | The prompt context a model would receive |
//! | `kh status` | Index health: files, chunks, last error |
//! | `kh chunks <path>` | How one file is chunked and tokenized |

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use knowledge_harness::config::{self, Config};
use knowledge_harness::logging::init_logging;
use knowledge_harness::retriever::{Retriever, RetrieverStatus};
use knowledge_harness_core::index::chunk_document;
use knowledge_harness_core::models::{Document, RetrievalResult};

/// Knowledge Harness CLI: a local-first hybrid lexical retriever.
#[derive(Parser)]
#[command(
    name = "kh",
    about = "Knowledge Harness: a local-first hybrid lexical retriever for chat pipelines",
    version,
    long_about = "Knowledge Harness indexes a directory of text and markdown files into chunks \
    and ranks them per query with BM25, phrase, n-gram, and coverage signals followed by \
    MMR diversification."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kh.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the knowledge directory.
    ///
    /// Prints ranked matches with their combined score and the
    /// bm25/phrase/ngram/coverage breakdown.
    Search {
        /// The search query string.
        query: String,

        /// Print the full retrieval result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt context assembled for a query.
    Context {
        /// The search query string.
        query: String,
    },

    /// Build the index and report its status.
    Status {
        /// Print status as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how a single file is chunked.
    ///
    /// Relative paths are resolved against the knowledge directory.
    Chunks {
        /// File to chunk.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search { query, json } => {
            let retriever = Retriever::from_config(&cfg)?;
            let result = retriever.retrieve(&query);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_matches(&result);
            }
        }
        Commands::Context { query } => {
            let retriever = Retriever::from_config(&cfg)?;
            match retriever.retrieve(&query).context_message {
                Some(ctx) => println!("{}", ctx),
                None => println!("No context."),
            }
        }
        Commands::Status { json } => {
            let retriever = Retriever::from_config(&cfg)?;
            retriever.refresh();
            let status = retriever.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&cfg, &status);
            }
        }
        Commands::Chunks { path } => {
            print_chunks(&cfg, &path)?;
        }
    }

    Ok(())
}

fn print_matches(result: &RetrievalResult) {
    if result.matches.is_empty() {
        println!("No results.");
        return;
    }

    for (i, m) in result.matches.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, m.score, m.chunk_id);
        println!(
            "    bm25: {:.2}  phrase: {:.2}  ngram: {:.2}  coverage: {:.2}",
            m.metrics.bm25, m.metrics.phrase, m.metrics.ngram, m.metrics.coverage
        );
        println!("    excerpt: \"{}\"", excerpt(&m.text, 160));
        println!();
    }

    let sources: Vec<&str> = result.citations.iter().map(|c| c.source.as_str()).collect();
    println!("Sources: {}", sources.join(", "));
}

fn print_status(cfg: &Config, status: &RetrieverStatus) {
    println!("Knowledge Harness Index Status");
    println!("=============================");
    println!();
    println!("  Directory:   {}", cfg.knowledge.dir.display());
    println!("  Enabled:     {}", status.enabled);
    println!("  Files:       {}", status.files);
    println!("  Chunks:      {}", status.chunk_count);
    println!("  Avg tokens:  {:.1}", status.average_chunk_tokens);
    println!(
        "  Retrieval:   top_k={} min_score={:.2} mmr_lambda={:.2}",
        status.top_k, status.min_score, status.mmr_lambda
    );
    println!(
        "  Loaded at:   {}",
        status.loaded_at.as_deref().unwrap_or("never")
    );
    if let Some(err) = &status.last_error {
        println!("  Last error:  {}", err);
    }
    println!();
}

fn print_chunks(cfg: &Config, path: &Path) -> Result<()> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cfg.knowledge.dir.join(path)
    };
    let text = std::fs::read_to_string(&full)
        .with_context(|| format!("Failed to read {}", full.display()))?;

    let doc = Document::new(path.to_string_lossy(), text);
    let chunks = chunk_document(&doc, &cfg.index_params());
    if chunks.is_empty() {
        println!("No chunks.");
        return Ok(());
    }

    for chunk in &chunks {
        println!(
            "{} ({} tokens, {} chars, {} distinct)",
            chunk.id,
            chunk.token_count,
            chunk.normalized_text.chars().count(),
            chunk.token_set.len()
        );
        println!("    {}", excerpt(&chunk.normalized_text, 200));
        println!();
    }
    Ok(())
}

/// First `max` characters of `text` on one line.
fn excerpt(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max {
        flat.to_string()
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}…", cut.trim_end())
    }
}
