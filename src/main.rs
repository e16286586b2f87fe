//! # jobfit CLI
//!
//! The `jobfit` binary analyzes a resume against a job description and
//! exposes the same pipeline as an HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! jobfit --config ./config/jobfit.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jobfit analyze` | Run the full gap analysis over a resume and JD file |
//! | `jobfit search "<query>"` | Hybrid search over one of the two documents |
//! | `jobfit serve` | Start the JSON API server |
//!
//! ## Examples
//!
//! ```bash
//! # Full analysis, human-readable
//! jobfit analyze --resume resume.txt --jd jd.txt
//!
//! # Full analysis as JSON
//! jobfit analyze --resume resume.txt --jd jd.txt --json
//!
//! # Search the resume's skills section
//! jobfit search "kubernetes" --resume resume.txt --jd jd.txt --section skills
//!
//! # Start the API server
//! jobfit serve
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jobfit::analysis::run_gap_analysis;
use jobfit::config::{self, Config};
use jobfit::ingest::build_session;
use jobfit::models::DocType;
use jobfit::rerank::create_reranker;
use jobfit::search::{hybrid_search, SearchOptions};
use jobfit::server::run_server;

const DEFAULT_CONFIG_PATH: &str = "./config/jobfit.toml";

/// jobfit — resume / job-description retrieval and gap analysis.
#[derive(Parser)]
#[command(
    name = "jobfit",
    about = "Analyze a resume against a job description with hybrid retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/jobfit.toml`; when the default path does not
    /// exist, built-in defaults (all providers disabled) are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Which document a search runs against.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchTarget {
    Resume,
    Jd,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full gap analysis over a resume and a JD.
    ///
    /// Builds a fresh in-memory session from both documents, retrieves
    /// weighted per-section context, compares skill lists, and (when an LLM
    /// provider is configured) generates a narrative assessment.
    Analyze {
        /// Path to the resume text file.
        #[arg(long)]
        resume: PathBuf,

        /// Path to the job-description text file.
        #[arg(long)]
        jd: PathBuf,

        /// Print the full report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Hybrid search over one document.
    ///
    /// Combines BM25 and vector similarity, deduplicates, and optionally
    /// reranks with the configured cross-encoder.
    Search {
        /// The search query string.
        query: String,

        /// Path to the resume text file.
        #[arg(long)]
        resume: PathBuf,

        /// Path to the job-description text file.
        #[arg(long)]
        jd: PathBuf,

        /// Which document to search.
        #[arg(long, value_enum, default_value = "resume")]
        target: SearchTarget,

        /// Restrict results to one section (e.g. `skills`, `experience`).
        #[arg(long)]
        section: Option<String>,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<usize>,

        /// Skip the rerank pass even if a reranker is configured.
        #[arg(long)]
        no_rerank: bool,
    },

    /// Start the JSON API server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_cli_config(&cli)?;

    match cli.command {
        Commands::Analyze { resume, jd, json } => run_analyze(&config, &resume, &jd, json).await,
        Commands::Search {
            query,
            resume,
            jd,
            target,
            section,
            top_k,
            no_rerank,
        } => run_search(&config, &query, &resume, &jd, target, section, top_k, no_rerank).await,
        Commands::Serve => run_server(&config).await,
    }
}

/// Load the config file, falling back to built-in defaults only when the
/// *default* path is absent. An explicitly given path must exist.
fn load_cli_config(cli: &Cli) -> Result<Config> {
    if cli.config == PathBuf::from(DEFAULT_CONFIG_PATH) && !cli.config.exists() {
        return Ok(Config::minimal());
    }
    config::load_config(&cli.config)
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn,jobfit=info",
        1 => "info,jobfit=debug",
        _ => "debug,jobfit=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_document(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))
}

async fn run_analyze(config: &Config, resume: &PathBuf, jd: &PathBuf, json: bool) -> Result<()> {
    let resume_text = read_document(resume)?;
    let jd_text = read_document(jd)?;

    let reranker = create_reranker(&config.rerank)?;
    let session = build_session(config, &resume_text, &jd_text).await;
    let report = run_gap_analysis(config, &session, reranker.as_ref()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report.match_score {
        Some(score) => println!("Match score: {:.2} / 10", score),
        None => println!("Match score: unavailable (embeddings disabled)"),
    }
    println!();

    print_skill_list("Matched skills", &report.skills.matched_skills);
    print_skill_list("Missing skills", &report.skills.missing_skills);
    print_skill_list("Extra skills", &report.skills.extra_skills);

    println!(
        "Retrieved context: {} resume chunks, {} JD chunks",
        report.resume_chunks.len(),
        report.jd_chunks.len()
    );

    if let Some(narrative) = &report.llm_analysis {
        println!("\n{}", narrative);
    }

    Ok(())
}

fn print_skill_list(label: &str, skills: &[String]) {
    if skills.is_empty() {
        println!("{}: (none)", label);
    } else {
        println!("{}: {}", label, skills.join(", "));
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_search(
    config: &Config,
    query: &str,
    resume: &PathBuf,
    jd: &PathBuf,
    target: SearchTarget,
    section: Option<String>,
    top_k: Option<usize>,
    no_rerank: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let resume_text = read_document(resume)?;
    let jd_text = read_document(jd)?;

    let reranker = create_reranker(&config.rerank)?;
    let session = build_session(config, &resume_text, &jd_text).await;

    let index = match target {
        SearchTarget::Resume => &session.resume,
        SearchTarget::Jd => &session.jd,
    };

    let mut opts = SearchOptions::from_config(&config.retrieval);
    opts.section_filter = section;
    if let Some(top_k) = top_k {
        opts.top_k = top_k;
    }
    if no_rerank {
        opts.use_rerank = false;
    }

    let results = hybrid_search(query, index, &config.embedding, reranker.as_ref(), &opts).await;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let doc_label = match target {
        SearchTarget::Resume => DocType::Resume,
        SearchTarget::Jd => DocType::Jd,
    };
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.4} {:?}] {:?} / {}",
            i + 1,
            result.score,
            result.score_kind,
            doc_label,
            result.section.as_deref().unwrap_or("-")
        );
        println!("    {}", result.text.replace('\n', " "));
        println!();
    }

    Ok(())
}
