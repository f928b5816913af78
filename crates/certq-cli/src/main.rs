//! certq - Scanner-certification review queue CLI
//!
//! The `certq` command computes and inspects the human review queue for
//! certification runs.
//!
//! ## Commands
//!
//! - `queue`: Build the review queue (table, JSON or markdown; optional artifact)
//! - `runs`: List runs, filtered by status and search text
//! - `explain`: Show the triage decision for one run
//! - `hash`: Print sampling buckets for ids
//! - `review`: Approve, reject or re-run a queued run
//! - `devices`, `catalog`, `analytics`: Dataset listings
//! - `verify`: Check a queue artifact's digest

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use certq_core::{
    build_review_queue, classify_run, deterministic_sample_percent, dispatch, load_dataset,
    read_queue_artifact, render_queue_md, write_queue_artifact, Dataset, QueueArtifact,
    ReviewAction, ReviewQueue, ReviewReason, Run, RunFilter, RunStatus, TracingSink,
    TriageDecision, TriagePolicy, METRICS,
};

#[derive(Parser)]
#[command(name = "certq")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scanner-certification review queue", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Dataset JSON file (default: built-in demo dataset)
    #[arg(long, global = true, env = "CERTQ_DATASET")]
    dataset: Option<PathBuf>,

    /// Triage policy file (TOML, or JSON when the extension is .json)
    #[arg(long, global = true, env = "CERTQ_POLICY")]
    policy: Option<PathBuf>,

    /// CI at or above which runs auto-pass
    #[arg(long, global = true, env = "CERTQ_AUTO_PASS")]
    auto_pass: Option<f64>,

    /// CI below which runs are excluded from review
    #[arg(long, global = true, env = "CERTQ_REVIEW_FLOOR")]
    review_floor: Option<f64>,

    /// Percentage of auto-passing runs sampled for review
    #[arg(long, global = true, env = "CERTQ_SAMPLE_PCT")]
    sample_pct: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the human review queue
    Queue {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write a digest-sealed queue artifact to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List runs
    Runs {
        /// Only runs with this status (PASSED, WARN, FAILED)
        #[arg(long, value_parser = parse_status)]
        status: Option<RunStatus>,

        /// Case-insensitive match on device or run id
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Explain the triage decision for a run
    Explain {
        /// Run ID
        run_id: String,
    },

    /// Print the sampling bucket (0-99) of each id
    Hash {
        /// Identifiers to hash
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Act on a queued run
    Review {
        /// Reviewer name recorded with the action
        #[arg(long, default_value = "reviewer", env = "CERTQ_REVIEWER")]
        reviewer: String,

        #[command(subcommand)]
        action: ReviewCommand,
    },

    /// List lab devices
    Devices,

    /// List the certification test catalog
    Catalog,

    /// Show the analytics snapshot
    Analytics,

    /// Verify a queue artifact's digest
    Verify {
        /// Artifact path
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Approve a run
    Approve { run_id: String },

    /// Reject a run
    Reject {
        run_id: String,

        /// Reason recorded with the rejection
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Re-run a subset of tests
    Rerun {
        run_id: String,

        /// Comma-separated catalog test ids (e.g. A-08,B-17)
        #[arg(short, long, value_delimiter = ',', required = true)]
        tests: Vec<String>,
    },
}

impl ReviewCommand {
    fn into_parts(self) -> (String, ReviewAction) {
        match self {
            Self::Approve { run_id } => (run_id, ReviewAction::Approve),
            Self::Reject { run_id, reason } => (run_id, ReviewAction::Reject { reason }),
            Self::Rerun { run_id, tests } => (run_id, ReviewAction::Rerun { tests }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Md,
}

fn parse_status(s: &str) -> std::result::Result<RunStatus, String> {
    s.to_uppercase()
        .parse::<RunStatus>()
        .map_err(|s| format!("unknown status {s:?} (expected PASSED, WARN or FAILED)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    certq_core::init_tracing(cli.json, level);

    let dataset = open_dataset(cli.dataset.as_deref())?;
    let policy = resolve_policy(
        cli.policy.as_deref(),
        cli.auto_pass,
        cli.review_floor,
        cli.sample_pct,
    )?;

    let outcome = match cli.command {
        Commands::Queue { format, out } => cmd_queue(&dataset, &policy, format, out.as_deref()),
        Commands::Runs { status, search } => {
            cmd_runs(&dataset, &policy, RunFilter { status, search })
        }
        Commands::Explain { run_id } => cmd_explain(&dataset, &policy, &run_id),
        Commands::Hash { ids } => cmd_hash(&ids),
        Commands::Review { reviewer, action } => cmd_review(&dataset, &policy, &reviewer, action),
        Commands::Devices => cmd_devices(&dataset),
        Commands::Catalog => cmd_catalog(&dataset),
        Commands::Analytics => cmd_analytics(&dataset),
        Commands::Verify { file } => cmd_verify(&file),
    };

    METRICS.flush();
    outcome
}

/// Load the dataset from `path`, or the demo dataset when absent.
fn open_dataset(path: Option<&Path>) -> Result<Dataset> {
    match path {
        Some(path) => {
            load_dataset(path).with_context(|| format!("Failed to load dataset {:?}", path))
        }
        None => Ok(Dataset::demo()),
    }
}

/// Read a policy file. `.json` files are JSON, anything else TOML.
fn load_policy_file(path: &Path) -> Result<TriagePolicy> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read policy {:?}", path))?;
    let policy: TriagePolicy = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text).with_context(|| format!("parse policy {:?}", path))?
    } else {
        toml::from_str(&text).with_context(|| format!("parse policy {:?}", path))?
    };
    Ok(policy)
}

/// Layer defaults < policy file < individual overrides.
///
/// The result is not validated here; the selector rejects a bad policy
/// before looking at any run.
fn resolve_policy(
    file: Option<&Path>,
    auto_pass: Option<f64>,
    review_floor: Option<f64>,
    sample_pct: Option<u8>,
) -> Result<TriagePolicy> {
    let mut policy = match file {
        Some(path) => load_policy_file(path)?,
        None => TriagePolicy::default(),
    };
    if let Some(v) = auto_pass {
        policy = policy.with_auto_pass_threshold(v);
    }
    if let Some(v) = review_floor {
        policy = policy.with_review_floor(v);
    }
    if let Some(v) = sample_pct {
        policy = policy.with_sample_percent(v);
    }
    Ok(policy)
}

fn queue_for(dataset: &Dataset, policy: &TriagePolicy) -> Result<ReviewQueue> {
    build_review_queue(&dataset.runs, policy).context("Failed to build review queue")
}

fn reason_text(reason: &ReviewReason) -> String {
    match reason {
        ReviewReason::Borderline {
            warn,
            below_auto_pass,
        } => {
            let mut flags = Vec::new();
            if *warn {
                flags.push("WARN");
            }
            if *below_auto_pass {
                flags.push("below auto-pass");
            }
            format!("borderline ({})", flags.join(", "))
        }
        ReviewReason::Sampled { bucket } => format!("sampled (bucket {bucket})"),
    }
}

/// Build and print the review queue
fn cmd_queue(
    dataset: &Dataset,
    policy: &TriagePolicy,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let queue = queue_for(dataset, policy)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&queue)?);
        }
        OutputFormat::Md => {
            print!("{}", render_queue_md(&queue));
        }
        OutputFormat::Table => {
            println!("Pending Human Reviews");
            println!("{} in queue · Policy: {}", queue.len(), policy.describe());
            println!();
            for entry in &queue.entries {
                println!(
                    "  {:<12} {:<22} {:<7} CI {:.2}  {}",
                    entry.run.run_id,
                    entry.run.device_id,
                    entry.run.status,
                    entry.run.ci_avg,
                    reason_text(&entry.reason)
                );
            }
        }
    }

    if let Some(path) = out {
        let artifact = QueueArtifact::finalize(&queue, Utc::now());
        write_queue_artifact(&artifact, path)
            .with_context(|| format!("Failed to write queue artifact {:?}", path))?;
        info!(path = %path.display(), digest = %artifact.content_digest, "queue artifact written");
    }
    Ok(())
}

fn run_row(run: &Run, policy: &TriagePolicy) -> String {
    format!(
        "  {:<12} {:<22} {:<7} {:>5.2} {:<11} {:>6}  {}",
        run.run_id,
        run.device_id,
        run.status,
        run.ci_avg,
        policy.ci_band(run.ci_avg),
        run.tests,
        run.started_at
    )
}

/// List runs matching a filter, with each run's CI band
fn cmd_runs(dataset: &Dataset, policy: &TriagePolicy, filter: RunFilter) -> Result<()> {
    policy.validate().context("Invalid triage policy")?;
    let runs = filter.apply(&dataset.runs);
    if runs.is_empty() {
        println!("No runs match.");
        return Ok(());
    }
    println!(
        "  {:<12} {:<22} {:<7} {:>5} {:<11} {:>6}  {}",
        "RUN", "DEVICE", "STATUS", "CI", "BAND", "TESTS", "STARTED"
    );
    for run in runs {
        println!("{}", run_row(run, policy));
    }
    Ok(())
}

/// Explain one run's triage decision
fn cmd_explain(dataset: &Dataset, policy: &TriagePolicy, run_id: &str) -> Result<()> {
    policy.validate().context("Invalid triage policy")?;
    let run = dataset
        .run(run_id)
        .with_context(|| format!("Run not found: {}", run_id))?;

    let bucket = deterministic_sample_percent(&run.run_id);
    println!("Run:      {} ({})", run.run_id, run.device_id);
    println!("Status:   {}", run.status);
    println!("CI:       {:.2} ({})", run.ci_avg, policy.ci_band(run.ci_avg));
    println!("Policy:   {}", policy.describe());
    println!("Bucket:   {} (sampled when < {})", bucket, policy.sample_percent);

    let decision = match classify_run(run, policy) {
        TriageDecision::FloorExcluded => format!(
            "excluded (CI below review floor {:.2})",
            policy.review_floor
        ),
        TriageDecision::AutoPass => "auto-pass".to_string(),
        TriageDecision::Review(reason) => format!("review: {}", reason_text(&reason)),
    };
    println!("Decision: {}", decision);
    Ok(())
}

/// Print sampling buckets
fn cmd_hash(ids: &[String]) -> Result<()> {
    for id in ids {
        println!("{}\t{}", id, deterministic_sample_percent(id));
    }
    Ok(())
}

/// Dispatch a reviewer action for a queued run
fn cmd_review(
    dataset: &Dataset,
    policy: &TriagePolicy,
    reviewer: &str,
    command: ReviewCommand,
) -> Result<()> {
    let queue = queue_for(dataset, policy)?;
    let mut sink = TracingSink::new(reviewer).restricted_to(&queue);
    let (run_id, action) = command.into_parts();

    let receipt = dispatch(&mut sink, &run_id, &action)
        .with_context(|| format!("Failed to {} {}", action.name(), run_id))?;

    println!("✓ {} {} ({})", receipt.action.name(), receipt.run_id, receipt.action_id);
    println!("  reviewer: {}", receipt.reviewer);
    println!("  at:       {}", receipt.recorded_at.to_rfc3339());
    Ok(())
}

/// List devices
fn cmd_devices(dataset: &Dataset) -> Result<()> {
    println!(
        "  {:<6} {:<22} {:<8} {:<8} {:<16} {}",
        "ID", "MODEL", "FIRMWARE", "STATUS", "LAB", "LAST SEEN"
    );
    for d in &dataset.devices {
        println!(
            "  {:<6} {:<22} {:<8} {:<8} {:<16} {}",
            d.id,
            d.model,
            d.firmware,
            d.status,
            d.lab,
            d.last_seen
        );
    }
    Ok(())
}

/// List the test catalog
fn cmd_catalog(dataset: &Dataset) -> Result<()> {
    for group in &dataset.test_groups {
        println!("{} — {} tests", group.title, group.count);
    }
    if !dataset.test_groups.is_empty() {
        println!();
    }
    for t in &dataset.tests {
        println!(
            "  {:<5} {:<28} {:<7} CI {:.2}  {}s",
            t.id, t.name, t.status, t.ci, t.duration
        );
    }
    Ok(())
}

/// Show analytics
fn cmd_analytics(dataset: &Dataset) -> Result<()> {
    let a = &dataset.analytics;
    println!("Runs (7d):   {} ({})", a.runs_7d, a.runs_trend);
    println!("HITL rate:   {}%", a.hitl_rate);
    for status in RunStatus::ALL {
        println!(
            "{:<12} {} ({}%)",
            format!("{}:", status),
            a.by_status.get(status),
            a.status_share(status)
        );
    }
    if let Some(latest) = a.pass_rate.last() {
        println!("Pass rate:   {:.0}% today", latest * 100.0);
    }
    if let Some(latest) = a.avg_ci.last() {
        println!("Avg CI:      {:.2} today", latest);
    }
    if !a.top_flaky.is_empty() {
        println!();
        println!("Top flaky tests:");
        for f in &a.top_flaky {
            println!("  {:<5} {:<24} {:>4}  {} fails (7d)", f.id, f.name, f.flakiness, f.fails_7d);
        }
    }
    Ok(())
}

/// Verify a queue artifact
fn cmd_verify(path: &Path) -> Result<()> {
    let artifact = read_queue_artifact(path)
        .with_context(|| format!("Failed to read queue artifact {:?}", path))?;
    artifact
        .check_integrity()
        .with_context(|| format!("Queue artifact {:?} failed verification", path))?;
    println!(
        "✓ {} entries, policy {}, digest {}",
        artifact.entries.len(),
        artifact.policy.describe(),
        artifact.content_digest
    );
    Ok(())
}
