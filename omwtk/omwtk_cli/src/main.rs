use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use omwtk_reconcile::{
    working_set::omw_only, BatchComparator, DefinitionClassifier, MemoryRepository,
    ReconcileConfig, ReconcileTelemetry, Snapshot, Source, SourceCounts, WorkingSet,
};
use serde_json::json;
use shared_logging::LogLevel;
use tokio::runtime::Runtime;

mod report;

use report::TextReportSink;

#[derive(Parser, Debug)]
#[command(name = "omwtk", version, about = "Compares OMW and GWN synset definitions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// OMW snapshot (JSON).
    #[arg(long)]
    omw: PathBuf,
    /// GWN snapshot (JSON).
    #[arg(long)]
    gwn: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classifies every shared synset and writes the reports.
    Compare {
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Restricts the run to the ids listed in this file.
        #[arg(long)]
        ids: Option<PathBuf>,
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
    /// Prints the number of synsets in each source.
    Count {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Lists synsets that only exist in OMW.
    NewSynsets {
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = Runtime::new()?;
    match cli.command {
        Commands::Compare {
            sources,
            config,
            ids,
            out,
        } => runtime.block_on(handle_compare(&sources, config.as_deref(), ids, &out)),
        Commands::Count { sources } => runtime.block_on(handle_count(&sources)),
        Commands::NewSynsets { sources, out } => {
            runtime.block_on(handle_new_synsets(&sources, out.as_deref()))
        }
    }
}

fn load_sources(sources: &SourceArgs) -> Result<(MemoryRepository, MemoryRepository)> {
    let (omw, omw_malformed) = Snapshot::load(&sources.omw, Source::Omw)?.into_repository();
    let (gwn, gwn_malformed) = Snapshot::load(&sources.gwn, Source::Gwn)?.into_repository();
    for error in omw_malformed.iter().chain(&gwn_malformed) {
        eprintln!("skipping: {error}");
    }
    Ok((omw, gwn))
}

async fn handle_compare(
    sources: &SourceArgs,
    config_path: Option<&Path>,
    ids_override: Option<PathBuf>,
    out: &Path,
) -> Result<()> {
    let config = match config_path {
        Some(path) => ReconcileConfig::load(path)?,
        None => ReconcileConfig::default(),
    };
    let mut telemetry = ReconcileTelemetry::builder("omwtk.compare").min_level(LogLevel::Info);
    if let Some(path) = &config.log_path {
        telemetry = telemetry.log_path(path);
    }
    let telemetry = telemetry.build()?;

    let (omw, gwn) = load_sources(sources)?;
    let subset = match ids_override.or_else(|| config.ids_path.clone()) {
        Some(path) => {
            let subset = WorkingSet::read_id_file(&path)
                .with_context(|| format!("reading id list {}", path.display()))?;
            for error in &subset.malformed {
                eprintln!("skipping: {error}");
            }
            println!("Comparing {} synsets loaded from {}", subset.len(), path.display());
            Some(subset)
        }
        None => {
            println!("Generating synset ID list");
            None
        }
    };
    let working_set = WorkingSet::resolve(&omw, &gwn, subset).await?;

    let sink = Arc::new(TextReportSink::create(out)?);
    let classifier = DefinitionClassifier::new(
        Arc::new(omw.clone()),
        Arc::new(gwn.clone()),
        Arc::new(gwn),
        Arc::new(omw),
    );
    let comparator = BatchComparator::from_config(classifier, &config)
        .with_sink(sink.clone())
        .with_telemetry(telemetry.clone());

    println!("Comparing {} synsets", working_set.len());
    let report = comparator.run(&working_set.ids).await?;
    sink.flush()?;
    let diff_path = sink.write_diff_ids(&report.diff_ids())?;

    for failure in &report.failures {
        eprintln!("failed: {}", failure.error);
    }
    if !report.skipped.is_empty() {
        eprintln!("stopped early: {} synsets not compared", report.skipped.len());
    }
    for line in report.summary() {
        println!("{line}");
    }
    println!("Reports written to {}", out.display());
    println!("Diff ids written to {}", diff_path.display());
    let _ = telemetry.log(
        LogLevel::Info,
        "omwtk.compare.complete",
        json!({ "run_id": report.run_id, "out": out }),
    );
    Ok(())
}

async fn handle_count(sources: &SourceArgs) -> Result<()> {
    let (omw, gwn) = load_sources(sources)?;
    let counts = SourceCounts::collect(&omw, &gwn).await?;
    let sample = |ids: &[omwtk_reconcile::SynsetId]| {
        ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    };
    println!("OMW synsets: {}", counts.omw);
    println!("  {}", sample(&counts.omw_sample));
    println!("GWN synsets: {}", counts.gwn);
    println!("  {}", sample(&counts.gwn_sample));
    println!("Shared synsets: {}", counts.shared);
    Ok(())
}

async fn handle_new_synsets(sources: &SourceArgs, out: Option<&Path>) -> Result<()> {
    let (omw, gwn) = load_sources(sources)?;
    let entries = omw_only(&omw, &gwn).await?;
    let mut body = String::new();
    for entry in &entries {
        for line in entry.lines() {
            body.push_str(&line);
            body.push('\n');
        }
    }
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            println!("{} new synsets written to {}", entries.len(), path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}
