use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use dirsweep::{
    utils::{format_file_size, parse_size},
    Analyzer,
    CleaningSession,
    DeletionMode,
    ExecOptions,
    FilterCriteria,
    Opportunity,
    OpportunityCategory,
    SessionOptions,
    SizeCalculator,
    TargetKind,
};

use crate::args::{Args, CleanArgs, Command};

mod args;
mod progress;
mod utils;

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<bool> {
    match args.command {
        Command::NodeModules(clean) => run_clean(TargetKind::NodeModules, clean),
        Command::Subdirs(clean) => run_clean(TargetKind::Subdirectories, clean),
        Command::EmptyDirs(clean) => run_clean(TargetKind::EmptyDirs, clean),
        Command::Pattern {
            pattern,
            files,
            max_depth,
            clean,
        } => run_clean(
            TargetKind::Pattern {
                glob: pattern,
                max_depth,
                match_files: files,
            },
            clean,
        ),
        Command::Preset { name, clean } => {
            let rule = dirsweep::find_preset(&name).with_context(|| {
                let available = dirsweep::presets()
                    .iter()
                    .map(|preset| preset.name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("unknown preset '{}', available: {}", name, available)
            })?;
            run_clean(TargetKind::Preset(rule), clean)
        }
        Command::Analyze { root, depth, top } => run_analyze(&root, depth, top),
        Command::Discover { root } => run_discover(&root),
    }
}

fn run_clean(kind: TargetKind, args: CleanArgs) -> anyhow::Result<bool> {
    let root = canonical_root(&args.root)?;

    let min_size = args
        .min_size
        .as_deref()
        .map(parse_size)
        .transpose()
        .context("invalid --min-size")?;
    let criteria = FilterCriteria::new(&[], &args.exclude, min_size, args.older_than)?;

    let mode = if args.dry_run {
        DeletionMode::DryRun
    } else if args.trash {
        DeletionMode::Trash
    } else {
        DeletionMode::Permanent
    };

    let session = CleaningSession::new();
    let options = SessionOptions {
        criteria,
        exec: ExecOptions {
            mode,
            // prompts and concurrent deletions do not mix
            parallel: args.parallel && !args.interactive,
            timeout: args.timeout.map(Duration::from_secs),
            event_sink: Box::new(progress::OutcomePrinter),
            ..ExecOptions::default()
        },
        scan_sink: Box::new(progress::ScanProgress::new()),
    };

    let interactive = args.interactive;
    let result = session.run(root, kind, options, move |candidates| {
        if interactive {
            utils::prompt_selection(candidates)
        } else {
            candidates
        }
    })?;

    println!();
    if result.processed() == 0 {
        println!("No matching directories found or selected.");
    } else {
        let action = if args.dry_run { "Would free" } else { "Freed" };
        println!(
            "{} {} across {} items in {}",
            action,
            format_file_size(result.bytes_freed),
            result.processed(),
            utils::format_duration(&result.elapsed)
        );
        if result.failed > 0 {
            println!("{} items failed, see above", result.failed);
        }
    }
    if result.cancelled {
        println!("Session was cancelled before completing.");
    }

    Ok(result.fully_succeeded())
}

fn run_analyze(root: &Path, depth: usize, top: usize) -> anyhow::Result<bool> {
    let root = canonical_root(root)?;
    println!("Analyzing disk usage in {}...", root.display());

    let analyzer = Analyzer::new(Arc::new(SizeCalculator::tolerant()));
    let results = analyzer.analyze(&root, depth, top)?;

    println!();
    println!("Largest directories:");
    println!("{:-<80}", "");
    println!("{:>10} | Path", "Size");
    println!("{:-<80}", "");
    for (path, size) in &results {
        println!("{:>10} | {}", format_file_size(*size), path.display());
    }

    Ok(true)
}

fn run_discover(root: &Path) -> anyhow::Result<bool> {
    let root = canonical_root(root)?;
    println!("Scanning for cleanup opportunities in {}...", root.display());

    let analyzer = Analyzer::new(Arc::new(SizeCalculator::tolerant()));
    let opportunities = analyzer.discover(&root)?;

    if opportunities.is_empty() {
        println!("No cleanup opportunities found.");
        return Ok(true);
    }

    for category in [
        OpportunityCategory::NodeModules,
        OpportunityCategory::BuildArtifacts,
        OpportunityCategory::CacheDirs,
        OpportunityCategory::TempEntries,
        OpportunityCategory::LargeDirs,
    ] {
        let group = opportunities
            .iter()
            .filter(|opportunity| opportunity.category == category)
            .collect::<Vec<_>>();
        if group.is_empty() {
            continue;
        }

        let total: u64 = group
            .iter()
            .filter_map(|opportunity| opportunity.candidate.size())
            .sum();
        println!();
        println!(
            "{} - {} items, {}",
            category.label(),
            group.len(),
            format_file_size(total)
        );
        print_top(&group, 5);
    }

    Ok(true)
}

fn print_top(group: &[&Opportunity], limit: usize) {
    for opportunity in group.iter().take(limit) {
        println!(
            "  {:>10} | {}",
            format_file_size(opportunity.candidate.size().unwrap_or(0)),
            opportunity.candidate.path().display()
        );
    }
    if group.len() > limit {
        println!("  ... and {} more", group.len() - limit);
    }
}

fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    let root = dunce::canonicalize(root)
        .with_context(|| format!("invalid root path {}", root.display()))?;
    log::debug!("Root path: {}", root.display());
    Ok(root)
}
