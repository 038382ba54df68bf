//! Command-line driver for the points-to analysis engine. Loads one or more
//! `IrModule` JSON documents (the shape the external module finder hands to
//! `pta-core`, spec §6), runs the solver, and reports aggregate stats.
//! Shaped after the teacher's `depyler` binary: a `clap` derive `Cli` with
//! subcommands, `tracing-subscriber` initialized from `-v`/`-vv`, `anyhow`
//! at the edges (`depyler-analyzer::Analyzer::analyze` is where the
//! underlying `Query`/`Solver` split is grounded, see `pta-core::query`).

mod fixtures;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use pta_core::query::Query;
use pta_core::solver::Solver;
use pta_core::state::AnalysisState;
use pta_hir::config::AnalysisConfig;
use pta_hir::ir::IrModule;
use pta_modules::Composer;

#[derive(Parser)]
#[command(name = "pta")]
#[command(about = "Context-sensitive points-to analysis for dynamic OO languages", long_about = None)]
struct Cli {
    /// Context-selection policy: 0-cfa, <k>-cfa, <n>-obj, <n>-type, <n>-rcv, or <k>c<n>o (hybrid).
    #[arg(long, global = true, default_value = "0-cfa")]
    context_policy: String,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable class-hierarchy/MRO-based attribute resolution.
    #[arg(long, global = true)]
    no_mro: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single module from a JSON-encoded `IrModule`.
    Run {
        /// Path to an `IrModule` JSON document.
        input: PathBuf,

        /// Print the full engine-stats JSON instead of the summary table.
        #[arg(long)]
        json: bool,
    },
    /// Analyze several modules as one whole program, resolving imports between them.
    Compose {
        /// Paths to `IrModule` JSON documents.
        inputs: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },
    /// Run a small built-in scenario and print its stats; useful for smoke-testing a build.
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;

    match cli.command {
        Commands::Run { input, json } => run_single(&input, config, json),
        Commands::Compose { inputs, json } => run_compose(&inputs, config, json),
        Commands::Demo => run_demo(config),
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::default()
        .with_context_policy(&cli.context_policy)
        .with_context(|| format!("invalid --context-policy `{}`", cli.context_policy))?;
    config.use_mro = !cli.no_mro;
    config.verbose = cli.verbose > 0;
    config
        .validate()
        .with_context(|| "invalid analysis configuration")?;
    Ok(config)
}

fn load_module(path: &PathBuf) -> Result<IrModule> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as an IrModule", path.display()))
}

fn run_single(input: &PathBuf, config: AnalysisConfig, json: bool) -> Result<()> {
    let module = load_module(input)?;
    let mut solver = Solver::new(AnalysisState::new(config));
    solver.run(&module);
    report(&mut solver, json)
}

fn run_compose(inputs: &[PathBuf], config: AnalysisConfig, json: bool) -> Result<()> {
    let modules: Vec<IrModule> = inputs.iter().map(load_module).collect::<Result<_>>()?;
    let max_import_depth = config.max_import_depth;
    let mut solver = Solver::new(AnalysisState::new(config));
    let mut composer = Composer::new(max_import_depth);
    for module in &modules {
        composer.register_module(module);
    }
    composer.compose(&mut solver);
    report(&mut solver, json)
}

/// Runs the six hand-built end-to-end scenarios and prints a pass/fail line
/// for each. `config` is accepted for symmetry with `run_single`/
/// `run_compose` but unused: every scenario fixes its own context policy
/// (scenario 2 needs 2-CFA specifically), since they exist to pin down
/// concrete behaviors rather than exercise whatever policy the caller chose.
fn run_demo(_config: AnalysisConfig) -> Result<()> {
    println!("{}", "end-to-end scenarios".bold());
    let mut all_passed = true;
    for scenario in fixtures::all_scenarios() {
        let mark = if scenario.passed { "ok".green() } else { "FAILED".red() };
        println!("  [{mark}] {}", scenario.name);
        println!("        {}", scenario.detail);
        all_passed &= scenario.passed;
    }
    if !all_passed {
        anyhow::bail!("one or more end-to-end scenarios failed");
    }
    Ok(())
}

fn report(solver: &mut Solver, json: bool) -> Result<()> {
    let mut query = Query::new(solver);
    if json {
        println!("{}", serde_json::to_string_pretty(&query.export_summary())?);
        return Ok(());
    }
    let stats = query.stats();
    println!("{}", "points-to analysis summary".bold());
    println!("  variables:       {}", stats.variable_count);
    println!("  objects:         {}", stats.object_count);
    println!("  live contexts:   {}", stats.live_context_count);
    println!("  functions:       {}", stats.function_count);
    println!("  classes:         {}", stats.class_count);
    if stats.total_unknowns == 0 {
        println!("  unknowns:        {}", "0".green());
    } else {
        println!("  unknowns:        {}", stats.total_unknowns.to_string().yellow());
        for (kind, count) in &stats.unknowns_by_kind {
            if *count > 0 {
                println!("    {kind:?}: {count}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_reports_all_scenarios_passing() {
        let config = AnalysisConfig::default();
        assert!(run_demo(config).is_ok());
    }
}
