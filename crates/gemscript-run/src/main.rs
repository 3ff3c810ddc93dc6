//! GEMSCRIPT runner.
//!
//! Compiles blueprint scripts, instantiates agents and drives them through
//! a number of ticks, each running the UPDATE and THINK programs.
//!
//! Usage: `gemscript-run <files>... [--blueprint NAME] [--agents N] [--ticks N] [--check] [--json]`

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gemscript_engine::{Engine, EngineConfig};
use gemscript_foundation::ProgramKind;

#[derive(Parser, Debug)]
#[command(name = "gemscript-run")]
#[command(about = "Compile GEMSCRIPT blueprints and run agents through simulation ticks")]
struct Args {
    /// Blueprint script files, compiled in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Blueprint to instantiate (defaults to every compiled blueprint)
    #[arg(long)]
    blueprint: Option<String>,

    /// Agents per blueprint
    #[arg(long, default_value = "1")]
    agents: usize,

    /// Number of ticks to run
    #[arg(long, default_value = "1")]
    ticks: u64,

    /// JSON file with engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the maximum stack depth
    #[arg(long)]
    max_stack_depth: Option<usize>,

    /// Override the maximum nesting of method programs
    #[arg(long)]
    max_call_depth: Option<usize>,

    /// Only compile and report diagnostics
    #[arg(long)]
    check: bool,

    /// Print final agent state as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gemscript=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(depth) = args.max_stack_depth {
        config.max_stack_depth = depth;
    }
    if let Some(depth) = args.max_call_depth {
        config.max_call_depth = depth;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let engine = Engine::with_config(load_config(&args)?);

    let mut failed = false;
    for path in &args.files {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?;
        let report = engine
            .load_blueprint(&source)
            .with_context(|| format!("compiling '{}'", path.display()))?;
        for diagnostic in &report.diagnostics {
            warn!("{}: {}", path.display(), diagnostic);
        }
        failed |= report.has_errors();
        info!(
            "Compiled {} from {} ({} programs, {} diagnostics)",
            report.bundle.name,
            path.display(),
            report.bundle.programs.len(),
            report.diagnostics.len()
        );
    }

    if args.check {
        if failed {
            bail!("diagnostics reported errors");
        }
        return Ok(());
    }

    let names: Vec<String> = match &args.blueprint {
        Some(name) => vec![name.clone()],
        None => engine
            .get_all_blueprints()
            .iter()
            .map(|bundle| bundle.name.clone())
            .collect(),
    };

    let mut agents = Vec::new();
    for name in &names {
        for _ in 0..args.agents {
            agents.push(engine.instantiate(name)?);
        }
    }
    info!("Instantiated {} agents", agents.len());

    for tick in 0..args.ticks {
        for agent in &mut agents {
            let Some(bundle) = engine.get_blueprint(agent.blueprint()) else {
                continue;
            };
            for kind in [ProgramKind::Update, ProgramKind::Think] {
                if let Err(err) = engine.run_program(&bundle, kind, agent) {
                    error!("tick {}: {} {} failed: {}", tick, agent.id(), kind, err);
                }
            }
        }
    }
    info!("Ran {} ticks", args.ticks);

    if args.json {
        let snapshots: Vec<_> = agents.iter().map(|agent| agent.snapshot()).collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        for agent in &agents {
            info!("{} ({})", agent.id(), agent.blueprint());
            for (path, prop) in agent.props() {
                info!("  {} = {}", path, prop.value());
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    run(Args::parse())
}
