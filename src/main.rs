use anyhow::{Context, Result};
use clap::Parser;
use synthesis_lib::model::config::AppConfig;
use synthesis_lib::model::metrics::init_logging;
use synthesis_lib::scenario::{self, ScenarioOptions};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Rng seed; overrides the one in the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Work each donor contributes per tick
    #[arg(long, default_value_t = 10.0)]
    work_per_tick: f32,

    /// Stop after this many ticks even if the process is still running
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Stock too little polymer, so assembly can never finish
    #[arg(long)]
    starve: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let options = ScenarioOptions {
        seed: args.seed.or(config.seed).unwrap_or(42),
        work_per_tick: args.work_per_tick,
        max_ticks: args.max_ticks,
        starve_materials: args.starve,
    };

    tracing::info!("Running headless synthesis scenario (seed {})", options.seed);
    let report = scenario::run(config, &options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
