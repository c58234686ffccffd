//! Command-line entry point for deSPAC warrant valuation.
//!
//! Prices a single scenario or, with `--grid`, every combination of the
//! supplied spots, maturities and volatilities. With a fixed seed the grid
//! reproduces a full valuation table.
//!
//! Usage:
//!   price_warrant --spot 14 --maturity 2 --vol 0.3
//!   price_warrant --spot 14 --maturity 2 --vol 0.3 --rng numpy_legacy
//!   price_warrant --grid --spots 10,12,14 --maturities 1,3,5 --vols 0.2,0.4 --json

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use despac_warrant::core::{PricingEngine, ValuationConfig, from_json, to_json_pretty};
use despac_warrant::engines::monte_carlo::{GridPoint, GridValuation, WarrantMcEngine};
use despac_warrant::math::FastRngKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "price_warrant")]
#[command(about = "Monte Carlo valuation of deSPAC warrants with forced redemption")]
struct Args {
    /// Current stock price
    #[arg(long, default_value_t = 14.0)]
    spot: f64,

    /// Time to expiry in years
    #[arg(long, default_value_t = 2.0)]
    maturity: f64,

    /// Annualised volatility
    #[arg(long, default_value_t = 0.3)]
    vol: f64,

    /// Number of simulated paths (even); overrides the config file
    #[arg(long)]
    paths: Option<usize>,

    /// RNG seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Generator: xoshiro256_plus_plus, pcg64, std_rng or numpy_legacy
    #[arg(long)]
    rng: Option<FastRngKind>,

    /// JSON file with `engine`, `warrant` and `rate` settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Price every combination of --spots, --maturities and --vols
    #[arg(long)]
    grid: bool,

    #[arg(long, value_delimiter = ',', default_values_t = vec![10.0, 12.0, 14.0, 16.0, 18.0])]
    spots: Vec<f64>,

    #[arg(long, value_delimiter = ',', default_values_t = vec![1.0, 2.0, 3.0, 4.0, 5.0])]
    maturities: Vec<f64>,

    #[arg(long, value_delimiter = ',', default_values_t = vec![0.2, 0.3, 0.4, 0.5])]
    vols: Vec<f64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<ValuationConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let payload = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            from_json::<ValuationConfig>(&payload)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => ValuationConfig::default(),
    };
    if let Some(paths) = args.paths {
        cfg.engine.num_paths = paths;
    }
    if let Some(seed) = args.seed {
        cfg.engine.seed = seed;
    }
    if let Some(rng_kind) = args.rng {
        cfg.engine.rng_kind = rng_kind;
    }
    Ok(cfg)
}

fn grid_points(args: &Args) -> Result<Vec<GridPoint>> {
    if args.spots.is_empty() || args.maturities.is_empty() || args.vols.is_empty() {
        bail!("--grid needs at least one value in each of --spots, --maturities and --vols");
    }
    let mut points = Vec::with_capacity(args.spots.len() * args.maturities.len() * args.vols.len());
    for &vol in &args.vols {
        for &expiry in &args.maturities {
            for &spot in &args.spots {
                points.push(GridPoint { spot, expiry, vol });
            }
        }
    }
    Ok(points)
}

fn print_valuations(valuations: &[GridValuation], json: bool) -> Result<()> {
    if json {
        println!("{}", to_json_pretty(&valuations).context("Failed to serialize results")?);
        return Ok(());
    }
    println!("{:>8} {:>8} {:>6} {:>10} {:>10}", "spot", "maturity", "vol", "price", "stderr");
    for v in valuations {
        println!(
            "{:>8.2} {:>8.2} {:>6.2} {:>10.4} {:>10.4}",
            v.point.spot, v.point.expiry, v.point.vol, v.price, v.stderr
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    let engine = WarrantMcEngine::new(cfg.engine);
    info!(
        num_paths = cfg.engine.num_paths,
        seed = cfg.engine.seed,
        rng = cfg.engine.rng_kind.as_str(),
        rate = cfg.rate,
        "valuation settings"
    );

    if args.grid {
        let points = grid_points(&args)?;
        info!(points = points.len(), "pricing grid");
        let valuations = engine
            .price_grid(&cfg.warrant, cfg.rate, &points)
            .context("Grid valuation failed")?;
        return print_valuations(&valuations, args.json);
    }

    let warrant = cfg.warrant_for(args.maturity);
    let market = cfg.market_for(args.spot, args.vol);
    let result = engine
        .price(&warrant, &market)
        .context("Warrant valuation failed")?;

    if args.json {
        println!("{}", to_json_pretty(&result).context("Failed to serialize result")?);
    } else {
        println!("warrant value:  {:.6}", result.price);
        println!("standard error: {:.6}", result.stderr.unwrap_or(0.0));
        for (key, value) in result.diagnostics.iter() {
            println!("  {key}: {value}");
        }
    }
    Ok(())
}
