use anyhow::{Context, Result};
use cell_growth_core::rng::create_rng;
use cell_growth_core::spatial::find_unbonded_overlaps;
use cell_growth_core::{Body, BodySnapshot, GrowthConfig, GrowthSummary, Precision};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

const BENCHMARK_SEED: u64 = 42;
const BENCHMARK_DIVISIONS: [usize; 4] = [100, 500, 2000, 5000];
const TARGET_DIVISIONS_PER_SEC: f64 = 1000.0;

#[derive(Parser)]
#[command(name = "cell-growth")]
#[command(about = "Cell growth and bonding engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow a body from a seed cell using a config file
    Grow {
        /// Path to config file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Output directory for results (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of random divisions to perform (default: 200)
        #[arg(long, default_value_t = 200)]
        divisions: usize,
    },
    /// Run the growth benchmark suite
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn grow(config: GrowthConfig, divisions: usize) -> Result<GrowthSummary> {
    let seed = config.seed;
    let (mut body, _) = Body::seeded(config).context("failed to create seeded body")?;
    let mut rng = create_rng(seed);
    let stats = body.grow(&mut rng, divisions);
    let unbonded_overlaps = find_unbonded_overlaps(&body)
        .into_iter()
        .map(|(a, b)| [a.index() as u32, b.index() as u32])
        .collect();
    Ok(GrowthSummary {
        schema_version: 1,
        seed,
        divisions_requested: divisions,
        stats,
        unbonded_overlaps,
        snapshot: BodySnapshot::capture(&body),
    })
}

fn run_benchmark(divisions: usize, precision: Precision) -> Result<()> {
    let config = GrowthConfig {
        seed: BENCHMARK_SEED,
        division_precision: precision,
        ..GrowthConfig::default()
    };
    config
        .validate()
        .context("benchmark config validation error")?;

    let start = Instant::now();
    let summary = grow(config, divisions)?;
    let elapsed = start.elapsed().as_secs_f64();
    let per_sec = summary.stats.divisions as f64 / elapsed.max(f64::EPSILON);

    println!("--- {divisions} divisions ({precision:?} precision) ---");
    println!("  Elapsed:       {:.1} ms ({per_sec:.0} divisions/sec)", elapsed * 1000.0);
    println!(
        "  Resolver:      {} rounds, {} capped, {} cells displaced",
        summary.stats.resolver_rounds, summary.stats.capped_resolves, summary.stats.displaced_cells,
    );
    println!(
        "  Bonds:         mean deviation {:.4}, max {:.4}",
        summary.snapshot.mean_bond_deviation, summary.snapshot.max_bond_deviation,
    );
    println!("  Overlaps:      {} unbonded pairs", summary.unbonded_overlaps.len());
    let verdict = if per_sec >= TARGET_DIVISIONS_PER_SEC {
        "GO"
    } else {
        "NO-GO"
    };
    println!("  Verdict:       {verdict} (target: >={TARGET_DIVISIONS_PER_SEC} divisions/sec)");
    println!();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = GrowthConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p cell-growth-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Cell Growth Benchmark ===");
            println!("Seed: {BENCHMARK_SEED}");
            println!();

            for precision in [Precision::Normal, Precision::Extra] {
                println!("=== Precision: {precision:?} ===");
                for divisions in BENCHMARK_DIVISIONS {
                    run_benchmark(divisions, precision)?;
                }
            }
        }
        Commands::Grow {
            config,
            out,
            divisions,
        } => {
            let file = File::open(&config).context("failed to open config file")?;
            let reader = BufReader::new(file);
            let growth_config: GrowthConfig =
                serde_json::from_reader(reader).context("failed to parse config")?;
            growth_config
                .validate()
                .context("config validation error")?;

            log::info!("loaded config from {}", config.display());
            println!("Growing for {divisions} divisions...");

            let summary = grow(growth_config, divisions)?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Growth complete. Results saved to {:?}", out_dir);
            } else {
                println!(
                    "Growth complete. Live cells: {}, unbonded overlaps: {}",
                    summary.snapshot.live_count,
                    summary.unbonded_overlaps.len()
                );
            }
        }
    }
    Ok(())
}
