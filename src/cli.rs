//! Command Line Interface

use std::{io::Write, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use humanize_duration::{Truncate, prelude::DurationExt};
use smallvec::SmallVec;
use tracing::{debug, info};

use yardage::{
    allocation::{allocate_with_observer, observer::SearchStats},
    logging::LoggingConfig,
    percentages::ManualPercentages,
    profiles::registry::ProfileRegistry,
    report::{AllocationReport, write_materials},
};

#[derive(Debug, Parser)]
#[command(
    name = "yardage",
    about = "Split a length of fabric across garment sizes",
    long_about = None
)]
pub(crate) struct Cli {
    /// Material registry file
    #[arg(long, global = true, env = "YARDAGE_CONFIG", default_value = "config/materials.yml")]
    pub(crate) config: PathBuf,

    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Allocate a material budget across sizes
    Allocate(AllocateArgs),

    /// List materials recommended for a product
    Recommend(RecommendArgs),

    /// List registered materials and their sizes
    Materials,
}

#[derive(Debug, Args)]
struct AllocateArgs {
    /// Material name
    #[arg(short, long)]
    material: String,

    /// Material length available, in metres
    #[arg(short, long)]
    budget: f64,

    /// Only allocate to these sizes (comma separated); every size when omitted
    #[arg(short, long, value_delimiter = ',')]
    sizes: Vec<String>,

    /// Search for the allocation with the least leftover
    #[arg(long)]
    minimize_leftover: bool,

    /// Manual share for a size, as SIZE=PERCENT (repeatable)
    #[arg(short, long = "percent", value_name = "SIZE=PERCENT", value_parser = parse_share)]
    percentages: Vec<(String, String)>,

    /// Scale manual shares down when they total more than 100%
    #[arg(long)]
    rebalance: bool,
}

#[derive(Debug, Args)]
struct RecommendArgs {
    /// Product category, e.g. Shirt
    #[arg(short, long)]
    product: String,
}

impl Cli {
    pub(crate) fn run(self, out: &mut impl Write) -> Result<()> {
        let registry = ProfileRegistry::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;

        debug!(materials = registry.len(), config = %self.config.display(), "registry loaded");

        match self.command {
            Command::Allocate(args) => run_allocate(&registry, args, out),
            Command::Recommend(args) => run_recommend(&registry, &args, out),
            Command::Materials => Ok(write_materials(&registry, out)?),
        }
    }
}

fn run_allocate(
    registry: &ProfileRegistry,
    args: AllocateArgs,
    out: &mut impl Write,
) -> Result<()> {
    let request = registry
        .request(&args.material, args.budget)?
        .with_eligible(args.sizes)
        .minimize_leftover(args.minimize_leftover);

    let mut percentages = ManualPercentages::parse(args.percentages);

    if args.rebalance && percentages.is_active() {
        let eligible: SmallVec<[&str; 8]> = request
            .eligible_sizes()?
            .iter()
            .map(|size| size.id())
            .collect();

        percentages = percentages.rebalanced(eligible.iter().copied());
    }

    let request = request.with_percentages(&percentages);
    let mut stats = SearchStats::default();

    let start = Instant::now();
    let result = allocate_with_observer(&request, &mut stats)?;
    let elapsed = start.elapsed();

    debug!(
        leaves = stats.leaves,
        improvements = stats.improvements,
        "search statistics"
    );

    AllocationReport::new(&args.material, &result, registry.currency()).write_to(&mut *out)?;

    writeln!(
        out,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}

fn run_recommend(
    registry: &ProfileRegistry,
    args: &RecommendArgs,
    out: &mut impl Write,
) -> Result<()> {
    if !registry.products().iter().any(|product| product == &args.product) {
        info!(product = %args.product, "product is not in the catalogue");
    }

    for name in registry.recommend(&args.product) {
        writeln!(out, "{name}")?;
    }

    Ok(())
}

/// Parse a `SIZE=PERCENT` pair. The percentage is kept raw; malformed values count as zero.
fn parse_share(value: &str) -> Result<(String, String), String> {
    let (size, share) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SIZE=PERCENT, got {value}"))?;

    let size = size.trim();

    if size.is_empty() {
        return Err(format!("missing size in {value}"));
    }

    Ok((size.to_string(), share.to_string()))
}
