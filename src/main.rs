//! travel-itinerary - rebuilds a travel history from extracted booking events
//!
//! Reads a batch of already-extracted travel events, runs the assembly
//! pipeline, and writes the itinerary and deduplicated events as JSON.
//!
//! Module structure:
//! - `domain/` - Core types (TravelEvent, CitySignal, CityVisit, Gap)
//! - `io/` - Event source and egress files
//! - `services/` - Filter, Dedup, Signals, Assembler, Merger, Gap detection
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use travel_itinerary::infra::Config;
use travel_itinerary::io::{load_events, Egress};
use travel_itinerary::services::Pipeline;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Travel itinerary - event-to-timeline assembly
#[derive(Parser, Debug)]
#[command(name = "travel-itinerary", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/itinerary.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Events file (JSON array or JSON Lines)
    #[arg(short, long)]
    events: String,

    /// Output directory (overrides [egress] dir)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Keep only events booked for this traveler (overrides [traveler] name)
    #[arg(short, long)]
    traveler: Option<String>,

    /// Run the pipeline without writing output files
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    // Default: INFO, use RUST_LOG=debug for per-signal transitions
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "travel-itinerary starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(dir) = &args.output_dir {
        config = config.with_egress_dir(dir);
    }
    if let Some(name) = &args.traveler {
        config = config.with_traveler_name(name);
    }

    info!(
        config_file = %config.config_file(),
        gap_threshold_days = %config.gap_threshold_days(),
        dedup_window_days = %config.dedup_window_days(),
        merge_adjacency_days = %config.merge_adjacency_days(),
        home_base = %config.home_base(),
        traveler = %config.traveler_name(),
        skip_cancellations = %config.skip_cancellations(),
        egress_dir = %config.egress_dir(),
        "config_loaded"
    );

    let events = load_events(&args.events)?;

    let pipeline = Pipeline::new(config);
    let output = pipeline.run(events);
    output.metrics.log();

    if args.dry_run {
        info!(visits = %output.visits.len(), gaps = %output.gaps.len(), "dry_run_no_output");
        return Ok(());
    }

    Egress::new(pipeline.config().egress_dir()).write_all(&output)?;

    info!("travel-itinerary finished");
    Ok(())
}
