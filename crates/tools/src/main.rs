use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use foundation::LngLatBounds;
use layers::{RecordingCanvas, StationLayer, StepLog, show_route};
use routing::{HttpDirectionsClient, RoutePlanner, RouteProfile};
use stations::{ClusterFeature, SelectionState, SpatialIndex};
use tools::{AppConfig, ScriptStep, load_json, load_rewards, load_stations, run_script};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bikeshare station map toolkit")]
struct Args {
    /// Config file (default: ./bikemap.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the clusters and stations visible in a bounding box
    Query {
        /// Station feed (JSON array)
        #[arg(long)]
        stations: PathBuf,

        /// Bounding box: west,south,east,north
        #[arg(long)]
        bbox: String,

        #[arg(long)]
        zoom: f64,
    },

    /// Replay a scripted session and print every canvas call as JSON lines
    Replay {
        #[arg(long)]
        stations: PathBuf,

        /// Reward list (JSON array)
        #[arg(long)]
        rewards: Option<PathBuf>,

        /// Script (JSON array of steps)
        #[arg(long)]
        script: PathBuf,
    },

    /// Fetch a route between stations
    Route {
        #[arg(long)]
        stations: PathBuf,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Intermediate stops, in order
        #[arg(long)]
        via: Vec<String>,

        #[arg(long, default_value = "fastest")]
        profile: RouteProfile,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Query {
            stations,
            bbox,
            zoom,
        } => cmd_query(&config, &stations, &bbox, zoom),
        Command::Replay {
            stations,
            rewards,
            script,
        } => cmd_replay(&config, &stations, rewards.as_deref(), &script),
        Command::Route {
            stations,
            from,
            to,
            via,
            profile,
        } => cmd_route(&config, &stations, from, to, via, profile).await,
    }
}

fn parse_bbox(s: &str) -> anyhow::Result<LngLatBounds> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("bbox `{s}` is not four numbers"))?;
    let &[west, south, east, north] = parts.as_slice() else {
        bail!("bbox needs exactly four values: west,south,east,north");
    };
    Ok(LngLatBounds::new(west, south, east, north))
}

fn cmd_query(config: &AppConfig, stations: &Path, bbox: &str, zoom: f64) -> anyhow::Result<()> {
    let bbox = parse_bbox(bbox)?;
    let snapshot = load_stations(stations)?;
    let index = SpatialIndex::build(snapshot.installed(), config.layer.clustering);
    let features = index.query(&bbox, zoom.floor() as i32);
    for feature in &features {
        match feature {
            ClusterFeature::Cluster {
                id,
                coordinates,
                point_count,
                expansion_zoom,
            } => println!(
                "{id}\t{:.5},{:.5}\tcount={point_count}\texpands_at={expansion_zoom}",
                coordinates.lng, coordinates.lat
            ),
            ClusterFeature::Point { station } => println!(
                "station:{}\t{:.5},{:.5}\tbikes={} ebikes={} docks={}",
                station.station_id,
                station.lon,
                station.lat,
                station.rentable_bikes(),
                station.rentable_ebikes(),
                station.num_docks_available
            ),
        }
    }
    info!(features = features.len(), "query done");
    Ok(())
}

fn cmd_replay(
    config: &AppConfig,
    stations: &Path,
    rewards: Option<&Path>,
    script: &Path,
) -> anyhow::Result<()> {
    let snapshot = load_stations(stations)?;
    let steps: Vec<ScriptStep> = load_json(script)?;

    let mut canvas = RecordingCanvas::new();
    let mut layer = StationLayer::new(1, config.layer.clone());
    layer.on_stations(snapshot, &mut canvas);
    if let Some(path) = rewards {
        layer.on_rewards(load_rewards(path)?, &mut canvas);
    }
    canvas.take_ops();

    for report in run_script(&mut layer, &mut canvas, steps) {
        println!("{}", serde_json::to_string(&report)?);
    }
    let snapshot = layer.metrics().snapshot();
    for (name, value) in snapshot.counters {
        info!(metric = name, value, "counter");
    }
    Ok(())
}

async fn cmd_route(
    config: &AppConfig,
    stations: &Path,
    from: String,
    to: String,
    via: Vec<String>,
    profile: RouteProfile,
) -> anyhow::Result<()> {
    let snapshot = load_stations(stations)?;
    let mut selection = SelectionState::new().with_start(from).with_end(to);
    for stop in via {
        selection = selection.with_waypoint(stop);
    }

    let client = HttpDirectionsClient::new(&config.routing)
        .context("building HTTP client")?;
    let mut planner = RoutePlanner::new();
    let Some(route) = planner.plan(&client, &selection, &snapshot, profile).await else {
        bail!("every stop must be a station in the feed");
    };

    let mut canvas = RecordingCanvas::new();
    let mut steps = StepLog::default();
    show_route(&route, &mut canvas, &mut steps);

    let duration = route
        .duration_s
        .map(|s| format!(", {:.0} min", s / 60.0))
        .unwrap_or_default();
    let note = if route.fallback {
        " (straight line)"
    } else {
        ""
    };
    println!(
        "{} stops, {:.0} m{duration}{note}",
        route.key.stops.len(),
        route.distance_m
    );
    for (i, step) in steps.steps.iter().enumerate() {
        println!(
            "{:>3}. {} ({:.0} m)",
            i + 1,
            step.instruction,
            step.distance_m
        );
    }
    Ok(())
}
