//! el_alto — delivery routing for El Alto, La Paz.
//!
//! ```text
//! el_alto route -- -16.5050,-68.2000 -16.4950,-68.1650 -16.5200,-68.1800
//! el_alto predict --dist-m 4200 --base-time-sec 510 --disruption-day 1
//! el_alto retrain
//! el_alto export-zones data/zones.geojson
//! ```
//!
//! The road network comes from `graph.cache_path` when present, otherwise
//! from a local PBF extract (`--features osm`) or the Overpass API
//! (`--features overpass`).  Set `RUST_LOG=debug` for per-stage detail.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rt_core::DayKind;
use rt_service::{EngineConfig, GraphConfig, PredictionRequest, RouteRequest, RoutingEngine};
use rt_spatial::{BoundingBox, RoadNetwork, SpatialError, SpatialResult};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Engine configuration (TOML).  Defaults apply when the file is missing.
    #[arg(short, long, default_value = "el_alto.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Closed delivery tour through the given `lat,lon` points; the first
    /// one is the depot.
    Route {
        #[arg(required = true, num_args = 2.., allow_hyphen_values = true, value_parser = parse_point)]
        waypoints: Vec<[f64; 2]>,
        /// 0 or 1; defaults to today's calendar day.
        #[arg(long)]
        disruption_day: Option<u8>,
    },
    /// Corrected travel time for a known distance and base time.
    Predict {
        #[arg(long)]
        dist_m: f64,
        #[arg(long)]
        base_time_sec: f64,
        #[arg(long, default_value_t = 0)]
        disruption_day: u8,
    },
    /// Rebuild the dataset and the model.
    Retrain,
    /// Write the disruption zones as GeoJSON.
    ExportZones {
        #[arg(default_value = "data/zones.geojson")]
        out: PathBuf,
    },
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got `{s}`"))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("latitude `{lat}`: {e}"))?;
    let lon = lon.trim().parse::<f64>().map_err(|e| format!("longitude `{lon}`: {e}"))?;
    Ok([lat, lon])
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        info!(path = %path.display(), "no configuration file, using defaults");
        return Ok(EngineConfig::default());
    }
    EngineConfig::from_toml_file(path).with_context(|| format!("reading {}", path.display()))
}

/// Fetch the raw network from whichever map source this build supports.
fn fetch_network(graph: &GraphConfig, area: Option<BoundingBox>) -> SpatialResult<RoadNetwork> {
    #[cfg(feature = "osm")]
    if let Some(pbf) = &graph.pbf_path {
        use rt_spatial::MapSource;
        let mut source = rt_spatial::osm::PbfSource::new(pbf.clone());
        if let Some(bbox) = area {
            source = source.with_bbox(bbox);
        }
        return source.fetch();
    }

    #[cfg(feature = "overpass")]
    if let Some(bbox) = area {
        use rt_spatial::MapSource;
        return rt_spatial::overpass::OverpassSource::new(bbox).fetch();
    }

    let _ = (graph, area);
    Err(SpatialError::Source(
        "no map source available: provide graph.cache_path or build with `osm` / `overpass`".into(),
    ))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let graph_cfg = config.graph.clone();
    let area = config.service_area();
    let engine = RoutingEngine::new(config, move || fetch_network(&graph_cfg, area));

    match cli.command {
        Command::Route { waypoints, disruption_day } => {
            let request = RouteRequest { waypoints, disruption_day };
            let response = engine.find_route(&request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Predict { dist_m, base_time_sec, disruption_day } => {
            let day = DayKind::try_from(disruption_day)?;
            let response = engine.predict(&PredictionRequest::new(dist_m, base_time_sec, day))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Retrain => {
            let report = engine.retrain()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ExportZones { out } => {
            engine.export_zones_geojson(&out)?;
            println!("Zones written to {}", out.display());
        }
    }
    Ok(())
}
