use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

mod activity;
mod aggregator;
mod basins;
mod config;
mod error;
mod geo;
mod measurement;
mod model;
mod reference;
mod report;
mod scenario;

use aggregator::DoseAggregator;
use basins::{BasinExtractor, DEFAULT_APPROX_ERROR};
use config::Cli;
use geo::{ClassifiedRaster, Coordinate};
use measurement::{Measurement, SoilActivity};
use reference::TabularReference;
use report::ReportDir;
use scenario::ScenarioConfig;

/// Basin raster classification code: pixels carrying this value are
/// treated as basin interior.
const BASIN_RASTER_CODE: u16 = 2;

fn main() -> Result<()> {
    config::init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        tracing::error!(error = %err, "run failed");
        return Err(err);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let raw_input = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading scenario file {:?}", cli.input))?;
    let scenario: ScenarioConfig = serde_json::from_str(&raw_input).context("parsing scenario JSON")?;

    let report_root = cli
        .output
        .clone()
        .unwrap_or_else(|| ReportDir::timestamped_name(&std::env::temp_dir(), Local::now()));
    info!(?report_root, "report directory");
    let report = ReportDir::prepare(report_root, &cli.input)?;

    let reference = Rc::new(TabularReference::open(&scenario.database_name)?);

    // The classified raster's georeferencing isn't carried in the TIFF
    // itself (see `geo::raster`'s module doc); until the scenario schema
    // grows a dedicated field for it, the raster is assumed to already
    // cover the basins' bounding box with 1-unit pixels in `EPSG:3857`.
    let transform = geo::AffineTransform::new(0.0, 0.0, 1.0);
    let raster = ClassifiedRaster::open(
        std::path::Path::new(&scenario.geotiff_filename),
        BASIN_RASTER_CODE,
        "EPSG:3857",
        transform,
    )?;
    let basin_extractor = BasinExtractor::build(&raster, DEFAULT_APPROX_ERROR);

    let base_input = scenario.model.to_base_input()?;
    let aggregator = DoseAggregator::new(Rc::clone(&reference), base_input, scenario.model.soil_density);

    let activity_maps = build_activity_maps(&scenario, &basin_extractor, &raster)?;

    for actmap in &activity_maps {
        report.write_activity_map(actmap)?;
    }
    let factors: std::collections::HashMap<String, f64> = activity_maps
        .iter()
        .map(|m| (m.nuclide().to_string(), m.raster_factor().unwrap_or(0.0)))
        .collect();
    report.write_raster_factors(&factors)?;

    if let Some(map_points) = &scenario.points.map {
        let ul = Coordinate::new(map_points.ul.lon, map_points.ul.lat, "EPSG:4326");
        let lr = Coordinate::new(map_points.lr.lon, map_points.lr.lat, "EPSG:4326");
        let grids = aggregator.calculate_doses_map(&activity_maps, ul, lr, map_points.resolution)?;
        if let Some(first) = grids.first() {
            report.write_coords(&first.x, &first.y)?;
        }
        for grid in &grids {
            report.write_dose_grid(grid)?;
        }
    }

    if let Some(special_points) = &scenario.points.special {
        let points: Vec<(String, Coordinate)> = special_points
            .iter()
            .map(|p| (p.name.clone(), Coordinate::new(p.lon, p.lat, "EPSG:4326")))
            .collect();
        let rows = aggregator.calculate_doses_in_special_points(&activity_maps, &points)?;
        report.write_special_points(&rows)?;
    }

    info!("done");
    Ok(())
}

/// Paints one [`activity::ActivityMap`] per nuclide named across every
/// basin's measurements, matching the original's `make_activity_maps`:
/// one shared raster per nuclide, seeded basin by basin.
fn build_activity_maps(
    scenario: &ScenarioConfig,
    basin_extractor: &BasinExtractor,
    raster: &ClassifiedRaster,
) -> Result<Vec<activity::ActivityMap>> {
    let (left, top) = raster.transform.corner(0, 0);
    let (right, bottom) = raster.transform.corner(raster.height, raster.width);
    let ul = Coordinate::new(left, top, "EPSG:3857");
    let lr = Coordinate::new(right, bottom, "EPSG:3857");

    let mut maps: std::collections::HashMap<String, activity::ActivityMap> = std::collections::HashMap::new();

    for basin_config in &scenario.basins {
        let coo = Coordinate::new(basin_config.lon, basin_config.lat, "EPSG:4326");
        let basin = basin_extractor
            .get_basin(coo)?
            .ok_or_else(|| error::CoreError::BasinNotFound(basin_config.name.clone()))?;

        for measurement_config in &basin_config.measurements {
            let activity = SoilActivity::with_default_density(measurement_config.specific_activity);
            let seed_point = basin.body().exterior().coords().next().expect("basin body has at least one vertex");
            let measurement = Measurement::new(activity, Coordinate::new(seed_point.x, seed_point.y, "EPSG:3857"))?;

            let actmap = match maps.entry(measurement_config.nuclide.clone()) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let fresh = activity::ActivityMap::new(ul, lr, scenario.model.square_side, measurement_config.nuclide.clone())?;
                    entry.insert(fresh)
                }
            };
            actmap.add_basin(basin, &[measurement])?;
        }
    }

    Ok(maps.into_values().collect())
}
