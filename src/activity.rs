//! Discretized activity distribution over a basin's shoreline: a raster
//! grid of accumulated surface activity, stored as scaled `u16` codes
//! with the scale factor rescaled on overflow so one map can keep
//! accumulating contributions from many basins without losing range.

use geo::{Area, BooleanOps, MultiPolygon, Polygon};
use geo_buffer::buffer_line_string;

use crate::basins::Basin;
use crate::error::{CoreError, CoreResult};
use crate::geo::raster::{write_u16_raster, AffineTransform};
use crate::geo::Coordinate;
use crate::measurement::Measurement;

/// Default proximity tolerance between a measurement and its basin's
/// shoreline, meters.
pub const DEFAULT_MEASUREMENT_PROXIMITY: f64 = 10.0;

/// Default contamination depth, cm.
pub const DEFAULT_CONTAMINATION_DEPTH: f64 = 10.0;

/// Blowout activity flow due to wind uplift, Bq/(m^2*sec). Not wired into
/// the dose aggregation path — included as a standalone supplemental
/// formula since nothing in the scenario excludes it.
///
/// `specific_activity` in Bq/kg, `windspeed` in m/sec.
pub fn blowout_activity_flow(specific_activity: f64, windspeed: f64) -> f64 {
    const TAU: f64 = 0.0078; // N/m^2
    const CRITICAL_WINDSPEED: f64 = 5.2; // m/sec
    const B_CRITICAL: f64 = 45e-6;
    const ALPHA: f64 = 9.0;

    let factor = specific_activity * TAU * B_CRITICAL / windspeed;
    let exp = (ALPHA * (1.0 - (CRITICAL_WINDSPEED / windspeed).powi(2))).exp();
    factor * exp
}

/// Holds the discretized activity distribution for one nuclide over a
/// bounding box, as a grid of `u16` raster codes. `raster_factor` is the
/// current `code = activity * raster_factor` scale; it's rescaled
/// whenever a new contribution would overflow `u16`.
pub struct ActivityMap {
    nuclide: String,
    step: f64,
    pub measurement_proximity: f64,
    pub contamination_depth: f64,
    width: usize,
    height: usize,
    transform: AffineTransform,
    data: Vec<u16>,
    raster_factor: Option<f64>,
}

impl ActivityMap {
    /// `ul`/`lr` are the upper-left and lower-right corners of the
    /// bounding box, in any CRS (reprojected to `EPSG:3857` here); `step`
    /// is the cell size in that CRS's units, meters.
    pub fn new(ul: Coordinate, lr: Coordinate, step: f64, nuclide: impl Into<String>) -> CoreResult<Self> {
        let ul = ul.transformed("EPSG:3857")?;
        let lr = lr.transformed("EPSG:3857")?;
        let (width, height) = AffineTransform::resolution_for(ul.lon, ul.lat, lr.lon, lr.lat, step);
        if width == 0 || height == 0 {
            return Err(CoreError::ExceedingStep { step });
        }
        Ok(Self {
            nuclide: nuclide.into(),
            step,
            measurement_proximity: DEFAULT_MEASUREMENT_PROXIMITY,
            contamination_depth: DEFAULT_CONTAMINATION_DEPTH,
            width,
            height,
            transform: AffineTransform::new(ul.lon, ul.lat, step),
            data: vec![0u16; width * height],
            raster_factor: None,
        })
    }

    pub fn nuclide(&self) -> &str {
        &self.nuclide
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> AffineTransform {
        self.transform
    }

    pub fn raster_factor(&self) -> Option<f64> {
        self.raster_factor
    }

    pub fn cell_code(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }

    /// Activity represented by a cell, in the map's own units, or 0.0 if
    /// no contribution has been accumulated yet.
    pub fn cell_activity(&self, row: usize, col: usize) -> f64 {
        match self.raster_factor {
            Some(factor) if factor > 0.0 => self.cell_code(row, col) as f64 / factor,
            _ => 0.0,
        }
    }

    /// Accumulates `measurements`' average surface activity across
    /// `basin`'s shoreline, spread over a band `basin.shoreline_width()`
    /// wide centered on each shoreline segment, weighted by each raster
    /// cell's overlap area with that band.
    pub fn add_basin(&mut self, basin: &Basin, measurements: &[Measurement]) -> CoreResult<()> {
        if measurements.is_empty() {
            return Ok(());
        }
        self.check_measurements(basin, measurements)?;

        let surface_activity = average_surface_activity(measurements, self.contamination_depth);
        if surface_activity == 0.0 {
            return Ok(());
        }

        for shoreline_segment in basin.shoreline() {
            let shoreline_band: MultiPolygon<f64> = buffer_line_string(shoreline_segment, basin.shoreline_width() / 2.0);

            for row in 0..self.height {
                for col in 0..self.width {
                    let (x, y) = self.transform.center(row, col);
                    let cell = cell_polygon(x, y, self.step);
                    let intersection_area = MultiPolygon::new(vec![cell]).intersection(&shoreline_band).unsigned_area();
                    if intersection_area == 0.0 {
                        continue;
                    }

                    let activity = surface_activity * intersection_area;
                    self.accumulate(row, col, activity);
                }
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, row: usize, col: usize, activity: f64) {
        let raster_factor = self.factor_for(activity);
        if let Some(current) = self.raster_factor {
            if (current - raster_factor).abs() > f64::EPSILON {
                self.rescale(current, raster_factor);
            }
        }
        self.raster_factor = Some(raster_factor);

        let idx = row * self.width + col;
        let delta = (raster_factor * activity).round().clamp(0.0, u16::MAX as f64) as u16;
        self.data[idx] = self.data[idx].saturating_add(delta);
    }

    fn factor_for(&self, activity: f64) -> f64 {
        let max_code = u16::MAX as f64;
        match self.raster_factor {
            Some(factor) if factor * activity <= max_code => factor,
            _ => max_code / (2.0 * activity),
        }
    }

    fn rescale(&mut self, old_factor: f64, new_factor: f64) {
        for code in self.data.iter_mut() {
            *code = ((*code as f64) / old_factor * new_factor) as u16;
        }
    }

    fn check_measurements(&self, basin: &Basin, measurements: &[Measurement]) -> CoreResult<()> {
        for measurement in measurements {
            self.check_location(measurement, basin)?;
            self.check_proximity(measurement, basin)?;
        }
        Ok(())
    }

    fn check_location(&self, measurement: &Measurement, basin: &Basin) -> CoreResult<()> {
        let coo = measurement.coo();
        let point = geo::Point::new(coo.lon, coo.lat);
        if basin.contains_point(point) {
            return Err(CoreError::InvalidMeasurementLocation);
        }
        Ok(())
    }

    fn check_proximity(&self, measurement: &Measurement, basin: &Basin) -> CoreResult<()> {
        use geo::EuclideanDistance;

        let coo = measurement.coo();
        let point = geo::Point::new(coo.lon, coo.lat);
        let proximate = basin
            .shoreline()
            .iter()
            .any(|segment| point.euclidean_distance(segment) <= self.measurement_proximity);
        if !proximate {
            return Err(CoreError::ExceedingMeasurementProximity {
                proximity: self.measurement_proximity,
            });
        }
        Ok(())
    }

    /// Writes the current raster codes out as a single-band GeoTIFF.
    pub fn write(&self, path: &std::path::Path) -> CoreResult<()> {
        write_u16_raster(path, self.width, self.height, &self.data)
    }
}

fn average_surface_activity(measurements: &[Measurement], contamination_depth: f64) -> f64 {
    let sum: f64 = measurements.iter().map(|m| m.activity().surface_1cm()).sum();
    sum * contamination_depth / measurements.len() as f64
}

fn cell_polygon(center_x: f64, center_y: f64, step: f64) -> Polygon<f64> {
    let half = step / 2.0;
    Polygon::new(
        geo::LineString::from(vec![
            (center_x - half, center_y - half),
            (center_x + half, center_y - half),
            (center_x + half, center_y + half),
            (center_x - half, center_y + half),
            (center_x - half, center_y - half),
        ]),
        vec![],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blowout_flow_increases_with_specific_activity() {
        let low = blowout_activity_flow(100.0, 10.0);
        let high = blowout_activity_flow(1000.0, 10.0);
        assert!(high > low);
    }

    #[test]
    fn rejects_step_exceeding_the_bounding_box() {
        let ul = Coordinate::new(0.0, 0.0, "EPSG:3857");
        let lr = Coordinate::new(1.0, -1.0, "EPSG:3857");
        let err = ActivityMap::new(ul, lr, 100.0, "Cs-137").unwrap_err();
        assert!(matches!(err, CoreError::ExceedingStep { .. }));
    }

    #[test]
    fn builds_an_empty_map_with_the_expected_grid() {
        let ul = Coordinate::new(0.0, 100.0, "EPSG:3857");
        let lr = Coordinate::new(100.0, 0.0, "EPSG:3857");
        let map = ActivityMap::new(ul, lr, 10.0, "Cs-137").unwrap();
        assert_eq!((map.width(), map.height()), (10, 10));
        assert_eq!(map.cell_activity(0, 0), 0.0);
    }
}
