//! A geographic point carried in a specific CRS, reprojected on demand, and
//! the great-circle distance between two such points.

use geo::{GeodesicDistance, Point};
use proj::Proj;

use crate::error::CoreResult;

/// Longitude/latitude pair tagged with the CRS it's expressed in. Most
/// inputs arrive in `EPSG:4326`; basin and raster work happens in
/// `EPSG:3857`, which is flat enough over the few-hundred-km scenarios
/// this crate covers for cell intersection math to be simple Euclidean
/// polygon area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
    pub crs: &'static str,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64, crs: &'static str) -> Self {
        Self { lon, lat, crs }
    }

    /// Reprojects this coordinate into `target_crs` in place. A no-op if
    /// it's already there.
    pub fn transform(&mut self, target_crs: &'static str) -> CoreResult<()> {
        if self.crs == target_crs {
            return Ok(());
        }
        let proj = Proj::new_known_crs(self.crs, target_crs, None)?;
        let (lon, lat) = proj.convert((self.lon, self.lat))?;
        self.lon = lon;
        self.lat = lat;
        self.crs = target_crs;
        Ok(())
    }

    /// Returns a copy reprojected into `target_crs`, leaving `self` as is.
    pub fn transformed(&self, target_crs: &'static str) -> CoreResult<Self> {
        let mut copy = *self;
        copy.transform(target_crs)?;
        Ok(copy)
    }
}

/// Great-circle distance between two points on the WGS84 ellipsoid, in
/// meters. Both coordinates are reprojected to `EPSG:4326` first, so
/// callers can pass points in whatever CRS they hold.
pub fn distance(a: Coordinate, b: Coordinate) -> CoreResult<f64> {
    let a = a.transformed("EPSG:4326")?;
    let b = b.transformed("EPSG:4326")?;
    let pa = Point::new(a.lon, a.lat);
    let pb = Point::new(b.lon, b.lat);
    Ok(pa.geodesic_distance(&pb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let a = Coordinate::new(30.0, 50.0, "EPSG:4326");
        assert_eq!(distance(a, a).unwrap(), 0.0);
    }

    #[test]
    fn transform_to_same_crs_is_a_no_op() {
        let mut coo = Coordinate::new(30.0, 50.0, "EPSG:4326");
        coo.transform("EPSG:4326").unwrap();
        assert_eq!(coo, Coordinate::new(30.0, 50.0, "EPSG:4326"));
    }
}
