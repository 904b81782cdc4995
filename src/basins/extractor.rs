//! Builds every [`Basin`] present in a classified raster and answers
//! "which basin contains this point" lookups, matching the original's
//! `BasinsFinder`.

use geo::{LineString, Point};

use crate::error::{CoreError, CoreResult};
use crate::geo::coordinate::Coordinate;
use crate::geo::raster::ClassifiedRaster;

use super::basin::Basin;
use super::contour::{contour_to_line_string, find_contours, simplify};

/// Default Douglas-Peucker epsilon, in pixels, matching the original's
/// `approx_error=3`.
pub const DEFAULT_APPROX_ERROR: f64 = 3.0;

pub struct BasinExtractor {
    basins: Vec<Basin>,
    crs: String,
}

impl BasinExtractor {
    /// Traces, simplifies and assembles every basin present in
    /// `raster`'s mask.
    pub fn build(raster: &ClassifiedRaster, approx_error: f64) -> Self {
        let map_contour = map_bounding_contour(raster);
        let basins = find_contours(raster)
            .into_iter()
            .filter_map(|pixel_contour| {
                let line = contour_to_line_string(&pixel_contour, &raster.transform);
                let simplified = simplify(&line, approx_error);
                if simplified.coords_count() < 3 {
                    return None;
                }
                match Basin::new(simplified, Some(&map_contour)) {
                    Ok(basin) => Some(basin),
                    Err(error) => {
                        tracing::warn!(%error, "skipping candidate basin");
                        None
                    }
                }
            })
            .collect();
        Self {
            basins,
            crs: raster.crs.clone(),
        }
    }

    pub fn basins(&self) -> &[Basin] {
        &self.basins
    }

    /// Returns the basin containing `coo`, reprojecting it into the
    /// raster's CRS first.
    pub fn get_basin(&self, coo: Coordinate) -> CoreResult<Option<&Basin>> {
        let crs = leak_crs(&self.crs);
        let projected = coo.transformed(crs)?;
        let point = Point::new(projected.lon, projected.lat);
        Ok(self.basins.iter().find(|basin| basin.contains_point(point)))
    }

    /// Looks up a basin by name against a caller-supplied name table,
    /// for scenarios that address basins by a label rather than a point.
    pub fn named_basin<'a>(&'a self, names: &'a [(String, usize)], name: &str) -> CoreResult<&'a Basin> {
        names
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, idx)| self.basins.get(*idx))
            .ok_or_else(|| CoreError::BasinNotFound(name.to_string()))
    }
}

fn map_bounding_contour(raster: &ClassifiedRaster) -> LineString<f64> {
    let (left, top) = raster.transform.corner(0, 0);
    let (right, bottom) = raster.transform.corner(raster.height, raster.width);
    LineString::from(vec![
        (left, top),
        (left, bottom),
        (right, bottom),
        (right, top),
        (left, top),
    ])
}

/// The CRS strings this crate deals with (`EPSG:4326`, `EPSG:3857`) are
/// always one of a small fixed set; interning through `Box::leak` keeps
/// `Coordinate::crs` a `&'static str` without introducing a lifetime
/// parameter that would ripple through every basin query.
fn leak_crs(crs: &str) -> &'static str {
    match crs {
        "EPSG:4326" => "EPSG:4326",
        "EPSG:3857" => "EPSG:3857",
        other => Box::leak(other.to_string().into_boxed_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::raster::AffineTransform;

    #[test]
    fn finds_the_basin_containing_a_point() {
        #[rustfmt::skip]
        let mask = vec![
            0, 0, 0, 0, 0,
            0, 255, 255, 255, 0,
            0, 255, 255, 255, 0,
            0, 255, 255, 255, 0,
            0, 0, 0, 0, 0,
        ];
        let raster = ClassifiedRaster::from_mask(5, 5, mask, AffineTransform::new(0.0, 0.0, 1.0), "EPSG:3857");
        let extractor = BasinExtractor::build(&raster, 0.1);
        assert_eq!(extractor.basins().len(), 1);

        let inside = Coordinate::new(2.5, -2.5, "EPSG:3857");
        assert!(extractor.get_basin(inside).unwrap().is_some());

        let outside = Coordinate::new(100.0, -100.0, "EPSG:3857");
        assert!(extractor.get_basin(outside).unwrap().is_none());
    }
}
