//! A single water body: its closed polygon body and the shoreline
//! segments that bound it, with the portion of the boundary that merely
//! coincides with the raster's own edge (not a real shore) cut out.

use geo::{Contains, Coord, LineString, Point, Polygon};

use crate::error::{CoreError, CoreResult};

/// Map-edge coincidence tolerance, meters. A body-ring vertex within this
/// distance of the raster's bounding rectangle is treated as an artifact
/// of the raster's coverage cutoff rather than a true shoreline point.
const MAP_EDGE_TOLERANCE: f64 = 1e-6;

/// Default width of the contamination strip adjacent to a basin's
/// shoreline, meters.
pub const DEFAULT_SHORELINE_WIDTH: f64 = 2.0;

/// A water body extracted from the classified raster: its closed polygon
/// and the one or more open line segments of its boundary that are an
/// actual shore (as opposed to a cut where the raster simply stops).
#[derive(Debug, Clone)]
pub struct Basin {
    body: Polygon<f64>,
    shoreline: Vec<LineString<f64>>,
    shoreline_width: f64,
}

impl Basin {
    /// Builds a basin from its traced, simplified contour, with the
    /// default shoreline width. `map_contour` is the raster's own
    /// bounding rectangle in the same coordinate space; when absent, the
    /// whole contour is treated as shoreline (used for basins known not
    /// to touch the raster edge).
    ///
    /// Fails with [`CoreError::OutOfMap`] when `map_contour` is given and
    /// its bounding polygon doesn't contain the candidate body, or the
    /// body is the map extent itself (not an actual water body).
    pub fn new(contour: LineString<f64>, map_contour: Option<&LineString<f64>>) -> CoreResult<Self> {
        Self::with_shoreline_width(contour, map_contour, DEFAULT_SHORELINE_WIDTH)
    }

    pub fn with_shoreline_width(
        contour: LineString<f64>,
        map_contour: Option<&LineString<f64>>,
        shoreline_width: f64,
    ) -> CoreResult<Self> {
        let body = Polygon::new(contour.clone(), vec![]);

        if let Some(map_contour) = map_contour {
            if contour == *map_contour {
                return Err(CoreError::OutOfMap);
            }
            let map_body = Polygon::new(map_contour.clone(), vec![]);
            if !map_body.contains(&body) {
                return Err(CoreError::OutOfMap);
            }
        }

        let shoreline = match map_contour {
            None => vec![contour],
            Some(map_contour) => split_at_map_edge(&contour, map_contour),
        };

        Ok(Self {
            body,
            shoreline,
            shoreline_width,
        })
    }

    pub fn shoreline_width(&self) -> f64 {
        self.shoreline_width
    }

    pub fn body(&self) -> &Polygon<f64> {
        &self.body
    }

    pub fn shoreline(&self) -> &[LineString<f64>] {
        &self.shoreline
    }

    pub fn shoreline_segments_count(&self) -> usize {
        self.shoreline.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shoreline.len() == 1 && self.shoreline[0].is_closed()
    }

    pub fn contains_point(&self, point: Point<f64>) -> bool {
        self.body.contains(&point)
    }
}

/// Splits `contour` into the runs of consecutive vertices that aren't
/// coincident with `map_contour`, matching the original's
/// `body_contour.difference(map_contour)`: a basin wholly inside the
/// raster keeps its full ring as one closed shoreline, while a basin
/// that touches the raster's edge loses the touching vertices and is
/// left with the remaining open segments as its real shore.
fn split_at_map_edge(contour: &LineString<f64>, map_contour: &LineString<f64>) -> Vec<LineString<f64>> {
    let on_edge: Vec<bool> = contour
        .coords()
        .map(|c| near_any_edge(*c, map_contour))
        .collect();

    if on_edge.iter().all(|&b| !b) {
        return vec![contour.clone()];
    }

    let coords: Vec<Coord<f64>> = contour.coords().copied().collect();
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (coord, &edge) in coords.iter().zip(on_edge.iter()) {
        if edge {
            if current.len() > 1 {
                segments.push(LineString::new(std::mem::take(&mut current)));
            } else {
                current.clear();
            }
            continue;
        }
        current.push(*coord);
    }
    if current.len() > 1 {
        segments.push(LineString::new(current));
    }
    segments
}

fn near_any_edge(coord: Coord<f64>, map_contour: &LineString<f64>) -> bool {
    let edges: Vec<_> = map_contour.lines().collect();
    edges.iter().any(|line| distance_to_segment(coord, line.start, line.end) <= MAP_EDGE_TOLERANCE)
}

fn distance_to_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let (proj_x, proj_y) = (a.x + t * dx, a.y + t * dy);
    ((p.x - proj_x).powi(2) + (p.y - proj_y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> LineString<f64> {
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
    }

    #[test]
    fn basin_wholly_inside_map_keeps_one_closed_shoreline() {
        let contour = square(1.0, 1.0, 2.0, 2.0);
        let map_contour = square(0.0, 0.0, 10.0, 10.0);
        let basin = Basin::new(contour, Some(&map_contour)).unwrap();
        assert_eq!(basin.shoreline_segments_count(), 1);
        assert!(basin.is_closed());
    }

    #[test]
    fn basin_touching_map_edge_loses_the_touching_vertices() {
        let contour = square(0.0, 0.0, 2.0, 2.0);
        let map_contour = square(0.0, 0.0, 10.0, 10.0);
        let basin = Basin::new(contour, Some(&map_contour)).unwrap();
        assert!(basin.shoreline_segments_count() >= 1);
        assert!(!basin.is_closed());
    }

    #[test]
    fn contains_point_delegates_to_the_body_polygon() {
        let contour = square(0.0, 0.0, 10.0, 10.0);
        let basin = Basin::new(contour, None).unwrap();
        assert!(basin.contains_point(Point::new(5.0, 5.0)));
        assert!(!basin.contains_point(Point::new(50.0, 50.0)));
    }

    #[test]
    fn basin_equal_to_map_extent_is_rejected() {
        let contour = square(0.0, 0.0, 10.0, 10.0);
        let map_contour = square(0.0, 0.0, 10.0, 10.0);
        let err = Basin::new(contour, Some(&map_contour)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfMap));
    }

    #[test]
    fn basin_body_outside_map_is_rejected() {
        let contour = square(5.0, 5.0, 20.0, 20.0);
        let map_contour = square(0.0, 0.0, 10.0, 10.0);
        let err = Basin::new(contour, Some(&map_contour)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfMap));
    }
}
