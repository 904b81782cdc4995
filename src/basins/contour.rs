//! External contour tracing over a classified raster mask, matching the
//! output shape of `cv2.findContours(..., RETR_EXTERNAL, CHAIN_APPROX_NONE)`
//! followed by `cv2.approxPolyDP`: one closed pixel contour per connected
//! foreground component, simplified with Douglas-Peucker.

use geo::{Coord, LineString, Simplify};

use crate::geo::raster::{AffineTransform, ClassifiedRaster};

/// Clockwise Moore neighborhood, starting due east.
const NEIGHBORS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Traces the external boundary of every connected foreground component
/// in `raster`, returning one closed `(row, col)` contour per component.
pub fn find_contours(raster: &ClassifiedRaster) -> Vec<Vec<(usize, usize)>> {
    let width = raster.width as i32;
    let height = raster.height as i32;
    let is_foreground = |row: i32, col: i32| -> bool {
        row >= 0 && row < height && col >= 0 && col < width && raster.get(row as usize, col as usize) == 255
    };

    let mut visited = vec![false; (width * height) as usize];
    let mut contours = Vec::new();

    for row in 0..height {
        for col in 0..width {
            let idx = (row * width + col) as usize;
            if !is_foreground(row, col) || visited[idx] {
                continue;
            }
            // Only start a trace where the west neighbor is background:
            // that's the leftmost foreground pixel of its row run, which
            // guarantees one trace per external boundary rather than one
            // per interior pixel.
            if is_foreground(row, col - 1) {
                continue;
            }
            let contour = trace_boundary(row, col, &is_foreground);
            for &(r, c) in &contour {
                visited[(r * width + c) as usize] = true;
            }
            contours.push(
                contour
                    .into_iter()
                    .map(|(r, c)| (r as usize, c as usize))
                    .collect(),
            );
        }
    }
    contours
}

/// Moore-neighbor boundary trace with Jacob's stopping criterion: walk
/// clockwise from the direction opposite where we entered each pixel,
/// stop once we re-enter the start pixel from the same direction we
/// started in.
fn trace_boundary(start_row: i32, start_col: i32, is_foreground: &impl Fn(i32, i32) -> bool) -> Vec<(i32, i32)> {
    let start = (start_row, start_col);
    let mut boundary = vec![start];
    let mut current = start;
    // Entered `start` from the west (background neighbor), so begin the
    // search from that direction.
    let mut entry_dir = 4usize;

    loop {
        let mut next = None;
        for step in 1..=8 {
            let dir = (entry_dir + step) % 8;
            let (dr, dc) = NEIGHBORS[dir];
            let candidate = (current.0 + dr, current.1 + dc);
            if is_foreground(candidate.0, candidate.1) {
                next = Some((candidate, dir));
                break;
            }
        }
        let (candidate, dir) = match next {
            Some(v) => v,
            None => break, // isolated single-pixel component
        };
        current = candidate;
        entry_dir = (dir + 4) % 8;
        if current == start && boundary.len() > 1 {
            break;
        }
        boundary.push(current);
        if boundary.len() > boundary.capacity().max(1) * 64 {
            break; // safety valve against pathological masks
        }
    }
    boundary
}

/// Converts a pixel contour (as returned by [`find_contours`]) into world
/// coordinates using each pixel's upper-left corner, matching the
/// original's `img.xy(row, col, offset="ul")` sampling.
pub fn contour_to_line_string(contour: &[(usize, usize)], transform: &AffineTransform) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = contour
        .iter()
        .map(|&(row, col)| {
            let (x, y) = transform.corner(row, col);
            Coord { x, y }
        })
        .collect();
    LineString::new(coords)
}

/// Douglas-Peucker simplification, matching the original's
/// `cv2.approxPolyDP(pix_cnt, approx_error, closed=True)` step. `epsilon`
/// is in the same units as `line`'s coordinates.
pub fn simplify(line: &LineString<f64>, epsilon: f64) -> LineString<f64> {
    line.simplify(&epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::raster::AffineTransform;

    fn raster_from_mask(width: usize, height: usize, mask: Vec<u8>) -> ClassifiedRaster {
        ClassifiedRaster::from_mask(width, height, mask, AffineTransform::new(0.0, 0.0, 1.0), "EPSG:3857")
    }

    #[test]
    fn traces_a_single_square_component() {
        #[rustfmt::skip]
        let mask = vec![
            0, 0, 0, 0,
            0, 255, 255, 0,
            0, 255, 255, 0,
            0, 0, 0, 0,
        ];
        let raster = raster_from_mask(4, 4, mask);
        let contours = find_contours(&raster);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].len() >= 4);
    }

    #[test]
    fn two_disjoint_components_yield_two_contours() {
        #[rustfmt::skip]
        let mask = vec![
            255, 0, 0, 255,
            0, 0, 0, 0,
            255, 0, 0, 255,
        ];
        let raster = raster_from_mask(4, 3, mask);
        assert_eq!(find_contours(&raster).len(), 4);
    }
}
