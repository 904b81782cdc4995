//! Coordinates, raster I/O and the contour tracing used to carve basin
//! polygons out of the classified shoreline raster.

pub mod coordinate;
pub mod raster;

pub use coordinate::{distance, Coordinate};
pub use raster::{AffineTransform, ClassifiedRaster};
