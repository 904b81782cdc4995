//! Basin extraction: tracing water-body polygons and their shoreline out
//! of the classified raster, and looking basins up by point or name.

pub mod basin;
pub mod contour;
pub mod extractor;

pub use basin::Basin;
pub use extractor::{BasinExtractor, DEFAULT_APPROX_ERROR};
