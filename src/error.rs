use thiserror::Error;

use crate::model::formulas::FormulaError;

/// Errors raised by the dose-field pipeline: basin extraction, activity
/// raster construction, reference lookups and I/O at the process boundary.
/// Errors internal to the pure formula/lazy-graph layer live in
/// [`FormulaError`] and arrive here through the `Formula` variant.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An activity map's cell size doesn't fit inside its bounding box.
    #[error("raster step {step} exceeds one of the map dimensions")]
    ExceedingStep { step: f64 },

    /// A measurement's coordinate falls inside the basin's water body
    /// instead of on the shore.
    #[error("measurement location is not valid: falls inside the basin body")]
    InvalidMeasurementLocation,

    /// A measurement is farther from every shoreline segment than the
    /// configured proximity tolerance.
    #[error("measurement exceeds proximity {proximity}m to the nearest shoreline segment")]
    ExceedingMeasurementProximity { proximity: f64 },

    /// An `Input` value failed one of the registered scenario constraints.
    #[error("input fails constraint: {message}")]
    ConstraintsCompliance { message: String },

    /// A named basin could not be located in the classified raster.
    #[error("basin not found: {0}")]
    BasinNotFound(String),

    /// A candidate basin body doesn't fit inside the raster's own bounding
    /// contour, or is equal to it (the whole map classified as one basin,
    /// not an actual water body).
    #[error("doesn't contain basin")]
    OutOfMap,

    /// An `Input` setter rejected the value it was given.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A nuclide name does not appear in the reference store.
    #[error("unknown nuclide: {0}")]
    UnknownNuclide(String),

    /// An age isn't covered by any age-group row.
    #[error("age {age} is not covered by any age group")]
    UncoveredAge { age: u32 },

    /// Error from the pure formula / lazy-evaluation layer.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reference store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("reprojection error: {0}")]
    Proj(#[from] proj::ProjCreateError),

    #[error("coordinate transform error: {0}")]
    Transform(#[from] proj::ProjError),

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("raster codec error: {0}")]
    Raster(String),
}

impl CoreError {
    pub fn constraints_compliance<T: Into<String>>(message: T) -> Self {
        Self::ConstraintsCompliance {
            message: message.into(),
        }
    }

    pub fn raster<T: Into<String>>(message: T) -> Self {
        Self::Raster(message.into())
    }

    pub fn invalid_input<T: Into<String>>(message: T) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_messages() {
        let err = CoreError::constraints_compliance("distance exceeds 50000m");
        assert!(err.to_string().contains("distance exceeds 50000m"));
    }

    #[test]
    fn wraps_formula_errors() {
        let err: CoreError = FormulaError::UnknownNuclide("Xx-000".into()).into();
        assert_eq!(err.to_string(), "unknown nuclide: Xx-000");
    }
}
