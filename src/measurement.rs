//! Soil contamination measurements: a specific activity reading converted
//! to the surface activity the activity map accumulates, tagged with the
//! location it was taken at.

use crate::geo::Coordinate;

/// Default soil density used to convert a specific activity (per mass)
/// into a surface activity (per area), g/cm^3.
pub const DEFAULT_SOIL_DENSITY: f64 = 1.4;

/// Specific and surface activity of a contaminated soil sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilActivity {
    specific: f64,
    surface_1cm: f64,
}

impl SoilActivity {
    /// `specific_activity` in Bq/kg, `soil_density` in g/cm^3.
    pub fn new(specific_activity: f64, soil_density: f64) -> Self {
        let volumetric_activity = specific_activity / 1000.0 * soil_density;
        // Volume of a soil slice with width 1 cm and area 1 m^2.
        let volume = 100.0 * 100.0 * 1.0;
        Self {
            specific: specific_activity,
            surface_1cm: volumetric_activity * volume,
        }
    }

    pub fn with_default_density(specific_activity: f64) -> Self {
        Self::new(specific_activity, DEFAULT_SOIL_DENSITY)
    }

    /// Specific activity, Bq/kg.
    pub fn specific(&self) -> f64 {
        self.specific
    }

    /// Surface activity of a 1 cm soil slice over 1 m^2, Bq/m^2 (also
    /// read as the absolute activity of that slice, Bq).
    pub fn surface_1cm(&self) -> f64 {
        self.surface_1cm
    }
}

/// A single activity measurement at a location, used to seed a basin's
/// shoreline with surface activity before discretizing it onto the
/// activity map.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    activity: SoilActivity,
    coo: Coordinate,
}

impl Measurement {
    /// Reprojects `coo` into `EPSG:3857`, the CRS the activity map and
    /// basin geometry work in.
    pub fn new(activity: SoilActivity, mut coo: Coordinate) -> crate::error::CoreResult<Self> {
        coo.transform("EPSG:3857")?;
        Ok(Self { activity, coo })
    }

    pub fn activity(&self) -> SoilActivity {
        self.activity
    }

    pub fn coo(&self) -> Coordinate {
        self.coo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_activity_scales_with_specific_activity_and_density() {
        let soil = SoilActivity::new(1000.0, 1.4);
        assert_eq!(soil.specific(), 1000.0);
        assert!((soil.surface_1cm() - 14000.0).abs() < 1e-9);
    }
}
