//! Typed accessors over the reference data the model consumes: nuclide
//! properties, age-group physiology, diffusion coefficients, terrain
//! roughness and food-chain accumulation factors. The store is read-only
//! after construction and shared by every worker thread.

pub mod fake;
pub mod tabular;

use crate::error::CoreResult;
use crate::model::common::{FoodCategory, StabilityClass, TerrainType};

pub use tabular::TabularReference;

/// Diffusion coefficients for one atmospheric stability class, release
/// height below 50 m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionCoefficients {
    pub p_z: f64,
    pub q_z: f64,
    pub p_y: f64,
    pub q_y: f64,
}

/// Where a food-chain accumulation factor applies: direct atmospheric
/// deposition onto crops, or uptake through soil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulationSource {
    Atmosphere,
    Soil,
}

/// Read-only accessor over the reference data a dose calculation needs.
/// Implementations load eagerly at construction time; every getter here is
/// infallible except for lookups keyed by caller-supplied identifiers
/// (nuclide name, age), which can fail if the identifier is unknown.
pub trait Reference {
    fn all_nuclides(&self) -> Vec<String>;

    fn radio_decay_coeff(&self, nuclide: &str) -> CoreResult<f64>;

    /// Dose rate decay coefficient due to all processes except
    /// radioactive decay, sec^-1.
    fn dose_rate_decay_coeff(&self) -> f64;

    /// Population residence time in the contaminated region during the
    /// acute phase, sec.
    fn residence_time(&self) -> f64;

    fn nuclide_group(&self, nuclide: &str) -> CoreResult<String>;

    fn cloud_dose_coeff(&self, nuclide: &str) -> CoreResult<f64>;

    fn inhalation_dose_coeff(&self, nuclide: &str) -> CoreResult<f64>;

    fn surface_dose_coeff(&self, nuclide: &str) -> CoreResult<f64>;

    fn respiration_rate(&self, age: u32) -> CoreResult<f64>;

    fn deposition_rate(&self, nuclide: &str) -> CoreResult<f64>;

    fn standard_washing_capacity(&self, nuclide: &str) -> CoreResult<f64>;

    /// Unitless washing capacity for non-standard precipitation types.
    fn unitless_washing_capacity(&self) -> f64;

    fn terrain_roughness(&self, terrain_type: TerrainType) -> CoreResult<f64>;

    fn diffusion_coefficients(&self, class: StabilityClass) -> CoreResult<DiffusionCoefficients>;

    /// Terrain clearance, m.
    fn terrain_clearance(&self) -> f64;

    /// Mixing layer height, m.
    fn mixing_layer_height(&self) -> f64;

    /// Id of the age group whose ingestion dose is most sensitive for this
    /// nuclide, used to pick the metabolic-cost reference when scaling its
    /// food intake.
    fn food_critical_age_group(&self, nuclide: &str) -> CoreResult<u32>;

    /// Daily metabolic cost for the age group covering `age`, kcal/day.
    fn daily_metabolic_cost(&self, age: u32) -> CoreResult<f64>;

    /// Daily metabolic cost for the age group identified by `group_id`
    /// (as returned by [`Reference::food_critical_age_group`]), kcal/day.
    fn daily_metabolic_cost_for_group(&self, group_id: u32) -> CoreResult<f64>;

    fn accumulation_factor(
        &self,
        nuclide: &str,
        source: AccumulationSource,
        food: FoodCategory,
    ) -> CoreResult<f64>;

    fn food_categories(&self) -> Vec<FoodCategory> {
        FoodCategory::ALL.to_vec()
    }

    /// Reference age used to look up the adult daily metabolic cost when
    /// scaling the adult annual food intake figures supplied on `Input`.
    fn adult_reference_age(&self) -> u32 {
        30
    }
}
