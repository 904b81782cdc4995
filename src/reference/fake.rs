//! In-memory `Reference` implementation for tests: a handful of nuclides
//! and a single age group, with values lifted from the teacher's
//! regulatory-guide worked examples rather than any real survey data.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::model::common::{FoodCategory, StabilityClass, TerrainType};

use super::{AccumulationSource, DiffusionCoefficients, Reference};

#[derive(Debug, Clone)]
struct FakeNuclide {
    group: &'static str,
    decay_coeff: f64,
    r_cloud: f64,
    r_inh: f64,
    r_surface: f64,
    deposition_rate: f64,
    standard_washing_capacity: f64,
    food_critical_age_group: u32,
}

pub struct FakeReference {
    nuclides: HashMap<&'static str, FakeNuclide>,
}

impl FakeReference {
    pub fn new() -> Self {
        let mut nuclides = HashMap::new();
        nuclides.insert(
            "Cs-137",
            FakeNuclide {
                group: "aerosol",
                decay_coeff: 7.3e-10,
                r_cloud: 5.1e-14,
                r_inh: 4.6e-9,
                r_surface: 1.35e-13,
                deposition_rate: 8e-3,
                standard_washing_capacity: 1e-5,
                food_critical_age_group: 1,
            },
        );
        nuclides.insert(
            "I-131",
            FakeNuclide {
                group: "aerosol",
                decay_coeff: 9.98e-7,
                r_cloud: 1.25e-14,
                r_inh: 7.4e-9,
                r_surface: 2.9e-14,
                deposition_rate: 1e-2,
                standard_washing_capacity: 1e-5,
                food_critical_age_group: 1,
            },
        );
        nuclides.insert(
            "Kr-85",
            FakeNuclide {
                group: "IRG",
                decay_coeff: 2.05e-9,
                r_cloud: 8.7e-16,
                r_inh: 0.0,
                r_surface: 0.0,
                deposition_rate: 0.0,
                standard_washing_capacity: 0.0,
                food_critical_age_group: 1,
            },
        );
        Self { nuclides }
    }

    fn nuclide(&self, nuclide: &str) -> CoreResult<&FakeNuclide> {
        self.nuclides
            .get(nuclide)
            .ok_or_else(|| CoreError::UnknownNuclide(nuclide.to_string()))
    }
}

impl Default for FakeReference {
    fn default() -> Self {
        Self::new()
    }
}

impl Reference for FakeReference {
    fn all_nuclides(&self) -> Vec<String> {
        self.nuclides.keys().map(|s| s.to_string()).collect()
    }

    fn radio_decay_coeff(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.decay_coeff)
    }

    fn dose_rate_decay_coeff(&self) -> f64 {
        1.27e-9
    }

    fn residence_time(&self) -> f64 {
        3.15e7
    }

    fn nuclide_group(&self, nuclide: &str) -> CoreResult<String> {
        Ok(self.nuclide(nuclide)?.group.to_string())
    }

    fn cloud_dose_coeff(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.r_cloud)
    }

    fn inhalation_dose_coeff(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.r_inh)
    }

    fn surface_dose_coeff(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.r_surface)
    }

    fn respiration_rate(&self, age: u32) -> CoreResult<f64> {
        if age > 120 {
            return Err(CoreError::UncoveredAge { age });
        }
        Ok(2.66e-4)
    }

    fn deposition_rate(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.deposition_rate)
    }

    fn standard_washing_capacity(&self, nuclide: &str) -> CoreResult<f64> {
        let row = self.nuclide(nuclide)?;
        Ok(if row.group == "IRG" {
            0.0
        } else {
            row.standard_washing_capacity
        })
    }

    fn unitless_washing_capacity(&self) -> f64 {
        5.0
    }

    fn terrain_roughness(&self, terrain_type: TerrainType) -> CoreResult<f64> {
        Ok(match terrain_type {
            TerrainType::Greenland => 0.03,
            TerrainType::Agricultural => 0.1,
            TerrainType::Forest => 1.0,
            TerrainType::Settlement => 0.5,
        })
    }

    fn diffusion_coefficients(&self, class: StabilityClass) -> CoreResult<DiffusionCoefficients> {
        Ok(match class {
            StabilityClass::A => DiffusionCoefficients { p_z: 0.112, q_z: 1.061, p_y: 0.443, q_y: 0.894 },
            StabilityClass::B => DiffusionCoefficients { p_z: 0.130, q_z: 0.950, p_y: 0.324, q_y: 0.894 },
            StabilityClass::C => DiffusionCoefficients { p_z: 0.112, q_z: 0.912, p_y: 0.216, q_y: 0.894 },
            StabilityClass::D => DiffusionCoefficients { p_z: 0.098, q_z: 0.838, p_y: 0.141, q_y: 0.894 },
            StabilityClass::E => DiffusionCoefficients { p_z: 0.0609, q_z: 0.814, p_y: 0.105, q_y: 0.894 },
            StabilityClass::F => DiffusionCoefficients { p_z: 0.0638, q_z: 0.718, p_y: 0.071, q_y: 0.894 },
        })
    }

    fn terrain_clearance(&self) -> f64 {
        1.0
    }

    fn mixing_layer_height(&self) -> f64 {
        100.0
    }

    fn food_critical_age_group(&self, nuclide: &str) -> CoreResult<u32> {
        Ok(self.nuclide(nuclide)?.food_critical_age_group)
    }

    fn daily_metabolic_cost(&self, age: u32) -> CoreResult<f64> {
        if age > 120 {
            return Err(CoreError::UncoveredAge { age });
        }
        Ok(2500.0)
    }

    fn daily_metabolic_cost_for_group(&self, group_id: u32) -> CoreResult<f64> {
        if group_id != 1 {
            return Err(CoreError::raster(format!("unknown age group id '{group_id}'")));
        }
        Ok(2500.0)
    }

    fn accumulation_factor(
        &self,
        nuclide: &str,
        _source: AccumulationSource,
        _food: FoodCategory,
    ) -> CoreResult<f64> {
        self.nuclide(nuclide)?;
        Ok(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irg_nuclide_has_zero_washing_capacity() {
        let reference = FakeReference::new();
        assert_eq!(reference.standard_washing_capacity("Kr-85").unwrap(), 0.0);
    }

    #[test]
    fn unknown_nuclide_is_rejected() {
        let reference = FakeReference::new();
        assert!(reference.radio_decay_coeff("Xx-000").is_err());
    }
}
