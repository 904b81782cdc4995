//! Validated parameter bundle for a single dose calculation. Each setter
//! runs its own predicate before storing the value; there is no
//! string-keyed generic map underneath, just a struct of `Option` fields —
//! see SPEC_FULL.md's note on collapsing the source's dynamic map pattern.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};

use super::common::{FoodCategory, StabilityClass, TerrainType};

#[derive(Debug, Clone, Default)]
pub struct Input {
    distance: Option<f64>,
    square_side: Option<f64>,
    specific_activities: HashMap<String, f64>,
    precipitation_rate: Option<f64>,
    extreme_windspeeds: Option<HashMap<StabilityClass, f64>>,
    age: Option<u32>,
    terrain_type: Option<TerrainType>,
    blowout_time: Option<f64>,
    buffer_area_radius: Option<f64>,
    adults_annual_food_intake: Option<HashMap<FoodCategory, f64>>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff every scalar field has been set and at least one specific
    /// activity has been recorded.
    pub fn initialized(&self) -> bool {
        self.distance.is_some()
            && self.square_side.is_some()
            && self.precipitation_rate.is_some()
            && self.extreme_windspeeds.is_some()
            && self.age.is_some()
            && self.terrain_type.is_some()
            && self.blowout_time.is_some()
            && self.buffer_area_radius.is_some()
            && self.adults_annual_food_intake.is_some()
            && !self.specific_activities.is_empty()
    }

    pub fn distance(&self) -> f64 {
        self.distance.expect("distance not set")
    }

    pub fn set_distance(&mut self, value: f64) -> CoreResult<()> {
        if value < 0.0 {
            return Err(CoreError::invalid_input(format!("invalid distance '{value} m'")));
        }
        self.distance = Some(value);
        Ok(())
    }

    pub fn square_side(&self) -> f64 {
        self.square_side.expect("square_side not set")
    }

    pub fn set_square_side(&mut self, value: f64) -> CoreResult<()> {
        if value < 0.0 {
            return Err(CoreError::invalid_input(format!(
                "invalid square side '{value} m'"
            )));
        }
        self.square_side = Some(value);
        Ok(())
    }

    pub fn specific_activities(&self) -> &HashMap<String, f64> {
        &self.specific_activities
    }

    pub fn nuclides(&self) -> Vec<String> {
        self.specific_activities.keys().cloned().collect()
    }

    pub fn add_specific_activity(&mut self, nuclide: &str, specific_activity: f64) -> CoreResult<()> {
        if specific_activity <= 0.0 {
            return Err(CoreError::invalid_input(format!(
                "invalid specific_activity '{specific_activity} Bq' for '{nuclide}'"
            )));
        }
        self.specific_activities
            .insert(nuclide.to_string(), specific_activity);
        Ok(())
    }

    pub fn precipitation_rate(&self) -> f64 {
        self.precipitation_rate.expect("precipitation_rate not set")
    }

    pub fn set_precipitation_rate(&mut self, value: f64) -> CoreResult<()> {
        if value < 0.0 {
            return Err(CoreError::invalid_input(format!(
                "invalid precipitation rate '{value} mm/hr'"
            )));
        }
        self.precipitation_rate = Some(value);
        Ok(())
    }

    pub fn extreme_windspeeds(&self) -> &HashMap<StabilityClass, f64> {
        self.extreme_windspeeds
            .as_ref()
            .expect("extreme_windspeeds not set")
    }

    pub fn set_extreme_windspeeds(&mut self, values: HashMap<StabilityClass, f64>) -> CoreResult<()> {
        if values.len() != StabilityClass::ALL.len()
            || !StabilityClass::ALL.iter().all(|c| values.contains_key(c))
        {
            return Err(CoreError::invalid_input(
                "given wind speeds don't provide every atmospheric stability class",
            ));
        }
        self.extreme_windspeeds = Some(values);
        Ok(())
    }

    pub fn age(&self) -> u32 {
        self.age.expect("age not set")
    }

    pub fn set_age(&mut self, value: u32) -> CoreResult<()> {
        self.age = Some(value);
        Ok(())
    }

    pub fn terrain_type(&self) -> TerrainType {
        self.terrain_type.expect("terrain_type not set")
    }

    pub fn set_terrain_type(&mut self, value: TerrainType) -> CoreResult<()> {
        self.terrain_type = Some(value);
        Ok(())
    }

    pub fn blowout_time(&self) -> f64 {
        self.blowout_time.expect("blowout_time not set")
    }

    pub fn set_blowout_time(&mut self, value: f64) -> CoreResult<()> {
        if value <= 0.0 {
            return Err(CoreError::invalid_input(format!(
                "invalid wind operation '{value} sec'"
            )));
        }
        self.blowout_time = Some(value);
        Ok(())
    }

    pub fn buffer_area_radius(&self) -> f64 {
        self.buffer_area_radius.expect("buffer_area_radius not set")
    }

    pub fn set_buffer_area_radius(&mut self, value: f64) -> CoreResult<()> {
        if value < 0.0 {
            return Err(CoreError::invalid_input(format!(
                "invalid buffer area radius '{value} m'"
            )));
        }
        self.buffer_area_radius = Some(value);
        Ok(())
    }

    pub fn adults_annual_food_intake(&self) -> &HashMap<FoodCategory, f64> {
        self.adults_annual_food_intake
            .as_ref()
            .expect("adults_annual_food_intake not set")
    }

    pub fn set_adults_annual_food_intake(
        &mut self,
        value: HashMap<FoodCategory, f64>,
    ) -> CoreResult<()> {
        if value.len() != FoodCategory::ALL.len()
            || !FoodCategory::ALL.iter().all(|f| value.contains_key(f))
        {
            return Err(CoreError::invalid_input(
                "adults annual food intake doesn't cover every food category",
            ));
        }
        self.adults_annual_food_intake = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_windspeeds() -> HashMap<StabilityClass, f64> {
        StabilityClass::ALL.into_iter().map(|c| (c, 1.0)).collect()
    }

    fn full_food_intake() -> HashMap<FoodCategory, f64> {
        FoodCategory::ALL.into_iter().map(|f| (f, 1.0)).collect()
    }

    #[test]
    fn not_initialized_until_every_field_and_an_activity_are_set() {
        let mut input = Input::new();
        assert!(!input.initialized());

        input.set_distance(100.0).unwrap();
        input.set_square_side(10.0).unwrap();
        input.set_precipitation_rate(0.0).unwrap();
        input.set_extreme_windspeeds(full_windspeeds()).unwrap();
        input.set_age(30).unwrap();
        input.set_terrain_type(TerrainType::Agricultural).unwrap();
        input.set_blowout_time(60.0).unwrap();
        input.set_buffer_area_radius(0.0).unwrap();
        input
            .set_adults_annual_food_intake(full_food_intake())
            .unwrap();
        assert!(!input.initialized());

        input.add_specific_activity("Cs-137", 10.0).unwrap();
        assert!(input.initialized());
    }

    #[test]
    fn rejects_negative_distance() {
        let mut input = Input::new();
        assert!(input.set_distance(-1.0).is_err());
    }

    #[test]
    fn rejects_incomplete_windspeed_map() {
        let mut input = Input::new();
        let mut partial = full_windspeeds();
        partial.remove(&StabilityClass::F);
        assert!(input.set_extreme_windspeeds(partial).is_err());
    }

    #[test]
    fn rejects_non_positive_specific_activity() {
        let mut input = Input::new();
        assert!(input.add_specific_activity("Cs-137", 0.0).is_err());
    }
}
