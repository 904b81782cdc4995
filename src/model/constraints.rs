//! Scenario-level input constraints, separate from the per-field validation
//! done by `Input`'s own setters. A constraint pairs a predicate over a
//! fully-initialized `Input` with a message builder run only on failure.

use crate::error::CoreError;

use super::input::Input;

type Validator = Box<dyn Fn(&Input) -> bool>;
type MessageBuilder = Box<dyn Fn(&Input) -> String>;

pub struct Constraints {
    entries: Vec<(Validator, MessageBuilder)>,
}

impl Constraints {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add(
        &mut self,
        validator: impl Fn(&Input) -> bool + 'static,
        message: impl Fn(&Input) -> String + 'static,
    ) {
        self.entries.push((Box::new(validator), Box::new(message)));
    }

    /// Runs every constraint against `input`, stopping at the first failure.
    pub fn validate(&self, input: &Input) -> Result<(), CoreError> {
        for (validator, message) in &self.entries {
            if !validator(input) {
                return Err(CoreError::constraints_compliance(message(input)));
            }
        }
        Ok(())
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the standard set of scenario constraints: source-to-receptor
/// distance bounds and nuclide coverage against the reference store.
pub fn default_constraints(known_nuclides: Vec<String>) -> Constraints {
    let mut constraints = Constraints::new();

    constraints.add(
        |inp| inp.distance() <= 50_000.0,
        |inp| {
            format!(
                "the distance '{} m' exceeds the maximum allowed '50000 m'",
                inp.distance()
            )
        },
    );

    constraints.add(
        |inp| inp.distance() > inp.square_side() / 2.0,
        |inp| {
            format!(
                "the distance '{} m' should exceed the half of the square side '{} m'",
                inp.distance(),
                inp.square_side() / 2.0
            )
        },
    );

    constraints.add(
        move |inp| {
            inp.specific_activities()
                .keys()
                .all(|nuclide| known_nuclides.contains(nuclide))
        },
        |_| "found specific activity with unknown nuclide".to_string(),
    );

    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::common::{FoodCategory, StabilityClass, TerrainType};
    use std::collections::HashMap;

    fn valid_input() -> Input {
        let mut input = Input::new();
        input.set_distance(100.0).unwrap();
        input.set_square_side(10.0).unwrap();
        input.set_precipitation_rate(0.0).unwrap();
        input
            .set_extreme_windspeeds(StabilityClass::ALL.into_iter().map(|c| (c, 1.0)).collect())
            .unwrap();
        input.set_age(30).unwrap();
        input.set_terrain_type(TerrainType::Agricultural).unwrap();
        input.set_blowout_time(60.0).unwrap();
        input.set_buffer_area_radius(0.0).unwrap();
        input
            .set_adults_annual_food_intake(
                FoodCategory::ALL.into_iter().map(|f| (f, 1.0)).collect::<HashMap<_, _>>(),
            )
            .unwrap();
        input.add_specific_activity("Cs-137", 10.0).unwrap();
        input
    }

    #[test]
    fn accepts_compliant_input() {
        let constraints = default_constraints(vec!["Cs-137".to_string()]);
        assert!(constraints.validate(&valid_input()).is_ok());
    }

    #[test]
    fn rejects_distance_beyond_50km() {
        let mut input = valid_input();
        input.set_distance(60_000.0).unwrap();
        let constraints = default_constraints(vec!["Cs-137".to_string()]);
        assert!(constraints.validate(&input).is_err());
    }

    #[test]
    fn rejects_distance_inside_half_square_side() {
        let mut input = valid_input();
        input.set_square_side(1000.0).unwrap();
        input.set_distance(100.0).unwrap();
        let constraints = default_constraints(vec!["Cs-137".to_string()]);
        assert!(constraints.validate(&input).is_err());
    }

    #[test]
    fn rejects_unknown_nuclide() {
        let constraints = default_constraints(vec!["Sr-90".to_string()]);
        assert!(constraints.validate(&valid_input()).is_err());
    }
}
