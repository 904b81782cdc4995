//! Parses the scenario input JSON (database path, classified raster,
//! basins with their measurements, scalar model parameters and receptor
//! points) into the domain types the rest of the crate works with.

use serde::Deserialize;

use crate::error::CoreResult;
use crate::model::{FoodCategory, Input, StabilityClass, TerrainType};

#[derive(Debug, Deserialize)]
pub struct ScenarioConfig {
    pub database_name: String,
    pub geotiff_filename: String,
    pub basins: Vec<BasinConfig>,
    pub model: ModelConfig,
    #[serde(default)]
    pub points: PointsConfig,
}

#[derive(Debug, Deserialize)]
pub struct BasinConfig {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub measurements: Vec<MeasurementConfig>,
}

#[derive(Debug, Deserialize)]
pub struct MeasurementConfig {
    pub nuclide: String,
    pub specific_activity: f64,
}

#[derive(Debug, Deserialize)]
pub struct WindSpeedEntry {
    pub a_class: StabilityClass,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct FoodIntakeEntry {
    pub food_category: FoodCategory,
    pub intake: f64,
}

#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    pub square_side: f64,
    pub precipitation_rate: f64,
    pub terrain_type: TerrainType,
    pub blowout_time: f64,
    pub age: u32,
    pub soil_density: f64,
    pub buffer_area_radius: f64,
    pub wind_speed: Vec<WindSpeedEntry>,
    pub annual_food_intake: Vec<FoodIntakeEntry>,
}

impl ModelConfig {
    /// Builds the scenario-wide `Input` template: every field except
    /// `distance` and `specific_activities`, which the dose aggregator
    /// fills in per raster cell.
    pub fn to_base_input(&self) -> CoreResult<Input> {
        let mut input = Input::new();
        input.set_square_side(self.square_side)?;
        input.set_precipitation_rate(self.precipitation_rate)?;
        input.set_terrain_type(self.terrain_type)?;
        input.set_blowout_time(self.blowout_time)?;
        input.set_age(self.age)?;
        input.set_buffer_area_radius(self.buffer_area_radius)?;

        let windspeeds = self.wind_speed.iter().map(|entry| (entry.a_class, entry.value)).collect();
        input.set_extreme_windspeeds(windspeeds)?;

        let food_intake = self
            .annual_food_intake
            .iter()
            .map(|entry| (entry.food_category, entry.intake))
            .collect();
        input.set_adults_annual_food_intake(food_intake)?;

        Ok(input)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PointsConfig {
    pub map: Option<MapPoints>,
    pub special: Option<Vec<SpecialPoint>>,
}

#[derive(Debug, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
pub struct MapPoints {
    pub ul: LonLat,
    pub lr: LonLat,
    pub resolution: usize,
}

#[derive(Debug, Deserialize)]
pub struct SpecialPoint {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_scenario() {
        let json = r#"
        {
            "database_name": "data/reference.db",
            "geotiff_filename": "data/classified.tif",
            "basins": [
                {"name": "bay", "lon": 30.1, "lat": 50.2, "measurements": [
                    {"nuclide": "Cs-137", "specific_activity": 1200.0}
                ]}
            ],
            "model": {
                "square_side": 100.0,
                "precipitation_rate": 0.0,
                "terrain_type": "agricultural",
                "blowout_time": 3600.0,
                "age": 30,
                "soil_density": 1.4,
                "buffer_area_radius": 500.0,
                "wind_speed": [
                    {"a_class": "A", "value": 1.0},
                    {"a_class": "B", "value": 1.5},
                    {"a_class": "C", "value": 2.0},
                    {"a_class": "D", "value": 3.0},
                    {"a_class": "E", "value": 2.5},
                    {"a_class": "F", "value": 1.8}
                ],
                "annual_food_intake": [
                    {"food_category": "meat", "intake": 50.0},
                    {"food_category": "milk", "intake": 100.0},
                    {"food_category": "wheat", "intake": 80.0},
                    {"food_category": "cucumbers", "intake": 20.0},
                    {"food_category": "cabbage", "intake": 30.0},
                    {"food_category": "potato", "intake": 90.0}
                ]
            },
            "points": {
                "special": [{"name": "village", "lon": 30.2, "lat": 50.3}]
            }
        }
        "#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.basins.len(), 1);
        assert_eq!(config.points.special.unwrap().len(), 1);
        assert!(config.points.map.is_none());

        let input = config.model.to_base_input().unwrap();
        assert_eq!(input.square_side(), 100.0);
    }
}
