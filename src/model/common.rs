//! Small fixed vocabularies shared across the input, reference and formula
//! layers: atmospheric stability classes, terrain types and food categories.
//! Kept as plain enums rather than string-keyed maps — see SPEC_FULL.md's
//! notes on collapsing the source's dynamic key-value map pattern.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pasquill-Gifford atmospheric stability class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StabilityClass {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl StabilityClass {
    pub const ALL: [StabilityClass; 6] = [
        StabilityClass::A,
        StabilityClass::B,
        StabilityClass::C,
        StabilityClass::D,
        StabilityClass::E,
        StabilityClass::F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityClass::A => "A",
            StabilityClass::B => "B",
            StabilityClass::C => "C",
            StabilityClass::D => "D",
            StabilityClass::E => "E",
            StabilityClass::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(StabilityClass::A),
            "B" => Some(StabilityClass::B),
            "C" => Some(StabilityClass::C),
            "D" => Some(StabilityClass::D),
            "E" => Some(StabilityClass::E),
            "F" => Some(StabilityClass::F),
            _ => None,
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying terrain type, used to look up surface roughness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Greenland,
    Agricultural,
    Forest,
    Settlement,
}

impl TerrainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainType::Greenland => "greenland",
            TerrainType::Agricultural => "agricultural",
            TerrainType::Forest => "forest",
            TerrainType::Settlement => "settlement",
        }
    }
}

/// Food category contributing to the ingestion dose pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Meat,
    Milk,
    Wheat,
    Cucumbers,
    Cabbage,
    Potato,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 6] = [
        FoodCategory::Meat,
        FoodCategory::Milk,
        FoodCategory::Wheat,
        FoodCategory::Cucumbers,
        FoodCategory::Cabbage,
        FoodCategory::Potato,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Meat => "meat",
            FoodCategory::Milk => "milk",
            FoodCategory::Wheat => "wheat",
            FoodCategory::Cucumbers => "cucumbers",
            FoodCategory::Cabbage => "cabbage",
            FoodCategory::Potato => "potato",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_class_round_trips_through_str() {
        for class in StabilityClass::ALL {
            assert_eq!(StabilityClass::parse(class.as_str()), Some(class));
        }
    }
}
