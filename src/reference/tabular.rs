//! SQLite-backed reference store. Every table is read once at construction
//! time into in-memory maps keyed by the table's natural primary key; after
//! that the connection is dropped and every getter is a map lookup.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::error::{CoreError, CoreResult};
use crate::model::common::{FoodCategory, StabilityClass, TerrainType};

use super::{AccumulationSource, DiffusionCoefficients, Reference};

#[derive(Debug, Clone)]
struct NuclideRow {
    group: String,
    decay_coeff: f64,
    r_cloud: f64,
    r_inh: f64,
    r_surface: f64,
    deposition_rate: f64,
    standard_washing_capacity: f64,
    food_critical_age_group: u32,
}

#[derive(Debug, Clone)]
struct AgeGroupRow {
    id: u32,
    lower_age: u32,
    upper_age: u32,
    respiration_rate: f64,
    daily_metabolic_cost: f64,
}

pub struct TabularReference {
    nuclides: HashMap<String, NuclideRow>,
    age_groups: Vec<AgeGroupRow>,
    diffusion_coefficients: HashMap<StabilityClass, DiffusionCoefficients>,
    roughness: HashMap<TerrainType, f64>,
    food_ids: HashMap<u32, FoodCategory>,
    accumulation_factors: HashMap<(String, AccumulationSource, FoodCategory), f64>,
    dose_rate_decay_coeff: f64,
    residence_time: f64,
    unitless_washing_capacity: f64,
    terrain_clearance: f64,
    mixing_layer_height: f64,
}

impl TabularReference {
    pub fn open(database_path: &str) -> CoreResult<Self> {
        let conn = Connection::open(database_path)?;
        Ok(Self {
            nuclides: load_nuclides(&conn)?,
            age_groups: load_age_groups(&conn)?,
            diffusion_coefficients: load_diffusion_coefficients(&conn)?,
            roughness: load_roughness(&conn)?,
            food_ids: load_food_ids(&conn)?,
            accumulation_factors: load_accumulation_factors(&conn)?,
            dose_rate_decay_coeff: 1.27e-9,
            residence_time: 3.15e7,
            unitless_washing_capacity: 5.0,
            terrain_clearance: 1.0,
            mixing_layer_height: 100.0,
        })
    }

    fn nuclide(&self, nuclide: &str) -> CoreResult<&NuclideRow> {
        self.nuclides
            .get(nuclide)
            .ok_or_else(|| CoreError::UnknownNuclide(nuclide.to_string()))
    }

    fn age_group(&self, age: u32) -> CoreResult<&AgeGroupRow> {
        self.age_groups
            .iter()
            .find(|g| age >= g.lower_age && age < g.upper_age)
            .ok_or(CoreError::UncoveredAge { age })
    }

    fn age_group_by_id(&self, group_id: u32) -> CoreResult<&AgeGroupRow> {
        self.age_groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| CoreError::raster(format!("unknown age group id '{group_id}'")))
    }
}

fn load_nuclides(conn: &Connection) -> CoreResult<HashMap<String, NuclideRow>> {
    let mut stmt = conn.prepare(
        "SELECT name, \"group\", decay_coeff, R_cloud, R_inh, R_surface, \
         deposition_rate, standard_washing_capacity, food_critical_age_group \
         FROM nuclides",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            NuclideRow {
                group: row.get(1)?,
                decay_coeff: row.get(2)?,
                r_cloud: row.get(3)?,
                r_inh: row.get(4)?,
                r_surface: row.get(5)?,
                deposition_rate: row.get(6)?,
                standard_washing_capacity: row.get(7)?,
                food_critical_age_group: row.get::<_, i64>(8)? as u32,
            },
        ))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (name, value) = row?;
        map.insert(name, value);
    }
    Ok(map)
}

fn load_age_groups(conn: &Connection) -> CoreResult<Vec<AgeGroupRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, lower_age, upper_age, respiration_rate, daily_metabolic_cost FROM age_groups",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AgeGroupRow {
            id: row.get::<_, i64>(0)? as u32,
            lower_age: row.get::<_, i64>(1)? as u32,
            upper_age: row.get::<_, i64>(2)? as u32,
            respiration_rate: row.get(3)?,
            daily_metabolic_cost: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

fn load_diffusion_coefficients(
    conn: &Connection,
) -> CoreResult<HashMap<StabilityClass, DiffusionCoefficients>> {
    let mut stmt =
        conn.prepare("SELECT a_class, p_z, q_z, p_y, q_y FROM diffusion_coefficients")?;
    let rows = stmt.query_map([], |row| {
        let a_class: String = row.get(0)?;
        Ok((
            a_class,
            DiffusionCoefficients {
                p_z: row.get(1)?,
                q_z: row.get(2)?,
                p_y: row.get(3)?,
                q_y: row.get(4)?,
            },
        ))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (a_class, coeffs) = row?;
        let class = StabilityClass::parse(&a_class)
            .ok_or_else(|| CoreError::raster(format!("unknown stability class '{a_class}'")))?;
        map.insert(class, coeffs);
    }
    Ok(map)
}

fn load_roughness(conn: &Connection) -> CoreResult<HashMap<TerrainType, f64>> {
    let mut stmt = conn.prepare("SELECT terrain, roughness FROM roughness")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (terrain, roughness) = row?;
        let terrain_type = match terrain.as_str() {
            "greenland" => TerrainType::Greenland,
            "agricultural" => TerrainType::Agricultural,
            "forest" => TerrainType::Forest,
            "settlement" => TerrainType::Settlement,
            other => return Err(CoreError::raster(format!("unknown terrain type '{other}'"))),
        };
        map.insert(terrain_type, roughness);
    }
    Ok(map)
}

fn load_food_ids(conn: &Connection) -> CoreResult<HashMap<u32, FoodCategory>> {
    let mut stmt = conn.prepare("SELECT id, category FROM food")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)? as u32, row.get::<_, String>(1)?))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (id, category) = row?;
        let food_category = match category.as_str() {
            "meat" => FoodCategory::Meat,
            "milk" => FoodCategory::Milk,
            "wheat" => FoodCategory::Wheat,
            "cucumbers" => FoodCategory::Cucumbers,
            "cabbage" => FoodCategory::Cabbage,
            "potato" => FoodCategory::Potato,
            other => return Err(CoreError::raster(format!("unknown food category '{other}'"))),
        };
        map.insert(id, food_category);
    }
    Ok(map)
}

fn load_accumulation_factors(
    conn: &Connection,
) -> CoreResult<HashMap<(String, AccumulationSource, FoodCategory), f64>> {
    let food_ids = load_food_ids(conn)?;
    let mut stmt = conn.prepare(
        "SELECT nuclide, accumulation_source, food_id, accumulation_factor FROM accumulation_factors",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)? as u32,
            row.get::<_, f64>(3)?,
        ))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (nuclide, source, food_id, factor) = row?;
        let source = match source.as_str() {
            "atmosphere" => AccumulationSource::Atmosphere,
            "soil" => AccumulationSource::Soil,
            other => return Err(CoreError::raster(format!("unknown accumulation source '{other}'"))),
        };
        let food = *food_ids
            .get(&food_id)
            .ok_or_else(|| CoreError::raster(format!("unknown food id '{food_id}'")))?;
        map.insert((nuclide, source, food), factor);
    }
    Ok(map)
}

impl Reference for TabularReference {
    fn all_nuclides(&self) -> Vec<String> {
        self.nuclides.keys().cloned().collect()
    }

    fn radio_decay_coeff(&self, nuclide: &str) -> CoreResult<f64> {
        Ok(self.nuclide(nuclide)?.decay_coeff)
    }

    fn dose_rate_decay_coeff(&self) -> f64 {
        self.dose_rate_decay_coeff
    }

    fn residence_time(&self) -> f64 {
        self.residence_time
    }

    fn nuclide_group(&self, nuclide: &str) -> CoreResult<String> {
        Ok(self.nuclide(nuclide)?.group.clone())
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
        Ok(self.age_group(age)?.respiration_rate)
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
        self.unitless_washing_capacity
    }

    fn terrain_roughness(&self, terrain_type: TerrainType) -> CoreResult<f64> {
        self.roughness
            .get(&terrain_type)
            .copied()
            .ok_or_else(|| CoreError::raster(format!("no roughness for '{terrain_type:?}'")))
    }

    fn diffusion_coefficients(&self, class: StabilityClass) -> CoreResult<DiffusionCoefficients> {
        self.diffusion_coefficients
            .get(&class)
            .copied()
            .ok_or_else(|| CoreError::raster(format!("no diffusion coefficients for class '{class}'")))
    }

    fn terrain_clearance(&self) -> f64 {
        self.terrain_clearance
    }

    fn mixing_layer_height(&self) -> f64 {
        self.mixing_layer_height
    }

    fn food_critical_age_group(&self, nuclide: &str) -> CoreResult<u32> {
        Ok(self.nuclide(nuclide)?.food_critical_age_group)
    }

    fn daily_metabolic_cost(&self, age: u32) -> CoreResult<f64> {
        Ok(self.age_group(age)?.daily_metabolic_cost)
    }

    fn daily_metabolic_cost_for_group(&self, group_id: u32) -> CoreResult<f64> {
        Ok(self.age_group_by_id(group_id)?.daily_metabolic_cost)
    }

    fn accumulation_factor(
        &self,
        nuclide: &str,
        source: AccumulationSource,
        food: FoodCategory,
    ) -> CoreResult<f64> {
        self.accumulation_factors
            .get(&(nuclide.to_string(), source, food))
            .copied()
            .ok_or_else(|| {
                CoreError::raster(format!(
                    "no accumulation factor for '{nuclide}'/{source:?}/{food:?}"
                ))
            })
    }
}
