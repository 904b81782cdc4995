//! Spatial driver that turns per-nuclide activity rasters into dose
//! samples at arbitrary receptor points: a rectangular output grid, or a
//! list of named special points.

use std::collections::HashMap;
use std::rc::Rc;

use ndarray::Array2;

use crate::activity::ActivityMap;
use crate::error::CoreResult;
use crate::geo::{distance, Coordinate};
use crate::model::{default_constraints, Constraints, Input, Model, StabilityClass};
use crate::reference::Reference;

/// Per-receptor, per-nuclide dose sample: the scalars and per-class
/// dictionaries `calculate_dose` accumulates across every contributing
/// raster cell.
#[derive(Debug, Clone)]
pub struct NuclideDoseSample {
    pub e_max_acute: f64,
    pub e_max_period: f64,
    pub e_total_acute: HashMap<StabilityClass, f64>,
    pub e_total_period: HashMap<StabilityClass, f64>,
    pub e_inhalation: HashMap<StabilityClass, f64>,
    pub e_surface: HashMap<StabilityClass, f64>,
    pub e_cloud: HashMap<StabilityClass, f64>,
    pub e_food: HashMap<StabilityClass, f64>,
    pub concentration_integral: HashMap<StabilityClass, f64>,
    pub deposition: HashMap<StabilityClass, f64>,
    pub depletion: HashMap<StabilityClass, f64>,
}

impl NuclideDoseSample {
    fn zero() -> Self {
        Self {
            e_max_acute: 0.0,
            e_max_period: 0.0,
            e_total_acute: HashMap::new(),
            e_total_period: HashMap::new(),
            e_inhalation: HashMap::new(),
            e_surface: HashMap::new(),
            e_cloud: HashMap::new(),
            e_food: HashMap::new(),
            concentration_integral: HashMap::new(),
            deposition: HashMap::new(),
            depletion: HashMap::new(),
        }
    }
}

fn accumulate(target: &mut HashMap<StabilityClass, f64>, source: &HashMap<StabilityClass, f64>) {
    for (class, value) in source {
        *target.entry(*class).or_insert(0.0) += value;
    }
}

fn divide_by(map: &mut HashMap<StabilityClass, f64>, n: f64) {
    for value in map.values_mut() {
        *value /= n;
    }
}

/// One grid point's receptor coordinate plus its world (lon, lat).
pub struct DoseGrid {
    pub nuclide: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub e_max_acute: Array2<f64>,
    pub e_max_period: Array2<f64>,
    pub e_total_acute: HashMap<StabilityClass, Array2<f64>>,
    pub e_total_period: HashMap<StabilityClass, Array2<f64>>,
    pub e_inhalation: HashMap<StabilityClass, Array2<f64>>,
    pub e_surface: HashMap<StabilityClass, Array2<f64>>,
    pub e_cloud: HashMap<StabilityClass, Array2<f64>>,
    pub e_food: HashMap<StabilityClass, Array2<f64>>,
    pub concentration_integral: HashMap<StabilityClass, Array2<f64>>,
    pub deposition: HashMap<StabilityClass, Array2<f64>>,
}

pub struct SpecialPointRow {
    pub point: String,
    pub x: f64,
    pub y: f64,
    pub nuclide: String,
    pub sample: NuclideDoseSample,
}

/// Drives the dose model over receptor points against a set of
/// already-painted activity rasters. Owns the reference store, one
/// scenario-wide `Model`/`Constraints` pair, and the scalar fields of
/// `Input` that are the same for every cell in every raster (square
/// side, precipitation rate, terrain type, blowout time, age, wind
/// speeds, annual food intake, soil density).
pub struct DoseAggregator {
    model: Model,
    constraints: Constraints,
    base_input: Input,
    soil_density: f64,
}

impl DoseAggregator {
    pub fn new(reference: Rc<dyn Reference>, base_input: Input, soil_density: f64) -> Self {
        let known_nuclides = reference.all_nuclides();
        Self {
            model: Model::new(reference),
            constraints: default_constraints(known_nuclides),
            base_input,
            soil_density,
        }
    }

    /// Accumulates the dose contribution of every non-zero cell of
    /// `actmap` as seen from `receptor`. Cells whose derived input fails
    /// a registered constraint are skipped and logged; everything else
    /// propagates as an error.
    pub fn calculate_dose(&self, actmap: &ActivityMap, receptor: Coordinate) -> CoreResult<NuclideDoseSample> {
        let square_area = self.base_input.square_side().powi(2);
        let contaminated_volume = actmap.contamination_depth / 100.0 * square_area;

        let mut sample = NuclideDoseSample::zero();
        let mut nonzero_cells = 0usize;

        for row in 0..actmap.height() {
            for col in 0..actmap.width() {
                let activity = actmap.cell_activity(row, col);
                if activity == 0.0 {
                    continue;
                }

                let (x, y) = actmap.transform().center(row, col);
                let cell_coo = Coordinate::new(x, y, "EPSG:3857");
                let cell_distance = distance(receptor, cell_coo)?;

                let specific_activity = activity / (contaminated_volume * self.soil_density);

                let mut cell_input = self.base_input.clone();
                cell_input.set_distance(cell_distance)?;
                cell_input.add_specific_activity(actmap.nuclide(), specific_activity)?;

                if let Err(violation) = self.constraints.validate(&cell_input) {
                    tracing::warn!(
                        nuclide = actmap.nuclide(),
                        row,
                        col,
                        error = %violation,
                        "skipping cell: input fails a registered constraint"
                    );
                    continue;
                }

                let breakdowns = match self.model.calculate(&cell_input) {
                    Ok(breakdowns) => breakdowns,
                    Err(error) => {
                        tracing::warn!(
                            nuclide = actmap.nuclide(),
                            row,
                            col,
                            error = %error,
                            "skipping cell: model evaluation failed"
                        );
                        continue;
                    }
                };
                let breakdown = breakdowns
                    .iter()
                    .find(|b| b.nuclide == actmap.nuclide())
                    .expect("calculate() returns a breakdown for every nuclide in its input");

                sample.e_max_acute += breakdown.effective_dose_max_acute;
                sample.e_max_period += breakdown.effective_dose_max_period;
                accumulate(&mut sample.e_total_acute, &breakdown.effective_dose_total_acute);
                accumulate(&mut sample.e_total_period, &breakdown.effective_dose_total_period);
                accumulate(&mut sample.e_inhalation, &breakdown.effective_dose_inhalation);
                accumulate(&mut sample.e_surface, &breakdown.effective_dose_surface);
                accumulate(&mut sample.e_cloud, &breakdown.effective_dose_cloud);
                accumulate(&mut sample.e_food, &breakdown.effective_dose_food);
                accumulate(&mut sample.concentration_integral, &breakdown.concentration_integral);
                accumulate(&mut sample.deposition, &breakdown.deposition);
                accumulate(&mut sample.depletion, &breakdown.depletion);
                nonzero_cells += 1;
            }
        }

        if nonzero_cells > 0 {
            divide_by(&mut sample.depletion, nonzero_cells as f64);
        }
        Ok(sample)
    }

    /// Builds one [`DoseGrid`] per activity map over a `resolution`
    /// x `resolution` linspace grid between `ul` and `lr`.
    pub fn calculate_doses_map(
        &self,
        activity_maps: &[ActivityMap],
        ul: Coordinate,
        lr: Coordinate,
        resolution: usize,
    ) -> CoreResult<Vec<DoseGrid>> {
        let x = linspace(ul.lon, lr.lon, resolution);
        let y = linspace(ul.lat, lr.lat, resolution);

        let mut grids = Vec::with_capacity(activity_maps.len());
        for actmap in activity_maps {
            let mut e_max_acute = Array2::zeros((y.len(), x.len()));
            let mut e_max_period = Array2::zeros((y.len(), x.len()));
            let mut e_total_acute = zero_class_grids(&y, &x);
            let mut e_total_period = zero_class_grids(&y, &x);
            let mut e_inhalation = zero_class_grids(&y, &x);
            let mut e_surface = zero_class_grids(&y, &x);
            let mut e_cloud = zero_class_grids(&y, &x);
            let mut e_food = zero_class_grids(&y, &x);
            let mut concentration_integral = zero_class_grids(&y, &x);
            let mut deposition = zero_class_grids(&y, &x);

            for (j, &lon) in x.iter().enumerate() {
                for (i, &lat) in y.iter().enumerate() {
                    let receptor = Coordinate::new(lon, lat, "EPSG:4326");
                    let sample = self.calculate_dose(actmap, receptor)?;
                    e_max_acute[(i, j)] = sample.e_max_acute;
                    e_max_period[(i, j)] = sample.e_max_period;
                    for class in StabilityClass::ALL {
                        e_total_acute.get_mut(&class).unwrap()[(i, j)] =
                            *sample.e_total_acute.get(&class).unwrap_or(&0.0);
                        e_total_period.get_mut(&class).unwrap()[(i, j)] =
                            *sample.e_total_period.get(&class).unwrap_or(&0.0);
                        e_inhalation.get_mut(&class).unwrap()[(i, j)] =
                            *sample.e_inhalation.get(&class).unwrap_or(&0.0);
                        e_surface.get_mut(&class).unwrap()[(i, j)] =
                            *sample.e_surface.get(&class).unwrap_or(&0.0);
                        e_cloud.get_mut(&class).unwrap()[(i, j)] = *sample.e_cloud.get(&class).unwrap_or(&0.0);
                        e_food.get_mut(&class).unwrap()[(i, j)] = *sample.e_food.get(&class).unwrap_or(&0.0);
                        concentration_integral.get_mut(&class).unwrap()[(i, j)] =
                            *sample.concentration_integral.get(&class).unwrap_or(&0.0);
                        deposition.get_mut(&class).unwrap()[(i, j)] =
                            *sample.deposition.get(&class).unwrap_or(&0.0);
                    }
                }
            }

            grids.push(DoseGrid {
                nuclide: actmap.nuclide().to_string(),
                x: x.clone(),
                y: y.clone(),
                e_max_acute,
                e_max_period,
                e_total_acute,
                e_total_period,
                e_inhalation,
                e_surface,
                e_cloud,
                e_food,
                concentration_integral,
                deposition,
            });
        }
        Ok(grids)
    }

    /// Computes one dose sample per (point, nuclide) pair, preserving
    /// input order.
    pub fn calculate_doses_in_special_points(
        &self,
        activity_maps: &[ActivityMap],
        points: &[(String, Coordinate)],
    ) -> CoreResult<Vec<SpecialPointRow>> {
        let mut rows = Vec::with_capacity(points.len() * activity_maps.len());
        for (name, coo) in points {
            for actmap in activity_maps {
                let sample = self.calculate_dose(actmap, *coo)?;
                rows.push(SpecialPointRow {
                    point: name.clone(),
                    x: coo.lon,
                    y: coo.lat,
                    nuclide: actmap.nuclide().to_string(),
                    sample,
                });
            }
        }
        Ok(rows)
    }
}

fn zero_class_grids(y: &[f64], x: &[f64]) -> HashMap<StabilityClass, Array2<f64>> {
    StabilityClass::ALL
        .iter()
        .map(|&class| (class, Array2::zeros((y.len(), x.len()))))
        .collect()
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    if num <= 1 {
        return vec![start];
    }
    let step = (stop - start) / (num as f64 - 1.0);
    (0..num).map(|i| start + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_matches_endpoints() {
        let xs = linspace(0.0, 10.0, 5);
        assert_eq!(xs.first().copied(), Some(0.0));
        assert_eq!(xs.last().copied(), Some(10.0));
        assert_eq!(xs.len(), 5);
    }
}
