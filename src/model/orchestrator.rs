//! Wires the formula library into the lazy evaluation graph described in
//! SPEC_FULL.md: one `LazyEval` node per intermediate quantity, built once
//! per `calculate` call and torn down with it so the per-receptor
//! memoization tables never accumulate across receptors.
//!
//! Every reference-store lookup that could fail (unknown nuclide, uncovered
//! age) is resolved once, up front, into plain owned maps — by the time the
//! graph is built every nuclide has already passed constraint validation, so
//! the nodes themselves only call fallible formulas (`FormulaError`, which is
//! `Clone` and so can live inside a memoized `LazyEval<_, Result<_, _>>`).

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{CoreError, CoreResult};
use crate::reference::{AccumulationSource, DiffusionCoefficients, Reference};

use super::common::{FoodCategory, StabilityClass};
use super::constraints::{default_constraints, Constraints};
use super::formulas::{
    acute_total_effective_dose, annual_food_intake, concentration_integral, deposition, depletion,
    depletion_dry, depletion_radiation, depletion_wet, dilution_factor, dispersion_coeff_y,
    dispersion_coeff_z, effective_dose, effective_dose_cloud, effective_dose_food,
    effective_dose_inhalation, effective_dose_surface, food_max_distance, food_specific_activity,
    height_dist_concentration_integral, residence_time_coeff, sediment_detachment_constant,
    sedimentation_factor, total_effective_dose_for_period, vertical_dispersion, FormulaResult,
};
use super::input::Input;
use super::lazy_eval::{FloatKey, LazyEval};

type AClassNuclideX = (StabilityClass, String, FloatKey);
type AClassNuclide = (StabilityClass, String);

/// Per-(class, nuclide) pathway breakdown at the calculation's receptor
/// distance, as consumed by the CSV report.
#[derive(Debug, Clone)]
pub struct NuclideBreakdown {
    pub nuclide: String,
    pub concentration_integral: HashMap<StabilityClass, f64>,
    pub deposition: HashMap<StabilityClass, f64>,
    pub depletion: HashMap<StabilityClass, f64>,
    pub effective_dose_inhalation: HashMap<StabilityClass, f64>,
    pub effective_dose_surface: HashMap<StabilityClass, f64>,
    pub effective_dose_cloud: HashMap<StabilityClass, f64>,
    pub effective_dose_food: HashMap<StabilityClass, f64>,
    pub effective_dose_total_acute: HashMap<StabilityClass, f64>,
    pub effective_dose_total_period: HashMap<StabilityClass, f64>,
    pub effective_dose_max_acute: f64,
    pub effective_dose_max_period: f64,
}

/// Per-nuclide reference properties resolved once at the start of
/// `Model::calculate`, before any lazy node is built.
struct NuclideProperties {
    group: String,
    radio_decay_coeff: f64,
    deposition_rate: f64,
    standard_washing_capacity: f64,
    inhalation_dose_coeff: f64,
    surface_dose_coeff: f64,
    cloud_dose_coeff: f64,
    daily_metabolic_cost_critical_group: f64,
    accumulation_factors: HashMap<FoodCategory, (f64, f64)>,
}

/// Doses & dilution factor calculator, grounded on the two-phase
/// (acute / one-year-period) exposure model of the source methodology.
pub struct Model {
    reference: Rc<dyn Reference>,
    constraints: Constraints,
}

impl Model {
    pub fn new(reference: Rc<dyn Reference>) -> Self {
        let constraints = default_constraints(reference.all_nuclides());
        Self { reference, constraints }
    }

    pub fn validate_input(&self, input: &Input) -> bool {
        if !input.initialized() {
            tracing::warn!("invalid input: not every field was set");
            return false;
        }
        match self.constraints.validate(input) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("input failed to comply with constraints: {err}");
                false
            }
        }
    }

    fn resolve_nuclide_properties(&self, nuclide: &str) -> CoreResult<NuclideProperties> {
        let mut accumulation_factors = HashMap::new();
        for food in self.reference.food_categories() {
            let atmosphere = self
                .reference
                .accumulation_factor(nuclide, AccumulationSource::Atmosphere, food)?;
            let soil = self
                .reference
                .accumulation_factor(nuclide, AccumulationSource::Soil, food)?;
            accumulation_factors.insert(food, (atmosphere, soil));
        }

        let critical_group = self.reference.food_critical_age_group(nuclide)?;

        Ok(NuclideProperties {
            group: self.reference.nuclide_group(nuclide)?,
            radio_decay_coeff: self.reference.radio_decay_coeff(nuclide)?,
            deposition_rate: self.reference.deposition_rate(nuclide)?,
            standard_washing_capacity: self.reference.standard_washing_capacity(nuclide)?,
            inhalation_dose_coeff: self.reference.inhalation_dose_coeff(nuclide)?,
            surface_dose_coeff: self.reference.surface_dose_coeff(nuclide)?,
            cloud_dose_coeff: self.reference.cloud_dose_coeff(nuclide)?,
            daily_metabolic_cost_critical_group: self
                .reference
                .daily_metabolic_cost_for_group(critical_group)?,
            accumulation_factors,
        })
    }

    /// Runs the full calculation for `input`'s receptor distance, returning
    /// the per-nuclide breakdown the CSV/raster report needs.
    pub fn calculate(&self, input: &Input) -> CoreResult<Vec<NuclideBreakdown>> {
        if !self.validate_input(input) {
            return Err(CoreError::constraints_compliance(
                "input is not initialized or fails scenario constraints",
            ));
        }

        let nuclides: Vec<String> = input.nuclides();
        let distance = input.distance();
        let half_square_side = input.square_side() / 2.0;
        let windspeeds = input.extreme_windspeeds().clone();
        let specific_activities = input.specific_activities().clone();
        let terrain_clearance = self.reference.terrain_clearance();
        let mixing_layer_height = self.reference.mixing_layer_height();
        let release_effective_height = self.reference.terrain_roughness(input.terrain_type())?;
        let precipitation_rate = input.precipitation_rate();
        let age = input.age();
        let buffer_area_radius = input.buffer_area_radius();
        let adults_annual_food_intake = input.adults_annual_food_intake().clone();

        let respiration_rate = self.reference.respiration_rate(age)?;
        let dose_rate_decay_coeff = self.reference.dose_rate_decay_coeff();
        let residence_time = self.reference.residence_time();
        let unitless_washing_capacity = self.reference.unitless_washing_capacity();
        let daily_metabolic_cost_adults = self
            .reference
            .daily_metabolic_cost(self.reference.adult_reference_age())?;

        let mut diffusion_coefficients: HashMap<StabilityClass, DiffusionCoefficients> = HashMap::new();
        for aclass in StabilityClass::ALL {
            diffusion_coefficients.insert(aclass, self.reference.diffusion_coefficients(aclass)?);
        }

        let mut properties: HashMap<String, NuclideProperties> = HashMap::new();
        for nuclide in &nuclides {
            properties.insert(nuclide.clone(), self.resolve_nuclide_properties(nuclide)?);
        }
        let properties = Rc::new(properties);

        let depletion_node = {
            let windspeeds = windspeeds.clone();
            let diffusion_coefficients = diffusion_coefficients.clone();
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let x = x.0;
                    let wind_speed = windspeeds[aclass];
                    let coeffs = diffusion_coefficients[aclass];
                    let props = &properties[nuclide];

                    let rad = depletion_radiation(props.radio_decay_coeff, x, wind_speed);
                    let dry = depletion_dry(
                        props.deposition_rate,
                        wind_speed,
                        |xi| dispersion_coeff_z(coeffs.p_z, coeffs.q_z, xi),
                        release_effective_height,
                        x,
                    );
                    let wet_constant = sediment_detachment_constant(
                        unitless_washing_capacity,
                        precipitation_rate,
                        props.standard_washing_capacity,
                    );
                    let wet = depletion_wet(wet_constant, x, wind_speed);
                    depletion(rad, dry, wet)
                },
            ))
        };

        let dilution_node = {
            let windspeeds = windspeeds.clone();
            let diffusion_coefficients = diffusion_coefficients.clone();
            let depletion_node = Rc::clone(&depletion_node);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let x = x.0;
                    let coeffs = diffusion_coefficients[aclass];
                    let depl = depletion_node.call((*aclass, nuclide.clone(), FloatKey(x)));
                    dilution_factor(
                        depl,
                        // dispersion_coeff_y only fails outside [0, 50000) m, which
                        // the default distance constraint already rules out.
                        |xi| dispersion_coeff_y(coeffs.p_y, coeffs.q_y, xi).unwrap_or(0.0),
                        |xi| dispersion_coeff_z(coeffs.p_z, coeffs.q_z, xi),
                        windspeeds[aclass],
                        |clearance, xi| {
                            vertical_dispersion(
                                mixing_layer_height,
                                release_effective_height,
                                dispersion_coeff_z(coeffs.p_z, coeffs.q_z, xi),
                                clearance,
                            )
                        },
                        half_square_side,
                        x,
                        terrain_clearance,
                    )
                },
            ))
        };

        let sedimentation_node = {
            let windspeeds = windspeeds.clone();
            let diffusion_coefficients = diffusion_coefficients.clone();
            let depletion_node = Rc::clone(&depletion_node);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let x = x.0;
                    let coeffs = diffusion_coefficients[aclass];
                    let depl = depletion_node.call((*aclass, nuclide.clone(), FloatKey(x)));
                    sedimentation_factor(
                        depl,
                        windspeeds[aclass],
                        half_square_side,
                        |xi| dispersion_coeff_y(coeffs.p_y, coeffs.q_y, xi).unwrap_or(0.0),
                        x,
                    )
                },
            ))
        };

        let ci_node = {
            let specific_activities = specific_activities.clone();
            let dilution_node = Rc::clone(&dilution_node);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let activity = specific_activities[nuclide];
                    let dilution = dilution_node.call((*aclass, nuclide.clone(), *x));
                    concentration_integral(activity, dilution)
                },
            ))
        };

        let hdci_node = {
            let specific_activities = specific_activities.clone();
            let sedimentation_node = Rc::clone(&sedimentation_node);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let activity = specific_activities[nuclide];
                    let sedimentation = sedimentation_node.call((*aclass, nuclide.clone(), *x));
                    height_dist_concentration_integral(activity, sedimentation)
                },
            ))
        };

        let deposition_node = {
            let ci_node = Rc::clone(&ci_node);
            let hdci_node = Rc::clone(&hdci_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclideX, f64>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> f64 {
                    let props = &properties[nuclide];
                    let wet_constant = sediment_detachment_constant(
                        unitless_washing_capacity,
                        precipitation_rate,
                        props.standard_washing_capacity,
                    );
                    let ci = ci_node.call((*aclass, nuclide.clone(), *x));
                    let hdci = hdci_node.call((*aclass, nuclide.clone(), *x));
                    deposition(props.deposition_rate, wet_constant, ci, hdci)
                },
            ))
        };

        let food_sa_node = {
            let ci_node = Rc::clone(&ci_node);
            let hdci_node = Rc::clone(&hdci_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclideX, HashMap<FoodCategory, f64>>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> HashMap<FoodCategory, f64> {
                    let props = &properties[nuclide];
                    let wet_constant = sediment_detachment_constant(
                        unitless_washing_capacity,
                        precipitation_rate,
                        props.standard_washing_capacity,
                    );
                    let ci = ci_node.call((*aclass, nuclide.clone(), *x));
                    let hdci = hdci_node.call((*aclass, nuclide.clone(), *x));

                    props
                        .accumulation_factors
                        .iter()
                        .map(|(&food, &(atmosphere_factor, soil_factor))| {
                            let value = food_specific_activity(
                                props.deposition_rate,
                                wet_constant,
                                ci,
                                hdci,
                                atmosphere_factor,
                                soil_factor,
                            );
                            (food, value)
                        })
                        .collect()
                },
            ))
        };

        let annual_food_intake_node = {
            let adults_annual_food_intake = adults_annual_food_intake.clone();
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<String, HashMap<FoodCategory, f64>>::new(
                move |nuclide: &String| -> HashMap<FoodCategory, f64> {
                    let dmc = properties[nuclide].daily_metabolic_cost_critical_group;
                    adults_annual_food_intake
                        .iter()
                        .map(|(&food, &intake_adults)| {
                            (food, annual_food_intake(dmc, daily_metabolic_cost_adults, intake_adults))
                        })
                        .collect()
                },
            ))
        };

        // The reference schema carries no dedicated ingestion coefficient;
        // the inhalation coefficient is reused as the intake-pathway dose
        // coefficient for the food pathway too.
        let ed_food_node = {
            let food_sa_node = Rc::clone(&food_sa_node);
            let annual_food_intake_node = Rc::clone(&annual_food_intake_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclideX, FormulaResult<f64>>::new(
                move |(aclass, nuclide, x): &AClassNuclideX| -> FormulaResult<f64> {
                    let sa = food_sa_node.call((*aclass, nuclide.clone(), *x));
                    let afi = annual_food_intake_node.call(nuclide.clone());
                    let sa: HashMap<String, f64> =
                        sa.into_iter().map(|(k, v)| (k.as_str().to_string(), v)).collect();
                    let afi: HashMap<String, f64> =
                        afi.into_iter().map(|(k, v)| (k.as_str().to_string(), v)).collect();
                    let coeff = properties[nuclide].inhalation_dose_coeff;
                    effective_dose_food(coeff, &sa, &afi)
                },
            ))
        };

        let x_max_node = {
            let ed_food_node = Rc::clone(&ed_food_node);
            let nuclides = nuclides.clone();
            Rc::new(LazyEval::<(), FormulaResult<f64>>::new(move |_: &()| -> FormulaResult<f64> {
                const DISTANCES_COUNT: usize = 100;
                let distances: Vec<f64> = (0..DISTANCES_COUNT)
                    .map(|i| ((50_000f64.sqrt() / (DISTANCES_COUNT - 1) as f64) * i as f64).powi(2))
                    .collect();

                let mut flat =
                    Vec::with_capacity(DISTANCES_COUNT * StabilityClass::ALL.len() * nuclides.len());
                for &x in &distances {
                    for aclass in StabilityClass::ALL {
                        for nuclide in &nuclides {
                            flat.push(ed_food_node.call((aclass, nuclide.clone(), FloatKey(x)))?);
                        }
                    }
                }
                let matrix = ndarray::Array3::from_shape_vec(
                    (distances.len(), StabilityClass::ALL.len(), nuclides.len()),
                    flat,
                )
                .expect("flat buffer length matches the declared shape");
                food_max_distance(&distances, &matrix, buffer_area_radius)
            }))
        };

        let ed_inh_node = {
            let ci_node = Rc::clone(&ci_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclide, f64>::new(
                move |(aclass, nuclide): &AClassNuclide| -> f64 {
                    let ci = ci_node.call((*aclass, nuclide.clone(), FloatKey(distance)));
                    effective_dose_inhalation(ci, properties[nuclide].inhalation_dose_coeff, respiration_rate)
                },
            ))
        };

        let residence_time_coeff_node = {
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<String, f64>::new(move |nuclide: &String| -> f64 {
                residence_time_coeff(
                    dose_rate_decay_coeff,
                    properties[nuclide].radio_decay_coeff,
                    residence_time,
                )
            }))
        };

        let ed_surf_node = {
            let deposition_node = Rc::clone(&deposition_node);
            let residence_time_coeff_node = Rc::clone(&residence_time_coeff_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclide, f64>::new(
                move |(aclass, nuclide): &AClassNuclide| -> f64 {
                    let dep = deposition_node.call((*aclass, nuclide.clone(), FloatKey(distance)));
                    let residence = residence_time_coeff_node.call(nuclide.clone());
                    effective_dose_surface(dep, properties[nuclide].surface_dose_coeff, residence)
                },
            ))
        };

        let ed_cloud_node = {
            let ci_node = Rc::clone(&ci_node);
            let properties = Rc::clone(&properties);
            Rc::new(LazyEval::<AClassNuclide, f64>::new(
                move |(aclass, nuclide): &AClassNuclide| -> f64 {
                    let ci = ci_node.call((*aclass, nuclide.clone(), FloatKey(distance)));
                    effective_dose_cloud(ci, properties[nuclide].cloud_dose_coeff)
                },
            ))
        };

        let mut nuclide_groups = HashMap::new();
        for (nuclide, props) in properties.iter() {
            nuclide_groups.insert(nuclide.clone(), props.group.clone());
        }

        let mut breakdowns = Vec::with_capacity(nuclides.len());

        for nuclide in &nuclides {
            let mut concentration_integral_map = HashMap::new();
            let mut deposition_map = HashMap::new();
            let mut depletion_map = HashMap::new();
            let mut ed_inh_map = HashMap::new();
            let mut ed_surf_map = HashMap::new();
            let mut ed_cloud_map = HashMap::new();
            let mut ed_food_map = HashMap::new();
            let mut ed_total_acute_map = HashMap::new();
            let mut ed_total_period_map = HashMap::new();

            let x_max = x_max_node.call(())?;

            for aclass in StabilityClass::ALL {
                let ci = ci_node.call((aclass, nuclide.clone(), FloatKey(distance)));
                let dep = deposition_node.call((aclass, nuclide.clone(), FloatKey(distance)));
                let depl = depletion_node.call((aclass, nuclide.clone(), FloatKey(distance)));
                let ed_inh = ed_inh_node.call((aclass, nuclide.clone()));
                let ed_surf = ed_surf_node.call((aclass, nuclide.clone()));
                let ed_cloud = ed_cloud_node.call((aclass, nuclide.clone()));
                let ed_food = ed_food_node.call((aclass, nuclide.clone(), FloatKey(x_max)))?;

                let ed_total_acute =
                    acute_total_effective_dose(nuclide, ed_cloud, ed_inh, ed_surf, &nuclide_groups)?;
                let ed_total_period = total_effective_dose_for_period(
                    1,
                    nuclide,
                    ed_cloud,
                    ed_inh,
                    ed_surf,
                    ed_food,
                    &nuclide_groups,
                )?;

                concentration_integral_map.insert(aclass, ci);
                deposition_map.insert(aclass, dep);
                depletion_map.insert(aclass, depl);
                ed_inh_map.insert(aclass, ed_inh);
                ed_surf_map.insert(aclass, ed_surf);
                ed_cloud_map.insert(aclass, ed_cloud);
                ed_food_map.insert(aclass, ed_food);
                ed_total_acute_map.insert(aclass, ed_total_acute);
                ed_total_period_map.insert(aclass, ed_total_period);
            }

            let e_max_acute = ed_total_acute_map.values().copied().fold(f64::NEG_INFINITY, f64::max);
            let e_max_period = ed_total_period_map.values().copied().fold(f64::NEG_INFINITY, f64::max);

            breakdowns.push(NuclideBreakdown {
                nuclide: nuclide.clone(),
                concentration_integral: concentration_integral_map,
                deposition: deposition_map,
                depletion: depletion_map,
                effective_dose_inhalation: ed_inh_map,
                effective_dose_surface: ed_surf_map,
                effective_dose_cloud: ed_cloud_map,
                effective_dose_food: ed_food_map,
                effective_dose_total_acute: ed_total_acute_map,
                effective_dose_total_period: ed_total_period_map,
                effective_dose_max_acute: e_max_acute,
                effective_dose_max_period: e_max_period,
            });
        }

        Ok(breakdowns)
    }
}

/// Overall effective dose across every nuclide: max over stability classes
/// of the per-class sum of per-nuclide doses.
pub fn effective_dose_acute(breakdowns: &[NuclideBreakdown]) -> f64 {
    let doses: Vec<HashMap<StabilityClass, f64>> = breakdowns
        .iter()
        .map(|b| b.effective_dose_total_acute.clone())
        .collect();
    effective_dose(&doses)
}

pub fn effective_dose_for_period(breakdowns: &[NuclideBreakdown]) -> f64 {
    let doses: Vec<HashMap<StabilityClass, f64>> = breakdowns
        .iter()
        .map(|b| b.effective_dose_total_period.clone())
        .collect();
    effective_dose(&doses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::common::TerrainType;
    use crate::reference::fake::FakeReference;
    use std::collections::HashMap as Map;

    fn sample_input() -> Input {
        let mut input = Input::new();
        input.set_distance(2000.0).unwrap();
        input.set_square_side(200.0).unwrap();
        input.set_precipitation_rate(0.0).unwrap();
        input
            .set_extreme_windspeeds(StabilityClass::ALL.into_iter().map(|c| (c, 2.0)).collect())
            .unwrap();
        input.set_age(30).unwrap();
        input.set_terrain_type(TerrainType::Agricultural).unwrap();
        input.set_blowout_time(60.0).unwrap();
        input.set_buffer_area_radius(0.0).unwrap();
        let intake: Map<FoodCategory, f64> =
            FoodCategory::ALL.into_iter().map(|f| (f, 100.0)).collect();
        input.set_adults_annual_food_intake(intake).unwrap();
        input.add_specific_activity("Cs-137", 1.0e9).unwrap();
        input
    }

    #[test]
    fn calculates_breakdown_for_every_nuclide_and_class() {
        let reference: Rc<dyn Reference> = Rc::new(FakeReference::new());
        let model = Model::new(reference);
        let input = sample_input();

        let breakdowns = model.calculate(&input).unwrap();
        assert_eq!(breakdowns.len(), 1);
        assert_eq!(breakdowns[0].nuclide, "Cs-137");
        assert_eq!(breakdowns[0].concentration_integral.len(), StabilityClass::ALL.len());
        assert!(breakdowns[0].effective_dose_max_acute.is_finite());
        assert!(breakdowns[0].effective_dose_max_acute >= 0.0);

        assert_eq!(
            effective_dose_acute(&breakdowns),
            breakdowns[0].effective_dose_max_acute
        );
    }

    #[test]
    fn irg_nuclide_skips_surface_and_inhalation_pathways() {
        let reference: Rc<dyn Reference> = Rc::new(FakeReference::new());
        let model = Model::new(reference);
        let mut input = sample_input();
        input.add_specific_activity("Kr-85", 1.0e9).unwrap();

        let breakdowns = model.calculate(&input).unwrap();
        let kr85 = breakdowns.iter().find(|b| b.nuclide == "Kr-85").unwrap();
        for aclass in StabilityClass::ALL {
            assert_eq!(
                kr85.effective_dose_total_acute[&aclass],
                kr85.effective_dose_cloud[&aclass]
            );
        }
    }

    #[test]
    fn rejects_uninitialized_input() {
        let reference: Rc<dyn Reference> = Rc::new(FakeReference::new());
        let model = Model::new(reference);
        assert!(model.calculate(&Input::new()).is_err());
    }
}
