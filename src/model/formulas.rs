//! Pure functions encoding the dose model's physics equations. Every
//! function here is a direct, stateless port of the corresponding equation
//! in the source methodology (SM-134-17); none of them touch the reference
//! store or the lazy graph — those compose these functions, not the other
//! way round.

use std::collections::HashMap;

use ndarray::Array3;
use statrs::function::erf::erf;
use thiserror::Error;

use super::common::StabilityClass;
use super::quadrature::integrate;

/// Errors internal to the formula / lazy-evaluation layer. Converted into
/// [`crate::error::CoreError`] at the process boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unknown nuclide: {0}")]
    UnknownNuclide(String),

    #[error("invalid period: {0} years")]
    InvalidPeriod(i64),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("inconsistent categories: expected {expected:?}, got {actual:?}")]
    InconsistentCategories {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("value out of range: {value} not in [{low}, {high})")]
    OutOfRange { value: f64, low: f64, high: f64 },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

pub type FormulaResult<T> = Result<T, FormulaError>;

const IRG_GROUP: &str = "IRG";

/// SM-134-17: (1), (2). Max over stability classes of the per-class sum of
/// per-nuclide doses.
pub fn effective_dose(nuclide_aclass_doses: &[HashMap<StabilityClass, f64>]) -> f64 {
    let mut aclass_doses: HashMap<StabilityClass, f64> =
        StabilityClass::ALL.iter().map(|&c| (c, 0.0)).collect();
    for nuclide_doses in nuclide_aclass_doses {
        for class in StabilityClass::ALL {
            *aclass_doses.get_mut(&class).unwrap() += nuclide_doses[&class];
        }
    }
    aclass_doses
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// SM-134-17: (3).
pub fn acute_total_effective_dose(
    nuclide: &str,
    cloud_ed: f64,
    inh_ed: f64,
    surf_ed: f64,
    nuclide_groups: &HashMap<String, String>,
) -> FormulaResult<f64> {
    let group = nuclide_groups
        .get(nuclide)
        .ok_or_else(|| FormulaError::UnknownNuclide(nuclide.to_string()))?;
    if group == IRG_GROUP {
        Ok(cloud_ed)
    } else {
        Ok(cloud_ed + inh_ed + surf_ed)
    }
}

/// SM-134-17: (4).
#[allow(clippy::too_many_arguments)]
pub fn total_effective_dose_for_period(
    years: i64,
    nuclide: &str,
    cloud_ed: f64,
    inh_ed: f64,
    surf_ed: f64,
    food_ed: f64,
    nuclide_groups: &HashMap<String, String>,
) -> FormulaResult<f64> {
    let group = nuclide_groups
        .get(nuclide)
        .ok_or_else(|| FormulaError::UnknownNuclide(nuclide.to_string()))?;
    if years <= 0 {
        return Err(FormulaError::InvalidPeriod(years));
    }
    if group == IRG_GROUP {
        Ok(cloud_ed)
    } else if years == 1 {
        Ok(cloud_ed + inh_ed + surf_ed + food_ed)
    } else {
        Err(FormulaError::NotImplemented(
            "multi-year food dose beyond the first year".into(),
        ))
    }
}

/// SM-134-17: (5).
pub fn effective_dose_cloud(concentration_integral: f64, dose_coefficient: f64) -> f64 {
    concentration_integral * dose_coefficient
}

/// SM-134-17: (6).
pub fn effective_dose_surface(
    deposition: f64,
    dose_coefficient: f64,
    residence_time_coeff: f64,
) -> f64 {
    deposition * dose_coefficient * residence_time_coeff
}

/// SM-134-17: (7).
pub fn residence_time_coeff(
    dose_rate_decay_coeff: f64,
    radioactive_decay_coeff: f64,
    residence_time: f64,
) -> f64 {
    let decay_coeff = dose_rate_decay_coeff + radioactive_decay_coeff;
    (1.0 - (-decay_coeff * residence_time).exp()) / decay_coeff
}

/// SM-134-17: (8).
pub fn effective_dose_inhalation(
    concentration_integral: f64,
    dose_coefficient: f64,
    respiration_rate: f64,
) -> f64 {
    concentration_integral * dose_coefficient * respiration_rate
}

/// SM-134-17: (9).
pub fn effective_dose_food(
    dose_coefficient: f64,
    food_specific_activity: &HashMap<String, f64>,
    annual_food_intake: &HashMap<String, f64>,
) -> FormulaResult<f64> {
    let mut sa_keys: Vec<String> = food_specific_activity.keys().cloned().collect();
    let mut ai_keys: Vec<String> = annual_food_intake.keys().cloned().collect();
    sa_keys.sort();
    ai_keys.sort();
    if sa_keys != ai_keys {
        return Err(FormulaError::InconsistentCategories {
            expected: sa_keys,
            actual: ai_keys,
        });
    }
    let sum: f64 = food_specific_activity
        .iter()
        .map(|(food, sa)| sa * annual_food_intake[food])
        .sum();
    Ok(dose_coefficient * sum)
}

/// SM-134-17: (10).
pub fn annual_food_intake(
    daily_metabolic_cost: f64,
    daily_metabolic_cost_adults: f64,
    annual_food_intake_adults: f64,
) -> f64 {
    daily_metabolic_cost / daily_metabolic_cost_adults * annual_food_intake_adults
}

/// SM-134-17: (11). `doses_matrix` is indexed `[distance, class, nuclide]`.
pub fn food_max_distance(
    distances: &[f64],
    doses_matrix: &Array3<f64>,
    minimal_distance: f64,
) -> FormulaResult<f64> {
    let shape = doses_matrix.shape();
    if shape[0] != distances.len() {
        return Err(FormulaError::ShapeMismatch(format!(
            "first matrix band should correspond to given distances set: {} != {}",
            shape[0],
            distances.len()
        )));
    }
    if shape[1] != StabilityClass::ALL.len() {
        return Err(FormulaError::ShapeMismatch(format!(
            "second matrix band should correspond to atmospheric classes: {} != {}",
            shape[1],
            StabilityClass::ALL.len()
        )));
    }

    let mut doses = vec![f64::NEG_INFINITY; distances.len()];
    for i in 0..distances.len() {
        let mut max_over_class = f64::NEG_INFINITY;
        for c in 0..shape[1] {
            let sum_over_nuclide: f64 = doses_matrix.slice(ndarray::s![i, c, ..]).iter().sum();
            max_over_class = max_over_class.max(sum_over_nuclide);
        }
        doses[i] = max_over_class;
    }

    let max_dose = doses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_idx = doses
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == max_dose)
        .map(|(i, _)| i)
        .last()
        .expect("distances is non-empty");

    let mut x_max = distances[max_idx];
    if x_max < minimal_distance {
        x_max = minimal_distance;
    }
    Ok(x_max)
}

/// SM-134-17: A1(1).
pub fn concentration_integral(activity: f64, dilution_factor: f64) -> f64 {
    activity * dilution_factor
}

/// SM-134-17: A1(2).
pub fn height_dist_concentration_integral(activity: f64, dilution_factor: f64) -> f64 {
    activity * dilution_factor
}

/// SM-134-17: A1(5).
pub fn deposition(
    sedimentation_rate: f64,
    sediment_detachment_constant: f64,
    concentration_integral: f64,
    height_dist_concentration_integral: f64,
) -> f64 {
    sedimentation_rate * concentration_integral
        + sediment_detachment_constant * height_dist_concentration_integral
}

/// SM-134-17: A1(6).
#[allow(clippy::too_many_arguments)]
pub fn food_specific_activity(
    sedimentation_rate: f64,
    sediment_detachment_constant: f64,
    concentration_integral: f64,
    height_dist_concentration_integral: f64,
    atmosphere_accum_factor: f64,
    soil_accum_factor: f64,
) -> f64 {
    (sedimentation_rate * concentration_integral
        + 0.2 * sediment_detachment_constant * height_dist_concentration_integral)
        * atmosphere_accum_factor
        + (sedimentation_rate * concentration_integral
            + sediment_detachment_constant * height_dist_concentration_integral)
            * soil_accum_factor
}

/// SM-134-17: A2(11).
#[allow(clippy::too_many_arguments)]
pub fn dilution_factor(
    depletion: f64,
    dispersion_coeff_y: impl Fn(f64) -> f64,
    dispersion_coeff_z: impl Fn(f64) -> f64,
    wind_speed: f64,
    vertical_dispersion: impl Fn(f64, f64) -> f64,
    half_square_side: f64,
    distance: f64,
    terrain_clearance: f64,
) -> f64 {
    let factor =
        depletion / ((2.0 * std::f64::consts::PI).sqrt() * wind_speed * 4.0 * half_square_side.powi(2));

    let subintegral = |xi: f64| {
        let arg = distance - xi;
        vertical_dispersion(terrain_clearance, arg) / dispersion_coeff_z(arg)
            * erf(half_square_side / (std::f64::consts::SQRT_2 * dispersion_coeff_y(arg)))
    };

    factor * integrate(subintegral, -half_square_side, half_square_side)
}

/// SM-134-17: A2(12).
pub fn vertical_dispersion(
    mixed_layer_height: f64,
    release_effective_height: f64,
    dispersion_coeff_z: f64,
    terrain_clearance: f64,
) -> f64 {
    let expr1 = 2.0 * dispersion_coeff_z.powi(2);
    let mut sum = 0.0;
    for n in -2..=2 {
        let expr2 = 2.0 * n as f64 * mixed_layer_height;
        sum += (-(expr2 + release_effective_height - terrain_clearance).powi(2) / expr1).exp()
            + (-(expr2 - release_effective_height - terrain_clearance).powi(2) / expr1).exp();
    }
    sum
}

/// SM-134-17: A2(13).
pub fn sedimentation_factor(
    depletion: f64,
    wind_speed: f64,
    half_square_side: f64,
    dispersion_coeff_y: impl Fn(f64) -> f64,
    distance: f64,
) -> f64 {
    let factor = depletion / (std::f64::consts::PI.sqrt() * wind_speed * 4.0 * half_square_side.powi(2));

    let subintegral =
        |xi: f64| erf(half_square_side / (std::f64::consts::SQRT_2 * dispersion_coeff_y(distance - xi)));

    factor * integrate(subintegral, -half_square_side, half_square_side)
}

/// SM-134-17: A2(14).
pub fn depletion_radiation(radioactive_decay_coeff: f64, distance: f64, wind_speed: f64) -> f64 {
    (-(radioactive_decay_coeff * distance) / wind_speed).exp()
}

/// SM-134-17: A2(15).
pub fn depletion_dry(
    sedimentation_rate: f64,
    wind_speed: f64,
    dispersion_coeff_z: impl Fn(f64) -> f64,
    release_effective_height: f64,
    distance: f64,
) -> f64 {
    let factor = -(2.0 / std::f64::consts::PI).sqrt() * sedimentation_rate / wind_speed;

    let subintegral = |x: f64| {
        let sigma_z = dispersion_coeff_z(x);
        (-release_effective_height.powi(2) / (2.0 * sigma_z.powi(2))).exp() / sigma_z
    };

    (factor * integrate(subintegral, 0.0, distance)).exp()
}

/// SM-134-17: A2(16). Indexed by stability class (wind speed is a function
/// of atmospheric stability, not of nuclide).
pub fn depletion_wet(sediment_detachment_constant: f64, distance: f64, wind_speed: f64) -> f64 {
    (-sediment_detachment_constant * distance / wind_speed).exp()
}

/// SM-134-17: A2(17).
pub fn sediment_detachment_constant(
    unitless_washing_capacity: f64,
    precipitation_rate: f64,
    standard_washing_capacity: f64,
) -> f64 {
    unitless_washing_capacity * precipitation_rate * standard_washing_capacity
}

/// SM-134-17: A2(18).
pub fn depletion(depletion_rad: f64, depletion_dry: f64, depletion_wet: f64) -> f64 {
    depletion_rad * depletion_dry * depletion_wet
}

/// SM-134-17: A2(19).
pub fn dispersion_coeff_z(p_z: f64, q_z: f64, distance: f64) -> f64 {
    p_z * distance.powf(q_z)
}

/// SM-134-17: A2(20).
pub fn dispersion_coeff_y(p_y: f64, q_y: f64, distance: f64) -> FormulaResult<f64> {
    if distance < 0.0 {
        return Err(FormulaError::OutOfRange {
            value: distance,
            low: 0.0,
            high: 50000.0,
        });
    } else if distance < 10000.0 {
        Ok(p_y * distance.powf(q_y))
    } else if distance < 50000.0 {
        Ok(p_y * 10000f64.powf(q_y - 0.5) * distance.sqrt())
    } else {
        Err(FormulaError::OutOfRange {
            value: distance,
            low: 0.0,
            high: 50000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_doses(values: [f64; 6]) -> HashMap<StabilityClass, f64> {
        StabilityClass::ALL.into_iter().zip(values).collect()
    }

    #[test]
    fn effective_dose_is_max_of_sums() {
        let doses = vec![
            class_doses([1.0, 2.0, 3.0, 2.0, 1.0, 0.0]),
            class_doses([1.0, 4.0, 9.0, 16.0, 9.0, 4.0]),
        ];
        assert_eq!(effective_dose(&doses), 18.0);
    }

    #[test]
    fn acute_total_dose_for_irg_is_cloud_only() {
        let mut groups = HashMap::new();
        groups.insert("Xe-133".to_string(), "IRG".to_string());
        let dose = acute_total_effective_dose("Xe-133", 5.0, 6.0, 7.0, &groups).unwrap();
        assert_eq!(dose, 5.0);
    }

    #[test]
    fn acute_total_dose_for_aerosol_sums_three_pathways() {
        let mut groups = HashMap::new();
        groups.insert("Cs-137".to_string(), "aerosol".to_string());
        let dose = acute_total_effective_dose("Cs-137", 5.0, 6.0, 7.0, &groups).unwrap();
        assert_eq!(dose, 18.0);
    }

    #[test]
    fn acute_total_dose_rejects_unknown_nuclide() {
        let groups = HashMap::new();
        let err = acute_total_effective_dose("Unknown", 1.0, 1.0, 1.0, &groups).unwrap_err();
        assert!(matches!(err, FormulaError::UnknownNuclide(_)));
    }

    #[test]
    fn concentration_integral_is_symmetric() {
        assert_eq!(concentration_integral(3.0, 5.0), concentration_integral(5.0, 3.0));
    }

    #[test]
    fn residence_time_coeff_matches_reference_value() {
        let value = residence_time_coeff(1.0, 2.0, 3.0);
        assert!((value - 0.333).abs() < 1e-3);
    }

    #[test]
    fn residence_time_coeff_is_zero_at_t_zero() {
        assert_eq!(residence_time_coeff(1.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn residence_time_coeff_increases_with_time() {
        let early = residence_time_coeff(1e-9, 1e-9, 10.0);
        let late = residence_time_coeff(1e-9, 1e-9, 1000.0);
        assert!(late > early);
    }

    #[test]
    fn dispersion_coeff_y_is_continuous_at_ten_thousand() {
        let p_y = 0.32;
        let q_y = 0.78;
        let below = dispersion_coeff_y(p_y, q_y, 9999.999).unwrap();
        let above = dispersion_coeff_y(p_y, q_y, 10000.0).unwrap();
        assert!((below - above).abs() < 1e-2);
    }

    #[test]
    fn dispersion_coeff_y_rejects_negative_distance() {
        assert!(dispersion_coeff_y(1.0, 1.0, -1.0).is_err());
    }

    #[test]
    fn dispersion_coeff_y_rejects_fifty_km_and_beyond() {
        assert!(dispersion_coeff_y(1.0, 1.0, 50000.0).is_err());
    }

    #[test]
    fn food_max_distance_respects_minimal_distance() {
        let distances = vec![100.0, 200.0];
        let matrix = Array3::from_shape_vec(
            (2, 6, 1),
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let x_max = food_max_distance(&distances, &matrix, 150.0).unwrap();
        assert!(x_max >= 150.0);
    }

    #[test]
    fn food_max_distance_picks_rightmost_tie() {
        let distances = vec![3.0, 4.0];
        let matrix = Array3::from_shape_vec(
            (2, 6, 2),
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 1.0, 2.0, 3.0, 4.0,
                5.0, 6.0, 7.0, 8.0, 9.0, 50.0, 11.0, 12.0,
            ],
        )
        .unwrap();
        let x_max = food_max_distance(&distances, &matrix, 0.0).unwrap();
        assert_eq!(x_max, 4.0);
    }

    #[test]
    fn effective_dose_food_rejects_mismatched_categories() {
        let mut sa = HashMap::new();
        sa.insert("meat".to_string(), 1.0);
        let mut ai = HashMap::new();
        ai.insert("milk".to_string(), 1.0);
        assert!(effective_dose_food(1.0, &sa, &ai).is_err());
    }
}
