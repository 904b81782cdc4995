//! Timestamped report directory: the scenario copy, per-nuclide activity
//! rasters and dose grids under `bin/`, and the special-points CSV at the
//! report root.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use ndarray_npy::{write_npy, NpzWriter};

use crate::activity::ActivityMap;
use crate::aggregator::{DoseGrid, SpecialPointRow};
use crate::error::{CoreError, CoreResult};
use crate::model::StabilityClass;

/// Owns the report directory for one run: `<root>/bin/` plus
/// `<root>/input.json` and `<root>/special_points.csv`.
pub struct ReportDir {
    root: PathBuf,
}

impl ReportDir {
    /// Creates `root/bin` (and `root` itself if needed) and copies
    /// `input_path` in as `input.json`.
    pub fn prepare(root: PathBuf, input_path: &Path) -> CoreResult<Self> {
        fs::create_dir_all(root.join("bin"))?;
        fs::copy(input_path, root.join("input.json"))?;
        Ok(Self { root })
    }

    /// A report directory name following the original's
    /// `report_<dd-mm-YYYY_HH-MM-SS>` convention, rooted under `base`.
    pub fn timestamped_name(base: &Path, at: DateTime<Local>) -> PathBuf {
        base.join(format!("report_{}", at.format("%d-%m-%Y_%H-%M-%S")))
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    fn bin_path(&self, nuclide: &str, suffix: &str) -> PathBuf {
        self.bin_dir().join(format!("{nuclide}_{suffix}"))
    }

    /// Writes a single activity map's current raster-factor scale.
    pub fn write_raster_factors(&self, factors: &HashMap<String, f64>) -> CoreResult<()> {
        let path = self.bin_dir().join("raster_factors.json");
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, factors)?;
        Ok(())
    }

    pub fn write_activity_map(&self, actmap: &ActivityMap) -> CoreResult<()> {
        let path = self.bin_path(actmap.nuclide(), "actmap.tif");
        actmap.write(&path)
    }

    pub fn write_coords(&self, x: &[f64], y: &[f64]) -> CoreResult<()> {
        let path = self.bin_dir().join("coords.npz");
        let file = fs::File::create(path)?;
        let mut writer = NpzWriter::new(file);
        writer
            .add_array("x", &ndarray::Array1::from_vec(x.to_vec()))
            .map_err(|e| CoreError::raster(e.to_string()))?;
        writer
            .add_array("y", &ndarray::Array1::from_vec(y.to_vec()))
            .map_err(|e| CoreError::raster(e.to_string()))?;
        writer.finish().map_err(|e| CoreError::raster(e.to_string()))?;
        Ok(())
    }

    /// Persists one [`DoseGrid`]: a `<nuclide>_<quantity>.npz` per-class
    /// archive for each of the eight quantities, plus the two acute/period
    /// `e_max_10` scalar grids as plain `.npy`.
    pub fn write_dose_grid(&self, grid: &DoseGrid) -> CoreResult<()> {
        self.write_class_archive(&grid.nuclide, "e_total_10_acute", &grid.e_total_acute)?;
        self.write_class_archive(&grid.nuclide, "e_total_10_period", &grid.e_total_period)?;
        self.write_class_archive(&grid.nuclide, "e_inh", &grid.e_inhalation)?;
        self.write_class_archive(&grid.nuclide, "e_surface", &grid.e_surface)?;
        self.write_class_archive(&grid.nuclide, "e_cloud", &grid.e_cloud)?;
        self.write_class_archive(&grid.nuclide, "e_food", &grid.e_food)?;
        self.write_class_archive(&grid.nuclide, "concentration_integrals", &grid.concentration_integral)?;
        self.write_class_archive(&grid.nuclide, "depositions", &grid.deposition)?;

        write_npy(self.bin_path(&grid.nuclide, "e_max_10_acute.npy"), &grid.e_max_acute)
            .map_err(|e| CoreError::raster(e.to_string()))?;
        write_npy(self.bin_path(&grid.nuclide, "e_max_10_period.npy"), &grid.e_max_period)
            .map_err(|e| CoreError::raster(e.to_string()))?;
        Ok(())
    }

    fn write_class_archive(
        &self,
        nuclide: &str,
        quantity: &str,
        grids: &HashMap<StabilityClass, ndarray::Array2<f64>>,
    ) -> CoreResult<()> {
        let path = self.bin_path(nuclide, &format!("{quantity}.npz"));
        let file = fs::File::create(path)?;
        let mut writer = NpzWriter::new(file);
        for class in StabilityClass::ALL {
            if let Some(array) = grids.get(&class) {
                writer
                    .add_array(class.as_str(), array)
                    .map_err(|e| CoreError::raster(e.to_string()))?;
            }
        }
        writer.finish().map_err(|e| CoreError::raster(e.to_string()))?;
        Ok(())
    }

    /// Writes `special_points.csv` at the report root: one row per
    /// (point, nuclide), in the order `rows` was built in.
    pub fn write_special_points(&self, rows: &[SpecialPointRow]) -> CoreResult<()> {
        let path = self.root.join("special_points.csv");
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .quote(b'\'')
            .from_path(path)?;

        let mut header = vec!["point", "x", "y", "nuclide", "E_max_acute", "E_max_period"];
        let class_columns: Vec<String> = ["e_total_10_acute", "e_total_10_period", "e_inh", "e_surface", "e_cloud", "e_food", "concentration_integral", "deposition", "depletion"]
            .iter()
            .flat_map(|quantity| StabilityClass::ALL.iter().map(move |class| format!("{quantity}_{class}")))
            .collect();
        header.extend(class_columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in rows {
            let mut record = vec![
                row.point.clone(),
                row.x.to_string(),
                row.y.to_string(),
                row.nuclide.clone(),
                row.sample.e_max_acute.to_string(),
                row.sample.e_max_period.to_string(),
            ];
            for map in [
                &row.sample.e_total_acute,
                &row.sample.e_total_period,
                &row.sample.e_inhalation,
                &row.sample.e_surface,
                &row.sample.e_cloud,
                &row.sample.e_food,
                &row.sample.concentration_integral,
                &row.sample.deposition,
                &row.sample.depletion,
            ] {
                for class in StabilityClass::ALL {
                    record.push(map.get(&class).copied().unwrap_or(0.0).to_string());
                }
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamped_name_follows_the_original_convention() {
        let at = Local.with_ymd_and_hms(2026, 7, 28, 14, 5, 9).unwrap();
        let name = ReportDir::timestamped_name(Path::new("/tmp"), at);
        assert_eq!(name, PathBuf::from("/tmp/report_28-07-2026_14-05-09"));
    }
}
