//! Single-band GeoTIFF I/O and the affine pixel/world mapping shared by
//! the classified shoreline raster and the activity maps built on top of
//! it.
//!
//! The `tiff` crate reads and writes raster samples but doesn't parse
//! GeoTIFF's own georeferencing tags, so the affine transform and CRS
//! travel alongside the file rather than being recovered from it —
//! callers supply them from the scenario's basin/raster configuration.

use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{CoreError, CoreResult};

/// Maps pixel indices to world coordinates following the
/// `translation(ul) * scale(step, -step)` convention: row grows downward,
/// world y decreases as row grows, pixels are square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub ul_x: f64,
    pub ul_y: f64,
    pub step: f64,
}

impl AffineTransform {
    pub fn new(ul_x: f64, ul_y: f64, step: f64) -> Self {
        Self { ul_x, ul_y, step }
    }

    /// World coordinate of a pixel's upper-left corner.
    pub fn corner(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.ul_x + col as f64 * self.step,
            self.ul_y - row as f64 * self.step,
        )
    }

    /// World coordinate of a pixel's center.
    pub fn center(&self, row: usize, col: usize) -> (f64, f64) {
        let (x, y) = self.corner(row, col);
        (x + self.step / 2.0, y - self.step / 2.0)
    }

    /// Pixel resolution needed to cover `[ul, lr)` with `step`-sized
    /// cells, rounding down like the original's `math.floor`.
    pub fn resolution_for(ul_x: f64, ul_y: f64, lr_x: f64, lr_y: f64, step: f64) -> (usize, usize) {
        let x_res = ((lr_x - ul_x) / step).abs().floor() as usize;
        let y_res = ((ul_y - lr_y) / step).abs().floor() as usize;
        (x_res, y_res)
    }
}

/// A classified single-band raster, binarized to a basin/not-basin mask
/// on load. The source raster can carry more classification codes than
/// the one this crate treats as "basin interior"; everything else reads
/// as background.
pub struct ClassifiedRaster {
    pub width: usize,
    pub height: usize,
    mask: Vec<u8>,
    pub transform: AffineTransform,
    pub crs: String,
}

impl ClassifiedRaster {
    /// Loads `path` and keeps only pixels equal to `basin_code` as
    /// mask value 255, everything else as 0 — net effect of the
    /// original's two chained thresholds (`TOZERO_INV` at 2, then
    /// `BINARY` at 1).
    pub fn open(
        path: &Path,
        basin_code: u16,
        crs: impl Into<String>,
        transform: AffineTransform,
    ) -> CoreResult<Self> {
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file).map_err(|e| CoreError::raster(e.to_string()))?;
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| CoreError::raster(e.to_string()))?;
        let image = decoder
            .read_image()
            .map_err(|e| CoreError::raster(e.to_string()))?;
        let raw: Vec<u16> = match image {
            DecodingResult::U8(v) => v.into_iter().map(u16::from).collect(),
            DecodingResult::U16(v) => v,
            _ => return Err(CoreError::raster("unsupported sample format for classified raster")),
        };
        let mask = raw
            .into_iter()
            .map(|v| if v == basin_code { 255 } else { 0 })
            .collect();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            mask,
            transform,
            crs: crs.into(),
        })
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.mask[row * self.width + col]
    }

    /// Builds a raster directly from an already-binarized mask, bypassing
    /// file I/O. Used by tests and by callers that rasterize basin masks
    /// in memory instead of reading them from disk.
    pub fn from_mask(
        width: usize,
        height: usize,
        mask: Vec<u8>,
        transform: AffineTransform,
        crs: impl Into<String>,
    ) -> Self {
        Self {
            width,
            height,
            mask,
            transform,
            crs: crs.into(),
        }
    }
}

/// Writes a single-band `u16` raster (the activity map's raster-coded
/// cells) to `path` as a GreyA-free, single-sample GeoTIFF.
pub fn write_u16_raster(path: &Path, width: usize, height: usize, data: &[u16]) -> CoreResult<()> {
    let file = std::fs::File::create(path)?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| CoreError::raster(e.to_string()))?;
    encoder
        .write_image::<colortype::Gray16>(width as u32, height as u32, data)
        .map_err(|e| CoreError::raster(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_and_center_track_the_affine_convention() {
        let t = AffineTransform::new(0.0, 100.0, 10.0);
        assert_eq!(t.corner(0, 0), (0.0, 100.0));
        assert_eq!(t.corner(1, 1), (10.0, 90.0));
        assert_eq!(t.center(0, 0), (5.0, 95.0));
    }

    #[test]
    fn resolution_floors_like_the_original() {
        let (x_res, y_res) = AffineTransform::resolution_for(0.0, 100.0, 95.0, 5.0, 10.0);
        assert_eq!((x_res, y_res), (9, 9));
    }
}
