//! Perturbed tensor -> PNG
//!
//! The batch dimension is dropped, CHW becomes HWC and values are scaled from
//! `[0, 1]` to bytes. Models fed BGR input get their channels swapped back so the
//! saved image looks right.

use std::path::Path;

use image::{GrayImage, ImageFormat, RgbImage};
use ndarray::{ArrayView3, ArrayView4, Axis};

use super::writer::{create_parent_dirs, ensure_extension, PNG_EXT};
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::model::ChannelOrder;

/// `[0, 1]` float to byte; out-of-range values saturate, fractions truncate
pub fn to_byte(v: f32) -> u8 {
    (v * 255.0).clamp(0.0, 255.0) as u8
}

/// CHW floats to interleaved HWC bytes
pub fn to_hwc_bytes(chw: ArrayView3<'_, f32>, order: ChannelOrder) -> AttackResult<Vec<u8>> {
    let (channels, height, width) = chw.dim();

    let channel_map: &[usize] = match (channels, order) {
        (1, _) => &[0],
        (3, ChannelOrder::Rgb) => &[0, 1, 2],
        (3, ChannelOrder::Bgr) => &[2, 1, 0],
        (n, _) => {
            return Err(AttackError::Shape(format!(
                "cannot save a {}-channel tensor as PNG (need 1 or 3)",
                n
            )))
        }
    };

    let mut bytes = Vec::with_capacity(channels * height * width);
    for y in 0..height {
        for x in 0..width {
            for &ch in channel_map {
                bytes.push(to_byte(chw[[ch, y, x]]));
            }
        }
    }
    Ok(bytes)
}

/// Save a `[1, C, H, W]` tensor as PNG
pub fn write_png(path: &Path, tensor: ArrayView4<'_, f32>, order: ChannelOrder) -> AttackResult<()> {
    ensure_extension(path, PNG_EXT)?;

    let (batch, channels, height, width) = tensor.dim();
    if batch != 1 {
        return Err(AttackError::Shape(format!("expected a single image, got a batch of {}", batch)));
    }

    let bytes = to_hwc_bytes(tensor.index_axis(Axis(0), 0), order)?;
    let (w, h) = (width as u32, height as u32);

    create_parent_dirs(path)?;
    match channels {
        1 => GrayImage::from_raw(w, h, bytes)
            .ok_or_else(|| AttackError::Shape("pixel buffer size mismatch".to_string()))?
            .save_with_format(path, ImageFormat::Png)?,
        _ => RgbImage::from_raw(w, h, bytes)
            .ok_or_else(|| AttackError::Shape("pixel buffer size mismatch".to_string()))?
            .save_with_format(path, ImageFormat::Png)?,
    }

    log::info!("Saved {}x{} image to {}", width, height, path.display());
    Ok(())
}
