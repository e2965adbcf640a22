//! Bilinear resize (half-pixel centers, no corner alignment).
//!
//! Matches the usual deep-learning "bilinear, align_corners = false" sampling so
//! that inputs prepared for a surrogate model line up with what the target model
//! was trained on.

use ndarray::{Array4, ArrayView4};

use crate::logic::error::{AttackError, AttackResult};

/// Source sampling position for one output coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    weight: f32,
}

fn taps(in_size: usize, out_size: usize) -> Vec<Tap> {
    let scale = in_size as f32 / out_size as f32;

    (0..out_size)
        .map(|dst| {
            let src = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
            let lo = (src.floor() as usize).min(in_size - 1);
            let hi = (lo + 1).min(in_size - 1);
            Tap { lo, hi, weight: src - lo as f32 }
        })
        .collect()
}

/// Resize every image in an NCHW batch to `(height, width)`
pub fn resize_bilinear(input: ArrayView4<'_, f32>, size: (usize, usize)) -> AttackResult<Array4<f32>> {
    let (n, c, in_h, in_w) = input.dim();
    let (out_h, out_w) = size;

    if in_h == 0 || in_w == 0 || out_h == 0 || out_w == 0 {
        return Err(AttackError::Shape(format!(
            "cannot resize {}x{} to {}x{}",
            in_h, in_w, out_h, out_w
        )));
    }

    if (in_h, in_w) == (out_h, out_w) {
        return Ok(input.to_owned());
    }

    let rows = taps(in_h, out_h);
    let cols = taps(in_w, out_w);
    let mut output = Array4::<f32>::zeros((n, c, out_h, out_w));

    for b in 0..n {
        for ch in 0..c {
            let plane = input.slice(ndarray::s![b, ch, .., ..]);
            for (y, row) in rows.iter().enumerate() {
                for (x, col) in cols.iter().enumerate() {
                    let top = plane[[row.lo, col.lo]] * (1.0 - col.weight)
                        + plane[[row.lo, col.hi]] * col.weight;
                    let bottom = plane[[row.hi, col.lo]] * (1.0 - col.weight)
                        + plane[[row.hi, col.hi]] * col.weight;
                    output[[b, ch, y, x]] = top * (1.0 - row.weight) + bottom * row.weight;
                }
            }
        }
    }

    log::debug!("Resized {}x{} -> {}x{} ({} images)", in_h, in_w, out_h, out_w, n);
    Ok(output)
}
