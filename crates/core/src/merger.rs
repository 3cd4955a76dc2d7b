//! Merge: reassemble predicted patches into a full-resolution image.

use ndarray::{s, Array3, ArrayView4};
use tracing::debug;

use crate::error::GeometryError;
use crate::geometry::{tile_positions, Strides, Window};

/// Write each patch of `batch` back at its generation-order position in a
/// fresh `(h, w, c)` buffer.
///
/// Patch samples are expected in the output's native range (0–255); the
/// window is inferred from the batch's own dims and the position sequence is
/// recomputed from the target shape and `strides`, so the batch must line up
/// with a [`crate::tiler::split`] call for the same shape, window and
/// strides. Later writes overwrite earlier ones where the edge-aligned
/// positions overlap the stride grid — boundary pixels come from the
/// edge-aligned patch, deterministically.
///
/// Fails with [`GeometryError::PatchCountMismatch`] when the batch length
/// does not equal the position count for the target shape; the merge aborts
/// rather than writing misaligned data.
pub fn merge(
    batch: ArrayView4<'_, f32>,
    target: (usize, usize, usize),
    strides: Strides,
) -> Result<Array3<u8>, GeometryError> {
    let (h, w, c) = target;
    let (n, win_h, win_w, batch_c) = batch.dim();

    if n == 0 {
        return Err(GeometryError::EmptyBatch);
    }
    if batch_c != c {
        return Err(GeometryError::ChannelMismatch {
            expected: c,
            actual: batch_c,
        });
    }

    let window = Window::new(win_h, win_w);
    let positions = tile_positions(h, w, window, strides)?;

    if positions.len() != n {
        return Err(GeometryError::PatchCountMismatch {
            expected: positions.len(),
            actual: n,
        });
    }

    debug!(
        h,
        w,
        c,
        window = %window,
        patches = n,
        "Merging patch batch into image"
    );

    let mut merged = Array3::<f32>::zeros((h, w, c));
    for (i, &(x, y)) in positions.iter().enumerate() {
        merged
            .slice_mut(s![y..y + win_h, x..x + win_w, ..])
            .assign(&batch.slice(s![i, .., .., ..]));
    }

    Ok(merged.mapv(|v| v.clamp(0.0, 255.0) as u8))
}
