//! Split: decompose an image into a normalized batch of model-sized patches.

use ndarray::{s, Array4, ArrayView3};
use tracing::debug;

use crate::error::GeometryError;
use crate::geometry::{tile_positions, Strides, Window};

/// Extract every window position of `image` into an NHWC float batch.
///
/// `image` is HWC with u8 samples; the returned batch has shape
/// `(n, window.height, window.width, c)` with samples normalized to `[0, 1]`
/// by dividing by 255. Patch `i` corresponds to position `i` of
/// [`tile_positions`] for the image shape — [`crate::merger::merge`] relies
/// on that ordering to invert the placement.
pub fn split(
    image: ArrayView3<'_, u8>,
    window: Window,
    strides: Strides,
) -> Result<Array4<f32>, GeometryError> {
    let (h, w, c) = image.dim();
    let positions = tile_positions(h, w, window, strides)?;

    debug!(
        h,
        w,
        c,
        window = %window,
        stride_x = strides.x,
        stride_y = strides.y,
        patches = positions.len(),
        "Splitting image into patch batch"
    );

    // Patch count is known up front, so the batch is allocated once and
    // filled in position order instead of growing per patch.
    let mut batch = Array4::<f32>::zeros((positions.len(), window.height, window.width, c));

    for (i, &(x, y)) in positions.iter().enumerate() {
        let src = image.slice(s![y..y + window.height, x..x + window.width, ..]);
        batch
            .slice_mut(s![i, .., .., ..])
            .assign(&src.mapv(|v| v as f32 / 255.0));
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn gradient_image(h: usize, w: usize, c: usize) -> Array3<u8> {
        Array3::from_shape_fn((h, w, c), |(y, x, ch)| {
            ((y * 31 + x * 7 + ch * 3) % 256) as u8
        })
    }

    #[test]
    fn test_patch_count_matches_position_count() {
        let image = gradient_image(10, 10, 3);
        let window = Window::new(4, 4);
        let strides = Strides::uniform(3);

        let positions = tile_positions(10, 10, window, strides).unwrap();
        let batch = split(image.view(), window, strides).unwrap();
        assert_eq!(batch.dim().0, positions.len());
        assert_eq!(batch.dim(), (positions.len(), 4, 4, 3));
    }

    #[test]
    fn test_samples_are_normalized() {
        let image = Array3::<u8>::from_elem((4, 4, 1), 255);
        let batch = split(image.view(), Window::new(4, 4), Strides::uniform(4)).unwrap();
        assert_eq!(batch.dim(), (1, 4, 4, 1));
        assert!(batch.iter().all(|&v| (v - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_patch_content_matches_source_offsets() {
        let image = gradient_image(10, 10, 2);
        let window = Window::new(4, 4);
        let strides = Strides::uniform(4);

        let positions = tile_positions(10, 10, window, strides).unwrap();
        let batch = split(image.view(), window, strides).unwrap();

        for (i, &(x, y)) in positions.iter().enumerate() {
            for dy in 0..4 {
                for dx in 0..4 {
                    let expected = image[[y + dy, x + dx, 1]] as f32 / 255.0;
                    assert_eq!(batch[[i, dy, dx, 1]], expected);
                }
            }
        }
    }

    #[test]
    fn test_split_rejects_undersized_image() {
        let image = gradient_image(3, 10, 3);
        let err = split(image.view(), Window::new(4, 4), Strides::uniform(4)).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateImage { .. }));
    }
}
