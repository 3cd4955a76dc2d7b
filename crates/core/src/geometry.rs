//! Sliding-window position generation shared by split and merge.
//!
//! The ordered `(x, y)` sequence produced here is the contract between the
//! two halves of the pipeline: patch `i` extracted by [`crate::tiler::split`]
//! is written back at position `i` by [`crate::merger::merge`]. Both sides
//! must derive the sequence from [`tile_positions`] — nothing else may
//! assume a particular ordering.

use serde::{Deserialize, Serialize};

use crate::error::{Axis, GeometryError};

/// Fixed inference window `(height, width)`, taken from the model's input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub height: usize,
    pub width: usize,
}

impl Window {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Patch-origin offsets along each axis. Horizontal and vertical stride are
/// independent; a single-stride convenience is [`Strides::uniform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strides {
    pub x: usize,
    pub y: usize,
}

impl Strides {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn uniform(s: usize) -> Self {
        Self { x: s, y: s }
    }
}

/// Window origins along one axis, in sweep order.
///
/// The stride sweep uses a strict `<` guard, so it stops before a window
/// would overrun the far edge. If the last stride position lands flush on
/// the edge (`pos + win == dim`) it is emitted as part of the sweep;
/// otherwise one extra edge-aligned position `dim - win` is appended so the
/// final row/column of pixels is always covered. The edge-aligned origin
/// overlaps its predecessor — merge resolves the overlap by write order.
fn axis_positions(dim: usize, win: usize, stride: usize, axis: Axis) -> Result<Vec<usize>, GeometryError> {
    debug_assert!(win >= 1 && stride >= 1);

    if dim < win {
        return Err(GeometryError::DegenerateImage { axis, dim, win });
    }

    let mut positions = Vec::with_capacity(dim / stride + 2);
    let mut pos = 0;
    while pos + win < dim {
        positions.push(pos);
        pos += stride;
    }

    if pos + win == dim {
        positions.push(pos);
    } else {
        positions.push(dim - win);
    }

    Ok(positions)
}

/// Generate the ordered top-left `(x, y)` origins covering an `h`×`w` image
/// with `window`-sized patches at the given strides.
///
/// Raster-scan order: rows top to bottom, positions left to right within a
/// row, with the edge-aligned column/row/corner positions interleaved at the
/// end of each sweep. Deterministic for fixed inputs.
///
/// Fails with [`GeometryError::DegenerateImage`] when the image is smaller
/// than the window along either axis. An image exactly equal to the window
/// yields the single position `(0, 0)`.
pub fn tile_positions(
    h: usize,
    w: usize,
    window: Window,
    strides: Strides,
) -> Result<Vec<(usize, usize)>, GeometryError> {
    let xs = axis_positions(w, window.width, strides.x, Axis::Horizontal)?;
    let ys = axis_positions(h, window.height, strides.y, Axis::Vertical)?;

    let mut positions = Vec::with_capacity(xs.len() * ys.len());
    for &y in &ys {
        for &x in &xs {
            positions.push((x, y));
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple_has_no_edge_positions() {
        let positions = tile_positions(8, 8, Window::new(4, 4), Strides::uniform(4)).unwrap();
        assert_eq!(positions, vec![(0, 0), (4, 0), (0, 4), (4, 4)]);
    }

    #[test]
    fn test_non_multiple_injects_edge_positions() {
        let positions = tile_positions(10, 10, Window::new(4, 4), Strides::uniform(4)).unwrap();
        assert_eq!(
            positions,
            vec![
                (0, 0),
                (4, 0),
                (6, 0),
                (0, 4),
                (4, 4),
                (6, 4),
                (0, 6),
                (4, 6),
                (6, 6),
            ]
        );
        // Bottom-right corner is flush against both edges and comes last.
        assert_eq!(*positions.last().unwrap(), (6, 6));
    }

    #[test]
    fn test_window_equal_to_image_yields_single_origin() {
        let positions = tile_positions(4, 4, Window::new(4, 4), Strides::uniform(4)).unwrap();
        assert_eq!(positions, vec![(0, 0)]);
    }

    #[test]
    fn test_image_smaller_than_window_fails() {
        let err = tile_positions(3, 10, Window::new(4, 4), Strides::uniform(4)).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DegenerateImage {
                axis: Axis::Vertical,
                dim: 3,
                win: 4
            }
        ));

        let err = tile_positions(10, 2, Window::new(4, 4), Strides::uniform(4)).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DegenerateImage {
                axis: Axis::Horizontal,
                dim: 2,
                win: 4
            }
        ));
    }

    #[test]
    fn test_asymmetric_strides() {
        // Horizontal stride 2, vertical stride 3 over a 10x8 image.
        let positions = tile_positions(10, 8, Window::new(4, 4), Strides::new(2, 3)).unwrap();
        let xs: Vec<usize> = positions.iter().take(3).map(|&(x, _)| x).collect();
        assert_eq!(xs, vec![0, 2, 4]);
        let ys: Vec<usize> = positions.iter().map(|&(_, y)| y).step_by(3).collect();
        assert_eq!(ys, vec![0, 3, 6]);
    }

    #[test]
    fn test_stride_landing_on_edge_is_not_duplicated() {
        // dim 10, win 4, stride 3: sweep reaches 6 and 6 + 4 == 10 exactly.
        let positions = tile_positions(4, 10, Window::new(4, 4), Strides::new(3, 3)).unwrap();
        let xs: Vec<usize> = positions.iter().map(|&(x, _)| x).collect();
        assert_eq!(xs, vec![0, 3, 6]);
    }

    #[test]
    fn test_raster_order_is_row_major() {
        let positions = tile_positions(10, 10, Window::new(4, 4), Strides::uniform(3)).unwrap();
        for pair in positions.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            assert!(y1 > y0 || (y1 == y0 && x1 > x0), "not raster order: {pair:?}");
        }
    }

    #[test]
    fn test_full_coverage() {
        // Every pixel must fall inside at least one window.
        let (h, w) = (23, 17);
        let window = Window::new(5, 6);
        let strides = Strides::new(4, 3);
        let positions = tile_positions(h, w, window, strides).unwrap();

        let mut covered = vec![vec![false; w]; h];
        for &(x, y) in &positions {
            for row in covered.iter_mut().skip(y).take(window.height) {
                for cell in row.iter_mut().skip(x).take(window.width) {
                    *cell = true;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&c| c));
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let a = tile_positions(37, 41, Window::new(8, 8), Strides::new(5, 7)).unwrap();
        let b = tile_positions(37, 41, Window::new(8, 8), Strides::new(5, 7)).unwrap();
        assert_eq!(a, b);
    }
}
