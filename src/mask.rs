//! Mask utilities: power-of-two extension, logical 2x2 binning, and
//! helpers for building hole masks (polygon rasterisation, flood fill,
//! thresholding, boundary extraction).

use crate::component::Component;
use crate::types::{Error, Result};
use ndarray::{s, Array2, ArrayView2};

/// Largest supported mask extent. Keeps linear pixel offsets well inside
/// `i32` range.
const MAX_POW2: usize = 1 << 30;

/// Smallest power of two greater than or equal to `n`.
pub fn next_pow2(n: usize) -> Result<usize> {
    let mut r = 1usize;
    while r < n {
        if r == MAX_POW2 {
            return Err(Error::Binning(format!("{} exceeds the largest supported extent", n)));
        }
        r <<= 1;
    }
    Ok(r)
}

/// Logical 2x2 binning: each output pixel is the AND of the corresponding
/// 2x2 block of input pixels. Both dimensions must be even.
pub fn bin2x2(a: &Array2<bool>) -> Result<Array2<bool>> {
    let (rows, cols) = a.dim();
    if rows % 2 != 0 || cols % 2 != 0 {
        return Err(Error::Binning(format!("{}x{} array is not 2x2-binnable", rows, cols)));
    }
    let mut out = Array2::from_elem((rows / 2, cols / 2), false);
    for r in 0..rows / 2 {
        for c in 0..cols / 2 {
            out[(r, c)] = a[(2 * r, 2 * c)]
                && a[(2 * r + 1, 2 * c)]
                && a[(2 * r, 2 * c + 1)]
                && a[(2 * r + 1, 2 * c + 1)];
        }
    }
    Ok(out)
}

/// Logical 2x2 unbinning: every pixel of the output 2x2 block is set
/// whenever the corresponding input pixel is set.
pub fn unbin2x2(a: &Array2<bool>) -> Array2<bool> {
    let (rows, cols) = a.dim();
    let mut out = Array2::from_elem((2 * rows, 2 * cols), false);
    for r in 0..rows {
        for c in 0..cols {
            if a[(r, c)] {
                out[(2 * r, 2 * c)] = true;
                out[(2 * r + 1, 2 * c)] = true;
                out[(2 * r, 2 * c + 1)] = true;
                out[(2 * r + 1, 2 * c + 1)] = true;
            }
        }
    }
    out
}

/// Copy `mask` into the top-left corner of an array whose dimensions are
/// rounded up to the next power of two, zero-filling the growth.
pub fn extend_to_pow2(mask: ArrayView2<bool>) -> Result<Array2<bool>> {
    let (rows, cols) = mask.dim();
    let ext_rows = next_pow2(rows)?;
    let ext_cols = next_pow2(cols)?;
    let mut out = Array2::from_elem((ext_rows, ext_cols), false);
    out.slice_mut(s![..rows, ..cols]).assign(&mask);
    Ok(out)
}

/// Build a boolean hole mask from an image channel: a pixel is a hole iff
/// its component value differs from the component type's zero.
pub fn mask_from_channel<C: Component>(channel: ArrayView2<C>) -> Array2<bool> {
    channel.map(|&v| v != C::ZERO)
}

/// Set a single straight run of pixels between two points, stepping along
/// the dominant axis.
fn draw_line(mask: &mut Array2<bool>, from: (usize, usize), to: (usize, usize)) {
    let (r0, c0) = (from.0 as f32, from.1 as f32);
    let dr = to.0 as f32 - r0;
    let dc = to.1 as f32 - c0;
    let steps = dr.abs().max(dc.abs()) as usize;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
        let r = (r0 + t * dr + 0.5) as usize;
        let c = (c0 + t * dc + 0.5) as usize;
        if r < mask.nrows() && c < mask.ncols() {
            mask[(r, c)] = true;
        }
    }
}

/// Rasterise a closed polygonal perimeter into the mask.
///
/// Vertices are `(row, col)` pairs. The polygon is closed automatically if
/// the last vertex differs from the first.
pub fn draw_polyline(mask: &mut Array2<bool>, vertices: &[(usize, usize)]) {
    if vertices.is_empty() {
        return;
    }
    let mut points = vertices.to_vec();
    if points.first() != points.last() {
        points.push(points[0]);
    }
    for pair in points.windows(2) {
        draw_line(mask, pair[0], pair[1]);
    }
}

/// Flood-fill outward from `seed`, setting pixels until a closed border of
/// already-set pixels is reached. 4-connected, iterative.
pub fn flood_fill(mask: &mut Array2<bool>, seed: (usize, usize)) {
    let (rows, cols) = mask.dim();
    if seed.0 >= rows || seed.1 >= cols || mask[seed] {
        return;
    }
    let mut stack = vec![seed];
    while let Some((r, c)) = stack.pop() {
        if mask[(r, c)] {
            continue;
        }
        mask[(r, c)] = true;
        if r > 0 {
            stack.push((r - 1, c));
        }
        if r + 1 < rows {
            stack.push((r + 1, c));
        }
        if c > 0 {
            stack.push((r, c - 1));
        }
        if c + 1 < cols {
            stack.push((r, c + 1));
        }
    }
}

/// Pixels outside the mask with at least one masked 4-neighbour, in
/// row-major order.
pub fn boundary(mask: &Array2<bool>) -> Vec<(usize, usize)> {
    let (rows, cols) = mask.dim();
    let mut out = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if mask[(r, c)] {
                continue;
            }
            let near_hole = (r > 0 && mask[(r - 1, c)])
                || (r + 1 < rows && mask[(r + 1, c)])
                || (c > 0 && mask[(r, c - 1)])
                || (c + 1 < cols && mask[(r, c + 1)]);
            if near_hole {
                out.push((r, c));
            }
        }
    }
    out
}
