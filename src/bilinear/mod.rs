//! Bilinear-accelerated approximate Dirichlet solver.
//!
//! Large fully-interior square regions of the hole are filled by bilinear
//! interpolation between sparse corner unknowns instead of being solved
//! for, which shrinks the linear system dramatically while staying visually
//! indistinguishable from the exact solution.

pub mod squares;
pub mod weights;

pub use squares::{Square, SQUARE_INTERIOR};
pub use weights::{Stencil, Weights};

use crate::component::Component;
use crate::mask::mask_from_channel;
use crate::system::SpdSystem;
use crate::types::{Error, Result, SolveMethod};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use squares::Analysis;

/// Approximate hole-filling solver for one `(mask, width, height)`
/// combination.
///
/// Construction analyses the mask (square registration plus stencil
/// assignment) and assembles and factors the reduced SPD system. The
/// analysis products stay observable for tests and visualisation.
pub struct BilinearSolver {
    width: usize,
    height: usize,
    weights: Weights,
    map: Array2<i32>,
    coords: Vec<(usize, usize)>,
    squares: Vec<Square>,
    extended: Array2<bool>,
    /// Boundary couplings per reduced row: `(row, linear offset, weight)`.
    boundary_terms: Vec<(u32, u32, f64)>,
    system: SpdSystem,
}

/// Jump span encoded in a centre weight. Square edge rows carry
/// `|centre| = 3s + 1` with `s >= 3`; every other live row behaves as
/// `s = 1`.
fn jump_span(center_magnitude: i16) -> i16 {
    if center_magnitude >= 10 && (center_magnitude - 1) % 3 == 0 {
        (center_magnitude - 1) / 3
    } else {
        1
    }
}

impl BilinearSolver {
    /// Build from a boolean hole mask.
    pub fn new(mask: ArrayView2<bool>, method: SolveMethod) -> Result<Self> {
        let (height, width) = mask.dim();
        let analysis = squares::analyse(mask)?;
        Self::build(analysis, width, height, method)
    }

    /// Build from a mask image channel: a pixel is a hole iff its value is
    /// not the component type's zero.
    pub fn from_channel<C: Component>(mask: ArrayView2<C>, method: SolveMethod) -> Result<Self> {
        let hole_mask = mask_from_channel(mask);
        Self::new(hole_mask.view(), method)
    }

    /// Build from an explicit list of `(row, col)` hole pixels. Entries
    /// outside the image are logged and dropped; unlike the exact solver,
    /// pixels on the image edge are kept and get reduced stencils.
    pub fn from_coords(
        coords: &[(usize, usize)],
        width: usize,
        height: usize,
        method: SolveMethod,
    ) -> Result<Self> {
        let mut mask = Array2::from_elem((height, width), false);
        for &(r, c) in coords {
            if r < height && c < width {
                mask[(r, c)] = true;
            } else {
                log::warn!("hole pixel ({}, {}) out of bounds; dropped", r, c);
            }
        }
        Self::new(mask.view(), method)
    }

    fn build(analysis: Analysis, width: usize, height: usize, method: SolveMethod) -> Result<Self> {
        let Analysis {
            weights,
            map,
            coords,
            squares,
            extended,
        } = analysis;

        let n = coords.len();
        let mut triplets = Vec::with_capacity(5 * n);
        let mut boundary_terms = Vec::new();

        // Every row is scaled by 1/s, which leaves the solution untouched
        // and makes the assembled matrix symmetric: the edge-to-corner
        // coupling s/s meets the corner-to-edge coupling 1/1, and facing
        // edge pixels couple at 1/s on both sides.
        for (i, &(r, c)) in coords.iter().enumerate() {
            let st = weights.stencil(r, c);
            let magnitude = -st.cen;
            debug_assert!(magnitude > 0);
            let span = jump_span(magnitude);
            let scale = span as f64;
            triplets.push((i, i, magnitude as f64 / scale));

            let directions = [
                (st.lft, 0isize, -1isize),
                (st.rgt, 0, 1),
                (st.top, -1, 0),
                (st.bot, 1, 0),
            ];
            for (w, dr, dc) in directions {
                if w == 0 {
                    continue;
                }
                // On a square edge the unit weight points across the
                // square at the facing edge pixel, `span` pixels away.
                let distance = if span > 1 && w == 1 { span as isize } else { 1 };
                let qr = (r as isize + dr * distance) as usize;
                let qc = (c as isize + dc * distance) as usize;
                let value = w as f64 / scale;
                let entry = map[(qr, qc)];
                if entry >= 0 {
                    triplets.push((i, entry as usize, -value));
                } else {
                    debug_assert_ne!(entry, SQUARE_INTERIOR);
                    boundary_terms.push((i as u32, (qr * width + qc) as u32, value));
                }
            }
        }

        let system = SpdSystem::assemble(n, &triplets, method)?;

        Ok(Self {
            width,
            height,
            weights,
            map,
            coords,
            squares,
            extended,
            boundary_terms,
            system,
        })
    }

    /// Number of reduced unknowns (square corners and edges plus every
    /// hole pixel outside the squares).
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reduced catalogue in solution order.
    pub fn coords(&self) -> &[(usize, usize)] {
        &self.coords
    }

    /// Coordinate map: `-1` at boundary pixels, `-2` inside registered
    /// squares, the reduced-catalogue index at unknowns.
    pub fn coords_map(&self) -> &Array2<i32> {
        &self.map
    }

    /// Stencil weights assigned by the analysis.
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Registered interpolation squares.
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// The power-of-two extended mask after square registration.
    pub fn extended_mask(&self) -> &Array2<bool> {
        &self.extended
    }

    fn check_dims<C>(&self, image: &ArrayView2<C>) -> Result<()> {
        let (height, width) = image.dim();
        if width != self.width || height != self.height {
            return Err(Error::Mask(format!(
                "{}x{} image does not match {}x{} solver",
                width, height, self.width, self.height
            )));
        }
        Ok(())
    }

    fn rhs<C: Component>(&self, image: &ArrayView2<C>) -> Vec<f64> {
        let mut b = vec![0.0f64; self.len()];
        for &(i, offset, value) in &self.boundary_terms {
            let offset = offset as usize;
            let (r, c) = (offset / self.width, offset % self.width);
            b[i as usize] += value * image[(r, c)].to_f64();
        }
        b
    }

    /// Solve the reduced system for one image channel without modifying it.
    ///
    /// The returned vector covers the reduced catalogue only; square
    /// interiors are produced during [`BilinearSolver::fill`].
    pub fn solve<C: Component>(&self, image: ArrayView2<C>) -> Result<Vec<f32>> {
        self.check_dims(&image)?;
        let b = self.rhs(&image);
        let x = self.system.solve(&b);
        Ok(x.into_iter().map(|v| v as f32).collect())
    }

    /// Solve, write the reduced solution back with component rounding, then
    /// fill every registered square's strict interior by bilinear
    /// interpolation from its four corner pixels.
    pub fn fill<C: Component>(&self, mut image: ArrayViewMut2<C>) -> Result<Vec<f32>> {
        let x = self.solve(image.view())?;
        for (i, &(r, c)) in self.coords.iter().enumerate() {
            image[(r, c)] = C::from_solution(x[i]);
        }
        for sq in &self.squares {
            interpolate_square(&mut image, sq);
        }
        Ok(x)
    }
}

/// Bilinearly interpolate a square's strict interior from its corner
/// pixels, which hold solved values by the time this runs.
fn interpolate_square<C: Component>(image: &mut ArrayViewMut2<C>, sq: &Square) {
    let s = (sq.side - 1) as f64;
    let tl = image[(sq.top, sq.left)].to_f64();
    let tr = image[(sq.top, sq.right())].to_f64();
    let bl = image[(sq.bottom(), sq.left)].to_f64();
    let br = image[(sq.bottom(), sq.right())].to_f64();

    for r in sq.top + 1..sq.bottom() {
        let u = (r - sq.top) as f64 / s;
        for c in sq.left + 1..sq.right() {
            let v = (c - sq.left) as f64 / s;
            let value = tl * (1.0 - u) * (1.0 - v)
                + tr * (1.0 - u) * v
                + bl * u * (1.0 - v)
                + br * u * v;
            image[(r, c)] = C::from_solution(value as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn centered_hole(extent: usize, margin: usize) -> Array2<bool> {
        let mut mask = Array2::from_elem((extent, extent), false);
        for r in margin..extent - margin {
            for c in margin..extent - margin {
                mask[(r, c)] = true;
            }
        }
        mask
    }

    #[test]
    fn test_jump_span_decoding() {
        assert_eq!(jump_span(2), 1);
        assert_eq!(jump_span(3), 1);
        assert_eq!(jump_span(4), 1);
        assert_eq!(jump_span(10), 3);
        assert_eq!(jump_span(22), 7);
        assert_eq!(jump_span(46), 15);
    }

    #[test]
    fn test_constant_boundary_fills_constant() {
        let mask = centered_hole(12, 3);
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        assert_eq!(solver.squares().len(), 1);
        assert_eq!(solver.len(), 32);

        let mut image = Array2::from_elem((12, 12), 77u16);
        for r in 3..9 {
            for c in 3..9 {
                image[(r, c)] = 0;
            }
        }
        solver.fill(image.view_mut()).unwrap();
        assert!(image.iter().all(|&v| v == 77));
    }

    #[test]
    fn test_affine_boundary_is_reproduced_through_squares() {
        let mask = centered_hole(12, 3);
        for method in [SolveMethod::Cholesky, SolveMethod::ConjugateGradient] {
            let solver = BilinearSolver::new(mask.view(), method).unwrap();
            let mut image = Array2::from_shape_fn((12, 12), |(r, c)| (r as f32) + 2.0 * c as f32);
            for r in 3..9 {
                for c in 3..9 {
                    image[(r, c)] = 0.0;
                }
            }
            solver.fill(image.view_mut()).unwrap();
            for r in 0..12 {
                for c in 0..12 {
                    let expected = (r as f32) + 2.0 * c as f32;
                    assert!(
                        (image[(r, c)] - expected).abs() < 1e-4,
                        "({}, {}): {} vs {}",
                        r,
                        c,
                        image[(r, c)],
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mask = centered_hole(16, 3);
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let mut image =
            Array2::from_shape_fn((16, 16), |(r, c)| ((r * 23 + c * 11) % 200) as u16 + 100);
        solver.fill(image.view_mut()).unwrap();
        let once = image.clone();
        solver.fill(image.view_mut()).unwrap();
        assert_eq!(image, once);
    }

    #[test]
    fn test_edge_hole_solves_to_neighbor_mean() {
        // A hole on the image edge keeps a reduced three-neighbour stencil.
        let mut mask = Array2::from_elem((5, 5), false);
        mask[(0, 2)] = true;
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        assert_eq!(solver.len(), 1);

        let mut image = Array2::from_elem((5, 5), 30u16);
        image[(0, 1)] = 10;
        image[(0, 3)] = 20;
        image[(1, 2)] = 60;
        image[(0, 2)] = 0;
        let x = solver.solve(image.view()).unwrap();
        assert!((x[0] - 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_analysis_state_is_observable() {
        let mask = centered_hole(12, 3);
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let sq = solver.squares()[0];

        // The map inverts the reduced catalogue, and the centre weight
        // plane marks exactly the catalogued unknowns.
        let map = solver.coords_map();
        for (i, &(r, c)) in solver.coords().iter().enumerate() {
            assert_eq!(map[(r, c)], i as i32);
        }
        let cen = solver.weights().cen();
        for r in 0..12 {
            for c in 0..12 {
                assert_eq!(cen[(r, c)] != 0, map[(r, c)] >= 0, "pixel ({}, {})", r, c);
            }
        }

        // The extended mask is power-of-two sized and stripped over the
        // registered square, while cushion holes stay set.
        let ext = solver.extended_mask();
        assert_eq!(ext.dim(), (16, 16));
        for r in sq.top..=sq.bottom() {
            for c in sq.left..=sq.right() {
                assert!(!ext[(r, c)]);
            }
        }
        assert!(ext[(3, 3)]);
        assert!(!ext[(0, 0)]);
        assert!(!ext[(12, 12)]);
    }

    #[test]
    fn test_empty_mask_is_inert() {
        let mask = Array2::from_elem((8, 8), false);
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        assert!(solver.is_empty());
        let mut image = Array2::from_elem((8, 8), 5u8);
        let x = solver.fill(image.view_mut()).unwrap();
        assert!(x.is_empty());
        assert!(image.iter().all(|&v| v == 5));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mask = Array2::from_elem((8, 8), false);
        let solver = BilinearSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let image = Array2::from_elem((8, 9), 0u16);
        assert!(solver.solve(image.view()).is_err());
    }
}
