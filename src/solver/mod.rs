//! Exact Dirichlet solver.
//!
//! Values inside the hole are chosen so that the discrete Laplacian is zero
//! at every hole pixel, with the surrounding non-hole pixels as fixed
//! boundary values. The linear system is assembled once per mask and can
//! then be applied to any number of image channels.

pub mod catalogue;
pub mod neighbors;

pub use catalogue::Catalogue;
pub use neighbors::{Neighbor, NeighborTable};

use crate::component::Component;
use crate::system::SpdSystem;
use crate::types::{Error, Result, SolveMethod};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// Exact hole-filling solver for one `(mask, width, height)` combination.
///
/// Construction catalogues the hole, encodes the neighbour table, and
/// assembles and factors the sparse SPD system. The instance owns its
/// factorisation and is therefore move-only.
pub struct LaplaceSolver {
    width: usize,
    height: usize,
    catalogue: Catalogue,
    neighbors: NeighborTable,
    system: SpdSystem,
}

impl LaplaceSolver {
    /// Build from a boolean hole mask. Non-border pixels that are `true`
    /// become unknowns; the outer one-pixel border is discarded.
    pub fn new(mask: ArrayView2<bool>, method: SolveMethod) -> Result<Self> {
        let (height, width) = mask.dim();
        Self::build(Catalogue::from_hole_mask(mask), width, height, method)
    }

    /// Build from a mask image channel: a pixel is a hole iff its value is
    /// not the component type's zero.
    pub fn from_channel<C: Component>(mask: ArrayView2<C>, method: SolveMethod) -> Result<Self> {
        let (height, width) = mask.dim();
        Self::build(Catalogue::from_mask(mask), width, height, method)
    }

    /// Build from an explicit list of `(row, col)` hole pixels. Entries on
    /// the image edge or outside the image are logged and dropped.
    pub fn from_coords(
        coords: &[(usize, usize)],
        width: usize,
        height: usize,
        method: SolveMethod,
    ) -> Result<Self> {
        Self::build(Catalogue::from_coords(coords, width, height), width, height, method)
    }

    fn build(
        catalogue: Catalogue,
        width: usize,
        height: usize,
        method: SolveMethod,
    ) -> Result<Self> {
        let n = catalogue.len();
        if n == 0 {
            log::debug!("empty hole catalogue; solver is inert");
        }
        let neighbors = NeighborTable::build(&catalogue, width);

        // At most five non-zeros per row: the diagonal plus up to four
        // unknown neighbours.
        let mut triplets = Vec::with_capacity(5 * n);
        for (i, row) in neighbors.iter().enumerate() {
            triplets.push((i, i, 4.0));
            for reference in row {
                if let Neighbor::Unknown(j) = reference {
                    triplets.push((i, *j as usize, -1.0));
                }
            }
        }
        let system = SpdSystem::assemble(n, &triplets, method)?;

        Ok(Self {
            width,
            height,
            catalogue,
            neighbors,
            system,
        })
    }

    /// Number of unknowns.
    pub fn len(&self) -> usize {
        self.catalogue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogue.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Catalogued hole pixels in solution order.
    pub fn coords(&self) -> &[(usize, usize)] {
        self.catalogue.coords()
    }

    /// Reverse map from image position to catalogue index.
    pub fn coords_map(&self) -> &Array2<i32> {
        self.catalogue.map()
    }

    /// Neighbour references of every unknown.
    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
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
        for (i, row) in self.neighbors.iter().enumerate() {
            for reference in row {
                if let Neighbor::Boundary(offset) = reference {
                    let offset = *offset as usize;
                    let (r, c) = (offset / self.width, offset % self.width);
                    b[i] += image[(r, c)].to_f64();
                }
            }
        }
        b
    }

    /// Solve for the hole values of one image channel without modifying it.
    ///
    /// The returned vector has one entry per catalogued pixel, in catalogue
    /// order.
    pub fn solve<C: Component>(&self, image: ArrayView2<C>) -> Result<Vec<f32>> {
        self.check_dims(&image)?;
        let b = self.rhs(&image);
        let x = self.system.solve(&b);
        Ok(x.into_iter().map(|v| v as f32).collect())
    }

    /// Solve and write the result back into the channel, rounding according
    /// to the component type.
    pub fn fill<C: Component>(&self, mut image: ArrayViewMut2<C>) -> Result<Vec<f32>> {
        let x = self.solve(image.view())?;
        for (i, &(r, c)) in self.catalogue.coords().iter().enumerate() {
            image[(r, c)] = C::from_solution(x[i]);
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_single_unknown_is_mean_of_neighbors() {
        let mask = array![[0u8, 0, 0], [0, 1, 0], [0, 0, 0]];
        let solver = LaplaceSolver::from_channel(mask.view(), SolveMethod::Cholesky).unwrap();
        assert_eq!(solver.coords(), &[(1, 1)]);

        let mut image = array![[1u16, 2, 3], [4, 0, 6], [7, 8, 9]];
        let x = solver.fill(image.view_mut()).unwrap();
        assert!((x[0] - 5.0).abs() < 1e-6);
        assert_eq!(image, array![[1, 2, 3], [4, 5, 6], [7, 8, 9]]);
    }

    #[test]
    fn test_constant_boundary_yields_constant_solution() {
        let solver =
            LaplaceSolver::from_coords(&[(1, 1), (2, 1), (3, 1)], 4, 5, SolveMethod::Cholesky)
                .unwrap();
        let image = Array2::from_elem((5, 4), 9u16);
        let x = solver.solve(image.view()).unwrap();
        assert_eq!(x.len(), 3);
        for v in x {
            assert!((v - 9.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_affine_boundary_is_reproduced() {
        // Full 6x6 interior hole, boundary sampled from f(r, c) = r + 2c.
        let mut mask = Array2::from_elem((8, 8), false);
        for r in 1..7 {
            for c in 1..7 {
                mask[(r, c)] = true;
            }
        }
        let image = Array2::from_shape_fn((8, 8), |(r, c)| (r + 2 * c) as f32);

        for method in [SolveMethod::Cholesky, SolveMethod::ConjugateGradient] {
            let solver = LaplaceSolver::new(mask.view(), method).unwrap();
            assert_eq!(solver.len(), 36);
            let x = solver.solve(image.view()).unwrap();
            for (i, &(r, c)) in solver.coords().iter().enumerate() {
                let expected = (r + 2 * c) as f32;
                assert!(
                    (x[i] - expected).abs() < 1e-5,
                    "({}, {}): {} vs {}",
                    r,
                    c,
                    x[i],
                    expected
                );
            }
        }
    }

    #[test]
    fn test_maximum_principle() {
        let mut mask = Array2::from_elem((7, 7), false);
        for r in 1..6 {
            for c in 1..6 {
                mask[(r, c)] = true;
            }
        }
        let image = Array2::from_shape_fn((7, 7), |(r, c)| ((r * 31 + c * 17) % 83) as f64);
        let solver = LaplaceSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let x = solver.solve(image.view()).unwrap();
        for &v in &x {
            assert!(v >= 0.0 && v <= 83.0);
        }
    }

    #[test]
    fn test_empty_mask_is_identity() {
        let mask = Array2::from_elem((5, 5), false);
        let solver = LaplaceSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        assert!(solver.is_empty());

        let mut image = Array2::from_shape_fn((5, 5), |(r, c)| (10 * r + c) as u16);
        let before = image.clone();
        let x = solver.fill(image.view_mut()).unwrap();
        assert!(x.is_empty());
        assert_eq!(image, before);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut mask = Array2::from_elem((6, 6), false);
        for r in 2..4 {
            for c in 1..5 {
                mask[(r, c)] = true;
            }
        }
        let solver = LaplaceSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let mut image = Array2::from_shape_fn((6, 6), |(r, c)| ((r * 13 + c * 7) % 50) as u16);
        solver.fill(image.view_mut()).unwrap();
        let once = image.clone();
        solver.fill(image.view_mut()).unwrap();
        assert_eq!(image, once);
    }

    #[test]
    fn test_observable_state_matches_catalogue() {
        let mut mask = Array2::from_elem((6, 7), false);
        for r in 1..5 {
            for c in 2..5 {
                mask[(r, c)] = true;
            }
        }
        let solver = LaplaceSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();

        // The coordinate map inverts the catalogue and marks nothing else.
        let map = solver.coords_map();
        assert_eq!(map.dim(), (6, 7));
        for (i, &(r, c)) in solver.coords().iter().enumerate() {
            assert_eq!(map[(r, c)], i as i32);
        }
        assert_eq!(map.iter().filter(|&&v| v >= 0).count(), solver.len());

        // Every neighbour reference points one pixel away: unknowns at a
        // valid catalogue row, boundaries at a non-hole image position.
        let table = solver.neighbors();
        assert_eq!(table.len(), solver.len());
        for (i, row) in table.iter().enumerate() {
            let (r, c) = solver.coords()[i];
            for reference in row {
                match reference {
                    Neighbor::Unknown(j) => {
                        let (ur, uc) = solver.coords()[*j as usize];
                        assert_eq!(ur.abs_diff(r) + uc.abs_diff(c), 1);
                    }
                    Neighbor::Boundary(offset) => {
                        let br = *offset as usize / solver.width();
                        let bc = *offset as usize % solver.width();
                        assert_eq!(map[(br, bc)], -1);
                        assert_eq!(br.abs_diff(r) + bc.abs_diff(c), 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mask = Array2::from_elem((5, 5), false);
        let solver = LaplaceSolver::new(mask.view(), SolveMethod::Cholesky).unwrap();
        let image = Array2::from_elem((4, 5), 0u16);
        assert!(solver.solve(image.view()).is_err());
    }
}
