//! Hole catalogue: the ordered list of pixels to solve for, plus the dense
//! reverse map from image position to catalogue index.

use crate::component::Component;
use ndarray::{Array2, ArrayView2};

/// Marker in the coordinate map for pixels that are not unknowns.
pub const NOT_A_HOLE: i32 = -1;

/// Ordered hole pixels and the reverse coordinate map.
///
/// The order of `coords` defines the row order of the linear system and of
/// the solution vector. The map holds [`NOT_A_HOLE`] at non-hole pixels and
/// the catalogue index everywhere else, so the two structures are bijective
/// on hole pixels.
#[derive(Debug)]
pub struct Catalogue {
    coords: Vec<(usize, usize)>,
    map: Array2<i32>,
}

impl Catalogue {
    fn scan_interior<F: FnMut(usize, usize) -> bool>(
        width: usize,
        height: usize,
        mut is_hole: F,
    ) -> Self {
        let mut coords = Vec::new();
        let mut map = Array2::from_elem((height, width), NOT_A_HOLE);
        if height > 2 && width > 2 {
            for r in 1..height - 1 {
                for c in 1..width - 1 {
                    if is_hole(r, c) {
                        map[(r, c)] = coords.len() as i32;
                        coords.push((r, c));
                    }
                }
            }
        }
        Self { coords, map }
    }

    /// Scan a mask channel row-major, excluding the outer one-pixel border,
    /// and catalogue every pixel whose value is non-zero.
    pub fn from_mask<C: Component>(mask: ArrayView2<C>) -> Self {
        let (height, width) = mask.dim();
        Self::scan_interior(width, height, |r, c| mask[(r, c)] != C::ZERO)
    }

    /// As [`Catalogue::from_mask`], for a boolean hole mask.
    pub fn from_hole_mask(mask: ArrayView2<bool>) -> Self {
        let (height, width) = mask.dim();
        Self::scan_interior(width, height, |r, c| mask[(r, c)])
    }

    /// Catalogue an explicit `(row, col)` list, preserving caller order.
    ///
    /// Entries on the image edge or outside the image are logged and
    /// dropped, as are duplicates of an already-catalogued pixel.
    pub fn from_coords(coords: &[(usize, usize)], width: usize, height: usize) -> Self {
        let mut kept = Vec::with_capacity(coords.len());
        let mut map = Array2::from_elem((height, width), NOT_A_HOLE);
        for &(r, c) in coords {
            if r < 1 || height < 2 || r > height - 2 || c < 1 || width < 2 || c > width - 2 {
                log::warn!("hole pixel ({}, {}) out of bounds; dropped", r, c);
                continue;
            }
            if map[(r, c)] != NOT_A_HOLE {
                log::warn!("hole pixel ({}, {}) listed twice; dropped", r, c);
                continue;
            }
            map[(r, c)] = kept.len() as i32;
            kept.push((r, c));
        }
        Self { coords: kept, map }
    }

    /// Number of catalogued hole pixels.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Catalogued `(row, col)` pairs in system order.
    pub fn coords(&self) -> &[(usize, usize)] {
        &self.coords
    }

    /// Dense reverse map from image position to catalogue index.
    pub fn map(&self) -> &Array2<i32> {
        &self.map
    }
}
