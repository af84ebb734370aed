//! Multi-resolution detection of interpolation squares.
//!
//! Deep inside a large hole the Dirichlet solution is nearly linear, so a
//! fully-interior square region can be replaced by a bilinear patch pinned
//! to its four corner unknowns. The analyser finds such squares on a binned
//! mask pyramid, largest first, writes the perimeter stencils, and strips
//! the claimed pixels from the set of remaining unknowns.

use super::weights::{Stencil, Weights};
use crate::mask::{bin2x2, extend_to_pow2, unbin2x2};
use crate::solver::catalogue::NOT_A_HOLE;
use crate::types::Result;
use ndarray::{Array2, ArrayView2};

/// Marker in the coordinate map for the strict interior of a registered
/// square: neither solved for nor a boundary value.
pub const SQUARE_INTERIOR: i32 = -2;

/// Pyramid levels smaller than this host no squares and end the descent.
const MIN_BINNED_EXTENT: usize = 8;

/// One registered interpolation square. `side` is a power of two, at
/// least 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    pub top: usize,
    pub left: usize,
    pub side: usize,
}

impl Square {
    pub fn bottom(&self) -> usize {
        self.top + self.side - 1
    }

    pub fn right(&self) -> usize {
        self.left + self.side - 1
    }
}

/// Everything the analyser produces for one mask.
#[derive(Debug)]
pub struct Analysis {
    pub weights: Weights,
    pub map: Array2<i32>,
    pub coords: Vec<(usize, usize)>,
    pub squares: Vec<Square>,
    pub extended: Array2<bool>,
}

/// Analyse a hole mask: register interpolation squares, assign stencil
/// weights to every remaining unknown, and build the reduced catalogue.
pub fn analyse(mask: ArrayView2<bool>) -> Result<Analysis> {
    let (height, width) = mask.dim();
    let mut weights = Weights::zeros(height, width);
    let mut map = Array2::from_elem((height, width), NOT_A_HOLE);
    let mut squares = Vec::new();

    let mut extended = extend_to_pow2(mask)?;
    if extended.nrows() < 2 || extended.ncols() < 2 {
        log::warn!(
            "{}x{} mask is too small to analyse; solver is inert",
            width,
            height
        );
        return Ok(Analysis {
            weights,
            map,
            coords: Vec::new(),
            squares,
            extended,
        });
    }

    // Binned pyramid over the power-of-two mask. Each level AND-bins the
    // one before it; levels below 8x8 cannot host a square and stop the
    // descent.
    let mut levels = vec![extended.clone()];
    while {
        let last = &levels[levels.len() - 1];
        last.nrows() >= MIN_BINNED_EXTENT && last.ncols() >= MIN_BINNED_EXTENT
    } {
        let next = bin2x2(&levels[levels.len() - 1])?;
        levels.push(next);
    }

    if levels.len() > 1 {
        register_level(1, &levels, &mut extended, &mut weights, &mut map, &mut squares);
    }

    // Stencils for the hole pixels no square claimed: the five-point
    // pattern in the interior, the mean of the available neighbours along
    // the image edge.
    for r in 0..height {
        for c in 0..width {
            if !extended[(r, c)] {
                continue;
            }
            let mut st = Stencil::default();
            let mut n = 0i16;
            if c > 0 {
                st.lft = 1;
                n += 1;
            }
            if c + 1 < width {
                st.rgt = 1;
                n += 1;
            }
            if r > 0 {
                st.top = 1;
                n += 1;
            }
            if r + 1 < height {
                st.bot = 1;
                n += 1;
            }
            st.cen = -n;
            weights.set(r, c, st);
        }
    }

    // Reduced catalogue: every pixel with a live centre weight, row-major.
    // Square perimeters were stencilled during registration and are picked
    // up here alongside the leftover pixels.
    let mut coords = Vec::new();
    for r in 0..height {
        for c in 0..width {
            if weights.center(r, c) != 0 {
                map[(r, c)] = coords.len() as i32;
                coords.push((r, c));
            }
        }
    }

    log::debug!(
        "registered {} squares, {} reduced unknowns",
        squares.len(),
        coords.len()
    );
    Ok(Analysis {
        weights,
        map,
        coords,
        squares,
        extended,
    })
}

/// Recursive descent over the pyramid. Returns the candidate map of this
/// level after registration so the caller can strip overlapped cells.
fn register_level(
    level: usize,
    levels: &[Array2<bool>],
    extended: &mut Array2<bool>,
    weights: &mut Weights,
    map: &mut Array2<i32>,
    squares: &mut Vec<Square>,
) -> Array2<bool> {
    let binned = &levels[level];
    let (rows, cols) = binned.dim();

    // A cell anchors a square covering this cell and its three lower-right
    // neighbours, so the square side is twice the cell extent.
    let mut valid = Array2::from_elem((rows, cols), false);
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            valid[(r, c)] = binned[(r, c)]
                && binned[(r + 1, c)]
                && binned[(r, c + 1)]
                && binned[(r + 1, c + 1)];
        }
    }

    // Larger squares claim their pixels first; drop every candidate whose
    // expansion lands on a cell accepted one level deeper.
    if level + 1 < levels.len() {
        let deeper = register_level(level + 1, levels, extended, weights, map, squares);
        let expanded = unbin2x2(&deeper);
        for r in 0..rows {
            for c in 0..cols {
                if expanded[(r, c)] {
                    valid[(r, c)] = false;
                }
            }
        }
    }

    let cell = 1usize << level;
    let side = 2 * cell;
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            if !valid[(r, c)] {
                continue;
            }
            let top = r * cell;
            let left = c * cell;
            if !square_clear(extended, weights, top, left, side) {
                valid[(r, c)] = false;
                continue;
            }
            register_square(extended, weights, map, top, left, side);
            squares.push(Square { top, left, side });
        }
    }
    valid
}

/// A candidate square may be registered only if its area is wholly
/// unclaimed hole and the one-pixel cushion around it consists of hole
/// pixels, where a pixel already serving as another square's perimeter
/// still counts. The cushion keeps every perimeter equation pointed at
/// pixels that remain unknowns or boundary values, registered areas stay
/// pairwise disjoint, and squares may tile a deep hole edge to edge.
fn square_clear(
    extended: &Array2<bool>,
    weights: &Weights,
    top: usize,
    left: usize,
    side: usize,
) -> bool {
    let (rows, cols) = extended.dim();
    if top == 0 || left == 0 || top + side + 1 > rows || left + side + 1 > cols {
        return false;
    }
    for r in top..top + side {
        for c in left..left + side {
            if !extended[(r, c)] {
                return false;
            }
        }
    }
    let (height, width) = weights.dim();
    let cushioned = |r: usize, c: usize| {
        extended[(r, c)] || (r < height && c < width && weights.center(r, c) != 0)
    };
    for c in left - 1..=left + side {
        if !cushioned(top - 1, c) || !cushioned(top + side, c) {
            return false;
        }
    }
    for r in top..top + side {
        if !cushioned(r, left - 1) || !cushioned(r, left + side) {
            return false;
        }
    }
    true
}

/// Write the perimeter stencils of an accepted square, mark its strict
/// interior for interpolation, and strip the square from the mask.
fn register_square(
    extended: &mut Array2<bool>,
    weights: &mut Weights,
    map: &mut Array2<i32>,
    top: usize,
    left: usize,
    side: usize,
) {
    let s = (side - 1) as i16;
    let bottom = top + side - 1;
    let right = left + side - 1;

    for &(r, c) in &[(top, left), (top, right), (bottom, left), (bottom, right)] {
        weights.set(r, c, Stencil::five_point());
    }

    // Edge pixels scale the one-dimensional Laplacian along the edge by s
    // and couple with unit weight to the facing edge pixel across the
    // square. The centre magnitude 3s + 1 encodes the jump distance s for
    // the assembler.
    let cen = -(3 * s + 1);
    for r in top + 1..bottom {
        weights.set(r, left, Stencil { lft: s, rgt: 1, top: s, bot: s, cen });
        weights.set(r, right, Stencil { lft: 1, rgt: s, top: s, bot: s, cen });
    }
    for c in left + 1..right {
        weights.set(top, c, Stencil { lft: s, rgt: s, top: s, bot: 1, cen });
        weights.set(bottom, c, Stencil { lft: s, rgt: s, top: 1, bot: s, cen });
    }

    for r in top + 1..bottom {
        for c in left + 1..right {
            map[(r, c)] = SQUARE_INTERIOR;
        }
    }
    for r in top..=bottom {
        for c in left..=right {
            extended[(r, c)] = false;
        }
    }
}
