//! Neighbour table for the exact solver.
//!
//! Every catalogued pixel has exactly four cardinal neighbours, each of
//! which is either another unknown (referenced by catalogue index) or a
//! known boundary pixel (referenced by its row-major linear offset into the
//! image). One table carries both kinds of reference.

use super::catalogue::Catalogue;

/// Reference to one cardinal neighbour of an unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    /// Another unknown, by catalogue index.
    Unknown(u32),
    /// A fixed boundary pixel, by row-major linear image offset.
    Boundary(u32),
}

/// Per-row neighbour references in left, right, top, bottom order.
#[derive(Debug)]
pub struct NeighborTable {
    rows: Vec<[Neighbor; 4]>,
}

impl NeighborTable {
    /// Look every catalogued pixel's four neighbours up in the coordinate
    /// map. Catalogued pixels are strictly interior, so all four positions
    /// exist in the image.
    pub fn build(catalogue: &Catalogue, width: usize) -> Self {
        let map = catalogue.map();
        let reference = |r: usize, c: usize| -> Neighbor {
            let index = map[(r, c)];
            if index >= 0 {
                Neighbor::Unknown(index as u32)
            } else {
                Neighbor::Boundary((r * width + c) as u32)
            }
        };
        let rows = catalogue
            .coords()
            .iter()
            .map(|&(r, c)| {
                [
                    reference(r, c - 1),
                    reference(r, c + 1),
                    reference(r - 1, c),
                    reference(r + 1, c),
                ]
            })
            .collect();
        Self { rows }
    }

    /// Neighbour references of catalogue row `i`.
    pub fn row(&self, i: usize) -> &[Neighbor; 4] {
        &self.rows[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Neighbor; 4]> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Neighbor::{Boundary, Unknown};

    #[test]
    fn test_vertical_strip_references() {
        // 4 wide, 5 tall, holes straight down column 1.
        let cat = Catalogue::from_coords(&[(1, 1), (2, 1), (3, 1)], 4, 5);
        let table = NeighborTable::build(&cat, 4);
        assert_eq!(
            table.row(0),
            &[Boundary(4), Boundary(6), Boundary(1), Unknown(1)]
        );
        assert_eq!(
            table.row(1),
            &[Boundary(8), Boundary(10), Unknown(0), Unknown(2)]
        );
        assert_eq!(
            table.row(2),
            &[Boundary(12), Boundary(14), Unknown(1), Boundary(17)]
        );
    }

    #[test]
    fn test_isolated_unknown_has_four_boundaries() {
        let cat = Catalogue::from_coords(&[(1, 1)], 3, 3);
        let table = NeighborTable::build(&cat, 3);
        assert_eq!(
            table.row(0),
            &[Boundary(3), Boundary(5), Boundary(1), Boundary(7)]
        );
    }
}
