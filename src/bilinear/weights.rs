//! Per-pixel stencil weights for the approximate solver.
//!
//! Each pixel carries five signed 16-bit weights: left, right, top, bottom
//! and centre. A pixel with a zero centre weight is not an unknown (it is
//! either untouched or the interior of an interpolation square). The planes
//! are stored struct-of-arrays, one `H x W` plane per weight channel, so
//! arithmetic over a single channel runs at unit stride.

use ndarray::{Array2, ArrayView2};

/// The five weights of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stencil {
    pub lft: i16,
    pub rgt: i16,
    pub top: i16,
    pub bot: i16,
    pub cen: i16,
}

impl Stencil {
    /// The plain five-point Laplacian pattern.
    pub fn five_point() -> Self {
        Stencil {
            lft: 1,
            rgt: 1,
            top: 1,
            bot: 1,
            cen: -4,
        }
    }

    /// Sum of the four off-centre weights.
    pub fn off_center_sum(&self) -> i16 {
        self.lft + self.rgt + self.top + self.bot
    }
}

/// Weight planes for a whole image.
#[derive(Debug)]
pub struct Weights {
    lft: Array2<i16>,
    rgt: Array2<i16>,
    top: Array2<i16>,
    bot: Array2<i16>,
    cen: Array2<i16>,
}

impl Weights {
    /// All-zero weights for an `height x width` image.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            lft: Array2::zeros((height, width)),
            rgt: Array2::zeros((height, width)),
            top: Array2::zeros((height, width)),
            bot: Array2::zeros((height, width)),
            cen: Array2::zeros((height, width)),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cen.dim()
    }

    /// All five weights of one pixel.
    pub fn stencil(&self, r: usize, c: usize) -> Stencil {
        Stencil {
            lft: self.lft[(r, c)],
            rgt: self.rgt[(r, c)],
            top: self.top[(r, c)],
            bot: self.bot[(r, c)],
            cen: self.cen[(r, c)],
        }
    }

    pub fn set(&mut self, r: usize, c: usize, stencil: Stencil) {
        self.lft[(r, c)] = stencil.lft;
        self.rgt[(r, c)] = stencil.rgt;
        self.top[(r, c)] = stencil.top;
        self.bot[(r, c)] = stencil.bot;
        self.cen[(r, c)] = stencil.cen;
    }

    /// Centre weight of one pixel; non-zero marks an unknown.
    pub fn center(&self, r: usize, c: usize) -> i16 {
        self.cen[(r, c)]
    }

    pub fn lft(&self) -> ArrayView2<i16> {
        self.lft.view()
    }

    pub fn rgt(&self) -> ArrayView2<i16> {
        self.rgt.view()
    }

    pub fn top(&self) -> ArrayView2<i16> {
        self.top.view()
    }

    pub fn bot(&self) -> ArrayView2<i16> {
        self.bot.view()
    }

    pub fn cen(&self) -> ArrayView2<i16> {
        self.cen.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut w = Weights::zeros(3, 4);
        let st = Stencil {
            lft: 3,
            rgt: 1,
            top: 3,
            bot: 3,
            cen: -10,
        };
        w.set(1, 2, st);
        assert_eq!(w.stencil(1, 2), st);
        assert_eq!(w.center(1, 2), -10);
        assert_eq!(w.stencil(0, 0), Stencil::default());
    }

    #[test]
    fn test_channel_views() {
        let mut w = Weights::zeros(2, 2);
        w.set(0, 1, Stencil::five_point());
        assert_eq!(w.cen()[(0, 1)], -4);
        assert_eq!(w.lft()[(0, 1)], 1);
        assert_eq!(w.cen()[(1, 1)], 0);
    }

    #[test]
    fn test_five_point_balances() {
        let st = Stencil::five_point();
        assert_eq!(st.off_center_sum(), -st.cen);
    }
}
