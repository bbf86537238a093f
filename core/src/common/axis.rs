//! Coordinate axes.

/// The 3 coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// Returns all 3 axes in order.
    pub fn all() -> [Axis; 3] {
        [Axis::X, Axis::Y, Axis::Z]
    }

    /// Returns the next axis cyclically (X -> Y -> Z -> X).
    pub fn next(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

impl From<usize> for Axis {
    /// Map a dimension index to an `Axis`.
    ///
    /// * `i` - The dimension index.
    fn from(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }
}

impl From<Axis> for usize {
    /// Map an `Axis` to a dimension index.
    ///
    /// * `axis` - The axis.
    fn from(axis: Axis) -> Self {
        axis as usize
    }
}
