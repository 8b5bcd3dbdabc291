//! `Coordinate` — the address of a cell and the key of a connection.

use std::fmt;
use std::ops::{Add, Deref};

use smallvec::SmallVec;

/// An integer point, inline up to three axes.
///
/// Grids use one value per dimension; networks use the node index as a
/// one-axis coordinate.  Grid connections are keyed by the offset from the
/// source cell, other connections by the neighbor's coordinate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate(SmallVec<[i64; 3]>);

impl Coordinate {
    pub fn new(axes: &[i64]) -> Self {
        Coordinate(SmallVec::from_slice(axes))
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl Deref for Coordinate {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl<const N: usize> From<[i64; N]> for Coordinate {
    fn from(axes: [i64; N]) -> Self {
        Coordinate::new(&axes)
    }
}

impl From<&[i64]> for Coordinate {
    fn from(axes: &[i64]) -> Self {
        Coordinate::new(axes)
    }
}

impl From<Vec<i64>> for Coordinate {
    fn from(axes: Vec<i64>) -> Self {
        Coordinate(SmallVec::from_vec(axes))
    }
}

impl From<(i64, i64)> for Coordinate {
    fn from((a, b): (i64, i64)) -> Self {
        Coordinate::new(&[a, b])
    }
}

impl From<i64> for Coordinate {
    fn from(a: i64) -> Self {
        Coordinate::new(&[a])
    }
}

/// Component-wise sum.  Both sides must have the same number of axes.
impl Add<&Coordinate> for &Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: &Coordinate) -> Coordinate {
        debug_assert_eq!(self.dims(), rhs.dims());
        Coordinate(self.0.iter().zip(rhs.0.iter()).map(|(a, b)| a + b).collect())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
