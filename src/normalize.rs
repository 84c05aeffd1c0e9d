//! Power of ten scaling of the cartesian coordinates
//!
//! All the coordinates of a catalog are divided by the same factor: the smallest power
//! of ten, starting at 10, larger than the largest coordinate in absolute value.

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::{Catalog, DataError};

/// Smallest normalization factor
pub const NORM_FACTOR_START: f64 = 10f64;

/// Cartesian axis
#[derive(EnumIter, Clone, Copy, PartialEq, Debug)]
pub enum Axis {
    X,
    Y,
    Z,
}
impl Axis {
    fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Returns the normalization factor of the given coordinate maximum
///
/// The factor is multiplied by ten until `maximum / factor < 1`.
/// A NaN maximum returns the starting factor.
pub fn norm_factor(maximum: f64) -> Result<f64, DataError> {
    if maximum.is_infinite() {
        return Err(DataError::Unbounded(maximum));
    }
    let mut factor = NORM_FACTOR_START;
    while maximum / factor >= 1f64 {
        factor *= 10f64;
    }
    Ok(factor)
}

impl Catalog {
    /// Largest absolute value of a coordinate, NaN are ignored
    pub fn axis_max(&self, axis: Axis) -> f64 {
        self.iter()
            .map(|star| star.xyz[axis.index()].abs())
            .fold(0f64, f64::max)
    }
    /// Divides the cartesian coordinates by the catalog normalization factor
    ///
    /// Returns the normalization factor
    pub fn normalize(&mut self) -> Result<f64, DataError> {
        let maximum = Axis::iter()
            .map(|axis| {
                let max = self.axis_max(axis);
                log::debug!("{:?} max: {}", axis, max);
                max
            })
            .fold(0f64, f64::max);
        let factor = norm_factor(maximum)?;
        self.stars.iter_mut().for_each(|star| {
            star.xyz_norm = star.xyz.map(|x| x / factor);
        });
        self.norm_factor = Some(factor);
        Ok(factor)
    }
}
