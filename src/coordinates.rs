//! Equatorial to cartesian coordinates

use crate::Catalog;

/// Returns the cartesian coordinates `[x,y,z]` of a star
///
/// `ra` and `dec` are used as radians without any conversion
pub fn cartesian(ra: f64, dec: f64, dist: f64) -> [f64; 3] {
    [
        dist * dec.cos() * ra.cos(),
        dist * dec.cos() * ra.sin(),
        dist * dec.sin(),
    ]
}

impl Catalog {
    /// Computes the cartesian coordinates of all the stars
    pub fn to_cartesian(&mut self) -> &mut Self {
        self.stars.iter_mut().for_each(|star| {
            star.xyz = cartesian(star.ra, star.dec, star.dist);
        });
        log::debug!("cartesian coordinates of {} stars", self.stars.len());
        self
    }
}
