//! Star colors from the RP and BP magnitudes

use crate::Catalog;

fn channel(percent: f64) -> i64 {
    (percent / 100f64 * 255f64) as i64
}

/// Returns the `[R,G,B]` color of a star
///
/// The magnitudes are expected on a 0-100 scale; the channels are truncated toward zero
/// and are not clamped, so magnitudes outside that scale give values outside [0,255].
/// A NaN magnitude gives 0.
pub fn rgb(rp: f64, bp: f64) -> [i64; 3] {
    [channel(rp), channel(100f64 - rp - bp), channel(bp)]
}

impl Catalog {
    /// Computes the colors of all the stars
    pub fn colorize(&mut self) -> &mut Self {
        self.stars.iter_mut().for_each(|star| {
            star.rgb = rgb(star.rp, star.bp);
        });
        let n_outside = self
            .stars
            .iter()
            .filter(|star| star.rgb.iter().any(|c| !(0..=255).contains(c)))
            .count();
        if n_outside > 0 {
            log::warn!("{} stars with colors outside [0,255]", n_outside);
        }
        let n_uncolored = self.uncolored();
        if n_uncolored > 0 {
            log::warn!(
                "{} stars with a missing RP or BP magnitude, their channels are set to 0",
                n_uncolored
            );
        }
        self
    }
    /// Number of stars with a NaN RP or BP magnitude
    pub fn uncolored(&self) -> usize {
        self.stars
            .iter()
            .filter(|star| star.rp.is_nan() || star.bp.is_nan())
            .count()
    }
}
