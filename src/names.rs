//! Star naming
//!
//! Catalog stars are named after the stars of a reference table (IAU names) whose
//! right ascension and declination are both within a relative tolerance of the
//! catalog star coordinates.
//! When several reference stars match the same catalog star, the last one in the
//! reference table gives its name.

use std::{fmt, ops::Deref, path::Path, str::FromStr, time::Instant};

use csv::{ReaderBuilder, Trim};
use indicatif::{ProgressBar, ProgressStyle};
use rstar::{primitives::GeomWithData, RTree};
use serde::Deserialize;

use crate::{
    catalog::{open_reader, InputError},
    Catalog, DataError, Star,
};

/// IAU named star
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReferenceStar {
    #[serde(rename = "IAU Name")]
    pub name: String,
    /// right ascension [rad]
    #[serde(rename = "RA(J2000)")]
    pub ra: f64,
    /// declination [rad]
    #[serde(rename = "Dec(J2000)")]
    pub dec: f64,
}

/// Coordinates closeness test
///
/// `a` is close to `b` if `|a-b| <= atol + rtol * |b|`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}
impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-4,
            atol: 0f64,
        }
    }
}
impl Tolerance {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
    /// Checks if both coordinates of a star are close to the reference star ones
    pub fn matches(&self, star: &Star, reference: &ReferenceStar) -> bool {
        self.is_close(star.ra, reference.ra) && self.is_close(star.dec, reference.dec)
    }
    /// Checks that both tolerances are non-negative numbers
    pub fn validate(&self) -> Result<(), DataError> {
        if self.rtol >= 0f64 && self.atol >= 0f64 {
            Ok(())
        } else {
            Err(DataError::Tolerance {
                rtol: self.rtol,
                atol: self.atol,
            })
        }
    }
    /// Largest `|a-b|` for which `a` can be close to any `b`
    ///
    /// Infinite if `rtol >= 1`, only valid for `rtol >= 0`
    fn reach(&self, a: f64) -> f64 {
        if self.rtol >= 1f64 {
            return f64::INFINITY;
        }
        (self.atol + self.rtol * a.abs()) / (1f64 - self.rtol)
    }
}

/// Name matching algorithm
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MatchStrategy {
    /// every catalog star against every reference star
    Naive,
    /// reference stars in a R*-tree
    #[default]
    Indexed,
}
impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Naive => write!(f, "naive"),
            MatchStrategy::Indexed => write!(f, "indexed"),
        }
    }
}
#[derive(thiserror::Error, Debug)]
#[error(r#"match strategy {0:?} is not recognized, expected "naive" or "indexed""#)]
pub struct MatchStrategyError(String);
impl FromStr for MatchStrategy {
    type Err = MatchStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(MatchStrategy::Naive),
            "indexed" => Ok(MatchStrategy::Indexed),
            _ => Err(MatchStrategyError(s.to_string())),
        }
    }
}

/// Star naming outcome
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchReport {
    /// number of (catalog star, reference star) matching pairs
    pub matches: usize,
    /// number of catalog stars with a name
    pub named: usize,
}

type IndexedPosition = GeomWithData<[f64; 2], usize>;

/// Reference stars lookup
enum Lookup<'a> {
    Scan(&'a [ReferenceStar]),
    Tree(&'a [ReferenceStar], RTree<IndexedPosition>),
}
impl<'a> Lookup<'a> {
    fn new(references: &'a [ReferenceStar], tolerance: Tolerance, strategy: MatchStrategy) -> Self {
        match strategy {
            MatchStrategy::Indexed if (0f64..1f64).contains(&tolerance.rtol) => {
                let positions = references
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.ra.is_finite() && r.dec.is_finite())
                    .map(|(i, reference)| IndexedPosition::new([reference.ra, reference.dec], i))
                    .collect();
                Lookup::Tree(references, RTree::bulk_load(positions))
            }
            MatchStrategy::Indexed => {
                log::warn!(
                    "relative tolerance {} is outside [0,1), falling back to the naive search",
                    tolerance.rtol
                );
                Lookup::Scan(references)
            }
            MatchStrategy::Naive => Lookup::Scan(references),
        }
    }
    /// Indices of the matching reference stars, in reference table order
    fn matches(&self, star: &Star, tolerance: Tolerance) -> Vec<usize> {
        match self {
            Lookup::Scan(references) => references
                .iter()
                .enumerate()
                .filter(|(_, reference)| tolerance.matches(star, reference))
                .map(|(i, _)| i)
                .collect(),
            Lookup::Tree(references, tree) => {
                if !(star.ra.is_finite() && star.dec.is_finite()) {
                    return vec![];
                }
                // the disc circumscribes the tolerance box, with some slack for rounding
                let radius = (tolerance.reach(star.ra) + tolerance.reach(star.dec))
                    * (1f64 + 1e-9)
                    + 1e-150;
                let mut indices: Vec<usize> = tree
                    .locate_within_distance([star.ra, star.dec], radius * radius)
                    .map(|position| position.data)
                    .filter(|&i| tolerance.matches(star, &references[i]))
                    .collect();
                indices.sort_unstable();
                indices
            }
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Find names");
    pb
}

/// IAU names reference table
#[derive(Debug, Default, Clone)]
pub struct ReferenceNames(Vec<ReferenceStar>);
impl Deref for ReferenceNames {
    type Target = [ReferenceStar];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Vec<ReferenceStar>> for ReferenceNames {
    fn from(stars: Vec<ReferenceStar>) -> Self {
        Self(stars)
    }
}
impl ReferenceNames {
    /// Loads the reference table from a CSV file
    ///
    /// The file must have the columns `IAU Name`, `RA(J2000)` and `Dec(J2000)`,
    /// the coordinates in radians
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::Headers)
            .from_reader(open_reader(path)?);
        let mut stars = vec![];
        for result in rdr.deserialize() {
            let star: ReferenceStar = result.map_err(InputError::from)?;
            if !(star.ra.is_finite() && star.dec.is_finite()) {
                return Err(DataError::Reference {
                    name: star.name,
                    ra: star.ra,
                    dec: star.dec,
                }
                .into());
            }
            stars.push(star);
        }
        log::info!("... {} reference stars", stars.len());
        Ok(Self(stars))
    }
    /// Names the catalog stars
    pub fn name_stars(
        &self,
        catalog: &mut Catalog,
        tolerance: Tolerance,
        strategy: MatchStrategy,
    ) -> MatchReport {
        let now = Instant::now();
        let lookup = Lookup::new(self, tolerance, strategy);
        let pb = progress_bar(catalog.stars.len());
        let mut report = MatchReport::default();
        for star in catalog.stars.iter_mut() {
            let matches = lookup.matches(star, tolerance);
            report.matches += matches.len();
            if let Some(&last) = matches.last() {
                star.name = self[last].name.clone();
                report.named += 1;
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("Found {} star names", report.matches));
        log::info!(
            "{} star names ({} matches, {} search) in {}ms",
            report.named,
            report.matches,
            strategy,
            now.elapsed().as_millis()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use rand::Rng;

    use super::*;
    use crate::testing::*;

    fn reference(name: &str, ra: f64, dec: f64) -> ReferenceStar {
        ReferenceStar {
            name: name.to_string(),
            ra,
            dec,
        }
    }

    #[test]
    fn relative_tolerance() {
        let tolerance = Tolerance::default();
        let star = Star::new(1.0, 0.5, 1., 0., 0.);
        assert!(tolerance.matches(&star, &reference("a", 1.00005, 0.50002)));
        assert!(!tolerance.matches(&star, &reference("b", 1.0002, 0.5)));
        assert!(!tolerance.matches(&star, &reference("c", 1.0, 0.5001)));
        assert!(tolerance.is_close(0., 0.));
        assert!(!tolerance.is_close(1e-12, 0.));
        assert!(Tolerance::new(1e-4, 1e-8).is_close(1e-12, 0.));
        assert!(!tolerance.is_close(f64::NAN, 1.));
    }

    #[test]
    fn load_reference_table() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir("names");
        let names = ReferenceNames::load(write_file(&dir, "star names.csv", NAMES_FIXTURE))?;
        assert_eq!(names.len(), 4);
        assert_eq!(names[1], reference("Alpha", 1.00005, 0.50002));
        assert_eq!(names[2].dec, -0.3);
        Ok(())
    }

    #[test]
    fn reference_table_missing_column() {
        let dir = scratch_dir("names-column");
        let path = write_file(&dir, "star names.csv", "IAU Name ,RA(J2000)\nSirius,1.77\n");
        assert!(matches!(
            ReferenceNames::load(path),
            Err(crate::Error::Input(InputError::Csv(_)))
        ));
    }

    #[test]
    fn reference_table_non_finite() {
        let dir = scratch_dir("names-nan");
        let path = write_file(
            &dir,
            "star names.csv",
            "IAU Name ,RA(J2000),Dec(J2000)\nSirius,NaN,-0.29\n",
        );
        assert!(matches!(
            ReferenceNames::load(path),
            Err(crate::Error::Data(DataError::Reference { .. }))
        ));
    }

    #[test]
    fn last_match_wins() {
        let names = ReferenceNames::from(vec![
            reference("First", 1.00001, 0.5),
            reference("Elsewhere", 3.0, -0.2),
            reference("Second", 0.99999, 0.50001),
        ]);
        for strategy in [MatchStrategy::Naive, MatchStrategy::Indexed] {
            let mut catalog = Catalog::from_stars(vec![
                Star::new(1.0, 0.5, 1., 0., 0.),
                Star::new(2.0, 0.5, 1., 0., 0.),
            ]);
            let report = names.name_stars(&mut catalog, Tolerance::default(), strategy);
            assert_eq!(
                report,
                MatchReport {
                    matches: 2,
                    named: 1
                }
            );
            assert_eq!(catalog[0].name, "Second");
            assert_eq!(catalog[1].name, "");
        }
    }

    #[test]
    fn negative_relative_tolerance() {
        let tolerance = Tolerance::new(-0.5, 1.0);
        assert!(tolerance.validate().is_err());
        assert!(Tolerance::default().validate().is_ok());
        let names = ReferenceNames::from(vec![reference("Far", 0., 0.)]);
        for strategy in [MatchStrategy::Naive, MatchStrategy::Indexed] {
            let mut catalog = Catalog::from_stars(vec![Star::new(1., 1., 1., 0., 0.)]);
            let report = names.name_stars(&mut catalog, tolerance, strategy);
            assert_eq!(
                report,
                MatchReport {
                    matches: 1,
                    named: 1
                }
            );
            assert_eq!(catalog[0].name, "Far");
        }
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("naive".parse::<MatchStrategy>().ok(), Some(MatchStrategy::Naive));
        assert_eq!("Indexed".parse::<MatchStrategy>().ok(), Some(MatchStrategy::Indexed));
        assert!("kd-tree".parse::<MatchStrategy>().is_err());
        assert_eq!(MatchStrategy::default().to_string(), "indexed");
    }

    #[test]
    fn indexed_search_agrees_with_naive_search() {
        let mut rng = rand::thread_rng();
        let stars: Vec<_> = (0..400)
            .map(|_| {
                Star::new(
                    rng.gen_range(0f64..std::f64::consts::TAU),
                    rng.gen_range(-1.5f64..1.5),
                    1.,
                    0.,
                    0.,
                )
            })
            .collect();
        // reference stars scattered around a subset of the catalog stars, some within
        // the tolerance, some just outside, plus exact duplicates
        let mut references: Vec<_> = stars
            .iter()
            .step_by(3)
            .enumerate()
            .map(|(i, star)| {
                let mut jitter = |x: f64| x * (1. + rng.gen_range(-2e-4..2e-4));
                reference(&format!("star {i}"), jitter(star.ra), jitter(star.dec))
            })
            .collect();
        references.extend(
            stars
                .iter()
                .step_by(7)
                .enumerate()
                .map(|(i, star)| reference(&format!("copy {i}"), star.ra, star.dec)),
        );
        references.push(reference("zero", 0., 0.));
        let names = ReferenceNames::from(references);

        for tolerance in [
            Tolerance::default(),
            Tolerance::new(1e-4, 1e-8),
            Tolerance::new(1e-3, 0.),
        ] {
            let mut naive = Catalog::from_stars(stars.clone());
            let mut indexed = Catalog::from_stars(stars.clone());
            let naive_report = names.name_stars(&mut naive, tolerance, MatchStrategy::Naive);
            let indexed_report =
                names.name_stars(&mut indexed, tolerance, MatchStrategy::Indexed);
            assert_eq!(naive_report, indexed_report);
            assert!(naive_report.named > 0);
            let naive_names: Vec<_> = naive.iter().map(|star| &star.name).collect();
            let indexed_names: Vec<_> = indexed.iter().map(|star| &star.name).collect();
            assert_eq!(naive_names, indexed_names);
        }
    }
}
