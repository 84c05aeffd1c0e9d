/*!
# Nightsky catalog processing

Converts a Gaia catalog of stars (right ascension, declination, photogeometric distance
and RP/BP photometry) into the point cloud table loaded by the Nightsky viewer:
 - Cartesian coordinates, raw and scaled by a power of ten into the render volume,
 - RGB colors derived from the RP and BP magnitudes,
 - IAU names attached to the stars found in a reference table.

```no_run
use nightsky::{Config, Pipeline};

let config = Config::default()
    .catalog("TOP 20000 bright.csv")
    .names("star names.csv");
let report = Pipeline::new(config).run()?;
println!("{} star names written to {:?}", report.named(), report.output);
# Ok::<(), nightsky::Error>(())
```
*/

use std::{path::PathBuf, time::Instant};

pub mod catalog;
pub mod color;
pub mod config;
pub mod coordinates;
mod error;
pub mod names;
pub mod normalize;
pub mod writer;

pub use catalog::{Catalog, CatalogLoader, DataError, InputError, Star};
pub use config::Config;
pub use error::{Error, Result};
pub use names::{MatchReport, MatchStrategy, ReferenceNames, ReferenceStar, Tolerance};
pub use writer::OutputError;

/// Outcome of a [Pipeline] run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// number of stars in the catalog
    pub stars: usize,
    /// the power of ten the coordinates are divided by
    pub norm_factor: f64,
    /// star naming outcome, `None` if naming is disabled
    pub names: Option<MatchReport>,
    /// the point cloud file
    pub output: PathBuf,
}
impl PipelineReport {
    /// Number of stars that received a name
    pub fn named(&self) -> usize {
        self.names.as_ref().map_or(0, |report| report.named)
    }
}

/// Catalog to point cloud conversion
///
/// Runs the stages in order: load, cartesian coordinates, normalization,
/// colors, names and finally writes the augmented catalog.
pub struct Pipeline {
    config: Config,
}
impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    /// Loads and augments the catalog without writing it
    pub fn process(&self) -> Result<(Catalog, Option<MatchReport>)> {
        let config = &self.config;
        config.tolerance.validate()?;
        let mut catalog = CatalogLoader::default()
            .path(&config.catalog)
            .delimiter(config.delimiter)
            .load()?;
        catalog.summary();
        if config.strict {
            catalog.validate()?;
        }

        let now = Instant::now();
        let norm_factor = catalog.to_cartesian().normalize()?;
        log::info!(
            "coordinates normalized by {norm_factor:e} in {}ms",
            now.elapsed().as_millis()
        );
        catalog.colorize();

        let report = match &config.names {
            Some(path) => {
                let references = ReferenceNames::load(path)?;
                Some(references.name_stars(&mut catalog, config.tolerance, config.strategy))
            }
            None => {
                log::info!("star naming skipped");
                None
            }
        };
        Ok((catalog, report))
    }
    /// Processes the catalog and writes the point cloud file
    pub fn run(&self) -> Result<PipelineReport> {
        let (catalog, names) = self.process()?;
        let output = self.config.output_path();
        catalog.to_csv(&output)?;
        log::info!("{} stars written to {:?}", catalog.len(), output);
        Ok(PipelineReport {
            stars: catalog.len(),
            norm_factor: catalog.norm_factor().unwrap_or(normalize::NORM_FACTOR_START),
            names,
            output,
        })
    }
}
