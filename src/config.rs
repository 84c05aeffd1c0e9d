use std::path::{Path, PathBuf};

use crate::{writer, MatchStrategy, Tolerance};

/// Pipeline configuration
///
/// The default configuration reads `TOP 20000 bright.csv`, names the stars after
/// `star names.csv` and writes `TOP 20000 bright full with names.csv`
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) catalog: PathBuf,
    pub(crate) names: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) tolerance: Tolerance,
    pub(crate) strategy: MatchStrategy,
    pub(crate) delimiter: u8,
    pub(crate) strict: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("TOP 20000 bright.csv"),
            names: Some(PathBuf::from("star names.csv")),
            output: None,
            tolerance: Tolerance::default(),
            strategy: MatchStrategy::default(),
            delimiter: b',',
            strict: false,
        }
    }
}
impl Config {
    pub fn catalog<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            catalog: path.as_ref().to_path_buf(),
            ..self
        }
    }
    /// Sets the reference table of star names
    pub fn names<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            names: Some(path.as_ref().to_path_buf()),
            ..self
        }
    }
    /// Disables star naming
    pub fn without_names(self) -> Self {
        Self {
            names: None,
            ..self
        }
    }
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            output: Some(path.as_ref().to_path_buf()),
            ..self
        }
    }
    pub fn tolerance(self, tolerance: Tolerance) -> Self {
        Self { tolerance, ..self }
    }
    pub fn strategy(self, strategy: MatchStrategy) -> Self {
        Self { strategy, ..self }
    }
    /// Catalog field delimiter
    pub fn delimiter(self, delimiter: u8) -> Self {
        Self { delimiter, ..self }
    }
    /// Fails on non-finite or out of range catalog values if `true`
    pub fn strict(self, strict: bool) -> Self {
        Self { strict, ..self }
    }
    /// The point cloud file, derived from the catalog file name if not set
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| writer::output_path(&self.catalog))
    }
}
