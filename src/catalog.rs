//! Gaia catalog loading
//!
//! The catalog is read from a delimited text file, either plain, gzip (`*.gz`) or
//! bzip2 (`*.bz2`) compressed.
//! Every source column is kept so it can be written back, the photogeometric distance
//! and the RP/BP magnitudes columns are renamed `dist`, `rp` and `bp`.

use std::{
    f64::consts::{FRAC_PI_2, TAU},
    fs::File,
    io::{BufReader, Read},
    num::ParseFloatError,
    ops::Deref,
    path::{Path, PathBuf},
    time::Instant,
};

use csv::{ReaderBuilder, StringRecord};
use itertools::{Itertools, MinMaxResult};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("failed to open {0:?}")]
    Open(PathBuf, #[source] std::io::Error),
    #[error("failed to read the file")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize the CSV file")]
    Csv(#[from] csv::Error),
    #[error("no column for {0:?} in {1:?}")]
    MissingColumn(&'static str, PathBuf),
    #[error("row #{row}: {column} value {value:?} is not a number")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
        source: ParseFloatError,
    },
    #[error("{0:?} is bzip2 compressed but the `bzip2` feature is disabled")]
    Decompression(PathBuf),
}
type Result<T> = std::result::Result<T, InputError>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DataError {
    #[error("row #{row}: {column} is not finite ({value})")]
    NonFinite {
        row: usize,
        column: &'static str,
        value: f64,
    },
    #[error("row #{row}: {column} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        row: usize,
        column: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("coordinates maximum {0} cannot be normalized")]
    Unbounded(f64),
    #[error("star naming tolerance (rtol: {rtol}, atol: {atol}) must be non-negative")]
    Tolerance { rtol: f64, atol: f64 },
    #[error("reference star {name:?} has non-finite coordinates ({ra}, {dec})")]
    Reference { name: String, ra: f64, dec: f64 },
}

/// Catalog columns used by the point cloud
#[derive(EnumIter, Clone, Copy, PartialEq, Debug)]
pub enum Field {
    Ra,
    Dec,
    Dist,
    Rp,
    Bp,
}
impl Field {
    /// Column name in the point cloud table
    pub fn name(&self) -> &'static str {
        match self {
            Field::Ra => "ra",
            Field::Dec => "dec",
            Field::Dist => "dist",
            Field::Rp => "rp",
            Field::Bp => "bp",
        }
    }
    /// Source column names, Gaia archive names first
    fn sources(&self) -> &'static [&'static str] {
        match self {
            Field::Ra => &["ra"],
            Field::Dec => &["dec"],
            Field::Dist => &["r_med_photogeo", "dist"],
            Field::Rp => &["phot_rp_mean_mag", "rp"],
            Field::Bp => &["phot_bp_mean_mag", "bp"],
        }
    }
    /// Admissible range of values
    fn range(&self) -> (f64, f64) {
        match self {
            Field::Ra => (0f64, TAU),
            Field::Dec => (-FRAC_PI_2, FRAC_PI_2),
            Field::Dist => (0f64, f64::INFINITY),
            Field::Rp | Field::Bp => (0f64, 100f64),
        }
    }
    fn check(&self, row: usize, value: f64) -> std::result::Result<(), DataError> {
        let column = self.name();
        if !value.is_finite() {
            return Err(DataError::NonFinite { row, column, value });
        }
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(DataError::OutOfRange {
                row,
                column,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

/// A catalog star
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Star {
    /// right ascension [rad]
    pub ra: f64,
    /// declination [rad]
    pub dec: f64,
    /// photogeometric distance
    pub dist: f64,
    /// RP magnitude on a 0-100 scale
    pub rp: f64,
    /// BP magnitude on a 0-100 scale
    pub bp: f64,
    /// cartesian coordinates
    pub xyz: [f64; 3],
    /// cartesian coordinates divided by the catalog normalization factor
    pub xyz_norm: [f64; 3],
    pub rgb: [i64; 3],
    /// IAU name, empty if the star is not in the reference table
    pub name: String,
}
impl Star {
    pub fn new(ra: f64, dec: f64, dist: f64, rp: f64, bp: f64) -> Self {
        Self {
            ra,
            dec,
            dist,
            rp,
            bp,
            ..Default::default()
        }
    }
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Ra => self.ra,
            Field::Dec => self.dec,
            Field::Dist => self.dist,
            Field::Rp => self.rp,
            Field::Bp => self.bp,
        }
    }
}

/// Star catalog
///
/// Holds the source table, with the renamed columns, and the stars derived from it.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub(crate) headers: StringRecord,
    pub(crate) records: Vec<StringRecord>,
    pub(crate) stars: Vec<Star>,
    pub(crate) norm_factor: Option<f64>,
}
impl Deref for Catalog {
    type Target = [Star];

    fn deref(&self) -> &Self::Target {
        &self.stars
    }
}
impl Catalog {
    /// Creates a catalog with the `ra,dec,dist,rp,bp` columns from a list of stars
    pub fn from_stars(stars: Vec<Star>) -> Self {
        let headers: StringRecord = Field::iter().map(|field| field.name()).collect();
        let records = stars
            .iter()
            .map(|star| {
                Field::iter()
                    .map(|field| crate::writer::format_float(star.get(field)))
                    .collect::<StringRecord>()
            })
            .collect();
        Self {
            headers,
            records,
            stars,
            norm_factor: None,
        }
    }
    /// Table header, renamed columns included
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
    /// Iterator over the source values of a column
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let index = self.headers.iter().position(|header| header == name)?;
        Some(
            self.records
                .iter()
                .map(move |record| record.get(index).unwrap_or_default()),
        )
    }
    /// The normalization factor, once the coordinates have been normalized
    pub fn norm_factor(&self) -> Option<f64> {
        self.norm_factor
    }
    /// Logs the number of stars and the range of distances and magnitudes
    pub fn summary(&self) {
        log::info!("catalog of {} stars", self.len());
        for field in [Field::Dist, Field::Rp, Field::Bp] {
            let values = self.iter().map(|star| star.get(field));
            match values.clone().filter(|x| x.is_finite()).minmax() {
                MinMaxResult::MinMax(min, max) => {
                    log::info!(" - {:>4}: [{:.3}, {:.3}]", field.name(), min, max)
                }
                MinMaxResult::OneElement(x) => log::info!(" - {:>4}: {:.3}", field.name(), x),
                MinMaxResult::NoElements => (),
            }
            let n_invalid = values.filter(|x| !x.is_finite()).count();
            if n_invalid > 0 {
                log::warn!("{} stars with a missing {}", n_invalid, field.name());
            }
        }
    }
    /// Checks that every star has finite values within the expected ranges
    ///
    /// `ra` in [0,2π], `dec` in [-π/2,π/2], `dist` positive, `rp` and `bp` in [0,100]
    pub fn validate(&self) -> std::result::Result<(), DataError> {
        self.iter().enumerate().try_for_each(|(row, star)| {
            Field::iter().try_for_each(|field| field.check(row, star.get(field)))
        })
    }
}

/// Opens a text file, decompressing it according to its extension
pub(crate) fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| InputError::Open(path.to_path_buf(), e))?;
    let buf = BufReader::new(file);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Ok(Box::new(flate2::bufread::GzDecoder::new(buf))),
        #[cfg(feature = "bzip2")]
        Some("bz2") => Ok(Box::new(bzip2::bufread::BzDecoder::new(buf))),
        #[cfg(not(feature = "bzip2"))]
        Some("bz2") => Err(InputError::Decompression(path.to_path_buf())),
        _ => Ok(Box::new(buf)),
    }
}

fn parse_value(record: &StringRecord, row: usize, field: Field, index: usize) -> Result<f64> {
    let value = record.get(index).unwrap_or_default().trim();
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse::<f64>().map_err(|source| InputError::Parse {
        row,
        column: field.name(),
        value: value.to_string(),
        source,
    })
}

/// Gaia catalog loader
pub struct CatalogLoader {
    path: PathBuf,
    delimiter: u8,
}
impl Default for CatalogLoader {
    fn default() -> Self {
        Self {
            path: PathBuf::from("TOP 20000 bright.csv"),
            delimiter: b',',
        }
    }
}
impl CatalogLoader {
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..self
        }
    }
    pub fn delimiter(self, delimiter: u8) -> Self {
        Self { delimiter, ..self }
    }
    pub fn load(self) -> Result<Catalog> {
        log::info!("Loading {:?}...", self.path);
        let now = Instant::now();
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(open_reader(&self.path)?);

        let source_headers = rdr.headers()?.clone();
        let columns: Vec<(Field, usize)> = Field::iter()
            .map(|field| {
                field
                    .sources()
                    .iter()
                    .find_map(|source| source_headers.iter().position(|h| h == *source))
                    .map(|index| (field, index))
                    .ok_or_else(|| InputError::MissingColumn(field.name(), self.path.clone()))
            })
            .collect::<Result<_>>()?;
        let headers: StringRecord = source_headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                columns
                    .iter()
                    .find(|(_, index)| *index == i)
                    .map_or(header, |(field, _)| field.name())
            })
            .collect();
        log::debug!("catalog columns: {:?}", headers);

        let mut catalog = Catalog {
            headers,
            ..Default::default()
        };
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let values = columns
                .iter()
                .map(|&(field, index)| parse_value(&record, row, field, index))
                .collect::<Result<Vec<f64>>>()?;
            catalog
                .stars
                .push(Star::new(values[0], values[1], values[2], values[3], values[4]));
            catalog.records.push(record);
        }
        log::info!("... loaded in {:}ms", now.elapsed().as_millis());
        Ok(catalog)
    }
}
