//! Point cloud table writer

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use csv::StringRecord;

use crate::Catalog;

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("failed to create {0:?}")]
    Create(PathBuf, #[source] io::Error),
    #[error("failed to serialize the CSV file")]
    Csv(#[from] csv::Error),
    #[error("failed to write the CSV file")]
    Io(#[from] io::Error),
}
type Result<T> = std::result::Result<T, OutputError>;

/// Appended to the catalog file name to get the point cloud file name
pub const NAMED_SUFFIX: &str = " full with names";
/// Columns added to the catalog
pub const DERIVED_COLUMNS: [&str; 10] = [
    "x", "y", "z", "x_norm", "y_norm", "z_norm", "R", "G", "B", "Name",
];

/// Returns the default point cloud path of a catalog
///
/// The `.csv` extension, and any `.gz` or `.bz2` one before it, is replaced with
/// `" full with names.csv"`
pub fn output_path<P: AsRef<Path>>(catalog: P) -> PathBuf {
    let catalog = catalog.as_ref();
    let file_name = catalog
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = [".gz", ".bz2"]
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(&file_name);
    let stem = stem.strip_suffix(".csv").unwrap_or(stem);
    catalog.with_file_name(format!("{stem}{NAMED_SUFFIX}.csv"))
}

/// Formats a float with the shortest representation that parses back to the same value
///
/// Integral values keep a trailing `.0`, magnitudes below 1e-4 or from 1e16 use the
/// scientific notation and NaN is written as an empty field
pub(crate) fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_nan() {
        String::new()
    } else if magnitude != 0f64 && (magnitude < 1e-4 || magnitude >= 1e16) {
        format!("{:e}", value)
    } else if value.fract() == 0f64 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl Catalog {
    /// Writes the catalog and the derived columns
    ///
    /// Source columns with the same name as a derived column are skipped.
    pub fn write<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let source: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !DERIVED_COLUMNS.contains(header))
            .map(|(i, _)| i)
            .collect();

        let mut headers: StringRecord = source.iter().map(|&i| &self.headers[i]).collect();
        headers.extend(DERIVED_COLUMNS);
        wtr.write_record(&headers)?;

        for (record, star) in self.records.iter().zip(self.stars.iter()) {
            let mut row: StringRecord = source
                .iter()
                .map(|&i| record.get(i).unwrap_or_default())
                .collect();
            star.xyz
                .iter()
                .chain(star.xyz_norm.iter())
                .for_each(|&x| row.push_field(&format_float(x)));
            star.rgb
                .iter()
                .for_each(|c| row.push_field(&c.to_string()));
            row.push_field(&star.name);
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
    /// Writes the catalog to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Writing {:?}...", path);
        let file = File::create(path).map_err(|e| OutputError::Create(path.to_path_buf(), e))?;
        self.write(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::scratch_dir, Star};

    #[test]
    fn default_output_path() {
        assert_eq!(
            output_path("TOP 20000 bright.csv"),
            PathBuf::from("TOP 20000 bright full with names.csv")
        );
        assert_eq!(
            output_path("data/gaia.csv.gz"),
            PathBuf::from("data/gaia full with names.csv")
        );
        assert_eq!(
            output_path("stars.tsv"),
            PathBuf::from("stars.tsv full with names.csv")
        );
        // only the extension is removed
        assert_eq!(
            output_path("vcs.csv"),
            PathBuf::from("vcs full with names.csv")
        );
    }

    #[test]
    fn float_format() {
        assert_eq!(format_float(50.), "50.0");
        assert_eq!(format_float(-0.2), "-0.2");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_float(f64::NAN), "");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(1e-4), "0.0001");
        assert_eq!(format_float(-2.5e-5), "-2.5e-5");
        assert_eq!(format_float(1e-300), "1e-300");
        assert_eq!(format_float(1.5e20), "1.5e20");
        assert_eq!(format_float(1e16), "1e16");
        assert_eq!(format_float(9e15), "9000000000000000.0");
        for x in [1e-300, 2.4492935982947064e-15, 6.02214076e23] {
            assert_eq!(format_float(x).parse::<f64>().unwrap(), x);
        }
        let x = 120f64 * 0.5f64.cos() * 1f64.cos();
        assert_eq!(format_float(x).parse::<f64>().unwrap(), x);
    }

    #[test]
    fn write_table() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut star = Star::new(0., 0., 5., 10., 20.);
        star.xyz = [5., 0., 0.];
        star.xyz_norm = [0.5, 0., 0.];
        star.rgb = [25, 178, 51];
        star.name = String::from("Sol, again");
        let catalog = Catalog::from_stars(vec![star]);
        let mut buffer = vec![];
        catalog.write(&mut buffer)?;
        assert_eq!(
            String::from_utf8(buffer)?,
            "ra,dec,dist,rp,bp,x,y,z,x_norm,y_norm,z_norm,R,G,B,Name\n\
             0.0,0.0,5.0,10.0,20.0,5.0,0.0,0.0,0.5,0.0,0.0,25,178,51,\"Sol, again\"\n"
        );
        Ok(())
    }

    #[test]
    fn unwritable_destination() {
        let dir = scratch_dir("unwritable");
        let catalog = Catalog::from_stars(vec![]);
        assert!(matches!(
            catalog.to_csv(dir.join("no such folder").join("out.csv")),
            Err(OutputError::Create(..))
        ));
    }
}
