use std::path::PathBuf;

use nightsky::{Config, MatchStrategy, Pipeline, Tolerance};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "nightsky",
    about = "Gaia catalog to Nightsky point cloud: coordinates, colors and star names"
)]
struct Opt {
    /// Gaia catalog (.csv, .csv.gz or .csv.bz2)
    #[structopt(parse(from_os_str), default_value = "TOP 20000 bright.csv")]
    catalog: PathBuf,
    /// Reference table of IAU star names
    #[structopt(short, long, parse(from_os_str), default_value = "star names.csv")]
    names: PathBuf,
    /// Skip star naming
    #[structopt(long)]
    no_names: bool,
    /// Point cloud file [default: "<catalog> full with names.csv"]
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Star naming relative tolerance
    #[structopt(long, default_value = "1e-4")]
    rtol: f64,
    /// Star naming absolute tolerance
    #[structopt(long, default_value = "0")]
    atol: f64,
    /// Star naming algorithm: naive or indexed
    #[structopt(short, long, default_value = "indexed")]
    strategy: MatchStrategy,
    /// Catalog field delimiter
    #[structopt(short, long, default_value = ",")]
    delimiter: char,
    /// Fail on missing or out of range catalog values
    #[structopt(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    log::debug!("{:?}", opt);

    anyhow::ensure!(
        opt.delimiter.is_ascii(),
        "the delimiter must be an ASCII character, found {:?}",
        opt.delimiter
    );
    let mut config = Config::default()
        .catalog(&opt.catalog)
        .names(&opt.names)
        .tolerance(Tolerance::new(opt.rtol, opt.atol))
        .strategy(opt.strategy)
        .delimiter(opt.delimiter as u8)
        .strict(opt.strict);
    if opt.no_names {
        config = config.without_names();
    }
    if let Some(output) = opt.output {
        config = config.output(output);
    }

    let report = Pipeline::new(config).run()?;
    println!(
        "{} stars, coordinates normalized by {}",
        report.stars, report.norm_factor
    );
    if let Some(names) = report.names {
        println!("Found {} star names", names.matches);
    }
    println!("Point cloud written to {:?}", report.output);

    Ok(())
}
