use crate::cli::RdfArgs;
use crate::config::builder::merge_rdf_grid;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use qupled::workflows::reader::ResultReader;
use tracing::info;

pub fn run(args: RdfArgs) -> Result<()> {
    let grid = merge_rdf_grid(
        (args.start, args.stop, args.step),
        None,
        &DefaultsConfig::default(),
    );
    let points = grid.points();
    if points.is_empty() {
        return Err(CliError::Argument(format!(
            "Empty distance grid: start = {}, stop = {}, step = {}",
            grid.start, grid.stop, grid.step
        )));
    }

    info!("Reading results from {:?}", &args.file);
    let reader = ResultReader::open(&args.file)?;
    let rdf = reader.compute_rdf(&points, !args.no_save)?;

    println!("{:>12} {:>14}", "r", "g(r)");
    for (r, g) in points.iter().zip(&rdf) {
        println!("{:>12.6} {:>14.8}", r, g);
    }
    if !args.no_save {
        println!(
            "✓ Radial distribution function appended to: {}",
            args.file.display()
        );
    }
    Ok(())
}
