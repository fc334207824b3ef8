use super::renderer;
use crate::cli::PlotArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use qupled::workflows::reader::ResultReader;
use tracing::info;

pub fn run(args: PlotArgs) -> Result<()> {
    let tables = parser::parse_tables(&args.tables).map_err(|e| CliError::Argument(e.to_string()))?;
    if tables.is_empty() {
        return Err(CliError::Argument("No tables to plot.".to_string()));
    }

    info!("Reading results from {:?}", &args.file);
    let reader = ResultReader::open(&args.file)?;
    let matsubara = (!args.matsubara.is_empty()).then_some(args.matsubara.as_slice());

    let mut renderer = renderer(args.plot_dir.as_deref())?;
    reader.plot(&mut renderer, &tables, matsubara)?;
    if let Some(dir) = &args.plot_dir {
        println!("✓ Plots written to: {}", dir.display());
    }
    Ok(())
}
