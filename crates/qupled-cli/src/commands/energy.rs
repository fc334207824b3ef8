use crate::cli::EnergyArgs;
use crate::error::Result;
use qupled::workflows::reader::ResultReader;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    info!("Reading results from {:?}", &args.file);
    let reader = ResultReader::open(&args.file)?;
    let energy = reader.internal_energy()?;
    let summary = reader.summary();
    println!(
        "{} (rs = {}, theta = {}): internal energy = {:.8}",
        summary.theory, summary.coupling, summary.degeneracy, energy
    );
    Ok(())
}
