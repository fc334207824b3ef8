use super::renderer;
use crate::cli::SolveArgs;
use crate::config::builder::build_config;
use crate::config::models::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use qupled::core::inputs::InputOverrides;
use qupled::engine::command::CommandSolverBackend;
use qupled::engine::progress::ProgressReporter;
use qupled::workflows::reader::ResultReader;
use qupled::workflows::scheme::Scheme;
use std::path::Path;
use tracing::info;

pub fn run(args: SolveArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;

    let overrides = match &args.guess {
        Some(path) => with_guess(config.overrides.clone(), path, &config)?,
        None => config.overrides.clone(),
    };

    let backend =
        CommandSolverBackend::new(&config.solver.program).with_args(config.solver.args.clone());
    let mut scheme = Scheme::new(
        config.kind,
        config.coupling,
        config.degeneracy,
        Some(&config.theory),
        &overrides,
        backend,
    )?
    .with_work_dir(&config.work_dir);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Solving {} for rs = {}, theta = {}...",
        config.theory, config.coupling, config.degeneracy
    );
    scheme.compute(&reporter)?;
    println!("✓ Results written to: {}", scheme.output_path().display());

    let grid = config.rdf.points();
    if config.write_rdf {
        scheme.compute_rdf(&grid, true)?;
        println!("✓ Radial distribution function appended.");
    }

    if !config.plot.is_empty() {
        let mut renderer = renderer(config.plot_dir.as_deref())?;
        scheme.plot(&mut renderer, &config.plot, None, &grid)?;
    }
    Ok(())
}

/// Seeds the overrides with the initial guess stored in a previous result file.
fn with_guess(overrides: InputOverrides, path: &Path, config: &AppConfig) -> Result<InputOverrides> {
    info!("Reading initial guess from {:?}", path);
    let reader = ResultReader::open(path)?;
    if config.kind.is_quantum() {
        Ok(overrides.quantum_guess(reader.qstls_guess()?))
    } else {
        Ok(overrides.guess(reader.slfc_guess()?))
    }
}
