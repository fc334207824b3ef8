use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileRdfConfig};
use super::models::{AppConfig, RdfGridConfig, SolverSettings};
use crate::cli::SolveArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use qupled::core::inputs::{IetMapping, InputOverrides, Int2DScheme};
use qupled::core::theory::SchemeKind;
use qupled::engine::error::SchemeError;

pub fn build_config(args: &SolveArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = file_config.apply_set_values(&args.set_values)?;

    let kind = SchemeKind::for_theory(&args.theory).ok_or_else(|| {
        CliError::Core(SchemeError::InvalidTheory {
            theory: args.theory.clone(),
            kind: SchemeKind::Stls,
        })
    })?;

    let solver_file = file_config.solver.take().unwrap_or_default();
    let solver = SolverSettings {
        program: args
            .solver
            .clone()
            .or(solver_file.program)
            .unwrap_or(defaults.solver_program.clone()),
        args: solver_file.args.unwrap_or_default(),
    };
    let work_dir = args
        .work_dir
        .clone()
        .or(solver_file.work_dir)
        .unwrap_or(defaults.work_dir.clone());

    let overrides = merge_overrides(args, &mut file_config)?;
    let rdf = merge_rdf_grid(
        (None, None, None),
        file_config.rdf.as_ref(),
        &defaults,
    );
    let plot = parser::parse_tables(&args.plot).map_err(|e| CliError::Argument(e.to_string()))?;

    Ok(AppConfig {
        kind,
        theory: args.theory.clone(),
        coupling: args.coupling,
        degeneracy: args.degeneracy,
        overrides,
        solver,
        work_dir,
        rdf,
        write_rdf: args.rdf,
        plot,
        plot_dir: args.plot_dir.clone(),
    })
}

/// Grid for the radial distribution function: CLI values, then the file, then defaults.
pub fn merge_rdf_grid(
    cli: (Option<f64>, Option<f64>, Option<f64>),
    file_val: Option<&FileRdfConfig>,
    defaults: &DefaultsConfig,
) -> RdfGridConfig {
    let file_val = file_val.cloned().unwrap_or_default();
    RdfGridConfig {
        start: cli.0.or(file_val.start).unwrap_or(defaults.rdf_start),
        stop: cli.1.or(file_val.stop).unwrap_or(defaults.rdf_stop),
        step: cli.2.or(file_val.step).unwrap_or(defaults.rdf_step),
    }
}

fn merge_overrides(args: &SolveArgs, file_config: &mut FileConfig) -> Result<InputOverrides> {
    let file_val = file_config.inputs.take().unwrap_or_default();
    let mut overrides = InputOverrides::new();

    let chemical_potential = match &args.chemical_potential {
        Some(values) => Some(chemical_potential_pair(values)?),
        None => file_val.chemical_potential,
    };
    if let Some(mu) = chemical_potential {
        overrides = overrides.chemical_potential(mu);
    }
    if let Some(cutoff) = args.cutoff.or(file_val.cutoff) {
        overrides = overrides.cutoff(cutoff);
    }
    if let Some(resolution) = args.resolution.or(file_val.resolution) {
        overrides = overrides.resolution(resolution);
    }
    if let Some(iterations) = args.iterations.or(file_val.iterations) {
        overrides = overrides.iterations(iterations);
    }
    if let Some(error) = args.error.or(file_val.error) {
        overrides = overrides.error(error);
    }
    if let Some(mixing) = args.mixing.or(file_val.mixing) {
        overrides = overrides.mixing(mixing);
    }
    if let Some(matsubara) = args.matsubara.or(file_val.matsubara) {
        overrides = overrides.matsubara(matsubara);
    }
    if let Some(frequency) = args.output_frequency.or(file_val.output_frequency) {
        overrides = overrides.output_frequency(frequency);
    }
    if let Some(path) = args.recovery_file.clone().or(file_val.recovery_file) {
        overrides = overrides.recovery_file(path);
    }
    if let Some(mapping) = args.iet_mapping.as_ref().or(file_val.iet_mapping.as_ref()) {
        let mapping: IetMapping = mapping.parse().map_err(SchemeError::from)?;
        overrides = overrides.iet_mapping(mapping);
    }
    if let Some(scheme) = args
        .int_2d_scheme
        .as_ref()
        .or(file_val.int_2d_scheme.as_ref())
    {
        let scheme: Int2DScheme = scheme.parse().map_err(SchemeError::from)?;
        overrides = overrides.int_2d_scheme(scheme);
    }
    if let Some(error) = args.int_error.or(file_val.int_error) {
        overrides = overrides.int_error(error);
    }
    if let Some(threads) = args.threads.or(file_val.threads) {
        overrides = overrides.threads(threads);
    }
    if let Some(path) = args.fixed.clone().or(file_val.fixed) {
        overrides = overrides.fixed(path);
    }
    if let Some(path) = args.fixed_iet.clone().or(file_val.fixed_iet) {
        overrides = overrides.fixed_iet_archive(path);
    }
    Ok(overrides)
}

fn chemical_potential_pair(values: &[f64]) -> Result<[f64; 2]> {
    match values {
        [low, high] => Ok([*low, *high]),
        _ => Err(CliError::Argument(format!(
            "Expected two values for the chemical potential guess, got {}",
            values.len()
        ))),
    }
}
