use qupled::core::inputs::InputOverrides;
use qupled::core::theory::{SchemeKind, TableKey};
use qupled::core::thermo::rdf_grid;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RdfGridConfig {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl RdfGridConfig {
    pub fn points(&self) -> Vec<f64> {
        rdf_grid(self.start, self.stop, self.step)
    }
}

/// Fully merged configuration of one `solve` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kind: SchemeKind,
    pub theory: String,
    pub coupling: f64,
    pub degeneracy: f64,
    pub overrides: InputOverrides,
    pub solver: SolverSettings,
    pub work_dir: PathBuf,
    pub rdf: RdfGridConfig,
    pub write_rdf: bool,
    pub plot: Vec<TableKey>,
    pub plot_dir: Option<PathBuf>,
}
