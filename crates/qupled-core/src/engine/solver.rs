use crate::core::inputs::{InputSet, QuantumInputs};
use crate::core::io::store::StoreError;
use crate::core::tables::SchemeOutput;
use crate::core::theory::SchemeKind;
use crate::core::thermo::{self, ThermoError};
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Failed to launch solver '{program}': {source}")]
    Launch { program: String, source: io::Error },

    #[error("Failed to prepare solver workspace '{path}': {source}")]
    Workspace { path: String, source: io::Error },

    #[error("Failed to encode solver request: {0}")]
    Request(#[from] toml::ser::Error),

    #[error("Failed to load solver output: {0}")]
    Output(#[from] StoreError),

    #[error("Solver did not produce the '{0}' table")]
    MissingTable(&'static str),

    #[error(transparent)]
    Thermo(#[from] ThermoError),
}

/// Inputs handed to a solver for one compute.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeInputs {
    pub kind: SchemeKind,
    pub base: InputSet,
    /// Present for the quantum variants only.
    pub quantum: Option<QuantumInputs>,
}

/// A solver instance bound to one set of inputs.
pub trait SolverHandle {
    /// Runs the solver to completion. Zero means success.
    fn compute(&mut self) -> i32;

    /// Tables produced by the last successful compute.
    fn output(&self) -> Result<SchemeOutput, SolverError>;

    /// Checkpoint written while iterating, if the inputs requested one.
    fn recovery_file(&self) -> Option<&Path>;

    fn rdf(&self, grid: &[f64], wvg: &[f64], ssf: &[f64]) -> Result<Vec<f64>, SolverError> {
        Ok(thermo::radial_distribution(grid, wvg, ssf)?)
    }
}

/// Creates solver handles. One handle is created per compute.
pub trait SolverBackend {
    type Handle: SolverHandle;

    fn create(&self, inputs: &SchemeInputs, work_dir: &Path)
    -> Result<Self::Handle, SolverError>;
}
