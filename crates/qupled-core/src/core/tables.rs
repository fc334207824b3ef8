use super::inputs::InputSet;
use super::theory::TableKey;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Scalar summary of the inputs stored alongside every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputsSummary {
    pub coupling: f64,
    pub degeneracy: f64,
    pub theory: String,
    pub error: f64,
    pub resolution: f64,
    pub cutoff: f64,
    pub matsubara: usize,
}

impl From<&InputSet> for InputsSummary {
    fn from(inputs: &InputSet) -> Self {
        Self {
            coupling: inputs.coupling,
            degeneracy: inputs.degeneracy,
            theory: inputs.theory.clone(),
            error: inputs.error,
            resolution: inputs.resolution,
            cutoff: inputs.cutoff,
            matsubara: inputs.matsubara,
        }
    }
}

/// A single named section of a result file.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Summary(InputsSummary),
    Vector(Vec<f64>),
    /// Rows follow the wave-vector grid, columns the Matsubara index.
    Matrix(DMatrix<f64>),
}

/// Tables read back from a solver after a successful compute.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeOutput {
    pub wvg: Vec<f64>,
    pub idr: DMatrix<f64>,
    pub sdr: Vec<f64>,
    pub slfc: Vec<f64>,
    pub ssf: Vec<f64>,
    pub ssf_hf: Vec<f64>,
    pub bf: Option<Vec<f64>>,
    pub adr: Option<DMatrix<f64>>,
}

impl SchemeOutput {
    /// Returns the numeric table stored under `key`, if the solver produced it.
    ///
    /// The inputs summary and the radial distribution function are not solver
    /// outputs and always yield `None`.
    pub fn table(&self, key: TableKey) -> Option<Table> {
        match key {
            TableKey::Wvg => Some(Table::Vector(self.wvg.clone())),
            TableKey::Idr => Some(Table::Matrix(self.idr.clone())),
            TableKey::Sdr => Some(Table::Vector(self.sdr.clone())),
            TableKey::Slfc => Some(Table::Vector(self.slfc.clone())),
            TableKey::Ssf => Some(Table::Vector(self.ssf.clone())),
            TableKey::SsfHf => Some(Table::Vector(self.ssf_hf.clone())),
            TableKey::Bf => self.bf.clone().map(Table::Vector),
            TableKey::Adr => self.adr.clone().map(Table::Matrix),
            TableKey::Inputs | TableKey::Rdf | TableKey::RdfGrid => None,
        }
    }

    /// Borrowed one-dimensional view used for rendering.
    pub fn vector(&self, key: TableKey) -> Option<&[f64]> {
        match key {
            TableKey::Wvg => Some(&self.wvg),
            TableKey::Sdr => Some(&self.sdr),
            TableKey::Slfc => Some(&self.slfc),
            TableKey::Ssf => Some(&self.ssf),
            TableKey::SsfHf => Some(&self.ssf_hf),
            TableKey::Bf => self.bf.as_deref(),
            _ => None,
        }
    }

    /// Borrowed two-dimensional view used for rendering.
    pub fn matrix(&self, key: TableKey) -> Option<&DMatrix<f64>> {
        match key {
            TableKey::Idr => Some(&self.idr),
            TableKey::Adr => self.adr.as_ref(),
            _ => None,
        }
    }
}
