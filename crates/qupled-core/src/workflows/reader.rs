use super::rendering::{PlotData, render_table};
use crate::core::inputs::{QstlsGuess, SlfcGuess};
use crate::core::io::store::ResultFile;
use crate::core::render::Renderer;
use crate::core::tables::{InputsSummary, Table};
use crate::core::theory::TableKey;
use crate::core::thermo;
use crate::engine::error::SchemeError;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Rendering order of the tables a reader can plot.
const PLOT_ORDER: [TableKey; 8] = [
    TableKey::Adr,
    TableKey::Bf,
    TableKey::Idr,
    TableKey::Rdf,
    TableKey::Sdr,
    TableKey::Slfc,
    TableKey::Ssf,
    TableKey::SsfHf,
];

/// Read-only access to a persisted result file.
#[derive(Debug, Clone)]
pub struct ResultReader {
    file: ResultFile,
    summary: InputsSummary,
}

impl ResultReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SchemeError> {
        let file = ResultFile::new(path);
        let summary = file.read_summary()?;
        debug!(path = %file.path().display(), theory = %summary.theory, "Opened result file.");
        Ok(Self { file, summary })
    }

    pub fn file(&self) -> &ResultFile {
        &self.file
    }

    pub fn summary(&self) -> &InputsSummary {
        &self.summary
    }

    /// Every Matsubara index recorded in the inputs summary.
    pub fn default_matsubara(&self) -> Vec<usize> {
        (0..self.summary.matsubara).collect()
    }

    /// Renders the requested tables as stored in the file.
    pub fn plot<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        to_plot: &[TableKey],
        matsubara: Option<&[usize]>,
    ) -> Result<(), SchemeError> {
        let default_matsubara = self.default_matsubara();
        let matsubara = matsubara.unwrap_or(&default_matsubara);

        for key in PLOT_ORDER.into_iter().filter(|key| to_plot.contains(key)) {
            if key == TableKey::Rdf {
                let grid = self.file.read_vector(TableKey::RdfGrid)?;
                let rdf = self.file.read_vector(TableKey::Rdf)?;
                render_table(renderer, key, &grid, PlotData::Line(&rdf), matsubara)?;
                continue;
            }
            let wvg = self.file.read_vector(TableKey::Wvg)?;
            if key.is_matsubara_table() {
                let matrix = self.file.read_matrix(key)?;
                render_table(renderer, key, &wvg, PlotData::Matsubara(&matrix), matsubara)?;
            } else {
                let values = self.file.read_vector(key)?;
                render_table(renderer, key, &wvg, PlotData::Line(&values), matsubara)?;
            }
        }
        Ok(())
    }

    /// Radial distribution function on `grid` from the stored structure factor.
    ///
    /// With `save` set, `rdfGrid` and `rdf` are appended to the file.
    #[instrument(skip_all, fields(points = grid.len()))]
    pub fn compute_rdf(&self, grid: &[f64], save: bool) -> Result<Vec<f64>, SchemeError> {
        let wvg = self.file.read_vector(TableKey::Wvg)?;
        let ssf = self.file.read_vector(TableKey::Ssf)?;
        let rdf = thermo::radial_distribution(grid, &wvg, &ssf)?;
        if save {
            self.file.append(&[
                (TableKey::RdfGrid, Table::Vector(grid.to_vec())),
                (TableKey::Rdf, Table::Vector(rdf.clone())),
            ])?;
        }
        Ok(rdf)
    }

    /// Interaction energy from the stored structure factor and coupling.
    pub fn internal_energy(&self) -> Result<f64, SchemeError> {
        let wvg = self.file.read_vector(TableKey::Wvg)?;
        let ssf = self.file.read_vector(TableKey::Ssf)?;
        Ok(thermo::internal_energy(&wvg, &ssf, self.summary.coupling)?)
    }

    /// Initial guess for a classical scheme taken from this result.
    pub fn slfc_guess(&self) -> Result<SlfcGuess, SchemeError> {
        Ok(SlfcGuess {
            wvg: self.file.read_vector(TableKey::Wvg)?,
            slfc: self.file.read_vector(TableKey::Slfc)?,
        })
    }

    /// Initial guess for a quantum scheme taken from this result.
    pub fn qstls_guess(&self) -> Result<QstlsGuess, SchemeError> {
        let adr = self.file.read_matrix(TableKey::Adr)?;
        Ok(QstlsGuess {
            wvg: self.file.read_vector(TableKey::Wvg)?,
            ssf: self.file.read_vector(TableKey::Ssf)?,
            matsubara: adr.ncols(),
            adr,
        })
    }
}
