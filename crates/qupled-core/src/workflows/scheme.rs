use super::rendering::{PlotData, render_table};
use crate::core::inputs::{InputOverrides, InputSet, QuantumInputs};
use crate::core::io::archive::{FixedAdrArchive, StagingArea};
use crate::core::io::naming::result_file_name;
use crate::core::io::store::ResultFile;
use crate::core::render::Renderer;
use crate::core::tables::{InputsSummary, SchemeOutput, Table};
use crate::core::theory::{SchemeKind, TableKey};
use crate::engine::error::SchemeError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::{SchemeInputs, SolverBackend, SolverError, SolverHandle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Everything produced by a successful compute.
#[derive(Debug)]
pub struct SchemeState<H> {
    pub inputs: SchemeInputs,
    pub handle: H,
    pub output: SchemeOutput,
    pub result_file: ResultFile,
}

/// Drives one solve of a dielectric scheme: validation, optional staging of a fixed
/// response bundle, the solver call, cleanup and persistence of the result tables.
///
/// A scheme is single-use: once [`Scheme::compute`] has been called, further calls
/// fail with [`SchemeError::AlreadyComputed`].
pub struct Scheme<B: SolverBackend> {
    kind: SchemeKind,
    inputs: InputSet,
    quantum: Option<QuantumInputs>,
    fixed_iet_archive: Option<PathBuf>,
    work_dir: PathBuf,
    backend: B,
    attempted: bool,
    state: Option<SchemeState<B::Handle>>,
}

impl<B: SolverBackend> Scheme<B> {
    /// Builds a scheme of the given variant.
    ///
    /// `theory` defaults to the variant's own theory when omitted; the IET variants
    /// have no default and fail with [`SchemeError::InvalidTheory`]. All variants but
    /// the classical one check the theory here as well as when computing.
    pub fn new(
        kind: SchemeKind,
        coupling: f64,
        degeneracy: f64,
        theory: Option<&str>,
        overrides: &InputOverrides,
        backend: B,
    ) -> Result<Self, SchemeError> {
        let theory = theory
            .or(kind.default_theory())
            .ok_or_else(|| SchemeError::InvalidTheory {
                theory: String::new(),
                kind,
            })?;
        let inputs = overrides.apply(InputSet::new(coupling, degeneracy, theory)?)?;
        let quantum = if kind.is_quantum() {
            Some(overrides.quantum_inputs()?)
        } else {
            None
        };
        warn_unused_overrides(kind, overrides);

        let scheme = Self {
            kind,
            inputs,
            quantum,
            fixed_iet_archive: match kind {
                SchemeKind::QstlsIet => overrides.fixed_iet_archive.clone(),
                _ => None,
            },
            work_dir: PathBuf::from("."),
            backend,
            attempted: false,
            state: None,
        };
        if kind.validates_on_construction() {
            scheme.validate()?;
        }
        Ok(scheme)
    }

    pub fn stls(
        coupling: f64,
        degeneracy: f64,
        overrides: &InputOverrides,
        backend: B,
    ) -> Result<Self, SchemeError> {
        Self::new(SchemeKind::Stls, coupling, degeneracy, None, overrides, backend)
    }

    pub fn stls_iet(
        coupling: f64,
        degeneracy: f64,
        theory: &str,
        overrides: &InputOverrides,
        backend: B,
    ) -> Result<Self, SchemeError> {
        Self::new(
            SchemeKind::StlsIet,
            coupling,
            degeneracy,
            Some(theory),
            overrides,
            backend,
        )
    }

    pub fn qstls(
        coupling: f64,
        degeneracy: f64,
        overrides: &InputOverrides,
        backend: B,
    ) -> Result<Self, SchemeError> {
        Self::new(SchemeKind::Qstls, coupling, degeneracy, None, overrides, backend)
    }

    pub fn qstls_iet(
        coupling: f64,
        degeneracy: f64,
        theory: &str,
        overrides: &InputOverrides,
        backend: B,
    ) -> Result<Self, SchemeError> {
        Self::new(
            SchemeKind::QstlsIet,
            coupling,
            degeneracy,
            Some(theory),
            overrides,
            backend,
        )
    }

    /// Directory the solver runs in and the result file is written to.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    pub fn inputs(&self) -> &InputSet {
        &self.inputs
    }

    pub fn quantum_inputs(&self) -> Option<&QuantumInputs> {
        self.quantum.as_ref()
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_file_name(&self) -> String {
        result_file_name(
            self.inputs.coupling,
            self.inputs.degeneracy,
            &self.inputs.theory,
        )
    }

    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(self.output_file_name())
    }

    pub fn state(&self) -> Option<&SchemeState<B::Handle>> {
        self.state.as_ref()
    }

    pub fn output(&self) -> Option<&SchemeOutput> {
        self.state.as_ref().map(|state| &state.output)
    }

    pub fn result_file(&self) -> Option<&ResultFile> {
        self.state.as_ref().map(|state| &state.result_file)
    }

    fn validate(&self) -> Result<(), SchemeError> {
        if self.kind.allows(&self.inputs.theory) {
            Ok(())
        } else {
            error!(theory = %self.inputs.theory, scheme = %self.kind, "Theory not supported by this scheme.");
            Err(SchemeError::InvalidTheory {
                theory: self.inputs.theory.clone(),
                kind: self.kind,
            })
        }
    }

    #[instrument(skip_all, name = "scheme_compute", fields(scheme = %self.kind, theory = %self.inputs.theory))]
    pub fn compute(&mut self, reporter: &ProgressReporter) -> Result<(), SchemeError> {
        if self.attempted {
            return Err(SchemeError::AlreadyComputed);
        }
        self.attempted = true;

        reporter.report(Progress::PhaseStart { name: "Validating" });
        self.validate()?;
        reporter.report(Progress::PhaseFinish);

        let staging = self.stage(reporter)?;
        let mut scheme_inputs = SchemeInputs {
            kind: self.kind,
            base: self.inputs.clone(),
            quantum: self.quantum.clone(),
        };
        if let (Some(area), Some(quantum)) = (&staging, scheme_inputs.quantum.as_mut()) {
            quantum.fixed_iet = Some(area.path().to_path_buf());
        }

        reporter.report(Progress::PhaseStart { name: "Solving" });
        info!("Solving the dielectric theory.");
        let solved = self
            .backend
            .create(&scheme_inputs, &self.work_dir)
            .map(|mut handle| {
                let status = handle.compute();
                (handle, status)
            });
        reporter.report(Progress::PhaseFinish);

        if let Some(area) = staging {
            match (area.close(), &solved) {
                (Ok(()), _) => {}
                (Err(e), Ok((_, 0))) => return Err(e.into()),
                (Err(e), _) => {
                    warn!(error = %e, "Failed to remove the staging directory after a failed solve.");
                }
            }
        }
        let (handle, status) = solved?;
        self.clean_up(&handle, status)?;

        reporter.report(Progress::PhaseStart {
            name: "Saving Results",
        });
        let output = handle.output()?;
        let result_file = ResultFile::new(self.output_path());
        self.save(&result_file, &output)?;
        if self.kind == SchemeKind::QstlsIet && self.fixed_iet_archive.is_none() {
            let packed = FixedAdrArchive::new(
                self.inputs.coupling,
                self.inputs.degeneracy,
                &self.inputs.theory,
            )
            .pack(&self.work_dir)?;
            reporter.report(Progress::Message(format!(
                "Archived {} fixed response files into {}",
                packed.files,
                packed.archive.display()
            )));
        }
        reporter.report(Progress::PhaseFinish);

        info!(file = %result_file.path().display(), "Results saved.");
        self.state = Some(SchemeState {
            inputs: scheme_inputs,
            handle,
            output,
            result_file,
        });
        Ok(())
    }

    fn stage(&self, reporter: &ProgressReporter) -> Result<Option<StagingArea>, SchemeError> {
        let Some(bundle) = &self.fixed_iet_archive else {
            return Ok(None);
        };
        reporter.report(Progress::PhaseStart {
            name: "Staging Fixed Response",
        });
        let area = FixedAdrArchive::unpack(bundle, &self.work_dir)?;
        reporter.report(Progress::PhaseFinish);
        Ok(Some(area))
    }

    fn clean_up(&self, handle: &B::Handle, status: i32) -> Result<(), SchemeError> {
        if status != 0 {
            error!(status, "Solver returned a failure status.");
            return Err(SchemeError::SolveFailure { status });
        }
        if let Some(path) = handle.recovery_file() {
            let path = if path.is_relative() {
                self.work_dir.join(path)
            } else {
                path.to_path_buf()
            };
            if path.is_file() {
                debug!(path = %path.display(), "Removing recovery file.");
                fs::remove_file(&path).map_err(|source| SchemeError::Recovery {
                    path: path.to_string_lossy().to_string(),
                    source,
                })?;
            }
        }
        info!("Dielectric theory solved successfully!");
        Ok(())
    }

    fn save(&self, file: &ResultFile, output: &SchemeOutput) -> Result<(), SchemeError> {
        let summary = InputsSummary::from(&self.inputs);
        let sections = self
            .kind
            .persisted_tables()
            .map(|key| match key {
                TableKey::Inputs => Ok((key, Table::Summary(summary.clone()))),
                _ => output
                    .table(key)
                    .map(|table| (key, table))
                    .ok_or(SolverError::MissingTable(key.name())),
            })
            .collect::<Result<Vec<_>, SolverError>>()?;
        file.create(&sections)?;
        Ok(())
    }

    /// Radial distribution function on `grid` from the computed structure factor.
    ///
    /// With `write` set, `rdfGrid` and `rdf` are appended to the result file.
    pub fn compute_rdf(&self, grid: &[f64], write: bool) -> Result<Vec<f64>, SchemeError> {
        let state = self.state.as_ref().ok_or(SchemeError::NoSolution)?;
        let rdf = state
            .handle
            .rdf(grid, &state.output.wvg, &state.output.ssf)?;
        if write {
            state.result_file.append(&[
                (TableKey::RdfGrid, Table::Vector(grid.to_vec())),
                (TableKey::Rdf, Table::Vector(rdf.clone())),
            ])?;
        }
        Ok(rdf)
    }

    /// Renders the requested tables owned by this variant.
    ///
    /// `matsubara` defaults to every index of the computed tables. Plotting `rdf`
    /// computes it on `rdf_grid` and appends it to the result file.
    pub fn plot<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        to_plot: &[TableKey],
        matsubara: Option<&[usize]>,
        rdf_grid: &[f64],
    ) -> Result<(), SchemeError> {
        let state = self.state.as_ref().ok_or(SchemeError::NotComputed)?;
        let default_matsubara: Vec<usize> = (0..self.inputs.matsubara).collect();
        let matsubara = matsubara.unwrap_or(&default_matsubara);

        for key in to_plot {
            if !self.kind.plottable_tables().any(|owned| owned == *key) {
                warn!(table = %key, scheme = %self.kind, "Table not available for this scheme, skipping.");
            }
        }

        let output = &state.output;
        for key in self
            .kind
            .plottable_tables()
            .filter(|key| to_plot.contains(key))
        {
            if key == TableKey::Rdf {
                let rdf = self.compute_rdf(rdf_grid, true)?;
                render_table(renderer, key, rdf_grid, PlotData::Line(&rdf), matsubara)?;
            } else if let Some(matrix) = output.matrix(key) {
                render_table(
                    renderer,
                    key,
                    &output.wvg,
                    PlotData::Matsubara(matrix),
                    matsubara,
                )?;
            } else if let Some(values) = output.vector(key) {
                render_table(renderer, key, &output.wvg, PlotData::Line(values), matsubara)?;
            }
        }
        Ok(())
    }
}

fn warn_unused_overrides(kind: SchemeKind, overrides: &InputOverrides) {
    if !kind.is_quantum() {
        if overrides.fixed.is_some() {
            warn!(scheme = %kind, "Ignoring fixed auxiliary density response for a classical scheme.");
        }
        if overrides.quantum_guess.is_some() {
            warn!(scheme = %kind, "Ignoring quantum initial guess for a classical scheme.");
        }
    } else if overrides.guess.is_some() {
        warn!(scheme = %kind, "Ignoring classical initial guess for a quantum scheme.");
    }
    if !kind.has_bridge_function() && overrides.iet_mapping.is_some() {
        warn!(scheme = %kind, "Ignoring IET mapping for a scheme without bridge function.");
    }
    if kind != SchemeKind::QstlsIet {
        if overrides.fixed_iet_archive.is_some() {
            warn!(scheme = %kind, "Ignoring fixed response archive outside the quantum IET schemes.");
        }
        if overrides.int_2d_scheme.is_some() {
            warn!(scheme = %kind, "Ignoring 2D integral scheme outside the quantum IET schemes.");
        }
    }
}
