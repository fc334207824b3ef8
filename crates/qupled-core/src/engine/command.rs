use super::solver::{SchemeInputs, SolverBackend, SolverError, SolverHandle};
use crate::core::inputs::{InputSet, QuantumInputs};
use crate::core::io::store::ResultFile;
use crate::core::tables::SchemeOutput;
use crate::core::theory::{SchemeKind, TableKey};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, error, instrument};

const REQUEST_FILE: &str = "request.toml";
const RESULT_FILE: &str = "result.zip";
const SCRATCH_PREFIX: &str = "qupled_solver_";

#[derive(Serialize)]
struct SolverRequest<'a> {
    scheme: SchemeKind,
    inputs: &'a InputSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantum: Option<QuantumRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct QuantumRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_iet: Option<&'a Path>,
    guess: QuantumGuessRequest<'a>,
}

#[derive(Serialize)]
struct QuantumGuessRequest<'a> {
    wvg: &'a [f64],
    ssf: &'a [f64],
    /// Row-major, one row per wave vector.
    adr: Vec<Vec<f64>>,
    matsubara: usize,
}

impl<'a> From<&'a QuantumInputs> for QuantumRequest<'a> {
    fn from(quantum: &'a QuantumInputs) -> Self {
        let guess = &quantum.guess;
        Self {
            fixed: quantum.fixed.as_deref(),
            fixed_iet: quantum.fixed_iet.as_deref(),
            guess: QuantumGuessRequest {
                wvg: &guess.wvg,
                ssf: &guess.ssf,
                adr: guess
                    .adr
                    .row_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect(),
                matsubara: guess.matsubara,
            },
        }
    }
}

/// Runs an external solver executable.
///
/// The executable is invoked as `<program> [args] --input <request.toml> --output
/// <result.zip>` from the working directory. Its exit code is the compute status and
/// its tables are read back from the result file it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSolverBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSolverBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl SolverBackend for CommandSolverBackend {
    type Handle = CommandSolverHandle;

    #[instrument(skip_all, fields(scheme = %inputs.kind, theory = %inputs.base.theory))]
    fn create(&self, inputs: &SchemeInputs, work_dir: &Path) -> Result<CommandSolverHandle, SolverError> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|source| SolverError::Workspace {
                path: std::env::temp_dir().to_string_lossy().to_string(),
                source,
            })?;

        let request = SolverRequest {
            scheme: inputs.kind,
            inputs: &inputs.base,
            quantum: inputs.quantum.as_ref().map(QuantumRequest::from),
        };
        let request_path = scratch.path().join(REQUEST_FILE);
        fs::write(&request_path, toml::to_string(&request)?).map_err(|source| {
            SolverError::Workspace {
                path: request_path.to_string_lossy().to_string(),
                source,
            }
        })?;
        debug!(request = %request_path.display(), "Solver request written.");

        Ok(CommandSolverHandle {
            program: self.program.clone(),
            args: self.args.clone(),
            kind: inputs.kind,
            work_dir: work_dir.to_path_buf(),
            result: ResultFile::new(scratch.path().join(RESULT_FILE)),
            request: request_path,
            recovery: inputs.base.recovery_file.clone(),
            _scratch: scratch,
        })
    }
}

#[derive(Debug)]
pub struct CommandSolverHandle {
    program: PathBuf,
    args: Vec<String>,
    kind: SchemeKind,
    work_dir: PathBuf,
    request: PathBuf,
    result: ResultFile,
    recovery: Option<PathBuf>,
    _scratch: TempDir,
}

impl SolverHandle for CommandSolverHandle {
    fn compute(&mut self) -> i32 {
        debug!(program = %self.program.display(), "Launching solver.");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(&self.request)
            .arg("--output")
            .arg(self.result.path())
            .current_dir(&self.work_dir)
            .status();
        match status {
            Ok(status) => status.code().unwrap_or(-1),
            Err(source) => {
                let err = SolverError::Launch {
                    program: self.program.to_string_lossy().to_string(),
                    source,
                };
                error!("{}", err);
                -1
            }
        }
    }

    fn output(&self) -> Result<SchemeOutput, SolverError> {
        let file = &self.result;
        Ok(SchemeOutput {
            wvg: file.read_vector(TableKey::Wvg)?,
            idr: file.read_matrix(TableKey::Idr)?,
            sdr: file.read_vector(TableKey::Sdr)?,
            slfc: file.read_vector(TableKey::Slfc)?,
            ssf: file.read_vector(TableKey::Ssf)?,
            ssf_hf: file.read_vector(TableKey::SsfHf)?,
            bf: if self.kind.has_bridge_function() {
                Some(file.read_vector(TableKey::Bf)?)
            } else {
                None
            },
            adr: if self.kind.is_quantum() {
                Some(file.read_matrix(TableKey::Adr)?)
            } else {
                None
            },
        })
    }

    fn recovery_file(&self) -> Option<&Path> {
        self.recovery.as_deref()
    }
}
