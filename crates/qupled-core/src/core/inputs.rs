use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Minimum number of points accepted in an initial guess.
const MIN_GUESS_POINTS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InputError {
    #[error("The quantum coupling parameter can't be negative")]
    NegativeCoupling,
    #[error("The quantum degeneracy parameter can't be negative")]
    NegativeDegeneracy,
    #[error("Invalid guess for chemical potential calculation")]
    ChemicalPotentialGuess,
    #[error("The wave-vector grid cutoff must be larger than zero")]
    Cutoff,
    #[error("The wave-vector grid resolution must be larger than zero")]
    Resolution,
    #[error("The minimum error for convergence must be larger than zero")]
    ConvergenceError,
    #[error("The mixing parameter must be a number between zero and one")]
    Mixing,
    #[error("The accuracy for the integral computations must be larger than zero")]
    IntegralError,
    #[error("The number of threads must be larger than zero")]
    Threads,
    #[error("Unknown IET mapping: {0}")]
    UnknownIetMapping(String),
    #[error("Unknown scheme for 2D integrals: {0}")]
    UnknownInt2DScheme(String),
    #[error("The initial guess does not contain enough points")]
    GuessTooShort,
    #[error("The initial guess is inconsistent")]
    GuessInconsistent,
}

/// Mapping between the quantum and classical state points used by the IET closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IetMapping {
    #[default]
    Standard,
    Sqrt,
    Linear,
}

impl FromStr for IetMapping {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(IetMapping::Standard),
            "sqrt" => Ok(IetMapping::Sqrt),
            "linear" => Ok(IetMapping::Linear),
            other => Err(InputError::UnknownIetMapping(other.to_string())),
        }
    }
}

impl fmt::Display for IetMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IetMapping::Standard => "standard",
            IetMapping::Sqrt => "sqrt",
            IetMapping::Linear => "linear",
        })
    }
}

/// Scheme used by the solver for two-dimensional integrals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Int2DScheme {
    #[default]
    Full,
    Segregated,
}

impl FromStr for Int2DScheme {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Int2DScheme::Full),
            "segregated" => Ok(Int2DScheme::Segregated),
            other => Err(InputError::UnknownInt2DScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Int2DScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Int2DScheme::Full => "full",
            Int2DScheme::Segregated => "segregated",
        })
    }
}

/// Initial guess for the classical schemes: a static local field correction tabulated
/// on a wave-vector grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlfcGuess {
    pub wvg: Vec<f64>,
    pub slfc: Vec<f64>,
}

impl SlfcGuess {
    pub fn is_empty(&self) -> bool {
        self.wvg.is_empty() && self.slfc.is_empty()
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.wvg.len() < MIN_GUESS_POINTS || self.slfc.len() < MIN_GUESS_POINTS {
            return Err(InputError::GuessTooShort);
        }
        if self.wvg.len() != self.slfc.len() {
            return Err(InputError::GuessInconsistent);
        }
        Ok(())
    }
}

/// Initial guess for the quantum schemes.
///
/// `adr` is either empty or a `wvg.len() x matsubara` table.
#[derive(Debug, Clone, PartialEq)]
pub struct QstlsGuess {
    pub wvg: Vec<f64>,
    pub ssf: Vec<f64>,
    pub adr: DMatrix<f64>,
    pub matsubara: usize,
}

impl Default for QstlsGuess {
    fn default() -> Self {
        Self {
            wvg: Vec::new(),
            ssf: Vec::new(),
            adr: DMatrix::zeros(0, 0),
            matsubara: 0,
        }
    }
}

impl QstlsGuess {
    pub fn is_empty(&self) -> bool {
        self.wvg.is_empty() && self.ssf.is_empty() && self.adr.is_empty()
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.wvg.len() < MIN_GUESS_POINTS || self.ssf.len() < MIN_GUESS_POINTS {
            return Err(InputError::GuessTooShort);
        }
        let mut consistent = self.wvg.len() == self.ssf.len();
        if self.adr.nrows() > 0 {
            consistent = consistent
                && self.adr.nrows() == self.wvg.len()
                && self.adr.ncols() == self.matsubara;
        }
        if !consistent {
            return Err(InputError::GuessInconsistent);
        }
        Ok(())
    }
}

/// Solver configuration shared by every scheme variant.
///
/// Built once through [`InputSet::new`] plus [`InputOverrides`] and treated as read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputSet {
    pub coupling: f64,
    pub degeneracy: f64,
    pub theory: String,
    pub chemical_potential: [f64; 2],
    pub cutoff: f64,
    pub resolution: f64,
    pub iterations: usize,
    pub error: f64,
    pub mixing: f64,
    pub matsubara: usize,
    pub output_frequency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_file: Option<PathBuf>,
    pub iet_mapping: IetMapping,
    pub int_2d_scheme: Int2DScheme,
    pub int_error: f64,
    pub threads: usize,
    pub guess: SlfcGuess,
}

impl InputSet {
    /// Creates an input set holding the compiled-in defaults.
    pub fn new(coupling: f64, degeneracy: f64, theory: &str) -> Result<Self, InputError> {
        if coupling < 0.0 {
            return Err(InputError::NegativeCoupling);
        }
        if degeneracy < 0.0 {
            return Err(InputError::NegativeDegeneracy);
        }
        Ok(Self {
            coupling,
            degeneracy,
            theory: theory.to_string(),
            chemical_potential: [-10.0, 10.0],
            cutoff: 10.0,
            resolution: 0.1,
            iterations: 1000,
            error: 1.0e-5,
            mixing: 1.0,
            matsubara: 128,
            output_frequency: 10,
            recovery_file: None,
            iet_mapping: IetMapping::Standard,
            int_2d_scheme: Int2DScheme::Full,
            int_error: 1.0e-5,
            threads: 1,
            guess: SlfcGuess::default(),
        })
    }
}

/// Extra inputs consumed only by the quantum schemes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuantumInputs {
    /// Precomputed fixed component of the auxiliary density response.
    pub fixed: Option<PathBuf>,
    /// Directory with the per-wave-vector fixed-response files of the IET schemes.
    pub fixed_iet: Option<PathBuf>,
    pub guess: QstlsGuess,
}

/// Optional overrides applied over the compiled-in defaults of an [`InputSet`].
///
/// Every present value replaces exactly one default and is checked on its own; absent
/// values leave the default untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOverrides {
    pub chemical_potential: Option<[f64; 2]>,
    pub cutoff: Option<f64>,
    pub resolution: Option<f64>,
    pub iterations: Option<usize>,
    pub error: Option<f64>,
    pub mixing: Option<f64>,
    pub matsubara: Option<usize>,
    pub output_frequency: Option<usize>,
    pub recovery_file: Option<PathBuf>,
    pub iet_mapping: Option<IetMapping>,
    pub int_2d_scheme: Option<Int2DScheme>,
    pub int_error: Option<f64>,
    pub threads: Option<usize>,
    pub guess: Option<SlfcGuess>,
    pub fixed: Option<PathBuf>,
    pub fixed_iet_archive: Option<PathBuf>,
    pub quantum_guess: Option<QstlsGuess>,
}

impl InputOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chemical_potential(mut self, guess: [f64; 2]) -> Self {
        self.chemical_potential = Some(guess);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }
    pub fn error(mut self, error: f64) -> Self {
        self.error = Some(error);
        self
    }
    pub fn mixing(mut self, mixing: f64) -> Self {
        self.mixing = Some(mixing);
        self
    }
    pub fn matsubara(mut self, matsubara: usize) -> Self {
        self.matsubara = Some(matsubara);
        self
    }
    pub fn output_frequency(mut self, frequency: usize) -> Self {
        self.output_frequency = Some(frequency);
        self
    }
    pub fn recovery_file(mut self, path: PathBuf) -> Self {
        self.recovery_file = Some(path);
        self
    }
    pub fn iet_mapping(mut self, mapping: IetMapping) -> Self {
        self.iet_mapping = Some(mapping);
        self
    }
    pub fn int_2d_scheme(mut self, scheme: Int2DScheme) -> Self {
        self.int_2d_scheme = Some(scheme);
        self
    }
    pub fn int_error(mut self, error: f64) -> Self {
        self.int_error = Some(error);
        self
    }
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
    pub fn guess(mut self, guess: SlfcGuess) -> Self {
        self.guess = Some(guess);
        self
    }
    pub fn fixed(mut self, path: PathBuf) -> Self {
        self.fixed = Some(path);
        self
    }
    pub fn fixed_iet_archive(mut self, path: PathBuf) -> Self {
        self.fixed_iet_archive = Some(path);
        self
    }
    pub fn quantum_guess(mut self, guess: QstlsGuess) -> Self {
        self.quantum_guess = Some(guess);
        self
    }

    /// Applies the shared overrides to `inputs`.
    pub fn apply(&self, mut inputs: InputSet) -> Result<InputSet, InputError> {
        if let Some(mu) = self.chemical_potential {
            if mu[0] >= mu[1] {
                return Err(InputError::ChemicalPotentialGuess);
            }
            inputs.chemical_potential = mu;
        }
        if let Some(cutoff) = self.cutoff {
            if cutoff <= 0.0 {
                return Err(InputError::Cutoff);
            }
            inputs.cutoff = cutoff;
        }
        if let Some(resolution) = self.resolution {
            if resolution <= 0.0 {
                return Err(InputError::Resolution);
            }
            inputs.resolution = resolution;
        }
        if let Some(iterations) = self.iterations {
            inputs.iterations = iterations;
        }
        if let Some(error) = self.error {
            if error <= 0.0 {
                return Err(InputError::ConvergenceError);
            }
            inputs.error = error;
        }
        if let Some(mixing) = self.mixing {
            if !(0.0..=1.0).contains(&mixing) {
                return Err(InputError::Mixing);
            }
            inputs.mixing = mixing;
        }
        if let Some(matsubara) = self.matsubara {
            inputs.matsubara = matsubara;
        }
        if let Some(frequency) = self.output_frequency {
            inputs.output_frequency = frequency;
        }
        if let Some(path) = &self.recovery_file {
            inputs.recovery_file = Some(path.clone());
        }
        if let Some(mapping) = self.iet_mapping {
            inputs.iet_mapping = mapping;
        }
        if let Some(scheme) = self.int_2d_scheme {
            inputs.int_2d_scheme = scheme;
        }
        if let Some(error) = self.int_error {
            if error <= 0.0 {
                return Err(InputError::IntegralError);
            }
            inputs.int_error = error;
        }
        if let Some(threads) = self.threads {
            if threads == 0 {
                return Err(InputError::Threads);
            }
            inputs.threads = threads;
        }
        if let Some(guess) = &self.guess {
            guess.validate()?;
            inputs.guess = guess.clone();
        }
        Ok(inputs)
    }

    /// Builds the quantum sub-record from the quantum-only overrides.
    ///
    /// The fixed-response archive is not part of the record: it is staged by the
    /// orchestrator at compute time.
    pub fn quantum_inputs(&self) -> Result<QuantumInputs, InputError> {
        let mut quantum = QuantumInputs::default();
        if let Some(path) = &self.fixed {
            quantum.fixed = Some(path.clone());
        }
        if let Some(guess) = &self.quantum_guess {
            guess.validate()?;
            quantum.guess = guess.clone();
        }
        Ok(quantum)
    }
}
