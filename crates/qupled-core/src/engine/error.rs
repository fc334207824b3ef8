use std::io;
use thiserror::Error;

use super::solver::SolverError;
use crate::core::inputs::InputError;
use crate::core::io::archive::ArchiveError;
use crate::core::io::store::StoreError;
use crate::core::render::RenderError;
use crate::core::theory::SchemeKind;
use crate::core::thermo::ThermoError;

#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("Invalid dielectric theory")]
    InvalidTheory { theory: String, kind: SchemeKind },

    #[error("Error while solving the dielectric theory")]
    SolveFailure { status: i32 },

    #[error("No solution to compute the radial distribution function")]
    NoSolution,

    #[error("No solution available: the scheme has not been computed")]
    NotComputed,

    #[error("The scheme has already been computed")]
    AlreadyComputed,

    #[error("Invalid input: {source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("Solver error: {source}")]
    Solver {
        #[from]
        source: SolverError,
    },

    #[error("Result file error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Fixed response archive error: {source}")]
    Archive {
        #[from]
        source: ArchiveError,
    },

    #[error("Thermodynamics error: {source}")]
    Thermo {
        #[from]
        source: ThermoError,
    },

    #[error("Rendering error: {source}")]
    Render {
        #[from]
        source: RenderError,
    },

    #[error("Failed to remove recovery file '{path}': {source}")]
    Recovery { path: String, source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_messages_are_exact() {
        let invalid = SchemeError::InvalidTheory {
            theory: "RPA".to_string(),
            kind: SchemeKind::Stls,
        };
        assert_eq!(invalid.to_string(), "Invalid dielectric theory");
        assert_eq!(
            SchemeError::SolveFailure { status: 3 }.to_string(),
            "Error while solving the dielectric theory"
        );
        assert_eq!(
            SchemeError::NoSolution.to_string(),
            "No solution to compute the radial distribution function"
        );
    }
}
