//! # Workflows Module
//!
//! High-level entry points of qupled: solving a dielectric scheme and working with the
//! results it leaves on disk.
//!
//! ## Architecture
//!
//! - **Scheme Orchestration** ([`scheme`]) - The validate, stage, solve, clean up and persist
//!   lifecycle shared by the STLS, STLS-IET, QSTLS and QSTLS-IET variants
//! - **Result Reading** ([`reader`]) - Plots, radial distribution function, internal energy
//!   and initial guesses recovered from a persisted result file

pub(crate) mod rendering;
pub mod reader;
pub mod scheme;
