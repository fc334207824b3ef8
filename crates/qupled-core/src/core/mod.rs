//! # Core Module
//!
//! The stateless foundation of qupled: everything that describes a dielectric scheme
//! without driving a solver.
//!
//! ## Architecture
//!
//! - **Solver Inputs** ([`inputs`]) - Input records, compiled-in defaults and validated overrides
//! - **Theories** ([`theory`]) - Theory identifiers, scheme variants and their table sets
//! - **Result Tables** ([`tables`]) - Numeric tables produced by a solver and the inputs summary
//! - **File I/O** ([`io`]) - Result-file store, fixed-response archive and file naming
//! - **Thermodynamics** ([`thermo`]) - Radial distribution function and internal energy
//! - **Rendering** ([`render`]) - The plotting seam and its gnuplot backend

pub mod inputs;
pub mod io;
pub mod render;
pub mod tables;
pub mod theory;
pub mod thermo;
