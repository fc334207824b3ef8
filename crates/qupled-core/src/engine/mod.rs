//! # Engine Module
//!
//! This module implements the seam between qupled and the numerical solver that runs
//! the dielectric-scheme iterations, together with the error and progress types shared
//! by every workflow.
//!
//! ## Overview
//!
//! qupled never iterates the physics itself. A [`solver::SolverBackend`] creates a fresh
//! [`solver::SolverHandle`] per compute from the realized inputs; the handle runs the
//! solver, reports an integer status and exposes the tables the solver produced.
//!
//! ## Architecture
//!
//! - **Solver Seam** ([`solver`]) - Backend and handle traits plus the realized scheme inputs
//! - **External Process Backend** ([`command`]) - Drives a solver executable through a TOML request
//! - **Progress Monitoring** ([`progress`]) - Lifecycle phase reporting for front ends
//! - **Error Handling** ([`error`]) - Scheme lifecycle errors and their propagation
//!
//! ## Key Capabilities
//!
//! - **Backend independence** through a trait seam that tests replace with scripted solvers
//! - **Status-code protocol** where zero means success and anything else is a failed solve
//! - **Typed errors** carrying the fatal messages front ends print verbatim

pub mod command;
pub mod error;
pub mod progress;
pub mod solver;
