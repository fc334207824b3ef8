//! # qupled Core Library
//!
//! An orchestration layer for numerical solvers of classical dielectric-response theories
//! of quantum plasmas (STLS, QSTLS and their interaction-enhanced extensions).
//!
//! The library performs no iterative physics. It assembles validated solver inputs, hands
//! them to an external solver, persists the resulting tables and manages the large
//! fixed auxiliary density response artifacts produced by the quantum schemes.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data: solver inputs and their defaults,
//!   theory identifiers and scheme variants, result tables, the result-file store, the
//!   fixed-response archive, derived thermodynamics and the rendering seam.
//!
//! - **[`engine`]: The Solver Seam.** The traits through which an external solver is
//!   created, driven and read back, the shipped external-process backend, progress
//!   reporting and the error type surfaced by every lifecycle step.
//!
//! - **[`workflows`]: The Public API.** The scheme orchestrator owning the
//!   validate/stage/compute/clean/persist lifecycle, and a reader operating on
//!   previously persisted result files.

pub mod core;
pub mod engine;
pub mod workflows;
