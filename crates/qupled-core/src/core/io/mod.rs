//! Provides file input/output for dielectric-scheme results.
//!
//! This module contains the result-file store holding the named tables of a run, the
//! archive packing the per-wave-vector fixed auxiliary density response files, and the
//! deterministic naming shared by both.

pub mod archive;
pub mod naming;
pub mod store;
