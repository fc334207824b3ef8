use std::path::PathBuf;

/// CLI-level defaults. Solver input defaults live in the core `InputSet`.
pub struct DefaultsConfig {
    pub solver_program: String,
    pub work_dir: PathBuf,
    pub rdf_start: f64,
    pub rdf_stop: f64,
    pub rdf_step: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            solver_program: "qupled-solver".to_string(),
            work_dir: PathBuf::from("."),
            rdf_start: 0.01,
            rdf_stop: 10.0,
            rdf_step: 0.01,
        }
    }
}
