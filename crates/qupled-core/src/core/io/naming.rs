/// Extension of the result file written by a successful compute.
pub const RESULT_EXTENSION: &str = "zip";
/// Extension of the archive packing the fixed auxiliary density response files.
pub const ARCHIVE_EXTENSION: &str = "zip";

const FIXED_ADR_PREFIX: &str = "adr_fixed_";

/// Stem shared by every artifact of a run, e.g. `rs1.000_theta0.500_STLS`.
///
/// The state point is formatted with three decimals; identical parameters always
/// produce identical stems.
pub fn result_stem(coupling: f64, degeneracy: f64, theory: &str) -> String {
    format!("rs{:5.3}_theta{:5.3}_{}", coupling, degeneracy, theory)
}

pub fn result_file_name(coupling: f64, degeneracy: f64, theory: &str) -> String {
    format!(
        "{}.{}",
        result_stem(coupling, degeneracy, theory),
        RESULT_EXTENSION
    )
}

/// Stem of the per-wave-vector fixed-response files written by the quantum IET solvers.
pub fn fixed_adr_stem(coupling: f64, degeneracy: f64, theory: &str) -> String {
    format!(
        "{}{}",
        FIXED_ADR_PREFIX,
        result_stem(coupling, degeneracy, theory)
    )
}
