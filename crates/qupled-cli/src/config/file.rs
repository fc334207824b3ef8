use crate::error::{CliError, Result};
use crate::utils::parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub solver: Option<FileSolverConfig>,
    pub inputs: Option<FileInputsConfig>,
    pub rdf: Option<FileRdfConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSolverConfig {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub work_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileInputsConfig {
    pub chemical_potential: Option<[f64; 2]>,
    pub cutoff: Option<f64>,
    pub resolution: Option<f64>,
    pub iterations: Option<usize>,
    pub error: Option<f64>,
    pub mixing: Option<f64>,
    pub matsubara: Option<usize>,
    pub output_frequency: Option<usize>,
    pub recovery_file: Option<PathBuf>,
    pub iet_mapping: Option<String>,
    #[serde(rename = "int-2d-scheme")]
    pub int_2d_scheme: Option<String>,
    pub int_error: Option<f64>,
    pub threads: Option<usize>,
    pub fixed: Option<PathBuf>,
    pub fixed_iet: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRdfConfig {
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub step: Option<f64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Applies `KEY=VALUE` overrides given with `-S`.
    pub fn apply_set_values(mut self, set_values: &[String]) -> Result<Self> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
            let solver = || FileSolverConfig::default();
            let inputs = || FileInputsConfig::default();
            let rdf = || FileRdfConfig::default();

            match key {
                "solver.program" => {
                    self.solver.get_or_insert_with(solver).program = Some(value.to_string())
                }
                "solver.args" => {
                    self.solver.get_or_insert_with(solver).args = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|arg| !arg.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                }
                "solver.work-dir" => {
                    self.solver.get_or_insert_with(solver).work_dir = Some(PathBuf::from(value))
                }
                "inputs.chemical-potential" => {
                    self.inputs.get_or_insert_with(inputs).chemical_potential =
                        Some(parse_pair(key, value)?)
                }
                "inputs.cutoff" => {
                    self.inputs.get_or_insert_with(inputs).cutoff = Some(parse_value(key, value)?)
                }
                "inputs.resolution" => {
                    self.inputs.get_or_insert_with(inputs).resolution =
                        Some(parse_value(key, value)?)
                }
                "inputs.iterations" => {
                    self.inputs.get_or_insert_with(inputs).iterations =
                        Some(parse_value(key, value)?)
                }
                "inputs.error" => {
                    self.inputs.get_or_insert_with(inputs).error = Some(parse_value(key, value)?)
                }
                "inputs.mixing" => {
                    self.inputs.get_or_insert_with(inputs).mixing = Some(parse_value(key, value)?)
                }
                "inputs.matsubara" => {
                    self.inputs.get_or_insert_with(inputs).matsubara =
                        Some(parse_value(key, value)?)
                }
                "inputs.output-frequency" => {
                    self.inputs.get_or_insert_with(inputs).output_frequency =
                        Some(parse_value(key, value)?)
                }
                "inputs.recovery-file" => {
                    self.inputs.get_or_insert_with(inputs).recovery_file =
                        Some(PathBuf::from(value))
                }
                "inputs.iet-mapping" => {
                    self.inputs.get_or_insert_with(inputs).iet_mapping = Some(value.to_string())
                }
                "inputs.int-2d-scheme" => {
                    self.inputs.get_or_insert_with(inputs).int_2d_scheme = Some(value.to_string())
                }
                "inputs.int-error" => {
                    self.inputs.get_or_insert_with(inputs).int_error =
                        Some(parse_value(key, value)?)
                }
                "inputs.threads" => {
                    self.inputs.get_or_insert_with(inputs).threads = Some(parse_value(key, value)?)
                }
                "inputs.fixed" => {
                    self.inputs.get_or_insert_with(inputs).fixed = Some(PathBuf::from(value))
                }
                "inputs.fixed-iet" => {
                    self.inputs.get_or_insert_with(inputs).fixed_iet = Some(PathBuf::from(value))
                }
                "rdf.start" => self.rdf.get_or_insert_with(rdf).start = Some(parse_value(key, value)?),
                "rdf.stop" => self.rdf.get_or_insert_with(rdf).stop = Some(parse_value(key, value)?),
                "rdf.step" => self.rdf.get_or_insert_with(rdf).step = Some(parse_value(key, value)?),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(self)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

/// Parses `LOW,HIGH`.
fn parse_pair(key: &str, value: &str) -> Result<[f64; 2]> {
    match value.split(',').collect::<Vec<_>>().as_slice() {
        [low, high] => Ok([parse_value(key, low)?, parse_value(key, high)?]),
        _ => Err(CliError::Config(format!(
            "Invalid value for {}: {} (expected LOW,HIGH)",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_kebab_case_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qupled.toml");
        fs::write(
            &path,
            r#"
            [solver]
            program = "/opt/qupled/bin/solver"
            work-dir = "runs"

            [inputs]
            chemical-potential = [-5.0, 5.0]
            mixing = 0.5
            int-2d-scheme = "segregated"

            [rdf]
            step = 0.05
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let solver = config.solver.unwrap();
        assert_eq!(solver.program.as_deref(), Some("/opt/qupled/bin/solver"));
        assert_eq!(solver.work_dir, Some(PathBuf::from("runs")));
        let inputs = config.inputs.unwrap();
        assert_eq!(inputs.chemical_potential, Some([-5.0, 5.0]));
        assert_eq!(inputs.mixing, Some(0.5));
        assert_eq!(inputs.int_2d_scheme.as_deref(), Some("segregated"));
        assert_eq!(config.rdf.unwrap().step, Some(0.05));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qupled.toml");
        fs::write(&path, "[inputs]\nmixingg = 0.5\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn set_values_fill_missing_sections() {
        let config = FileConfig::default()
            .apply_set_values(&[
                "inputs.mixing=0.3".to_string(),
                "rdf.stop=5".to_string(),
                "solver.program=my-solver".to_string(),
            ])
            .unwrap();
        assert_eq!(config.inputs.unwrap().mixing, Some(0.3));
        assert_eq!(config.rdf.unwrap().stop, Some(5.0));
        assert_eq!(config.solver.unwrap().program.as_deref(), Some("my-solver"));
    }

    #[test]
    fn set_values_cover_list_and_path_keys() {
        let config = FileConfig::default()
            .apply_set_values(&[
                "inputs.chemical-potential=-10, 10".to_string(),
                "inputs.fixed=fixed.zip".to_string(),
                "inputs.fixed-iet=adr_fixed.zip".to_string(),
                "solver.args=--quiet,--threads, 2".to_string(),
            ])
            .unwrap();
        let inputs = config.inputs.unwrap();
        assert_eq!(inputs.chemical_potential, Some([-10.0, 10.0]));
        assert_eq!(inputs.fixed, Some(PathBuf::from("fixed.zip")));
        assert_eq!(inputs.fixed_iet, Some(PathBuf::from("adr_fixed.zip")));
        assert_eq!(
            config.solver.unwrap().args,
            Some(vec!["--quiet".to_string(), "--threads".to_string(), "2".to_string()])
        );

        let bad_pair =
            FileConfig::default().apply_set_values(&["inputs.chemical-potential=1".to_string()]);
        assert!(matches!(bad_pair, Err(CliError::Config(_))));
    }

    #[test]
    fn set_values_reject_bad_input() {
        let bad_value = FileConfig::default().apply_set_values(&["inputs.threads=two".to_string()]);
        assert!(matches!(bad_value, Err(CliError::Config(_))));
        let bad_key = FileConfig::default().apply_set_values(&["inputs.unknown=1".to_string()]);
        assert!(matches!(bad_key, Err(CliError::Config(_))));
        let bad_format = FileConfig::default().apply_set_values(&["inputs.mixing".to_string()]);
        assert!(matches!(bad_format, Err(CliError::Config(_))));
    }
}
