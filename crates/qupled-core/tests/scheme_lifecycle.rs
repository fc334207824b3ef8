use nalgebra::DMatrix;
use qupled::core::inputs::InputOverrides;
use qupled::core::io::archive::FixedAdrArchive;
use qupled::core::io::store::ResultFile;
use qupled::core::render::{RenderError, Renderer};
use qupled::core::tables::SchemeOutput;
use qupled::core::theory::{SchemeKind, TableKey};
use qupled::core::thermo::rdf_grid;
use qupled::engine::error::SchemeError;
use qupled::engine::progress::{Progress, ProgressReporter};
use qupled::engine::solver::{SchemeInputs, SolverBackend, SolverError, SolverHandle};
use qupled::workflows::reader::ResultReader;
use qupled::workflows::scheme::Scheme;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use tempfile::{TempDir, tempdir};

const GRID_POINTS: usize = 20;
const MATSUBARA: usize = 4;

/// What a scripted handle observed while computing.
#[derive(Debug, Default, Clone)]
struct Observation {
    fixed_iet: Option<PathBuf>,
    staged_files: usize,
}

#[derive(Clone)]
struct ScriptedBackend {
    status: i32,
    binaries: usize,
    replace_staging: bool,
    observations: Rc<RefCell<Vec<Observation>>>,
}

impl ScriptedBackend {
    fn new(status: i32) -> Self {
        Self {
            status,
            binaries: 3,
            replace_staging: false,
            observations: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Swaps the staged directory for a plain file while computing, so removing it fails.
    fn replacing_staging(status: i32) -> Self {
        Self {
            replace_staging: true,
            ..Self::new(status)
        }
    }
}

struct ScriptedHandle {
    status: i32,
    binaries: usize,
    replace_staging: bool,
    inputs: SchemeInputs,
    work_dir: PathBuf,
    observations: Rc<RefCell<Vec<Observation>>>,
}

impl SolverBackend for ScriptedBackend {
    type Handle = ScriptedHandle;

    fn create(&self, inputs: &SchemeInputs, work_dir: &Path) -> Result<ScriptedHandle, SolverError> {
        Ok(ScriptedHandle {
            status: self.status,
            binaries: self.binaries,
            replace_staging: self.replace_staging,
            inputs: inputs.clone(),
            work_dir: work_dir.to_path_buf(),
            observations: Rc::clone(&self.observations),
        })
    }
}

impl SolverHandle for ScriptedHandle {
    fn compute(&mut self) -> i32 {
        let base = &self.inputs.base;
        if let Some(recovery) = &base.recovery_file {
            fs::write(self.work_dir.join(recovery), b"checkpoint").unwrap();
        }
        let fixed_iet = self
            .inputs
            .quantum
            .as_ref()
            .and_then(|quantum| quantum.fixed_iet.clone());
        let archive = FixedAdrArchive::new(base.coupling, base.degeneracy, &base.theory);
        let staged_files = match &fixed_iet {
            Some(dir) => archive.collect_binaries(dir).unwrap().len(),
            None => 0,
        };
        if let (true, Some(dir)) = (self.replace_staging, &fixed_iet) {
            fs::remove_dir_all(dir).unwrap();
            fs::write(dir, b"not a directory").unwrap();
        }
        if self.inputs.kind == SchemeKind::QstlsIet && fixed_iet.is_none() {
            for i in 0..self.binaries {
                let path = self.work_dir.join(format!("{}_wv{}.bin", archive.stem(), i));
                fs::write(path, vec![i as u8; 8]).unwrap();
            }
        }
        self.observations.borrow_mut().push(Observation {
            fixed_iet,
            staged_files,
        });
        self.status
    }

    fn output(&self) -> Result<SchemeOutput, SolverError> {
        let kind = self.inputs.kind;
        let matsubara = self.inputs.base.matsubara;
        let wvg: Vec<f64> = (0..GRID_POINTS).map(|i| i as f64 * 0.5).collect();
        let ssf: Vec<f64> = wvg.iter().map(|x| 1.0 - (-x).exp()).collect();
        Ok(SchemeOutput {
            idr: DMatrix::from_fn(GRID_POINTS, matsubara, |i, l| 1.0 / (1.0 + (i + l) as f64)),
            sdr: vec![-0.5; GRID_POINTS],
            slfc: vec![0.25; GRID_POINTS],
            ssf_hf: ssf.clone(),
            bf: kind.has_bridge_function().then(|| vec![0.1; GRID_POINTS]),
            adr: kind
                .is_quantum()
                .then(|| DMatrix::from_element(GRID_POINTS, matsubara, 0.3)),
            wvg,
            ssf,
        })
    }

    fn recovery_file(&self) -> Option<&Path> {
        self.inputs.base.recovery_file.as_deref()
    }
}

#[derive(Default)]
struct RecordingRenderer {
    plots: Vec<(String, String, usize)>,
}

impl Renderer for RecordingRenderer {
    fn plot_1d(&mut self, x: &[f64], y: &[f64], xlabel: &str, ylabel: &str) -> Result<(), RenderError> {
        assert_eq!(x.len(), y.len());
        self.plots.push((xlabel.to_string(), ylabel.to_string(), 1));
        Ok(())
    }

    fn plot_1d_parametric(
        &mut self,
        _x: &[f64],
        _y: &DMatrix<f64>,
        xlabel: &str,
        ylabel: &str,
        params: &[usize],
    ) -> Result<(), RenderError> {
        self.plots
            .push((xlabel.to_string(), ylabel.to_string(), params.len()));
        Ok(())
    }
}

fn overrides() -> InputOverrides {
    InputOverrides::new().matsubara(MATSUBARA)
}

fn scheme(
    kind: SchemeKind,
    theory: Option<&str>,
    overrides: &InputOverrides,
    backend: ScriptedBackend,
    work: &TempDir,
) -> Scheme<ScriptedBackend> {
    Scheme::new(kind, 1.0, 1.0, theory, overrides, backend)
        .unwrap()
        .with_work_dir(work.path())
}

fn bundle_in(source: &Path, theory: &str) -> PathBuf {
    let archive = FixedAdrArchive::new(1.0, 1.0, theory);
    for i in 0..2 {
        fs::write(
            source.join(format!("{}_wv{}.bin", archive.stem(), i)),
            b"fixed",
        )
        .unwrap();
    }
    archive.pack(source).unwrap().archive
}

fn staging_dirs(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().starts_with("qupled_tmp_run_"))
                .unwrap_or(false)
        })
        .collect()
}

#[test]
fn theories_outside_the_variant_are_rejected() {
    let backend = ScriptedBackend::new(0);
    let err = Scheme::new(SchemeKind::StlsIet, 1.0, 1.0, Some("QSTLS-HNC"), &overrides(), backend.clone())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "Invalid dielectric theory");

    let err = Scheme::new(SchemeKind::Qstls, 1.0, 1.0, Some("STLS"), &overrides(), backend.clone())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "Invalid dielectric theory");

    let err = Scheme::new(SchemeKind::QstlsIet, 1.0, 1.0, None, &overrides(), backend.clone())
        .err()
        .unwrap();
    assert!(matches!(err, SchemeError::InvalidTheory { .. }));
}

#[test]
fn classical_scheme_checks_its_theory_when_computing() {
    let work = tempdir().unwrap();
    let backend = ScriptedBackend::new(0);
    let mut stls = scheme(SchemeKind::Stls, Some("STLS-HNC"), &overrides(), backend.clone(), &work);
    let err = stls.compute(&ProgressReporter::new()).unwrap_err();
    assert_eq!(err.to_string(), "Invalid dielectric theory");
    assert!(backend.observations.borrow().is_empty());
    assert!(!stls.output_path().exists());
}

#[test]
fn success_removes_the_recovery_file() {
    let work = tempdir().unwrap();
    let overrides = overrides().recovery_file(PathBuf::from("recovery.bin"));
    let mut stls = scheme(SchemeKind::Stls, None, &overrides, ScriptedBackend::new(0), &work);
    stls.compute(&ProgressReporter::new()).unwrap();
    assert!(!work.path().join("recovery.bin").exists());
    assert!(stls.output_path().is_file());
}

#[test]
fn failure_keeps_the_recovery_file() {
    let work = tempdir().unwrap();
    let overrides = overrides().recovery_file(PathBuf::from("recovery.bin"));
    let mut stls = scheme(SchemeKind::Stls, None, &overrides, ScriptedBackend::new(2), &work);
    let err = stls.compute(&ProgressReporter::new()).unwrap_err();
    assert_eq!(err.to_string(), "Error while solving the dielectric theory");
    assert!(matches!(err, SchemeError::SolveFailure { status: 2 }));
    assert!(work.path().join("recovery.bin").is_file());
    assert!(stls.output().is_none());
}

#[test]
fn output_name_depends_only_on_the_state_point() {
    let work = tempdir().unwrap();
    let qstls = Scheme::qstls(2.5, 0.125, &overrides(), ScriptedBackend::new(0))
        .unwrap()
        .with_work_dir(work.path());
    assert_eq!(qstls.output_file_name(), "rs2.500_theta0.125_QSTLS.zip");
    let iet = Scheme::stls_iet(10.0, 1.0, "STLS-LCT", &overrides(), ScriptedBackend::new(0)).unwrap();
    assert_eq!(iet.output_file_name(), "rs10.000_theta1.000_STLS-LCT.zip");
}

#[test]
fn persisted_sections_follow_the_variant() {
    let base = ["inputs", "idr", "sdr", "slfc", "ssf", "ssfHF", "wvg"];
    let cases: [(SchemeKind, Option<&str>, &[&str]); 4] = [
        (SchemeKind::Stls, None, &[]),
        (SchemeKind::StlsIet, Some("STLS-HNC"), &["bf"]),
        (SchemeKind::Qstls, None, &["adr"]),
        (SchemeKind::QstlsIet, Some("QSTLS-IOI"), &["adr", "bf"]),
    ];
    for (kind, theory, extras) in cases {
        let work = tempdir().unwrap();
        let mut scheme = scheme(kind, theory, &overrides(), ScriptedBackend::new(0), &work);
        scheme.compute(&ProgressReporter::new()).unwrap();

        let expected: Vec<String> = base
            .iter()
            .chain(extras.iter())
            .map(|s| s.to_string())
            .collect();
        let file = ResultFile::new(scheme.output_path());
        assert_eq!(file.section_names().unwrap(), expected, "{kind}");
    }
}

#[test]
fn quantum_iet_archives_new_binaries() {
    let work = tempdir().unwrap();
    let mut scheme = scheme(
        SchemeKind::QstlsIet,
        Some("QSTLS-HNC"),
        &overrides(),
        ScriptedBackend::new(0),
        &work,
    );
    scheme.compute(&ProgressReporter::new()).unwrap();

    let archive = FixedAdrArchive::new(1.0, 1.0, "QSTLS-HNC");
    assert!(work.path().join(archive.archive_name()).is_file());
    assert!(archive.collect_binaries(work.path()).unwrap().is_empty());
    let archives: Vec<_> = fs::read_dir(work.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("adr_fixed_"))
        .collect();
    assert_eq!(archives.len(), 1);
}

#[test]
fn supplied_bundle_is_staged_and_removed() {
    let source = tempdir().unwrap();
    let archive = FixedAdrArchive::new(1.0, 1.0, "QSTLS-LCT");
    let bundle = bundle_in(source.path(), "QSTLS-LCT");

    for status in [0, 1] {
        let work = tempdir().unwrap();
        let backend = ScriptedBackend::new(status);
        let overrides = overrides().fixed_iet_archive(bundle.clone());
        let mut scheme = scheme(
            SchemeKind::QstlsIet,
            Some("QSTLS-LCT"),
            &overrides,
            backend.clone(),
            &work,
        );
        let result = scheme.compute(&ProgressReporter::new());
        assert_eq!(result.is_ok(), status == 0);

        let observed = backend.observations.borrow()[0].clone();
        assert_eq!(observed.staged_files, 2);
        let staged = observed.fixed_iet.unwrap();
        assert!(staged.starts_with(work.path()));
        assert!(!staged.exists());
        assert!(staging_dirs(work.path()).is_empty());
        assert!(!work.path().join(archive.archive_name()).exists());
    }
}

#[test]
fn rdf_requires_a_solution_and_appends_two_sections() {
    let work = tempdir().unwrap();
    let mut stls = scheme(SchemeKind::Stls, None, &overrides(), ScriptedBackend::new(0), &work);
    let grid = rdf_grid(0.01, 10.0, 0.01);

    let err = stls.compute_rdf(&grid, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "No solution to compute the radial distribution function"
    );

    stls.compute(&ProgressReporter::new()).unwrap();
    let file = ResultFile::new(stls.output_path());
    let before = file.section_names().unwrap();
    let ssf_before = file.read_vector(TableKey::Ssf).unwrap();

    let rdf = stls.compute_rdf(&grid, true).unwrap();
    assert_eq!(rdf.len(), grid.len());

    let mut expected = before.clone();
    expected.extend(["rdfGrid".to_string(), "rdf".to_string()]);
    assert_eq!(file.section_names().unwrap(), expected);
    assert_eq!(file.read_vector(TableKey::Ssf).unwrap(), ssf_before);
    assert_eq!(file.read_vector(TableKey::RdfGrid).unwrap(), grid);
    assert_eq!(file.read_vector(TableKey::Rdf).unwrap(), rdf);
}

#[test]
fn compute_is_single_use() {
    let work = tempdir().unwrap();
    let mut stls = scheme(SchemeKind::Stls, None, &overrides(), ScriptedBackend::new(0), &work);
    stls.compute(&ProgressReporter::new()).unwrap();
    assert!(matches!(
        stls.compute(&ProgressReporter::new()),
        Err(SchemeError::AlreadyComputed)
    ));
}

#[test]
fn compute_reports_lifecycle_phases() {
    let work = tempdir().unwrap();
    let phases = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event| {
        if let Progress::PhaseStart { name } = event {
            phases.lock().unwrap().push(name);
        }
    }));
    let mut stls = scheme(SchemeKind::Stls, None, &overrides(), ScriptedBackend::new(0), &work);
    stls.compute(&reporter).unwrap();
    drop(reporter);
    assert_eq!(
        phases.into_inner().unwrap(),
        vec!["Validating", "Solving", "Saving Results"]
    );
}

#[test]
fn live_plot_renders_owned_tables_and_rdf() {
    let work = tempdir().unwrap();
    let mut qstls = scheme(SchemeKind::Qstls, None, &overrides(), ScriptedBackend::new(0), &work);
    qstls.compute(&ProgressReporter::new()).unwrap();

    let mut renderer = RecordingRenderer::default();
    let grid = rdf_grid(0.1, 2.0, 0.1);
    qstls
        .plot(
            &mut renderer,
            &[TableKey::Adr, TableKey::Bf, TableKey::Rdf, TableKey::Ssf],
            None,
            &grid,
        )
        .unwrap();

    let labels: Vec<&str> = renderer.plots.iter().map(|(_, y, _)| y.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Radial distribution function",
            "Static structure factor",
            "Auxiliary density response",
        ]
    );
    assert_eq!(renderer.plots[0].0, "Inter-particle distance");
    assert_eq!(renderer.plots[2].2, MATSUBARA);
    assert!(
        ResultFile::new(qstls.output_path())
            .has_section(TableKey::Rdf)
            .unwrap()
    );
}

#[test]
fn reader_works_from_the_persisted_file() {
    let work = tempdir().unwrap();
    let mut qstls = scheme(SchemeKind::Qstls, None, &overrides(), ScriptedBackend::new(0), &work);
    qstls.compute(&ProgressReporter::new()).unwrap();

    let reader = ResultReader::open(qstls.output_path()).unwrap();
    assert_eq!(reader.summary().theory, "QSTLS");
    assert_eq!(reader.default_matsubara(), (0..MATSUBARA).collect::<Vec<_>>());

    let energy = reader.internal_energy().unwrap();
    assert!(energy < 0.0);

    let guess = reader.qstls_guess().unwrap();
    assert_eq!(guess.matsubara, MATSUBARA);
    assert!(guess.validate().is_ok());

    let mut renderer = RecordingRenderer::default();
    reader
        .plot(&mut renderer, &[TableKey::Ssf, TableKey::Idr, TableKey::Adr], Some(&[0, 2]))
        .unwrap();
    let order: Vec<(&str, usize)> = renderer
        .plots
        .iter()
        .map(|(_, y, n)| (y.as_str(), *n))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Auxiliary density response", 2),
            ("Ideal density response", 2),
            ("Static structure factor", 1),
        ]
    );

    let grid = rdf_grid(0.5, 3.0, 0.5);
    let rdf = reader.compute_rdf(&grid, false).unwrap();
    assert_eq!(rdf.len(), grid.len());
    assert!(!reader.file().has_section(TableKey::Rdf).unwrap());
}

#[test]
fn quantum_iet_with_bundle_handles_the_recovery_file() {
    let source = tempdir().unwrap();
    let bundle = bundle_in(source.path(), "QSTLS-HNC");
    for (status, kept) in [(0, false), (4, true)] {
        let work = tempdir().unwrap();
        let overrides = overrides()
            .recovery_file(PathBuf::from("recovery.bin"))
            .fixed_iet_archive(bundle.clone());
        let mut scheme = scheme(
            SchemeKind::QstlsIet,
            Some("QSTLS-HNC"),
            &overrides,
            ScriptedBackend::new(status),
            &work,
        );
        let result = scheme.compute(&ProgressReporter::new());
        assert_eq!(result.is_ok(), status == 0);
        assert_eq!(work.path().join("recovery.bin").is_file(), kept);
        assert!(staging_dirs(work.path()).is_empty());
    }
}

#[test]
fn corrupt_bundle_fails_staging_and_leaves_no_directory() {
    let work = tempdir().unwrap();
    let bundle = work.path().join("broken.zip");
    fs::write(&bundle, b"this is not a zip archive").unwrap();

    let backend = ScriptedBackend::new(0);
    let overrides = overrides().fixed_iet_archive(bundle);
    let mut scheme = scheme(
        SchemeKind::QstlsIet,
        Some("QSTLS-LCT"),
        &overrides,
        backend.clone(),
        &work,
    );
    let err = scheme.compute(&ProgressReporter::new()).unwrap_err();
    assert!(matches!(err, SchemeError::Archive { .. }));
    assert!(backend.observations.borrow().is_empty());
    assert!(staging_dirs(work.path()).is_empty());
    assert!(!scheme.output_path().exists());
}

#[test]
fn solve_failure_wins_over_staging_cleanup_errors() {
    let source = tempdir().unwrap();
    let bundle = bundle_in(source.path(), "QSTLS-IOI");

    let work = tempdir().unwrap();
    let overrides = overrides().fixed_iet_archive(bundle.clone());
    let mut failed = scheme(
        SchemeKind::QstlsIet,
        Some("QSTLS-IOI"),
        &overrides,
        ScriptedBackend::replacing_staging(5),
        &work,
    );
    let err = failed.compute(&ProgressReporter::new()).unwrap_err();
    assert_eq!(err.to_string(), "Error while solving the dielectric theory");
    assert!(matches!(err, SchemeError::SolveFailure { status: 5 }));

    let work = tempdir().unwrap();
    let mut solved = scheme(
        SchemeKind::QstlsIet,
        Some("QSTLS-IOI"),
        &overrides,
        ScriptedBackend::replacing_staging(0),
        &work,
    );
    let err = solved.compute(&ProgressReporter::new()).unwrap_err();
    assert!(matches!(err, SchemeError::Archive { .. }));
}

#[test]
fn quantum_iet_reports_the_archived_files() {
    let work = tempdir().unwrap();
    let messages = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|event| {
        if let Progress::Message(message) = event {
            messages.lock().unwrap().push(message);
        }
    }));
    let mut scheme = scheme(
        SchemeKind::QstlsIet,
        Some("QSTLS-HNC"),
        &overrides(),
        ScriptedBackend::new(0),
        &work,
    );
    scheme.compute(&reporter).unwrap();
    drop(reporter);

    let messages = messages.into_inner().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Archived 3 fixed response files into"));
}

#[test]
fn zero_matsubara_results_read_back() {
    let work = tempdir().unwrap();
    let overrides = InputOverrides::new().matsubara(0);
    let mut qstls = scheme(SchemeKind::Qstls, None, &overrides, ScriptedBackend::new(0), &work);
    qstls.compute(&ProgressReporter::new()).unwrap();

    let file = ResultFile::new(qstls.output_path());
    assert_eq!(file.read_matrix(TableKey::Idr).unwrap().shape(), (GRID_POINTS, 0));
    assert_eq!(file.read_matrix(TableKey::Adr).unwrap().shape(), (GRID_POINTS, 0));

    let reader = ResultReader::open(qstls.output_path()).unwrap();
    assert!(reader.default_matsubara().is_empty());
    let guess = reader.qstls_guess().unwrap();
    assert_eq!(guess.matsubara, 0);
    assert!(guess.validate().is_ok());

    let mut renderer = RecordingRenderer::default();
    reader
        .plot(&mut renderer, &[TableKey::Idr, TableKey::Adr], None)
        .unwrap();
    assert_eq!(renderer.plots.len(), 2);
    assert!(renderer.plots.iter().all(|(_, _, n)| *n == 0));
}
