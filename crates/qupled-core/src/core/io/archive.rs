use super::naming::{ARCHIVE_EXTENSION, fixed_adr_stem};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const STAGING_PREFIX: &str = "qupled_tmp_run_";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("Archive error for '{path}': {source}")]
    Zip { path: String, source: ZipError },
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("Failed to list fixed response files: {0}")]
    Glob(#[from] glob::GlobError),
}

fn io_error(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

fn zip_error(path: &Path, source: ZipError) -> ArchiveError {
    ArchiveError::Zip {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

/// Outcome of packing the fixed response files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSummary {
    pub archive: PathBuf,
    pub files: usize,
}

/// The per-wave-vector fixed auxiliary density response files of one state point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedAdrArchive {
    stem: String,
}

impl FixedAdrArchive {
    pub fn new(coupling: f64, degeneracy: f64, theory: &str) -> Self {
        Self {
            stem: fixed_adr_stem(coupling, degeneracy, theory),
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.stem, ARCHIVE_EXTENSION)
    }

    /// Glob pattern matching the binaries of this state point inside `dir`.
    pub fn binary_pattern(&self, dir: &Path) -> String {
        let dir = glob::Pattern::escape(&dir.to_string_lossy());
        let file = glob::Pattern::escape(&format!("{}_wv", self.stem));
        format!("{}/{}*.bin", dir, file)
    }

    /// Matching binaries in `dir`, sorted by path.
    pub fn collect_binaries(&self, dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
        let pattern = self.binary_pattern(dir);
        let paths = glob::glob(&pattern).map_err(|source| ArchiveError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        let mut files = paths.collect::<Result<Vec<_>, _>>()?;
        files.sort();
        Ok(files)
    }

    /// Packs every matching binary in `dir` into `dir/<stem>.zip` and removes the
    /// originals once the archive is complete.
    ///
    /// The archive is written even when no binaries are found.
    pub fn pack(&self, dir: &Path) -> Result<PackSummary, ArchiveError> {
        let files = self.collect_binaries(dir)?;
        let archive = dir.join(self.archive_name());
        debug!(archive = %archive.display(), files = files.len(), "Packing fixed response files.");

        let file = File::create(&archive).map_err(|e| io_error(&archive, e))?;
        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for path in &files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            writer
                .start_file(name, options)
                .map_err(|e| zip_error(&archive, e))?;
            let mut source = File::open(path).map_err(|e| io_error(path, e))?;
            io::copy(&mut source, &mut writer).map_err(|e| io_error(path, e))?;
        }
        writer.finish().map_err(|e| zip_error(&archive, e))?;

        for path in &files {
            fs::remove_file(path).map_err(|e| io_error(path, e))?;
        }
        info!(archive = %archive.display(), files = files.len(), "Fixed response files archived.");
        Ok(PackSummary {
            archive,
            files: files.len(),
        })
    }

    /// Extracts `bundle` into a fresh staging directory created under `parent`.
    pub fn unpack(bundle: &Path, parent: &Path) -> Result<StagingArea, ArchiveError> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| io_error(parent, e))?;
        let file = File::open(bundle).map_err(|e| io_error(bundle, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| zip_error(bundle, e))?;
        archive
            .extract(dir.path())
            .map_err(|e| zip_error(bundle, e))?;
        debug!(bundle = %bundle.display(), staging = %dir.path().display(), entries = archive.len(), "Fixed response bundle staged.");
        Ok(StagingArea { dir })
    }
}

/// Scoped directory holding an extracted bundle; removed when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory now. A directory that is already gone is not an error.
    pub fn close(self) -> Result<(), ArchiveError> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
