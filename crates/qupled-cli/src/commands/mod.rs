pub mod energy;
pub mod plot;
pub mod rdf;
pub mod solve;

use qupled::core::render::GnuplotRenderer;
use std::path::Path;

/// Interactive gnuplot windows, or numbered PNG files when `plot_dir` is given.
pub(crate) fn renderer(plot_dir: Option<&Path>) -> std::io::Result<GnuplotRenderer> {
    match plot_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(GnuplotRenderer::to_directory(dir))
        }
        None => Ok(GnuplotRenderer::new()),
    }
}
