use gnuplot::{AxesCommon, Caption, Figure};
use nalgebra::DMatrix;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Abscissa label for tables tabulated on the wave-vector grid.
pub const WAVE_VECTOR_LABEL: &str = "Wave vector";
/// Abscissa label for the radial distribution function.
pub const DISTANCE_LABEL: &str = "Inter-particle distance";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Plotting backend failed: {0}")]
    Backend(String),
    #[error("Matsubara index {index} is out of range (table has {available} columns)")]
    ParameterOutOfRange { index: usize, available: usize },
    #[error("Cannot plot {y} values against {x} abscissae")]
    LengthMismatch { x: usize, y: usize },
}

/// Plotting seam used by schemes and result readers.
pub trait Renderer {
    fn plot_1d(&mut self, x: &[f64], y: &[f64], xlabel: &str, ylabel: &str)
    -> Result<(), RenderError>;

    /// One line per entry of `params`, each a column of `y`.
    fn plot_1d_parametric(
        &mut self,
        x: &[f64],
        y: &DMatrix<f64>,
        xlabel: &str,
        ylabel: &str,
        params: &[usize],
    ) -> Result<(), RenderError>;
}

/// Checks shapes shared by every renderer.
pub fn check_parametric(x: &[f64], y: &DMatrix<f64>, params: &[usize]) -> Result<(), RenderError> {
    if y.nrows() != x.len() {
        return Err(RenderError::LengthMismatch {
            x: x.len(),
            y: y.nrows(),
        });
    }
    match params.iter().find(|&&index| index >= y.ncols()) {
        Some(&index) => Err(RenderError::ParameterOutOfRange {
            index,
            available: y.ncols(),
        }),
        None => Ok(()),
    }
}

/// Renders through a gnuplot process, either to an interactive window or to numbered
/// PNG files in a directory.
#[derive(Debug, Default)]
pub struct GnuplotRenderer {
    output_dir: Option<PathBuf>,
    rendered: usize,
}

impl GnuplotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
            rendered: 0,
        }
    }

    fn show(&mut self, mut figure: Figure, ylabel: &str) -> Result<(), RenderError> {
        if let Some(dir) = &self.output_dir {
            let name = ylabel.to_lowercase().replace([' ', '-'], "_");
            let path = dir.join(format!("{:02}_{}.png", self.rendered, name));
            debug!(path = %path.display(), "Rendering plot to file.");
            figure.set_terminal("pngcairo size 1024,768", &path.to_string_lossy());
        }
        self.rendered += 1;
        figure
            .show()
            .map(|_| ())
            .map_err(|e| RenderError::Backend(format!("{e:?}")))
    }
}

impl Renderer for GnuplotRenderer {
    fn plot_1d(
        &mut self,
        x: &[f64],
        y: &[f64],
        xlabel: &str,
        ylabel: &str,
    ) -> Result<(), RenderError> {
        if x.len() != y.len() {
            return Err(RenderError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let mut figure = Figure::new();
        figure
            .axes2d()
            .set_x_label(xlabel, &[])
            .set_y_label(ylabel, &[])
            .lines(x, y, &[]);
        self.show(figure, ylabel)
    }

    fn plot_1d_parametric(
        &mut self,
        x: &[f64],
        y: &DMatrix<f64>,
        xlabel: &str,
        ylabel: &str,
        params: &[usize],
    ) -> Result<(), RenderError> {
        check_parametric(x, y, params)?;
        let mut figure = Figure::new();
        let axes = figure
            .axes2d()
            .set_x_label(xlabel, &[])
            .set_y_label(ylabel, &[]);
        for &index in params {
            let caption = format!("l = {}", index);
            axes.lines(x, y.column(index).iter(), &[Caption(&caption)]);
        }
        self.show(figure, ylabel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parametric_shapes_are_checked() {
        let x = [0.0, 1.0, 2.0];
        let y = DMatrix::from_element(3, 2, 1.0);
        assert!(check_parametric(&x, &y, &[0, 1]).is_ok());
        assert!(matches!(
            check_parametric(&x, &y, &[0, 2]),
            Err(RenderError::ParameterOutOfRange { index: 2, available: 2 })
        ));
        assert!(matches!(
            check_parametric(&x[..2], &y, &[0]),
            Err(RenderError::LengthMismatch { x: 2, y: 3 })
        ));
    }

    #[test]
    fn mismatched_lines_never_reach_the_backend() {
        let mut renderer = GnuplotRenderer::new();
        let result = renderer.plot_1d(&[0.0, 1.0], &[1.0], WAVE_VECTOR_LABEL, "Static structure factor");
        assert!(matches!(result, Err(RenderError::LengthMismatch { .. })));
    }
}
