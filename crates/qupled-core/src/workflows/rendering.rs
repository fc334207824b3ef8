use crate::core::render::{DISTANCE_LABEL, RenderError, Renderer, WAVE_VECTOR_LABEL};
use crate::core::theory::TableKey;
use nalgebra::DMatrix;

pub(crate) enum PlotData<'a> {
    Line(&'a [f64]),
    Matsubara(&'a DMatrix<f64>),
}

/// Renders one table against `x` with the axis labels of its key.
pub(crate) fn render_table<R: Renderer + ?Sized>(
    renderer: &mut R,
    key: TableKey,
    x: &[f64],
    data: PlotData<'_>,
    matsubara: &[usize],
) -> Result<(), RenderError> {
    let xlabel = if key == TableKey::Rdf {
        DISTANCE_LABEL
    } else {
        WAVE_VECTOR_LABEL
    };
    let ylabel = key.label().unwrap_or(key.name());
    match data {
        PlotData::Line(y) => renderer.plot_1d(x, y, xlabel, ylabel),
        PlotData::Matsubara(y) => renderer.plot_1d_parametric(x, y, xlabel, ylabel, matsubara),
    }
}
