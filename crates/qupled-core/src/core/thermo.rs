//! Thermodynamic quantities derived from a static structure factor.
//!
//! Distances are in units of the Wigner-Seitz radius and wave vectors in units of
//! the Fermi wave vector. Integrals use the trapezoidal rule on the stored grid.

use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ThermoError {
    #[error("Grid and structure factor differ in length ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("At least two grid points are required, got {0}")]
    TooFewPoints(usize),
    #[error("The coupling parameter must be positive, got {0}")]
    NonPositiveCoupling(f64),
}

/// `(4 / (9 pi))^(1/3)`, the ratio between the Fermi wave vector and the inverse
/// Wigner-Seitz radius.
pub fn lambda() -> f64 {
    (4.0 / (9.0 * PI)).cbrt()
}

fn check_grid(wvg: &[f64], ssf: &[f64]) -> Result<(), ThermoError> {
    if wvg.len() != ssf.len() {
        return Err(ThermoError::LengthMismatch(wvg.len(), ssf.len()));
    }
    if wvg.len() < 2 {
        return Err(ThermoError::TooFewPoints(wvg.len()));
    }
    Ok(())
}

fn trapezoid(x: &[f64], f: impl Fn(usize) -> f64) -> f64 {
    x.windows(2)
        .enumerate()
        .map(|(i, w)| 0.5 * (w[1] - w[0]) * (f(i) + f(i + 1)))
        .sum()
}

/// Radial distribution function on `grid` from the structure factor `ssf` tabulated
/// on `wvg`.
pub fn radial_distribution(
    grid: &[f64],
    wvg: &[f64],
    ssf: &[f64],
) -> Result<Vec<f64>, ThermoError> {
    check_grid(wvg, ssf)?;
    let lambda = lambda();
    let rdf = grid
        .iter()
        .map(|&r| {
            if r == 0.0 {
                1.0 + 1.5 * trapezoid(wvg, |i| wvg[i] * wvg[i] * (ssf[i] - 1.0))
            } else {
                let integral = trapezoid(wvg, |i| {
                    wvg[i] * (ssf[i] - 1.0) * (wvg[i] * r / lambda).sin()
                });
                1.0 + 1.5 * (lambda / r) * integral
            }
        })
        .collect();
    Ok(rdf)
}

/// Interaction energy per particle, in Rydberg units.
pub fn internal_energy(wvg: &[f64], ssf: &[f64], coupling: f64) -> Result<f64, ThermoError> {
    check_grid(wvg, ssf)?;
    if coupling <= 0.0 {
        return Err(ThermoError::NonPositiveCoupling(coupling));
    }
    let integral = trapezoid(wvg, |i| ssf[i] - 1.0);
    Ok(integral / (PI * lambda() * coupling))
}

/// Evenly spaced points in `[start, stop)`.
pub fn rdf_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count)
        .map(|i| start + i as f64 * step)
        .filter(|&r| r < stop)
        .collect()
}
