//!
//! # Zernike polynomials
//!
//! Orthonormal Zernike polynomials over the unit disk with the OSA/ANSI single index `j`:
//! `j=0` piston, `j=1,2` tilts, `j=3` oblique astigmatism, `j=4` defocus, `j=5` vertical astigmatism, ...
//!
//! Wavefront coefficients are given in micrometers.

use nalgebra::{DMatrix, DVector};

use crate::{OpticsError, Result};

/// OSA/ANSI index of the defocus polynomial
pub const DEFOCUS: usize = 4;

/// Returns the radial order and azimuthal frequency `(n,m)` of the OSA/ANSI index `j`
pub fn osa_to_nm(j: usize) -> (usize, i32) {
    let n = ((-3. + (9. + 8. * j as f64).sqrt()) / 2.).ceil() as usize;
    let m = 2 * j as i32 - (n * (n + 2)) as i32;
    (n, m)
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1f64, |a, k| a * k as f64)
}

/// Radial polynomial `R_n^m(rho)`
pub fn radial(n: usize, m: usize, rho: f64) -> f64 {
    if (n - m) % 2 == 1 {
        return 0.;
    }
    (0..=(n - m) / 2)
        .map(|k| {
            let sign = if k % 2 == 0 { 1. } else { -1. };
            sign * factorial(n - k)
                / (factorial(k) * factorial((n + m) / 2 - k) * factorial((n - m) / 2 - k))
                * rho.powi((n - 2 * k) as i32)
        })
        .sum()
}

/// Orthonormal Zernike polynomial `j` evaluated at polar coordinates `(rho, theta)` of the unit disk
pub fn zernike(j: usize, rho: f64, theta: f64) -> f64 {
    let (n, m) = osa_to_nm(j);
    let ma = m.unsigned_abs() as usize;
    let norm = if m == 0 {
        ((n + 1) as f64).sqrt()
    } else {
        (2. * (n + 1) as f64).sqrt()
    };
    let r = radial(n, ma, rho);
    match m {
        0 => norm * r,
        m if m > 0 => norm * r * (m as f64 * theta).cos(),
        m => norm * r * (-m as f64 * theta).sin(),
    }
}

/// Wavefront `sum_j c_j Z_j(rho,theta)` in the units of the coefficients
pub fn wavefront(coefficients: &[f64], rho: f64, theta: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .filter(|(_, c)| **c != 0.)
        .map(|(j, c)| c * zernike(j, rho, theta))
        .sum()
}

/// Converts a defocus in diopters into the defocus Zernike coefficient in micrometers for a pupil diameter in millimeters
pub fn defocus_diopters_to_microns(diopters: f64, pupil_diameter_mm: f64) -> f64 {
    diopters * pupil_diameter_mm.powi(2) / (16. * 3f64.sqrt())
}

/// Converts the defocus Zernike coefficient in micrometers into diopters for a pupil diameter in millimeters
pub fn defocus_microns_to_diopters(microns: f64, pupil_diameter_mm: f64) -> f64 {
    microns * 16. * 3f64.sqrt() / pupil_diameter_mm.powi(2)
}

/// Least-square fit of the first `n_mode` Zernike polynomials to wavefront samples
///
/// The samples are given as `(rho, theta, value)` triplets inside the unit disk
pub fn fit(samples: &[(f64, f64, f64)], n_mode: usize) -> Result<Vec<f64>> {
    if samples.len() < n_mode {
        return Err(OpticsError::ZernikeFit(
            "fewer wavefront samples than Zernike modes",
        ));
    }
    let a = DMatrix::from_fn(samples.len(), n_mode, |i, j| {
        let (rho, theta, _) = samples[i];
        zernike(j, rho, theta)
    });
    let b = DVector::from_iterator(samples.len(), samples.iter().map(|(_, _, w)| *w));
    let svd = a.svd(true, true);
    let c = svd.solve(&b, 1e-12).map_err(OpticsError::ZernikeFit)?;
    Ok(c.iter().cloned().collect())
}

/// Samples of the unit disk on a regular `n`x`n` grid, as `(rho, theta)` pairs
pub fn disk_samples(n: usize) -> impl Iterator<Item = (f64, f64)> {
    let d = 2. / n as f64;
    (0..n * n).filter_map(move |k| {
        let x = -1. + (0.5 + (k % n) as f64) * d;
        let y = -1. + (0.5 + (k / n) as f64) * d;
        let rho = x.hypot(y);
        (rho <= 1.).then(|| (rho, y.atan2(x)))
    })
}
