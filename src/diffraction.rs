//!
//! # Diffraction limited references
//!
//! Analytic PSF and MTF of an aberration free circular pupil, used to validate the sampled PSFs.

use std::f64::consts::PI;

use roots::find_root_brent;

use crate::{units::PhysicalLength, OpticsError, Result};

/// First zero of the Bessel function J1
pub const J1_FIRST_ZERO: f64 = 3.831_705_970_207_512;

/// Normalized Airy pattern `(2J1(x)/x)^2`
pub fn airy(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.
    } else {
        (2. * libm::j1(x) / x).powi(2)
    }
}

/// Airy pattern argument `x = π D r / (λ f)` at the radius `r` in the image plane
pub fn airy_argument(
    radius: PhysicalLength,
    wavelength: PhysicalLength,
    focal_length: PhysicalLength,
    pupil_diameter: PhysicalLength,
) -> f64 {
    PI * pupil_diameter.in_meters() * radius.in_meters()
        / (wavelength.in_meters() * focal_length.in_meters())
}

/// Radius of the first dark ring, `1.22 λ f / D`
pub fn first_null_radius(
    wavelength: PhysicalLength,
    focal_length: PhysicalLength,
    pupil_diameter: PhysicalLength,
) -> PhysicalLength {
    let um = J1_FIRST_ZERO / PI * wavelength.in_micrometers() * (focal_length / pupil_diameter);
    PhysicalLength::micrometers(um)
}

/// Full width at half maximum of the Airy pattern, `≈1.029 λ f / D`
pub fn airy_fwhm(
    wavelength: PhysicalLength,
    focal_length: PhysicalLength,
    pupil_diameter: PhysicalLength,
) -> Result<PhysicalLength> {
    let x_half = find_root_brent(1f64, 2f64, |x| airy(x) - 0.5, &mut 1e-12f64)
        .map_err(|e| OpticsError::RootSearch(format!("{:?}", e)))?;
    let um = 2. * x_half / PI * wavelength.in_micrometers() * (focal_length / pupil_diameter);
    Ok(PhysicalLength::micrometers(um))
}

/// MTF of an aberration free circular pupil at the spatial frequency `frequency` \[cycle/mm\]
///
/// The cut-off frequency is `D/(λf)`
pub fn diffraction_limited_mtf(
    frequency: f64,
    wavelength: PhysicalLength,
    focal_length: PhysicalLength,
    pupil_diameter: PhysicalLength,
) -> f64 {
    let cutoff = pupil_diameter.in_millimeters()
        / (wavelength.in_millimeters() * focal_length.in_millimeters());
    let s = (frequency.abs() / cutoff).min(1.);
    2. / PI * (s.acos() - s * (1. - s * s).sqrt())
}
