//!
//! # Pupil and image plane sampling
//!
//! The pupil plane and the image plane are Fourier conjugate: for a pupil plane field of size `L`
//! sampled with `N` samples, the PSF at wavelength `λ` of an optical system of focal length `f`
//! is sampled every `λf/L` in the image plane.
//! [`match_sampling`] is the one place where this identity is used to derive the pupil plane
//! sampling from a target image plane sampling.

use ndarray::s;

use crate::{
    psf::{Kernel, PsfStack},
    units::{PhysicalLength, Unit},
    OpticsError, Result, WavefrontSpec,
};

/// Returns a copy of `spec` whose PSFs are sampled every `target_pitch` on a `target_size`x`target_size` grid
///
/// The pupil plane sample spacing is `λf/(target_pitch*target_size)` at `reference_wavelength` and
/// the pupil plane field size is `target_size` times the sample spacing.
pub fn match_sampling(
    spec: &WavefrontSpec,
    target_pitch: PhysicalLength,
    target_size: usize,
    reference_wavelength: PhysicalLength,
) -> Result<WavefrontSpec> {
    if !target_pitch.is_positive() {
        return Err(OpticsError::InvalidOpticsSpec(format!(
            "target pitch {} <= 0",
            target_pitch
        )));
    }
    if !reference_wavelength.is_positive() {
        return Err(OpticsError::InvalidOpticsSpec(format!(
            "reference wavelength {} <= 0",
            reference_wavelength
        )));
    }
    if target_size == 0 || target_size % 2 == 1 {
        return Err(OpticsError::InvalidOpticsSpec(format!(
            "target size must be even and non-zero, found {}",
            target_size
        )));
    }
    let spacing_mm = reference_wavelength.in_millimeters() * spec.focal_length().in_millimeters()
        / (target_pitch.in_millimeters() * target_size as f64);
    let field_size = PhysicalLength::millimeters(spacing_mm * target_size as f64);
    log::debug!(
        "PSF sampling {} on {}x{}: pupil plane field {:.4} at {}",
        target_pitch,
        target_size,
        target_size,
        field_size,
        reference_wavelength
    );
    let matched = WavefrontSpec {
        reference_wavelength,
        ..spec.with_sampling(field_size, target_size)
    };
    matched.validate()?;
    Ok(matched)
}

/// Smallest oversampling factor `k` of the image plane sampling `pitch` such that the pupil fits
/// in the pupil plane field at the shortest wavelength of `spec`
///
/// At the pitch `pitch/k` the pupil plane field at `λ` is `kλf/pitch`.
pub fn oversampling_factor(spec: &WavefrontSpec, pitch: PhysicalLength) -> usize {
    let lambda_min = spec
        .wavelengths()
        .iter()
        .map(|w| w.in_millimeters())
        .fold(f64::INFINITY, f64::min);
    let field = lambda_min * spec.focal_length().in_millimeters() / pitch.in_millimeters();
    let ratio = spec.pupil_diameter().in_millimeters() / field;
    if ratio.is_finite() {
        ratio.ceil().max(1.) as usize
    } else {
        1
    }
}

/// Keeps every `k`th sample of a kernel sampled `k` times finer than the target grid
///
/// The fine kernel origin `[size/2,size/2]` is kept at `[n/2,n/2]` with `n = size/k`, so `n` must be even.
/// The samples are those of the PSF computed directly at the coarse pitch with the same pupil plane sampling.
pub fn decimate(kernel: &Kernel, k: usize) -> Result<Kernel> {
    if k == 1 {
        return Ok(kernel.clone());
    }
    let fine = kernel.size();
    if k == 0 || fine % k != 0 || (fine / k) % 2 == 1 {
        return Err(OpticsError::grid(
            "decimation needs a factor dividing the kernel into an even size",
            format!("divisor of {fine}"),
            k,
        ));
    }
    let step = k as isize;
    let data = kernel.data().slice(s![..;step, ..;step]).to_owned();
    let spacing = (kernel.spacing() * k as f64).convert(Unit::Micrometer);
    Kernel::new(kernel.wavelength(), spacing, data)
}

/// Decimates all the kernels of a stack, see [`decimate`]
pub fn decimate_stack(stack: &PsfStack, k: usize) -> Result<PsfStack> {
    PsfStack::new(
        stack
            .iter()
            .map(|kernel| decimate(kernel, k))
            .collect::<Result<Vec<_>>>()?,
    )
}
