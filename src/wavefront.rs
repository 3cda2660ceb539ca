//!
//! # Wavefront model
//!
//! A [`WavefrontSpec`] describes an optical system by its exit pupil: the pupil diameter,
//! the focal length, the pupil amplitude and the wavefront aberrations given as Zernike coefficients
//! and/or as a custom map.
//! The PSF at each wavelength is the squared modulus of the Fourier transform of the complex pupil
//! function sampled on a square grid of `spatial_samples` across the pupil plane field.
//!
//! The pupil plane field size is given at the reference wavelength and it scales linearly with the
//! wavelength, so that all the PSFs of a [`PsfStack`] share the same image plane sampling
//! `reference_wavelength * focal_length / field_size`.
//!
//! A [`WavefrontSpec`] is immutable, every modifier returns a new one and every derived PSF stack is computed
//! from scratch.
//!
//! ```
//! use oiwvf::{units::LengthUnits, Builder, FromBuilder, WavefrontSpec};
//! let spec = WavefrontSpec::builder()
//!     .pupil_diameter(3f64.mm())
//!     .focal_length(17f64.mm())
//!     .wavelengths(vec![450f64.nm(), 550f64.nm(), 650f64.nm()])
//!     .build()
//!     .unwrap();
//! let psf = spec.compute_psf(None).unwrap();
//! assert_eq!(psf.len(), 3);
//! ```

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    aperture::ApertureMask,
    builders::WavefrontSpecBuilder,
    fft2::{fftshift, ifftshift, Fft2},
    otf::{DcOrigin, OtfStack},
    psf::{Kernel, PsfStack},
    units::PhysicalLength,
    zernike, FromBuilder, OpticsError, Result,
};

/// Human eye longitudinal chromatic aberration \[diopter\] at `wavelength`
///
/// Thibos et al. (1992) "chromatic eye" model
pub fn human_lca_diopters(wavelength: PhysicalLength) -> f64 {
    let (p, q, c) = (1.7312, 0.63346, 0.21410);
    p - q / (wavelength.in_micrometers() - c)
}

/// Wavelength dependent defocus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChromaticDefocus {
    /// Human eye longitudinal chromatic aberration, in focus at `focus_wavelength`
    HumanLca { focus_wavelength: PhysicalLength },
    /// Constant defocus gradient \[diopter/nm\] around `focus_wavelength`
    Linear {
        focus_wavelength: PhysicalLength,
        diopters_per_nm: f64,
    },
}
impl ChromaticDefocus {
    /// Defocus \[diopter\] at `wavelength`
    pub fn diopters(&self, wavelength: PhysicalLength) -> f64 {
        match self {
            Self::HumanLca { focus_wavelength } => {
                human_lca_diopters(wavelength) - human_lca_diopters(*focus_wavelength)
            }
            Self::Linear {
                focus_wavelength,
                diopters_per_nm,
            } => (wavelength - *focus_wavelength).in_nanometers() * diopters_per_nm,
        }
    }
}

/// Custom pupil amplitude and phase maps
///
/// The maps are `n`x`n` row-major arrays sampling the square circumscribed to the pupil,
/// the phase is given as a wavefront in micrometers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PupilMap {
    pub n: usize,
    pub amplitude: Option<Vec<f64>>,
    pub phase: Option<Vec<f64>>,
}
impl PupilMap {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            amplitude: None,
            phase: None,
        }
    }
    pub fn amplitude(self, amplitude: Vec<f64>) -> Self {
        Self {
            amplitude: Some(amplitude),
            ..self
        }
    }
    pub fn phase(self, phase: Vec<f64>) -> Self {
        Self {
            phase: Some(phase),
            ..self
        }
    }
    fn check(&self) -> Result<()> {
        if self.n < 2 {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "pupil map must be at least 2x2, found {0}x{0}",
                self.n
            )));
        }
        for map in [&self.amplitude, &self.phase].into_iter().flatten() {
            if map.len() != self.n * self.n {
                return Err(OpticsError::InvalidOpticsSpec(format!(
                    "pupil map of length {} does not match the {}x{} map size",
                    map.len(),
                    self.n,
                    self.n
                )));
            }
        }
        Ok(())
    }
    // `n`x`n` view of a map, `None` if its length does not match
    fn view<'a>(&self, map: &'a Option<Vec<f64>>) -> Option<ArrayView2<'a, f64>> {
        map.as_ref()
            .and_then(|m| ArrayView2::from_shape((self.n, self.n), m.as_slice()).ok())
    }
    // bilinear interpolation at the normalized pupil coordinates (x,y)
    fn interpolate(map: ArrayView2<f64>, x: f64, y: f64) -> f64 {
        let n = map.nrows();
        let u = ((x + 1.) * 0.5 * (n - 1) as f64).clamp(0., (n - 1) as f64);
        let v = ((y + 1.) * 0.5 * (n - 1) as f64).clamp(0., (n - 1) as f64);
        let (j, i) = ((u as usize).min(n - 2), (v as usize).min(n - 2));
        let (du, dv) = (u - j as f64, v - i as f64);
        map[[i, j]] * (1. - du) * (1. - dv)
            + map[[i, j + 1]] * du * (1. - dv)
            + map[[i + 1, j]] * (1. - du) * dv
            + map[[i + 1, j + 1]] * du * dv
    }
    /// Amplitude at the normalized pupil coordinates `(x,y)`
    pub fn amplitude_at(&self, x: f64, y: f64) -> f64 {
        self.view(&self.amplitude)
            .map_or(1., |a| Self::interpolate(a, x, y))
    }
    /// Wavefront \[micron\] at the normalized pupil coordinates `(x,y)`
    pub fn phase_at(&self, x: f64, y: f64) -> f64 {
        self.view(&self.phase)
            .map_or(0., |p| Self::interpolate(p, x, y))
    }
    /// Equivalent wavefront: least-square fit of the phase map with `n_mode` Zernike polynomials
    pub fn fit_zernike(&self, n_mode: usize) -> Result<Vec<f64>> {
        self.check()?;
        let Some(phase) = self.view(&self.phase) else {
            return Ok(vec![0.; n_mode]);
        };
        let n = self.n;
        let samples: Vec<_> = phase
            .indexed_iter()
            .filter_map(|((i, j), p)| {
                let x = -1. + 2. * j as f64 / (n - 1) as f64;
                let y = -1. + 2. * i as f64 / (n - 1) as f64;
                let rho = x.hypot(y);
                (rho <= 1.).then(|| (rho, y.atan2(x), *p))
            })
            .collect();
        zernike::fit(&samples, n_mode)
    }
}

/// Exit pupil description of an optical system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavefrontSpec {
    pub(crate) pupil_diameter: PhysicalLength,
    pub(crate) focal_length: PhysicalLength,
    pub(crate) wavelengths: Vec<PhysicalLength>,
    pub(crate) reference_wavelength: PhysicalLength,
    pub(crate) zernike: Vec<f64>,
    pub(crate) pupil_map: Option<PupilMap>,
    pub(crate) chromatic_defocus: Option<ChromaticDefocus>,
    pub(crate) aperture: Option<ApertureMask>,
    pub(crate) field_size: PhysicalLength,
    pub(crate) spatial_samples: usize,
}
impl FromBuilder for WavefrontSpec {
    type ComponentBuilder = WavefrontSpecBuilder;
}
impl WavefrontSpec {
    /// Checks the physical parameters
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(OpticsError::InvalidOpticsSpec(msg));
        if !self.pupil_diameter.is_positive() {
            return invalid(format!("pupil diameter {} <= 0", self.pupil_diameter));
        }
        if !self.focal_length.is_positive() {
            return invalid(format!("focal length {} <= 0", self.focal_length));
        }
        if self.wavelengths.is_empty() {
            return invalid("no wavelength".into());
        }
        if let Some(w) = self
            .wavelengths
            .iter()
            .chain(Some(&self.reference_wavelength))
            .find(|w| !w.is_positive())
        {
            return invalid(format!("wavelength {} <= 0", w));
        }
        if self.spatial_samples == 0 || self.spatial_samples % 2 == 1 {
            return invalid(format!(
                "spatial samples must be even and non-zero, found {}",
                self.spatial_samples
            ));
        }
        if !self.field_size.is_positive() {
            return invalid(format!("pupil plane field size {} <= 0", self.field_size));
        }
        if let Some(map) = &self.pupil_map {
            map.check()?;
        }
        Ok(())
    }
    pub fn pupil_diameter(&self) -> PhysicalLength {
        self.pupil_diameter
    }
    pub fn focal_length(&self) -> PhysicalLength {
        self.focal_length
    }
    /// F-number `focal_length / pupil_diameter`
    pub fn f_number(&self) -> f64 {
        self.focal_length / self.pupil_diameter
    }
    pub fn wavelengths(&self) -> &[PhysicalLength] {
        &self.wavelengths
    }
    pub fn reference_wavelength(&self) -> PhysicalLength {
        self.reference_wavelength
    }
    pub fn zernike(&self) -> &[f64] {
        &self.zernike
    }
    pub fn pupil_map(&self) -> Option<&PupilMap> {
        self.pupil_map.as_ref()
    }
    pub fn aperture(&self) -> Option<&ApertureMask> {
        self.aperture.as_ref()
    }
    pub fn chromatic_defocus(&self) -> Option<&ChromaticDefocus> {
        self.chromatic_defocus.as_ref()
    }
    /// Pupil plane field size at the reference wavelength
    pub fn field_size(&self) -> PhysicalLength {
        self.field_size
    }
    pub fn spatial_samples(&self) -> usize {
        self.spatial_samples
    }
    /// Pupil plane sample spacing at the reference wavelength
    pub fn pupil_sampling(&self) -> PhysicalLength {
        self.field_size / self.spatial_samples as f64
    }
    /// Pupil plane field size at `wavelength`
    pub fn field_size_at(&self, wavelength: PhysicalLength) -> PhysicalLength {
        self.field_size * (wavelength / self.reference_wavelength)
    }
    /// Image plane sample spacing of the PSFs
    pub fn psf_sampling(&self) -> PhysicalLength {
        let mm = self.reference_wavelength.in_millimeters() * self.focal_length.in_millimeters()
            / self.field_size.in_millimeters();
        PhysicalLength::millimeters(mm).convert(crate::units::Unit::Micrometer)
    }
    /// Returns a new wavefront with a different pupil plane sampling
    pub fn with_sampling(&self, field_size: PhysicalLength, spatial_samples: usize) -> Self {
        Self {
            field_size,
            spatial_samples,
            ..self.clone()
        }
    }
    /// Returns a new wavefront with a different set of wavelengths
    pub fn with_wavelengths(&self, wavelengths: Vec<PhysicalLength>) -> Self {
        Self {
            wavelengths,
            ..self.clone()
        }
    }
    /// Returns a new wavefront with a different reference wavelength, the image plane sampling is left unchanged
    pub fn with_reference_wavelength(&self, reference_wavelength: PhysicalLength) -> Self {
        Self {
            field_size: self.field_size_at(reference_wavelength),
            reference_wavelength,
            ..self.clone()
        }
    }
    /// Returns a new wavefront with different Zernike coefficients \[micron\]
    pub fn with_zernike(&self, zernike: Vec<f64>) -> Self {
        Self {
            zernike,
            ..self.clone()
        }
    }
    /// Returns a new wavefront with a different pupil diameter
    pub fn with_pupil_diameter(&self, pupil_diameter: PhysicalLength) -> Self {
        Self {
            pupil_diameter,
            ..self.clone()
        }
    }
    /// Returns a new wavefront where the custom phase map is replaced by its `n_mode` Zernike fit
    pub fn with_equivalent_wavefront(&self, n_mode: usize) -> Result<Self> {
        let Some(map) = self.pupil_map.as_ref() else {
            return Ok(self.clone());
        };
        let fit = map.fit_zernike(n_mode)?;
        let n = fit.len().max(self.zernike.len());
        let zernike = (0..n)
            .map(|j| self.zernike.get(j).unwrap_or(&0.) + fit.get(j).unwrap_or(&0.))
            .collect();
        let pupil_map = map.amplitude.as_ref().map(|a| PupilMap {
            n: map.n,
            amplitude: Some(a.clone()),
            phase: None,
        });
        Ok(Self {
            zernike,
            pupil_map,
            ..self.clone()
        })
    }
    /// Zernike coefficients \[micron\] at `wavelength`, including the chromatic defocus
    pub fn zernike_at(&self, wavelength: PhysicalLength) -> Vec<f64> {
        let mut coefs = self.zernike.clone();
        if let Some(chromatic) = &self.chromatic_defocus {
            if coefs.len() <= zernike::DEFOCUS {
                coefs.resize(zernike::DEFOCUS + 1, 0.);
            }
            coefs[zernike::DEFOCUS] += zernike::defocus_diopters_to_microns(
                chromatic.diopters(wavelength),
                self.pupil_diameter.in_millimeters(),
            );
        }
        coefs
    }
    /// Complex pupil function at `wavelength`, centered at `[n/2,n/2]`
    pub fn pupil_function(
        &self,
        wavelength: PhysicalLength,
        aperture: Option<&ApertureMask>,
    ) -> Result<Array2<Complex64>> {
        let n = self.spatial_samples;
        let field = self.field_size_at(wavelength).in_millimeters();
        let radius = 0.5 * self.pupil_diameter.in_millimeters();
        if 2. * radius > field {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "pupil diameter {} exceeds the {:.4}mm pupil plane field at {}",
                self.pupil_diameter, field, wavelength
            )));
        }
        let d = field / n as f64;
        let lambda_um = wavelength.in_micrometers();
        let coefs = self.zernike_at(wavelength);
        let aperture = aperture.or(self.aperture.as_ref());
        let pupil = Array2::from_shape_fn((n, n), |(i, j)| {
            let x = (j as f64 - (n / 2) as f64) * d / radius;
            let y = (i as f64 - (n / 2) as f64) * d / radius;
            let rho = x.hypot(y);
            if rho > 1. {
                return Complex64::default();
            }
            let mut amplitude = aperture.map_or(1., |a| a.transmission(x, y));
            let mut opd = zernike::wavefront(&coefs, rho, y.atan2(x));
            if let Some(map) = &self.pupil_map {
                amplitude *= map.amplitude_at(x, y);
                opd += map.phase_at(x, y);
            }
            Complex64::from_polar(amplitude, 2. * PI * opd / lambda_um)
        });
        Ok(pupil)
    }
    /// PSF at `wavelength`, normalized to a unit sum with its origin at `[n/2,n/2]`
    pub fn psf_at(
        &self,
        wavelength: PhysicalLength,
        aperture: Option<&ApertureMask>,
    ) -> Result<Kernel> {
        let pupil = self.pupil_function(wavelength, aperture)?;
        let mut amplitude = ifftshift(&pupil);
        Fft2::square(self.spatial_samples).inverse(&mut amplitude)?;
        let intensity = fftshift(&amplitude.mapv(|a| a.norm_sqr()));
        Kernel::new(wavelength, self.psf_sampling(), intensity).map_err(|e| match e {
            OpticsError::InvalidOpticsSpec(_) => OpticsError::InvalidOpticsSpec(format!(
                "the pupil transmits no light at {}",
                wavelength
            )),
            e => e,
        })
    }
    /// PSF stack for all the wavelengths of the wavefront
    ///
    /// An optional aperture mask overrides the mask of the wavefront
    pub fn compute_psf(&self, aperture: Option<&ApertureMask>) -> Result<PsfStack> {
        self.validate()?;
        log::debug!(
            "computing {} PSF(s) of {}x{} samples sampled at {:.4}",
            self.wavelengths.len(),
            self.spatial_samples,
            self.spatial_samples,
            self.psf_sampling()
        );
        let kernels = self
            .wavelengths
            .par_iter()
            .map(|wavelength| self.psf_at(*wavelength, aperture))
            .collect::<Result<Vec<_>>>()?;
        PsfStack::new(kernels)
    }
    /// OTF stack for all the wavelengths of the wavefront, with DC at the origin
    pub fn compute_otf(&self, aperture: Option<&ApertureMask>) -> Result<OtfStack<DcOrigin>> {
        self.compute_psf(aperture)?.otf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{units::LengthUnits, Builder};

    fn spec() -> WavefrontSpec {
        WavefrontSpec::builder()
            .pupil_diameter(3f64.mm())
            .focal_length(17f64.mm())
            .wavelengths(vec![550f64.nm()])
            .sampling(8f64.mm(), 64)
            .build()
            .unwrap()
    }

    #[test]
    fn invalid_specs() {
        for builder in [
            WavefrontSpec::builder().pupil_diameter(0f64.mm()),
            WavefrontSpec::builder().focal_length((-1f64).mm()),
            WavefrontSpec::builder().wavelengths(vec![550f64.nm(), 0f64.nm()]),
            WavefrontSpec::builder().wavelengths(vec![]),
            WavefrontSpec::builder().sampling(8f64.mm(), 63),
        ] {
            assert!(matches!(
                builder.build(),
                Err(OpticsError::InvalidOpticsSpec(_))
            ));
        }
    }

    #[test]
    fn truncated_pupil() {
        let spec = spec().with_sampling(2f64.mm(), 64);
        assert!(matches!(
            spec.compute_psf(None),
            Err(OpticsError::InvalidOpticsSpec(_))
        ));
    }

    #[test]
    fn single_wavelength_stack() {
        let psf = spec().compute_psf(None).unwrap();
        assert_eq!(psf.len(), 1);
        let kernel = psf.get(550f64.nm()).unwrap();
        assert!((kernel.energy() - 1.).abs() < 1e-12);
        assert_eq!(kernel.peak().0, (32, 32));
    }

    #[test]
    fn wavelength_independent_sampling() {
        let spec = spec().with_wavelengths(vec![450f64.nm(), 650f64.nm()]);
        let psf = spec.compute_psf(None).unwrap();
        let s: Vec<_> = psf.iter().map(|k| k.spacing().in_micrometers()).collect();
        assert!((s[0] - s[1]).abs() < 1e-12);
        // longer wavelength, broader PSF
        assert!(psf.kernels()[1].fwhm() > psf.kernels()[0].fwhm());
    }

    #[test]
    fn chromatic_defocus() {
        let focus = 550f64.nm();
        assert!(human_lca_diopters(450f64.nm()) < human_lca_diopters(focus));
        let spec = WavefrontSpec::builder()
            .wavelengths(vec![450f64.nm(), 550f64.nm()])
            .chromatic_defocus(ChromaticDefocus::HumanLca {
                focus_wavelength: focus,
            })
            .build()
            .unwrap();
        assert_eq!(spec.zernike_at(focus)[zernike::DEFOCUS], 0.);
        assert!(spec.zernike_at(450f64.nm())[zernike::DEFOCUS] < 0.);
    }

    #[test]
    fn equivalent_wavefront() {
        let n = 33;
        let coefs = [0., 0., 0., 0., 0.2];
        let phase = Array2::from_shape_fn((n, n), |(i, j)| {
            let x = -1. + 2. * j as f64 / (n - 1) as f64;
            let y = -1. + 2. * i as f64 / (n - 1) as f64;
            zernike::wavefront(&coefs, x.hypot(y), y.atan2(x))
        })
        .into_raw_vec();
        let spec = spec();
        let custom = WavefrontSpec {
            pupil_map: Some(PupilMap::new(n).phase(phase)),
            ..spec.clone()
        };
        let equivalent = custom.with_equivalent_wavefront(6).unwrap();
        assert!(equivalent.pupil_map().is_none());
        assert!((equivalent.zernike()[4] - 0.2).abs() < 1e-9);
        let a = custom.compute_psf(None).unwrap();
        let b = equivalent.compute_psf(None).unwrap();
        let err = a.kernels()[0]
            .data()
            .iter()
            .zip(b.kernels()[0].data())
            .map(|(a, b)| (a - b).abs())
            .fold(0f64, f64::max);
        assert!(err < 1e-4, "{err}");
    }

    // fraction of the PSF energy within `radius` samples of the origin
    fn core_energy(kernel: &Kernel, radius: f64) -> f64 {
        let c = (kernel.size() / 2) as f64;
        kernel
            .data()
            .indexed_iter()
            .filter(|((i, j), _)| (*i as f64 - c).hypot(*j as f64 - c) <= radius)
            .map(|(_, x)| x)
            .sum()
    }

    #[test]
    fn central_obscuration() {
        let spec = spec();
        let clear = spec.psf_at(550f64.nm(), None).unwrap();
        let mask = ApertureMask::new().central_obscuration(0.5);
        let obscured = spec.psf_at(550f64.nm(), Some(&mask)).unwrap();
        // peak of a unit energy PSF scales with the transmitting area, 1-0.5^2
        let ratio = obscured.peak().1 / clear.peak().1;
        assert!((ratio - 0.75).abs() < 0.05, "{ratio}");
        assert_eq!(obscured.peak().0, (32, 32));
        // first Airy null at 1.22λf/D = 3.25 samples
        let (a, b) = (core_energy(&clear, 3.), core_energy(&obscured, 3.));
        assert!(b < a - 0.1, "{b} vs {a}");
    }

    #[test]
    fn aperture_override() {
        let (hexagon, disk) = (
            ApertureMask::new().polygon(6, 0.1),
            ApertureMask::new().central_obscuration(0.3),
        );
        let masked = WavefrontSpec {
            aperture: Some(hexagon.clone()),
            ..spec()
        };
        let a = masked.compute_psf(None).unwrap();
        let b = spec().compute_psf(Some(&hexagon)).unwrap();
        assert_eq!(a, b);
        // the mask given to compute_psf replaces the one of the wavefront
        let c = masked.compute_psf(Some(&disk)).unwrap();
        let d = WavefrontSpec {
            aperture: Some(disk),
            ..spec()
        }
        .compute_psf(None)
        .unwrap();
        assert_eq!(c, d);
        assert_ne!(a, c);
        assert_ne!(a, spec().compute_psf(None).unwrap());
    }

    #[test]
    fn hexagonal_symmetry() {
        let spec = spec();
        let n = spec.spatial_samples();
        // `psf` rotated by 90 degrees about the origin
        let rot90 = |psf: &Kernel| -> Array2<f64> {
            Array2::from_shape_fn((n, n), |(i, j)| psf.data()[[(n - j) % n, i]])
        };
        let max_diff = |a: &Array2<f64>, b: &Array2<f64>| {
            a.iter()
                .zip(b)
                .map(|(a, b)| (a - b).abs())
                .fold(0f64, f64::max)
        };
        let rotation = 0.1;
        // rotating the diaphragm by 30 degrees rotates its PSF by 30 degrees, which equals a
        // 90 degrees rotation only if the PSF is invariant by a 60 degrees rotation
        let psf = |n_blade: usize, rotation: f64| {
            let mask = ApertureMask::new().polygon(n_blade, rotation);
            spec.psf_at(550f64.nm(), Some(&mask)).unwrap()
        };
        let hexagon = psf(6, rotation);
        let hexagon_30 = psf(6, rotation + PI / 6.);
        let err = max_diff(&rot90(&hexagon), hexagon_30.data());
        assert!(err < 1e-9, "{err}");
        let pentagon = psf(5, rotation);
        let pentagon_30 = psf(5, rotation + PI / 6.);
        let err = max_diff(&rot90(&pentagon), pentagon_30.data());
        assert!(err > 1e-6, "{err}");
    }

    #[test]
    fn linear_chromatic_defocus() {
        let wavelengths = vec![500f64.nm(), 550f64.nm(), 600f64.nm()];
        let nominal = spec().with_wavelengths(wavelengths.clone());
        let chromatic = WavefrontSpec {
            chromatic_defocus: Some(ChromaticDefocus::Linear {
                focus_wavelength: 550f64.nm(),
                diopters_per_nm: 0.01,
            }),
            ..nominal.clone()
        };
        let defocus: Vec<f64> = wavelengths
            .iter()
            .map(|w| chromatic.zernike_at(*w)[zernike::DEFOCUS])
            .collect();
        assert_eq!(defocus[1], 0.);
        assert!(defocus[0] * defocus[2] < 0.);
        assert!((defocus[0] + defocus[2]).abs() < 1e-12);
        let blurred = chromatic.compute_psf(None).unwrap();
        let sharp = nominal.compute_psf(None).unwrap();
        for (k, (b, s)) in blurred.iter().zip(sharp.iter()).enumerate() {
            let (pb, ps) = (b.peak().1, s.peak().1);
            if k == 1 {
                assert!((pb - ps).abs() < 1e-12);
            } else {
                assert!(pb < 0.9 * ps, "{}: {pb} vs {ps}", b.wavelength());
            }
        }
    }
}
