//!
//! # Optical transfer functions
//!
//! An [`Otf`] is the Fourier transform of a PSF [`Kernel`] normalized to a unit DC term.
//! The position of the DC term in the array is part of the type:
//!  - [`DcOrigin`]: the DC term is at `[0,0]`, the natural FFT layout, used for computations,
//!  - [`DcCentered`]: the DC term is at `[n/2,n/2]`, used for display and frequency lookups.
//!
//! The conversions [`Otf::into_centered`] and [`Otf::into_origin`] are exact inverses of each other
//! for both even and odd sizes.
//!
//! OTFs computed elsewhere, with their own frequency sampling, are stored as [`CustomOtf`] and
//! brought onto an image grid with [`OtfStack::resample`].

use std::marker::PhantomData;

use ndarray::{Array2, Zip};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    fft2::{fftshift, ifftshift, Fft2},
    psf::{same_wavelength, Kernel, WAVELENGTH_RTOL},
    units::PhysicalLength,
    OpticsError, Result,
};

// tolerance on fractional sample indices
const GRID_RTOL: f64 = 1e-9;

/// OTF array layout
pub trait Convention: Send + Sync {
    const NAME: &'static str;
    /// Index of the DC term along an axis of length `n`
    fn dc_index(n: usize) -> usize;
}
/// DC term at index `[0,0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcOrigin;
/// DC term at index `[n/2,n/2]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcCentered;
impl Convention for DcOrigin {
    const NAME: &'static str = "DC-at-origin";
    fn dc_index(_n: usize) -> usize {
        0
    }
}
impl Convention for DcCentered {
    const NAME: &'static str = "DC-centered";
    fn dc_index(n: usize) -> usize {
        n / 2
    }
}

// divides `data` by its DC term
fn normalize<C: Convention>(
    wavelength: PhysicalLength,
    mut data: Array2<Complex64>,
) -> Result<Array2<Complex64>> {
    let k = C::dc_index(data.nrows());
    let dc = data
        .get((k, k))
        .copied()
        .filter(|dc| dc.norm() > 0. && dc.is_finite())
        .ok_or_else(|| {
            OpticsError::InvalidOpticsSpec(format!("the OTF at {} has no DC term", wavelength))
        })?;
    data.mapv_inplace(|x| x / dc);
    Ok(data)
}

/// Optical transfer function sampled on a square grid
#[derive(Debug, Clone, PartialEq)]
pub struct Otf<C: Convention> {
    wavelength: PhysicalLength,
    spacing: PhysicalLength,
    data: Array2<Complex64>,
    convention: PhantomData<C>,
}
impl<C: Convention> Otf<C> {
    pub fn wavelength(&self) -> PhysicalLength {
        self.wavelength
    }
    /// Sample spacing of the PSF the OTF derives from
    pub fn spacing(&self) -> PhysicalLength {
        self.spacing
    }
    pub fn size(&self) -> usize {
        self.data.nrows()
    }
    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }
    /// Name of the array layout
    pub fn convention(&self) -> &'static str {
        C::NAME
    }
    /// DC term
    pub fn dc(&self) -> Complex64 {
        let k = C::dc_index(self.size());
        self.data[[k, k]]
    }
    /// Frequency sample spacing \[cycle/mm\]
    pub fn frequency_step(&self) -> f64 {
        1. / (self.size() as f64 * self.spacing.in_millimeters())
    }
    /// Spatial frequency \[cycle/mm\] at the array index `k` along an axis
    pub fn frequency(&self, k: usize) -> f64 {
        let n = self.size() as i64;
        let dc = C::dc_index(self.size()) as i64;
        let f = (k as i64 - dc).rem_euclid(n);
        let f = if f < (n + 1) / 2 { f } else { f - n };
        f as f64 * self.frequency_step()
    }
    /// Spatial frequencies \[cycle/mm\] along an axis in the array order
    pub fn frequency_support(&self) -> Vec<f64> {
        (0..self.size()).map(|k| self.frequency(k)).collect()
    }
    /// Nearest sample of the OTF at the spatial frequencies `(fx,fy)` \[cycle/mm\]
    ///
    /// Returns `None` beyond the Nyquist frequency
    pub fn value_at(&self, fx: f64, fy: f64) -> Option<Complex64> {
        let n = self.size() as i64;
        let df = self.frequency_step();
        let (kx, ky) = ((fx / df).round() as i64, (fy / df).round() as i64);
        let half = n / 2;
        if kx.abs() > half || ky.abs() > half {
            return None;
        }
        let dc = C::dc_index(self.size()) as i64;
        let (j, i) = ((kx + dc).rem_euclid(n), (ky + dc).rem_euclid(n));
        Some(self.data[[i as usize, j as usize]])
    }
    /// Modulation transfer function, the OTF modulus
    pub fn mtf(&self) -> Array2<f64> {
        self.data.mapv(|x| x.norm())
    }
}
impl Otf<DcOrigin> {
    /// OTF of a PSF kernel, normalized to a unit DC term
    pub fn from_kernel(kernel: &Kernel) -> Result<Self> {
        let n = kernel.size();
        let mut data = ifftshift(kernel.data()).mapv(|x| Complex64::new(x, 0.));
        Fft2::square(n).forward(&mut data)?;
        Ok(Self {
            wavelength: kernel.wavelength(),
            spacing: kernel.spacing(),
            data: normalize::<DcOrigin>(kernel.wavelength(), data)?,
            convention: PhantomData,
        })
    }
    /// Moves the DC term to the array center
    pub fn into_centered(self) -> Otf<DcCentered> {
        Otf {
            data: fftshift(&self.data),
            wavelength: self.wavelength,
            spacing: self.spacing,
            convention: PhantomData,
        }
    }
    /// PSF kernel of the OTF
    ///
    /// Negative PSF samples, from an OTF that is not the transform of a non-negative PSF, are
    /// set to 0
    pub fn kernel(&self) -> Result<Kernel> {
        let mut data = self.data.clone();
        Fft2::square(self.size()).inverse(&mut data)?;
        let psf = data.mapv(|x| x.re.max(0.));
        Kernel::new(self.wavelength, self.spacing, fftshift(&psf))
    }
}
impl Otf<DcCentered> {
    /// Creates an OTF from its DC-centered samples, normalized to a unit DC term
    ///
    /// `spacing` is the sample spacing of the PSF the OTF derives from
    pub fn new(
        wavelength: PhysicalLength,
        spacing: PhysicalLength,
        data: Array2<Complex64>,
    ) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != cols || rows == 0 {
            return Err(OpticsError::grid(
                "OTF must be square and non-empty",
                format!("{0}x{0}", rows.max(cols).max(1)),
                format!("{rows}x{cols}"),
            ));
        }
        if !spacing.is_positive() {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "OTF spacing {} <= 0",
                spacing
            )));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "the OTF at {} is not finite",
                wavelength
            )));
        }
        Ok(Self {
            wavelength,
            spacing,
            data: normalize::<DcCentered>(wavelength, data)?,
            convention: PhantomData,
        })
    }
    /// Moves the DC term to the array origin
    pub fn into_origin(self) -> Otf<DcOrigin> {
        Otf {
            data: ifftshift(&self.data),
            wavelength: self.wavelength,
            spacing: self.spacing,
            convention: PhantomData,
        }
    }
    /// Bilinear interpolation of the OTF at the spatial frequencies `(fx,fy)` \[cycle/mm\]
    ///
    /// The OTF is 0 outside of the sampled frequencies
    pub fn interpolate(&self, fx: f64, fy: f64) -> Complex64 {
        let n = self.size();
        let (df, dc) = (self.frequency_step(), (n / 2) as f64);
        let (u, v) = (fx / df + dc, fy / df + dc);
        let last = (n - 1) as f64;
        // round-off from the frequency grid of another OTF of the same step
        let support = -GRID_RTOL..=last + GRID_RTOL;
        if !support.contains(&u) || !support.contains(&v) {
            return Complex64::default();
        }
        if n == 1 {
            return self.data[[0, 0]];
        }
        let (u, v) = (u.clamp(0., last), v.clamp(0., last));
        let (j, i) = ((u as usize).min(n - 2), (v as usize).min(n - 2));
        let (du, dv) = (u - j as f64, v - i as f64);
        self.data[[i, j]] * (1. - du) * (1. - dv)
            + self.data[[i, j + 1]] * du * (1. - dv)
            + self.data[[i + 1, j]] * (1. - du) * dv
            + self.data[[i + 1, j + 1]] * du * dv
    }
    /// Interpolates the OTF on the frequency grid of a `size`x`size` PSF sampled every `spacing`
    pub fn resample(&self, spacing: PhysicalLength, size: usize) -> Result<Self> {
        if !spacing.is_positive() || size == 0 {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "cannot resample the OTF on a {size}x{size} grid sampled every {spacing}"
            )));
        }
        let df = 1. / (size as f64 * spacing.in_millimeters());
        let dc = (size / 2) as f64;
        let data = Array2::from_shape_fn((size, size), |(i, j)| {
            self.interpolate((j as f64 - dc) * df, (i as f64 - dc) * df)
        });
        Self::new(self.wavelength, spacing, data)
    }
}

/// Collection of [`Otf`]s, one per wavelength
#[derive(Debug, Clone, PartialEq)]
pub struct OtfStack<C: Convention> {
    otfs: Vec<Otf<C>>,
}
impl<C: Convention> OtfStack<C> {
    pub fn new(otfs: Vec<Otf<C>>) -> Self {
        Self { otfs }
    }
    pub fn len(&self) -> usize {
        self.otfs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.otfs.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Otf<C>> {
        self.otfs.iter()
    }
    pub fn wavelengths(&self) -> Vec<PhysicalLength> {
        self.otfs.iter().map(|o| o.wavelength).collect()
    }
    /// OTF at `wavelength`
    pub fn get(&self, wavelength: PhysicalLength) -> Option<&Otf<C>> {
        self.otfs
            .iter()
            .find(|o| same_wavelength(o.wavelength, wavelength))
    }
    /// Name of the array layout
    pub fn convention(&self) -> &'static str {
        C::NAME
    }
}
impl OtfStack<DcOrigin> {
    pub fn into_centered(self) -> OtfStack<DcCentered> {
        OtfStack::new(self.otfs.into_iter().map(Otf::into_centered).collect())
    }
}
impl OtfStack<DcCentered> {
    pub fn into_origin(self) -> OtfStack<DcOrigin> {
        OtfStack::new(self.otfs.into_iter().map(Otf::into_origin).collect())
    }
    /// OTFs at `wavelengths` on the frequency grid of `size`x`size` PSFs sampled every `spacing`
    ///
    /// Each OTF is interpolated in frequency, see [`Otf::resample`], and linearly in wavelength
    /// between the two closest stored wavelengths.
    /// A wavelength outside of the stored range fails with [`OpticsError::MissingWavelength`].
    pub fn resample(
        &self,
        wavelengths: &[PhysicalLength],
        spacing: PhysicalLength,
        size: usize,
    ) -> Result<OtfStack<DcOrigin>> {
        let otfs = wavelengths
            .par_iter()
            .map(|w| -> Result<Otf<DcOrigin>> {
                let otf = match self.bracket(*w) {
                    Some((lo, None)) => lo.resample(spacing, size)?,
                    Some((lo, Some(hi))) => {
                        let t = (*w - lo.wavelength) / (hi.wavelength - lo.wavelength);
                        let (lo, hi) = (lo.resample(spacing, size)?, hi.resample(spacing, size)?);
                        let data = Zip::from(&lo.data)
                            .and(&hi.data)
                            .map_collect(|a, b| a * (1. - t) + b * t);
                        Otf::new(*w, spacing, data)?
                    }
                    None => return Err(OpticsError::MissingWavelength(w.in_nanometers())),
                };
                Ok(Otf {
                    wavelength: *w,
                    ..otf
                }
                .into_origin())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OtfStack::new(otfs))
    }
    // stored OTF at `wavelength`, or the stored OTFs on either side of it
    fn bracket(
        &self,
        wavelength: PhysicalLength,
    ) -> Option<(&Otf<DcCentered>, Option<&Otf<DcCentered>>)> {
        if let Some(otf) = self.get(wavelength) {
            return Some((otf, None));
        }
        let w = wavelength.in_nanometers();
        let nm = |o: &&Otf<DcCentered>| o.wavelength.in_nanometers();
        let below = self
            .otfs
            .iter()
            .filter(|o| nm(o) < w)
            .max_by(|a, b| nm(a).total_cmp(&nm(b)))?;
        let above = self
            .otfs
            .iter()
            .filter(|o| nm(o) > w)
            .min_by(|a, b| nm(a).total_cmp(&nm(b)))?;
        Some((below, Some(above)))
    }
}
impl<C: Convention> IntoIterator for OtfStack<C> {
    type Item = Otf<C>;
    type IntoIter = std::vec::IntoIter<Otf<C>>;
    fn into_iter(self) -> Self::IntoIter {
        self.otfs.into_iter()
    }
}

/// One wavelength of a [`CustomOtf`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomOtfBand {
    pub wavelength: PhysicalLength,
    /// Real part, DC-centered and row-major
    pub real: Vec<f64>,
    /// Imaginary part, DC-centered and row-major
    pub imaginary: Vec<f64>,
}

/// OTF data stored with its own sampling
///
/// All the bands are `size`x`size` DC-centered arrays of the OTFs of PSFs sampled every `spacing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomOtf {
    pub spacing: PhysicalLength,
    pub size: usize,
    pub bands: Vec<CustomOtfBand>,
}
impl CustomOtf {
    /// Stores an OTF stack whose OTFs share the same size and sampling
    pub fn new(stack: &OtfStack<DcCentered>) -> Result<Self> {
        let first = stack
            .iter()
            .next()
            .ok_or_else(|| OpticsError::InvalidOpticsSpec("no custom OTF".into()))?;
        let (spacing, size) = (first.spacing, first.size());
        let bands = stack
            .iter()
            .map(|otf| {
                if otf.size() != size {
                    return Err(OpticsError::grid(
                        "custom OTFs must share the same size",
                        size,
                        otf.size(),
                    ));
                }
                if (otf.spacing / spacing - 1.).abs() > WAVELENGTH_RTOL {
                    return Err(OpticsError::grid(
                        "custom OTFs must share the same sampling",
                        spacing,
                        otf.spacing,
                    ));
                }
                Ok(CustomOtfBand {
                    wavelength: otf.wavelength,
                    real: otf.data.iter().map(|x| x.re).collect(),
                    imaginary: otf.data.iter().map(|x| x.im).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            spacing,
            size,
            bands,
        })
    }
    /// Stored OTFs
    pub fn stack(&self) -> Result<OtfStack<DcCentered>> {
        let n = self.size;
        let otfs = self
            .bands
            .iter()
            .map(|band| {
                let values: Vec<Complex64> = band
                    .real
                    .iter()
                    .zip(&band.imaginary)
                    .map(|(re, im)| Complex64::new(*re, *im))
                    .collect();
                let found = band.real.len().max(band.imaginary.len());
                if band.real.len() != n * n || band.imaginary.len() != n * n {
                    return Err(OpticsError::grid(
                        "custom OTF band size mismatch",
                        n * n,
                        found,
                    ));
                }
                let data = Array2::from_shape_vec((n, n), values).map_err(|_| {
                    OpticsError::grid("custom OTF band size mismatch", n * n, found)
                })?;
                Otf::new(band.wavelength, self.spacing, data)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OtfStack::new(otfs))
    }
}
