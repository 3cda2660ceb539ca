//! Point spread functions

use ndarray::{s, Array2};
use rayon::prelude::*;

use crate::{
    otf::{DcOrigin, Otf, OtfStack},
    units::PhysicalLength,
    OpticsError, Result,
};

/// Relative tolerance used to match wavelengths
pub(crate) const WAVELENGTH_RTOL: f64 = 1e-9;

pub(crate) fn same_wavelength(a: PhysicalLength, b: PhysicalLength) -> bool {
    (a / b - 1.).abs() < WAVELENGTH_RTOL
}

/// A square PSF kernel
///
/// The kernel has its origin at `[size/2,size/2]` and sums to 1
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    wavelength: PhysicalLength,
    spacing: PhysicalLength,
    data: Array2<f64>,
}
impl Kernel {
    /// Creates a kernel from its samples, normalized to a unit sum
    ///
    /// The samples must be a non-empty square array of finite and non-negative values with a
    /// positive sum.
    pub fn new(
        wavelength: PhysicalLength,
        spacing: PhysicalLength,
        data: Array2<f64>,
    ) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != cols || rows == 0 {
            return Err(OpticsError::grid(
                "PSF kernel must be square and non-empty",
                format!("{0}x{0}", rows.max(cols).max(1)),
                format!("{rows}x{cols}"),
            ));
        }
        if !spacing.is_positive() {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "PSF kernel spacing {} <= 0",
                spacing
            )));
        }
        if data.iter().any(|x| !x.is_finite() || *x < 0.) {
            return Err(OpticsError::InvalidOpticsSpec(
                "PSF kernel samples must be finite and non-negative".into(),
            ));
        }
        let energy = data.sum();
        if !(energy > 0. && energy.is_finite()) {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "PSF kernel energy {energy} must be positive"
            )));
        }
        Ok(Self {
            wavelength,
            spacing,
            data: data / energy,
        })
    }
    /// A unit impulse at the kernel origin
    pub fn delta(
        wavelength: PhysicalLength,
        spacing: PhysicalLength,
        size: usize,
    ) -> Result<Self> {
        let mut data = Array2::zeros((size, size));
        if let Some(origin) = data.get_mut((size / 2, size / 2)) {
            *origin = 1.;
        }
        Self::new(wavelength, spacing, data)
    }
    pub fn wavelength(&self) -> PhysicalLength {
        self.wavelength
    }
    /// Image plane sample spacing
    pub fn spacing(&self) -> PhysicalLength {
        self.spacing
    }
    pub fn size(&self) -> usize {
        self.data.nrows()
    }
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }
    /// Sum of the kernel samples
    pub fn energy(&self) -> f64 {
        self.data.sum()
    }
    /// Location `(row,col)` and value of the kernel maximum
    pub fn peak(&self) -> ((usize, usize), f64) {
        self.data
            .indexed_iter()
            .fold(((0, 0), f64::NEG_INFINITY), |(ij, v), (kl, x)| {
                if *x > v {
                    (kl, *x)
                } else {
                    (ij, v)
                }
            })
    }
    /// Kernel values along the row of the peak, from the peak outward to the right
    pub fn profile(&self) -> Vec<f64> {
        let ((i, j), _) = self.peak();
        self.data.slice(s![i, j..]).to_vec()
    }
    /// Full width at half maximum measured along the row of the peak, in units of the sample spacing
    ///
    /// The half maximum crossing is linearly interpolated between samples
    pub fn fwhm(&self) -> f64 {
        let profile = self.profile();
        let half = 0.5 * profile[0];
        profile
            .windows(2)
            .enumerate()
            .find(|(_, w)| w[1] < half)
            .map_or(profile.len() as f64, |(r, w)| {
                r as f64 + (w[0] - half) / (w[0] - w[1])
            })
            * 2.
    }
    /// Full width at half maximum as a length
    pub fn fwhm_length(&self) -> PhysicalLength {
        self.spacing * self.fwhm()
    }
    /// Transfer function of the kernel
    pub fn otf(&self) -> Result<Otf<DcOrigin>> {
        Otf::from_kernel(self)
    }
}

/// Collection of PSF [`Kernel`]s, one per wavelength, sharing the same size and sampling
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PsfStack {
    kernels: Vec<Kernel>,
}
impl PsfStack {
    /// Creates a stack from kernels of the same size and sampling
    pub fn new(kernels: Vec<Kernel>) -> Result<Self> {
        if let Some(first) = kernels.first() {
            if let Some(other) = kernels.iter().find(|k| k.size() != first.size()) {
                return Err(OpticsError::grid(
                    "PSF kernels must share the same size",
                    first.size(),
                    other.size(),
                ));
            }
            if let Some(other) = kernels
                .iter()
                .find(|k| (k.spacing / first.spacing - 1.).abs() > WAVELENGTH_RTOL)
            {
                return Err(OpticsError::grid(
                    "PSF kernels must share the same sampling",
                    first.spacing,
                    other.spacing,
                ));
            }
        }
        Ok(Self { kernels })
    }
    /// Stack of unit impulses, the identity of the convolution
    pub fn delta(
        wavelengths: &[PhysicalLength],
        spacing: PhysicalLength,
        size: usize,
    ) -> Result<Self> {
        Self::new(
            wavelengths
                .iter()
                .map(|w| Kernel::delta(*w, spacing, size))
                .collect::<Result<Vec<_>>>()?,
        )
    }
    pub fn len(&self) -> usize {
        self.kernels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }
    pub fn iter(&self) -> impl Iterator<Item = &Kernel> {
        self.kernels.iter()
    }
    pub fn wavelengths(&self) -> Vec<PhysicalLength> {
        self.kernels.iter().map(|k| k.wavelength).collect()
    }
    /// Kernel at `wavelength`
    pub fn get(&self, wavelength: PhysicalLength) -> Option<&Kernel> {
        self.kernels
            .iter()
            .find(|k| same_wavelength(k.wavelength, wavelength))
    }
    /// Kernel size
    pub fn size(&self) -> Option<usize> {
        self.kernels.first().map(|k| k.size())
    }
    /// Kernel sample spacing
    pub fn spacing(&self) -> Option<PhysicalLength> {
        self.kernels.first().map(|k| k.spacing)
    }
    /// Transfer functions of all the kernels
    pub fn otf(&self) -> Result<OtfStack<DcOrigin>> {
        Ok(OtfStack::new(
            self.kernels
                .par_iter()
                .map(Kernel::otf)
                .collect::<Result<Vec<_>>>()?,
        ))
    }
}
impl IntoIterator for PsfStack {
    type Item = Kernel;
    type IntoIter = std::vec::IntoIter<Kernel>;
    fn into_iter(self) -> Self::IntoIter {
        self.kernels.into_iter()
    }
}
