//!
//! # Spectral PSF application
//!
//! The [`ApplicationEngine`] blurs every band of a [`SpectralImage`] with the PSF of the band wavelength.
//! Each band is squared, padded with a margin, convolved in the Fourier domain with the OTF of the
//! band and cropped back to its original extent.
//!
//! ```
//! use oiwvf::{units::LengthUnits, ApplicationEngine, PadPolicy, PsfStack, SpectralImage};
//! let mut image = SpectralImage::uniform(48, 64, vec![550f64.nm()], 2f64.um(), 10.).unwrap();
//! let engine = ApplicationEngine::new(PadPolicy::Replicate);
//! let size = engine.working_grid(&image).size;
//! let psf = PsfStack::delta(image.wavelengths(), 2f64.um(), size).unwrap();
//! engine.apply(&mut image, &psf).unwrap();
//! assert!((image.pixel(0, 0, 0) - 10.).abs() < 1e-9);
//! ```

use ndarray::{ArrayViewMut2, Axis, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    fft2::Fft2,
    otf::{DcOrigin, Otf, OtfStack},
    psf::PsfStack,
    OpticsError, Result, SpectralImage,
};

mod padding;
pub use padding::{border_mean, split, PadPolicy, WorkingGrid};

/// Relative tolerance between the kernel sample spacing and the image pitch
const PITCH_RTOL: f64 = 1e-6;

/// Default margin around the squared band, as a fraction of its size
pub const MARGIN_FRACTION: f64 = 0.125;

/// Frequency domain convolution of spectral images
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEngine {
    pub(crate) pad: PadPolicy,
    pub(crate) margin_fraction: f64,
}
impl Default for ApplicationEngine {
    fn default() -> Self {
        Self {
            pad: PadPolicy::default(),
            margin_fraction: MARGIN_FRACTION,
        }
    }
}
impl ApplicationEngine {
    /// Creates an engine with the given padding policy and the default margin
    pub fn new(pad: PadPolicy) -> Self {
        Self {
            pad,
            ..Default::default()
        }
    }
    /// Sets the margin as a fraction of the squared band size, within `[0,1]`
    pub fn margin_fraction(self, margin_fraction: f64) -> Result<Self> {
        if !(0f64..=1f64).contains(&margin_fraction) {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "margin fraction {} outside [0,1]",
                margin_fraction
            )));
        }
        Ok(Self {
            margin_fraction,
            ..self
        })
    }
    pub fn pad_policy(&self) -> PadPolicy {
        self.pad
    }
    /// Layout of the image bands in the convolution buffer
    pub fn working_grid(&self, image: &SpectralImage) -> WorkingGrid {
        WorkingGrid::new(image.height(), image.width(), self.margin_fraction)
    }
    /// Convolves each band of `image` with the kernel of `psf` at the band wavelength
    ///
    /// The kernels must be sampled at the image pitch on a grid the size of [`ApplicationEngine::working_grid`].
    pub fn apply(&self, image: &mut SpectralImage, psf: &PsfStack) -> Result<()> {
        let kernels = image
            .wavelengths()
            .iter()
            .map(|w| {
                psf.get(*w)
                    .ok_or(OpticsError::MissingWavelength(w.in_nanometers()))
            })
            .collect::<Result<Vec<_>>>()?;
        let otf = OtfStack::new(
            kernels
                .into_par_iter()
                .map(|k| k.otf())
                .collect::<Result<Vec<_>>>()?,
        );
        self.apply_otf(image, otf)
    }
    /// Multiplies the spectrum of each band of `image` with the OTF at the band wavelength
    ///
    /// The OTFs used are stored in the image, replacing the ones of a previous call.
    pub fn apply_otf(&self, image: &mut SpectralImage, otf: OtfStack<DcOrigin>) -> Result<()> {
        let grid = self.working_grid(image);
        let pitch = image.pitch();
        let otfs = image
            .wavelengths()
            .iter()
            .map(|w| {
                otf.get(*w)
                    .ok_or(OpticsError::MissingWavelength(w.in_nanometers()))
            })
            .collect::<Result<Vec<_>>>()?;
        for o in &otfs {
            if o.size() != grid.size {
                return Err(OpticsError::grid(
                    "kernel size differs from the padded image size",
                    grid.size,
                    o.size(),
                ));
            }
            if (o.spacing() / pitch - 1.).abs() > PITCH_RTOL {
                return Err(OpticsError::grid(
                    "kernel sampling differs from the image pitch",
                    pitch,
                    o.spacing(),
                ));
            }
        }
        log::debug!(
            "applying {} OTF(s) to a {}x{} image on a {}x{} grid ({} padding)",
            otfs.len(),
            grid.height,
            grid.width,
            grid.size,
            grid.size,
            self.pad
        );
        let fft = Fft2::square(grid.size);
        image
            .photons_mut()
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(otfs.par_iter())
            .try_for_each(|(band, otf)| self.convolve(&fft, &grid, band, otf))?;
        let used = otfs.into_iter().cloned().collect();
        image.otf = Some(OtfStack::new(used));
        Ok(())
    }
    fn convolve(
        &self,
        fft: &Fft2,
        grid: &WorkingGrid,
        mut band: ArrayViewMut2<f64>,
        otf: &Otf<DcOrigin>,
    ) -> Result<()> {
        let mut buffer = grid.pad(band.view(), self.pad)?;
        fft.forward(&mut buffer)?;
        Zip::from(&mut buffer)
            .and(otf.data())
            .for_each(|x, o| *x *= *o);
        fft.inverse(&mut buffer)?;
        band.assign(&grid.crop(&buffer)?);
        Ok(())
    }
}
