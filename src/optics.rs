//!
//! # Optical models
//!
//! [`Optics`] forms the optical image of a [`SpectralImage`] according to one of the [`OpticalModel`]s:
//!  - [`OpticalModel::Skip`]: the image is left untouched,
//!  - [`OpticalModel::DiffractionLimited`]: aberration free circular pupil,
//!  - [`OpticalModel::ShiftInvariant`]: any [`WavefrontSpec`], possibly with custom pupil maps,
//!    or OTFs given with their own sampling ([`CustomOtf`]),
//!  - [`OpticalModel::Human`]: human eye with its longitudinal chromatic aberration.
//!
//! Except for [`OpticalModel::Skip`] and custom OTFs, the model is turned into a [`WavefrontSpec`]
//! at the image wavelengths and the PSFs are sampled at the image pitch on the padded image grid.
//! Custom OTFs are interpolated onto the frequency grid of the padded image.
//! The [`ApplicationEngine`] then multiplies the spectrum of each image band with its OTF.
//!
//! ```
//! use oiwvf::{units::LengthUnits, Builder, FromBuilder, Optics, SpectralImage};
//! let optics = Optics::builder().build().unwrap();
//! let mut image = SpectralImage::uniform(32, 32, vec![550f64.nm()], 2f64.um(), 1.).unwrap();
//! optics.compute(&mut image).unwrap();
//! assert!(image.otf().is_some());
//! ```

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    builders::{OpticsBuilder, WavefrontSpecBuilder},
    otf::{CustomOtf, DcOrigin, OtfStack},
    sampling::{decimate_stack, match_sampling, oversampling_factor},
    units::PhysicalLength,
    wavefront::ChromaticDefocus,
    ApplicationEngine, Builder, FromBuilder, OpticsError, PsfStack, Result, SpectralImage,
    WavefrontSpec,
};

/// Human eye optics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanEye {
    pub pupil_diameter: PhysicalLength,
    pub focal_length: PhysicalLength,
    /// Wavelength in focus
    pub focus_wavelength: PhysicalLength,
    /// Zernike coefficients \[micron\] of the eye aberrations at the focus wavelength
    #[serde(default)]
    pub zernike: Vec<f64>,
}
impl Default for HumanEye {
    fn default() -> Self {
        Self {
            pupil_diameter: PhysicalLength::millimeters(3.),
            focal_length: PhysicalLength::millimeters(17.),
            focus_wavelength: PhysicalLength::nanometers(550.),
            zernike: vec![],
        }
    }
}

/// Optical image formation models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum OpticalModel {
    /// No optics
    Skip,
    /// Aberration free circular pupil
    DiffractionLimited {
        f_number: f64,
        focal_length: PhysicalLength,
    },
    /// Shift invariant optics given by its wavefront or by its OTFs
    ///
    /// With `fit_modes`, the custom phase map of the wavefront is replaced by its Zernike fit.
    /// With `otf`, the optics is given by these OTFs and the wavefront is not used.
    ShiftInvariant {
        #[serde(default)]
        wavefront: WavefrontSpecBuilder,
        #[serde(default)]
        fit_modes: Option<usize>,
        #[serde(default)]
        otf: Option<CustomOtf>,
    },
    /// Human eye
    Human(HumanEye),
}
impl Default for OpticalModel {
    fn default() -> Self {
        Self::DiffractionLimited {
            f_number: 4.,
            focal_length: PhysicalLength::millimeters(3.9),
        }
    }
}
impl OpticalModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Skip => ModelKind::Skip,
            Self::DiffractionLimited { .. } => ModelKind::DiffractionLimited,
            Self::ShiftInvariant { .. } => ModelKind::ShiftInvariant,
            Self::Human(_) => ModelKind::Human,
        }
    }
    /// OTFs of a shift invariant optics given by its OTFs
    pub fn custom_otf(&self) -> Option<&CustomOtf> {
        match self {
            Self::ShiftInvariant { otf, .. } => otf.as_ref(),
            _ => None,
        }
    }
    /// Wavefront of the optics at `wavelengths`
    ///
    /// `None` for [`OpticalModel::Skip`] and for a shift invariant optics given by its OTFs
    pub fn wavefront(&self, wavelengths: &[PhysicalLength]) -> Result<Option<WavefrontSpec>> {
        let reference = wavelengths
            .first()
            .copied()
            .ok_or_else(|| OpticsError::InvalidOpticsSpec("no wavelength".into()))?;
        let spec = match self {
            Self::Skip => return Ok(None),
            Self::DiffractionLimited {
                f_number,
                focal_length,
            } => {
                if f_number.is_nan() || *f_number <= 0. {
                    return Err(OpticsError::InvalidOpticsSpec(format!(
                        "f-number {f_number} <= 0"
                    )));
                }
                WavefrontSpec::builder()
                    .pupil_diameter(*focal_length / *f_number)
                    .focal_length(*focal_length)
                    .reference_wavelength(reference)
                    .wavelengths(wavelengths.to_vec())
                    .build()?
            }
            Self::ShiftInvariant { otf: Some(_), .. } => return Ok(None),
            Self::ShiftInvariant {
                wavefront,
                fit_modes,
                ..
            } => {
                let spec = wavefront
                    .clone()
                    .wavelengths(wavelengths.to_vec())
                    .build()?;
                match fit_modes {
                    Some(n_mode) => spec.with_equivalent_wavefront(*n_mode)?,
                    None => spec,
                }
            }
            Self::Human(eye) => WavefrontSpec::builder()
                .pupil_diameter(eye.pupil_diameter)
                .focal_length(eye.focal_length)
                .zernike(eye.zernike.clone())
                .chromatic_defocus(ChromaticDefocus::HumanLca {
                    focus_wavelength: eye.focus_wavelength,
                })
                .reference_wavelength(reference)
                .wavelengths(wavelengths.to_vec())
                .build()?,
        };
        Ok(Some(spec))
    }
}

/// Names of the optical models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Skip,
    DiffractionLimited,
    ShiftInvariant,
    Human,
}
impl FromStr for ModelKind {
    type Err = OpticsError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "diffraction-limited" => Ok(Self::DiffractionLimited),
            "shift-invariant" => Ok(Self::ShiftInvariant),
            "human" => Ok(Self::Human),
            other => Err(OpticsError::UnsupportedModel(other.to_string())),
        }
    }
}
impl Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::DiffractionLimited => write!(f, "diffraction-limited"),
            Self::ShiftInvariant => write!(f, "shift-invariant"),
            Self::Human => write!(f, "human"),
        }
    }
}
impl From<ModelKind> for OpticalModel {
    /// Default model of each kind
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Skip => Self::Skip,
            ModelKind::DiffractionLimited => Self::default(),
            ModelKind::ShiftInvariant => Self::ShiftInvariant {
                wavefront: WavefrontSpecBuilder::default(),
                fit_modes: None,
                otf: None,
            },
            ModelKind::Human => Self::Human(HumanEye::default()),
        }
    }
}

/// Optical image formation
#[derive(Debug, Clone, PartialEq)]
pub struct Optics {
    pub(crate) model: OpticalModel,
    pub(crate) engine: ApplicationEngine,
    pub(crate) oversample: bool,
}
impl FromBuilder for Optics {
    type ComponentBuilder = OpticsBuilder;
}
impl Optics {
    pub fn model(&self) -> &OpticalModel {
        &self.model
    }
    pub fn engine(&self) -> &ApplicationEngine {
        &self.engine
    }
    /// PSFs of the optics sampled for `image`, `None` for [`OpticalModel::Skip`]
    ///
    /// The PSFs are sampled at the image pitch on the padded image grid.
    /// If oversampling is enabled and the pupil does not fit in the pupil plane field at the
    /// image pitch, the PSFs are computed on a finer grid and decimated back to the image pitch.
    /// For custom OTFs, the PSFs are the inverse transforms of the resampled OTFs.
    pub fn psf(&self, image: &SpectralImage) -> Result<Option<PsfStack>> {
        if self.model.custom_otf().is_some() {
            return self
                .otf(image)?
                .map(|otf| -> Result<PsfStack> {
                    PsfStack::new(otf.iter().map(|o| o.kernel()).collect::<Result<Vec<_>>>()?)
                })
                .transpose();
        }
        let Some(spec) = self.model.wavefront(image.wavelengths())? else {
            return Ok(None);
        };
        let grid = self.engine.working_grid(image);
        let pitch = image.pitch();
        let k = if self.oversample {
            oversampling_factor(&spec, pitch)
        } else {
            1
        };
        if k > 1 {
            log::debug!("PSF oversampled {k} times at {pitch} pitch");
        }
        let matched = match_sampling(
            &spec,
            pitch / k as f64,
            grid.size * k,
            spec.reference_wavelength(),
        )?;
        let psf = matched.compute_psf(None)?;
        Ok(Some(if k > 1 {
            decimate_stack(&psf, k)?
        } else {
            psf
        }))
    }
    /// OTFs of the optics sampled for `image`, `None` for [`OpticalModel::Skip`]
    ///
    /// Custom OTFs are interpolated onto the frequency grid of the padded image and, between
    /// their stored wavelengths, linearly in wavelength.
    pub fn otf(&self, image: &SpectralImage) -> Result<Option<OtfStack<DcOrigin>>> {
        if let Some(custom) = self.model.custom_otf() {
            let grid = self.engine.working_grid(image);
            log::debug!(
                "resampling {} custom OTF(s) of {}x{} samples at {} onto {}x{} samples at {}",
                custom.bands.len(),
                custom.size,
                custom.size,
                custom.spacing,
                grid.size,
                grid.size,
                image.pitch()
            );
            return custom
                .stack()?
                .resample(image.wavelengths(), image.pitch(), grid.size)
                .map(Some);
        }
        self.psf(image)?.map(|psf| psf.otf()).transpose()
    }
    /// Forms the optical image of `image` in place
    ///
    /// The OTFs that have been applied are stored in the image, see [`SpectralImage::otf`]
    pub fn compute(&self, image: &mut SpectralImage) -> Result<()> {
        let (height, width, n_band) = image.shape();
        log::info!(
            "{} optics on a {}x{}x{} image",
            self.model.kind(),
            height,
            width,
            n_band
        );
        match self.otf(image)? {
            Some(otf) => self.engine.apply_otf(image, otf),
            None => {
                image.clear_otf();
                Ok(())
            }
        }
    }
}
