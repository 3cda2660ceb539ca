use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    aperture::ApertureMask,
    units::PhysicalLength,
    wavefront::{ChromaticDefocus, PupilMap},
    Builder, ConfigError, Result, WavefrontSpec,
};

/// `WavefrontSpec` builder
///
/// Default properties:
///  - pupil diameter       : 3mm
///  - focal length         : 17mm
///  - wavelengths          : [550nm]
///  - reference wavelength : 550nm
///  - Zernike coefficients : none
///  - pupil plane field    : 16mm
///  - spatial samples      : 256
///
/// # Examples
///
/// - diffraction limited human eye model with a 3mm pupil
///
/// ```
/// use oiwvf::{Builder, FromBuilder, WavefrontSpec};
/// let spec = WavefrontSpec::builder().build().unwrap();
/// assert_eq!(spec.spatial_samples(), 256);
/// ```
///
/// - 0.1 micron of astigmatism with a 4mm pupil
///
/// ```
/// use oiwvf::{units::LengthUnits, Builder, FromBuilder, WavefrontSpec};
/// let spec = WavefrontSpec::builder()
///     .pupil_diameter(4f64.mm())
///     .zernike(vec![0., 0., 0., 0.1])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavefrontSpecBuilder {
    pub pupil_diameter: PhysicalLength,
    pub focal_length: PhysicalLength,
    pub wavelengths: Vec<PhysicalLength>,
    pub reference_wavelength: PhysicalLength,
    /// Zernike coefficients \[micron\] in the OSA/ANSI order
    #[serde(default)]
    pub zernike: Vec<f64>,
    pub pupil_map: Option<PupilMap>,
    pub chromatic_defocus: Option<ChromaticDefocus>,
    pub aperture: Option<ApertureMask>,
    pub field_size: PhysicalLength,
    pub spatial_samples: usize,
}
impl Default for WavefrontSpecBuilder {
    fn default() -> Self {
        Self {
            pupil_diameter: PhysicalLength::millimeters(3.),
            focal_length: PhysicalLength::millimeters(17.),
            wavelengths: vec![PhysicalLength::nanometers(550.)],
            reference_wavelength: PhysicalLength::nanometers(550.),
            zernike: vec![],
            pupil_map: None,
            chromatic_defocus: None,
            aperture: None,
            field_size: PhysicalLength::millimeters(16.),
            spatial_samples: 256,
        }
    }
}
impl WavefrontSpecBuilder {
    /// Load the builder from a toml file
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        super::load_toml(path)
    }
    /// Save the builder into a toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigError> {
        super::save_toml(self, "WavefrontSpecBuilder", path)
    }
    /// Set the exit pupil diameter
    pub fn pupil_diameter(self, pupil_diameter: PhysicalLength) -> Self {
        Self {
            pupil_diameter,
            ..self
        }
    }
    /// Set the focal length
    pub fn focal_length(self, focal_length: PhysicalLength) -> Self {
        Self {
            focal_length,
            ..self
        }
    }
    /// Set the wavelengths
    pub fn wavelengths(self, wavelengths: Vec<PhysicalLength>) -> Self {
        Self {
            wavelengths,
            ..self
        }
    }
    /// Set the wavelength the pupil plane field size is given at
    pub fn reference_wavelength(self, reference_wavelength: PhysicalLength) -> Self {
        Self {
            reference_wavelength,
            ..self
        }
    }
    /// Set the Zernike coefficients \[micron\]
    pub fn zernike(self, zernike: Vec<f64>) -> Self {
        Self { zernike, ..self }
    }
    /// Set custom pupil amplitude and phase maps
    pub fn pupil_map(self, pupil_map: PupilMap) -> Self {
        Self {
            pupil_map: Some(pupil_map),
            ..self
        }
    }
    /// Set the wavelength dependent defocus
    pub fn chromatic_defocus(self, chromatic_defocus: ChromaticDefocus) -> Self {
        Self {
            chromatic_defocus: Some(chromatic_defocus),
            ..self
        }
    }
    /// Set the pupil amplitude mask
    pub fn aperture(self, aperture: ApertureMask) -> Self {
        Self {
            aperture: Some(aperture),
            ..self
        }
    }
    /// Set the pupil plane field size at the reference wavelength and its number of samples
    pub fn sampling(self, field_size: PhysicalLength, spatial_samples: usize) -> Self {
        Self {
            field_size,
            spatial_samples,
            ..self
        }
    }
}
impl Builder for WavefrontSpecBuilder {
    type Component = WavefrontSpec;
    /// Build the `WavefrontSpec`
    fn build(self) -> Result<WavefrontSpec> {
        let spec = WavefrontSpec {
            pupil_diameter: self.pupil_diameter,
            focal_length: self.focal_length,
            wavelengths: self.wavelengths,
            reference_wavelength: self.reference_wavelength,
            zernike: self.zernike,
            pupil_map: self.pupil_map,
            chromatic_defocus: self.chromatic_defocus,
            aperture: self.aperture,
            field_size: self.field_size,
            spatial_samples: self.spatial_samples,
        };
        spec.validate()?;
        Ok(spec)
    }
}
impl From<&WavefrontSpec> for WavefrontSpecBuilder {
    fn from(spec: &WavefrontSpec) -> Self {
        Self {
            pupil_diameter: spec.pupil_diameter,
            focal_length: spec.focal_length,
            wavelengths: spec.wavelengths.clone(),
            reference_wavelength: spec.reference_wavelength,
            zernike: spec.zernike.clone(),
            pupil_map: spec.pupil_map.clone(),
            chromatic_defocus: spec.chromatic_defocus.clone(),
            aperture: spec.aperture.clone(),
            field_size: spec.field_size,
            spatial_samples: spec.spatial_samples,
        }
    }
}
