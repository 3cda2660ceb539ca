use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    engine::{PadPolicy, MARGIN_FRACTION},
    optics::OpticalModel,
    ApplicationEngine, Builder, ConfigError, Optics, Result,
};

/// `Optics` builder
///
/// Default properties:
///  - model           : diffraction limited f/4 with a 3.9mm focal length
///  - padding         : zero
///  - margin fraction : 0.125
///  - oversampling    : true
///
/// # Examples
///
/// ```
/// use oiwvf::{optics::ModelKind, Builder, FromBuilder, Optics, PadPolicy};
/// let optics = Optics::builder()
///     .model("human".parse::<ModelKind>().unwrap().into())
///     .pad(PadPolicy::Mean)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticsBuilder {
    pub model: OpticalModel,
    pub pad: PadPolicy,
    pub margin_fraction: f64,
    pub oversample: bool,
}
impl Default for OpticsBuilder {
    fn default() -> Self {
        Self {
            model: OpticalModel::default(),
            pad: PadPolicy::Zero,
            margin_fraction: MARGIN_FRACTION,
            oversample: true,
        }
    }
}
impl OpticsBuilder {
    /// Load the builder from a toml file
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        super::load_toml(path)
    }
    /// Save the builder into a toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigError> {
        super::save_toml(self, "OpticsBuilder", path)
    }
    /// Set the optical model
    pub fn model(self, model: OpticalModel) -> Self {
        Self { model, ..self }
    }
    /// Set the image padding policy
    pub fn pad(self, pad: PadPolicy) -> Self {
        Self { pad, ..self }
    }
    /// Set the image margin as a fraction of the image size
    pub fn margin_fraction(self, margin_fraction: f64) -> Self {
        Self {
            margin_fraction,
            ..self
        }
    }
    /// Enable or disable the PSF oversampling when the pupil does not fit the pupil plane field
    pub fn oversample(self, oversample: bool) -> Self {
        Self { oversample, ..self }
    }
}
impl Builder for OpticsBuilder {
    type Component = Optics;
    /// Build the `Optics`
    fn build(self) -> Result<Optics> {
        Ok(Optics {
            model: self.model,
            engine: ApplicationEngine::new(self.pad).margin_fraction(self.margin_fraction)?,
            oversample: self.oversample,
        })
    }
}
