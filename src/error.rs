use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OpticsError {
    #[error("invalid optics specification: {0}")]
    InvalidOpticsSpec(String),
    #[error("incompatible grid: {reason} (expected {expected}, found {found})")]
    IncompatibleGrid {
        reason: &'static str,
        expected: String,
        found: String,
    },
    #[error("no PSF kernel for the {0}nm image band")]
    MissingWavelength(f64),
    #[error("unsupported optical model `{0}`, expected skip, diffraction-limited, shift-invariant or human")]
    UnsupportedModel(String),
    #[error("unsupported padding policy `{0}`, expected zero, mean or replicate")]
    UnsupportedPadPolicy(String),
    #[error("invalid spectral image: {0}")]
    InvalidImage(String),
    #[error("Zernike fit of the wavefront map failed: {0}")]
    ZernikeFit(&'static str),
    #[error("diffraction reference root search failed: {0}")]
    RootSearch(String),
}

impl OpticsError {
    pub(crate) fn grid(
        reason: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::IncompatibleGrid {
            reason,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Errors of the TOML builder files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot open builder toml file: {1}")]
    Open(#[source] std::io::Error, PathBuf),
    #[error("cannot create builder toml file: {1}")]
    Create(#[source] std::io::Error, PathBuf),
    #[error("cannot read builder toml file: {1}")]
    Read(#[source] std::io::Error, PathBuf),
    #[error("cannot write builder toml file: {1}")]
    Write(#[source] std::io::Error, PathBuf),
    #[error("cannot deserialize builder from toml")]
    Load(#[from] toml::de::Error),
    #[error("cannot serialize builder into toml")]
    Save(#[from] toml::ser::Error),
}
