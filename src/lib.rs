//!
//! # Spectral optical image formation
//!
//! The crate blurs a spectral photon image with the point spread functions of an optical system
//! described by its exit pupil wavefront.
//!
//! An optical system is either given directly as a [`WavefrontSpec`] or as one of the
//! [`OpticalModel`]s of [`Optics`].
//! The PSFs are derived on a grid matching the image pitch and size ([`match_sampling`]) and
//! applied band after band to the image by the [`ApplicationEngine`] in the Fourier domain.
//!
//! Elements are created using the builder associated to each element:
//! ```rust
//! use oiwvf::{units::LengthUnits, Builder, FromBuilder, Optics, SpectralImage};
//! let optics = Optics::builder().build().unwrap();
//! let mut image = SpectralImage::from_fn(
//!     64,
//!     48,
//!     vec![450f64.nm(), 550f64.nm(), 650f64.nm()],
//!     2f64.um(),
//!     |i, j, _| if (i / 8 + j / 8) % 2 == 0 { 1e3 } else { 0. },
//! )
//! .unwrap();
//! optics.compute(&mut image).unwrap();
//! println!("photons: {:.0}", image.total_photons());
//! ```

pub mod aperture;
pub mod builders;
pub mod diffraction;
pub mod engine;
pub mod error;
pub mod fft2;
pub mod image;
pub mod optics;
pub mod otf;
pub mod psf;
pub mod sampling;
pub mod units;
pub mod wavefront;
pub mod zernike;

#[doc(inline)]
pub use self::engine::{ApplicationEngine, PadPolicy};
#[doc(inline)]
pub use self::error::{ConfigError, OpticsError};
#[doc(inline)]
pub use self::image::SpectralImage;
#[doc(inline)]
pub use self::optics::{OpticalModel, Optics};
#[doc(inline)]
pub use self::otf::{CustomOtf, DcCentered, DcOrigin, Otf, OtfStack};
#[doc(inline)]
pub use self::psf::{Kernel, PsfStack};
#[doc(inline)]
pub use self::sampling::match_sampling;
#[doc(inline)]
pub use self::units::PhysicalLength;
#[doc(inline)]
pub use self::wavefront::WavefrontSpec;

pub type Result<T> = std::result::Result<T, OpticsError>;

/// Element builder trait
pub trait Builder: Default {
    type Component;
    fn new() -> Self {
        Default::default()
    }
    fn build(self) -> Result<Self::Component>;
}
/// Access to the builder of an element
pub trait FromBuilder: Sized {
    type ComponentBuilder: Builder<Component = Self>;
    fn builder() -> Self::ComponentBuilder {
        Self::ComponentBuilder::default()
    }
}

pub mod prelude {
    pub use super::{
        units::LengthUnits, ApplicationEngine, Builder, FromBuilder, OpticalModel, Optics,
        PadPolicy, PhysicalLength, PsfStack, SpectralImage, WavefrontSpec,
    };
}
