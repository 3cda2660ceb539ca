use ndarray::{Array3, ArrayView2, ArrayViewMut3, Axis};

use crate::{
    otf::{DcOrigin, OtfStack},
    units::PhysicalLength,
    OpticsError, Result,
};

/// Spectral photon image
///
/// A `n_wavelength`x`height`x`width` array of photon counts, each band a `height`x`width` array.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralImage {
    wavelengths: Vec<PhysicalLength>,
    pitch: PhysicalLength,
    photons: Array3<f64>,
    pub(crate) otf: Option<OtfStack<DcOrigin>>,
}
impl SpectralImage {
    /// Creates a new image from a `n_wavelength`x`height`x`width` photon array
    pub fn from_array(
        wavelengths: Vec<PhysicalLength>,
        pitch: PhysicalLength,
        photons: Array3<f64>,
    ) -> Result<Self> {
        let (n_band, height, width) = photons.dim();
        if height == 0 || width == 0 || n_band == 0 {
            return Err(OpticsError::InvalidImage(format!(
                "empty {}x{}x{} image",
                height, width, n_band
            )));
        }
        if n_band != wavelengths.len() {
            return Err(OpticsError::InvalidImage(format!(
                "{} bands for {} wavelengths",
                n_band,
                wavelengths.len()
            )));
        }
        if !pitch.is_positive() {
            return Err(OpticsError::InvalidImage(format!("pitch {} <= 0", pitch)));
        }
        if let Some(w) = wavelengths.iter().find(|w| !w.is_positive()) {
            return Err(OpticsError::InvalidImage(format!("wavelength {} <= 0", w)));
        }
        if photons.iter().any(|p| !p.is_finite() || *p < 0.) {
            return Err(OpticsError::InvalidImage(
                "photon counts must be finite and non-negative".into(),
            ));
        }
        Ok(Self {
            wavelengths,
            pitch,
            photons,
            otf: None,
        })
    }
    /// Creates a new image from the photons stored band after band, each band in row-major order
    pub fn new(
        height: usize,
        width: usize,
        wavelengths: Vec<PhysicalLength>,
        pitch: PhysicalLength,
        photons: Vec<f64>,
    ) -> Result<Self> {
        let n = photons.len();
        let photons = Array3::from_shape_vec((wavelengths.len(), height, width), photons)
            .map_err(|_| {
                OpticsError::InvalidImage(format!(
                    "{} photon samples do not fit a {}x{}x{} image",
                    n,
                    height,
                    width,
                    wavelengths.len()
                ))
            })?;
        Self::from_array(wavelengths, pitch, photons)
    }
    /// Creates a new image with photons given by `f(row, col, band)`
    pub fn from_fn<F>(
        height: usize,
        width: usize,
        wavelengths: Vec<PhysicalLength>,
        pitch: PhysicalLength,
        f: F,
    ) -> Result<Self>
    where
        F: Fn(usize, usize, usize) -> f64,
    {
        let photons = Array3::from_shape_fn((wavelengths.len(), height, width), |(k, i, j)| {
            f(i, j, k)
        });
        Self::from_array(wavelengths, pitch, photons)
    }
    /// Creates a new image with the same photon count everywhere
    pub fn uniform(
        height: usize,
        width: usize,
        wavelengths: Vec<PhysicalLength>,
        pitch: PhysicalLength,
        photons: f64,
    ) -> Result<Self> {
        Self::from_fn(height, width, wavelengths, pitch, |_, _, _| photons)
    }
    /// `(height, width, n_wavelength)`
    pub fn shape(&self) -> (usize, usize, usize) {
        let (n_band, height, width) = self.photons.dim();
        (height, width, n_band)
    }
    pub fn height(&self) -> usize {
        self.photons.dim().1
    }
    pub fn width(&self) -> usize {
        self.photons.dim().2
    }
    pub fn wavelengths(&self) -> &[PhysicalLength] {
        &self.wavelengths
    }
    /// Sample spacing
    pub fn pitch(&self) -> PhysicalLength {
        self.pitch
    }
    /// Photon cube, indexed by `[band, row, col]`
    pub fn photons(&self) -> &Array3<f64> {
        &self.photons
    }
    pub(crate) fn photons_mut(&mut self) -> ArrayViewMut3<'_, f64> {
        self.photons.view_mut()
    }
    /// Photons of band `k`
    pub fn band(&self, k: usize) -> ArrayView2<'_, f64> {
        self.photons.index_axis(Axis(0), k)
    }
    /// Photon count at `(row, col)` in band `k`
    pub fn pixel(&self, row: usize, col: usize, k: usize) -> f64 {
        self.photons[[k, row, col]]
    }
    /// Total photon count
    pub fn total_photons(&self) -> f64 {
        self.photons.sum()
    }
    /// Photon count of band `k`
    pub fn band_photons(&self, k: usize) -> f64 {
        self.band(k).sum()
    }
    /// Transfer functions applied by the last optics, if any
    pub fn otf(&self) -> Option<&OtfStack<DcOrigin>> {
        self.otf.as_ref()
    }
    /// Removes the transfer functions of the last optics
    pub fn clear_otf(&mut self) {
        self.otf = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::LengthUnits;

    #[test]
    fn layout() {
        let image = SpectralImage::from_fn(
            3,
            4,
            vec![450f64.nm(), 550f64.nm()],
            2f64.um(),
            |i, j, k| (100 * k + 10 * i + j) as f64,
        )
        .unwrap();
        assert_eq!(image.shape(), (3, 4, 2));
        assert_eq!(image.pixel(2, 3, 1), 123.);
        assert_eq!(image.band(0)[[1, 1]], 11.);
        let expected: f64 = (0..3)
            .flat_map(|i| (0..4).map(move |j| (10 * i + j) as f64))
            .sum();
        assert_eq!(image.band_photons(0), expected);
        let flat: Vec<f64> = image.photons().iter().copied().collect();
        let same =
            SpectralImage::new(3, 4, image.wavelengths().to_vec(), 2f64.um(), flat).unwrap();
        assert_eq!(same, image);
    }

    #[test]
    fn invalid_images() {
        let w = vec![550f64.nm()];
        assert!(SpectralImage::new(2, 2, w.clone(), 1f64.um(), vec![0.; 3]).is_err());
        assert!(SpectralImage::new(2, 2, w.clone(), 0f64.um(), vec![0.; 4]).is_err());
        assert!(SpectralImage::new(2, 2, w.clone(), 1f64.um(), vec![-1.; 4]).is_err());
        assert!(SpectralImage::new(2, 2, vec![], 1f64.um(), vec![]).is_err());
        assert!(SpectralImage::uniform(2, 2, w, 1f64.um(), 1.).is_ok());
    }
}
