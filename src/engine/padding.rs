use std::{fmt::Display, str::FromStr};

use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::{OpticsError, Result};

/// Content of the margin added around an image band before the convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadPolicy {
    /// Zeros
    #[default]
    Zero,
    /// Mean of the band border pixels
    Mean,
    /// Nearest edge sample of the squared band
    Replicate,
}
impl FromStr for PadPolicy {
    type Err = OpticsError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Self::Zero),
            "mean" => Ok(Self::Mean),
            "replicate" => Ok(Self::Replicate),
            other => Err(OpticsError::UnsupportedPadPolicy(other.to_string())),
        }
    }
}
impl Display for PadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "zero"),
            Self::Mean => write!(f, "mean"),
            Self::Replicate => write!(f, "replicate"),
        }
    }
}

/// Splits a padding of `delta` samples into `(before, after)`
///
/// An odd padding puts the extra sample after: `(delta/2, delta/2+1)`
pub fn split(delta: usize) -> (usize, usize) {
    let before = delta / 2;
    (before, delta - before)
}

/// Layout of an image band inside the square convolution buffer
///
/// The band is first squared by padding its shorter dimension with zeros, the square is then
/// surrounded by a margin filled according to the [`PadPolicy`].
/// The buffer size is kept even by adding, if needed, one more sample to the trailing margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingGrid {
    pub height: usize,
    pub width: usize,
    /// Size of the squared band
    pub square: usize,
    /// Zero padding `(before, after)` of the rows
    pub row_pad: (usize, usize),
    /// Zero padding `(before, after)` of the columns
    pub col_pad: (usize, usize),
    /// Margin `(before, after)` around the squared band
    pub margin: (usize, usize),
    /// Size of the convolution buffer
    pub size: usize,
}
impl WorkingGrid {
    /// Layout of a `height`x`width` band with a margin of `margin_fraction` times the squared band size
    ///
    /// The margin fraction is clamped to `[0,1]`
    pub fn new(height: usize, width: usize, margin_fraction: f64) -> Self {
        let fraction = if margin_fraction.is_nan() {
            0.
        } else {
            margin_fraction.clamp(0., 1.)
        };
        let square = height.max(width);
        let margin = (square as f64 * fraction).floor() as usize;
        let odd = (square + 2 * margin) % 2;
        Self {
            height,
            width,
            square,
            row_pad: split(square - height),
            col_pad: split(square - width),
            margin: (margin, margin + odd),
            size: square + 2 * margin + odd,
        }
    }
    /// Buffer index of the band first row
    pub fn row_offset(&self) -> usize {
        self.margin.0 + self.row_pad.0
    }
    /// Buffer index of the band first column
    pub fn col_offset(&self) -> usize {
        self.margin.0 + self.col_pad.0
    }
    /// Copies a band into the convolution buffer
    pub fn pad(&self, band: ArrayView2<f64>, policy: PadPolicy) -> Result<Array2<Complex64>> {
        if band.dim() != (self.height, self.width) {
            return Err(OpticsError::grid(
                "band shape differs from the working grid",
                format!("{}x{}", self.height, self.width),
                format!("{}x{}", band.nrows(), band.ncols()),
            ));
        }
        let (r0, c0) = (self.row_pad.0, self.col_pad.0);
        let mut square = Array2::<f64>::zeros((self.square, self.square));
        square
            .slice_mut(s![r0..r0 + self.height, c0..c0 + self.width])
            .assign(&band);
        let m = self.margin.0;
        let buffer = match policy {
            PadPolicy::Replicate => {
                let last = self.square - 1;
                Array2::from_shape_fn((self.size, self.size), |(i, j)| {
                    square[[i.saturating_sub(m).min(last), j.saturating_sub(m).min(last)]]
                })
            }
            PadPolicy::Zero | PadPolicy::Mean => {
                let fill = match policy {
                    PadPolicy::Mean => border_mean(band),
                    _ => 0.,
                };
                let mut buffer = Array2::from_elem((self.size, self.size), fill);
                buffer
                    .slice_mut(s![m..m + self.square, m..m + self.square])
                    .assign(&square);
                buffer
            }
        };
        Ok(buffer.mapv(|x| Complex64::new(x, 0.)))
    }
    /// Extracts the band from the convolution buffer, negative values are set to 0
    pub fn crop(&self, buffer: &Array2<Complex64>) -> Result<Array2<f64>> {
        if buffer.dim() != (self.size, self.size) {
            return Err(OpticsError::grid(
                "buffer shape differs from the working grid",
                format!("{0}x{0}", self.size),
                format!("{}x{}", buffer.nrows(), buffer.ncols()),
            ));
        }
        let (r0, c0) = (self.row_offset(), self.col_offset());
        Ok(buffer
            .slice(s![r0..r0 + self.height, c0..c0 + self.width])
            .mapv(|x| x.re.max(0.)))
    }
}

/// Mean of the pixels on the border of a band
pub fn border_mean(band: ArrayView2<f64>) -> f64 {
    let (height, width) = band.dim();
    let (sum, count) = band
        .indexed_iter()
        .filter(|((i, j), _)| *i == 0 || *j == 0 || *i + 1 == height || *j + 1 == width)
        .fold((0f64, 0usize), |(s, c), (_, x)| (s + x, c + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.
    }
}
