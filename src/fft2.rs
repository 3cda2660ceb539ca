//! 2D Fourier transforms of [`Array2`]s
//!
//! The forward transform is un-normalized, the inverse transform is scaled by `1/(rows*cols)`
//! so that `inverse(forward(x)) == x`.
//! Both transforms leave the zero frequency at index `[0,0]`, use [`fftshift`] and [`ifftshift`]
//! to move it to or from the array center at `[rows/2,cols/2]`.

use std::sync::Arc;

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::{OpticsError, Result};

/// Planned 2D FFT for a given array shape
pub struct Fft2 {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}
impl Fft2 {
    /// Plans the transforms of a `rows`x`cols` array
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            rows,
            cols,
            row_forward: planner.plan_fft_forward(cols),
            row_inverse: planner.plan_fft_inverse(cols),
            col_forward: planner.plan_fft_forward(rows),
            col_inverse: planner.plan_fft_inverse(rows),
        }
    }
    /// Plans the transforms of a square `n`x`n` array
    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }
    /// `(rows, cols)` of the planned transforms
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    /// In-place forward transform
    pub fn forward(&self, data: &mut Array2<Complex64>) -> Result<()> {
        self.process(data, &self.row_forward, &self.col_forward)
    }
    /// In-place normalized inverse transform
    pub fn inverse(&self, data: &mut Array2<Complex64>) -> Result<()> {
        self.process(data, &self.row_inverse, &self.col_inverse)?;
        let scale = 1. / (self.rows * self.cols) as f64;
        data.mapv_inplace(|x| x * scale);
        Ok(())
    }
    fn process(
        &self,
        data: &mut Array2<Complex64>,
        rows: &Arc<dyn Fft<f64>>,
        cols: &Arc<dyn Fft<f64>>,
    ) -> Result<()> {
        if data.dim() != self.shape() {
            return Err(OpticsError::grid(
                "FFT buffer shape differs from the planned shape",
                format!("{:?}", self.shape()),
                format!("{:?}", data.dim()),
            ));
        }
        transform_lanes(data, Axis(1), rows);
        transform_lanes(data, Axis(0), cols);
        Ok(())
    }
}

// 1D transforms of all the lanes of `data` along `axis`
fn transform_lanes(data: &mut Array2<Complex64>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let mut buffer = vec![Complex64::default(); data.len_of(axis)];
    let mut scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];
    for mut lane in data.lanes_mut(axis) {
        buffer.iter_mut().zip(lane.iter()).for_each(|(b, x)| *b = *x);
        fft.process_with_scratch(&mut buffer, &mut scratch);
        lane.iter_mut().zip(&buffer).for_each(|(x, b)| *x = *b);
    }
}

// circular shift moving the sample [0,0] to [di,dj]
fn roll<S, T>(data: &ArrayBase<S, Ix2>, di: usize, dj: usize) -> Array2<T>
where
    S: Data<Elem = T>,
    T: Copy,
{
    let (rows, cols) = data.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[[(i + rows - di) % rows, (j + cols - dj) % cols]]
    })
}

/// Moves the `[0,0]` sample to `[rows/2,cols/2]`
pub fn fftshift<S, T>(data: &ArrayBase<S, Ix2>) -> Array2<T>
where
    S: Data<Elem = T>,
    T: Copy,
{
    let (rows, cols) = data.dim();
    roll(data, rows / 2, cols / 2)
}

/// Moves the `[rows/2,cols/2]` sample to `[0,0]`, inverse of [`fftshift`] for both even and odd sizes
pub fn ifftshift<S, T>(data: &ArrayBase<S, Ix2>) -> Array2<T>
where
    S: Data<Elem = T>,
    T: Copy,
{
    let (rows, cols) = data.dim();
    roll(data, rows - rows / 2, cols - cols / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_inverse() {
        let (rows, cols) = (6, 10);
        let x = Array2::from_shape_fn((rows, cols), |(i, j)| {
            let k = (i * cols + j) as f64;
            Complex64::new(k.sin(), (k * 0.3).cos())
        });
        let fft = Fft2::new(rows, cols);
        let mut y = x.clone();
        fft.forward(&mut y).unwrap();
        fft.inverse(&mut y).unwrap();
        x.iter()
            .zip(&y)
            .for_each(|(x, y)| assert!((x - y).norm() < 1e-12));
    }

    #[test]
    fn delta_spectrum() {
        let n = 8;
        let mut x = Array2::<Complex64>::zeros((n, n));
        x[[0, 0]] = Complex64::new(1., 0.);
        Fft2::square(n).forward(&mut x).unwrap();
        x.iter().for_each(|x| assert!((*x - 1.).norm() < 1e-12));
    }

    #[test]
    fn shape_mismatch() {
        let mut x = Array2::<Complex64>::zeros((8, 6));
        assert!(matches!(
            Fft2::square(8).forward(&mut x),
            Err(OpticsError::IncompatibleGrid { .. })
        ));
    }

    #[test]
    fn shifts() {
        for (rows, cols) in [(4, 4), (5, 7), (6, 3)] {
            let x = Array2::from_shape_fn((rows, cols), |(i, j)| i * cols + j);
            let s = fftshift(&x);
            assert_eq!(s[[rows / 2, cols / 2]], 0);
            assert_eq!(ifftshift(&s), x);
        }
    }
}
