use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{OpticsError, Result};

/// Circular obscuration of the pupil, e.g. a dust particle
///
/// Center and radius are given in units of the pupil radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obscuration {
    pub center: (f64, f64),
    pub radius: f64,
    /// Amplitude transmission inside the obscuration
    pub transmission: f64,
}

/// Pupil amplitude mask
///
/// The mask multiplies the uniform disk of the pupil, it describes the shape of the diaphragm
/// (regular polygon with `n_blade` sides), a central obscuration and obscurations on the optics
/// surfaces (dust, scratches).
/// All coordinates are normalized to the pupil radius.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApertureMask {
    pub n_blade: Option<usize>,
    /// Rotation of the diaphragm \[rd\]
    pub blade_rotation: f64,
    /// Central obscuration as a fraction of the pupil radius
    pub central_obscuration: f64,
    pub obscurations: Vec<Obscuration>,
}
impl ApertureMask {
    pub fn new() -> Self {
        Default::default()
    }
    /// Polygonal diaphragm with `n_blade` sides inscribed in the pupil
    pub fn polygon(self, n_blade: usize, rotation: f64) -> Self {
        Self {
            n_blade: Some(n_blade),
            blade_rotation: rotation,
            ..self
        }
    }
    /// Central obscuration as a fraction of the pupil radius
    pub fn central_obscuration(self, central_obscuration: f64) -> Self {
        Self {
            central_obscuration,
            ..self
        }
    }
    /// Adds an obscuration
    pub fn obscuration(mut self, center: (f64, f64), radius: f64, transmission: f64) -> Self {
        self.obscurations.push(Obscuration {
            center,
            radius,
            transmission,
        });
        self
    }
    /// Adds `n` opaque dust particles with radius uniformly drawn within `[radius.0, radius.1]`
    pub fn random_dust(mut self, n: usize, radius: (f64, f64), seed: u64) -> Result<Self> {
        let (lo, hi) = radius;
        if !(lo.is_finite() && hi.is_finite() && 0. <= lo && lo <= hi) {
            return Err(OpticsError::InvalidOpticsSpec(format!(
                "dust radius range [{lo},{hi}] must be finite, non-negative and ordered"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..n {
            let r = rng.gen_range(0f64..1f64).sqrt();
            let o = rng.gen_range(0f64..2. * PI);
            self.obscurations.push(Obscuration {
                center: (r * o.cos(), r * o.sin()),
                radius: rng.gen_range(lo..=hi),
                transmission: 0.,
            });
        }
        Ok(self)
    }
    /// Amplitude transmission at the normalized pupil coordinates `(x,y)`
    pub fn transmission(&self, x: f64, y: f64) -> f64 {
        let rho = x.hypot(y);
        if rho < self.central_obscuration {
            return 0.;
        }
        if let Some(n) = self.n_blade.filter(|n| *n > 2) {
            // distance to the polygon edge along the direction of (x,y)
            let sector = 2. * PI / n as f64;
            let o = (y.atan2(x) - self.blade_rotation).rem_euclid(sector) - sector / 2.;
            if rho * o.cos() > (sector / 2.).cos() {
                return 0.;
            }
        }
        self.obscurations
            .iter()
            .filter(|o| (x - o.center.0).hypot(y - o.center.1) <= o.radius)
            .fold(1., |t, o| t * o.transmission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_aperture() {
        let mask = ApertureMask::new();
        assert_eq!(mask.transmission(0.3, -0.9), 1.);
    }

    #[test]
    fn hexagon() {
        let mask = ApertureMask::new().polygon(6, 0.);
        // vertices at 0,60,...degrees, edge midpoints at 30,90,...degrees
        assert_eq!(mask.transmission(0.99, 0.), 1.);
        let mid = 30f64.to_radians();
        assert_eq!(mask.transmission(0.9 * mid.cos(), 0.9 * mid.sin()), 0.);
        assert_eq!(mask.transmission(0.85 * mid.cos(), 0.85 * mid.sin()), 1.);
    }

    #[test]
    fn obscurations() {
        let mask = ApertureMask::new()
            .central_obscuration(0.2)
            .obscuration((0.5, 0.5), 0.1, 0.5);
        assert_eq!(mask.transmission(0.1, 0.), 0.);
        assert_eq!(mask.transmission(0.52, 0.5), 0.5);
        let dusty = ApertureMask::new().random_dust(10, (0.01, 0.05), 7).unwrap();
        assert_eq!(dusty.obscurations.len(), 10);
        assert_eq!(
            dusty,
            ApertureMask::new().random_dust(10, (0.01, 0.05), 7).unwrap()
        );
    }

    #[test]
    fn dust_radius_range() {
        let fixed = ApertureMask::new().random_dust(5, (0.02, 0.02), 1).unwrap();
        assert!(fixed.obscurations.iter().all(|o| o.radius == 0.02));
        for radius in [(0.05, 0.01), (-0.01, 0.01), (0.01, f64::NAN), (0., f64::INFINITY)] {
            assert!(matches!(
                ApertureMask::new().random_dust(3, radius, 1),
                Err(OpticsError::InvalidOpticsSpec(_))
            ));
        }
    }
}
