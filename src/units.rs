//!
//! # Physical lengths
//!
//! Every length that crosses a public interface of the crate is a [`PhysicalLength`].
//! The value keeps the unit it was created with so it prints the way it was written,
//! conversions to any other unit are explicit.
//!
//! ```
//! use oiwvf::units::{LengthUnits, PhysicalLength};
//! let pupil = 3f64.mm();
//! assert!((pupil.in_micrometers() - 3e3).abs() < 1e-9);
//! let wavelength = PhysicalLength::nanometers(550.);
//! assert!((wavelength.in_millimeters() - 550e-6).abs() < 1e-12);
//! ```

use std::{
    fmt::Display,
    ops::{Add, Div, Mul, Sub},
};

use serde::{Deserialize, Serialize};

/// Length units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Meter,
    Millimeter,
    Micrometer,
    Nanometer,
}
impl Unit {
    /// Size of the unit in meters
    pub fn scale(&self) -> f64 {
        match self {
            Unit::Meter => 1.,
            Unit::Millimeter => 1e-3,
            Unit::Micrometer => 1e-6,
            Unit::Nanometer => 1e-9,
        }
    }
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Millimeter => "mm",
            Unit::Micrometer => "um",
            Unit::Nanometer => "nm",
        }
    }
}

/// A length with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalLength {
    value: f64,
    unit: Unit,
}
impl PhysicalLength {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }
    pub fn meters(value: f64) -> Self {
        Self::new(value, Unit::Meter)
    }
    pub fn millimeters(value: f64) -> Self {
        Self::new(value, Unit::Millimeter)
    }
    pub fn micrometers(value: f64) -> Self {
        Self::new(value, Unit::Micrometer)
    }
    pub fn nanometers(value: f64) -> Self {
        Self::new(value, Unit::Nanometer)
    }
    /// Returns the length in the given unit
    pub fn to(&self, unit: Unit) -> f64 {
        if unit == self.unit {
            self.value
        } else {
            self.value * self.unit.scale() / unit.scale()
        }
    }
    /// Returns the length in meters
    pub fn in_meters(&self) -> f64 {
        self.to(Unit::Meter)
    }
    /// Returns the length in millimeters
    pub fn in_millimeters(&self) -> f64 {
        self.to(Unit::Millimeter)
    }
    /// Returns the length in micrometers
    pub fn in_micrometers(&self) -> f64 {
        self.to(Unit::Micrometer)
    }
    /// Returns the length in nanometers
    pub fn in_nanometers(&self) -> f64 {
        self.to(Unit::Nanometer)
    }
    /// The unit the length was created with
    pub fn unit(&self) -> Unit {
        self.unit
    }
    /// Expresses the length in another unit
    pub fn convert(self, unit: Unit) -> Self {
        Self::new(self.to(unit), unit)
    }
    pub fn is_positive(&self) -> bool {
        self.value > 0. && self.value.is_finite()
    }
}
impl Display for PhysicalLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit.symbol())
    }
}
impl Add for PhysicalLength {
    type Output = PhysicalLength;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.value + rhs.to(self.unit), self.unit)
    }
}
impl Sub for PhysicalLength {
    type Output = PhysicalLength;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.value - rhs.to(self.unit), self.unit)
    }
}
impl Mul<f64> for PhysicalLength {
    type Output = PhysicalLength;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.value * rhs, self.unit)
    }
}
impl Div<f64> for PhysicalLength {
    type Output = PhysicalLength;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.value / rhs, self.unit)
    }
}
/// Ratio of two lengths
impl Div for PhysicalLength {
    type Output = f64;
    fn div(self, rhs: Self) -> Self::Output {
        self.value / rhs.to(self.unit)
    }
}

/// Builds [`PhysicalLength`] from numbers
pub trait LengthUnits {
    fn m(self) -> PhysicalLength;
    fn mm(self) -> PhysicalLength;
    fn um(self) -> PhysicalLength;
    fn nm(self) -> PhysicalLength;
}
impl LengthUnits for f64 {
    fn m(self) -> PhysicalLength {
        PhysicalLength::meters(self)
    }
    fn mm(self) -> PhysicalLength {
        PhysicalLength::millimeters(self)
    }
    fn um(self) -> PhysicalLength {
        PhysicalLength::micrometers(self)
    }
    fn nm(self) -> PhysicalLength {
        PhysicalLength::nanometers(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let f = 17f64.mm();
        assert_eq!(f.unit(), Unit::Millimeter);
        assert!((f.in_meters() - 0.017).abs() < 1e-12);
        assert!((f.in_micrometers() - 17e3).abs() < 1e-9);
        assert!((550f64.nm().in_micrometers() - 0.55).abs() < 1e-12);
        assert_eq!(f.convert(Unit::Meter).unit(), Unit::Meter);
    }

    #[test]
    fn arithmetic() {
        let a = 1f64.mm() + 500f64.um();
        assert!((a.in_millimeters() - 1.5).abs() < 1e-12);
        assert!(((a - 1f64.mm()).in_micrometers() - 500.).abs() < 1e-9);
        assert!(((a * 2.).in_millimeters() - 3.).abs() < 1e-12);
        assert!(((a / 3.).in_millimeters() - 0.5).abs() < 1e-12);
        assert!((a / 0.5f64.mm() - 3.).abs() < 1e-12);
        assert_eq!(format!("{}", 2f64.um()), "2um");
    }
}
