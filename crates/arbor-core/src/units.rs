// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Physical units for distance-based operations.
//!
//! Coordinates are stored raw. A skeleton's [`Units`] says what one
//! coordinate unit means physically (`scale` × `unit`). Thresholds passed to
//! operations are [`Length`]s: either raw coordinate units, or a physical
//! length converted through the skeleton's units at the call site.
use core::fmt;

use crate::error::SkeletonError;

/// Physical length unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LengthUnit {
    /// 1e-9 m.
    Nanometer,
    /// 1e-6 m.
    Micrometer,
    /// 1e-3 m.
    Millimeter,
}

impl LengthUnit {
    /// Size of one unit in nanometres.
    #[must_use]
    pub fn nanometers(self) -> f64 {
        match self {
            Self::Nanometer => 1.0,
            Self::Micrometer => 1.0e3,
            Self::Millimeter => 1.0e6,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nanometer => "nm",
            Self::Micrometer => "µm",
            Self::Millimeter => "mm",
        })
    }
}

/// What one coordinate unit of a skeleton represents.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Units {
    unit: Option<LengthUnit>,
    scale: f64,
}

impl Default for Units {
    fn default() -> Self {
        Self::unitless()
    }
}

impl Units {
    /// Coordinates without a physical interpretation.
    #[must_use]
    pub const fn unitless() -> Self {
        Self {
            unit: None,
            scale: 1.0,
        }
    }

    /// One coordinate unit equals `scale` × `unit` (e.g. `8 nm` voxels).
    pub fn new(unit: LengthUnit, scale: f64) -> Result<Self, SkeletonError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SkeletonError::invalid(
                "units",
                format!("scale must be finite and positive, got {scale}"),
            ));
        }
        Ok(Self {
            unit: Some(unit),
            scale,
        })
    }

    /// Physical unit, `None` when unitless.
    #[must_use]
    pub fn unit(&self) -> Option<LengthUnit> {
        self.unit
    }

    /// Scale factor applied to the unit.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Converts `length` into coordinate units.
    ///
    /// Fails when the length is negative or non-finite, or when a physical
    /// length is given for a unitless skeleton.
    pub fn to_coordinates(&self, length: Length) -> Result<f64, SkeletonError> {
        if !(length.value.is_finite() && length.value >= 0.0) {
            return Err(SkeletonError::invalid(
                "length",
                format!("length must be finite and non-negative, got {}", length.value),
            ));
        }
        match (length.unit, self.unit) {
            (None, _) => Ok(length.value),
            (Some(given), Some(own)) => {
                Ok(length.value * given.nanometers() / (own.nanometers() * self.scale))
            }
            (Some(given), None) => Err(SkeletonError::invalid(
                "length",
                format!("cannot convert {} {given} for a skeleton without physical units", length.value),
            )),
        }
    }

    /// Converts a coordinate-space distance into `unit`.
    pub fn from_coordinates(&self, value: f64, unit: LengthUnit) -> Result<f64, SkeletonError> {
        match self.unit {
            Some(own) => Ok(value * own.nanometers() * self.scale / unit.nanometers()),
            None => Err(SkeletonError::invalid(
                "length",
                format!("cannot express a distance in {unit} for a skeleton without physical units"),
            )),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{} {unit}", self.scale),
            None => f.write_str("dimensionless"),
        }
    }
}

/// A distance threshold: raw coordinate units or a physical length.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Length {
    /// Magnitude.
    pub value: f64,
    /// Unit, `None` for raw coordinate units.
    pub unit: Option<LengthUnit>,
}

impl Length {
    /// A physical length.
    #[must_use]
    pub const fn new(value: f64, unit: LengthUnit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    /// A length in raw coordinate units.
    #[must_use]
    pub const fn coordinates(value: f64) -> Self {
        Self { value, unit: None }
    }

    /// Micrometres.
    #[must_use]
    pub const fn microns(value: f64) -> Self {
        Self::new(value, LengthUnit::Micrometer)
    }

    /// Nanometres.
    #[must_use]
    pub const fn nanometers(value: f64) -> Self {
        Self::new(value, LengthUnit::Nanometer)
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::coordinates(value)
    }
}
