//! Positions of perturbing bodies relative to the central body.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use orbital_core::constants::{AU_KM, MOON_DISTANCE_KM, SECONDS_PER_DAY};
use orbital_core::vector::Vector3;

/// Shareable `epoch_s -> position_km` lookup.
#[derive(Clone)]
pub struct EphemerisProvider {
    label: String,
    position: Arc<dyn Fn(f64) -> Vector3 + Send + Sync>,
}

impl EphemerisProvider {
    pub fn new<F>(label: impl Into<String>, position: F) -> Self
    where
        F: Fn(f64) -> Vector3 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            position: Arc::new(position),
        }
    }

    /// A body that never moves.
    pub fn fixed(label: impl Into<String>, position_km: Vector3) -> Self {
        Self::new(label, move |_| position_km)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position_km(&self, epoch_s: f64) -> Vector3 {
        (self.position)(epoch_s)
    }
}

impl fmt::Debug for EphemerisProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemerisProvider")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Analytic circular orbit about the central body, inclined about the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularEphemeris {
    pub radius_km: f64,
    pub period_s: f64,
    pub inclination_rad: f64,
    /// Angle along the orbit at epoch zero.
    pub phase_rad: f64,
}

impl CircularEphemeris {
    /// Apparent solar orbit seen from Earth, in the equatorial frame.
    pub fn sun_from_earth() -> Self {
        Self {
            radius_km: AU_KM,
            period_s: 365.256_363 * SECONDS_PER_DAY,
            inclination_rad: 23.439_281_f64.to_radians(),
            phase_rad: 0.0,
        }
    }

    /// Mean lunar orbit, ignoring eccentricity and nodal precession.
    pub fn moon_from_earth() -> Self {
        Self {
            radius_km: MOON_DISTANCE_KM,
            period_s: 27.321_661 * SECONDS_PER_DAY,
            inclination_rad: 23.439_281_f64.to_radians(),
            phase_rad: 0.0,
        }
    }

    pub fn position_km(&self, epoch_s: f64) -> Vector3 {
        let angle = self.phase_rad + TAU * epoch_s / self.period_s;
        let (sin_a, cos_a) = angle.sin_cos();
        let (sin_i, cos_i) = self.inclination_rad.sin_cos();
        [
            self.radius_km * cos_a,
            self.radius_km * sin_a * cos_i,
            self.radius_km * sin_a * sin_i,
        ]
    }

    pub fn into_provider(self, label: impl Into<String>) -> EphemerisProvider {
        EphemerisProvider::new(label, move |epoch_s| self.position_km(epoch_s))
    }
}
