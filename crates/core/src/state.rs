//! Inertial Cartesian state of a body at an epoch.

use serde::{Deserialize, Serialize};

use crate::vector::{self, Vector3};

/// Position, velocity and optional mass of a body at an epoch.
///
/// Position and velocity are always expressed in the same inertial frame,
/// centred on the dominant body. Orbital elements are derived from this,
/// never stored alongside it. Builders return new values; a `State` is never
/// changed in place by the propagation or manoeuvre code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Seconds since the scenario reference instant.
    pub epoch_s: f64,
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_kg: Option<f64>,
}

impl State {
    pub fn new(epoch_s: f64, position_km: Vector3, velocity_km_s: Vector3) -> Self {
        Self {
            epoch_s,
            position_km,
            velocity_km_s,
            mass_kg: None,
        }
    }

    /// Copy of this state carrying `mass_kg`.
    pub fn with_mass(self, mass_kg: f64) -> Self {
        Self {
            mass_kg: Some(mass_kg),
            ..self
        }
    }

    /// Copy of this state with a new velocity, same epoch and position.
    pub fn with_velocity(self, velocity_km_s: Vector3) -> Self {
        Self {
            velocity_km_s,
            ..self
        }
    }

    /// Copy of this state re-stamped at another epoch.
    pub fn at_epoch(self, epoch_s: f64) -> Self {
        Self { epoch_s, ..self }
    }

    pub fn radius_km(&self) -> f64 {
        vector::norm(&self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        vector::norm(&self.velocity_km_s)
    }

    /// Height above a spherical body of the given radius.
    pub fn altitude_km(&self, body_radius_km: f64) -> f64 {
        self.radius_km() - body_radius_km
    }

    /// True when every stored quantity is finite.
    pub fn is_finite(&self) -> bool {
        self.epoch_s.is_finite()
            && vector::is_finite(&self.position_km)
            && vector::is_finite(&self.velocity_km_s)
            && self.mass_kg.is_none_or(f64::is_finite)
    }
}
