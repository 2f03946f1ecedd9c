//! Orbit utility helpers: element views of a [`State`] and analytic two-body propagation.
//!
//! Orbital elements are always *derived* from the Cartesian state. Nothing in the workspace
//! stores them as the primary representation, so the circular/equatorial singularities stay
//! confined to this module.

pub mod elements;
pub mod kepler;

use orbital_core::State;
use orbital_core::vector::{self, Vector3};

pub use elements::{ElementsError, OrbitalElements};
pub use kepler::KeplerError;

/// Specific orbital energy (km²/s²) of a state about a body with parameter `mu`.
pub fn specific_energy(state: &State, mu_km3_s2: f64) -> f64 {
    let v = state.speed_km_s();
    0.5 * v * v - mu_km3_s2 / state.radius_km()
}

/// Specific angular momentum vector `r × v` (km²/s).
pub fn angular_momentum(state: &State) -> Vector3 {
    vector::cross(&state.position_km, &state.velocity_km_s)
}

/// Speed on a circular orbit of the given radius.
pub fn circular_speed(mu_km3_s2: f64, radius_km: f64) -> f64 {
    (mu_km3_s2 / radius_km).sqrt()
}

/// Speed from the vis-viva equation.
pub fn vis_viva_speed(mu_km3_s2: f64, radius_km: f64, semi_major_axis_km: f64) -> f64 {
    (mu_km3_s2 * (2.0 / radius_km - 1.0 / semi_major_axis_km)).sqrt()
}
