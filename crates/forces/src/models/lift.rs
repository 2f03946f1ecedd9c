use orbital_atmosphere::{DensityProvider, WindProfile, relative_velocity};
use orbital_core::State;
use orbital_core::vector::{self, Vector3};

use crate::ForceModel;

/// Aerodynamic lift in the plane of position and air-relative velocity.
///
/// The force is perpendicular to the relative velocity and points away from the body
/// for a positive coefficient. Mass follows the same rule as [`super::AtmosphericDrag`].
#[derive(Debug, Clone)]
pub struct AerodynamicLift {
    pub lift_coefficient: f64,
    pub reference_area_m2: f64,
    pub fallback_mass_kg: Option<f64>,
    pub body_radius_km: f64,
    pub rotation_rate_rad_s: f64,
    pub density: DensityProvider,
    pub wind: Option<WindProfile>,
}

impl AerodynamicLift {
    fn mass_kg(&self, state: &State) -> Option<f64> {
        state.mass_kg.or(self.fallback_mass_kg).filter(|m| *m > 0.0)
    }
}

impl ForceModel for AerodynamicLift {
    fn name(&self) -> &str {
        "lift"
    }

    fn acceleration(&self, state: &State) -> Vector3 {
        let Some(mass) = self.mass_kg(state) else {
            return vector::ZERO;
        };
        let altitude = state.altitude_km(self.body_radius_km);
        let rho = self.density.density(altitude, state.epoch_s);
        if rho <= 0.0 || !rho.is_finite() {
            return vector::ZERO;
        }
        let wind = self
            .wind
            .map(|w| w.velocity_km_s(altitude))
            .unwrap_or(vector::ZERO);
        let v_rel = relative_velocity(state, self.rotation_rate_rad_s, &wind);
        let speed_sq = vector::dot(&v_rel, &v_rel);
        if speed_sq == 0.0 {
            return vector::ZERO;
        }
        // Radial direction with the along-velocity part removed.
        let r = &state.position_km;
        let along = vector::scale(&v_rel, vector::dot(r, &v_rel) / speed_sq);
        let Some(up) = vector::unit(&vector::sub(r, &along)) else {
            return vector::ZERO;
        };
        let magnitude = 0.5 * rho * self.lift_coefficient * self.reference_area_m2 / mass * speed_sq * 1_000.0;
        vector::scale(&up, magnitude)
    }
}
