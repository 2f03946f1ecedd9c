use orbital_atmosphere::{DensityProvider, WindProfile, relative_velocity};
use orbital_core::State;
use orbital_core::vector::{self, Vector3};

use crate::ForceModel;

/// Aerodynamic drag against a co-rotating atmosphere with optional wind.
///
/// Mass comes from the state when present, otherwise from `fallback_mass_kg`; with
/// neither the contribution is zero.
#[derive(Debug, Clone)]
pub struct AtmosphericDrag {
    pub drag_coefficient: f64,
    pub area_m2: f64,
    pub fallback_mass_kg: Option<f64>,
    pub body_radius_km: f64,
    pub rotation_rate_rad_s: f64,
    pub density: DensityProvider,
    pub wind: Option<WindProfile>,
}

impl AtmosphericDrag {
    fn mass_kg(&self, state: &State) -> Option<f64> {
        state.mass_kg.or(self.fallback_mass_kg).filter(|m| *m > 0.0)
    }
}

impl ForceModel for AtmosphericDrag {
    fn name(&self) -> &str {
        "drag"
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
        let v_rel_mag = vector::norm(&v_rel);
        // rho in kg/m³ with v in km/s: 0.5·ρ·(CdA/m)·|v|·v·1e6 m/s², /1e3 to km/s².
        let factor = -0.5 * rho * self.drag_coefficient * self.area_m2 / mass * v_rel_mag * 1_000.0;
        vector::scale(&v_rel, factor)
    }
}
