use orbital_core::State;
use orbital_core::constants::{AU_KM, SOLAR_PRESSURE_1AU};
use orbital_core::vector::{self, Vector3};

use crate::ForceModel;
use crate::ephemeris::EphemerisProvider;

/// Cannonball solar radiation pressure with a cylindrical shadow of the central body.
#[derive(Debug, Clone)]
pub struct SolarRadiationPressure {
    pub reflectivity_coefficient: f64,
    pub area_m2: f64,
    pub fallback_mass_kg: Option<f64>,
    pub body_radius_km: f64,
    pub sun: EphemerisProvider,
}

impl SolarRadiationPressure {
    /// True when the central body blocks the Sun.
    pub fn in_shadow(&self, state: &State) -> bool {
        let sun = self.sun.position_km(state.epoch_s);
        let Some(sun_dir) = vector::unit(&sun) else {
            return false;
        };
        let r = state.position_km;
        let along = vector::dot(&r, &sun_dir);
        if along >= 0.0 {
            return false;
        }
        let perpendicular = vector::sub(&r, &vector::scale(&sun_dir, along));
        vector::norm(&perpendicular) < self.body_radius_km
    }
}

impl ForceModel for SolarRadiationPressure {
    fn name(&self) -> &str {
        "solar_radiation_pressure"
    }

    fn acceleration(&self, state: &State) -> Vector3 {
        let Some(mass) = state.mass_kg.or(self.fallback_mass_kg).filter(|m| *m > 0.0) else {
            return vector::ZERO;
        };
        if self.in_shadow(state) {
            return vector::ZERO;
        }
        let to_sun = vector::sub(&self.sun.position_km(state.epoch_s), &state.position_km);
        let distance = vector::norm(&to_sun);
        let Some(direction) = vector::unit(&to_sun) else {
            return vector::ZERO;
        };
        let pressure = SOLAR_PRESSURE_1AU * (AU_KM / distance).powi(2);
        let magnitude = pressure * self.reflectivity_coefficient * self.area_m2 / mass / 1_000.0;
        vector::scale(&direction, -magnitude)
    }
}
