//! Layered horizontal wind profile.
//!
//! Speeds and headings are linearly interpolated between tabulated layers up to 100 km and
//! scaled by a qualitative condition. The profile is deterministic so that drag stays a pure
//! function of the state.

use orbital_core::units::ms_to_kms;
use orbital_core::vector::Vector3;

const LAYER_ALTITUDE_KM: [f64; 15] = [
    0.0, 1.0, 3.0, 5.0, 10.0, 15.0, 18.0, 20.0, 30.0, 50.0, 70.0, 80.0, 90.0, 100.0, 120.0,
];
const LAYER_SPEED_M_S: [f64; 15] = [
    5.0, 6.0, 10.0, 15.0, 20.0, 18.0, 10.0, 1.0, 15.0, 40.0, 67.0, 40.0, 25.0, 35.0, 10.0,
];
const LAYER_HEADING_DEG: [f64; 15] = [
    90.0, 45.0, 0.0, 270.0, 225.0, 180.0, 135.0, 90.0, 45.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Winds are neglected above this altitude.
pub const WIND_CEILING_KM: f64 = 100.0;

/// Qualitative wind strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindCondition {
    #[default]
    None,
    Light,
    Moderate,
    Strong,
    VeryStrong,
}

impl WindCondition {
    pub fn scale(&self) -> f64 {
        match self {
            WindCondition::None => 0.0,
            WindCondition::Light => 0.5,
            WindCondition::Moderate => 1.0,
            WindCondition::Strong => 1.5,
            WindCondition::VeryStrong => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindProfile {
    pub condition: WindCondition,
}

impl WindProfile {
    pub fn new(condition: WindCondition) -> Self {
        Self { condition }
    }

    /// Wind velocity (km/s) in the inertial x/y plane at the given altitude.
    pub fn velocity_km_s(&self, altitude_km: f64) -> Vector3 {
        let scale = self.condition.scale();
        if scale == 0.0 || !(0.0..=WIND_CEILING_KM).contains(&altitude_km) {
            return [0.0; 3];
        }
        let layer = LAYER_ALTITUDE_KM
            .partition_point(|&base| base <= altitude_km)
            .saturating_sub(1)
            .min(LAYER_ALTITUDE_KM.len() - 2);
        let span = LAYER_ALTITUDE_KM[layer + 1] - LAYER_ALTITUDE_KM[layer];
        let t = (altitude_km - LAYER_ALTITUDE_KM[layer]) / span;
        let speed = lerp(LAYER_SPEED_M_S[layer], LAYER_SPEED_M_S[layer + 1], t);
        let heading = lerp(LAYER_HEADING_DEG[layer], LAYER_HEADING_DEG[layer + 1], t).to_radians();
        let speed_km_s = ms_to_kms(speed) * scale;
        [speed_km_s * heading.cos(), speed_km_s * heading.sin(), 0.0]
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
