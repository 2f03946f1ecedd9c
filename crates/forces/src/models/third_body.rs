use orbital_core::State;
use orbital_core::vector::{self, Vector3};

use crate::ForceModel;
use crate::ephemeris::EphemerisProvider;

/// Point-mass perturbation from a body whose position comes from an ephemeris.
///
/// Includes the indirect term, since the integration frame is centred on the primary.
#[derive(Debug, Clone)]
pub struct ThirdBody {
    label: String,
    pub mu_km3_s2: f64,
    pub ephemeris: EphemerisProvider,
}

impl ThirdBody {
    pub fn new(body: &str, mu_km3_s2: f64, ephemeris: EphemerisProvider) -> Self {
        Self {
            label: format!("third_body:{body}"),
            mu_km3_s2,
            ephemeris,
        }
    }
}

impl ForceModel for ThirdBody {
    fn name(&self) -> &str {
        &self.label
    }

    fn acceleration(&self, state: &State) -> Vector3 {
        let body = self.ephemeris.position_km(state.epoch_s);
        let relative = vector::sub(&body, &state.position_km);
        let d = vector::norm(&relative);
        let b = vector::norm(&body);
        if d <= 0.0 || b <= 0.0 {
            return vector::ZERO;
        }
        let direct = vector::scale(&relative, 1.0 / d.powi(3));
        let indirect = vector::scale(&body, 1.0 / b.powi(3));
        vector::scale(&vector::sub(&direct, &indirect), self.mu_km3_s2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::constants::{MOON_DISTANCE_KM, MU_MOON};

    #[test]
    fn tidal_pull_stretches_along_body_axis() {
        let moon = ThirdBody::new(
            "moon",
            MU_MOON,
            EphemerisProvider::fixed("moon", [MOON_DISTANCE_KM, 0.0, 0.0]),
        );
        assert_eq!(moon.name(), "third_body:moon");
        let near = moon.acceleration(&State::new(0.0, [7_000.0, 0.0, 0.0], [0.0; 3]));
        let far = moon.acceleration(&State::new(0.0, [-7_000.0, 0.0, 0.0], [0.0; 3]));
        assert!(near[0] > 0.0);
        assert!(far[0] < 0.0);
        let centre = moon.acceleration(&State::new(0.0, [1e-9, 0.0, 0.0], [0.0; 3]));
        assert!(centre[0].abs() < 1e-18);
    }
}
