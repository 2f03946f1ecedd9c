//! Continuous thrust as a force model.
//!
//! [`ThrustForce`] pushes along a [`Steering`] direction with the engine's full thrust and
//! drains mass at the engine's flow rate, so adding it to a force stack turns a coast into a
//! finite burn.

use orbital_core::State;
use orbital_core::vector::{self, Vector3};
use orbital_forces::ForceModel;
use orbital_propulsion::Engine;
use serde::{Deserialize, Serialize};

/// Thrust direction law, evaluated from the instantaneous state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Steering {
    Prograde,
    Retrograde,
    RadialOut,
    RadialIn,
    /// Along the orbit normal `r × v`.
    Normal,
    AntiNormal,
    /// Fixed inertial direction; need not be normalised.
    Inertial(Vector3),
}

impl Steering {
    /// Unit thrust direction at `state`, `None` where the law is undefined.
    pub fn direction(&self, state: &State) -> Option<Vector3> {
        let r = &state.position_km;
        let v = &state.velocity_km_s;
        let raw = match self {
            Steering::Prograde => *v,
            Steering::Retrograde => vector::scale(v, -1.0),
            Steering::RadialOut => *r,
            Steering::RadialIn => vector::scale(r, -1.0),
            Steering::Normal => vector::cross(r, v),
            Steering::AntiNormal => vector::cross(v, r),
            Steering::Inertial(direction) => *direction,
        };
        vector::unit(&raw)
    }
}

/// Engine thrust along a steering law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustForce {
    pub engine: Engine,
    pub steering: Steering,
}

impl ThrustForce {
    pub fn new(engine: Engine, steering: Steering) -> Self {
        Self { engine, steering }
    }
}

impl ForceModel for ThrustForce {
    fn name(&self) -> &str {
        "thrust"
    }

    fn acceleration(&self, state: &State) -> Vector3 {
        let Some(mass) = state.mass_kg.filter(|m| *m > 0.0) else {
            return vector::ZERO;
        };
        let Some(direction) = self.steering.direction(state) else {
            return vector::ZERO;
        };
        // N/kg is m/s²
        vector::scale(&direction, self.engine.thrust_newtons / mass / 1_000.0)
    }

    fn mass_flow_rate(&self, state: &State) -> f64 {
        if state.mass_kg.is_some_and(|m| m > 0.0) {
            -self.engine.mass_flow_rate_kg_s()
        } else {
            0.0
        }
    }
}

/// Burn time for an engine to deliver `delta_v_km_s` starting from `initial_mass_kg`.
pub fn burn_duration_for_delta_v(engine: &Engine, initial_mass_kg: f64, delta_v_km_s: f64) -> f64 {
    let propellant =
        orbital_propulsion::propellant_for_delta_v(engine.isp_seconds, initial_mass_kg, delta_v_km_s);
    propellant / engine.mass_flow_rate_kg_s()
}
