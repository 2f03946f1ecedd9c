//! Propulsion mode descriptors, vehicle mass properties and the rocket equation.

pub mod staging;

use orbital_core::constants::G0;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use staging::{StageMasses, StageSpec, StagingError, StagingSolution, optimal_staging};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropulsionError {
    #[error("engine thrust must be positive (got {0} N)")]
    InvalidThrust(f64),
    #[error("specific impulse must be positive (got {0} s)")]
    InvalidIsp(f64),
}

/// A throttle-free engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    pub thrust_newtons: f64,
    pub isp_seconds: f64,
}

impl Engine {
    pub fn new(thrust_newtons: f64, isp_seconds: f64) -> Result<Self, PropulsionError> {
        let engine = Self {
            thrust_newtons,
            isp_seconds,
        };
        engine.validate()?;
        Ok(engine)
    }

    pub fn validate(&self) -> Result<(), PropulsionError> {
        if !(self.thrust_newtons > 0.0 && self.thrust_newtons.is_finite()) {
            return Err(PropulsionError::InvalidThrust(self.thrust_newtons));
        }
        if !(self.isp_seconds > 0.0 && self.isp_seconds.is_finite()) {
            return Err(PropulsionError::InvalidIsp(self.isp_seconds));
        }
        Ok(())
    }

    pub fn exhaust_velocity_m_s(&self) -> f64 {
        self.isp_seconds * G0
    }

    /// Propellant consumption (kg/s), positive.
    pub fn mass_flow_rate_kg_s(&self) -> f64 {
        self.thrust_newtons / self.exhaust_velocity_m_s()
    }

    /// Propellant consumed over a burn of the given length.
    pub fn propellant_for_duration_kg(&self, duration_s: f64) -> f64 {
        self.mass_flow_rate_kg_s() * duration_s.abs()
    }
}

/// How a vehicle produces thrust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropulsionMode {
    /// Instantaneous burns, e.g. a chemical upper stage.
    Impulsive {
        isp_seconds: f64,
        max_delta_v_km_s: Option<f64>,
    },
    /// Continuous thrust from a fixed engine.
    Continuous(Engine),
}

impl PropulsionMode {
    pub fn isp_seconds(&self) -> f64 {
        match self {
            PropulsionMode::Impulsive { isp_seconds, .. } => *isp_seconds,
            PropulsionMode::Continuous(engine) => engine.isp_seconds,
        }
    }

    /// Largest Δv a single impulsive burn may request, if the vehicle declares one.
    pub fn max_delta_v_km_s(&self) -> Option<f64> {
        match self {
            PropulsionMode::Impulsive {
                max_delta_v_km_s, ..
            } => *max_delta_v_km_s,
            PropulsionMode::Continuous(_) => None,
        }
    }
}

/// Basic vehicle definition used to check feasibility across mission segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: String,
    pub dry_mass_kg: f64,
    pub propellant_mass_kg: f64,
    pub propulsion: PropulsionMode,
}

impl Vehicle {
    /// Convenience accessor for total initial mass.
    pub fn initial_mass_kg(&self) -> f64 {
        self.dry_mass_kg + self.propellant_mass_kg
    }

    pub fn engine(&self) -> Option<Engine> {
        match &self.propulsion {
            PropulsionMode::Continuous(engine) => Some(*engine),
            PropulsionMode::Impulsive { .. } => None,
        }
    }

    /// Ideal Δv available from a full tank.
    pub fn delta_v_capacity_km_s(&self) -> f64 {
        delta_v_km_s(
            self.propulsion.isp_seconds(),
            self.initial_mass_kg(),
            self.dry_mass_kg,
        )
    }
}

/// Tsiolkovsky Δv (km/s) for a burn from `initial_mass_kg` down to `final_mass_kg`.
pub fn delta_v_km_s(isp_seconds: f64, initial_mass_kg: f64, final_mass_kg: f64) -> f64 {
    isp_seconds * G0 * (initial_mass_kg / final_mass_kg).ln() / 1_000.0
}

/// Mass remaining after delivering `delta_v_km_s`.
pub fn final_mass_after_delta_v(isp_seconds: f64, initial_mass_kg: f64, delta_v_km_s: f64) -> f64 {
    initial_mass_kg * (-delta_v_km_s.abs() * 1_000.0 / (isp_seconds * G0)).exp()
}

/// Propellant needed to deliver `delta_v_km_s`.
pub fn propellant_for_delta_v(isp_seconds: f64, initial_mass_kg: f64, delta_v_km_s: f64) -> f64 {
    initial_mass_kg - final_mass_after_delta_v(isp_seconds, initial_mass_kg, delta_v_km_s)
}
