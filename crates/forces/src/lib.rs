//! Force models and the ordered stacks that combine them.
//!
//! A [`ForceModel`] maps a [`State`] to an acceleration in km/s² and owns every parameter it
//! needs. Models are pure: the same state always yields the same acceleration, so stacks can
//! be shared freely between propagations and threads.

pub mod assemble;
pub mod ephemeris;
pub mod models;
pub mod providers;

use std::fmt::Debug;
use std::sync::Arc;

use orbital_core::State;
use orbital_core::vector::{self, Vector3};

pub use assemble::ConfigurationError;
pub use ephemeris::{CircularEphemeris, EphemerisProvider};
pub use models::{
    AerodynamicLift, AtmosphericDrag, Gravity, SolarRadiationPressure, ThirdBody, Zonal,
};
pub use providers::Providers;

/// A single contribution to the equations of motion.
pub trait ForceModel: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Acceleration (km/s²) acting at `state`.
    fn acceleration(&self, state: &State) -> Vector3;

    /// Rate of change of mass (kg/s). Negative while propellant is consumed.
    fn mass_flow_rate(&self, _state: &State) -> f64 {
        0.0
    }
}

/// Acceleration attributed to one model of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub name: String,
    pub acceleration_km_s2: Vector3,
}

/// Ordered collection of force models whose accelerations are summed.
#[derive(Debug, Clone, Default)]
pub struct ForceStack {
    models: Vec<Arc<dyn ForceModel>>,
}

impl ForceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack holding only point-mass gravity.
    pub fn two_body(mu_km3_s2: f64) -> Self {
        Self::new().with(Gravity::point_mass(mu_km3_s2))
    }

    pub fn push(&mut self, model: Arc<dyn ForceModel>) {
        self.models.push(model);
    }

    /// Copy of this stack with `model` appended.
    pub fn with<M: ForceModel + 'static>(&self, model: M) -> Self {
        self.with_shared(Arc::new(model))
    }

    pub fn with_shared(&self, model: Arc<dyn ForceModel>) -> Self {
        let mut extended = self.clone();
        extended.push(model);
        extended
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn acceleration(&self, state: &State) -> Vector3 {
        self.models.iter().fold(vector::ZERO, |acc, model| {
            vector::add(&acc, &model.acceleration(state))
        })
    }

    pub fn mass_flow_rate(&self, state: &State) -> f64 {
        self.models.iter().map(|m| m.mass_flow_rate(state)).sum()
    }

    /// Per-model accelerations, in stack order.
    pub fn breakdown(&self, state: &State) -> Vec<Contribution> {
        self.models
            .iter()
            .map(|model| Contribution {
                name: model.name().to_string(),
                acceleration_km_s2: model.acceleration(state),
            })
            .collect()
    }
}
