//! Numerical propagation of a [`State`] under a [`ForceStack`].
//!
//! Two step policies are supported: classical RK4 with a fixed step and Dormand–Prince
//! 5(4) with embedded error control. Both integrate position, velocity and, when the
//! state carries it, mass. The final step is always clipped so the last sample lands on
//! the requested epoch.

mod integrator;
pub mod policy;
pub mod trajectory;

use orbital_core::State;
use orbital_forces::ForceStack;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use integrator::{Dynamics, Vector7, dormand_prince_step, error_ratio, rk4_step};

pub use policy::{Span, StepPolicy};
pub use trajectory::{Termination, Trajectory};

const FLOOR_BISECTION_ITERATIONS: usize = 60;
const FLOOR_TOLERANCE_KM: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("invalid step policy: {0}")]
    InvalidStepPolicy(String),
    #[error("invalid propagation span: {0}")]
    InvalidSpan(String),
    #[error(
        "step size reached its minimum at t = {epoch_s} s (attempted {attempted_step_s} s, error ratio {error_ratio})"
    )]
    MinimumStepReached {
        epoch_s: f64,
        attempted_step_s: f64,
        error_ratio: f64,
    },
    #[error("step limit of {steps} exceeded at t = {epoch_s} s")]
    StepLimitExceeded { epoch_s: f64, steps: usize },
    #[error("state became non-finite at t = {epoch_s} s")]
    NonFiniteState { epoch_s: f64 },
}

/// Stop propagating when the altitude above a spherical body drops below a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeFloor {
    pub body_radius_km: f64,
    pub min_altitude_km: f64,
}

impl AltitudeFloor {
    /// Floor at the body surface.
    pub fn surface(body_radius_km: f64) -> Self {
        Self {
            body_radius_km,
            min_altitude_km: 0.0,
        }
    }

    fn margin(&self, state: &State) -> f64 {
        state.altitude_km(self.body_radius_km) - self.min_altitude_km
    }
}

/// Propagate `initial` over `span` with no termination events.
pub fn propagate(
    initial: &State,
    stack: &ForceStack,
    span: Span,
    policy: &StepPolicy,
) -> Result<Trajectory, IntegrationError> {
    Propagator::new(stack, *policy).propagate(initial, span)
}

/// A force stack and step policy, optionally with an altitude floor.
#[derive(Debug, Clone)]
pub struct Propagator<'a> {
    stack: &'a ForceStack,
    policy: StepPolicy,
    floor: Option<AltitudeFloor>,
}

impl<'a> Propagator<'a> {
    pub fn new(stack: &'a ForceStack, policy: StepPolicy) -> Self {
        Self {
            stack,
            policy,
            floor: None,
        }
    }

    pub fn with_altitude_floor(mut self, floor: AltitudeFloor) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn policy(&self) -> &StepPolicy {
        &self.policy
    }

    pub fn propagate(&self, initial: &State, span: Span) -> Result<Trajectory, IntegrationError> {
        self.policy.validate()?;
        if !initial.is_finite() {
            return Err(IntegrationError::NonFiniteState {
                epoch_s: initial.epoch_s,
            });
        }
        let target = span.target_epoch(initial.epoch_s);
        if !target.is_finite() {
            return Err(IntegrationError::InvalidSpan(format!(
                "target epoch {target} is not finite"
            )));
        }

        if let Some(floor) = self.floor {
            let margin = floor.margin(initial);
            if margin < 0.0 {
                return Ok(Trajectory {
                    samples: vec![*initial],
                    termination: Termination::AltitudeFloor {
                        epoch_s: initial.epoch_s,
                        altitude_km: initial.altitude_km(floor.body_radius_km),
                    },
                });
            }
        }

        let dynamics = Dynamics {
            stack: self.stack,
            has_mass: initial.mass_kg.is_some(),
        };
        let mut run = Run {
            dynamics,
            policy: self.policy,
            floor: self.floor,
            samples: vec![*initial],
            t: initial.epoch_s,
            y: Dynamics::pack(initial),
        };

        let termination = if target == initial.epoch_s {
            Termination::ReachedTarget
        } else {
            match self.policy {
                StepPolicy::Fixed { step_s } => run.fixed(target, step_s)?,
                StepPolicy::Adaptive { .. } => run.adaptive(target)?,
            }
        };
        debug!(
            samples = run.samples.len(),
            from = initial.epoch_s,
            to = run.t,
            ?termination,
            "propagation finished"
        );
        Ok(Trajectory {
            samples: run.samples,
            termination,
        })
    }
}

/// Mutable integration state for a single call.
struct Run<'a> {
    dynamics: Dynamics<'a>,
    policy: StepPolicy,
    floor: Option<AltitudeFloor>,
    samples: Vec<State>,
    t: f64,
    y: Vector7,
}

enum Accepted {
    Continue,
    Floor(Termination),
}

impl Run<'_> {
    fn fixed(&mut self, target: f64, step_s: f64) -> Result<Termination, IntegrationError> {
        let direction = (target - self.t).signum();
        loop {
            let remaining = target - self.t;
            let last = remaining.abs() <= step_s;
            let h = if last { remaining } else { direction * step_s };
            let y_new = rk4_step(&self.dynamics, self.t, &self.y, h);
            let t_new = if last { target } else { self.t + h };
            if let Accepted::Floor(termination) = self.accept(t_new, y_new, h)? {
                return Ok(termination);
            }
            if last {
                return Ok(Termination::ReachedTarget);
            }
        }
    }

    fn adaptive(&mut self, target: f64) -> Result<Termination, IntegrationError> {
        let StepPolicy::Adaptive {
            initial_step_s,
            min_step_s,
            max_step_s,
            absolute_tolerance,
            relative_tolerance,
            max_steps,
        } = self.policy
        else {
            return Err(IntegrationError::InvalidStepPolicy(
                "adaptive integration needs an adaptive policy".into(),
            ));
        };

        let direction = (target - self.t).signum();
        let mut h = direction * initial_step_s;
        let mut k1 = self.dynamics.derivative(self.t, &self.y);
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            if attempts > max_steps {
                return Err(IntegrationError::StepLimitExceeded {
                    epoch_s: self.t,
                    steps: max_steps,
                });
            }

            let remaining = target - self.t;
            let last = h.abs() >= remaining.abs();
            if last {
                h = remaining;
            }

            let step = dormand_prince_step(&self.dynamics, self.t, &self.y, &k1, h);
            let ratio = error_ratio(
                &step.error,
                &self.y,
                &step.y,
                absolute_tolerance,
                relative_tolerance,
            );
            let factor = if ratio == 0.0 {
                5.0
            } else {
                (0.9 * ratio.powf(-0.2)).clamp(0.2, 5.0)
            };

            if ratio <= 1.0 {
                let t_new = if last { target } else { self.t + h };
                if let Accepted::Floor(termination) = self.accept(t_new, step.y, h)? {
                    return Ok(termination);
                }
                if last {
                    return Ok(Termination::ReachedTarget);
                }
                k1 = step.k_end;
                h = direction * (h.abs() * factor).clamp(min_step_s, max_step_s);
            } else {
                if h.abs() <= min_step_s {
                    return Err(IntegrationError::MinimumStepReached {
                        epoch_s: self.t,
                        attempted_step_s: h,
                        error_ratio: ratio,
                    });
                }
                trace!(epoch_s = self.t, step_s = h, ratio, "step rejected");
                h = direction * (h.abs() * factor).max(min_step_s);
            }
        }
    }

    /// Record an accepted step, checking for non-finite values and the altitude floor.
    fn accept(&mut self, t_new: f64, y_new: Vector7, h: f64) -> Result<Accepted, IntegrationError> {
        let state = self.dynamics.unpack(t_new, &y_new);
        if !state.is_finite() {
            return Err(IntegrationError::NonFiniteState { epoch_s: self.t });
        }
        if let Some(floor) = self.floor {
            if floor.margin(&state) < 0.0 {
                let crossing = self.locate_floor(&floor, h);
                let termination = Termination::AltitudeFloor {
                    epoch_s: crossing.epoch_s,
                    altitude_km: crossing.altitude_km(floor.body_radius_km),
                };
                self.t = crossing.epoch_s;
                self.y = Dynamics::pack(&crossing);
                self.samples.push(crossing);
                return Ok(Accepted::Floor(termination));
            }
        }
        self.t = t_new;
        self.y = y_new;
        self.samples.push(state);
        Ok(Accepted::Continue)
    }

    /// Bisect the step length for the floor crossing inside a step of length `h`.
    fn locate_floor(&self, floor: &AltitudeFloor, h: f64) -> State {
        let advance = |dt: f64| -> State {
            let y = match self.policy {
                StepPolicy::Fixed { .. } => rk4_step(&self.dynamics, self.t, &self.y, dt),
                StepPolicy::Adaptive { .. } => {
                    let k1 = self.dynamics.derivative(self.t, &self.y);
                    dormand_prince_step(&self.dynamics, self.t, &self.y, &k1, dt).y
                }
            };
            self.dynamics.unpack(self.t + dt, &y)
        };

        let (mut lo, mut hi) = (0.0, h);
        let mut crossing = advance(hi);
        for _ in 0..FLOOR_BISECTION_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            let state = advance(mid);
            let margin = floor.margin(&state);
            if margin >= 0.0 {
                lo = mid;
            } else {
                hi = mid;
                crossing = state;
            }
            if margin.abs() <= FLOOR_TOLERANCE_KM {
                crossing = state;
                break;
            }
        }
        crossing
    }
}
