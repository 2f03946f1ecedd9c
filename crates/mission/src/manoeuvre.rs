//! Manoeuvre variants and their application to a state.

use orbital_core::State;
use orbital_core::vector::{self, Vector3};
use orbital_forces::ForceStack;
use orbital_impulsive::lambert::{self, LambertBranch, LambertProblem, SolverOptions};
use orbital_lowthrust::{Steering, ThrustForce};
use orbital_orbits::OrbitalElements;
use orbital_propagator::{AltitudeFloor, Propagator, Span, StepPolicy, Termination, Trajectory};
use orbital_propulsion::{Engine, delta_v_km_s, final_mass_after_delta_v};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SegmentError;

/// Frame in which an impulsive Δv is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BurnFrame {
    #[default]
    Inertial,
    /// Velocity, normal (`r × v`), binormal.
    Vnb,
    /// Radial, transverse, normal.
    Rtn,
}

impl BurnFrame {
    /// Rotate `components` from this frame into the inertial frame at `state`.
    pub fn to_inertial(&self, state: &State, components: &Vector3) -> Result<Vector3, SegmentError> {
        let axes = match self {
            BurnFrame::Inertial => return Ok(*components),
            BurnFrame::Vnb => {
                let v = vector::unit(&state.velocity_km_s);
                let n = vector::unit(&vector::cross(&state.position_km, &state.velocity_km_s));
                match (v, n) {
                    (Some(v), Some(n)) => [v, n, vector::cross(&v, &n)],
                    _ => return Err(SegmentError::DegenerateFrame),
                }
            }
            BurnFrame::Rtn => {
                let r = vector::unit(&state.position_km);
                let n = vector::unit(&vector::cross(&state.position_km, &state.velocity_km_s));
                match (r, n) {
                    (Some(r), Some(n)) => [r, vector::cross(&n, &r), n],
                    _ => return Err(SegmentError::DegenerateFrame),
                }
            }
        };
        Ok(axes
            .iter()
            .zip(components)
            .fold(vector::ZERO, |acc, (axis, c)| {
                vector::add(&acc, &vector::scale(axis, *c))
            }))
    }
}

/// Instantaneous velocity change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpulsiveBurn {
    pub delta_v_km_s: Vector3,
    pub frame: BurnFrame,
    /// When set, mass is reduced by the rocket equation.
    pub isp_seconds: Option<f64>,
    /// Mass may not drop below this.
    pub dry_mass_kg: Option<f64>,
    /// Per-burn cap on |Δv|, from the vehicle.
    #[serde(default)]
    pub max_delta_v_km_s: Option<f64>,
}

impl ImpulsiveBurn {
    pub fn inertial(delta_v_km_s: Vector3) -> Self {
        Self {
            delta_v_km_s,
            frame: BurnFrame::Inertial,
            isp_seconds: None,
            dry_mass_kg: None,
            max_delta_v_km_s: None,
        }
    }

    pub fn in_frame(frame: BurnFrame, delta_v_km_s: Vector3) -> Self {
        Self {
            frame,
            ..Self::inertial(delta_v_km_s)
        }
    }

    pub fn with_propellant(mut self, isp_seconds: f64, dry_mass_kg: Option<f64>) -> Self {
        self.isp_seconds = Some(isp_seconds);
        self.dry_mass_kg = dry_mass_kg;
        self
    }

    pub fn with_delta_v_limit(mut self, max_delta_v_km_s: f64) -> Self {
        self.max_delta_v_km_s = Some(max_delta_v_km_s);
        self
    }

    /// Apply the burn. Epoch and position are carried over untouched.
    pub fn apply(&self, state: &State) -> Result<State, SegmentError> {
        let dv = self.frame.to_inertial(state, &self.delta_v_km_s)?;
        if let Some(limit) = self.max_delta_v_km_s {
            let requested = vector::norm(&dv);
            if requested > limit {
                return Err(SegmentError::DeltaVLimitExceeded {
                    requested_km_s: requested,
                    limit_km_s: limit,
                });
            }
        }
        apply_impulse(state, &dv, self.isp_seconds, self.dry_mass_kg)
    }
}

/// Add an inertial Δv, burning propellant when a specific impulse is given.
pub(crate) fn apply_impulse(
    state: &State,
    dv: &Vector3,
    isp_seconds: Option<f64>,
    dry_mass_kg: Option<f64>,
) -> Result<State, SegmentError> {
    let mut next = state.with_velocity(vector::add(&state.velocity_km_s, dv));
    if let (Some(isp), Some(m0)) = (isp_seconds, state.mass_kg) {
        let m_final = final_mass_after_delta_v(isp, m0, vector::norm(dv));
        let dry = dry_mass_kg.unwrap_or(0.0);
        if m_final < dry {
            return Err(SegmentError::PropellantDepleted {
                required_kg: m0 - m_final,
                available_kg: (m0 - dry).max(0.0),
            });
        }
        next = next.with_mass(m_final);
    }
    Ok(next)
}

/// Continuous thrust over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiniteBurn {
    pub engine: Engine,
    pub steering: Steering,
    pub duration_s: f64,
    pub dry_mass_kg: f64,
}

/// Output of a manoeuvre that spans time.
#[derive(Debug, Clone)]
pub struct BurnArc {
    pub trajectory: Trajectory,
    pub delta_v_km_s: f64,
    /// Distance between the reached and the targeted arrival position, for transfers.
    pub arrival_miss_km: Option<f64>,
}

impl FiniteBurn {
    pub fn propellant_required_kg(&self) -> f64 {
        self.engine.propellant_for_duration_kg(self.duration_s)
    }

    /// Propagate under `stack` plus thrust. Fails before integrating if the tank would run dry.
    pub fn execute(
        &self,
        state: &State,
        stack: &ForceStack,
        policy: &StepPolicy,
        floor: Option<AltitudeFloor>,
    ) -> Result<BurnArc, SegmentError> {
        let m0 = state.mass_kg.ok_or_else(|| {
            SegmentError::Configuration("finite burn needs a state that carries mass".into())
        })?;
        self.engine
            .validate()
            .map_err(|err| SegmentError::Configuration(err.to_string()))?;
        if !(self.duration_s > 0.0 && self.duration_s.is_finite()) {
            return Err(SegmentError::Configuration(format!(
                "burn duration {} s must be positive",
                self.duration_s
            )));
        }
        let required = self.propellant_required_kg();
        let available = m0 - self.dry_mass_kg;
        if required > available {
            return Err(SegmentError::PropellantDepleted {
                required_kg: required,
                available_kg: available.max(0.0),
            });
        }

        let thrusting = stack.with(ThrustForce::new(self.engine, self.steering));
        let mut propagator = Propagator::new(&thrusting, *policy);
        if let Some(floor) = floor {
            propagator = propagator.with_altitude_floor(floor);
        }
        let trajectory = propagator.propagate(state, Span::Duration(self.duration_s))?;
        let m_final = trajectory
            .final_state()
            .and_then(|s| s.mass_kg)
            .unwrap_or(m0);
        Ok(BurnArc {
            delta_v_km_s: delta_v_km_s(self.engine.isp_seconds, m0, m_final),
            trajectory,
            arrival_miss_km: None,
        })
    }
}

/// Where a Lambert transfer must arrive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TransferTarget {
    /// Position and velocity to match at arrival; the epoch field is ignored.
    State(State),
    /// Target orbit with the phase (true anomaly) to be reached at arrival.
    Elements(OrbitalElements),
}

impl TransferTarget {
    /// Target state at `arrival_epoch_s`.
    pub fn resolve(&self, mu_km3_s2: f64, arrival_epoch_s: f64) -> Result<State, SegmentError> {
        match self {
            TransferTarget::State(state) => Ok(state.at_epoch(arrival_epoch_s)),
            TransferTarget::Elements(elements) => Ok(elements.to_state(mu_km3_s2, arrival_epoch_s, None)?),
        }
    }
}

/// Two-impulse rendezvous solved as a Lambert problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferBurn {
    pub target: TransferTarget,
    pub time_of_flight_s: f64,
    pub branch: LambertBranch,
    pub mu_km3_s2: f64,
    pub options: SolverOptions,
    pub isp_seconds: Option<f64>,
    pub dry_mass_kg: Option<f64>,
}

impl TransferBurn {
    pub fn new(target: TransferTarget, time_of_flight_s: f64, mu_km3_s2: f64) -> Self {
        Self {
            target,
            time_of_flight_s,
            branch: LambertBranch::default(),
            mu_km3_s2,
            options: SolverOptions::default(),
            isp_seconds: None,
            dry_mass_kg: None,
        }
    }

    pub fn with_branch(mut self, branch: LambertBranch) -> Self {
        self.branch = branch;
        self
    }

    /// Depart, coast the time of flight under `stack`, then match the target velocity.
    pub fn execute(
        &self,
        state: &State,
        stack: &ForceStack,
        policy: &StepPolicy,
        floor: Option<AltitudeFloor>,
    ) -> Result<BurnArc, SegmentError> {
        let arrival_epoch = state.epoch_s + self.time_of_flight_s;
        let target = self.target.resolve(self.mu_km3_s2, arrival_epoch)?;
        let solution = solve_transfer(
            state,
            &target,
            self.time_of_flight_s,
            self.branch,
            self.mu_km3_s2,
            &self.options,
        )?;

        let departed = apply_impulse(
            state,
            &solution.departure_delta_v_km_s,
            self.isp_seconds,
            self.dry_mass_kg,
        )?;
        let mut propagator = Propagator::new(stack, *policy);
        if let Some(floor) = floor {
            propagator = propagator.with_altitude_floor(floor);
        }
        let coast = propagator.propagate(&departed, Span::Duration(self.time_of_flight_s))?;

        let mut samples = vec![*state];
        samples.extend(coast.samples);
        let mut delta_v = vector::norm(&solution.departure_delta_v_km_s);
        let termination = coast.termination;
        let mut arrival_miss_km = None;

        if termination == Termination::ReachedTarget {
            if let Some(arrived) = samples.last().copied() {
                let miss = vector::distance(&arrived.position_km, &target.position_km);
                if miss > 1e-3 {
                    debug!(miss_km = miss, "transfer arrived off target");
                }
                arrival_miss_km = Some(miss);
                let dv = vector::sub(&target.velocity_km_s, &arrived.velocity_km_s);
                let matched = apply_impulse(&arrived, &dv, self.isp_seconds, self.dry_mass_kg)?;
                delta_v += vector::norm(&dv);
                samples.push(matched);
            }
        }

        Ok(BurnArc {
            trajectory: Trajectory {
                samples,
                termination,
            },
            delta_v_km_s: delta_v,
            arrival_miss_km,
        })
    }
}

/// Velocities and impulses connecting two states in a given time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferSolution {
    pub branch: LambertBranch,
    pub departure_velocity_km_s: Vector3,
    pub arrival_velocity_km_s: Vector3,
    pub departure_delta_v_km_s: Vector3,
    pub arrival_delta_v_km_s: Vector3,
    pub total_delta_v_km_s: f64,
}

/// Solve the two-body rendezvous between `departure` and `arrival` positions.
pub fn solve_transfer(
    departure: &State,
    arrival: &State,
    time_of_flight_s: f64,
    branch: LambertBranch,
    mu_km3_s2: f64,
    options: &SolverOptions,
) -> Result<TransferSolution, SegmentError> {
    let problem = LambertProblem {
        r1_km: departure.position_km,
        r2_km: arrival.position_km,
        time_of_flight_s,
        mu_km3_s2,
    };
    let solution = lambert::solve(&problem, branch, options)?;
    let dv1 = vector::sub(&solution.departure_velocity_km_s, &departure.velocity_km_s);
    let dv2 = vector::sub(&arrival.velocity_km_s, &solution.arrival_velocity_km_s);
    Ok(TransferSolution {
        branch,
        departure_velocity_km_s: solution.departure_velocity_km_s,
        arrival_velocity_km_s: solution.arrival_velocity_km_s,
        departure_delta_v_km_s: dv1,
        arrival_delta_v_km_s: dv2,
        total_delta_v_km_s: vector::norm(&dv1) + vector::norm(&dv2),
    })
}

/// The three manoeuvre kinds a segment may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Manoeuvre {
    Impulsive(ImpulsiveBurn),
    FiniteBurn(FiniteBurn),
    Transfer(TransferBurn),
}

impl Manoeuvre {
    pub fn kind(&self) -> &'static str {
        match self {
            Manoeuvre::Impulsive(_) => "impulsive",
            Manoeuvre::FiniteBurn(_) => "finite_burn",
            Manoeuvre::Transfer(_) => "transfer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::constants::MU_EARTH;

    fn leo() -> State {
        let r = 7_000.0;
        State::new(12.5, [r, 0.0, 0.0], [0.0, (MU_EARTH / r).sqrt(), 0.0]).with_mass(1_000.0)
    }

    #[test]
    fn vnb_prograde_burn_adds_speed_along_velocity() {
        let burn = ImpulsiveBurn::in_frame(BurnFrame::Vnb, [0.1, 0.0, 0.0]);
        let after = burn.apply(&leo()).unwrap();
        assert_eq!(after.epoch_s, 12.5);
        assert_eq!(after.position_km, leo().position_km);
        assert!((after.speed_km_s() - leo().speed_km_s() - 0.1).abs() < 1e-12);
        assert_eq!(after.mass_kg, Some(1_000.0));
    }

    #[test]
    fn rtn_transverse_matches_vnb_velocity_on_circular_orbit() {
        let a = ImpulsiveBurn::in_frame(BurnFrame::Rtn, [0.0, 0.2, 0.05]).apply(&leo()).unwrap();
        let b = ImpulsiveBurn::in_frame(BurnFrame::Vnb, [0.2, 0.05, 0.0]).apply(&leo()).unwrap();
        assert!(vector::distance(&a.velocity_km_s, &b.velocity_km_s) < 1e-12);
    }

    #[test]
    fn impulsive_burn_spends_propellant_and_respects_dry_mass() {
        let burn = ImpulsiveBurn::inertial([0.0, 0.5, 0.0]).with_propellant(300.0, Some(900.0));
        let after = burn.apply(&leo()).unwrap();
        let expected = final_mass_after_delta_v(300.0, 1_000.0, 0.5);
        assert!((after.mass_kg.unwrap() - expected).abs() < 1e-9);

        let big = ImpulsiveBurn::inertial([0.0, 2.0, 0.0]).with_propellant(300.0, Some(900.0));
        assert!(matches!(
            big.apply(&leo()),
            Err(SegmentError::PropellantDepleted { .. })
        ));
    }

    #[test]
    fn finite_burn_refuses_to_overdraw_the_tank() {
        let burn = FiniteBurn {
            engine: Engine::new(1_000.0, 300.0).unwrap(),
            steering: Steering::Prograde,
            duration_s: 3_000.0,
            dry_mass_kg: 800.0,
        };
        let err = burn
            .execute(&leo(), &ForceStack::two_body(MU_EARTH), &StepPolicy::default(), None)
            .unwrap_err();
        match err {
            SegmentError::PropellantDepleted {
                required_kg,
                available_kg,
            } => {
                assert!((available_kg - 200.0).abs() < 1e-9);
                assert!(required_kg > available_kg);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn degenerate_vnb_frame_is_reported() {
        let radial = State::new(0.0, [7_000.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let burn = ImpulsiveBurn::in_frame(BurnFrame::Vnb, [0.1, 0.0, 0.0]);
        assert!(matches!(burn.apply(&radial), Err(SegmentError::DegenerateFrame)));
    }
}
