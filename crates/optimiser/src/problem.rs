//! A mission plan exposed as an [`Objective`] over selected segment parameters.

use orbital_mission::{Manoeuvre, MissionOutcome, MissionPlan, Segment, sequencer};
use orbital_orbits::OrbitalElements;
use orbital_propagator::Span;
use serde::Serialize;
use tracing::trace;

use crate::{Bounds, CancellationToken, Evaluation, Objective, OptimisationOutcome, Optimiser, OptimiserError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FreeQuantity {
    CoastDuration,
    BurnDuration,
    TransferTimeOfFlight,
    /// Component of an impulsive Δv, in the burn's own frame.
    ImpulseComponent(usize),
}

/// One tunable value of one segment, with its search interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FreeParameter {
    pub segment: usize,
    pub quantity: FreeQuantity,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetElement {
    SemiMajorAxis,
    Eccentricity,
    /// Radians.
    Inclination,
    ApoapsisRadius,
    PeriapsisRadius,
}

impl TargetElement {
    pub fn of(&self, elements: &OrbitalElements) -> f64 {
        match self {
            TargetElement::SemiMajorAxis => elements.semi_major_axis_km,
            TargetElement::Eccentricity => elements.eccentricity,
            TargetElement::Inclination => elements.inclination_rad,
            TargetElement::ApoapsisRadius => elements.apoapsis_radius_km(),
            TargetElement::PeriapsisRadius => elements.periapsis_radius_km(),
        }
    }
}

/// Requirement `|element - value| <= tolerance` on the final orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementTarget {
    pub element: TargetElement,
    pub value: f64,
    pub tolerance: f64,
}

impl ElementTarget {
    /// Excess error in units of the tolerance; zero inside the band.
    pub fn violation(&self, elements: &OrbitalElements) -> f64 {
        let error = (self.element.of(elements) - self.value).abs();
        let excess = (error - self.tolerance) / self.tolerance;
        if excess.is_nan() { f64::INFINITY } else { excess.max(0.0) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CostMetric {
    #[default]
    TotalDeltaV,
    PropellantMass,
    FlightTime,
}

impl CostMetric {
    pub fn of(&self, plan: &MissionPlan, outcome: &MissionOutcome) -> f64 {
        match self {
            CostMetric::TotalDeltaV => outcome.total_delta_v_km_s,
            CostMetric::PropellantMass => match (plan.initial.mass_kg, outcome.final_state.mass_kg) {
                (Some(before), Some(after)) => before - after,
                _ => 0.0,
            },
            CostMetric::FlightTime => outcome.final_state.epoch_s - plan.initial.epoch_s,
        }
    }
}

/// Sequencer run as a black-box cost function.
#[derive(Debug, Clone)]
pub struct MissionProblem {
    pub plan: MissionPlan,
    pub parameters: Vec<FreeParameter>,
    pub targets: Vec<ElementTarget>,
    pub cost: CostMetric,
    /// Gravitational parameter used to read elements off the final state.
    pub mu_km3_s2: f64,
}

impl MissionProblem {
    pub fn new(plan: MissionPlan, mu_km3_s2: f64) -> Self {
        Self {
            plan,
            parameters: Vec::new(),
            targets: Vec::new(),
            cost: CostMetric::default(),
            mu_km3_s2,
        }
    }

    pub fn with_parameter(mut self, parameter: FreeParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_target(mut self, target: ElementTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_cost(mut self, cost: CostMetric) -> Self {
        self.cost = cost;
        self
    }

    /// Check that every free parameter names a segment of the right kind and every
    /// target has a usable tolerance.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        for (i, parameter) in self.parameters.iter().enumerate() {
            let segment = self.plan.segments.get(parameter.segment).ok_or_else(|| {
                OptimiserError::InvalidProblem(format!(
                    "parameter {i} refers to segment {} but the plan has {}",
                    parameter.segment,
                    self.plan.segments.len()
                ))
            })?;
            let fits = matches!(
                (parameter.quantity, segment),
                (FreeQuantity::CoastDuration, Segment::Coast(_))
                    | (FreeQuantity::BurnDuration, Segment::Manoeuvre(Manoeuvre::FiniteBurn(_)))
                    | (FreeQuantity::TransferTimeOfFlight, Segment::Manoeuvre(Manoeuvre::Transfer(_)))
            ) || matches!(
                (parameter.quantity, segment),
                (FreeQuantity::ImpulseComponent(axis), Segment::Manoeuvre(Manoeuvre::Impulsive(_))) if axis < 3
            );
            if !fits {
                return Err(OptimiserError::InvalidProblem(format!(
                    "parameter {i} ({:?}) does not apply to segment {} ({})",
                    parameter.quantity,
                    parameter.segment,
                    segment.kind()
                )));
            }
        }
        for (i, target) in self.targets.iter().enumerate() {
            if !(target.tolerance > 0.0 && target.tolerance.is_finite() && target.value.is_finite()) {
                return Err(OptimiserError::InvalidProblem(format!(
                    "target {i} needs a finite value and a positive tolerance"
                )));
            }
        }
        if !(self.mu_km3_s2 > 0.0) {
            return Err(OptimiserError::InvalidProblem(
                "gravitational parameter must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<Bounds, OptimiserError> {
        Bounds::new(
            self.parameters.iter().map(|p| p.lower).collect(),
            self.parameters.iter().map(|p| p.upper).collect(),
        )
    }

    /// Current plan values of the free parameters.
    pub fn initial_guess(&self) -> Vec<f64> {
        self.parameters
            .iter()
            .map(|p| {
                let value = match (p.quantity, self.plan.segments.get(p.segment)) {
                    (FreeQuantity::CoastDuration, Some(Segment::Coast(Span::Duration(d)))) => *d,
                    (FreeQuantity::BurnDuration, Some(Segment::Manoeuvre(Manoeuvre::FiniteBurn(b)))) => {
                        b.duration_s
                    }
                    (
                        FreeQuantity::TransferTimeOfFlight,
                        Some(Segment::Manoeuvre(Manoeuvre::Transfer(t))),
                    ) => t.time_of_flight_s,
                    (
                        FreeQuantity::ImpulseComponent(axis),
                        Some(Segment::Manoeuvre(Manoeuvre::Impulsive(b))),
                    ) if axis < 3 => b.delta_v_km_s[axis],
                    _ => 0.5 * (p.lower + p.upper),
                };
                value.clamp(p.lower, p.upper)
            })
            .collect()
    }

    /// Copy of the plan with `values` written into the free parameters.
    pub fn apply(&self, values: &[f64]) -> MissionPlan {
        let mut plan = self.plan.clone();
        for (parameter, value) in self.parameters.iter().zip(values) {
            let Some(segment) = plan.segments.get_mut(parameter.segment) else {
                continue;
            };
            match (parameter.quantity, segment) {
                (FreeQuantity::CoastDuration, Segment::Coast(span)) => *span = Span::Duration(*value),
                (FreeQuantity::BurnDuration, Segment::Manoeuvre(Manoeuvre::FiniteBurn(burn))) => {
                    burn.duration_s = *value
                }
                (FreeQuantity::TransferTimeOfFlight, Segment::Manoeuvre(Manoeuvre::Transfer(t))) => {
                    t.time_of_flight_s = *value
                }
                (FreeQuantity::ImpulseComponent(axis), Segment::Manoeuvre(Manoeuvre::Impulsive(burn)))
                    if axis < 3 =>
                {
                    burn.delta_v_km_s[axis] = *value
                }
                _ => {}
            }
        }
        plan
    }

    /// Validate, then minimise from the plan's current values.
    pub fn solve(
        &self,
        optimiser: &Optimiser,
        cancel: &CancellationToken,
    ) -> Result<OptimisationOutcome, OptimiserError> {
        self.validate()?;
        let bounds = self.bounds()?;
        optimiser.minimise(self, &bounds, &self.initial_guess(), cancel)
    }
}

impl Objective for MissionProblem {
    fn dimension(&self) -> usize {
        self.parameters.len()
    }

    fn evaluate(&self, parameters: &[f64]) -> Evaluation {
        let plan = self.apply(parameters);
        let outcome = match sequencer::run(&plan) {
            Ok(outcome) => outcome,
            Err(err) => {
                trace!(error = %err, ?parameters, "candidate failed to fly");
                return Evaluation::failed();
            }
        };
        let cost = self.cost.of(&plan, &outcome);
        let constraint_violation = if self.targets.is_empty() {
            0.0
        } else {
            match OrbitalElements::from_state(&outcome.final_state, self.mu_km3_s2) {
                Ok(elements) => self.targets.iter().map(|t| t.violation(&elements)).sum(),
                Err(_) => f64::INFINITY,
            }
        };
        Evaluation {
            cost,
            constraint_violation,
        }
    }
}
