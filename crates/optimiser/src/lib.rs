//! Derivative-free minimisation of mission objectives.
//!
//! Search failure is never an error here: the optimiser always hands back the best
//! candidate it saw and says how confident it is in it.

pub mod nelder_mead;
pub mod problem;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use nelder_mead::NelderMead;
pub use problem::{CostMetric, ElementTarget, FreeParameter, FreeQuantity, MissionProblem, TargetElement};

/// Something to minimise over a box.
pub trait Objective {
    fn dimension(&self) -> usize;
    fn evaluate(&self, parameters: &[f64]) -> Evaluation;
}

/// Raw cost plus how far the candidate is from satisfying its constraints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub cost: f64,
    /// Zero when every constraint is met.
    pub constraint_violation: f64,
}

impl Evaluation {
    pub fn feasible(cost: f64) -> Self {
        Self {
            cost,
            constraint_violation: 0.0,
        }
    }

    /// A candidate that could not be evaluated at all.
    pub fn failed() -> Self {
        Self {
            cost: f64::INFINITY,
            constraint_violation: f64::INFINITY,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.constraint_violation <= 0.0
    }

    pub fn penalised(&self, weight: f64) -> f64 {
        let value = self.cost + weight * self.constraint_violation.max(0.0);
        if value.is_nan() { f64::INFINITY } else { value }
    }
}

/// Box constraints on the parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, OptimiserError> {
        if lower.len() != upper.len() {
            return Err(OptimiserError::InvalidProblem(format!(
                "{} lower bounds but {} upper bounds",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(OptimiserError::InvalidProblem(format!(
                    "bounds for parameter {i} are empty or not finite: [{lo}, {hi}]"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn widths(&self) -> impl Iterator<Item = f64> + '_ {
        self.lower.iter().zip(&self.upper).map(|(lo, hi)| hi - lo)
    }

    pub fn clamp(&self, point: &[f64]) -> Vec<f64> {
        point
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(x, (lo, hi))| x.clamp(*lo, *hi))
            .collect()
    }

    /// Uniform sample inside the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| rng.gen_range(*lo..=*hi))
            .collect()
    }
}

/// Cooperative cancellation flag shared between the caller and a running search.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimiserConfig {
    /// Stop when the simplex values differ by at most this much.
    pub cost_tolerance: f64,
    /// ... and its vertices by at most this fraction of each bound width.
    pub parameter_tolerance: f64,
    /// Simplex iterations allowed per start.
    pub max_iterations: usize,
    pub penalty_weight: f64,
    /// Initial simplex size as a fraction of each bound width.
    pub initial_step_fraction: f64,
    /// Extra starts drawn at random inside the bounds.
    pub restarts: usize,
    pub seed: u64,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            cost_tolerance: 1e-9,
            parameter_tolerance: 1e-9,
            max_iterations: 500,
            penalty_weight: 1e3,
            initial_step_fraction: 0.1,
            restarts: 0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartialReason {
    IterationLimit,
    Cancelled,
    NoFeasibleCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimisationStatus {
    Converged,
    /// Best-effort result; usable, but check the reason.
    PartialConvergence { reason: PartialReason },
}

impl OptimisationStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, OptimisationStatus::Converged)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimisationOutcome {
    pub parameters: Vec<f64>,
    pub cost: f64,
    pub constraint_violation: f64,
    pub feasible: bool,
    pub status: OptimisationStatus,
    pub iterations: usize,
    pub evaluations: usize,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimiserError {
    #[error("invalid optimisation problem: {0}")]
    InvalidProblem(String),
}

#[derive(Debug, Clone)]
struct Candidate {
    parameters: Vec<f64>,
    evaluation: Evaluation,
    penalised: f64,
    start: usize,
}

impl Candidate {
    /// Feasible beats infeasible; otherwise compare raw cost (feasible) or penalised cost.
    fn beats(&self, other: &Candidate) -> bool {
        match (self.evaluation.is_feasible(), other.evaluation.is_feasible()) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.evaluation.cost < other.evaluation.cost,
            (false, false) => self.penalised < other.penalised,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Optimiser {
    pub config: OptimiserConfig,
}

impl Optimiser {
    pub fn new(config: OptimiserConfig) -> Self {
        Self { config }
    }

    /// Minimise `objective` inside `bounds`, starting from `initial` and then from
    /// `config.restarts` seeded random points.
    pub fn minimise<O: Objective + ?Sized>(
        &self,
        objective: &O,
        bounds: &Bounds,
        initial: &[f64],
        cancel: &CancellationToken,
    ) -> Result<OptimisationOutcome, OptimiserError> {
        self.check(objective.dimension(), bounds, initial)?;
        let config = &self.config;
        let steps: Vec<f64> = bounds
            .widths()
            .map(|w| w * config.initial_step_fraction)
            .collect();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut best: Option<Candidate> = None;
        let mut converged_starts = vec![false; config.restarts + 1];
        let mut iterations = 0;
        let mut evaluations = 0;
        let mut cancelled = false;

        'starts: for start in 0..=config.restarts {
            let origin = if start == 0 {
                bounds.clamp(initial)
            } else {
                bounds.sample(&mut rng)
            };
            let mut simplex = NelderMead::new(&origin, &steps, bounds.clone());
            loop {
                if cancel.is_cancelled() {
                    cancelled = true;
                    iterations += simplex.iterations();
                    break 'starts;
                }
                if simplex.at_iteration_boundary() {
                    if simplex.converged(config.cost_tolerance, config.parameter_tolerance) {
                        converged_starts[start] = true;
                        break;
                    }
                    if simplex.iterations() >= config.max_iterations {
                        break;
                    }
                }
                let parameters = simplex.ask();
                let evaluation = objective.evaluate(&parameters);
                evaluations += 1;
                let penalised = evaluation.penalised(config.penalty_weight);
                simplex.tell(penalised);

                let candidate = Candidate {
                    parameters,
                    evaluation,
                    penalised,
                    start,
                };
                if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                    best = Some(candidate);
                }
            }
            iterations += simplex.iterations();
            debug!(
                start,
                iterations = simplex.iterations(),
                converged = converged_starts[start],
                best = simplex.best().1,
                "simplex run finished"
            );
        }

        let outcome = match best {
            None => OptimisationOutcome {
                parameters: bounds.clamp(initial),
                cost: f64::INFINITY,
                constraint_violation: f64::INFINITY,
                feasible: false,
                status: OptimisationStatus::PartialConvergence {
                    reason: PartialReason::Cancelled,
                },
                iterations,
                evaluations,
            },
            Some(best) => {
                let feasible = best.evaluation.is_feasible();
                let status = if cancelled {
                    OptimisationStatus::PartialConvergence {
                        reason: PartialReason::Cancelled,
                    }
                } else if !feasible {
                    OptimisationStatus::PartialConvergence {
                        reason: PartialReason::NoFeasibleCandidate,
                    }
                } else if converged_starts[best.start] {
                    OptimisationStatus::Converged
                } else {
                    OptimisationStatus::PartialConvergence {
                        reason: PartialReason::IterationLimit,
                    }
                };
                OptimisationOutcome {
                    parameters: best.parameters,
                    cost: best.evaluation.cost,
                    constraint_violation: best.evaluation.constraint_violation,
                    feasible,
                    status,
                    iterations,
                    evaluations,
                }
            }
        };

        match outcome.status {
            OptimisationStatus::Converged => info!(
                cost = outcome.cost,
                iterations,
                evaluations,
                "optimisation converged"
            ),
            OptimisationStatus::PartialConvergence { reason } => warn!(
                ?reason,
                cost = outcome.cost,
                violation = outcome.constraint_violation,
                iterations,
                evaluations,
                "optimisation returned a partially converged result"
            ),
        }
        Ok(outcome)
    }

    fn check(&self, dimension: usize, bounds: &Bounds, initial: &[f64]) -> Result<(), OptimiserError> {
        if dimension == 0 {
            return Err(OptimiserError::InvalidProblem(
                "objective has no free parameters".into(),
            ));
        }
        if bounds.len() != dimension || initial.len() != dimension {
            return Err(OptimiserError::InvalidProblem(format!(
                "objective has {dimension} parameters but bounds have {} and the start point {}",
                bounds.len(),
                initial.len()
            )));
        }
        if initial.iter().any(|x| !x.is_finite()) {
            return Err(OptimiserError::InvalidProblem(
                "start point is not finite".into(),
            ));
        }
        let config = &self.config;
        let positive = |value: f64| value > 0.0 && value.is_finite();
        if !(positive(config.initial_step_fraction)
            && config.cost_tolerance >= 0.0
            && config.parameter_tolerance >= 0.0
            && config.penalty_weight >= 0.0)
        {
            return Err(OptimiserError::InvalidProblem(format!(
                "optimiser settings are out of range: {config:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Bowl {
        centre: Vec<f64>,
        calls: Cell<usize>,
    }

    impl Objective for Bowl {
        fn dimension(&self) -> usize {
            self.centre.len()
        }

        fn evaluate(&self, x: &[f64]) -> Evaluation {
            self.calls.set(self.calls.get() + 1);
            Evaluation::feasible(x.iter().zip(&self.centre).map(|(a, b)| (a - b).powi(2)).sum())
        }
    }

    fn bowl() -> Bowl {
        Bowl {
            centre: vec![0.3, -0.7, 1.1],
            calls: Cell::new(0),
        }
    }

    fn unit_box(n: usize) -> Bounds {
        Bounds::new(vec![-2.0; n], vec![2.0; n]).unwrap()
    }

    #[test]
    fn converges_on_a_quadratic_bowl() {
        let optimiser = Optimiser::new(OptimiserConfig {
            cost_tolerance: 1e-14,
            parameter_tolerance: 1e-8,
            ..OptimiserConfig::default()
        });
        let outcome = optimiser
            .minimise(&bowl(), &unit_box(3), &[0.0; 3], &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.status, OptimisationStatus::Converged);
        for (x, c) in outcome.parameters.iter().zip([0.3, -0.7, 1.1]) {
            assert!((x - c).abs() < 1e-5, "{x} vs {c}");
        }
    }

    #[test]
    fn seeded_restarts_are_reproducible() {
        let optimiser = Optimiser::new(OptimiserConfig {
            restarts: 3,
            seed: 42,
            max_iterations: 40,
            ..OptimiserConfig::default()
        });
        let token = CancellationToken::new();
        let a = optimiser.minimise(&bowl(), &unit_box(3), &[1.0; 3], &token).unwrap();
        let b = optimiser.minimise(&bowl(), &unit_box(3), &[1.0; 3], &token).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn iteration_cap_yields_partial_convergence() {
        let optimiser = Optimiser::new(OptimiserConfig {
            max_iterations: 3,
            cost_tolerance: 0.0,
            parameter_tolerance: 0.0,
            ..OptimiserConfig::default()
        });
        let objective = bowl();
        let outcome = optimiser
            .minimise(&objective, &unit_box(3), &[1.5; 3], &CancellationToken::new())
            .unwrap();
        assert_eq!(
            outcome.status,
            OptimisationStatus::PartialConvergence {
                reason: PartialReason::IterationLimit
            }
        );
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.evaluations, objective.calls.get());
        assert!(outcome.cost.is_finite());
    }

    #[test]
    fn cancelled_search_returns_best_so_far() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = Optimiser::default()
            .minimise(&bowl(), &unit_box(3), &[0.5; 3], &token)
            .unwrap();
        assert_eq!(
            outcome.status,
            OptimisationStatus::PartialConvergence {
                reason: PartialReason::Cancelled
            }
        );
        assert_eq!(outcome.evaluations, 0);
        assert_eq!(outcome.parameters, vec![0.5; 3]);
    }

    #[test]
    fn infeasible_everywhere_is_flagged_not_raised() {
        struct Impossible;
        impl Objective for Impossible {
            fn dimension(&self) -> usize {
                1
            }
            fn evaluate(&self, x: &[f64]) -> Evaluation {
                Evaluation {
                    cost: x[0].abs(),
                    constraint_violation: 1.0 + x[0] * x[0],
                }
            }
        }
        let outcome = Optimiser::default()
            .minimise(&Impossible, &unit_box(1), &[1.0], &CancellationToken::new())
            .unwrap();
        assert!(!outcome.feasible);
        assert_eq!(
            outcome.status,
            OptimisationStatus::PartialConvergence {
                reason: PartialReason::NoFeasibleCandidate
            }
        );
        assert!(outcome.parameters[0].abs() < 1e-3);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = Optimiser::default()
            .minimise(&bowl(), &unit_box(2), &[0.0; 2], &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, OptimiserError::InvalidProblem(_)));
        assert!(Bounds::new(vec![1.0], vec![0.0]).is_err());
    }
}
