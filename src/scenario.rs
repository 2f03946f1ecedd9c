//! Load a scenario manifest, optionally optimise it, and fly it.

use std::path::Path;

use orbital_config::{
    ConfigError, CostMetricConfig, FreeQuantityConfig, OptimisationConfig, ScenarioConfig,
    TargetElementConfig, load_scenario,
};
use orbital_core::units::deg_to_rad;
use orbital_forces::Providers;
use orbital_mission::facade::{ScenarioError, plan_from_config};
use orbital_mission::{MissionOutcome, MissionPlan, SequenceError, sequencer};
use orbital_optimiser::{
    CancellationToken, CostMetric, ElementTarget, FreeParameter, FreeQuantity, MissionProblem,
    OptimisationOutcome, Optimiser, OptimiserConfig, OptimiserError, TargetElement,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::logging::{LoggingError, init_logging};

#[derive(Debug, Error)]
pub enum ScenarioRunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Optimiser(#[from] OptimiserError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub name: String,
    /// Present when the scenario carried an optimisation block.
    pub optimisation: Option<OptimisationOutcome>,
    pub outcome: MissionOutcome,
}

/// Build the search problem described by a scenario's optimisation block.
pub fn mission_problem(
    config: &OptimisationConfig,
    plan: MissionPlan,
    mu_km3_s2: f64,
) -> (MissionProblem, OptimiserConfig) {
    let mut problem = MissionProblem::new(plan, mu_km3_s2).with_cost(match config.cost {
        CostMetricConfig::TotalDeltaV => CostMetric::TotalDeltaV,
        CostMetricConfig::PropellantMass => CostMetric::PropellantMass,
        CostMetricConfig::FlightTime => CostMetric::FlightTime,
    });
    for parameter in &config.parameters {
        problem = problem.with_parameter(FreeParameter {
            segment: parameter.segment,
            quantity: match parameter.quantity {
                FreeQuantityConfig::CoastDuration => FreeQuantity::CoastDuration,
                FreeQuantityConfig::BurnDuration => FreeQuantity::BurnDuration,
                FreeQuantityConfig::TransferTimeOfFlight => FreeQuantity::TransferTimeOfFlight,
                FreeQuantityConfig::ImpulseComponent(axis) => FreeQuantity::ImpulseComponent(axis),
            },
            lower: parameter.lower,
            upper: parameter.upper,
        });
    }
    for target in &config.targets {
        let (element, scale) = match target.element {
            TargetElementConfig::SemiMajorAxisKm => (TargetElement::SemiMajorAxis, 1.0),
            TargetElementConfig::Eccentricity => (TargetElement::Eccentricity, 1.0),
            TargetElementConfig::InclinationDeg => (TargetElement::Inclination, deg_to_rad(1.0)),
            TargetElementConfig::ApoapsisRadiusKm => (TargetElement::ApoapsisRadius, 1.0),
            TargetElementConfig::PeriapsisRadiusKm => (TargetElement::PeriapsisRadius, 1.0),
        };
        problem = problem.with_target(ElementTarget {
            element,
            value: target.value * scale,
            tolerance: target.tolerance * scale,
        });
    }

    let defaults = OptimiserConfig::default();
    let settings = OptimiserConfig {
        max_iterations: config.max_iterations.unwrap_or(defaults.max_iterations),
        restarts: config.restarts.unwrap_or(defaults.restarts),
        seed: config.seed.unwrap_or(defaults.seed),
        penalty_weight: config.penalty_weight.unwrap_or(defaults.penalty_weight),
        cost_tolerance: config.cost_tolerance.unwrap_or(defaults.cost_tolerance),
        ..defaults
    };
    (problem, settings)
}

/// Build, optimise when requested, then fly the scenario.
pub fn run_scenario(
    config: &ScenarioConfig,
    providers: &Providers,
    cancel: &CancellationToken,
) -> Result<ScenarioRun, ScenarioRunError> {
    let mut plan = plan_from_config(config, providers)?;
    let mut optimisation = None;

    if let Some(block) = &config.optimisation {
        let (problem, settings) = mission_problem(block, plan.clone(), config.central_body.mu_km3_s2);
        let result = problem.solve(&Optimiser::new(settings), cancel)?;
        plan = problem.apply(&result.parameters);
        optimisation = Some(result);
    }

    let outcome = sequencer::run(&plan)?;
    info!(
        scenario = %config.name,
        segments = outcome.segment_reports.len(),
        samples = outcome.trajectory.len(),
        delta_v_km_s = outcome.total_delta_v_km_s,
        final_epoch_s = outcome.final_state.epoch_s,
        "scenario complete"
    );
    Ok(ScenarioRun {
        name: config.name.clone(),
        optimisation,
        outcome,
    })
}

/// Load a manifest from disk, install its logging settings and run it with the default
/// providers.
pub fn run_scenario_file<P: AsRef<Path>>(path: P) -> Result<ScenarioRun, ScenarioRunError> {
    let config = load_scenario(path)?;
    init_logging(&config.logging)?;
    run_scenario(&config, &Providers::default(), &CancellationToken::new())
}
