use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use orbital_toolkit::State;
use orbital_toolkit::config::load_scenario;
use orbital_toolkit::core::constants::{EARTH_RADIUS_KM, GEO_ALTITUDE_KM, MU_EARTH};
use orbital_toolkit::forces::{ForceStack, Providers};
use orbital_toolkit::impulsive::transfers::hohmann;
use orbital_toolkit::mission::{BurnFrame, ImpulsiveBurn, Manoeuvre, MissionPlan, Segment};
use orbital_toolkit::optimiser::{
    CancellationToken, ElementTarget, Evaluation, FreeParameter, FreeQuantity, MissionProblem,
    Objective, OptimisationStatus, Optimiser, OptimiserConfig, PartialReason, TargetElement,
};
use orbital_toolkit::propagator::StepPolicy;
use orbital_toolkit::scenario::run_scenario;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("scenarios")
        .join(name)
}

/// Single prograde kick from a 7000 km circle; the target is checked right after the burn.
fn apoapsis_problem() -> MissionProblem {
    let r = 7_000.0;
    let initial = State::new(0.0, [r, 0.0, 0.0], [0.0, (MU_EARTH / r).sqrt(), 0.0]);
    let plan = MissionPlan::new(initial, ForceStack::two_body(MU_EARTH), StepPolicy::default())
        .manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn::in_frame(
            BurnFrame::Vnb,
            [0.1, 0.0, 0.0],
        )));
    MissionProblem::new(plan, MU_EARTH)
        .with_parameter(FreeParameter {
            segment: 0,
            quantity: FreeQuantity::ImpulseComponent(0),
            lower: 0.0,
            upper: 1.5,
        })
        .with_target(ElementTarget {
            element: TargetElement::ApoapsisRadius,
            value: 12_000.0,
            tolerance: 1.0,
        })
}

#[test]
fn optimised_gto_burn_matches_hohmann() {
    let config = load_scenario(scenario_path("gto_hohmann.yaml")).unwrap();
    let run = run_scenario(&config, &Providers::default(), &CancellationToken::new()).unwrap();
    let optimisation = run.optimisation.expect("scenario carries an optimisation block");

    let r1 = EARTH_RADIUS_KM + 400.0;
    let r2 = EARTH_RADIUS_KM + GEO_ALTITUDE_KM;
    let expected = hohmann(r1, r2, MU_EARTH).unwrap();
    assert!(optimisation.feasible);
    assert_eq!(optimisation.constraint_violation, 0.0);
    assert!(
        (optimisation.parameters[0] - expected.dv1_km_s).abs() < 1e-3,
        "dv1 {} vs {}",
        optimisation.parameters[0],
        expected.dv1_km_s
    );

    // The flown plan carries the optimised burn.
    let first = &run.outcome.segment_reports[0];
    assert!((first.delta_v_km_s - optimisation.parameters[0]).abs() < 1e-12);
}

#[test]
fn seeded_restarts_are_reproducible() {
    let problem = apoapsis_problem();
    let settings = OptimiserConfig {
        restarts: 3,
        seed: 42,
        max_iterations: 60,
        ..OptimiserConfig::default()
    };
    let cancel = CancellationToken::new();
    let first = problem.solve(&Optimiser::new(settings), &cancel).unwrap();
    let second = problem.solve(&Optimiser::new(settings), &cancel).unwrap();
    assert_eq!(first, second);
    assert!(first.feasible);

    let other_seed = OptimiserConfig { seed: 7, ..settings };
    let third = problem.solve(&Optimiser::new(other_seed), &cancel).unwrap();
    assert!(third.feasible);
}

#[test]
fn solved_burn_lands_inside_the_tolerance() {
    let problem = apoapsis_problem();
    let outcome = problem
        .solve(&Optimiser::default(), &CancellationToken::new())
        .unwrap();
    assert!(outcome.feasible);
    assert!(outcome.status.is_converged());

    let plan = problem.apply(&outcome.parameters);
    let Segment::Manoeuvre(Manoeuvre::Impulsive(burn)) = &plan.segments[0] else {
        panic!("segment 0 should stay impulsive");
    };
    assert_eq!(burn.delta_v_km_s[0], outcome.parameters[0]);
}

struct CancelAfter {
    inner: MissionProblem,
    token: CancellationToken,
    limit: usize,
    seen: AtomicUsize,
}

impl Objective for CancelAfter {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn evaluate(&self, parameters: &[f64]) -> Evaluation {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
            self.token.cancel();
        }
        self.inner.evaluate(parameters)
    }
}

#[test]
fn cancellation_returns_the_best_candidate_so_far() {
    let token = CancellationToken::new();
    let objective = CancelAfter {
        inner: apoapsis_problem(),
        token: token.clone(),
        limit: 5,
        seen: AtomicUsize::new(0),
    };
    let problem = apoapsis_problem();
    let bounds = problem.bounds().unwrap();
    let outcome = Optimiser::default()
        .minimise(&objective, &bounds, &problem.initial_guess(), &token)
        .unwrap();

    assert_eq!(outcome.evaluations, 5);
    assert_eq!(
        outcome.status,
        OptimisationStatus::PartialConvergence {
            reason: PartialReason::Cancelled
        }
    );
    assert!(outcome.cost.is_finite());
    assert!(bounds.lower()[0] <= outcome.parameters[0] && outcome.parameters[0] <= bounds.upper()[0]);
}
