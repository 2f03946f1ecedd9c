use std::f64::consts::TAU;

use orbital_toolkit::State;
use orbital_toolkit::core::constants::{AU_KM, MU_EARTH, MU_SUN};
use orbital_toolkit::core::time::days_to_seconds;
use orbital_toolkit::core::vector;
use orbital_toolkit::impulsive::{
    Direction, LambertBranch, LambertError, LambertProblem, Period, SolverOptions, lambert,
};
use orbital_toolkit::orbits::{OrbitalElements, kepler};

fn assert_reaches_target(problem: &LambertProblem, departure: [f64; 3], arrival: [f64; 3]) {
    let start = State::new(0.0, problem.r1_km, departure);
    let end = kepler::propagate(&start, problem.time_of_flight_s, problem.mu_km3_s2).unwrap();
    let scale = vector::norm(&problem.r2_km);
    assert!(
        vector::distance(&end.position_km, &problem.r2_km) / scale < 1e-7,
        "missed by {} km",
        vector::distance(&end.position_km, &problem.r2_km)
    );
    let speed = vector::norm(&arrival);
    assert!(vector::distance(&end.velocity_km_s, &arrival) / speed < 1e-6);
}

fn inclined_problem(time_of_flight_s: f64) -> LambertProblem {
    let orbit = OrbitalElements {
        semi_major_axis_km: 8_000.0,
        eccentricity: 0.1,
        inclination_rad: 0.9,
        raan_rad: 0.4,
        argument_of_periapsis_rad: 0.2,
        true_anomaly_rad: 0.0,
    };
    let r1 = orbit.to_state(MU_EARTH, 0.0, None).unwrap().position_km;
    let r2 = OrbitalElements {
        semi_major_axis_km: 11_000.0,
        true_anomaly_rad: 2.2,
        ..orbit
    }
    .to_state(MU_EARTH, 0.0, None)
    .unwrap()
    .position_km;
    LambertProblem {
        r1_km: r1,
        r2_km: r2,
        time_of_flight_s,
        mu_km3_s2: MU_EARTH,
    }
}

#[test]
fn zero_revolution_solutions_connect_the_endpoints() {
    let options = SolverOptions::default();
    for tof in [1_500.0, 3_000.0, 6_000.0, 20_000.0] {
        let problem = inclined_problem(tof);
        for direction in [Direction::Prograde, Direction::Retrograde] {
            let solution = lambert::solve(&problem, LambertBranch::zero_rev(direction), &options)
                .unwrap_or_else(|err| panic!("tof {tof}, {direction:?}: {err}"));
            assert_reaches_target(
                &problem,
                solution.departure_velocity_km_s,
                solution.arrival_velocity_km_s,
            );
        }
    }
}

#[test]
fn heliocentric_transfer_connects_earth_and_mars_radii() {
    let r2_angle = 2.6_f64;
    let problem = LambertProblem {
        r1_km: [AU_KM, 0.0, 0.0],
        r2_km: [1.524 * AU_KM * r2_angle.cos(), 1.524 * AU_KM * r2_angle.sin(), 0.0],
        time_of_flight_s: days_to_seconds(230.0),
        mu_km3_s2: MU_SUN,
    };
    let solution = lambert::solve(&problem, LambertBranch::default(), &SolverOptions::default())
        .unwrap();
    assert_reaches_target(
        &problem,
        solution.departure_velocity_km_s,
        solution.arrival_velocity_km_s,
    );
    let h = vector::cross(&problem.r1_km, &solution.departure_velocity_km_s);
    assert!(h[2] > 0.0);
    // Departure speed sits near Earth's orbital speed plus a few km/s.
    let speed = vector::norm(&solution.departure_velocity_km_s);
    assert!(speed > 29.0 && speed < 36.0, "speed {speed}");
}

#[test]
fn both_multi_revolution_branches_connect_the_endpoints() {
    let r = 7_000.0;
    let period = TAU * (r * r * r / MU_EARTH).sqrt();
    let problem = LambertProblem {
        r1_km: [r, 0.0, 0.0],
        r2_km: [0.0, 9_000.0, 1_000.0],
        time_of_flight_s: 3.2 * period,
        mu_km3_s2: MU_EARTH,
    };
    let options = SolverOptions::default();
    for revolutions in [1, 2] {
        let short = lambert::solve(
            &problem,
            LambertBranch::multi_rev(Direction::Prograde, revolutions, Period::ShortPeriod),
            &options,
        )
        .unwrap();
        let long = lambert::solve(
            &problem,
            LambertBranch::multi_rev(Direction::Prograde, revolutions, Period::LongPeriod),
            &options,
        )
        .unwrap();
        assert!(short.semi_major_axis_km <= long.semi_major_axis_km);
        for solution in [short, long] {
            assert_eq!(solution.branch.revolutions, revolutions);
            assert_reaches_target(
                &problem,
                solution.departure_velocity_km_s,
                solution.arrival_velocity_km_s,
            );
        }
    }
}

#[test]
fn too_many_revolutions_for_the_time_of_flight_is_infeasible() {
    let problem = inclined_problem(3_000.0);
    let err = lambert::solve(
        &problem,
        LambertBranch::multi_rev(Direction::Prograde, 3, Period::LongPeriod),
        &SolverOptions::default(),
    )
    .unwrap_err();
    match err {
        LambertError::Infeasible { branch, .. } => assert_eq!(branch.revolutions, 3),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn solve_all_returns_only_working_branches() {
    let r = 7_000.0;
    let period = TAU * (r * r * r / MU_EARTH).sqrt();
    let problem = LambertProblem {
        r1_km: [r, 0.0, 0.0],
        r2_km: [0.0, 9_000.0, 1_000.0],
        time_of_flight_s: 1.6 * period,
        mu_km3_s2: MU_EARTH,
    };
    let solutions = lambert::solve_all(&problem, 4, &SolverOptions::default()).unwrap();
    assert!(!solutions.is_empty());
    assert!(solutions.iter().all(|s| s.branch.revolutions <= 1));
    for solution in &solutions {
        assert_reaches_target(
            &problem,
            solution.departure_velocity_km_s,
            solution.arrival_velocity_km_s,
        );
    }
}
