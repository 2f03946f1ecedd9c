use std::f64::consts::TAU;

use orbital_toolkit::State;
use orbital_toolkit::config::{AtmosphereModelConfig, ForceModelConfig};
use orbital_toolkit::core::constants::{EARTH_RADIUS_KM, J2_EARTH, MU_EARTH};
use orbital_toolkit::core::vector;
use orbital_toolkit::forces::{
    CircularEphemeris, ForceModel, ForceStack, Gravity, Providers, SolarRadiationPressure, Zonal,
};
use orbital_toolkit::orbits::{OrbitalElements, angular_momentum, kepler, specific_energy};
use orbital_toolkit::propagator::{
    AltitudeFloor, IntegrationError, Propagator, Span, StepPolicy, Termination, propagate,
};

fn circular(radius_km: f64) -> State {
    State::new(0.0, [radius_km, 0.0, 0.0], [0.0, (MU_EARTH / radius_km).sqrt(), 0.0])
}

fn period(a: f64) -> f64 {
    TAU * (a.powi(3) / MU_EARTH).sqrt()
}

fn eccentric() -> State {
    OrbitalElements {
        semi_major_axis_km: 9_000.0,
        eccentricity: 0.2,
        inclination_rad: 0.5,
        raan_rad: 0.3,
        argument_of_periapsis_rad: 1.0,
        true_anomaly_rad: 0.1,
    }
    .to_state(MU_EARTH, 0.0, None)
    .unwrap()
}

#[test]
fn two_body_conserves_energy_and_angular_momentum() {
    let stack = ForceStack::two_body(MU_EARTH);
    let start = eccentric();
    let trajectory = propagate(
        &start,
        &stack,
        Span::Duration(period(9_000.0)),
        &StepPolicy::adaptive(1e-12, 1e-12),
    )
    .unwrap();

    let e0 = specific_energy(&start, MU_EARTH);
    let h0 = angular_momentum(&start);
    for sample in &trajectory.samples {
        let e = specific_energy(sample, MU_EARTH);
        assert!(((e - e0) / e0).abs() < 1e-9, "energy drift at t = {}", sample.epoch_s);
        let h = angular_momentum(sample);
        assert!(vector::distance(&h, &h0) / vector::norm(&h0) < 1e-9);
    }
}

#[test]
fn adaptive_and_fixed_agree_with_kepler() {
    let stack = ForceStack::two_body(MU_EARTH);
    let start = eccentric();
    let dt = 0.7 * period(9_000.0);
    let exact = kepler::propagate(&start, dt, MU_EARTH).unwrap();

    let adaptive = propagate(&start, &stack, Span::Duration(dt), &StepPolicy::adaptive(1e-12, 1e-12))
        .unwrap();
    let end = adaptive.final_state().unwrap();
    assert_eq!(end.epoch_s, dt);
    assert!(vector::distance(&end.position_km, &exact.position_km) < 1e-4);

    let fixed = propagate(&start, &stack, Span::Duration(dt), &StepPolicy::Fixed { step_s: 5.0 })
        .unwrap();
    let end = fixed.final_state().unwrap();
    assert!(vector::distance(&end.position_km, &exact.position_km) < 1e-2);
}

#[test]
fn forward_then_backward_returns_to_start() {
    let stack = ForceStack::two_body(MU_EARTH);
    let start = eccentric();
    let policy = StepPolicy::adaptive(1e-12, 1e-12);
    let out = propagate(&start, &stack, Span::Duration(10_000.0), &policy).unwrap();
    let back = propagate(out.final_state().unwrap(), &stack, Span::ToEpoch(0.0), &policy).unwrap();
    let end = back.final_state().unwrap();

    assert_eq!(end.epoch_s, 0.0);
    assert!(vector::distance(&end.position_km, &start.position_km) < 1e-4);
    assert!(vector::distance(&end.velocity_km_s, &start.velocity_km_s) < 1e-7);
    let epochs: Vec<f64> = back.samples.iter().map(|s| s.epoch_s).collect();
    assert!(epochs.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn propagation_is_reproducible() {
    let stack = ForceStack::two_body(MU_EARTH).with(Gravity::with_zonal(0.0, Zonal::earth()));
    let a = propagate(&eccentric(), &stack, Span::Duration(3_000.0), &StepPolicy::default()).unwrap();
    let b = propagate(&eccentric(), &stack, Span::Duration(3_000.0), &StepPolicy::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn j2_regresses_the_node_of_a_prograde_orbit() {
    let elements = OrbitalElements {
        semi_major_axis_km: 6_778.136_3,
        eccentricity: 0.001,
        inclination_rad: 51.6_f64.to_radians(),
        raan_rad: 1.0,
        argument_of_periapsis_rad: 0.0,
        true_anomaly_rad: 0.0,
    };
    let start = elements.to_state(MU_EARTH, 0.0, None).unwrap();
    let mut stack = ForceStack::new();
    stack.push(std::sync::Arc::new(Gravity::with_zonal(MU_EARTH, Zonal::earth_j2())));

    let day = 86_400.0;
    let trajectory = propagate(&start, &stack, Span::Duration(day), &StepPolicy::default()).unwrap();
    let end = OrbitalElements::from_state(trajectory.final_state().unwrap(), MU_EARTH).unwrap();

    let a = elements.semi_major_axis_km;
    let n = (MU_EARTH / a.powi(3)).sqrt();
    let p = a * (1.0 - elements.eccentricity.powi(2));
    let expected = -1.5 * n * J2_EARTH * (EARTH_RADIUS_KM / p).powi(2) * elements.inclination_rad.cos() * day;
    let drift = end.raan_rad - elements.raan_rad;
    assert!(drift < 0.0);
    assert!(((drift - expected) / expected).abs() < 0.05, "drift {drift}, expected {expected}");
}

#[test]
fn drag_lowers_the_semi_major_axis() {
    let providers = Providers::default();
    let configs = vec![
        ForceModelConfig::Gravity {
            mu_km3_s2: Some(MU_EARTH),
            body_radius_km: None,
            j2: None,
            j3: None,
        },
        ForceModelConfig::Drag {
            drag_coefficient: Some(2.2),
            area_m2: Some(1.0),
            mass_kg: Some(100.0),
            body_radius_km: Some(EARTH_RADIUS_KM),
            rotation_rate_rad_s: None,
            atmosphere: AtmosphereModelConfig::Ussa76,
            wind: None,
        },
    ];
    let stack = ForceStack::assemble(&configs, &providers).unwrap();
    let r = EARTH_RADIUS_KM + 250.0;
    let start = circular(r);
    let trajectory = propagate(&start, &stack, Span::Duration(period(r)), &StepPolicy::default()).unwrap();
    let a0 = OrbitalElements::from_state(&start, MU_EARTH).unwrap().semi_major_axis_km;
    let a1 = OrbitalElements::from_state(trajectory.final_state().unwrap(), MU_EARTH)
        .unwrap()
        .semi_major_axis_km;
    assert!(a1 < a0 - 0.1, "a0 = {a0}, a1 = {a1}");
}

#[test]
fn solar_pressure_switches_off_in_shadow() {
    let srp = SolarRadiationPressure {
        reflectivity_coefficient: 1.3,
        area_m2: 10.0,
        fallback_mass_kg: Some(100.0),
        body_radius_km: EARTH_RADIUS_KM,
        sun: CircularEphemeris::sun_from_earth().into_provider("sun"),
    };
    // The circular solar ephemeris puts the Sun on +x at epoch zero.
    let sunlit = State::new(0.0, [7_000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
    let eclipsed = State::new(0.0, [-7_000.0, 0.0, 0.0], [0.0, -7.5, 0.0]);
    assert!(!srp.in_shadow(&sunlit));
    assert!(srp.in_shadow(&eclipsed));
    assert_eq!(srp.acceleration(&eclipsed), vector::ZERO);
    let push = srp.acceleration(&sunlit);
    assert!(push[0] < 0.0 && vector::norm(&push) > 0.0);
}

#[test]
fn altitude_floor_stops_a_falling_vehicle() {
    let stack = ForceStack::two_body(MU_EARTH);
    let start = State::new(0.0, [EARTH_RADIUS_KM + 300.0, 0.0, 0.0], [-1.0, 1.0, 0.0]);
    let floor = AltitudeFloor {
        body_radius_km: EARTH_RADIUS_KM,
        min_altitude_km: 100.0,
    };
    let trajectory = Propagator::new(&stack, StepPolicy::default())
        .with_altitude_floor(floor)
        .propagate(&start, Span::Duration(7_200.0))
        .unwrap();
    let Termination::AltitudeFloor { epoch_s, altitude_km } = trajectory.termination else {
        panic!("expected the floor to stop propagation");
    };
    assert!((altitude_km - 100.0).abs() < 1e-3);
    assert!(epoch_s > 0.0 && epoch_s < 7_200.0);
    assert_eq!(trajectory.final_state().unwrap().epoch_s, epoch_s);
}

#[test]
fn impossible_tolerance_fails_instead_of_accepting_the_step() {
    let stack = ForceStack::two_body(MU_EARTH);
    let policy = StepPolicy::Adaptive {
        initial_step_s: 60.0,
        min_step_s: 30.0,
        max_step_s: 600.0,
        absolute_tolerance: 1e-16,
        relative_tolerance: 1e-16,
        max_steps: 1_000,
    };
    let err = propagate(&circular(7_000.0), &stack, Span::Duration(600.0), &policy).unwrap_err();
    match err {
        IntegrationError::MinimumStepReached {
            attempted_step_s,
            error_ratio,
            ..
        } => {
            assert!(attempted_step_s.abs() <= 30.0);
            assert!(error_ratio > 1.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
}
