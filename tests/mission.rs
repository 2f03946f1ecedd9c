use orbital_toolkit::State;
use orbital_toolkit::core::constants::{EARTH_RADIUS_KM, G0, GEO_ALTITUDE_KM, MU_EARTH};
use orbital_toolkit::core::vector;
use orbital_toolkit::forces::{ForceStack, Gravity, Zonal};
use orbital_toolkit::impulsive::LambertError;
use orbital_toolkit::impulsive::transfers::hohmann;
use orbital_toolkit::lowthrust::Steering;
use orbital_toolkit::mission::{
    BurnFrame, FiniteBurn, ImpulsiveBurn, Manoeuvre, MissionPlan, Segment, SegmentError,
    Sequencer, SequencerStatus, TransferBurn, TransferTarget, sequencer,
};
use orbital_toolkit::orbits::OrbitalElements;
use orbital_toolkit::propagator::{AltitudeFloor, Span, StepPolicy, Termination};
use orbital_toolkit::propulsion::Engine;

fn circular(radius_km: f64, mass_kg: f64) -> State {
    State::new(0.0, [radius_km, 0.0, 0.0], [0.0, (MU_EARTH / radius_km).sqrt(), 0.0])
        .with_mass(mass_kg)
}

fn tight() -> StepPolicy {
    StepPolicy::adaptive(1e-10, 1e-12)
}

#[test]
fn hohmann_sequence_reaches_geostationary_radius() {
    let r1 = EARTH_RADIUS_KM + 400.0;
    let r2 = EARTH_RADIUS_KM + GEO_ALTITUDE_KM;
    let transfer = hohmann(r1, r2, MU_EARTH).unwrap();

    let plan = MissionPlan::new(circular(r1, 2_000.0), ForceStack::two_body(MU_EARTH), tight())
        .manoeuvre(Manoeuvre::Impulsive(
            ImpulsiveBurn::in_frame(BurnFrame::Vnb, [transfer.dv1_km_s, 0.0, 0.0])
                .with_propellant(320.0, Some(500.0)),
        ))
        .coast(transfer.tof_seconds)
        .manoeuvre(Manoeuvre::Impulsive(
            ImpulsiveBurn::in_frame(BurnFrame::Vnb, [transfer.dv2_km_s, 0.0, 0.0])
                .with_propellant(320.0, Some(500.0)),
        ));
    let outcome = sequencer::run(&plan).unwrap();

    assert_eq!(outcome.segment_reports.len(), 3);
    assert_eq!(outcome.termination, Termination::ReachedTarget);
    let radius = outcome.final_state.radius_km();
    assert!(((radius - r2) / r2).abs() < 1e-3, "radius {radius}");
    let elements = OrbitalElements::from_state(&outcome.final_state, MU_EARTH).unwrap();
    assert!(((elements.semi_major_axis_km - r2) / r2).abs() < 1e-3);
    assert!(elements.eccentricity < 1e-3);
    let dv_error = (outcome.total_delta_v_km_s - transfer.dv_total_km_s) / transfer.dv_total_km_s;
    assert!(dv_error.abs() < 1e-3);

    let expected_mass = 2_000.0 * (-outcome.total_delta_v_km_s * 1_000.0 / (320.0 * G0)).exp();
    let mass = outcome.final_state.mass_kg.unwrap();
    assert!((mass - expected_mass).abs() < 1e-6);
    let burned: f64 = outcome.segment_reports.iter().map(|r| r.propellant_used_kg).sum();
    assert!((burned - (2_000.0 - mass)).abs() < 1e-6);
}

#[test]
fn finite_burn_consumes_propellant_at_the_engine_flow_rate() {
    let engine = Engine::new(10.0, 300.0).unwrap();
    let burn = FiniteBurn {
        engine,
        steering: Steering::Prograde,
        duration_s: 600.0,
        dry_mass_kg: 500.0,
    };
    let start = circular(7_000.0, 1_000.0);
    let plan = MissionPlan::new(start, ForceStack::two_body(MU_EARTH), StepPolicy::default())
        .coast(100.0)
        .manoeuvre(Manoeuvre::FiniteBurn(burn));
    let outcome = sequencer::run(&plan).unwrap();

    let expected = 1_000.0 - engine.mass_flow_rate_kg_s() * 600.0;
    let mass = outcome.final_state.mass_kg.unwrap();
    assert!((mass - expected).abs() < 1e-6, "mass {mass}, expected {expected}");

    let report = &outcome.segment_reports[1];
    assert_eq!(report.kind, "finite_burn");
    assert!((report.end_epoch_s - 700.0).abs() < 1e-9);
    assert!(report.delta_v_km_s > 0.0);
    // prograde thrust raises the orbit
    let elements = OrbitalElements::from_state(&outcome.final_state, MU_EARTH).unwrap();
    assert!(elements.semi_major_axis_km > 7_000.0);
}

#[test]
fn depleted_tank_reports_the_failing_segment() {
    let burn = FiniteBurn {
        engine: Engine::new(10.0, 300.0).unwrap(),
        steering: Steering::Prograde,
        duration_s: 600.0,
        dry_mass_kg: 999.0,
    };
    let plan = MissionPlan::new(
        circular(7_000.0, 1_000.0),
        ForceStack::two_body(MU_EARTH),
        StepPolicy::default(),
    )
    .coast(60.0)
    .manoeuvre(Manoeuvre::FiniteBurn(burn))
    .coast(60.0);

    let mut sequencer = Sequencer::new(&plan).unwrap();
    assert_eq!(sequencer.status(), SequencerStatus::Idle);
    assert_eq!(sequencer.step().unwrap(), SequencerStatus::Propagating { segment: 0 });
    let err = sequencer.step().unwrap_err();
    assert_eq!(err.segment_index, 1);
    match err.source {
        SegmentError::PropellantDepleted {
            required_kg,
            available_kg,
        } => {
            assert!(required_kg > available_kg);
            assert!((available_kg - 1.0).abs() < 1e-9);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(sequencer.status(), SequencerStatus::Failed { segment: 1 });
    assert_eq!(sequencer.step().unwrap_err().segment_index, 1);
    assert_eq!(sequencer.reports().len(), 1);
}

#[test]
fn transfer_segment_arrives_on_the_target_orbit() {
    let target = OrbitalElements {
        semi_major_axis_km: 9_000.0,
        eccentricity: 0.0,
        inclination_rad: 0.0,
        raan_rad: 0.0,
        argument_of_periapsis_rad: 0.0,
        true_anomaly_rad: 2.0,
    };
    let tof = 3_000.0;
    let transfer = TransferBurn::new(TransferTarget::Elements(target), tof, MU_EARTH);
    let plan = MissionPlan::new(circular(7_000.0, 1_000.0), ForceStack::two_body(MU_EARTH), tight())
        .manoeuvre(Manoeuvre::Transfer(transfer));
    let outcome = sequencer::run(&plan).unwrap();

    let expected = target.to_state(MU_EARTH, tof, None).unwrap();
    let arrived = outcome.final_state;
    assert!((arrived.epoch_s - tof).abs() < 1e-9);
    assert!(vector::distance(&arrived.position_km, &expected.position_km) < 1e-2);
    assert!(vector::distance(&arrived.velocity_km_s, &expected.velocity_km_s) < 1e-5);
    assert!(outcome.total_delta_v_km_s > 0.0);
    let miss = outcome.segment_reports[0].arrival_miss_km.unwrap();
    assert!(miss < 1e-2, "two-body miss {miss} km");

    // Under J2 the Keplerian arc no longer lands on the target; the report says by how much.
    let oblate = ForceStack::new().with(Gravity::with_zonal(MU_EARTH, Zonal::earth_j2()));
    let plan = MissionPlan::new(circular(7_000.0, 1_000.0), oblate, tight())
        .manoeuvre(Manoeuvre::Transfer(transfer));
    let perturbed = sequencer::run(&plan).unwrap();
    let miss = perturbed.segment_reports[0].arrival_miss_km.unwrap();
    assert!(miss > 1.0, "J2 miss {miss} km");
    let reached = perturbed.final_state.position_km;
    assert!((vector::distance(&reached, &expected.position_km) - miss).abs() < 1e-6);
}

#[test]
fn half_revolution_transfer_is_rejected() {
    let opposite = State::new(0.0, [-9_000.0, 0.0, 0.0], [0.0, -6.6, 0.0]);
    let transfer = TransferBurn::new(TransferTarget::State(opposite), 3_000.0, MU_EARTH);
    // A zero impulse leaves the position on +x, exactly opposite the target.
    let plan = MissionPlan::new(circular(7_000.0, 1_000.0), ForceStack::two_body(MU_EARTH), tight())
        .manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn::inertial(vector::ZERO)))
        .manoeuvre(Manoeuvre::Transfer(transfer));

    let err = sequencer::run(&plan).unwrap_err();
    assert_eq!(err.segment_index, 1);
    assert!(matches!(
        err.source,
        SegmentError::Transfer(LambertError::Infeasible { .. })
    ));
}

#[test]
fn altitude_floor_ends_the_mission_early() {
    let r = EARTH_RADIUS_KM + 200.0;
    let plan = MissionPlan::new(circular(r, 1_000.0), ForceStack::two_body(MU_EARTH), StepPolicy::default())
        .manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn::in_frame(
            BurnFrame::Vnb,
            [-0.5, 0.0, 0.0],
        )))
        .coast(6_000.0)
        .coast(6_000.0)
        .with_altitude_floor(AltitudeFloor {
            body_radius_km: EARTH_RADIUS_KM,
            min_altitude_km: 100.0,
        });
    let outcome = sequencer::run(&plan).unwrap();

    assert!(matches!(outcome.termination, Termination::AltitudeFloor { .. }));
    assert_eq!(outcome.segment_reports.len(), 2);
    let altitude = outcome.final_state.altitude_km(EARTH_RADIUS_KM);
    assert!((altitude - 100.0).abs() < 1e-3);
}

#[test]
fn backward_coasts_are_rejected() {
    let leo = || MissionPlan::new(circular(7_000.0, 1_000.0), ForceStack::two_body(MU_EARTH), StepPolicy::default());

    let err = sequencer::run(&leo().coast(600.0).coast(-300.0)).unwrap_err();
    assert_eq!(err.segment_index, 1);
    assert!(matches!(err.source, SegmentError::Configuration(_)));

    // A past target epoch only shows up once the first coast has run.
    let plan = leo()
        .coast(600.0)
        .with_segment(Segment::Coast(Span::ToEpoch(300.0)));
    let mut sequencer = Sequencer::new(&plan).unwrap();
    assert_eq!(sequencer.step().unwrap(), SequencerStatus::Propagating { segment: 0 });
    let err = sequencer.step().unwrap_err();
    assert_eq!(err.segment_index, 1);
    assert!(matches!(err.source, SegmentError::Configuration(_)));
    assert_eq!(sequencer.reports().len(), 1);

    let forward = leo()
        .coast(600.0)
        .with_segment(Segment::Coast(Span::ToEpoch(900.0)));
    let outcome = sequencer::run(&forward).unwrap();
    let epochs: Vec<f64> = outcome.trajectory.samples.iter().map(|s| s.epoch_s).collect();
    assert!(epochs.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(outcome.final_state.epoch_s, 900.0);
}

#[test]
fn impulse_above_the_vehicle_limit_is_refused() {
    let capped = |dv: f64| {
        ImpulsiveBurn::in_frame(BurnFrame::Vnb, [dv, 0.0, 0.0])
            .with_propellant(320.0, Some(450.0))
            .with_delta_v_limit(1.0)
    };
    let plan = |dv: f64| {
        MissionPlan::new(circular(7_000.0, 2_000.0), ForceStack::two_body(MU_EARTH), StepPolicy::default())
            .coast(60.0)
            .manoeuvre(Manoeuvre::Impulsive(capped(dv)))
    };

    let err = sequencer::run(&plan(1.5)).unwrap_err();
    assert_eq!(err.segment_index, 1);
    match err.source {
        SegmentError::DeltaVLimitExceeded {
            requested_km_s,
            limit_km_s,
        } => {
            assert!((requested_km_s - 1.5).abs() < 1e-12);
            assert_eq!(limit_km_s, 1.0);
        }
        other => panic!("unexpected error {other:?}"),
    }

    let outcome = sequencer::run(&plan(0.8)).unwrap();
    assert!((outcome.total_delta_v_km_s - 0.8).abs() < 1e-12);
}
