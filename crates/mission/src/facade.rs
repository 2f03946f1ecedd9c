//! Turn a parsed scenario manifest into a runnable [`MissionPlan`].

use orbital_config::{
    BurnFrameConfig, CentralBodyConfig, DirectionConfig, ElementsConfig, ForceModelConfig,
    InitialStateConfig, PeriodConfig, PropagationConfig, ScenarioConfig, SegmentConfig,
    SteeringConfig, TransferTargetConfig,
};
use orbital_core::{LaunchSite, State};
use orbital_core::units::deg_to_rad;
use orbital_forces::{ConfigurationError, ForceStack, Providers};
use orbital_impulsive::lambert::{Direction, LambertBranch, Period};
use orbital_lowthrust::Steering;
use orbital_orbits::{ElementsError, OrbitalElements};
use orbital_propagator::{AltitudeFloor, Span, StepPolicy};
use orbital_propulsion::{Engine, PropulsionError, Vehicle};
use thiserror::Error;
use tracing::debug;

use crate::manoeuvre::{BurnFrame, FiniteBurn, ImpulsiveBurn, Manoeuvre, TransferBurn, TransferTarget};
use crate::plan::{MissionPlan, Segment};

pub use vehicle::VehicleError;

pub mod vehicle {
    use orbital_config::{VehicleConfig, VehiclePropulsionConfig};
    use orbital_propulsion::{Engine, PropulsionError, PropulsionMode, Vehicle};
    use thiserror::Error;

    /// Errors surfaced when selecting or converting vehicles.
    #[derive(Debug, Error, Clone, PartialEq)]
    pub enum VehicleError {
        #[error("vehicle '{0}' not found in catalog")]
        NotFound(String),
        #[error("vehicle catalog is empty")]
        EmptyCatalog,
        #[error("vehicle delta-v limit {0} km/s must be positive")]
        InvalidDeltaVLimit(f64),
        #[error("vehicle engine is invalid: {0}")]
        InvalidEngine(#[from] PropulsionError),
    }

    /// Convert a `VehicleConfig` into its runtime `Vehicle`.
    pub fn from_config(config: &VehicleConfig) -> Result<Vehicle, VehicleError> {
        let propulsion = match &config.propulsion {
            VehiclePropulsionConfig::Continuous {
                max_thrust_newtons,
                isp_seconds,
            } => PropulsionMode::Continuous(Engine::new(*max_thrust_newtons, *isp_seconds)?),
            VehiclePropulsionConfig::Impulsive {
                isp_seconds,
                max_delta_v_km_s,
            } => {
                if !(*isp_seconds > 0.0 && isp_seconds.is_finite()) {
                    return Err(PropulsionError::InvalidIsp(*isp_seconds).into());
                }
                if let Some(limit) = (*max_delta_v_km_s).filter(|l| !(*l > 0.0 && l.is_finite())) {
                    return Err(VehicleError::InvalidDeltaVLimit(limit));
                }
                PropulsionMode::Impulsive {
                    isp_seconds: *isp_seconds,
                    max_delta_v_km_s: *max_delta_v_km_s,
                }
            }
        };

        Ok(Vehicle {
            name: config.name.clone(),
            dry_mass_kg: config.dry_mass_kg,
            propellant_mass_kg: config.propellant_mass_kg,
            propulsion,
        })
    }

    /// Select a vehicle by case-insensitive name, or the first continuous-thrust entry.
    pub fn select(configs: &[VehicleConfig], requested: Option<&str>) -> Result<Vehicle, VehicleError> {
        let first = configs.first().ok_or(VehicleError::EmptyCatalog)?;
        let chosen = match requested {
            Some(name) => {
                let upper = name.to_uppercase();
                configs
                    .iter()
                    .find(|cfg| cfg.name.to_uppercase() == upper)
                    .ok_or_else(|| VehicleError::NotFound(name.to_string()))?
            }
            None => configs
                .iter()
                .find(|cfg| matches!(cfg.propulsion, VehiclePropulsionConfig::Continuous { .. }))
                .unwrap_or(first),
        };
        from_config(chosen)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScenarioError {
    #[error(transparent)]
    Forces(#[from] ConfigurationError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error("initial state: {0}")]
    InitialState(#[from] ElementsError),
    #[error("segment {index}: {reason}")]
    Segment { index: usize, reason: String },
}

impl ScenarioError {
    fn segment(index: usize, reason: impl Into<String>) -> Self {
        ScenarioError::Segment {
            index,
            reason: reason.into(),
        }
    }
}

/// Build a validated plan from a scenario, filling body parameters from `central_body`
/// wherever a force entry leaves them out.
pub fn plan_from_config(
    scenario: &ScenarioConfig,
    providers: &Providers,
) -> Result<MissionPlan, ScenarioError> {
    let body = &scenario.central_body;
    let vehicle = scenario
        .vehicle
        .as_ref()
        .map(vehicle::from_config)
        .transpose()?;

    let initial = initial_state(&scenario.initial_state, body, vehicle.as_ref())?;
    let forces: Vec<ForceModelConfig> = scenario
        .forces
        .iter()
        .map(|config| with_body_defaults(config, body))
        .collect();
    let stack = ForceStack::assemble(&forces, providers)?;

    let mut plan = MissionPlan::new(initial, stack, step_policy(&scenario.propagation));
    plan.altitude_floor = Some(AltitudeFloor {
        body_radius_km: body.radius_km,
        min_altitude_km: body.minimum_altitude_km.unwrap_or(0.0),
    });
    for (index, config) in scenario.segments.iter().enumerate() {
        let segment = segment(index, config, body, vehicle.as_ref())?;
        plan.segments.push(segment);
    }
    plan.validate().map_err(|err| {
        ScenarioError::segment(err.segment_index, err.source.to_string())
    })?;
    debug!(
        scenario = %scenario.name,
        forces = ?plan.stack.names(),
        segments = plan.segments.len(),
        "mission plan built"
    );
    Ok(plan)
}

/// Classical elements from a manifest block with angles in degrees.
pub fn elements_from_config(config: &ElementsConfig) -> OrbitalElements {
    OrbitalElements {
        semi_major_axis_km: config.semi_major_axis_km,
        eccentricity: config.eccentricity,
        inclination_rad: deg_to_rad(config.inclination_deg),
        raan_rad: deg_to_rad(config.raan_deg),
        argument_of_periapsis_rad: deg_to_rad(config.argument_of_periapsis_deg),
        true_anomaly_rad: deg_to_rad(config.true_anomaly_deg),
    }
}

pub fn step_policy(config: &PropagationConfig) -> StepPolicy {
    match *config {
        PropagationConfig::Fixed { step_s } => StepPolicy::Fixed { step_s },
        PropagationConfig::Adaptive {
            initial_step_s,
            min_step_s,
            max_step_s,
            absolute_tolerance,
            relative_tolerance,
            max_steps,
        } => StepPolicy::Adaptive {
            initial_step_s,
            min_step_s,
            max_step_s,
            absolute_tolerance,
            relative_tolerance,
            max_steps,
        },
    }
}

fn initial_state(
    config: &InitialStateConfig,
    body: &CentralBodyConfig,
    vehicle: Option<&Vehicle>,
) -> Result<State, ScenarioError> {
    let vehicle_mass = vehicle.map(Vehicle::initial_mass_kg);
    let mut state = match config {
        InitialStateConfig::Cartesian {
            epoch_s,
            position_km,
            velocity_km_s,
            ..
        } => State::new(*epoch_s, *position_km, *velocity_km_s),
        InitialStateConfig::Elements {
            epoch_s, elements, ..
        } => elements_from_config(elements).to_state(body.mu_km3_s2, *epoch_s, None)?,
        InitialStateConfig::LaunchSite {
            epoch_s,
            latitude_deg,
            longitude_deg,
            altitude_km,
            ..
        } => LaunchSite::new(*latitude_deg, *longitude_deg, *altitude_km).state(
            body.radius_km,
            body.rotation_rate_rad_s.unwrap_or(0.0),
            *epoch_s,
        ),
    };
    let mass = match config {
        InitialStateConfig::Cartesian { mass_kg, .. }
        | InitialStateConfig::Elements { mass_kg, .. }
        | InitialStateConfig::LaunchSite { mass_kg, .. } => mass_kg.or(vehicle_mass),
    };
    if let Some(mass) = mass {
        state = state.with_mass(mass);
    }
    Ok(state)
}

fn with_body_defaults(config: &ForceModelConfig, body: &CentralBodyConfig) -> ForceModelConfig {
    let mut config = config.clone();
    match &mut config {
        ForceModelConfig::Gravity {
            mu_km3_s2,
            body_radius_km,
            j2,
            j3,
        } => {
            mu_km3_s2.get_or_insert(body.mu_km3_s2);
            body_radius_km.get_or_insert(body.radius_km);
            if j2.is_none() {
                *j2 = body.j2;
            }
            if j3.is_none() {
                *j3 = body.j3;
            }
        }
        ForceModelConfig::Drag {
            body_radius_km,
            rotation_rate_rad_s,
            ..
        }
        | ForceModelConfig::Lift {
            body_radius_km,
            rotation_rate_rad_s,
            ..
        } => {
            body_radius_km.get_or_insert(body.radius_km);
            if rotation_rate_rad_s.is_none() {
                *rotation_rate_rad_s = body.rotation_rate_rad_s;
            }
        }
        ForceModelConfig::SolarRadiationPressure { body_radius_km, .. } => {
            body_radius_km.get_or_insert(body.radius_km);
        }
        ForceModelConfig::ThirdBody { .. } | ForceModelConfig::Custom { .. } => {}
    }
    config
}

fn segment(
    index: usize,
    config: &SegmentConfig,
    body: &CentralBodyConfig,
    vehicle: Option<&Vehicle>,
) -> Result<Segment, ScenarioError> {
    let dry_mass = vehicle.map(|v| v.dry_mass_kg);
    let vehicle_isp = vehicle.map(|v| v.propulsion.isp_seconds());
    let segment = match config {
        SegmentConfig::Coast {
            duration_s,
            until_epoch_s,
        } => match (duration_s, until_epoch_s) {
            (Some(duration), None) => Segment::Coast(Span::Duration(*duration)),
            (None, Some(epoch)) => Segment::Coast(Span::ToEpoch(*epoch)),
            _ => {
                return Err(ScenarioError::segment(
                    index,
                    "coast needs exactly one of `duration_s` or `until_epoch_s`",
                ));
            }
        },
        SegmentConfig::Impulsive {
            delta_v_km_s,
            frame,
            isp_seconds,
        } => Segment::Manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn {
            delta_v_km_s: *delta_v_km_s,
            frame: burn_frame(*frame),
            isp_seconds: isp_seconds.or(vehicle_isp),
            dry_mass_kg: dry_mass,
            max_delta_v_km_s: vehicle.and_then(|v| v.propulsion.max_delta_v_km_s()),
        })),
        SegmentConfig::FiniteBurn {
            duration_s,
            steering,
            thrust_newtons,
            isp_seconds,
        } => {
            let engine = finite_burn_engine(*thrust_newtons, *isp_seconds, vehicle)
                .map_err(|reason| ScenarioError::segment(index, reason))?;
            Segment::Manoeuvre(Manoeuvre::FiniteBurn(FiniteBurn {
                engine,
                steering: steering_law(*steering),
                duration_s: *duration_s,
                dry_mass_kg: dry_mass.unwrap_or(0.0),
            }))
        }
        SegmentConfig::Transfer {
            time_of_flight_s,
            target,
            direction,
            revolutions,
            period,
        } => {
            let target = match target {
                TransferTargetConfig::State {
                    position_km,
                    velocity_km_s,
                } => TransferTarget::State(State::new(0.0, *position_km, *velocity_km_s)),
                TransferTargetConfig::Elements { elements } => {
                    TransferTarget::Elements(elements_from_config(elements))
                }
            };
            let direction = match direction {
                DirectionConfig::Prograde => Direction::Prograde,
                DirectionConfig::Retrograde => Direction::Retrograde,
            };
            let period = match period {
                PeriodConfig::Short => Period::ShortPeriod,
                PeriodConfig::Long => Period::LongPeriod,
            };
            let mut transfer = TransferBurn::new(target, *time_of_flight_s, body.mu_km3_s2)
                .with_branch(LambertBranch::multi_rev(direction, *revolutions, period));
            transfer.isp_seconds = vehicle_isp;
            transfer.dry_mass_kg = dry_mass;
            Segment::Manoeuvre(Manoeuvre::Transfer(transfer))
        }
    };
    Ok(segment)
}

fn finite_burn_engine(
    thrust_newtons: Option<f64>,
    isp_seconds: Option<f64>,
    vehicle: Option<&Vehicle>,
) -> Result<Engine, String> {
    let fallback = vehicle.and_then(Vehicle::engine);
    let thrust = thrust_newtons
        .or(fallback.map(|e| e.thrust_newtons))
        .ok_or("finite burn needs `thrust_newtons` or a continuous-thrust vehicle")?;
    let isp = isp_seconds
        .or(fallback.map(|e| e.isp_seconds))
        .or(vehicle.map(|v| v.propulsion.isp_seconds()))
        .ok_or("finite burn needs `isp_seconds` or a vehicle")?;
    Engine::new(thrust, isp).map_err(|err: PropulsionError| err.to_string())
}

fn burn_frame(config: BurnFrameConfig) -> BurnFrame {
    match config {
        BurnFrameConfig::Inertial => BurnFrame::Inertial,
        BurnFrameConfig::Vnb => BurnFrame::Vnb,
        BurnFrameConfig::Rtn => BurnFrame::Rtn,
    }
}

fn steering_law(config: SteeringConfig) -> Steering {
    match config {
        SteeringConfig::Prograde => Steering::Prograde,
        SteeringConfig::Retrograde => Steering::Retrograde,
        SteeringConfig::RadialOut => Steering::RadialOut,
        SteeringConfig::RadialIn => Steering::RadialIn,
        SteeringConfig::Normal => Steering::Normal,
        SteeringConfig::AntiNormal => Steering::AntiNormal,
        SteeringConfig::Inertial(direction) => Steering::Inertial(direction),
    }
}
