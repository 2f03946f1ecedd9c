//! Scenario manifest model.

use serde::Deserialize;

use crate::VehicleConfig;

/// Top-level scenario manifest.
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub central_body: CentralBodyConfig,
    pub initial_state: InitialStateConfig,
    #[serde(default)]
    pub vehicle: Option<VehicleConfig>,
    #[serde(default)]
    pub forces: Vec<ForceModelConfig>,
    #[serde(default)]
    pub propagation: PropagationConfig,
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
    #[serde(default)]
    pub optimisation: Option<OptimisationConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dominant body the scenario is centred on.
#[derive(Debug, Deserialize, Clone)]
pub struct CentralBodyConfig {
    pub name: String,
    pub mu_km3_s2: f64,
    pub radius_km: f64,
    #[serde(default)]
    pub j2: Option<f64>,
    #[serde(default)]
    pub j3: Option<f64>,
    #[serde(default)]
    pub rotation_rate_rad_s: Option<f64>,
    /// Terminate propagation when the altitude drops below this value.
    #[serde(default)]
    pub minimum_altitude_km: Option<f64>,
}

/// Initial state: Cartesian, classical elements (angles in degrees), or resting on a
/// launch site of the central body.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum InitialStateConfig {
    #[serde(rename = "cartesian")]
    Cartesian {
        #[serde(default)]
        epoch_s: f64,
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
        #[serde(default)]
        mass_kg: Option<f64>,
    },
    #[serde(rename = "elements")]
    Elements {
        #[serde(default)]
        epoch_s: f64,
        #[serde(flatten)]
        elements: ElementsConfig,
        #[serde(default)]
        mass_kg: Option<f64>,
    },
    #[serde(rename = "launch_site")]
    LaunchSite {
        #[serde(default)]
        epoch_s: f64,
        latitude_deg: f64,
        longitude_deg: f64,
        #[serde(default)]
        altitude_km: f64,
        #[serde(default)]
        mass_kg: Option<f64>,
    },
}

/// Classical elements with angles in degrees.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ElementsConfig {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    #[serde(default)]
    pub raan_deg: f64,
    #[serde(default)]
    pub argument_of_periapsis_deg: f64,
    #[serde(default)]
    pub true_anomaly_deg: f64,
}

/// One entry of the force stack. Missing required parameters are reported when the
/// stack is assembled, not while parsing, so every problem can be named at once.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum ForceModelConfig {
    #[serde(rename = "gravity")]
    Gravity {
        #[serde(default)]
        mu_km3_s2: Option<f64>,
        #[serde(default)]
        body_radius_km: Option<f64>,
        #[serde(default)]
        j2: Option<f64>,
        #[serde(default)]
        j3: Option<f64>,
    },
    #[serde(rename = "drag")]
    Drag {
        #[serde(default)]
        drag_coefficient: Option<f64>,
        #[serde(default)]
        area_m2: Option<f64>,
        /// Used when the propagated state carries no mass.
        #[serde(default)]
        mass_kg: Option<f64>,
        #[serde(default)]
        body_radius_km: Option<f64>,
        #[serde(default)]
        rotation_rate_rad_s: Option<f64>,
        #[serde(default)]
        atmosphere: AtmosphereModelConfig,
        #[serde(default)]
        wind: Option<WindConditionConfig>,
    },
    #[serde(rename = "lift")]
    Lift {
        #[serde(default)]
        lift_coefficient: Option<f64>,
        #[serde(default)]
        reference_area_m2: Option<f64>,
        #[serde(default)]
        mass_kg: Option<f64>,
        #[serde(default)]
        body_radius_km: Option<f64>,
        #[serde(default)]
        rotation_rate_rad_s: Option<f64>,
        #[serde(default)]
        atmosphere: AtmosphereModelConfig,
        #[serde(default)]
        wind: Option<WindConditionConfig>,
    },
    #[serde(rename = "solar_radiation_pressure")]
    SolarRadiationPressure {
        #[serde(default)]
        reflectivity_coefficient: Option<f64>,
        #[serde(default)]
        area_m2: Option<f64>,
        #[serde(default)]
        mass_kg: Option<f64>,
        #[serde(default)]
        body_radius_km: Option<f64>,
        #[serde(default = "default_sun")]
        ephemeris: String,
    },
    #[serde(rename = "third_body")]
    ThirdBody {
        body: String,
        #[serde(default)]
        mu_km3_s2: Option<f64>,
        /// Ephemeris provider name, defaults to `body`.
        #[serde(default)]
        ephemeris: Option<String>,
    },
    #[serde(rename = "custom")]
    Custom { name: String },
}

impl ForceModelConfig {
    /// Short label used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            ForceModelConfig::Gravity { .. } => "gravity",
            ForceModelConfig::Drag { .. } => "drag",
            ForceModelConfig::Lift { .. } => "lift",
            ForceModelConfig::SolarRadiationPressure { .. } => "solar_radiation_pressure",
            ForceModelConfig::ThirdBody { .. } => "third_body",
            ForceModelConfig::Custom { .. } => "custom",
        }
    }
}

fn default_sun() -> String {
    "sun".to_string()
}

/// Density model backing a drag entry.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(tag = "model")]
pub enum AtmosphereModelConfig {
    #[default]
    #[serde(rename = "ussa76")]
    Ussa76,
    #[serde(rename = "exponential")]
    Exponential {
        surface_density_kg_m3: f64,
        scale_height_km: f64,
    },
    #[serde(rename = "provider")]
    Provider { name: String },
}

/// Qualitative wind strength.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindConditionConfig {
    None,
    Light,
    Moderate,
    Strong,
    VeryStrong,
}

/// Integrator selection.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum PropagationConfig {
    #[serde(rename = "fixed")]
    Fixed { step_s: f64 },
    #[serde(rename = "adaptive")]
    Adaptive {
        #[serde(default = "default_initial_step")]
        initial_step_s: f64,
        #[serde(default = "default_min_step")]
        min_step_s: f64,
        #[serde(default = "default_max_step")]
        max_step_s: f64,
        #[serde(default = "default_tolerance")]
        absolute_tolerance: f64,
        #[serde(default = "default_tolerance")]
        relative_tolerance: f64,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
}

impl Default for PropagationConfig {
    fn default() -> Self {
        PropagationConfig::Adaptive {
            initial_step_s: default_initial_step(),
            min_step_s: default_min_step(),
            max_step_s: default_max_step(),
            absolute_tolerance: default_tolerance(),
            relative_tolerance: default_tolerance(),
            max_steps: default_max_steps(),
        }
    }
}

fn default_initial_step() -> f64 {
    60.0
}

fn default_min_step() -> f64 {
    1e-6
}

fn default_max_step() -> f64 {
    3_600.0
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_steps() -> usize {
    1_000_000
}

/// One timeline entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum SegmentConfig {
    #[serde(rename = "coast")]
    Coast {
        #[serde(default)]
        duration_s: Option<f64>,
        #[serde(default)]
        until_epoch_s: Option<f64>,
    },
    #[serde(rename = "impulsive")]
    Impulsive {
        delta_v_km_s: [f64; 3],
        #[serde(default)]
        frame: BurnFrameConfig,
        /// Falls back to the vehicle's specific impulse.
        #[serde(default)]
        isp_seconds: Option<f64>,
    },
    #[serde(rename = "finite_burn")]
    FiniteBurn {
        duration_s: f64,
        steering: SteeringConfig,
        /// Falls back to the vehicle's continuous engine.
        #[serde(default)]
        thrust_newtons: Option<f64>,
        #[serde(default)]
        isp_seconds: Option<f64>,
    },
    #[serde(rename = "transfer")]
    Transfer {
        time_of_flight_s: f64,
        target: TransferTargetConfig,
        #[serde(default)]
        direction: DirectionConfig,
        #[serde(default)]
        revolutions: u32,
        #[serde(default)]
        period: PeriodConfig,
    },
}

/// Frame an impulsive Δv is expressed in.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BurnFrameConfig {
    #[default]
    Inertial,
    /// Velocity, normal, binormal.
    Vnb,
    /// Radial, transverse, normal.
    Rtn,
}

/// Thrust direction law for finite burns.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SteeringConfig {
    Prograde,
    Retrograde,
    RadialOut,
    RadialIn,
    Normal,
    AntiNormal,
    Inertial([f64; 3]),
}

/// Rendezvous target for a Lambert transfer.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind")]
pub enum TransferTargetConfig {
    #[serde(rename = "state")]
    State {
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
    },
    /// Target orbit and phase at arrival.
    #[serde(rename = "elements")]
    Elements {
        #[serde(flatten)]
        elements: ElementsConfig,
    },
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectionConfig {
    #[default]
    Prograde,
    Retrograde,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeriodConfig {
    #[default]
    Short,
    Long,
}

/// Optimisation block of a scenario.
#[derive(Debug, Deserialize, Clone)]
pub struct OptimisationConfig {
    pub parameters: Vec<FreeParameterConfig>,
    #[serde(default)]
    pub targets: Vec<ElementTargetConfig>,
    #[serde(default)]
    pub cost: CostMetricConfig,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub restarts: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub penalty_weight: Option<f64>,
    #[serde(default)]
    pub cost_tolerance: Option<f64>,
}

/// A tunable quantity of one segment with its search bounds.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FreeParameterConfig {
    pub segment: usize,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub quantity: FreeQuantityConfig,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FreeQuantityConfig {
    CoastDuration,
    BurnDuration,
    TransferTimeOfFlight,
    /// Component index 0..3 of an impulsive Δv.
    ImpulseComponent(usize),
}

/// Terminal orbit requirement, expressed as `|value - target| <= tolerance`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ElementTargetConfig {
    pub element: TargetElementConfig,
    pub value: f64,
    pub tolerance: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetElementConfig {
    SemiMajorAxisKm,
    Eccentricity,
    InclinationDeg,
    ApoapsisRadiusKm,
    PeriapsisRadiusKm,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostMetricConfig {
    #[default]
    TotalDeltaV,
    PropellantMass,
    FlightTime,
}

/// Log output settings.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    /// Explicit `EnvFilter` directive; overrides `level` when set.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}
