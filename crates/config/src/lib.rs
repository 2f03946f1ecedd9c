//! Configuration models and loaders for the orbital toolkit.

pub mod scenario;

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use scenario::*;

/// Vehicle configuration parsed from scenario manifests and catalogues.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleConfig {
    pub name: String,
    pub dry_mass_kg: f64,
    pub propellant_mass_kg: f64,
    pub propulsion: VehiclePropulsionConfig,
}

/// Propulsion configuration in scenario manifests.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum VehiclePropulsionConfig {
    #[serde(rename = "continuous")]
    Continuous {
        max_thrust_newtons: f64,
        isp_seconds: f64,
    },
    #[serde(rename = "impulsive")]
    Impulsive {
        isp_seconds: f64,
        #[serde(default)]
        max_delta_v_km_s: Option<f64>,
    },
}

/// Manifest encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Toml,
    Json,
}

impl ManifestFormat {
    /// Infer the format from a file extension; anything unrecognised is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => ManifestFormat::Toml,
            Some("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a scenario manifest, choosing the parser from the file extension.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let path = path.as_ref();
    match ManifestFormat::from_path(path) {
        ManifestFormat::Toml => {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        }
        ManifestFormat::Json => {
            let reader = File::open(path)?;
            Ok(serde_json::from_reader(reader)?)
        }
        ManifestFormat::Yaml => {
            let reader = File::open(path)?;
            Ok(serde_yaml::from_reader(reader)?)
        }
    }
}

/// Parse a scenario manifest held in memory.
pub fn parse_scenario(contents: &str, format: ManifestFormat) -> Result<ScenarioConfig, ConfigError> {
    Ok(match format {
        ManifestFormat::Yaml => serde_yaml::from_str(contents)?,
        ManifestFormat::Toml => toml::from_str(contents)?,
        ManifestFormat::Json => serde_json::from_str(contents)?,
    })
}

/// Load vehicle configurations from a YAML/JSON list, a single TOML record, or a
/// directory of TOML records.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        return read_dir_records(path);
    }
    match ManifestFormat::from_path(path) {
        ManifestFormat::Toml => {
            let contents = std::fs::read_to_string(path)?;
            let record: T = toml::from_str(&contents)?;
            Ok(vec![record])
        }
        ManifestFormat::Json => {
            let reader = File::open(path)?;
            Ok(serde_json::from_reader(reader)?)
        }
        ManifestFormat::Yaml => {
            let reader = File::open(path)?;
            Ok(serde_yaml::from_reader(reader)?)
        }
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: leo
central_body:
  name: earth
  mu_km3_s2: 398600.4418
  radius_km: 6378.1363
initial_state:
  type: elements
  semi_major_axis_km: 6778.0
  eccentricity: 0.001
  inclination_deg: 51.6
  mass_kg: 1000.0
forces:
  - type: gravity
  - type: drag
    drag_coefficient: 2.2
    area_m2: 4.0
    wind: moderate
segments:
  - type: coast
    duration_s: 600.0
  - type: finite_burn
    duration_s: 30.0
    steering: prograde
"#;

    #[test]
    fn yaml_scenario_fills_defaults() {
        let scenario = parse_scenario(YAML, ManifestFormat::Yaml).unwrap();
        assert_eq!(scenario.name, "leo");
        assert_eq!(scenario.forces.len(), 2);
        assert_eq!(scenario.propagation, PropagationConfig::default());
        assert_eq!(scenario.logging.level, LogLevel::Info);
        match &scenario.initial_state {
            InitialStateConfig::Elements {
                elements, mass_kg, ..
            } => {
                assert_eq!(elements.raan_deg, 0.0);
                assert_eq!(*mass_kg, Some(1000.0));
            }
            other => panic!("unexpected initial state {other:?}"),
        }
        match &scenario.forces[1] {
            ForceModelConfig::Drag {
                atmosphere, wind, ..
            } => {
                assert!(matches!(atmosphere, AtmosphereModelConfig::Ussa76));
                assert_eq!(*wind, Some(WindConditionConfig::Moderate));
            }
            other => panic!("unexpected force {other:?}"),
        }
    }

    #[test]
    fn inertial_steering_parses_from_json() {
        let json = r#"{"type":"finite_burn","duration_s":5.0,"steering":{"inertial":[0.0,1.0,0.0]}}"#;
        let segment: SegmentConfig = serde_json::from_str(json).unwrap();
        match segment {
            SegmentConfig::FiniteBurn { steering, .. } => {
                assert_eq!(steering, SteeringConfig::Inertial([0.0, 1.0, 0.0]))
            }
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a.toml")), ManifestFormat::Toml);
        assert_eq!(ManifestFormat::from_path(Path::new("a.json")), ManifestFormat::Json);
        assert_eq!(ManifestFormat::from_path(Path::new("a.yml")), ManifestFormat::Yaml);
    }
}
