//! Build a [`ForceStack`] from manifest entries.
//!
//! Every entry is checked here, before any propagation starts, so a bad manifest never
//! surfaces as a mid-flight failure.

use std::sync::Arc;

use orbital_atmosphere::{DensityProvider, ExponentialAtmosphere, WindCondition, WindProfile};
use orbital_config::{AtmosphereModelConfig, ForceModelConfig, WindConditionConfig};
use orbital_core::constants::{MU_MOON, MU_SUN};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    AerodynamicLift, AtmosphericDrag, Gravity, SolarRadiationPressure, ThirdBody, Zonal,
};
use crate::{ForceModel, ForceStack, Providers};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("force model #{index} ({model}) is missing `{parameter}`")]
    MissingParameter {
        index: usize,
        model: String,
        parameter: &'static str,
    },
    #[error("force model #{index} ({model}) has invalid `{parameter}`: {reason}")]
    InvalidParameter {
        index: usize,
        model: String,
        parameter: &'static str,
        reason: String,
    },
    #[error("force model #{index} ({model}) needs provider `{provider}`, which is not registered")]
    MissingProvider {
        index: usize,
        model: String,
        provider: String,
    },
    #[error("force model #{index} refers to unknown custom model `{name}`")]
    UnknownCustomModel { index: usize, name: String },
    #[error("force stack is empty")]
    EmptyStack,
}

impl ForceStack {
    /// Assemble and validate a stack from manifest entries, in order.
    pub fn assemble(
        configs: &[ForceModelConfig],
        providers: &Providers,
    ) -> Result<ForceStack, ConfigurationError> {
        if configs.is_empty() {
            return Err(ConfigurationError::EmptyStack);
        }
        let mut stack = ForceStack::new();
        for (index, config) in configs.iter().enumerate() {
            let model = build_model(index, config, providers)?;
            debug!(index, model = model.name(), "force model assembled");
            stack.push(model);
        }
        Ok(stack)
    }
}

struct Entry<'a> {
    index: usize,
    model: &'a str,
}

impl Entry<'_> {
    fn require(&self, value: Option<f64>, parameter: &'static str) -> Result<f64, ConfigurationError> {
        value.ok_or_else(|| ConfigurationError::MissingParameter {
            index: self.index,
            model: self.model.to_string(),
            parameter,
        })
    }

    fn positive(&self, value: f64, parameter: &'static str) -> Result<f64, ConfigurationError> {
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(parameter, format!("{value} is not a positive finite number")))
        }
    }

    fn finite(&self, value: f64, parameter: &'static str) -> Result<f64, ConfigurationError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(parameter, format!("{value} is not finite")))
        }
    }

    fn optional_positive(
        &self,
        value: Option<f64>,
        parameter: &'static str,
    ) -> Result<Option<f64>, ConfigurationError> {
        value.map(|v| self.positive(v, parameter)).transpose()
    }

    fn invalid(&self, parameter: &'static str, reason: String) -> ConfigurationError {
        ConfigurationError::InvalidParameter {
            index: self.index,
            model: self.model.to_string(),
            parameter,
            reason,
        }
    }

    fn density(
        &self,
        atmosphere: &AtmosphereModelConfig,
        providers: &Providers,
    ) -> Result<DensityProvider, ConfigurationError> {
        match atmosphere {
            AtmosphereModelConfig::Ussa76 => Ok(providers
                .density("ussa76")
                .cloned()
                .unwrap_or_else(DensityProvider::ussa76)),
            AtmosphereModelConfig::Exponential {
                surface_density_kg_m3,
                scale_height_km,
            } => ExponentialAtmosphere::new(*surface_density_kg_m3, *scale_height_km)
                .map(DensityProvider::exponential)
                .map_err(|err| self.invalid("atmosphere", err.to_string())),
            AtmosphereModelConfig::Provider { name } => providers
                .density(name)
                .cloned()
                .ok_or_else(|| self.missing_provider(name)),
        }
    }

    fn missing_provider(&self, provider: &str) -> ConfigurationError {
        ConfigurationError::MissingProvider {
            index: self.index,
            model: self.model.to_string(),
            provider: provider.to_string(),
        }
    }
}

fn build_model(
    index: usize,
    config: &ForceModelConfig,
    providers: &Providers,
) -> Result<Arc<dyn ForceModel>, ConfigurationError> {
    let entry = Entry {
        index,
        model: config.kind(),
    };
    match config {
        ForceModelConfig::Gravity {
            mu_km3_s2,
            body_radius_km,
            j2,
            j3,
        } => {
            let mu = entry.positive(entry.require(*mu_km3_s2, "mu_km3_s2")?, "mu_km3_s2")?;
            let zonal = if j2.is_some() || j3.is_some() {
                let radius = entry.require(*body_radius_km, "body_radius_km")?;
                Some(Zonal {
                    body_radius_km: entry.positive(radius, "body_radius_km")?,
                    j2: entry.finite(j2.unwrap_or(0.0), "j2")?,
                    j3: entry.finite(j3.unwrap_or(0.0), "j3")?,
                })
            } else {
                None
            };
            Ok(Arc::new(Gravity {
                mu_km3_s2: mu,
                zonal,
            }))
        }
        ForceModelConfig::Drag {
            drag_coefficient,
            area_m2,
            mass_kg,
            body_radius_km,
            rotation_rate_rad_s,
            atmosphere,
            wind,
        } => {
            let drag_coefficient = entry.positive(
                entry.require(*drag_coefficient, "drag_coefficient")?,
                "drag_coefficient",
            )?;
            let area_m2 = entry.positive(entry.require(*area_m2, "area_m2")?, "area_m2")?;
            let body_radius_km = entry.positive(
                entry.require(*body_radius_km, "body_radius_km")?,
                "body_radius_km",
            )?;
            let rotation_rate_rad_s =
                entry.finite(rotation_rate_rad_s.unwrap_or(0.0), "rotation_rate_rad_s")?;
            Ok(Arc::new(AtmosphericDrag {
                drag_coefficient,
                area_m2,
                fallback_mass_kg: entry.optional_positive(*mass_kg, "mass_kg")?,
                body_radius_km,
                rotation_rate_rad_s,
                density: entry.density(atmosphere, providers)?,
                wind: wind.map(|w| WindProfile::new(wind_condition(w))),
            }))
        }
        ForceModelConfig::Lift {
            lift_coefficient,
            reference_area_m2,
            mass_kg,
            body_radius_km,
            rotation_rate_rad_s,
            atmosphere,
            wind,
        } => {
            let lift_coefficient = entry.finite(
                entry.require(*lift_coefficient, "lift_coefficient")?,
                "lift_coefficient",
            )?;
            let reference_area_m2 = entry.positive(
                entry.require(*reference_area_m2, "reference_area_m2")?,
                "reference_area_m2",
            )?;
            let body_radius_km = entry.positive(
                entry.require(*body_radius_km, "body_radius_km")?,
                "body_radius_km",
            )?;
            let rotation_rate_rad_s =
                entry.finite(rotation_rate_rad_s.unwrap_or(0.0), "rotation_rate_rad_s")?;
            Ok(Arc::new(AerodynamicLift {
                lift_coefficient,
                reference_area_m2,
                fallback_mass_kg: entry.optional_positive(*mass_kg, "mass_kg")?,
                body_radius_km,
                rotation_rate_rad_s,
                density: entry.density(atmosphere, providers)?,
                wind: wind.map(|w| WindProfile::new(wind_condition(w))),
            }))
        }
        ForceModelConfig::SolarRadiationPressure {
            reflectivity_coefficient,
            area_m2,
            mass_kg,
            body_radius_km,
            ephemeris,
        } => {
            let reflectivity_coefficient = entry.positive(
                entry.require(*reflectivity_coefficient, "reflectivity_coefficient")?,
                "reflectivity_coefficient",
            )?;
            let area_m2 = entry.positive(entry.require(*area_m2, "area_m2")?, "area_m2")?;
            let body_radius_km = entry.positive(
                entry.require(*body_radius_km, "body_radius_km")?,
                "body_radius_km",
            )?;
            let sun = providers
                .ephemeris(ephemeris)
                .cloned()
                .ok_or_else(|| entry.missing_provider(ephemeris))?;
            Ok(Arc::new(SolarRadiationPressure {
                reflectivity_coefficient,
                area_m2,
                fallback_mass_kg: entry.optional_positive(*mass_kg, "mass_kg")?,
                body_radius_km,
                sun,
            }))
        }
        ForceModelConfig::ThirdBody {
            body,
            mu_km3_s2,
            ephemeris,
        } => {
            let mu = entry.require(mu_km3_s2.or_else(|| known_mu(body)), "mu_km3_s2")?;
            let mu = entry.positive(mu, "mu_km3_s2")?;
            let provider_name = ephemeris.as_deref().unwrap_or(body);
            let provider = providers
                .ephemeris(provider_name)
                .cloned()
                .ok_or_else(|| entry.missing_provider(provider_name))?;
            Ok(Arc::new(ThirdBody::new(body, mu, provider)))
        }
        ForceModelConfig::Custom { name } => providers.custom(name).cloned().ok_or_else(|| {
            ConfigurationError::UnknownCustomModel {
                index,
                name: name.clone(),
            }
        }),
    }
}

fn known_mu(body: &str) -> Option<f64> {
    match body.to_ascii_lowercase().as_str() {
        "sun" => Some(MU_SUN),
        "moon" => Some(MU_MOON),
        _ => None,
    }
}

fn wind_condition(config: WindConditionConfig) -> WindCondition {
    match config {
        WindConditionConfig::None => WindCondition::None,
        WindConditionConfig::Light => WindCondition::Light,
        WindConditionConfig::Moderate => WindCondition::Moderate,
        WindConditionConfig::Strong => WindCondition::Strong,
        WindConditionConfig::VeryStrong => WindCondition::VeryStrong,
    }
}
