//! Atmospheric density and wind models used by drag.
//!
//! Densities are exposed through [`DensityProvider`], a shareable closure of altitude and
//! epoch, so drag can run on the built-in tables or on anything the caller injects.

pub mod ussa76;
pub mod wind;

use std::fmt;
use std::sync::Arc;

use orbital_core::State;
use orbital_core::vector::{self, Vector3};
use thiserror::Error;

pub use wind::{WindCondition, WindProfile};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtmosphereError {
    #[error("atmosphere scale height must be positive")]
    InvalidScaleHeight,
    #[error("surface density must be non-negative and finite")]
    InvalidSurfaceDensity,
}

/// Density (kg/m³) as a function of altitude (km) and epoch (s).
#[derive(Clone)]
pub struct DensityProvider {
    label: String,
    density: Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>,
}

impl DensityProvider {
    pub fn new<F>(label: impl Into<String>, density: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            density: Arc::new(density),
        }
    }

    /// The 1976 US Standard Atmosphere table.
    pub fn ussa76() -> Self {
        Self::new("ussa76", |altitude_km, _epoch_s| ussa76::density(altitude_km))
    }

    pub fn exponential(model: ExponentialAtmosphere) -> Self {
        Self::new("exponential", move |altitude_km, _epoch_s| {
            model.density(altitude_km)
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn density(&self, altitude_km: f64, epoch_s: f64) -> f64 {
        (self.density)(altitude_km, epoch_s)
    }
}

impl fmt::Debug for DensityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DensityProvider")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Single-layer exponential atmosphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialAtmosphere {
    surface_density_kg_m3: f64,
    scale_height_km: f64,
}

impl ExponentialAtmosphere {
    pub fn new(surface_density_kg_m3: f64, scale_height_km: f64) -> Result<Self, AtmosphereError> {
        if !(scale_height_km > 0.0) || !scale_height_km.is_finite() {
            return Err(AtmosphereError::InvalidScaleHeight);
        }
        if !(surface_density_kg_m3 >= 0.0) || !surface_density_kg_m3.is_finite() {
            return Err(AtmosphereError::InvalidSurfaceDensity);
        }
        Ok(Self {
            surface_density_kg_m3,
            scale_height_km,
        })
    }

    /// Density at altitude; zero below the surface.
    pub fn density(&self, altitude_km: f64) -> f64 {
        if !(altitude_km >= 0.0) {
            return 0.0;
        }
        self.surface_density_kg_m3 * (-altitude_km / self.scale_height_km).exp()
    }
}

/// Velocity of the state relative to an atmosphere co-rotating about +z, minus any wind.
pub fn relative_velocity(state: &State, rotation_rate_rad_s: f64, wind_km_s: &Vector3) -> Vector3 {
    let omega = [0.0, 0.0, rotation_rate_rad_s];
    let co_rotation = vector::cross(&omega, &state.position_km);
    vector::sub(
        &vector::sub(&state.velocity_km_s, &co_rotation),
        wind_km_s,
    )
}
