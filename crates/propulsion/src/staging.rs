//! Optimal mass split of a serial multi-stage vehicle.
//!
//! Each stage is described by its specific impulse and structural ratio
//! `ε = structure / (structure + propellant)`. The Lagrange multiplier `η` of the
//! minimum-mass problem satisfies `Σ cᵢ ln nᵢ(η) = v_bo`, where
//! `nᵢ = (cᵢη − 1) / (cᵢεᵢη)` is the stage mass ratio; it is found by bisection.

use orbital_core::constants::G0;
use orbital_core::roots::{self, RootError};
use serde::Serialize;
use thiserror::Error;

const BRACKET_DOUBLINGS: usize = 200;

/// One stage, listed from the bottom (first to burn) upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSpec {
    pub isp_seconds: f64,
    pub structural_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageMasses {
    pub mass_ratio: f64,
    /// Structure plus propellant of this stage alone.
    pub step_mass_kg: f64,
    pub structural_mass_kg: f64,
    pub propellant_mass_kg: f64,
    /// Mass at ignition of this stage, including everything above it and the payload.
    pub ignition_mass_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagingSolution {
    pub lagrange_multiplier: f64,
    /// Bottom stage first.
    pub stages: Vec<StageMasses>,
    pub payload_mass_kg: f64,
    pub total_mass_kg: f64,
}

impl StagingSolution {
    /// Ideal burnout velocity (m/s) of the solved vehicle.
    pub fn burnout_velocity_m_s(&self, specs: &[StageSpec]) -> f64 {
        specs
            .iter()
            .zip(&self.stages)
            .map(|(spec, stage)| spec.isp_seconds * G0 * stage.mass_ratio.ln())
            .sum()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StagingError {
    #[error("stage {index} is invalid: {reason}")]
    InvalidStage { index: usize, reason: String },
    #[error(
        "burnout velocity {requested_m_s} m/s is not reachable (limit {limit_m_s} m/s for these stages)"
    )]
    Unreachable { requested_m_s: f64, limit_m_s: f64 },
    #[error("lagrange multiplier search failed: {0}")]
    Root(#[from] RootError),
}

/// Minimum-mass staging delivering `burnout_velocity_m_s` to `payload_mass_kg`.
pub fn optimal_staging(
    stages: &[StageSpec],
    payload_mass_kg: f64,
    burnout_velocity_m_s: f64,
) -> Result<StagingSolution, StagingError> {
    if stages.is_empty() {
        return Err(StagingError::InvalidStage {
            index: 0,
            reason: "at least one stage is required".into(),
        });
    }
    for (index, stage) in stages.iter().enumerate() {
        if !(stage.isp_seconds > 0.0 && stage.isp_seconds.is_finite()) {
            return Err(StagingError::InvalidStage {
                index,
                reason: format!("specific impulse {} s must be positive", stage.isp_seconds),
            });
        }
        if !(stage.structural_ratio > 0.0 && stage.structural_ratio < 1.0) {
            return Err(StagingError::InvalidStage {
                index,
                reason: format!(
                    "structural ratio {} must lie strictly between 0 and 1",
                    stage.structural_ratio
                ),
            });
        }
    }
    if !(payload_mass_kg > 0.0) {
        return Err(StagingError::InvalidStage {
            index: stages.len(),
            reason: format!("payload mass {payload_mass_kg} kg must be positive"),
        });
    }

    let exhaust: Vec<f64> = stages.iter().map(|s| s.isp_seconds * G0).collect();
    let limit: f64 = stages
        .iter()
        .zip(&exhaust)
        .map(|(s, c)| c * (1.0 / s.structural_ratio).ln())
        .sum();
    if !(burnout_velocity_m_s > 0.0) || burnout_velocity_m_s >= limit {
        return Err(StagingError::Unreachable {
            requested_m_s: burnout_velocity_m_s,
            limit_m_s: limit,
        });
    }

    let mass_ratio = |eta: f64, i: usize| {
        let c = exhaust[i];
        (c * eta - 1.0) / (c * stages[i].structural_ratio * eta)
    };
    let residual = |eta: f64| {
        (0..stages.len())
            .map(|i| exhaust[i] * mass_ratio(eta, i).ln())
            .sum::<f64>()
            - burnout_velocity_m_s
    };

    let lo = stages
        .iter()
        .zip(&exhaust)
        .map(|(s, c)| 1.0 / (c * (1.0 - s.structural_ratio)))
        .fold(f64::MIN, f64::max)
        * (1.0 + 1e-12);
    let mut hi = 2.0 * lo;
    let mut doublings = 0;
    while residual(hi) <= 0.0 {
        hi *= 2.0;
        doublings += 1;
        if doublings > BRACKET_DOUBLINGS {
            return Err(StagingError::Unreachable {
                requested_m_s: burnout_velocity_m_s,
                limit_m_s: limit,
            });
        }
    }

    let eta = roots::bisect(residual, lo, hi, 1e-12, 500)?;

    let mut masses = vec![
        StageMasses {
            mass_ratio: 0.0,
            step_mass_kg: 0.0,
            structural_mass_kg: 0.0,
            propellant_mass_kg: 0.0,
            ignition_mass_kg: 0.0,
        };
        stages.len()
    ];
    let mut above = payload_mass_kg;
    for i in (0..stages.len()).rev() {
        let n = mass_ratio(eta, i);
        let epsilon = stages[i].structural_ratio;
        let step = (n - 1.0) / (1.0 - n * epsilon) * above;
        let structural = step * epsilon;
        above += step;
        masses[i] = StageMasses {
            mass_ratio: n,
            step_mass_kg: step,
            structural_mass_kg: structural,
            propellant_mass_kg: step - structural,
            ignition_mass_kg: above,
        };
    }

    Ok(StagingSolution {
        lagrange_multiplier: eta,
        stages: masses,
        payload_mass_kg,
        total_mass_kg: above,
    })
}
