//! Universal-variable two-body propagation and the Stumpff functions it relies on.

use orbital_core::State;
use orbital_core::vector;
use thiserror::Error;

const MAX_ITERATIONS: usize = 64;
const SERIES_THRESHOLD: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeplerError {
    #[error("universal anomaly did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("state has zero radius")]
    DegenerateState,
}

/// Stumpff function C(z).
pub fn stumpff_c(z: f64) -> f64 {
    if z.abs() < SERIES_THRESHOLD {
        0.5 - z / 24.0 + z * z / 720.0
    } else if z > 0.0 {
        (1.0 - z.sqrt().cos()) / z
    } else {
        ((-z).sqrt().cosh() - 1.0) / (-z)
    }
}

/// Stumpff function S(z).
pub fn stumpff_s(z: f64) -> f64 {
    if z.abs() < SERIES_THRESHOLD {
        1.0 / 6.0 - z / 120.0 + z * z / 5_040.0
    } else if z > 0.0 {
        let s = z.sqrt();
        (s - s.sin()) / (s * s * s)
    } else {
        let s = (-z).sqrt();
        (s.sinh() - s) / (s * s * s)
    }
}

/// Propagate a state by `dt_s` seconds on a pure Keplerian conic.
///
/// Mass and frame are carried through unchanged. Works for elliptic, parabolic and
/// hyperbolic motion and for negative `dt_s`.
pub fn propagate(state: &State, dt_s: f64, mu_km3_s2: f64) -> Result<State, KeplerError> {
    let r0 = state.position_km;
    let v0 = state.velocity_km_s;
    let r0_mag = vector::norm(&r0);
    if r0_mag <= 0.0 {
        return Err(KeplerError::DegenerateState);
    }
    if dt_s == 0.0 {
        return Ok(*state);
    }

    let sqrt_mu = mu_km3_s2.sqrt();
    let v0_mag = vector::norm(&v0);
    let vr0 = vector::dot(&r0, &v0) / r0_mag;
    let alpha = 2.0 / r0_mag - v0_mag * v0_mag / mu_km3_s2;

    let mut chi = sqrt_mu * alpha.abs() * dt_s;
    if alpha.abs() < 1e-12 || !chi.is_finite() {
        chi = sqrt_mu * dt_s / r0_mag;
    }

    let mut converged = false;
    for _ in 0..MAX_ITERATIONS {
        let z = alpha * chi * chi;
        let c = stumpff_c(z);
        let s = stumpff_s(z);
        let f = r0_mag * vr0 / sqrt_mu * chi * chi * c
            + (1.0 - alpha * r0_mag) * chi.powi(3) * s
            + r0_mag * chi
            - sqrt_mu * dt_s;
        let df = r0_mag * vr0 / sqrt_mu * chi * (1.0 - alpha * chi * chi * s)
            + (1.0 - alpha * r0_mag) * chi * chi * c
            + r0_mag;
        let ratio = f / df;
        chi -= ratio;
        if ratio.abs() <= 1e-12 * chi.abs().max(1.0) {
            converged = true;
            break;
        }
    }
    if !converged || !chi.is_finite() {
        return Err(KeplerError::NoConvergence {
            iterations: MAX_ITERATIONS,
        });
    }

    let z = alpha * chi * chi;
    let c = stumpff_c(z);
    let s = stumpff_s(z);
    let f = 1.0 - chi * chi / r0_mag * c;
    let g = dt_s - chi.powi(3) / sqrt_mu * s;
    let r = vector::add(&vector::scale(&r0, f), &vector::scale(&v0, g));
    let r_mag = vector::norm(&r);
    let f_dot = sqrt_mu / (r_mag * r0_mag) * (alpha * chi.powi(3) * s - chi);
    let g_dot = 1.0 - chi * chi / r_mag * c;
    let v = vector::add(&vector::scale(&r0, f_dot), &vector::scale(&v0, g_dot));

    Ok(State {
        epoch_s: state.epoch_s + dt_s,
        position_km: r,
        velocity_km_s: v,
        mass_kg: state.mass_kg,
    })
}
