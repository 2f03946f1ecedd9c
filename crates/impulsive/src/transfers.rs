//! Analytic estimators for impulsive transfers in the coplanar, circular limit.
//!
//! Provides Hohmann, bi-elliptic and plane-change calculators returning delta-v components
//! and time of flight for two-body Keplerian motion about a body with the given GM.

use std::f64::consts::PI;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransferError {
    #[error("{name} must be positive and finite (got {value})")]
    NonPositive { name: &'static str, value: f64 },
}

fn positive(name: &'static str, value: f64) -> Result<f64, TransferError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(TransferError::NonPositive { name, value })
    }
}

/// Result for a Hohmann transfer between circular, coplanar orbits of radii r1 and r2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HohmannResult {
    /// Signed: negative for an inward (retrograde) departure burn.
    pub dv1_km_s: f64,
    /// Signed: negative for a retrograde capture when arriving inward.
    pub dv2_km_s: f64,
    pub dv_total_km_s: f64,
    pub tof_seconds: f64,
    pub transfer_semi_major_axis_km: f64,
}

/// Classical Hohmann transfer between two circular coplanar orbits.
pub fn hohmann(r1_km: f64, r2_km: f64, mu_km3_s2: f64) -> Result<HohmannResult, TransferError> {
    let r1 = positive("r1_km", r1_km)?;
    let r2 = positive("r2_km", r2_km)?;
    let mu = positive("mu_km3_s2", mu_km3_s2)?;

    let v1 = (mu / r1).sqrt();
    let v2 = (mu / r2).sqrt();
    let a_t = 0.5 * (r1 + r2);
    let tof = PI * (a_t.powi(3) / mu).sqrt();

    let v_t1 = (mu * (2.0 / r1 - 1.0 / a_t)).sqrt();
    let v_t2 = (mu * (2.0 / r2 - 1.0 / a_t)).sqrt();

    let dv1 = v_t1 - v1;
    let dv2 = v2 - v_t2;

    Ok(HohmannResult {
        dv1_km_s: dv1,
        dv2_km_s: dv2,
        dv_total_km_s: dv1.abs() + dv2.abs(),
        tof_seconds: tof,
        transfer_semi_major_axis_km: a_t,
    })
}

/// Result for a bi-elliptic transfer parameterised by the intermediate apoapsis radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiEllipticResult {
    pub rb_km: f64,
    pub dv1_km_s: f64,
    pub dv2_km_s: f64,
    pub dv3_km_s: f64,
    pub dv_total_km_s: f64,
    pub tof_seconds: f64,
}

/// Bi-elliptic transfer through the intermediate apoapsis `rb_km`.
///
/// `rb_km` is not optimised. For radius ratios beyond about 11.94 a large enough `rb_km`
/// beats Hohmann.
pub fn bi_elliptic(
    r1_km: f64,
    r2_km: f64,
    rb_km: f64,
    mu_km3_s2: f64,
) -> Result<BiEllipticResult, TransferError> {
    let r1 = positive("r1_km", r1_km)?;
    let r2 = positive("r2_km", r2_km)?;
    let rb = positive("rb_km", rb_km)?;
    let mu = positive("mu_km3_s2", mu_km3_s2)?;

    let v1 = (mu / r1).sqrt();
    let v2 = (mu / r2).sqrt();

    let a1 = 0.5 * (r1 + rb);
    let v_peri_1 = (mu * (2.0 / r1 - 1.0 / a1)).sqrt();
    let v_apo_1 = (mu * (2.0 / rb - 1.0 / a1)).sqrt();

    let a2 = 0.5 * (rb + r2);
    let v_peri_2 = (mu * (2.0 / rb - 1.0 / a2)).sqrt();
    let v_apo_2 = (mu * (2.0 / r2 - 1.0 / a2)).sqrt();

    let dv1 = v_peri_1 - v1;
    let dv2 = v_peri_2 - v_apo_1;
    let dv3 = v2 - v_apo_2;

    Ok(BiEllipticResult {
        rb_km: rb,
        dv1_km_s: dv1,
        dv2_km_s: dv2,
        dv3_km_s: dv3,
        dv_total_km_s: dv1.abs() + dv2.abs() + dv3.abs(),
        tof_seconds: PI * ((a1.powi(3) / mu).sqrt() + (a2.powi(3) / mu).sqrt()),
    })
}

/// Δv to rotate a velocity of constant magnitude by `delta_inclination_rad`.
pub fn plane_change(speed_km_s: f64, delta_inclination_rad: f64) -> f64 {
    2.0 * speed_km_s.abs() * (0.5 * delta_inclination_rad).sin().abs()
}

/// Δv for a single burn that changes speed from `v1` to `v2` while rotating the plane.
pub fn combined_plane_change(v1_km_s: f64, v2_km_s: f64, delta_inclination_rad: f64) -> f64 {
    (v1_km_s * v1_km_s + v2_km_s * v2_km_s
        - 2.0 * v1_km_s * v2_km_s * delta_inclination_rad.cos())
    .max(0.0)
    .sqrt()
}
