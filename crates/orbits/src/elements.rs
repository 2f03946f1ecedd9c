//! Classical orbital elements as a derived view of a Cartesian state.

use std::f64::consts::{PI, TAU};

use orbital_core::State;
use orbital_core::vector::{self, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CIRCULAR_EPS: f64 = 1e-10;
const EQUATORIAL_EPS: f64 = 1e-10;
const PARABOLIC_EPS: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ElementsError {
    #[error("state has zero radius or zero angular momentum; elements are undefined")]
    DegenerateState,
    #[error("orbit is parabolic (e = {eccentricity}); semi-major axis is undefined")]
    Parabolic { eccentricity: f64 },
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),
}

/// Classical Keplerian elements. Angles in radians, semi-major axis negative for hyperbolae.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_rad: f64,
    pub raan_rad: f64,
    pub argument_of_periapsis_rad: f64,
    pub true_anomaly_rad: f64,
}

impl OrbitalElements {
    /// Derive elements from a Cartesian state.
    ///
    /// Circular orbits report a zero argument of periapsis and measure the true anomaly from
    /// the ascending node (argument of latitude). Equatorial orbits report a zero RAAN and
    /// measure from the inertial x axis instead.
    pub fn from_state(state: &State, mu_km3_s2: f64) -> Result<Self, ElementsError> {
        let r = state.position_km;
        let v = state.velocity_km_s;
        let r_mag = vector::norm(&r);
        let v_mag = vector::norm(&v);
        let h = vector::cross(&r, &v);
        let h_mag = vector::norm(&h);
        if r_mag <= 0.0 || h_mag <= f64::EPSILON * r_mag * v_mag.max(1.0) {
            return Err(ElementsError::DegenerateState);
        }

        let inclination = clamped_acos(h[2] / h_mag);
        let node: Vector3 = [-h[1], h[0], 0.0];
        let node_mag = vector::norm(&node);
        let equatorial = node_mag <= EQUATORIAL_EPS * h_mag;

        let rv = vector::dot(&r, &v);
        let e_vec = vector::scale(
            &vector::sub(
                &vector::scale(&r, v_mag * v_mag - mu_km3_s2 / r_mag),
                &vector::scale(&v, rv),
            ),
            1.0 / mu_km3_s2,
        );
        let eccentricity = vector::norm(&e_vec);
        if (1.0 - eccentricity).abs() < PARABOLIC_EPS {
            return Err(ElementsError::Parabolic { eccentricity });
        }
        let circular = eccentricity < CIRCULAR_EPS;

        let energy = 0.5 * v_mag * v_mag - mu_km3_s2 / r_mag;
        let semi_major_axis = -mu_km3_s2 / (2.0 * energy);

        let raan = if equatorial {
            0.0
        } else {
            let raan = clamped_acos(node[0] / node_mag);
            if node[1] < 0.0 { TAU - raan } else { raan }
        };

        let argument_of_periapsis = match (circular, equatorial) {
            (true, _) => 0.0,
            (false, false) => {
                let w = clamped_acos(vector::dot(&node, &e_vec) / (node_mag * eccentricity));
                if e_vec[2] < 0.0 { TAU - w } else { w }
            }
            (false, true) => {
                let w = e_vec[1].atan2(e_vec[0]).rem_euclid(TAU);
                if h[2] < 0.0 { (TAU - w).rem_euclid(TAU) } else { w }
            }
        };

        let true_anomaly = match (circular, equatorial) {
            (false, _) => {
                let nu = clamped_acos(vector::dot(&e_vec, &r) / (eccentricity * r_mag));
                if rv < 0.0 { TAU - nu } else { nu }
            }
            (true, false) => {
                let u = clamped_acos(vector::dot(&node, &r) / (node_mag * r_mag));
                if r[2] < 0.0 { TAU - u } else { u }
            }
            (true, true) => {
                let l = r[1].atan2(r[0]).rem_euclid(TAU);
                if h[2] < 0.0 { (TAU - l).rem_euclid(TAU) } else { l }
            }
        };

        Ok(Self {
            semi_major_axis_km: semi_major_axis,
            eccentricity,
            inclination_rad: inclination,
            raan_rad: raan,
            argument_of_periapsis_rad: argument_of_periapsis,
            true_anomaly_rad: true_anomaly,
        })
    }

    /// Build the Cartesian state for these elements.
    pub fn to_state(
        &self,
        mu_km3_s2: f64,
        epoch_s: f64,
        mass_kg: Option<f64>,
    ) -> Result<State, ElementsError> {
        let a = self.semi_major_axis_km;
        let e = self.eccentricity;
        if !(e >= 0.0) || (1.0 - e).abs() < PARABOLIC_EPS {
            return Err(ElementsError::InvalidElements(format!(
                "eccentricity {e} is negative or parabolic"
            )));
        }
        if (e < 1.0 && a <= 0.0) || (e > 1.0 && a >= 0.0) {
            return Err(ElementsError::InvalidElements(format!(
                "semi-major axis {a} km is inconsistent with eccentricity {e}"
            )));
        }
        let nu = self.true_anomaly_rad;
        let p = a * (1.0 - e * e);
        let denom = 1.0 + e * nu.cos();
        if denom <= 0.0 {
            return Err(ElementsError::InvalidElements(format!(
                "true anomaly {nu} rad lies beyond the hyperbolic asymptote"
            )));
        }

        let r_pf = p / denom;
        let r_pqw = [r_pf * nu.cos(), r_pf * nu.sin(), 0.0];
        let v_factor = (mu_km3_s2 / p).sqrt();
        let v_pqw = [-v_factor * nu.sin(), v_factor * (e + nu.cos()), 0.0];

        let (sin_o, cos_o) = self.raan_rad.sin_cos();
        let (sin_w, cos_w) = self.argument_of_periapsis_rad.sin_cos();
        let (sin_i, cos_i) = self.inclination_rad.sin_cos();
        let rot = [
            [
                cos_o * cos_w - sin_o * sin_w * cos_i,
                -cos_o * sin_w - sin_o * cos_w * cos_i,
                sin_o * sin_i,
            ],
            [
                sin_o * cos_w + cos_o * sin_w * cos_i,
                -sin_o * sin_w + cos_o * cos_w * cos_i,
                -cos_o * sin_i,
            ],
            [sin_w * sin_i, cos_w * sin_i, cos_i],
        ];

        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];
        for row in 0..3 {
            for col in 0..3 {
                position[row] += rot[row][col] * r_pqw[col];
                velocity[row] += rot[row][col] * v_pqw[col];
            }
        }

        Ok(State {
            epoch_s,
            position_km: position,
            velocity_km_s: velocity,
            mass_kg,
        })
    }

    pub fn is_bound(&self) -> bool {
        self.eccentricity < 1.0
    }

    pub fn periapsis_radius_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius, infinite for unbound orbits.
    pub fn apoapsis_radius_km(&self) -> f64 {
        if self.is_bound() {
            self.semi_major_axis_km * (1.0 + self.eccentricity)
        } else {
            f64::INFINITY
        }
    }

    /// Orbital period, `None` for unbound orbits.
    pub fn period_s(&self, mu_km3_s2: f64) -> Option<f64> {
        self.is_bound()
            .then(|| 2.0 * PI * (self.semi_major_axis_km.powi(3) / mu_km3_s2).sqrt())
    }
}

fn clamped_acos(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}
