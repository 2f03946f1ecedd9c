use orbital_core::State;
use orbital_core::constants::{EARTH_RADIUS_KM, J2_EARTH, J3_EARTH};
use orbital_core::vector::{self, Vector3};

use crate::ForceModel;

/// Zonal harmonics of an axisymmetric body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zonal {
    pub body_radius_km: f64,
    pub j2: f64,
    pub j3: f64,
}

impl Zonal {
    pub fn earth() -> Self {
        Self {
            body_radius_km: EARTH_RADIUS_KM,
            j2: J2_EARTH,
            j3: J3_EARTH,
        }
    }

    pub fn earth_j2() -> Self {
        Self {
            j3: 0.0,
            ..Self::earth()
        }
    }
}

/// Central-body gravity: point mass plus optional J2/J3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub mu_km3_s2: f64,
    pub zonal: Option<Zonal>,
}

impl Gravity {
    pub fn point_mass(mu_km3_s2: f64) -> Self {
        Self {
            mu_km3_s2,
            zonal: None,
        }
    }

    pub fn with_zonal(mu_km3_s2: f64, zonal: Zonal) -> Self {
        Self {
            mu_km3_s2,
            zonal: Some(zonal),
        }
    }
}

impl ForceModel for Gravity {
    fn name(&self) -> &str {
        "gravity"
    }

    fn acceleration(&self, state: &State) -> Vector3 {
        let r = state.position_km;
        let r_mag = vector::norm(&r);
        let mu = self.mu_km3_s2;
        let mut acc = vector::scale(&r, -mu / r_mag.powi(3));

        if let Some(zonal) = self.zonal {
            let re = zonal.body_radius_km;
            let z = r[2];
            let r2 = r_mag * r_mag;
            let z2_r2 = z * z / r2;

            if zonal.j2 != 0.0 {
                let factor = -1.5 * zonal.j2 * mu * re * re / r_mag.powi(5);
                acc[0] += factor * r[0] * (1.0 - 5.0 * z2_r2);
                acc[1] += factor * r[1] * (1.0 - 5.0 * z2_r2);
                acc[2] += factor * z * (3.0 - 5.0 * z2_r2);
            }

            if zonal.j3 != 0.0 {
                let factor = -2.5 * zonal.j3 * mu * re.powi(3) / r_mag.powi(7);
                let planar = 3.0 * z - 7.0 * z.powi(3) / r2;
                acc[0] += factor * r[0] * planar;
                acc[1] += factor * r[1] * planar;
                acc[2] += factor * (6.0 * z * z - 7.0 * z.powi(4) / r2 - 0.6 * r2);
            }
        }

        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::constants::MU_EARTH;

    #[test]
    fn point_mass_points_at_centre() {
        let g = Gravity::point_mass(MU_EARTH);
        let state = State::new(0.0, [7_000.0, 0.0, 0.0], [0.0; 3]);
        let acc = g.acceleration(&state);
        assert!((acc[0] + MU_EARTH / 49e6).abs() < 1e-15);
        assert_eq!(acc[1], 0.0);
    }

    #[test]
    fn j2_strengthens_equatorial_pull() {
        let state = State::new(0.0, [7_000.0, 0.0, 0.0], [0.0; 3]);
        let point = Gravity::point_mass(MU_EARTH).acceleration(&state);
        let oblate = Gravity::with_zonal(MU_EARTH, Zonal::earth_j2()).acceleration(&state);
        assert!(oblate[0] < point[0]);
        assert_eq!(oblate[2], 0.0);
    }

    #[test]
    fn j3_is_antisymmetric_about_equator() {
        let zonal = Zonal {
            j2: 0.0,
            ..Zonal::earth()
        };
        let g = Gravity::with_zonal(MU_EARTH, zonal);
        let north = g.acceleration(&State::new(0.0, [5_000.0, 0.0, 4_000.0], [0.0; 3]));
        let south = g.acceleration(&State::new(0.0, [5_000.0, 0.0, -4_000.0], [0.0; 3]));
        let point = Gravity::point_mass(MU_EARTH);
        let pn = point.acceleration(&State::new(0.0, [5_000.0, 0.0, 4_000.0], [0.0; 3]));
        let ps = point.acceleration(&State::new(0.0, [5_000.0, 0.0, -4_000.0], [0.0; 3]));
        let dn = north[0] - pn[0];
        let ds = south[0] - ps[0];
        assert!(dn.abs() > 0.0);
        assert!((dn + ds).abs() < 1e-6 * dn.abs());
        // z component is even in z
        let (zn, zs) = (north[2] - pn[2], south[2] - ps[2]);
        assert!((zn - zs).abs() < 1e-6 * zn.abs());
    }
}
