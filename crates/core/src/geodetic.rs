//! Launch sites on a spherical, uniformly rotating body.
//!
//! The body-fixed and inertial frames share the z axis (the spin axis) and coincide at
//! epoch zero, so a site's inertial longitude is its geographic longitude plus `ω·t`.

use serde::{Deserialize, Serialize};

use crate::State;
use crate::vector::{self, Vector3};

/// Latitude and longitude in degrees, altitude in km above the reference sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchSite {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_km: f64,
}

impl LaunchSite {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_km,
        }
    }

    /// Inertial position of the site at `epoch_s`.
    pub fn position_km(&self, body_radius_km: f64, rotation_rate_rad_s: f64, epoch_s: f64) -> Vector3 {
        let r = body_radius_km + self.altitude_km;
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians() + rotation_rate_rad_s * epoch_s;
        [r * lat.cos() * lon.cos(), r * lat.cos() * lon.sin(), r * lat.sin()]
    }

    /// State of a vehicle sitting on the pad: it moves with the surface.
    pub fn state(&self, body_radius_km: f64, rotation_rate_rad_s: f64, epoch_s: f64) -> State {
        let position = self.position_km(body_radius_km, rotation_rate_rad_s, epoch_s);
        let velocity = vector::cross(&[0.0, 0.0, rotation_rate_rad_s], &position);
        State::new(epoch_s, position, velocity)
    }

    /// Site directly below `position_km` at `epoch_s`. `None` at the centre of the body.
    pub fn beneath(
        position_km: &Vector3,
        body_radius_km: f64,
        rotation_rate_rad_s: f64,
        epoch_s: f64,
    ) -> Option<Self> {
        let r = vector::norm(position_km);
        if r == 0.0 {
            return None;
        }
        let [x, y, z] = *position_km;
        let latitude = (z / r).clamp(-1.0, 1.0).asin();
        let longitude = wrap_degrees((y.atan2(x) - rotation_rate_rad_s * epoch_s).to_degrees());
        Some(Self::new(latitude.to_degrees(), longitude, r - body_radius_km))
    }
}

/// Wrap an angle into (-180, 180].
fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}
