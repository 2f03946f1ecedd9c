//! Core units, constants, and shared primitives for the orbital toolkit workspace.

pub mod geodetic;
pub mod roots;
pub mod state;

pub use geodetic::LaunchSite;
pub use state::State;

/// Physical constants expressed in the workspace units (km, s, kg) unless stated otherwise.
pub mod constants {
    /// Standard gravity used to turn specific impulse into exhaust velocity (m/s²).
    pub const G0: f64 = 9.80665;
    /// Astronomical unit (km).
    pub const AU_KM: f64 = 149_597_870.7;
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Earth gravitational parameter (km³/s²).
    pub const MU_EARTH: f64 = 398_600.441_8;
    /// Earth equatorial radius (km).
    pub const EARTH_RADIUS_KM: f64 = 6_378.136_3;
    /// Earth second zonal harmonic.
    pub const J2_EARTH: f64 = 1.082_626_68e-3;
    /// Earth third zonal harmonic.
    pub const J3_EARTH: f64 = -2.532_656_49e-6;
    /// Earth sidereal rotation rate (rad/s).
    pub const EARTH_ROTATION_RATE: f64 = 7.292_115_9e-5;
    /// Sun gravitational parameter (km³/s²).
    pub const MU_SUN: f64 = 1.327_124_400_18e11;
    /// Moon gravitational parameter (km³/s²).
    pub const MU_MOON: f64 = 4_902.800_066;
    /// Mean Earth-Moon distance (km).
    pub const MOON_DISTANCE_KM: f64 = 384_400.0;
    /// Solar radiation pressure on an absorbing surface at 1 AU (N/m²).
    pub const SOLAR_PRESSURE_1AU: f64 = 4.56e-6;
    /// Geostationary altitude above the equatorial radius (km).
    pub const GEO_ALTITUDE_KM: f64 = 35_786.0;
}

pub mod units {
    /// m/s to km/s, for thrust accelerations computed in SI.
    #[inline]
    pub fn ms_to_kms(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Manifests carry angles in degrees.
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v.to_radians()
    }
}

/// Epochs are seconds; these help when a duration is easier to read in days.
pub mod time {
    use super::constants::SECONDS_PER_DAY;

    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    #[inline]
    pub fn seconds_to_days(seconds: f64) -> f64 {
        seconds / SECONDS_PER_DAY
    }
}

/// `[f64; 3]` arithmetic used by every force model and frame transform.
pub mod vector {
    /// Position (km), velocity (km/s) or acceleration (km/s²) in the inertial frame.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0, 0.0, 0.0];

    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector along `v`, or `None` for a zero-length input.
    #[inline]
    pub fn unit(v: &Vector3) -> Option<Vector3> {
        let n = norm(v);
        if n > 0.0 && n.is_finite() {
            Some([v[0] / n, v[1] / n, v[2] / n])
        } else {
            None
        }
    }

    /// Distance between two points.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        norm(&sub(a, b))
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(v: &Vector3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}
