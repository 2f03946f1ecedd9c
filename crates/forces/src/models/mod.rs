//! Built-in force models.

pub mod drag;
pub mod gravity;
pub mod lift;
pub mod srp;
pub mod third_body;

pub use drag::AtmosphericDrag;
pub use gravity::{Gravity, Zonal};
pub use lift::AerodynamicLift;
pub use srp::SolarRadiationPressure;
pub use third_body::ThirdBody;
