//! Spacecraft trajectory toolkit.
//!
//! The member crates do the work; this crate re-exports them under short names and adds
//! the pieces a front-end needs: logging setup and a one-call scenario runner.

pub mod logging;
pub mod scenario;

pub use orbital_atmosphere as atmosphere;
pub use orbital_config as config;
pub use orbital_core as core;
pub use orbital_forces as forces;
pub use orbital_impulsive as impulsive;
pub use orbital_lowthrust as lowthrust;
pub use orbital_mission as mission;
pub use orbital_optimiser as optimiser;
pub use orbital_orbits as orbits;
pub use orbital_propagator as propagator;
pub use orbital_propulsion as propulsion;

pub use orbital_core::State;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
