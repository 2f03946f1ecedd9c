//! Manoeuvres, mission plans and the sequencer that chains them into one timeline.

pub mod facade;
pub mod manoeuvre;
pub mod plan;
pub mod sequencer;

use orbital_impulsive::LambertError;
use orbital_orbits::ElementsError;
use orbital_propagator::IntegrationError;
use thiserror::Error;

pub use manoeuvre::{
    BurnArc, BurnFrame, FiniteBurn, ImpulsiveBurn, Manoeuvre, TransferBurn, TransferSolution,
    TransferTarget, solve_transfer,
};
pub use plan::{MissionPlan, Segment};
pub use sequencer::{MissionOutcome, SegmentReport, Sequencer, SequencerStatus};

/// Failure of a single segment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SegmentError {
    #[error("invalid segment configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
    #[error(transparent)]
    Transfer(#[from] LambertError),
    #[error("propellant depleted: {required_kg:.3} kg required, {available_kg:.3} kg available")]
    PropellantDepleted { required_kg: f64, available_kg: f64 },
    #[error("impulse of {requested_km_s:.4} km/s exceeds the {limit_km_s:.4} km/s per-burn limit")]
    DeltaVLimitExceeded { requested_km_s: f64, limit_km_s: f64 },
    #[error("burn frame is undefined for a state with zero radius, velocity or angular momentum")]
    DegenerateFrame,
    #[error(transparent)]
    Elements(#[from] ElementsError),
}

/// A segment failure tagged with the index of the offending segment.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("segment {segment_index} failed: {source}")]
pub struct SequenceError {
    pub segment_index: usize,
    #[source]
    pub source: SegmentError,
}
