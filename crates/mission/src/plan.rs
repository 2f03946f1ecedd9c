use orbital_core::State;
use orbital_forces::ForceStack;
use orbital_propagator::{AltitudeFloor, Span, StepPolicy};

use crate::manoeuvre::Manoeuvre;
use crate::{SegmentError, SequenceError};

/// One entry of a mission timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Coast(Span),
    Manoeuvre(Manoeuvre),
}

impl Segment {
    pub fn kind(&self) -> &'static str {
        match self {
            Segment::Coast(_) => "coast",
            Segment::Manoeuvre(m) => m.kind(),
        }
    }
}

/// Everything the sequencer needs to fly a mission.
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub initial: State,
    pub stack: ForceStack,
    pub policy: StepPolicy,
    pub segments: Vec<Segment>,
    pub altitude_floor: Option<AltitudeFloor>,
}

impl MissionPlan {
    pub fn new(initial: State, stack: ForceStack, policy: StepPolicy) -> Self {
        Self {
            initial,
            stack,
            policy,
            segments: Vec::new(),
            altitude_floor: None,
        }
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn coast(self, duration_s: f64) -> Self {
        self.with_segment(Segment::Coast(Span::Duration(duration_s)))
    }

    pub fn manoeuvre(self, manoeuvre: Manoeuvre) -> Self {
        self.with_segment(Segment::Manoeuvre(manoeuvre))
    }

    pub fn with_altitude_floor(mut self, floor: AltitudeFloor) -> Self {
        self.altitude_floor = Some(floor);
        self
    }

    /// Check every parameter that can be checked before integration starts.
    ///
    /// Plan-level problems are reported against segment 0.
    pub fn validate(&self) -> Result<(), SequenceError> {
        let plan_error = |source: SegmentError| SequenceError {
            segment_index: 0,
            source,
        };
        self.policy
            .validate()
            .map_err(|err| plan_error(SegmentError::Integration(err)))?;
        if self.stack.is_empty() {
            return Err(plan_error(SegmentError::Configuration(
                "force stack is empty".into(),
            )));
        }
        if !self.initial.is_finite() {
            return Err(plan_error(SegmentError::Configuration(
                "initial state is not finite".into(),
            )));
        }
        for (index, segment) in self.segments.iter().enumerate() {
            validate_segment(segment).map_err(|source| SequenceError {
                segment_index: index,
                source,
            })?;
        }
        Ok(())
    }
}

fn validate_segment(segment: &Segment) -> Result<(), SegmentError> {
    match segment {
        Segment::Coast(Span::Duration(duration)) => positive("coast duration", *duration),
        Segment::Coast(Span::ToEpoch(epoch)) => finite("coast target epoch", *epoch),
        Segment::Manoeuvre(Manoeuvre::Impulsive(burn)) => {
            if !burn.delta_v_km_s.iter().all(|c| c.is_finite()) {
                return Err(SegmentError::Configuration(
                    "impulsive delta-v is not finite".into(),
                ));
            }
            if let Some(isp) = burn.isp_seconds {
                positive("impulsive isp", isp)?;
            }
            if let Some(limit) = burn.max_delta_v_km_s {
                positive("impulsive delta-v limit", limit)?;
            }
            Ok(())
        }
        Segment::Manoeuvre(Manoeuvre::FiniteBurn(burn)) => {
            burn.engine
                .validate()
                .map_err(|err| SegmentError::Configuration(err.to_string()))?;
            positive("burn duration", burn.duration_s)?;
            if !(burn.dry_mass_kg >= 0.0) {
                return Err(SegmentError::Configuration(format!(
                    "dry mass {} kg must be non-negative",
                    burn.dry_mass_kg
                )));
            }
            Ok(())
        }
        Segment::Manoeuvre(Manoeuvre::Transfer(transfer)) => {
            positive("transfer time of flight", transfer.time_of_flight_s)?;
            positive("transfer gravitational parameter", transfer.mu_km3_s2)
        }
    }
}

fn finite(name: &str, value: f64) -> Result<(), SegmentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SegmentError::Configuration(format!("{name} {value} is not finite")))
    }
}

fn positive(name: &str, value: f64) -> Result<(), SegmentError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SegmentError::Configuration(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
