use orbital_core::State;
use serde::Serialize;

/// Why a propagation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Termination {
    ReachedTarget,
    /// The altitude floor was crossed; the last sample sits on the floor.
    AltitudeFloor { epoch_s: f64, altitude_km: f64 },
}

/// Ordered samples of a propagation, one per accepted step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub samples: Vec<State>,
    pub termination: Termination,
}

impl Trajectory {
    pub fn initial_state(&self) -> Option<&State> {
        self.samples.first()
    }

    pub fn final_state(&self) -> Option<&State> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Signed elapsed time between the first and last sample.
    pub fn elapsed_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.epoch_s - first.epoch_s,
            _ => 0.0,
        }
    }

    /// Append another trajectory, dropping its first sample when it repeats our last one.
    pub fn extend_with(&mut self, next: Trajectory) {
        let mut samples = next.samples.into_iter().peekable();
        let repeated = match (self.samples.last(), samples.peek()) {
            (Some(last), Some(first)) => last == first,
            _ => false,
        };
        if repeated {
            samples.next();
        }
        self.samples.extend(samples);
        self.termination = next.termination;
    }
}
