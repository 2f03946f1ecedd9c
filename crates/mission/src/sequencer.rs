//! Segment-by-segment execution of a [`MissionPlan`].

use orbital_core::State;
use orbital_core::vector;
use orbital_propagator::{Propagator, Termination, Trajectory};
use serde::Serialize;
use tracing::{debug, warn};

use crate::manoeuvre::{BurnArc, Manoeuvre};
use crate::plan::{MissionPlan, Segment};
use crate::{SegmentError, SequenceError};

/// Where the sequencer is in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequencerStatus {
    Idle,
    Propagating { segment: usize },
    Manoeuvring { segment: usize },
    Completed,
    Failed { segment: usize },
}

/// Summary of one executed segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub index: usize,
    pub kind: &'static str,
    pub start_epoch_s: f64,
    pub end_epoch_s: f64,
    pub delta_v_km_s: f64,
    pub propellant_used_kg: f64,
    /// Set by transfer segments: how far the coast ended from the targeted position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_miss_km: Option<f64>,
    pub final_state: State,
}

/// Result of a completed mission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionOutcome {
    pub trajectory: Trajectory,
    pub final_state: State,
    pub segment_reports: Vec<SegmentReport>,
    pub total_delta_v_km_s: f64,
    /// `AltitudeFloor` when the vehicle hit the floor and the remaining segments were skipped.
    pub termination: Termination,
}

#[derive(Debug)]
pub struct Sequencer<'a> {
    plan: &'a MissionPlan,
    status: SequencerStatus,
    next_segment: usize,
    current: State,
    trajectory: Trajectory,
    reports: Vec<SegmentReport>,
    failure: Option<SequenceError>,
}

impl<'a> Sequencer<'a> {
    /// Validate the plan and park the sequencer in `Idle`.
    pub fn new(plan: &'a MissionPlan) -> Result<Self, SequenceError> {
        plan.validate()?;
        Ok(Self {
            plan,
            status: SequencerStatus::Idle,
            next_segment: 0,
            current: plan.initial,
            trajectory: Trajectory {
                samples: vec![plan.initial],
                termination: Termination::ReachedTarget,
            },
            reports: Vec::new(),
            failure: None,
        })
    }

    pub fn status(&self) -> SequencerStatus {
        self.status
    }

    pub fn current_state(&self) -> &State {
        &self.current
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn reports(&self) -> &[SegmentReport] {
        &self.reports
    }

    /// Execute the next segment.
    ///
    /// Once `Completed` or `Failed` the sequencer stays put; further calls return the same
    /// status or the same error.
    pub fn step(&mut self) -> Result<SequencerStatus, SequenceError> {
        match self.status {
            SequencerStatus::Completed => return Ok(self.status),
            SequencerStatus::Failed { .. } => {
                if let Some(err) = &self.failure {
                    return Err(err.clone());
                }
            }
            _ => {}
        }
        let plan: &'a MissionPlan = self.plan;
        let index = self.next_segment;
        let Some(segment) = plan.segments.get(index) else {
            self.status = SequencerStatus::Completed;
            return Ok(self.status);
        };

        self.status = match segment {
            Segment::Coast(_) => SequencerStatus::Propagating { segment: index },
            Segment::Manoeuvre(_) => SequencerStatus::Manoeuvring { segment: index },
        };
        let start = self.current;
        let arc = match self.execute(segment) {
            Ok(arc) => arc,
            Err(source) => {
                warn!(segment = index, kind = segment.kind(), error = %source, "segment failed");
                let err = SequenceError {
                    segment_index: index,
                    source,
                };
                self.status = SequencerStatus::Failed { segment: index };
                self.failure = Some(err.clone());
                return Err(err);
            }
        };

        let termination = arc.trajectory.termination;
        self.trajectory.extend_with(arc.trajectory);
        if let Some(last) = self.trajectory.final_state() {
            self.current = *last;
        }
        let report = SegmentReport {
            index,
            kind: segment.kind(),
            start_epoch_s: start.epoch_s,
            end_epoch_s: self.current.epoch_s,
            delta_v_km_s: arc.delta_v_km_s,
            propellant_used_kg: match (start.mass_kg, self.current.mass_kg) {
                (Some(before), Some(after)) => (before - after).max(0.0),
                _ => 0.0,
            },
            arrival_miss_km: arc.arrival_miss_km,
            final_state: self.current,
        };
        debug!(
            segment = index,
            kind = report.kind,
            end_epoch = report.end_epoch_s,
            delta_v = report.delta_v_km_s,
            "segment complete"
        );
        self.reports.push(report);
        self.next_segment += 1;

        if let Termination::AltitudeFloor { epoch_s, altitude_km } = termination {
            warn!(
                segment = index,
                epoch_s,
                altitude_km,
                "altitude floor reached; remaining segments skipped"
            );
            self.status = SequencerStatus::Completed;
        } else if self.next_segment == plan.segments.len() {
            self.status = SequencerStatus::Completed;
        }
        Ok(self.status)
    }

    /// Drive every remaining segment and collect the outcome.
    pub fn run(mut self) -> Result<MissionOutcome, SequenceError> {
        while self.step()? != SequencerStatus::Completed {}
        let total_delta_v_km_s = self.reports.iter().map(|r| r.delta_v_km_s).sum();
        Ok(MissionOutcome {
            final_state: self.current,
            termination: self.trajectory.termination,
            trajectory: self.trajectory,
            segment_reports: self.reports,
            total_delta_v_km_s,
        })
    }

    fn execute(&self, segment: &Segment) -> Result<BurnArc, SegmentError> {
        let plan = self.plan;
        let state = &self.current;
        match segment {
            Segment::Coast(span) => {
                let target_epoch = span.target_epoch(state.epoch_s);
                if !(target_epoch > state.epoch_s) {
                    return Err(SegmentError::Configuration(format!(
                        "coast must end after the current epoch {} s, got {target_epoch} s",
                        state.epoch_s
                    )));
                }
                let trajectory = self.propagator().propagate(state, *span)?;
                Ok(BurnArc {
                    trajectory,
                    delta_v_km_s: 0.0,
                    arrival_miss_km: None,
                })
            }
            Segment::Manoeuvre(Manoeuvre::Impulsive(burn)) => {
                let after = burn.apply(state)?;
                let delta_v_km_s = vector::distance(&after.velocity_km_s, &state.velocity_km_s);
                Ok(BurnArc {
                    trajectory: Trajectory {
                        samples: vec![*state, after],
                        termination: Termination::ReachedTarget,
                    },
                    delta_v_km_s,
                    arrival_miss_km: None,
                })
            }
            Segment::Manoeuvre(Manoeuvre::FiniteBurn(burn)) => {
                burn.execute(state, &plan.stack, &plan.policy, plan.altitude_floor)
            }
            Segment::Manoeuvre(Manoeuvre::Transfer(transfer)) => {
                transfer.execute(state, &plan.stack, &plan.policy, plan.altitude_floor)
            }
        }
    }

    fn propagator(&self) -> Propagator<'a> {
        let plan: &'a MissionPlan = self.plan;
        let propagator = Propagator::new(&plan.stack, plan.policy);
        match plan.altitude_floor {
            Some(floor) => propagator.with_altitude_floor(floor),
            None => propagator,
        }
    }
}

/// Validate and fly `plan` to completion.
pub fn run(plan: &MissionPlan) -> Result<MissionOutcome, SequenceError> {
    Sequencer::new(plan)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manoeuvre::{BurnFrame, ImpulsiveBurn};
    use orbital_core::constants::{EARTH_RADIUS_KM, MU_EARTH};
    use orbital_forces::ForceStack;
    use orbital_propagator::{AltitudeFloor, StepPolicy};

    fn leo_plan() -> MissionPlan {
        let r = 7_000.0;
        MissionPlan::new(
            State::new(0.0, [r, 0.0, 0.0], [0.0, (MU_EARTH / r).sqrt(), 0.0]),
            ForceStack::two_body(MU_EARTH),
            StepPolicy::default(),
        )
    }

    #[test]
    fn status_walks_through_segments() {
        let plan = leo_plan()
            .coast(300.0)
            .manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn::in_frame(
                BurnFrame::Vnb,
                [0.05, 0.0, 0.0],
            )))
            .coast(300.0);
        let mut sequencer = Sequencer::new(&plan).unwrap();
        assert_eq!(sequencer.status(), SequencerStatus::Idle);
        assert_eq!(
            sequencer.step().unwrap(),
            SequencerStatus::Propagating { segment: 0 }
        );
        assert_eq!(
            sequencer.step().unwrap(),
            SequencerStatus::Manoeuvring { segment: 1 }
        );
        assert_eq!(sequencer.step().unwrap(), SequencerStatus::Completed);
        assert_eq!(sequencer.step().unwrap(), SequencerStatus::Completed);
        assert_eq!(sequencer.reports().len(), 3);
    }

    #[test]
    fn trajectory_epochs_never_go_backwards() {
        let plan = leo_plan()
            .coast(600.0)
            .manoeuvre(Manoeuvre::Impulsive(ImpulsiveBurn::inertial([0.0, 0.1, 0.0])))
            .coast(600.0);
        let outcome = run(&plan).unwrap();
        let epochs: Vec<f64> = outcome.trajectory.samples.iter().map(|s| s.epoch_s).collect();
        assert!(epochs.windows(2).all(|w| w[1] >= w[0]));
        let jumps = epochs.windows(2).filter(|w| w[1] == w[0]).count();
        assert_eq!(jumps, 1);
        assert!((outcome.final_state.epoch_s - 1_200.0).abs() < 1e-9);
        assert!((outcome.total_delta_v_km_s - 0.1).abs() < 1e-12);
    }

    #[test]
    fn floor_ends_the_mission_early() {
        let r = EARTH_RADIUS_KM + 200.0;
        let mut plan = MissionPlan::new(
            State::new(0.0, [r, 0.0, 0.0], [-1.0, 1.0, 0.0]),
            ForceStack::two_body(MU_EARTH),
            StepPolicy::default(),
        )
        .coast(3_600.0)
        .coast(3_600.0);
        plan.altitude_floor = Some(AltitudeFloor::surface(EARTH_RADIUS_KM));
        let outcome = run(&plan).unwrap();
        assert!(matches!(outcome.termination, Termination::AltitudeFloor { .. }));
        assert_eq!(outcome.segment_reports.len(), 1);
    }

    #[test]
    fn failure_is_sticky_and_names_the_segment() {
        let mut plan = leo_plan()
            .coast(60.0)
            .manoeuvre(Manoeuvre::Impulsive(
                ImpulsiveBurn::inertial([0.0, 5.0, 0.0]).with_propellant(300.0, Some(10.0)),
            ));
        plan.initial = plan.initial.with_mass(20.0);
        let mut sequencer = Sequencer::new(&plan).unwrap();
        sequencer.step().unwrap();
        let err = sequencer.step().unwrap_err();
        assert_eq!(err.segment_index, 1);
        assert_eq!(sequencer.status(), SequencerStatus::Failed { segment: 1 });
        assert_eq!(sequencer.step().unwrap_err(), err);
    }
}
