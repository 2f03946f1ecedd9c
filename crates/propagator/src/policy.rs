//! Step-size policies and propagation spans.

use serde::{Deserialize, Serialize};

use crate::IntegrationError;

/// How the integrator chooses its steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepPolicy {
    /// Classical fourth-order Runge–Kutta with a constant step.
    Fixed { step_s: f64 },
    /// Dormand–Prince 5(4) with embedded error control.
    Adaptive {
        initial_step_s: f64,
        min_step_s: f64,
        max_step_s: f64,
        absolute_tolerance: f64,
        relative_tolerance: f64,
        max_steps: usize,
    },
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy::Adaptive {
            initial_step_s: 60.0,
            min_step_s: 1e-6,
            max_step_s: 3_600.0,
            absolute_tolerance: 1e-10,
            relative_tolerance: 1e-10,
            max_steps: 1_000_000,
        }
    }
}

impl StepPolicy {
    /// Adaptive policy with the default step limits and the given tolerances.
    pub fn adaptive(absolute_tolerance: f64, relative_tolerance: f64) -> Self {
        match StepPolicy::default() {
            StepPolicy::Adaptive {
                initial_step_s,
                min_step_s,
                max_step_s,
                max_steps,
                ..
            } => StepPolicy::Adaptive {
                initial_step_s,
                min_step_s,
                max_step_s,
                absolute_tolerance,
                relative_tolerance,
                max_steps,
            },
            fixed => fixed,
        }
    }

    pub fn validate(&self) -> Result<(), IntegrationError> {
        let invalid = |reason: String| Err(IntegrationError::InvalidStepPolicy(reason));
        match *self {
            StepPolicy::Fixed { step_s } => {
                if !(step_s > 0.0 && step_s.is_finite()) {
                    return invalid(format!("fixed step {step_s} s must be positive"));
                }
            }
            StepPolicy::Adaptive {
                initial_step_s,
                min_step_s,
                max_step_s,
                absolute_tolerance,
                relative_tolerance,
                max_steps,
            } => {
                if !(min_step_s > 0.0 && min_step_s.is_finite()) {
                    return invalid(format!("minimum step {min_step_s} s must be positive"));
                }
                if !(max_step_s >= min_step_s && max_step_s.is_finite()) {
                    return invalid(format!(
                        "maximum step {max_step_s} s is below the minimum {min_step_s} s"
                    ));
                }
                if !(initial_step_s >= min_step_s && initial_step_s <= max_step_s) {
                    return invalid(format!(
                        "initial step {initial_step_s} s lies outside [{min_step_s}, {max_step_s}]"
                    ));
                }
                if !(absolute_tolerance >= 0.0 && relative_tolerance >= 0.0)
                    || absolute_tolerance + relative_tolerance <= 0.0
                    || !(absolute_tolerance + relative_tolerance).is_finite()
                {
                    return invalid("tolerances must be non-negative and not both zero".into());
                }
                if max_steps == 0 {
                    return invalid("step limit must be at least one".into());
                }
            }
        }
        Ok(())
    }
}

/// How far to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Span {
    /// Elapsed seconds from the initial epoch; negative values propagate backward.
    Duration(f64),
    /// Absolute target epoch.
    ToEpoch(f64),
}

impl Span {
    pub fn target_epoch(&self, start_epoch_s: f64) -> f64 {
        match *self {
            Span::Duration(duration_s) => start_epoch_s + duration_s,
            Span::ToEpoch(epoch_s) => epoch_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(StepPolicy::default().validate().is_ok());
        assert!(StepPolicy::adaptive(1e-9, 0.0).validate().is_ok());
    }

    #[test]
    fn inconsistent_policies_are_rejected() {
        assert!(StepPolicy::Fixed { step_s: 0.0 }.validate().is_err());
        assert!(StepPolicy::adaptive(0.0, 0.0).validate().is_err());
        let policy = StepPolicy::Adaptive {
            initial_step_s: 10.0,
            min_step_s: 1.0,
            max_step_s: 0.5,
            absolute_tolerance: 1e-9,
            relative_tolerance: 1e-9,
            max_steps: 10,
        };
        assert!(matches!(
            policy.validate(),
            Err(IntegrationError::InvalidStepPolicy(_))
        ));
    }

    #[test]
    fn span_resolves_target_epoch() {
        assert_eq!(Span::Duration(-30.0).target_epoch(100.0), 70.0);
        assert_eq!(Span::ToEpoch(5.0).target_epoch(100.0), 5.0);
    }
}
