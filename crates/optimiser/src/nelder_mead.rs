//! Bounded Nelder–Mead simplex driven through an ask/tell interface.
//!
//! The caller asks for a point, evaluates it however it likes and tells the value back.
//! Keeping evaluation outside the simplex logic lets the driver check for cancellation and
//! track the best candidate between any two evaluations.

use crate::Bounds;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    /// Evaluating vertex `next` of the starting simplex.
    Initial { next: usize },
    Reflect,
    Expand { reflected: Vertex },
    ContractOutside { reflected: Vertex },
    ContractInside,
    /// Evaluating vertex `next` after pulling every vertex towards the best one.
    Shrink { next: usize },
}

#[derive(Debug, Clone)]
pub struct NelderMead {
    bounds: Bounds,
    simplex: Vec<Vertex>,
    centroid: Vec<f64>,
    phase: Phase,
    pending: Option<Vec<f64>>,
    iterations: usize,
}

impl NelderMead {
    /// Build the starting simplex around `start`, offset by `steps` along each axis.
    ///
    /// An offset that would leave the box is taken in the opposite direction instead.
    pub fn new(start: &[f64], steps: &[f64], bounds: Bounds) -> Self {
        let start = bounds.clamp(start);
        let mut simplex = vec![Vertex {
            point: start.clone(),
            value: f64::INFINITY,
        }];
        for (axis, step) in steps.iter().enumerate() {
            let mut point = start.clone();
            point[axis] += step;
            if point[axis] > bounds.upper()[axis] {
                point[axis] = start[axis] - step;
            }
            simplex.push(Vertex {
                point: bounds.clamp(&point),
                value: f64::INFINITY,
            });
        }
        Self {
            centroid: start,
            bounds,
            simplex,
            phase: Phase::Initial { next: 0 },
            pending: None,
            iterations: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.simplex.len() - 1
    }

    /// Completed reflect/expand/contract/shrink cycles.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// True between iterations, when no evaluation is outstanding.
    pub fn at_iteration_boundary(&self) -> bool {
        self.phase == Phase::Reflect && self.pending.is_none()
    }

    pub fn best(&self) -> (&[f64], f64) {
        let best = &self.simplex[0];
        (&best.point, best.value)
    }

    /// Point to evaluate next. Repeated calls without a `tell` return the same point.
    pub fn ask(&mut self) -> Vec<f64> {
        if let Some(point) = &self.pending {
            return point.clone();
        }
        let worst = self.dimension();
        let point = match &self.phase {
            Phase::Initial { next } => self.simplex[*next].point.clone(),
            Phase::Reflect => self.towards(&self.centroid, &self.simplex[worst].point, -REFLECTION),
            Phase::Expand { reflected } => self.towards(&self.centroid, &reflected.point, EXPANSION),
            Phase::ContractOutside { reflected } => {
                self.towards(&self.centroid, &reflected.point, CONTRACTION)
            }
            Phase::ContractInside => {
                self.towards(&self.centroid, &self.simplex[worst].point, CONTRACTION)
            }
            Phase::Shrink { next } => {
                self.towards(&self.simplex[0].point, &self.simplex[*next].point, SHRINK)
            }
        };
        self.pending = Some(point.clone());
        point
    }

    /// Report the objective value for the last asked point. NaN counts as +∞.
    pub fn tell(&mut self, value: f64) {
        let Some(point) = self.pending.take() else {
            return;
        };
        let value = if value.is_nan() { f64::INFINITY } else { value };
        let candidate = Vertex { point, value };
        let worst = self.dimension();

        match std::mem::replace(&mut self.phase, Phase::Reflect) {
            Phase::Initial { next } => {
                self.simplex[next].value = value;
                if next < worst {
                    self.phase = Phase::Initial { next: next + 1 };
                } else {
                    self.finish(false);
                }
            }
            Phase::Reflect => {
                let best = self.simplex[0].value;
                let second_worst = self.simplex[worst.saturating_sub(1)].value;
                if value < best {
                    self.phase = Phase::Expand {
                        reflected: candidate,
                    };
                } else if value < second_worst {
                    self.simplex[worst] = candidate;
                    self.finish(true);
                } else if value < self.simplex[worst].value {
                    self.phase = Phase::ContractOutside {
                        reflected: candidate,
                    };
                } else {
                    self.phase = Phase::ContractInside;
                }
            }
            Phase::Expand { reflected } => {
                self.simplex[worst] = if value < reflected.value {
                    candidate
                } else {
                    reflected
                };
                self.finish(true);
            }
            Phase::ContractOutside { reflected } => {
                if value <= reflected.value {
                    self.simplex[worst] = candidate;
                    self.finish(true);
                } else {
                    self.phase = Phase::Shrink { next: 1 };
                }
            }
            Phase::ContractInside => {
                if value < self.simplex[worst].value {
                    self.simplex[worst] = candidate;
                    self.finish(true);
                } else {
                    self.phase = Phase::Shrink { next: 1 };
                }
            }
            Phase::Shrink { next } => {
                self.simplex[next] = candidate;
                if next < worst {
                    self.phase = Phase::Shrink { next: next + 1 };
                } else {
                    self.finish(true);
                }
            }
        }
    }

    /// Simplex has collapsed in both value and (bounds-normalised) extent.
    pub fn converged(&self, cost_tolerance: f64, parameter_tolerance: f64) -> bool {
        if !self.at_iteration_boundary() {
            return false;
        }
        let best = &self.simplex[0];
        let spread = self.simplex[self.dimension()].value - best.value;
        if !(spread.abs() <= cost_tolerance) {
            return false;
        }
        self.simplex[1..].iter().all(|vertex| {
            vertex
                .point
                .iter()
                .zip(&best.point)
                .zip(self.bounds.widths())
                .all(|((x, b), width)| (x - b).abs() <= parameter_tolerance * width)
        })
    }

    fn finish(&mut self, count: bool) {
        self.simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
        if count {
            self.iterations += 1;
        }
        let n = self.dimension();
        let mut centroid = vec![0.0; n];
        for vertex in &self.simplex[..n] {
            for (c, x) in centroid.iter_mut().zip(&vertex.point) {
                *c += x / n as f64;
            }
        }
        self.centroid = centroid;
        self.phase = Phase::Reflect;
    }

    /// `from + t·(to − from)`, clamped into the bounds.
    fn towards(&self, from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
        let raw: Vec<f64> = from
            .iter()
            .zip(to)
            .map(|(f, to)| f + t * (to - f))
            .collect();
        self.bounds.clamp(&raw)
    }
}
