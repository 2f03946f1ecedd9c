//! Universal-variable Lambert solver with explicit branch selection.
//!
//! The transfer-time equation is solved for the universal variable `z` by bracketed
//! bisection. Zero-revolution transfers live on `z < 4π²`; an `N`-revolution transfer lives
//! on `(4π²N², 4π²(N+1)²)`, where the time of flight has a single minimum and every
//! feasible time has one root on each side. The caller picks the branch; the solver never
//! chooses between solutions on its own.
//!
//! `lambert-bate` only covers the zero-revolution case and reports failures as an opaque
//! error, so the solver lives here; the crate stays on as a regression oracle in the tests.

use std::f64::consts::{PI, TAU};

use orbital_core::roots::{self, RootError};
use orbital_core::vector::{self, Vector3};
use orbital_orbits::kepler::{stumpff_c, stumpff_s};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

const COLLINEAR_EPS: f64 = 1e-10;
const HYPERBOLIC_LIMIT_Z: f64 = -4.0e5;
const GOLDEN_ITERATIONS: usize = 200;

/// Sense of motion of the transfer about the orbit normal (+z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Prograde,
    Retrograde,
}

/// Which of the two multi-revolution solutions to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Smaller semi-major axis.
    ShortPeriod,
    /// Larger semi-major axis.
    LongPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LambertBranch {
    pub direction: Direction,
    pub revolutions: u32,
    /// Ignored when `revolutions` is zero.
    pub period: Period,
}

impl LambertBranch {
    pub fn zero_rev(direction: Direction) -> Self {
        Self {
            direction,
            revolutions: 0,
            period: Period::ShortPeriod,
        }
    }

    pub fn multi_rev(direction: Direction, revolutions: u32, period: Period) -> Self {
        Self {
            direction,
            revolutions,
            period,
        }
    }
}

impl Default for LambertBranch {
    fn default() -> Self {
        Self::zero_rev(Direction::Prograde)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertProblem {
    pub r1_km: Vector3,
    pub r2_km: Vector3,
    pub time_of_flight_s: f64,
    pub mu_km3_s2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Relative tolerance on the time of flight.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-11,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LambertSolution {
    pub branch: LambertBranch,
    pub departure_velocity_km_s: Vector3,
    pub arrival_velocity_km_s: Vector3,
    pub semi_major_axis_km: f64,
    /// Universal variable at the solution.
    pub z: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LambertError {
    #[error("no transfer exists on branch {branch:?}: {reason}")]
    Infeasible {
        reason: String,
        branch: LambertBranch,
    },
    #[error(
        "lambert iteration on branch {branch:?} did not converge after {iterations} iterations (residual {residual_s} s)"
    )]
    NoConvergence {
        iterations: usize,
        branch: LambertBranch,
        residual_s: f64,
    },
}

/// Solve for the requested branch.
pub fn solve(
    problem: &LambertProblem,
    branch: LambertBranch,
    options: &SolverOptions,
) -> Result<LambertSolution, LambertError> {
    let geometry = Geometry::new(problem, branch)?;
    if branch.revolutions == 0 {
        let z = geometry.zero_rev_root(problem.time_of_flight_s, options)?;
        geometry.solution(z)
    } else {
        let (first, second) = geometry.multi_rev_roots(problem.time_of_flight_s, options)?;
        let a = geometry.solution(first)?;
        let b = geometry.solution(second)?;
        let (short, long) = if a.semi_major_axis_km <= b.semi_major_axis_km {
            (a, b)
        } else {
            (b, a)
        };
        Ok(match branch.period {
            Period::ShortPeriod => short,
            Period::LongPeriod => long,
        })
    }
}

/// Every feasible solution up to `max_revolutions`, for both directions.
///
/// Infeasible branches are skipped; a convergence failure on any branch is returned.
pub fn solve_all(
    problem: &LambertProblem,
    max_revolutions: u32,
    options: &SolverOptions,
) -> Result<Vec<LambertSolution>, LambertError> {
    validate(problem, LambertBranch::default())?;
    let mut branches = Vec::new();
    for direction in [Direction::Prograde, Direction::Retrograde] {
        branches.push(LambertBranch::zero_rev(direction));
        for revolutions in 1..=max_revolutions {
            for period in [Period::ShortPeriod, Period::LongPeriod] {
                branches.push(LambertBranch::multi_rev(direction, revolutions, period));
            }
        }
    }

    let mut solutions = Vec::new();
    for branch in branches {
        match solve(problem, branch, options) {
            Ok(solution) => solutions.push(solution),
            Err(LambertError::Infeasible { reason, .. }) => {
                trace!(?branch, %reason, "lambert branch skipped");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(solutions)
}

fn validate(problem: &LambertProblem, branch: LambertBranch) -> Result<(), LambertError> {
    let infeasible = |reason: &str| {
        Err(LambertError::Infeasible {
            reason: reason.to_string(),
            branch,
        })
    };
    if !(problem.time_of_flight_s > 0.0) || !problem.time_of_flight_s.is_finite() {
        return infeasible("time of flight must be positive");
    }
    if !(problem.mu_km3_s2 > 0.0) {
        return infeasible("gravitational parameter must be positive");
    }
    if !(vector::norm(&problem.r1_km) > 0.0) || !(vector::norm(&problem.r2_km) > 0.0) {
        return infeasible("position vectors must be non-zero");
    }
    if !vector::is_finite(&problem.r1_km) || !vector::is_finite(&problem.r2_km) {
        return infeasible("position vectors must be finite");
    }
    Ok(())
}

/// Branch-specific constants of the transfer-time equation.
struct Geometry {
    branch: LambertBranch,
    r1: Vector3,
    r2: Vector3,
    r1_mag: f64,
    r2_mag: f64,
    a: f64,
    mu: f64,
}

/// Time of flight at `z`, or the reason it is undefined there.
enum Flight {
    Time(f64),
    /// y(z) <= 0: the geometry needs a larger z.
    TooShort,
    /// C(z) vanishes: the time of flight diverges.
    Unbounded,
}

impl Geometry {
    fn new(problem: &LambertProblem, branch: LambertBranch) -> Result<Self, LambertError> {
        validate(problem, branch)?;
        let r1 = problem.r1_km;
        let r2 = problem.r2_km;
        let r1_mag = vector::norm(&r1);
        let r2_mag = vector::norm(&r2);
        let cos_dtheta = (vector::dot(&r1, &r2) / (r1_mag * r2_mag)).clamp(-1.0, 1.0);
        let normal_z = vector::cross(&r1, &r2)[2];
        let short_way = match branch.direction {
            Direction::Prograde => normal_z >= 0.0,
            Direction::Retrograde => normal_z < 0.0,
        };
        let base = cos_dtheta.acos();
        let dtheta = if short_way { base } else { TAU - base };

        let sin_dtheta = dtheta.sin();
        if sin_dtheta.abs() < COLLINEAR_EPS || 1.0 - cos_dtheta < COLLINEAR_EPS {
            return Err(LambertError::Infeasible {
                reason: format!(
                    "position vectors are collinear (transfer angle {:.6} deg); the transfer plane is undefined",
                    dtheta.to_degrees()
                ),
                branch,
            });
        }
        let a = sin_dtheta * (r1_mag * r2_mag / (1.0 - cos_dtheta)).sqrt();

        Ok(Self {
            branch,
            r1,
            r2,
            r1_mag,
            r2_mag,
            a,
            mu: problem.mu_km3_s2,
        })
    }

    fn y(&self, z: f64) -> f64 {
        self.r1_mag + self.r2_mag + self.a * (z * stumpff_s(z) - 1.0) / stumpff_c(z).sqrt()
    }

    fn flight(&self, z: f64) -> Flight {
        let c = stumpff_c(z);
        if !(c > 0.0) {
            return Flight::Unbounded;
        }
        let y = self.y(z);
        if !(y > 0.0) {
            return Flight::TooShort;
        }
        let x = (y / c).sqrt();
        let t = (x.powi(3) * stumpff_s(z) + self.a * y.sqrt()) / self.mu.sqrt();
        if t.is_finite() {
            Flight::Time(t)
        } else {
            Flight::Unbounded
        }
    }

    /// Normalised residual used for bisection.
    fn residual(&self, z: f64, target: f64) -> f64 {
        match self.flight(z) {
            Flight::Time(t) => (t - target) / target,
            Flight::TooShort => -1.0,
            Flight::Unbounded => 1.0,
        }
    }

    fn infeasible(&self, reason: impl Into<String>) -> LambertError {
        LambertError::Infeasible {
            reason: reason.into(),
            branch: self.branch,
        }
    }

    fn bisect(&self, lo: f64, hi: f64, target: f64, options: &SolverOptions) -> Result<f64, LambertError> {
        roots::bisect(
            |z| self.residual(z, target),
            lo,
            hi,
            options.tolerance,
            options.max_iterations,
        )
        .map_err(|err| match err {
            RootError::NotBracketed { lo, hi } => self.infeasible(format!(
                "time of flight {target} s is not bracketed on z in [{lo}, {hi}]"
            )),
            RootError::NoConvergence {
                iterations,
                residual,
            } => LambertError::NoConvergence {
                iterations,
                branch: self.branch,
                residual_s: residual * target,
            },
        })
    }

    fn zero_rev_root(&self, target: f64, options: &SolverOptions) -> Result<f64, LambertError> {
        let hi = 4.0 * PI * PI * (1.0 - 1e-9);
        let mut lo = -4.0 * PI * PI;
        while self.residual(lo, target) > 0.0 {
            lo *= 2.0;
            if lo < HYPERBOLIC_LIMIT_Z {
                return Err(self.infeasible(format!(
                    "time of flight {target} s is shorter than any hyperbolic transfer in range"
                )));
            }
        }
        self.bisect(lo, hi, target, options)
    }

    fn multi_rev_roots(&self, target: f64, options: &SolverOptions) -> Result<(f64, f64), LambertError> {
        let n = f64::from(self.branch.revolutions);
        let lo = 4.0 * PI * PI * n * n;
        let hi = 4.0 * PI * PI * (n + 1.0) * (n + 1.0);
        let width = hi - lo;

        let time = |z: f64| match self.flight(z) {
            Flight::Time(t) => t,
            _ => f64::INFINITY,
        };
        let z_min = golden_section_min(time, lo + 1e-4 * width, hi - 1e-4 * width);
        let t_min = time(z_min);
        if target < t_min {
            return Err(self.infeasible(format!(
                "time of flight {target} s is below the {}-revolution minimum of {t_min} s",
                self.branch.revolutions
            )));
        }
        let edge = 1e-7 * width;
        let left = self.bisect(lo + edge, z_min, target, options)?;
        let right = self.bisect(z_min, hi - edge, target, options)?;
        Ok((left, right))
    }

    fn solution(&self, z: f64) -> Result<LambertSolution, LambertError> {
        let y = self.y(z);
        if !(y > 0.0) {
            return Err(self.infeasible("converged to a point with y(z) <= 0"));
        }
        let f = 1.0 - y / self.r1_mag;
        let g = self.a * (y / self.mu).sqrt();
        let g_dot = 1.0 - y / self.r2_mag;
        let v1 = vector::scale(&vector::sub(&self.r2, &vector::scale(&self.r1, f)), 1.0 / g);
        let v2 = vector::scale(
            &vector::sub(&vector::scale(&self.r2, g_dot), &self.r1),
            1.0 / g,
        );
        let v1_mag = vector::norm(&v1);
        let semi_major_axis = 1.0 / (2.0 / self.r1_mag - v1_mag * v1_mag / self.mu);
        Ok(LambertSolution {
            branch: self.branch,
            departure_velocity_km_s: v1,
            arrival_velocity_km_s: v2,
            semi_major_axis_km: semi_major_axis,
            z,
        })
    }
}

fn golden_section_min<F: Fn(f64) -> f64>(f: F, mut lo: f64, mut hi: f64) -> f64 {
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let mut x1 = hi - ratio * (hi - lo);
    let mut x2 = lo + ratio * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    for _ in 0..GOLDEN_ITERATIONS {
        if (hi - lo) <= 1e-13 * hi.abs().max(1.0) {
            break;
        }
        if f1 < f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - ratio * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + ratio * (hi - lo);
            f2 = f(x2);
        }
    }
    0.5 * (lo + hi)
}
