//! Single-step Runge–Kutta kernels over the packed `[r, v, m]` vector.

use orbital_core::State;
use orbital_forces::ForceStack;

pub(crate) type Vector7 = [f64; 7];

/// Equations of motion bound to a force stack.
pub(crate) struct Dynamics<'a> {
    pub stack: &'a ForceStack,
    pub has_mass: bool,
}

impl Dynamics<'_> {
    pub fn pack(state: &State) -> Vector7 {
        let r = state.position_km;
        let v = state.velocity_km_s;
        [r[0], r[1], r[2], v[0], v[1], v[2], state.mass_kg.unwrap_or(0.0)]
    }

    pub fn unpack(&self, epoch_s: f64, y: &Vector7) -> State {
        State {
            epoch_s,
            position_km: [y[0], y[1], y[2]],
            velocity_km_s: [y[3], y[4], y[5]],
            mass_kg: self.has_mass.then_some(y[6]),
        }
    }

    pub fn derivative(&self, epoch_s: f64, y: &Vector7) -> Vector7 {
        let state = self.unpack(epoch_s, y);
        let a = self.stack.acceleration(&state);
        let dm = if self.has_mass {
            self.stack.mass_flow_rate(&state)
        } else {
            0.0
        };
        [y[3], y[4], y[5], a[0], a[1], a[2], dm]
    }
}

fn axpy(y: &Vector7, h: f64, terms: &[(f64, &Vector7)]) -> Vector7 {
    let mut out = *y;
    for (coefficient, k) in terms {
        if *coefficient == 0.0 {
            continue;
        }
        for i in 0..7 {
            out[i] += h * coefficient * k[i];
        }
    }
    out
}

/// Classical RK4 step.
pub(crate) fn rk4_step(dynamics: &Dynamics<'_>, t: f64, y: &Vector7, h: f64) -> Vector7 {
    let k1 = dynamics.derivative(t, y);
    let k2 = dynamics.derivative(t + 0.5 * h, &axpy(y, h, &[(0.5, &k1)]));
    let k3 = dynamics.derivative(t + 0.5 * h, &axpy(y, h, &[(0.5, &k2)]));
    let k4 = dynamics.derivative(t + h, &axpy(y, h, &[(1.0, &k3)]));
    axpy(
        y,
        h,
        &[(1.0 / 6.0, &k1), (1.0 / 3.0, &k2), (1.0 / 3.0, &k3), (1.0 / 6.0, &k4)],
    )
}

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19_372.0 / 6_561.0;
const A52: f64 = -25_360.0 / 2_187.0;
const A53: f64 = 64_448.0 / 6_561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9_017.0 / 3_168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46_732.0 / 5_247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5_103.0 / 18_656.0;

// Fifth-order weights, also the last row of the tableau.
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1_113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2_187.0 / 6_784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the fifth- and fourth-order weights.
const E1: f64 = 71.0 / 57_600.0;
const E3: f64 = -71.0 / 16_695.0;
const E4: f64 = 71.0 / 1_920.0;
const E5: f64 = -17_253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Result of one Dormand–Prince attempt.
pub(crate) struct DormandPrinceStep {
    pub y: Vector7,
    /// Derivative at the new point, reused as the first stage of the next step.
    pub k_end: Vector7,
    pub error: Vector7,
}

/// One Dormand–Prince 5(4) step from `(t, y)` given the derivative `k1` there.
pub(crate) fn dormand_prince_step(
    dynamics: &Dynamics<'_>,
    t: f64,
    y: &Vector7,
    k1: &Vector7,
    h: f64,
) -> DormandPrinceStep {
    let k2 = dynamics.derivative(t + C2 * h, &axpy(y, h, &[(A21, k1)]));
    let k3 = dynamics.derivative(t + C3 * h, &axpy(y, h, &[(A31, k1), (A32, &k2)]));
    let k4 = dynamics.derivative(
        t + C4 * h,
        &axpy(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
    );
    let k5 = dynamics.derivative(
        t + C5 * h,
        &axpy(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
    );
    let k6 = dynamics.derivative(
        t + h,
        &axpy(
            y,
            h,
            &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
        ),
    );
    let y_new = axpy(
        y,
        h,
        &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
    );
    let k7 = dynamics.derivative(t + h, &y_new);

    let zero = [0.0; 7];
    let error = axpy(
        &zero,
        h,
        &[(E1, k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
    );

    DormandPrinceStep {
        y: y_new,
        k_end: k7,
        error,
    }
}

/// Scaled error norm: the largest component error over its tolerance.
pub(crate) fn error_ratio(
    error: &Vector7,
    y_old: &Vector7,
    y_new: &Vector7,
    absolute_tolerance: f64,
    relative_tolerance: f64,
) -> f64 {
    let mut ratio: f64 = 0.0;
    for i in 0..7 {
        if error[i] == 0.0 {
            continue;
        }
        let scale = absolute_tolerance + relative_tolerance * y_old[i].abs().max(y_new[i].abs());
        let component = error[i].abs() / scale;
        if component.is_nan() {
            return f64::INFINITY;
        }
        ratio = ratio.max(component);
    }
    ratio
}
