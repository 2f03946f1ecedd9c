//! 1976 US Standard Atmosphere, piecewise exponential fit from sea level to 1000 km.

/// Base altitude of each layer (km).
const BASE_ALTITUDE_KM: [f64; 28] = [
    0.0, 25.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 140.0, 150.0,
    180.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1000.0,
];

/// Density at each base altitude (kg/m³).
const BASE_DENSITY_KG_M3: [f64; 28] = [
    1.225, 4.008e-2, 1.841e-2, 3.996e-3, 1.027e-3, 3.097e-4, 8.283e-5, 1.846e-5, 3.416e-6,
    5.606e-7, 9.708e-8, 2.222e-8, 8.152e-9, 3.831e-9, 2.076e-9, 5.194e-10, 2.541e-10, 6.073e-11,
    1.916e-11, 7.014e-12, 2.803e-12, 1.184e-12, 5.215e-13, 1.137e-13, 3.070e-14, 1.136e-14,
    5.759e-15, 3.561e-15,
];

/// Scale height of each layer (km).
const SCALE_HEIGHT_KM: [f64; 27] = [
    7.310, 6.427, 6.546, 7.360, 8.342, 7.583, 6.661, 5.927, 5.533, 5.703, 6.782, 9.973, 13.243,
    16.322, 21.652, 27.974, 34.934, 43.342, 49.755, 54.513, 58.019, 60.980, 65.654, 76.377,
    100.587, 147.203, 208.020,
];

/// Upper edge of the table (km).
pub const CEILING_KM: f64 = 1_000.0;

/// Density (kg/m³) at a geometric altitude. Zero below sea level, above the ceiling, or
/// for non-finite input.
pub fn density(altitude_km: f64) -> f64 {
    if !(0.0..=CEILING_KM).contains(&altitude_km) {
        return 0.0;
    }
    let layer = BASE_ALTITUDE_KM
        .partition_point(|&base| base <= altitude_km)
        .saturating_sub(1)
        .min(SCALE_HEIGHT_KM.len() - 1);
    BASE_DENSITY_KG_M3[layer]
        * (-(altitude_km - BASE_ALTITUDE_KM[layer]) / SCALE_HEIGHT_KM[layer]).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_and_layer_bases_match_table() {
        assert_eq!(density(0.0), 1.225);
        assert!((density(100.0) - 5.606e-7).abs() < 1e-18);
        assert!((density(400.0) - 2.803e-12).abs() < 1e-22);
    }

    #[test]
    fn ceiling_uses_last_layer_and_outside_is_zero() {
        let expected = 5.759e-15 * (-100.0_f64 / 208.020).exp();
        assert!((density(CEILING_KM) - expected).abs() < 1e-25);
        assert_eq!(density(1_000.5), 0.0);
        assert_eq!(density(-0.1), 0.0);
        assert_eq!(density(f64::NAN), 0.0);
    }

    #[test]
    fn density_decreases_with_altitude() {
        let mut previous = f64::INFINITY;
        for step in 0..1_000 {
            let rho = density(step as f64);
            assert!(rho < previous, "not decreasing at {step} km");
            previous = rho;
        }
    }
}
