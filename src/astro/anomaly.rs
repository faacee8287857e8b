//! Anomaly conversions for conic orbits
//!
//! All angles are radians. Elliptic results are wrapped into [0, 2π);
//! hyperbolic anomalies are signed (negative before periapsis).

use std::f64::consts::{PI, TAU};

const KEPLER_TOLERANCE: f64 = 1e-14;
const KEPLER_MAX_ITERATIONS: usize = 64;

/// Wrap an angle into [0, 2π)
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle into (-π, π]
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = wrap_two_pi(angle);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Solve Kepler's equation M = E − e·sin E for the eccentric anomaly
///
/// Newton iteration from a Danby-style starting guess, falling back to
/// bisection on [0, 2π) if Newton wanders. Only valid for e < 1.
pub fn mean_to_eccentric(mean_anomaly: f64, e: f64) -> f64 {
    let m = wrap_two_pi(mean_anomaly);
    let kepler = |x: f64| x - e * x.sin() - m;

    let mut x = if e < 0.8 { m } else { PI };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = kepler(x);
        let df = 1.0 - e * x.cos();
        let dx = f / df;
        x -= dx;
        if dx.abs() < KEPLER_TOLERANCE {
            return wrap_two_pi(x);
        }
    }

    // kepler is monotone on [0, 2π] with kepler(0) <= 0 <= kepler(2π)
    let (mut lo, mut hi) = (0.0, TAU);
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if kepler(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    wrap_two_pi(0.5 * (lo + hi))
}

pub fn eccentric_to_mean(eccentric_anomaly: f64, e: f64) -> f64 {
    wrap_two_pi(eccentric_anomaly - e * eccentric_anomaly.sin())
}

pub fn eccentric_to_true(eccentric_anomaly: f64, e: f64) -> f64 {
    let beta = (1.0 - e * e).sqrt();
    let (sin_e, cos_e) = eccentric_anomaly.sin_cos();
    wrap_two_pi((beta * sin_e).atan2(cos_e - e))
}

pub fn true_to_eccentric(true_anomaly: f64, e: f64) -> f64 {
    let beta = (1.0 - e * e).sqrt();
    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    wrap_two_pi((beta * sin_nu).atan2(e + cos_nu))
}

pub fn mean_to_true(mean_anomaly: f64, e: f64) -> f64 {
    eccentric_to_true(mean_to_eccentric(mean_anomaly, e), e)
}

pub fn true_to_mean(true_anomaly: f64, e: f64) -> f64 {
    eccentric_to_mean(true_to_eccentric(true_anomaly, e), e)
}

/// Hyperbolic anomaly from true anomaly (e > 1)
pub fn true_to_hyperbolic(true_anomaly: f64, e: f64) -> f64 {
    let nu = wrap_pi(true_anomaly);
    let tan_half = (nu / 2.0).tan();
    2.0 * (tan_half * ((e - 1.0) / (e + 1.0)).sqrt()).atanh()
}

/// Hyperbolic mean anomaly M = e·sinh H − H
pub fn hyperbolic_to_mean(hyperbolic_anomaly: f64, e: f64) -> f64 {
    e * hyperbolic_anomaly.sinh() - hyperbolic_anomaly
}

/// Barker's parabolic anomaly D = tan(ν/2)
pub fn true_to_parabolic(true_anomaly: f64) -> f64 {
    (wrap_pi(true_anomaly) / 2.0).tan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_two_pi() {
        assert_relative_eq!(wrap_two_pi(-0.5), TAU - 0.5, epsilon = 1e-15);
        assert_relative_eq!(wrap_two_pi(TAU + 0.25), 0.25, epsilon = 1e-15);
        assert!(wrap_two_pi(-1e-18) < TAU);
        assert_relative_eq!(wrap_pi(1.5 * PI), -0.5 * PI, epsilon = 1e-15);
    }

    #[test]
    fn test_kepler_round_trip() {
        for &e in &[0.0, 0.1, 0.5, 0.9, 0.99] {
            for i in 0..32 {
                let m = i as f64 * TAU / 32.0;
                let big_e = mean_to_eccentric(m, e);
                let back = eccentric_to_mean(big_e, e);
                let diff = wrap_pi(back - m);
                assert!(diff.abs() < 1e-12, "e={} M={} diff={}", e, m, diff);
            }
        }
    }

    #[test]
    fn test_true_anomaly_round_trip() {
        for &e in &[0.0, 0.3, 0.8] {
            for i in 0..24 {
                let nu = i as f64 * TAU / 24.0;
                let m = true_to_mean(nu, e);
                let back = mean_to_true(m, e);
                assert!(wrap_pi(back - nu).abs() < 1e-10, "e={} nu={}", e, nu);
            }
        }
    }

    #[test]
    fn test_apsides_map_to_themselves() {
        assert_relative_eq!(true_to_mean(0.0, 0.4), 0.0, epsilon = 1e-15);
        assert_relative_eq!(true_to_mean(PI, 0.4), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_hyperbolic_sign() {
        assert!(hyperbolic_to_mean(true_to_hyperbolic(-0.5, 1.5), 1.5) < 0.0);
        assert!(hyperbolic_to_mean(true_to_hyperbolic(0.5, 1.5), 1.5) > 0.0);
        assert_relative_eq!(true_to_parabolic(0.0), 0.0);
    }
}
