//! Next periapsis and apoapsis times
//!
//! Times come straight from the mean anomaly at the state epoch:
//!
//! t = t_state + (k·2π + M* − M₀) / n
//!
//! with M* = 0 for periapsis and π for apoapsis, and k the smallest integer
//! that puts t at or after the query time. Anchoring at the state epoch
//! keeps repeated queries from drifting as the query time advances.

use std::f64::consts::{PI, TAU};

use hifitime::{Duration, Epoch};

use crate::astro::elements::PARABOLIC_TOLERANCE;
use crate::astro::{anomaly, state_to_elements};
use crate::bodies::CelestialBody;
use crate::error::{OrbitError, Result};
use crate::propagation::state::StateVector;

/// Orbits at or above this eccentricity have no apoapsis
const OPEN_ORBIT_ECCENTRICITY: f64 = 1.0 - 1e-9;

/// Next time at or after `from` that the orbit passes periapsis
pub fn next_periapsis(state: &StateVector, body: &CelestialBody, from: Epoch) -> Result<Epoch> {
    let elements = state_to_elements(state, body)?;
    let e = elements.eccentricity;

    if e < OPEN_ORBIT_ECCENTRICITY {
        return next_crossing(state, elements.mean_anomaly(), elements.mean_motion(body.gm), 0.0, from);
    }

    // Open orbit: a single periapsis passage, possibly already behind us
    let since_periapsis = if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
        let p = state.position.cross(&state.velocity).norm_squared() / body.gm;
        let d = anomaly::true_to_parabolic(elements.true_anomaly);
        0.5 * (p.powi(3) / body.gm).sqrt() * (d + d.powi(3) / 3.0)
    } else {
        elements.mean_anomaly() / elements.mean_motion(body.gm)
    };

    let periapsis = state.epoch - Duration::from_seconds(since_periapsis);
    if periapsis >= from {
        Ok(periapsis)
    } else {
        Err(OrbitError::NoPeriapsis { eccentricity: e })
    }
}

/// Next time at or after `from` that the orbit passes apoapsis
pub fn next_apoapsis(state: &StateVector, body: &CelestialBody, from: Epoch) -> Result<Epoch> {
    let elements = state_to_elements(state, body)?;
    if elements.eccentricity >= OPEN_ORBIT_ECCENTRICITY {
        return Err(OrbitError::NoApoapsis {
            eccentricity: elements.eccentricity,
        });
    }
    next_crossing(state, elements.mean_anomaly(), elements.mean_motion(body.gm), PI, from)
}

fn next_crossing(
    state: &StateVector,
    mean_anomaly: f64,
    mean_motion: f64,
    target: f64,
    from: Epoch,
) -> Result<Epoch> {
    if !(mean_motion.is_finite() && mean_motion > 0.0) {
        return Err(OrbitError::invalid(format!("invalid mean motion {}", mean_motion)));
    }
    let period = TAU / mean_motion;
    let first = anomaly::wrap_two_pi(target - mean_anomaly) / mean_motion;
    let lead = (from - state.epoch).to_seconds();

    let k = ((lead - first) / period).ceil();
    let mut epoch = state.epoch + Duration::from_seconds(first + k * period);
    if epoch < from {
        epoch += Duration::from_seconds(period);
    }
    Ok(epoch)
}
