//! Classical orbital elements
//!
//! Conversion between Cartesian state vectors and the six classical
//! elements. Angles are radians in [0, 2π) and measured in the axes of the
//! inertial frame the state is expressed in (reference plane = XY).
//!
//! Degenerate geometries follow the usual conventions:
//!
//! - **Circular** (e below [`CIRCULAR_TOLERANCE`]): argument of periapsis is
//!   zero and the true anomaly holds the argument of latitude.
//! - **Equatorial** (sin i below [`EQUATORIAL_TOLERANCE`]): RAAN is zero and
//!   the argument of periapsis holds the longitude of periapsis.
//! - **Circular equatorial**: both are zero and the true anomaly holds the
//!   true longitude.

use std::f64::consts::TAU;

use hifitime::Epoch;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use super::anomaly::{
    hyperbolic_to_mean, true_to_hyperbolic, true_to_mean, true_to_parabolic, wrap_two_pi,
};
use crate::bodies::CelestialBody;
use crate::error::{OrbitError, Result};
use crate::propagation::state::StateVector;

pub const CIRCULAR_TOLERANCE: f64 = 1e-10;
pub const EQUATORIAL_TOLERANCE: f64 = 1e-10;
pub const PARABOLIC_TOLERANCE: f64 = 1e-9;

/// Classical (Keplerian) orbital elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis (km), negative for hyperbolic and infinite for parabolic orbits
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Inclination (rad), in [0, π]
    pub inclination: f64,
    /// Right ascension of the ascending node (rad)
    pub raan: f64,
    /// Argument of periapsis (rad)
    pub argument_of_periapsis: f64,
    /// True anomaly (rad)
    pub true_anomaly: f64,
    /// Orbital period (s), infinite when unbound
    pub period: f64,
}

impl OrbitalElements {
    /// Circular orbit of radius `radius` with the phase given as argument of latitude
    pub fn circular(radius: f64, inclination: f64, raan: f64, argument_of_latitude: f64, mu: f64) -> Self {
        Self {
            semi_major_axis: radius,
            eccentricity: 0.0,
            inclination,
            raan,
            argument_of_periapsis: 0.0,
            true_anomaly: wrap_two_pi(argument_of_latitude),
            period: TAU * (radius.powi(3) / mu).sqrt(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.eccentricity < 1.0 && self.semi_major_axis > 0.0
    }

    /// Semi-latus rectum p = a(1 − e²)
    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    pub fn periapsis_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius, `None` for open orbits
    pub fn apoapsis_radius(&self) -> Option<f64> {
        self.is_bound()
            .then(|| self.semi_major_axis * (1.0 + self.eccentricity))
    }

    /// Mean motion n = √(μ/|a|³)
    pub fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// Mean anomaly at the current true anomaly
    ///
    /// Elliptic orbits report [0, 2π); hyperbolic orbits report the signed
    /// hyperbolic mean anomaly and parabolic orbits Barker's D + D³/3.
    pub fn mean_anomaly(&self) -> f64 {
        let e = self.eccentricity;
        if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
            let d = true_to_parabolic(self.true_anomaly);
            d + d * d * d / 3.0
        } else if e > 1.0 {
            hyperbolic_to_mean(true_to_hyperbolic(self.true_anomaly, e), e)
        } else {
            true_to_mean(self.true_anomaly, e)
        }
    }

    /// Unit normal of the orbital plane (direction of angular momentum)
    pub fn plane_normal(&self) -> Vector3<f64> {
        let (si, ci) = self.inclination.sin_cos();
        let (so, co) = self.raan.sin_cos();
        Vector3::new(si * so, -si * co, ci)
    }
}

/// Derive elements from a body-centred state
pub fn state_to_elements(state: &StateVector, body: &CelestialBody) -> Result<OrbitalElements> {
    if state.central_body != body.id {
        return Err(OrbitError::invalid(format!(
            "state is centred on {} but elements requested about {}",
            state.central_body, body.id
        )));
    }
    elements_from_vectors(&state.position, &state.velocity, body.gm)
}

/// Build a body-centred state from elements
pub fn elements_to_state(
    elements: &OrbitalElements,
    body: &CelestialBody,
    epoch: Epoch,
) -> Result<StateVector> {
    let (position, velocity) = vectors_from_elements(elements, body.gm)?;
    Ok(StateVector::new(position, velocity, epoch, body.id))
}

/// Elements from raw position (km) and velocity (km/s) vectors
pub fn elements_from_vectors(
    r: &Vector3<f64>,
    v: &Vector3<f64>,
    mu: f64,
) -> Result<OrbitalElements> {
    if !(mu.is_finite() && mu > 0.0) {
        return Err(OrbitError::invalid(format!("non-positive GM {}", mu)));
    }
    if !(r.iter().chain(v.iter()).all(|c| c.is_finite())) {
        return Err(OrbitError::invalid("state vector is not finite"));
    }

    let r_mag = r.norm();
    let v_mag = v.norm();
    if r_mag <= 0.0 {
        return Err(OrbitError::invalid("zero position vector"));
    }

    let h = r.cross(v);
    let h_mag = h.norm();
    if h_mag <= 1e-12 * r_mag * v_mag.max(1e-12) {
        return Err(OrbitError::invalid("rectilinear trajectory has no orbital plane"));
    }
    let h_hat = h / h_mag;

    let e_vec = ((v_mag * v_mag - mu / r_mag) * r - r.dot(v) * v) / mu;
    let e = e_vec.norm();

    let energy = 0.5 * v_mag * v_mag - mu / r_mag;
    let a = if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
        f64::INFINITY
    } else {
        -mu / (2.0 * energy)
    };

    let inclination = h_hat.z.clamp(-1.0, 1.0).acos();

    // Node line k × h
    let node = Vector3::new(-h.y, h.x, 0.0);
    let equatorial = node.norm() < EQUATORIAL_TOLERANCE * h_mag;
    let circular = e < CIRCULAR_TOLERANCE;

    let (raan, node_dir) = if equatorial {
        (0.0, Vector3::x())
    } else {
        (wrap_two_pi(node.y.atan2(node.x)), node)
    };

    // Signed in-plane angle from `from` to `to`, positive along the motion
    let in_plane = |from: &Vector3<f64>, to: &Vector3<f64>| {
        wrap_two_pi(from.cross(to).dot(&h_hat).atan2(from.dot(to)))
    };

    let (argument_of_periapsis, true_anomaly) = if circular {
        (0.0, in_plane(&node_dir, r))
    } else {
        (in_plane(&node_dir, &e_vec), in_plane(&e_vec, r))
    };

    let period = if e < 1.0 && a > 0.0 {
        TAU * (a.powi(3) / mu).sqrt()
    } else {
        f64::INFINITY
    };

    Ok(OrbitalElements {
        semi_major_axis: a,
        eccentricity: e,
        inclination,
        raan,
        argument_of_periapsis,
        true_anomaly,
        period,
    })
}

/// Position and velocity from elements
pub fn vectors_from_elements(
    elements: &OrbitalElements,
    mu: f64,
) -> Result<(Vector3<f64>, Vector3<f64>)> {
    if !(mu.is_finite() && mu > 0.0) {
        return Err(OrbitError::invalid(format!("non-positive GM {}", mu)));
    }
    let e = elements.eccentricity;
    let a = elements.semi_major_axis;
    if !(e >= 0.0 && e.is_finite()) {
        return Err(OrbitError::invalid(format!("invalid eccentricity {}", e)));
    }
    if !a.is_finite() || a == 0.0 {
        return Err(OrbitError::invalid(format!(
            "semi-major axis {} cannot describe a state",
            a
        )));
    }
    if (e < 1.0) != (a > 0.0) {
        return Err(OrbitError::invalid(format!(
            "semi-major axis {} inconsistent with eccentricity {}",
            a, e
        )));
    }

    let p = elements.semi_latus_rectum();
    let (sin_nu, cos_nu) = elements.true_anomaly.sin_cos();
    let denom = 1.0 + e * cos_nu;
    if denom <= 1e-12 {
        return Err(OrbitError::invalid(
            "true anomaly beyond the hyperbolic asymptote",
        ));
    }

    let r_pf = Vector3::new(cos_nu, sin_nu, 0.0) * (p / denom);
    let v_pf = Vector3::new(-sin_nu, e + cos_nu, 0.0) * (mu / p).sqrt();

    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), elements.raan)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), elements.inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), elements.argument_of_periapsis);

    Ok((rotation * r_pf, rotation * v_pf))
}
