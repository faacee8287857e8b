//! Two-impulse Hohmann transfer with an optional combined plane change
//!
//! The first burn fires at the current position and puts the spacecraft on
//! a transfer ellipse whose far apsis touches the target orbit. The second
//! burn, half a transfer period later, matches the target orbit's speed.
//! When the target plane differs, the plane change is folded into whichever
//! burn gives the lower total:
//!
//! Δv = √(v₁² + v₂² − 2·v₁·v₂·cos θ)

use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::astro::{state_to_elements, OrbitalElements};
use crate::bodies::CelestialBody;
use crate::error::{OrbitError, Result};
use crate::maneuver::LocalDeltaV;
use crate::propagation::state::StateVector;

/// Apsis radii closer than this count as matched (km)
const RADIUS_TOLERANCE_KM: f64 = 1e-3;

/// Planes closer than this count as matched (rad)
const PLANE_TOLERANCE_RAD: f64 = 1e-9;

/// Desired final orbit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetOrbit {
    /// Periapsis altitude above the equatorial radius (km)
    pub periapsis_altitude: f64,
    /// Apoapsis altitude above the equatorial radius (km)
    pub apoapsis_altitude: f64,
    /// Inclination (rad)
    pub inclination: f64,
    /// Right ascension of the ascending node (rad)
    pub raan: f64,
    /// Argument of periapsis (rad)
    pub argument_of_periapsis: f64,
}

impl TargetOrbit {
    /// Circular target in the given plane
    pub fn circular(altitude: f64, inclination: f64, raan: f64) -> Self {
        Self {
            periapsis_altitude: altitude,
            apoapsis_altitude: altitude,
            inclination,
            raan,
            argument_of_periapsis: 0.0,
        }
    }

    fn plane_normal(&self) -> Vector3<f64> {
        OrbitalElements {
            semi_major_axis: 1.0,
            eccentricity: 0.0,
            inclination: self.inclination,
            raan: self.raan,
            argument_of_periapsis: self.argument_of_periapsis,
            true_anomaly: 0.0,
            period: 0.0,
        }
        .plane_normal()
    }
}

/// One impulse of the transfer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferBurn {
    /// Magnitude (km/s)
    pub delta_v: f64,

    /// Components in the local frame at the burn point
    pub local_delta_v: LocalDeltaV,

    /// Seconds after the state epoch
    pub time_offset: f64,

    /// Plane change performed by this burn (rad)
    pub plane_change: f64,
}

impl TransferBurn {
    fn none(time_offset: f64) -> Self {
        Self {
            delta_v: 0.0,
            local_delta_v: LocalDeltaV::default(),
            time_offset,
            plane_change: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HohmannResult {
    pub burn1: TransferBurn,
    pub burn2: TransferBurn,

    /// Sum of burn magnitudes (km/s)
    pub total_delta_v: f64,

    /// Half the transfer ellipse period (s)
    pub transfer_time: f64,

    /// Angle between the current and target planes (rad)
    pub plane_change_angle: f64,

    pub transfer_semi_major_axis: f64,
}

impl HohmannResult {
    pub fn is_zero(&self) -> bool {
        self.total_delta_v == 0.0
    }
}

/// Compute a two-impulse transfer from `state` to `target`
pub fn compute_hohmann_transfer(
    state: &StateVector,
    body: &CelestialBody,
    target: &TargetOrbit,
) -> Result<HohmannResult> {
    let current = state_to_elements(state, body)
        .map_err(|e| OrbitError::UnreachableTarget(format!("degenerate current state: {}", e)))?;
    if !current.is_bound() {
        return Err(OrbitError::UnreachableTarget(format!(
            "current orbit is not bound (e = {:.6})",
            current.eccentricity
        )));
    }

    let values = [
        target.periapsis_altitude,
        target.apoapsis_altitude,
        target.inclination,
        target.raan,
        target.argument_of_periapsis,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(OrbitError::UnreachableTarget("target has non-finite parameters".into()));
    }
    if target.periapsis_altitude > target.apoapsis_altitude {
        return Err(OrbitError::UnreachableTarget(format!(
            "target periapsis {:.3} km exceeds apoapsis {:.3} km",
            target.periapsis_altitude, target.apoapsis_altitude
        )));
    }
    if target.periapsis_altitude < 0.0 {
        return Err(OrbitError::UnreachableTarget(format!(
            "target periapsis {:.3} km is below the surface of {}",
            target.periapsis_altitude, body.name
        )));
    }

    let mu = body.gm;
    let rp_target = body.radius + target.periapsis_altitude;
    let ra_target = body.radius + target.apoapsis_altitude;
    let a_target = 0.5 * (rp_target + ra_target);

    let h = state.position.cross(&state.velocity);
    let current_normal = h / h.norm();
    let target_normal = target.plane_normal();
    let theta = current_normal
        .cross(&target_normal)
        .norm()
        .atan2(current_normal.dot(&target_normal));

    let r1 = state.radius();
    let r2 = if r1 < ra_target { ra_target } else { rp_target };
    let a_transfer = 0.5 * (r1 + r2);
    let transfer_time = PI * (a_transfer.powi(3) / mu).sqrt();

    let matched = current
        .apoapsis_radius()
        .map_or(false, |ra| (ra - ra_target).abs() < RADIUS_TOLERANCE_KM)
        && (current.periapsis_radius() - rp_target).abs() < RADIUS_TOLERANCE_KM
        && theta < PLANE_TOLERANCE_RAD;
    if matched {
        log::debug!("Target orbit already matched, no transfer needed");
        return Ok(HohmannResult {
            burn1: TransferBurn::none(0.0),
            burn2: TransferBurn::none(transfer_time),
            total_delta_v: 0.0,
            transfer_time,
            plane_change_angle: theta,
            transfer_semi_major_axis: a_transfer,
        });
    }

    let vis_viva = |r: f64, a: f64| (mu * (2.0 / r - 1.0 / a)).sqrt();
    let v1_current = state.speed();
    let v1_transfer = vis_viva(r1, a_transfer);
    let v2_transfer = vis_viva(r2, a_transfer);
    let v2_target = vis_viva(r2, a_target);

    let combined = |v_from: f64, v_to: f64| {
        (v_from * v_from + v_to * v_to - 2.0 * v_from * v_to * theta.cos())
            .max(0.0)
            .sqrt()
    };
    let coplanar1 = (v1_transfer - v1_current).abs();
    let coplanar2 = (v2_target - v2_transfer).abs();
    let plane_at_first = combined(v1_current, v1_transfer) + coplanar2;
    let plane_at_second = coplanar1 + combined(v2_transfer, v2_target);

    // Out-of-plane direction toward the target plane at the first burn;
    // half a revolution later the same plane rotation points the other way.
    let normal_axis = LocalDeltaV::new(0.0, 1.0, 0.0).to_world(state)?;
    let toward_target = target_normal.cross(&state.position);
    let sign = if toward_target.dot(&normal_axis) < 0.0 { -1.0 } else { 1.0 };

    let burn = |v_from: f64, v_to: f64, plane: f64, sign: f64, time_offset: f64| {
        let local = LocalDeltaV::new(v_to * plane.cos() - v_from, sign * v_to * plane.sin(), 0.0);
        TransferBurn {
            delta_v: local.magnitude(),
            local_delta_v: local,
            time_offset,
            plane_change: plane,
        }
    };

    let (burn1, burn2) = if theta >= PLANE_TOLERANCE_RAD && plane_at_first < plane_at_second {
        (
            burn(v1_current, v1_transfer, theta, sign, 0.0),
            burn(v2_transfer, v2_target, 0.0, -sign, transfer_time),
        )
    } else {
        let plane = if theta >= PLANE_TOLERANCE_RAD { theta } else { 0.0 };
        (
            burn(v1_current, v1_transfer, 0.0, sign, 0.0),
            burn(v2_transfer, v2_target, plane, -sign, transfer_time),
        )
    };

    let total_delta_v = burn1.delta_v + burn2.delta_v;
    log::debug!(
        "Hohmann {:.1} -> {:.1} km: Δv {:.6} + {:.6} km/s, plane change {:.4} rad",
        r1,
        r2,
        burn1.delta_v,
        burn2.delta_v,
        theta
    );

    Ok(HohmannResult {
        burn1,
        burn2,
        total_delta_v,
        transfer_time,
        plane_change_angle: theta,
        transfer_semi_major_axis: a_transfer,
    })
}
