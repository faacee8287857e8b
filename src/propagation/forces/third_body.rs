//! Third-body gravitational perturbations
//!
//! Every body other than the central one pulls on the spacecraft and on the
//! central body. Only the difference matters in the central frame:
//!
//! a = μ_b × ((r_b − r)/|r_b − r|³ − r_b/|r_b|³)
//!
//! The second (indirect) term compensates for the central body's own
//! acceleration toward the perturber.

use super::{ForceContext, ForceModel};
use crate::bodies::Ephemeris;
use crate::error::Result;
use nalgebra::Vector3;

/// Third-body gravitational perturbation model
#[derive(Debug, Default, Clone, Copy)]
pub struct ThirdBody;

impl ThirdBody {
    /// Every body in the ephemeris except the central one
    pub fn all() -> Self {
        Self
    }

    /// Direct minus indirect term for one perturber
    ///
    /// `body_pos` is the perturber relative to the central body.
    fn third_body_accel(sat_pos: &Vector3<f64>, body_pos: &Vector3<f64>, mu_body: f64) -> Vector3<f64> {
        let r_sat_body = body_pos - sat_pos;
        let d = r_sat_body.norm();
        let rb = body_pos.norm();

        if d <= 0.0 || rb <= 0.0 {
            return Vector3::zeros();
        }

        mu_body * (r_sat_body / d.powi(3) - body_pos / rb.powi(3))
    }
}

impl ForceModel for ThirdBody {
    fn acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>> {
        let central = ctx.central.id;
        let (central_pos, _) = ctx.ephemeris.state(central, ctx.epoch)?;

        let mut accel = Vector3::zeros();
        for body in ctx.ephemeris.bodies() {
            if body.id == central {
                continue;
            }
            let (pos, _) = ctx.ephemeris.state(body.id, ctx.epoch)?;
            accel += Self::third_body_accel(&ctx.position, &(pos - central_pos), body.gm);
        }

        Ok(accel)
    }

    fn name(&self) -> &'static str {
        "Third-Body"
    }

    fn description(&self) -> &'static str {
        "Point-mass perturbations from non-central bodies"
    }

    fn enabled(&self) -> bool {
        true
    }
}
