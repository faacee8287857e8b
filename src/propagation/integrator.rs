//! Numerical integrators for orbit propagation
//!
//! This module provides a trait-based abstraction for numerical integration
//! so the propagator can swap methods at runtime.
//!
//! # Available Integrators
//!
//! - **DormandPrince54**: Embedded Runge-Kutta 5(4) pair (default)
//! - **Rk4StepDoubling**: Classic RK4 with a step-doubling error estimate
//!
//! # Step control
//!
//! [`AdaptiveStepper`] advances a 6-element state over a signed time span.
//! A step is accepted when the scaled error norm is at most 1, otherwise
//! the step is halved. Accepted steps well under tolerance grow the next
//! step geometrically, bounded by `max_growth` and `max_step`. The final
//! step is clipped so integration lands exactly on the end time.

use nalgebra::Vector6;

use super::cancel::CancellationToken;
use super::settings::IntegratorSettings;
use crate::error::{OrbitError, Result};

/// Right-hand side of the ODE: (t, y) -> dy/dt
pub type Rhs<'a> = dyn FnMut(f64, &Vector6<f64>) -> Result<Vector6<f64>> + 'a;

/// Output of one embedded step attempt
#[derive(Debug, Clone)]
pub struct EmbeddedStep {
    /// Propagated solution (higher order)
    pub y: Vector6<f64>,

    /// Local truncation error estimate per component
    pub error: Vector6<f64>,
}

/// Result of an accepted integration step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub t_start: f64,
    pub y_start: Vector6<f64>,
    pub t: f64,
    pub y: Vector6<f64>,

    /// Actual step size used (signed)
    pub dt_used: f64,

    /// Scaled error norm of the accepted step
    pub error_estimate: f64,
}

/// Trait for numerical integrators
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow parallel propagation
/// of multiple satellites.
pub trait Integrator: Send + Sync {
    /// Take a single step of size `h` with an error estimate
    fn embedded_step(
        &self,
        t: f64,
        y: &Vector6<f64>,
        h: f64,
        rhs: &mut Rhs<'_>,
    ) -> Result<EmbeddedStep>;

    /// Integrator name
    fn name(&self) -> &'static str;

    /// Order of the propagated solution
    fn order(&self) -> u8;

    /// Number of function evaluations per step
    fn stages(&self) -> usize;
}

/// Dormand-Prince 5(4) embedded pair
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince54;

impl DormandPrince54 {
    const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

    #[rustfmt::skip]
    const A: [[f64; 6]; 7] = [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
        [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
        [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
        [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
        [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
    ];

    /// Fifth-order weights
    const B: [f64; 7] = [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ];

    /// Fifth-order minus fourth-order weights
    const E: [f64; 7] = [
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ];
}

impl Integrator for DormandPrince54 {
    fn embedded_step(
        &self,
        t: f64,
        y: &Vector6<f64>,
        h: f64,
        rhs: &mut Rhs<'_>,
    ) -> Result<EmbeddedStep> {
        let mut k = [Vector6::zeros(); 7];
        for stage in 0..7 {
            let mut y_stage = *y;
            for (j, kj) in k.iter().enumerate().take(stage) {
                let a = Self::A[stage][j];
                if a != 0.0 {
                    y_stage += kj * (h * a);
                }
            }
            k[stage] = rhs(t + Self::C[stage] * h, &y_stage)?;
        }

        let mut y_new = *y;
        let mut error = Vector6::zeros();
        for (i, ki) in k.iter().enumerate() {
            y_new += ki * (h * Self::B[i]);
            error += ki * (h * Self::E[i]);
        }

        Ok(EmbeddedStep { y: y_new, error })
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince 5(4)"
    }

    fn order(&self) -> u8 {
        5
    }

    fn stages(&self) -> usize {
        7
    }
}

/// Runge-Kutta 4 with error estimation via step doubling
///
/// One full step is compared against two half steps; the accepted value
/// uses Richardson extrapolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4StepDoubling;

impl Rk4StepDoubling {
    fn rk4_step(t: f64, y: &Vector6<f64>, h: f64, rhs: &mut Rhs<'_>) -> Result<Vector6<f64>> {
        let k1 = rhs(t, y)?;
        let k2 = rhs(t + h / 2.0, &(y + k1 * (h / 2.0)))?;
        let k3 = rhs(t + h / 2.0, &(y + k2 * (h / 2.0)))?;
        let k4 = rhs(t + h, &(y + k3 * h))?;
        Ok(y + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (h / 6.0))
    }
}

impl Integrator for Rk4StepDoubling {
    fn embedded_step(
        &self,
        t: f64,
        y: &Vector6<f64>,
        h: f64,
        rhs: &mut Rhs<'_>,
    ) -> Result<EmbeddedStep> {
        // Take one full step
        let y_full = Self::rk4_step(t, y, h, rhs)?;

        // Take two half steps
        let y_half1 = Self::rk4_step(t, y, h / 2.0, rhs)?;
        let y_half2 = Self::rk4_step(t + h / 2.0, &y_half1, h / 2.0, rhs)?;

        let error = (y_half2 - y_full) / 15.0;
        Ok(EmbeddedStep {
            y: y_half2 + error,
            error,
        })
    }

    fn name(&self) -> &'static str {
        "RK4 (step doubling)"
    }

    fn order(&self) -> u8 {
        4
    }

    fn stages(&self) -> usize {
        11
    }
}

/// Adaptive step control over one signed time span (seconds)
pub struct AdaptiveStepper<'a> {
    integrator: &'a dyn Integrator,
    settings: &'a IntegratorSettings,
    t0: f64,
    t: f64,
    y: Vector6<f64>,
    t_end: f64,
    h: f64,
    attempts: usize,
    rejected: usize,
}

impl<'a> AdaptiveStepper<'a> {
    pub fn new(
        integrator: &'a dyn Integrator,
        settings: &'a IntegratorSettings,
        t0: f64,
        y0: Vector6<f64>,
        duration: f64,
    ) -> Result<Self> {
        settings.validate()?;
        if !duration.is_finite() || !t0.is_finite() {
            return Err(OrbitError::invalid(format!(
                "integration span must be finite, got {}",
                duration
            )));
        }
        let h = settings.initial_step.min(settings.max_step).copysign(duration);
        Ok(Self {
            integrator,
            settings,
            t0,
            t: t0,
            y: y0,
            t_end: t0 + duration,
            h,
            attempts: 0,
            rejected: 0,
        })
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn y(&self) -> &Vector6<f64> {
        &self.y
    }

    /// Step attempts so far, accepted and rejected
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn is_done(&self) -> bool {
        self.t == self.t_end
    }

    /// Advance by one accepted step
    pub fn step(&mut self, rhs: &mut Rhs<'_>) -> Result<StepResult> {
        let order = f64::from(self.integrator.order());

        loop {
            let remaining = self.t_end - self.t;
            if remaining == 0.0 {
                return Err(OrbitError::invalid("integration span already complete"));
            }

            if self.attempts >= self.settings.max_steps {
                return Err(self.diverged(format!(
                    "step ceiling of {} exceeded",
                    self.settings.max_steps
                )));
            }

            let last = self.h.abs() >= remaining.abs();
            let h = if last { remaining } else { self.h };

            self.attempts += 1;
            let trial = self.integrator.embedded_step(self.t, &self.y, h, rhs)?;
            let err = error_norm(&self.y, &trial, self.settings);

            if err <= 1.0 {
                let t_start = self.t;
                let y_start = self.y;
                self.t = if last { self.t_end } else { self.t + h };
                self.y = trial.y;

                if err < self.settings.grow_threshold {
                    let factor = if err == 0.0 {
                        self.settings.max_growth
                    } else {
                        (self.settings.safety * err.powf(-1.0 / order))
                            .clamp(1.0, self.settings.max_growth)
                    };
                    let grown = (self.h.abs() * factor).min(self.settings.max_step);
                    self.h = grown.copysign(self.h);
                }

                return Ok(StepResult {
                    t_start,
                    y_start,
                    t: self.t,
                    y: self.y,
                    dt_used: h,
                    error_estimate: err,
                });
            }

            self.rejected += 1;
            let halved = h / 2.0;
            log::trace!(
                "{} rejected step of {:.3e} s at t={:.3} (error {:.3e})",
                self.integrator.name(),
                h,
                self.t,
                err
            );
            if halved.abs() < self.settings.min_step {
                return Err(self.diverged(format!(
                    "step size {:.3e} s fell below the floor of {:.3e} s",
                    halved.abs(),
                    self.settings.min_step
                )));
            }
            self.h = halved;
        }
    }

    fn diverged(&self, reason: String) -> OrbitError {
        OrbitError::IntegrationDiverged {
            steps: self.attempts,
            elapsed_s: self.t - self.t0,
            reason,
        }
    }
}

/// Max-norm of the error scaled by abs_tol + rel_tol·|y|
fn error_norm(y0: &Vector6<f64>, trial: &EmbeddedStep, settings: &IntegratorSettings) -> f64 {
    if !trial.y.iter().chain(trial.error.iter()).all(|c| c.is_finite()) {
        return f64::INFINITY;
    }
    (0..6)
        .map(|i| {
            let scale = settings.abs_tol + settings.rel_tol * y0[i].abs().max(trial.y[i].abs());
            (trial.error[i] / scale).abs()
        })
        .fold(0.0, f64::max)
}

/// Whether the driver should keep going after an accepted step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    Continue,
    Stop,
}

/// Summary of a finished [`AdaptiveDriver::integrate`] call
#[derive(Debug, Clone)]
pub struct IntegrationOutcome {
    /// Time reached; equals t0 + duration unless stopped early
    pub t: f64,
    pub y: Vector6<f64>,
    pub steps: usize,
    pub rejected: usize,

    /// True when the observer asked to stop
    pub stopped: bool,
}

/// Runs an [`AdaptiveStepper`] to completion
pub struct AdaptiveDriver<'a> {
    integrator: &'a dyn Integrator,
    settings: &'a IntegratorSettings,
}

impl<'a> AdaptiveDriver<'a> {
    pub fn new(integrator: &'a dyn Integrator, settings: &'a IntegratorSettings) -> Self {
        Self {
            integrator,
            settings,
        }
    }

    /// Integrate from (t0, y0) over a signed `duration`
    ///
    /// `observer` sees every accepted step and may stop integration early.
    /// The returned (t, y) can seed the next call.
    pub fn integrate(
        &self,
        t0: f64,
        y0: Vector6<f64>,
        duration: f64,
        rhs: &mut Rhs<'_>,
        observer: &mut dyn FnMut(&StepResult) -> Result<StepControl>,
        cancel: Option<&CancellationToken>,
    ) -> Result<IntegrationOutcome> {
        let mut stepper = AdaptiveStepper::new(self.integrator, self.settings, t0, y0, duration)?;
        let mut stopped = false;
        while !stepper.is_done() {
            if let Some(token) = cancel {
                token.check()?;
            }
            let step = stepper.step(rhs)?;
            if observer(&step)? == StepControl::Stop {
                stopped = true;
                break;
            }
        }
        Ok(IntegrationOutcome {
            t: stepper.t(),
            y: *stepper.y(),
            steps: stepper.attempts(),
            rejected: stepper.rejected(),
            stopped,
        })
    }
}

/// Integrate without observing intermediate steps
pub fn integrate(
    integrator: &dyn Integrator,
    settings: &IntegratorSettings,
    y0: Vector6<f64>,
    duration: f64,
    rhs: &mut Rhs<'_>,
    cancel: Option<&CancellationToken>,
) -> Result<IntegrationOutcome> {
    AdaptiveDriver::new(integrator, settings).integrate(
        0.0,
        y0,
        duration,
        rhs,
        &mut |_| Ok(StepControl::Continue),
        cancel,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{EARTH_GM, EARTH_RADIUS_KM};

    fn two_body(_t: f64, y: &Vector6<f64>) -> Result<Vector6<f64>> {
        let r = y.fixed_rows::<3>(0);
        let v = y.fixed_rows::<3>(3);
        let a = -EARTH_GM / r.norm().powi(3) * r;
        Ok(Vector6::new(v[0], v[1], v[2], a[0], a[1], a[2]))
    }

    fn circular_400km() -> (Vector6<f64>, f64) {
        let r = EARTH_RADIUS_KM + 400.0;
        let v = (EARTH_GM / r).sqrt();
        let period = std::f64::consts::TAU * (r.powi(3) / EARTH_GM).sqrt();
        (Vector6::new(r, 0.0, 0.0, 0.0, v, 0.0), period)
    }

    #[test]
    fn test_dp54_circular_orbit() {
        let (y0, period) = circular_400km();
        let settings = IntegratorSettings::default();
        let outcome =
            integrate(&DormandPrince54, &settings, y0, period, &mut two_body, None).unwrap();

        let pos_error = (outcome.y.fixed_rows::<3>(0) - y0.fixed_rows::<3>(0)).norm();
        assert!(pos_error < 1e-3, "Position error too large: {} km", pos_error);
        assert!(outcome.steps > 10);
    }

    #[test]
    fn test_rk4_step_doubling_matches_dp54() {
        let (y0, period) = circular_400km();
        let settings = IntegratorSettings::default();
        let dp = integrate(&DormandPrince54, &settings, y0, period / 3.0, &mut two_body, None)
            .unwrap();
        let rk = integrate(&Rk4StepDoubling, &settings, y0, period / 3.0, &mut two_body, None)
            .unwrap();
        assert!((dp.y - rk.y).norm() < 1e-3);
    }

    #[test]
    fn test_lands_exactly_on_end_time() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::default();
        for &duration in &[1234.567, -987.25, 0.125] {
            let mut stepper = AdaptiveStepper::new(&DormandPrince54, &settings, 0.0, y0, duration).unwrap();
            let mut last = None;
            while !stepper.is_done() {
                last = Some(stepper.step(&mut two_body).unwrap());
            }
            let last = last.unwrap();
            assert_eq!(last.t, duration);
            assert_eq!(stepper.t(), duration);
            assert!(last.dt_used.signum() == duration.signum());
        }
    }

    #[test]
    fn test_forward_backward_round_trip() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::high_precision();
        let forward =
            integrate(&DormandPrince54, &settings, y0, 3_000.0, &mut two_body, None).unwrap();
        let back =
            integrate(&DormandPrince54, &settings, forward.y, -3_000.0, &mut two_body, None)
                .unwrap();
        assert!((back.y - y0).norm() < 1e-4);
    }

    #[test]
    fn test_step_ceiling_diverges() {
        let (y0, period) = circular_400km();
        let settings = IntegratorSettings {
            max_steps: 3,
            ..IntegratorSettings::default()
        };
        let result = integrate(&DormandPrince54, &settings, y0, period, &mut two_body, None);
        match result {
            Err(OrbitError::IntegrationDiverged { steps, .. }) => assert_eq!(steps, 3),
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn test_step_floor_diverges() {
        let (y0, period) = circular_400km();
        let settings = IntegratorSettings {
            rel_tol: 1e-15,
            abs_tol: 1e-15,
            initial_step: 400.0,
            min_step: 100.0,
            max_step: 400.0,
            ..IntegratorSettings::default()
        };
        let result = integrate(&DormandPrince54, &settings, y0, period, &mut two_body, None);
        assert!(matches!(result, Err(OrbitError::IntegrationDiverged { .. })));
    }

    #[test]
    fn test_rhs_error_is_surfaced() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::default();
        let mut failing = |_t: f64, _y: &Vector6<f64>| -> Result<Vector6<f64>> {
            Err(OrbitError::invalid("boom"))
        };
        let result = integrate(&DormandPrince54, &settings, y0, 10.0, &mut failing, None);
        assert!(matches!(result, Err(OrbitError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::default();
        let token = CancellationToken::new();
        token.cancel();
        let result = integrate(&DormandPrince54, &settings, y0, 100.0, &mut two_body, Some(&token));
        assert!(matches!(result, Err(OrbitError::Cancelled)));
    }

    #[test]
    fn test_observer_stops_early_and_restarts() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::default();
        let driver = AdaptiveDriver::new(&DormandPrince54, &settings);

        let mut seen = 0;
        let first = driver
            .integrate(
                100.0,
                y0,
                2_000.0,
                &mut two_body,
                &mut |step| {
                    seen += 1;
                    assert!(step.t > step.t_start);
                    Ok(if step.t > 600.0 {
                        StepControl::Stop
                    } else {
                        StepControl::Continue
                    })
                },
                None,
            )
            .unwrap();
        assert!(first.stopped);
        assert!(first.t > 600.0 && first.t < 2_100.0);
        assert_eq!(seen, first.steps - first.rejected);

        let rest = driver
            .integrate(
                first.t,
                first.y,
                2_100.0 - first.t,
                &mut two_body,
                &mut |_| Ok(StepControl::Continue),
                None,
            )
            .unwrap();
        assert!(!rest.stopped);
        assert_eq!(rest.t, first.t + (2_100.0 - first.t));

        let direct = integrate(&DormandPrince54, &settings, y0, 2_000.0, &mut two_body, None)
            .unwrap();
        assert!((direct.y - rest.y).fixed_rows::<3>(0).norm() < 1e-4);
    }

    #[test]
    fn test_zero_duration_is_immediately_done() {
        let (y0, _) = circular_400km();
        let settings = IntegratorSettings::default();
        let outcome = integrate(&DormandPrince54, &settings, y0, 0.0, &mut two_body, None).unwrap();
        assert_eq!(outcome.y, y0);
        assert_eq!(outcome.steps, 0);
    }
}
