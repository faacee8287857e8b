//! Numerical orbit propagator
//!
//! Orchestrates the adaptive integrator with the configured force models,
//! splitting the run at impulsive burns and at sphere-of-influence
//! crossings. States are always integrated relative to the body whose
//! sphere of influence contains them.

use hifitime::{Duration, Epoch};
use nalgebra::{Vector3, Vector6};

use super::cancel::CancellationToken;
use super::forces::{CompositeForce, ForceContext};
use super::integrator::{AdaptiveDriver, Integrator, Rhs, StepControl, StepResult};
use super::settings::PropagationOptions;
use super::state::{SatelliteConfig, SpacecraftProperties, StateVector, TrajectorySample};
use crate::bodies::{BodyId, CelestialBody, Ephemeris};
use crate::error::{OrbitError, Result};
use crate::maneuver::LocalDeltaV;

/// Event times are refined until the bracket is below this (seconds)
const BISECTION_TOLERANCE_S: f64 = 1e-3;
const MAX_BISECTIONS: usize = 64;

/// Instantaneous velocity change at a fixed epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulsiveBurn {
    pub epoch: Epoch,
    pub delta_v: LocalDeltaV,
}

impl ImpulsiveBurn {
    pub fn new(epoch: Epoch, delta_v: LocalDeltaV) -> Self {
        Self { epoch, delta_v }
    }
}

/// Change of central body during propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoiTransition {
    pub from_body: BodyId,
    pub to_body: BodyId,
    pub epoch: Epoch,
}

/// Result of a propagation
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Accepted integration points, thinned by the sample interval
    pub samples: Vec<TrajectorySample>,

    pub transitions: Vec<SoiTransition>,

    /// First time the altitude dropped below the entry threshold
    pub atmospheric_entry: Option<Epoch>,

    /// Set only by [`Propagator::propagate_to_surface`] when the run ended on
    /// the surface
    pub surface_impact: Option<Epoch>,

    pub final_state: StateVector,

    /// Step attempts across every segment
    pub steps_taken: usize,
}

impl Trajectory {
    pub fn start_epoch(&self) -> Option<Epoch> {
        self.samples.first().map(|s| s.epoch)
    }

    pub fn end_epoch(&self) -> Epoch {
        self.final_state.epoch
    }
}

/// Accumulates output across segments
struct Recorder {
    samples: Vec<TrajectorySample>,
    transitions: Vec<SoiTransition>,
    atmospheric_entry: Option<Epoch>,
    /// Refined state where the trajectory met the surface
    impact: Option<StateVector>,
    steps: usize,
    interval: f64,
}

impl Recorder {
    fn new(interval: f64) -> Self {
        Self {
            samples: Vec::new(),
            transitions: Vec::new(),
            atmospheric_entry: None,
            impact: None,
            steps: 0,
            interval,
        }
    }

    /// Store a sample unless it falls inside the thinning interval
    fn record(&mut self, sample: TrajectorySample) {
        let keep = match self.samples.last() {
            None => true,
            Some(last) => {
                self.interval <= 0.0 || (sample.epoch - last.epoch).abs().to_seconds() >= self.interval
            }
        };
        if keep {
            self.samples.push(sample);
        }
    }

    /// Store a sample regardless of spacing
    fn record_always(&mut self, sample: TrajectorySample) {
        if self.samples.last() != Some(&sample) {
            self.samples.push(sample);
        }
    }

    fn finish(self, final_state: StateVector) -> Trajectory {
        Trajectory {
            samples: self.samples,
            transitions: self.transitions,
            atmospheric_entry: self.atmospheric_entry,
            surface_impact: self.impact.map(|s| s.epoch),
            final_state,
            steps_taken: self.steps,
        }
    }
}

/// Orbit propagator bound to one ephemeris and one set of options
///
/// Each instance owns its integrator and force models, so parallel tasks
/// build their own.
pub struct Propagator<'a> {
    ephemeris: &'a dyn Ephemeris,
    options: PropagationOptions,
    forces: CompositeForce,
    integrator: Box<dyn Integrator>,
}

impl<'a> Propagator<'a> {
    pub fn new(ephemeris: &'a dyn Ephemeris, options: PropagationOptions) -> Result<Self> {
        options.validate()?;
        let forces = options.build_forces();
        let integrator = options.integrator.kind.create();
        log::debug!(
            "Propagator using {} with forces {:?}",
            integrator.name(),
            forces.model_names()
        );
        Ok(Self {
            ephemeris,
            options,
            forces,
            integrator,
        })
    }

    pub fn options(&self) -> &PropagationOptions {
        &self.options
    }

    pub fn ephemeris(&self) -> &'a dyn Ephemeris {
        self.ephemeris
    }

    /// Propagate without maneuvers; `duration` may be negative
    pub fn propagate(&self, config: &SatelliteConfig, duration: Duration) -> Result<Trajectory> {
        self.propagate_with_maneuvers(config, duration, &[], None)
    }

    /// Propagate with impulsive burns applied at their epochs
    pub fn propagate_with_maneuvers(
        &self,
        config: &SatelliteConfig,
        duration: Duration,
        burns: &[ImpulsiveBurn],
        cancel: Option<&CancellationToken>,
    ) -> Result<Trajectory> {
        let mut recorder = Recorder::new(self.options.sample_interval);
        let state = self.run(config, duration, burns, cancel, &mut recorder)?;
        Ok(recorder.finish(state))
    }

    /// Propagate, ending the trajectory at a surface impact instead of failing
    ///
    /// On impact the last sample is the state at the surface and
    /// [`Trajectory::surface_impact`] holds its epoch.
    pub fn propagate_to_surface(
        &self,
        config: &SatelliteConfig,
        duration: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Trajectory> {
        let mut recorder = Recorder::new(self.options.sample_interval);
        match self.run(config, duration, &[], cancel, &mut recorder) {
            Ok(state) => Ok(recorder.finish(state)),
            Err(err @ OrbitError::SurfaceImpact { .. }) => match recorder.impact.clone() {
                Some(state) => {
                    recorder.record_always(TrajectorySample::from(&state));
                    Ok(recorder.finish(state))
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    fn run(
        &self,
        config: &SatelliteConfig,
        duration: Duration,
        burns: &[ImpulsiveBurn],
        cancel: Option<&CancellationToken>,
        recorder: &mut Recorder,
    ) -> Result<StateVector> {
        self.validate(config, duration, burns)?;

        let start = config.initial.epoch;
        let end = start + duration;
        log::info!(
            "Propagating {} from {} to {} ({} burns)",
            config.id,
            start,
            end,
            burns.len()
        );

        let mut burns = burns.to_vec();
        burns.sort_by(|a, b| a.epoch.cmp(&b.epoch));

        let mut state = config.initial.clone();
        recorder.record_always(TrajectorySample::from(&state));

        let central = self.ephemeris.require(state.central_body)?;
        if state.altitude(central) < self.options.entry_altitude_km {
            recorder.atmospheric_entry = Some(state.epoch);
        }

        for burn in &burns {
            state = self.run_segment(state, burn.epoch, &config.properties, cancel, recorder)?;
            recorder.record_always(TrajectorySample::from(&state));
            state.velocity += burn.delta_v.to_world(&state)?;
            log::debug!(
                "{}: applied {:.6} km/s burn at {}",
                config.id,
                burn.delta_v.magnitude(),
                burn.epoch
            );
            recorder.record_always(TrajectorySample::from(&state));
        }

        state = self.run_segment(state, end, &config.properties, cancel, recorder)?;
        recorder.record_always(TrajectorySample::from(&state));

        log::info!(
            "{} propagation finished after {} steps ({} SOI transitions)",
            config.id,
            recorder.steps,
            recorder.transitions.len()
        );
        Ok(state)
    }

    fn validate(&self, config: &SatelliteConfig, duration: Duration, burns: &[ImpulsiveBurn]) -> Result<()> {
        config.properties.validate()?;
        config.initial.validate()?;
        self.ephemeris.require(config.initial.central_body)?.validate()?;

        let seconds = duration.to_seconds();
        if !seconds.is_finite() {
            return Err(OrbitError::invalid("propagation duration must be finite"));
        }
        if burns.is_empty() {
            return Ok(());
        }
        if seconds < 0.0 {
            return Err(OrbitError::invalid(
                "backward propagation cannot apply maneuvers",
            ));
        }

        let start = config.initial.epoch;
        let end = start + duration;
        for burn in burns {
            if burn.epoch < start || burn.epoch > end {
                return Err(OrbitError::invalid(format!(
                    "burn at {} lies outside {} .. {}",
                    burn.epoch, start, end
                )));
            }
            if !burn.delta_v.is_finite() {
                return Err(OrbitError::invalid("burn delta-v is not finite"));
            }
        }
        Ok(())
    }

    /// Integrate `state` to `end`, switching central body at SOI crossings
    fn run_segment(
        &self,
        mut state: StateVector,
        end: Epoch,
        properties: &SpacecraftProperties,
        cancel: Option<&CancellationToken>,
        recorder: &mut Recorder,
    ) -> Result<StateVector> {
        let driver = AdaptiveDriver::new(self.integrator.as_ref(), &self.options.integrator);

        loop {
            let remaining = (end - state.epoch).to_seconds();
            if remaining == 0.0 {
                return Ok(state);
            }

            let central = self.ephemeris.require(state.central_body)?;
            let origin = state.epoch;
            let mut crossing: Option<StepResult> = None;
            let mut accepted: Option<StepResult> = None;

            let outcome = {
                let mut rhs = |t: f64, y: &Vector6<f64>| self.derivative(central, origin, t, y, properties);
                let mut observer = |step: &StepResult| -> Result<StepControl> {
                    accepted = Some(step.clone());
                    if self.leaving_domain(central, origin, step.t, &step.y)?.is_some() {
                        crossing = Some(step.clone());
                        return Ok(StepControl::Stop);
                    }

                    if recorder.atmospheric_entry.is_none() {
                        let threshold = self.options.entry_altitude_km;
                        if central.altitude(&position_of(&step.y)) < threshold {
                            let (t, _) = self.bisect(central, origin, properties, step, |_, y| {
                                Ok(central.altitude(&position_of(y)) < threshold)
                            })?;
                            let epoch = origin + Duration::from_seconds(t);
                            log::info!("Atmospheric entry below {} km over {} at {}", threshold, central.name, epoch);
                            recorder.atmospheric_entry = Some(epoch);
                        }
                    }

                    recorder.record(TrajectorySample {
                        epoch: sample_epoch(origin, step.t, remaining, end),
                        position: position_of(&step.y),
                        velocity: velocity_of(&step.y),
                        central_body: central.id,
                    });
                    Ok(StepControl::Continue)
                };
                driver.integrate(0.0, state.state6(), remaining, &mut rhs, &mut observer, cancel)
            };
            let outcome = match outcome {
                Err(err @ OrbitError::SurfaceImpact { .. }) => {
                    // A trial stage went below ground; find where the path does
                    let (t0, y0, h) = match &accepted {
                        Some(step) => (step.t, step.y, step.dt_used),
                        None => (
                            0.0,
                            state.state6(),
                            self.options.integrator.initial_step.copysign(remaining),
                        ),
                    };
                    let refined = self.refine_impact(central, origin, properties, t0, &y0, h, remaining)?;
                    let Some((t, y)) = refined else {
                        return Err(err);
                    };
                    let epoch = origin + Duration::from_seconds(t);
                    log::info!("Surface impact on {} at {}", central.name, epoch);
                    recorder.impact = Some(StateVector::from_state6(&y, epoch, central.id));
                    return Err(OrbitError::SurfaceImpact {
                        body: central.id,
                        epoch,
                        altitude_km: central.altitude(&position_of(&y)),
                    });
                }
                other => other?,
            };
            recorder.steps += outcome.steps;

            let Some(step) = crossing else {
                return Ok(StateVector::from_state6(&outcome.y, end, central.id));
            };

            let (t, y) = self.bisect(central, origin, properties, &step, |t, y| {
                Ok(self.leaving_domain(central, origin, t, y)?.is_some())
            })?;
            let epoch = origin + Duration::from_seconds(t);
            let local_target = self
                .leaving_domain(central, origin, t, &y)?
                .unwrap_or(central.id);

            let (central_root, _) = self.ephemeris.state(central.id, epoch)?;
            let dominant = self
                .ephemeris
                .dominant_body(&(central_root + position_of(&y)), epoch)?;
            let target = if dominant == central.id { local_target } else { dominant };

            let (offset_r, offset_v) = self.ephemeris.relative_state(central.id, target, epoch)?;
            state = StateVector::new(
                position_of(&y) + offset_r,
                velocity_of(&y) + offset_v,
                epoch,
                target,
            );

            log::info!(
                "SOI transition {} -> {} at {}",
                central.name,
                self.ephemeris.require(target)?.name,
                epoch
            );
            recorder.transitions.push(SoiTransition {
                from_body: central.id,
                to_body: target,
                epoch,
            });
            recorder.record_always(TrajectorySample::from(&state));
        }
    }

    /// dy/dt for a state relative to `central`
    fn derivative(
        &self,
        central: &CelestialBody,
        origin: Epoch,
        t: f64,
        y: &Vector6<f64>,
        properties: &SpacecraftProperties,
    ) -> Result<Vector6<f64>> {
        let ctx = ForceContext {
            position: position_of(y),
            velocity: velocity_of(y),
            epoch: origin + Duration::from_seconds(t),
            central,
            ephemeris: self.ephemeris,
            spacecraft: properties,
        };
        let a = self.forces.total_acceleration(&ctx)?;
        Ok(Vector6::new(y[3], y[4], y[5], a.x, a.y, a.z))
    }

    /// [`derivative`](Self::derivative) that keeps going below the surface
    fn derivative_below_surface(
        &self,
        central: &CelestialBody,
        origin: Epoch,
        t: f64,
        y: &Vector6<f64>,
        properties: &SpacecraftProperties,
    ) -> Result<Vector6<f64>> {
        let ctx = ForceContext {
            position: position_of(y),
            velocity: velocity_of(y),
            epoch: origin + Duration::from_seconds(t),
            central,
            ephemeris: self.ephemeris,
            spacecraft: properties,
        };
        let a = self.forces.unchecked_acceleration(&ctx)?;
        Ok(Vector6::new(y[3], y[4], y[5], a.x, a.y, a.z))
    }

    /// Body whose SOI the state has moved into, if any
    ///
    /// Leaving the central sphere hands over to the parent; entering a
    /// child's sphere hands over to the child.
    fn leaving_domain(
        &self,
        central: &CelestialBody,
        origin: Epoch,
        t: f64,
        y: &Vector6<f64>,
    ) -> Result<Option<BodyId>> {
        let position = position_of(y);
        if let Some(parent) = central.parent {
            if position.norm() > central.soi_radius {
                return Ok(Some(parent));
            }
        }

        let epoch = origin + Duration::from_seconds(t);
        for child in self.ephemeris.children(central.id) {
            let (child_pos, _) = self.ephemeris.relative_state(child.id, central.id, epoch)?;
            if (position - child_pos).norm() < child.soi_radius {
                return Ok(Some(child.id));
            }
        }
        Ok(None)
    }

    /// First point inside `step` where `event` holds
    ///
    /// `event` is false at the start of the step and true at its end.
    /// Returns the time and state on the `true` side of the bracket.
    fn bisect<F>(
        &self,
        central: &CelestialBody,
        origin: Epoch,
        properties: &SpacecraftProperties,
        step: &StepResult,
        mut event: F,
    ) -> Result<(f64, Vector6<f64>)>
    where
        F: FnMut(f64, &Vector6<f64>) -> Result<bool>,
    {
        let mut rhs = |t: f64, y: &Vector6<f64>| self.derivative(central, origin, t, y, properties);
        let rhs: &mut Rhs<'_> = &mut rhs;

        let (mut lo, mut hi) = (step.t_start, step.t);
        let mut y_hi = step.y;
        for _ in 0..MAX_BISECTIONS {
            if (hi - lo).abs() < BISECTION_TOLERANCE_S {
                break;
            }
            let mid = 0.5 * (lo + hi);
            let y_mid = self
                .integrator
                .embedded_step(step.t_start, &step.y_start, mid - step.t_start, rhs)?
                .y;
            if event(mid, &y_mid)? {
                hi = mid;
                y_hi = y_mid;
            } else {
                lo = mid;
            }
        }
        Ok((hi, y_hi))
    }

    /// Time and state where the path from (t0, y0) first goes below ground
    ///
    /// `h` is the last accepted step; the step that failed was at most
    /// `max_growth` times longer. The window is walked in steps of `h` and
    /// the bracketing step bisected. `None` when the path stays above
    /// ground over the whole window.
    #[allow(clippy::too_many_arguments)]
    fn refine_impact(
        &self,
        central: &CelestialBody,
        origin: Epoch,
        properties: &SpacecraftProperties,
        t0: f64,
        y0: &Vector6<f64>,
        h: f64,
        remaining: f64,
    ) -> Result<Option<(f64, Vector6<f64>)>> {
        let settings = &self.options.integrator;
        let mut rhs =
            |t: f64, y: &Vector6<f64>| self.derivative_below_surface(central, origin, t, y, properties);
        let rhs: &mut Rhs<'_> = &mut rhs;
        let below = |y: &Vector6<f64>| central.altitude(&position_of(y)) < 0.0;

        let h = h.abs().max(settings.min_step).copysign(remaining);
        let span = (h.abs() * settings.max_growth)
            .min(settings.max_step)
            .min((remaining - t0).abs());

        let (mut lo, mut y_lo) = (t0, *y0);
        let mut bracket = None;
        let walks = (span / h.abs()).ceil().max(1.0) as usize;
        for k in 1..=walks {
            let t = t0 + (k as f64 * h.abs()).min(span).copysign(h);
            let y = self.integrator.embedded_step(lo, &y_lo, t - lo, rhs)?.y;
            if below(&y) {
                bracket = Some((t, y));
                break;
            }
            lo = t;
            y_lo = y;
        }
        let Some((mut hi, mut y_hi)) = bracket else {
            return Ok(None);
        };

        let (t_start, y_start) = (lo, y_lo);
        for _ in 0..MAX_BISECTIONS {
            if (hi - lo).abs() < BISECTION_TOLERANCE_S {
                break;
            }
            let mid = 0.5 * (lo + hi);
            let y_mid = self.integrator.embedded_step(t_start, &y_start, mid - t_start, rhs)?.y;
            if below(&y_mid) {
                hi = mid;
                y_hi = y_mid;
            } else {
                lo = mid;
            }
        }
        Ok(Some((hi, y_hi)))
    }
}

/// Propagate one satellite with a freshly built propagator
pub fn propagate(
    config: &SatelliteConfig,
    ephemeris: &dyn Ephemeris,
    duration: Duration,
    options: &PropagationOptions,
) -> Result<Trajectory> {
    Propagator::new(ephemeris, options.clone())?.propagate(config, duration)
}

fn position_of(y: &Vector6<f64>) -> Vector3<f64> {
    Vector3::new(y[0], y[1], y[2])
}

fn velocity_of(y: &Vector6<f64>) -> Vector3<f64> {
    Vector3::new(y[3], y[4], y[5])
}

/// Epoch of an accepted step; the last step lands on `end` exactly
fn sample_epoch(origin: Epoch, t: f64, remaining: f64, end: Epoch) -> Epoch {
    if t == remaining {
        end
    } else {
        origin + Duration::from_seconds(t)
    }
}
