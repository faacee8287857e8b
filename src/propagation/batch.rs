//! Parallel propagation of independent satellites

use hifitime::Duration;
use rayon::prelude::*;

use super::cancel::CancellationToken;
use super::propagator::{Propagator, Trajectory};
use super::settings::PropagationOptions;
use super::state::{SatelliteConfig, SatelliteId};
use crate::bodies::Ephemeris;
use crate::error::Result;

/// Propagate every satellite over the same span
///
/// Each task builds its own propagator; the ephemeris is shared read-only.
/// Results keep the input order and failures stay per satellite.
pub fn propagate_many(
    configs: &[SatelliteConfig],
    ephemeris: &dyn Ephemeris,
    duration: Duration,
    options: &PropagationOptions,
    cancel: Option<&CancellationToken>,
) -> Vec<(SatelliteId, Result<Trajectory>)> {
    log::info!("Propagating {} satellites in parallel", configs.len());

    configs
        .par_iter()
        .map(|config| {
            let result = Propagator::new(ephemeris, options.clone()).and_then(|propagator| {
                propagator.propagate_with_maneuvers(config, duration, &[], cancel)
            });
            if let Err(e) = &result {
                log::warn!("{} failed: {}", config.id, e);
            }
            (config.id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::{elements_to_state, OrbitalElements};
    use crate::bodies::{catalog, BodySystem, CelestialBody, EARTH_GM, EARTH_RADIUS_KM};
    use crate::error::OrbitError;
    use crate::propagation::state::SpacecraftProperties;

    fn constellation(count: u32) -> Vec<SatelliteConfig> {
        let earth = CelestialBody::earth();
        (0..count)
            .map(|i| {
                let elements = OrbitalElements::circular(
                    EARTH_RADIUS_KM + 400.0 + 50.0 * f64::from(i),
                    (30.0 + 5.0 * f64::from(i)).to_radians(),
                    0.1 * f64::from(i),
                    0.0,
                    EARTH_GM,
                );
                let initial = elements_to_state(&elements, &earth, catalog::default_epoch()).unwrap();
                SatelliteConfig::new(SatelliteId(i), SpacecraftProperties::default(), initial)
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let system = BodySystem::earth_only();
        let configs = constellation(6);
        let options = PropagationOptions::default();
        let duration = Duration::from_seconds(3_000.0);

        let parallel = propagate_many(&configs, &system, duration, &options, None);
        assert_eq!(parallel.len(), configs.len());

        let propagator = Propagator::new(&system, options).unwrap();
        for (config, (id, result)) in configs.iter().zip(&parallel) {
            assert_eq!(*id, config.id);
            let sequential = propagator.propagate(config, duration).unwrap();
            let trajectory = result.as_ref().unwrap();
            assert_eq!(trajectory.final_state, sequential.final_state);
            assert_eq!(trajectory.samples, sequential.samples);
        }
    }

    #[test]
    fn test_failures_are_isolated() {
        let system = BodySystem::earth_only();
        let mut configs = constellation(3);
        configs[1].properties.mass_kg = -1.0;

        let results = propagate_many(
            &configs,
            &system,
            Duration::from_seconds(600.0),
            &PropagationOptions::two_body(),
            None,
        );
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(OrbitError::InvalidConfiguration(_))));
        assert!(results[2].1.is_ok());
    }

    #[test]
    fn test_cancel_stops_every_task() {
        let system = BodySystem::earth_only();
        let configs = constellation(4);
        let token = CancellationToken::new();
        token.cancel();

        let results = propagate_many(
            &configs,
            &system,
            Duration::from_seconds(600.0),
            &PropagationOptions::two_body(),
            Some(&token),
        );
        assert!(results
            .iter()
            .all(|(_, r)| matches!(r, Err(OrbitError::Cancelled))));
    }
}
