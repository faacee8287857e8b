//! Cross-module behaviour of propagation, chains and transfers

use approx::assert_relative_eq;
use hifitime::Duration;

use orbit_planner::bodies::{catalog, BodySystem, CelestialBody, EARTH_GM, EARTH_RADIUS_KM};
use orbit_planner::propagation::{
    ImpulsiveBurn, Propagator, SatelliteConfig, SatelliteId, SpacecraftProperties,
};
use orbit_planner::{
    compute_hohmann_transfer, elements_to_state, next_apoapsis, propagate, propagate_many, recompute_chain,
    state_to_elements, ChainContext, LocalDeltaV, ManeuverChain, OrbitalElements, PropagationOptions,
    StateVector, TargetOrbit,
};

fn leo(altitude: f64, inclination_deg: f64) -> StateVector {
    let elements = OrbitalElements::circular(
        EARTH_RADIUS_KM + altitude,
        inclination_deg.to_radians(),
        0.3,
        0.0,
        EARTH_GM,
    );
    elements_to_state(&elements, &CelestialBody::earth(), catalog::default_epoch()).unwrap()
}

#[test]
fn perturbed_propagation_is_deterministic() {
    let system = BodySystem::solar_system().unwrap();
    let options = PropagationOptions::default();
    let configs: Vec<_> = (0..3)
        .map(|i| {
            SatelliteConfig::new(
                SatelliteId(i),
                SpacecraftProperties::default(),
                leo(350.0 + 50.0 * f64::from(i), 51.6),
            )
        })
        .collect();
    let duration = Duration::from_seconds(7_200.0);

    let first = propagate(&configs[1], &system, duration, &options).unwrap();
    let second = propagate(&configs[1], &system, duration, &options).unwrap();
    assert_eq!(first.samples, second.samples);
    assert_eq!(first.final_state, second.final_state);

    let batch = propagate_many(&configs, &system, duration, &options, None);
    let (id, parallel) = &batch[1];
    assert_eq!(*id, SatelliteId(1));
    assert_eq!(parallel.as_ref().unwrap().samples, first.samples);
}

#[test]
fn hohmann_burns_reach_the_target_orbit() {
    let system = BodySystem::earth_only();
    let options = PropagationOptions::two_body();
    let earth = CelestialBody::earth();
    let state = leo(200.0, 0.0);
    let target = TargetOrbit::circular(400.0, 0.0, 0.0);

    let transfer = compute_hohmann_transfer(&state, &earth, &target).unwrap();
    let r2 = EARTH_RADIUS_KM + 400.0;

    // Coasting after the first burn arrives at the target radius
    let config = SatelliteConfig::new(SatelliteId(1), SpacecraftProperties::default(), state.clone());
    let propagator = Propagator::new(&system, options.clone()).unwrap();
    let burn1 = ImpulsiveBurn::new(
        state.epoch + Duration::from_seconds(transfer.burn1.time_offset),
        transfer.burn1.local_delta_v,
    );
    let coast = propagator
        .propagate_with_maneuvers(&config, Duration::from_seconds(transfer.transfer_time), &[burn1], None)
        .unwrap();
    assert_relative_eq!(coast.final_state.radius(), r2, epsilon = 0.5);

    // The same two burns as a chain circularise there
    let ctx = ChainContext::new(&system, &options, SpacecraftProperties::default());
    let chain = ManeuverChain::new(SatelliteId(1));
    let chain = chain
        .add_node(&state, burn1.epoch, transfer.burn1.local_delta_v, &ctx)
        .unwrap()
        .chain;
    let chain = chain
        .add_node(
            &state,
            state.epoch + Duration::from_seconds(transfer.burn2.time_offset),
            transfer.burn2.local_delta_v,
            &ctx,
        )
        .unwrap()
        .chain;
    assert!(!chain.has_stale());

    let last = chain.nodes()[1].predicted.as_ref().unwrap();
    assert_relative_eq!(last.elements.semi_major_axis, r2, epsilon = 0.5);
    assert!(last.elements.eccentricity < 1e-4);
}

#[test]
fn chain_predictions_match_full_propagation() {
    let system = BodySystem::earth_only();
    let options = PropagationOptions::two_body();
    let ctx = ChainContext::new(&system, &options, SpacecraftProperties::default());
    let state = leo(500.0, 28.5);

    let times = [1_500.0, 4_200.0];
    let burns = [
        LocalDeltaV::from_m_per_s(20.0, 5.0, 0.0),
        LocalDeltaV::from_m_per_s(-10.0, 0.0, 3.0),
    ];

    let mut chain = ManeuverChain::new(SatelliteId(3));
    for (t, dv) in times.iter().zip(burns) {
        let time = state.epoch + Duration::from_seconds(*t);
        chain = chain.add_node(&state, time, dv, &ctx).unwrap().chain;
    }

    let config = SatelliteConfig::new(SatelliteId(3), SpacecraftProperties::default(), state.clone());
    let full = Propagator::new(&system, options.clone())
        .unwrap()
        .propagate_with_maneuvers(&config, Duration::from_seconds(6_000.0), &chain.burns(), None)
        .unwrap();

    for node in chain.nodes() {
        let predicted = node.predicted.as_ref().unwrap();
        // Last sample at the burn epoch is the post-burn one
        let sample = full
            .samples
            .iter()
            .filter(|s| s.epoch == node.execution_time)
            .last()
            .unwrap();
        assert_relative_eq!(
            (sample.position - predicted.post_burn_state.position).norm(),
            0.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            (sample.velocity - predicted.post_burn_state.velocity).norm(),
            0.0,
            epsilon = 1e-9
        );
    }

    // Recomputing from scratch reproduces the committed chain
    let again = recompute_chain(&chain, &state, &ctx);
    assert!(again.failures().next().is_none());
    assert_eq!(again.chain, chain);
}

#[test]
fn apoapsis_of_raised_orbit_follows_the_burn() {
    let system = BodySystem::earth_only();
    let options = PropagationOptions::two_body();
    let ctx = ChainContext::new(&system, &options, SpacecraftProperties::default());
    let earth = CelestialBody::earth();
    let state = leo(300.0, 10.0);

    let burn_time = state.epoch + Duration::from_seconds(600.0);
    let chain = ManeuverChain::new(SatelliteId(9))
        .add_node(&state, burn_time, LocalDeltaV::prograde(0.05), &ctx)
        .unwrap()
        .chain;
    let post = &chain.nodes()[0].predicted.as_ref().unwrap().post_burn_state;

    // A prograde kick makes the burn point the periapsis, so apoapsis is half an orbit on
    let elements = state_to_elements(post, &earth).unwrap();
    let apoapsis = next_apoapsis(post, &earth, post.epoch).unwrap();
    assert_relative_eq!(
        (apoapsis - post.epoch).to_seconds(),
        elements.period / 2.0,
        epsilon = 1.0
    );
}
