use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use hifitime::{Duration, Epoch};
use serde::Serialize;

use orbit_planner::astro::OrbitalElements;
use orbit_planner::bodies::{catalog, BodySystem, CelestialBody, Ephemeris};
use orbit_planner::propagation::{
    ForceFlags, PropagationOptions, SatelliteConfig, SatelliteId, SpacecraftProperties, StateVector,
};
use orbit_planner::{
    compute_hohmann_transfer, elements_to_state, next_apoapsis, next_periapsis, propagate, state_to_elements,
    HohmannResult, TargetOrbit,
};

#[derive(Args, Debug, Clone)]
pub struct PropagateArgs {
    /// Circular orbit altitude in kilometers
    #[arg(long, default_value_t = 400.0)]
    pub altitude: f64,
    /// Inclination in degrees
    #[arg(long, default_value_t = 51.6)]
    pub inclination: f64,
    /// Time span in hours
    #[arg(long, default_value_t = 24.0)]
    pub hours: f64,
    /// Include the J2 oblateness term
    #[arg(long)]
    pub j2: bool,
    /// Include atmospheric drag
    #[arg(long)]
    pub drag: bool,
    /// Include Sun and Moon perturbations
    #[arg(long)]
    pub third_body: bool,
    /// Minimum spacing between output samples in seconds
    #[arg(long, default_value_t = 60.0)]
    pub sample_seconds: f64,
    /// Output JSON file path
    #[arg(long, default_value = "out/trajectory.json")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct HohmannArgs {
    /// Current circular orbit altitude in kilometers
    #[arg(long, default_value_t = 200.0)]
    pub altitude: f64,
    /// Current inclination in degrees
    #[arg(long, default_value_t = 0.0)]
    pub inclination: f64,
    /// Target periapsis altitude in kilometers
    #[arg(long)]
    pub target_periapsis: f64,
    /// Target apoapsis altitude in kilometers
    #[arg(long)]
    pub target_apoapsis: f64,
    /// Target inclination in degrees, defaults to the current one
    #[arg(long)]
    pub target_inclination: Option<f64>,
    /// Write JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ApsisArgs {
    /// Periapsis altitude in kilometers
    #[arg(long, default_value_t = 400.0)]
    pub altitude: f64,
    #[arg(long, default_value_t = 0.1)]
    pub eccentricity: f64,
    /// Current true anomaly in degrees
    #[arg(long, default_value_t = 90.0)]
    pub true_anomaly: f64,
    /// Write JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BodiesArgs {
    /// Write JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SampleRecord {
    time_s: f64,
    central_body: i32,
    position_km: [f64; 3],
    velocity_kms: [f64; 3],
    altitude_km: f64,
}

#[derive(Debug, Serialize)]
struct TransitionRecord {
    from_body: i32,
    to_body: i32,
    epoch_utc: String,
}

#[derive(Debug, Serialize)]
struct TrajectoryReport {
    start_time_utc: String,
    end_time_utc: String,
    hours: f64,
    forces: ForceFlags,
    steps_taken: usize,
    atmospheric_entry_utc: Option<String>,
    transitions: Vec<TransitionRecord>,
    final_elements: Option<OrbitalElements>,
    samples: Vec<SampleRecord>,
}

#[derive(Debug, Serialize)]
struct HohmannReport {
    initial_altitude_km: f64,
    target: TargetOrbit,
    total_delta_v_ms: f64,
    transfer_time_s: f64,
    transfer: HohmannResult,
}

#[derive(Debug, Serialize)]
struct ApsisReport {
    epoch_utc: String,
    period_s: f64,
    next_periapsis_utc: Option<String>,
    next_apoapsis_utc: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BodyRecord {
    id: i32,
    name: String,
    parent: Option<i32>,
    gm_km3_s2: f64,
    radius_km: f64,
    j2: f64,
    /// None for the root body
    soi_radius_km: Option<f64>,
    has_atmosphere: bool,
}

pub fn run_propagate(args: PropagateArgs) -> Result<()> {
    if !(args.hours.is_finite() && args.hours > 0.0) {
        return Err(anyhow!("hours must be > 0"));
    }

    let forces = ForceFlags {
        include_j2: args.j2,
        include_drag: args.drag,
        include_third_body: args.third_body,
    };
    let system = if args.third_body {
        BodySystem::solar_system().context("building solar system")?
    } else {
        BodySystem::earth_only()
    };
    let earth = system.require(catalog::EARTH)?;
    let epoch = catalog::default_epoch();
    let initial = circular_state(earth, args.altitude, args.inclination, epoch)?;

    let options = PropagationOptions::default()
        .with_forces(forces)
        .with_sample_interval(args.sample_seconds);
    let config = SatelliteConfig::new(SatelliteId(1), SpacecraftProperties::default(), initial);

    log::info!(
        "Propagating {:.1} km x {:.1} deg orbit for {} hours...",
        args.altitude,
        args.inclination,
        args.hours
    );
    let trajectory = propagate(&config, &system, Duration::from_seconds(args.hours * 3600.0), &options)
        .context("propagation failed")?;

    let samples = trajectory
        .samples
        .iter()
        .map(|s| {
            let altitude_km = system
                .body(s.central_body)
                .map_or(f64::NAN, |b| b.altitude(&s.position));
            SampleRecord {
                time_s: (s.epoch - epoch).to_seconds(),
                central_body: s.central_body.0,
                position_km: [s.position.x, s.position.y, s.position.z],
                velocity_kms: [s.velocity.x, s.velocity.y, s.velocity.z],
                altitude_km,
            }
        })
        .collect();

    let final_state = &trajectory.final_state;
    let final_elements = system
        .body(final_state.central_body)
        .and_then(|body| state_to_elements(final_state, body).ok());

    let report = TrajectoryReport {
        start_time_utc: trajectory.start_epoch().unwrap_or(epoch).to_string(),
        end_time_utc: trajectory.end_epoch().to_string(),
        hours: args.hours,
        forces,
        steps_taken: trajectory.steps_taken,
        atmospheric_entry_utc: trajectory.atmospheric_entry.map(|e| e.to_string()),
        transitions: trajectory
            .transitions
            .iter()
            .map(|t| TransitionRecord {
                from_body: t.from_body.0,
                to_body: t.to_body.0,
                epoch_utc: t.epoch.to_string(),
            })
            .collect(),
        final_elements,
        samples,
    };

    write_json(Some(&args.output), &report)?;
    log::info!("Wrote {} samples to {:?}", report.samples.len(), args.output);
    Ok(())
}

pub fn run_hohmann(args: HohmannArgs) -> Result<()> {
    let earth = CelestialBody::earth();
    let state = circular_state(&earth, args.altitude, args.inclination, catalog::default_epoch())?;
    let target = TargetOrbit {
        periapsis_altitude: args.target_periapsis,
        apoapsis_altitude: args.target_apoapsis,
        inclination: args.target_inclination.unwrap_or(args.inclination).to_radians(),
        raan: 0.0,
        argument_of_periapsis: 0.0,
    };

    let transfer = compute_hohmann_transfer(&state, &earth, &target)?;
    log::info!(
        "Transfer needs {:.2} m/s over {:.0} s",
        transfer.total_delta_v * 1000.0,
        transfer.transfer_time
    );

    let report = HohmannReport {
        initial_altitude_km: args.altitude,
        target,
        total_delta_v_ms: transfer.total_delta_v * 1000.0,
        transfer_time_s: transfer.transfer_time,
        transfer,
    };
    write_json(args.output.as_deref(), &report)
}

pub fn run_apsis(args: ApsisArgs) -> Result<()> {
    if !(0.0..1.0).contains(&args.eccentricity) {
        return Err(anyhow!("eccentricity must be in [0, 1)"));
    }
    let earth = CelestialBody::earth();
    let epoch = catalog::default_epoch();
    let rp = earth.radius + args.altitude;
    let a = rp / (1.0 - args.eccentricity);
    let elements = OrbitalElements {
        semi_major_axis: a,
        eccentricity: args.eccentricity,
        inclination: 0.0,
        raan: 0.0,
        argument_of_periapsis: 0.0,
        true_anomaly: args.true_anomaly.to_radians(),
        period: earth.period(a),
    };
    let state = elements_to_state(&elements, &earth, epoch)?;

    let periapsis = next_periapsis(&state, &earth, epoch);
    let apoapsis = next_apoapsis(&state, &earth, epoch);
    let error = periapsis
        .as_ref()
        .err()
        .or(apoapsis.as_ref().err())
        .map(|e| e.to_string());

    let report = ApsisReport {
        epoch_utc: epoch.to_string(),
        period_s: elements.period,
        next_periapsis_utc: periapsis.ok().map(|e| e.to_string()),
        next_apoapsis_utc: apoapsis.ok().map(|e| e.to_string()),
        error,
    };
    write_json(args.output.as_deref(), &report)
}

pub fn run_bodies(args: BodiesArgs) -> Result<()> {
    let system = BodySystem::solar_system()?;
    let records: Vec<BodyRecord> = system
        .bodies()
        .iter()
        .map(|b| BodyRecord {
            id: b.id.0,
            name: b.name.clone(),
            parent: b.parent.map(|p| p.0),
            gm_km3_s2: b.gm,
            radius_km: b.radius,
            j2: b.j2,
            soi_radius_km: b.soi_radius.is_finite().then_some(b.soi_radius),
            has_atmosphere: b.atmosphere.is_some(),
        })
        .collect();
    write_json(args.output.as_deref(), &records)
}

fn circular_state(body: &CelestialBody, altitude: f64, inclination_deg: f64, epoch: Epoch) -> Result<StateVector> {
    if !(altitude.is_finite() && altitude >= 0.0) {
        return Err(anyhow!("altitude must be >= 0"));
    }
    let elements = OrbitalElements::circular(body.radius + altitude, inclination_deg.to_radians(), 0.0, 0.0, body.gm);
    Ok(elements_to_state(&elements, body, epoch)?)
}

fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path).with_context(|| format!("creating {:?}", path))?;
            serde_json::to_writer_pretty(file, value)?;
        }
        None => {
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), value)?;
            println!();
        }
    }
    Ok(())
}
