//! Bundled solar-system catalog
//!
//! Physical constants and canonical orbits for the Sun, the planets, Pluto
//! and their larger moons. Orbits are J2000 mean elements in the ecliptic
//! frame relative to the parent body. Moons orbit their planet directly:
//! planet-system barycenters are folded into the planet, which carries the
//! barycenter's heliocentric orbit. Spheres of influence come from the
//! Laplace formula, floored at [`MIN_SOI_RADII`] body radii so that the
//! smallest moons still have room for a surface-relative frame.
//!
//! Spin axes are the axial tilt applied about the ecliptic X axis. The
//! equinox direction of each body is not modelled.

use hifitime::Epoch;
use nalgebra::{Rotation3, Unit, Vector3};

use super::{laplace_soi, BodyId, BodyMotion, CanonicalOrbit, CelestialBody};
use crate::propagation::atmosphere::Exponential;

pub const SUN: BodyId = BodyId(10);
pub const MERCURY: BodyId = BodyId(199);
pub const VENUS: BodyId = BodyId(299);
pub const EARTH: BodyId = BodyId(399);
pub const MOON: BodyId = BodyId(301);
pub const MARS: BodyId = BodyId(499);
pub const PHOBOS: BodyId = BodyId(401);
pub const DEIMOS: BodyId = BodyId(402);
pub const JUPITER: BodyId = BodyId(599);
pub const IO: BodyId = BodyId(501);
pub const EUROPA: BodyId = BodyId(502);
pub const GANYMEDE: BodyId = BodyId(503);
pub const CALLISTO: BodyId = BodyId(504);
pub const SATURN: BodyId = BodyId(699);
pub const MIMAS: BodyId = BodyId(601);
pub const ENCELADUS: BodyId = BodyId(602);
pub const TETHYS: BodyId = BodyId(603);
pub const DIONE: BodyId = BodyId(604);
pub const RHEA: BodyId = BodyId(605);
pub const TITAN: BodyId = BodyId(606);
pub const IAPETUS: BodyId = BodyId(608);
pub const URANUS: BodyId = BodyId(799);
pub const ARIEL: BodyId = BodyId(701);
pub const UMBRIEL: BodyId = BodyId(702);
pub const TITANIA: BodyId = BodyId(703);
pub const OBERON: BodyId = BodyId(704);
pub const MIRANDA: BodyId = BodyId(705);
pub const NEPTUNE: BodyId = BodyId(899);
pub const TRITON: BodyId = BodyId(801);
pub const PROTEUS: BodyId = BodyId(802);
pub const NEREID: BodyId = BodyId(803);
pub const PLUTO: BodyId = BodyId(999);
pub const CHARON: BodyId = BodyId(901);
pub const NIX: BodyId = BodyId(902);
pub const HYDRA: BodyId = BodyId(903);
pub const KERBEROS: BodyId = BodyId(904);
pub const STYX: BodyId = BodyId(905);

/// Smallest sphere of influence, in body radii
pub const MIN_SOI_RADII: f64 = 2.0;

/// Default simulation start, 2025-05-11T00:00:00 UTC
pub fn default_epoch() -> Epoch {
    Epoch::from_gregorian_utc_hms(2025, 5, 11, 0, 0, 0)
}

/// Reference epoch of the canonical elements
pub fn j2000() -> Epoch {
    Epoch::from_gregorian_utc_hms(2000, 1, 1, 12, 0, 0)
}

struct Record {
    id: BodyId,
    name: &'static str,
    parent: Option<BodyId>,
    gm: f64,
    radius: f64,
    j2: f64,
    /// Sidereal rotation period in hours
    rotation_hours: f64,
    axial_tilt_deg: f64,
    /// a (km), e, i, Ω, ω, M0 (deg)
    orbit: Option<[f64; 6]>,
}

#[rustfmt::skip]
const RECORDS: &[Record] = &[
    Record { id: SUN, name: "Sun", parent: None, gm: 132_712_440_041.939_4, radius: 695_700.0, j2: 2.2e-7, rotation_hours: 609.12, axial_tilt_deg: 7.25, orbit: None },
    Record { id: MERCURY, name: "Mercury", parent: Some(SUN), gm: 22_031.868_55, radius: 2_439.7, j2: 6.0e-5, rotation_hours: 1_407.6, axial_tilt_deg: 0.034,
        orbit: Some([57_909_050.0, 0.2056, 7.005, 48.331, 29.124, 174.796]) },
    Record { id: VENUS, name: "Venus", parent: Some(SUN), gm: 324_858.592, radius: 6_051.8, j2: 4.458e-6, rotation_hours: 5_832.5, axial_tilt_deg: 177.36,
        orbit: Some([108_208_000.0, 0.0067, 3.3947, 76.68, 54.884, 50.416]) },
    Record { id: EARTH, name: "Earth", parent: Some(SUN), gm: 398_600.435_507, radius: 6_378.136_6, j2: 1.082_626_68e-3, rotation_hours: 23.934_47, axial_tilt_deg: 23.439_281,
        orbit: Some([149_598_023.0, 0.0167, 0.0, -11.260_64, 114.207_83, 358.617]) },
    Record { id: MOON, name: "Moon", parent: Some(EARTH), gm: 4_902.800_066, radius: 1_737.4, j2: 2.032e-4, rotation_hours: 655.72, axial_tilt_deg: 6.68,
        orbit: Some([384_400.0, 0.0549, 5.145, 125.08, 318.15, 115.3654]) },
    Record { id: MARS, name: "Mars", parent: Some(SUN), gm: 42_828.375_214, radius: 3_396.19, j2: 1.960_45e-3, rotation_hours: 24.622_9, axial_tilt_deg: 25.19,
        orbit: Some([227_939_200.0, 0.0935, 1.85, 49.558, 286.502, 19.373]) },
    Record { id: PHOBOS, name: "Phobos", parent: Some(MARS), gm: 7.112e-4, radius: 11.2667, j2: 0.0, rotation_hours: 7.653_8, axial_tilt_deg: 0.0,
        orbit: Some([9_376.0, 0.0151, 1.075, 49.2, 150.057, 177.4]) },
    Record { id: DEIMOS, name: "Deimos", parent: Some(MARS), gm: 9.85e-5, radius: 6.2, j2: 0.0, rotation_hours: 30.312, axial_tilt_deg: 0.0,
        orbit: Some([23_463.2, 0.00033, 1.788, 316.65, 260.729, 53.2]) },
    Record { id: JUPITER, name: "Jupiter", parent: Some(SUN), gm: 126_686_531.9, radius: 71_492.0, j2: 0.014_696, rotation_hours: 9.925, axial_tilt_deg: 3.13,
        orbit: Some([778_570_000.0, 0.0489, 1.303, 100.464, 273.867, 20.02]) },
    Record { id: IO, name: "Io", parent: Some(JUPITER), gm: 5_959.9, radius: 1_821.6, j2: 0.0, rotation_hours: 42.459, axial_tilt_deg: 0.0,
        orbit: Some([421_700.0, 0.0041, 0.036, 43.977, 84.129, 171.016]) },
    Record { id: EUROPA, name: "Europa", parent: Some(JUPITER), gm: 3_202.7, radius: 1_560.8, j2: 0.0, rotation_hours: 85.228, axial_tilt_deg: 0.0,
        orbit: Some([671_034.0, 0.009, 0.465, 219.106, 88.97, 29.298]) },
    Record { id: GANYMEDE, name: "Ganymede", parent: Some(JUPITER), gm: 9_887.8, radius: 2_634.1, j2: 0.0, rotation_hours: 171.709, axial_tilt_deg: 0.0,
        orbit: Some([1_070_412.0, 0.0013, 0.177, 63.552, 192.417, 192.417]) },
    Record { id: CALLISTO, name: "Callisto", parent: Some(JUPITER), gm: 7_179.3, radius: 2_410.3, j2: 0.0, rotation_hours: 400.536, axial_tilt_deg: 0.0,
        orbit: Some([1_882_709.0, 0.007, 0.192, 298.848, 52.643, 52.643]) },
    Record { id: SATURN, name: "Saturn", parent: Some(SUN), gm: 37_931_207.8, radius: 60_268.0, j2: 0.016_298, rotation_hours: 10.656, axial_tilt_deg: 26.73,
        orbit: Some([1_433_530_000.0, 0.0565, 2.485, 113.665, 339.392, 317.02]) },
    Record { id: MIMAS, name: "Mimas", parent: Some(SATURN), gm: 2.502, radius: 198.2, j2: 0.0, rotation_hours: 22.618, axial_tilt_deg: 0.0,
        orbit: Some([185_539.0, 0.0196, 1.574, 66.2, 160.4, 275.3]) },
    Record { id: ENCELADUS, name: "Enceladus", parent: Some(SATURN), gm: 7.21, radius: 252.1, j2: 0.0, rotation_hours: 32.885, axial_tilt_deg: 0.0,
        orbit: Some([238_042.0, 0.0047, 0.009, 0.0, 119.5, 57.0]) },
    Record { id: TETHYS, name: "Tethys", parent: Some(SATURN), gm: 41.21, radius: 531.1, j2: 0.0, rotation_hours: 45.307, axial_tilt_deg: 0.0,
        orbit: Some([294_672.0, 0.0001, 1.091, 273.0, 335.3, 0.0]) },
    Record { id: DIONE, name: "Dione", parent: Some(SATURN), gm: 73.116, radius: 561.4, j2: 0.0, rotation_hours: 65.687, axial_tilt_deg: 0.0,
        orbit: Some([377_415.0, 0.0022, 0.028, 0.0, 116.0, 212.0]) },
    Record { id: RHEA, name: "Rhea", parent: Some(SATURN), gm: 153.94, radius: 763.8, j2: 0.0, rotation_hours: 108.42, axial_tilt_deg: 0.0,
        orbit: Some([527_108.0, 0.001, 0.345, 133.7, 44.3, 31.5]) },
    Record { id: TITAN, name: "Titan", parent: Some(SATURN), gm: 8_978.1, radius: 2_574.7, j2: 0.0, rotation_hours: 382.68, axial_tilt_deg: 0.0,
        orbit: Some([1_221_870.0, 0.0288, 0.348_54, 78.6, 78.3, 11.7]) },
    Record { id: IAPETUS, name: "Iapetus", parent: Some(SATURN), gm: 120.5, radius: 734.5, j2: 0.0, rotation_hours: 1_903.94, axial_tilt_deg: 0.0,
        orbit: Some([3_560_820.0, 0.0283, 15.47, 86.5, 254.5, 74.8]) },
    Record { id: URANUS, name: "Uranus", parent: Some(SUN), gm: 5_793_951.3, radius: 25_559.0, j2: 0.003_343, rotation_hours: 17.24, axial_tilt_deg: 97.77,
        orbit: Some([2_875_040_000.0, 0.0463, 0.773, 74.006, 96.998, 142.2386]) },
    Record { id: ARIEL, name: "Ariel", parent: Some(URANUS), gm: 86.0, radius: 578.9, j2: 0.0, rotation_hours: 60.489, axial_tilt_deg: 0.0,
        orbit: Some([190_900.0, 0.001, 0.0, 0.0, 83.3, 119.8]) },
    Record { id: UMBRIEL, name: "Umbriel", parent: Some(URANUS), gm: 81.5, radius: 584.7, j2: 0.0, rotation_hours: 99.46, axial_tilt_deg: 0.0,
        orbit: Some([266_000.0, 0.004, 0.1, 195.5, 157.5, 258.3]) },
    Record { id: TITANIA, name: "Titania", parent: Some(URANUS), gm: 228.2, radius: 788.9, j2: 0.0, rotation_hours: 208.94, axial_tilt_deg: 0.0,
        orbit: Some([436_300.0, 0.001, 0.1, 26.4, 202.0, 53.2]) },
    Record { id: OBERON, name: "Oberon", parent: Some(URANUS), gm: 192.4, radius: 761.4, j2: 0.0, rotation_hours: 323.118, axial_tilt_deg: 0.0,
        orbit: Some([583_400.0, 0.001, 0.1, 30.5, 182.4, 139.7]) },
    Record { id: MIRANDA, name: "Miranda", parent: Some(URANUS), gm: 4.4, radius: 235.8, j2: 0.0, rotation_hours: 33.923, axial_tilt_deg: 0.0,
        orbit: Some([129_900.0, 0.001, 4.4, 100.7, 155.6, 72.4]) },
    Record { id: NEPTUNE, name: "Neptune", parent: Some(SUN), gm: 6_835_103.1, radius: 24_764.0, j2: 0.003_411, rotation_hours: 16.11, axial_tilt_deg: 28.32,
        orbit: Some([4_504_450_000.0, 0.0097, 1.77, 131.784, 273.187, 256.228]) },
    Record { id: TRITON, name: "Triton", parent: Some(NEPTUNE), gm: 1_427.6, radius: 1_353.4, j2: 0.0, rotation_hours: 141.045, axial_tilt_deg: 0.0,
        orbit: Some([354_800.0, 0.0, 157.3, 178.1, 0.0, 63.0]) },
    Record { id: PROTEUS, name: "Proteus", parent: Some(NEPTUNE), gm: 0.105, radius: 210.0, j2: 0.0, rotation_hours: 26.935, axial_tilt_deg: 0.0,
        orbit: Some([117_600.0, 0.0, 0.0, 0.0, 0.0, 276.8]) },
    Record { id: NEREID, name: "Nereid", parent: Some(NEPTUNE), gm: 0.021, radius: 170.0, j2: 0.0, rotation_hours: 7.066, axial_tilt_deg: 0.0,
        orbit: Some([5_513_900.0, 0.751, 5.1, 319.5, 296.8, 318.5]) },
    Record { id: PLUTO, name: "Pluto", parent: Some(SUN), gm: 869.613_817, radius: 1_188.3, j2: 0.0, rotation_hours: 153.293, axial_tilt_deg: 122.53,
        orbit: Some([5_906_440_628.0, 0.2488, 17.16, 110.299, 113.834, 14.53]) },
    Record { id: CHARON, name: "Charon", parent: Some(PLUTO), gm: 101.4, radius: 606.0, j2: 0.0, rotation_hours: 153.293, axial_tilt_deg: 0.0,
        orbit: Some([19_591.4, 0.0, 96.145, 223.046, 0.0, 0.0]) },
    Record { id: NIX, name: "Nix", parent: Some(PLUTO), gm: 0.003, radius: 25.0, j2: 0.0, rotation_hours: 596.6, axial_tilt_deg: 0.0,
        orbit: Some([48_694.0, 0.002, 96.2, 223.1, 0.0, 0.0]) },
    Record { id: HYDRA, name: "Hydra", parent: Some(PLUTO), gm: 0.005, radius: 32.5, j2: 0.0, rotation_hours: 916.8, axial_tilt_deg: 0.0,
        orbit: Some([64_738.0, 0.005, 96.4, 223.2, 0.0, 0.0]) },
    Record { id: KERBEROS, name: "Kerberos", parent: Some(PLUTO), gm: 0.001, radius: 12.0, j2: 0.0, rotation_hours: 772.1, axial_tilt_deg: 0.0,
        orbit: Some([57_783.0, 0.003, 96.3, 223.15, 0.0, 0.0]) },
    Record { id: STYX, name: "Styx", parent: Some(PLUTO), gm: 0.0005, radius: 8.0, j2: 0.0, rotation_hours: 483.8, axial_tilt_deg: 0.0,
        orbit: Some([42_656.0, 0.005, 96.1, 223.0, 0.0, 0.0]) },
];

fn atmosphere_for(id: BodyId) -> Option<Exponential> {
    match id {
        EARTH => Some(Exponential::standard()),
        VENUS => Some(Exponential::new(65.0, 15.9, 250.0)),
        MARS => Some(Exponential::new(0.020, 11.1, 300.0)),
        TITAN => Some(Exponential::new(5.3, 40.0, 600.0)),
        _ => None,
    }
}

fn pole_from_tilt(tilt_deg: f64) -> Unit<Vector3<f64>> {
    let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), -tilt_deg.to_radians());
    Unit::new_normalize(tilt * Vector3::z())
}

fn gm_of(id: BodyId) -> f64 {
    RECORDS
        .iter()
        .find(|r| r.id == id)
        .map_or(f64::NAN, |r| r.gm)
}

/// Build the full catalog, root first
pub fn solar_system() -> Vec<CelestialBody> {
    let reference = j2000();

    RECORDS
        .iter()
        .map(|record| {
            let (motion, soi_radius) = match (record.orbit, record.parent) {
                (Some([a, e, i, raan, argp, m0]), Some(parent)) => {
                    let orbit = CanonicalOrbit {
                        semi_major_axis: a,
                        eccentricity: e,
                        inclination: i.to_radians(),
                        raan: raan.to_radians(),
                        argument_of_periapsis: argp.to_radians(),
                        mean_anomaly_at_epoch: m0.to_radians(),
                        epoch: reference,
                    };
                    (
                        BodyMotion::Keplerian(orbit),
                        laplace_soi(a, record.gm, gm_of(parent))
                            .max(MIN_SOI_RADII * record.radius),
                    )
                }
                _ => (BodyMotion::Fixed, f64::INFINITY),
            };

            CelestialBody {
                id: record.id,
                name: record.name.to_string(),
                gm: record.gm,
                radius: record.radius,
                j2: record.j2,
                soi_radius,
                parent: record.parent,
                rotation_rate: std::f64::consts::TAU / (record.rotation_hours * 3600.0),
                pole: pole_from_tilt(record.axial_tilt_deg),
                atmosphere: atmosphere_for(record.id),
                motion,
            }
        })
        .collect()
}
