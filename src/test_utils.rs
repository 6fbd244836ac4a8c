use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub use crate::ics::DEFAULT_SEED;
use crate::ics::sample_plummer;
use crate::snapshot::Snapshot;
use crate::snapshot::SnapshotAttrs;

pub fn assert_float_is_close(x: f64, y: f64) {
    assert!((x - y).abs() < 10.0 * f64::EPSILON, "{} {}", x, y)
}

pub fn assert_float_is_close_relative(x: f64, y: f64) {
    assert!(((x - y) / y).abs() < 1e-10, "{} {}", x, y)
}

/// The cosmology every unit test runs in: z = 0, h = 0.7 and a
/// particle mass of 10^10 M_sun / h.
pub const TEST_PMASS_ATTR: f64 = 1.0;
pub const TEST_LITTLE_H: f64 = 0.7;

pub fn test_snapshot(positions: Vec<DVec3>, velocities: Vec<DVec3>, boxsize: f64) -> Snapshot {
    let npart = positions.len();
    Snapshot::new(
        positions,
        velocities,
        SnapshotAttrs {
            mean_sep: boxsize / (npart as f64).powf(1.0 / 3.0),
            boxsize,
            npart,
            redshift: 0.0,
            pmass: TEST_PMASS_ATTR,
            little_h: TEST_LITTLE_H,
        },
    )
    .unwrap()
}

/// A virialised Plummer sphere in the test cosmology, seeded from its
/// own geometry so that distinct blobs in one test get distinct
/// samples.
pub fn plummer_sphere(
    npart: usize,
    centre: DVec3,
    scale_radius: f64,
    bulk_velocity: DVec3,
) -> (Vec<DVec3>, Vec<DVec3>) {
    let seed = DEFAULT_SEED
        ^ npart as u64
        ^ centre.x.to_bits()
        ^ centre.y.to_bits().rotate_left(1)
        ^ bulk_velocity.x.to_bits().rotate_left(2);
    let mut rng = StdRng::seed_from_u64(seed);
    let pmass = TEST_PMASS_ATTR * 1e10 / TEST_LITTLE_H;
    sample_plummer(
        &mut rng,
        npart,
        centre,
        scale_radius,
        bulk_velocity,
        pmass,
        0.0,
        TEST_LITTLE_H,
    )
}
