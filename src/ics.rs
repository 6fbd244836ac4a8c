//! Synthetic initial conditions: a uniform background with virialised
//! Plummer spheres dropped in. The binary runs the finder over these;
//! real snapshot ingestion is the job of an external collaborator.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Deserialize;
use serde::Serialize;

use crate::energy::halo_energy;
use crate::energy::EnergyMethod;
use crate::snapshot::Snapshot;
use crate::snapshot::SnapshotAttrs;
use crate::snapshot::SnapshotError;
use crate::units::SOLAR_MASSES_PER_MASS_UNIT;

pub const DEFAULT_SEED: u64 = 123;

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// One Plummer sphere to inject.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlobParameters {
    pub npart: usize,
    /// Centre in Mpc.
    pub centre: [f64; 3],
    /// Plummer scale radius in Mpc.
    pub scale_radius: f64,
    /// Bulk velocity in km/s.
    #[serde(default)]
    pub bulk_velocity: [f64; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IcsParameters {
    /// Box side length in Mpc.
    pub boxsize: f64,
    #[serde(default)]
    pub redshift: f64,
    /// Particle mass in 10^10 M_sun / h.
    pub pmass: f64,
    pub little_h: f64,
    /// Uniformly distributed unclustered particles.
    #[serde(default)]
    pub background_parts: usize,
    #[serde(default)]
    pub blobs: Vec<BlobParameters>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl IcsParameters {
    pub fn npart(&self) -> usize {
        self.background_parts + self.blobs.iter().map(|blob| blob.npart).sum::<usize>()
    }
}

/// Sample one virialised Plummer sphere. Velocities are isotropic and
/// rescaled so that the sampled kinetic energy is half the softened
/// gravitational self-energy, then offset by the bulk velocity.
pub fn sample_plummer(
    rng: &mut impl Rng,
    npart: usize,
    centre: DVec3,
    scale_radius: f64,
    bulk_velocity: DVec3,
    pmass: f64,
    redshift: f64,
    little_h: f64,
) -> (Vec<DVec3>, Vec<DVec3>) {
    let centred: Vec<DVec3> = (0..npart)
        .map(|_| {
            let u: f64 = rng.gen_range(1e-6..1.0);
            let radius =
                (scale_radius / (u.powf(-2.0 / 3.0) - 1.0).sqrt()).min(4.0 * scale_radius);
            radius * random_unit_vector(rng)
        })
        .collect();
    let raw_velocities: Vec<DVec3> = (0..npart)
        .map(|_| rng.gen_range(0.0..1.0) * random_unit_vector(rng))
        .collect();
    let energy = halo_energy(
        EnergyMethod::Exact,
        &centred,
        &raw_velocities,
        pmass,
        redshift,
        little_h,
        0.02 * scale_radius,
    );
    let scale = if energy.kinetic > 0.0 {
        (0.5 * energy.gravitational / energy.kinetic).sqrt()
    } else {
        0.0
    };
    let positions = centred.iter().map(|pos| centre + *pos).collect();
    let velocities = raw_velocities
        .iter()
        .map(|vel| bulk_velocity + scale * *vel)
        .collect();
    (positions, velocities)
}

fn random_unit_vector(rng: &mut impl Rng) -> DVec3 {
    loop {
        let v = DVec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let length = v.length();
        if length > 1e-3 && length <= 1.0 {
            return v / length;
        }
    }
}

/// Build the snapshot described by the parameters.
pub fn generate(params: &IcsParameters) -> Result<Snapshot, SnapshotError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let npart = params.npart();
    let pmass = params.pmass * SOLAR_MASSES_PER_MASS_UNIT / params.little_h;
    let mut positions: Vec<DVec3> = vec![];
    let mut velocities: Vec<DVec3> = vec![];
    for _ in 0..params.background_parts {
        positions.push(DVec3::new(
            rng.gen_range(0.0..params.boxsize),
            rng.gen_range(0.0..params.boxsize),
            rng.gen_range(0.0..params.boxsize),
        ));
        velocities.push(DVec3::new(
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
        ));
    }
    for blob in params.blobs.iter() {
        let (blob_positions, blob_velocities) = sample_plummer(
            &mut rng,
            blob.npart,
            DVec3::from_array(blob.centre),
            blob.scale_radius,
            DVec3::from_array(blob.bulk_velocity),
            pmass,
            params.redshift,
            params.little_h,
        );
        positions.extend(blob_positions);
        velocities.extend(blob_velocities);
    }
    Snapshot::new(
        positions,
        velocities,
        SnapshotAttrs {
            mean_sep: params.boxsize / (npart as f64).powf(1.0 / 3.0),
            boxsize: params.boxsize,
            npart,
            redshift: params.redshift,
            pmass: params.pmass,
            little_h: params.little_h,
        },
    )
}
