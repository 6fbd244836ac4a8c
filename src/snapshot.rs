use glam::DVec3;
use thiserror::Error;

use crate::simulation_box::SimulationBox;
use crate::units::GRAVITATIONAL_CONSTANT;
use crate::units::KILOMETERS_PER_MEGAPARSEC;
use crate::units::SOLAR_MASSES_PER_MASS_UNIT;

/// The scalar attributes accompanying a snapshot, as handed over by
/// the ingestion layer.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotAttrs {
    /// Mean inter-particle separation in Mpc.
    pub mean_sep: f64,
    /// Side length of the periodic box in Mpc.
    pub boxsize: f64,
    pub npart: usize,
    pub redshift: f64,
    /// Particle mass in units of 10^10 M_sun / h.
    pub pmass: f64,
    pub little_h: f64,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{num_positions} positions but {num_velocities} velocities were given")]
    MismatchedArrays {
        num_positions: usize,
        num_velocities: usize,
    },
    #[error("snapshot declares {declared} particles but {given} were given")]
    WrongParticleCount { declared: usize, given: usize },
    #[error("box side length must be positive, got {0}")]
    NonPositiveBoxsize(f64),
    #[error("particle mass must be positive, got {0}")]
    NonPositiveMass(f64),
    #[error("mean inter-particle separation must be positive, got {0}")]
    NonPositiveMeanSep(f64),
    #[error("the Hubble parametrisation must be positive, got {0}")]
    NonPositiveLittleH(f64),
    #[error("non-finite coordinate on particle {0}")]
    NonFiniteCoordinate(usize),
    #[error("snapshot contains no particles")]
    Empty,
}

/// An immutable snapshot of the simulation together with every scalar
/// the finder derives from it at startup. Positions are wrapped into
/// the box on construction; velocities are peculiar velocities in
/// km/s.
pub struct Snapshot {
    pub positions: Vec<DVec3>,
    pub velocities: Vec<DVec3>,
    pub npart: usize,
    pub boxsize: f64,
    pub redshift: f64,
    /// Particle mass in M_sun.
    pub pmass: f64,
    pub little_h: f64,
    pub mean_sep: f64,
    /// Gravitational softening in Mpc.
    pub softening: f64,
    /// Mean matter density at this redshift in M_sun / km^3.
    pub mean_density: f64,
    /// Particle-count and mass independent part of the velocity-space
    /// linking length, in km/s per (M_sun^1/3 particle^1/3).
    pub vel_linking_base: f64,
}

impl Snapshot {
    pub fn new(
        positions: Vec<DVec3>,
        velocities: Vec<DVec3>,
        attrs: SnapshotAttrs,
    ) -> Result<Self, SnapshotError> {
        if positions.len() != velocities.len() {
            return Err(SnapshotError::MismatchedArrays {
                num_positions: positions.len(),
                num_velocities: velocities.len(),
            });
        }
        if positions.len() != attrs.npart {
            return Err(SnapshotError::WrongParticleCount {
                declared: attrs.npart,
                given: positions.len(),
            });
        }
        if attrs.npart == 0 {
            return Err(SnapshotError::Empty);
        }
        if attrs.boxsize <= 0.0 {
            return Err(SnapshotError::NonPositiveBoxsize(attrs.boxsize));
        }
        if attrs.pmass <= 0.0 {
            return Err(SnapshotError::NonPositiveMass(attrs.pmass));
        }
        if attrs.mean_sep <= 0.0 {
            return Err(SnapshotError::NonPositiveMeanSep(attrs.mean_sep));
        }
        if attrs.little_h <= 0.0 {
            return Err(SnapshotError::NonPositiveLittleH(attrs.little_h));
        }
        for (index, (pos, vel)) in positions.iter().zip(velocities.iter()).enumerate() {
            if !pos.is_finite() || !vel.is_finite() {
                return Err(SnapshotError::NonFiniteCoordinate(index));
            }
        }

        let box_ = SimulationBox::new(attrs.boxsize);
        let positions = positions
            .into_iter()
            .map(|pos| box_.periodic_wrap(pos))
            .collect();

        let pmass = attrs.pmass * SOLAR_MASSES_PER_MASS_UNIT / attrs.little_h;
        let npart = attrs.npart;
        let redshift = attrs.redshift;
        let softening = 0.05 * attrs.boxsize / (npart as f64).powf(1.0 / 3.0);
        let box_volume_km3 = (attrs.boxsize * KILOMETERS_PER_MEGAPARSEC).powi(3);
        let mean_density =
            npart as f64 * pmass * (1.0 + redshift).powi(3) / box_volume_km3;
        let vel_linking_base = (GRAVITATIONAL_CONSTANT / 2.0).sqrt()
            * (4.0 * std::f64::consts::PI * 200.0 * mean_density / 3.0).powf(1.0 / 6.0)
            * (1.0 + redshift).sqrt();

        Ok(Self {
            positions,
            velocities,
            npart,
            boxsize: attrs.boxsize,
            redshift,
            pmass,
            little_h: attrs.little_h,
            mean_sep: attrs.mean_sep,
            softening,
            mean_density,
            vel_linking_base,
        })
    }

    pub fn simulation_box(&self) -> SimulationBox {
        SimulationBox::new(self.boxsize)
    }

    /// The Hubble parameter at the snapshot redshift in 1/s, from the
    /// Friedmann relation over the mean matter density.
    pub fn hubble_parameter(&self) -> f64 {
        (8.0 * std::f64::consts::PI * GRAVITATIONAL_CONSTANT * self.mean_density / 3.0).sqrt()
    }
}
