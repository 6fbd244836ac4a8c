use glam::DVec3;
use serde::Deserialize;
use serde::Serialize;

use crate::units::GRAVITATIONAL_CONSTANT;
use crate::units::KILOMETERS_PER_MEGAPARSEC;

/// How the gravitational self-energy of a candidate is computed. The
/// choice is an explicit configuration value passed down to every
/// energy evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyMethod {
    /// Softened pairwise sum, accumulated one row at a time.
    Exact,
    /// Enclosed-mass estimate over sorted radii.
    Approximate,
}

impl Default for EnergyMethod {
    fn default() -> Self {
        Self::Exact
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HaloEnergy {
    /// KE - GE, in M_sun km^2 s^-2.
    pub total: f64,
    pub kinetic: f64,
    pub gravitational: f64,
}

impl HaloEnergy {
    /// The boundedness criterion: KE/GE <= 1. A halo with no
    /// gravitational self-energy is never bound.
    pub fn is_bound(&self) -> bool {
        self.gravitational > 0.0 && self.kinetic / self.gravitational <= 1.0
    }
}

/// Kinetic energy from the per-axis velocity variances,
/// KE = n m/2 * sum_axis Var(v_axis) / (1+z).
pub fn kinetic_energy(velocities: &[DVec3], pmass: f64, redshift: f64) -> f64 {
    let npart = velocities.len();
    if npart == 0 {
        return 0.0;
    }
    let mean = velocities.iter().copied().sum::<DVec3>() / npart as f64;
    let summed_variance = velocities
        .iter()
        .map(|vel| (*vel - mean).length_squared())
        .sum::<f64>()
        / npart as f64;
    0.5 * npart as f64 * pmass * summed_variance / (1.0 + redshift)
}

/// Convert a gravitational sum over 1/Mpc separations into
/// M_sun km^2 s^-2, matching the kinetic energy.
fn to_kinetic_units(gravitational_sum: f64, little_h: f64, redshift: f64) -> f64 {
    gravitational_sum * little_h * (1.0 + redshift) / KILOMETERS_PER_MEGAPARSEC
}

/// GE = G m^2 sum_{i<j} 1 / sqrt(r_ij^2 + s^2) over centred positions.
/// The pair sum is accumulated row by row, so no O(n^2) separation
/// matrix is ever held.
fn gravitational_energy_exact(
    positions: &[DVec3],
    pmass: f64,
    redshift: f64,
    little_h: f64,
    softening: f64,
) -> f64 {
    let softening2 = softening * softening;
    let mut inverse_distance_sum = 0.0;
    for (row, pos) in positions.iter().enumerate().skip(1) {
        inverse_distance_sum += positions[..row]
            .iter()
            .map(|other| 1.0 / ((*pos - *other).length_squared() + softening2).sqrt())
            .sum::<f64>();
    }
    let sum = GRAVITATIONAL_CONSTANT * pmass * pmass * inverse_distance_sum;
    to_kinetic_units(sum, little_h, redshift)
}

/// GE estimated from the mass enclosed below each sorted radius,
/// GE = G m^2 sum_k k / r_k.
fn gravitational_energy_approximate(
    positions: &[DVec3],
    pmass: f64,
    redshift: f64,
    little_h: f64,
) -> f64 {
    let mut radii: Vec<f64> = positions.iter().map(|pos| pos.length()).collect();
    radii.sort_by(|a, b| a.total_cmp(b));
    let sum: f64 = radii
        .iter()
        .enumerate()
        .skip(1)
        .map(|(enclosed, radius)| {
            GRAVITATIONAL_CONSTANT * pmass * pmass * enclosed as f64 / radius
        })
        .sum();
    to_kinetic_units(sum, little_h, redshift)
}

/// Total, kinetic and gravitational energy of a halo candidate given
/// its centred positions (Mpc) and velocities (km/s).
pub fn halo_energy(
    method: EnergyMethod,
    positions: &[DVec3],
    velocities: &[DVec3],
    pmass: f64,
    redshift: f64,
    little_h: f64,
    softening: f64,
) -> HaloEnergy {
    debug_assert_eq!(positions.len(), velocities.len());
    let kinetic = kinetic_energy(velocities, pmass, redshift);
    let gravitational = if positions.len() < 2 {
        0.0
    } else {
        match method {
            EnergyMethod::Exact => {
                gravitational_energy_exact(positions, pmass, redshift, little_h, softening)
            }
            EnergyMethod::Approximate => {
                gravitational_energy_approximate(positions, pmass, redshift, little_h)
            }
        }
    };
    HaloEnergy {
        total: kinetic - gravitational,
        kinetic,
        gravitational,
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::halo_energy;
    use super::kinetic_energy;
    use super::EnergyMethod;
    use crate::test_utils::assert_float_is_close_relative;
    use crate::units::GRAVITATIONAL_CONSTANT;
    use crate::units::KILOMETERS_PER_MEGAPARSEC;

    const PMASS: f64 = 1e10;
    const LITTLE_H: f64 = 0.7;

    #[test]
    fn kinetic_energy_of_counter_streaming_pair() {
        let velocities = [DVec3::new(100.0, 0.0, 0.0), DVec3::new(-100.0, 0.0, 0.0)];
        // Per-axis variance is 100^2; KE = 0.5 * 2 * m * 1e4 / (1+z).
        let redshift = 1.0;
        let expected = 0.5 * 2.0 * PMASS * 1e4 / 2.0;
        assert_float_is_close_relative(kinetic_energy(&velocities, PMASS, redshift), expected);
    }

    #[test]
    fn kinetic_energy_ignores_bulk_motion() {
        let velocities = [DVec3::splat(500.0), DVec3::splat(500.0)];
        assert_eq!(kinetic_energy(&velocities, PMASS, 0.0), 0.0);
    }

    #[test]
    fn two_body_gravitational_energy() {
        let softening = 0.01;
        let positions = [DVec3::new(-0.5, 0.0, 0.0), DVec3::new(0.5, 0.0, 0.0)];
        let velocities = [DVec3::ZERO, DVec3::ZERO];
        let energy = halo_energy(
            EnergyMethod::Exact,
            &positions,
            &velocities,
            PMASS,
            0.0,
            LITTLE_H,
            softening,
        );
        let expected = GRAVITATIONAL_CONSTANT * PMASS * PMASS
            / (1.0f64 + softening * softening).sqrt()
            * LITTLE_H
            / KILOMETERS_PER_MEGAPARSEC;
        assert_float_is_close_relative(energy.gravitational, expected);
        assert_float_is_close_relative(energy.total, -expected);
        assert!(energy.is_bound());
    }

    #[test]
    fn single_particle_has_no_self_energy() {
        let energy = halo_energy(
            EnergyMethod::Exact,
            &[DVec3::ZERO],
            &[DVec3::new(10.0, 0.0, 0.0)],
            PMASS,
            0.0,
            LITTLE_H,
            0.01,
        );
        assert_eq!(energy.gravitational, 0.0);
        assert!(!energy.is_bound());
    }

    #[test]
    fn approximate_two_body_encloses_one_particle() {
        let positions = [DVec3::new(-0.5, 0.0, 0.0), DVec3::new(0.5, 0.0, 0.0)];
        let velocities = [DVec3::ZERO, DVec3::ZERO];
        let energy = halo_energy(
            EnergyMethod::Approximate,
            &positions,
            &velocities,
            PMASS,
            0.0,
            LITTLE_H,
            0.01,
        );
        let expected =
            GRAVITATIONAL_CONSTANT * PMASS * PMASS / 0.5 * LITTLE_H / KILOMETERS_PER_MEGAPARSEC;
        assert_float_is_close_relative(energy.gravitational, expected);
    }
}
