use glam::DVec3;
use ordered_float::OrderedFloat;

use crate::units::GRAVITATIONAL_CONSTANT;
use crate::units::KILOMETERS_PER_MEGAPARSEC;

/// Derived properties of an accepted halo, all computed from
/// coordinates centred on the halo means.
#[derive(Clone, Copy, Debug)]
pub struct HaloProperties {
    /// RMS of the radial distances, Mpc.
    pub rms_radius: f64,
    /// RMS of the velocity-space distances, km/s.
    pub rms_vel_radius: f64,
    /// Per-axis 1D velocity dispersion, km/s.
    pub vel_dispersion_1d: DVec3,
    /// 3D velocity dispersion, km/s.
    pub vel_dispersion_3d: f64,
    /// Maximum circular velocity, km/s.
    pub v_max: f64,
    /// Radius enclosing half the members, Mpc.
    pub half_mass_radius: f64,
    /// Velocity-space radius enclosing half the members, km/s.
    pub half_mass_vel_radius: f64,
}

fn rms_norm(vecs: &[DVec3]) -> f64 {
    (vecs.iter().map(|v| v.length_squared()).sum::<f64>() / vecs.len() as f64).sqrt()
}

fn sorted_norms(vecs: &[DVec3]) -> Vec<f64> {
    let mut norms: Vec<f64> = vecs.iter().map(|v| v.length()).collect();
    norms.sort_by_key(|&norm| OrderedFloat(norm));
    norms
}

/// The smallest radius enclosing at least half the members.
fn half_mass_norm(sorted_norms: &[f64]) -> f64 {
    sorted_norms[(sorted_norms.len() - 1) / 2]
}

/// The maximum over the sorted radii r_k of the circular velocity
/// sqrt(G k m / r_k) of the mass enclosed below r_k.
fn max_circular_velocity(sorted_radii: &[f64], pmass: f64) -> f64 {
    sorted_radii
        .iter()
        .enumerate()
        .filter(|(_, &radius)| radius > 0.0)
        .map(|(index, &radius)| {
            let enclosed_mass = (index + 1) as f64 * pmass;
            (GRAVITATIONAL_CONSTANT * enclosed_mass / (radius * KILOMETERS_PER_MEGAPARSEC))
                .sqrt()
        })
        .fold(0.0, f64::max)
}

impl HaloProperties {
    pub fn compute(
        centred_positions: &[DVec3],
        centred_velocities: &[DVec3],
        pmass: f64,
    ) -> Self {
        assert!(!centred_positions.is_empty());
        assert_eq!(centred_positions.len(), centred_velocities.len());
        let npart = centred_velocities.len() as f64;
        let mut vel_dispersion_1d = DVec3::ZERO;
        for vel in centred_velocities.iter() {
            vel_dispersion_1d += *vel * *vel;
        }
        vel_dispersion_1d /= npart;
        let vel_dispersion_3d = (vel_dispersion_1d.x + vel_dispersion_1d.y + vel_dispersion_1d.z)
            .sqrt();
        let radii = sorted_norms(centred_positions);
        let vel_radii = sorted_norms(centred_velocities);
        Self {
            rms_radius: rms_norm(centred_positions),
            rms_vel_radius: rms_norm(centred_velocities),
            vel_dispersion_1d,
            vel_dispersion_3d,
            v_max: max_circular_velocity(&radii, pmass),
            half_mass_radius: half_mass_norm(&radii),
            half_mass_vel_radius: half_mass_norm(&vel_radii),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::half_mass_norm;
    use super::HaloProperties;
    use crate::test_utils::assert_float_is_close_relative;
    use crate::units::GRAVITATIONAL_CONSTANT;
    use crate::units::KILOMETERS_PER_MEGAPARSEC;

    #[test]
    fn rms_and_dispersion_on_axis_pairs() {
        let positions = [
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            DVec3::new(0.0, -2.0, 0.0),
        ];
        let velocities = [
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(-10.0, 0.0, 0.0),
            DVec3::new(0.0, 20.0, 0.0),
            DVec3::new(0.0, -20.0, 0.0),
        ];
        let properties = HaloProperties::compute(&positions, &velocities, 1e10);
        // mean r^2 = (1 + 1 + 4 + 4) / 4
        assert_float_is_close_relative(properties.rms_radius, 2.5f64.sqrt());
        assert_float_is_close_relative(properties.rms_vel_radius, 250.0f64.sqrt());
        assert_float_is_close_relative(properties.vel_dispersion_1d.x, 50.0);
        assert_float_is_close_relative(properties.vel_dispersion_1d.y, 200.0);
        assert_eq!(properties.vel_dispersion_1d.z, 0.0);
        assert_float_is_close_relative(properties.vel_dispersion_3d, 250.0f64.sqrt());
        // Half of four members are enclosed at the second radius.
        assert_float_is_close_relative(properties.half_mass_radius, 1.0);
        assert_float_is_close_relative(properties.half_mass_vel_radius, 10.0);
    }

    #[test]
    fn half_mass_norm_encloses_at_least_half() {
        assert_eq!(half_mass_norm(&[1.0]), 1.0);
        assert_eq!(half_mass_norm(&[1.0, 2.0]), 1.0);
        assert_eq!(half_mass_norm(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(half_mass_norm(&[1.0, 2.0, 3.0, 4.0]), 2.0);
        assert_eq!(half_mass_norm(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
    }

    #[test]
    fn v_max_of_two_shells() {
        let pmass = 1e10;
        let positions = [
            DVec3::new(0.1, 0.0, 0.0),
            DVec3::new(-0.1, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let velocities = [DVec3::ZERO; 3];
        let properties = HaloProperties::compute(&positions, &velocities, pmass);
        // The circular velocity peaks at the second particle:
        // sqrt(G * 2m / 0.1 Mpc) > sqrt(G * 3m / 1 Mpc).
        let expected =
            (GRAVITATIONAL_CONSTANT * 2.0 * pmass / (0.1 * KILOMETERS_PER_MEGAPARSEC)).sqrt();
        assert_float_is_close_relative(properties.v_max, expected);
    }
}
