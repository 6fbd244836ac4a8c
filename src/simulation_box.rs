use glam::DVec3;

/// The cubic simulation volume. Periodic boundary conditions apply
/// beyond this box, meaning that the positions of particles outside
/// of it are wrapped back into `[0, L)` along every axis.
#[derive(Clone, Copy, Debug)]
pub struct SimulationBox {
    side_length: f64,
}

fn periodic_wrap_component(v: f64, length: f64) -> f64 {
    v.rem_euclid(length)
}

fn minimize_component(v: f64, length: f64) -> f64 {
    if v < 0.0 {
        if v.abs() < (v + length).abs() {
            v
        } else {
            v + length
        }
    } else if v.abs() < (v - length).abs() {
        v
    } else {
        v - length
    }
}

impl SimulationBox {
    pub fn new(side_length: f64) -> Self {
        assert!(
            side_length > 0.0,
            "Simulation box side length must be positive, got {side_length}"
        );
        Self { side_length }
    }

    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    pub fn periodic_wrap(&self, mut pos: DVec3) -> DVec3 {
        pos.x = periodic_wrap_component(pos.x, self.side_length);
        pos.y = periodic_wrap_component(pos.y, self.side_length);
        pos.z = periodic_wrap_component(pos.z, self.side_length);
        pos
    }

    pub fn periodic_distance_vec(&self, p1: &DVec3, p2: &DVec3) -> DVec3 {
        let mut dist = *p1 - *p2;
        dist.x = minimize_component(dist.x, self.side_length);
        dist.y = minimize_component(dist.y, self.side_length);
        dist.z = minimize_component(dist.z, self.side_length);
        dist
    }

    pub fn periodic_distance(&self, p1: &DVec3, p2: &DVec3) -> f64 {
        self.periodic_distance_vec(p1, p2).length()
    }

    /// Make a particle cloud that straddles the periodic boundary
    /// contiguous by shifting every member that is more than half a
    /// box away from the axis-wise maximum member up by one box length.
    ///
    /// Fails silently on clouds whose extent exceeds half the box
    /// along any axis.
    pub fn unwrap_cloud(&self, positions: &mut [DVec3]) {
        let mut max = DVec3::splat(f64::NEG_INFINITY);
        for pos in positions.iter() {
            max = max.max(*pos);
        }
        let half = 0.5 * self.side_length;
        for pos in positions.iter_mut() {
            if max.x - pos.x > half {
                pos.x += self.side_length;
            }
            if max.y - pos.y > half {
                pos.y += self.side_length;
            }
            if max.z - pos.z > half {
                pos.z += self.side_length;
            }
        }
    }

    /// Centre a (previously unwrapped) cloud about its mean position
    /// and return that mean.
    pub fn centre_cloud(&self, positions: &mut [DVec3]) -> DVec3 {
        let mean = mean_of(positions);
        for pos in positions.iter_mut() {
            *pos -= mean;
        }
        mean
    }
}

pub fn mean_of(vecs: &[DVec3]) -> DVec3 {
    assert!(!vecs.is_empty(), "Mean of an empty set of vectors");
    vecs.iter().copied().sum::<DVec3>() / vecs.len() as f64
}
