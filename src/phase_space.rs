use glam::DVec3;

use crate::energy::halo_energy;
use crate::energy::HaloEnergy;
use crate::fof::friends_of_friends;
use crate::neighbour_search::NeighbourTree;
use crate::parameters::FinderParameters;
use crate::properties::HaloProperties;
use crate::snapshot::Snapshot;
use crate::units::KILOMETERS_PER_MEGAPARSEC;

/// Particles at overdensity 200 define hosts; substructure is searched
/// at overdensity 1600, which rescales the velocity linking length by
/// (1600 / 200)^(1/6).
const SUBHALO_OVERDENSITY_RATIO: f64 = 1600.0 / 200.0;

/// The phase-space FOF runs at unit radius independently in the
/// position-scaled and velocity-scaled subspaces, i.e. at sqrt(2) in
/// the combined 6D space.
const PHASE_SPACE_LINKING_RADIUS: f64 = std::f64::consts::SQRT_2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaloKind {
    Host,
    Subhalo,
}

impl HaloKind {
    fn overdensity_factor(self) -> f64 {
        match self {
            HaloKind::Host => 1.0,
            HaloKind::Subhalo => SUBHALO_OVERDENSITY_RATIO.powf(1.0 / 6.0),
        }
    }

    pub fn spatial_linking_length(self, snapshot: &Snapshot, params: &FinderParameters) -> f64 {
        let coefficient = match self {
            HaloKind::Host => params.llcoeff,
            HaloKind::Subhalo => params.sub_llcoeff,
        };
        coefficient * snapshot.mean_sep
    }
}

/// A candidate on the refinement worklist: a set of particle indices
/// and the velocity-linking coefficient it was last tested at.
#[derive(Clone, Debug)]
pub struct PhaseSpaceTask {
    pub pids: Vec<usize>,
    pub alpha: f64,
}

impl PhaseSpaceTask {
    pub fn new(pids: Vec<usize>, alpha: f64) -> Self {
        Self { pids, alpha }
    }

    pub fn npart(&self) -> usize {
        self.pids.len()
    }
}

/// A finished halo, bound or abandoned at the coefficient floor.
#[derive(Clone, Debug)]
pub struct RefinedHalo {
    /// Snapshot particle indices, sorted.
    pub pids: Vec<usize>,
    pub real: bool,
    /// Mean position wrapped into the box, Mpc.
    pub mean_pos: DVec3,
    /// Mean velocity, km/s.
    pub mean_vel: DVec3,
    pub energy: HaloEnergy,
    pub properties: HaloProperties,
}

impl RefinedHalo {
    pub fn npart(&self) -> usize {
        self.pids.len()
    }
}

/// Iterative 6D refinement of one spatial candidate.
///
/// Each worklist entry is wrapped, centred and Hubble-corrected, then
/// clustered in (x / b, v / v_L) space at the current coefficient.
/// Bound sub-components are emitted; unbound ones go back on the
/// worklist at a tighter coefficient until they either bind, fall
/// below the particle threshold, or hit the coefficient floor.
pub fn refine_halo(
    snapshot: &Snapshot,
    params: &FinderParameters,
    kind: HaloKind,
    task: PhaseSpaceTask,
) -> Vec<RefinedHalo> {
    let box_ = snapshot.simulation_box();
    let spatial_linkl = kind.spatial_linking_length(snapshot, params);
    let hubble = snapshot.hubble_parameter();
    let redshift_factor = (1.0 + snapshot.redshift).sqrt();

    let mut halos = vec![];
    let mut worklist = vec![task];
    while let Some(candidate) = worklist.pop() {
        if candidate.npart() < params.part_threshold {
            continue;
        }
        let alpha = candidate.alpha * (1.0 - params.decrement);

        let mut positions: Vec<DVec3> = candidate
            .pids
            .iter()
            .map(|&pid| snapshot.positions[pid])
            .collect();
        let mut velocities: Vec<DVec3> = candidate
            .pids
            .iter()
            .map(|&pid| snapshot.velocities[pid])
            .collect();
        box_.unwrap_cloud(&mut positions);
        let mean_pos = box_.centre_cloud(&mut positions);
        // Add the Hubble flow across the candidate so that expansion
        // counts against boundedness.
        for (vel, pos) in velocities.iter_mut().zip(positions.iter()) {
            *vel += hubble * *pos * KILOMETERS_PER_MEGAPARSEC / redshift_factor;
        }

        let vel_linkl = alpha
            * kind.overdensity_factor()
            * snapshot.vel_linking_base
            * snapshot.pmass.powf(1.0 / 3.0)
            * (candidate.npart() as f64).powf(1.0 / 3.0);

        let phase_points: Vec<[f64; 6]> = positions
            .iter()
            .zip(velocities.iter())
            .map(|(pos, vel)| {
                [
                    pos.x / spatial_linkl,
                    pos.y / spatial_linkl,
                    pos.z / spatial_linkl,
                    vel.x / vel_linkl,
                    vel.y / vel_linkl,
                    vel.z / vel_linkl,
                ]
            })
            .collect();
        let tree = NeighbourTree::new(&phase_points);
        let clusters =
            friends_of_friends(&tree, &phase_points, PHASE_SPACE_LINKING_RADIUS);

        for members in clusters.groups {
            if members.len() < params.part_threshold {
                continue;
            }
            let mut sub_positions: Vec<DVec3> =
                members.iter().map(|&local| positions[local]).collect();
            let sub_velocities: Vec<DVec3> =
                members.iter().map(|&local| velocities[local]).collect();
            box_.unwrap_cloud(&mut sub_positions);
            let sub_mean_pos = box_.centre_cloud(&mut sub_positions);
            let energy = halo_energy(
                params.energy_method,
                &sub_positions,
                &sub_velocities,
                snapshot.pmass,
                snapshot.redshift,
                snapshot.little_h,
                snapshot.softening,
            );
            let mut pids: Vec<usize> =
                members.iter().map(|&local| candidate.pids[local]).collect();
            if !energy.is_bound() && alpha > params.min_alpha_v {
                worklist.push(PhaseSpaceTask::new(pids, alpha));
                continue;
            }
            pids.sort();
            let mean_vel = crate::simulation_box::mean_of(&sub_velocities);
            let centred_velocities: Vec<DVec3> = sub_velocities
                .iter()
                .map(|vel| *vel - mean_vel)
                .collect();
            let properties =
                HaloProperties::compute(&sub_positions, &centred_velocities, snapshot.pmass);
            halos.push(RefinedHalo {
                pids,
                real: energy.is_bound(),
                mean_pos: box_.periodic_wrap(mean_pos + sub_mean_pos),
                mean_vel,
                energy,
                properties,
            });
        }
    }
    halos
}
