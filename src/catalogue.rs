use glam::DVec3;

use crate::parameters::FinderParameters;
use crate::phase_space::RefinedHalo;
use crate::snapshot::Snapshot;

/// Sentinel in the particle assignment array for particles that
/// belong to no halo.
pub const NOT_IN_HALO: i64 = -2;

/// Snapshot-level attributes echoed into the catalogue.
#[derive(Clone, Copy, Debug)]
pub struct CatalogueAttrs {
    pub snap_npart: usize,
    pub boxsize: f64,
    pub part_mass: f64,
    pub little_h: f64,
    pub linking_length: f64,
    pub redshift: f64,
}

/// Per-halo arrays, indexed by the dense halo ID.
#[derive(Debug, Default)]
pub struct HaloArrays {
    pub ids: Vec<usize>,
    pub mean_positions: Vec<DVec3>,
    pub mean_velocities: Vec<DVec3>,
    pub rms_spatial_radius: Vec<f64>,
    pub rms_velocity_radius: Vec<f64>,
    pub velocity_dispersion_1d: Vec<DVec3>,
    pub velocity_dispersion_3d: Vec<f64>,
    pub nparts: Vec<usize>,
    pub real_flag: Vec<bool>,
    pub total_energies: Vec<f64>,
    pub kinetic_energies: Vec<f64>,
    pub gravitational_energies: Vec<f64>,
    pub v_max: Vec<f64>,
    pub half_mass_radius: Vec<f64>,
    pub half_mass_velocity_radius: Vec<f64>,
    /// Per-halo particle ID lists.
    pub particle_ids: Vec<Vec<usize>>,
}

impl HaloArrays {
    fn push(&mut self, halo: RefinedHalo) -> usize {
        let id = self.ids.len();
        self.ids.push(id);
        self.mean_positions.push(halo.mean_pos);
        self.mean_velocities.push(halo.mean_vel);
        self.rms_spatial_radius.push(halo.properties.rms_radius);
        self.rms_velocity_radius.push(halo.properties.rms_vel_radius);
        self.velocity_dispersion_1d
            .push(halo.properties.vel_dispersion_1d);
        self.velocity_dispersion_3d
            .push(halo.properties.vel_dispersion_3d);
        self.nparts.push(halo.npart());
        self.real_flag.push(halo.real);
        self.total_energies.push(halo.energy.total);
        self.kinetic_energies.push(halo.energy.kinetic);
        self.gravitational_energies.push(halo.energy.gravitational);
        self.v_max.push(halo.properties.v_max);
        self.half_mass_radius.push(halo.properties.half_mass_radius);
        self.half_mass_velocity_radius
            .push(halo.properties.half_mass_vel_radius);
        self.particle_ids.push(halo.pids);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// The final output of a run: host and subhalo arrays with dense IDs
/// in collection order, plus the particle-to-halo assignment.
#[derive(Debug)]
pub struct HaloCatalogue {
    pub attrs: CatalogueAttrs,
    pub halos: HaloArrays,
    pub subhalos: HaloArrays,
    /// Host halo ID of every subhalo.
    pub host_ids: Vec<usize>,
    /// Number of subhalos per host.
    pub occupancy: Vec<usize>,
    /// (host, sub) halo ID per particle, [`NOT_IN_HALO`] where unassigned.
    pub particle_halo_ids: Vec<[i64; 2]>,
}

impl HaloCatalogue {
    pub fn num_halos(&self) -> usize {
        self.halos.len()
    }

    pub fn num_subhalos(&self) -> usize {
        self.subhalos.len()
    }
}

/// Accumulates refined halos as the coordinator collects them and
/// hands out dense IDs in collection order.
pub struct CatalogueBuilder {
    attrs: CatalogueAttrs,
    halos: HaloArrays,
    subhalos: HaloArrays,
    host_ids: Vec<usize>,
    occupancy: Vec<usize>,
    particle_halo_ids: Vec<[i64; 2]>,
}

impl CatalogueBuilder {
    pub fn new(snapshot: &Snapshot, params: &FinderParameters) -> Self {
        Self {
            attrs: CatalogueAttrs {
                snap_npart: snapshot.npart,
                boxsize: snapshot.boxsize,
                part_mass: snapshot.pmass,
                little_h: snapshot.little_h,
                linking_length: params.llcoeff * snapshot.mean_sep,
                redshift: snapshot.redshift,
            },
            halos: HaloArrays::default(),
            subhalos: HaloArrays::default(),
            host_ids: vec![],
            occupancy: vec![],
            particle_halo_ids: vec![[NOT_IN_HALO, NOT_IN_HALO]; snapshot.npart],
        }
    }

    pub fn add_host(&mut self, halo: RefinedHalo) -> usize {
        let pids = halo.pids.clone();
        let id = self.halos.push(halo);
        self.occupancy.push(0);
        for pid in pids {
            debug_assert_eq!(self.particle_halo_ids[pid][0], NOT_IN_HALO);
            self.particle_halo_ids[pid][0] = id as i64;
        }
        id
    }

    pub fn add_subhalo(&mut self, halo: RefinedHalo) -> usize {
        let mut hosts: Vec<i64> = halo
            .pids
            .iter()
            .map(|&pid| self.particle_halo_ids[pid][0])
            .collect();
        hosts.sort();
        hosts.dedup();
        assert!(
            hosts.len() == 1 && hosts[0] >= 0,
            "Subhalo maps to {} hosts, must map to exactly one",
            hosts.len()
        );
        let host = hosts[0] as usize;
        let pids = halo.pids.clone();
        let id = self.subhalos.push(halo);
        self.host_ids.push(host);
        self.occupancy[host] += 1;
        for pid in pids {
            debug_assert_eq!(self.particle_halo_ids[pid][1], NOT_IN_HALO);
            self.particle_halo_ids[pid][1] = id as i64;
        }
        id
    }

    pub fn host_nparts(&self) -> &[usize] {
        &self.halos.nparts
    }

    pub fn subhalo_nparts(&self) -> &[usize] {
        &self.subhalos.nparts
    }

    pub fn build(self) -> HaloCatalogue {
        HaloCatalogue {
            attrs: self.attrs,
            halos: self.halos,
            subhalos: self.subhalos,
            host_ids: self.host_ids,
            occupancy: self.occupancy,
            particle_halo_ids: self.particle_halo_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::CatalogueBuilder;
    use super::NOT_IN_HALO;
    use crate::energy::HaloEnergy;
    use crate::parameters::FinderParameters;
    use crate::phase_space::RefinedHalo;
    use crate::properties::HaloProperties;
    use crate::snapshot::Snapshot;
    use crate::snapshot::SnapshotAttrs;

    fn test_halo(pids: Vec<usize>, real: bool) -> RefinedHalo {
        RefinedHalo {
            pids,
            real,
            mean_pos: DVec3::ZERO,
            mean_vel: DVec3::ZERO,
            energy: HaloEnergy {
                total: -1.0,
                kinetic: 1.0,
                gravitational: 2.0,
            },
            properties: HaloProperties {
                rms_radius: 1.0,
                rms_vel_radius: 1.0,
                vel_dispersion_1d: DVec3::ZERO,
                vel_dispersion_3d: 0.0,
                v_max: 0.0,
                half_mass_radius: 0.5,
                half_mass_vel_radius: 0.5,
            },
        }
    }

    fn test_builder(npart: usize) -> CatalogueBuilder {
        let snapshot = Snapshot::new(
            vec![DVec3::ZERO; npart],
            vec![DVec3::ZERO; npart],
            SnapshotAttrs {
                mean_sep: 1.0,
                boxsize: 10.0,
                npart,
                redshift: 0.0,
                pmass: 1.0,
                little_h: 0.7,
            },
        )
        .unwrap();
        CatalogueBuilder::new(&snapshot, &FinderParameters::default())
    }

    #[test]
    fn dense_ids_in_collection_order() {
        let mut builder = test_builder(30);
        assert_eq!(builder.add_host(test_halo(vec![0, 1, 2], true)), 0);
        assert_eq!(builder.add_host(test_halo(vec![10, 11], false)), 1);
        let catalogue = builder.build();
        assert_eq!(catalogue.halos.ids, vec![0, 1]);
        assert_eq!(catalogue.halos.real_flag, vec![true, false]);
        assert_eq!(catalogue.particle_halo_ids[1], [0, NOT_IN_HALO]);
        assert_eq!(catalogue.particle_halo_ids[11], [1, NOT_IN_HALO]);
        assert_eq!(catalogue.particle_halo_ids[20], [NOT_IN_HALO, NOT_IN_HALO]);
    }

    #[test]
    fn subhalos_are_tied_to_their_host() {
        let mut builder = test_builder(30);
        let host = builder.add_host(test_halo((0..20).collect(), true));
        let sub = builder.add_subhalo(test_halo(vec![3, 4, 5], true));
        let catalogue = builder.build();
        assert_eq!(catalogue.host_ids[sub], host);
        assert_eq!(catalogue.occupancy[host], 1);
        assert_eq!(catalogue.particle_halo_ids[4], [0, 0]);
    }

    #[test]
    #[should_panic(expected = "exactly one")]
    fn subhalo_spanning_two_hosts_is_fatal() {
        let mut builder = test_builder(30);
        builder.add_host(test_halo((0..10).collect(), true));
        builder.add_host(test_halo((10..20).collect(), true));
        builder.add_subhalo(test_halo(vec![8, 9, 10, 11], true));
    }
}
