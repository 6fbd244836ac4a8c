//! # Halosweep
//! Halosweep is a parallel dark-matter halo finder for cosmological
//! N-body snapshots. Given the particle positions and velocities of a
//! periodic box it identifies gravitationally bound structures in two
//! stages: a spatial friends-of-friends search distributed over a set
//! of worker ranks, followed by an iterative 6D phase-space
//! refinement that tightens the velocity linking length until every
//! emitted halo is either energetically bound or abandoned at the
//! coefficient floor. Substructure is searched the same way at a
//! higher overdensity inside every host.
//!
//! The crate consumes particle arrays plus snapshot scalars and
//! produces a [`catalogue::HaloCatalogue`]; reading simulation
//! outputs and serialising catalogues are left to external tooling.
//!
//! ```no_run
//! use halosweep::prelude::*;
//!
//! # let (positions, velocities, attrs): (Vec<glam::DVec3>, Vec<glam::DVec3>, SnapshotAttrs) = todo!();
//! let snapshot = Snapshot::new(positions, velocities, attrs).unwrap();
//! let catalogue = run(&snapshot, &FinderParameters::default(), 4);
//! println!("{} halos", catalogue.num_halos());
//! ```

pub(crate) mod catalogue;
pub(crate) mod command_line_options;
pub(crate) mod communication;
pub(crate) mod coordinator;
pub(crate) mod domain;
pub(crate) mod energy;
pub(crate) mod fof;
pub(crate) mod neighbour_search;
pub(crate) mod parameters;
pub(crate) mod phase_space;
pub(crate) mod properties;
pub(crate) mod simulation_box;
pub(crate) mod snapshot;
pub(crate) mod stitch;

#[cfg(test)]
pub(crate) mod test_utils;

/// Synthetic initial conditions for exercising the finder.
pub mod ics;
/// Physical constants and unit conventions.
pub mod units;

/// `use halosweep::prelude::*` to import the types needed to run the
/// finder.
pub mod prelude;
