use std::ops::Range;

use glam::DVec3;
use log::debug;

use super::task::Message;
use super::task::Task;
use super::task::TaskOutcome;
use crate::communication::LocalCommunicator;
use crate::communication::SizedCommunicator;
use crate::communication::MAIN_RANK;
use crate::domain::DomainDecomposition;
use crate::fof::friends_of_friends;
use crate::fof::friends_of_friends_over;
use crate::neighbour_search::NeighbourTree;
use crate::parameters::FinderParameters;
use crate::phase_space::refine_halo;
use crate::phase_space::HaloKind;
use crate::snapshot::Snapshot;
use crate::stitch::merge_worker_halos;

/// Everything a worker reads while processing tasks. All of it is
/// shared immutably between the ranks; results only ever travel
/// through the communicators.
#[derive(Clone, Copy)]
pub struct WorkerContext<'a> {
    pub snapshot: &'a Snapshot,
    pub params: &'a FinderParameters,
    pub decomposition: &'a DomainDecomposition,
    /// Periodic tree over all particle positions, built once by the
    /// coordinator.
    pub global_tree: &'a NeighbourTree<3>,
    pub coords: &'a [[f64; 3]],
}

/// Spatial FOF at the host linking length, querying one cell of
/// particles against the full-box tree. Neighbours outside the cell
/// join the returned sets; overlaps between cells are resolved by the
/// stitching stages.
fn spatial_cell_task(ctx: &WorkerContext, cell: Range<usize>) -> Vec<Vec<usize>> {
    let linking_length = HaloKind::Host.spatial_linking_length(ctx.snapshot, ctx.params);
    let result = friends_of_friends_over(ctx.global_tree, ctx.coords, linking_length, cell);
    result.groups
}

/// Spatial FOF at the subhalo linking length over one host halo's
/// particles, in the host's unwrapped frame.
fn sub_spatial_task(ctx: &WorkerContext, pids: &[usize]) -> Vec<Vec<usize>> {
    let mut positions: Vec<DVec3> = pids
        .iter()
        .map(|&pid| ctx.snapshot.positions[pid])
        .collect();
    ctx.snapshot.simulation_box().unwrap_cloud(&mut positions);
    let coords: Vec<[f64; 3]> = positions.iter().map(|pos| pos.to_array()).collect();
    let tree = NeighbourTree::new(&coords);
    let linking_length = HaloKind::Subhalo.spatial_linking_length(ctx.snapshot, ctx.params);
    let result = friends_of_friends(&tree, &coords, linking_length);
    result
        .groups
        .into_iter()
        .filter(|members| members.len() >= ctx.params.part_threshold)
        .map(|members| members.into_iter().map(|local| pids[local]).collect())
        .collect()
}

/// Run one phase-stage task to completion. Also used by the
/// coordinator when it opportunistically drains small tasks itself.
pub fn execute_phase_task(ctx: &WorkerContext, task: Task) -> TaskOutcome {
    match task {
        Task::HostPhase(task) => {
            TaskOutcome::HostHalos(refine_halo(ctx.snapshot, ctx.params, HaloKind::Host, task))
        }
        Task::SubSpatial(pids) => TaskOutcome::SubSpatialGroups(sub_spatial_task(ctx, &pids)),
        Task::SubPhase(task) => TaskOutcome::SubHalos(refine_halo(
            ctx.snapshot,
            ctx.params,
            HaloKind::Subhalo,
            task,
        )),
        Task::SpatialCell(_) => unreachable!("Spatial cells are not phase-stage tasks"),
    }
}

/// The worker side of both stages. The stages use separate
/// communicators so that a worker entering the phase stage cannot be
/// mistaken for one still asking for spatial work.
pub fn worker_loop(
    spatial_comm: LocalCommunicator<Message>,
    phase_comm: LocalCommunicator<Message>,
    ctx: WorkerContext,
) {
    debug_assert!(!spatial_comm.is_main());
    spatial_stage(&spatial_comm, &ctx);
    phase_stage(&phase_comm, &ctx);
}

/// First stage: pull spatial cells until told to exit, then pre-stitch
/// this rank's halo sets and hand them over.
fn spatial_stage(comm: &LocalCommunicator<Message>, ctx: &WorkerContext) {
    let mut halo_sets: Vec<Vec<usize>> = vec![];
    let mut processed: Vec<Range<usize>> = vec![];
    loop {
        comm.send(MAIN_RANK, Message::Ready);
        match comm.receive_any().1 {
            Message::Start(Task::SpatialCell(cell)) => {
                let cell = ctx.decomposition.cells()[cell].clone();
                debug!("Spatial FOF over cell {}..{}", cell.start, cell.end);
                halo_sets.extend(spatial_cell_task(ctx, cell.clone()));
                processed.push(cell);
                comm.send(MAIN_RANK, Message::Done(TaskOutcome::SpatialDone));
            }
            Message::Exit => break,
            message => panic!("Unexpected message in spatial stage: {message:?}"),
        }
    }
    let merged = merge_worker_halos(&halo_sets, &processed, ctx.params.part_threshold);
    comm.send(MAIN_RANK, Message::Done(TaskOutcome::WorkerHalos(merged)));
    comm.send(MAIN_RANK, Message::Exit);
}

/// Second stage: pull host-phase, sub-spatial and sub-phase tasks
/// until told to exit.
fn phase_stage(comm: &LocalCommunicator<Message>, ctx: &WorkerContext) {
    loop {
        comm.send(MAIN_RANK, Message::Ready);
        match comm.receive_any().1 {
            Message::Start(task) => {
                let outcome = execute_phase_task(ctx, task);
                comm.send(MAIN_RANK, Message::Done(outcome));
            }
            Message::Exit => break,
            message => panic!("Unexpected message in phase stage: {message:?}"),
        }
    }
    comm.send(MAIN_RANK, Message::Exit);
}
