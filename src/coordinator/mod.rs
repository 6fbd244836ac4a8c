mod task;
mod worker;

use std::thread;
use std::time::Instant;

use log::info;

pub use self::task::Message;
pub use self::task::Task;
pub use self::task::TaskOutcome;
use self::worker::execute_phase_task;
use self::worker::worker_loop;
use self::worker::WorkerContext;
use crate::catalogue::CatalogueBuilder;
use crate::catalogue::HaloCatalogue;
use crate::communication::get_local_communicators;
use crate::communication::LocalCommunicator;
use crate::communication::SizedCommunicator;
use crate::domain::DomainDecomposition;
use crate::neighbour_search::NeighbourTree;
use crate::parameters::FinderParameters;
use crate::phase_space::PhaseSpaceTask;
use crate::snapshot::Snapshot;
use crate::stitch::merge_spanning_halos;

/// Largest task the coordinator will run itself while no worker is
/// asking for work.
const COORDINATOR_TASK_MAX_PARTS: usize = 1000;

const COUNT_TABLE_THRESHOLDS: [usize; 8] = [10, 15, 20, 50, 100, 500, 1000, 10000];

/// Run the full halo finder over a snapshot: spatial FOF distributed
/// over `num_workers` workers, cross-worker stitching, phase-space
/// refinement of every stitched halo and (optionally) of its
/// substructure, and assembly of the final catalogue.
pub fn run(
    snapshot: &Snapshot,
    params: &FinderParameters,
    num_workers: usize,
) -> HaloCatalogue {
    assert!(num_workers > 0, "Need at least one worker");
    let decomposition = DomainDecomposition::new(snapshot.npart, num_workers, params.n_cells);
    let coords: Vec<[f64; 3]> = snapshot.positions.iter().map(|pos| pos.to_array()).collect();
    // The full-box tree is built once here and then read by all ranks.
    let build_start = Instant::now();
    let global_tree = NeighbourTree::periodic(&coords, snapshot.boxsize);
    info!(
        "Domain decomposition into {} cells, tree built in {:.2?}",
        decomposition.num_cells(),
        build_start.elapsed()
    );
    let mut spatial_comms = get_local_communicators::<Message>(num_workers + 1);
    let mut phase_comms = get_local_communicators::<Message>(num_workers + 1);
    let spatial_comm = spatial_comms.remove(0);
    let phase_comm = phase_comms.remove(0);
    thread::scope(|scope| {
        for (worker_spatial, worker_phase) in
            spatial_comms.into_iter().zip(phase_comms.into_iter())
        {
            let ctx = WorkerContext {
                snapshot,
                params,
                decomposition: &decomposition,
                global_tree: &global_tree,
                coords: &coords,
            };
            scope.spawn(move || worker_loop(worker_spatial, worker_phase, ctx));
        }
        let ctx = WorkerContext {
            snapshot,
            params,
            decomposition: &decomposition,
            global_tree: &global_tree,
            coords: &coords,
        };
        let hosts = spatial_stage(&spatial_comm, &ctx);
        log_count_table("Spatial halos", hosts.iter().map(|pids| pids.len()));
        phase_stage(&phase_comm, &ctx, hosts)
    })
}

/// Distribute the spatial cells, then stitch the per-worker halo sets
/// into host candidates.
fn spatial_stage(
    comm: &LocalCommunicator<Message>,
    ctx: &WorkerContext,
) -> Vec<Vec<usize>> {
    let start = Instant::now();
    let num_workers = comm.size() - 1;
    let mut queue: Vec<Task> = (0..ctx.decomposition.num_cells())
        .rev()
        .map(Task::SpatialCell)
        .collect();
    let mut fragments: Vec<Vec<usize>> = vec![];
    let mut closed_workers = 0;
    while closed_workers < num_workers {
        let (source, message) = comm.receive_any();
        match message {
            Message::Ready => match queue.pop() {
                Some(task) => comm.send(source, Message::Start(task)),
                None => comm.send(source, Message::Exit),
            },
            Message::Done(TaskOutcome::SpatialDone) => {}
            Message::Done(TaskOutcome::WorkerHalos(halos)) => fragments.extend(halos),
            Message::Exit => closed_workers += 1,
            message => panic!("Unexpected message on the coordinator: {message:?}"),
        }
    }
    info!("Spatial stage finished in {:.2?}", start.elapsed());
    merge_spanning_halos(&fragments, ctx.params.part_threshold)
}

/// Master loop of the phase-space stage: serve tasks to whichever
/// worker reports ready, turn finished hosts into subhalo tasks, and
/// opportunistically run small tasks locally while no requests are
/// pending.
fn phase_stage(
    comm: &LocalCommunicator<Message>,
    ctx: &WorkerContext,
    hosts: Vec<Vec<usize>>,
) -> HaloCatalogue {
    let start = Instant::now();
    let num_workers = comm.size() - 1;
    let mut builder = CatalogueBuilder::new(ctx.snapshot, ctx.params);
    let mut queue: Vec<Task> = hosts
        .into_iter()
        .map(|pids| Task::HostPhase(PhaseSpaceTask::new(pids, ctx.params.ini_alpha_v)))
        .collect();
    let mut spatial_sub_sizes: Vec<usize> = vec![];
    let mut closed_workers = 0;
    while closed_workers < num_workers {
        let (source, message) = match comm.try_receive_any() {
            Some(received) => received,
            None => {
                if let Some(task) = pop_small_task(&mut queue) {
                    let outcome = execute_phase_task(ctx, task);
                    process_outcome(outcome, ctx, &mut builder, &mut queue, &mut spatial_sub_sizes);
                    continue;
                }
                comm.receive_any()
            }
        };
        match message {
            Message::Ready => match queue.pop() {
                Some(task) => comm.send(source, Message::Start(task)),
                None => comm.send(source, Message::Exit),
            },
            Message::Done(outcome) => {
                process_outcome(outcome, ctx, &mut builder, &mut queue, &mut spatial_sub_sizes)
            }
            Message::Exit => closed_workers += 1,
            message => panic!("Unexpected message on the coordinator: {message:?}"),
        }
    }
    // Tasks spawned after the last worker was released are finished
    // here.
    while let Some(task) = queue.pop() {
        let outcome = execute_phase_task(ctx, task);
        process_outcome(outcome, ctx, &mut builder, &mut queue, &mut spatial_sub_sizes);
    }
    info!("Phase-space stage finished in {:.2?}", start.elapsed());
    log_count_table("Phase-space halos", builder.host_nparts().iter().copied());
    if ctx.params.findsubs {
        log_count_table("Spatial subhalos", spatial_sub_sizes.iter().copied());
        log_count_table("Phase-space subhalos", builder.subhalo_nparts().iter().copied());
    }
    builder.build()
}

fn process_outcome(
    outcome: TaskOutcome,
    ctx: &WorkerContext,
    builder: &mut CatalogueBuilder,
    queue: &mut Vec<Task>,
    spatial_sub_sizes: &mut Vec<usize>,
) {
    match outcome {
        TaskOutcome::HostHalos(halos) => {
            for halo in halos {
                if ctx.params.findsubs {
                    queue.push(Task::SubSpatial(halo.pids.clone()));
                }
                builder.add_host(halo);
            }
        }
        TaskOutcome::SubSpatialGroups(groups) => {
            for pids in groups {
                spatial_sub_sizes.push(pids.len());
                queue.push(Task::SubPhase(PhaseSpaceTask::new(
                    pids,
                    ctx.params.ini_alpha_v,
                )));
            }
        }
        TaskOutcome::SubHalos(halos) => {
            for halo in halos {
                builder.add_subhalo(halo);
            }
        }
        outcome => panic!("Unexpected outcome in the phase stage: {outcome:?}"),
    }
}

fn pop_small_task(queue: &mut Vec<Task>) -> Option<Task> {
    let index = queue.iter().position(|task| {
        task.npart()
            .map_or(false, |npart| npart <= COORDINATOR_TASK_MAX_PARTS)
    })?;
    Some(queue.swap_remove(index))
}

fn log_count_table(label: &str, nparts: impl Iterator<Item = usize> + Clone) {
    info!("=========================== {label} ===========================");
    for threshold in COUNT_TABLE_THRESHOLDS {
        let count = nparts.clone().filter(|&npart| npart >= threshold).count();
        info!("{count:>8} found with {threshold} or more particles");
    }
}
