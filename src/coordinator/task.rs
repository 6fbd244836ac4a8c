use crate::phase_space::PhaseSpaceTask;
use crate::phase_space::RefinedHalo;

/// A unit of work handed to a worker.
#[derive(Clone, Debug)]
pub enum Task {
    /// Spatial FOF over one cell of the domain decomposition.
    SpatialCell(usize),
    /// Phase-space refinement of one stitched spatial halo.
    HostPhase(PhaseSpaceTask),
    /// Spatial FOF at the subhalo linking length over one host's
    /// particles.
    SubSpatial(Vec<usize>),
    /// Phase-space refinement of one spatial subhalo.
    SubPhase(PhaseSpaceTask),
}

impl Task {
    /// Number of particles a phase-stage task touches. The
    /// coordinator uses this to pick tasks it may run itself.
    pub fn npart(&self) -> Option<usize> {
        match self {
            Task::SpatialCell(_) => None,
            Task::HostPhase(task) | Task::SubPhase(task) => Some(task.npart()),
            Task::SubSpatial(pids) => Some(pids.len()),
        }
    }
}

/// What a finished task sends back.
#[derive(Debug)]
pub enum TaskOutcome {
    /// A spatial cell was processed; its halo sets stay on the worker
    /// until the stage drains.
    SpatialDone,
    /// The worker's pre-stitched spatial halos, sent when the spatial
    /// stage winds down.
    WorkerHalos(Vec<Vec<usize>>),
    HostHalos(Vec<RefinedHalo>),
    SubSpatialGroups(Vec<Vec<usize>>),
    SubHalos(Vec<RefinedHalo>),
}

/// The coordinator-worker protocol. Workers announce themselves with
/// `Ready`, receive `Start` or `Exit`, and report results with
/// `Done`. A worker acknowledges `Exit` by echoing it and completes
/// no further work afterwards.
#[derive(Debug)]
pub enum Message {
    Ready,
    Start(Task),
    Done(TaskOutcome),
    Exit,
}
