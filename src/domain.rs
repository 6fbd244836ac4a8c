use std::ops::Range;

/// The static decomposition of the particle-ID space: one contiguous
/// range per worker plus the finer-grained list of spatial task cells
/// that the coordinator hands out dynamically.
#[derive(Clone, Debug)]
pub struct DomainDecomposition {
    cells: Vec<Range<usize>>,
    worker_ranges: Vec<Range<usize>>,
}

impl DomainDecomposition {
    pub fn new(npart: usize, num_workers: usize, requested_cells: usize) -> Self {
        assert!(num_workers > 0, "Need at least one worker");
        // At least one cell per worker, and a multiple of the worker
        // count so that the spatial work divides evenly.
        let mut num_cells = requested_cells.max(num_workers);
        if num_cells % num_workers != 0 {
            num_cells += num_workers - num_cells % num_workers;
        }
        let cells = (0..num_cells)
            .map(|cell| cell * npart / num_cells..(cell + 1) * npart / num_cells)
            .collect();
        let per_worker = (npart + num_workers - 1) / num_workers;
        let worker_ranges = (0..num_workers)
            .map(|worker| {
                let start = (worker * per_worker).min(npart);
                let end = ((worker + 1) * per_worker).min(npart);
                start..end
            })
            .collect();
        Self {
            cells,
            worker_ranges,
        }
    }

    pub fn cells(&self) -> &[Range<usize>] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn worker_range(&self, worker: usize) -> Range<usize> {
        self.worker_ranges[worker].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::DomainDecomposition;

    #[test]
    fn cells_cover_all_particles_without_overlap() {
        let decomposition = DomainDecomposition::new(1003, 4, 10);
        let mut covered = 0;
        for cell in decomposition.cells() {
            assert_eq!(cell.start, covered);
            covered = cell.end;
        }
        assert_eq!(covered, 1003);
    }

    #[test]
    fn cell_count_is_rounded_to_a_worker_multiple() {
        assert_eq!(DomainDecomposition::new(100, 4, 10).num_cells(), 12);
        assert_eq!(DomainDecomposition::new(100, 4, 16).num_cells(), 16);
        // Fewer requested cells than workers.
        assert_eq!(DomainDecomposition::new(100, 8, 2).num_cells(), 8);
    }

    #[test]
    fn worker_ranges_are_ceil_sized() {
        let decomposition = DomainDecomposition::new(10, 3, 3);
        assert_eq!(decomposition.worker_range(0), 0..4);
        assert_eq!(decomposition.worker_range(1), 4..8);
        assert_eq!(decomposition.worker_range(2), 8..10);
    }
}
