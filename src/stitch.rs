use std::collections::HashMap;
use std::ops::Range;

use crate::fof::UnionFind;

/// Merge halo fragments that share at least one particle by treating
/// every fragment as a hyperedge over particle IDs and collecting the
/// connected components of the resulting graph.
///
/// Returns one sorted member list per component, ordered by the
/// smallest contained particle ID. Components below `min_parts` are
/// dropped unless `keep_small` accepts them.
fn merge_components(
    fragments: &[Vec<usize>],
    min_parts: usize,
    mut keep_small: impl FnMut(&[usize]) -> bool,
) -> Vec<Vec<usize>> {
    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut pids: Vec<usize> = vec![];
    let mut components = UnionFind::new();
    for fragment in fragments {
        let mut previous: Option<usize> = None;
        for &pid in fragment {
            let slot = *slots.entry(pid).or_insert_with(|| {
                pids.push(pid);
                components.make_set()
            });
            if let Some(previous) = previous {
                components.union(previous, slot);
            }
            previous = Some(slot);
        }
    }
    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for slot in 0..pids.len() {
        let root = components.find(slot);
        members.entry(root).or_default().push(pids[slot]);
    }
    let mut merged: Vec<Vec<usize>> = members
        .into_values()
        .map(|mut member_pids| {
            member_pids.sort();
            member_pids
        })
        .filter(|member_pids| member_pids.len() >= min_parts || keep_small(member_pids))
        .collect();
    merged.sort_by_key(|member_pids| member_pids[0]);
    merged
}

/// Consolidate the spatial halos collected from all workers into one
/// halo per connected component, keeping only those with at least
/// `min_parts` members.
pub fn merge_spanning_halos(fragments: &[Vec<usize>], min_parts: usize) -> Vec<Vec<usize>> {
    merge_components(fragments, min_parts, |_| false)
}

/// Per-worker consolidation, run before results are shipped to the
/// coordinator. A component below the particle threshold is kept only
/// when it reaches outside the ID ranges this worker has processed:
/// the rest of its halo may live on another worker.
pub fn merge_worker_halos(
    fragments: &[Vec<usize>],
    processed: &[Range<usize>],
    min_parts: usize,
) -> Vec<Vec<usize>> {
    merge_components(fragments, min_parts, |member_pids| {
        member_pids
            .iter()
            .any(|&pid| !processed.iter().any(|range| range.contains(&pid)))
    })
}

#[cfg(test)]
mod tests {
    use super::merge_spanning_halos;
    use super::merge_worker_halos;

    #[test]
    fn overlapping_fragments_are_merged() {
        let fragments = vec![
            vec![0, 1, 2, 3, 4, 5],
            vec![5, 6, 7, 8, 9, 10],
            vec![20, 21, 22, 23, 24, 25, 26, 27, 28, 29],
        ];
        let merged = merge_spanning_halos(&fragments, 10);
        assert_eq!(
            merged,
            vec![
                vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                vec![20, 21, 22, 23, 24, 25, 26, 27, 28, 29],
            ]
        );
    }

    #[test]
    fn small_components_are_dropped() {
        let fragments = vec![vec![0, 1, 2], vec![10, 11]];
        assert!(merge_spanning_halos(&fragments, 10).is_empty());
    }

    #[test]
    fn ten_particles_survive_nine_do_not() {
        let fragments = vec![(0..10).collect::<Vec<_>>(), (20..29).collect::<Vec<_>>()];
        let merged = merge_spanning_halos(&fragments, 10);
        assert_eq!(merged, vec![(0..10).collect::<Vec<_>>()]);
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let fragments = vec![vec![3, 1, 2], vec![2, 7], vec![30, 31]];
        let merged = merge_spanning_halos(&fragments, 2);
        let remerged = merge_spanning_halos(&merged, 2);
        assert_eq!(merged, remerged);
    }

    #[test]
    fn worker_keeps_small_fragments_reaching_other_ranks() {
        let fragments = vec![
            // Entirely inside the processed range and too small: dropped.
            vec![0, 1, 2],
            // Reaches outside the processed range: kept despite its size.
            vec![8, 9, 10, 11],
        ];
        let merged = merge_worker_halos(&fragments, &[0..10], 10);
        assert_eq!(merged, vec![vec![8, 9, 10, 11]]);
    }
}
