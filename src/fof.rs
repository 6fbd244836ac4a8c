use std::collections::BTreeMap;
use std::ops::Range;

use crate::neighbour_search::NeighbourTree;

/// Label of a particle whose radius-neighbourhood contains only
/// itself. Such particles belong to no group.
pub const SINGLETON: i64 = -2;
const UNASSIGNED: i64 = -1;

/// Disjoint-set forest over group labels. Union always links towards
/// the smaller root, so the representative of a component is the
/// minimum label ever assigned to it.
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self { parent: vec![] }
    }

    pub fn make_set(&mut self) -> usize {
        let label = self.parent.len();
        self.parent.push(label);
        label
    }

    pub fn find(&mut self, label: usize) -> usize {
        let mut root = label;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        let mut current = label;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let root_a = self.find(a);
        let root_b = self.find(b);
        let min = root_a.min(root_b);
        let max = root_a.max(root_b);
        self.parent[max] = min;
        min
    }
}

/// The outcome of a friends-of-friends pass: a label per point
/// ([`SINGLETON`] for isolated points, `-1` for points never visited
/// by any query) and the member lists of all non-trivial groups.
pub struct FofResult {
    pub labels: Vec<i64>,
    pub groups: Vec<Vec<usize>>,
}

/// Friends-of-friends over all indexed points.
pub fn friends_of_friends<const K: usize>(
    tree: &NeighbourTree<K>,
    points: &[[f64; K]],
    radius: f64,
) -> FofResult {
    friends_of_friends_over(tree, points, radius, 0..points.len())
}

/// Friends-of-friends where only the points in `queries` are used as
/// query centres. Neighbours outside the query range still join the
/// groups they are linked into; points never returned by any query
/// remain unassigned.
pub fn friends_of_friends_over<const K: usize>(
    tree: &NeighbourTree<K>,
    points: &[[f64; K]],
    radius: f64,
    queries: Range<usize>,
) -> FofResult {
    let mut labels = vec![UNASSIGNED; points.len()];
    let mut components = UnionFind::new();

    for index in queries {
        let neighbours = tree.neighbours_within(points[index], radius);
        assert!(
            !neighbours.is_empty(),
            "A radius query must return the point it is centred on"
        );
        if neighbours.len() == 1 && labels[index] == UNASSIGNED {
            labels[index] = SINGLETON;
            continue;
        }
        let assigned: Vec<usize> = neighbours
            .iter()
            .filter(|&&neighbour| labels[neighbour] >= 0)
            .map(|&neighbour| labels[neighbour] as usize)
            .collect();
        let group = match assigned.split_first() {
            None => components.make_set(),
            Some((&first, rest)) => {
                let mut group = components.find(first);
                for &other in rest {
                    group = components.union(group, other);
                }
                group
            }
        };
        for &neighbour in neighbours.iter() {
            if labels[neighbour] == UNASSIGNED {
                labels[neighbour] = group as i64;
            }
        }
    }

    // Second pass: rewrite every label to its component root and
    // coalesce the member lists.
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for index in 0..labels.len() {
        if labels[index] >= 0 {
            let root = components.find(labels[index] as usize);
            labels[index] = root as i64;
            groups.entry(root).or_default().push(index);
        }
    }
    FofResult {
        labels,
        groups: groups.into_values().collect(),
    }
}
