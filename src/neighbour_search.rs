use kiddo::distance::squared_euclidean;
use kiddo::KdTree;

/// A kd-tree over a fixed set of K-dimensional points, answering
/// radius queries. In periodic mode (3D only in practice) the indexed
/// coordinates are wrapped into `[0, L)` and queries near a box face
/// are repeated for every relevant periodic image of the query point.
pub struct NeighbourTree<const K: usize> {
    tree: KdTree<f64, K>,
    periodic: Option<f64>,
}

impl<const K: usize> NeighbourTree<K> {
    pub fn new(points: &[[f64; K]]) -> Self {
        let coords: Vec<[f64; K]> = points.to_vec();
        Self {
            tree: (&coords).into(),
            periodic: None,
        }
    }

    pub fn periodic(points: &[[f64; K]], side_length: f64) -> Self {
        assert!(side_length > 0.0);
        let coords: Vec<[f64; K]> = points
            .iter()
            .map(|point| {
                let mut wrapped = *point;
                for coord in wrapped.iter_mut() {
                    *coord = coord.rem_euclid(side_length);
                }
                wrapped
            })
            .collect();
        Self {
            tree: (&coords).into(),
            periodic: Some(side_length),
        }
    }

    /// The indices of all indexed points within `radius` of `query`.
    /// The order of the returned indices is unspecified.
    pub fn neighbours_within(&self, query: [f64; K], radius: f64) -> Vec<usize> {
        match self.periodic {
            None => self.collect_within(query, radius),
            Some(side_length) => {
                // A point cannot be within the radius of two distinct
                // images of the query as long as 2r < L.
                debug_assert!(2.0 * radius < side_length);
                let mut wrapped = query;
                for coord in wrapped.iter_mut() {
                    *coord = coord.rem_euclid(side_length);
                }
                let mut neighbours = vec![];
                for image in periodic_images(wrapped, radius, side_length) {
                    neighbours.extend(self.collect_within(image, radius));
                }
                neighbours
            }
        }
    }

    fn collect_within(&self, query: [f64; K], radius: f64) -> Vec<usize> {
        self.tree
            .within(&query, radius * radius, &squared_euclidean)
            .into_iter()
            .map(|neighbour| neighbour.item)
            .collect()
    }
}

/// All images of `query` (itself included) whose radius-neighbourhood
/// intersects the primary box.
fn periodic_images<const K: usize>(
    query: [f64; K],
    radius: f64,
    side_length: f64,
) -> Vec<[f64; K]> {
    let mut images = vec![query];
    for axis in 0..K {
        let shift = if query[axis] < radius {
            Some(side_length)
        } else if query[axis] > side_length - radius {
            Some(-side_length)
        } else {
            None
        };
        if let Some(shift) = shift {
            for i in 0..images.len() {
                let mut image = images[i];
                image[axis] += shift;
                images.push(image);
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;

    use super::NeighbourTree;
    use crate::test_utils::DEFAULT_SEED;

    fn direct_neighbour_search<const K: usize>(
        points: &[[f64; K]],
        query: &[f64; K],
        radius: f64,
        side_length: Option<f64>,
    ) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, point)| {
                let dist2: f64 = (0..K)
                    .map(|axis| {
                        let mut diff = (point[axis] - query[axis]).abs();
                        if let Some(side_length) = side_length {
                            diff = diff.rem_euclid(side_length);
                            diff = diff.min(side_length - diff);
                        }
                        diff * diff
                    })
                    .sum();
                dist2 <= radius * radius
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn random_points<const K: usize>(num: usize, side_length: f64) -> Vec<[f64; K]> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(DEFAULT_SEED);
        (0..num)
            .map(|_| {
                let mut point = [0.0; K];
                for coord in point.iter_mut() {
                    *coord = rng.gen_range(0.0..side_length);
                }
                point
            })
            .collect()
    }

    fn compare_to_direct_search<const K: usize>(periodic: bool) {
        let side_length = 1.0;
        let radius = 0.11;
        let points = random_points::<K>(200, side_length);
        let tree = if periodic {
            NeighbourTree::periodic(&points, side_length)
        } else {
            NeighbourTree::new(&points)
        };
        for query in points.iter() {
            let mut tree_result = tree.neighbours_within(*query, radius);
            let mut direct_result = direct_neighbour_search(
                &points,
                query,
                radius,
                periodic.then_some(side_length),
            );
            tree_result.sort();
            direct_result.sort();
            assert_eq!(tree_result, direct_result);
        }
    }

    #[test]
    fn radius_search_3d() {
        compare_to_direct_search::<3>(false);
    }

    #[test]
    fn radius_search_3d_periodic() {
        compare_to_direct_search::<3>(true);
    }

    #[test]
    fn radius_search_6d() {
        compare_to_direct_search::<6>(false);
    }

    #[test]
    fn query_near_face_finds_wrapped_neighbours() {
        let points = [[0.01, 0.5, 0.5], [0.99, 0.5, 0.5], [0.5, 0.5, 0.5]];
        let tree = NeighbourTree::periodic(&points, 1.0);
        let mut neighbours = tree.neighbours_within([0.01, 0.5, 0.5], 0.05);
        neighbours.sort();
        assert_eq!(neighbours, vec![0, 1]);
    }
}
