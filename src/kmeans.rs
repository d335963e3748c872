//! K-means clustering with a pluggable distance function.
//!
//! Points are borrowed for the whole run and clusters refer to them by index.
//!
//! # Seeding
//!
//! The first centroid is a uniformly random point. Every further centroid is
//! picked deterministically: each point keeps a running score, the sum of its
//! distances to every centroid chosen so far, and the unchosen point with the
//! highest positive score wins. When no point has a positive score the
//! seeding stops early, so fewer than `k` clusters may come back.
//!
//! # Iteration
//!
//! Lloyd's algorithm: assign every point to its nearest centroid (first
//! minimum on ties), move every centroid to the mean of its members, repeat
//! until no assignment changes. Clusters that end up empty get a new centroid
//! drawn uniformly from the bounding box of all points.

use tracing::{debug, warn};

use crate::{Error, Result, random::RandomSource};

/// Iteration cap used unless overridden
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// A centroid plus the indices of the points currently assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: Vec<f64>,
    /// Indices into the point slice, in ascending order
    pub members: Vec<usize>,
    /// Largest distance from the centroid to any member
    pub radius: f64,
}

impl Cluster {
    fn new(centroid: Vec<f64>) -> Self {
        Self {
            centroid,
            members: Vec::new(),
            radius: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Outcome of a clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Number of assignment passes performed
    pub iterations: usize,
    /// False when the iteration cap was hit before assignments settled
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct KMeans<'a> {
    points: &'a [Vec<f64>],
    dim: usize,
    max_iterations: usize,
}

impl<'a> KMeans<'a> {
    /// Borrow a set of points that must all have `dim` coordinates
    pub fn new(points: &'a [Vec<f64>], dim: usize) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }
        if let Some(point) = points.iter().find(|p| p.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: point.len(),
            });
        }
        Ok(Self {
            points,
            dim,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        })
    }

    /// Cap the number of Lloyd iterations, zero means unlimited
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Cluster with Euclidean distance
    pub fn cluster_euclidean<R: RandomSource>(&self, k: usize, rng: &mut R) -> Result<Clustering> {
        self.cluster(k, crate::color_space::euclidean, rng)
    }

    /// Partition the points into at most `k` clusters
    pub fn cluster<D, R>(&self, k: usize, distance: D, rng: &mut R) -> Result<Clustering>
    where
        D: Fn(&[f64], &[f64]) -> f64,
        R: RandomSource,
    {
        let n = self.points.len();
        if k < 1 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                points: n,
            });
        }

        let limits = self.bounding_box();
        let mut clusters: Vec<Cluster> = self
            .seed_centroids(k, &distance, rng)
            .into_iter()
            .map(|index| Cluster::new(self.points[index].clone()))
            .collect();
        debug!("seeded {} of {} requested clusters", clusters.len(), k);

        let mut assignments: Vec<Option<usize>> = vec![None; n];
        let mut iterations = 0;
        loop {
            iterations += 1;
            let changed = self.assign(&mut clusters, &mut assignments, &distance);
            self.update_centroids(&mut clusters, &limits, rng);
            if !changed {
                debug!("converged after {iterations} iterations");
                return Ok(Clustering {
                    clusters,
                    iterations,
                    converged: true,
                });
            }
            if self.max_iterations > 0 && iterations >= self.max_iterations {
                warn!("no convergence after {iterations} iterations, keeping last state");
                return Ok(Clustering {
                    clusters,
                    iterations,
                    converged: false,
                });
            }
        }
    }

    /// Per-dimension (min, max) over all points
    fn bounding_box(&self) -> Vec<(f64, f64)> {
        (0..self.dim)
            .map(|d| {
                self.points
                    .iter()
                    .map(|p| p[d])
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    })
            })
            .collect()
    }

    /// Pick seed point indices using accumulated distances to chosen seeds
    fn seed_centroids<D, R>(&self, k: usize, distance: &D, rng: &mut R) -> Vec<usize>
    where
        D: Fn(&[f64], &[f64]) -> f64,
        R: RandomSource,
    {
        let n = self.points.len();
        let mut scores = vec![0.0; n];
        let mut chosen = vec![false; n];

        let mut last = rng.randint(0, n);
        chosen[last] = true;
        let mut seeds = vec![last];

        for _ in 1..k {
            let mut best: Option<usize> = None;
            let mut best_score = 0.0;
            for (j, point) in self.points.iter().enumerate() {
                scores[j] += distance(&self.points[last], point);
                if scores[j] > best_score && !chosen[j] {
                    best_score = scores[j];
                    best = Some(j);
                }
            }
            let Some(next) = best else {
                break;
            };
            chosen[next] = true;
            seeds.push(next);
            last = next;
        }
        seeds
    }

    /// Reassign every point to its nearest centroid, returning whether anything moved
    fn assign<D>(
        &self,
        clusters: &mut [Cluster],
        assignments: &mut [Option<usize>],
        distance: &D,
    ) -> bool
    where
        D: Fn(&[f64], &[f64]) -> f64,
    {
        for cluster in clusters.iter_mut() {
            cluster.members.clear();
            cluster.radius = 0.0;
        }

        let mut changed = false;
        for (j, point) in self.points.iter().enumerate() {
            let mut nearest: Option<(usize, f64)> = None;
            for (i, cluster) in clusters.iter().enumerate() {
                let dist = distance(&cluster.centroid, point);
                if dist < nearest.map_or(f64::INFINITY, |(_, d)| d) {
                    nearest = Some((i, dist));
                }
            }
            // A distance of NaN or infinity everywhere leaves the point unassigned
            let Some((i, dist)) = nearest else {
                continue;
            };
            let cluster = &mut clusters[i];
            cluster.members.push(j);
            if dist > cluster.radius {
                cluster.radius = dist;
            }
            if assignments[j] != Some(i) {
                assignments[j] = Some(i);
                changed = true;
            }
        }
        changed
    }

    fn update_centroids<R: RandomSource>(
        &self,
        clusters: &mut [Cluster],
        limits: &[(f64, f64)],
        rng: &mut R,
    ) {
        for cluster in clusters.iter_mut() {
            if cluster.is_empty() {
                for (d, &(lo, hi)) in limits.iter().enumerate() {
                    cluster.centroid[d] = rng.uniform(lo, hi);
                }
                continue;
            }
            let count = cluster.len() as f64;
            for d in 0..self.dim {
                let sum: f64 = cluster.members.iter().map(|&j| self.points[j][d]).sum();
                cluster.centroid[d] = sum / count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_space::euclidean;
    use crate::random::SeededRandom;

    /// Random source replaying fixed values, for checking the draw order
    struct Scripted {
        ints: Vec<usize>,
        reals: Vec<f64>,
        uniform_calls: Vec<(f64, f64)>,
    }

    impl RandomSource for Scripted {
        fn randint(&mut self, _min: usize, _max: usize) -> usize {
            self.ints.remove(0)
        }
        fn uniform(&mut self, min: f64, max: f64) -> f64 {
            self.uniform_calls.push((min, max));
            self.reals.remove(0)
        }
    }

    fn scripted(ints: &[usize]) -> Scripted {
        Scripted {
            ints: ints.to_vec(),
            reals: Vec::new(),
            uniform_calls: Vec::new(),
        }
    }

    fn two_groups() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![10.2, 10.0],
        ]
    }

    #[test]
    fn test_separates_two_groups() {
        let points = two_groups();
        let kmeans = KMeans::new(&points, 2).unwrap();
        let result = kmeans
            .cluster_euclidean(2, &mut SeededRandom::from_seed(42))
            .unwrap();
        assert!(result.converged);
        let mut memberships: Vec<_> = result.clusters.iter().map(|c| c.members.clone()).collect();
        memberships.sort();
        assert_eq!(memberships, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_seeding_accumulates_distances() {
        // On a line: 0, 1, 2, 10. Starting at index 1 (x=1) the farthest is 10.
        // Scores are then [1,0,1,9] + [10,9,8,0] = [11,9,9,9], so index 0 wins
        // even though 2 has the same minimum distance to the chosen seeds.
        let points = vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]];
        let kmeans = KMeans::new(&points, 1).unwrap();
        let seeds = kmeans.seed_centroids(3, &euclidean, &mut scripted(&[1]));
        assert_eq!(seeds, vec![1, 3, 0]);
    }

    #[test]
    fn test_seeding_stops_without_distinct_points() {
        let points = vec![vec![5.0, 5.0]; 10];
        let kmeans = KMeans::new(&points, 2).unwrap();
        let seeds = kmeans.seed_centroids(4, &euclidean, &mut scripted(&[3]));
        assert_eq!(seeds, vec![3]);

        let result = kmeans
            .cluster_euclidean(4, &mut SeededRandom::from_seed(1))
            .unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].len(), 10);
        assert_eq!(result.clusters[0].centroid, vec![5.0, 5.0]);
        assert_eq!(result.clusters[0].radius, 0.0);
    }

    #[test]
    fn test_clusters_partition_points() {
        let points: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![(i % 7) as f64, (i * 13 % 11) as f64, (i % 3) as f64])
            .collect();
        let kmeans = KMeans::new(&points, 3).unwrap();
        let result = kmeans
            .cluster_euclidean(5, &mut SeededRandom::from_seed(9))
            .unwrap();
        let mut seen: Vec<usize> = result
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn test_converged_points_sit_in_nearest_cluster() {
        let points: Vec<Vec<f64>> = (0..80)
            .map(|i| {
                let i = i as f64;
                vec![(i * 0.37).sin() * 20.0, (i * 0.71).cos() * 15.0]
            })
            .collect();
        let kmeans = KMeans::new(&points, 2).unwrap();
        let result = kmeans
            .cluster_euclidean(4, &mut SeededRandom::from_seed(5))
            .unwrap();
        assert!(result.converged);
        for cluster in &result.clusters {
            for &j in &cluster.members {
                let own = euclidean(&cluster.centroid, &points[j]);
                for other in &result.clusters {
                    assert!(own <= euclidean(&other.centroid, &points[j]) + 1e-9);
                }
                assert!(own <= cluster.radius + 1e-9);
            }
        }
    }

    #[test]
    fn test_centroid_is_member_mean() {
        let points = two_groups();
        let kmeans = KMeans::new(&points, 2).unwrap();
        let result = kmeans
            .cluster_euclidean(2, &mut SeededRandom::from_seed(3))
            .unwrap();
        for cluster in &result.clusters {
            for d in 0..2 {
                let mean = cluster.members.iter().map(|&j| points[j][d]).sum::<f64>()
                    / cluster.len() as f64;
                assert!((cluster.centroid[d] - mean).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_single_cluster_is_global_mean() {
        let points = two_groups();
        let kmeans = KMeans::new(&points, 2).unwrap();
        let result = kmeans
            .cluster_euclidean(1, &mut SeededRandom::from_seed(8))
            .unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].len(), 6);
        assert!((result.clusters[0].centroid[0] - 5.1).abs() < 1e-12);
        assert!((result.clusters[0].centroid[1] - 5.0333333333333).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cluster_reseeded_inside_bounding_box() {
        // Two identical points become separate seeds by score, the second
        // identical seed loses every tie and is reseeded from the box
        let points = vec![vec![0.0, 0.0], vec![4.0, 2.0], vec![4.0, 2.0]];
        let kmeans = KMeans::new(&points, 2).unwrap();
        let mut rng = Scripted {
            ints: vec![0],
            reals: vec![1.0, 1.5, 3.0, 0.5],
            uniform_calls: Vec::new(),
        };
        let result = kmeans.cluster(3, euclidean, &mut rng).unwrap();
        assert_eq!(result.clusters.len(), 3);
        assert_eq!(rng.uniform_calls[0], (0.0, 4.0));
        assert_eq!(rng.uniform_calls[1], (0.0, 2.0));
        let sizes: Vec<_> = result.clusters.iter().map(Cluster::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_iteration_cap_returns_last_state() {
        let points = two_groups();
        let kmeans = KMeans::new(&points, 2).unwrap().with_max_iterations(1);
        let result = kmeans
            .cluster_euclidean(2, &mut SeededRandom::from_seed(42))
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert_eq!(result.clusters.iter().map(Cluster::len).sum::<usize>(), 6);
    }

    #[test]
    fn test_same_seed_same_clustering() {
        let points: Vec<Vec<f64>> = (0..40).map(|i| vec![(i * 7 % 13) as f64]).collect();
        let kmeans = KMeans::new(&points, 1).unwrap();
        let a = kmeans
            .cluster_euclidean(4, &mut SeededRandom::from_seed(77))
            .unwrap();
        let b = kmeans
            .cluster_euclidean(4, &mut SeededRandom::from_seed(77))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_cluster_counts() {
        let points = two_groups();
        let kmeans = KMeans::new(&points, 2).unwrap();
        let mut rng = SeededRandom::from_seed(0);
        assert!(matches!(
            kmeans.cluster_euclidean(0, &mut rng),
            Err(Error::InvalidClusterCount { requested: 0, points: 6 })
        ));
        assert!(matches!(
            kmeans.cluster_euclidean(7, &mut rng),
            Err(Error::InvalidClusterCount { requested: 7, points: 6 })
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(KMeans::new(&[], 3), Err(Error::EmptyInput)));
        let points = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]];
        assert!(matches!(
            KMeans::new(&points, 3),
            Err(Error::DimensionMismatch { expected: 3, found: 2 })
        ));
    }
}
