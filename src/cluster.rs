//! Greedy single-pass clustering of entities by Jaccard similarity.
//!
//! Each round draws a pivot uniformly from the entities not yet clustered.
//! A pivot with no members is reported on its own as a degenerate entity.
//! Otherwise every remaining entity whose Jaccard similarity to the pivot is
//! at least the threshold joins the pivot's cluster, and the rest carry over
//! to the next round. Rounds repeat until no entities remain, so the output
//! partitions the population.

use std::fmt;
use std::io::Write;

use itertools::Itertools;
use rand::Rng;

use crate::bit_vector::BitVectorStore;
use crate::error::Result;
use crate::progress::progress_bar;

/// Jaccard similarity of vectors `a` and `b`; 0 when both are empty.
pub fn jaccard(store: &BitVectorStore, a: usize, b: usize) -> f64 {
    let union = store.union_count(a, b);
    if union == 0 {
        return 0.0;
    }

    store.intersection_count(a, b) as f64 / union as f64
}

/// Outcome of one clustering round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterEvent {
    /// Pivot had no members and was removed without forming a cluster.
    Degenerate(usize),
    /// Pivot followed by the entities absorbed into its cluster.
    Cluster(Vec<usize>),
}

impl fmt::Display for ClusterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterEvent::Degenerate(id) => write!(f, "x {}", id),
            ClusterEvent::Cluster(members) => write!(f, "{}", members.iter().join(" ")),
        }
    }
}

/// Totals reported once clustering finishes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterSummary {
    pub clusters: usize,
    pub singletons: usize,
    pub degenerate: usize,
}

pub struct GreedyClusterer<'a> {
    store: &'a BitVectorStore,
    threshold: f64,
    pool: Vec<usize>,
}

impl<'a> GreedyClusterer<'a> {
    /// Start with every entity in `store` unclustered, in index order.
    pub fn new(store: &'a BitVectorStore, threshold: f64) -> Self {
        GreedyClusterer {
            store,
            threshold,
            pool: (0..store.len()).collect(),
        }
    }

    /// Entities not yet assigned, in their original relative order.
    pub fn unclustered(&self) -> &[usize] {
        &self.pool
    }

    /// Run one round, or return `None` once every entity has been assigned.
    pub fn next_group<R: Rng>(&mut self, rng: &mut R) -> Option<ClusterEvent> {
        if self.pool.is_empty() {
            return None;
        }

        let pivot = self.pool.remove(rng.gen_range(0..self.pool.len()));
        if self.store.cardinality(pivot) == 0 {
            return Some(ClusterEvent::Degenerate(pivot));
        }

        let mut cluster = vec![pivot];
        let mut remaining = Vec::with_capacity(self.pool.len());
        for &i in &self.pool {
            if jaccard(self.store, pivot, i) >= self.threshold {
                cluster.push(i);
            } else {
                remaining.push(i);
            }
        }
        self.pool = remaining;

        Some(ClusterEvent::Cluster(cluster))
    }

    /// Cluster the whole pool, writing one line per round to `writer`.
    pub fn write_all<R: Rng, W: Write>(&mut self, rng: &mut R, writer: &mut W) -> Result<ClusterSummary> {
        let mut summary = ClusterSummary::default();
        let progress_bar = progress_bar(self.pool.len() as u64);

        while let Some(event) = self.next_group(rng) {
            match &event {
                ClusterEvent::Degenerate(_) => {
                    summary.degenerate += 1;
                    progress_bar.inc(1);
                }
                ClusterEvent::Cluster(members) => {
                    summary.clusters += 1;
                    if members.len() == 1 {
                        summary.singletons += 1;
                    }
                    progress_bar.inc(members.len() as u64);
                }
            }
            writeln!(writer, "{}", event)?;
        }
        progress_bar.finish();

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_vector::BitVector;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    // A=[1,1,0,0], B=[1,0,1,0], C=[0,0,0,0], D=[1,1,1,0]
    fn example_store() -> BitVectorStore {
        let vectors = vec![
            BitVector::from_indices(4, &[0, 1]).unwrap(),
            BitVector::from_indices(4, &[0, 2]).unwrap(),
            BitVector::from_indices(4, &[]).unwrap(),
            BitVector::from_indices(4, &[0, 1, 2]).unwrap(),
        ];
        BitVectorStore::from_vectors(4, vectors).unwrap()
    }

    fn random_store(entities: usize, width: usize, rng: &mut Xoshiro256StarStar) -> BitVectorStore {
        let mut store = BitVectorStore::new(entities, width).unwrap();
        for e in 0..entities {
            // a few fully empty entities
            if e % 7 == 3 {
                continue;
            }
            for b in 0..width {
                if rng.gen_bool(0.4) {
                    store.set(e, b).unwrap();
                }
            }
        }
        store
    }

    fn collect_events<R: Rng>(clusterer: &mut GreedyClusterer, rng: &mut R) -> Vec<ClusterEvent> {
        std::iter::from_fn(|| clusterer.next_group(rng)).collect()
    }

    #[test]
    fn test_jaccard_values() {
        let store = example_store();
        assert!((jaccard(&store, 0, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((jaccard(&store, 0, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert!((jaccard(&store, 1, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard(&store, 0, 2), 0.0);
    }

    #[test]
    fn test_jaccard_properties() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        let store = random_store(15, 100, &mut rng);
        for a in 0..store.len() {
            for b in 0..store.len() {
                assert_eq!(jaccard(&store, a, b), jaccard(&store, b, a));
            }
            let expected = if store.cardinality(a) > 0 { 1.0 } else { 0.0 };
            assert_eq!(jaccard(&store, a, a), expected);
        }
    }

    #[test]
    fn test_example_first_pivot() {
        // a constant zero stream always picks the first pooled entity
        let store = example_store();
        let mut rng = StepRng::new(0, 0);
        let mut clusterer = GreedyClusterer::new(&store, 0.5);

        let events = collect_events(&mut clusterer, &mut rng);
        assert_eq!(
            events,
            vec![
                ClusterEvent::Cluster(vec![0, 3]),
                ClusterEvent::Cluster(vec![1]),
                ClusterEvent::Degenerate(2),
            ]
        );
        assert!(clusterer.unclustered().is_empty());
    }

    #[test]
    fn test_example_seeded() {
        let store = example_store();
        let allowed: Vec<Vec<Vec<usize>>> = vec![
            vec![vec![0, 1, 3]],
            vec![vec![0, 3], vec![1]],
            vec![vec![0], vec![1, 3]],
        ];

        for seed in 0..20 {
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            let mut clusterer = GreedyClusterer::new(&store, 0.5);
            let events = collect_events(&mut clusterer, &mut rng);

            // C is empty, so it can only ever leave the pool as a pivot
            assert!(events.contains(&ClusterEvent::Degenerate(2)));

            let mut clusters: Vec<Vec<usize>> = events
                .iter()
                .filter_map(|e| match e {
                    ClusterEvent::Cluster(m) => Some(m.iter().copied().sorted().collect()),
                    ClusterEvent::Degenerate(_) => None,
                })
                .collect();
            clusters.sort();
            assert!(allowed.contains(&clusters), "seed {}: {:?}", seed, clusters);

            // same seed, same outcome
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            let mut clusterer = GreedyClusterer::new(&store, 0.5);
            assert_eq!(collect_events(&mut clusterer, &mut rng), events);
        }
    }

    #[test]
    fn test_partition() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(17);
        let store = random_store(40, 64, &mut rng);

        for threshold in [0.0, 0.2, 0.5, 1.0] {
            let mut clusterer = GreedyClusterer::new(&store, threshold);
            let events = collect_events(&mut clusterer, &mut rng);

            let mut seen: Vec<usize> = events
                .iter()
                .flat_map(|e| match e {
                    ClusterEvent::Degenerate(id) => vec![*id],
                    ClusterEvent::Cluster(m) => m.clone(),
                })
                .collect();
            seen.sort();
            assert_eq!(seen, (0..40).collect::<Vec<_>>());

            for event in &events {
                if let ClusterEvent::Degenerate(id) = event {
                    assert_eq!(store.cardinality(*id), 0);
                }
            }
        }
    }

    #[test]
    fn test_members_meet_threshold() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(23);
        let store = random_store(30, 32, &mut rng);
        let mut clusterer = GreedyClusterer::new(&store, 0.3);

        for event in collect_events(&mut clusterer, &mut rng) {
            if let ClusterEvent::Cluster(members) = event {
                let pivot = members[0];
                for &m in &members[1..] {
                    assert!(jaccard(&store, pivot, m) >= 0.3);
                }
            }
        }
    }

    #[test]
    fn test_write_all() {
        let store = example_store();
        let mut rng = StepRng::new(0, 0);
        let mut clusterer = GreedyClusterer::new(&store, 0.5);

        let mut out = Vec::new();
        let summary = clusterer.write_all(&mut rng, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "0 3\n1\nx 2\n");
        assert_eq!(
            summary,
            ClusterSummary {
                clusters: 2,
                singletons: 1,
                degenerate: 1,
            }
        );
    }

    #[test]
    fn test_empty_store() {
        let store = BitVectorStore::new(0, 10).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let mut clusterer = GreedyClusterer::new(&store, 0.8);
        assert!(clusterer.next_group(&mut rng).is_none());
    }
}
