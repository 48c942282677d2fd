//! Improvement history of a worker.

use serde::{Deserialize, Serialize};

/// Number of generation buckets in a progress distribution
pub const BUCKETS: usize = 10;

/// A new global best found at `generation`, shorter than the previous best by `improvement`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub generation: u32,
    pub improvement: f64,
}

/// Append-only log of progress records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressLog {
    records: Vec<ProgressRecord>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, generation: u32, improvement: f64) {
        self.records.push(ProgressRecord {
            generation,
            improvement,
        });
    }

    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all recorded improvements
    pub fn total_improvement(&self) -> f64 {
        self.records.iter().map(|r| r.improvement).sum()
    }

    /// Group the improvements into ten equal slices of `total_generations`.
    ///
    /// Generations are numbered from 1, so generation `g` falls in bucket
    /// `(g - 1) * 10 / total_generations`. Records past the total land in the
    /// last bucket. With fewer than ten generations some buckets cover no
    /// generation at all; see [`ProgressBucket::is_empty_range`].
    pub fn distribution(&self, total_generations: u32) -> Vec<ProgressBucket> {
        let total = total_generations.max(1) as u64;
        let buckets_u64 = BUCKETS as u64;
        // bucket i holds the offsets o with ceil(i * total / 10) <= o < ceil((i + 1) * total / 10)
        let boundary = |i: u64| (i * total + buckets_u64 - 1) / buckets_u64;
        let mut buckets: Vec<ProgressBucket> = (0..buckets_u64)
            .map(|i| ProgressBucket {
                first_generation: (boundary(i) + 1) as u32,
                last_generation: boundary(i + 1) as u32,
                improvement: 0.0,
                share: 0.0,
            })
            .collect();

        for record in &self.records {
            let offset = record.generation.saturating_sub(1) as u64;
            let index = ((offset * BUCKETS as u64) / total).min(BUCKETS as u64 - 1) as usize;
            buckets[index].improvement += record.improvement;
        }

        let overall = self.total_improvement();
        if overall > 0.0 {
            for bucket in &mut buckets {
                bucket.share = bucket.improvement / overall * 100.0;
            }
        }

        buckets
    }
}

/// Improvement found within one tenth of the generations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressBucket {
    pub first_generation: u32,
    pub last_generation: u32,
    pub improvement: f64,
    /// Percentage of the overall improvement
    pub share: f64,
}

impl ProgressBucket {
    /// Whether the bucket covers no generation
    pub fn is_empty_range(&self) -> bool {
        self.first_generation > self.last_generation
    }

    /// Whether renderers should show the bucket
    pub fn is_visible(&self) -> bool {
        !self.is_empty_range() || self.improvement > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_record_lands_in_one_bucket() {
        let mut log = ProgressLog::new();
        for generation in 1..=100 {
            log.record(generation, 1.0);
        }

        let buckets = log.distribution(100);
        assert_eq!(buckets.len(), BUCKETS);
        for bucket in &buckets {
            assert!((bucket.improvement - 10.0).abs() < 1e-10);
            assert!((bucket.share - 10.0).abs() < 1e-10);
        }
        assert_eq!(buckets[0].first_generation, 1);
        assert_eq!(buckets[0].last_generation, 10);
        assert_eq!(buckets[9].last_generation, 100);
    }

    #[test]
    fn test_boundary_generations() {
        let mut log = ProgressLog::new();
        log.record(10, 4.0);
        log.record(11, 6.0);

        let buckets = log.distribution(100);
        assert_eq!(buckets[0].improvement, 4.0);
        assert_eq!(buckets[1].improvement, 6.0);
        assert!((buckets[1].share - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_few_generations_and_overflow() {
        let mut log = ProgressLog::new();
        log.record(1, 2.0);
        log.record(3, 2.0);
        log.record(50, 1.0);

        let buckets = log.distribution(3);
        let total: f64 = buckets.iter().map(|b| b.improvement).sum();
        assert_eq!(total, 5.0);
        assert_eq!(buckets[0].improvement, 2.0);
        assert_eq!(buckets[9].improvement, 1.0);
    }

    #[test]
    fn test_ranges_match_bucket_placement() {
        for total in [1u32, 3, 7, 10, 13, 100, 1234] {
            let buckets = ProgressLog::new().distribution(total);
            let mut covered = 0;
            for (i, bucket) in buckets.iter().enumerate() {
                if bucket.is_empty_range() {
                    continue;
                }
                for generation in bucket.first_generation..=bucket.last_generation {
                    let mut log = ProgressLog::new();
                    log.record(generation, 1.0);
                    assert_eq!(log.distribution(total)[i].improvement, 1.0, "total {}", total);
                    covered += 1;
                }
            }
            assert_eq!(covered, total);
        }
    }

    #[test]
    fn test_short_runs_leave_empty_ranges() {
        let buckets = ProgressLog::new().distribution(3);
        let ranges: Vec<(u32, u32)> = buckets
            .iter()
            .filter(|b| !b.is_empty_range())
            .map(|b| (b.first_generation, b.last_generation))
            .collect();
        assert_eq!(ranges, vec![(1, 1), (2, 2), (3, 3)]);
        assert!(buckets.iter().all(|b| b.first_generation <= b.last_generation + 1));
    }

    #[test]
    fn test_empty_log_has_zero_shares() {
        let buckets = ProgressLog::new().distribution(0);
        assert!(buckets.iter().all(|b| b.improvement == 0.0 && b.share == 0.0));
    }
}
