//! Global time axis and per-file time ranges.

use crate::config::TimeTolerance;
use crate::data::{MeshFile, MeshSource};
use crate::error::{ExoviewError, Result};
use std::path::PathBuf;

/// Inclusive time interval covered by one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    /// Earliest recorded time.
    pub min: f64,
    /// Latest recorded time.
    pub max: f64,
}

impl TimeRange {
    /// Range spanned by a set of samples, `None` if there are none.
    pub fn of(times: &[f64]) -> Option<Self> {
        let mut finite = times.iter().copied().filter(|t| !t.is_nan());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(Self { min, max })
    }

    /// Check whether `t` lies in the range widened by `tolerance` on both ends.
    pub fn contains(&self, t: f64, tolerance: f64) -> bool {
        self.min - tolerance <= t && t <= self.max + tolerance
    }
}

#[derive(Debug, Clone)]
struct ShardTimes {
    path: PathBuf,
    times: Vec<f64>,
    range: Option<TimeRange>,
}

/// Time axis shared by a set of files.
///
/// Source indices are positions in the list the index was built from.
#[derive(Debug, Clone)]
pub struct TimeIndex {
    global_times: Vec<f64>,
    shards: Vec<ShardTimes>,
    tolerance: TimeTolerance,
}

impl TimeIndex {
    /// Build the index over every source, in order.
    pub fn build<'a, F, I>(sources: I, tolerance: TimeTolerance) -> Self
    where
        F: MeshFile + 'a,
        I: IntoIterator<Item = &'a MeshSource<F>>,
    {
        Self::from_shards(
            sources
                .into_iter()
                .map(|s| (s.path().to_path_buf(), s.times().to_vec())),
            tolerance,
        )
    }

    /// Build the index from `(path, times)` pairs.
    pub fn from_shards<I>(shards: I, tolerance: TimeTolerance) -> Self
    where
        I: IntoIterator<Item = (PathBuf, Vec<f64>)>,
    {
        let shards: Vec<ShardTimes> = shards
            .into_iter()
            .map(|(path, times)| ShardTimes {
                range: TimeRange::of(&times),
                path,
                times,
            })
            .collect();

        let mut global_times: Vec<f64> = shards
            .iter()
            .flat_map(|s| s.times.iter().copied())
            .filter(|t| !t.is_nan())
            .collect();
        global_times.sort_by(f64::total_cmp);
        global_times.dedup();

        Self {
            global_times,
            shards,
            tolerance,
        }
    }

    /// Sorted, duplicate-free union of every file's times.
    pub fn global_times(&self) -> &[f64] {
        &self.global_times
    }

    /// Per-file range; `None` for a file without recorded steps.
    pub fn ranges(&self) -> impl Iterator<Item = Option<TimeRange>> + '_ {
        self.shards.iter().map(|s| s.range)
    }

    /// Range of one file.
    pub fn range(&self, source: usize) -> Option<TimeRange> {
        self.shards.get(source).and_then(|s| s.range)
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Check whether no file is indexed.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Every file whose range contains `t`, in ascending index order.
    ///
    /// Files sharing a boundary time all match.
    pub fn sources_containing(&self, t: f64, tolerance: f64) -> Vec<usize> {
        self.shards
            .iter()
            .enumerate()
            .filter(|(_, s)| s.range.is_some_and(|r| r.contains(t, tolerance)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Local timestep of `t` within one file's own samples.
    pub fn locate_within_source(&self, source: usize, t: f64) -> Result<usize> {
        let shard = self
            .shards
            .get(source)
            .ok_or(ExoviewError::TimeNotCovered { time: t })?;
        locate_time(&shard.times, t, &self.tolerance).ok_or_else(|| ExoviewError::TimeNotSampled {
            time: t,
            path: shard.path.clone(),
        })
    }
}

/// First sample close to `t`.
pub(crate) fn locate_time(times: &[f64], t: f64, tolerance: &TimeTolerance) -> Option<usize> {
    times.iter().position(|&recorded| tolerance.is_close(recorded, t))
}
