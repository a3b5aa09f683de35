use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use super::model::IntervalCount;

/// Rounds `interval` to the nearest multiple of `quantum` samples.
fn quantize(interval: usize, quantum: usize) -> usize {
    if quantum <= 1 {
        return interval;
    }
    (interval + quantum / 2) / quantum * quantum
}

/// Tallies the distance from every peak to each of its next `neighbors`
/// successors, keyed by (quantized) interval. Output is ordered by interval.
pub fn interval_histogram(peaks: &[usize], neighbors: usize, quantum: usize) -> Vec<IntervalCount> {
    let pairs: Vec<(usize, usize)> = peaks
        .par_iter()
        .enumerate()
        .flat_map_iter(move |(i, &peak)| {
            peaks[i + 1..]
                .iter()
                .take(neighbors)
                .map(move |&next| (quantize(next - peak, quantum), peak))
        })
        .collect();

    let mut histogram: BTreeMap<usize, IntervalCount> = BTreeMap::new();
    for (interval, peak) in pairs {
        let entry = histogram.entry(interval).or_insert_with(|| IntervalCount {
            interval,
            count: 0,
            peaks: BTreeSet::new(),
        });
        entry.count += 1;
        entry.peaks.insert(peak);
    }

    log::debug!(
        "Interval histogram: {} distinct intervals from {} peaks",
        histogram.len(),
        peaks.len()
    );
    histogram.into_values().collect()
}
