//! Minimal routines on half-open integer intervals.

use std::ops::Range;

/// Length of the overlap of two half-open ranges, `0` if disjoint.
pub fn overlap_len(lhs: &Range<u64>, rhs: &Range<u64>) -> u64 {
    let ovl_b = std::cmp::max(lhs.start, rhs.start);
    let ovl_e = std::cmp::min(lhs.end, rhs.end);
    ovl_e.saturating_sub(ovl_b)
}

/// Merge ranges into their sorted, disjoint union.
///
/// Empty ranges are dropped; touching ranges (`a.end == b.start`) are joined.
pub fn merge_ranges(mut ranges: Vec<Range<u64>>) -> Vec<Range<u64>> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut result: Vec<Range<u64>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match result.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = std::cmp::max(last.end, range.end);
            }
            _ => result.push(range),
        }
    }
    result
}

/// Total length of the overlap of `query` with sorted, disjoint `merged`.
///
/// `merged` must be the output of `merge_ranges`.
pub fn covered_len(query: &Range<u64>, merged: &[Range<u64>]) -> u64 {
    let first = merged.partition_point(|r| r.end <= query.start);
    merged[first..]
        .iter()
        .take_while(|r| r.start < query.end)
        .map(|r| overlap_len(query, r))
        .sum()
}
