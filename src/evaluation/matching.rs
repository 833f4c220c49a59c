// Event matching - precision/recall/F-measure for timestamped detections
//
// Reference and estimated events are matched one-to-one when they lie within
// a tolerance window of each other. The matching is a maximum bipartite
// matching, so a single estimate can never satisfy two references.

use serde::{Deserialize, Serialize};

/// Precision, recall and F-measure of one detection task
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionScores {
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
}

impl DetectionScores {
    pub fn from_counts(matches: usize, reference: usize, estimated: usize) -> Self {
        if reference == 0 || estimated == 0 {
            return Self::default();
        }
        let precision = matches as f64 / estimated as f64;
        let recall = matches as f64 / reference as f64;
        Self {
            precision,
            recall,
            f_measure: f_measure(precision, recall),
        }
    }
}

/// Harmonic mean of precision and recall (0 when both are 0)
pub fn f_measure(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Maximum one-to-one matching of events within `window` seconds
///
/// Returns `(reference_index, estimated_index)` pairs sorted by reference index.
pub fn match_events(reference: &[f64], estimated: &[f64], window: f64) -> Vec<(usize, usize)> {
    let candidates: Vec<Vec<usize>> = reference
        .iter()
        .map(|&r| {
            estimated
                .iter()
                .enumerate()
                .filter(|(_, &e)| (r - e).abs() <= window)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; estimated.len()];
    for r in 0..reference.len() {
        let mut visited = vec![false; estimated.len()];
        augment(r, &candidates, &mut visited, &mut owner);
    }

    let mut pairs: Vec<(usize, usize)> = owner
        .iter()
        .enumerate()
        .filter_map(|(e, r)| r.map(|r| (r, e)))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Try to find an augmenting path starting at reference `r`
fn augment(
    r: usize,
    candidates: &[Vec<usize>],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for &e in &candidates[r] {
        if visited[e] {
            continue;
        }
        visited[e] = true;
        let free = match owner[e] {
            None => true,
            Some(other) => augment(other, candidates, visited, owner),
        };
        if free {
            owner[e] = Some(r);
            return true;
        }
    }
    false
}

/// Score estimated onsets against reference onsets
///
/// Both sequences are sorted first. If either is empty every score is 0.
pub fn score_events(reference: &[f64], estimated: &[f64], window: f64) -> DetectionScores {
    if reference.is_empty() {
        tracing::warn!("[Evaluation] Reference events are empty");
    }
    if estimated.is_empty() {
        tracing::warn!("[Evaluation] Estimated events are empty");
    }
    if reference.is_empty() || estimated.is_empty() {
        return DetectionScores::default();
    }

    let mut reference = reference.to_vec();
    let mut estimated = estimated.to_vec();
    reference.sort_by(f64::total_cmp);
    estimated.sort_by(f64::total_cmp);

    let matches = match_events(&reference, &estimated, window).len();
    DetectionScores::from_counts(matches, reference.len(), estimated.len())
}
