//! Best-run selection
//!
//! Given a set of completed runs and a metric name, pick the best run
//! deterministically. Runs that never logged the metric (for instance a
//! trial that crashed mid-evaluation) are excluded from consideration, not
//! treated as scoring worst.
//!
//! The reference workflow this crate replaces sorted candidates by run
//! identifier only, which picks the run with the smallest id rather than
//! the best metric value. [`SelectionPolicy::MaximizeMetric`] is the
//! default here; [`SelectionPolicy::LegacyRunIdOrder`] reproduces the old
//! ordering for callers that need bit-for-bit compatible selections.


use thiserror::Error;

use crate::executor::Run;

/// Errors from run selection
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no run logged metric '{metric}' ({candidates} candidate runs)")]
    NoEligibleRun { metric: String, candidates: usize },
}

/// Result alias for selection operations
pub type Result<T> = std::result::Result<T, SelectionError>;

/// How the best run is chosen among eligible candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Highest metric value wins; ties break to the lexicographically
    /// smallest run id.
    #[default]
    MaximizeMetric,
    /// Lexicographically smallest run id wins regardless of metric value.
    /// Compatibility mode only.
    LegacyRunIdOrder,
}

/// Pick the best run for a metric under the given policy.
///
/// Deterministic: the same runs and metric always select the same run,
/// independent of input order.
pub fn best<'a>(
    runs: &'a [Run],
    metric_name: &str,
    policy: SelectionPolicy,
) -> Result<&'a Run> {
    let eligible: Vec<&Run> = runs
        .iter()
        .filter(|r| r.metrics.contains_key(metric_name))
        .collect();

    if eligible.is_empty() {
        return Err(SelectionError::NoEligibleRun {
            metric: metric_name.to_string(),
            candidates: runs.len(),
        });
    }

    let (first, rest) = (eligible[0], &eligible[1..]);
    let winner = match policy {
        SelectionPolicy::MaximizeMetric => rest.iter().copied().fold(first, |best, r| {
            let vb = best.metrics[metric_name];
            let vr = r.metrics[metric_name];
            match vr.total_cmp(&vb) {
                std::cmp::Ordering::Greater => r,
                std::cmp::Ordering::Equal if r.run_id < best.run_id => r,
                _ => best,
            }
        }),
        SelectionPolicy::LegacyRunIdOrder => rest
            .iter()
            .copied()
            .fold(first, |best, r| if r.run_id < best.run_id { r } else { best }),
    };
    Ok(winner)
}
