//! Consensus aggregation over per-backend verdicts.
//!
//! Majority vote over severity tiers among the valid results, with an
//! explicit tie-break: when two tiers end on the same tally, the tier that
//! was counted first wins. The consensus confidence is averaged over the
//! agreeing backends only, not the whole valid set.

use crate::domain::Severity;
use crate::executor::SingleBackendResult;
use crate::processors::round4;
use serde::Serialize;

/// Recommendation attached to the degenerate all-backends-failed verdict.
const RETRY_RECOMMENDATION: &str = "The analysis could not be performed. Please try again.";

/// The aggregated verdict across all backends for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    /// Class label of the winning tier, or `"Error"`.
    pub prediction: String,
    /// Winning severity tier.
    pub severity: Severity,
    /// Mean confidence of the backends agreeing with the winner, 4 digits.
    pub confidence: f32,
    /// Number of backends that voted for the winning tier.
    pub agreement_count: usize,
    /// Total number of backends invoked, error entries included.
    pub total_models: usize,
    /// Clinical recommendation for the winning tier.
    pub recommendation: String,
}

impl ConsensusResult {
    /// Degenerate verdict returned when every backend failed.
    fn degenerate(total_models: usize) -> Self {
        Self {
            prediction: SingleBackendResult::ERROR_LABEL.to_string(),
            severity: Severity::None,
            confidence: 0.0,
            agreement_count: 0,
            total_models,
            recommendation: RETRY_RECOMMENDATION.to_string(),
        }
    }
}

/// Reduces per-backend results to one consensus verdict.
///
/// Error-marker entries never vote; they only count towards `total_models`.
/// The result is a pure function of the input slice.
pub fn aggregate(results: &[SingleBackendResult]) -> ConsensusResult {
    let total_models = results.len();
    let valid: Vec<&SingleBackendResult> = results.iter().filter(|r| !r.is_error()).collect();

    if valid.is_empty() {
        return ConsensusResult::degenerate(total_models);
    }

    // Tally in first-seen order; the tie-break below depends on it.
    let mut tally: Vec<(Severity, usize)> = Vec::new();
    for result in &valid {
        match tally.iter_mut().find(|(tier, _)| *tier == result.severity) {
            Some((_, count)) => *count += 1,
            None => tally.push((result.severity, 1)),
        }
    }

    // First tier to reach the maximum tally wins.
    let (winner, agreement_count) = tally
        .iter()
        .copied()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .unwrap_or((Severity::None, 0));

    let winners: Vec<&&SingleBackendResult> =
        valid.iter().filter(|r| r.severity == winner).collect();
    let confidence =
        winners.iter().map(|r| r.confidence).sum::<f32>() / winners.len() as f32;

    ConsensusResult {
        prediction: winner.label().to_string(),
        severity: winner,
        confidence: round4(confidence),
        agreement_count,
        total_models,
        recommendation: winner.recommendation().to_string(),
    }
}
