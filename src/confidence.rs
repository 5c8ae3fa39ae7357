use crate::signals::{DomainReputation, Signal};

/// Deltas at or above this magnitude count as strong signals.
pub const STRONG_SIGNAL: i32 = 12;

/// Estimate how much the emitted signals agree with each other.
///
/// Orthogonal to the score itself: many agreeing weak signals can give a
/// middling score high confidence, while one strong contradicting signal
/// lowers confidence even when the score is extreme. Zero-delta entries
/// carry no evidence and are ignored. Explicit malware/phishing flags
/// reduce confidence because they usually contradict the local signals.
pub fn estimate(breakdown: &[Signal], domain_reputation: &DomainReputation) -> i32 {
    let strong_pos = breakdown.iter().filter(|s| s.delta >= STRONG_SIGNAL).count() as i32;
    let strong_neg = breakdown
        .iter()
        .filter(|s| s.delta <= -STRONG_SIGNAL)
        .count() as i32;
    let moderate_pos = breakdown
        .iter()
        .filter(|s| s.delta > 0 && s.delta < STRONG_SIGNAL)
        .count() as i32;
    let moderate_neg = breakdown
        .iter()
        .filter(|s| s.delta < 0 && s.delta > -STRONG_SIGNAL)
        .count() as i32;

    let mut confidence = 50 + (strong_pos - strong_neg) * 15 + (moderate_pos - moderate_neg) * 6;
    if domain_reputation.malware {
        confidence -= 10;
    }
    if domain_reputation.phishing {
        confidence -= 10;
    }
    confidence.clamp(0, 100)
}
