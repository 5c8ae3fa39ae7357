use crate::confidence;
use crate::presets::WeightProfile;
use crate::signals::{DomainReputation, FactorSet, Reputation, ScoreResult, Signal, UrlParts};

/// Neutral starting score. Biased toward "innocent until shown
/// otherwise" so signal-poor inputs do not read as threats.
pub const BASELINE: i32 = 55;

/// Total cap on the weighted URL-pattern penalty.
pub const URL_PATTERN_CAP: i32 = 36;

/// Cap on the weighted external-penalty deduction.
pub const DOMAIN_PENALTY_CAP: i32 = 40;

/// Tokens that commonly show up in phishing and scam URLs. Matched as
/// substrings against the hostname and the path+query.
pub const SUSPICIOUS_TOKENS: [&str; 14] = [
    "phish",
    "phishing",
    "malware",
    "verify",
    "login",
    "account",
    "free",
    "gift",
    "temp-mail",
    "urgent",
    "click",
    "confirm",
    "update",
    "secure",
];

fn weighted(base: i32, weight: f64) -> i32 {
    (base as f64 * weight).round() as i32
}

/// Score a URL from its observed signals.
///
/// Pure and total: no I/O, no shared state, and no error path. Malformed
/// URLs degrade to raw-string matching instead of failing. The breakdown
/// lists every contributing rule in evaluation order so callers can show
/// exactly why a site got its score.
pub fn compute_score(
    factors: &FactorSet,
    domain_reputation: &DomainReputation,
    url: &str,
    weights: &WeightProfile,
) -> ScoreResult {
    let mut breakdown: Vec<Signal> = Vec::new();
    let mut raw = BASELINE;

    // SSL: strong positive when present; missing SSL is penalized less
    // than it rewards because some benign internal pages lack it.
    let (ssl_base, ssl_note) = if factors.ssl {
        (20, "HTTPS present")
    } else {
        (-12, "No HTTPS")
    };
    let ssl_delta = weighted(ssl_base, weights.ssl);
    raw += ssl_delta;
    breakdown.push(Signal::new("ssl", ssl_delta, ssl_note));

    // Reputation: a continuous score maps 0..1 onto -12..+18 and takes
    // precedence over the boolean form.
    let (rep_delta, rep_note) = match factors.reputation {
        Reputation::Numeric(value) => {
            let base = (value * 30.0 - 12.0).round() as i32;
            (weighted(base, weights.reputation), "Reputation score")
        }
        Reputation::Boolean(true) => (weighted(8, weights.reputation), "Good reputation"),
        Reputation::Boolean(false) => (weighted(-6, weights.reputation), "Poor reputation"),
    };
    if rep_delta != 0 {
        raw += rep_delta;
        breakdown.push(Signal::new("reputation", rep_delta, rep_note));
    }

    // Domain age: weak positive. An unknown or new domain still gets a
    // zero-delta entry so the audit trail shows it was considered.
    if factors.domain_age {
        let delta = weighted(6, weights.domain_age);
        raw += delta;
        breakdown.push(Signal::new("domainAge", delta, "Established domain"));
    } else {
        breakdown.push(Signal::new("domainAge", 0, "Unknown or new domain"));
    }

    // Blocklist membership: severe, scaled with the external-penalty
    // group as well as its own multiplier.
    if factors.blocklist {
        let delta = weighted(-40, weights.blocklist * weights.domain_penalty_multiplier);
        if delta != 0 {
            raw += delta;
            breakdown.push(Signal::new("blocklist", delta, "Listed on blocklist"));
        }
    }

    // Suspicious URL tokens: per-token penalty, capped in total so a
    // keyword-stuffed URL cannot zero the score on its own.
    let parts = UrlParts::from_raw(url);
    let per_token = weighted(12, weights.url_pattern_multiplier);
    let mut pattern_penalty = 0;
    for token in SUSPICIOUS_TOKENS {
        if parts.contains_token(token) {
            pattern_penalty += per_token;
        }
    }
    if pattern_penalty > 0 {
        let capped = pattern_penalty.min(URL_PATTERN_CAP);
        raw -= capped;
        breakdown.push(Signal::new(
            "urlPatterns",
            -capped,
            "Suspicious URL path or query tokens",
        ));
    }

    // Structural URL heuristics only make sense on a parsed URL.
    if parts.parsed {
        if parts.distinct_params >= 4 {
            raw -= 6;
            breakdown.push(Signal::new("url_params", -6, "Many URL query parameters"));
        }
        if parts.query_len > 150 {
            raw -= 8;
            breakdown.push(Signal::new("url_query_length", -8, "Long query string"));
        }
    }

    // External domain reputation.
    if domain_reputation.malware {
        let delta = weighted(-60, weights.domain_penalty_multiplier);
        if delta != 0 {
            raw += delta;
            breakdown.push(Signal::new(
                "domain_malware",
                delta,
                "Known malware distributor",
            ));
        }
    }
    if domain_reputation.phishing {
        let delta = weighted(-60, weights.domain_penalty_multiplier);
        if delta != 0 {
            raw += delta;
            breakdown.push(Signal::new(
                "domain_phishing",
                delta,
                "Known phishing domain",
            ));
        }
    }
    if domain_reputation.penalties > 0.0 {
        // Log compression keeps one large external penalty from
        // dominating everything else.
        let mapped = ((1.0 + domain_reputation.penalties).ln() * 10.0).round() as i32;
        let penalty = weighted(mapped, weights.domain_penalty_multiplier).min(DOMAIN_PENALTY_CAP);
        if penalty > 0 {
            raw -= penalty;
            breakdown.push(Signal::new(
                "domain_penalties",
                -penalty,
                "External reputation penalties",
            ));
        }
    }

    let confidence = confidence::estimate(&breakdown, domain_reputation);

    ScoreResult {
        score: raw.clamp(0, 100),
        raw_score: raw,
        breakdown,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;

    fn good_factors() -> FactorSet {
        FactorSet {
            ssl: true,
            reputation: Reputation::Boolean(true),
            domain_age: true,
            blocklist: false,
        }
    }

    fn bad_factors() -> FactorSet {
        FactorSet {
            ssl: false,
            reputation: Reputation::Boolean(false),
            domain_age: false,
            blocklist: true,
        }
    }

    fn neutral() -> WeightProfile {
        WeightProfile::neutral()
    }

    fn find<'a>(result: &'a ScoreResult, key: &str) -> Option<&'a Signal> {
        result.breakdown.iter().find(|s| s.key == key)
    }

    #[test]
    fn test_clean_site_scores_high() {
        let result = compute_score(
            &good_factors(),
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        assert_eq!(result.score, 89);
        assert_eq!(result.raw_score, 89);
        assert_eq!(find(&result, "ssl").unwrap().delta, 20);
        assert_eq!(find(&result, "reputation").unwrap().delta, 8);
        assert_eq!(find(&result, "domainAge").unwrap().delta, 6);
        assert_eq!(result.confidence, 77);
    }

    #[test]
    fn test_hostile_unparsable_url_clamps_to_zero() {
        let result = compute_score(
            &bad_factors(),
            &DomainReputation::default(),
            "malware-site",
            &neutral(),
        );
        // ssl -12, reputation -6, blocklist -40, "malware" token -12
        assert_eq!(result.raw_score, 55 - 12 - 6 - 40 - 12);
        assert!(result.raw_score <= 0);
        assert_eq!(result.score, 0);
        assert_eq!(find(&result, "urlPatterns").unwrap().delta, -12);
    }

    #[test]
    fn test_malware_flag_drops_score_and_confidence() {
        let clean = compute_score(
            &good_factors(),
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        let flagged = compute_score(
            &good_factors(),
            &DomainReputation {
                penalties: 0.0,
                malware: true,
                phishing: false,
            },
            "https://example.com",
            &neutral(),
        );
        assert_eq!(find(&flagged, "domain_malware").unwrap().delta, -60);
        assert_eq!(flagged.score, 29);
        assert_eq!(flagged.confidence, 52);
        assert!(flagged.confidence < clean.confidence);
    }

    #[test]
    fn test_long_query_and_many_params_both_fire() {
        let url = format!(
            "https://example.com/search?a=1&b=2&c=3&d=4&e={}",
            "x".repeat(182)
        );
        let result = compute_score(
            &good_factors(),
            &DomainReputation::default(),
            &url,
            &neutral(),
        );
        assert_eq!(find(&result, "url_params").unwrap().delta, -6);
        assert_eq!(find(&result, "url_query_length").unwrap().delta, -8);
    }

    #[test]
    fn test_url_pattern_penalty_capped() {
        // Six distinct tokens; uncapped this would be -72.
        let url = "https://secure-login-verify.example.com/account/update?offer=free";
        let result = compute_score(
            &good_factors(),
            &DomainReputation::default(),
            url,
            &neutral(),
        );
        assert_eq!(find(&result, "urlPatterns").unwrap().delta, -36);
    }

    #[test]
    fn test_domain_penalty_capped() {
        let result = compute_score(
            &good_factors(),
            &DomainReputation::from_penalties(1_000_000.0),
            "https://example.com",
            &neutral(),
        );
        assert_eq!(find(&result, "domain_penalties").unwrap().delta, -40);
    }

    #[test]
    fn test_domain_penalties_log_compressed() {
        let result = compute_score(
            &good_factors(),
            &DomainReputation::from_penalties(5.0),
            "https://example.com",
            &neutral(),
        );
        // round(ln(6) * 10) == 18
        assert_eq!(find(&result, "domain_penalties").unwrap().delta, -18);
    }

    #[test]
    fn test_numeric_reputation_overrides_boolean_rule() {
        let mut factors = good_factors();
        factors.reputation = Reputation::Numeric(1.0);
        let result = compute_score(
            &factors,
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        assert_eq!(find(&result, "reputation").unwrap().delta, 18);

        factors.reputation = Reputation::Numeric(0.0);
        let result = compute_score(
            &factors,
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        assert_eq!(find(&result, "reputation").unwrap().delta, -12);
    }

    #[test]
    fn test_penalties_monotonic() {
        let mut previous = i32::MAX;
        for penalties in [0.0, 1.0, 5.0, 25.0, 500.0, 1_000_000.0] {
            let result = compute_score(
                &good_factors(),
                &DomainReputation::from_penalties(penalties),
                "https://example.com",
                &neutral(),
            );
            assert!(result.raw_score <= previous);
            previous = result.raw_score;
        }
    }

    #[test]
    fn test_blocklist_monotonic() {
        let mut factors = good_factors();
        let clear = compute_score(
            &factors,
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        factors.blocklist = true;
        let listed = compute_score(
            &factors,
            &DomainReputation::default(),
            "https://example.com",
            &neutral(),
        );
        assert!(listed.raw_score < clear.raw_score);
    }

    #[test]
    fn test_bounded_over_extreme_inputs() {
        let reputations = [
            Reputation::Boolean(true),
            Reputation::Boolean(false),
            Reputation::Numeric(0.0),
            Reputation::Numeric(1.0),
        ];
        let urls = [
            "https://example.com",
            "not a url at all",
            "https://phish-malware-login-verify-free-gift.example/urgent?click=1&confirm=2&update=3&secure=4",
        ];
        for ssl in [true, false] {
            for reputation in reputations {
                for blocklist in [true, false] {
                    for url in urls {
                        let factors = FactorSet {
                            ssl,
                            reputation,
                            domain_age: false,
                            blocklist,
                        };
                        let rep = DomainReputation {
                            penalties: 1e9,
                            malware: true,
                            phishing: true,
                        };
                        for preset in [Preset::Lenient, Preset::Neutral, Preset::Conservative] {
                            let result = compute_score(&factors, &rep, url, &preset.profile());
                            assert!((0..=100).contains(&result.score));
                            assert!((0..=100).contains(&result.confidence));
                            assert_eq!(result.score, result.raw_score.clamp(0, 100));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let factors = bad_factors();
        let rep = DomainReputation {
            penalties: 7.0,
            malware: false,
            phishing: true,
        };
        let url = "https://login-verify.test/account?x=1&y=2";
        let first = compute_score(&factors, &rep, url, &neutral());
        let second = compute_score(&factors, &rep, url, &neutral());
        assert_eq!(first, second);
    }

    #[test]
    fn test_breakdown_order_is_rule_order() {
        let url = format!(
            "https://login.example.com/verify?a=1&b=2&c=3&d=4&e={}",
            "x".repeat(160)
        );
        let result = compute_score(
            &bad_factors(),
            &DomainReputation {
                penalties: 3.0,
                malware: true,
                phishing: true,
            },
            &url,
            &neutral(),
        );
        let keys: Vec<&str> = result.breakdown.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "ssl",
                "reputation",
                "domainAge",
                "blocklist",
                "urlPatterns",
                "url_params",
                "url_query_length",
                "domain_malware",
                "domain_phishing",
                "domain_penalties",
            ]
        );
    }

    #[test]
    fn test_conservative_never_kinder_than_lenient() {
        let cases = [
            (bad_factors(), "https://login-verify.example.com", 10.0),
            (bad_factors(), "malware-site", 0.0),
            (
                FactorSet {
                    ssl: true,
                    reputation: Reputation::Numeric(0.2),
                    domain_age: true,
                    blocklist: false,
                },
                "https://example.com/free-gift",
                2.0,
            ),
        ];
        for (factors, url, penalties) in cases {
            let rep = DomainReputation::from_penalties(penalties);
            let lenient = compute_score(&factors, &rep, url, &Preset::Lenient.profile());
            let conservative = compute_score(&factors, &rep, url, &Preset::Conservative.profile());
            assert!(
                conservative.score <= lenient.score,
                "conservative {} > lenient {} for {url}",
                conservative.score,
                lenient.score
            );
            assert_ne!(conservative.raw_score, lenient.raw_score);
        }
    }

    #[test]
    fn test_ssl_entry_always_present() {
        for url in ["https://example.com", "", "::::"] {
            let result = compute_score(
                &FactorSet::default(),
                &DomainReputation::default(),
                url,
                &neutral(),
            );
            assert!(!result.breakdown.is_empty());
            assert_eq!(result.breakdown[0].key, "ssl");
        }
    }

    #[test]
    fn test_zero_delta_rules_not_recorded_except_domain_age() {
        let mut factors = good_factors();
        factors.reputation = Reputation::Numeric(0.4); // rounds to 0
        factors.domain_age = false;
        let result = compute_score(
            &factors,
            &DomainReputation::from_penalties(0.01), // rounds to 0
            "https://example.com",
            &neutral(),
        );
        assert!(find(&result, "reputation").is_none());
        assert!(find(&result, "domain_penalties").is_none());
        assert_eq!(find(&result, "domainAge").unwrap().delta, 0);
    }
}
