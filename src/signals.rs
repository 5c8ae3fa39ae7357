use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Locally-observable safety signals for a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorSet {
    pub ssl: bool,
    pub reputation: Reputation,
    #[serde(alias = "domainAge")]
    pub domain_age: bool,
    pub blocklist: bool,
}

/// Reputation evidence arrives either as a plain boolean or as a
/// continuous 0..1 score. The two feed different scoring rules, so the
/// distinction is resolved once here and carried through as a variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reputation {
    Boolean(bool),
    Numeric(f64),
}

impl Default for Reputation {
    fn default() -> Self {
        Reputation::Boolean(false)
    }
}

impl From<bool> for Reputation {
    fn from(value: bool) -> Self {
        Reputation::Boolean(value)
    }
}

impl From<f64> for Reputation {
    fn from(value: f64) -> Self {
        Reputation::Numeric(value)
    }
}

/// Externally-sourced reputation evidence about a domain.
///
/// Older callers passed a bare penalty count instead of the structured
/// form; both deserialize to the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DomainReputationRepr")]
pub struct DomainReputation {
    pub penalties: f64,
    pub malware: bool,
    pub phishing: bool,
}

impl DomainReputation {
    pub fn from_penalties(penalties: f64) -> Self {
        Self {
            penalties: penalties.max(0.0),
            malware: false,
            phishing: false,
        }
    }
}

impl From<f64> for DomainReputation {
    fn from(penalties: f64) -> Self {
        Self::from_penalties(penalties)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DomainReputationRepr {
    Legacy(f64),
    Full {
        #[serde(default)]
        penalties: f64,
        #[serde(default)]
        malware: bool,
        #[serde(default)]
        phishing: bool,
    },
}

impl From<DomainReputationRepr> for DomainReputation {
    fn from(repr: DomainReputationRepr) -> Self {
        match repr {
            DomainReputationRepr::Legacy(penalties) => Self::from_penalties(penalties),
            DomainReputationRepr::Full {
                penalties,
                malware,
                phishing,
            } => Self {
                penalties,
                malware,
                phishing,
            },
        }
    }
}

/// One named, weighted contribution to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub key: String,
    pub delta: i32,
    pub note: String,
}

impl Signal {
    pub fn new(key: &str, delta: i32, note: &str) -> Self {
        Self {
            key: key.to_string(),
            delta,
            note: note.to_string(),
        }
    }
}

/// Full result of one scoring call. The breakdown is the audit trail:
/// entries appear in rule evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub raw_score: i32,
    pub breakdown: Vec<Signal>,
    pub confidence: i32,
}

/// Canonical, lower-cased pieces of the URL the pattern rules inspect.
///
/// A URL that fails to parse degrades to the raw lower-cased string for
/// both fields; the parsed-only heuristics (parameter count, query
/// length) are skipped in that case rather than guessed at.
#[derive(Debug, Clone)]
pub struct UrlParts {
    pub hostname: String,
    pub path_and_query: String,
    pub distinct_params: usize,
    pub query_len: usize,
    pub parsed: bool,
}

impl UrlParts {
    pub fn from_raw(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(parsed) => {
                let hostname = parsed.host_str().unwrap_or("").to_lowercase();
                let search = match parsed.query() {
                    Some(query) if !query.is_empty() => format!("?{query}"),
                    _ => String::new(),
                };
                let path_and_query = format!("{}{}", parsed.path(), search).to_lowercase();
                let distinct_params = parsed
                    .query_pairs()
                    .map(|(key, _)| key.into_owned())
                    .collect::<HashSet<_>>()
                    .len();
                let query_len = parsed.query().map(|query| query.len()).unwrap_or(0);
                Self {
                    hostname,
                    path_and_query,
                    distinct_params,
                    query_len,
                    parsed: true,
                }
            }
            Err(e) => {
                log::debug!("URL did not parse ({e}), matching against raw string: {raw}");
                let lowered = raw.to_lowercase();
                Self {
                    hostname: lowered.clone(),
                    path_and_query: lowered,
                    distinct_params: 0,
                    query_len: 0,
                    parsed: false,
                }
            }
        }
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.hostname.contains(token) || self.path_and_query.contains(token)
    }
}
