use crate::signals::{DomainReputation, FactorSet, Reputation};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Collector configuration. Every upstream API is optional: an
/// unconfigured check simply contributes its neutral default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub threat_api_url: Option<String>,
    pub threat_api_key: Option<String>,
    pub reputation_api_url: Option<String>,
    pub reputation_api_key: Option<String>,
    pub domain_age_api_url: Option<String>,
    /// Domains at least this old count as established.
    pub min_domain_age_days: u32,
    pub timeout_seconds: u64,
    /// Use deterministic canned evidence instead of the network.
    pub use_mock: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            threat_api_url: None,
            threat_api_key: None,
            reputation_api_url: None,
            reputation_api_key: None,
            domain_age_api_url: None,
            min_domain_age_days: 180,
            timeout_seconds: 10,
            use_mock: false,
        }
    }
}

/// Everything the scoring engine needs, gathered from the outside world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedSignals {
    pub factors: FactorSet,
    pub domain_reputation: DomainReputation,
}

#[derive(Debug, Clone, Copy, Default)]
struct ThreatVerdict {
    blocklist: bool,
    malware: bool,
    phishing: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ThreatResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
struct ThreatMatch {
    #[serde(rename = "threatType", default)]
    threat_type: String,
}

#[derive(Debug, Deserialize)]
struct ReputationResponse {
    score: Option<f64>,
    #[serde(default)]
    penalties: f64,
}

#[derive(Debug, Deserialize)]
struct DomainAgeResponse {
    age_days: Option<u32>,
}

/// Gathers safety evidence for a URL from the configured upstream APIs.
///
/// Each check is independent and failure-tolerant: a dead API, a timeout
/// or a garbage response degrades that one signal to its neutral default
/// and the rest still count. The engine itself never sees an error.
pub struct SignalCollector {
    client: reqwest::Client,
    config: CollectorConfig,
}

impl SignalCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn collect(&self, url: &str) -> CollectedSignals {
        let hostname = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_else(|| url.to_lowercase());

        if self.config.use_mock {
            return self.mock_signals(url, &hostname);
        }

        let (tls, threats, reputation, domain_age) = tokio::join!(
            self.check_tls(url),
            self.check_threats(url),
            self.check_reputation(&hostname),
            self.check_domain_age(&hostname),
        );

        let mut signals = CollectedSignals::default();

        match tls {
            Ok(secure) => signals.factors.ssl = secure,
            Err(e) => {
                log::warn!("TLS probe failed for {hostname}: {e}");
                // The scheme is still evidence even when the probe dies.
                signals.factors.ssl = url.starts_with("https://");
            }
        }

        match threats {
            Ok(verdict) => {
                signals.factors.blocklist = verdict.blocklist;
                signals.domain_reputation.malware = verdict.malware;
                signals.domain_reputation.phishing = verdict.phishing;
            }
            Err(e) => log::warn!("Threat lookup failed for {hostname}: {e}"),
        }

        match reputation {
            Ok((rep, penalties)) => {
                if let Some(rep) = rep {
                    signals.factors.reputation = rep;
                }
                signals.domain_reputation.penalties = penalties;
            }
            Err(e) => log::warn!("Reputation lookup failed for {hostname}: {e}"),
        }

        match domain_age {
            Ok(established) => signals.factors.domain_age = established,
            Err(e) => log::warn!("Domain age lookup failed for {hostname}: {e}"),
        }

        signals
    }

    /// TLS evidence: the URL must use https and the site must answer.
    async fn check_tls(&self, url: &str) -> Result<bool> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };
        if parsed.scheme() != "https" {
            return Ok(false);
        }
        log::debug!("Probing TLS endpoint: {url}");
        let response = self.client.get(url.to_string()).send().await?;
        log::debug!("TLS probe for {url} returned {}", response.status());
        Ok(true)
    }

    /// Safe-Browsing-style threat list lookup.
    async fn check_threats(&self, url: &str) -> Result<ThreatVerdict> {
        let Some(api_url) = &self.config.threat_api_url else {
            log::debug!("Threat API not configured, skipping");
            return Ok(ThreatVerdict::default());
        };
        let endpoint = match &self.config.threat_api_key {
            Some(key) => format!("{api_url}?key={key}"),
            None => api_url.clone(),
        };
        let body = json!({
            "client": { "clientId": "websafe-score", "clientVersion": env!("CARGO_PKG_VERSION") },
            "threatInfo": {
                "threatTypes": ["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE"],
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": url }]
            }
        });
        let response: ThreatResponse = self
            .client
            .post(endpoint.as_str())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let malware = response
            .matches
            .iter()
            .any(|m| m.threat_type.contains("MALWARE") || m.threat_type.contains("UNWANTED"));
        let phishing = response
            .matches
            .iter()
            .any(|m| m.threat_type.contains("SOCIAL_ENGINEERING") || m.threat_type.contains("PHISHING"));
        Ok(ThreatVerdict {
            blocklist: !response.matches.is_empty(),
            malware,
            phishing,
        })
    }

    /// Domain reputation lookup: a 0..1 score plus a penalty count.
    async fn check_reputation(&self, hostname: &str) -> Result<(Option<Reputation>, f64)> {
        let Some(api_url) = &self.config.reputation_api_url else {
            log::debug!("Reputation API not configured, skipping");
            return Ok((None, 0.0));
        };
        let mut request = self
            .client
            .get(api_url.as_str())
            .query(&[("domain", hostname)]);
        if let Some(key) = &self.config.reputation_api_key {
            request = request.query(&[("key", key)]);
        }
        let response: ReputationResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.penalties < 0.0 {
            return Err(anyhow!(
                "reputation API returned negative penalties: {}",
                response.penalties
            ));
        }
        let reputation = response
            .score
            .map(|score| Reputation::Numeric(score.clamp(0.0, 1.0)));
        Ok((reputation, response.penalties))
    }

    /// WHOIS-style age lookup; unknown age counts as not established.
    async fn check_domain_age(&self, hostname: &str) -> Result<bool> {
        let Some(api_url) = &self.config.domain_age_api_url else {
            log::debug!("Domain age API not configured, skipping");
            return Ok(false);
        };
        let response: DomainAgeResponse = self
            .client
            .get(api_url.as_str())
            .query(&[("domain", hostname)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match response.age_days {
            Some(age) => {
                log::debug!("Domain {hostname} is {age} days old");
                Ok(age >= self.config.min_domain_age_days)
            }
            None => Ok(false),
        }
    }

    /// Canned evidence keyed off the hostname, for tests and demos.
    fn mock_signals(&self, url: &str, hostname: &str) -> CollectedSignals {
        log::debug!("Using mock signals for {hostname}");
        let mut signals = CollectedSignals {
            factors: FactorSet {
                ssl: url.starts_with("https://"),
                reputation: Reputation::Numeric(0.8),
                domain_age: true,
                blocklist: false,
            },
            domain_reputation: DomainReputation::default(),
        };
        if hostname.contains("malware") {
            signals.factors.blocklist = true;
            signals.factors.reputation = Reputation::Numeric(0.1);
            signals.domain_reputation.malware = true;
            signals.domain_reputation.penalties = 10.0;
        }
        if hostname.contains("phish") {
            signals.factors.blocklist = true;
            signals.factors.reputation = Reputation::Numeric(0.1);
            signals.domain_reputation.phishing = true;
            signals.domain_reputation.penalties = 10.0;
        }
        if hostname.contains("new-") || hostname.ends_with(".test") {
            signals.factors.domain_age = false;
        }
        signals
    }
}
