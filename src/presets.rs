use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Per-rule multipliers applied to the scoring deltas. Profiles change
/// magnitudes only; rule order and the baseline are fixed.
///
/// Fields missing from a deserialized profile default to 1.0, so a
/// partial profile (or none at all) behaves neutrally. The camelCase
/// aliases keep older profile files loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightProfile {
    pub ssl: f64,
    pub reputation: f64,
    #[serde(alias = "domainAge")]
    pub domain_age: f64,
    pub blocklist: f64,
    #[serde(alias = "domainPenaltyMultiplier")]
    pub domain_penalty_multiplier: f64,
    #[serde(alias = "urlPatternMultiplier")]
    pub url_pattern_multiplier: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            ssl: 1.0,
            reputation: 1.0,
            domain_age: 1.0,
            blocklist: 1.0,
            domain_penalty_multiplier: 1.0,
            url_pattern_multiplier: 1.0,
        }
    }
}

impl WeightProfile {
    /// Neutral profile: every multiplier at 1.0.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Lenient profile: discounts reputation, URL-pattern and external
    /// domain penalties; SSL keeps full weight.
    pub fn lenient() -> Self {
        Self {
            reputation: 0.6,
            domain_penalty_multiplier: 0.6,
            url_pattern_multiplier: 0.6,
            ..Self::default()
        }
    }

    /// Conservative profile: trims SSL credit slightly, halves
    /// reputation credit, nearly doubles penalty multipliers.
    pub fn conservative() -> Self {
        Self {
            ssl: 0.85,
            reputation: 0.5,
            domain_penalty_multiplier: 2.0,
            url_pattern_multiplier: 1.8,
            ..Self::default()
        }
    }

    /// Load a custom profile from a YAML file. Missing keys default to
    /// 1.0; unknown keys are rejected to catch typos.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile: WeightProfile = serde_yaml::from_str(&content)?;
        Ok(profile)
    }
}

/// Named weight profiles selectable from configuration or the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Lenient,
    Neutral,
    Conservative,
}

impl Preset {
    pub fn profile(&self) -> WeightProfile {
        match self {
            Preset::Lenient => WeightProfile::lenient(),
            Preset::Neutral => WeightProfile::neutral(),
            Preset::Conservative => WeightProfile::conservative(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Lenient => "lenient",
            Preset::Neutral => "neutral",
            Preset::Conservative => "conservative",
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    // "safe" / "balanced" / "strict" are the names the original
    // browser-facing presets shipped under; both spellings work.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lenient" | "safe" => Ok(Preset::Lenient),
            "neutral" | "balanced" => Ok(Preset::Neutral),
            "conservative" | "strict" => Ok(Preset::Conservative),
            other => Err(anyhow!(
                "unknown preset '{other}' (expected lenient, neutral or conservative)"
            )),
        }
    }
}
