pub mod cache;
pub mod collector;
pub mod confidence;
pub mod engine;
pub mod presets;
pub mod signals;

pub use cache::ScoreCache;
pub use collector::{CollectedSignals, CollectorConfig, SignalCollector};
pub use engine::compute_score;
pub use presets::{Preset, WeightProfile};
pub use signals::{DomainReputation, FactorSet, Reputation, ScoreResult, Signal};
