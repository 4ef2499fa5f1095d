use backon::ExponentialBuilder;
use lookbook_assoc::VotePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Association engine configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Adding an approve vote drops the voter from the disapprove list and vice versa.
    /// TOML: `engine.exclusive_voting`. Default: `false` (a voter may sit in both lists).
    #[serde(default)]
    pub exclusive_voting: bool,

    /// Max retries of a write that lost a compare-and-swap race.
    /// TOML: `engine.conflict_retry_max_times`. Default: `3`.
    #[serde(default = "default_conflict_retry_max_times")]
    pub conflict_retry_max_times: usize,

    /// TOML: `engine.conflict_retry_min_delay_ms`. Default: `10`.
    #[serde(default = "default_conflict_retry_min_delay_ms")]
    pub conflict_retry_min_delay_ms: u64,

    /// TOML: `engine.conflict_retry_max_delay_ms`. Default: `100`.
    #[serde(default = "default_conflict_retry_max_delay_ms")]
    pub conflict_retry_max_delay_ms: u64,
}

impl EngineConfig {
    pub fn vote_policy(&self) -> VotePolicy {
        VotePolicy {
            exclusive: self.exclusive_voting,
        }
    }

    pub fn conflict_retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.conflict_retry_min_delay_ms))
            .with_max_delay(Duration::from_millis(self.conflict_retry_max_delay_ms))
            .with_max_times(self.conflict_retry_max_times)
            .with_jitter()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exclusive_voting: false,
            conflict_retry_max_times: default_conflict_retry_max_times(),
            conflict_retry_min_delay_ms: default_conflict_retry_min_delay_ms(),
            conflict_retry_max_delay_ms: default_conflict_retry_max_delay_ms(),
        }
    }
}

fn default_conflict_retry_max_times() -> usize {
    3
}

fn default_conflict_retry_min_delay_ms() -> u64 {
    10
}

fn default_conflict_retry_max_delay_ms() -> u64 {
    100
}
