// Configuration module for reading Agent.toml
// All heuristic weights and search caps are empirically tuned; they live here
// rather than as literals in the evaluation code.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::types::Direction;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub weights: WeightsConfig,
    pub search: SearchConfig,
    pub strategy: StrategyConfig,
    pub selection: SelectionConfig,
    pub arena: ArenaConfig,
    pub debug: DebugConfig,
}

/// Per-decision time management
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub decision_budget_ms: u64,
    pub polling_interval_ms: u64,
    /// Time reserved for scoring after the estimators are cut off
    pub scoring_margin_ms: u64,
    /// Node expansions between deadline checks in the estimators
    pub deadline_check_interval: usize,
}

impl TimingConfig {
    /// Estimator budget left once the scoring margin is reserved
    pub fn search_budget_ms(&self, budget_ms: u64) -> u64 {
        budget_ms.saturating_sub(self.scoring_margin_ms)
    }
}

/// Heuristic weights; signs encode intent (reward survival, freedom and
/// path advantage, penalize head-on risk and contested territory)
#[derive(Debug, Deserialize, Clone)]
pub struct WeightsConfig {
    pub survival: f64,
    pub path_diff: f64,
    pub headon: f64,
    pub risk: f64,
    pub territory_threat: f64,
    pub exploration: f64,
    pub freedom: f64,
    pub endgame: f64,
    /// Flood-fill area from the destination; 0.0 keeps it diagnostic only
    pub space: f64,
    /// Sentinel for an immediately fatal move
    pub fatal: f64,
}

/// Search radius and limits for the estimators
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub territory_max_depth: usize,
}

/// Execution strategy selection
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub parallel: bool,
    pub min_cpus_for_parallel: usize,
}

/// Move selection fallbacks
#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Emitted when every candidate fails to evaluate or input is malformed
    pub default_direction: Direction,
}

/// Reference simulator rules
#[derive(Debug, Deserialize, Clone)]
pub struct ArenaConfig {
    pub height: usize,
    pub width: usize,
    pub wrap: bool,
    pub max_turns: u32,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Agent.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Loads default configuration from Agent.toml in the project root
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_file("Agent.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Agent.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                decision_budget_ms: 40,
                polling_interval_ms: 2,
                scoring_margin_ms: 5,
                deadline_check_interval: 256,
            },
            weights: WeightsConfig {
                survival: 0.1,
                path_diff: 0.03,
                headon: -0.5,
                risk: -0.2,
                territory_threat: -0.02,
                exploration: 0.05,
                freedom: 0.02,
                endgame: 0.3,
                space: 0.0,
                fatal: -9999.0,
            },
            search: SearchConfig {
                territory_max_depth: 6,
            },
            strategy: StrategyConfig {
                parallel: true,
                min_cpus_for_parallel: 2,
            },
            selection: SelectionConfig {
                default_direction: Direction::Up,
            },
            arena: ArenaConfig {
                height: 18,
                width: 20,
                wrap: false,
                max_turns: 200,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "lightcycle_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Agent.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.search.territory_max_depth, 6);
        assert_eq!(config.selection.default_direction, Direction::Up);
    }

    #[test]
    fn test_search_budget_reserves_scoring_margin() {
        let timing = Config::default_hardcoded().timing;
        assert_eq!(timing.search_budget_ms(40), 35);
        assert_eq!(timing.search_budget_ms(3), 0);
        assert_eq!(timing.search_budget_ms(0), 0);
    }

    #[test]
    fn test_weight_signs_encode_intent() {
        let w = Config::default_hardcoded().weights;
        assert!(w.survival > 0.0);
        assert!(w.path_diff > 0.0);
        assert!(w.freedom > 0.0);
        assert!(w.exploration > 0.0);
        assert!(w.endgame > 0.0);
        assert!(w.headon < 0.0);
        assert!(w.risk < 0.0);
        assert!(w.territory_threat < 0.0);
        assert!(w.fatal < -1000.0);
    }

    #[test]
    fn test_agent_toml_can_be_parsed() {
        let result = Config::from_file("Agent.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Agent.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Agent.toml").expect("Agent.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        // Timing
        assert_eq!(
            file_config.timing.decision_budget_ms,
            hardcoded.timing.decision_budget_ms
        );
        assert_eq!(
            file_config.timing.polling_interval_ms,
            hardcoded.timing.polling_interval_ms
        );
        assert_eq!(
            file_config.timing.scoring_margin_ms,
            hardcoded.timing.scoring_margin_ms
        );
        assert_eq!(
            file_config.timing.deadline_check_interval,
            hardcoded.timing.deadline_check_interval
        );

        // Weights
        let (f, h) = (&file_config.weights, &hardcoded.weights);
        assert_eq!(f.survival, h.survival);
        assert_eq!(f.path_diff, h.path_diff);
        assert_eq!(f.headon, h.headon);
        assert_eq!(f.risk, h.risk);
        assert_eq!(f.territory_threat, h.territory_threat);
        assert_eq!(f.exploration, h.exploration);
        assert_eq!(f.freedom, h.freedom);
        assert_eq!(f.endgame, h.endgame);
        assert_eq!(f.space, h.space);
        assert_eq!(f.fatal, h.fatal);

        // Search, strategy, selection
        assert_eq!(
            file_config.search.territory_max_depth,
            hardcoded.search.territory_max_depth
        );
        assert_eq!(file_config.strategy.parallel, hardcoded.strategy.parallel);
        assert_eq!(
            file_config.strategy.min_cpus_for_parallel,
            hardcoded.strategy.min_cpus_for_parallel
        );
        assert_eq!(
            file_config.selection.default_direction,
            hardcoded.selection.default_direction
        );

        // Arena
        assert_eq!(file_config.arena.height, hardcoded.arena.height);
        assert_eq!(file_config.arena.width, hardcoded.arena.width);
        assert_eq!(file_config.arena.wrap, hardcoded.arena.wrap);
        assert_eq!(file_config.arena.max_turns, hardcoded.arena.max_turns);
    }

    #[test]
    fn test_missing_file_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
