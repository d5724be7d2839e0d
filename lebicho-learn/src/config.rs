use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lebicho_db::models::WeightRule;

/// Renforcement incrémental par type de motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub group: WeightRule,
    pub timeslot_group: WeightRule,
    pub weekday_group: WeightRule,
    pub hit_boost: f64,
    pub hit_ceiling: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            group: WeightRule { base: 1.0, delta: 0.1, ceiling: 10.0 },
            timeslot_group: WeightRule { base: 1.5, delta: 0.2, ceiling: 15.0 },
            weekday_group: WeightRule { base: 1.2, delta: 0.15, ceiling: 12.0 },
            hit_boost: 0.5,
            hit_ceiling: 20.0,
        }
    }
}

/// Seuils de la ré-analyse complète.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub windows_days: Vec<u32>,
    pub hot_ratio: f64,
    pub cold_ratio: f64,
    pub hot_weight_cap: f64,
    pub cold_weight_cap: f64,
    pub timeslot_ratio: f64,
    pub timeslot_weight_cap: f64,
    pub min_count: u32,
    pub transition_factor: f64,
    pub transition_weight_cap: f64,
    pub dezena_ratio: f64,
    pub dezena_top: usize,
    pub dezena_weight_cap: f64,
    pub weekday_ratio: f64,
    pub weekday_weight_cap: f64,
    pub terminal_top: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            windows_days: vec![30, 7],
            hot_ratio: 1.3,
            cold_ratio: 0.7,
            hot_weight_cap: 3.0,
            cold_weight_cap: 2.0,
            timeslot_ratio: 1.5,
            timeslot_weight_cap: 2.5,
            min_count: 3,
            transition_factor: 2.0,
            transition_weight_cap: 3.0,
            dezena_ratio: 1.2,
            dezena_top: 10,
            dezena_weight_cap: 2.0,
            weekday_ratio: 1.4,
            weekday_weight_cap: 2.0,
            terminal_top: 5,
        }
    }
}

/// Multiplicateurs du classement des groupes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub hit_rate_multiplier: f64,
    pub timeslot_multiplier: f64,
    pub overdue_multiplier: f64,
    pub transition_multiplier: f64,
    pub weekday_multiplier: f64,
    pub hot_multiplier: f64,
    pub min_hit_rate: f64,
    pub min_frequency: u32,
    pub top_groups: usize,
    pub history_limit: u32,
    pub short_window: usize,
    pub group_pattern_limit: u32,
    pub pattern_limit: u32,
    /// Échelle score de groupe → poids de dezena pour le pool de candidats.
    pub pool_scale: f64,
    pub alert_history: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            hit_rate_multiplier: 2.0,
            timeslot_multiplier: 15.0,
            overdue_multiplier: 20.0,
            transition_multiplier: 18.0,
            weekday_multiplier: 10.0,
            hot_multiplier: 12.0,
            min_hit_rate: 50.0,
            min_frequency: 2,
            top_groups: 8,
            history_limit: 300,
            short_window: 30,
            group_pattern_limit: 25,
            pattern_limit: 10,
            pool_scale: 0.1,
            alert_history: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub rules: RuleConfig,
    pub analysis: AnalysisConfig,
    pub ranking: RankingConfig,
}

impl LearnerConfig {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_partial_json() {
        let config: LearnerConfig = serde_json::from_str(
            r#"{ "ranking": { "top_groups": 5 }, "rules": { "hit_boost": 1.0 } }"#,
        ).unwrap();
        assert_eq!(config.ranking.top_groups, 5);
        assert_eq!(config.ranking.overdue_multiplier, 20.0);
        assert_eq!(config.rules.hit_boost, 1.0);
        assert_eq!(config.rules.timeslot_group.ceiling, 15.0);
        assert_eq!(config.analysis.windows_days, vec![30, 7]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("lebicho-learner-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("learner.json");

        let mut config = LearnerConfig::default();
        config.analysis.min_count = 4;
        config.save(&path).unwrap();
        assert_eq!(LearnerConfig::load(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
