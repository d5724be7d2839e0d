use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Constantes de réglage du moteur. Toutes ajustables par fichier JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub user_hit_number_multiplier: f64,
    pub user_hit_number_cap: f64,
    pub user_hit_group_multiplier: f64,
    pub user_hit_group_cap: f64,
    pub user_hit_top_numbers: usize,

    pub fibonacci_bonus: f64,
    pub tesla_hot_bonus: f64,
    pub tesla_bonus: f64,
    pub numerology_bonus: f64,
    pub weekday_bonus: f64,
    pub lunar_bonus: f64,
    pub timeslot_bonus: f64,
    pub ultra_hot_bonus: f64,
    pub hot_bonus: f64,
    pub sacred_bonus: f64,
    pub magic_square_bonus: f64,

    pub pool_size: usize,
    pub output_count: usize,
    pub weight_floor: f64,

    pub confidence_floor: u8,
    pub confidence_ceiling: u8,
    pub confidence_multiplier: f64,
    pub user_history_bonus_cap: u8,

    pub lunar_reference: NaiveDate,
    pub lunar_cycle_days: f64,

    /// Nombre de résultats récents injectés dans le profil de fréquence.
    pub history_window: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_hit_number_multiplier: 8.0,
            user_hit_number_cap: 30.0,
            user_hit_group_multiplier: 6.0,
            user_hit_group_cap: 25.0,
            user_hit_top_numbers: 10,

            fibonacci_bonus: 2.0,
            tesla_hot_bonus: 3.0,
            tesla_bonus: 1.0,
            numerology_bonus: 3.0,
            weekday_bonus: 2.0,
            lunar_bonus: 4.0,
            timeslot_bonus: 5.0,
            ultra_hot_bonus: 6.0,
            hot_bonus: 4.0,
            sacred_bonus: 2.0,
            magic_square_bonus: 5.0,

            pool_size: 40,
            output_count: 5,
            weight_floor: 0.01,

            confidence_floor: 75,
            confidence_ceiling: 98,
            confidence_multiplier: 2.0,
            user_history_bonus_cap: 5,

            lunar_reference: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap_or(NaiveDate::MIN),
            lunar_cycle_days: 29.53,

            history_window: 300,
        }
    }
}

impl EngineConfig {
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

    /// Charge le fichier s'il existe, sinon les valeurs par défaut.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }
}
