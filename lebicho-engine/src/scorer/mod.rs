pub mod fibonacci;
pub mod hot_groups;
pub mod lunar;
pub mod magic_square;
pub mod numerology;
pub mod sacred;
pub mod tesla;
pub mod timeslot;
pub mod user_hits;
pub mod weekday;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use lebicho_db::models::{Group, Timeslot, UserHit};

use crate::config::EngineConfig;
use crate::profile::FrequencyProfile;

/// Pool de candidats : chaîne numérique brute → poids cumulé.
/// Les contributions de stratégies différentes s'additionnent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    weights: BTreeMap<String, f64>,
    tags: BTreeSet<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, weight: f64, tag: &str) {
        if weight <= 0.0 {
            return;
        }
        *self.weights.entry(key.into()).or_insert(0.0) += weight;
        self.tags.insert(tag.to_string());
    }

    /// Ajoute `weight` à chacune des 4 dezenas du groupe.
    pub fn add_group(&mut self, group: Group, weight: f64, tag: &str) {
        for dezena in group.dezenas() {
            self.add(dezena, weight, tag);
        }
    }

    pub fn get(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn max_weight(&self) -> f64 {
        self.weights.values().copied().fold(0.0, f64::max)
    }

    /// Étiquettes des stratégies ayant contribué, triées.
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    /// Entrées triées par poids décroissant (ex aequo : ordre de clé).
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self.weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn merge(&mut self, other: Accumulator) {
        for (key, weight) in other.weights {
            *self.weights.entry(key).or_insert(0.0) += weight;
        }
        self.tags.extend(other.tags);
    }
}

pub struct ScoringContext<'a> {
    pub date: NaiveDate,
    pub timeslot: Timeslot,
    /// 0 = dimanche.
    pub weekday: u32,
    pub profile: &'a FrequencyProfile,
    /// Gains de l'utilisateur, le plus récent en premier.
    pub user_hits: &'a [UserHit],
    pub config: &'a EngineConfig,
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator);
}

pub fn all_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(user_hits::UserHitStrategy),
        Box::new(fibonacci::FibonacciStrategy),
        Box::new(tesla::TeslaStrategy),
        Box::new(numerology::NumerologyStrategy),
        Box::new(weekday::WeekdayStrategy),
        Box::new(lunar::LunarStrategy),
        Box::new(timeslot::TimeslotStrategy),
        Box::new(hot_groups::HotGroupStrategy),
        Box::new(sacred::SacredStrategy),
        Box::new(magic_square::MagicSquareStrategy),
    ]
}

/// Exécute toutes les stratégies sur un accumulateur propre à l'appel.
pub fn score_candidates(ctx: &ScoringContext<'_>) -> Accumulator {
    let mut acc = Accumulator::new();
    for strategy in all_strategies() {
        let mut partial = Accumulator::new();
        strategy.score(ctx, &mut partial);
        debug!(strategy = strategy.name(), candidates = partial.len(), max = partial.max_weight(), "contribution");
        acc.merge(partial);
    }
    acc
}
