//! Classement des groupes au moment de la requête.
//!
//! Six signaux additifs par groupe : taux de réussite des motifs de groupe, motifs horaire+groupe,
//! motifs jour+groupe, groupes en retard, successeurs du dernier groupe sorti et fréquence
//! sur la fenêtre courte. Le rapport garde aussi toutes les sous-listes qui ont servi.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use lebicho_db::db;
use lebicho_db::models::{group_from_key, DigitWidth, DrawResult, Group, LearnedPattern, PatternKind, PendingPrediction, Timeslot};
use lebicho_db::patterns::{self, PatternOrder};
use lebicho_db::rusqlite::Connection;
use lebicho_engine::config::EngineConfig;
use lebicho_engine::sampler::{self, RandomSource};
use lebicho_engine::scorer::Accumulator;
use lebicho_engine::confidence;

use crate::config::RankingConfig;
use crate::stats::{self, GroupCount, OverdueGroup, SequenceCount};

pub struct RankingInput<'a> {
    pub timeslot: Timeslot,
    /// 0 = dimanche.
    pub weekday: u32,
    /// Le plus récent en premier.
    pub history: &'a [DrawResult],
    /// Motifs de groupe, du meilleur taux de réussite au moins bon.
    pub group_patterns: &'a [LearnedPattern],
    pub timeslot_patterns: &'a [LearnedPattern],
    pub weekday_patterns: &'a [LearnedPattern],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    pub group: Group,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub timeslot: Timeslot,
    pub weekday: u32,
    pub ranked_groups: Vec<GroupScore>,
    pub overdue_groups: Vec<OverdueGroup>,
    pub transition_candidates: Vec<GroupCount>,
    pub timeslot_correlation: Vec<GroupCount>,
    pub weekday_trend: Vec<Group>,
    pub hot_groups: Vec<GroupCount>,
    pub cold_groups: Vec<GroupCount>,
    pub sequences: Vec<SequenceCount>,
    pub last_group: Option<Group>,
    pub previous_group: Option<Group>,
    /// Valeurs des motifs appris qui ont contribué au score.
    pub method_tags: Vec<String>,
}

#[derive(Default)]
struct Scores {
    by_group: BTreeMap<Group, f64>,
    tags: BTreeSet<String>,
}

impl Scores {
    fn add(&mut self, group: Group, score: f64) {
        *self.by_group.entry(group).or_insert(0.0) += score;
    }

    fn add_pattern(&mut self, pattern: &LearnedPattern, score: f64) {
        if let Some(group) = group_from_key(&pattern.value) {
            self.add(group, score);
            self.tags.insert(pattern.value.clone());
        }
    }
}

/// Score additif par groupe, les `top_groups` meilleurs retenus.
pub fn rank_groups(input: &RankingInput<'_>, config: &RankingConfig) -> RankingReport {
    let history = input.history;
    let mut scores = Scores::default();

    for p in input.group_patterns {
        if p.hit_rate > config.min_hit_rate && p.frequency > config.min_frequency {
            scores.add_pattern(p, p.hit_rate * config.hit_rate_multiplier);
        }
    }
    for p in input.timeslot_patterns {
        scores.add_pattern(p, p.weight * config.timeslot_multiplier);
    }
    for p in input.weekday_patterns {
        scores.add_pattern(p, p.weight * config.weekday_multiplier);
    }

    let overdue = stats::overdue_groups(history, 5);
    for (rank, o) in overdue.iter().enumerate() {
        scores.add(o.group, (5 - rank) as f64 * config.overdue_multiplier);
    }

    let last_group = history.first().map(|d| d.group);
    let previous_group = history.get(1).map(|d| d.group);
    let transitions = match last_group {
        Some(last) => stats::successors(history, last, 5),
        None => Vec::new(),
    };
    for (rank, t) in transitions.iter().enumerate() {
        scores.add(t.group, (5 - rank) as f64 * config.transition_multiplier);
    }

    let window = &history[..history.len().min(config.short_window)];
    let window_counts = stats::count_groups(window);
    for (rank, h) in stats::top_counts(&window_counts, 3).iter().enumerate() {
        scores.add(h.group, (3 - rank) as f64 * config.hot_multiplier);
    }

    let mut ranked: Vec<GroupScore> = scores
        .by_group
        .iter()
        .filter(|(_, s)| **s > 0.0)
        .map(|(&group, &score)| GroupScore { group, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.group.cmp(&b.group)));
    ranked.truncate(config.top_groups);

    RankingReport {
        timeslot: input.timeslot,
        weekday: input.weekday,
        ranked_groups: ranked,
        overdue_groups: overdue,
        transition_candidates: transitions,
        timeslot_correlation: stats::timeslot_correlation(history, input.timeslot, 5),
        weekday_trend: stats::weekday_trend(history, input.weekday, 3),
        hot_groups: stats::top_counts(&window_counts, 5),
        cold_groups: stats::bottom_counts(&window_counts, 5),
        sequences: stats::top_sequences(history, 10),
        last_group,
        previous_group,
        method_tags: scores.tags.into_iter().collect(),
    }
}

/// Charge historique et motifs puis classe les groupes pour (date, horaire).
pub fn load_ranking(conn: &Connection, date: NaiveDate, timeslot: Timeslot, config: &RankingConfig) -> Result<RankingReport> {
    let weekday = date.weekday().num_days_from_sunday();
    let history = db::fetch_last_draws(conn, config.history_limit)?;
    let group_patterns = patterns::fetch_patterns(
        conn,
        PatternKind::Group,
        None,
        PatternOrder::HitRate,
        config.group_pattern_limit,
    )?;
    let timeslot_prefix = format!("{}_", timeslot.label());
    let timeslot_patterns = patterns::fetch_patterns(
        conn,
        PatternKind::TimeslotGroup,
        Some(&timeslot_prefix),
        PatternOrder::Weight,
        config.pattern_limit,
    )?;
    let weekday_prefix = format!("dia{}_", weekday);
    let weekday_patterns = patterns::fetch_patterns(
        conn,
        PatternKind::WeekdayGroup,
        Some(&weekday_prefix),
        PatternOrder::Weight,
        config.pattern_limit,
    )?;

    let report = rank_groups(
        &RankingInput {
            timeslot,
            weekday,
            history: &history,
            group_patterns: &group_patterns,
            timeslot_patterns: &timeslot_patterns,
            weekday_patterns: &weekday_patterns,
        },
        config,
    );

    info!(
        date = %date,
        timeslot = %timeslot,
        history = history.len(),
        ranked = report.ranked_groups.len(),
        tags = report.method_tags.len(),
        "classement calculé"
    );
    Ok(report)
}

/// Répartit le score de chaque groupe classé sur ses 4 dezenas, à l'échelle `scale`.
pub fn candidate_pool(report: &RankingReport, scale: f64) -> Accumulator {
    let mut acc = Accumulator::new();
    for gs in &report.ranked_groups {
        acc.add_group(gs.group, gs.score * scale, "classement");
    }
    acc
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidates {
    pub numbers: Vec<String>,
    pub confidence: u8,
}

/// Nombres candidats tirés du pool de classement avec l'échantillonneur pondéré.
pub fn draw_candidates(
    report: &RankingReport,
    width: DigitWidth,
    ranking: &RankingConfig,
    engine: &EngineConfig,
    rng: &mut dyn RandomSource,
) -> RankedCandidates {
    let pool = candidate_pool(report, ranking.pool_scale);
    let sample = sampler::sample(&pool, engine.output_count, width, engine.pool_size, engine.weight_floor, rng);
    let confidence = confidence::estimate(sample.confidence_weight(), 0, engine);
    RankedCandidates {
        numbers: sample.numbers,
        confidence,
    }
}

/// Prévision à enregistrer pour la réconciliation au prochain résultat.
pub fn prediction_from(date: NaiveDate, report: &RankingReport, candidates: &RankedCandidates) -> PendingPrediction {
    PendingPrediction {
        id: None,
        date,
        timeslot: report.timeslot,
        numbers: candidates.numbers.clone(),
        groups: report.ranked_groups.iter().map(|gs| gs.group).collect(),
        confidence: candidates.confidence,
        methods: report.method_tags.clone(),
        hit: None,
        matched: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::learner::ingest_result;
    use crate::stats::fixtures::history_of;
    use lebicho_engine::sampler::SeededSource;
    use serde_json::json;

    fn g(n: u8) -> Group {
        Group::new(n).unwrap()
    }

    fn pattern(kind: PatternKind, value: &str, frequency: u32, weight: f64, hit_rate: f64) -> LearnedPattern {
        LearnedPattern {
            kind,
            value: value.to_string(),
            frequency,
            weight,
            hit_rate,
            last_seen: None,
            context: json!({}),
        }
    }

    fn input<'a>(
        history: &'a [DrawResult],
        group_patterns: &'a [LearnedPattern],
        timeslot_patterns: &'a [LearnedPattern],
    ) -> RankingInput<'a> {
        RankingInput {
            timeslot: Timeslot::H14,
            weekday: 4,
            history,
            group_patterns,
            timeslot_patterns,
            weekday_patterns: &[],
        }
    }

    #[test]
    fn test_additive_scores() {
        // chronologique : 9, 7, 9 ; dernier groupe 9
        let history = history_of(&[9, 7, 9]);
        let groups = [
            pattern(PatternKind::Group, "18", 3, 1.2, 60.0),
            pattern(PatternKind::Group, "5", 3, 1.2, 40.0),
            pattern(PatternKind::Group, "6", 2, 1.2, 90.0),
        ];
        let slots = [pattern(PatternKind::TimeslotGroup, "14h_9", 3, 2.0, 0.0)];
        let report = rank_groups(&input(&history, &groups, &slots), &RankingConfig::default());

        // 7 : retard 5×20 + transition 5×18 + chaud 2×12 = 214
        // 9 : retard 4×20 + chaud 3×12 + horaire 2×15 = 146
        // 18 : taux 60×2 = 120
        assert_eq!(
            report.ranked_groups,
            vec![
                GroupScore { group: g(7), score: 214.0 },
                GroupScore { group: g(9), score: 146.0 },
                GroupScore { group: g(18), score: 120.0 },
            ]
        );
        assert_eq!(report.method_tags, vec!["14h_9".to_string(), "18".to_string()]);
        assert_eq!(report.last_group, Some(g(9)));
        assert_eq!(report.previous_group, Some(g(7)));
        assert_eq!(report.transition_candidates, vec![GroupCount { group: g(7), count: 1 }]);
    }

    #[test]
    fn test_top_groups_limit_and_overdue_first() {
        let others: Vec<u8> = (1..=25).filter(|&x| x != 14).collect();
        let mut groups: Vec<u8> = (0..40).map(|i| others[i % others.len()]).collect();
        groups.push(14);
        groups.extend(others.iter().copied());
        let history = history_of(&groups);

        let report = rank_groups(&input(&history, &[], &[]), &RankingConfig::default());
        assert_eq!(report.overdue_groups[0].group, g(14));
        assert_eq!(report.ranked_groups.len(), 8);
        assert!(report.ranked_groups.iter().any(|gs| gs.group == g(14)));
        assert_eq!(report.sequences.len(), 10);
        assert_eq!(report.hot_groups.len(), 5);
    }

    #[test]
    fn test_empty_input() {
        let report = rank_groups(&input(&[], &[], &[]), &RankingConfig::default());
        assert!(report.ranked_groups.is_empty());
        assert!(report.method_tags.is_empty());
        assert_eq!(report.last_group, None);
    }

    #[test]
    fn test_candidates_come_from_ranked_groups() {
        let history = history_of(&[9, 7, 9]);
        let report = rank_groups(&input(&history, &[], &[]), &RankingConfig::default());
        let pool = candidate_pool(&report, 0.1);
        assert_eq!(pool.len(), 4 * report.ranked_groups.len());
        assert!((pool.get("25") - 21.4).abs() < 1e-9);

        let mut rng = SeededSource::new(42);
        let candidates = draw_candidates(&report, DigitWidth::Four, &RankingConfig::default(), &EngineConfig::default(), &mut rng);
        assert_eq!(candidates.numbers.len(), 5);
        assert_eq!(candidates.confidence, 98);
        for n in &candidates.numbers {
            assert_eq!(n.len(), 4);
            let group = Group::from_dezena_str(&n[2..]).unwrap();
            assert!(report.ranked_groups.iter().any(|gs| gs.group == group));
        }

        let prediction = prediction_from(history[0].date, &report, &candidates);
        assert_eq!(prediction.groups, vec![g(7), g(9)]);
        assert_eq!(prediction.hit, None);
    }

    #[test]
    fn test_load_ranking_from_store() {
        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();
        let history = history_of(&[9, 7, 9]);
        for draw in history.iter().rev() {
            ingest_result(&conn, draw, &RuleConfig::default()).unwrap();
        }

        // 2026-01-01 : jeudi ; les trois résultats sont 09h, 11h et 14h
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let report = load_ranking(&conn, date, Timeslot::H14, &RankingConfig::default()).unwrap();
        assert_eq!(report.weekday, 4);
        assert!(report.method_tags.contains(&"14h_9".to_string()));
        assert!(report.method_tags.contains(&"dia4_7".to_string()));
        assert!(!report.method_tags.iter().any(|t| t.starts_with("09h_")));
        // 7 : 100 + 90 + 24 + 1,2×10 ; 9 : 80 + 36 + 1,5×15 + 1,35×10
        assert_eq!(report.ranked_groups[0].group, g(7));
        assert!((report.ranked_groups[1].score - 152.0).abs() < 1e-9);
    }
}
