use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use lebicho_db::db;
use lebicho_db::models::{DrawResult, Group, LearnedPattern, LearningMetrics, PatternKind, Timeslot};
use lebicho_db::patterns;
use lebicho_db::rusqlite::Connection;

use crate::config::AnalysisConfig;
use crate::stats;

const WEEKDAY_NAMES: [&str; 7] = ["Domingo", "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado"];

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn pattern(kind: PatternKind, value: String, frequency: u32, weight: f64, seen: NaiveDate, context: serde_json::Value) -> LearnedPattern {
    LearnedPattern {
        kind,
        value,
        frequency,
        weight,
        hit_rate: 0.0,
        last_seen: Some(seen),
        context,
    }
}

/// Groupes chauds / froids sur une fenêtre mesurée depuis le résultat le plus récent.
fn hot_cold(history: &[DrawResult], anchor: NaiveDate, days: u32, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let cutoff = anchor.checked_sub_days(Days::new(days as u64)).unwrap_or(NaiveDate::MIN);
    let counts = stats::count_groups(history.iter().filter(|d| d.date >= cutoff));
    let total: u32 = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }
    let mean = total as f64 / 25.0;

    let mut found = Vec::new();
    for (group, freq) in counts {
        let ratio = freq as f64 / mean;
        let context = json!({
            "dias": days,
            "total_aparicoes": freq,
            "media_esperada": round2(mean),
            "desvio": round2(ratio),
        });
        let value = format!("{}d_{}", days, group);
        if ratio > cfg.hot_ratio {
            found.push(pattern(PatternKind::HotGroup, value, freq, ratio.min(cfg.hot_weight_cap), anchor, context));
        } else if ratio < cfg.cold_ratio {
            found.push(pattern(PatternKind::ColdGroup, value, freq, (1.0 / ratio).min(cfg.cold_weight_cap), anchor, context));
        }
    }
    found
}

fn timeslot_correlations(history: &[DrawResult], anchor: NaiveDate, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let mut found = Vec::new();
    for timeslot in Timeslot::ALL {
        let counts = stats::count_groups(history.iter().filter(|d| d.timeslot == timeslot));
        let total: u32 = counts.values().sum();
        if total == 0 {
            continue;
        }
        let mean = total as f64 / 25.0;
        for (group, freq) in counts {
            let ratio = freq as f64 / mean;
            if ratio > cfg.timeslot_ratio && freq >= cfg.min_count {
                found.push(pattern(
                    PatternKind::TimeslotCorrelation,
                    format!("{}:{}", timeslot, group),
                    freq,
                    ratio.min(cfg.timeslot_weight_cap),
                    anchor,
                    json!({
                        "horario": timeslot.label(),
                        "grupo": group.number(),
                        "aparicoes": freq,
                        "percentual": round2(freq as f64 / total as f64 * 100.0),
                    }),
                ));
            }
        }
    }
    found
}

fn transitions(history: &[DrawResult], anchor: NaiveDate, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let ordered = stats::chronological(history);
    if ordered.len() < 2 {
        return Vec::new();
    }
    let mut counts: BTreeMap<(Group, Group), (u32, Vec<NaiveDate>)> = BTreeMap::new();
    for pair in ordered.windows(2) {
        let entry = counts.entry((pair[0].group, pair[1].group)).or_insert((0, Vec::new()));
        entry.0 += 1;
        entry.1.push(pair[0].date);
    }

    // 625 couples possibles
    let expected = (ordered.len() - 1) as f64 / 625.0;
    let mut found = Vec::new();
    for ((from, to), (count, dates)) in counts {
        if count >= cfg.min_count && count as f64 > expected * cfg.transition_factor {
            let recent: Vec<String> = dates.iter().rev().take(5).rev().map(|d| d.to_string()).collect();
            found.push(pattern(
                PatternKind::Transition,
                format!("{}->{}", from, to),
                count,
                (count as f64 / expected).min(cfg.transition_weight_cap),
                anchor,
                json!({
                    "grupo_anterior": from.number(),
                    "grupo_seguinte": to.number(),
                    "ocorrencias": count,
                    "ultimas_datas": recent,
                }),
            ));
        }
    }
    found
}

/// Dezenas triées par fréquence décroissante, ex aequo par valeur.
fn dezena_ranking(history: &[DrawResult]) -> Vec<(String, u32)> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for draw in history {
        *counts.entry(draw.dezena.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().map(|(d, c)| (d.to_string(), c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

fn frequent_dezenas(history: &[DrawResult], anchor: NaiveDate, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let total = history.len() as f64;
    let mean = total / 100.0;
    dezena_ranking(history)
        .into_iter()
        .take(cfg.dezena_top)
        .filter_map(|(dezena, freq)| {
            let ratio = freq as f64 / mean;
            if ratio <= cfg.dezena_ratio {
                return None;
            }
            let group = Group::from_dezena_str(&dezena).ok()?;
            Some(pattern(
                PatternKind::FrequentDezena,
                dezena,
                freq,
                ratio.min(cfg.dezena_weight_cap),
                anchor,
                json!({
                    "aparicoes": freq,
                    "percentual": round2(freq as f64 / total * 100.0),
                    "grupo_correspondente": group.number(),
                }),
            ))
        })
        .collect()
}

fn weekday_patterns(history: &[DrawResult], anchor: NaiveDate, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let mut found = Vec::new();
    for (day, name) in WEEKDAY_NAMES.iter().enumerate() {
        let counts = stats::count_groups(history.iter().filter(|d| d.weekday_index() as usize == day));
        let total: u32 = counts.values().sum();
        if total == 0 {
            continue;
        }
        let mean = total as f64 / 25.0;
        for (group, freq) in counts {
            let ratio = freq as f64 / mean;
            if ratio > cfg.weekday_ratio && freq >= cfg.min_count {
                found.push(pattern(
                    PatternKind::WeekdayPattern,
                    format!("{}:{}", name, group),
                    freq,
                    ratio.min(cfg.weekday_weight_cap),
                    anchor,
                    json!({
                        "dia_semana": name,
                        "dia_numero": day,
                        "grupo": group.number(),
                        "aparicoes": freq,
                        "percentual": round2(freq as f64 / total as f64 * 100.0),
                    }),
                ));
            }
        }
    }
    found
}

/// Terminaisons de milhar (deux derniers chiffres) les plus fréquentes.
fn frequent_terminals(history: &[DrawResult], anchor: NaiveDate, cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let total = history.len() as f64;
    dezena_ranking(history)
        .into_iter()
        .take(cfg.terminal_top)
        .filter(|(_, freq)| *freq >= cfg.min_count)
        .map(|(terminal, freq)| {
            pattern(
                PatternKind::FrequentTerminal,
                terminal.clone(),
                freq,
                1.0 + freq as f64 / total * 10.0,
                anchor,
                json!({ "terminacao": terminal, "aparicoes": freq }),
            )
        })
        .collect()
}

/// Détection complète sur l'historique. Fonction pure : même historique, même résultat,
/// trié par (type, valeur).
pub fn detect_patterns(history: &[DrawResult], cfg: &AnalysisConfig) -> Vec<LearnedPattern> {
    let Some(anchor) = history.iter().map(|d| d.date).max() else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for &days in &cfg.windows_days {
        found.extend(hot_cold(history, anchor, days, cfg));
    }
    found.extend(timeslot_correlations(history, anchor, cfg));
    found.extend(transitions(history, anchor, cfg));
    found.extend(frequent_dezenas(history, anchor, cfg));
    found.extend(weekday_patterns(history, anchor, cfg));
    found.extend(frequent_terminals(history, anchor, cfg));

    found.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.value.cmp(&b.value)));
    // Deux fenêtres identiques dans la config produiraient la même clé
    found.dedup_by(|a, b| a.kind == b.kind && a.value == b.value);
    found
}

/// Nombre de motifs listés par type dans le résumé.
const SUMMARY_TOP: usize = 10;

/// Motif retenu pour l'affichage du résumé.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternHighlight {
    pub value: String,
    pub frequency: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_analyzed: usize,
    pub total_patterns: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub best_group: Option<Group>,
    pub best_timeslot: Option<Timeslot>,
    pub hot_groups: Vec<PatternHighlight>,
    pub cold_groups: Vec<PatternHighlight>,
    pub timeslot_correlations: Vec<PatternHighlight>,
    pub transitions: Vec<PatternHighlight>,
    pub frequent_dezenas: Vec<PatternHighlight>,
    pub weekday_patterns: Vec<PatternHighlight>,
    pub frequent_terminals: Vec<PatternHighlight>,
}

/// Les `limit` motifs d'un type les plus lourds (ex aequo : valeur croissante).
fn highlights(found: &[LearnedPattern], kind: PatternKind, limit: usize) -> Vec<PatternHighlight> {
    let mut of_kind: Vec<&LearnedPattern> = found.iter().filter(|p| p.kind == kind).collect();
    of_kind.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.value.cmp(&b.value)));
    of_kind
        .into_iter()
        .take(limit)
        .map(|p| PatternHighlight { value: p.value.clone(), frequency: p.frequency, weight: p.weight })
        .collect()
}

fn strongest<'a>(found: &'a [LearnedPattern], kind: PatternKind) -> Option<&'a LearnedPattern> {
    found
        .iter()
        .filter(|p| p.kind == kind)
        .max_by(|a, b| a.weight.total_cmp(&b.weight).then_with(|| b.value.cmp(&a.value)))
}

/// Ré-analyse destructive : vide la table des motifs et la reconstruit depuis tout l'historique,
/// en une transaction. Ne doit pas tourner en même temps qu'une ingestion.
pub fn full_reanalysis(conn: &Connection, cfg: &AnalysisConfig) -> Result<AnalysisSummary> {
    let history = db::fetch_all_draws(conn)?;
    if history.is_empty() {
        info!("aucun résultat historique, table des motifs inchangée");
        return Ok(AnalysisSummary::default());
    }

    let found = detect_patterns(&history, cfg);
    patterns::replace_all_patterns(conn, &found)?;

    let mut by_kind = BTreeMap::new();
    for p in &found {
        *by_kind.entry(p.kind.as_str().to_string()).or_insert(0) += 1;
    }

    // "30d_9" → 9 ; "14h:9" → 14h
    let best_group = strongest(&found, PatternKind::HotGroup)
        .and_then(|p| lebicho_db::models::group_from_key(&p.value));
    let best_timeslot = strongest(&found, PatternKind::TimeslotCorrelation)
        .and_then(|p| p.value.split(':').next())
        .and_then(|label| label.parse().ok());

    let previous = db::load_metrics(conn)?.unwrap_or_default();
    db::save_metrics(conn, &LearningMetrics {
        total_predictions: history.len() as u32,
        best_group: best_group.or(previous.best_group),
        best_timeslot: best_timeslot.or(previous.best_timeslot),
        updated_at: Some(chrono::Local::now().to_rfc3339()),
        ..previous
    })?;

    info!(analyzed = history.len(), patterns = found.len(), "ré-analyse terminée");

    Ok(AnalysisSummary {
        total_analyzed: history.len(),
        total_patterns: found.len(),
        by_kind,
        best_group,
        best_timeslot,
        hot_groups: highlights(&found, PatternKind::HotGroup, SUMMARY_TOP),
        cold_groups: highlights(&found, PatternKind::ColdGroup, SUMMARY_TOP),
        timeslot_correlations: highlights(&found, PatternKind::TimeslotCorrelation, SUMMARY_TOP),
        transitions: highlights(&found, PatternKind::Transition, SUMMARY_TOP),
        frequent_dezenas: highlights(&found, PatternKind::FrequentDezena, SUMMARY_TOP),
        weekday_patterns: highlights(&found, PatternKind::WeekdayPattern, SUMMARY_TOP),
        frequent_terminals: highlights(&found, PatternKind::FrequentTerminal, SUMMARY_TOP),
    })
}
