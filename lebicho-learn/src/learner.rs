use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

use lebicho_db::db;
use lebicho_db::models::{
    group_from_key, timeslot_group_key, weekday_group_key, DrawResult, Group, LearningMetrics, PatternKind,
    PendingPrediction,
};
use lebicho_db::patterns::{self, PatternOrder};
use lebicho_db::predictions;
use lebicho_db::rusqlite::Connection;

use crate::config::RuleConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Résultat déjà présent : rien n'a été renforcé.
    Duplicate,
    Recorded {
        group: Group,
        resolved: usize,
        hits: usize,
        boosted: usize,
    },
}

/// Verdict d'une prévision face à un résultat : (touché, élément gagnant).
pub fn judge(prediction: &PendingPrediction, draw: &DrawResult) -> (bool, Option<String>) {
    let number_hit = prediction.numbers.iter().any(|n| {
        !n.is_empty()
            && (draw.milhar.ends_with(n.as_str())
                || (n.len() >= 2 && n.get(n.len() - 2..) == Some(draw.dezena.as_str())))
    });
    if number_hit {
        return (true, Some(draw.milhar.clone()));
    }
    if prediction.groups.contains(&draw.group) {
        return (true, Some(format!("Grupo {}", draw.group)));
    }
    (false, None)
}

/// Enregistre un résultat confirmé, renforce les trois motifs incrémentaux, résout les prévisions
/// ouvertes du même horaire et met à jour les métriques. Tout se fait dans une transaction.
pub fn ingest_result(conn: &Connection, draw: &DrawResult, rules: &RuleConfig) -> Result<IngestOutcome> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    if !db::insert_draw(&tx, draw)? {
        info!(date = %draw.date, timeslot = %draw.timeslot, prize = draw.prize, "résultat déjà enregistré, ignoré");
        return Ok(IngestOutcome::Duplicate);
    }

    let group = draw.group;
    let weekday = draw.weekday_index();
    let context = json!({
        "animal": draw.animal(),
        "horario": draw.timeslot.label(),
        "grupo": group.number(),
        "dia_semana": weekday,
    });

    patterns::reinforce_pattern(&tx, PatternKind::Group, &group.to_string(), rules.group, draw.date, &context)?;
    patterns::reinforce_pattern(
        &tx,
        PatternKind::TimeslotGroup,
        &timeslot_group_key(draw.timeslot, group),
        rules.timeslot_group,
        draw.date,
        &context,
    )?;
    patterns::reinforce_pattern(
        &tx,
        PatternKind::WeekdayGroup,
        &weekday_group_key(weekday, group),
        rules.weekday_group,
        draw.date,
        &context,
    )?;

    let mut resolved = 0;
    let mut hits = 0;
    let mut boosted = 0;
    for prediction in predictions::fetch_unresolved(&tx, draw.date, draw.timeslot)? {
        let Some(id) = prediction.id else { continue };
        let (hit, matched) = judge(&prediction, draw);
        if !predictions::resolve_prediction(&tx, id, hit, matched.as_deref())? {
            continue;
        }
        resolved += 1;
        if !hit {
            continue;
        }
        hits += 1;
        for tag in &prediction.methods {
            match patterns::find_pattern_for_tag(&tx, tag)? {
                Some(p) => {
                    patterns::boost_pattern(&tx, p.kind, &p.value, rules.hit_boost, rules.hit_ceiling)?;
                    boosted += 1;
                }
                None => debug!(tag = %tag, "étiquette sans motif correspondant"),
            }
        }
    }

    update_metrics(&tx, draw, hits > 0)?;
    tx.commit().context("Échec du commit")?;

    info!(
        date = %draw.date,
        timeslot = %draw.timeslot,
        group = group.number(),
        resolved,
        hits,
        boosted,
        "résultat ingéré"
    );
    Ok(IngestOutcome::Recorded { group, resolved, hits, boosted })
}

fn update_metrics(conn: &Connection, draw: &DrawResult, hit: bool) -> Result<()> {
    let now = chrono::Local::now().to_rfc3339();
    let metrics = match db::load_metrics(conn)? {
        Some(previous) => {
            let total_predictions = previous.total_predictions + 1;
            let total_hits = previous.total_hits + u32::from(hit);

            let best_group = patterns::fetch_patterns(conn, PatternKind::Group, None, PatternOrder::HitRate, 1)?
                .first()
                .and_then(|p| group_from_key(&p.value))
                .or(previous.best_group);
            // "14h_9" → 14h
            let best_timeslot = patterns::fetch_patterns(conn, PatternKind::TimeslotGroup, None, PatternOrder::HitRate, 1)?
                .first()
                .and_then(|p| p.value.split('_').next().and_then(|label| label.parse().ok()))
                .or(previous.best_timeslot);

            LearningMetrics {
                total_predictions,
                total_hits,
                hit_rate: total_hits as f64 / total_predictions as f64 * 100.0,
                best_group,
                best_timeslot,
                updated_at: Some(now),
            }
        }
        None => LearningMetrics {
            total_predictions: 1,
            total_hits: u32::from(hit),
            hit_rate: if hit { 100.0 } else { 0.0 },
            best_group: Some(draw.group),
            best_timeslot: Some(draw.timeslot),
            updated_at: Some(now),
        },
    };
    db::save_metrics(conn, &metrics)
}
