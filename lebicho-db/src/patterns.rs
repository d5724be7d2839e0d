use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::db::to_json;
use crate::models::{LearnedPattern, PatternKind, WeightRule};

const COLUMNS: &str = "kind, value, frequency, weight, hit_rate, last_seen, context";

fn pattern_from_row(row: &Row<'_>) -> rusqlite::Result<LearnedPattern> {
    let kind: String = row.get(0)?;
    let kind = kind
        .parse::<PatternKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    Ok(LearnedPattern {
        kind,
        value: row.get(1)?,
        frequency: row.get(2)?,
        weight: row.get(3)?,
        hit_rate: row.get(4)?,
        last_seen: row.get(5)?,
        context: crate::db::json_column(row, 6)?,
    })
}

/// Observation d'une clé : création (fréquence 1, poids de base) ou
/// fréquence+1 et poids borné, en une seule instruction.
/// Un poids déjà au-dessus du plafond (bonus de réussite) n'est jamais rabaissé.
pub fn reinforce_pattern(
    conn: &Connection,
    kind: PatternKind,
    value: &str,
    rule: WeightRule,
    seen: NaiveDate,
    context: &serde_json::Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO learned_patterns (kind, value, frequency, weight, hit_rate, last_seen, context)
         VALUES (?1, ?2, 1, ?3, 0.0, ?4, ?5)
         ON CONFLICT(kind, value) DO UPDATE SET
            frequency = frequency + 1,
            weight = MAX(weight, MIN(weight + ?6, ?7)),
            last_seen = excluded.last_seen",
        rusqlite::params![
            kind.as_str(),
            value,
            rule.base.min(rule.ceiling),
            seen,
            to_json(context)?,
            rule.delta,
            rule.ceiling,
        ],
    ).with_context(|| format!("Échec du renforcement de {}:{}", kind, value))?;
    Ok(())
}

/// Bonus de réussite : poids borné et taux de réussite repondéré
/// ((taux × fréquence) + 100) / (fréquence + 1).
pub fn boost_pattern(conn: &Connection, kind: PatternKind, value: &str, delta: f64, ceiling: f64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE learned_patterns SET
            weight = MIN(weight + ?3, ?4),
            hit_rate = (hit_rate * frequency + 100.0) / (frequency + 1)
         WHERE kind = ?1 AND value = ?2",
        rusqlite::params![kind.as_str(), value, delta, ceiling],
    ).with_context(|| format!("Échec du bonus de {}:{}", kind, value))?;
    Ok(changed > 0)
}

pub fn get_pattern(conn: &Connection, kind: PatternKind, value: &str) -> Result<Option<LearnedPattern>> {
    let pattern = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM learned_patterns WHERE kind = ?1 AND value = ?2"),
            rusqlite::params![kind.as_str(), value],
            pattern_from_row,
        )
        .optional()?;
    Ok(pattern)
}

/// Résout une étiquette de méthode : valeur exacte d'abord, sinon l'unique motif dont la valeur la contient.
pub fn find_pattern_for_tag(conn: &Connection, tag: &str) -> Result<Option<LearnedPattern>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM learned_patterns WHERE value = ?1 ORDER BY kind LIMIT 2"
    ))?;
    let exact = stmt
        .query_map([tag], pattern_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    if exact.len() == 1 {
        return Ok(exact.into_iter().next());
    }
    if exact.len() > 1 {
        return Ok(None);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM learned_patterns WHERE instr(lower(value), lower(?1)) > 0 LIMIT 2"
    ))?;
    let partial = stmt
        .query_map([tag], pattern_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    if partial.len() == 1 {
        Ok(partial.into_iter().next())
    } else {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOrder {
    Weight,
    HitRate,
}

impl PatternOrder {
    fn clause(self) -> &'static str {
        match self {
            PatternOrder::Weight => "weight DESC, hit_rate DESC, value ASC",
            PatternOrder::HitRate => "hit_rate DESC, weight DESC, value ASC",
        }
    }
}

/// Motifs d'un type, filtrés par préfixe de valeur ("14h_", "dia3_").
pub fn fetch_patterns(
    conn: &Connection,
    kind: PatternKind,
    value_prefix: Option<&str>,
    order: PatternOrder,
    limit: u32,
) -> Result<Vec<LearnedPattern>> {
    let prefix = value_prefix.unwrap_or("");
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM learned_patterns
         WHERE kind = ?1 AND substr(value, 1, length(?2)) = ?2
         ORDER BY {} LIMIT ?3",
        order.clause()
    ))?;
    let patterns = stmt
        .query_map(rusqlite::params![kind.as_str(), prefix, limit], pattern_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(patterns)
}

pub fn fetch_top_patterns(conn: &Connection, order: PatternOrder, limit: u32) -> Result<Vec<LearnedPattern>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM learned_patterns ORDER BY {} LIMIT ?1",
        order.clause()
    ))?;
    let patterns = stmt
        .query_map([limit], pattern_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(patterns)
}

/// Table complète dans un ordre stable (type, valeur).
pub fn fetch_all_patterns(conn: &Connection) -> Result<Vec<LearnedPattern>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM learned_patterns ORDER BY kind ASC, value ASC"
    ))?;
    let patterns = stmt
        .query_map([], pattern_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(patterns)
}

/// Vide la table et réinsère exactement `patterns`, dans une transaction :
/// un échec en cours de route laisse l'ancienne table intacte.
pub fn replace_all_patterns(conn: &Connection, patterns: &[LearnedPattern]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    tx.execute("DELETE FROM learned_patterns", [])
        .context("Échec de la purge des motifs")?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO learned_patterns (kind, value, frequency, weight, hit_rate, last_seen, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for p in patterns {
            stmt.execute(rusqlite::params![
                p.kind.as_str(),
                p.value,
                p.frequency,
                p.weight,
                p.hit_rate,
                p.last_seen,
                to_json(&p.context)?,
            ]).with_context(|| format!("Échec de l'insertion du motif {}:{}", p.kind, p.value))?;
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(patterns.len())
}

pub fn count_patterns(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM learned_patterns", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    const GROUP_RULE: WeightRule = WeightRule { base: 1.0, delta: 0.1, ceiling: 10.0 };

    fn pattern(kind: PatternKind, value: &str, weight: f64) -> LearnedPattern {
        LearnedPattern {
            kind,
            value: value.to_string(),
            frequency: 3,
            weight,
            hit_rate: 0.0,
            last_seen: Some(day(9)),
            context: json!({ "source": "test" }),
        }
    }

    #[test]
    fn test_reinforce_creates_then_increments() {
        let conn = test_conn();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(1), &json!({})).unwrap();
        let p = get_pattern(&conn, PatternKind::Group, "9").unwrap().unwrap();
        assert_eq!(p.frequency, 1);
        assert!((p.weight - 1.0).abs() < 1e-9);

        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(2), &json!({})).unwrap();
        let p = get_pattern(&conn, PatternKind::Group, "9").unwrap().unwrap();
        assert_eq!(p.frequency, 2);
        assert!((p.weight - 1.1).abs() < 1e-9);
        assert_eq!(p.last_seen, Some(day(2)));
    }

    #[test]
    fn test_reinforce_never_exceeds_ceiling() {
        let conn = test_conn();
        for _ in 0..200 {
            reinforce_pattern(&conn, PatternKind::Group, "7", GROUP_RULE, day(1), &json!({})).unwrap();
        }
        let p = get_pattern(&conn, PatternKind::Group, "7").unwrap().unwrap();
        assert_eq!(p.frequency, 200);
        assert!(p.weight <= 10.0 + 1e-9, "weight = {}", p.weight);
    }

    #[test]
    fn test_boost_updates_hit_rate() {
        let conn = test_conn();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(1), &json!({})).unwrap();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(2), &json!({})).unwrap();
        assert!(boost_pattern(&conn, PatternKind::Group, "9", 0.5, 20.0).unwrap());

        let p = get_pattern(&conn, PatternKind::Group, "9").unwrap().unwrap();
        // (0 × 2 + 100) / 3
        assert!((p.hit_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((p.weight - 1.6).abs() < 1e-9);

        assert!(!boost_pattern(&conn, PatternKind::Group, "10", 0.5, 20.0).unwrap());
    }

    #[test]
    fn test_reinforce_keeps_boosted_weight() {
        let conn = test_conn();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(1), &json!({})).unwrap();
        for _ in 0..30 {
            boost_pattern(&conn, PatternKind::Group, "9", 0.5, 20.0).unwrap();
        }
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(2), &json!({})).unwrap();
        let p = get_pattern(&conn, PatternKind::Group, "9").unwrap().unwrap();
        assert!((p.weight - 16.0).abs() < 1e-9, "weight = {}", p.weight);
    }

    #[test]
    fn test_find_pattern_for_tag() {
        let conn = test_conn();
        replace_all_patterns(&conn, &[
            pattern(PatternKind::TimeslotGroup, "14h_9", 2.0),
            pattern(PatternKind::TimeslotGroup, "14h_19", 2.0),
            pattern(PatternKind::WeekdayGroup, "dia3_7", 1.0),
        ]).unwrap();

        let exact = find_pattern_for_tag(&conn, "14h_9").unwrap().unwrap();
        assert_eq!(exact.value, "14h_9");

        let partial = find_pattern_for_tag(&conn, "DIA3").unwrap().unwrap();
        assert_eq!(partial.value, "dia3_7");

        // "14h" correspond à deux motifs : ambigu
        assert!(find_pattern_for_tag(&conn, "14h").unwrap().is_none());
        assert!(find_pattern_for_tag(&conn, "fibonacci").unwrap().is_none());
    }

    #[test]
    fn test_fetch_patterns_by_prefix() {
        let conn = test_conn();
        replace_all_patterns(&conn, &[
            pattern(PatternKind::TimeslotGroup, "14h_9", 2.0),
            pattern(PatternKind::TimeslotGroup, "14h_7", 3.0),
            pattern(PatternKind::TimeslotGroup, "11h_9", 5.0),
        ]).unwrap();

        let found = fetch_patterns(&conn, PatternKind::TimeslotGroup, Some("14h_"), PatternOrder::Weight, 10).unwrap();
        let values: Vec<&str> = found.iter().map(|p| p.value.as_str()).collect();
        assert_eq!(values, vec!["14h_7", "14h_9"]);

        let all = fetch_patterns(&conn, PatternKind::TimeslotGroup, None, PatternOrder::Weight, 10).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_fetch_top_patterns_across_kinds() {
        let conn = test_conn();
        let mut boosted = pattern(PatternKind::Group, "9", 4.0);
        boosted.hit_rate = 50.0;
        replace_all_patterns(&conn, &[
            pattern(PatternKind::TimeslotGroup, "14h_9", 2.0),
            pattern(PatternKind::HotGroup, "30d_7", 6.0),
            boosted,
            pattern(PatternKind::WeekdayGroup, "dia3_7", 1.0),
        ]).unwrap();

        let top = fetch_top_patterns(&conn, PatternOrder::Weight, 3).unwrap();
        let values: Vec<&str> = top.iter().map(|p| p.value.as_str()).collect();
        assert_eq!(values, vec!["30d_7", "9", "14h_9"]);

        let by_rate = fetch_top_patterns(&conn, PatternOrder::HitRate, 1).unwrap();
        assert_eq!(by_rate[0].value, "9");
    }

    #[test]
    fn test_replace_all_is_full_rebuild() {
        let conn = test_conn();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(1), &json!({})).unwrap();
        replace_all_patterns(&conn, &[pattern(PatternKind::HotGroup, "30d_7", 1.5)]).unwrap();

        let all = fetch_all_patterns(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, PatternKind::HotGroup);
        assert_eq!(all[0].context, json!({ "source": "test" }));
    }

    #[test]
    fn test_replace_all_rolls_back_on_failure() {
        let conn = test_conn();
        reinforce_pattern(&conn, PatternKind::Group, "9", GROUP_RULE, day(1), &json!({})).unwrap();

        // Clé dupliquée : la seconde insertion viole la clé primaire
        let dup = vec![
            pattern(PatternKind::HotGroup, "30d_7", 1.5),
            pattern(PatternKind::HotGroup, "30d_7", 1.5),
        ];
        assert!(replace_all_patterns(&conn, &dup).is_err());

        let all = fetch_all_patterns(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "9");
    }
}
