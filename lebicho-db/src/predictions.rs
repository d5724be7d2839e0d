use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, Row};

use crate::db::{json_column, to_json};
use crate::models::{PendingPrediction, Timeslot};

const COLUMNS: &str = "id, date, timeslot, numbers, group_list, confidence, methods, hit, matched";

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<PendingPrediction> {
    Ok(PendingPrediction {
        id: row.get(0)?,
        date: row.get(1)?,
        timeslot: row.get(2)?,
        numbers: json_column(row, 3)?,
        groups: json_column(row, 4)?,
        confidence: row.get(5)?,
        methods: json_column(row, 6)?,
        hit: row.get(7)?,
        matched: row.get(8)?,
    })
}

pub fn insert_prediction(conn: &Connection, prediction: &PendingPrediction) -> Result<i64> {
    conn.execute(
        "INSERT INTO pending_predictions (date, timeslot, numbers, group_list, confidence, methods, hit, matched)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            prediction.date,
            prediction.timeslot,
            to_json(&prediction.numbers)?,
            to_json(&prediction.groups)?,
            prediction.confidence,
            to_json(&prediction.methods)?,
            prediction.hit,
            prediction.matched,
        ],
    ).context("Échec de l'enregistrement de la prévision")?;
    Ok(conn.last_insert_rowid())
}

/// Prévisions non résolues d'une extraction donnée.
pub fn fetch_unresolved(conn: &Connection, date: NaiveDate, timeslot: Timeslot) -> Result<Vec<PendingPrediction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM pending_predictions
         WHERE date = ?1 AND timeslot = ?2 AND hit IS NULL ORDER BY id"
    ))?;
    let predictions = stmt
        .query_map(rusqlite::params![date, timeslot], prediction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(predictions)
}

/// Résout une prévision. Ne modifie qu'une prévision encore ouverte : renvoie false sinon.
pub fn resolve_prediction(conn: &Connection, id: i64, hit: bool, matched: Option<&str>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE pending_predictions SET hit = ?2, matched = ?3 WHERE id = ?1 AND hit IS NULL",
        rusqlite::params![id, hit, matched],
    ).with_context(|| format!("Échec de la résolution de la prévision {}", id))?;
    Ok(changed > 0)
}

pub fn fetch_recent_predictions(conn: &Connection, limit: u32) -> Result<Vec<PendingPrediction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM pending_predictions ORDER BY id DESC LIMIT ?1"
    ))?;
    let predictions = stmt
        .query_map([limit], prediction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::models::Group;

    fn prediction(day: u32, timeslot: Timeslot) -> PendingPrediction {
        PendingPrediction {
            id: None,
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            timeslot,
            numbers: vec!["4533".to_string(), "0726".to_string()],
            groups: vec![Group::new(9).unwrap(), Group::new(7).unwrap()],
            confidence: 88,
            methods: vec!["14h_9".to_string()],
            hit: None,
            matched: None,
        }
    }

    #[test]
    fn test_insert_and_fetch_unresolved() {
        let conn = test_conn();
        let id = insert_prediction(&conn, &prediction(9, Timeslot::H14)).unwrap();
        insert_prediction(&conn, &prediction(9, Timeslot::H16)).unwrap();
        insert_prediction(&conn, &prediction(10, Timeslot::H14)).unwrap();

        let open = fetch_unresolved(&conn, NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(), Timeslot::H14).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, Some(id));
        assert_eq!(open[0].groups, vec![Group::new(9).unwrap(), Group::new(7).unwrap()]);
        assert_eq!(open[0].numbers[1], "0726");
    }

    #[test]
    fn test_resolve_only_once() {
        let conn = test_conn();
        let id = insert_prediction(&conn, &prediction(9, Timeslot::H14)).unwrap();

        assert!(resolve_prediction(&conn, id, true, Some("Grupo 9")).unwrap());
        assert!(!resolve_prediction(&conn, id, false, None).unwrap());

        let all = fetch_recent_predictions(&conn, 10).unwrap();
        assert_eq!(all[0].hit, Some(true));
        assert_eq!(all[0].matched.as_deref(), Some("Grupo 9"));

        let open = fetch_unresolved(&conn, NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(), Timeslot::H14).unwrap();
        assert!(open.is_empty());
    }
}
