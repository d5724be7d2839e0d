use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::models::{DrawResult, Group, LearningMetrics, Modality, Timeslot};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draw_results (
    date          TEXT NOT NULL,
    timeslot      TEXT NOT NULL,
    prize         INTEGER NOT NULL,
    milhar        TEXT NOT NULL,
    dezena        TEXT NOT NULL,
    group_number  INTEGER NOT NULL,
    animal        TEXT NOT NULL,
    PRIMARY KEY (date, timeslot, prize)
);

CREATE TABLE IF NOT EXISTS learned_patterns (
    kind       TEXT NOT NULL,
    value      TEXT NOT NULL,
    frequency  INTEGER NOT NULL DEFAULT 1,
    weight     REAL NOT NULL DEFAULT 1.0,
    hit_rate   REAL NOT NULL DEFAULT 0.0,
    last_seen  TEXT,
    context    TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (kind, value)
);

CREATE TABLE IF NOT EXISTS pending_predictions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    date        TEXT NOT NULL,
    timeslot    TEXT NOT NULL,
    numbers     TEXT NOT NULL,
    group_list  TEXT NOT NULL,
    confidence  INTEGER NOT NULL,
    methods     TEXT NOT NULL,
    hit         INTEGER,
    matched     TEXT
);

CREATE INDEX IF NOT EXISTS idx_pending_slot ON pending_predictions (date, timeslot);

CREATE TABLE IF NOT EXISTS user_hits (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    numbers       TEXT NOT NULL,
    group_number  INTEGER,
    modality      TEXT NOT NULL,
    width         INTEGER NOT NULL,
    date          TEXT NOT NULL,
    timeslot      TEXT NOT NULL,
    methods       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS learning_metrics (
    id                 INTEGER PRIMARY KEY CHECK (id = 1),
    total_predictions  INTEGER NOT NULL DEFAULT 0,
    total_hits         INTEGER NOT NULL DEFAULT 0,
    hit_rate           REAL NOT NULL DEFAULT 0.0,
    best_group         INTEGER,
    best_timeslot      TEXT,
    updated_at         TEXT
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lebicho.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

impl ToSql for Timeslot {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for Timeslot {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Modality {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.id()))
    }
}

impl FromSql for Modality {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Group {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.number() as i64))
    }
}

impl FromSql for Group {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let n = value.as_i64()?;
        u8::try_from(n)
            .ok()
            .and_then(|g| Group::new(g).ok())
            .ok_or(FromSqlError::OutOfRange(n))
    }
}

/// Colonne TEXT contenant du JSON (listes de nombres, de groupes, de méthodes).
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Échec de la sérialisation JSON")
}

/// Insère un résultat ; un doublon (date, horaire, prix) est ignoré et renvoie false.
pub fn insert_draw(conn: &Connection, draw: &DrawResult) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draw_results (date, timeslot, prize, milhar, dezena, group_number, animal)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draw.date,
            draw.timeslot,
            draw.prize,
            draw.milhar,
            draw.dezena,
            draw.group,
            draw.animal(),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<DrawResult> {
    Ok(DrawResult {
        date: row.get(0)?,
        timeslot: row.get(1)?,
        prize: row.get(2)?,
        milhar: row.get(3)?,
        dezena: row.get(4)?,
        group: row.get(5)?,
    })
}

/// Derniers résultats, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawResult>> {
    let mut stmt = conn.prepare(
        "SELECT date, timeslot, prize, milhar, dezena, group_number
         FROM draw_results ORDER BY date DESC, timeslot DESC, prize ASC LIMIT ?1"
    )?;
    let draws = stmt
        .query_map([limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<DrawResult>> {
    let n = count_draws(conn)?;
    fetch_last_draws(conn, n)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draw_results", [], |row| row.get(0))?;
    Ok(count)
}

pub fn load_metrics(conn: &Connection) -> Result<Option<LearningMetrics>> {
    let metrics = conn
        .query_row(
            "SELECT total_predictions, total_hits, hit_rate, best_group, best_timeslot, updated_at
             FROM learning_metrics WHERE id = 1",
            [],
            |row| {
                Ok(LearningMetrics {
                    total_predictions: row.get(0)?,
                    total_hits: row.get(1)?,
                    hit_rate: row.get(2)?,
                    best_group: row.get(3)?,
                    best_timeslot: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()
        .context("Échec de la lecture des métriques")?;
    Ok(metrics)
}

pub fn save_metrics(conn: &Connection, metrics: &LearningMetrics) -> Result<()> {
    conn.execute(
        "INSERT INTO learning_metrics (id, total_predictions, total_hits, hit_rate, best_group, best_timeslot, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            total_predictions = excluded.total_predictions,
            total_hits = excluded.total_hits,
            hit_rate = excluded.hit_rate,
            best_group = excluded.best_group,
            best_timeslot = excluded.best_timeslot,
            updated_at = excluded.updated_at",
        rusqlite::params![
            metrics.total_predictions,
            metrics.total_hits,
            metrics.hit_rate,
            metrics.best_group,
            metrics.best_timeslot,
            metrics.updated_at,
        ],
    ).context("Échec de l'enregistrement des métriques")?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    migrate(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_draw(date: &str, timeslot: Timeslot, prize: u8, milhar: &str) -> DrawResult {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        DrawResult::new(date, timeslot, prize, milhar).unwrap()
    }

    #[test]
    fn test_insert_and_count() {
        let conn = test_conn();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw("2026-01-09", Timeslot::H14, 1, "4533")).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = test_conn();

        let inserted = insert_draw(&conn, &test_draw("2026-01-09", Timeslot::H14, 1, "4533")).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw("2026-01-09", Timeslot::H14, 1, "9999")).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);

        // Autre prix de la même extraction : pas un doublon
        assert!(insert_draw(&conn, &test_draw("2026-01-09", Timeslot::H14, 2, "9999")).unwrap());
    }

    #[test]
    fn test_fetch_order() {
        let conn = test_conn();

        insert_draw(&conn, &test_draw("2026-01-01", Timeslot::H21, 1, "0001")).unwrap();
        insert_draw(&conn, &test_draw("2026-01-05", Timeslot::H09, 1, "0002")).unwrap();
        insert_draw(&conn, &test_draw("2026-01-05", Timeslot::H18, 1, "0003")).unwrap();
        insert_draw(&conn, &test_draw("2026-01-03", Timeslot::H11, 1, "0004")).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].milhar, "0003");
        assert_eq!(draws[1].milhar, "0002");
        assert_eq!(draws[2].milhar, "0004");
        assert_eq!(draws[3].milhar, "0001");
        assert_eq!(draws[0].timeslot, Timeslot::H18);
        assert_eq!(draws[0].group.number(), 1);
    }

    #[test]
    fn test_metrics_upsert() {
        let conn = test_conn();
        assert!(load_metrics(&conn).unwrap().is_none());

        let mut metrics = LearningMetrics {
            total_predictions: 3,
            total_hits: 1,
            hit_rate: 100.0 / 3.0,
            best_group: Some(Group::new(9).unwrap()),
            best_timeslot: Some(Timeslot::H14),
            updated_at: None,
        };
        save_metrics(&conn, &metrics).unwrap();
        metrics.total_predictions = 4;
        save_metrics(&conn, &metrics).unwrap();

        let loaded = load_metrics(&conn).unwrap().unwrap();
        assert_eq!(loaded.total_predictions, 4);
        assert_eq!(loaded.best_group, Some(Group::new(9).unwrap()));
        assert_eq!(loaded.best_timeslot, Some(Timeslot::H14));
    }
}
