use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::{Connection, Row};

use crate::db::{json_column, to_json};
use crate::models::{DigitWidth, Group, Timeslot, UserHit};

const COLUMNS: &str = "id, numbers, group_number, modality, width, date, timeslot, methods";

fn hit_from_row(row: &Row<'_>) -> rusqlite::Result<UserHit> {
    let width: u8 = row.get(4)?;
    let width = DigitWidth::try_from(width).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    Ok(UserHit {
        id: row.get(0)?,
        numbers: json_column(row, 1)?,
        group: row.get(2)?,
        modality: row.get(3)?,
        width,
        date: row.get(5)?,
        timeslot: row.get(6)?,
        methods: json_column(row, 7)?,
    })
}

pub fn insert_user_hit(conn: &Connection, hit: &UserHit) -> Result<i64> {
    hit.validate()?;
    conn.execute(
        "INSERT INTO user_hits (numbers, group_number, modality, width, date, timeslot, methods)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            to_json(&hit.numbers)?,
            hit.group,
            hit.modality,
            u8::from(hit.width),
            hit.date,
            hit.timeslot,
            to_json(&hit.methods)?,
        ],
    ).context("Échec de l'enregistrement du gain")?;
    Ok(conn.last_insert_rowid())
}

/// Gains de l'utilisateur, le plus récent en premier.
pub fn fetch_user_hits(conn: &Connection) -> Result<Vec<UserHit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM user_hits ORDER BY id DESC"
    ))?;
    let hits = stmt
        .query_map([], hit_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(hits)
}

pub fn delete_user_hit(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM user_hits WHERE id = ?1", [id])
        .with_context(|| format!("Échec de la suppression du gain {}", id))?;
    Ok(changed > 0)
}

pub fn clear_user_hits(conn: &Connection) -> Result<usize> {
    let changed = conn.execute("DELETE FROM user_hits", [])
        .context("Échec de la purge des gains")?;
    Ok(changed)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitStats {
    pub by_group: BTreeMap<Group, u32>,
    pub by_method: BTreeMap<String, u32>,
    pub by_timeslot: BTreeMap<Timeslot, u32>,
    pub total: usize,
}

pub fn hit_stats(hits: &[UserHit]) -> HitStats {
    let mut stats = HitStats { total: hits.len(), ..HitStats::default() };
    for hit in hits {
        if let Some(group) = hit.group {
            *stats.by_group.entry(group).or_insert(0) += 1;
        }
        for method in &hit.methods {
            *stats.by_method.entry(method.clone()).or_insert(0) += 1;
        }
        *stats.by_timeslot.entry(hit.timeslot).or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::error::ModelError;
    use crate::models::Modality;
    use chrono::NaiveDate;

    fn hit(numbers: &[&str], group: Option<u8>, methods: &[&str]) -> UserHit {
        UserHit {
            id: None,
            numbers: numbers.iter().map(|s| s.to_string()).collect(),
            group: group.map(|g| Group::new(g).unwrap()),
            modality: Modality::Dezena,
            width: DigitWidth::Two,
            date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
            timeslot: Timeslot::H14,
            methods: methods.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_insert_list_delete() {
        let conn = test_conn();
        let first = insert_user_hit(&conn, &hit(&["33"], Some(9), &["tesla"])).unwrap();
        let second = insert_user_hit(&conn, &hit(&["26", "27"], Some(7), &["fibonacci"])).unwrap();

        let hits = fetch_user_hits(&conn).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, Some(second));
        assert_eq!(hits[0].numbers, vec!["26", "27"]);
        assert_eq!(hits[0].modality, Modality::Dezena);

        assert!(delete_user_hit(&conn, first).unwrap());
        assert!(!delete_user_hit(&conn, first).unwrap());
        assert_eq!(fetch_user_hits(&conn).unwrap().len(), 1);

        assert_eq!(clear_user_hits(&conn).unwrap(), 1);
        assert!(fetch_user_hits(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_non_numeric() {
        let conn = test_conn();
        for bad in [hit(&["0abc"], None, &[]), hit(&["333"], Some(9), &[]), hit(&[], None, &[])] {
            let err = insert_user_hit(&conn, &bad).unwrap_err();
            assert!(err.downcast_ref::<ModelError>().is_some());
        }
        assert!(fetch_user_hits(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_hit_stats() {
        let hits = vec![
            hit(&["33"], Some(9), &["tesla", "lunar"]),
            hit(&["34"], Some(9), &["tesla"]),
            hit(&["01"], None, &[]),
        ];
        let stats = hit_stats(&hits);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_group[&Group::new(9).unwrap()], 2);
        assert_eq!(stats.by_method["tesla"], 2);
        assert_eq!(stats.by_timeslot[&Timeslot::H14], 3);
    }
}
