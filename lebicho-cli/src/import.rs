use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use lebicho_db::db::insert_draw;
use lebicho_db::models::{DrawResult, Timeslot};
use lebicho_db::rusqlite::Connection;
use lebicho_learn::config::RuleConfig;
use lebicho_learn::learner::{IngestOutcome, ingest_result};

/// Accepte "17/02/2026" et "2026-02-17".
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

/// Ligne `date;horario;premio;milhar`.
fn parse_record(record: &csv::StringRecord) -> Result<DrawResult> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let date = parse_date(get(0)?)?;
    let timeslot: Timeslot = get(1)?.parse()?;
    let raw_prize = get(2)?;
    let prize: u8 = raw_prize
        .parse()
        .with_context(|| format!("Impossible de parser le prix '{}'", raw_prize))?;
    let milhar = get(3)?;
    if milhar.is_empty() {
        bail!("Milhar manquante");
    }
    Ok(DrawResult::new(date, timeslot, prize, milhar)?)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Importe un CSV de résultats. Avec `learn`, chaque ligne passe par l'apprentissage incrémental
/// (renforcement et réconciliation) ; sinon les résultats sont seulement stockés.
pub fn import_csv(conn: &Connection, path: &Path, learn: Option<&RuleConfig>) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let records: Vec<_> = reader.records().collect();
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut result = ImportResult::default();

    // Les fichiers listent le plus récent en premier : l'apprentissage suit l'ordre chronologique.
    let mut draws = Vec::with_capacity(records.len());
    for record in records {
        result.total_records += 1;
        let line = result.total_records + 1;
        match record.context("Erreur de lecture").and_then(|r| parse_record(&r)) {
            Ok(draw) => draws.push(draw),
            Err(e) => {
                warn!(line, error = %e, "ligne ignorée");
                result.errors += 1;
            }
        }
        pb.inc(1);
    }
    draws.sort_by_key(|d| (d.date, d.timeslot, d.prize));

    match learn {
        // ingest_result ouvre sa propre transaction par résultat
        Some(rules) => {
            for draw in &draws {
                let recorded = ingest_result(conn, draw, rules).map(|o| o != IngestOutcome::Duplicate);
                tally(&mut result, draw, recorded);
            }
        }
        None => {
            let tx = conn.unchecked_transaction()
                .context("Impossible de démarrer la transaction")?;
            for draw in &draws {
                tally(&mut result, draw, insert_draw(&tx, draw));
            }
            tx.commit().context("Échec du commit")?;
        }
    }
    pb.finish_with_message("terminé");

    Ok(result)
}

fn tally(result: &mut ImportResult, draw: &DrawResult, recorded: Result<bool>) {
    match recorded {
        Ok(true) => result.inserted += 1,
        Ok(false) => result.skipped += 1,
        Err(e) => {
            warn!(date = %draw.date, timeslot = %draw.timeslot, error = %e, "échec d'insertion");
            result.errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lebicho_db::db::{count_draws, migrate};
    use lebicho_db::patterns;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert_eq!(parse_date(" 2020-01-01 ").unwrap(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(parse_date("2020/01/01").is_err());
    }

    #[test]
    fn test_parse_record() {
        let record = csv::StringRecord::from(vec!["09/01/2026", "14h", "1", "533"]);
        let draw = parse_record(&record).unwrap();
        assert_eq!(draw.milhar, "0533");
        assert_eq!(draw.group.number(), 9);

        let bad = csv::StringRecord::from(vec!["09/01/2026", "13h", "1", "4533"]);
        assert!(parse_record(&bad).is_err());
    }

    #[test]
    fn test_import_with_learning() {
        let dir = std::env::temp_dir().join(format!("lebicho-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("resultados.csv");
        std::fs::write(
            &path,
            "data;horario;premio;milhar\n\
             09/01/2026;14h;1;4533\n\
             09/01/2026;11h;1;0934\n\
             09/01/2026;11h;1;0934\n\
             09/01/2026;25h;1;0934\n",
        ).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &path, Some(&RuleConfig::default())).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 2);

        let group = patterns::get_pattern(&conn, lebicho_db::models::PatternKind::Group, "9").unwrap().unwrap();
        assert_eq!(group.frequency, 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
