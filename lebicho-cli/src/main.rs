mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lebicho_db::db::{count_draws, db_path, fetch_last_draws, load_metrics, migrate, open_db};
use lebicho_db::models::{DigitWidth, DrawResult, Group, Modality, Timeslot, UserHit};
use lebicho_db::patterns::{PatternOrder, fetch_top_patterns};
use lebicho_db::predictions::insert_prediction;
use lebicho_db::rusqlite::Connection;
use lebicho_db::user_hits::{clear_user_hits, delete_user_hit, fetch_user_hits, hit_stats, insert_user_hit};
use lebicho_engine::config::EngineConfig;
use lebicho_engine::dream::{dream_numbers, interpret_dream, lookup_dream_groups};
use lebicho_engine::methods::{Method, generate_method};
use lebicho_engine::reading::{ReadingRequest, generate_reading};
use lebicho_engine::sampler::{SeededSource, minute_bucket, reading_seed};
use lebicho_learn::alerts::load_alerts;
use lebicho_learn::analysis::full_reanalysis;
use lebicho_learn::config::LearnerConfig;
use lebicho_learn::learner::{IngestOutcome, ingest_result};
use lebicho_learn::ranking::{draw_candidates, load_ranking, prediction_from};

use crate::display::{
    display_alerts, display_analysis, display_draws, display_dream, display_hit_stats, display_import_summary,
    display_method_reading, display_metrics, display_ranking, display_reading, display_top_patterns,
    display_user_hits,
};

#[derive(Parser)]
#[command(name = "lebicho", about = "Canal magnétique : lectures et apprentissage pour le jogo do bicho")]
struct Cli {
    /// Base SQLite (défaut : data/lebicho.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration JSON du moteur de lecture
    #[arg(long, global = true)]
    engine_config: Option<PathBuf>,

    /// Configuration JSON de l'apprentissage
    #[arg(long, global = true)]
    learner_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer des résultats depuis un CSV (date;horario;premio;milhar)
    Import {
        #[arg(short, long)]
        file: PathBuf,

        /// Renforcer les motifs et réconcilier les prévisions à chaque ligne
        #[arg(long)]
        learn: bool,
    },

    /// Enregistrer un résultat confirmé
    Register {
        /// Horaire (ex : 14h)
        #[arg(short, long, value_parser = parse_timeslot)]
        timeslot: Timeslot,

        /// Milhar (2 à 4 chiffres)
        #[arg(short, long)]
        milhar: String,

        #[arg(short, long, default_value = "1")]
        prize: u8,

        /// Date (JJ/MM/AAAA ou AAAA-MM-JJ), défaut : aujourd'hui
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Générer une lecture du canal magnétique
    Generate {
        #[arg(short, long, value_parser = parse_timeslot)]
        timeslot: Option<Timeslot>,

        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Nombre de chiffres : 2, 3 ou 4
        #[arg(short, long, default_value = "4", value_parser = parse_width)]
        width: DigitWidth,

        /// Seed pour la reproductibilité (défaut : tranche de minute)
        #[arg(long)]
        seed: Option<u64>,

        /// Une seule méthode (fibonacci, tesla, numerologia, kabbalah, astrologia, cosmico,
        /// quantica, lei-atracao, lei-suposicao, biblia, apocrifos, magia)
        #[arg(short, long, value_parser = parse_method)]
        method: Option<Method>,

        #[arg(long)]
        json: bool,
    },

    /// Interpréter un rêve (table de São Cipriano et dictionnaire des rêves)
    Dream {
        /// Récit du rêve
        #[arg(num_args = 1.., required = true)]
        text: Vec<String>,

        #[arg(short, long, default_value = "4", value_parser = parse_width)]
        width: DigitWidth,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Classer les groupes pour un horaire et enregistrer la prévision
    Rank {
        #[arg(short, long, value_parser = parse_timeslot)]
        timeslot: Option<Timeslot>,

        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(short, long, default_value = "4", value_parser = parse_width)]
        width: DigitWidth,

        #[arg(long)]
        seed: Option<u64>,

        /// Ne pas enregistrer la prévision
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// Ré-analyse complète : reconstruit la table des motifs
    Analyze,

    /// Gains de l'utilisateur
    Hits {
        #[command(subcommand)]
        action: HitsAction,
    },

    /// Lister les derniers résultats
    History {
        #[arg(short, long, default_value = "20")]
        last: u32,
    },

    /// Métriques d'apprentissage
    Metrics,

    /// Alertes de retard et du prochain tirage
    Alerts {
        /// Heure d'horloge (défaut : maintenant)
        #[arg(long)]
        hour: Option<u32>,
    },

    /// Écrire les configurations par défaut
    InitConfig {
        #[arg(long, default_value = "engine.json")]
        engine: PathBuf,

        #[arg(long, default_value = "learner.json")]
        learner: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,
}

#[derive(Subcommand)]
enum HitsAction {
    /// Ajouter un gain
    Add {
        /// Nombres gagnants (séparés par des espaces)
        #[arg(short, long, num_args = 1.., required = true)]
        numbers: Vec<String>,

        #[arg(short, long)]
        group: Option<u8>,

        /// Modalité (milhar, milhar-centena, centena, dezena, grupo, duque-dezena,
        /// terno-dezena, terno-grupo, duque-grupo, palpitao)
        #[arg(short, long, default_value = "milhar", value_parser = parse_modality)]
        modality: Modality,

        /// Nombre de chiffres (défaut : celui de la modalité)
        #[arg(short, long, value_parser = parse_width)]
        width: Option<DigitWidth>,

        #[arg(short, long, value_parser = parse_timeslot)]
        timeslot: Timeslot,

        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Méthodes de la lecture gagnante
        #[arg(long, num_args = 0..)]
        methods: Vec<String>,
    },
    /// Lister les gains
    List,
    /// Supprimer un gain
    Remove { id: i64 },
    /// Supprimer tous les gains
    Clear,
    /// Statistiques des gains
    Stats,
}

fn parse_timeslot(s: &str) -> Result<Timeslot, String> {
    s.parse().map_err(|e: lebicho_db::error::ModelError| e.to_string())
}

fn parse_width(s: &str) -> Result<DigitWidth, String> {
    let digits: u8 = s.parse().map_err(|_| format!("largeur invalide : '{}'", s))?;
    DigitWidth::try_from(digits).map_err(|e| e.to_string())
}

fn parse_modality(s: &str) -> Result<Modality, String> {
    s.parse().map_err(|e: lebicho_db::error::ModelError| e.to_string())
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse().map_err(|e: lebicho_db::error::ModelError| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    import::parse_date(s).map_err(|e| e.to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn current_timeslot() -> Timeslot {
    Timeslot::for_hour(Local::now().hour())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = EngineConfig::load_or_default(cli.engine_config.as_deref())?;
    let learner = LearnerConfig::load_or_default(cli.learner_config.as_deref())?;

    if let Command::InitConfig { engine: engine_path, learner: learner_path } = &cli.command {
        return cmd_init_config(engine_path, learner_path);
    }

    let path = cli.db.clone().unwrap_or_else(db_path);
    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file, learn } => cmd_import(&conn, &file, learn.then_some(&learner)),
        Command::Register { timeslot, milhar, prize, date } => {
            cmd_register(&conn, &learner, date.unwrap_or_else(today), timeslot, prize, &milhar)
        }
        Command::Generate { timeslot, date, width, seed, method: Some(method), json } => {
            cmd_generate_method(&engine, method, date.unwrap_or_else(today), timeslot, width, seed, json)
        }
        Command::Generate { timeslot, date, width, seed, method: None, json } => cmd_generate(
            &conn,
            &engine,
            date.unwrap_or_else(today),
            timeslot.unwrap_or_else(current_timeslot),
            width,
            seed,
            json,
        ),
        Command::Dream { text, width, seed, json } => cmd_dream(&text.join(" "), width, seed, json),
        Command::Rank { timeslot, date, width, seed, dry_run, json } => cmd_rank(
            &conn,
            &engine,
            &learner,
            date.unwrap_or_else(today),
            timeslot.unwrap_or_else(current_timeslot),
            width,
            seed,
            !dry_run,
            json,
        ),
        Command::Analyze => cmd_analyze(&conn, &learner),
        Command::Hits { action } => cmd_hits(&conn, action),
        Command::History { last } => cmd_history(&conn, last),
        Command::Metrics => cmd_metrics(&conn),
        Command::Alerts { hour } => {
            let hour = hour.unwrap_or_else(|| Local::now().hour());
            display_alerts(&load_alerts(&conn, hour, learner.ranking.alert_history)?);
            Ok(())
        }
        Command::InitConfig { .. } | Command::DbPath => Ok(()),
    }
}

fn cmd_init_config(engine_path: &Path, learner_path: &Path) -> Result<()> {
    EngineConfig::default().save(engine_path)?;
    LearnerConfig::default().save(learner_path)?;
    println!("Configurations écrites : {} et {}", engine_path.display(), learner_path.display());
    Ok(())
}

fn default_seed(date: NaiveDate, timeslot: Timeslot, width: DigitWidth) -> u64 {
    reading_seed(date, timeslot, width, minute_bucket(Local::now().naive_local()))
}

/// Méthode isolée à l'heure courante, ou à l'heure de l'horaire demandé.
fn cmd_generate_method(
    engine: &EngineConfig,
    method: Method,
    date: NaiveDate,
    timeslot: Option<Timeslot>,
    width: DigitWidth,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let now = Local::now().naive_local();
    let time = match timeslot {
        Some(ts) => NaiveTime::from_hms_opt(ts.hour(), 0, 0).context("Heure invalide")?,
        None => now.time(),
    };
    let seed = seed.unwrap_or_else(|| default_seed(date, timeslot.unwrap_or_else(current_timeslot), width));
    let reading = generate_method(method, date.and_time(time), width, engine, &mut SeededSource::new(seed));

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        display_method_reading(&reading, width);
    }
    Ok(())
}

fn cmd_dream(text: &str, width: DigitWidth, seed: Option<u64>, json: bool) -> Result<()> {
    let matches = interpret_dream(text);
    let seed = seed.unwrap_or_else(|| default_seed(today(), current_timeslot(), width));
    let numbers = dream_numbers(&matches, width, &mut SeededSource::new(seed));
    let dictionary = lookup_dream_groups(text);

    if json {
        let payload = serde_json::json!({
            "interpretations": matches,
            "numbers": numbers,
            "dictionary_groups": dictionary,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display_dream(&matches, &numbers, &dictionary);
    }
    Ok(())
}

fn cmd_import(conn: &Connection, file: &Path, learn: Option<&LearnerConfig>) -> Result<()> {
    let result = import::import_csv(conn, file, learn.map(|l| &l.rules))?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_register(
    conn: &Connection,
    learner: &LearnerConfig,
    date: NaiveDate,
    timeslot: Timeslot,
    prize: u8,
    milhar: &str,
) -> Result<()> {
    let draw = DrawResult::new(date, timeslot, prize, milhar)?;
    display_draws(std::slice::from_ref(&draw));

    match ingest_result(conn, &draw, &learner.rules)? {
        IngestOutcome::Duplicate => println!("Ce résultat existe déjà (doublon ignoré)."),
        IngestOutcome::Recorded { group, resolved, hits, boosted } => {
            println!("Résultat enregistré : groupe {} ({}).", group, group.animal());
            if resolved > 0 {
                println!("Prévisions résolues : {} dont {} réussies, {} motifs renforcés.", resolved, hits, boosted);
            }
        }
    }
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    engine: &EngineConfig,
    date: NaiveDate,
    timeslot: Timeslot,
    width: DigitWidth,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let history = fetch_last_draws(conn, engine.history_window)?;
    let hits = fetch_user_hits(conn)?;
    let seed = seed.unwrap_or_else(|| default_seed(date, timeslot, width));

    let request = ReadingRequest { date, timeslot, width, weekday: None };
    let reading = generate_reading(&request, &history, &hits, engine, &mut SeededSource::new(seed));

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        display_reading(&reading);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_rank(
    conn: &Connection,
    engine: &EngineConfig,
    learner: &LearnerConfig,
    date: NaiveDate,
    timeslot: Timeslot,
    width: DigitWidth,
    seed: Option<u64>,
    record: bool,
    json: bool,
) -> Result<()> {
    if count_draws(conn)? == 0 {
        bail!("Base vide. Lancez d'abord : lebicho import");
    }

    let report = load_ranking(conn, date, timeslot, &learner.ranking)?;
    let seed = seed.unwrap_or_else(|| default_seed(date, timeslot, width));
    let candidates = draw_candidates(&report, width, &learner.ranking, engine, &mut SeededSource::new(seed));

    if record && !report.ranked_groups.is_empty() {
        let id = insert_prediction(conn, &prediction_from(date, &report, &candidates))?;
        tracing::info!(id, date = %date, timeslot = %timeslot, "prévision enregistrée");
    }

    if json {
        let payload = serde_json::json!({ "ranking": report, "candidates": candidates });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display_ranking(&report, &candidates);
    }
    Ok(())
}

fn cmd_analyze(conn: &Connection, learner: &LearnerConfig) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : lebicho import");
        return Ok(());
    }
    let summary = full_reanalysis(conn, &learner.analysis)?;
    display_analysis(&summary);
    Ok(())
}

fn cmd_hits(conn: &Connection, action: HitsAction) -> Result<()> {
    match action {
        HitsAction::Add { numbers, group, modality, width, timeslot, date, methods } => {
            let group = group.map(Group::new).transpose()?;
            let width = width.unwrap_or_else(|| modality.width());
            let hit = UserHit::new(&numbers, group, modality, width, date.unwrap_or_else(today), timeslot, methods)?;
            let id = insert_user_hit(conn, &hit)?;
            println!("Gain enregistré (id {}).", id);
        }
        HitsAction::List => display_user_hits(&fetch_user_hits(conn)?),
        HitsAction::Remove { id } => {
            if delete_user_hit(conn, id)? {
                println!("Gain {} supprimé.", id);
            } else {
                bail!("Aucun gain avec l'id {}", id);
            }
        }
        HitsAction::Clear => {
            let removed = clear_user_hits(conn)?;
            println!("{} gains supprimés.", removed);
        }
        HitsAction::Stats => display_hit_stats(&hit_stats(&fetch_user_hits(conn)?)),
    }
    Ok(())
}

fn cmd_history(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : lebicho import");
        return Ok(());
    }
    display_draws(&fetch_last_draws(conn, last)?);
    Ok(())
}

fn cmd_metrics(conn: &Connection) -> Result<()> {
    let metrics = load_metrics(conn)?
        .context("Aucune métrique : enregistrez un résultat ou lancez lebicho analyze")?;
    display_metrics(&metrics);
    display_top_patterns(&fetch_top_patterns(conn, PatternOrder::Weight, 15)?);
    Ok(())
}
