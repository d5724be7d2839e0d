use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use lebicho_db::models::{DigitWidth, DrawResult, Group, LearnedPattern, LearningMetrics, UserHit};
use lebicho_db::user_hits::HitStats;
use lebicho_engine::dream::DreamMatch;
use lebicho_engine::methods::MethodReading;
use lebicho_engine::profile::HeatStatus;
use lebicho_engine::reading::Reading;
use lebicho_learn::alerts::{Alert, Priority};
use lebicho_learn::analysis::{AnalysisSummary, PatternHighlight};
use lebicho_learn::ranking::{RankedCandidates, RankingReport};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" - ")
}

pub fn display_draws(draws: &[DrawResult]) {
    if draws.is_empty() {
        println!("Aucun résultat à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Horaire", "Prix", "Milhar", "Groupe", "Animal"]);
    for draw in draws {
        table.add_row(vec![
            draw.date.format("%d/%m/%Y").to_string(),
            draw.timeslot.to_string(),
            draw.prize.to_string(),
            draw.milhar.clone(),
            draw.group.to_string(),
            draw.animal().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn heat_color(status: HeatStatus) -> Color {
    match status {
        HeatStatus::UltraHot => Color::Red,
        HeatStatus::Hot => Color::Yellow,
        HeatStatus::Warm => Color::Green,
        HeatStatus::Normal => Color::White,
    }
}

pub fn display_reading(reading: &Reading) {
    println!("\n🎯 Canal magnétique\n");

    let mut table = new_table(vec!["#", "Nombre"]);
    for (i, n) in reading.numbers.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), n.clone()]);
    }
    println!("{table}");

    println!("Confiance : {}%", reading.confidence);
    if let Some(g) = reading.top_group {
        println!("Groupe principal : {} ({})", g, g.animal());
    }
    println!("Méthodes : {}", reading.method_tags.join(", "));

    println!("\n── Groupes chauds ──");
    let mut table = new_table(vec!["Groupe", "Animal", "Statut"]);
    for hg in &reading.hot_groups {
        table.add_row(vec![
            Cell::new(hg.group.to_string()),
            Cell::new(hg.group.animal()),
            Cell::new(hg.status.label()).fg(heat_color(hg.status)),
        ]);
    }
    println!("{table}");
}

pub fn display_ranking(report: &RankingReport, candidates: &RankedCandidates) {
    println!("\n📊 Classement des groupes ({})\n", report.timeslot);

    let mut table = new_table(vec!["Rang", "Groupe", "Animal", "Score"]);
    for (i, gs) in report.ranked_groups.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            gs.group.to_string(),
            gs.group.animal().to_string(),
            format!("{:.1}", gs.score),
        ]);
    }
    println!("{table}");

    println!("Retards      : {}", join(report.overdue_groups.iter().map(|o| format!("{}({})", o.group, o.gap))));
    println!("Transitions  : {}", join(report.transition_candidates.iter().map(|c| c.group)));
    println!("Horaire      : {}", join(report.timeslot_correlation.iter().map(|c| c.group)));
    println!("Jour         : {}", join(report.weekday_trend.iter()));
    println!("Chauds       : {}", join(report.hot_groups.iter().map(|c| c.group)));
    println!("Froids       : {}", join(report.cold_groups.iter().map(|c| c.group)));
    if let Some(last) = report.last_group {
        println!("Dernier      : {} ({})", last, last.animal());
    }
    if !report.sequences.is_empty() {
        println!("Séquences    : {}", report.sequences
            .iter()
            .take(3)
            .map(|s| format!("{}→{}→{} ×{}", s.groups[0], s.groups[1], s.groups[2], s.count))
            .collect::<Vec<_>>()
            .join(", "));
    }

    println!("\n🎲 Candidats : {} (confiance {}%)", join(candidates.numbers.iter()), candidates.confidence);
}

pub fn display_analysis(summary: &AnalysisSummary) {
    println!("Ré-analyse terminée :");
    println!("  Résultats analysés : {}", summary.total_analyzed);
    println!("  Motifs détectés    : {}", summary.total_patterns);
    for (kind, count) in &summary.by_kind {
        println!("    {:<22} {}", kind, count);
    }
    if let Some(g) = summary.best_group {
        println!("  Meilleur groupe    : {} ({})", g, g.animal());
    }
    if let Some(ts) = summary.best_timeslot {
        println!("  Meilleur horaire   : {}", ts);
    }

    let sections: [(&str, &[PatternHighlight]); 7] = [
        ("Groupes chauds", &summary.hot_groups),
        ("Groupes froids", &summary.cold_groups),
        ("Corrélations horaires", &summary.timeslot_correlations),
        ("Séquences", &summary.transitions),
        ("Dezenas fréquentes", &summary.frequent_dezenas),
        ("Jours de la semaine", &summary.weekday_patterns),
        ("Terminaisons", &summary.frequent_terminals),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!("\n── {} ──", title);
        let mut table = new_table(vec!["Motif", "Fréquence", "Poids"]);
        for h in items {
            table.add_row(vec![h.value.clone(), h.frequency.to_string(), format!("{:.2}", h.weight)]);
        }
        println!("{table}");
    }
}

pub fn display_user_hits(hits: &[UserHit]) {
    if hits.is_empty() {
        println!("Aucun gain enregistré.");
        return;
    }

    let mut table = new_table(vec!["Id", "Date", "Horaire", "Nombres", "Groupe", "Modalité", "Méthodes"]);
    for hit in hits {
        table.add_row(vec![
            hit.id.map(|id| id.to_string()).unwrap_or_default(),
            hit.date.format("%d/%m/%Y").to_string(),
            hit.timeslot.to_string(),
            hit.numbers.join(" "),
            hit.group.map(|g| g.to_string()).unwrap_or_else(|| "—".to_string()),
            hit.modality.label().to_string(),
            hit.methods.join(", "),
        ]);
    }
    println!("{table}");
}

pub fn display_hit_stats(stats: &HitStats) {
    println!("\n📈 Gains : {}\n", stats.total);

    let mut table = new_table(vec!["Groupe", "Animal", "Gains"]);
    for (g, count) in &stats.by_group {
        table.add_row(vec![g.to_string(), g.animal().to_string(), count.to_string()]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Méthode", "Gains"]);
    for (method, count) in &stats.by_method {
        table.add_row(vec![method.clone(), count.to_string()]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Horaire", "Gains"]);
    for (ts, count) in &stats.by_timeslot {
        table.add_row(vec![ts.to_string(), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_metrics(metrics: &LearningMetrics) {
    println!("Métriques d'apprentissage :");
    println!("  Prévisions  : {}", metrics.total_predictions);
    println!("  Réussites   : {}", metrics.total_hits);
    println!("  Taux        : {:.1}%", metrics.hit_rate);
    if let Some(g) = metrics.best_group {
        println!("  Groupe      : {} ({})", g, g.animal());
    }
    if let Some(ts) = metrics.best_timeslot {
        println!("  Horaire     : {}", ts);
    }
    if let Some(at) = &metrics.updated_at {
        println!("  Mis à jour  : {}", at);
    }
}

pub fn display_top_patterns(patterns: &[LearnedPattern]) {
    if patterns.is_empty() {
        return;
    }
    println!("\n── Motifs les plus lourds ──");
    let mut table = new_table(vec!["Type", "Valeur", "Fréquence", "Poids", "Réussite"]);
    for p in patterns {
        table.add_row(vec![
            p.kind.to_string(),
            p.value.clone(),
            p.frequency.to_string(),
            format!("{:.2}", p.weight),
            format!("{:.1}%", p.hit_rate),
        ]);
    }
    println!("{table}");
}

pub fn display_dream(matches: &[DreamMatch], numbers: &[String], dictionary: &[Group]) {
    if matches.is_empty() && dictionary.is_empty() {
        println!("Aucun symbole reconnu dans ce rêve.");
        return;
    }

    if !matches.is_empty() {
        println!("\n📖 São Cipriano\n");
        let mut table = new_table(vec!["Symbole", "Groupe", "Animal", "Dezenas", "Signification"]);
        for m in matches {
            table.add_row(vec![
                m.word.to_string(),
                m.group.to_string(),
                m.group.animal().to_string(),
                m.group.dezenas().join(" "),
                m.meaning.to_string(),
            ]);
        }
        println!("{table}");
        println!("Nombres : {}", join(numbers.iter()));
    }
    if !dictionary.is_empty() {
        println!(
            "Dictionnaire des rêves : {}",
            dictionary.iter().map(|g| format!("{} ({})", g, g.animal())).collect::<Vec<_>>().join(", ")
        );
    }
}

pub fn display_method_reading(reading: &MethodReading, width: DigitWidth) {
    println!("\n🔮 Méthode {} ({} chiffres)\n", reading.method, width.digits());
    let mut table = new_table(vec!["#", "Nombre"]);
    for (i, n) in reading.numbers.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), n.clone()]);
    }
    println!("{table}");
    println!("Confiance : {}%", reading.confidence);
    if let Some(g) = reading.top_group {
        println!("Groupe principal : {} ({})", g, g.animal());
    }
    println!("Énergie : {}", reading.energy);
    println!("{}", reading.explanation);
}

pub fn display_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("Aucune alerte.");
        return;
    }

    let mut table = new_table(vec!["Priorité", "Alerte"]);
    for alert in alerts {
        let color = match alert.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(alert.priority.label()).fg(color),
            Cell::new(&alert.message),
        ]);
    }
    println!("{table}");
}
