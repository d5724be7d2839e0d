use anyhow::Result;
use serde::{Deserialize, Serialize};

use lebicho_db::db;
use lebicho_db::models::{DrawResult, Group, Timeslot};
use lebicho_db::rusqlite::Connection;

use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "haute",
            Priority::Medium => "moyenne",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overdue,
    Timeslot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub priority: Priority,
    pub groups: Vec<Group>,
    pub message: String,
}

/// Alertes pour l'heure d'horloge `hour` : les 3 groupes les plus en retard,
/// puis les 3 groupes les plus sortis à la prochaine extraction.
pub fn build_alerts(history: &[DrawResult], hour: u32) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = stats::overdue_groups(history, 3)
        .into_iter()
        .map(|o| Alert {
            kind: AlertKind::Overdue,
            priority: Priority::High,
            groups: vec![o.group],
            message: format!(
                "Groupe {} ({}) absent depuis {} tirages",
                o.group,
                o.group.animal(),
                o.gap
            ),
        })
        .collect();

    let next = Timeslot::next_after(hour);
    let favourites: Vec<Group> = stats::timeslot_correlation(history, next, 3)
        .into_iter()
        .map(|c| c.group)
        .collect();
    if !favourites.is_empty() {
        let names: Vec<String> = favourites
            .iter()
            .map(|g| format!("{} ({})", g, g.animal()))
            .collect();
        alerts.push(Alert {
            kind: AlertKind::Timeslot,
            priority: Priority::Medium,
            groups: favourites,
            message: format!("Prochain tirage {} : groupes favoris {}", next, names.join(", ")),
        });
    }
    alerts
}

pub fn load_alerts(conn: &Connection, hour: u32, history_limit: u32) -> Result<Vec<Alert>> {
    let history = db::fetch_last_draws(conn, history_limit)?;
    Ok(build_alerts(&history, hour))
}
