use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lebicho_db::models::{DrawResult, Group, Timeslot};

use crate::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatStatus {
    UltraHot,
    Hot,
    Warm,
    Normal,
}

impl HeatStatus {
    /// Rang 0 : ultra chaud, 1-3 : chaud, 4-7 : tiède.
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => HeatStatus::UltraHot,
            1..=3 => HeatStatus::Hot,
            4..=7 => HeatStatus::Warm,
            _ => HeatStatus::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HeatStatus::UltraHot => "ultra_hot",
            HeatStatus::Hot => "hot",
            HeatStatus::Warm => "warm",
            HeatStatus::Normal => "normal",
        }
    }

    pub fn is_hot(self) -> bool {
        matches!(self, HeatStatus::UltraHot | HeatStatus::Hot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotGroup {
    pub group: Group,
    pub status: HeatStatus,
}

/// Fréquences par groupe : tables statiques + résultats observés.
#[derive(Debug, Clone)]
pub struct FrequencyProfile {
    global: BTreeMap<Group, f64>,
    by_timeslot: [BTreeMap<Group, f64>; 6],
    by_weekday: [BTreeMap<Group, f64>; 7],
    dezenas: BTreeMap<u8, f64>,
}

fn add_raw(map: &mut BTreeMap<Group, f64>, group: u8, amount: f64) {
    if let Ok(g) = Group::new(group) {
        *map.entry(g).or_insert(0.0) += amount;
    }
}

/// Clés triées par score décroissant, ex aequo par clé croissante.
fn ranked<K: Copy + Ord>(map: &BTreeMap<K, f64>, n: usize) -> Vec<K> {
    let mut entries: Vec<(K, f64)> = map.iter().filter(|(_, v)| **v > 0.0).map(|(k, v)| (*k, *v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.into_iter().take(n).map(|(k, _)| k).collect()
}

impl FrequencyProfile {
    /// Profil des seules tables statiques.
    pub fn bootstrap() -> Self {
        let mut profile = Self {
            global: BTreeMap::new(),
            by_timeslot: Default::default(),
            by_weekday: Default::default(),
            dezenas: BTreeMap::new(),
        };

        for &(g, f) in tables::HOT_GROUPS {
            add_raw(&mut profile.global, g, f as f64);
        }
        for timeslot in Timeslot::ALL {
            for &(g, f) in tables::timeslot_frequencies(timeslot) {
                add_raw(&mut profile.by_timeslot[timeslot.index()], g, f as f64);
            }
        }
        for (day, trend) in tables::WEEKDAY_TRENDS.iter().enumerate() {
            for (rank, &g) in trend.iter().enumerate() {
                add_raw(&mut profile.by_weekday[day], g, (trend.len() - rank) as f64);
            }
        }
        for &(d, f) in tables::HOT_DEZENAS {
            *profile.dezenas.entry(d).or_insert(0.0) += f as f64;
        }

        profile
    }

    /// Tables statiques enrichies par l'historique observé.
    pub fn from_history(draws: &[DrawResult]) -> Self {
        let mut profile = Self::bootstrap();
        for draw in draws {
            *profile.global.entry(draw.group).or_insert(0.0) += 1.0;
            *profile.by_timeslot[draw.timeslot.index()].entry(draw.group).or_insert(0.0) += 1.0;
            *profile.by_weekday[draw.weekday_index() as usize % 7].entry(draw.group).or_insert(0.0) += 1.0;
            if let Ok(d) = draw.dezena.parse::<u8>() {
                *profile.dezenas.entry(d).or_insert(0.0) += 1.0;
            }
        }
        profile
    }

    pub fn hot_groups(&self, n: usize) -> Vec<HotGroup> {
        ranked(&self.global, n)
            .into_iter()
            .enumerate()
            .map(|(rank, group)| HotGroup { group, status: HeatStatus::from_rank(rank) })
            .collect()
    }

    pub fn hottest(&self) -> Option<Group> {
        ranked(&self.global, 1).into_iter().next()
    }

    pub fn timeslot_groups(&self, timeslot: Timeslot, n: usize) -> Vec<Group> {
        ranked(&self.by_timeslot[timeslot.index()], n)
    }

    /// weekday : 0 = dimanche.
    pub fn weekday_groups(&self, weekday: u32, n: usize) -> Vec<Group> {
        ranked(&self.by_weekday[weekday as usize % 7], n)
    }

    pub fn hot_dezenas(&self, n: usize) -> Vec<u8> {
        ranked(&self.dezenas, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn g(n: u8) -> Group {
        Group::new(n).unwrap()
    }

    #[test]
    fn test_bootstrap_ranking() {
        let profile = FrequencyProfile::bootstrap();
        let hot = profile.hot_groups(10);
        assert_eq!(hot.len(), 10);
        assert_eq!(hot[0], HotGroup { group: g(9), status: HeatStatus::UltraHot });
        assert_eq!(hot[1].group, g(7));
        assert_eq!(hot[1].status, HeatStatus::Hot);
        // 8 et 13 à égalité (7) : le plus petit numéro d'abord
        assert_eq!(hot[3].group, g(8));
        assert_eq!(hot[4].group, g(13));
        assert_eq!(hot[4].status, HeatStatus::Warm);
        assert_eq!(hot[8].status, HeatStatus::Normal);
        assert_eq!(profile.hottest(), Some(g(9)));
    }

    #[test]
    fn test_bootstrap_timeslot_and_weekday() {
        let profile = FrequencyProfile::bootstrap();
        assert_eq!(profile.timeslot_groups(Timeslot::H14, 2), vec![g(18), g(7)]);
        assert_eq!(profile.weekday_groups(3, 3), vec![g(7), g(18), g(16)]);
        assert_eq!(profile.hot_dezenas(2), vec![9, 18]);
    }

    #[test]
    fn test_history_shifts_ranking() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        let draws: Vec<DrawResult> = (1..=10)
            .map(|prize| DrawResult::new(date, Timeslot::H18, prize, "1255").unwrap())
            .collect();
        let profile = FrequencyProfile::from_history(&draws);
        // dezena 55 → groupe 14, 10 observations à 18h
        assert_eq!(profile.timeslot_groups(Timeslot::H18, 1), vec![g(14)]);
        assert_eq!(profile.hot_dezenas(1), vec![55]);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(HeatStatus::from_rank(0).label(), "ultra_hot");
        assert!(HeatStatus::from_rank(3).is_hot());
        assert!(!HeatStatus::from_rank(4).is_hot());
        assert_eq!(serde_json::to_string(&HeatStatus::UltraHot).unwrap(), "\"ultra_hot\"");
    }
}
