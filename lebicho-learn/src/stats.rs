//! Statistiques sur l'historique, partagées par la ré-analyse, le classement et les alertes.
//! Sauf mention contraire, `history` est trié du plus récent au plus ancien.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lebicho_db::models::{DrawResult, Group, Timeslot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub group: Group,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueGroup {
    pub group: Group,
    /// Nombre de résultats plus récents que sa dernière apparition.
    pub gap: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCount {
    pub groups: [Group; 3],
    pub count: u32,
}

/// Ordre chronologique strict : date, horaire, prix.
pub fn chronological(history: &[DrawResult]) -> Vec<&DrawResult> {
    let mut ordered: Vec<&DrawResult> = history.iter().collect();
    ordered.sort_by_key(|d| (d.date, d.timeslot, d.prize));
    ordered
}

pub fn count_groups<'a>(draws: impl IntoIterator<Item = &'a DrawResult>) -> BTreeMap<Group, u32> {
    let mut counts = BTreeMap::new();
    for draw in draws {
        *counts.entry(draw.group).or_insert(0) += 1;
    }
    counts
}

/// Les n plus fréquents, ex aequo par numéro croissant.
pub fn top_counts(counts: &BTreeMap<Group, u32>, n: usize) -> Vec<GroupCount> {
    let mut entries: Vec<GroupCount> = counts.iter().map(|(&group, &count)| GroupCount { group, count }).collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.group.cmp(&b.group)));
    entries.truncate(n);
    entries
}

/// Les n moins fréquents parmi les groupes observés.
pub fn bottom_counts(counts: &BTreeMap<Group, u32>, n: usize) -> Vec<GroupCount> {
    let mut entries: Vec<GroupCount> = counts.iter().map(|(&group, &count)| GroupCount { group, count }).collect();
    entries.sort_by(|a, b| a.count.cmp(&b.count).then(a.group.cmp(&b.group)));
    entries.truncate(n);
    entries
}

/// Groupes classés par écart depuis leur dernière apparition, le plus grand d'abord.
/// Un groupe jamais vu dans `history` n'est pas classé.
pub fn overdue_groups(history: &[DrawResult], n: usize) -> Vec<OverdueGroup> {
    let mut first_seen: BTreeMap<Group, usize> = BTreeMap::new();
    for (index, draw) in history.iter().enumerate() {
        first_seen.entry(draw.group).or_insert(index);
    }
    let mut overdue: Vec<OverdueGroup> = first_seen
        .into_iter()
        .map(|(group, gap)| OverdueGroup { group, gap })
        .collect();
    overdue.sort_by(|a, b| b.gap.cmp(&a.gap).then(a.group.cmp(&b.group)));
    overdue.truncate(n);
    overdue
}

/// Transitions (précédent → suivant) dans l'ordre chronologique.
pub fn transition_counts(history: &[DrawResult]) -> BTreeMap<(Group, Group), u32> {
    let ordered = chronological(history);
    let mut counts = BTreeMap::new();
    for pair in ordered.windows(2) {
        *counts.entry((pair[0].group, pair[1].group)).or_insert(0) += 1;
    }
    counts
}

/// Groupes les plus souvent sortis juste après `from`.
pub fn successors(history: &[DrawResult], from: Group, n: usize) -> Vec<GroupCount> {
    let mut counts = BTreeMap::new();
    for ((prev, next), count) in transition_counts(history) {
        if prev == from {
            counts.insert(next, count);
        }
    }
    top_counts(&counts, n)
}

/// Suites de trois groupes consécutifs les plus fréquentes.
pub fn top_sequences(history: &[DrawResult], n: usize) -> Vec<SequenceCount> {
    let ordered = chronological(history);
    let mut counts: BTreeMap<[Group; 3], u32> = BTreeMap::new();
    for w in ordered.windows(3) {
        *counts.entry([w[0].group, w[1].group, w[2].group]).or_insert(0) += 1;
    }
    let mut entries: Vec<SequenceCount> = counts
        .into_iter()
        .map(|(groups, count)| SequenceCount { groups, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.groups.cmp(&b.groups)));
    entries.truncate(n);
    entries
}

pub fn timeslot_correlation(history: &[DrawResult], timeslot: Timeslot, n: usize) -> Vec<GroupCount> {
    top_counts(&count_groups(history.iter().filter(|d| d.timeslot == timeslot)), n)
}

/// weekday : 0 = dimanche.
pub fn weekday_trend(history: &[DrawResult], weekday: u32, n: usize) -> Vec<Group> {
    top_counts(&count_groups(history.iter().filter(|d| d.weekday_index() == weekday)), n)
        .into_iter()
        .map(|c| c.group)
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Days, NaiveDate};
    use lebicho_db::models::{DrawResult, Group, Timeslot};

    /// Historique (plus récent d'abord) dont le i-ème résultat appartient à `groups[i]`.
    /// Un résultat par horaire, à partir du 2026-01-01 pour le plus ancien.
    pub fn history_of(groups: &[u8]) -> Vec<DrawResult> {
        let n = groups.len();
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        groups
            .iter()
            .enumerate()
            .map(|(i, &g)| {
                let chrono_index = n - 1 - i;
                let date = start + Days::new((chrono_index / 6) as u64);
                let timeslot = Timeslot::ALL[chrono_index % 6];
                let dezena = Group::new(g).unwrap().dezenas()[0].clone();
                DrawResult::new(date, timeslot, 1, &format!("12{}", dezena)).unwrap()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::history_of;

    fn g(n: u8) -> Group {
        Group::new(n).unwrap()
    }

    #[test]
    fn test_fixture_groups_and_order() {
        let history = history_of(&[9, 7, 18]);
        assert_eq!(history[0].group, g(9));
        assert_eq!(history[2].group, g(18));
        assert!((history[0].date, history[0].timeslot) > (history[1].date, history[1].timeslot));
    }

    #[test]
    fn test_overdue_ranking() {
        // Groupe 14 absent des 40 derniers résultats, tous les autres vus récemment
        let others: Vec<u8> = (1..=25).filter(|&x| x != 14).collect();
        let mut groups: Vec<u8> = (0..40).map(|i| others[i % others.len()]).collect();
        groups.push(14);
        groups.extend(others.iter().copied());
        let history = history_of(&groups);

        let overdue = overdue_groups(&history, 5);
        assert_eq!(overdue[0], OverdueGroup { group: g(14), gap: 40 });
        assert_eq!(overdue.len(), 5);
        assert!(overdue[1].gap < 40);
    }

    #[test]
    fn test_transitions_are_chronological() {
        // Plus récent d'abord : 18, 9, 7, 9 → chronologique 9, 7, 9, 18
        let history = history_of(&[18, 9, 7, 9]);
        let counts = transition_counts(&history);
        assert_eq!(counts.get(&(g(9), g(7))), Some(&1));
        assert_eq!(counts.get(&(g(9), g(18))), Some(&1));
        assert_eq!(counts.get(&(g(18), g(9))), None);

        let next = successors(&history, g(9), 5);
        assert_eq!(next, vec![GroupCount { group: g(7), count: 1 }, GroupCount { group: g(18), count: 1 }]);
    }

    #[test]
    fn test_top_sequences() {
        let history = history_of(&[3, 2, 1, 3, 2, 1]);
        let seqs = top_sequences(&history, 10);
        // chronologique : 1 2 3 1 2 3
        assert_eq!(seqs[0], SequenceCount { groups: [g(1), g(2), g(3)], count: 2 });
        assert_eq!(seqs.len(), 3);
    }

    #[test]
    fn test_hot_and_cold_counts() {
        let history = history_of(&[9, 9, 9, 7, 7, 1]);
        let counts = count_groups(&history);
        let hot = top_counts(&counts, 2);
        assert_eq!(hot[0], GroupCount { group: g(9), count: 3 });
        let cold = bottom_counts(&counts, 1);
        assert_eq!(cold[0], GroupCount { group: g(1), count: 1 });
    }

    #[test]
    fn test_timeslot_and_weekday() {
        let history = history_of(&[9; 12]);
        let corr = timeslot_correlation(&history, Timeslot::H14, 5);
        assert_eq!(corr, vec![GroupCount { group: g(9), count: 2 }]);
        assert!(timeslot_correlation(&[], Timeslot::H14, 5).is_empty());

        let weekday = history[0].weekday_index();
        assert_eq!(weekday_trend(&history, weekday, 3), vec![g(9)]);
    }
}
