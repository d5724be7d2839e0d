use std::collections::BTreeMap;

use lebicho_db::models::Group;

use super::{Accumulator, ScoringContext, Strategy};

/// Priorité aux numéros et groupes déjà gagnants pour l'utilisateur.
pub struct UserHitStrategy;

impl Strategy for UserHitStrategy {
    fn name(&self) -> &'static str {
        "historico_usuario"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let cfg = ctx.config;

        // Ordre de première apparition : les gains sont du plus récent au plus ancien
        let mut numbers: Vec<(&str, u32)> = Vec::new();
        for hit in ctx.user_hits {
            // seuls les nombres purement numériques deviennent candidats
            for n in hit.numbers.iter().filter(|n| is_numeric(n)) {
                match numbers.iter_mut().find(|(k, _)| *k == n.as_str()) {
                    Some(entry) => entry.1 += 1,
                    None => numbers.push((n.as_str(), 1)),
                }
            }
        }
        // Tri stable : à fréquence égale, le plus récent reste devant
        numbers.sort_by(|a, b| b.1.cmp(&a.1));
        for (number, freq) in numbers.into_iter().take(cfg.user_hit_top_numbers) {
            let weight = (freq as f64 * cfg.user_hit_number_multiplier).min(cfg.user_hit_number_cap);
            acc.add(number, weight, self.name());
        }

        let mut groups: BTreeMap<Group, u32> = BTreeMap::new();
        for group in ctx.user_hits.iter().filter_map(|h| h.group) {
            *groups.entry(group).or_insert(0) += 1;
        }
        for (group, freq) in groups {
            let weight = (freq as f64 * cfg.user_hit_group_multiplier).min(cfg.user_hit_group_cap);
            acc.add_group(group, weight, self.name());
        }
    }
}

fn is_numeric(n: &str) -> bool {
    !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())
}
