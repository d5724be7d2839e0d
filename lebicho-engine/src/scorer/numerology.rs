use super::{Accumulator, ScoringContext, Strategy};

fn date_digit_sum(date: chrono::NaiveDate) -> u32 {
    date.format("%Y%m%d")
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .sum()
}

/// Somme des chiffres de la date → un des 5 groupes les plus chauds.
pub struct NumerologyStrategy;

impl Strategy for NumerologyStrategy {
    fn name(&self) -> &'static str {
        "numerologia"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let hot = ctx.profile.hot_groups(5);
        if hot.is_empty() {
            return;
        }
        let idx = date_digit_sum(ctx.date) as usize % hot.len();
        acc.add_group(hot[idx].group, ctx.config.numerology_bonus, self.name());
    }
}
