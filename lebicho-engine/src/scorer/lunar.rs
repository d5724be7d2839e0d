use chrono::NaiveDate;

use super::{Accumulator, ScoringContext, Strategy};

/// Phase lunaire 0-99 : jours depuis la nouvelle lune de référence, modulo le cycle.
pub fn phase_index(date: NaiveDate, reference: NaiveDate, cycle_days: f64) -> u32 {
    if cycle_days <= 0.0 {
        return 0;
    }
    let days = (date - reference).num_days() as f64;
    let phase = days.rem_euclid(cycle_days) / cycle_days;
    ((phase * 100.0).floor() as u32).min(99)
}

pub struct LunarStrategy;

impl Strategy for LunarStrategy {
    fn name(&self) -> &'static str {
        "lunar"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let hot = ctx.profile.hot_groups(10);
        if hot.is_empty() {
            return;
        }
        let phase = phase_index(ctx.date, ctx.config.lunar_reference, ctx.config.lunar_cycle_days);
        let group = hot[phase as usize % hot.len()].group;
        acc.add_group(group, ctx.config.lunar_bonus, self.name());
    }
}
