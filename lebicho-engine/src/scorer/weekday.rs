use super::{Accumulator, ScoringContext, Strategy};

pub struct WeekdayStrategy;

impl Strategy for WeekdayStrategy {
    fn name(&self) -> &'static str {
        "dia_semana"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        for group in ctx.profile.weekday_groups(ctx.weekday, 3) {
            acc.add_group(group, ctx.config.weekday_bonus, self.name());
        }
    }
}
