use super::{Accumulator, ScoringContext, Strategy};

/// Groupes recommandés pour l'horaire demandé.
pub struct TimeslotStrategy;

impl Strategy for TimeslotStrategy {
    fn name(&self) -> &'static str {
        "horario"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        for group in ctx.profile.timeslot_groups(ctx.timeslot, 5) {
            acc.add_group(group, ctx.config.timeslot_bonus, self.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::profile::FrequencyProfile;
    use crate::scorer::test_support::context;

    #[test]
    fn test_timeslot_groups_14h() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        TimeslotStrategy.score(&context(&profile, &[], &config), &mut acc);
        // 14h : 18, 7, 9, 14, 21
        assert_eq!(acc.len(), 20);
        assert_eq!(acc.get("69"), 5.0);
        assert_eq!(acc.get("53"), 5.0);
        assert_eq!(acc.max_weight(), 5.0);
    }
}
