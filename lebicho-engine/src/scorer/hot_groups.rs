use crate::profile::HeatStatus;

use super::{Accumulator, ScoringContext, Strategy};

pub struct HotGroupStrategy;

impl Strategy for HotGroupStrategy {
    fn name(&self) -> &'static str {
        "grupos_quentes"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        for hot in ctx.profile.hot_groups(4) {
            let bonus = match hot.status {
                HeatStatus::UltraHot => ctx.config.ultra_hot_bonus,
                HeatStatus::Hot => ctx.config.hot_bonus,
                HeatStatus::Warm | HeatStatus::Normal => continue,
            };
            acc.add_group(hot.group, bonus, self.name());
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
    fn test_ultra_hot_and_hot() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        HotGroupStrategy.score(&context(&profile, &[], &config), &mut acc);
        assert_eq!(acc.get("33"), 6.0);
        assert_eq!(acc.get("25"), 4.0);
        assert_eq!(acc.get("29"), 4.0);
        assert_eq!(acc.len(), 16);
    }
}
