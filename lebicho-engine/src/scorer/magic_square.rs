use super::{Accumulator, ScoringContext, Strategy};

pub struct MagicSquareStrategy;

impl Strategy for MagicSquareStrategy {
    fn name(&self) -> &'static str {
        "quadrado_magico"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        if let Some(group) = ctx.profile.hottest() {
            acc.add_group(group, ctx.config.magic_square_bonus, self.name());
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
    fn test_hottest_group_dezenas() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        MagicSquareStrategy.score(&context(&profile, &[], &config), &mut acc);
        assert_eq!(acc.ranked().iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), vec!["33", "34", "35", "36"]);
        assert_eq!(acc.get("36"), 5.0);
    }
}
