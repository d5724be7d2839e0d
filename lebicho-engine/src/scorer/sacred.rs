use chrono::Datelike;

use crate::tables::{BIBLICAL, KABBALISTIC};

use super::{Accumulator, ScoringContext, Strategy};

/// Nombres bibliques bruts et nombres cabalistiques multipliés par (jour % 10 + 1).
pub struct SacredStrategy;

impl Strategy for SacredStrategy {
    fn name(&self) -> &'static str {
        "sagrados"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let bonus = ctx.config.sacred_bonus;
        for n in BIBLICAL {
            acc.add(format!("{:02}", n), bonus, self.name());
        }
        let factor = ctx.date.day() % 10 + 1;
        for n in KABBALISTIC {
            acc.add(format!("{:02}", n * factor), bonus, self.name());
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
    fn test_sacred_sets() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        SacredStrategy.score(&context(&profile, &[], &config), &mut acc);
        // Jour 8 : facteur 9
        assert_eq!(acc.get("1000"), 2.0);
        assert_eq!(acc.get("03"), 2.0);
        assert_eq!(acc.get("72"), 2.0);
        assert_eq!(acc.get("198"), 2.0);
    }
}
