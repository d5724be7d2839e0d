use lebicho_db::models::Group;

use crate::tables;

use super::{Accumulator, ScoringContext, Strategy};

/// Multiples de 3 : bonus fort s'ils tombent dans un groupe chaud.
pub struct TeslaStrategy;

impl Strategy for TeslaStrategy {
    fn name(&self) -> &'static str {
        "tesla"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let hot: Vec<Group> = ctx
            .profile
            .hot_groups(4)
            .into_iter()
            .filter(|h| h.status.is_hot())
            .map(|h| h.group)
            .collect();

        for n in tables::tesla_369() {
            let dezena = (n % 100) as u8;
            let bonus = if hot.contains(&Group::from_dezena(dezena)) {
                ctx.config.tesla_hot_bonus
            } else {
                ctx.config.tesla_bonus
            };
            acc.add(format!("{:02}", dezena), bonus, self.name());
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
    fn test_tesla_hot_bonus() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        TeslaStrategy.score(&context(&profile, &[], &config), &mut acc);
        // 33 → groupe 9 (ultra chaud), 27 → groupe 7 (chaud), 03 → groupe 1
        assert_eq!(acc.get("33"), 3.0);
        assert_eq!(acc.get("27"), 3.0);
        assert_eq!(acc.get("03"), 1.0);
        assert_eq!(acc.get("04"), 0.0);
        assert_eq!(acc.len(), 33);
    }
}
