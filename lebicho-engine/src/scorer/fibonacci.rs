use crate::tables::{FIBONACCI, GOLDEN_RATIO_FRACTION};

use super::{Accumulator, ScoringContext, Strategy};

/// Dezenas chaudes décalées de floor(fib × 0,618).
pub struct FibonacciStrategy;

impl Strategy for FibonacciStrategy {
    fn name(&self) -> &'static str {
        "fibonacci"
    }

    fn score(&self, ctx: &ScoringContext<'_>, acc: &mut Accumulator) {
        let dezenas = ctx.profile.hot_dezenas(FIBONACCI.len());
        for (&dezena, fib) in dezenas.iter().zip(FIBONACCI) {
            let shift = (fib as f64 * GOLDEN_RATIO_FRACTION).floor() as u32;
            let value = (dezena as u32 + shift) % 100;
            acc.add(format!("{:02}", value), ctx.config.fibonacci_bonus, self.name());
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
    fn test_fibonacci_shift() {
        let profile = FrequencyProfile::bootstrap();
        let config = EngineConfig::default();
        let mut acc = Accumulator::new();
        FibonacciStrategy.score(&context(&profile, &[], &config), &mut acc);
        // 09 + floor(0,618) = 09 ; 07 + floor(1,236) = 08
        assert_eq!(acc.get("09"), 2.0);
        assert_eq!(acc.get("08"), 2.0);
        assert_eq!(acc.len(), 10);
    }
}
