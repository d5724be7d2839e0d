use crate::config::EngineConfig;

/// min(plancher + floor(poids × k), plafond), plus un bonus d'historique
/// utilisateur de min(gains, cap), le tout borné au plafond.
/// `weight` est le poids cumulé de la sortie retenue en tête (`Sample::confidence_weight`).
pub fn estimate(weight: f64, user_hit_count: usize, config: &EngineConfig) -> u8 {
    let floor = config.confidence_floor as f64;
    let ceiling = config.confidence_ceiling as f64;

    let from_weight = (weight.max(0.0) * config.confidence_multiplier).floor();
    let base = (floor + from_weight).min(ceiling);
    let bonus = user_hit_count.min(config.user_history_bonus_cap as usize) as f64;

    (base + bonus).clamp(floor.min(ceiling), ceiling) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_from_weight() {
        let config = EngineConfig::default();
        assert_eq!(estimate(0.0, 0, &config), 75);
        assert_eq!(estimate(5.4, 0, &config), 85);
        assert_eq!(estimate(50.0, 0, &config), 98);
    }

    #[test]
    fn test_user_history_never_lowers() {
        let config = EngineConfig::default();
        for w in [0.0, 3.0, 7.9, 11.5, 40.0] {
            let without = estimate(w, 0, &config);
            let with = estimate(w, 3, &config);
            assert!(with >= without);
            assert!((75..=98).contains(&with));
        }
        assert_eq!(estimate(5.0, 100, &config), 90);
        assert_eq!(estimate(11.0, 10, &config), 98);
    }
}
