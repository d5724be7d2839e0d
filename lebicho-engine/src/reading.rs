use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use lebicho_db::models::{DigitWidth, DrawResult, Group, Timeslot, UserHit};

use crate::confidence;
use crate::config::EngineConfig;
use crate::profile::{FrequencyProfile, HotGroup};
use crate::sampler::{self, RandomSource};
use crate::scorer::{self, ScoringContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingRequest {
    pub date: NaiveDate,
    pub timeslot: Timeslot,
    pub width: DigitWidth,
    /// 0 = dimanche ; par défaut le jour de `date`.
    pub weekday: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub numbers: Vec<String>,
    pub confidence: u8,
    pub top_group: Option<Group>,
    pub hot_groups: Vec<HotGroup>,
    pub method_tags: Vec<String>,
}

/// Groupe d'une sortie formatée, d'après ses deux derniers chiffres.
pub(crate) fn group_of(number: &str) -> Option<Group> {
    let start = number.len().checked_sub(2)?;
    Group::from_dezena_str(number.get(start..)?).ok()
}

/// Score, tirage et confiance pour une demande.
/// `history` : résultats récents (le plus récent en premier), `hits` : gains de l'utilisateur.
pub fn generate_reading(
    request: &ReadingRequest,
    history: &[DrawResult],
    hits: &[UserHit],
    config: &EngineConfig,
    rng: &mut dyn RandomSource,
) -> Reading {
    let profile = FrequencyProfile::from_history(history);
    let ctx = ScoringContext {
        date: request.date,
        timeslot: request.timeslot,
        weekday: request
            .weekday
            .unwrap_or_else(|| request.date.weekday().num_days_from_sunday()),
        profile: &profile,
        user_hits: hits,
        config,
    };

    let acc = scorer::score_candidates(&ctx);
    let sample = sampler::sample(&acc, config.output_count, request.width, config.pool_size, config.weight_floor, rng);
    let confidence = confidence::estimate(sample.confidence_weight(), hits.len(), config);

    let reading = Reading {
        top_group: sample.numbers.first().and_then(|n| group_of(n)),
        numbers: sample.numbers,
        confidence,
        hot_groups: profile.hot_groups(10),
        method_tags: acc.tags(),
    };

    info!(
        date = %request.date,
        timeslot = %request.timeslot,
        width = %request.width,
        candidates = acc.len(),
        outputs = reading.numbers.len(),
        confidence,
        "lecture générée"
    );
    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SeededSource;
    use lebicho_db::models::{Modality, make_test_results};

    fn request(width: DigitWidth) -> ReadingRequest {
        ReadingRequest {
            date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
            timeslot: Timeslot::H14,
            width,
            weekday: None,
        }
    }

    #[test]
    fn test_empty_history_still_produces_numbers() {
        let config = EngineConfig::default();
        let reading = generate_reading(&request(DigitWidth::Two), &[], &[], &config, &mut SeededSource::new(1));
        assert!(!reading.numbers.is_empty());
        assert!(reading.numbers.len() <= 5);
        assert!((75..=98).contains(&reading.confidence));
        assert!(reading.top_group.is_some());
        assert_eq!(reading.hot_groups.len(), 10);
    }

    #[test]
    fn test_reading_is_reproducible() {
        let config = EngineConfig::default();
        let history = make_test_results(120);
        let seed = sampler::reading_seed(request(DigitWidth::Four).date, Timeslot::H14, DigitWidth::Four, 1000);
        let a = generate_reading(&request(DigitWidth::Four), &history, &[], &config, &mut SeededSource::new(seed));
        let b = generate_reading(&request(DigitWidth::Four), &history, &[], &config, &mut SeededSource::new(seed));
        assert_eq!(a, b);
        assert!(a.numbers.iter().all(|n| n.len() == 4));
    }

    #[test]
    fn test_top_group_matches_first_number() {
        let config = EngineConfig::default();
        let reading = generate_reading(&request(DigitWidth::Three), &[], &[], &config, &mut SeededSource::new(3));
        let first = &reading.numbers[0];
        let dezena: u8 = first[1..].parse().unwrap();
        assert_eq!(reading.top_group, Some(Group::from_dezena(dezena)));
    }

    #[test]
    fn test_stored_garbage_hits_never_reach_outputs() {
        let config = EngineConfig::default();
        let garbage = UserHit {
            id: None,
            numbers: vec!["0abc".to_string()],
            group: None,
            modality: Modality::Milhar,
            width: DigitWidth::Four,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            timeslot: Timeslot::H14,
            methods: vec![],
        };
        let hits = vec![garbage; 4];
        for seed in 0..20 {
            let reading = generate_reading(&request(DigitWidth::Four), &[], &hits, &config, &mut SeededSource::new(seed));
            assert!(!reading.numbers.is_empty());
            assert!(reading.numbers.iter().all(|n| n.len() == 4 && n.bytes().all(|b| b.is_ascii_digit())));
        }
    }

    #[test]
    fn test_group_of() {
        assert_eq!(group_of("4533"), Some(Group::new(9).unwrap()));
        assert_eq!(group_of("100"), Some(Group::new(25).unwrap()));
        assert_eq!(group_of("7"), None);
    }
}
